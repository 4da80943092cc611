//! Unit tests for the evaluator.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value as Json, json};

use super::*;
use crate::{
    parser::{parse_expression, parse_function_body},
    values::{Value, to_template_json},
};

fn run(source: &str) -> Result<Json, RuntimeError> {
    run_with(source, &[])
}

fn run_with(source: &str, bindings: &[(&str, Value)]) -> Result<Json, RuntimeError> {
    let expr = parse_expression(source).expect("parsing failed");
    eval(&expr, bindings, &ExecutionOptions::default())
}

fn run_body_with_options(source: &str, options: &ExecutionOptions) -> Result<Json, RuntimeError> {
    let body = parse_function_body(source).expect("parsing failed");
    let mut interpreter = Interpreter::new(options);
    let env = Env::child(interpreter.globals());
    let value = interpreter.run_body(&body, &env)?;
    to_template_json(&value)
}

fn run_body(source: &str) -> Result<Json, RuntimeError> {
    run_body_with_options(source, &ExecutionOptions::default())
}

#[test]
fn test_arithmetic_and_concatenation() {
    assert_eq!(run("1 + 2 * 3").unwrap(), json!(7));
    assert_eq!(run("2 ** 3 ** 2").unwrap(), json!(512));
    assert_eq!(run("'a' + 1 + 2").unwrap(), json!("a12"));
    assert_eq!(run("1 + 2 + 'a'").unwrap(), json!("3a"));
    assert_eq!(run("7 % 3").unwrap(), json!(1));
    assert_eq!(run("0.1 + 0.2").unwrap(), json!(0.30000000000000004));
    assert_eq!(run("1 / 0").unwrap(), json!("Infinity"));
    assert_eq!(run("'x' * 2").unwrap(), json!("NaN"));
}

#[test]
fn test_logical_operators_return_operands() {
    assert_eq!(run("0 || 'fallback'").unwrap(), json!("fallback"));
    assert_eq!(run("'a' && 'b'").unwrap(), json!("b"));
    assert_eq!(run("0 ?? 5").unwrap(), json!(0));
    assert_eq!(run("null ?? 5").unwrap(), json!(5));
    // Right side is not evaluated when short-circuiting.
    assert_eq!(run("true || missing").unwrap(), json!(true));
}

#[test]
fn test_comparison_and_equality() {
    assert_eq!(run("1 == '1'").unwrap(), json!(true));
    assert_eq!(run("1 === '1'").unwrap(), json!(false));
    assert_eq!(run("null == undefined").unwrap(), json!(true));
    assert_eq!(run("'b' > 'a'").unwrap(), json!(true));
    assert_eq!(run("'10' < '9'").unwrap(), json!(true));
    assert_eq!(run("'10' < 9").unwrap(), json!(false));
}

#[test]
fn test_unary_and_conditional() {
    assert_eq!(run("!0").unwrap(), json!(true));
    assert_eq!(run("-'3'").unwrap(), json!(-3));
    assert_eq!(run("typeof 'x'").unwrap(), json!("string"));
    assert_eq!(run("typeof nothing").unwrap(), json!("undefined"));
    assert_eq!(run("1 > 2 ? 'a' : 'b'").unwrap(), json!("b"));
}

#[test]
fn test_bindings_and_member_access() {
    let item = Value::object_from([
        ("name", Value::str("Widget")),
        ("tags", Value::array(vec![Value::str("a"), Value::str("b")])),
    ]);
    assert_eq!(
        run_with("scope.name + ':' + scope.tags[1]", &[("scope", item.clone())]).unwrap(),
        json!("Widget:b")
    );
    assert_eq!(run_with("scope.tags.length", &[("scope", item.clone())]).unwrap(), json!(2));
    assert_eq!(run_with("scope['name']", &[("scope", item.clone())]).unwrap(), json!("Widget"));
    assert_eq!(run_with("scope.missing", &[("scope", item.clone())]).unwrap(), json!(null));
    assert_eq!(run_with("scope.missing?.deep", &[("scope", item)]).unwrap(), json!(null));
    assert_eq!(run("'héllo'[1]").unwrap(), json!("é"));
}

#[test]
fn test_templates_and_literals() {
    assert_eq!(run("`a${1 + 1}b${'c'}`").unwrap(), json!("a2bc"));
    assert_eq!(run("[1, 'two', null]").unwrap(), json!("1,two,"));
    assert_eq!(run("({ a: 1 })").unwrap(), json!("[object Object]"));
}

#[test]
fn test_errors() {
    assert_eq!(
        run("missing + 1"),
        Err(RuntimeError::Reference {
            name: "missing".to_string()
        })
    );
    assert_eq!(
        run("null.x"),
        Err(RuntimeError::Type(
            "Cannot read properties of null (reading 'x')".to_string()
        ))
    );
    assert_eq!(
        run_with("scope.name()", &[("scope", Value::object_from([("name", Value::str("x"))]))]),
        Err(RuntimeError::Type("scope.name is not a function".to_string()))
    );
    assert_eq!(
        run_with("scope.items.shout()", &[("scope", Value::object_from([("items", Value::array(vec![]))]))]),
        Err(RuntimeError::Type("scope.items.shout is not a function".to_string()))
    );
    assert_eq!(
        run("(1).shout()"),
        Err(RuntimeError::Type("1.shout is not a function".to_string()))
    );
    assert_eq!(
        run_with("f(1)", &[("f", Value::Number(1.0))]),
        Err(RuntimeError::Type("f is not a function".to_string()))
    );
}

#[test]
fn test_bindings_are_constant() {
    assert_eq!(
        run_with("scope = 1", &[("scope", Value::Null)]),
        Err(RuntimeError::Type("Assignment to constant variable.".to_string()))
    );
    // Members of bound objects are writable; only the binding is constant.
    let obj = Value::object_from([("n", Value::Number(1.0))]);
    assert_eq!(run_with("scope.n += 1", &[("scope", obj)]).unwrap(), json!(2));
}

#[test]
fn test_statements() {
    assert_eq!(
        run_body(
            "let total = 0;
             for (const x of [1, 2, 3, 4]) {
                 if (x % 2 === 0) continue;
                 total += x;
             }
             return total;"
        )
        .unwrap(),
        json!(4)
    );
    assert_eq!(
        run_body("let s = ''; for (let i = 0; i < 5; i++) { if (i == 3) break; s += i; } return s;")
            .unwrap(),
        json!("012")
    );
    assert_eq!(
        run_body("let n = 0; while (n < 10) n++; return n;").unwrap(),
        json!(10)
    );
    assert_eq!(run_body("const x = 1;").unwrap(), json!(null));
    assert_eq!(
        run_body("let out = ''; for (const c of 'abc') out = c + out; return out;").unwrap(),
        json!("cba")
    );
}

#[test]
fn test_declaration_errors() {
    assert_eq!(
        run_body("const a = 1; a = 2;"),
        Err(RuntimeError::Type("Assignment to constant variable.".to_string()))
    );
    assert_eq!(
        run_body("let a = 1; let a = 2;"),
        Err(RuntimeError::Syntax(
            "Identifier 'a' has already been declared".to_string()
        ))
    );
    assert_eq!(run_body("var a = 1; var a = 2; return a;").unwrap(), json!(2));
    assert_eq!(
        run_body("let a = 1; { let a = 2; } return a;").unwrap(),
        json!(1)
    );
}

#[test]
fn test_closures_capture_by_reference() {
    assert_eq!(
        run_body(
            "let count = 0;
             const inc = () => { count++; };
             inc(); inc();
             return count;"
        )
        .unwrap(),
        json!(2)
    );
    assert_eq!(
        run_body("const add = (a) => (b) => a + b; return add(2)(3);").unwrap(),
        json!(5)
    );
    assert_eq!(
        run_body("const fact = (n) => n <= 1 ? 1 : n * fact(n - 1); return fact(10);").unwrap(),
        json!(3628800)
    );
}

#[test]
fn test_throw() {
    assert_eq!(
        run_body("throw 'boom';"),
        Err(RuntimeError::Thrown("boom".to_string()))
    );
    assert_eq!(
        run_body("throw { message: 'bad input' };"),
        Err(RuntimeError::Thrown("bad input".to_string()))
    );
}

#[test]
fn test_stray_break_is_an_error() {
    assert!(matches!(run_body("break;"), Err(RuntimeError::Syntax(_))));
}

#[test]
fn test_array_writes() {
    assert_eq!(
        run_body("const a = []; a[2] = 'x'; return a.length + ':' + a;").unwrap(),
        json!("3:,,x")
    );
    assert_eq!(
        run_body("const a = [1, 2, 3]; a.length = 1; return a;").unwrap(),
        json!("1")
    );
    assert_eq!(
        run_body("const a = []; a[100000000] = 1;"),
        Err(RuntimeError::Range("Invalid array length".to_string()))
    );
    assert_eq!(
        run_body("let u; u.x = 1;"),
        Err(RuntimeError::Type(
            "Cannot set properties of undefined (setting 'x')".to_string()
        ))
    );
}

#[test]
fn test_step_limit() {
    let options = ExecutionOptions {
        max_steps: 1000,
        timeout: None,
        ..ExecutionOptions::default()
    };
    assert_eq!(
        run_body_with_options("while (true) {}", &options),
        Err(RuntimeError::ResourceExceeded(ResourceExceeded::StepLimit {
            max_steps: 1000
        }))
    );
}

#[test]
fn test_timeout() {
    let options = ExecutionOptions {
        max_steps: u64::MAX,
        timeout: Some(Duration::ZERO),
        ..ExecutionOptions::default()
    };
    assert_eq!(
        run_body_with_options("for (;;) {}", &options),
        Err(RuntimeError::ResourceExceeded(ResourceExceeded::Timeout(
            Duration::ZERO
        )))
    );
}

#[test]
fn test_unbounded_recursion_is_stopped() {
    // Run on a thread with a generous stack: debug builds use large frames.
    let result = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| run_body("const f = (n) => f(n + 1) + 1; return f(0);"))
        .unwrap()
        .join()
        .unwrap();
    assert_eq!(
        result,
        Err(RuntimeError::ResourceExceeded(
            ResourceExceeded::StackOverflow { max_depth: 256 }
        ))
    );
}

#[test]
fn test_self_referencing_closure_is_released() {
    let body = parse_function_body("const f = () => f; return 1;").unwrap();
    let env = {
        let mut interpreter = Interpreter::new(&ExecutionOptions::default());
        let env = Env::child(interpreter.globals());
        interpreter.run_body(&body, &env).unwrap();
        std::rc::Rc::downgrade(&env)
    };
    assert!(env.upgrade().is_none());
}

#[test]
fn test_deeply_nested_arrays() {
    let options = ExecutionOptions {
        timeout: None,
        ..ExecutionOptions::default()
    };
    let build = "let a = []; for (let i = 0; i < 200000; i++) a = [a];";
    for tail in ["return '' + a;", "return `${a}`;", "return JSON.stringify(a);", "return a.flat(Infinity);"] {
        assert_eq!(
            run_body_with_options(&format!("{} {}", build, tail), &options),
            Err(RuntimeError::range_error("Maximum call stack size exceeded")),
            "{}",
            tail
        );
    }
    // Dropping the last reference must not recurse either.
    assert_eq!(
        run_body_with_options(&format!("{} a = null; return 1;", build), &options).unwrap(),
        json!(1)
    );
}

#[test]
fn test_string_length_limit() {
    let double = "let s = 'x'; for (let i = 0; i < 26; i++) s = s + s; return s.length;";
    assert_eq!(
        run_body(double),
        Err(RuntimeError::range_error("Invalid string length"))
    );

    let setup = "let s = 'x'.repeat(16777216);";
    for tail in [
        "return `${s}!`;",
        "return [s, s].join('');",
        "return s.concat('!');",
        "s += 1; return s;",
    ] {
        assert_eq!(
            run_body(&format!("{} {}", setup, tail)),
            Err(RuntimeError::range_error("Invalid string length")),
            "{}",
            tail
        );
    }
    assert_eq!(run_body(&format!("{} return (s + '').length;", setup)).unwrap(), json!(16777216));
}
