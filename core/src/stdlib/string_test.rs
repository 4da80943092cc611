//! Tests for the string methods.

use pretty_assertions::assert_eq;
use serde_json::{Value as Json, json};

use crate::{
    api::ExecutionOptions,
    evaluator::{RuntimeError, eval},
    parser::parse_expression,
};

fn run(source: &str) -> Result<Json, RuntimeError> {
    let expr = parse_expression(source).expect("parsing failed");
    eval(&expr, &[], &ExecutionOptions::default())
}

#[test]
fn test_case_and_trim() {
    assert_eq!(run("'Hello'.toUpperCase()").unwrap(), json!("HELLO"));
    assert_eq!(run("'Hello'.toLowerCase()").unwrap(), json!("hello"));
    assert_eq!(run("'  pad  '.trim()").unwrap(), json!("pad"));
    assert_eq!(run("'  pad  '.trimStart()").unwrap(), json!("pad  "));
    assert_eq!(run("'  pad  '.trimEnd()").unwrap(), json!("  pad"));
}

#[test]
fn test_split() {
    assert_eq!(run("'a,b,c'.split(',').length").unwrap(), json!(3));
    assert_eq!(run("'a,b,c'.split(',', 2).join('|')").unwrap(), json!("a|b"));
    assert_eq!(run("'abc'.split('').join('-')").unwrap(), json!("a-b-c"));
    assert_eq!(run("'abc'.split().length").unwrap(), json!(1));
}

#[test]
fn test_substrings() {
    assert_eq!(run("'template'.slice(-4)").unwrap(), json!("late"));
    assert_eq!(run("'template'.slice(1, -4)").unwrap(), json!("emp"));
    assert_eq!(run("'template'.substring(4, 1)").unwrap(), json!("emp"));
    assert_eq!(run("'template'.substr(-4, 2)").unwrap(), json!("la"));
    assert_eq!(run("'naïve'.slice(2, 3)").unwrap(), json!("ï"));
}

#[test]
fn test_search() {
    assert_eq!(run("'banana'.indexOf('an')").unwrap(), json!(1));
    assert_eq!(run("'banana'.indexOf('an', 2)").unwrap(), json!(3));
    assert_eq!(run("'banana'.lastIndexOf('an')").unwrap(), json!(3));
    assert_eq!(run("'banana'.indexOf('x')").unwrap(), json!(-1));
    assert_eq!(run("'banana'.includes('nan')").unwrap(), json!(true));
    assert_eq!(run("'banana'.startsWith('ban')").unwrap(), json!(true));
    assert_eq!(run("'banana'.endsWith('nan', 5)").unwrap(), json!(true));
    assert_eq!(run("'€uro'.indexOf('u')").unwrap(), json!(1));
}

#[test]
fn test_replace() {
    assert_eq!(run("'a-b-c'.replace('-', '+')").unwrap(), json!("a+b-c"));
    assert_eq!(run("'a-b-c'.replaceAll('-', '+')").unwrap(), json!("a+b+c"));
    assert_eq!(
        run("'a-b'.replaceAll('-', (m, i) => '[' + i + ']')").unwrap(),
        json!("a[1]b")
    );
    assert_eq!(run("'ab'.replaceAll('', '.')").unwrap(), json!(".a.b."));
}

#[test]
fn test_repeat_and_pad() {
    assert_eq!(run("'ab'.repeat(3)").unwrap(), json!("ababab"));
    assert_eq!(run("'5'.padStart(3, '0')").unwrap(), json!("005"));
    assert_eq!(run("'5'.padEnd(4, 'ab')").unwrap(), json!("5aba"));
    assert_eq!(run("'long'.padStart(2)").unwrap(), json!("long"));
    assert_eq!(
        run("'x'.repeat(-1)"),
        Err(RuntimeError::Range("Invalid count value: -1".to_string()))
    );
    assert_eq!(
        run("'x'.repeat(100000000)"),
        Err(RuntimeError::Range("Invalid string length".to_string()))
    );
}

#[test]
fn test_characters() {
    assert_eq!(run("'abc'.charAt(1)").unwrap(), json!("b"));
    assert_eq!(run("'abc'.charAt(9)").unwrap(), json!(""));
    assert_eq!(run("'abc'.charCodeAt(0)").unwrap(), json!(97));
    assert_eq!(run("'abc'.at(-1)").unwrap(), json!("c"));
    assert_eq!(run("'abc'.at(5)").unwrap(), json!(null));
    assert_eq!(run("'abc'.length").unwrap(), json!(3));
    assert_eq!(run("'a'.concat(1, null)").unwrap(), json!("a1null"));
}

#[test]
fn test_unknown_method() {
    assert_eq!(
        run("'abc'.shout()"),
        Err(RuntimeError::Type("\"abc\".shout is not a function".to_string()))
    );
    assert_eq!(run("'abc'.toString()").unwrap(), json!("abc"));
}
