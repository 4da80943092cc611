#[macro_use]
mod cases;

use indoc::indoc;
use serde_json::json;

test_case!(
    plain_text,
    template: "no tags at all",
    rendered: "no tags at all",
);

test_case!(
    interpolation,
    template: "Hello {{user.name}}, you are {{user.age}}",
    data: json!({"user": {"name": "Ada", "age": 36}}),
    rendered: "Hello Ada, you are 36",
);

test_case!(
    missing_field_renders_empty,
    template: "[{{missing}}]",
    rendered: "[]",
);

test_case!(
    if_else,
    template: "{{#if admin}}admin{{else}}guest{{/if}}",
    data: json!({"admin": false}),
    rendered: "guest",
);

test_case!(
    unless,
    template: "{{#unless items}}empty{{/unless}}",
    data: json!({"items": []}),
    rendered: "empty",
);

test_case!(
    each_with_index_and_last,
    template: "{{#each items}}{{@index}}={{this}}{{#unless @last}}, {{/unless}}{{/each}}",
    data: json!({"items": ["a", "b", "c"]}),
    rendered: "0=a, 1=b, 2=c",
);

test_case!(
    each_over_object_keys,
    template: "{{#each prices}}{{@key}}:{{this}} {{/each}}",
    data: json!({"prices": {"pen": 2, "ink": 5}}),
    rendered: "pen:2 ink:5 ",
);

test_case!(
    to_json_array,
    template: "{{toJson items}}",
    data: json!({"items": [1, 2, 3]}),
    rendered: "[1,2,3]",
);

test_case!(
    to_json_keeps_key_order,
    template: "{{toJson this}}",
    data: json!({"b": 1, "a": {"z": null, "y": "s"}}),
    rendered: r#"{"b":1,"a":{"z":null,"y":"s"}}"#,
);

test_case!(
    to_json_missing_argument,
    template: "{{toJson}}",
    rendered: "null",
);

test_case!(
    scope_and_context_at_depth,
    template: indoc! {"
        {{#each orders}}{{#each lines}}{{#expr}} scope.qty * context.taxRate {{/expr}};{{/each}}|{{/each}}"},
    data: json!({
        "taxRate": 0.5,
        "orders": [
            {"lines": [{"qty": 2}, {"qty": 4}]},
            {"lines": [{"qty": 10}]}
        ]
    }),
    rendered: "1;2;|5;|",
);

test_case!(
    block_source_is_rendered_first,
    template: "{{#expr}} {{count}} + 1 {{/expr}}",
    data: json!({"count": 41}),
    rendered: "42",
);

test_case!(
    failing_tag_is_contained,
    template: "before {{expr \"nope()\"}} after",
    rendered: "before [Error: nope is not defined] after",
);

test_case!(
    failing_helper_is_contained,
    template: "a {{explode}} b {{ok}}",
    functions: [
        ("explode", &[], "throw new Error('kaboom');"),
        ("ok", &[], "return 'fine';"),
    ],
    rendered: "a [Error in explode: kaboom] b fine",
);

test_case!(
    null_and_undefined_render_empty,
    template: "[{{expr \"null\"}}][{{expr \"undefined\"}}]",
    rendered: "[][]",
);

test_case!(
    objects_render_as_strings,
    template: "{{expr \"({a: 1})\"}} {{expr \"[1, [2, 3]]\"}}",
    rendered: "[object Object] 1,2,3",
);

#[test]
fn html_escaping_is_default() {
    let output = stencil::compile(
        "{{text}} {{{text}}}",
        &json!({"text": "<i>&</i>"}),
        &[],
    )
    .unwrap();
    assert_eq!(output.text, "&lt;i&gt;&amp;&lt;/i&gt; <i>&</i>");
}

#[test]
fn rendering_is_idempotent() {
    let template = "{{#each items}}{{double this}},{{/each}} {{#expr}} context.items.length {{/expr}}";
    let data = json!({"items": [1, 2, 3]});
    let defs = cases::functions(&[("double", &["x"], "return x * 2;")]);

    let first = cases::render(template, &data, &defs);
    let second = cases::render(template, &data, &defs);
    assert_eq!(first, second);
    assert_eq!(first.text, "2,4,6, 3");
}

#[test]
fn template_syntax_error_is_fatal() {
    let err = stencil::compile("{{#each items}}{{/if}}", &json!({}), &[]).unwrap_err();
    assert!(matches!(err, stencil::Error::TemplateSyntax(_)), "got {:?}", err);
}

#[test]
fn format_json_output() {
    let output = cases::render("{{{toJson this}}}", &json!({"a": [1]}), &[]);
    assert_eq!(stencil::format_json(&output.text), "{\n  \"a\": [\n    1\n  ]\n}");
    assert_eq!(stencil::format_json("plain text"), "plain text");
}
