//! End-to-end pipeline tests.
//!
//! Tests verify the full pipeline: text → scan → parse → codegen → render,
//! for realistic templates and for every failure category.

use brackets_compiler::{compile, CompileError, CompileOptions, Compiler};
use brackets_types::program::{Fragment, Instr};
use brackets_types::{ErrorCategory, ErrorCode};
use serde_json::json;

// ══════════════════════════════════════════════════════════════════════════════
// Canonical templates
// ══════════════════════════════════════════════════════════════════════════════

const COUNTER: &str = "<span>Count: {{ count }}</span>";

const TODO_LIST: &str = r#"<ul>
{{#for todo of todos}}  <li class="{{ todo.done ? 'done' : 'open' }}">{{ $todoIndex + 1 }}. {{ todo.text }}</li>
{{/for}}</ul>
{{#if todos.length === 0}}<p>Nothing to do</p>{{#else}}<p>{{ remaining }} left</p>{{/if}}"#;

const TIC_TAC_TOE: &str = r#"{{#for row of board}}{{#for cell of row}}[{{ cell ?? '-' }}]{{/for}}
{{/for}}{{#if winner}}Winner: {{ winner }}{{#elif moves === 9}}Draw{{#else}}Next: {{ player }}{{/if}}"#;

// ══════════════════════════════════════════════════════════════════════════════
// Rendering
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_counter_renders_and_reads_count() {
    let template = compile(COUNTER).unwrap();
    assert_eq!(
        template.render(&json!({"count": 5})).unwrap(),
        "<span>Count: 5 </span>"
    );
    assert_eq!(template.variables().iter().collect::<Vec<_>>(), vec!["count"]);
}

#[test]
fn test_todo_list() {
    let template = compile(TODO_LIST).unwrap();
    let out = template
        .render(&json!({
            "todos": [{"text": "milk", "done": true}, {"text": "eggs", "done": false}],
            "remaining": 1
        }))
        .unwrap();
    assert!(out.contains(r#"<li class="done ">1 . milk </li>"#), "{out}");
    assert!(out.contains(r#"<li class="open ">2 . eggs </li>"#), "{out}");
    assert!(out.ends_with("<p>1  left</p>"), "{out}");

    let empty = template
        .render(&json!({"todos": [], "remaining": 0}))
        .unwrap();
    assert!(empty.ends_with("<p>Nothing to do</p>"), "{empty}");

    assert_eq!(
        template.variables().iter().collect::<Vec<_>>(),
        vec!["todos", "remaining"]
    );
}

#[test]
fn test_tic_tac_toe_board() {
    let template = compile(TIC_TAC_TOE).unwrap();
    let out = template
        .render(&json!({
            "board": [["x", null], [null, "o"]],
            "winner": null,
            "moves": 2,
            "player": "x"
        }))
        .unwrap();
    assert_eq!(out, "[x ][- ]\n[- ][o ]\nNext: x ");
    assert_eq!(
        template.variables().iter().collect::<Vec<_>>(),
        vec!["board", "winner", "moves", "player"]
    );
}

#[test]
fn test_scenario_if_elif_else() {
    let template = compile("{{#if a}}X{{#elif b}}Y{{#else}}Z{{/if}}").unwrap();
    assert_eq!(template.render(&json!({"a": false, "b": true})).unwrap(), "Y");
}

#[test]
fn test_member_access_only_subscribes_root() {
    let template = compile("{{ a.b }}").unwrap();
    assert!(template.reads("a"));
    assert!(!template.reads("b"));
}

#[test]
fn test_html_entities_in_statements_are_decoded() {
    let template = compile("{{ a &gt; 1 &amp;&amp; b }}").unwrap();
    assert_eq!(template.render(&json!({"a": 2, "b": "yes"})).unwrap(), "yes ");
}

#[test]
fn test_render_error_on_missing_variable() {
    let template = compile("{{ missing }}").unwrap();
    assert!(template.render(&json!({})).is_err());
}

// ══════════════════════════════════════════════════════════════════════════════
// Options and custom commands
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_custom_separator() {
    let compiler = Compiler::with_options(CompileOptions {
        statement_separator: String::new(),
        ..CompileOptions::default()
    });
    let template = compiler.compile("{{ a }}{{ b }}").unwrap();
    assert_eq!(template.render(&json!({"a": 1, "b": 2})).unwrap(), "12");
}

#[test]
fn test_options_from_json() {
    let options = CompileOptions::from_json_str(r#"{"gas_limit": 10}"#).unwrap();
    assert_eq!(options.gas_limit, 10);
    assert_eq!(options.statement_separator, " ");
}

#[test]
fn test_gas_limit_applies_to_renders() {
    let compiler = Compiler::with_options(CompileOptions {
        gas_limit: 20,
        ..CompileOptions::default()
    });
    let template = compiler
        .compile("{{#for x of xs}}{{ x }}{{/for}}")
        .unwrap();
    assert!(template.render(&json!({"xs": [1]})).is_ok());
    assert!(template.render(&json!({"xs": (0..100).collect::<Vec<_>>()})).is_err());
}

#[test]
fn test_registered_command_is_usable() {
    let mut compiler = Compiler::new();
    compiler
        .command(
            "upper",
            |_, block, generator, _| {
                let mut fragment = Fragment::new();
                fragment.push(Instr::Text("<b>".into()));
                fragment.append(generator.generate(&block.children)?);
                fragment.push(Instr::Text("</b>".into()));
                Ok(fragment)
            },
            Vec::<String>::new(),
        )
        .unwrap();
    let template = compiler.compile("{{#upper}}hi{{/upper}}").unwrap();
    assert_eq!(template.render(&json!({})).unwrap(), "<b>hi</b>");
}

#[test]
fn test_unregistered_command_on_fresh_compiler() {
    let err = compile("{{#upper}}hi{{/upper}}").unwrap_err();
    assert_eq!(err.code(), ErrorCode::UNKNOWN_COMMAND);
}

// ══════════════════════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_error_categories() {
    let cases = [
        ("{{ open", ErrorCategory::Lex),
        ("{{}}", ErrorCategory::Lex),
        ("{{#if a}}x", ErrorCategory::Parse),
        ("{{#if a}}x{{/for}}", ErrorCategory::Parse),
        ("{{#nope}}{{/nope}}", ErrorCategory::Parse),
        ("{{ a + }}", ErrorCategory::Parse),
        ("{{#for x}}{{/for}}", ErrorCategory::Codegen),
    ];
    for (source, category) in cases {
        let err = compile(source).unwrap_err();
        assert_eq!(err.category(), category, "{source}: {err}");
    }
}

#[test]
fn test_errors_carry_source_line() {
    let err = compile("first\nsecond {{#if a}}\n{{/for}}").unwrap_err();
    let diagnostic = err.template_error().expect("located diagnostic");
    assert_eq!(diagnostic.span.map(|s| s.start_line), Some(3));
    assert_eq!(diagnostic.source_line.as_deref(), Some("{{/for}}"));
}

#[test]
fn test_expression_errors_carry_source_line() {
    let err = compile("ok\n{{ 1 + }}").unwrap_err();
    assert!(matches!(err, CompileError::Codegen(_)));
    let diagnostic = err.template_error().expect("located diagnostic");
    assert_eq!(diagnostic.source_line.as_deref(), Some("{{ 1 + }}"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Determinism
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_same_source_same_hash_and_program() {
    let a = compile(TODO_LIST).unwrap();
    let b = compile(TODO_LIST).unwrap();
    assert_eq!(a.source_hash(), b.source_hash());
    assert_eq!(a.source_hash().len(), 64);
    assert_eq!(a.program(), b.program());
    assert_ne!(a.source_hash(), compile(COUNTER).unwrap().source_hash());
}
