//! Integration tests for tagfmt
//!
//! Each case runs the whole pipeline and compares against the expected text

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use tagfmt::{reformat, Dialect, DiagnosticKind, FormatConfig, FormatResult};

fn run(source: &str, dialect: Dialect, config: &FormatConfig) -> FormatResult {
    reformat(source, &dialect.profile(), config)
}

/// Format and compare line by line for readable failures
fn assert_formats_with(source: &str, expected: &str, dialect: Dialect, config: &FormatConfig) {
    let result = run(source, dialect, config);
    let got: Vec<&str> = result.formatted_text.split('\n').collect();
    let want: Vec<&str> = expected.split('\n').collect();
    for (i, (g, w)) in got.iter().zip(want.iter()).enumerate() {
        assert_eq!(g, w, "line {} differs for input {source:?}", i + 1);
    }
    assert_eq!(
        result.formatted_text, expected,
        "line count differs for input {source:?}"
    );
}

fn assert_formats(source: &str, expected: &str) {
    assert_formats_with(source, expected, Dialect::Django, &FormatConfig::default());
}

#[test]
fn test_include_padding() {
    assert_formats(r#"{% include "this" %}"#, "{% include \"this\" %}\n");
    assert_formats(r#"{%include "that"%}"#, "{% include \"that\" %}\n");
}

#[test]
fn test_loop_levels() {
    assert_formats(
        "<ul>{% for x in xs %}<li>{{x}}</li>{% endfor %}</ul>",
        "<ul>\n    {% for x in xs %}\n        <li>{{ x }}</li>\n    {% endfor %}\n</ul>\n",
    );
}

#[test]
fn test_for_empty() {
    assert_formats(
        "{% for x in xs %}<p>{{ x }}</p>{% empty %}<p>none</p>{% endfor %}",
        "{% for x in xs %}\n    <p>{{ x }}</p>\n{% empty %}\n    <p>none</p>\n{% endfor %}\n",
    );
}

#[test]
fn test_if_elif_else() {
    assert_formats(
        "<div>{% if a %}A{% elif b %}B{% else %}C{% endif %}</div>",
        "<div>\n    {% if a %}\n        A\n    {% elif b %}\n        B\n    {% else %}\n        C\n    {% endif %}\n</div>\n",
    );
}

#[test]
fn test_comment_tag_kept_on_one_line() {
    let source = "{% comment \"note\" %}{{ body }}{% endcomment %}\n";
    let result = run(source, Dialect::Django, &FormatConfig::default());
    assert_eq!(result.formatted_text, source);
    assert!(!result.changed);
}

#[test]
fn test_multiline_comment_body_verbatim() {
    assert_formats(
        "<div>\n{% comment %}\n   keep   this\n      as is\n{% endcomment %}\n</div>",
        "<div>\n    {% comment %}\n   keep   this\n      as is\n{% endcomment %}\n</div>\n",
    );
}

#[test]
fn test_autoescape_is_expanded() {
    assert_formats(
        "{% autoescape off %}{{ body }}{% endautoescape %}",
        "{% autoescape off %}\n    {{ body }}\n{% endautoescape %}\n",
    );
}

#[test]
fn test_ignore_directive_nested_in_block() {
    let source = "<div>\n{# tagfmt:off #}\n<p>   keep   </p>\n  {{x}}\n{# tagfmt:on #}\n</div>";
    let result = run(source, Dialect::Django, &FormatConfig::default());
    assert_eq!(
        result.formatted_text,
        "<div>\n    {# tagfmt:off #}\n<p>   keep   </p>\n  {{x}}\n{# tagfmt:on #}\n</div>\n"
    );
    assert!(result.warnings.is_empty());
}

#[test]
fn test_unterminated_ignore_region() {
    let source = "<p>a</p>\n<!-- tagfmt:off -->\n<div>   b</div>";
    let result = run(source, Dialect::Django, &FormatConfig::default());
    assert_eq!(
        result.formatted_text,
        "<p>a</p>\n<!-- tagfmt:off -->\n<div>   b</div>\n"
    );
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(
        result.warnings[0].kind,
        DiagnosticKind::UnterminatedIgnoreRegion
    );
    assert_eq!(result.warnings[0].line, 2);
}

#[test]
fn test_unmatched_closer_keeps_going() {
    let source = "<div><p>a</p></div></span>\n<section><p>b</p></section>";
    let result = run(source, Dialect::Django, &FormatConfig::default());
    assert_eq!(
        result.formatted_text,
        "<div>\n    <p>a</p>\n</div>\n</span>\n<section>\n    <p>b</p>\n</section>\n"
    );
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].kind, DiagnosticKind::UnmatchedCloser);
}

#[test]
fn test_unclosed_block_reported() {
    let result = run(
        "{% if a %}\n<p>x</p>",
        Dialect::Django,
        &FormatConfig::default(),
    );
    assert_eq!(result.formatted_text, "{% if a %}\n    <p>x</p>\n");
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].kind, DiagnosticKind::UnclosedBlock);
    assert_eq!(result.warnings[0].line, 1);
}

#[test]
fn test_script_body_preserved() {
    assert_formats(
        "<div><script>\n  var x = 1;\n    if (x) {}\n</script></div>",
        "<div>\n    <script>\n  var x = 1;\n    if (x) {}\n</script>\n</div>\n",
    );
}

#[test]
fn test_attributes_collapsed() {
    assert_formats(
        "<a   href=\"/x\"\n   class=\"btn  big\" >go</a >",
        "<a href=\"/x\" class=\"btn  big\">go</a>\n",
    );
}

#[test]
fn test_custom_blocks() {
    let config = FormatConfig {
        custom_blocks: vec!["toc".to_string()],
        ..FormatConfig::default()
    };
    assert_formats_with(
        "{% toc %}<p>a</p>{% endtoc %}",
        "{% toc %}\n    <p>a</p>\n{% endtoc %}\n",
        Dialect::Django,
        &config,
    );
}

#[test]
fn test_custom_html() {
    let config = FormatConfig {
        custom_html: vec!["my-card".to_string()],
        ..FormatConfig::default()
    };
    assert_formats_with(
        "<span><my-card><b>x</b></my-card></span>",
        "<span>\n    <my-card><b>x</b></my-card>\n</span>\n",
        Dialect::Django,
        &config,
    );
}

#[test]
fn test_preserve_tags() {
    let config = FormatConfig {
        preserve_tags: vec!["svg".to_string()],
        ..FormatConfig::default()
    };
    let source = "<svg>\n  <g>  </g>\n</svg>\n";
    let result = run(source, Dialect::Django, &config);
    assert_eq!(result.formatted_text, source);
}

#[test]
fn test_jinja_set_block() {
    assert_formats_with(
        "{% set x = 1 %}{% set nav %}<a>b</a>{% endset %}",
        "{% set x = 1 %}\n{% set nav %}<a>b</a>{% endset %}\n",
        Dialect::Jinja,
        &FormatConfig::default(),
    );
}

#[test]
fn test_jinja_raw() {
    let source = "{% raw %}{{  not   touched }}{% endraw %}\n";
    let result = run(source, Dialect::Jinja, &FormatConfig::default());
    assert_eq!(result.formatted_text, source);
}

#[test]
fn test_handlebars_sections() {
    assert_formats_with(
        "{{#if a}}<p>{{b}}</p>{{else}}x{{/if}}",
        "{{#if a}}\n    <p>{{b}}</p>\n{{else}}\n    x\n{{/if}}\n",
        Dialect::Handlebars,
        &FormatConfig::default(),
    );
}

#[test]
fn test_go_template_end() {
    assert_formats_with(
        "{{ if .A }}<b>x</b>{{ else }}y{{ end }}",
        "{{ if .A }}\n    <b>x</b>\n{{ else }}\n    y\n{{ end }}\n",
        Dialect::GoTemplate,
        &FormatConfig::default(),
    );
}

#[test]
fn test_html_profile_leaves_braces_alone() {
    assert_formats_with(
        "<p>{% if %}{{x}}</p>",
        "<p>{% if %}{{x}}</p>\n",
        Dialect::Html,
        &FormatConfig::default(),
    );
}

#[test]
fn test_indent_width() {
    let config = FormatConfig {
        indent_width: 2,
        ..FormatConfig::default()
    };
    assert_formats_with(
        "<ul><li>a</li><li>b</li></ul>",
        "<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>\n",
        Dialect::Django,
        &config,
    );
}

#[test]
fn test_long_line_explodes() {
    let config = FormatConfig {
        max_line_length: 30,
        ..FormatConfig::default()
    };
    assert_formats_with(
        "<div><span>one two three four five</span></div>",
        "<div>\n    <span>\n        one two three four five\n    </span>\n</div>\n",
        Dialect::Django,
        &config,
    );
}

#[test]
fn test_settings_directive_overrides_config() {
    assert_formats(
        "<!-- tagfmt: --indent 2 -->\n<ul><li>a</li></ul>",
        "<!-- tagfmt: --indent 2 -->\n<ul>\n  <li>a</li>\n</ul>\n",
    );
}

#[test]
fn test_doctype_and_void_elements() {
    assert_formats(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>T</title></head></html>",
        "<!DOCTYPE html>\n<html>\n    <head>\n        <meta charset=\"utf-8\">\n        <title>T</title>\n    </head>\n</html>\n",
    );
}
