//! Whole-pipeline properties over a small corpus of messy templates

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use rstest::rstest;
use tagfmt::{detect, reformat, DiagnosticKind, Dialect, FormatConfig};

const DJANGO_PAGE: &str = r#"{% extends "base.html" %}
{% load static %}


{% block content %}
<div class="list   wrapper"   id=main>
  <h1>{{title|upper}}</h1>
      <ul>
   {% for item in items %}
     <li class="{% if forloop.first %}first{% endif %}"><a href="{{ item.url }}">{{item.name}}</a></li>
   {% empty %}
     <li>Nothing here.</li>
   {% endfor %}
      </ul>
  {% comment %}
      old   markup
  {% endcomment %}
  <p>
     Some text that runs on
     over a few lines, with a <b>bold</b> word.
  </p>
</div>
{% endblock %}
"#;

const JINJA_MACROS: &str = r"{% macro field(name, value='') -%}
<input name='{{ name }}' value='{{value}}'>
{%- endmacro %}
{% set links %}<a href='/'>home</a>{% endset %}
{% set count = 3 %}
<form>{% for i in range(count) %}{{ field('f' ~ i) }}{% endfor %}</form>
{% raw %}{{   untouched   }}{% endraw %}
";

const NUNJUCKS_LOOP: &str = "<table>{% asyncEach row in rows %}<tr><td>{{ row.a }}</td><td>{{ row.b }}</td></tr>{% endeach %}</table>\n{% if x %}yes{% elseif y %}maybe{% else %}no{% endif %}";

const HANDLEBARS_LIST: &str = "{{!-- list of people --}}\n<ul>{{#each people}}<li>{{name}}{{#if admin}} (admin){{/if}}</li>{{else}}<li>none</li>{{/each}}</ul>\n{{> footer}}";

const GO_TEMPLATE: &str = "{{/* header */}}\n{{define \"main\"}}<main>{{range .Items}}<p>{{.}}</p>{{end}}</main>{{end}}\n{{ template \"main\" . }}";

const BROKEN: &str = "<div><p>unclosed\n<span>x</div></section>\n{% if a %}<b>y</b>\n<!-- never closed";

const PROTECTED: &str = "<section>\n<!-- tagfmt:off -->\n<pre>  keep\n   me</pre>\n   <i>as   is</i>\n<!-- tagfmt:on -->\n<script>\n  if (a < b) { go(); }\n</script>\n<textarea>  raw\ntext</textarea>\n</section>\n";

const CRLF: &str = "<div>\r\n  <p>a</p>\r\n\r\n  <!-- note\r\n   more -->\r\n</div>\r\n";

#[rstest]
#[case::django_page(DJANGO_PAGE, Dialect::Django)]
#[case::jinja_macros(JINJA_MACROS, Dialect::Jinja)]
#[case::nunjucks_loop(NUNJUCKS_LOOP, Dialect::Nunjucks)]
#[case::handlebars_list(HANDLEBARS_LIST, Dialect::Handlebars)]
#[case::go_template(GO_TEMPLATE, Dialect::GoTemplate)]
#[case::broken(BROKEN, Dialect::Django)]
#[case::protected(PROTECTED, Dialect::Django)]
#[case::crlf(CRLF, Dialect::Django)]
#[case::plain_html(DJANGO_PAGE, Dialect::Html)]
fn test_idempotent(#[case] source: &str, #[case] dialect: Dialect) {
    let config = FormatConfig::default();
    let once = reformat(source, &dialect.profile(), &config);
    let twice = reformat(&once.formatted_text, &dialect.profile(), &config);
    assert_eq!(twice.formatted_text, once.formatted_text);
    assert!(!twice.changed);
}

#[rstest]
#[case::narrow(2, 40)]
#[case::wide(8, 200)]
fn test_idempotent_with_config(#[case] indent_width: usize, #[case] max_line_length: usize) {
    let config = FormatConfig {
        indent_width,
        max_line_length,
        preserve_blank_lines: true,
        ..FormatConfig::default()
    };
    let profile = Dialect::Django.profile();
    let once = reformat(DJANGO_PAGE, &profile, &config);
    let twice = reformat(&once.formatted_text, &profile, &config);
    assert_eq!(twice.formatted_text, once.formatted_text);
}

#[rstest]
#[case::django_page(DJANGO_PAGE, Dialect::Django)]
#[case::broken(BROKEN, Dialect::Django)]
#[case::handlebars_list(HANDLEBARS_LIST, Dialect::Handlebars)]
fn test_deterministic(#[case] source: &str, #[case] dialect: Dialect) {
    let config = FormatConfig::default();
    let first = reformat(source, &dialect.profile(), &config);
    let second = reformat(source, &dialect.profile(), &config);
    assert_eq!(first, second);
}

#[rstest]
#[case::django_page(DJANGO_PAGE)]
#[case::protected(PROTECTED)]
#[case::broken(BROKEN)]
fn test_changed_flag_matches_detect(#[case] source: &str) {
    let result = reformat(source, &Dialect::Django.profile(), &FormatConfig::default());
    assert_eq!(result.changed, detect(source, &result.formatted_text));
}

#[test]
fn test_protected_content_is_byte_identical() {
    let result = reformat(PROTECTED, &Dialect::Django.profile(), &FormatConfig::default());
    for fragment in [
        "<!-- tagfmt:off -->\n<pre>  keep\n   me</pre>\n   <i>as   is</i>\n<!-- tagfmt:on -->",
        "<script>\n  if (a < b) { go(); }\n</script>",
        "<textarea>  raw\ntext</textarea>",
    ] {
        assert!(
            result.formatted_text.contains(fragment),
            "missing {fragment:?} in {:?}",
            result.formatted_text
        );
    }
    assert!(result.warnings.is_empty());
}

#[test]
fn test_broken_markup_reports_every_anomaly() {
    let result = reformat(BROKEN, &Dialect::Django.profile(), &FormatConfig::default());
    let kinds: Vec<&str> = result.warnings.iter().map(|w| w.kind.name()).collect();
    assert!(kinds.contains(&"unmatched-closer"));
    assert!(kinds.contains(&"unclosed-block"));
    assert!(kinds.contains(&"unterminated-raw-region"));
    let lines: Vec<usize> = result.warnings.iter().map(|w| w.line).collect();
    let mut sorted = lines.clone();
    sorted.sort_unstable();
    assert_eq!(lines, sorted);
}

#[test]
fn test_crlf_preserved() {
    let result = reformat(CRLF, &Dialect::Django.profile(), &FormatConfig::default());
    assert!(result.formatted_text.ends_with("</div>\r\n"));
    assert!(!result.formatted_text.replace("\r\n", "").contains('\n'));
}

#[test]
fn test_deep_nesting_on_small_stack() {
    let handle = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let depth = 10_000;
            let source = format!("{}x{}", "<div>".repeat(depth), "</div>".repeat(depth));
            let config = FormatConfig::default();
            let profile = Dialect::Html.profile();
            let once = reformat(&source, &profile, &config);
            let twice = reformat(&once.formatted_text, &profile, &config);
            (once, twice)
        })
        .unwrap_or_else(|e| panic!("spawn failed: {e}"));
    let (once, twice) = handle.join().unwrap_or_else(|_| panic!("formatting panicked"));

    assert_eq!(once.formatted_text.lines().count(), 20_001);
    assert_eq!(twice.formatted_text, once.formatted_text);
    let kinds: Vec<DiagnosticKind> = once.warnings.iter().map(|w| w.kind).collect();
    assert_eq!(kinds, vec![DiagnosticKind::NestingTooDeep]);
}
