/// Static tag tables and the per-run resolved [`TagTable`]
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::config::{FormatConfig, IgnoreMarkers};
use crate::directive::{find_marker, DirectiveKind};
use crate::parser::{Token, TokenKind};

use super::dialect::{Dialect, DialectProfile, Family};
use super::types::{Classification, Layout, Syntax};

/// One row of a static tag table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    class: Classification,
    layout: Layout,
    /// Block only in its capture form (`{% set x %}...{% endset %}`), void when it assigns
    capture: bool,
}

impl Entry {
    const fn of(class: Classification) -> Self {
        Self {
            class,
            layout: Layout::Auto,
            capture: false,
        }
    }

    const fn expanded() -> Self {
        Self {
            class: Classification::Block,
            layout: Layout::Expanded,
            capture: false,
        }
    }

    const fn capture() -> Self {
        Self {
            class: Classification::Void,
            layout: Layout::Auto,
            capture: true,
        }
    }
}

type Table = HashMap<&'static str, Entry>;

fn build_table(groups: &[(&[&'static str], Entry)]) -> Table {
    let mut table = HashMap::new();
    for (names, entry) in groups {
        for name in *names {
            table.insert(*name, *entry);
        }
    }
    table
}

use Classification::{Block, Branch, InlineContainer, RawPreserving, Void};

static HTML_TABLE: LazyLock<Table> = LazyLock::new(|| {
    build_table(&[
        (
            &[
                "area", "base", "basefont", "br", "col", "command", "embed", "frame", "hr", "img",
                "input", "isindex", "keygen", "link", "meta", "param", "source", "track", "wbr",
                "!doctype", "?xml",
            ],
            Entry::of(Void),
        ),
        (&["script", "style", "pre", "textarea"], Entry::of(RawPreserving)),
        (
            &[
                "a", "abbr", "acronym", "b", "bdi", "bdo", "big", "cite", "code", "data", "del",
                "dfn", "em", "font", "i", "ins", "kbd", "label", "mark", "q", "s", "samp",
                "small", "span", "strike", "strong", "sub", "sup", "time", "tt", "u", "var",
            ],
            Entry::of(InlineContainer),
        ),
        (
            &[
                "address", "article", "aside", "audio", "blockquote", "body", "button", "canvas",
                "caption", "center", "colgroup", "dd", "details", "dialog", "dir", "div", "dl",
                "dt", "fieldset", "figcaption", "figure", "footer", "form", "frameset", "h1",
                "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "html", "iframe",
                "legend", "li", "main", "map", "menu", "nav", "noscript", "object", "ol",
                "optgroup", "option", "output", "p", "picture", "section", "select", "summary",
                "svg", "table", "tbody", "td", "template", "tfoot", "th", "thead", "title", "tr",
                "ul", "video",
            ],
            Entry::of(Block),
        ),
    ])
});

static DJANGO_TABLE: LazyLock<Table> = LazyLock::new(|| {
    build_table(&[
        (
            &[
                "block", "for", "if", "ifchanged", "ifequal", "ifnotequal", "with", "assets",
                "cache", "localize", "localtime", "timezone", "language", "partialdef",
            ],
            Entry::of(Block),
        ),
        (&["autoescape", "filter", "spaceless"], Entry::expanded()),
        (
            &["comment", "verbatim", "blocktrans", "blocktranslate"],
            Entry::of(RawPreserving),
        ),
        (&["else", "elif", "empty"], Entry::of(Branch)),
        (
            &[
                "include", "extends", "load", "url", "csrf_token", "cycle", "firstof", "now",
                "trans", "translate", "static", "get_static_prefix", "get_media_prefix",
                "regroup", "widthratio", "debug", "lorem", "resetcycle", "querystring",
                "get_current_language", "get_available_languages", "get_language_info",
                "partial",
            ],
            Entry::of(Void),
        ),
        (&["templatetag"], Entry::of(InlineContainer)),
    ])
});

static JINJA_TABLE: LazyLock<Table> = LazyLock::new(|| {
    build_table(&[
        (&["block", "for", "if", "macro", "call", "with", "trans"], Entry::of(Block)),
        (&["autoescape", "filter"], Entry::expanded()),
        (&["raw"], Entry::of(RawPreserving)),
        (&["else", "elif", "pluralize"], Entry::of(Branch)),
        (
            &["include", "extends", "import", "from", "do", "break", "continue"],
            Entry::of(Void),
        ),
        (&["set"], Entry::capture()),
    ])
});

static NUNJUCKS_TABLE: LazyLock<Table> = LazyLock::new(|| {
    build_table(&[
        (
            &["block", "for", "asynceach", "asyncall", "if", "macro", "call"],
            Entry::of(Block),
        ),
        (&["filter"], Entry::expanded()),
        (&["raw", "verbatim"], Entry::of(RawPreserving)),
        (&["else", "elif", "elseif"], Entry::of(Branch)),
        (&["include", "extends", "import", "from"], Entry::of(Void)),
        (&["set"], Entry::capture()),
    ])
});

static HANDLEBARS_TABLE: LazyLock<Table> = LazyLock::new(|| {
    build_table(&[
        (&["else"], Entry::of(Branch)),
        (&["raw"], Entry::of(RawPreserving)),
    ])
});

static GO_TABLE: LazyLock<Table> = LazyLock::new(|| {
    build_table(&[
        (&["if", "range", "with", "define", "block"], Entry::of(Block)),
        (&["else"], Entry::of(Branch)),
        (&["template", "break", "continue"], Entry::of(Void)),
    ])
});

/// Nunjucks closers whose name differs from their opener
const NUNJUCKS_CLOSER_ALIASES: &[(&str, &str)] = &[("each", "asynceach"), ("all", "asyncall")];

static EMPTY_TABLE: LazyLock<Table> = LazyLock::new(HashMap::new);

fn template_table(dialect: Dialect) -> &'static Table {
    match dialect {
        Dialect::Html => &EMPTY_TABLE,
        Dialect::Django => &DJANGO_TABLE,
        Dialect::Jinja => &JINJA_TABLE,
        Dialect::Nunjucks => &NUNJUCKS_TABLE,
        Dialect::Handlebars => &HANDLEBARS_TABLE,
        Dialect::GoTemplate => &GO_TABLE,
    }
}

/// Classification given to template openers the table does not know
fn statement_default(dialect: Dialect) -> Classification {
    // Handlebars only produces openers for `{{#name}}`, which are blocks by syntax
    if dialect == Dialect::Handlebars {
        Block
    } else {
        InlineContainer
    }
}

/// Classify a template statement name for a dialect (case-insensitive)
#[must_use]
pub fn classify(dialect: Dialect, tag_name: &str) -> Classification {
    let name = tag_name.to_ascii_lowercase();
    template_table(dialect)
        .get(name.as_str())
        .map_or_else(|| statement_default(dialect), |entry| entry.class)
}

/// Classify an HTML element name (case-insensitive)
#[must_use]
pub fn classify_html(tag_name: &str) -> Classification {
    let name = tag_name.to_ascii_lowercase();
    HTML_TABLE
        .get(name.as_str())
        .map_or(InlineContainer, |entry| entry.class)
}

/// Whether an HTML element switches the tokenizer into raw-text mode
#[must_use]
pub fn is_raw_text_element(tag_name: &str) -> bool {
    matches!(
        tag_name.to_ascii_lowercase().as_str(),
        "script" | "style" | "textarea"
    )
}

/// Tag table resolved for one run: dialect table plus config overrides
#[derive(Debug, Clone)]
pub struct TagTable {
    profile: DialectProfile,
    preserve: HashSet<String>,
    custom_blocks: HashSet<String>,
    custom_html: HashSet<String>,
    markers: IgnoreMarkers,
}

impl TagTable {
    #[must_use]
    pub fn new(dialect: Dialect, config: &FormatConfig) -> Self {
        let lower = |names: &[String]| -> HashSet<String> {
            names.iter().map(|n| n.to_ascii_lowercase()).collect()
        };
        Self {
            profile: dialect.profile(),
            preserve: config.preserve_tags.iter().map(|n| n.to_ascii_lowercase()).collect(),
            custom_blocks: lower(&config.custom_blocks),
            custom_html: lower(&config.custom_html),
            markers: config.ignore_directive_markers.clone(),
        }
    }

    #[must_use]
    pub fn profile(&self) -> &DialectProfile {
        &self.profile
    }

    #[must_use]
    pub fn markers(&self) -> &IgnoreMarkers {
        &self.markers
    }

    fn entry(&self, syntax: Syntax, name: &str) -> Option<Entry> {
        match syntax {
            Syntax::Html => HTML_TABLE.get(name).copied(),
            Syntax::Template => template_table(self.profile.dialect).get(name).copied(),
        }
    }

    /// Classify a tag name, honoring `preserve_tags`, `custom_blocks` and `custom_html`
    #[must_use]
    pub fn classify_name(&self, syntax: Syntax, name: &str) -> Classification {
        let name = name.to_ascii_lowercase();
        if self.preserve.contains(&name) {
            return RawPreserving;
        }
        match syntax {
            Syntax::Html if self.custom_html.contains(&name) => Block,
            Syntax::Template if self.custom_blocks.contains(&name) => Block,
            Syntax::Html => classify_html(&name),
            Syntax::Template => classify(self.profile.dialect, &name),
        }
    }

    /// Layout policy of a block tag
    #[must_use]
    pub fn layout(&self, syntax: Syntax, name: &str) -> Layout {
        self.entry(syntax, &name.to_ascii_lowercase())
            .map_or(Layout::Auto, |entry| entry.layout)
    }

    /// Whether `end<name>` (or `/name`) may close a tag called `name`
    #[must_use]
    pub fn is_closable(&self, syntax: Syntax, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        if self.entry(syntax, &lower).is_some_and(|entry| entry.capture) {
            return true;
        }
        matches!(self.classify_name(syntax, &lower), Block | RawPreserving)
    }

    /// Opener name closed by `end<base>`
    #[must_use]
    pub fn closer_target(&self, syntax: Syntax, base: &str) -> String {
        if syntax == Syntax::Template && self.profile.dialect == Dialect::Nunjucks {
            if let Some((_, opener)) = NUNJUCKS_CLOSER_ALIASES
                .iter()
                .find(|(alias, _)| *alias == base)
            {
                return (*opener).to_string();
            }
        }
        base.to_string()
    }

    /// Classify a token in context
    #[must_use]
    pub fn classify_token(&self, token: &Token) -> Classification {
        match token.kind {
            TokenKind::Literal | TokenKind::RawTextRun | TokenKind::ExpressionOutput => {
                InlineContainer
            }
            TokenKind::TagSelfClosing => Void,
            TokenKind::TagComment => match find_marker(&token.raw_text, &self.markers) {
                Some(DirectiveKind::IgnoreOn | DirectiveKind::IgnoreOff) => {
                    Classification::Toggle
                }
                None => RawPreserving,
            },
            TokenKind::TagClose => match token.tag_name.as_deref() {
                Some(name) if self.classify_name(token.syntax, name) == RawPreserving => {
                    RawPreserving
                }
                _ => Block,
            },
            TokenKind::TagOpen => {
                let Some(name) = token.tag_name.as_deref() else {
                    return InlineContainer;
                };
                let lower = name.to_ascii_lowercase();
                if !self.preserve.contains(&lower)
                    && self
                        .entry(token.syntax, &lower)
                        .is_some_and(|entry| entry.capture)
                {
                    return if token.raw_text.contains('=') { Void } else { Block };
                }
                self.classify_name(token.syntax, &lower)
            }
        }
    }

    /// Whether a Curly/Go/Handlebars statement uses the given family
    #[must_use]
    pub fn family(&self) -> Family {
        self.profile.family
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_django() {
        assert_eq!(classify(Dialect::Django, "for"), Block);
        assert_eq!(classify(Dialect::Django, "FOR"), Block);
        assert_eq!(classify(Dialect::Django, "comment"), RawPreserving);
        assert_eq!(classify(Dialect::Django, "include"), Void);
        assert_eq!(classify(Dialect::Django, "empty"), Branch);
        assert_eq!(classify(Dialect::Django, "my_custom_tag"), InlineContainer);
    }

    #[test]
    fn test_classify_other_dialects() {
        assert_eq!(classify(Dialect::Jinja, "raw"), RawPreserving);
        assert_eq!(classify(Dialect::Nunjucks, "elseif"), Branch);
        assert_eq!(classify(Dialect::Nunjucks, "asyncEach"), Block);
        assert_eq!(classify(Dialect::GoTemplate, "range"), Block);
        assert_eq!(classify(Dialect::GoTemplate, "template"), Void);
        assert_eq!(classify(Dialect::Handlebars, "each"), Block);
        assert_eq!(classify(Dialect::Handlebars, "else"), Branch);
    }

    #[test]
    fn test_classify_html() {
        assert_eq!(classify_html("DIV"), Block);
        assert_eq!(classify_html("img"), Void);
        assert_eq!(classify_html("span"), InlineContainer);
        assert_eq!(classify_html("script"), RawPreserving);
        assert_eq!(classify_html("my-widget"), InlineContainer);
    }

    #[test]
    fn test_raw_text_elements() {
        assert!(is_raw_text_element("SCRIPT"));
        assert!(is_raw_text_element("textarea"));
        assert!(!is_raw_text_element("pre"));
    }

    #[test]
    fn test_table_overrides() {
        let config = FormatConfig {
            preserve_tags: ["div".to_string()].into_iter().collect(),
            custom_blocks: vec!["Toc".to_string()],
            custom_html: vec!["my-card".to_string()],
            ..FormatConfig::default()
        };
        let table = TagTable::new(Dialect::Django, &config);
        assert_eq!(table.classify_name(Syntax::Html, "div"), RawPreserving);
        assert_eq!(table.classify_name(Syntax::Template, "toc"), Block);
        assert_eq!(table.classify_name(Syntax::Html, "my-card"), Block);
        assert!(table.is_closable(Syntax::Template, "toc"));
        assert!(!table.is_closable(Syntax::Template, "include"));
    }

    #[test]
    fn test_layout() {
        let table = TagTable::new(Dialect::Django, &FormatConfig::default());
        assert_eq!(table.layout(Syntax::Template, "filter"), Layout::Expanded);
        assert_eq!(table.layout(Syntax::Template, "for"), Layout::Auto);
        assert_eq!(table.layout(Syntax::Html, "div"), Layout::Auto);
    }

    #[test]
    fn test_capture_set_is_closable() {
        let table = TagTable::new(Dialect::Jinja, &FormatConfig::default());
        assert!(table.is_closable(Syntax::Template, "set"));
        let django = TagTable::new(Dialect::Django, &FormatConfig::default());
        assert!(!django.is_closable(Syntax::Template, "set"));
    }

    #[test]
    fn test_nunjucks_closer_aliases() {
        let table = TagTable::new(Dialect::Nunjucks, &FormatConfig::default());
        assert_eq!(table.closer_target(Syntax::Template, "each"), "asynceach");
        assert_eq!(table.closer_target(Syntax::Template, "for"), "for");
        let django = TagTable::new(Dialect::Django, &FormatConfig::default());
        assert_eq!(django.closer_target(Syntax::Template, "each"), "each");
    }
}
