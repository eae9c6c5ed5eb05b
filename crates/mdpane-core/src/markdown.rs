use pulldown_cmark::{Options, Parser};
use serde::Deserialize;

/// Optional GitHub-flavoured extensions. All off means plain CommonMark.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Extensions {
    pub tables: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub footnotes: bool,
}

impl Extensions {
    /// Plain CommonMark.
    pub const fn none() -> Self {
        Self {
            tables: false,
            strikethrough: false,
            tasklists: false,
            footnotes: false,
        }
    }

    /// Every extension switched on.
    pub const fn all() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            tasklists: true,
            footnotes: true,
        }
    }

    fn options(self) -> Options {
        let mut options = Options::empty();
        options.set(Options::ENABLE_TABLES, self.tables);
        options.set(Options::ENABLE_STRIKETHROUGH, self.strikethrough);
        options.set(Options::ENABLE_TASKLISTS, self.tasklists);
        options.set(Options::ENABLE_FOOTNOTES, self.footnotes);
        options
    }
}

/// Create a `pulldown-cmark` parser with the given extensions enabled.
pub fn parser(source: &str, extensions: Extensions) -> Parser<'_> {
    Parser::new_ext(source, extensions.options())
}

/// Convert markdown to an HTML body fragment.
///
/// Total over arbitrary input: malformed markdown renders as literal text.
pub fn to_html(source: &str, extensions: Extensions) -> String {
    let mut out = String::with_capacity(source.len() + source.len() / 2);
    pulldown_cmark::html::push_html(&mut out, parser(source, extensions));
    out
}
