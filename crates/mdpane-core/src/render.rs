//! Markdown to a complete, self-styled HTML preview document.

use crate::markdown::{self, Extensions};

const STYLESHEET: &str = r"
body {
  font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
  line-height: 1.6;
  color: #333;
  max-width: 800px;
  margin: 0 auto;
  padding: 20px;
}
h1, h2, h3 { color: #111; margin: 1.2em 0 0.6em; }
pre, code {
  font-family: 'SFMono-Regular', Consolas, 'Liberation Mono', Menlo, monospace;
  background-color: #f6f8fa;
  border-radius: 3px;
}
pre { padding: 16px; overflow: auto; line-height: 1.45; }
code { padding: 0.2em 0.4em; font-size: 85%; }
pre code { padding: 0; font-size: 100%; }
blockquote { border-left: 4px solid #dfe2e5; color: #6a737d; padding: 0 1em; margin-left: 0; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #dfe2e5; padding: 6px 13px; }
th { background-color: #f6f8fa; font-weight: 600; }
img { max-width: 100%; }
";

/// One full render of the document. Nothing is reused between renders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedPreview {
    markdown: String,
    fragment: String,
    html: String,
}

impl RenderedPreview {
    /// The source text this preview was rendered from.
    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    /// The converter's HTML body fragment.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// The fragment wrapped in the styled page template.
    pub fn html(&self) -> &str {
        &self.html
    }
}

/// Where previews are displayed. Implemented by the shell.
pub trait PreviewSurface {
    /// Drop whatever was shown and show `preview` instead.
    fn replace(&mut self, preview: RenderedPreview);

    /// Height of the laid-out preview content, in the surface's own units.
    /// May lag one layout pass behind [`PreviewSurface::replace`].
    fn content_height(&self) -> f32;

    fn scroll_to(&mut self, offset: f32);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PreviewRenderer {
    extensions: Extensions,
}

impl PreviewRenderer {
    pub const fn new(extensions: Extensions) -> Self {
        Self { extensions }
    }

    pub const fn extensions(&self) -> Extensions {
        self.extensions
    }

    pub fn render(&self, text: &str) -> RenderedPreview {
        let fragment = markdown::to_html(text, self.extensions);
        RenderedPreview {
            markdown: text.to_owned(),
            html: html_document(&fragment),
            fragment,
        }
    }
}

/// Wrap an HTML fragment in the preview page template.
pub fn html_document(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len() + STYLESHEET.len() + 128);
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<style>");
    out.push_str(STYLESHEET);
    out.push_str("</style>\n</head>\n<body>\n");
    out.push_str(fragment);
    out.push_str("</body>\n</html>\n");
    out
}
