#![forbid(unsafe_code)]

//! Native preview surface: lays the markdown out with egui widgets and keeps
//! the last full HTML document around for "Copy HTML".

use eframe::egui;
use mdpane_core::{PreviewSurface, RenderedPreview, markdown::Extensions};
use pulldown_cmark::{CodeBlockKind, Event, Tag, TagEnd};

/// Heading sizes relative to the `Heading` text style, `h1` first.
const HEADING_SCALE: [f32; 6] = [1.3, 1.15, 1.0, 0.92, 0.85, 0.8];
const QUOTE_INDENT: i8 = 12;
const LIST_INDENT: f32 = 16.0;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Style {
    italic: bool,
    bold: bool,
    mono: bool,
    struck: bool,
    link: Option<String>,
}

#[derive(Clone, Debug)]
struct Run {
    text: String,
    style: Style,
}

/// Styled text for one block, adjacent runs of equal style merged.
#[derive(Clone, Debug, Default)]
struct Line {
    runs: Vec<Run>,
}

impl Line {
    fn push(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.runs.last_mut()
            && last.style == style
        {
            last.text.push_str(text);
            return;
        }
        self.runs.push(Run {
            text: text.to_owned(),
            style,
        });
    }

    fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    fn layout(&self, ui: &egui::Ui, font: &egui::FontId) -> egui::text::LayoutJob {
        let visuals = ui.visuals();
        let mut job = egui::text::LayoutJob::default();

        for run in &self.runs {
            let style = &run.style;
            let mut format = egui::text::TextFormat::simple(
                if style.mono {
                    egui::FontId::monospace(font.size * 0.9)
                } else {
                    font.clone()
                },
                if style.bold {
                    visuals.strong_text_color()
                } else {
                    visuals.text_color()
                },
            );
            format.italics = style.italic;
            if style.mono {
                format.background = visuals.faint_bg_color;
            }
            if style.struck {
                format.strikethrough = egui::Stroke::new(1.0, format.color);
            }
            if style.link.is_some() {
                format.color = visuals.hyperlink_color;
                format.underline = egui::Stroke::new(1.0, visuals.hyperlink_color);
            }
            job.append(&run.text, 0.0, format);
        }

        job
    }
}

#[derive(Clone, Debug)]
struct Row {
    header: bool,
    cells: Vec<Line>,
}

#[derive(Clone, Debug)]
enum Body {
    Heading {
        level: usize,
        line: Line,
    },
    Text(Line),
    Item {
        depth: usize,
        task: Option<bool>,
        line: Line,
    },
    Code {
        language: Option<String>,
        code: String,
    },
    Table(Vec<Row>),
    Rule,
}

/// A laid-out block and the number of block quotes around it.
#[derive(Clone, Debug)]
struct Block {
    quote: usize,
    body: Body,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct PreviewDoc {
    blocks: Vec<Block>,
}

/// What the text currently being collected will become.
#[derive(Clone, Copy, Debug)]
enum Open {
    Heading(usize),
    Text,
    Item(usize),
}

#[derive(Default)]
struct TableState {
    rows: Vec<Row>,
    row: Vec<Line>,
    cell: Option<Line>,
    in_head: bool,
}

/// Event-stream state while flattening markdown into [`Block`]s.
#[derive(Default)]
struct Builder {
    blocks: Vec<Block>,
    open: Option<Open>,
    line: Line,
    quote: usize,
    list_depth: usize,
    italic: usize,
    bold: usize,
    struck: usize,
    links: Vec<String>,
    task: Option<bool>,
    code: Option<(Option<String>, String)>,
    table: Option<TableState>,
}

impl Builder {
    fn style(&self) -> Style {
        Style {
            italic: self.italic > 0,
            bold: self.bold > 0,
            mono: false,
            struck: self.struck > 0,
            link: self.links.last().cloned(),
        }
    }

    fn emit(&mut self, body: Body) {
        self.blocks.push(Block {
            quote: self.quote,
            body,
        });
    }

    fn text(&mut self, text: &str, style: Style) {
        if let Some((_, code)) = self.code.as_mut() {
            code.push_str(text);
            return;
        }
        match self.table.as_mut().and_then(|t| t.cell.as_mut()) {
            Some(cell) => cell.push(text, style),
            None => self.line.push(text, style),
        }
    }

    fn open(&mut self, open: Open) {
        if self.table.is_none() {
            self.open = Some(open);
            self.line = Line::default();
        }
    }

    /// Emit whatever is being collected as the block it was opened as.
    fn close(&mut self) {
        let Some(open) = self.open.take() else {
            return;
        };
        let line = std::mem::take(&mut self.line);
        let body = match open {
            Open::Heading(level) => Body::Heading { level, line },
            Open::Text => Body::Text(line),
            Open::Item(depth) => Body::Item {
                depth,
                task: self.task.take(),
                line,
            },
        };
        self.emit(body);
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::BlockQuote(_) => self.quote = self.quote.saturating_add(1),
            Tag::List(_) => {
                // A nested list ends the text of the item that contains it.
                if matches!(self.open, Some(Open::Item(_))) && !self.line.is_empty() {
                    self.close();
                }
                self.list_depth = self.list_depth.saturating_add(1);
            }
            Tag::Item => {
                self.open(Open::Item(self.list_depth));
                self.task = None;
            }
            Tag::Paragraph => match self.open {
                None => self.open(Open::Text),
                // Paragraphs of a loose item stay in the item, one per line.
                Some(Open::Item(_)) if !self.line.is_empty() => {
                    self.line.push("\n", Style::default());
                }
                Some(_) => {}
            },
            Tag::Heading { level, .. } => self.open(Open::Heading(level as usize)),
            Tag::Emphasis => self.italic = self.italic.saturating_add(1),
            Tag::Strong => self.bold = self.bold.saturating_add(1),
            Tag::Strikethrough => self.struck = self.struck.saturating_add(1),
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.links.push(dest_url.to_string());
            }
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some((language, String::new()));
            }
            Tag::HtmlBlock => self.code = Some((Some("html".to_owned()), String::new())),
            Tag::Table(_) => self.table = Some(TableState::default()),
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_head = true;
                }
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.cell = Some(Line::default());
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, end: TagEnd) {
        match end {
            TagEnd::BlockQuote(_) => self.quote = self.quote.saturating_sub(1),
            TagEnd::List(_) => self.list_depth = self.list_depth.saturating_sub(1),
            TagEnd::Emphasis => self.italic = self.italic.saturating_sub(1),
            TagEnd::Strong => self.bold = self.bold.saturating_sub(1),
            TagEnd::Strikethrough => self.struck = self.struck.saturating_sub(1),
            TagEnd::Link | TagEnd::Image => {
                let _ = self.links.pop();
            }
            TagEnd::CodeBlock | TagEnd::HtmlBlock => {
                if let Some((language, code)) = self.code.take() {
                    self.emit(Body::Code { language, code });
                }
            }
            TagEnd::Heading(_) => {
                if matches!(self.open, Some(Open::Heading(_))) {
                    self.close();
                }
            }
            TagEnd::Paragraph => {
                if matches!(self.open, Some(Open::Text)) {
                    self.close();
                }
            }
            TagEnd::Item => {
                if matches!(self.open, Some(Open::Item(_))) {
                    self.close();
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut()
                    && let Some(cell) = table.cell.take()
                {
                    table.row.push(cell);
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    let cells = std::mem::take(&mut table.row);
                    table.rows.push(Row {
                        header: table.in_head,
                        cells,
                    });
                    table.in_head = false;
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.emit(Body::Table(table.rows));
                }
            }
            _ => {}
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(end) => self.end(end),
            Event::Text(text) => {
                let style = self.style();
                self.text(&text, style);
            }
            Event::Code(text) | Event::InlineHtml(text) | Event::InlineMath(text) => {
                let style = Style {
                    mono: true,
                    ..Style::default()
                };
                self.text(&text, style);
            }
            Event::Html(text) => {
                if let Some((_, code)) = self.code.as_mut() {
                    code.push_str(&text);
                }
            }
            Event::SoftBreak => {
                let style = self.style();
                let text = if self.code.is_some() { "\n" } else { " " };
                self.text(text, style);
            }
            Event::HardBreak => {
                let style = self.style();
                self.text("\n", style);
            }
            Event::FootnoteReference(label) => {
                let style = Style {
                    link: Some(format!("#{label}")),
                    ..Style::default()
                };
                self.text(&format!("[{label}]"), style);
            }
            Event::TaskListMarker(checked) => {
                if self.table.is_none() {
                    self.task = Some(checked);
                }
            }
            Event::Rule => self.emit(Body::Rule),
            Event::DisplayMath(_) => {}
        }
    }
}

/// Flatten markdown into blocks egui can lay out (no egui types).
pub(crate) fn parse(source: &str, extensions: Extensions) -> PreviewDoc {
    let mut builder = Builder::default();
    for event in mdpane_core::markdown::parser(source, extensions) {
        builder.event(event);
    }
    PreviewDoc {
        blocks: builder.blocks,
    }
}

/// The preview panel. Receives full re-renders and scroll requests from
/// [`mdpane_core::PreviewSync`].
#[derive(Default)]
pub(crate) struct PreviewPane {
    extensions: Extensions,
    rendered: RenderedPreview,
    doc: PreviewDoc,
    content_height: f32,
    scroll_request: Option<f32>,
}

impl PreviewPane {
    pub(crate) fn new(extensions: Extensions) -> Self {
        Self {
            extensions,
            ..Self::default()
        }
    }

    /// Full HTML document of the last render.
    pub(crate) fn html(&self) -> &str {
        self.rendered.html()
    }

    pub(crate) fn show(&mut self, ui: &mut egui::Ui) {
        let mut area = egui::ScrollArea::vertical()
            .id_salt("preview")
            .auto_shrink([false; 2]);
        if let Some(offset) = self.scroll_request.take() {
            area = area.vertical_scroll_offset(offset);
        }

        let doc = &self.doc;
        let output = area.show(ui, |ui| {
            egui::Frame::NONE
                .inner_margin(egui::Margin::same(12))
                .show(ui, |ui| {
                    for (idx, block) in doc.blocks.iter().enumerate() {
                        show_block(ui, idx, block);
                    }
                });
        });
        self.content_height = output.content_size.y;
    }
}

impl PreviewSurface for PreviewPane {
    fn replace(&mut self, preview: RenderedPreview) {
        self.doc = parse(preview.markdown(), self.extensions);
        self.rendered = preview;
    }

    fn content_height(&self) -> f32 {
        self.content_height
    }

    fn scroll_to(&mut self, offset: f32) {
        self.scroll_request = Some(offset);
    }
}

fn show_block(ui: &mut egui::Ui, idx: usize, block: &Block) {
    if block.quote == 0 {
        show_body(ui, idx, &block.body);
        return;
    }

    let indent = QUOTE_INDENT.saturating_mul(block.quote.min(8) as i8);
    let inner = egui::Frame::NONE
        .inner_margin(egui::Margin {
            left: indent,
            ..egui::Margin::ZERO
        })
        .show(ui, |ui| show_body(ui, idx, &block.body));

    let rect = inner.response.rect;
    let bar = egui::Stroke::new(2.0, ui.visuals().weak_text_color());
    for level in 0..block.quote.min(8) {
        let x = rect.left() + f32::from(QUOTE_INDENT) * level as f32 + 3.0;
        ui.painter().vline(x, rect.y_range(), bar);
    }
}

fn show_body(ui: &mut egui::Ui, idx: usize, body: &Body) {
    let body_font = egui::TextStyle::Body.resolve(ui.style());

    match body {
        Body::Heading { level, line } => {
            let base = egui::TextStyle::Heading.resolve(ui.style());
            let scale = HEADING_SCALE[(*level).clamp(1, 6) - 1];
            let font = egui::FontId::new(base.size * scale, base.family);
            ui.add_space(4.0);
            ui.add(egui::Label::new(line.layout(ui, &font)).wrap());
            ui.add_space(4.0);
        }
        Body::Text(line) => {
            ui.add(egui::Label::new(line.layout(ui, &body_font)).wrap());
            ui.add_space(6.0);
        }
        Body::Item { depth, task, line } => {
            ui.horizontal_wrapped(|ui| {
                ui.add_space(depth.saturating_sub(1) as f32 * LIST_INDENT);
                match task {
                    Some(checked) => {
                        let mut checked = *checked;
                        ui.add_enabled(false, egui::Checkbox::new(&mut checked, ""));
                    }
                    None => {
                        ui.label("•");
                    }
                }
                ui.add(egui::Label::new(line.layout(ui, &body_font)).wrap());
            });
            ui.add_space(2.0);
        }
        Body::Code { language, code } => {
            if let Some(lang) = language {
                ui.label(egui::RichText::new(lang).weak().small());
            }
            egui::Frame::group(ui.style())
                .fill(ui.visuals().faint_bg_color)
                .inner_margin(egui::Margin::same(8))
                .show(ui, |ui| {
                    let text = egui::RichText::new(code.trim_end_matches('\n')).monospace();
                    ui.add(egui::Label::new(text).wrap().selectable(true));
                });
            ui.add_space(6.0);
        }
        Body::Table(rows) => {
            let cols = rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
            egui::Grid::new(ui.id().with(("table", idx)))
                .striped(true)
                .show(ui, |ui| {
                    for row in rows {
                        for cell in &row.cells {
                            let mut job = cell.layout(ui, &body_font);
                            if row.header {
                                let strong = ui.visuals().strong_text_color();
                                for section in &mut job.sections {
                                    section.format.color = strong;
                                }
                            }
                            ui.add(egui::Label::new(job).wrap());
                        }
                        for _ in row.cells.len()..cols {
                            ui.label("");
                        }
                        ui.end_row();
                    }
                });
            ui.add_space(6.0);
        }
        Body::Rule => {
            ui.separator();
            ui.add_space(6.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> String {
        line.runs.iter().map(|run| run.text.as_str()).collect()
    }

    #[test]
    fn parses_common_blocks() {
        let md = "# Title\n\nHello *world* ~~gone~~.\n\n> quoted\n\n- [ ] a\n- [x] b\n\n| a | b |\n| - | - |\n| c | d |\n\n```rs\nlet x = 1;\n```\n";
        let doc = parse(md, Extensions::all());
        let bodies: Vec<&Body> = doc.blocks.iter().map(|b| &b.body).collect();

        assert!(matches!(bodies[0], Body::Heading { level: 1, .. }));
        assert!(matches!(bodies[1], Body::Text(_)));
        assert!(matches!(bodies[2], Body::Text(_)));
        assert_eq!(doc.blocks[2].quote, 1);
        assert_eq!(doc.blocks[3].quote, 0);
        assert!(matches!(bodies[3], Body::Item { task: Some(false), .. }));
        assert!(matches!(bodies[4], Body::Item { task: Some(true), .. }));

        let Body::Table(rows) = bodies[5] else {
            panic!("expected table");
        };
        assert_eq!(rows.len(), 2);
        assert!(rows[0].header);
        assert!(!rows[1].header);
        assert_eq!(rows[1].cells.len(), 2);

        let Body::Code { language, code } = bodies[6] else {
            panic!("expected code block");
        };
        assert_eq!(language.as_deref(), Some("rs"));
        assert_eq!(code, "let x = 1;\n");

        let Body::Text(line) = bodies[1] else {
            panic!("expected paragraph");
        };
        assert!(line.runs.iter().any(|r| r.style.struck));
        assert!(line.runs.iter().any(|r| r.style.italic));
    }

    #[test]
    fn default_options_keep_tables_as_text() {
        let doc = parse("| a | b |\n| - | - |\n| c | d |\n", Extensions::default());
        assert_eq!(doc.blocks.len(), 1);
        assert!(matches!(doc.blocks[0].body, Body::Text(_)));
    }

    #[test]
    fn nested_list_keeps_parent_text() {
        let doc = parse("- outer\n  - inner\n", Extensions::default());
        let items: Vec<(usize, String)> = doc
            .blocks
            .iter()
            .filter_map(|b| match &b.body {
                Body::Item { depth, line, .. } => Some((*depth, text_of(line))),
                _ => None,
            })
            .collect();
        assert_eq!(items, vec![(1, "outer".to_owned()), (2, "inner".to_owned())]);
    }

    #[test]
    fn loose_item_paragraphs_are_separated() {
        let doc = parse("- first para\n\n  second para\n- next\n", Extensions::default());
        let items: Vec<String> = doc
            .blocks
            .iter()
            .filter_map(|b| match &b.body {
                Body::Item { line, .. } => Some(text_of(line)),
                _ => None,
            })
            .collect();
        assert_eq!(items, vec!["first para\nsecond para", "next"]);
    }

    #[test]
    fn nested_quotes_record_depth() {
        let doc = parse("> outer\n>\n> > inner\n", Extensions::default());
        let depths: Vec<usize> = doc.blocks.iter().map(|b| b.quote).collect();
        assert_eq!(depths, vec![1, 2]);
    }

    #[test]
    fn image_alt_text_is_link_styled() {
        let doc = parse("![logo](logo.png)", Extensions::default());
        let Body::Text(line) = &doc.blocks[0].body else {
            panic!("expected paragraph");
        };
        assert_eq!(line.runs[0].text, "logo");
        assert_eq!(line.runs[0].style.link.as_deref(), Some("logo.png"));
    }

    #[test]
    fn pane_keeps_last_html_and_scroll_request() {
        let mut pane = PreviewPane::default();
        let rendered = mdpane_core::PreviewRenderer::default().render("# Hi");
        pane.replace(rendered);
        pane.scroll_to(42.0);

        assert!(pane.html().contains("<h1>Hi</h1>"));
        assert_eq!(pane.scroll_request, Some(42.0));
        assert!(matches!(pane.doc.blocks[0].body, Body::Heading { level: 1, .. }));
    }
}
