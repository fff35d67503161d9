//! Line layout of a document at a fixed text measure.
//!
//! Every addressable element gets a row span. Spans are recorded in document
//! order, containers before their contents, which is also the order a
//! fragment lookup scans them in.

use bifocals_core::ElementId;
use unicode_width::UnicodeWidthStr;

use crate::document::{Block, Document, SHORT_TOC_ID};

/// Columns reserved left of the text for paragraph numbers.
pub const GUTTER: u16 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Title,
    TocHeading,
    TocEntry(usize),
    PartHeading(usize),
    SectionHeading(usize),
    Subheading,
    Summary(usize),
    Paragraph { index: usize, first: bool },
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutLine {
    pub kind: LineKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowSpan {
    pub top: usize,
    pub height: usize,
}

impl RowSpan {
    pub fn bottom(&self) -> usize {
        self.top + self.height
    }
}

/// What a laid-out element id refers to in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRef {
    Chapter(usize),
    ChapterHeading(usize),
    Section(usize),
    SectionHeading(usize),
    Summary(usize),
    Paragraph(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaidOutElement {
    pub id: ElementId,
    pub target: ElementRef,
    pub span: RowSpan,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParagraphSpans {
    /// Summary plus body.
    pub container: RowSpan,
    pub body: RowSpan,
}

#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub measure: u16,
    pub lines: Vec<LayoutLine>,
    pub elements: Vec<LaidOutElement>,
    pub sections: Vec<RowSpan>,
    pub chapters: Vec<RowSpan>,
    pub paragraphs: Vec<ParagraphSpans>,
}

impl Layout {
    pub fn build(doc: &Document, measure: u16) -> Self {
        let mut builder = LayoutBuilder {
            doc,
            width: usize::from(measure.max(1)),
            layout: Layout {
                measure,
                sections: vec![RowSpan::default(); doc.sections.len()],
                chapters: vec![RowSpan::default(); doc.chapters.len()],
                paragraphs: vec![ParagraphSpans::default(); doc.paragraphs.len()],
                ..Layout::default()
            },
            open_section: None,
            open_chapter: None,
        };
        builder.run();
        builder.layout
    }

    pub fn height(&self) -> usize {
        self.lines.len()
    }

    /// Full column width of a paragraph including its number gutter.
    pub fn paragraph_width(&self) -> u16 {
        self.measure + GUTTER
    }

    pub fn find(&self, id: &ElementId) -> Option<&LaidOutElement> {
        self.elements.iter().find(|e| &e.id == id)
    }

    pub fn line(&self, row: usize) -> Option<&LayoutLine> {
        self.lines.get(row)
    }
}

struct LayoutBuilder<'a> {
    doc: &'a Document,
    width: usize,
    layout: Layout,
    open_section: Option<(usize, usize)>,
    open_chapter: Option<(usize, usize)>,
}

impl LayoutBuilder<'_> {
    fn run(&mut self) {
        let doc = self.doc;
        self.push_wrapped(LineKind::Title, &doc.title);
        self.blank();

        for block in &doc.blocks {
            match block {
                Block::ShortToc => self.short_toc(),
                Block::PartHeading(index) => {
                    self.close_section();
                    self.close_chapter();
                    let chapter = &doc.chapters[*index];
                    let element = self.open(
                        ElementId::container_of(&chapter.id),
                        ElementRef::Chapter(*index),
                    );
                    self.open_chapter = Some((*index, element));
                    let top = self.row();
                    self.push_wrapped(LineKind::PartHeading(*index), &chapter.title);
                    self.record(
                        ElementId::new(chapter.id.clone()),
                        ElementRef::ChapterHeading(*index),
                        top,
                    );
                    self.blank();
                }
                Block::SectionHeading(index) => {
                    self.close_section();
                    let section = &doc.sections[*index];
                    let element = self.open(
                        ElementId::container_of(&section.id),
                        ElementRef::Section(*index),
                    );
                    self.open_section = Some((*index, element));
                    let top = self.row();
                    self.push_wrapped(LineKind::SectionHeading(*index), &section.title);
                    self.record(
                        ElementId::new(section.id.clone()),
                        ElementRef::SectionHeading(*index),
                        top,
                    );
                    self.blank();
                }
                Block::Subheading(text) => {
                    self.push_wrapped(LineKind::Subheading, text);
                    self.blank();
                }
                Block::Paragraph(index) => self.paragraph(*index),
            }
        }

        self.close_section();
        self.close_chapter();
        while self
            .layout
            .lines
            .last()
            .is_some_and(|l| l.kind == LineKind::Blank)
            && self.layout.lines.len() > 1
        {
            self.layout.lines.pop();
        }
    }

    fn short_toc(&mut self) {
        let doc = self.doc;
        let Some(index) = doc.short_toc_index() else {
            return;
        };
        let element = self.open(
            ElementId::container_of(SHORT_TOC_ID),
            ElementRef::Section(index),
        );
        let top = self.row();
        self.push_line(LineKind::TocHeading, doc.sections[index].title.clone());
        self.record(
            ElementId::new(SHORT_TOC_ID),
            ElementRef::SectionHeading(index),
            top,
        );
        for (section_index, section) in doc.toc_sections() {
            let indent = if section.chapter.is_some() { "  " } else { "" };
            let text = truncate_to_width(&format!("{indent}{}", section.title), self.width);
            self.push_line(LineKind::TocEntry(section_index), text);
        }
        self.close(element, index, true);
        self.blank();
    }

    fn paragraph(&mut self, index: usize) {
        let doc = self.doc;
        let paragraph = &doc.paragraphs[index];
        let container_top = self.row();
        if let Some(summary) = paragraph.summary.as_deref() {
            let top = self.row();
            self.push_wrapped(LineKind::Summary(index), summary);
            self.record(
                ElementId::summary(paragraph.number),
                ElementRef::Summary(index),
                top,
            );
        }
        let body_top = self.row();
        for (i, line) in wrap_text(&paragraph.text, self.width).into_iter().enumerate() {
            self.push_line(LineKind::Paragraph { index, first: i == 0 }, line);
        }
        self.record(
            ElementId::paragraph(paragraph.number),
            ElementRef::Paragraph(index),
            body_top,
        );
        self.layout.paragraphs[index] = ParagraphSpans {
            container: RowSpan {
                top: container_top,
                height: self.row() - container_top,
            },
            body: RowSpan {
                top: body_top,
                height: self.row() - body_top,
            },
        };
        self.blank();
    }

    fn row(&self) -> usize {
        self.layout.lines.len()
    }

    fn push_line(&mut self, kind: LineKind, text: String) {
        self.layout.lines.push(LayoutLine { kind, text });
    }

    fn push_wrapped(&mut self, kind: LineKind, text: &str) {
        for line in wrap_text(text, self.width) {
            self.push_line(kind, line);
        }
    }

    fn blank(&mut self) {
        if self
            .layout
            .lines
            .last()
            .is_some_and(|l| l.kind == LineKind::Blank)
        {
            return;
        }
        self.push_line(LineKind::Blank, String::new());
    }

    /// Records an element that ends at the current row.
    fn record(&mut self, id: ElementId, target: ElementRef, top: usize) {
        let span = RowSpan {
            top,
            height: self.row() - top,
        };
        self.layout.elements.push(LaidOutElement { id, target, span });
    }

    /// Records a container whose height is patched when it closes.
    fn open(&mut self, id: ElementId, target: ElementRef) -> usize {
        let top = self.row();
        self.layout.elements.push(LaidOutElement {
            id,
            target,
            span: RowSpan { top, height: 0 },
        });
        self.layout.elements.len() - 1
    }

    fn close(&mut self, element: usize, index: usize, is_section: bool) {
        let end = self.row();
        let span = &mut self.layout.elements[element].span;
        span.height = end.saturating_sub(span.top);
        let span = *span;
        if is_section {
            self.layout.sections[index] = span;
        } else {
            self.layout.chapters[index] = span;
        }
    }

    fn close_section(&mut self) {
        if let Some((index, element)) = self.open_section.take() {
            self.close_trailing_blank(element, index, true);
        }
    }

    fn close_chapter(&mut self) {
        if let Some((index, element)) = self.open_chapter.take() {
            self.close_trailing_blank(element, index, false);
        }
    }

    /// Containers end before the separating blank line.
    fn close_trailing_blank(&mut self, element: usize, index: usize, is_section: bool) {
        self.close(element, index, is_section);
        let trailing_blank = self
            .layout
            .lines
            .last()
            .is_some_and(|l| l.kind == LineKind::Blank);
        let span = &mut self.layout.elements[element].span;
        if trailing_blank && span.height > 1 {
            span.height -= 1;
        }
        let span = *span;
        if is_section {
            self.layout.sections[index] = span;
        } else {
            self.layout.chapters[index] = span;
        }
    }
}

pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in text.split_whitespace() {
        let word_width = UnicodeWidthStr::width(word);
        let sep_width = if current.is_empty() { 0 } else { 1 };

        if current_width + sep_width + word_width <= max_width {
            if !current.is_empty() {
                current.push(' ');
                current_width += 1;
            }
            current.push_str(word);
            current_width += word_width;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }

        if word_width <= max_width {
            current.push_str(word);
            current_width = word_width;
            continue;
        }

        let mut chunk = String::new();
        let mut chunk_width = 0usize;
        for ch in word.chars() {
            let mut buf = [0u8; 4];
            let w = UnicodeWidthStr::width(&*ch.encode_utf8(&mut buf));
            if chunk_width + w > max_width && !chunk.is_empty() {
                lines.push(std::mem::take(&mut chunk));
                chunk_width = 0;
            }
            chunk.push(ch);
            chunk_width += w;
        }
        current = chunk;
        current_width = chunk_width;
    }

    if !current.is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut width = 0usize;
    for ch in text.chars() {
        let mut buf = [0u8; 4];
        let w = UnicodeWidthStr::width(&*ch.encode_utf8(&mut buf));
        if width + w + 1 > max_width {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
# Part One

## Alpha

> Summary of one.

one two three four five six

## Beta

seven eight
";

    fn layout() -> (Document, Layout) {
        let doc = Document::parse("Book", SAMPLE);
        let layout = Layout::build(&doc, 10);
        (doc, layout)
    }

    #[test]
    fn wrap_text_respects_width() {
        assert_eq!(
            wrap_text("one two three four", 9),
            vec!["one two".to_string(), "three".to_string(), "four".to_string()]
        );
        assert_eq!(wrap_text("", 5), vec![String::new()]);
        assert_eq!(
            wrap_text("abcdefghij", 4),
            vec!["abcd".to_string(), "efgh".to_string(), "ij".to_string()]
        );
    }

    #[test]
    fn elements_follow_document_order() {
        let (_, layout) = layout();
        let ids: Vec<_> = layout.elements.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "_short-toc",
                "short-toc",
                "_part-one",
                "part-one",
                "_alpha",
                "alpha",
                "s1",
                "p1",
                "_beta",
                "beta",
                "p2",
            ]
        );
    }

    #[test]
    fn paragraph_container_includes_summary() {
        let (_, layout) = layout();
        let spans = layout.paragraphs[0];
        let summary = layout.find(&ElementId::summary(1)).unwrap().span;
        assert_eq!(spans.container.top, summary.top);
        assert_eq!(spans.body.top, summary.bottom());
        assert_eq!(spans.body.height, 3);
        assert_eq!(
            layout.lines[spans.body.top].kind,
            LineKind::Paragraph {
                index: 0,
                first: true
            }
        );
    }

    #[test]
    fn section_containers_do_not_overlap() {
        let (doc, layout) = layout();
        let index = |id: &str| doc.sections.iter().position(|s| s.id == id).unwrap();
        let alpha = layout.sections[index("alpha")];
        let beta = layout.sections[index("beta")];
        assert!(alpha.bottom() <= beta.top);
        assert_eq!(
            layout.lines[beta.top].kind,
            LineKind::SectionHeading(index("beta"))
        );
        let chapter = layout.chapters[0];
        assert!(chapter.top < alpha.top);
        assert!(chapter.bottom() >= beta.bottom());
    }

    #[test]
    fn short_toc_lists_sections() {
        let (_, layout) = layout();
        let entries: Vec<_> = layout
            .lines
            .iter()
            .filter(|l| matches!(l.kind, LineKind::TocEntry(_)))
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(entries, vec!["  Alpha", "  Beta"]);
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate_to_width("abcdef", 4), "abc…");
        assert_eq!(truncate_to_width("abc", 4), "abc");
    }
}
