//! Markdown document model.
//!
//! `#` headings open parts (chapters), `##` headings open sections, a block
//! quote directly before a paragraph becomes that paragraph's summary. Every
//! paragraph and list item is numbered in document order starting at 1.

use std::collections::HashSet;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

pub const SHORT_TOC_ID: &str = "short-toc";
const SHORT_TOC_TITLE: &str = "Contents";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub chapter: Option<usize>,
    pub follows_part_heading: bool,
    pub is_short_toc: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub number: u32,
    pub text: String,
    pub section: Option<usize>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    ShortToc,
    PartHeading(usize),
    SectionHeading(usize),
    Subheading(String),
    Paragraph(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub chapters: Vec<Chapter>,
    pub sections: Vec<Section>,
    pub paragraphs: Vec<Paragraph>,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn parse(title: &str, markdown: &str) -> Self {
        DocumentBuilder::new(title).run(markdown)
    }

    /// Sections listed in the table of contents (everything except the
    /// generated contents section itself).
    pub fn toc_sections(&self) -> impl Iterator<Item = (usize, &Section)> {
        self.sections
            .iter()
            .enumerate()
            .filter(|(_, section)| !section.is_short_toc)
    }

    pub fn short_toc_index(&self) -> Option<usize> {
        self.sections.iter().position(|s| s.is_short_toc)
    }

    pub fn paragraph(&self, number: u32) -> Option<&Paragraph> {
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        self.paragraphs.get(index)
    }

    /// Title of the section owning a paragraph, falling back to the document
    /// title.
    pub fn section_title_for(&self, paragraph: &Paragraph) -> &str {
        paragraph
            .section
            .and_then(|s| self.sections.get(s))
            .map(|s| s.title.as_str())
            .unwrap_or(&self.title)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    None,
    Heading(HeadingLevel),
    Text,
}

struct DocumentBuilder {
    doc: Document,
    used_ids: HashSet<String>,
    capture: Capture,
    buffer: String,
    heading_id: Option<String>,
    quote_depth: usize,
    quote: String,
    pending_summary: Option<String>,
    current_chapter: Option<usize>,
    current_section: Option<usize>,
    after_part_heading: bool,
}

impl DocumentBuilder {
    fn new(title: &str) -> Self {
        let mut used_ids = HashSet::new();
        used_ids.insert(SHORT_TOC_ID.to_string());
        Self {
            doc: Document {
                title: title.trim().to_string(),
                ..Document::default()
            },
            used_ids,
            capture: Capture::None,
            buffer: String::new(),
            heading_id: None,
            quote_depth: 0,
            quote: String::new(),
            pending_summary: None,
            current_chapter: None,
            current_section: None,
            after_part_heading: false,
        }
    }

    fn run(mut self, markdown: &str) -> Document {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        for event in Parser::new_ext(markdown, options) {
            match event {
                Event::Start(Tag::Heading { level, id, .. }) => {
                    self.capture = Capture::Heading(level);
                    self.heading_id = id.map(|id| id.to_string());
                    self.buffer.clear();
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Capture::Heading(level) = self.capture {
                        let text = std::mem::take(&mut self.buffer);
                        let explicit_id = self.heading_id.take();
                        self.push_heading(level, text.trim(), explicit_id);
                    }
                    self.capture = Capture::None;
                }
                Event::Start(Tag::BlockQuote) => {
                    self.quote_depth += 1;
                }
                Event::End(TagEnd::BlockQuote) => {
                    self.quote_depth = self.quote_depth.saturating_sub(1);
                    if self.quote_depth == 0 {
                        let quote = std::mem::take(&mut self.quote);
                        let quote = quote.trim();
                        if !quote.is_empty() {
                            self.pending_summary = Some(quote.to_string());
                        }
                    }
                }
                Event::Start(Tag::Item) if self.capture == Capture::Text => {
                    // Nested item: the outer item's text so far is its own paragraph.
                    self.flush_text();
                    self.capture = Capture::Text;
                }
                Event::Start(Tag::Paragraph) | Event::Start(Tag::Item) => {
                    if self.capture == Capture::None {
                        self.capture = Capture::Text;
                        self.buffer.clear();
                    }
                }
                Event::End(TagEnd::Paragraph) | Event::End(TagEnd::Item) => {
                    if self.capture == Capture::Text {
                        self.flush_text();
                    }
                }
                Event::Text(text) | Event::Code(text) => {
                    self.buffer.push_str(&text);
                }
                Event::SoftBreak | Event::HardBreak => {
                    self.buffer.push(' ');
                }
                _ => {}
            }
        }

        if self.capture == Capture::Text {
            self.flush_text();
        }
        self.insert_short_toc();
        self.doc
    }

    fn flush_text(&mut self) {
        self.capture = Capture::None;
        let text = collapse_whitespace(&std::mem::take(&mut self.buffer));
        if text.is_empty() {
            return;
        }

        if self.quote_depth > 0 {
            if !self.quote.is_empty() {
                self.quote.push(' ');
            }
            self.quote.push_str(&text);
            return;
        }

        let number = u32::try_from(self.doc.paragraphs.len() + 1).unwrap_or(u32::MAX);
        self.doc.paragraphs.push(Paragraph {
            number,
            text,
            section: self.current_section,
            summary: self.pending_summary.take(),
        });
        self.doc
            .blocks
            .push(Block::Paragraph(self.doc.paragraphs.len() - 1));
        self.after_part_heading = false;
    }

    fn push_heading(&mut self, level: HeadingLevel, title: &str, explicit_id: Option<String>) {
        let title = collapse_whitespace(title);
        match level {
            HeadingLevel::H1 => {
                let id = self.claim_id(explicit_id, &title);
                self.doc.chapters.push(Chapter { id, title });
                let index = self.doc.chapters.len() - 1;
                self.doc.blocks.push(Block::PartHeading(index));
                self.current_chapter = Some(index);
                self.current_section = None;
                self.after_part_heading = true;
            }
            HeadingLevel::H2 => {
                let id = self.claim_id(explicit_id, &title);
                self.doc.sections.push(Section {
                    id,
                    title,
                    chapter: self.current_chapter,
                    follows_part_heading: self.after_part_heading,
                    is_short_toc: false,
                });
                let index = self.doc.sections.len() - 1;
                self.doc.blocks.push(Block::SectionHeading(index));
                self.current_section = Some(index);
                self.after_part_heading = false;
            }
            _ => {
                self.doc.blocks.push(Block::Subheading(title));
                self.after_part_heading = false;
            }
        }
        self.pending_summary = None;
    }

    fn claim_id(&mut self, explicit: Option<String>, title: &str) -> String {
        let base = explicit
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| slug::slugify(title));
        let base = unambiguous_id(if base.is_empty() {
            "section".to_string()
        } else {
            base
        });

        let mut id = base.clone();
        let mut n = 2;
        while !self.used_ids.insert(id.clone()) {
            id = format!("{base}-{n}");
            n += 1;
        }
        id
    }

    /// The contents section goes first and shifts every section index by one.
    fn insert_short_toc(&mut self) {
        if self.doc.sections.is_empty() {
            return;
        }
        self.doc.sections.insert(
            0,
            Section {
                id: SHORT_TOC_ID.to_string(),
                title: SHORT_TOC_TITLE.to_string(),
                chapter: None,
                follows_part_heading: false,
                is_short_toc: true,
            },
        );
        for block in &mut self.doc.blocks {
            if let Block::SectionHeading(index) = block {
                *index += 1;
            }
        }
        for paragraph in &mut self.doc.paragraphs {
            if let Some(section) = paragraph.section.as_mut() {
                *section += 1;
            }
        }
        self.doc.blocks.insert(0, Block::ShortToc);
    }
}

/// Heading ids must not read as paragraph (`p12`, `intro-p3`) or summary
/// (`s12`) references in a fragment.
fn unambiguous_id(id: String) -> String {
    if looks_generated(&id) {
        return format!("{id}-section");
    }
    let mut out = String::with_capacity(id.len() + 2);
    let mut rest = id.as_str();
    while let Some(idx) = rest.find("-p") {
        out.push_str(&rest[..idx + 2]);
        rest = &rest[idx + 2..];
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            out.push('-');
        }
    }
    out.push_str(rest);
    out
}

fn looks_generated(id: &str) -> bool {
    let mut chars = id.chars();
    matches!(chars.next(), Some('p' | 's'))
        && !chars.as_str().is_empty()
        && chars.all(|c| c.is_ascii_digit())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
