//! The virtual page the navigation engine runs against.
//!
//! A [`Page`] lays a document out once per text measure and tracks a scroll
//! offset per pane in virtual pixels: one layout row is `line_height_px` tall
//! and one terminal column is `cell_width_px` wide. Offset changes and
//! fragment changes are queued as [`PageEvent`]s for the session to drain.

use std::collections::VecDeque;

use bifocals_core::{ElementId, PaneId, PreviewMeta, ScopedId, Settings, Viewport};

use crate::document::Document;
use crate::geometry::{Align, Behavior, Rect, scroll_target};
use crate::layout::{ElementRef, GUTTER, Layout, LayoutLine, RowSpan};
use crate::location::{
    AddressBar, ElementInfo, HeadingClick, LocationHost, ParagraphRect, SectionRect, TocEntryRect,
    TocView,
};
use crate::scroll::{PaneHost, PaneMetrics};

/// Rows taken by the header and footer bars.
pub const CHROME_ROWS: u16 = 2;
const MIN_MEASURE: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    Scroll(PaneId),
    HashChange,
}

/// Address bar state with a back/forward stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    base: String,
    fragment: String,
    back: Vec<String>,
    forward: Vec<String>,
}

impl Location {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            ..Self::default()
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn href(&self) -> String {
        format!("{}{}", self.base, self.fragment)
    }

    /// Adds a history entry. Pushing the current fragment is a no-op.
    pub fn push(&mut self, fragment: &str) -> bool {
        let fragment = normalize_fragment(fragment);
        if fragment == self.fragment {
            return false;
        }
        self.back.push(std::mem::replace(&mut self.fragment, fragment));
        self.forward.clear();
        true
    }

    pub fn replace(&mut self, fragment: &str) {
        self.fragment = normalize_fragment(fragment);
    }

    pub fn back(&mut self) -> bool {
        let Some(previous) = self.back.pop() else {
            return false;
        };
        self.forward.push(std::mem::replace(&mut self.fragment, previous));
        true
    }

    pub fn forward(&mut self) -> bool {
        let Some(next) = self.forward.pop() else {
            return false;
        };
        self.back.push(std::mem::replace(&mut self.fragment, next));
        true
    }
}

fn normalize_fragment(fragment: &str) -> String {
    let trimmed = fragment.trim();
    if trimmed.is_empty() || trimmed == "#" {
        String::new()
    } else if trimmed.starts_with('#') {
        trimmed.to_string()
    } else {
        format!("#{trimmed}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Animation {
    from: f64,
    to: f64,
    frame: u32,
    frames: u32,
}

impl Animation {
    fn step(&mut self) -> (f64, bool) {
        self.frame += 1;
        let t = f64::from(self.frame) / f64::from(self.frames.max(1));
        let eased = t * (2.0 - t);
        let done = self.frame >= self.frames;
        let value = if done {
            self.to
        } else {
            self.from + (self.to - self.from) * eased
        };
        (value, done)
    }
}

#[derive(Debug)]
pub struct Page {
    doc: Document,
    layout: Layout,
    preferred_measure: u16,
    line_height: i64,
    cell_width: i64,
    smooth_frames: u32,
    cols: u16,
    rows: u16,
    tops: [i64; 2],
    mirror_mounted: bool,
    animations: [Option<Animation>; 2],
    location: Location,
    toc_entries: Vec<usize>,
    toc_scroll: usize,
    toc_current: Option<usize>,
    preview: Option<PreviewMeta>,
    events: VecDeque<PageEvent>,
}

impl Page {
    pub fn new(doc: Document, base_url: impl Into<String>, settings: &Settings) -> Self {
        let toc_entries = doc.toc_sections().map(|(index, _)| index).collect();
        let layout = Layout::build(&doc, settings.measure);
        Self {
            doc,
            layout,
            preferred_measure: settings.measure,
            line_height: settings.line_height_px.max(1),
            cell_width: settings.cell_width_px.max(1),
            smooth_frames: settings.smooth_scroll_frames.max(1),
            cols: 0,
            rows: 0,
            tops: [0; 2],
            mirror_mounted: false,
            animations: [None; 2],
            location: Location::new(base_url),
            toc_entries,
            toc_scroll: 0,
            toc_current: None,
            preview: None,
            events: VecDeque::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn preview(&self) -> Option<&PreviewMeta> {
        self.preview.as_ref()
    }

    pub fn body_rows(&self) -> u16 {
        self.rows.saturating_sub(CHROME_ROWS)
    }

    pub fn is_mirror_mounted(&self) -> bool {
        self.mirror_mounted
    }

    pub fn pop_event(&mut self) -> Option<PageEvent> {
        self.events.pop_front()
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn is_animating(&self) -> bool {
        self.animations.iter().any(Option::is_some)
    }

    /// Resizes the window in terminal cells. The text measure follows the
    /// window width up to the preferred measure; a new measure relayouts the
    /// document and keeps each pane at the same relative position.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;

        let available = cols.saturating_sub(GUTTER + 2).max(MIN_MEASURE);
        let measure = self.preferred_measure.min(available);
        let mut targets = self.tops;
        if measure != self.layout.measure {
            let old_height = self.scroll_height().max(1) as f64;
            self.layout = Layout::build(&self.doc, measure);
            let new_height = self.scroll_height() as f64;
            for top in &mut targets {
                *top = (*top as f64 / old_height * new_height).round() as i64;
            }
            self.animations = [None; 2];
            log::debug!("page: relayout at measure {measure}");
        }

        for pane in [PaneId::Primary, PaneId::Mirror] {
            self.set_top(pane, targets[slot(pane)]);
        }
        self.reveal_toc_current();
    }

    /// First layout row shown in a pane.
    pub fn top_row(&self, pane: PaneId) -> usize {
        usize::try_from(self.tops[slot(pane)] / self.line_height).unwrap_or(0)
    }

    pub fn scroll_top(&self, pane: PaneId) -> i64 {
        self.tops[slot(pane)]
    }

    /// The layout line drawn at `body_row` of a pane.
    pub fn line_at(&self, pane: PaneId, body_row: u16) -> Option<&LayoutLine> {
        if body_row >= self.body_rows() {
            return None;
        }
        self.layout.line(self.top_row(pane) + usize::from(body_row))
    }

    pub fn visible_lines(&self, pane: PaneId) -> impl Iterator<Item = (usize, &LayoutLine)> {
        let top = self.top_row(pane);
        self.layout
            .lines
            .iter()
            .enumerate()
            .skip(top)
            .take(usize::from(self.body_rows()))
    }

    /// Reader-initiated scroll by whole rows; cancels a running animation.
    pub fn scroll_rows(&mut self, pane: PaneId, rows: i64) {
        self.animations[slot(pane)] = None;
        let top = self.tops[slot(pane)] + rows * self.line_height;
        self.set_top(pane, top);
    }

    pub fn scroll_pages(&mut self, pane: PaneId, pages: i64) {
        let rows = i64::from(self.body_rows().saturating_sub(1).max(1));
        self.scroll_rows(pane, pages * rows);
    }

    pub fn scroll_to_start(&mut self, pane: PaneId) {
        self.animations[slot(pane)] = None;
        self.set_top(pane, 0);
    }

    pub fn scroll_to_end(&mut self, pane: PaneId) {
        self.animations[slot(pane)] = None;
        self.set_top(pane, i64::MAX);
    }

    /// Advances smooth scrolls by one frame.
    pub fn tick(&mut self) -> bool {
        for pane in [PaneId::Primary, PaneId::Mirror] {
            let Some(animation) = self.animations[slot(pane)].as_mut() else {
                continue;
            };
            let (value, done) = animation.step();
            if done {
                self.animations[slot(pane)] = None;
            }
            self.set_top(pane, value.round() as i64);
        }
        self.is_animating()
    }

    /// Explicit navigation: adds a history entry and announces the change.
    pub fn go(&mut self, fragment: &str) -> bool {
        if !self.location.push(fragment) {
            return false;
        }
        self.events.push_back(PageEvent::HashChange);
        true
    }

    pub fn back(&mut self) -> bool {
        let moved = self.location.back();
        if moved {
            self.events.push_back(PageEvent::HashChange);
        }
        moved
    }

    pub fn forward(&mut self) -> bool {
        let moved = self.location.forward();
        if moved {
            self.events.push_back(PageEvent::HashChange);
        }
        moved
    }

    /// Follows an in-page anchor such as `#_intro`: jumps the primary pane to
    /// the element's top and records a history entry without a hash-change
    /// announcement.
    pub fn follow_anchor(&mut self, href: &str) -> bool {
        let Some(id) = href.strip_prefix('#') else {
            return false;
        };
        let target = ScopedId::primary(ElementId::new(id));
        if self.layout.find(&target.id).is_none() {
            log::debug!("page: anchor {href} has no target");
            return false;
        }
        self.location.push(href);
        self.scroll_into_view(&target, Align::Start, Behavior::Instant);
        true
    }

    /// Link to a paragraph without any current fragment.
    pub fn permalink(&self, number: u32) -> String {
        format!("{}#{}", self.location.base(), ElementId::paragraph(number))
    }

    pub fn heading_click(&self, pane: PaneId, section: usize) -> Option<HeadingClick> {
        let info = self.doc.sections.get(section)?;
        let span = *self.layout.sections.get(section)?;
        Some(HeadingClick {
            pane,
            heading: ElementId::new(info.id.clone()),
            container_rect: self.rect(pane, span),
            in_chapter: info.chapter.is_some(),
            follows_part_heading: info.follows_part_heading,
        })
    }

    /// Offset of a paragraph container (summary plus body) within its pane.
    pub fn summary_container_top(&self, paragraph: usize) -> Option<f64> {
        let spans = self.layout.paragraphs.get(paragraph)?;
        Some(self.px(spans.container.top) as f64)
    }

    /// Sections listed in the side panel, in order.
    pub fn toc_sections(&self) -> impl Iterator<Item = (usize, &str)> {
        self.toc_entries
            .iter()
            .map(|&index| (index, self.doc.sections[index].title.as_str()))
    }

    pub fn toc_scroll(&self) -> usize {
        self.toc_scroll
    }

    pub fn toc_current(&self) -> Option<usize> {
        self.toc_current
    }

    /// The side-panel entry at a panel row.
    pub fn toc_entry_at(&self, panel_row: u16) -> Option<usize> {
        let entry = self.toc_scroll + usize::from(panel_row);
        (entry < self.toc_entries.len()).then_some(entry)
    }

    pub fn toc_href(&self, entry: usize) -> Option<String> {
        let section = self.doc.sections.get(*self.toc_entries.get(entry)?)?;
        Some(format!("#{}", ElementId::container_of(&section.id)))
    }

    pub fn section_href(&self, section: usize) -> Option<String> {
        let section = self.doc.sections.get(section)?;
        Some(format!("#{}", ElementId::container_of(&section.id)))
    }

    pub fn scroll_toc(&mut self, entries: i64) {
        let max = self.toc_entries.len().saturating_sub(self.panel_rows());
        let next = i64::try_from(self.toc_scroll).unwrap_or(0) + entries;
        self.toc_scroll = usize::try_from(next.max(0)).unwrap_or(0).min(max);
    }

    fn panel_rows(&self) -> usize {
        usize::from(self.body_rows())
    }

    fn reveal_toc_current(&mut self) {
        if let Some(entry) = self.toc_current {
            let rows = self.panel_rows();
            if entry < self.toc_scroll || entry >= self.toc_scroll + rows {
                self.reveal_toc_entry(entry);
            }
        }
    }

    fn scroll_height(&self) -> i64 {
        self.px(self.layout.height())
    }

    fn client_height(&self) -> i64 {
        i64::from(self.body_rows()) * self.line_height
    }

    fn max_top(&self) -> i64 {
        (self.scroll_height() - self.client_height()).max(0)
    }

    fn px(&self, rows: usize) -> i64 {
        i64::try_from(rows).unwrap_or(i64::MAX / 2) * self.line_height
    }

    fn rect(&self, pane: PaneId, span: RowSpan) -> Rect {
        let top = self.px(span.top) - self.tops[slot(pane)];
        Rect::new(top as f64, self.px(span.height) as f64)
    }

    fn pane_available(&self, pane: PaneId) -> bool {
        pane == PaneId::Primary || self.mirror_mounted
    }

    /// Clamps and assigns an offset, queueing a scroll event on change.
    fn set_top(&mut self, pane: PaneId, top: i64) {
        if !self.pane_available(pane) {
            return;
        }
        let top = top.clamp(0, self.max_top());
        if self.tops[slot(pane)] != top {
            self.tops[slot(pane)] = top;
            self.events.push_back(PageEvent::Scroll(pane));
        }
    }

    fn scroll_with(&mut self, pane: PaneId, top: f64, behavior: Behavior) {
        if !self.pane_available(pane) {
            log::debug!("page: {pane} pane is not mounted");
            return;
        }
        match behavior {
            Behavior::Instant => {
                self.animations[slot(pane)] = None;
                self.set_top(pane, top.round() as i64);
            }
            Behavior::Smooth => {
                let to = top.round().clamp(0.0, self.max_top() as f64);
                let from = self.tops[slot(pane)] as f64;
                if (to - from).abs() < 1.0 {
                    self.animations[slot(pane)] = None;
                    return;
                }
                self.animations[slot(pane)] = Some(Animation {
                    from,
                    to,
                    frame: 0,
                    frames: self.smooth_frames,
                });
            }
        }
    }
}

fn slot(pane: PaneId) -> usize {
    match pane {
        PaneId::Primary => 0,
        PaneId::Mirror => 1,
    }
}

impl PaneHost for Page {
    fn viewport(&self) -> Viewport {
        Viewport::new(
            f64::from(self.cols) * self.cell_width as f64,
            self.client_height() as f64,
        )
    }

    fn pane_metrics(&self, pane: PaneId) -> Option<PaneMetrics> {
        if !self.pane_available(pane) {
            return None;
        }
        Some(PaneMetrics {
            scroll_top: self.tops[slot(pane)],
            scroll_height: self.scroll_height(),
            client_height: self.client_height(),
        })
    }

    fn set_scroll_top(&mut self, pane: PaneId, top: i64) {
        self.animations[slot(pane)] = None;
        self.set_top(pane, top);
    }

    fn mount_mirror(&mut self) -> bool {
        if self.body_rows() == 0 || self.layout.lines.is_empty() {
            return false;
        }
        self.mirror_mounted = true;
        self.tops[slot(PaneId::Mirror)] = 0;
        true
    }

    fn paragraph_width(&self) -> Option<f64> {
        if self.doc.paragraphs.is_empty() {
            return None;
        }
        Some(f64::from(self.layout.paragraph_width()) * self.cell_width as f64)
    }
}

impl AddressBar for Page {
    fn fragment(&self) -> String {
        self.location.fragment().to_string()
    }

    fn replace_fragment(&mut self, fragment: &str) {
        self.location.replace(fragment);
    }

    fn href(&self) -> String {
        self.location.href()
    }
}

impl TocView for Page {
    fn toc_entries(&self) -> Vec<TocEntryRect> {
        let height = self.line_height as f64;
        (0..self.toc_entries.len())
            .filter_map(|entry| {
                let href = self.toc_href(entry)?;
                let row = entry as f64 - self.toc_scroll as f64;
                Some(TocEntryRect {
                    href,
                    rect: Rect::new(row * height, height),
                })
            })
            .collect()
    }

    fn toc_height(&self) -> f64 {
        self.client_height() as f64
    }

    fn set_toc_current(&mut self, entry: Option<usize>) {
        self.toc_current = entry;
    }

    fn reveal_toc_entry(&mut self, entry: usize) {
        let rows = self.panel_rows();
        let max = self.toc_entries.len().saturating_sub(rows);
        self.toc_scroll = entry.saturating_sub(rows / 2).min(max);
    }
}

impl LocationHost for Page {
    fn viewport_height(&self) -> f64 {
        self.client_height() as f64
    }

    fn sections(&self) -> Vec<SectionRect> {
        let mut rects: Vec<_> = self
            .doc
            .sections
            .iter()
            .zip(&self.layout.sections)
            .map(|(section, span)| SectionRect {
                heading_id: (!section.id.is_empty()).then(|| ElementId::new(section.id.clone())),
                rect: self.rect(PaneId::Primary, *span),
            })
            .collect();
        rects.sort_by(|a, b| a.rect.top.total_cmp(&b.rect.top));
        rects
    }

    fn paragraphs(&self) -> Vec<ParagraphRect> {
        self.doc
            .paragraphs
            .iter()
            .zip(&self.layout.paragraphs)
            .map(|(paragraph, spans)| ParagraphRect {
                number: paragraph.number,
                rect: self.rect(PaneId::Primary, spans.body),
            })
            .collect()
    }

    fn element_ids(&self) -> Vec<ScopedId> {
        let primary = self
            .layout
            .elements
            .iter()
            .map(|e| ScopedId::primary(e.id.clone()));
        let mirror = self
            .layout
            .elements
            .iter()
            .filter(|_| self.mirror_mounted)
            .map(|e| ScopedId::new(PaneId::Mirror, e.id.clone()));
        primary.chain(mirror).collect()
    }

    fn scroll_into_view(&mut self, target: &ScopedId, align: Align, behavior: Behavior) {
        let Some(element) = self.layout.find(&target.id) else {
            log::debug!("page: no element {target}");
            return;
        };
        let top = scroll_target(
            self.px(element.span.top) as f64,
            self.px(element.span.height) as f64,
            self.client_height() as f64,
            align,
        );
        self.scroll_with(target.pane, top, behavior);
    }

    fn scroll_to(&mut self, pane: PaneId, top: f64, behavior: Behavior) {
        self.scroll_with(pane, top, behavior);
    }

    fn describe(&self, target: &ScopedId) -> Option<ElementInfo> {
        let element = self.layout.find(&target.id)?;
        let doc = &self.doc;
        let info = match element.target {
            ElementRef::Paragraph(index) => {
                let paragraph = doc.paragraphs.get(index)?;
                ElementInfo {
                    text: paragraph.text.clone(),
                    section_title: doc.section_title_for(paragraph).to_string(),
                }
            }
            ElementRef::Summary(index) => {
                let paragraph = doc.paragraphs.get(index)?;
                ElementInfo {
                    text: paragraph.summary.clone().unwrap_or_default(),
                    section_title: doc.section_title_for(paragraph).to_string(),
                }
            }
            ElementRef::Section(index) | ElementRef::SectionHeading(index) => {
                let section = doc.sections.get(index)?;
                ElementInfo {
                    text: section.title.clone(),
                    section_title: section.title.clone(),
                }
            }
            ElementRef::Chapter(index) | ElementRef::ChapterHeading(index) => ElementInfo {
                text: doc.chapters.get(index)?.title.clone(),
                section_title: doc.title.clone(),
            },
        };
        Some(info)
    }

    fn update_preview(&mut self, meta: PreviewMeta) {
        self.preview = Some(meta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_markdown() -> String {
        let mut md = String::from("# Part One\n\n## Alpha\n\n");
        for n in 1..=30 {
            md.push_str(&format!(
                "Paragraph {n} carries enough words to wrap across a couple of lines at forty.\n\n"
            ));
        }
        md.push_str("## Beta\n\n> The summary.\n\nLast words.\n");
        md
    }

    fn page() -> Page {
        let doc = Document::parse("Book", &sample_markdown());
        let settings = Settings {
            measure: 40,
            ..Settings::default()
        };
        let mut page = Page::new(doc, "file:///book.md", &settings);
        page.resize(120, 22);
        page
    }

    fn drain(page: &mut Page) -> Vec<PageEvent> {
        std::iter::from_fn(|| page.pop_event()).collect()
    }

    #[test]
    fn location_history_push_and_replace() {
        let mut location = Location::new("file:///book.md");
        assert!(location.push("#alpha"));
        location.replace("alpha-p3");
        assert_eq!(location.href(), "file:///book.md#alpha-p3");
        assert!(location.push("#beta"));
        assert!(!location.push("#beta"));
        assert!(location.back());
        assert_eq!(location.fragment(), "#alpha-p3");
        assert!(location.back());
        assert_eq!(location.fragment(), "");
        assert!(!location.back());
        assert!(location.forward());
        assert_eq!(location.fragment(), "#alpha-p3");
    }

    #[test]
    fn viewport_is_measured_in_virtual_pixels() {
        let page = page();
        assert_eq!(page.viewport(), Viewport::new(960.0, 320.0));
        assert_eq!(page.paragraph_width(), Some(f64::from(40 + GUTTER) * 8.0));
    }

    #[test]
    fn offsets_clamp_and_emit_events_on_change() {
        let mut page = page();
        drain(&mut page);
        page.scroll_rows(PaneId::Primary, -3);
        assert!(drain(&mut page).is_empty());

        page.scroll_rows(PaneId::Primary, 4);
        assert_eq!(drain(&mut page), vec![PageEvent::Scroll(PaneId::Primary)]);
        assert_eq!(page.scroll_top(PaneId::Primary), 64);

        page.scroll_to_end(PaneId::Primary);
        let metrics = page.pane_metrics(PaneId::Primary).unwrap();
        assert_eq!(metrics.scroll_top, metrics.max_scroll_top());
    }

    #[test]
    fn mirror_is_absent_until_mounted() {
        let mut page = page();
        assert!(page.pane_metrics(PaneId::Mirror).is_none());
        page.set_scroll_top(PaneId::Mirror, 100);
        assert!(drain(&mut page).is_empty());
        assert!(page.mount_mirror());
        page.set_scroll_top(PaneId::Mirror, 160);
        assert_eq!(page.top_row(PaneId::Mirror), 10);
    }

    #[test]
    fn smooth_scroll_runs_over_frames() {
        let mut page = page();
        drain(&mut page);
        page.scroll_into_view(
            &ScopedId::primary(ElementId::paragraph(20)),
            Align::Center,
            Behavior::Smooth,
        );
        assert!(page.is_animating());
        let mut frames = 0;
        while page.tick() {
            frames += 1;
        }
        assert_eq!(frames, 11);

        let target = page
            .paragraphs()
            .into_iter()
            .find(|p| p.number == 20)
            .unwrap();
        let center = target.rect.top + target.rect.height / 2.0;
        assert!((center - page.viewport_height() / 2.0).abs() <= 16.0);
        assert!(drain(&mut page).len() >= 11);
    }

    #[test]
    fn anchors_push_history_without_hash_change() {
        let mut page = page();
        drain(&mut page);
        assert!(page.follow_anchor("#_beta"));
        assert_eq!(page.location().fragment(), "#_beta");
        let events = drain(&mut page);
        assert!(!events.contains(&PageEvent::HashChange));
        let beta = page.layout().find(&ElementId::new("_beta")).unwrap().span;
        let max = page.pane_metrics(PaneId::Primary).unwrap().max_scroll_top();
        assert_eq!(page.scroll_top(PaneId::Primary), (beta.top as i64 * 16).min(max));
        assert!(!page.follow_anchor("#missing"));
    }

    #[test]
    fn go_announces_hash_change() {
        let mut page = page();
        drain(&mut page);
        assert!(page.go("#p3"));
        assert_eq!(drain(&mut page), vec![PageEvent::HashChange]);
        assert!(page.back());
        assert_eq!(page.location().fragment(), "");
        assert_eq!(drain(&mut page), vec![PageEvent::HashChange]);
    }

    #[test]
    fn describe_uses_owning_section_title() {
        let page = page();
        let info = page
            .describe(&ScopedId::primary(ElementId::paragraph(31)))
            .unwrap();
        assert_eq!(info.section_title, "Beta");
        assert_eq!(info.text, "Last words.");
        let summary = page
            .describe(&ScopedId::primary(ElementId::summary(31)))
            .unwrap();
        assert_eq!(summary.text, "The summary.");
    }

    #[test]
    fn permalink_drops_current_fragment() {
        let mut page = page();
        page.replace_fragment("#alpha-p4");
        assert_eq!(page.permalink(4), "file:///book.md#p4");
    }

    #[test]
    fn toc_reveal_centers_entry() {
        let mut page = page();
        page.reveal_toc_entry(1);
        assert_eq!(page.toc_scroll(), 0);
        let rects = page.toc_entries();
        assert_eq!(rects[1].href, "#_beta");
        assert_eq!(rects[1].rect, Rect::new(16.0, 16.0));
    }

    #[test]
    fn narrowing_the_window_shrinks_the_measure() {
        let mut page = page();
        page.resize(30, 22);
        assert_eq!(page.layout().measure, 22);
        page.resize(200, 22);
        assert_eq!(page.layout().measure, 40);
    }
}
