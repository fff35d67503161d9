//! Application orchestration layer for Bifocals.
//!
//! [`AppContext`] owns the page and both state machines, and routes page
//! events between them. The UI translates terminal input into calls here and
//! renders from the accessors.

use std::time::{Duration, Instant};

use bifocals_core::{FlagKey, FlagStore, PaneId, Settings, UiFlags};
use bifocals_engine::{
    AddressBar, DualPaneOutcome, GUTTER, LineKind, LocationHost, LocationResolver, Page,
    PageEvent, ParagraphMove, ParagraphNavigator, SampleOutcome, SamplerState, ScrollCoordinator,
    WidthCheck,
};

const COPY_FEEDBACK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Two columns do not fit; dual-pane mode was switched off.
    TooNarrow { viewport: f64, required: f64 },
}

impl Notice {
    pub fn text(&self) -> String {
        match self {
            Notice::TooNarrow { .. } => {
                "The window is too narrow for two columns. Widen it and try again.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Nothing,
    Navigated,
    /// A paragraph number was clicked; the link should go to the clipboard.
    CopyLink { number: u32, url: String },
}

#[derive(Debug, Clone, Copy)]
struct CopyFeedback {
    number: u32,
    until: Instant,
}

pub struct AppContext {
    pub settings: Settings,
    page: Page,
    coordinator: ScrollCoordinator,
    resolver: LocationResolver,
    navigator: ParagraphNavigator,
    flags: UiFlags,
    store: Box<dyn FlagStore>,
    notice: Option<Notice>,
    copied: Option<CopyFeedback>,
    pending_fragment: Option<String>,
    shown_title: Option<String>,
}

impl AppContext {
    pub fn new(settings: Settings, page: Page, store: Box<dyn FlagStore>) -> Self {
        let flags = UiFlags::load(store.as_ref());
        Self {
            coordinator: ScrollCoordinator::new(&settings),
            resolver: LocationResolver::new(&settings),
            navigator: ParagraphNavigator::new(),
            settings,
            page,
            flags,
            store,
            notice: None,
            copied: None,
            pending_fragment: None,
            shown_title: None,
        }
    }

    /// Fragment present at load. It is written to the address bar right
    /// away and resolved on the first frame.
    pub fn with_initial_fragment(mut self, fragment: Option<String>) -> Self {
        if let Some(fragment) = fragment.filter(|f| !f.trim().is_empty()) {
            self.page.replace_fragment(&fragment);
            self.pending_fragment = Some(self.page.fragment());
        }
        self
    }

    /// Sizes the page and restores persisted toggles.
    pub fn start(&mut self, cols: u16, rows: u16) {
        self.page.resize(cols, rows);
        self.pump();
        if self.flags.two_cols {
            self.enter_dual_pane();
        }
        log::debug!("session: started with {:?}", self.flags);
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn flags(&self) -> UiFlags {
        self.flags
    }

    pub fn is_dual_pane(&self) -> bool {
        self.coordinator.is_active()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn fragment(&self) -> String {
        self.page.fragment()
    }

    /// Window title: the last preview title, or the document title.
    pub fn title(&self) -> String {
        self.page
            .preview()
            .map(|meta| meta.title.clone())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| self.page.document().title.clone())
    }

    /// Returns the window title when it changed since the last call.
    pub fn take_title_change(&mut self) -> Option<String> {
        let title = self.title();
        if self.shown_title.as_deref() == Some(title.as_str()) {
            return None;
        }
        self.shown_title = Some(title.clone());
        Some(title)
    }

    pub fn needs_frame(&self) -> bool {
        self.pending_fragment.is_some()
            || self.page.is_animating()
            || self.page.has_events()
            || self.resolver.state() == SamplerState::Sampling
    }

    /// One animation frame: deferred navigation, smooth scroll steps, then
    /// at most one location sample.
    pub fn on_frame(&mut self, now: Instant) -> Option<SampleOutcome> {
        if let Some(fragment) = self.pending_fragment.take() {
            self.resolver.navigate(&mut self.page, &fragment);
        }
        self.page.tick();
        self.pump();
        let outcome = self.resolver.run_frame(&mut self.page);
        if self.copied.is_some_and(|c| now >= c.until) {
            self.copied = None;
        }
        outcome
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.page.resize(cols, rows);
        self.pump();
        if let Some(check) = self.coordinator.on_resize(&mut self.page) {
            self.apply_width_check(check);
        }
        self.pump();
        self.resolver.on_scroll();
    }

    pub fn toggle(&mut self, key: FlagKey) -> bool {
        match key {
            FlagKey::TwoCols => self.toggle_two_cols(),
            FlagKey::OpenToc | FlagKey::DarkMode => self.flags.toggle(key, self.store.as_mut()),
        }
    }

    pub fn toggle_two_cols(&mut self) -> bool {
        if self.flags.toggle(FlagKey::TwoCols, self.store.as_mut()) {
            self.enter_dual_pane();
        } else {
            self.coordinator.leave_dual_pane();
        }
        self.flags.two_cols
    }

    pub fn scroll_rows(&mut self, pane: PaneId, rows: i64) {
        let pane = self.usable(pane);
        self.page.scroll_rows(pane, rows);
        self.pump();
    }

    pub fn scroll_pages(&mut self, pane: PaneId, pages: i64) {
        let pane = self.usable(pane);
        self.page.scroll_pages(pane, pages);
        self.pump();
    }

    pub fn scroll_to_start(&mut self) {
        self.page.scroll_to_start(PaneId::Primary);
        self.pump();
    }

    pub fn scroll_to_end(&mut self) {
        self.page.scroll_to_end(PaneId::Primary);
        self.pump();
    }

    pub fn scroll_toc(&mut self, entries: i64) {
        self.page.scroll_toc(entries);
    }

    pub fn move_paragraph(&mut self, movement: ParagraphMove) -> Option<u32> {
        let number = self.navigator.navigate(&mut self.page, movement);
        self.pump();
        number
    }

    /// Explicit navigation from the location prompt.
    pub fn go_to(&mut self, fragment: &str) -> bool {
        let moved = self.page.go(fragment);
        self.pump();
        moved
    }

    pub fn back(&mut self) -> bool {
        let moved = self.page.back();
        self.pump();
        moved
    }

    pub fn forward(&mut self) -> bool {
        let moved = self.page.forward();
        self.pump();
        moved
    }

    /// Permalink of the paragraph at the viewport center.
    pub fn current_permalink(&mut self) -> Option<(u32, String)> {
        let rects = self.page.paragraphs();
        let height = self.page.viewport_height();
        self.navigator.sync(&rects, height);
        let number = rects.get(self.navigator.current())?.number;
        Some((number, self.page.permalink(number)))
    }

    pub fn acknowledge_copy(&mut self, number: u32, now: Instant) {
        self.copied = Some(CopyFeedback {
            number,
            until: now + COPY_FEEDBACK,
        });
    }

    /// True while paragraph `number` shows the copy acknowledgement.
    pub fn shows_copied(&self, number: u32, now: Instant) -> bool {
        self.copied
            .is_some_and(|c| c.number == number && now < c.until)
    }

    /// A click inside a pane at a body row and a column relative to the
    /// pane's left edge.
    pub fn click_pane(&mut self, pane: PaneId, body_row: u16, col: u16) -> ClickOutcome {
        let pane = self.usable(pane);
        let Some(kind) = self.page.line_at(pane, body_row).map(|line| line.kind) else {
            return ClickOutcome::Nothing;
        };
        let dual = self.is_dual_pane();
        let outcome = match kind {
            LineKind::SectionHeading(section) => self.click_heading(pane, section, dual),
            LineKind::TocHeading => match self.page.document().short_toc_index() {
                Some(section) => self.click_heading(pane, section, dual),
                None => ClickOutcome::Nothing,
            },
            LineKind::TocEntry(section) => {
                let followed = self
                    .page
                    .section_href(section)
                    .is_some_and(|href| self.page.follow_anchor(&href));
                if followed {
                    ClickOutcome::Navigated
                } else {
                    ClickOutcome::Nothing
                }
            }
            LineKind::Summary(index) => {
                let number = self.page.document().paragraphs[index].number;
                match self.page.summary_container_top(index) {
                    Some(top) => {
                        self.resolver
                            .summary_click(&mut self.page, pane, number, top, dual);
                        ClickOutcome::Navigated
                    }
                    None => ClickOutcome::Nothing,
                }
            }
            LineKind::Paragraph { index, first: true } if col < GUTTER => {
                let number = self.page.document().paragraphs[index].number;
                ClickOutcome::CopyLink {
                    number,
                    url: self.page.permalink(number),
                }
            }
            _ => ClickOutcome::Nothing,
        };
        self.pump();
        outcome
    }

    /// A click on a row of the side contents panel.
    pub fn click_toc(&mut self, panel_row: u16) -> ClickOutcome {
        let Some(href) = self
            .page
            .toc_entry_at(panel_row)
            .and_then(|entry| self.page.toc_href(entry))
        else {
            return ClickOutcome::Nothing;
        };
        let outcome = if self.page.follow_anchor(&href) {
            ClickOutcome::Navigated
        } else {
            ClickOutcome::Nothing
        };
        self.pump();
        outcome
    }

    fn click_heading(&mut self, pane: PaneId, section: usize, dual: bool) -> ClickOutcome {
        let Some(click) = self.page.heading_click(pane, section) else {
            return ClickOutcome::Nothing;
        };
        let action = self.resolver.heading_click(&mut self.page, &click, dual);
        log::debug!("session: heading click -> {action:?}");
        ClickOutcome::Navigated
    }

    fn usable(&self, pane: PaneId) -> PaneId {
        if pane == PaneId::Mirror && !self.is_dual_pane() {
            PaneId::Primary
        } else {
            pane
        }
    }

    fn enter_dual_pane(&mut self) {
        let outcome = self
            .coordinator
            .enter_dual_pane(&mut self.page, self.store.as_ref());
        match outcome {
            DualPaneOutcome::Entered(check) | DualPaneOutcome::Refreshed(check) => {
                self.apply_width_check(check);
            }
            DualPaneOutcome::NoMountPoint => {
                self.flags.set(FlagKey::TwoCols, false);
            }
        }
        self.pump();
    }

    fn apply_width_check(&mut self, check: WidthCheck) {
        if let WidthCheck::TooNarrow { viewport, required } = check {
            self.coordinator.leave_dual_pane();
            if self.flags.two_cols {
                self.flags.toggle(FlagKey::TwoCols, self.store.as_mut());
            }
            self.notice = Some(Notice::TooNarrow { viewport, required });
        }
    }

    /// Drains page events in order. Primary scrolls feed the coordinator and
    /// schedule a location sample; mirror scrolls only feed the coordinator.
    fn pump(&mut self) {
        while let Some(event) = self.page.pop_event() {
            match event {
                PageEvent::Scroll(PaneId::Primary) => {
                    self.coordinator
                        .on_primary_scroll(&mut self.page, self.store.as_mut());
                    self.resolver.on_scroll();
                }
                PageEvent::Scroll(PaneId::Mirror) => {
                    self.coordinator.on_mirror_scroll(&mut self.page);
                }
                PageEvent::HashChange => {
                    let fragment = self.page.fragment();
                    if self.resolver.navigate(&mut self.page, &fragment).is_none() {
                        log::info!("session: nothing to show for {fragment:?}");
                    }
                }
            }
        }
    }
}
