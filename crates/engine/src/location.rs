//! Fragment resolution and passive location tracking.
//!
//! Explicit navigation (load, hash change, history) resolves the fragment to
//! an element and scrolls it into view. While the reader scrolls, a sampler
//! runs at most once per frame and rewrites the fragment to the current
//! section and most visible paragraph using history-replace semantics.

use bifocals_core::{
    ElementId, FragmentTarget, PaneId, PreviewMeta, ScopedId, Settings, is_paragraph_specific,
    preview_text,
};

use crate::document::SHORT_TOC_ID;
use crate::geometry::{Align, Behavior, Rect, intersects_viewport, most_visible};

/// The address bar of the hosting page.
pub trait AddressBar {
    /// Current fragment including the leading `#`, or empty.
    fn fragment(&self) -> String;
    /// Rewrites the fragment without adding a history entry.
    fn replace_fragment(&mut self, fragment: &str);
    /// Full location including the fragment.
    fn href(&self) -> String;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TocEntryRect {
    pub href: String,
    /// Relative to the table of contents panel.
    pub rect: Rect,
}

pub trait TocView {
    fn toc_entries(&self) -> Vec<TocEntryRect>;
    fn toc_height(&self) -> f64;
    fn set_toc_current(&mut self, entry: Option<usize>);
    /// Scrolls the panel, not the page, so the entry is visible.
    fn reveal_toc_entry(&mut self, entry: usize);
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionRect {
    pub heading_id: Option<ElementId>,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphRect {
    pub number: u32,
    pub rect: Rect,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementInfo {
    pub text: String,
    pub section_title: String,
}

/// Geometry and scrolling of the page. Rects are viewport-relative and
/// taken from the primary pane, in document order.
pub trait LocationHost {
    fn viewport_height(&self) -> f64;
    fn sections(&self) -> Vec<SectionRect>;
    fn paragraphs(&self) -> Vec<ParagraphRect>;
    /// Every element carrying an id, primary pane first.
    fn element_ids(&self) -> Vec<ScopedId>;
    fn scroll_into_view(&mut self, target: &ScopedId, align: Align, behavior: Behavior);
    fn scroll_to(&mut self, pane: PaneId, top: f64, behavior: Behavior);
    fn describe(&self, target: &ScopedId) -> Option<ElementInfo>;
    fn update_preview(&mut self, meta: PreviewMeta);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SamplerState {
    #[default]
    Idle,
    Sampling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleOutcome {
    /// An explicit paragraph navigation owns the fragment.
    Suppressed,
    NoSection,
    MissingHeading,
    Unchanged(String),
    Updated(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub target: ScopedId,
    pub meta: PreviewMeta,
}

/// A click on a section heading, measured at click time.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingClick {
    pub pane: PaneId,
    pub heading: ElementId,
    /// Viewport-relative rect of the section container.
    pub container_rect: Rect,
    pub in_chapter: bool,
    pub follows_part_heading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadingAction {
    Container(ScopedId),
    Contents(ScopedId),
    /// A paragraph navigation is settling; the contents jump is skipped.
    Hold,
}

#[derive(Debug, Clone)]
pub struct LocationResolver {
    state: SamplerState,
    threshold: f64,
    header_fraction: f64,
    top_margin: f64,
    preview_chars: usize,
    current_section: Option<ElementId>,
    last_written: Option<String>,
}

impl LocationResolver {
    pub fn new(settings: &Settings) -> Self {
        Self {
            state: SamplerState::Idle,
            threshold: settings.min_visible_fraction,
            header_fraction: settings.header_fraction,
            top_margin: settings.top_margin_px,
            preview_chars: settings.preview_chars,
            current_section: None,
            last_written: None,
        }
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn current_section(&self) -> Option<&ElementId> {
        self.current_section.as_ref()
    }

    /// Schedules a sample. Returns `true` when a frame must be requested.
    pub fn on_scroll(&mut self) -> bool {
        match self.state {
            SamplerState::Idle => {
                self.state = SamplerState::Sampling;
                true
            }
            SamplerState::Sampling => false,
        }
    }

    /// Runs the scheduled sample, if any.
    pub fn run_frame<H>(&mut self, host: &mut H) -> Option<SampleOutcome>
    where
        H: LocationHost + AddressBar + TocView + ?Sized,
    {
        if self.state != SamplerState::Sampling {
            return None;
        }
        self.state = SamplerState::Idle;
        Some(self.sample(host))
    }

    /// True while the fragment points at a paragraph the reader navigated to
    /// explicitly. Fragments the sampler wrote itself never hold.
    pub fn holds(&self, fragment: &str) -> bool {
        is_paragraph_specific(fragment) && self.last_written.as_deref() != Some(fragment)
    }

    pub fn sample<H>(&mut self, host: &mut H) -> SampleOutcome
    where
        H: LocationHost + AddressBar + TocView + ?Sized,
    {
        let fragment = host.fragment();
        if self.holds(&fragment) {
            return SampleOutcome::Suppressed;
        }

        let viewport_height = host.viewport_height();
        let Some(section) = host
            .sections()
            .into_iter()
            .find(|s| intersects_viewport(s.rect, viewport_height))
        else {
            return SampleOutcome::NoSection;
        };
        let Some(heading) = section.heading_id else {
            log::debug!("location: visible section has no heading id");
            return SampleOutcome::MissingHeading;
        };

        let paragraphs = host.paragraphs();
        let current = most_visible(
            paragraphs.iter().map(|p| p.rect),
            viewport_height,
            self.threshold,
        )
        .map(|(index, _)| paragraphs[index].number);

        let next = FragmentTarget::for_location(heading.as_str(), current).to_fragment();
        self.current_section = Some(heading.clone());
        if next == fragment {
            return SampleOutcome::Unchanged(next);
        }

        host.replace_fragment(&next);
        self.last_written = Some(next.clone());
        highlight_toc(host, &heading);
        log::trace!("location: fragment {fragment:?} -> {next:?}");
        SampleOutcome::Updated(next)
    }

    /// Explicit navigation to `raw`. Paragraph fragments hold the sampler
    /// until the fragment changes.
    pub fn navigate<H>(&mut self, host: &mut H, raw: &str) -> Option<Resolution>
    where
        H: LocationHost + AddressBar + ?Sized,
    {
        self.last_written = None;
        self.resolve(host, raw)
    }

    pub fn resolve<H>(&self, host: &mut H, raw: &str) -> Option<Resolution>
    where
        H: LocationHost + AddressBar + ?Sized,
    {
        let target = match FragmentTarget::parse(raw) {
            Ok(Some(target)) => target,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("location: {err}");
                return None;
            }
        };

        let id = target.target_id();
        let Some(scoped) = host.element_ids().into_iter().find(|s| s.id == id) else {
            log::info!("location: no element for fragment {raw:?} (looked for {id})");
            return None;
        };

        host.scroll_into_view(&scoped, Align::Center, Behavior::Smooth);
        let meta = self.preview_meta(host, &scoped, &target);
        host.update_preview(meta.clone());
        Some(Resolution {
            target: scoped,
            meta,
        })
    }

    pub fn heading_click<H>(&self, host: &mut H, click: &HeadingClick, dual_pane: bool) -> HeadingAction
    where
        H: LocationHost + AddressBar + ?Sized,
    {
        let at_top = click.container_rect.top.abs() < self.top_margin;
        if !click.in_chapter || click.follows_part_heading || at_top {
            if is_paragraph_specific(&host.fragment()) {
                return HeadingAction::Hold;
            }
            let contents = ScopedId::primary(ElementId::container_of(SHORT_TOC_ID));
            host.scroll_into_view(&contents, Align::Start, Behavior::Instant);
            return HeadingAction::Contents(contents);
        }

        let container = ScopedId::new(click.pane, ElementId::container_of(click.heading.as_str()));
        let behavior = if dual_pane {
            Behavior::Instant
        } else {
            Behavior::Smooth
        };
        host.scroll_into_view(&container, Align::Start, behavior);
        HeadingAction::Container(container)
    }

    /// Points the fragment at summary `s<n>` and scrolls the owning pane so
    /// the paragraph container sits just below the header. `container_top`
    /// is the container's offset within its pane.
    pub fn summary_click<H>(
        &self,
        host: &mut H,
        pane: PaneId,
        number: u32,
        container_top: f64,
        dual_pane: bool,
    ) -> f64
    where
        H: LocationHost + AddressBar + ?Sized,
    {
        host.replace_fragment(&format!("#{}", ElementId::summary(number)));
        let top = container_top - host.viewport_height() * self.header_fraction;
        if dual_pane {
            host.scroll_to(pane, top, Behavior::Instant);
        } else {
            host.scroll_to(PaneId::Primary, top, Behavior::Smooth);
        }
        top
    }

    fn preview_meta<H>(&self, host: &H, scoped: &ScopedId, target: &FragmentTarget) -> PreviewMeta
    where
        H: LocationHost + AddressBar + ?Sized,
    {
        let info = host.describe(scoped).unwrap_or_default();
        let title = match target.paragraph() {
            Some(n) => format!("{} - Paragraph {n}", info.section_title),
            None => info.section_title.clone(),
        };
        PreviewMeta {
            title,
            description: preview_text(&info.text, self.preview_chars),
            url: host.href(),
        }
    }
}

fn highlight_toc<H>(host: &mut H, heading: &ElementId)
where
    H: TocView + ?Sized,
{
    let href = format!("#{}", ElementId::container_of(heading.as_str()));
    let entries = host.toc_entries();
    let current = entries.iter().position(|e| e.href == href);
    host.set_toc_current(current);

    if let Some(index) = current {
        let rect = entries[index].rect;
        if rect.top < 0.0 || rect.bottom() > host.toc_height() {
            host.reveal_toc_entry(index);
        }
    }
}
