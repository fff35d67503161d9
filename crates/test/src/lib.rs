//! Test helpers and fixtures.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use bifocals_application::AppContext;
use bifocals_core::{FlagStore, Settings};
use bifocals_engine::{Document, Page};

pub const BASE_URL: &str = "file:///books/field-notes.md";

/// A flag store whose contents stay readable after it is boxed into a
/// context.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    values: Rc<RefCell<HashMap<String, String>>>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(pairs: &[(&str, &str)]) -> Self {
        let mut store = Self::new();
        for (key, value) in pairs {
            store.set(key, value);
        }
        store
    }
}

impl FlagStore for SharedStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

pub fn make_settings() -> Settings {
    Settings::default()
}

/// Two parts, four sections, `per_section` paragraphs each. The first
/// paragraph of every section carries a summary.
pub fn sample_markdown(per_section: usize) -> String {
    let mut out = String::new();
    let mut number = 0;
    for (part, sections) in [("Part One", ["Alpha", "Beta"]), ("Part Two", ["Gamma", "Delta"])] {
        out.push_str(&format!("# {part}\n\n"));
        for section in sections {
            out.push_str(&format!("## {section}\n\n"));
            for i in 0..per_section {
                number += 1;
                if i == 0 {
                    out.push_str(&format!("> Summary of {section}.\n\n"));
                }
                out.push_str(&format!(
                    "Paragraph {number} of {section} goes on for a while so that it wraps \
                     across more than one line of the reading column at the default measure.\n\n"
                ));
            }
        }
    }
    out
}

pub fn make_page(per_section: usize) -> Page {
    let doc = Document::parse("Field Notes", &sample_markdown(per_section));
    Page::new(doc, BASE_URL, &make_settings())
}

pub fn make_context(per_section: usize, store: SharedStore) -> AppContext {
    AppContext::new(make_settings(), make_page(per_section), Box::new(store))
}

/// Runs frames until nothing is animating or pending.
pub fn settle(ctx: &mut AppContext) {
    for _ in 0..200 {
        if !ctx.needs_frame() {
            return;
        }
        ctx.on_frame(std::time::Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bifocals_application::{ClickOutcome, Notice};
    use bifocals_core::{FlagKey, FragmentTarget, PaneId, SCROLL_TOP_KEY};
    use bifocals_engine::{LineKind, PaneHost, ParagraphMove};
    use pretty_assertions::assert_eq;

    // 40 rows leave 38 body rows: 608px viewport, 547px scroll delta.
    const DELTA: i64 = 547;

    fn dual_context(store: SharedStore) -> AppContext {
        let mut store = store;
        store.set("twoCols", "true");
        let mut ctx = make_context(20, store);
        ctx.start(200, 40);
        settle(&mut ctx);
        ctx
    }

    fn tops(ctx: &AppContext) -> (i64, i64) {
        (
            ctx.page().scroll_top(PaneId::Primary),
            ctx.page().scroll_top(PaneId::Mirror),
        )
    }

    fn body_row_of(ctx: &AppContext, pane: PaneId, pred: impl Fn(LineKind) -> bool) -> Option<u16> {
        (0..ctx.page().body_rows()).find(|&row| {
            ctx.page()
                .line_at(pane, row)
                .is_some_and(|line| pred(line.kind))
        })
    }

    #[test]
    fn fixture_has_expected_shape() {
        let page = make_page(3);
        let doc = page.document();
        assert_eq!(doc.chapters.len(), 2);
        // Contents section plus four.
        assert_eq!(doc.sections.len(), 5);
        assert_eq!(doc.paragraphs.len(), 12);
        assert_eq!(doc.paragraphs[3].summary.as_deref(), Some("Summary of Beta."));
    }

    #[test]
    fn mirror_trails_primary_by_one_screen() {
        let store = SharedStore::new();
        let mut ctx = dual_context(store.clone());
        assert!(ctx.is_dual_pane());
        assert_eq!(tops(&ctx), (0, DELTA));

        ctx.scroll_rows(PaneId::Primary, 10);
        assert_eq!(tops(&ctx), (160, 160 + DELTA));
        assert_eq!(store.get(SCROLL_TOP_KEY).as_deref(), Some("160"));

        ctx.scroll_rows(PaneId::Mirror, 5);
        assert_eq!(tops(&ctx), (240, 240 + DELTA));
    }

    #[test]
    fn stored_offset_is_restored_on_entry() {
        let store = SharedStore::with(&[(SCROLL_TOP_KEY, "800")]);
        let ctx = dual_context(store);
        assert_eq!(tops(&ctx), (800, 800 + DELTA));
    }

    #[test]
    fn primary_stops_one_delta_before_the_end() {
        let mut ctx = dual_context(SharedStore::new());
        ctx.scroll_to_end();
        settle(&mut ctx);
        let metrics = ctx
            .page()
            .pane_metrics(PaneId::Primary)
            .expect("primary pane");
        let end = metrics.scroll_height - metrics.client_height;
        assert_eq!(tops(&ctx), (end - DELTA, end));
    }

    #[test]
    fn offset_stored_at_the_end_is_clamped_on_entry() {
        let store = SharedStore::new();
        let mut ctx = make_context(20, store.clone());
        ctx.start(200, 40);
        assert!(!ctx.is_dual_pane());
        ctx.scroll_to_end();
        settle(&mut ctx);
        let metrics = ctx
            .page()
            .pane_metrics(PaneId::Primary)
            .expect("primary pane");
        let end = metrics.scroll_height - metrics.client_height;
        assert_eq!(store.get(SCROLL_TOP_KEY), Some(end.to_string()));

        assert!(ctx.toggle(FlagKey::TwoCols));
        settle(&mut ctx);
        assert_eq!(tops(&ctx), (end - DELTA, end));
    }

    #[test]
    fn single_pane_still_persists_offset() {
        let store = SharedStore::new();
        let mut ctx = make_context(20, store.clone());
        ctx.start(120, 40);
        assert!(!ctx.is_dual_pane());
        ctx.scroll_rows(PaneId::Primary, 3);
        assert_eq!(store.get(SCROLL_TOP_KEY).as_deref(), Some("48"));
        // Mirror input falls through to the primary pane.
        ctx.scroll_rows(PaneId::Mirror, 1);
        assert_eq!(ctx.page().scroll_top(PaneId::Primary), 64);
    }

    #[test]
    fn narrow_window_refuses_two_columns() {
        let store = SharedStore::new();
        let mut ctx = make_context(20, store.clone());
        ctx.start(120, 40);
        assert!(!ctx.toggle(FlagKey::TwoCols));
        assert!(!ctx.is_dual_pane());
        assert!(matches!(ctx.notice(), Some(Notice::TooNarrow { .. })));
        assert_eq!(store.get("twoCols").as_deref(), Some("false"));
    }

    #[test]
    fn shrinking_the_window_leaves_dual_pane() {
        let mut ctx = dual_context(SharedStore::new());
        ctx.resize(120, 40);
        assert!(!ctx.is_dual_pane());
        assert!(!ctx.flags().two_cols);
        assert!(ctx.notice().is_some());
    }

    #[test]
    fn scrolling_tracks_section_and_paragraph() {
        let mut ctx = make_context(20, SharedStore::new());
        ctx.start(120, 40);
        ctx.scroll_pages(PaneId::Primary, 6);
        settle(&mut ctx);

        let fragment = ctx.fragment();
        let target = FragmentTarget::parse(&fragment)
            .expect("decodable")
            .expect("non-empty");
        let FragmentTarget::Composite { section, paragraph } = target else {
            panic!("expected a composite fragment, got {fragment}");
        };
        let doc = ctx.page().document();
        assert!(doc.sections.iter().any(|s| s.id == section));
        assert!(doc.paragraph(paragraph).is_some());
        assert!(ctx.page().toc_current().is_some());
    }

    #[test]
    fn explicit_paragraph_fragment_holds_while_scrolling() {
        let mut ctx = make_context(20, SharedStore::new()).with_initial_fragment(Some("p15".into()));
        ctx.start(120, 40);
        settle(&mut ctx);
        assert_eq!(ctx.fragment(), "#p15");
        assert_eq!(ctx.title(), "Alpha - Paragraph 15");

        ctx.scroll_rows(PaneId::Primary, 12);
        settle(&mut ctx);
        assert_eq!(ctx.fragment(), "#p15");
    }

    #[test]
    fn composite_fragment_centers_its_paragraph() {
        let mut ctx = make_context(20, SharedStore::new());
        ctx.start(120, 40);
        assert!(ctx.go_to("#gamma-p47"));
        settle(&mut ctx);
        assert_eq!(ctx.title(), "Gamma - Paragraph 47");

        let center = ctx.page().body_rows() / 2;
        let row = body_row_of(&ctx, PaneId::Primary, |kind| {
            matches!(kind, LineKind::Paragraph { index: 46, .. })
        })
        .expect("paragraph 47 on screen");
        assert!(row.abs_diff(center) <= 3, "row {row} center {center}");
    }

    #[test]
    fn history_moves_between_fragments() {
        let mut ctx = make_context(5, SharedStore::new());
        ctx.start(120, 40);
        assert!(ctx.go_to("#p2"));
        assert!(ctx.go_to("#p9"));
        assert!(!ctx.go_to("#p9"));
        assert!(ctx.back());
        assert_eq!(ctx.fragment(), "#p2");
        assert!(ctx.forward());
        assert_eq!(ctx.fragment(), "#p9");
        assert!(!ctx.forward());
    }

    #[test]
    fn contents_entry_click_follows_anchor() {
        let mut ctx = make_context(8, SharedStore::new());
        ctx.start(120, 40);
        let row = body_row_of(&ctx, PaneId::Primary, |kind| kind == LineKind::TocEntry(3))
            .expect("contents entry for Gamma");
        assert_eq!(ctx.click_pane(PaneId::Primary, row, 10), ClickOutcome::Navigated);
        assert_eq!(ctx.page().location().fragment(), "#_gamma");
        let heading = body_row_of(&ctx, PaneId::Primary, |kind| {
            kind == LineKind::SectionHeading(3)
        });
        assert_eq!(heading, Some(0));
    }

    #[test]
    fn side_panel_click_follows_anchor() {
        let mut ctx = make_context(8, SharedStore::new());
        ctx.start(120, 40);
        assert_eq!(ctx.click_toc(1), ClickOutcome::Navigated);
        assert_eq!(ctx.fragment(), "#_beta");
        assert_eq!(ctx.click_toc(40), ClickOutcome::Nothing);
    }

    #[test]
    fn paragraph_number_click_offers_permalink() {
        let mut ctx = make_context(5, SharedStore::new());
        ctx.start(120, 40);
        ctx.go_to("#gamma-p12");
        settle(&mut ctx);
        let row = body_row_of(&ctx, PaneId::Primary, |kind| {
            kind == LineKind::Paragraph {
                index: 11,
                first: true,
            }
        })
        .expect("paragraph 12 on screen");
        assert_eq!(
            ctx.click_pane(PaneId::Primary, row, 1),
            ClickOutcome::CopyLink {
                number: 12,
                url: format!("{BASE_URL}#p12"),
            }
        );
        assert_eq!(ctx.click_pane(PaneId::Primary, row, 20), ClickOutcome::Nothing);
    }

    #[test]
    fn summary_click_points_fragment_at_summary() {
        let mut ctx = make_context(5, SharedStore::new());
        ctx.start(120, 40);
        ctx.go_to("#p6");
        settle(&mut ctx);
        let row = body_row_of(&ctx, PaneId::Primary, |kind| kind == LineKind::Summary(5))
            .expect("summary of Beta on screen");
        assert_eq!(ctx.click_pane(PaneId::Primary, row, 10), ClickOutcome::Navigated);
        assert_eq!(ctx.fragment(), "#s6");
    }

    #[test]
    fn keyboard_moves_center_paragraphs() {
        let mut ctx = make_context(5, SharedStore::new());
        ctx.start(120, 40);
        assert_eq!(ctx.move_paragraph(ParagraphMove::Last), Some(20));
        settle(&mut ctx);
        assert_eq!(ctx.move_paragraph(ParagraphMove::Number(3)), Some(3));
        settle(&mut ctx);
        assert_eq!(ctx.move_paragraph(ParagraphMove::Next), Some(4));
        assert_eq!(ctx.move_paragraph(ParagraphMove::Number(99)), None);
    }
}
