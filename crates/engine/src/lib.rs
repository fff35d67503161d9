//! Navigation engine: document model, layout, and the two state machines
//! that run on a page (scroll coordination and location tracking).

use std::path::Path;

use anyhow::Context as _;

pub mod document;
pub mod geometry;
pub mod keyboard;
pub mod layout;
pub mod location;
pub mod page;
pub mod scroll;

pub use document::{Block, Chapter, Document, Paragraph, SHORT_TOC_ID, Section};
pub use geometry::{Align, Behavior, Rect};
pub use keyboard::{ParagraphMove, ParagraphNavigator};
pub use layout::{GUTTER, Layout, LayoutLine, LineKind};
pub use location::{
    AddressBar, HeadingAction, HeadingClick, LocationHost, LocationResolver, Resolution,
    SampleOutcome, SamplerState, TocView,
};
pub use page::{CHROME_ROWS, Location, Page, PageEvent};
pub use scroll::{
    DualPaneOutcome, PaneHost, PaneMetrics, ScrollCoordinator, ScrollOutcome, SyncGuard,
    WidthCheck,
};

#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub document: Document,
    /// `file://` url of the document, without a fragment.
    pub base_url: String,
}

/// Reads and parses a Markdown document. The file stem becomes the title.
pub fn load_document(path: &Path) -> anyhow::Result<LoadedDocument> {
    let path = path
        .canonicalize()
        .with_context(|| format!("resolve document path {}", path.display()))?;
    let markdown = std::fs::read_to_string(&path)
        .with_context(|| format!("read document {}", path.display()))?;
    let title = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Untitled".to_string());
    let base_url = url::Url::from_file_path(&path)
        .map_err(|()| anyhow::anyhow!("document path {} is not absolute", path.display()))?
        .to_string();

    let document = Document::parse(&title, &markdown);
    log::info!(
        "loaded {} ({} sections, {} paragraphs)",
        path.display(),
        document.sections.len(),
        document.paragraphs.len()
    );
    Ok(LoadedDocument { document, base_url })
}
