//! Core domain types for Bifocals.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

mod fragment;

pub use fragment::{
    FragmentError, FragmentTarget, decode as decode_fragment, is_paragraph_specific,
    paragraph_number,
};

/// Storage key for the last primary-pane offset.
pub const SCROLL_TOP_KEY: &str = "col1ScrollTop";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PaneId {
    Primary,
    Mirror,
}

impl PaneId {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaneId::Primary => "primary",
            PaneId::Mirror => "mirror",
        }
    }
}

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn paragraph(number: u32) -> Self {
        Self(format!("p{number}"))
    }

    pub fn summary(number: u32) -> Self {
        Self(format!("s{number}"))
    }

    /// Containers carry their heading's id prefixed with `_`.
    pub fn container_of(heading: &str) -> Self {
        Self(format!("_{heading}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An element id within one pane. The mirrored pane shares the primary
/// pane's ids; the pane tag keeps them apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedId {
    pub pane: PaneId,
    pub id: ElementId,
}

impl ScopedId {
    pub fn new(pane: PaneId, id: ElementId) -> Self {
        Self { pane, id }
    }

    pub fn primary(id: ElementId) -> Self {
        Self::new(PaneId::Primary, id)
    }
}

impl fmt::Display for ScopedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pane, self.id)
    }
}

/// Vertical offset between the two panes, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScrollDelta(pub i64);

impl ScrollDelta {
    /// `floor(height * (1 - chrome_fraction))`: header and footer each take
    /// half of the chrome fraction.
    pub fn from_viewport(height: f64, chrome_fraction: f64) -> Self {
        Self((height * (1.0 - chrome_fraction)).floor() as i64)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chrome_fraction: f64,
    pub sync_tolerance_px: i64,
    pub min_visible_fraction: f64,
    pub header_fraction: f64,
    pub top_margin_px: f64,
    pub preview_chars: usize,
    pub measure: u16,
    pub line_height_px: i64,
    pub cell_width_px: i64,
    pub smooth_scroll_frames: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chrome_fraction: 0.10,
            sync_tolerance_px: 5,
            min_visible_fraction: 0.3,
            header_fraction: 0.06,
            top_margin_px: 50.0,
            preview_chars: 200,
            measure: 72,
            line_height_px: 16,
            cell_width_px: 8,
            smooth_scroll_frames: 12,
        }
    }
}

impl Settings {
    pub fn normalize(&mut self) {
        self.chrome_fraction = sanitize_fraction(self.chrome_fraction, 0.10).clamp(0.0, 0.5);
        self.sync_tolerance_px = self.sync_tolerance_px.clamp(0, 100);
        self.min_visible_fraction = sanitize_fraction(self.min_visible_fraction, 0.3);
        self.header_fraction = sanitize_fraction(self.header_fraction, 0.06).clamp(0.0, 0.5);
        if !self.top_margin_px.is_finite() || self.top_margin_px < 0.0 {
            self.top_margin_px = 50.0;
        }
        self.preview_chars = self.preview_chars.clamp(16, 2000);
        self.measure = self.measure.clamp(20, 200);
        self.line_height_px = self.line_height_px.clamp(1, 128);
        self.cell_width_px = self.cell_width_px.clamp(1, 64);
        self.smooth_scroll_frames = self.smooth_scroll_frames.clamp(1, 120);
    }
}

fn sanitize_fraction(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKey {
    OpenToc,
    TwoCols,
    DarkMode,
}

impl FlagKey {
    pub const ALL: [FlagKey; 3] = [FlagKey::OpenToc, FlagKey::TwoCols, FlagKey::DarkMode];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKey::OpenToc => "openToc",
            FlagKey::TwoCols => "twoCols",
            FlagKey::DarkMode => "darkMode",
        }
    }
}

impl fmt::Display for FlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-document key/value persistence. Writes are best-effort: stores log
/// their own failures instead of surfacing them.
pub trait FlagStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

impl<T: FlagStore + ?Sized> FlagStore for Box<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) {
        (**self).set(key, value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiFlags {
    pub toc_open: bool,
    pub two_cols: bool,
    pub dark_mode: bool,
}

impl UiFlags {
    pub fn load(store: &(impl FlagStore + ?Sized)) -> Self {
        let mut flags = Self::default();
        for key in FlagKey::ALL {
            flags.set(key, store.get(key.as_str()).as_deref() == Some("true"));
        }
        flags
    }

    pub fn get(&self, key: FlagKey) -> bool {
        match key {
            FlagKey::OpenToc => self.toc_open,
            FlagKey::TwoCols => self.two_cols,
            FlagKey::DarkMode => self.dark_mode,
        }
    }

    pub fn set(&mut self, key: FlagKey, value: bool) {
        match key {
            FlagKey::OpenToc => self.toc_open = value,
            FlagKey::TwoCols => self.two_cols = value,
            FlagKey::DarkMode => self.dark_mode = value,
        }
    }

    /// Flips a flag and persists the new value.
    pub fn toggle(&mut self, key: FlagKey, store: &mut (impl FlagStore + ?Sized)) -> bool {
        let value = !self.get(key);
        self.set(key, value);
        store.set(key.as_str(), if value { "true" } else { "false" });
        value
    }
}

/// Social-preview style metadata for the resolved navigation target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewMeta {
    pub title: String,
    pub description: String,
    pub url: String,
}

/// Trimmed text, cut to `max_chars` characters with a `...` suffix.
pub fn preview_text(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() > max_chars {
        let mut out: String = trimmed.chars().take(max_chars).collect();
        out.push_str("...");
        out
    } else {
        trimmed.to_string()
    }
}
