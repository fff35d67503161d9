//! Viewport geometry helpers shared by the scroll coordinator and the
//! location resolver. Rects are viewport-relative, in pixels.

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Start,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Instant,
    Smooth,
}

/// Edges touching the viewport count as intersecting.
pub fn intersects_viewport(rect: Rect, viewport_height: f64) -> bool {
    rect.top <= viewport_height && rect.bottom() >= 0.0
}

/// Visible height over `min(height, viewport_height)`, so an element taller
/// than the viewport that fills it counts as fully visible.
pub fn visible_fraction(rect: Rect, viewport_height: f64) -> f64 {
    let visible = (rect.bottom().min(viewport_height) - rect.top.max(0.0)).max(0.0);
    let basis = rect.height.min(viewport_height);
    if basis <= 0.0 { 0.0 } else { visible / basis }
}

/// Index of the rect with the greatest visible fraction strictly above
/// `threshold`. Equal fractions keep the earlier rect.
pub fn most_visible(
    rects: impl IntoIterator<Item = Rect>,
    viewport_height: f64,
    threshold: f64,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    let mut max = 0.0;
    for (index, rect) in rects.into_iter().enumerate() {
        let fraction = visible_fraction(rect, viewport_height);
        if fraction > max && fraction > threshold {
            max = fraction;
            best = Some((index, fraction));
        }
    }
    best
}

pub fn straddles(rect: Rect, y: f64) -> bool {
    rect.top <= y && rect.bottom() >= y
}

/// Scroll offset that brings an element at document offset `top` into view.
pub fn scroll_target(top: f64, height: f64, viewport_height: f64, align: Align) -> f64 {
    match align {
        Align::Start => top,
        Align::Center => top + height / 2.0 - viewport_height / 2.0,
    }
}
