//! Keyboard paragraph navigation.

use bifocals_core::{ElementId, ScopedId};

use crate::geometry::{Align, Behavior, straddles};
use crate::location::{LocationHost, ParagraphRect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphMove {
    Previous,
    Next,
    First,
    Last,
    /// 1-based paragraph number, as typed by the reader.
    Number(u32),
}

/// Tracks the paragraph keyboard moves are relative to. The position is
/// re-read from the viewport before every move, so scrolling with the mouse
/// or the other pane is picked up.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParagraphNavigator {
    current: usize,
}

impl ParagraphNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the current paragraph in document order.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Picks the first paragraph straddling the viewport center. Keeps the
    /// previous index when the center falls between paragraphs.
    pub fn sync(&mut self, paragraphs: &[ParagraphRect], viewport_height: f64) {
        let center = viewport_height / 2.0;
        if let Some(index) = paragraphs.iter().position(|p| straddles(p.rect, center)) {
            self.current = index;
        }
    }

    pub fn target(&self, movement: ParagraphMove, count: usize) -> Option<usize> {
        let index = match movement {
            ParagraphMove::Previous => self.current.checked_sub(1)?,
            ParagraphMove::Next => self.current + 1,
            ParagraphMove::First => 0,
            ParagraphMove::Last => count.checked_sub(1)?,
            ParagraphMove::Number(n) => usize::try_from(n).ok()?.checked_sub(1)?,
        };
        (index < count).then_some(index)
    }

    /// Centers the target paragraph with a smooth scroll. Out-of-range moves
    /// do nothing and return `None`.
    pub fn navigate<H>(&mut self, host: &mut H, movement: ParagraphMove) -> Option<u32>
    where
        H: LocationHost + ?Sized,
    {
        let paragraphs = host.paragraphs();
        self.sync(&paragraphs, host.viewport_height());
        let index = self.target(movement, paragraphs.len())?;
        let number = paragraphs[index].number;
        host.scroll_into_view(
            &ScopedId::primary(ElementId::paragraph(number)),
            Align::Center,
            Behavior::Smooth,
        );
        self.current = index;
        Some(number)
    }
}
