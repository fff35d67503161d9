//! Dual-pane scroll coordination.
//!
//! The mirrored pane leads the primary pane by [`ScrollDelta`]. Scrolling
//! either pane moves the other one, but only when they have drifted apart by
//! more than the sync tolerance, which keeps sub-pixel rounding from
//! bouncing events back and forth.

use std::cell::Cell;
use std::rc::Rc;

use bifocals_core::{FlagStore, PaneId, SCROLL_TOP_KEY, ScrollDelta, Settings, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneMetrics {
    pub scroll_top: i64,
    pub scroll_height: i64,
    pub client_height: i64,
}

impl PaneMetrics {
    pub fn max_scroll_top(&self) -> i64 {
        (self.scroll_height - self.client_height).max(0)
    }
}

/// The panes as seen by the coordinator.
pub trait PaneHost {
    fn viewport(&self) -> Viewport;
    /// `None` for the mirror until it is mounted.
    fn pane_metrics(&self, pane: PaneId) -> Option<PaneMetrics>;
    fn set_scroll_top(&mut self, pane: PaneId, top: i64);
    /// Mounts the mirrored pane; `false` when there is nowhere to mount it.
    fn mount_mirror(&mut self) -> bool;
    /// Rendered width of a content paragraph, if there is one to measure.
    fn paragraph_width(&self) -> Option<f64>;
}

/// Set while the coordinator assigns a scroll offset. Hosts that deliver
/// scroll events synchronously check it to drop the echo of that assignment.
#[derive(Debug, Clone, Default)]
pub struct SyncGuard(Rc<Cell<bool>>);

impl SyncGuard {
    pub fn is_active(&self) -> bool {
        self.0.get()
    }

    fn try_enter(&self) -> Option<SyncToken> {
        if self.0.replace(true) {
            return None;
        }
        Some(SyncToken(Rc::clone(&self.0)))
    }
}

struct SyncToken(Rc<Cell<bool>>);

impl Drop for SyncToken {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidthCheck {
    Fits,
    TooNarrow { viewport: f64, required: f64 },
    /// Nothing to measure against; the guard cannot fire.
    Unmeasured,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DualPaneOutcome {
    Entered(WidthCheck),
    Refreshed(WidthCheck),
    NoMountPoint,
}

impl DualPaneOutcome {
    pub fn width_check(&self) -> Option<WidthCheck> {
        match self {
            DualPaneOutcome::Entered(check) | DualPaneOutcome::Refreshed(check) => Some(*check),
            DualPaneOutcome::NoMountPoint => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOutcome {
    /// Re-entrant event during a programmatic assignment.
    Ignored,
    /// The pane was past its bound and has been pulled back.
    Clamped,
    Synced,
    InSync,
    /// Single-pane mode; only persistence ran.
    Unpaired,
}

#[derive(Debug)]
pub struct ScrollCoordinator {
    chrome_fraction: f64,
    tolerance: i64,
    delta: ScrollDelta,
    guard: SyncGuard,
    mounted: bool,
    active: bool,
}

impl ScrollCoordinator {
    pub fn new(settings: &Settings) -> Self {
        Self {
            chrome_fraction: settings.chrome_fraction,
            tolerance: settings.sync_tolerance_px,
            delta: ScrollDelta::default(),
            guard: SyncGuard::default(),
            mounted: false,
            active: false,
        }
    }

    pub fn delta(&self) -> ScrollDelta {
        self.delta
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn sync_guard(&self) -> SyncGuard {
        self.guard.clone()
    }

    pub fn enter_dual_pane<H, S>(&mut self, host: &mut H, store: &S) -> DualPaneOutcome
    where
        H: PaneHost + ?Sized,
        S: FlagStore + ?Sized,
    {
        if self.mounted {
            self.active = true;
            self.update_delta(host);
            return DualPaneOutcome::Refreshed(self.check_width(host));
        }

        if !host.mount_mirror() {
            log::debug!("dual-pane: no mount point for the mirrored pane");
            return DualPaneOutcome::NoMountPoint;
        }
        self.mounted = true;
        self.active = true;
        self.update_delta(host);

        if let Some(stored) = store.get(SCROLL_TOP_KEY) {
            match stored.trim().parse::<i64>() {
                Ok(top) => {
                    let top = match host.pane_metrics(PaneId::Primary) {
                        Some(primary) => top.clamp(0, self.primary_limit(primary)),
                        None => top.max(0),
                    };
                    host.set_scroll_top(PaneId::Primary, top);
                    if let Some(primary) = host.pane_metrics(PaneId::Primary) {
                        self.sync(host, PaneId::Mirror, primary.scroll_top + self.delta.get());
                    }
                }
                Err(err) => {
                    log::warn!("dual-pane: ignoring stored offset {stored:?}: {err}");
                }
            }
        }

        log::debug!("dual-pane: entered with delta {}", self.delta.get());
        DualPaneOutcome::Entered(self.check_width(host))
    }

    /// Stops syncing. The mirror stays mounted for the next entry.
    pub fn leave_dual_pane(&mut self) {
        self.active = false;
    }

    pub fn on_primary_scroll<H, S>(&mut self, host: &mut H, store: &mut S) -> ScrollOutcome
    where
        H: PaneHost + ?Sized,
        S: FlagStore + ?Sized,
    {
        if self.guard.is_active() {
            return ScrollOutcome::Ignored;
        }
        let Some(primary) = host.pane_metrics(PaneId::Primary) else {
            return ScrollOutcome::Ignored;
        };

        let mut outcome = ScrollOutcome::Unpaired;
        if self.active
            && let Some(mirror) = host.pane_metrics(PaneId::Mirror)
        {
            let delta = self.delta.get();
            let max = self.primary_limit(primary);
            if primary.scroll_top > max {
                host.set_scroll_top(PaneId::Primary, max);
                return ScrollOutcome::Clamped;
            }

            let target = primary.scroll_top + delta;
            outcome = if self.diverged(mirror.scroll_top, target) {
                self.sync(host, PaneId::Mirror, target);
                ScrollOutcome::Synced
            } else {
                ScrollOutcome::InSync
            };
        }

        store.set(SCROLL_TOP_KEY, &primary.scroll_top.to_string());
        outcome
    }

    pub fn on_mirror_scroll<H>(&mut self, host: &mut H) -> ScrollOutcome
    where
        H: PaneHost + ?Sized,
    {
        if self.guard.is_active() {
            return ScrollOutcome::Ignored;
        }
        if !self.active {
            return ScrollOutcome::Unpaired;
        }
        let (Some(primary), Some(mirror)) = (
            host.pane_metrics(PaneId::Primary),
            host.pane_metrics(PaneId::Mirror),
        ) else {
            return ScrollOutcome::Ignored;
        };

        let delta = self.delta.get();
        if mirror.scroll_top < delta {
            host.set_scroll_top(PaneId::Mirror, delta);
            return ScrollOutcome::Clamped;
        }

        let target = mirror.scroll_top - delta;
        if self.diverged(primary.scroll_top, target) {
            self.sync(host, PaneId::Primary, target);
            ScrollOutcome::Synced
        } else {
            ScrollOutcome::InSync
        }
    }

    /// Recomputes the delta and realigns the mirror. Returns the width check
    /// while dual-pane mode is active.
    pub fn on_resize<H>(&mut self, host: &mut H) -> Option<WidthCheck>
    where
        H: PaneHost + ?Sized,
    {
        self.update_delta(host);
        self.active.then(|| self.check_width(host))
    }

    pub fn check_width<H>(&self, host: &H) -> WidthCheck
    where
        H: PaneHost + ?Sized,
    {
        let Some(width) = host.paragraph_width() else {
            return WidthCheck::Unmeasured;
        };
        let viewport = host.viewport().width;
        let required = width * 2.0;
        if viewport < required {
            log::info!("dual-pane: viewport {viewport} narrower than {required}");
            WidthCheck::TooNarrow { viewport, required }
        } else {
            WidthCheck::Fits
        }
    }

    fn update_delta<H>(&mut self, host: &mut H)
    where
        H: PaneHost + ?Sized,
    {
        self.delta = ScrollDelta::from_viewport(host.viewport().height, self.chrome_fraction);
        if !self.mounted {
            return;
        }
        if let Some(primary) = host.pane_metrics(PaneId::Primary) {
            self.sync(host, PaneId::Mirror, primary.scroll_top + self.delta.get());
        }
    }

    /// Largest primary offset that leaves room for the mirror below it.
    fn primary_limit(&self, primary: PaneMetrics) -> i64 {
        (primary.scroll_height - primary.client_height - self.delta.get()).max(0)
    }

    fn diverged(&self, current: i64, target: i64) -> bool {
        (current - target).abs() > self.tolerance
    }

    fn sync<H>(&self, host: &mut H, pane: PaneId, top: i64) -> bool
    where
        H: PaneHost + ?Sized,
    {
        let Some(_token) = self.guard.try_enter() else {
            return false;
        };
        host.set_scroll_top(pane, top);
        true
    }
}
