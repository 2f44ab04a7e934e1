//! Show/hide decisions for the floating top navigation.
//!
//! Every trigger (scroll frame, resize frame, the competing control's
//! intersection observer, chapter load, layout settle) funnels into
//! [`VisibilityStateMachine::evaluate`]. Hiding while scrolling down is
//! deferred by `hide_delay`; anything that shows the bar or the competing
//! control appearing cancels the pending hide.

use crate::models::TopNav;
use crate::settings::Settings;
use std::time::Duration;

/// One observation of the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    pub scroll_y: f64,
    pub competing_visible: bool,
    pub now: Duration,
}

/// Result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Evaluation {
    /// New state, when it differs from the previous one.
    pub changed: Option<TopNav>,
    /// Deadline of a hide timer armed by this evaluation.
    pub armed: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct VisibilityStateMachine {
    top_nav: TopNav,
    last_scroll_y: f64,
    hide_deadline: Option<Duration>,
    top_threshold: f64,
    hide_delay: Duration,
}

impl VisibilityStateMachine {
    pub fn new(top_threshold: f64, hide_delay: Duration) -> Self {
        Self {
            top_nav: TopNav::Visible,
            last_scroll_y: 0.0,
            hide_deadline: None,
            top_threshold,
            hide_delay,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.top_threshold_px, settings.hide_delay())
    }

    pub fn state(&self) -> TopNav {
        self.top_nav
    }

    pub fn hide_pending(&self) -> bool {
        self.hide_deadline.is_some()
    }

    pub fn hide_deadline(&self) -> Option<Duration> {
        self.hide_deadline
    }

    pub fn evaluate(&mut self, sample: ScrollSample) -> Evaluation {
        let scrolling_up = sample.scroll_y < self.last_scroll_y;
        self.last_scroll_y = sample.scroll_y;

        if sample.competing_visible {
            self.hide_deadline = None;
            return self.transition(TopNav::Hidden);
        }

        if sample.scroll_y <= self.top_threshold || scrolling_up {
            self.hide_deadline = None;
            return self.transition(TopNav::Visible);
        }

        let mut evaluation = Evaluation::default();
        if self.top_nav.is_visible() && self.hide_deadline.is_none() {
            let deadline = sample.now + self.hide_delay;
            self.hide_deadline = Some(deadline);
            evaluation.armed = Some(deadline);
        }
        evaluation
    }

    /// Fires the pending hide if its deadline has passed.
    pub fn fire_due(&mut self, now: Duration, competing_visible: bool) -> Evaluation {
        match self.hide_deadline {
            Some(deadline) if deadline <= now => {
                self.hide_deadline = None;
                if competing_visible {
                    log::debug!("hide timer fired while the competing control is on screen");
                }
                self.transition(TopNav::Hidden)
            }
            _ => Evaluation::default(),
        }
    }

    /// Shows the bar right away, skipping the scroll-driven path. Used after a
    /// programmatic jump to the top of a freshly loaded chapter.
    pub fn show_now(&mut self, scroll_y: f64) -> Evaluation {
        self.last_scroll_y = scroll_y;
        self.hide_deadline = None;
        self.transition(TopNav::Visible)
    }

    fn transition(&mut self, next: TopNav) -> Evaluation {
        let changed = (self.top_nav != next).then_some(next);
        self.top_nav = next;
        Evaluation {
            changed,
            armed: None,
        }
    }
}

/// Coalesces high-frequency events into at most one evaluation per frame.
#[derive(Debug, Clone, Default)]
pub struct FrameGate {
    pending: bool,
}

impl FrameGate {
    /// Returns true when the caller must ask the host for a frame.
    pub fn request(&mut self) -> bool {
        !std::mem::replace(&mut self.pending, true)
    }

    /// Called at the start of a frame. Returns whether a frame was requested.
    pub fn begin_frame(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
