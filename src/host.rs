//! Seams between the reader core and whatever hosts it.
//!
//! A browser host maps these onto the DOM, `fetch`, `localStorage`,
//! `sessionStorage`, `requestAnimationFrame`, `setTimeout` and an
//! intersection observer. The CLI maps them onto reqwest, SQLite and an
//! in-memory page (see [`crate::headless`]).

use crate::error::LoadError;
use crate::models::{ChapterListEntry, ControlState, GlossaryTerm, ViewerView};
use eyre::Result;
use reqwest::Url;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Cache-bypassing text fetch.
pub trait Fetcher {
    fn fetch_text(&self, url: &Url) -> std::result::Result<String, LoadError>;
}

/// Turns chapter source into HTML.
pub trait Renderer {
    fn render(&self, source: &str) -> std::result::Result<String, LoadError>;
}

/// String key-value storage. Callers treat every error as "nothing stored".
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Loaded,
    Failed,
    TimedOut,
}

impl ProbeOutcome {
    pub fn is_loaded(self) -> bool {
        self == ProbeOutcome::Loaded
    }
}

/// Loads a URL as an image and reports whether it worked. Must not block
/// longer than `timeout`.
pub trait ImageProbe {
    fn probe(&self, url: &Url, timeout: Duration) -> ProbeOutcome;
}

/// Starts a background image fetch.
pub trait ImageLoader {
    fn preload(&self, url: &Url) -> PreloadHandle;
}

/// Shared view of one background image fetch. The first completion wins.
#[derive(Debug, Clone, Default)]
pub struct PreloadHandle {
    outcome: Arc<OnceLock<bool>>,
}

impl PreloadHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that is already finished, for hosts that load synchronously.
    pub fn finished(loaded: bool) -> Self {
        let handle = Self::new();
        handle.complete(loaded);
        handle
    }

    /// Records the outcome. Returns false if the handle was already complete.
    pub fn complete(&self, loaded: bool) -> bool {
        self.outcome.set(loaded).is_ok()
    }

    pub fn is_complete(&self) -> bool {
        self.outcome.get().is_some()
    }

    pub fn is_loaded(&self) -> bool {
        self.outcome.get().copied().unwrap_or(false)
    }
}

/// Per-tooltip instance id handed out by the tooltip layer.
pub type TooltipId = u64;

pub trait TooltipLayer {
    fn create(&mut self, term: &GlossaryTerm) -> TooltipId;
    fn destroy(&mut self, id: TooltipId);
    fn hide(&mut self, id: TooltipId);
}

/// The page chrome and viewport.
pub trait Page {
    /// Monotonic time since the page was opened.
    fn now(&self) -> Duration;
    fn scroll_y(&self) -> f64;
    fn scroll_to(&mut self, y: f64);
    /// True while the persistent (non-floating) navigation intersects the
    /// viewport.
    fn competing_control_visible(&self) -> bool;

    fn set_top_nav_visible(&mut self, visible: bool);
    fn set_content(&mut self, html: &str);
    fn show_status(&mut self, message: &str);
    fn set_title(&mut self, title: &str);
    fn set_controls(&mut self, controls: &ControlState);
    fn set_chapter_list(&mut self, entries: &[ChapterListEntry]);
    fn close_panel(&mut self);
    fn present_viewer(&mut self, view: Option<&ViewerView>);

    /// Ask for one `Reader::on_frame` call at the next rendering opportunity.
    fn request_frame(&mut self);
    /// Ask for a `Reader::on_timer` call once `at` has passed.
    fn schedule_timer(&mut self, at: Duration);
}
