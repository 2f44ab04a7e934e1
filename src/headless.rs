//! An in-memory page for running the reader without a browser. Clones share
//! state, so a caller can keep a handle while the `Reader` owns another.

use crate::host::{Page, TooltipId, TooltipLayer};
use crate::models::{ChapterListEntry, ControlState, GlossaryTerm, NavTarget, ViewerView};
use crate::reader::Reader;
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Upper bound on frames run by one `pump`, so a host bug cannot spin.
const MAX_FRAMES_PER_PUMP: usize = 32;

#[derive(Debug, Clone)]
pub struct PageState {
    pub now: Duration,
    pub scroll_y: f64,
    pub competing_visible: bool,
    pub top_nav_visible: bool,
    pub title: String,
    pub content: String,
    pub status: Option<String>,
    pub controls: ControlState,
    pub chapter_list: Vec<ChapterListEntry>,
    pub panel_open: bool,
    pub viewer: Option<ViewerView>,
    pub frame_requested: bool,
    pub timers: Vec<Duration>,
    pub events: Vec<String>,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            scroll_y: 0.0,
            competing_visible: false,
            top_nav_visible: true,
            title: String::new(),
            content: String::new(),
            status: None,
            controls: ControlState::disabled(),
            chapter_list: Vec::new(),
            panel_open: false,
            viewer: None,
            frame_requested: false,
            timers: Vec::new(),
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessPage {
    state: Rc<RefCell<PageState>>,
}

impl HeadlessPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Ref<'_, PageState> {
        self.state.borrow()
    }

    fn record(&self, event: String) {
        let mut state = self.state.borrow_mut();
        let stamp = state.now.as_millis();
        state.events.push(format!("[{stamp:>6}ms] {event}"));
    }

    pub fn take_events(&self) -> Vec<String> {
        std::mem::take(&mut self.state.borrow_mut().events)
    }

    /// A user scroll. The caller still has to forward `Reader::on_scroll`.
    pub fn user_scroll(&self, y: f64) {
        self.state.borrow_mut().scroll_y = y.max(0.0);
    }

    pub fn set_competing_visible(&self, visible: bool) {
        self.state.borrow_mut().competing_visible = visible;
    }

    pub fn open_panel(&self) {
        self.state.borrow_mut().panel_open = true;
    }

    pub fn advance(&self, by: Duration) {
        self.state.borrow_mut().now += by;
    }

    pub fn take_frame_request(&self) -> bool {
        std::mem::take(&mut self.state.borrow_mut().frame_requested)
    }

    /// Removes and counts the timers whose deadline has passed.
    pub fn take_due_timers(&self) -> usize {
        let mut state = self.state.borrow_mut();
        let now = state.now;
        let before = state.timers.len();
        state.timers.retain(|at| *at > now);
        before - state.timers.len()
    }

    /// Runs requested animation frames and due timers until nothing is left.
    pub fn pump(&self, reader: &mut Reader) {
        for _ in 0..MAX_FRAMES_PER_PUMP {
            let frame = self.take_frame_request();
            let timers = self.take_due_timers();
            if !frame && timers == 0 {
                break;
            }
            if frame {
                reader.on_frame();
            }
            for _ in 0..timers {
                reader.on_timer();
            }
        }
    }

    /// Moves the clock forward by `by`, stopping at each timer deadline on
    /// the way so timers fire at their own time.
    pub fn run_for(&self, reader: &mut Reader, by: Duration) {
        let target = self.now() + by;
        loop {
            let next = {
                let state = self.state.borrow();
                state
                    .timers
                    .iter()
                    .copied()
                    .filter(|at| *at <= target)
                    .min()
            };
            match next {
                Some(at) => {
                    let mut state = self.state.borrow_mut();
                    state.now = state.now.max(at);
                }
                None => {
                    self.state.borrow_mut().now = target;
                    self.pump(reader);
                    return;
                }
            }
            self.pump(reader);
        }
    }
}

impl Page for HeadlessPage {
    fn now(&self) -> Duration {
        self.state.borrow().now
    }

    fn scroll_y(&self) -> f64 {
        self.state.borrow().scroll_y
    }

    fn scroll_to(&mut self, y: f64) {
        let y = y.max(0.0);
        self.state.borrow_mut().scroll_y = y;
        self.record(format!("scroll-to {y}"));
    }

    fn competing_control_visible(&self) -> bool {
        self.state.borrow().competing_visible
    }

    fn set_top_nav_visible(&mut self, visible: bool) {
        self.state.borrow_mut().top_nav_visible = visible;
        self.record(format!(
            "top-nav {}",
            if visible { "shown" } else { "hidden" }
        ));
    }

    fn set_content(&mut self, html: &str) {
        {
            let mut state = self.state.borrow_mut();
            state.content = html.to_string();
            state.status = None;
        }
        self.record(format!("content {} bytes", html.len()));
    }

    fn show_status(&mut self, message: &str) {
        {
            let mut state = self.state.borrow_mut();
            state.content.clear();
            state.status = Some(message.to_string());
        }
        self.record(format!("status {message}"));
    }

    fn set_title(&mut self, title: &str) {
        self.state.borrow_mut().title = title.to_string();
        self.record(format!("title {title}"));
    }

    fn set_controls(&mut self, controls: &ControlState) {
        self.state.borrow_mut().controls = controls.clone();
        let describe = |target: &Option<NavTarget>| match target {
            Some(target) => format!("{} ({})", target.index, target.label),
            None => "disabled".to_string(),
        };
        self.record(format!(
            "controls prev={} next={}",
            describe(&controls.prev),
            describe(&controls.next)
        ));
    }

    fn set_chapter_list(&mut self, entries: &[ChapterListEntry]) {
        self.state.borrow_mut().chapter_list = entries.to_vec();
    }

    fn close_panel(&mut self) {
        self.state.borrow_mut().panel_open = false;
    }

    fn present_viewer(&mut self, view: Option<&ViewerView>) {
        self.state.borrow_mut().viewer = view.cloned();
        match view {
            Some(view) => self.record(format!(
                "viewer {} scale={} pan=({}, {})",
                view.url, view.scale, view.pan_x, view.pan_y
            )),
            None => self.record("viewer closed".to_string()),
        }
    }

    fn request_frame(&mut self) {
        self.state.borrow_mut().frame_requested = true;
    }

    fn schedule_timer(&mut self, at: Duration) {
        self.state.borrow_mut().timers.push(at);
    }
}

/// Tooltip layer that only hands out ids and logs.
#[derive(Debug, Default)]
pub struct HeadlessTooltips {
    next: TooltipId,
}

impl TooltipLayer for HeadlessTooltips {
    fn create(&mut self, term: &GlossaryTerm) -> TooltipId {
        self.next += 1;
        log::debug!("tooltip {} bound to {:?}", self.next, term.text);
        self.next
    }

    fn destroy(&mut self, id: TooltipId) {
        log::debug!("tooltip {} destroyed", id);
    }

    fn hide(&mut self, id: TooltipId) {
        log::debug!("tooltip {} hidden", id);
    }
}
