//! The reader controller.
//!
//! One `Reader` owns every piece of mutable state for a page lifetime: the
//! chapter list, the navigation index, both image caches, the tooltip
//! bindings, the top-nav state machine and the image viewer. Hosts forward
//! their events to the `on_*` methods; none of them returns an error, since
//! failures are shown in the page instead.

use crate::chapters::ChapterStore;
use crate::error::LoadError;
use crate::glossary::{content_images, scan_glossary};
use crate::host::{
    Fetcher, ImageLoader, ImageProbe, KeyValueStore, Page, Renderer, TooltipLayer,
};
use crate::images::ImageResolver;
use crate::models::{
    Chapter, Control, ControlState, GlossaryTerm, TooltipContent, TopNav,
};
use crate::navigation::NavigationController;
use crate::settings::Settings;
use crate::site::Site;
use crate::tooltip::TooltipManager;
use crate::viewer::ImageViewer;
use crate::visibility::{Evaluation, FrameGate, ScrollSample, VisibilityStateMachine};
use std::time::Duration;

/// Everything a `Reader` needs from its environment.
pub struct Host {
    pub page: Box<dyn Page>,
    pub fetcher: Box<dyn Fetcher>,
    pub renderer: Option<Box<dyn Renderer>>,
    pub tooltips: Option<Box<dyn TooltipLayer>>,
    pub probe: Box<dyn ImageProbe>,
    pub loader: Box<dyn ImageLoader>,
    pub durable: Box<dyn KeyValueStore>,
    pub session: Box<dyn KeyValueStore>,
}

pub struct Reader {
    settings: Settings,
    site: Site,
    page: Box<dyn Page>,
    fetcher: Box<dyn Fetcher>,
    renderer: Option<Box<dyn Renderer>>,
    store: ChapterStore,
    navigation: NavigationController,
    images: ImageResolver,
    tooltips: TooltipManager,
    visibility: VisibilityStateMachine,
    frames: FrameGate,
    scroll_dirty: bool,
    settle_at: Option<Duration>,
    viewer: ImageViewer,
    terms: Vec<GlossaryTerm>,
    figures: Vec<String>,
}

impl Reader {
    pub fn new(settings: Settings, site: Site, host: Host) -> Self {
        let chapters_dir = site
            .chapters_dir(&settings)
            .unwrap_or_else(|_| site.page_url().clone());
        let images = ImageResolver::new(
            site.page_url().clone(),
            chapters_dir,
            settings.probe_timeout(),
            host.probe,
            host.loader,
        );

        Self {
            visibility: VisibilityStateMachine::from_settings(&settings),
            viewer: ImageViewer::from_settings(&settings),
            navigation: NavigationController::new(host.durable, host.session),
            tooltips: TooltipManager::new(host.tooltips),
            images,
            page: host.page,
            fetcher: host.fetcher,
            renderer: host.renderer,
            store: ChapterStore::default(),
            frames: FrameGate::default(),
            scroll_dirty: false,
            settle_at: None,
            terms: Vec::new(),
            figures: Vec::new(),
            settings,
            site,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &ChapterStore {
        &self.store
    }

    pub fn current_index(&self) -> Option<usize> {
        self.navigation.current_index()
    }

    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.navigation.current_chapter(&self.store)
    }

    pub fn controls(&self) -> ControlState {
        self.navigation.controls(&self.store)
    }

    pub fn top_nav(&self) -> TopNav {
        self.visibility.state()
    }

    pub fn hide_pending(&self) -> bool {
        self.visibility.hide_pending()
    }

    pub fn terms(&self) -> &[GlossaryTerm] {
        &self.terms
    }

    /// `src` of every image in the current chapter content.
    pub fn figures(&self) -> &[String] {
        &self.figures
    }

    pub fn images(&self) -> &ImageResolver {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut ImageResolver {
        &mut self.images
    }

    pub fn viewer(&self) -> &ImageViewer {
        &self.viewer
    }

    /// Loads the manifest and opens the starting chapter.
    pub fn start(&mut self) {
        match self.load_manifest() {
            Ok(store) => self.store = store,
            Err(err) => {
                log::warn!("could not load chapter list: {}", err);
                self.page
                    .show_status(&format!("Could not load the chapter list: {err}"));
                self.page.set_controls(&ControlState::disabled());
                self.page.set_chapter_list(&[]);
                self.reevaluate();
                return;
            }
        }
        self.publish_chapter_list();

        match self.navigation.initial_index(&self.store) {
            Some(index) => self.go_to_chapter(index),
            None => {
                log::info!("manifest has no available chapters");
                self.page.show_status("No chapters are available yet.");
                self.page.set_controls(&ControlState::disabled());
            }
        }

        // Late layout shifts (fonts, images) can move the competing control
        // after the first pass, so evaluate once more a little later.
        self.reevaluate();
        let settle_at = self.page.now() + self.settings.layout_settle();
        self.settle_at = Some(settle_at);
        self.page.schedule_timer(settle_at);
    }

    fn load_manifest(&self) -> Result<ChapterStore, LoadError> {
        let url = self
            .site
            .manifest_url(&self.settings)
            .map_err(|err| LoadError::Fetch {
                url: self.settings.manifest_path.clone(),
                reason: err.to_string(),
            })?;
        ChapterStore::load(self.fetcher.as_ref(), &url)
    }

    pub fn go_to_chapter(&mut self, index: usize) {
        let Some(chapter) = self.navigation.select(&self.store, index) else {
            return;
        };
        log::info!("opening chapter {} ({})", index, chapter.file);

        self.load_chapter(&chapter);
        self.page.scroll_to(0.0);
        self.page.close_panel();
        self.refresh_controls();
        self.publish_chapter_list();

        let scroll_y = self.page.scroll_y();
        if scroll_y <= self.settings.top_threshold_px && !self.page.competing_control_visible() {
            let evaluation = self.visibility.show_now(scroll_y);
            self.apply(evaluation);
        } else {
            self.reevaluate();
        }
    }

    fn load_chapter(&mut self, chapter: &Chapter) {
        self.page.set_title(&chapter.title);

        let html = match self.fetch_and_render(chapter) {
            Ok(html) => html,
            Err(err) => {
                log::warn!("could not load chapter {}: {}", chapter.file, err);
                self.page
                    .show_status(&format!("Could not load \"{}\": {err}", chapter.title));
                self.terms.clear();
                self.figures.clear();
                self.tooltips.unbind_all();
                self.navigation.clear_restore();
                return;
            }
        };

        self.page.set_content(&html);
        self.terms = scan_glossary(&html);
        self.figures = content_images(&html);
        let resolved = self.images.preload_terms(&self.terms, Some(&chapter.file));
        let bound = self.tooltips.bind_all(&self.terms);
        log::debug!(
            "chapter {}: {} figures, {} glossary terms, {} images resolved, {} tooltips bound",
            chapter.file,
            self.figures.len(),
            self.terms.len(),
            resolved,
            bound
        );

        if self
            .navigation
            .arm_restore(&chapter.file, self.settings.restore_frames)
        {
            self.schedule_frame();
        }
    }

    fn fetch_and_render(&self, chapter: &Chapter) -> Result<String, LoadError> {
        let url = self
            .site
            .chapter_url(&self.settings, &chapter.file)
            .map_err(|err| LoadError::Fetch {
                url: chapter.file.clone(),
                reason: err.to_string(),
            })?;
        let source = self.fetcher.fetch_text(&url)?;
        let renderer = self.renderer.as_ref().ok_or(LoadError::RendererMissing)?;
        renderer.render(&source)
    }

    pub fn refresh_controls(&mut self) {
        let controls = self.navigation.controls(&self.store);
        self.page.set_controls(&controls);
    }

    fn publish_chapter_list(&mut self) {
        let entries = self.store.list_entries(self.navigation.current_index());
        self.page.set_chapter_list(&entries);
    }

    pub fn on_control_activated(&mut self, control: Control) {
        let target = self
            .navigation
            .controls(&self.store)
            .target(control)
            .map(|target| target.index);
        if let Some(index) = target {
            self.go_to_chapter(index);
        }
    }

    /// A click in the chapter list. Undone chapters are ignored.
    pub fn on_chapter_selected(&mut self, index: usize) {
        self.go_to_chapter(index);
    }

    pub fn on_scroll(&mut self) {
        self.scroll_dirty = true;
        self.schedule_frame();
    }

    pub fn on_resize(&mut self) {
        self.on_scroll();
    }

    fn schedule_frame(&mut self) {
        if self.frames.request() {
            self.page.request_frame();
        }
    }

    pub fn on_frame(&mut self) {
        if !self.frames.begin_frame() {
            return;
        }

        if let Some(offset) = self.navigation.advance_restore() {
            log::debug!("restoring scroll offset {}", offset);
            self.page.scroll_to(offset);
            self.scroll_dirty = true;
        }

        if std::mem::take(&mut self.scroll_dirty) {
            self.reevaluate();
        }

        if self.navigation.restore_pending() {
            self.schedule_frame();
        }
    }

    pub fn on_timer(&mut self) {
        let now = self.page.now();
        if self.settle_at.is_some_and(|at| at <= now) {
            self.settle_at = None;
            self.reevaluate();
        }
        let evaluation = self
            .visibility
            .fire_due(now, self.page.competing_control_visible());
        self.apply(evaluation);
    }

    /// The competing control crossed the viewport boundary.
    pub fn on_competing_control_changed(&mut self, visible: bool) {
        let sample = ScrollSample {
            scroll_y: self.page.scroll_y(),
            competing_visible: visible,
            now: self.page.now(),
        };
        let evaluation = self.visibility.evaluate(sample);
        self.apply(evaluation);
    }

    fn reevaluate(&mut self) {
        let sample = ScrollSample {
            scroll_y: self.page.scroll_y(),
            competing_visible: self.page.competing_control_visible(),
            now: self.page.now(),
        };
        let evaluation = self.visibility.evaluate(sample);
        self.apply(evaluation);
    }

    fn apply(&mut self, evaluation: Evaluation) {
        if let Some(state) = evaluation.changed {
            log::debug!("top navigation -> {:?}", state);
            self.page.set_top_nav_visible(state.is_visible());
        }
        if let Some(at) = evaluation.armed {
            self.page.schedule_timer(at);
        }
    }

    pub fn on_before_unload(&mut self) {
        let scroll_y = self.page.scroll_y();
        if self.navigation.record_unload(&self.store, scroll_y) {
            log::debug!("saved scroll offset {} for reload", scroll_y);
        }
    }

    /// Tab visibility changed.
    pub fn on_visibility_change(&mut self, visible: bool) {
        if visible {
            let reissued = self.images.refresh_preloads();
            if reissued > 0 {
                log::debug!("re-issued {} image preloads", reissued);
            }
        }
    }

    pub fn on_tooltip_show(&mut self, element: usize) -> Option<TooltipContent> {
        let chapter = self.current_chapter().map(|c| c.file.clone());
        self.tooltips
            .compose(element, &mut self.images, chapter.as_deref())
    }

    pub fn on_tooltip_image_click(&mut self, element: usize) {
        if let Some(image) = self.tooltips.image_clicked(element) {
            self.viewer.open(image.url, image.alt);
            self.present_viewer();
        }
    }

    /// A click on an image inside the chapter content.
    pub fn on_content_image_click(&mut self, src: &str, alt: &str) {
        match self.site.page_url().join(src) {
            Ok(url) => {
                self.viewer.open(url, alt);
                self.present_viewer();
            }
            Err(err) => log::debug!("ignoring click on image {}: {}", src, err),
        }
    }

    pub fn on_viewer_click(&mut self) {
        self.viewer.click();
        self.present_viewer();
    }

    pub fn on_viewer_pointer_down(&mut self, x: f64, y: f64) {
        self.viewer.pointer_down(x, y);
    }

    pub fn on_viewer_pointer_move(&mut self, x: f64, y: f64) {
        self.viewer.pointer_move(x, y);
        if self.viewer.is_zoomed() {
            self.present_viewer();
        }
    }

    pub fn on_viewer_pointer_up(&mut self) {
        self.viewer.pointer_up();
    }

    pub fn on_viewer_backdrop_click(&mut self) {
        self.viewer.backdrop_click();
        self.present_viewer();
    }

    /// Returns true when the key was consumed.
    pub fn on_key(&mut self, key: &str) -> bool {
        let consumed = self.viewer.key(key);
        if consumed {
            self.present_viewer();
        }
        consumed
    }

    fn present_viewer(&mut self) {
        let view = self.viewer.view();
        self.page.present_viewer(view.as_ref());
    }
}
