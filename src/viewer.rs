use crate::models::ViewerView;
use crate::settings::Settings;
use reqwest::Url;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    last_x: f64,
    last_y: f64,
    travelled: f64,
}

/// Full-screen image viewer: click toggles zoom, dragging pans while zoomed.
#[derive(Debug, Clone)]
pub struct ImageViewer {
    image: Option<(Url, String)>,
    zoomed: bool,
    pan_x: f64,
    pan_y: f64,
    drag: Option<Drag>,
    suppress_click: bool,
    zoom_scale: f64,
    drag_threshold: f64,
}

impl ImageViewer {
    pub fn new(zoom_scale: f64, drag_threshold: f64) -> Self {
        Self {
            image: None,
            zoomed: false,
            pan_x: 0.0,
            pan_y: 0.0,
            drag: None,
            suppress_click: false,
            zoom_scale,
            drag_threshold,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.zoom_scale, settings.drag_threshold_px)
    }

    pub fn is_open(&self) -> bool {
        self.image.is_some()
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoomed
    }

    pub fn open(&mut self, url: Url, alt: impl Into<String>) {
        self.reset();
        self.image = Some((url, alt.into()));
    }

    pub fn close(&mut self) {
        self.reset();
        self.image = None;
    }

    fn reset(&mut self) {
        self.zoomed = false;
        self.pan_x = 0.0;
        self.pan_y = 0.0;
        self.drag = None;
        self.suppress_click = false;
    }

    /// Click on the image. A click that ends a drag is swallowed.
    pub fn click(&mut self) {
        if !self.is_open() {
            return;
        }
        if std::mem::take(&mut self.suppress_click) {
            return;
        }
        self.zoomed = !self.zoomed;
        if !self.zoomed {
            self.pan_x = 0.0;
            self.pan_y = 0.0;
        }
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        if !self.is_open() || !self.zoomed {
            return;
        }
        self.drag = Some(Drag {
            last_x: x,
            last_y: y,
            travelled: 0.0,
        });
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let dx = x - drag.last_x;
        let dy = y - drag.last_y;
        drag.last_x = x;
        drag.last_y = y;
        drag.travelled += dx.hypot(dy);
        self.pan_x += dx;
        self.pan_y += dy;
    }

    pub fn pointer_up(&mut self) {
        if let Some(drag) = self.drag.take() {
            if drag.travelled > self.drag_threshold {
                self.suppress_click = true;
            }
        }
    }

    /// Returns true when the key was consumed.
    pub fn key(&mut self, key: &str) -> bool {
        if self.is_open() && key == "Escape" {
            self.close();
            return true;
        }
        false
    }

    pub fn backdrop_click(&mut self) {
        self.close();
    }

    pub fn view(&self) -> Option<ViewerView> {
        let (url, alt) = self.image.as_ref()?;
        Some(ViewerView {
            url: url.clone(),
            alt: alt.clone(),
            scale: if self.zoomed { self.zoom_scale } else { 1.0 },
            pan_x: self.pan_x,
            pan_y: self.pan_y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened() -> ImageViewer {
        let mut viewer = ImageViewer::new(2.0, 5.0);
        viewer.open(Url::parse("https://example.com/a.png").unwrap(), "a");
        viewer
    }

    #[test]
    fn test_click_toggles_zoom() {
        let mut viewer = opened();
        assert_eq!(viewer.view().unwrap().scale, 1.0);
        viewer.click();
        assert!(viewer.is_zoomed());
        assert_eq!(viewer.view().unwrap().scale, 2.0);
        viewer.click();
        assert!(!viewer.is_zoomed());
    }

    #[test]
    fn test_drag_only_pans_while_zoomed() {
        let mut viewer = opened();
        viewer.pointer_down(0.0, 0.0);
        viewer.pointer_move(40.0, 10.0);
        viewer.pointer_up();
        let view = viewer.view().unwrap();
        assert_eq!((view.pan_x, view.pan_y), (0.0, 0.0));

        viewer.click();
        viewer.pointer_down(100.0, 100.0);
        viewer.pointer_move(110.0, 95.0);
        viewer.pointer_move(130.0, 90.0);
        viewer.pointer_up();
        let view = viewer.view().unwrap();
        assert_eq!((view.pan_x, view.pan_y), (30.0, -10.0));
    }

    #[test]
    fn test_drag_suppresses_following_click() {
        let mut viewer = opened();
        viewer.click();
        viewer.pointer_down(0.0, 0.0);
        viewer.pointer_move(20.0, 0.0);
        viewer.pointer_up();

        viewer.click();
        assert!(viewer.is_zoomed(), "click ending a drag must not unzoom");
        viewer.click();
        assert!(!viewer.is_zoomed());
    }

    #[test]
    fn test_small_jitter_does_not_suppress_click() {
        let mut viewer = opened();
        viewer.click();
        viewer.pointer_down(0.0, 0.0);
        viewer.pointer_move(2.0, 1.0);
        viewer.pointer_up();
        viewer.click();
        assert!(!viewer.is_zoomed());
        let view = viewer.view().unwrap();
        assert_eq!((view.pan_x, view.pan_y), (0.0, 0.0), "unzoom resets pan");
    }

    #[test]
    fn test_escape_and_backdrop_close_and_reset() {
        let mut viewer = opened();
        viewer.click();
        assert!(!viewer.key("Enter"));
        assert!(viewer.key("Escape"));
        assert!(!viewer.is_open());
        assert!(viewer.view().is_none());
        assert!(!viewer.key("Escape"));

        let mut viewer = opened();
        viewer.click();
        viewer.backdrop_click();
        assert!(!viewer.is_open());

        viewer.open(Url::parse("https://example.com/b.png").unwrap(), "b");
        assert!(!viewer.is_zoomed());
    }
}
