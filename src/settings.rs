use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Manifest location relative to the page directory.
    pub manifest_path: String,
    /// Directory holding chapter documents, relative to the page directory.
    pub chapters_dir: String,
    pub probe_timeout_ms: u64,
    pub hide_delay_ms: u64,
    pub top_threshold_px: f64,
    pub layout_settle_ms: u64,
    /// Animation frames to wait before restoring a carried-over scroll offset.
    pub restore_frames: u32,
    pub zoom_scale: f64,
    pub drag_threshold_px: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            manifest_path: "chapters.json".to_string(),
            chapters_dir: "chapters".to_string(),
            probe_timeout_ms: 3000,
            hide_delay_ms: 1000,
            top_threshold_px: 10.0,
            layout_settle_ms: 300,
            restore_frames: 2,
            zoom_scale: 2.0,
            drag_threshold_px: 5.0,
        }
    }
}

impl Settings {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }

    pub fn layout_settle(&self) -> Duration {
        Duration::from_millis(self.layout_settle_ms)
    }
}
