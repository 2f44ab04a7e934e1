use reqwest::Url;
use serde::{Deserialize, Serialize};

fn default_done() -> bool {
    true
}

/// One manifest entry. Order in the manifest is the navigation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub file: String,
    pub title: String,
    #[serde(default = "default_done")]
    pub done: bool,
}

/// Target carried by a prev/next control.
#[derive(Debug, Clone, PartialEq)]
pub struct NavTarget {
    pub index: usize,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Prev,
    Next,
}

/// Prev/next controls as the host should display them. `None` means disabled.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControlState {
    pub prev: Option<NavTarget>,
    pub next: Option<NavTarget>,
}

impl ControlState {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn target(&self, control: Control) -> Option<&NavTarget> {
        match control {
            Control::Prev => self.prev.as_ref(),
            Control::Next => self.next.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChapterListEntry {
    pub index: usize,
    pub title: String,
    pub enabled: bool,
    pub current: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopNav {
    #[default]
    Visible,
    Hidden,
}

impl TopNav {
    pub fn is_visible(self) -> bool {
        self == TopNav::Visible
    }
}

/// A glossary-tagged element found in rendered chapter markup.
#[derive(Debug, Clone, PartialEq)]
pub struct GlossaryTerm {
    /// Document-order position of the element, stable for one rendering.
    pub id: usize,
    pub text: String,
    pub tooltip: String,
    pub image: Option<String>,
    pub image_alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TooltipImage {
    pub url: Url,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TooltipContent {
    pub text: String,
    pub image: Option<TooltipImage>,
}

/// What the host needs to draw the full-screen image viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerView {
    pub url: Url,
    pub alt: String,
    pub scale: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}
