use crate::chapters::ChapterStore;
use crate::host::KeyValueStore;
use crate::models::{Chapter, ControlState, NavTarget};
use serde::{Deserialize, Serialize};

/// Durable key holding the last opened chapter.
pub const LAST_CHAPTER_KEY: &str = "lectern.last-chapter";
/// Session key prefix for scroll offsets carried across a reload.
pub const SCROLL_KEY_PREFIX: &str = "lectern.scroll:";

pub fn scroll_key(file: &str) -> String {
    format!("{SCROLL_KEY_PREFIX}{file}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LastChapter {
    last_file: String,
}

#[derive(Debug, Clone, PartialEq)]
struct ScrollRestore {
    file: String,
    offset: f64,
    frames_left: u32,
}

/// Current chapter, prev/next targets and the two persistence features:
/// remembering the last chapter and carrying the scroll offset over a reload.
pub struct NavigationController {
    current: Option<usize>,
    durable: Box<dyn KeyValueStore>,
    session: Box<dyn KeyValueStore>,
    restore: Option<ScrollRestore>,
    unload_recorded: bool,
}

impl NavigationController {
    pub fn new(durable: Box<dyn KeyValueStore>, session: Box<dyn KeyValueStore>) -> Self {
        Self {
            current: None,
            durable,
            session,
            restore: None,
            unload_recorded: false,
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_chapter<'a>(&self, store: &'a ChapterStore) -> Option<&'a Chapter> {
        self.current.and_then(|index| store.get(index))
    }

    /// Makes `index` current and remembers it. Returns `None` without touching
    /// any state when the index is out of range or not eligible.
    pub fn select(&mut self, store: &ChapterStore, index: usize) -> Option<Chapter> {
        if !store.is_eligible(index) {
            log::debug!("ignoring navigation to chapter {}", index);
            return None;
        }
        let chapter = store.get(index)?.clone();
        self.current = Some(index);
        self.remember(&chapter.file);
        Some(chapter)
    }

    pub fn controls(&self, store: &ChapterStore) -> ControlState {
        let Some(current) = self.current else {
            return ControlState::disabled();
        };
        let target = |index: Option<usize>| {
            let index = index?;
            store.get(index).map(|chapter| NavTarget {
                index,
                label: chapter.title.clone(),
            })
        };
        ControlState {
            prev: target(store.find_prev_eligible(current)),
            next: target(store.find_next_eligible(current)),
        }
    }

    /// Chapter to open at startup: the remembered one if it is still eligible,
    /// otherwise the first eligible chapter.
    pub fn initial_index(&self, store: &ChapterStore) -> Option<usize> {
        self.remembered_file()
            .and_then(|file| store.position_of(&file))
            .filter(|&index| store.is_eligible(index))
            .or_else(|| store.find_first_eligible())
    }

    pub fn remembered_file(&self) -> Option<String> {
        let raw = match self.durable.get(LAST_CHAPTER_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                log::debug!("last chapter unavailable: {}", err);
                return None;
            }
        };
        match serde_json::from_str::<LastChapter>(&raw) {
            Ok(last) => Some(last.last_file),
            Err(err) => {
                log::debug!("ignoring malformed last chapter record: {}", err);
                None
            }
        }
    }

    fn remember(&mut self, file: &str) {
        let record = LastChapter {
            last_file: file.to_string(),
        };
        let stored = serde_json::to_string(&record)
            .map_err(eyre::Report::from)
            .and_then(|json| self.durable.set(LAST_CHAPTER_KEY, &json));
        if let Err(err) = stored {
            log::debug!("could not remember chapter {}: {}", file, err);
        }
    }

    /// Snapshots the scroll offset for the current chapter as the page unloads.
    /// Only the first call per page lifetime records anything.
    pub fn record_unload(&mut self, store: &ChapterStore, scroll_y: f64) -> bool {
        if std::mem::replace(&mut self.unload_recorded, true) {
            return false;
        }
        let Some(chapter) = self.current_chapter(store) else {
            return false;
        };
        let key = scroll_key(&chapter.file);
        match self.session.set(&key, &scroll_y.to_string()) {
            Ok(()) => true,
            Err(err) => {
                log::debug!("could not store scroll offset: {}", err);
                false
            }
        }
    }

    /// Arms a scroll restore for `file` if the session holds an offset for it.
    /// Any restore armed for another chapter is dropped.
    pub fn arm_restore(&mut self, file: &str, frames: u32) -> bool {
        self.restore = None;
        let key = scroll_key(file);
        let raw = match self.session.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(err) => {
                log::debug!("session storage unavailable: {}", err);
                return false;
            }
        };
        match raw.parse::<f64>() {
            Ok(offset) if offset.is_finite() => {
                self.restore = Some(ScrollRestore {
                    file: file.to_string(),
                    offset,
                    frames_left: frames.max(1),
                });
                true
            }
            _ => {
                log::debug!("dropping unreadable scroll offset {:?}", raw);
                if let Err(err) = self.session.remove(&key) {
                    log::debug!("could not clear scroll offset: {}", err);
                }
                false
            }
        }
    }

    /// Drops a pending restore without touching the stored offset.
    pub fn clear_restore(&mut self) {
        self.restore = None;
    }

    pub fn restore_pending(&self) -> bool {
        self.restore.is_some()
    }

    /// Counts down one animation frame. When the countdown ends the session
    /// key is deleted and the offset to scroll to is returned.
    pub fn advance_restore(&mut self) -> Option<f64> {
        let restore = self.restore.as_mut()?;
        restore.frames_left = restore.frames_left.saturating_sub(1);
        if restore.frames_left > 0 {
            return None;
        }
        let restore = self.restore.take()?;
        if let Err(err) = self.session.remove(&scroll_key(&restore.file)) {
            log::debug!("could not clear scroll offset: {}", err);
        }
        Some(restore.offset)
    }
}
