use crate::error::LoadError;
use crate::host::Fetcher;
use crate::models::{Chapter, ChapterListEntry};
use reqwest::Url;
use std::collections::HashSet;

/// The ordered chapter list for one session.
///
/// Chapters that are not `done` keep their slot so indices and file names
/// stay stable as more chapters are published; every scan just skips them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterStore {
    chapters: Vec<Chapter>,
}

impl ChapterStore {
    pub fn new(chapters: Vec<Chapter>) -> Self {
        Self { chapters }
    }

    pub fn parse(json: &str) -> Result<Self, LoadError> {
        let chapters: Vec<Chapter> = serde_json::from_str(json)?;
        let mut seen = HashSet::new();
        for chapter in &chapters {
            if !seen.insert(chapter.file.as_str()) {
                return Err(LoadError::DuplicateChapter(chapter.file.clone()));
            }
        }
        Ok(Self { chapters })
    }

    pub fn load(fetcher: &dyn Fetcher, manifest_url: &Url) -> Result<Self, LoadError> {
        let body = fetcher.fetch_text(manifest_url)?;
        let store = Self::parse(&body)?;
        log::debug!("manifest {} lists {} chapters", manifest_url, store.len());
        Ok(store)
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn get(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn is_eligible(&self, index: usize) -> bool {
        self.chapters.get(index).is_some_and(|c| c.done)
    }

    pub fn find_first_eligible(&self) -> Option<usize> {
        self.chapters.iter().position(|c| c.done)
    }

    pub fn find_prev_eligible(&self, from: usize) -> Option<usize> {
        let end = from.min(self.chapters.len());
        (0..end).rev().find(|&i| self.chapters[i].done)
    }

    pub fn find_next_eligible(&self, from: usize) -> Option<usize> {
        (from.saturating_add(1)..self.chapters.len()).find(|&i| self.chapters[i].done)
    }

    pub fn position_of(&self, file: &str) -> Option<usize> {
        self.chapters.iter().position(|c| c.file == file)
    }

    pub fn list_entries(&self, current: Option<usize>) -> Vec<ChapterListEntry> {
        self.chapters
            .iter()
            .enumerate()
            .map(|(index, chapter)| ChapterListEntry {
                index,
                title: chapter.title.clone(),
                enabled: chapter.done,
                current: current == Some(index),
            })
            .collect()
    }
}
