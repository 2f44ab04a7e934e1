//! Glossary image resolution.
//!
//! Glossary images are written relative to whatever directory the author
//! happened to think of: the page, the chapter file, or the site root. A raw
//! reference is therefore joined against several bases and each candidate is
//! probed in order until one loads. Results, including "nothing loaded", are
//! memoized per raw reference for the lifetime of the resolver.

use crate::host::{ImageLoader, ImageProbe, PreloadHandle};
use crate::models::GlossaryTerm;
use reqwest::Url;
use std::collections::HashMap;
use std::time::Duration;

pub struct ImageResolver {
    page_url: Url,
    chapters_dir: Url,
    timeout: Duration,
    probe: Box<dyn ImageProbe>,
    loader: Box<dyn ImageLoader>,
    resolved: HashMap<String, Option<Url>>,
    preloads: HashMap<Url, PreloadHandle>,
}

impl ImageResolver {
    pub fn new(
        page_url: Url,
        chapters_dir: Url,
        timeout: Duration,
        probe: Box<dyn ImageProbe>,
        loader: Box<dyn ImageLoader>,
    ) -> Self {
        Self {
            page_url,
            chapters_dir,
            timeout,
            probe,
            loader,
            resolved: HashMap::new(),
            preloads: HashMap::new(),
        }
    }

    /// Ordered, de-duplicated absolute candidates for `raw`.
    pub fn candidates(&self, raw: &str, chapter: Option<&str>) -> Vec<Url> {
        let raw = raw.trim();
        let mut candidates = Vec::new();

        if is_direct_reference(raw) {
            if let Ok(url) = self.page_url.join(raw) {
                push_unique(&mut candidates, url);
            }
        }

        for base in self.bases(chapter) {
            if let Ok(url) = base.join(raw) {
                push_unique(&mut candidates, url);
            }
        }

        candidates
    }

    fn bases(&self, chapter: Option<&str>) -> Vec<Url> {
        let mut bases = vec![self.page_url.clone()];
        if let Ok(dir) = self.page_url.join("./") {
            bases.push(dir);
        }
        if let Some(file) = chapter {
            if let Ok(document) = self.chapters_dir.join(file) {
                // One level above the directory holding the chapter: joining
                // `raw` against the document already covers its own directory.
                if let Ok(parent) = document.join("../") {
                    bases.push(document);
                    bases.push(parent);
                } else {
                    bases.push(document);
                }
            }
        }
        // The root of a local site would be the filesystem root.
        if self.page_url.scheme() != "file" {
            if let Ok(root) = self.page_url.join("/") {
                bases.push(root);
            }
        }
        bases
    }

    /// Resolves `raw` to a URL that loads as an image, probing at most once
    /// per raw reference.
    pub fn resolve(&mut self, raw: &str, chapter: Option<&str>) -> Option<Url> {
        if raw.trim().is_empty() {
            return None;
        }
        if let Some(cached) = self.resolved.get(raw) {
            return cached.clone();
        }

        let resolved = self.candidates(raw, chapter).into_iter().find(|candidate| {
            let outcome = self.probe.probe(candidate, self.timeout);
            log::debug!("probe {} -> {:?}", candidate, outcome);
            outcome.is_loaded()
        });

        match &resolved {
            Some(url) => log::debug!("image {} resolved to {}", raw, url),
            None => log::info!("no candidate for image {} could be loaded", raw),
        }

        // A racing resolution of the same key would overwrite with an
        // equivalent result; probes only read.
        self.resolved.insert(raw.to_string(), resolved.clone());
        resolved
    }

    /// `None` when `raw` was never probed, `Some(None)` when it was probed and
    /// nothing loaded.
    pub fn cached(&self, raw: &str) -> Option<Option<&Url>> {
        self.resolved.get(raw).map(Option::as_ref)
    }

    pub fn preload_handle(&self, url: &Url) -> Option<&PreloadHandle> {
        self.preloads.get(url)
    }

    pub fn ensure_preloaded(&mut self, url: &Url) -> PreloadHandle {
        if let Some(handle) = self.preloads.get(url) {
            return handle.clone();
        }
        let handle = self.loader.preload(url);
        self.preloads.insert(url.clone(), handle.clone());
        handle
    }

    /// Resolves and starts fetching every glossary image in freshly rendered
    /// content. Returns how many images resolved.
    pub fn preload_terms(&mut self, terms: &[GlossaryTerm], chapter: Option<&str>) -> usize {
        let mut resolved = 0;
        for term in terms {
            let Some(raw) = term.image.as_deref() else {
                continue;
            };
            if let Some(url) = self.resolve(raw, chapter) {
                self.ensure_preloaded(&url);
                resolved += 1;
            }
        }
        resolved
    }

    /// Re-issues preloads whose handle is missing or unfinished. Hosts call
    /// this when a hidden tab becomes visible again, since decoded images may
    /// have been dropped meanwhile.
    pub fn refresh_preloads(&mut self) -> usize {
        let stale: Vec<Url> = self
            .resolved
            .values()
            .flatten()
            .filter(|url| {
                self.preloads
                    .get(*url)
                    .is_none_or(|handle| !handle.is_complete())
            })
            .cloned()
            .collect();

        for url in &stale {
            log::debug!("re-issuing preload for {}", url);
            let handle = self.loader.preload(url);
            self.preloads.insert(url.clone(), handle);
        }
        stale.len()
    }

    /// Drops a preload handle, as a browser may when reclaiming memory.
    pub fn forget_preload(&mut self, url: &Url) {
        self.preloads.remove(url);
    }
}

fn is_direct_reference(raw: &str) -> bool {
    raw.starts_with('/') || Url::parse(raw).is_ok()
}

fn push_unique(candidates: &mut Vec<Url>, url: Url) {
    if !candidates.contains(&url) {
        candidates.push(url);
    }
}
