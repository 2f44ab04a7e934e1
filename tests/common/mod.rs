#![allow(dead_code)]

use lectern::error::LoadError;
use lectern::headless::{HeadlessPage, HeadlessTooltips};
use lectern::host::{Fetcher, ImageLoader, ImageProbe, PreloadHandle, ProbeOutcome};
use lectern::reader::{Host, Reader};
use lectern::render::MarkdownRenderer;
use lectern::settings::Settings;
use lectern::site::Site;
use lectern::storage::MemoryStore;
use reqwest::Url;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

pub const PAGE: &str = "https://example.org/book/";

pub const MANIFEST: &str = r#"[
    {"file": "01.md", "title": "Harbour", "done": true},
    {"file": "02.md", "title": "Storm", "done": false},
    {"file": "03.md", "title": "Landfall", "done": true}
]"#;

pub const HARBOUR: &str = "# Harbour\n\nThe <span data-tooltip=\"A small boat\" data-img=\"skiff.png\">skiff</span> left the <abbr data-tooltip=\"Harbour wall\">mole</abbr>.\n\n![Chart](chart.png)\n";

pub const LANDFALL: &str = "# Landfall\n\nSand at last.\n";

pub fn url(path: &str) -> String {
    format!("{PAGE}{path}")
}

pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// A fake site: documents by URL, which image URLs load, and a log of every
/// probe and preload.
#[derive(Clone, Default)]
pub struct Fixture {
    pub files: Rc<RefCell<HashMap<String, String>>>,
    pub images: Rc<RefCell<HashSet<String>>>,
    pub probes: Rc<RefCell<Vec<String>>>,
    pub preloads: Rc<RefCell<Vec<String>>>,
    pub durable: MemoryStore,
    pub session: MemoryStore,
}

impl Fixture {
    pub fn book() -> Self {
        let fixture = Self::default();
        fixture.put("chapters.json", MANIFEST);
        fixture.put("chapters/01.md", HARBOUR);
        fixture.put("chapters/03.md", LANDFALL);
        fixture
            .images
            .borrow_mut()
            .insert(url("chapters/skiff.png"));
        fixture
    }

    pub fn put(&self, path: &str, body: &str) {
        self.files.borrow_mut().insert(url(path), body.to_string());
    }

    pub fn delete(&self, path: &str) {
        self.files.borrow_mut().remove(&url(path));
    }

    pub fn host(&self, page: HeadlessPage) -> Host {
        Host {
            page: Box::new(page),
            fetcher: Box::new(FixtureFetcher(self.files.clone())),
            renderer: Some(Box::new(MarkdownRenderer)),
            tooltips: Some(Box::new(HeadlessTooltips::default())),
            probe: Box::new(FixtureProbe {
                images: self.images.clone(),
                probes: self.probes.clone(),
            }),
            loader: Box::new(FixtureLoader(self.preloads.clone())),
            durable: Box::new(self.durable.clone()),
            session: Box::new(self.session.clone()),
        }
    }

    pub fn reader_with(&self, host: Host) -> Reader {
        let site = Site::new(Url::parse(PAGE).unwrap());
        Reader::new(Settings::default(), site, host)
    }

    pub fn reader(&self, page: HeadlessPage) -> Reader {
        self.reader_with(self.host(page))
    }

    /// A started reader on a fresh page, with startup frames and timers run.
    pub fn start(&self) -> (HeadlessPage, Reader) {
        let page = HeadlessPage::new();
        let mut reader = self.reader(page.clone());
        reader.start();
        page.pump(&mut reader);
        (page, reader)
    }
}

pub struct FixtureFetcher(Rc<RefCell<HashMap<String, String>>>);

impl Fetcher for FixtureFetcher {
    fn fetch_text(&self, url: &Url) -> Result<String, LoadError> {
        self.0
            .borrow()
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| LoadError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

pub struct FixtureProbe {
    images: Rc<RefCell<HashSet<String>>>,
    probes: Rc<RefCell<Vec<String>>>,
}

impl ImageProbe for FixtureProbe {
    fn probe(&self, url: &Url, _timeout: Duration) -> ProbeOutcome {
        self.probes.borrow_mut().push(url.to_string());
        if self.images.borrow().contains(url.as_str()) {
            ProbeOutcome::Loaded
        } else {
            ProbeOutcome::Failed
        }
    }
}

/// Never completes its handles, like a tab that was backgrounded mid-fetch.
pub struct FixtureLoader(Rc<RefCell<Vec<String>>>);

impl ImageLoader for FixtureLoader {
    fn preload(&self, url: &Url) -> PreloadHandle {
        self.0.borrow_mut().push(url.to_string());
        PreloadHandle::new()
    }
}
