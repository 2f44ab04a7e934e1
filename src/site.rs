use crate::settings::Settings;
use eyre::{Result, eyre};
use reqwest::Url;
use std::path::Path;

/// Where the reading page lives. All manifest, chapter and image URLs are
/// derived from the page URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    page_url: Url,
}

impl Site {
    pub fn new(page_url: Url) -> Self {
        Self { page_url }
    }

    /// Accepts an `http(s)://` or `file://` URL, or a local path.
    pub fn parse(location: &str) -> Result<Self> {
        if location.starts_with("http://")
            || location.starts_with("https://")
            || location.starts_with("file://")
        {
            let mut url = Url::parse(location)?;
            if !url.path().ends_with('/') && !last_segment_has_extension(&url) {
                let path = format!("{}/", url.path());
                url.set_path(&path);
            }
            return Ok(Self::new(url));
        }

        let path = std::fs::canonicalize(Path::new(location))
            .map_err(|err| eyre!("cannot open site {}: {}", location, err))?;
        let converted = if path.is_dir() {
            Url::from_directory_path(&path)
        } else {
            Url::from_file_path(&path)
        };
        let url = converted.map_err(|_| eyre!("cannot turn {} into a URL", path.display()))?;
        Ok(Self::new(url))
    }

    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    pub fn page_dir(&self) -> Result<Url> {
        Ok(self.page_url.join("./")?)
    }

    pub fn root(&self) -> Result<Url> {
        Ok(self.page_url.join("/")?)
    }

    pub fn manifest_url(&self, settings: &Settings) -> Result<Url> {
        Ok(self.page_dir()?.join(&settings.manifest_path)?)
    }

    pub fn chapters_dir(&self, settings: &Settings) -> Result<Url> {
        let dir = settings.chapters_dir.trim_end_matches('/');
        Ok(self.page_dir()?.join(&format!("{dir}/"))?)
    }

    pub fn chapter_url(&self, settings: &Settings, file: &str) -> Result<Url> {
        Ok(self.chapters_dir(settings)?.join(file)?)
    }
}

fn last_segment_has_extension(url: &Url) -> bool {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .is_some_and(|segment| segment.contains('.'))
}
