//! Network access for `http(s)://` sites through reqwest, and for `file://`
//! sites straight from disk.

use crate::error::LoadError;
use crate::host::{Fetcher, ImageLoader, ImageProbe, PreloadHandle, ProbeOutcome};
use eyre::Result;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SiteClient {
    client: Client,
}

impl SiteClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lectern/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    fn get_fresh(&self, url: &Url) -> reqwest::blocking::RequestBuilder {
        self.client
            .get(url.clone())
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
    }
}

impl Fetcher for SiteClient {
    fn fetch_text(&self, url: &Url) -> std::result::Result<String, LoadError> {
        let fetch_error = |reason: String| LoadError::Fetch {
            url: url.to_string(),
            reason,
        };

        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| fetch_error("not a local path".to_string()))?;
                std::fs::read_to_string(&path).map_err(|err| fetch_error(err.to_string()))
            }
            "http" | "https" => {
                let response = self
                    .get_fresh(url)
                    .send()
                    .map_err(|err| fetch_error(err.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(LoadError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
                response.text().map_err(|err| fetch_error(err.to_string()))
            }
            other => Err(fetch_error(format!("unsupported scheme {other}"))),
        }
    }
}

impl ImageProbe for SiteClient {
    fn probe(&self, url: &Url, timeout: Duration) -> ProbeOutcome {
        match url.scheme() {
            "file" => match url.to_file_path() {
                Ok(path) if path.is_file() => ProbeOutcome::Loaded,
                _ => ProbeOutcome::Failed,
            },
            "http" | "https" => {
                // The request runs on its own thread so the wait below is the
                // only thing that decides the outcome; a late answer lands in
                // a dropped channel.
                let (tx, rx) = mpsc::channel();
                // The request may outlive the wait; its own bound only caps
                // how long the helper thread lingers.
                let request = self.client.get(url.clone()).timeout(timeout * 2);
                thread::spawn(move || {
                    let outcome = match request.send() {
                        Ok(response) if response.status().is_success() => {
                            if is_image_response(&response) {
                                ProbeOutcome::Loaded
                            } else {
                                ProbeOutcome::Failed
                            }
                        }
                        _ => ProbeOutcome::Failed,
                    };
                    let _ = tx.send(outcome);
                });
                match rx.recv_timeout(timeout) {
                    Ok(outcome) => outcome,
                    Err(mpsc::RecvTimeoutError::Timeout) => ProbeOutcome::TimedOut,
                    Err(mpsc::RecvTimeoutError::Disconnected) => ProbeOutcome::Failed,
                }
            }
            _ => ProbeOutcome::Failed,
        }
    }
}

impl ImageLoader for SiteClient {
    fn preload(&self, url: &Url) -> PreloadHandle {
        let handle = PreloadHandle::new();
        let done = handle.clone();
        let client = self.client.clone();
        let url = url.clone();
        thread::spawn(move || {
            let loaded = match url.scheme() {
                "file" => url
                    .to_file_path()
                    .ok()
                    .and_then(|path| std::fs::read(path).ok())
                    .is_some(),
                "http" | "https" => client
                    .get(url.clone())
                    .send()
                    .and_then(|response| response.error_for_status())
                    .and_then(|response| response.bytes())
                    .is_ok(),
                _ => false,
            };
            if !loaded {
                log::debug!("preload of {} failed", url);
            }
            done.complete(loaded);
        });
        handle
    }
}

fn is_image_response(response: &reqwest::blocking::Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_none_or(|value| value.starts_with("image/"))
}
