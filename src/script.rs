//! Scripted sessions: a small line-based language describing what a visitor
//! does on the page, replayed against a headless reader.
//!
//! ```text
//! # comments and blank lines are ignored
//! scroll 480
//! wait 1200
//! next
//! competing on
//! tooltip 0
//! reload
//! ```

use crate::headless::HeadlessPage;
use crate::host::Page;
use crate::models::Control;
use crate::reader::Reader;
use eyre::{Result, bail, eyre};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptEvent {
    Scroll(f64),
    Resize,
    Wait(Duration),
    Next,
    Prev,
    Goto(usize),
    Open(String),
    Competing(bool),
    Tab { visible: bool },
    Tooltip(usize),
    TooltipImage(usize),
    Image { src: String, alt: String },
    ViewerClick,
    ViewerBackdrop,
    PointerDown(f64, f64),
    PointerMove(f64, f64),
    PointerUp,
    Key(String),
    Reload,
}

pub fn parse_script(text: &str) -> Result<Vec<ScriptEvent>> {
    let mut events = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event = parse_line(line).map_err(|err| eyre!("line {}: {}", number + 1, err))?;
        events.push(event);
    }
    Ok(events)
}

fn parse_line(line: &str) -> Result<ScriptEvent> {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    let event = match (command, args.as_slice()) {
        ("scroll", [y]) => ScriptEvent::Scroll(number(y)?),
        ("resize", []) => ScriptEvent::Resize,
        ("wait", [ms]) => ScriptEvent::Wait(Duration::from_millis(
            ms.parse().map_err(|_| eyre!("invalid duration {:?}", ms))?,
        )),
        ("next", []) => ScriptEvent::Next,
        ("prev", []) => ScriptEvent::Prev,
        ("goto", [index]) => ScriptEvent::Goto(position(index)?),
        ("open", [file]) => ScriptEvent::Open(file.to_string()),
        ("competing", [state]) => ScriptEvent::Competing(switch(state, "on", "off")?),
        ("tab", [state]) => ScriptEvent::Tab {
            visible: switch(state, "visible", "hidden")?,
        },
        ("tooltip", [index]) => ScriptEvent::Tooltip(position(index)?),
        ("tooltip-image", [index]) => ScriptEvent::TooltipImage(position(index)?),
        ("image", [src, alt @ ..]) => ScriptEvent::Image {
            src: src.to_string(),
            alt: alt.join(" "),
        },
        ("viewer", ["click"]) => ScriptEvent::ViewerClick,
        ("viewer", ["backdrop"]) => ScriptEvent::ViewerBackdrop,
        ("viewer", ["down", x, y]) => ScriptEvent::PointerDown(number(x)?, number(y)?),
        ("viewer", ["move", x, y]) => ScriptEvent::PointerMove(number(x)?, number(y)?),
        ("viewer", ["up"]) => ScriptEvent::PointerUp,
        ("key", [name]) => ScriptEvent::Key(name.to_string()),
        ("reload", []) => ScriptEvent::Reload,
        _ => bail!("unrecognised command {:?}", line),
    };
    Ok(event)
}

fn number(word: &str) -> Result<f64> {
    word.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| eyre!("invalid number {:?}", word))
}

fn position(word: &str) -> Result<usize> {
    word.parse().map_err(|_| eyre!("invalid index {:?}", word))
}

fn switch(word: &str, on: &str, off: &str) -> Result<bool> {
    match word {
        w if w == on => Ok(true),
        w if w == off => Ok(false),
        other => bail!("expected {} or {}, got {:?}", on, off, other),
    }
}

/// Replays events against a reader built by `build`. A `reload` unloads the
/// current reader and builds a fresh one on a fresh page, so whatever `build`
/// shares between readers plays the role of session storage.
pub struct ScriptRunner<F> {
    build: F,
    page: HeadlessPage,
    reader: Reader,
}

impl<F> ScriptRunner<F>
where
    F: FnMut(HeadlessPage) -> Result<Reader>,
{
    pub fn start(mut build: F) -> Result<Self> {
        let page = HeadlessPage::new();
        let mut reader = build(page.clone())?;
        reader.start();
        page.pump(&mut reader);
        Ok(Self {
            build,
            page,
            reader,
        })
    }

    pub fn page(&self) -> &HeadlessPage {
        &self.page
    }

    pub fn reader(&self) -> &Reader {
        &self.reader
    }

    /// Runs every event and returns the transcript, startup included.
    pub fn run(&mut self, events: &[ScriptEvent]) -> Result<Vec<String>> {
        let mut transcript = self.page.take_events();
        for event in events {
            transcript.push(format!("> {}", describe(event)));
            transcript.extend(self.apply(event)?);
        }
        Ok(transcript)
    }

    pub fn apply(&mut self, event: &ScriptEvent) -> Result<Vec<String>> {
        let mut notes = Vec::new();
        match event {
            ScriptEvent::Scroll(y) => {
                self.page.user_scroll(*y);
                self.reader.on_scroll();
            }
            ScriptEvent::Resize => self.reader.on_resize(),
            ScriptEvent::Wait(by) => self.page.run_for(&mut self.reader, *by),
            ScriptEvent::Next => self.reader.on_control_activated(Control::Next),
            ScriptEvent::Prev => self.reader.on_control_activated(Control::Prev),
            ScriptEvent::Goto(index) => self.reader.on_chapter_selected(*index),
            ScriptEvent::Open(file) => match self.reader.store().position_of(file) {
                Some(index) => self.reader.on_chapter_selected(index),
                None => notes.push(format!("no chapter named {file}")),
            },
            ScriptEvent::Competing(visible) => {
                self.page.set_competing_visible(*visible);
                self.reader.on_competing_control_changed(*visible);
            }
            ScriptEvent::Tab { visible } => self.reader.on_visibility_change(*visible),
            ScriptEvent::Tooltip(index) => match self.reader.on_tooltip_show(*index) {
                Some(content) => {
                    let image = content
                        .image
                        .map(|image| format!(" [image {} \"{}\"]", image.url, image.alt))
                        .unwrap_or_default();
                    notes.push(format!("tooltip \"{}\"{}", content.text, image));
                }
                None => notes.push(format!("no tooltip for term {index}")),
            },
            ScriptEvent::TooltipImage(index) => self.reader.on_tooltip_image_click(*index),
            ScriptEvent::Image { src, alt } => self.reader.on_content_image_click(src, alt),
            ScriptEvent::ViewerClick => self.reader.on_viewer_click(),
            ScriptEvent::ViewerBackdrop => self.reader.on_viewer_backdrop_click(),
            ScriptEvent::PointerDown(x, y) => self.reader.on_viewer_pointer_down(*x, *y),
            ScriptEvent::PointerMove(x, y) => self.reader.on_viewer_pointer_move(*x, *y),
            ScriptEvent::PointerUp => self.reader.on_viewer_pointer_up(),
            ScriptEvent::Key(name) => {
                if !self.reader.on_key(name) {
                    notes.push(format!("key {name} ignored"));
                }
            }
            ScriptEvent::Reload => self.reload()?,
        }
        self.page.pump(&mut self.reader);

        let mut lines = self.page.take_events();
        lines.extend(notes);
        Ok(lines)
    }

    fn reload(&mut self) -> Result<()> {
        self.reader.on_before_unload();
        let page = HeadlessPage::new();
        page.advance(self.page.now());
        let mut reader = (self.build)(page.clone())?;
        reader.start();
        self.page = page;
        self.reader = reader;
        Ok(())
    }
}

fn describe(event: &ScriptEvent) -> String {
    match event {
        ScriptEvent::Scroll(y) => format!("scroll {y}"),
        ScriptEvent::Resize => "resize".to_string(),
        ScriptEvent::Wait(by) => format!("wait {}", by.as_millis()),
        ScriptEvent::Next => "next".to_string(),
        ScriptEvent::Prev => "prev".to_string(),
        ScriptEvent::Goto(index) => format!("goto {index}"),
        ScriptEvent::Open(file) => format!("open {file}"),
        ScriptEvent::Competing(visible) => {
            format!("competing {}", if *visible { "on" } else { "off" })
        }
        ScriptEvent::Tab { visible } => {
            format!("tab {}", if *visible { "visible" } else { "hidden" })
        }
        ScriptEvent::Tooltip(index) => format!("tooltip {index}"),
        ScriptEvent::TooltipImage(index) => format!("tooltip-image {index}"),
        ScriptEvent::Image { src, .. } => format!("image {src}"),
        ScriptEvent::ViewerClick => "viewer click".to_string(),
        ScriptEvent::ViewerBackdrop => "viewer backdrop".to_string(),
        ScriptEvent::PointerDown(x, y) => format!("viewer down {x} {y}"),
        ScriptEvent::PointerMove(x, y) => format!("viewer move {x} {y}"),
        ScriptEvent::PointerUp => "viewer up".to_string(),
        ScriptEvent::Key(name) => format!("key {name}"),
        ScriptEvent::Reload => "reload".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let script = "\
# open the second chapter and look around
goto 1

scroll 480.5
wait 1200
competing on
tab visible
image figures/map.png A harbour map
viewer down 10 20
key Escape
reload
";
        let events = parse_script(script).unwrap();
        assert_eq!(
            events,
            vec![
                ScriptEvent::Goto(1),
                ScriptEvent::Scroll(480.5),
                ScriptEvent::Wait(Duration::from_millis(1200)),
                ScriptEvent::Competing(true),
                ScriptEvent::Tab { visible: true },
                ScriptEvent::Image {
                    src: "figures/map.png".to_string(),
                    alt: "A harbour map".to_string(),
                },
                ScriptEvent::PointerDown(10.0, 20.0),
                ScriptEvent::Key("Escape".to_string()),
                ScriptEvent::Reload,
            ]
        );
    }

    #[test]
    fn test_parse_errors_name_the_line() {
        let err = parse_script("next\nscroll far\n").unwrap_err();
        assert!(err.to_string().starts_with("line 2:"), "{err}");

        let err = parse_script("competing maybe").unwrap_err();
        assert!(err.to_string().contains("expected on or off"), "{err}");

        assert!(parse_script("dance").is_err());
        assert!(parse_script("next now").is_err());
        assert!(parse_script("scroll NaN").is_err());
    }

    #[test]
    fn test_describe_matches_syntax() {
        let script = "scroll 12\nviewer move 3 4\ntab hidden\ncompeting off\n";
        let described: Vec<String> = parse_script(script)
            .unwrap()
            .iter()
            .map(describe)
            .collect();
        assert_eq!(
            described,
            vec!["scroll 12", "viewer move 3 4", "tab hidden", "competing off"]
        );
    }
}
