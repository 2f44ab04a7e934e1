use lectern::{
    chapters::ChapterStore,
    cli::{Cli, Command},
    config::Config,
    headless::{HeadlessPage, HeadlessTooltips},
    host::Page,
    http::SiteClient,
    logging::{self, LogLevel},
    navigation::NavigationController,
    reader::{Host, Reader},
    render::{MarkdownRenderer, html_to_plain_text},
    script::{ScriptRunner, parse_script},
    settings::Settings,
    site::Site,
    storage::{MemoryStore, SqliteStore},
};

use clap::Parser;
use eyre::{Result, bail, eyre};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(LogLevel::from_flags(cli.verbose, cli.debug));

    let config = match &cli.config {
        Some(path) => Config::load_from(path.clone())?,
        None => match Config::new() {
            Ok(config) => config,
            Err(err) => {
                log::warn!("could not load configuration: {}", err);
                log::warn!("starting with default settings");
                Config::with_settings(Settings::default(), PathBuf::from("configuration.json"))
            }
        },
    };

    let site = Site::parse(&cli.site)?;
    let state_path = cli
        .state
        .clone()
        .unwrap_or_else(|| config.data_dir().join("states.db"));
    let session = MemoryStore::new();
    let env = Env {
        settings: config.settings.clone(),
        site,
        state_path,
        session,
    };

    match cli.command {
        Command::Chapters => list_chapters(&env),
        Command::Read { chapter, width } => read_chapter(&env, chapter.as_deref(), width),
        Command::Glossary { chapter } => list_glossary(&env, chapter.as_deref()),
        Command::Script { path } => run_script(&env, &path),
    }
}

struct Env {
    settings: Settings,
    site: Site,
    state_path: PathBuf,
    session: MemoryStore,
}

impl Env {
    fn reader(&self, page: HeadlessPage) -> Result<Reader> {
        let client = SiteClient::new(REQUEST_TIMEOUT)?;
        let host = Host {
            page: Box::new(page),
            fetcher: Box::new(client.clone()),
            renderer: Some(Box::new(MarkdownRenderer)),
            tooltips: Some(Box::new(HeadlessTooltips::default())),
            probe: Box::new(client.clone()),
            loader: Box::new(client),
            durable: Box::new(SqliteStore::open(&self.state_path)?),
            session: Box::new(self.session.clone()),
        };
        Ok(Reader::new(self.settings.clone(), self.site.clone(), host))
    }

    /// Starts a reader and moves it to `chapter` when one is named.
    fn open(&self, chapter: Option<&str>) -> Result<(HeadlessPage, Reader)> {
        let page = HeadlessPage::new();
        let mut reader = self.reader(page.clone())?;
        reader.start();
        if reader.store().is_empty() {
            if let Some(status) = page.state().status.clone() {
                bail!(status);
            }
        }
        if let Some(file) = chapter {
            let index = reader
                .store()
                .position_of(file)
                .ok_or_else(|| eyre!("no chapter named {:?} in the manifest", file))?;
            if !reader.store().is_eligible(index) {
                bail!("chapter {:?} is not available yet", file);
            }
            reader.on_chapter_selected(index);
        }
        page.pump(&mut reader);

        if let Some(status) = page.state().status.clone() {
            bail!(status);
        }
        Ok((page, reader))
    }
}

fn list_chapters(env: &Env) -> Result<()> {
    let client = SiteClient::new(REQUEST_TIMEOUT)?;
    let store = ChapterStore::load(&client, &env.site.manifest_url(&env.settings)?)?;
    let navigation = NavigationController::new(
        Box::new(SqliteStore::open(&env.state_path)?),
        Box::new(env.session.clone()),
    );
    let current = navigation
        .remembered_file()
        .and_then(|file| store.position_of(&file));

    for entry in store.list_entries(current) {
        let marker = if entry.current { "*" } else { " " };
        let pending = if entry.enabled { "" } else { " (coming soon)" };
        println!("{}{:>3}. {}{}", marker, entry.index + 1, entry.title, pending);
    }
    Ok(())
}

fn read_chapter(env: &Env, chapter: Option<&str>, width: usize) -> Result<()> {
    let (page, _reader) = env.open(chapter)?;
    let state = page.state();
    println!("{}", state.title);
    println!();
    print!("{}", html_to_plain_text(&state.content, width)?);
    Ok(())
}

fn list_glossary(env: &Env, chapter: Option<&str>) -> Result<()> {
    let (_page, mut reader) = env.open(chapter)?;
    let file = reader.current_chapter().map(|c| c.file.clone());
    let terms = reader.terms().to_vec();
    if terms.is_empty() {
        println!("No glossary terms in this chapter.");
    }

    for term in &terms {
        println!("[{}] {}: {}", term.id, term.text, term.tooltip);
        if let Some(image) = &term.image {
            match reader.images_mut().resolve(image, file.as_deref()) {
                Some(url) => println!("      image {}", url),
                None => println!("      image {} unresolved", image),
            }
        }
    }

    for src in reader.figures() {
        println!("figure {}", src);
    }
    Ok(())
}

fn run_script(env: &Env, path: &Path) -> Result<()> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        text
    } else {
        std::fs::read_to_string(path)
            .map_err(|err| eyre!("could not read {}: {}", path.display(), err))?
    };
    let events = parse_script(&text)?;

    let mut runner = ScriptRunner::start(|page| env.reader(page))?;
    for line in runner.run(&events)? {
        println!("{line}");
    }

    let page = runner.page();
    println!(
        "-- at {}ms: chapter {}, scroll {}, top nav {}",
        page.now().as_millis(),
        runner
            .reader()
            .current_chapter()
            .map(|c| c.file.as_str())
            .unwrap_or("none"),
        page.scroll_y(),
        if page.state().top_nav_visible {
            "visible"
        } else {
            "hidden"
        }
    );
    Ok(())
}
