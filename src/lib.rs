pub mod chapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod glossary;
pub mod headless;
pub mod host;
pub mod http;
pub mod images;
pub mod logging;
pub mod models;
pub mod navigation;
pub mod reader;
pub mod render;
pub mod script;
pub mod settings;
pub mod site;
pub mod storage;
pub mod tooltip;
pub mod viewer;
pub mod visibility;
