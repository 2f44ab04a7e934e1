use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "lectern",
    version,
    about = "Reads a chapter-based site from the terminal and replays reader sessions.",
    long_about = None
)]
pub struct Cli {
    /// Use a specific configuration file
    #[clap(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Use a specific reading-state database
    #[clap(short = 's', long, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Enable debug output
    #[clap(long)]
    pub debug: bool,

    /// Site URL or local directory holding the reading page
    #[clap(name = "SITE")]
    pub site: String,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the chapters in the manifest
    Chapters,

    /// Print a chapter as plain text (defaults to where you left off)
    Read {
        /// Chapter file name from the manifest
        #[clap(long, value_name = "FILE")]
        chapter: Option<String>,

        /// Wrap width for the text
        #[clap(short, long, default_value_t = 80)]
        width: usize,
    },

    /// List the glossary terms of a chapter with their resolved images
    Glossary {
        #[clap(long, value_name = "FILE")]
        chapter: Option<String>,
    },

    /// Replay a session script against a headless page ("-" reads stdin)
    Script {
        #[clap(value_name = "FILE")]
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read() {
        let cli = Cli::parse_from(["lectern", "-vv", "./site", "read", "--chapter", "02.md"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.site, "./site");
        match cli.command {
            Command::Read { chapter, width } => {
                assert_eq!(chapter.as_deref(), Some("02.md"));
                assert_eq!(width, 80);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["lectern", "./site"]).is_err());
    }
}
