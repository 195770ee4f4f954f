use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: download, extract, recognize, write captions
    Run {
        /// Project name used for every output file
        #[arg(short, long)]
        project: Option<String>,

        /// Video source URL (m3u8 playlist or page URL)
        #[arg(short, long)]
        url: Option<String>,

        /// Output directory for all artifacts
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Whisper model (tiny, base, small, medium, large, large-v2, large-v3)
        #[arg(short, long)]
        model: Option<String>,

        /// Disable progress bars
        #[arg(long)]
        no_progress: bool,
    },

    /// Write a configuration file with default settings
    Init {
        /// Where to write the configuration
        #[arg(short, long, default_value = "subpipe.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Translate an existing SRT file into other languages
    Translate {
        /// Input SRT file
        #[arg(short, long)]
        input: PathBuf,

        /// Language of the input captions
        #[arg(short, long, default_value = "en")]
        from: String,

        /// Target languages (comma-separated)
        #[arg(short, long)]
        to: String,

        /// Output directory (defaults to the input file's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

/// Split a comma-separated language list, dropping blanks.
pub fn parse_language_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_overrides() {
        let args = Args::try_parse_from([
            "subpipe", "-v", "run", "--project", "lecture", "--url", "https://e.x/a.m3u8", "--model", "small",
        ])
        .unwrap();

        assert!(args.verbose);
        match args.command {
            Commands::Run { project, url, model, no_progress, .. } => {
                assert_eq!(project.as_deref(), Some("lecture"));
                assert_eq!(url.as_deref(), Some("https://e.x/a.m3u8"));
                assert_eq!(model.as_deref(), Some("small"));
                assert!(!no_progress);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_parse_language_list() {
        assert_eq!(parse_language_list("ru, FR,,de "), vec!["ru", "fr", "de"]);
        assert!(parse_language_list(" , ").is_empty());
    }
}
