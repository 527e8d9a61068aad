use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, builder::TypedValueParser};
use clap_complete::Shell;

use sitesearch::search::Facet;

#[derive(Debug, Parser)]
#[command(
    name = "sitesearch",
    about = "Build and query full-text search indexes for documentation sites"
)]
pub struct Cli {
    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the search index for a published site
    Build(BuildArgs),
    /// Query a published search index
    Search(SearchArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Build --

#[derive(Debug, Parser)]
pub struct BuildArgs {
    /// Root of the published site (`<component>/<version>/<page>.html`)
    pub site_dir: PathBuf,

    /// JSON build configuration; unknown keys are rejected
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory the index asset is written to (defaults to SITE_DIR)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Language to index, by code (can be repeated)
    #[arg(short, long = "language", value_name = "CODE")]
    pub languages: Vec<String>,

    /// Only index the latest version of each component
    #[arg(long)]
    pub latest_only: bool,

    /// Path prefixed to every page URL
    #[arg(long, value_name = "PATH")]
    pub site_root: Option<String>,
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    /// Path to a published search-index.json
    #[arg(short, long)]
    pub index: PathBuf,

    /// Only keep hits whose page field equals a value (`field:value`)
    #[arg(short, long, value_name = "FIELD:VALUE")]
    pub facet: Option<Facet>,

    /// Characters shown on each side of the first match, overriding the
    /// length the index was built with
    #[arg(
        short = 'n',
        long,
        value_parser = clap::value_parser!(u64).range(1..).map(|n| n as usize)
    )]
    pub snippet_length: Option<usize>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "sitesearch",
            &mut std::io::stdout(),
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parse_search_defaults() {
        let cli = Cli::parse_from([
            "sitesearch",
            "search",
            "install",
            "--index",
            "site/search-index.json",
        ]);
        match cli.command {
            Command::Search(args) => {
                assert_eq!(args.query, "install");
                assert!(args.snippet_length.is_none());
                assert!(args.facet.is_none());
                assert!(!args.json);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn parse_build_with_repeated_languages() {
        let cli = Cli::parse_from([
            "sitesearch",
            "-v",
            "build",
            "public",
            "-l",
            "en",
            "--language",
            "de",
            "--latest-only",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Build(args) => {
                assert_eq!(args.site_dir, PathBuf::from("public"));
                assert_eq!(args.languages, vec!["en", "de"]);
                assert!(args.latest_only);
                assert!(args.output.is_none());
            }
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn facet_is_parsed_by_clap() {
        let cli = Cli::parse_from([
            "sitesearch",
            "search",
            "x",
            "-i",
            "idx.json",
            "--facet",
            "component:guide",
        ]);
        let Command::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.facet.unwrap().value, "guide");

        assert!(
            Cli::try_parse_from([
                "sitesearch",
                "search",
                "x",
                "-i",
                "idx.json",
                "--facet",
                "nonsense",
            ])
            .is_err()
        );
    }

    #[test]
    fn snippet_length_overrides_must_be_positive() {
        let cli = Cli::parse_from([
            "sitesearch", "search", "x", "-i", "idx.json", "-n", "12",
        ]);
        let Command::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.snippet_length, Some(12));

        assert!(
            Cli::try_parse_from([
                "sitesearch", "search", "x", "-i", "idx.json", "-n", "0",
            ])
            .is_err()
        );
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
