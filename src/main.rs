use clap::Parser;
use sitesearch::{
    BuildConfig,
    Result,
    SearchArtifact,
    SearchResponse,
    SearchSettings,
    SiteDirectory,
    artifact,
    ingestion,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{BuildArgs, Cli, Command, SearchArgs};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("SITESEARCH_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Build(args) => cmd_build(&args)?,
        Command::Search(args) => cmd_search(&args)?,
        Command::Completions(args) => args.generate(),
    }

    Ok(())
}

fn cmd_build(args: &BuildArgs) -> Result<()> {
    // Flags override the configuration file.
    let mut config = match &args.config {
        Some(path) => BuildConfig::load(path)?,
        None => BuildConfig::default(),
    };
    if !args.languages.is_empty() {
        config.languages = args.languages.clone();
    }
    if args.latest_only {
        config.index_latest_only = true;
    }
    if let Some(site_root) = &args.site_root {
        config.site_root_path = site_root.clone();
    }
    config.validate()?;

    let site = SiteDirectory::open(&args.site_dir)?;
    info!(root = %site.root().display(), pages = site.len(), "scanned site");

    let built = ingestion::generate_index(&site, &config)?;
    let output = args.output.as_deref().unwrap_or(&args.site_dir);
    match artifact::publish(built.as_ref(), output)? {
        Some(path) => println!("Wrote {}", path.display()),
        None => println!("No indexable pages found, nothing written."),
    }
    Ok(())
}

fn cmd_search(args: &SearchArgs) -> Result<()> {
    let loaded = SearchArtifact::load(&args.index)?;
    let settings = args.snippet_length.map(|snippet_length| SearchSettings {
        snippet_length,
    });
    let context = artifact::init_search(loaded, settings);

    let response =
        SearchResponse::respond(&context, &args.query, args.facet.as_ref());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", response.to_text());
        if response.is_empty() {
            println!();
        }
    }
    Ok(())
}
