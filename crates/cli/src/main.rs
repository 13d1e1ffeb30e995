use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use serde::Serialize;
use tankobon_core::{MangaSource, PageKind, SettingsLoader, SourceRegistry, fetch_file, fetch_stdin, load_chapter};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod echo;
mod render;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            _ => Err(format!("Invalid format: {}. Valid options: json, text", s)),
        }
    }
}

/// Browse manga sites through one normalized model
#[derive(Parser, Debug)]
#[command(name = "tankobon")]
#[command(version)]
#[command(about = "Browse manga sites through one normalized model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// HTTP timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Custom User-Agent for HTTP requests
    #[arg(long, global = true, value_name = "UA")]
    user_agent: Option<String>,

    /// Directory holding a config.txt that overrides the per-user one
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Output format (json, text)
    #[arg(short, long, global = true, default_value = "json", value_name = "FORMAT")]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered sources
    Sources,

    /// Latest updates from a source
    Latest {
        /// Source id
        source: String,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Search a source by title
    Search {
        /// Source id
        source: String,

        /// Free-text query
        query: String,
    },

    /// Metadata and chapter list for a title
    Details {
        /// Source id
        source: String,

        /// Manga id as returned by latest or search
        id: String,
    },

    /// Page image URLs for a chapter
    Pages {
        /// Source id
        source: String,

        /// Chapter id as returned by details
        chapter: String,
    },

    /// Pages plus series context and chapter navigation
    Read {
        /// Source id
        source: String,

        /// Chapter id as returned by details
        chapter: String,
    },

    /// Run a source's extraction over a saved page (no network)
    Parse {
        /// Source id
        source: String,

        /// Page kind (latest, search, details, pages)
        kind: PageKind,

        /// Local HTML file, or "-" for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Public id the page belongs to (details pages)
        #[arg(long, default_value = "")]
        id: String,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,tankobon=debug,tankobon_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_registry(cli: &Cli) -> anyhow::Result<SourceRegistry> {
    let mut loader = SettingsLoader::standard();
    if let Some(dir) = &cli.config_dir {
        loader = loader.custom_dir(dir);
    }

    let mut settings = loader.load().context("Failed to load settings")?;
    if let Some(timeout) = cli.timeout {
        settings.timeout = Some(timeout);
    }
    if let Some(ua) = &cli.user_agent {
        settings.user_agent = Some(ua.clone());
    }

    let registry = SourceRegistry::with_settings(&settings).context("Failed to set up sources")?;
    debug!(
        sources = %registry.ids().join(", "),
        timeout = ?settings.timeout,
        overrides = settings.base_urls.len(),
        "sources ready"
    );

    Ok(registry)
}

fn lookup(registry: &SourceRegistry, id: &str) -> anyhow::Result<Arc<dyn MangaSource>> {
    Ok(registry.get(id)?)
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
            println!("{}", json);
        }
        OutputFormat::Text => print!("{}", text(value)),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    let registry = build_registry(&cli)?;
    let started = Instant::now();

    match &cli.command {
        Command::Sources => {
            emit(cli.format, &registry.list(), |list| render::sources(list))?;
        }
        Command::Latest { source, page } => {
            let source = lookup(&registry, source)?;
            if cli.verbose {
                echo::print_step(1, 1, &format!("Fetching page {} from {}", page, source.info().name));
            }
            let manga = source
                .get_latest_manga(*page)
                .await
                .with_context(|| format!("Failed to load latest page {}", page))?;
            emit(cli.format, &manga, |m| render::listing(m))?;
        }
        Command::Search { source, query } => {
            let source = lookup(&registry, source)?;
            if cli.verbose {
                echo::print_step(1, 1, &format!("Searching {} for {}", source.info().name, query.bright_white()));
            }
            let manga = source
                .search_manga(query)
                .await
                .with_context(|| format!("Failed to search for {}", query))?;
            emit(cli.format, &manga, |m| render::listing(m))?;
        }
        Command::Details { source, id } => {
            let source = lookup(&registry, source)?;
            if cli.verbose {
                echo::print_step(1, 1, &format!("Loading {}", id.bright_white()));
            }
            let details = source
                .get_manga_details(id)
                .await
                .with_context(|| format!("Failed to load details for {}", id))?;
            if details.chapters.is_empty() {
                echo::print_warning("No chapters found");
            }
            emit(cli.format, &details, render::details)?;
        }
        Command::Pages { source, chapter } => {
            let source = lookup(&registry, source)?;
            let pages = source
                .get_chapter_pages(chapter)
                .await
                .with_context(|| format!("Failed to load pages for {}", chapter))?;
            if pages.is_empty() {
                echo::print_warning("No pages found");
            }
            emit(cli.format, &pages, |p| render::pages(p))?;
        }
        Command::Read { source, chapter } => {
            let source = lookup(&registry, source)?;
            if cli.verbose {
                echo::print_step(1, 1, &format!("Loading chapter {}", chapter.bright_white()));
            }
            let ctx = load_chapter(source.as_ref(), chapter)
                .await
                .with_context(|| format!("Failed to read {}", chapter))?;
            emit(cli.format, &ctx, render::reader)?;
        }
        Command::Parse { source, kind, input, id } => {
            let source = lookup(&registry, source)?;

            if cli.verbose {
                echo::print_step(1, 2, &format!("Reading {}", if input == "-" { "stdin" } else { input.as_str() }));
            }
            let html = if input == "-" {
                fetch_stdin().context("Failed to read from stdin")?
            } else {
                fetch_file(input).with_context(|| format!("Failed to read file: {}", input))?
            };

            if cli.verbose {
                echo::print_detail("Size", &echo::format_size(html.len()));
                echo::print_step(2, 2, &format!("Extracting {:?} with {}", kind, source.info().name));
            }
            let result = source.extract(*kind, &html, id).context("Failed to extract page")?;
            emit(cli.format, &result, render::extracted)?;
        }
    }

    if cli.verbose {
        echo::print_timing("Total", started.elapsed());
        echo::print_success("Done");
    }

    Ok(())
}
