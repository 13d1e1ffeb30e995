use std::{env, fs, path::PathBuf};

fn source_arg() -> clap::Arg {
    clap::arg!(<SOURCE> "Source id (asura, manhuafast, mangalife)")
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("tankobon")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Browse manga sites through one normalized model")
        .subcommand_required(true)
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").global(true))
        .arg(
            clap::arg!(--user_agent <UA> "Custom User-Agent for HTTP requests")
                .value_name("UA")
                .global(true),
        )
        .arg(
            clap::arg!(--config_dir <DIR> "Directory holding a config.txt that overrides the per-user one")
                .value_name("DIR")
                .value_parser(clap::value_parser!(std::path::PathBuf))
                .global(true),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (json, text)")
                .value_name("FORMAT")
                .default_value("json")
                .value_parser(["json", "text"])
                .global(true),
        )
        .arg(clap::arg!(-v --verbose "Enable debug logging").global(true))
        .subcommand(clap::Command::new("sources").about("List registered sources"))
        .subcommand(
            clap::Command::new("latest")
                .about("Latest updates from a source")
                .arg(source_arg())
                .arg(clap::arg!(-p --page <NUM> "Page number, starting at 1").default_value("1")),
        )
        .subcommand(
            clap::Command::new("search")
                .about("Search a source by title")
                .arg(source_arg())
                .arg(clap::arg!(<QUERY> "Free-text query")),
        )
        .subcommand(
            clap::Command::new("details")
                .about("Metadata and chapter list for a title")
                .arg(source_arg())
                .arg(clap::arg!(<ID> "Manga id as returned by latest or search")),
        )
        .subcommand(
            clap::Command::new("pages")
                .about("Page image URLs for a chapter")
                .arg(source_arg())
                .arg(clap::arg!(<CHAPTER> "Chapter id as returned by details")),
        )
        .subcommand(
            clap::Command::new("read")
                .about("Pages plus series context and chapter navigation")
                .arg(source_arg())
                .arg(clap::arg!(<CHAPTER> "Chapter id as returned by details")),
        )
        .subcommand(
            clap::Command::new("parse")
                .about("Run a source's extraction over a saved page (no network)")
                .arg(source_arg())
                .arg(
                    clap::arg!(<KIND> "Page kind (latest, search, details, pages)")
                        .value_parser(["latest", "search", "details", "pages"]),
                )
                .arg(clap::arg!(<INPUT> "Local HTML file, or '-' for stdin"))
                .arg(clap::arg!(--id <ID> "Public id the page belongs to (details pages)").default_value("")),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "tankobon", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "tankobon", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "tankobon", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "tankobon", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
