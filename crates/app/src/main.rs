use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use bifocals_application::AppContext;
use bifocals_engine::{Page, load_document};
use bifocals_storage::Storage;
use bifocals_ui::Ui;
use clap::Parser;
use directories::ProjectDirs;

/// Terminal reader for long Markdown documents.
#[derive(Parser, Debug, PartialEq, Eq)]
#[command(name = "bifocals", version, about, long_about = None)]
struct Args {
    /// Markdown document to open.
    document: PathBuf,
    /// Fragment to open at, such as `#p42` or `#intro`.
    #[arg(long)]
    at: Option<String>,
    /// Log file; defaults to `bifocals.log` in the config directory.
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let project_dirs =
        ProjectDirs::from("dev", "bifocals", "bifocals").context("resolve project dirs")?;
    let config_dir = project_dirs.config_dir();
    fs::create_dir_all(config_dir)
        .with_context(|| format!("create config dir {}", config_dir.display()))?;

    let log_path = args
        .log
        .clone()
        .unwrap_or_else(|| config_dir.join("bifocals.log"));
    init_logging(&log_path)?;

    let loaded = load_document(&args.document)?;
    let scope = fs::canonicalize(&args.document)
        .unwrap_or_else(|_| args.document.clone())
        .to_string_lossy()
        .to_string();

    let storage = Storage::open(config_dir.join("bifocals.db"))?;
    let settings = storage.load_settings()?;
    let store = storage.scoped(scope);

    let page = Page::new(loaded.document, loaded.base_url, &settings);
    let ctx = AppContext::new(settings, page, Box::new(store)).with_initial_fragment(args.at);

    let mut ui = Ui::new(ctx);
    ui.run()?;
    log::info!("session: closed");
    Ok(())
}

/// Logs go to a file; the terminal belongs to the reader. `BIFOCALS_LOG`
/// takes an env_logger filter and defaults to `info`.
fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("BIFOCALS_LOG", "info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("init logger")?;
    Ok(())
}
