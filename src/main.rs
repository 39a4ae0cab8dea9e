use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dashcode::config::Config;
use dashcode::grafana::client::format_api_error;
use dashcode::provider::GrafanaProvider;
use dashcode::reconcile::{self, Outcome};
use dashcode::resource::library_panel::KIND as LIBRARY_PANEL_KIND;
use dashcode::resource::{manifest, Format, Registry};
use dashcode::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Grafana library panels as code
#[derive(Parser, Debug)]
#[command(name = "dashcode", version, about, long_about = None)]
struct Args {
    /// Grafana URL (overrides GRAFANA_URL and the config file)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Service account token (overrides GRAFANA_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Log level for debugging
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List UIDs of remote resources
    List {
        #[arg(long, default_value = LIBRARY_PANEL_KIND)]
        kind: String,
    },
    /// Print one remote resource
    Get {
        uid: String,
        #[arg(long, default_value = LIBRARY_PANEL_KIND)]
        kind: String,
        #[arg(long, value_enum)]
        format: Option<Format>,
    },
    /// Write every remote resource to disk
    Pull {
        /// Target directory (defaults to the configured resources dir)
        dir: Option<PathBuf>,
        #[arg(long, value_enum)]
        format: Option<Format>,
    },
    /// Push local resources to Grafana
    Apply {
        /// Source directory (defaults to the configured resources dir)
        dir: Option<PathBuf>,
        /// Report what would change without changing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Save defaults to the config file
    Configure {
        /// HTTP timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        #[arg(long)]
        resources_dir: Option<PathBuf>,
        #[arg(long, value_enum)]
        format: Option<Format>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<&Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    // RUST_LOG, when set, refines the --log-level default
    let filter = EnvFilter::builder()
        .with_default_directive(level.to_level_filter().into())
        .from_env_lossy();

    let Some(log_path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
        return Ok(None);
    };

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("dashcode started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_guard = setup_logging(args.log_level, args.log_file.as_deref())?;

    let result = run(args).await;

    if let Err(err) = result {
        tracing::error!("{}", err);
        eprintln!("Error: {}", user_message(&err));
        drop(log_guard);
        std::process::exit(1);
    }

    Ok(())
}

/// Short message for the terminal; full details go to the log
fn user_message(err: &Error) -> String {
    match err {
        Error::Transport(inner) => format_api_error(inner),
        other => other.to_string(),
    }
}

async fn run(args: Args) -> dashcode::Result<()> {
    let mut config = Config::load().with_env();
    if let Some(url) = &args.url {
        config.url = Some(url.clone());
    }
    if let Some(token) = &args.token {
        config.token = Some(token.clone());
    }

    match args.command {
        Command::List { kind } => {
            let handler = registry(&config).handler(&kind)?;
            for uid in handler.list_remote().await? {
                println!("{}", uid);
            }
        }
        Command::Get { uid, kind, format } => {
            let handler = registry(&config).handler(&kind)?;
            let resource = handler.unprepare(&handler.get_by_uid(&uid).await?);
            let format = format.unwrap_or_else(|| config.effective_format());
            print!("{}", with_newline(manifest::encode(&resource, format)?));
        }
        Command::Pull { dir, format } => {
            let dir = dir.unwrap_or_else(|| config.effective_resources_dir());
            let format = format.unwrap_or_else(|| config.effective_format());
            let written = reconcile::pull(&registry(&config), &dir, format).await?;
            for path in &written {
                println!("{}", path.display());
            }
            println!("{} resources pulled", written.len());
        }
        Command::Apply { dir, dry_run } => {
            let dir = dir.unwrap_or_else(|| config.effective_resources_dir());
            let registry = registry(&config);
            let resources = reconcile::load_resources(&registry, &dir)?;
            let results = reconcile::apply(&registry, &resources, dry_run).await?;

            for result in &results {
                println!("{} {}", result.key, result.outcome);
            }
            let changed = results
                .iter()
                .filter(|r| r.outcome != Outcome::Unchanged)
                .count();
            let verb = if dry_run { "would change" } else { "changed" };
            println!("{} of {} resources {}", changed, results.len(), verb);
        }
        Command::Configure {
            timeout,
            resources_dir,
            format,
        } => {
            // Only the config file is updated; environment values are not persisted
            let mut stored = Config::load();
            stored.url = args.url.or(stored.url);
            stored.token = args.token.or(stored.token);
            stored.timeout_secs = timeout.or(stored.timeout_secs);
            stored.resources_dir = resources_dir.or(stored.resources_dir);
            stored.format = format.or(stored.format);

            let Some(path) = Config::config_path() else {
                return Err(anyhow::anyhow!("No config directory on this platform").into());
            };
            stored.save().map_err(|e| Error::Manifest {
                path: path.clone(),
                message: e.to_string(),
            })?;
            println!("Saved {}", path.display());
        }
    }

    Ok(())
}

fn registry(config: &Config) -> Registry {
    Registry::with_defaults(Arc::new(GrafanaProvider::from_config(config)))
}

fn with_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
