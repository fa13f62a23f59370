mod cancel;
mod config;
mod present;
mod scheduler;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use hostscope_bans::{BanService, DisabledBanService, Fail2banClient, LiveBanReader};
use hostscope_tui::KeyQuitListener;

use config::Settings;
use present::{JsonPresenter, PlainPresenter, Presenter, TuiPresenter, ViewConfig};
use scheduler::RefreshScheduler;

/// Hostscope - A refreshing summary of firewall, SSH and fail2ban activity
#[derive(Parser, Debug)]
#[command(name = "hostscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file (TOML, or JSON when the name ends in .json)
    #[arg(short, long, default_value = "settings.toml")]
    config: PathBuf,

    /// Refresh interval in seconds, overriding the settings file
    #[arg(short, long)]
    interval: Option<f64>,

    /// How each snapshot is shown
    #[arg(short, long, value_enum, default_value_t = OutputMode::Tui)]
    output: OutputMode,

    /// Refresh once and exit
    #[arg(long)]
    once: bool,

    /// Skip querying fail2ban for its live ban state
    #[arg(long)]
    no_live_bans: bool,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputMode {
    /// Full-screen terminal dashboard
    Tui,
    /// Plain text report per refresh
    Plain,
    /// One JSON object per refresh
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args)?;

    // Run the application
    let result = run_app(args).await;

    // Handle any errors
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

/// Diagnostics go to the log file when given; the terminal dashboard owns
/// the screen, so without one they are dropped in that mode
fn init_tracing(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match (&args.log_file, args.output) {
        (Some(path), _) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Arc::new(file)).init();
        }
        (None, OutputMode::Tui) => builder.with_writer(std::io::sink).init(),
        (None, _) => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

async fn run_app(args: Args) -> Result<()> {
    let mut settings = Settings::load(&args.config)
        .with_context(|| format!("Failed to load settings from {}", args.config.display()))?;
    if let Some(secs) = args.interval {
        settings = settings.with_interval(secs)?;
    }

    if args.no_live_bans {
        run_with_service(&args, settings, DisabledBanService).await
    } else {
        let client = Fail2banClient::new(settings.fail2ban_client.clone())
            .with_timeout(settings.fail2ban_timeout);
        run_with_service(&args, settings, client).await
    }
}

async fn run_with_service<S: BanService>(args: &Args, settings: Settings, service: S) -> Result<()> {
    let cancel = CancellationToken::new();
    let ctrl_c = cancel::spawn_ctrl_c_listener(cancel.clone());

    let view = ViewConfig {
        limits: settings.limits.clone(),
        quit_token: settings.quit_token.clone(),
        interval: settings.update_interval,
    };

    let presenter: Box<dyn Presenter> = match args.output {
        OutputMode::Tui => Box::new(TuiPresenter::new(view)?),
        OutputMode::Plain => Box::new(PlainPresenter::new(std::io::stdout(), view)),
        OutputMode::Json => Box::new(JsonPresenter::new(std::io::stdout())),
    };

    let key_listener = if args.once {
        None
    } else if args.output == OutputMode::Tui {
        Some(KeyQuitListener::spawn(cancel.clone(), settings.quit_token.clone()))
    } else {
        cancel::spawn_stdin_listener(cancel.clone(), settings.quit_token.clone());
        None
    };

    let mut scheduler = RefreshScheduler::new(
        settings.sources,
        LiveBanReader::new(service),
        presenter,
        settings.update_interval,
        cancel.clone(),
    )
    .once(args.once);

    let result = scheduler.run().await;

    // Release the listeners
    cancel.cancel();
    if let Some(handle) = key_listener {
        let _ = handle.await;
    }
    let _ = ctrl_c.await;

    let summary = result?;
    tracing::info!(cycles = summary.cycles, state = ?summary.final_state, "Exiting");
    Ok(())
}
