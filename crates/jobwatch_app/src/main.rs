use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jobwatch_app::app::build_monitor;
use jobwatch_app::config::{AppConfig, DEFAULT_CONFIG_FILE};
use jobwatch_app::console::ConsoleCommand;
use jobwatch_app::render::render_view;
use jobwatch_core::Msg;
use jobwatch_engine::{poll_loop, CheckOutcome, ChannelUiSink, NullUiSink, UiEvent};
use jobwatch_logging::{watch_info, watch_warn, LogDestination};
use log::LevelFilter;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "jobwatch")]
#[command(about = "Watches a job marketplace for new postings and notifies about them")]
#[command(version)]
struct Cli {
    /// Configuration file (RON)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll on the configured interval; reads commands from stdin
    Watch,
    /// Run one check and print the status line
    Check {
        /// Search query; defaults to the configured query
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Print the jobs found by the last check
    List {
        /// Print the view model as JSON
        #[arg(long)]
        json: bool,
    },
    /// Hide a job and never notify about it again
    Delete { id: String },
    /// Expand every collapsed job card
    ClearCollapsed,
    /// Fetch full details of a posting
    Details { ciphertext: String },
    /// Fetch a freelancer profile
    Profile { id: String },
    /// Print the effective configuration as RON
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    init_logging(&config, cli.verbose, matches!(cli.command, Commands::Watch))?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    runtime.block_on(dispatch(cli.command, config))
}

fn init_logging(config: &AppConfig, verbose: bool, watching: bool) -> Result<()> {
    let configured = config.level_filter()?;
    let level = match (verbose, watching || config.log_file.is_some()) {
        (true, _) => LevelFilter::Debug,
        (false, true) => configured,
        // One-shot commands print results to stdout; keep the terminal quiet.
        (false, false) => configured.min(LevelFilter::Warn),
    };
    let destination = match (&config.log_file, watching) {
        (Some(path), true) => LogDestination::Both(path.clone()),
        (Some(path), false) => LogDestination::File(path.clone()),
        (None, _) => LogDestination::Terminal,
    };
    if !jobwatch_logging::initialize(destination, level) {
        eprintln!("Warning: logging is disabled");
    }
    Ok(())
}

async fn dispatch(command: Commands, config: AppConfig) -> Result<ExitCode> {
    if let Commands::Config = command {
        println!("{}", config.to_ron()?);
        return Ok(ExitCode::SUCCESS);
    }
    if let Commands::Watch = command {
        return watch(config).await;
    }

    let monitor = build_monitor(&config, Arc::new(NullUiSink))?;
    monitor.restore().await;

    match command {
        Commands::Check { query } => {
            let outcome = monitor.run_check(query).await;
            println!("{}", monitor.view().status);
            Ok(exit_code_for(&outcome))
        }
        Commands::List { json } => {
            let view = monitor.view();
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", render_view(&view, &config.site_url));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Delete { id } => {
            monitor.dispatch(Msg::DeleteJob { id }).await;
            Ok(ExitCode::SUCCESS)
        }
        Commands::ClearCollapsed => {
            monitor.dispatch(Msg::ClearCollapsed).await;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Details { ciphertext } => match monitor.fetch_details(&ciphertext).await {
            Ok(details) => {
                println!("{}", serde_json::to_string_pretty(&details)?);
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => {
                eprintln!("{}", monitor.view().status);
                watch_warn!("Details lookup failed: {}", err);
                Ok(ExitCode::from(2))
            }
        },
        Commands::Profile { id } => match monitor.fetch_profile(&id).await {
            Ok(profile) => {
                println!("{}", serde_json::to_string_pretty(&profile)?);
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => {
                eprintln!("{}", monitor.view().status);
                watch_warn!("Profile lookup failed: {}", err);
                Ok(ExitCode::from(2))
            }
        },
        Commands::Watch | Commands::Config => Ok(ExitCode::SUCCESS),
    }
}

fn exit_code_for(outcome: &CheckOutcome) -> ExitCode {
    match outcome {
        CheckOutcome::Completed { .. } => ExitCode::SUCCESS,
        CheckOutcome::Failed { .. } => ExitCode::from(2),
        CheckOutcome::Busy => ExitCode::from(3),
    }
}

async fn watch(config: AppConfig) -> Result<ExitCode> {
    let (event_tx, event_rx) = mpsc::channel();
    let monitor = Arc::new(build_monitor(&config, Arc::new(ChannelUiSink::new(event_tx)))?);
    monitor.restore().await;

    // Prints the status line whenever the state changes.
    let printer = monitor.clone();
    thread::spawn(move || {
        while let Ok(UiEvent::StateChanged) = event_rx.recv() {
            println!("{}", printer.view().status);
        }
    });

    let cancel = CancellationToken::new();
    let poller = tokio::spawn(poll_loop(
        monitor.clone(),
        config.poll_interval(),
        cancel.clone(),
    ));
    watch_info!("Watching for {:?}; type `quit` to stop", config.default_query);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => break,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                watch_warn!("stdin closed: {}", err);
                break;
            }
        };
        let command = match ConsoleCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };
        match command {
            ConsoleCommand::Quit => break,
            ConsoleCommand::Status => print!("{}", render_view(&monitor.view(), &config.site_url)),
            other => {
                if let Some(msg) = other.into_msg() {
                    let monitor = monitor.clone();
                    tokio::spawn(async move {
                        monitor.dispatch(msg).await;
                    });
                }
            }
        }
    }

    cancel.cancel();
    poller.await.context("poll loop panicked")?;
    Ok(ExitCode::SUCCESS)
}
