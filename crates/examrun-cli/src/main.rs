//! examrun CLI - Command line interface for a remote test runner.

use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use examrun_client::{CallOutcome, ClientConfig, PollPolicy, Session, SoapEnvelope, WaitOutcome};
use examrun_core::{ModelConfig, RunConfiguration, TestrunFilter};

/// examrun CLI - Remote test runner control tool
#[derive(Parser)]
#[command(name = "examrun")]
#[command(about = "Drive test runs on a remote runner", long_about = None)]
struct Cli {
    /// Runner REST base URL
    #[arg(short, long, default_value = "http://localhost:8085/examRest")]
    url: String,

    /// Timeout for each HTTP request (seconds)
    #[arg(long, default_value_t = 30)]
    request_timeout_secs: u64,

    /// How long to wait for the runner to answer (seconds)
    #[arg(long, default_value_t = 60)]
    connect_timeout_secs: u64,

    /// Pause between availability probes (milliseconds, 0 = tight loop)
    #[arg(long, default_value_t = 100)]
    probe_interval_ms: u64,

    /// Pause between status polls while a run is going (seconds)
    #[arg(long, default_value_t = 5)]
    poll_interval_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the runner answers
    Probe,

    /// Print the runner's current status as JSON
    Status,

    /// Start a test run and wait for it to finish
    Run {
        /// Run configuration JSON file
        #[arg(short, long, conflicts_with = "model")]
        config: Option<PathBuf>,

        /// Model to run (instead of a configuration file)
        #[arg(short, long, required_unless_present = "config")]
        model: Option<String>,

        /// Runner version of the model, without delimiters
        #[arg(long, default_value_t = 0)]
        exam_version: u32,

        /// Modeler web service endpoint
        #[arg(long, default_value = "")]
        target_endpoint: String,

        /// Test case filter as NAME=VALUE (repeatable)
        #[arg(short, long = "filter", value_parser = parse_filter)]
        filters: Vec<TestrunFilter>,

        /// Clear the workspace before starting
        #[arg(long)]
        clear: bool,

        /// Limit --clear to this project
        #[arg(long, requires = "clear")]
        project: Option<String>,

        /// Shut the runner down when the run is over
        #[arg(long)]
        shutdown: bool,

        /// How long to wait for the runner to shut down (seconds)
        #[arg(long, default_value_t = 60)]
        disconnect_timeout_secs: u64,
    },

    /// Stop the current test run
    Stop,

    /// Delete projects from the runner's workspace
    Clear {
        /// Only delete this project
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Shut the runner down and wait for it to go away
    Shutdown {
        /// How long to wait for the runner to shut down (seconds)
        #[arg(long, default_value_t = 60)]
        timeout_secs: u64,
    },

    /// Extract the SOAP envelope from a multipart body file
    #[command(name = "decode-soap")]
    DecodeSoap {
        /// File holding the multipart body
        input: PathBuf,
    },
}

fn parse_filter(value: &str) -> Result<TestrunFilter, String> {
    match value.split_once('=') {
        Some((name, filter_value)) if !name.trim().is_empty() => {
            Ok(TestrunFilter::new(name.trim(), filter_value.trim()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", value)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ClientConfig::new(cli.url.clone())
        .with_request_timeout(Duration::from_secs(cli.request_timeout_secs))
        .with_poll_policy(PollPolicy {
            probe_interval: Duration::from_millis(cli.probe_interval_ms),
            status_interval: Duration::from_secs(cli.poll_interval_secs),
        });
    config.validate()?;
    let connect_timeout = Duration::from_secs(cli.connect_timeout_secs);

    match cli.command {
        Commands::Probe => {
            probe(config).await;
        }
        Commands::Status => {
            status(config, connect_timeout).await?;
        }
        Commands::Run {
            config: config_path,
            model,
            exam_version,
            target_endpoint,
            filters,
            clear,
            project,
            shutdown,
            disconnect_timeout_secs,
        } => {
            let run_config = match (config_path, model) {
                (Some(path), _) => {
                    let text = tokio::fs::read_to_string(&path).await?;
                    RunConfiguration::from_json(&text)?
                }
                (None, Some(model)) => {
                    let model = ModelConfig::new(model)
                        .with_exam_version(exam_version)
                        .with_target_endpoint(target_endpoint);
                    model.validate()?;
                    info!(model = %model.display_name(), "Using model");
                    RunConfiguration::for_model(&model)
                }
                (None, None) => return Err("either --config or --model is required".into()),
            };
            let run_config = filters.into_iter().fold(run_config, RunConfiguration::with_filter);

            let options = RunOptions {
                clear_project: clear.then_some(project),
                shutdown,
                disconnect_timeout: Duration::from_secs(disconnect_timeout_secs),
            };
            run(config, connect_timeout, run_config, options).await?;
        }
        Commands::Stop => {
            let session = connect(config, connect_timeout).await?;
            let _ = session.runs().stop().await?;
            println!("Test run stopped");
        }
        Commands::Clear { project } => {
            let session = connect(config, connect_timeout).await?;
            let _ = session.workspace().clear(project.as_deref()).await?;
            println!("Workspace cleared");
        }
        Commands::Shutdown { timeout_secs } => {
            let mut session = connect(config, connect_timeout).await?;
            session.disconnect(Duration::from_secs(timeout_secs)).await;
            println!("Runner shut down");
        }
        Commands::DecodeSoap { input } => {
            decode_soap(input)?;
        }
    }

    Ok(())
}

/// What to do around a run besides starting it.
struct RunOptions {
    /// `Some(project)` clears before starting; `Some(None)` clears everything.
    clear_project: Option<Option<String>>,
    shutdown: bool,
    disconnect_timeout: Duration,
}

async fn connect(
    config: ClientConfig,
    timeout: Duration,
) -> Result<Session, Box<dyn std::error::Error>> {
    let mut session = Session::new(config);
    if !session.connect(timeout).await {
        session.destroy_handle();
        return Err(format!(
            "runner at {} does not answer in {}s",
            session.base_url(),
            timeout.as_secs()
        )
        .into());
    }
    Ok(session)
}

async fn probe(config: ClientConfig) {
    let base_url = config.base_url.clone();
    let mut session = Session::new(config);
    if session.is_available().await {
        println!("Runner at {} is available", base_url);
    } else {
        println!("Runner at {} is not available", base_url);
    }
}

async fn status(config: ClientConfig, timeout: Duration) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = connect(config, timeout).await?;
    let outcome = session.status().await;
    session.destroy_handle();

    if let CallOutcome::Completed(status) = outcome? {
        println!("{}", serde_json::to_string_pretty(&status)?);
    }
    Ok(())
}

async fn run(
    config: ClientConfig,
    timeout: Duration,
    run_config: RunConfiguration,
    options: RunOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = connect(config, timeout).await?;

    if let Some(project) = &options.clear_project {
        let _ = session.workspace().clear(project.as_deref()).await?;
    }
    let _ = session.runs().start(&run_config).await?;

    let interrupt = CancellationToken::new();
    let token = interrupt.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping test run");
            token.cancel();
        }
    });

    let outcome = session.runs().wait_for_completion(&interrupt).await;
    ctrl_c.abort();

    if options.shutdown {
        session.disconnect(options.disconnect_timeout).await;
    } else {
        session.destroy_handle();
    }

    match outcome? {
        WaitOutcome::Completed => {
            println!("Test run finished");
            Ok(())
        }
        WaitOutcome::Interrupted => Err("test run interrupted".into()),
        WaitOutcome::NotConnected => Err("no runner connected".into()),
    }
}

fn decode_soap(input: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let file = std::fs::File::open(&input)?;
    let envelope = SoapEnvelope::from_multipart(BufReader::new(file))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    envelope.write_to(&mut out)?;
    writeln!(out)?;
    Ok(())
}
