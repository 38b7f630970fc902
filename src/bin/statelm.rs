//! statelm CLI binary.
//!
//! Talks to a stateful scoring server, or runs the reference server.
//!
//! # Commands
//!
//! - `scores` - Ranked distribution after a context
//! - `k-best` - Most probable continuations
//! - `update` - Add a symbol count at a state
//! - `next-state` - Advance a state by a context
//! - `observe` - Walk strings into the model
//! - `randgen` - Sample a continuation
//! - `bpc` - Adaptive bits per character over a file
//! - `serve` - Start the reference scoring server

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use statelm::{
    client::format_k_best,
    config::Config,
    protocol::Symbol,
    rank,
    server::{self, ServerConfig},
    ScoringClient, StateHandle, VERSION,
};

#[derive(Parser)]
#[command(name = "statelm")]
#[command(version = VERSION)]
#[command(about = "Stateful language model scoring client", long_about = None)]
struct Cli {
    /// Scoring server address (host:port or URL)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Per-call timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<f64>,

    /// Config file (default: <config_dir>/statelm/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the ranked distribution after a context
    Scores {
        /// Context string
        #[arg(default_value = "")]
        context: String,

        /// State handle (-1 interprets the context from the start)
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        state: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the k most probable continuations of a context
    KBest {
        /// Context string
        #[arg(default_value = "")]
        context: String,

        /// Number of candidates
        #[arg(short, long, default_value_t = 1)]
        k: usize,
    },

    /// Add observations of one symbol at a state
    Update {
        /// Symbol (a single character, or empty for end-of-string)
        symbol: String,

        /// State handle
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        state: i64,

        /// Number of observations
        #[arg(short, long, default_value_t = 1)]
        count: i32,
    },

    /// Print the state reached from a state after a context
    NextState {
        /// Context string
        context: String,

        /// State handle
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        state: i64,
    },

    /// Feed strings into the model character by character
    Observe {
        /// Strings to observe, walked concurrently
        #[arg(required = true)]
        texts: Vec<String>,
    },

    /// Sample a random continuation of a context
    Randgen {
        /// Context string
        #[arg(default_value = "")]
        context: String,

        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Adaptive bits per character over a text file, one string per line
    Bpc {
        /// Input file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Start the reference scoring server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Characters known before any update
        #[arg(long)]
        vocabulary: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only results
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    let config = load_config(&cli)?;

    let runtime = tokio::runtime::Runtime::new()?;
    match cli.command {
        Commands::Serve {
            port,
            host,
            vocabulary,
        } => runtime.block_on(cmd_serve(config, port, host, vocabulary)),
        command => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            runtime.block_on(cmd_client(config, command, &mut out))
        },
    }
}

/// Config file (explicit or default), then environment, then CLI flags.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let file_config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_default()?,
    };
    let mut config = file_config.merge(Config::from_env());

    if let Some(server) = &cli.server {
        config.client = config.client.with_server(server);
    }
    if let Some(timeout) = cli.timeout {
        config.client = config.client.with_timeout_secs(timeout);
    }
    config.client.validate()?;
    Ok(config)
}

async fn cmd_client<W: Write>(config: Config, command: Commands, out: &mut W) -> anyhow::Result<()> {
    let client = ScoringClient::connect(&config.client)?;
    let result = run_client_command(&client, command, out).await;
    // Close on every path, including failures
    client.close().await;
    result
}

async fn run_client_command<W: Write>(
    client: &ScoringClient,
    command: Commands,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        Commands::Scores {
            context,
            state,
            json,
        } => {
            let dist = client.score(StateHandle::from_wire(state), &context).await?;
            let ranked = rank(&dist);
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&ranked)?)?;
            } else {
                for candidate in &ranked {
                    writeln!(out, "{:?}\t{:.6}", candidate.symbol, candidate.probability)?;
                }
            }
        },

        Commands::KBest { context, k } => {
            let best = client.k_best(k, &context).await?;
            writeln!(out, "{}", format_k_best(k, &best))?;
        },

        Commands::Update {
            symbol,
            state,
            count,
        } => {
            let symbol = Symbol::from_text(&symbol)?;
            let dist = client
                .update_symbol(StateHandle::from_wire(state), symbol, count)
                .await?;
            for candidate in &rank(&dist) {
                writeln!(out, "{:?}\t{:.6}", candidate.symbol, candidate.probability)?;
            }
        },

        Commands::NextState { context, state } => {
            let next = client
                .advance_context(StateHandle::from_wire(state), &context)
                .await?;
            writeln!(out, "{}", next.to_wire())?;
        },

        Commands::Observe { texts } => {
            let reports = client.observe_many(&texts).await;
            let mut failed = 0;
            for (text, report) in texts.iter().zip(reports) {
                match report {
                    Ok(report) => writeln!(
                        out,
                        "{text:?}: {} chars, {} calls, final {}",
                        report.characters, report.calls, report.final_state
                    )?,
                    Err(e) => {
                        tracing::error!("walk of {text:?} failed: {e}");
                        failed += 1;
                    },
                }
            }
            if failed > 0 {
                anyhow::bail!("{failed} of {} walks failed", texts.len());
            }
        },

        Commands::Randgen { context, seed } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let text = client.random_generate(&context, &mut rng).await?;
            writeln!(out, "{text}")?;
        },

        Commands::Bpc { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let summary = client.bits_per_character(content.lines()).await?;
            writeln!(out, "{summary}")?;
        },

        Commands::Serve { .. } => anyhow::bail!("serve does not run over a client connection"),
    }
    Ok(())
}

async fn cmd_serve(
    config: Config,
    port: Option<u16>,
    host: Option<String>,
    vocabulary: Option<String>,
) -> anyhow::Result<()> {
    let mut section = config.server;
    if let Some(port) = port {
        section.port = port;
    }
    if let Some(host) = host {
        section.host = host;
    }
    if let Some(vocabulary) = vocabulary {
        section.vocabulary = vocabulary;
    }

    let server_config = ServerConfig::from_section(&section)?;
    server::run(server_config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {e}");
        }
    })
    .await?;
    Ok(())
}
