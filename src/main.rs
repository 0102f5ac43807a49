use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use brainstorm_reasoning::{
    config::{Config, GenerationBackend, LogFormat},
    generation::{GenerationContract, LangbaseGenerator, StubGenerator},
    langbase::LangbaseClient,
    AppError, Pipeline,
};

/// Brainstorm solutions for a task with Tree-of-Thoughts and Graph-of-Thoughts.
#[derive(Debug, Parser)]
#[command(name = "brainstorm", version, about)]
struct Cli {
    /// Problem statement to brainstorm on
    #[arg(short, long)]
    task: String,

    /// Tree depth, counting the initial generation
    #[arg(long)]
    depth: Option<usize>,

    /// Parents expanded per tree level
    #[arg(long)]
    branching_factor: Option<usize>,

    /// Seed for community detection
    #[arg(long)]
    seed: Option<u64>,

    /// Generation backend (stub or langbase)
    #[arg(long)]
    backend: Option<GenerationBackend>,

    /// Print compact JSON instead of pretty JSON
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    apply_overrides(&mut config, &cli);

    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.generation.backend,
        depth = config.pipeline.depth,
        branching_factor = config.pipeline.branching_factor,
        "Brainstorm starting..."
    );

    let contract = match build_contract(&config).await {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to initialize generation backend");
            return Err(e.into());
        }
    };

    let pipeline = Pipeline::new(contract, &config.pipeline);
    let result = match pipeline.run(&cli.task).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, stage = %e.stage(), "Brainstorming failed");
            return Err(e.into());
        }
    };

    let output = if cli.compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{}", output);

    Ok(())
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(depth) = cli.depth {
        config.pipeline.depth = depth;
    }
    if let Some(branching_factor) = cli.branching_factor {
        config.pipeline.branching_factor = branching_factor;
    }
    if let Some(seed) = cli.seed {
        config.pipeline.clustering.seed = seed;
    }
    if let Some(backend) = cli.backend {
        config.generation.backend = backend;
    }
}

/// Build the generation backend, ensuring the Langbase pipe exists when used.
async fn build_contract(config: &Config) -> Result<Arc<dyn GenerationContract>, AppError> {
    match config.generation.backend {
        GenerationBackend::Stub => {
            info!("Using stub generation backend");
            Ok(Arc::new(StubGenerator::new()))
        }
        GenerationBackend::Langbase => {
            let langbase = config.langbase.as_ref().ok_or_else(|| AppError::Config {
                message: "LANGBASE_API_KEY is required for the langbase backend".to_string(),
            })?;
            let client = LangbaseClient::new(langbase, config.request.clone())?;
            info!(base_url = %client.base_url(), "Langbase client initialized");

            let generator = LangbaseGenerator::new(client, &config.pipes.generate);
            info!(pipe = %config.pipes.generate, "Ensuring generation pipe exists...");
            generator.ensure_pipe(&config.generation).await?;
            Ok(Arc::new(generator))
        }
    }
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
