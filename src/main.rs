//! Trading-agent code generation CLI

use agent_coder::api::{respond, CodeResponse};
use agent_coder::artifact::ArtifactField;
use agent_coder::{
    diagnostics, CodeGenerationPipeline, Config, Error, LlmEndpoint, PipelineContext,
    ReferenceDocs, Result,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "agent-coder")]
#[command(about = "Generate and validate trading-agent strategy code")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate strategy code from a prompt
    Generate {
        /// Strategy description
        #[arg(short, long, conflicts_with = "prompt_file")]
        prompt: Option<String>,

        /// Read the strategy description from a file
        #[arg(long)]
        prompt_file: Option<PathBuf>,
    },

    /// Run the syntax and lint checks on local files
    Check {
        /// File holding the baselineFunction() code
        code: PathBuf,

        /// File holding the interval code
        #[arg(short, long)]
        interval: Option<PathBuf>,
    },

    /// Show current configuration
    Config,
}

fn init_logging(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    // Logs go to stderr so stdout stays machine-readable
    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate {
            prompt,
            prompt_file,
        } => {
            let prompt = read_prompt(prompt, prompt_file)?;
            let ok = run_generate(prompt, config).await?;
            if !ok {
                std::process::exit(1);
            }
        }
        Commands::Check { code, interval } => {
            run_check(code, interval)?;
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn read_prompt(prompt: Option<String>, prompt_file: Option<PathBuf>) -> Result<String> {
    let prompt = match (prompt, prompt_file) {
        (Some(prompt), _) => prompt,
        (None, Some(path)) => std::fs::read_to_string(&path)?,
        (None, None) => {
            return Err(Error::InvalidArgument(
                "either --prompt or --prompt-file is required".to_string(),
            ))
        }
    };

    let prompt = prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(Error::InvalidArgument("prompt is empty".to_string()));
    }
    Ok(prompt)
}

async fn run_generate(prompt: String, mut config: Config) -> Result<bool> {
    let endpoint = LlmEndpoint::from_env()?;
    config.apply_endpoint_overrides(&endpoint);

    let docs = match &config.reference_dir {
        Some(dir) => ReferenceDocs::from_dir(dir)?,
        None => ReferenceDocs::kadena(),
    };

    tracing::info!(
        generation_model = %config.generation.model,
        repair_model = %config.repair.model,
        structured_output = config.structured_output,
        "Starting code generation"
    );

    let pipeline = CodeGenerationPipeline::from_config(&config, endpoint)?;
    let context = PipelineContext::new(prompt, Arc::new(docs));

    let (status, body) = respond(pipeline.run(&context).await);
    println!("{}", serde_json::to_string_pretty(&body)?);

    tracing::debug!(status, "Response ready");
    Ok(matches!(body, CodeResponse::Artifact(_)))
}

fn run_check(code: PathBuf, interval: Option<PathBuf>) -> Result<()> {
    let code = std::fs::read_to_string(&code)?;
    let interval = interval.map(std::fs::read_to_string).transpose()?;

    let mut fields = vec![(ArtifactField::Code, code.as_str())];
    if let Some(interval) = &interval {
        fields.push((ArtifactField::Interval, interval.as_str()));
    }

    let report = diagnostics::diagnose(&fields);
    if report.is_clean() {
        tracing::info!("No issues found");
    } else {
        tracing::warn!(count = report.issue_count(), "Issues found");
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
