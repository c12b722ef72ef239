//! Murmur application binary - composition root.
//!
//! 1. Parse CLI arguments
//! 2. Load configuration from TOML and apply overrides
//! 3. Initialize tracing on stderr
//! 4. Read the request JSON from a file or stdin
//! 5. Run the analysis pipeline and print the report on stdout

mod cli;

use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use murmur_core::config::{LogFormat, MurmurConfig};
use murmur_core::types::AnalyzeRequest;
use murmur_insight::AnalysisPipeline;

use cli::{AnalyzeArgs, CliArgs, Command};

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn read_input(args: &AnalyzeArgs) -> std::io::Result<String> {
    if args.reads_stdin() {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        Ok(buf)
    } else {
        tokio::fs::read_to_string(&args.input).await
    }
}

async fn run_analyze(args: AnalyzeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let source = args.config_source();
    let mut config = source.load()?;
    args.apply_overrides(
        &mut config,
        std::env::var("MURMUR_EMBEDDING_API_KEY").ok(),
        std::env::var("MURMUR_LLM_API_KEY").ok(),
    );

    init_tracing(
        &args.resolve_log_level(&config),
        args.resolve_log_format(&config),
    );
    tracing::info!("Starting Murmur v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!(source = ?source, "Configuration resolved");

    let pipeline = AnalysisPipeline::from_config(&config)?;
    tracing::info!(enhanced = pipeline.is_enhanced(), "Pipeline ready");

    let raw = read_input(&args).await?;
    let request = AnalyzeRequest::from_json(&raw)?;

    let output = pipeline.analyze(&request).await?;
    println!("{}", output.to_response().to_json(args.pretty)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    match args.command {
        Command::Analyze(analyze) => run_analyze(analyze).await,
        Command::Config { print_default } => {
            if print_default {
                print!("{}", MurmurConfig::default().to_toml()?);
            } else {
                eprintln!("nothing to do; try `murmur config --print-default`");
            }
            Ok(())
        }
    }
}
