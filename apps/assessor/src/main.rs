mod agents;
mod config;
mod documents;
mod errors;
mod llm_client;
mod models;
mod render;
mod workflow;

#[cfg(test)]
mod test_support;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LlmProvider};
use crate::documents::FsDocumentLoader;
use crate::llm_client::LlmClient;
use crate::render::{format_report, persist_report};
use crate::workflow::AssessmentWorkflow;

/// Assess a CV against a job description with a pipeline of LLM stages.
#[derive(Parser, Debug)]
#[command(name = "assessor", version, about, long_about = None)]
struct Args {
    /// CV file (.pdf, .docx, .txt, .md, .json)
    #[arg(long)]
    cv: PathBuf,

    /// Job description file
    #[arg(long)]
    job: PathBuf,

    /// Where to write the JSON report
    #[arg(long, default_value = "reports/assessment_result.json")]
    output: PathBuf,

    /// LLM provider (anthropic, openai, gemini); overrides DEFAULT_LLM_PROVIDER
    #[arg(long)]
    provider: Option<LlmProvider>,

    /// Model name; overrides DEFAULT_MODEL
    #[arg(long)]
    model: Option<String>,

    /// Cancel the run if it has not finished after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n[ERROR] {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = match args.provider {
        Some(provider) => {
            dotenvy::dotenv().ok();
            Config::with_provider(provider, |key| std::env::var(key).ok())?
        }
        None => Config::from_env()?,
    };
    if let Some(model) = args.model {
        config.model = model;
    }

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting assessor v{}", env!("CARGO_PKG_VERSION"));

    let llm = LlmClient::new(&config)?;
    info!("LLM client initialized ({} / {})", llm.provider(), llm.model());

    let stages = agents::build_stages(&config, Arc::new(llm), Arc::new(FsDocumentLoader));
    let workflow = AssessmentWorkflow::new(stages)?;

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(&cancel, args.timeout_secs.map(Duration::from_secs));

    println!("CV Path: {}", args.cv.display());
    println!("Job Path: {}", args.job.display());
    println!("\nStarting assessment...");

    let record = workflow.execute(&args.cv, &args.job, cancel).await;
    let report = record
        .outcome
        .map_err(|e| anyhow::anyhow!("Assessment failed: {e}"))?;

    print!("{}", format_report(&report, &config.weights));

    persist_report(&args.output, &report)?;
    println!("\n\nResults saved to: {}", args.output.display());
    Ok(())
}

/// Ctrl-C and the optional deadline both cancel the run.
fn spawn_cancel_triggers(cancel: &CancellationToken, timeout: Option<Duration>) {
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling assessment");
            on_signal.cancel();
        }
    });

    if let Some(timeout) = timeout {
        let on_deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    warn!("Assessment exceeded {}s, cancelling", timeout.as_secs());
                    on_deadline.cancel();
                }
                _ = on_deadline.cancelled() => {}
            }
        });
    }
}
