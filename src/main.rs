use std::process::ExitCode;

use colored::Colorize;
use llm_service::{ChatCompletionService, LlmModelConfig};
use pr_reviewer::config::AppConfig;
use pr_reviewer::publish::PublishConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from a .env file when one is present.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .expect("default env filter is valid");

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();

    let cfg = match AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{} {e}", "configuration error:".red().bold());
            return ExitCode::FAILURE;
        }
    };

    let llm = match LlmModelConfig::from_env().and_then(ChatCompletionService::new) {
        Ok(llm) => llm,
        Err(e) => {
            eprintln!("{} {e}", "configuration error:".red().bold());
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Analyzing PR #{} in {}/{}...",
        cfg.pull_request.id, cfg.provider.workspace, cfg.provider.repo_slug
    );

    match pr_reviewer::run_review(&cfg, &llm, PublishConfig::default()).await {
        Ok(report) => {
            println!("{}", report.summary().green());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!(
                "{} {e}",
                format!("PR review failed at the {} stage:", e.stage())
                    .red()
                    .bold()
            );
            ExitCode::FAILURE
        }
    }
}
