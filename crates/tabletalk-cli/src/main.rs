//! tabletalk: natural-language questions answered with one MySQL query
//!
//! Builds a vector index over schema cards, retrieves the cards relevant to
//! the question, asks a chat model for a single SELECT statement, sanitizes
//! and policy-checks it, runs it, and prints SQL plus rows to stdout.

use std::path::Path;

use anyhow::Context;
use tracing::info;

mod config;
mod llm;
mod logging;
mod pipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("Usage: tabletalk \"<question>\"");
        std::process::exit(2);
    }
    let question = args.join(" ");

    let config_path =
        std::env::var("TABLETALK_CONFIG").unwrap_or_else(|_| "tabletalk.yaml".to_string());
    let config = config::Config::load_or_default(Path::new(&config_path))
        .with_context(|| format!("loading configuration from {config_path}"))?;

    config.apply_logging_env();
    logging::init();

    info!(
        llm_model = %config.llm.model,
        embed_model = %config.embedding.model,
        dialect = %config.policy.dialect,
        use_retriever = config.retrieval.use_retriever,
        "Starting tabletalk"
    );

    let pipeline = pipeline::Pipeline::from_config(&config)
        .await
        .context("building the question pipeline")?;

    match pipeline.ask(&question).await {
        Ok(answer) => {
            println!("SQL:\n{}\n", answer.sql);
            println!(
                "Result:\n{}",
                serde_json::to_string_pretty(&answer.output.to_json())?
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
