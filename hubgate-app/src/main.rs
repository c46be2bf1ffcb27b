use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hubgate_app::agent::run_agent;
use hubgate_app::bootstrap::build_gateway;
use hubgate_app::config::{Config, DEFAULT_CONFIG_PATH};
use hubgate_app::serve::serve;
use hubgate_llm::OpenAICompatibleProvider;
use hubgate_tools::{InvocationRequest, InvocationResponse};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hubgate", version, about = "GitHub automation gateway for LLM agents")]
struct Cli {
    /// Configuration file
    #[arg(long, env = "HUBGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tool catalog
    Tools,
    /// Invoke one tool and print the response
    Call {
        qualified_name: String,
        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Answer line-delimited JSON requests on stdin
    Serve,
    /// Let the configured LLM use the tools to answer a prompt
    Ask { prompt: String },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let explicit = cli.config.is_some();
    let path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = Config::load(&path, explicit)?;
    init_tracing(&config.log_level);

    let dispatcher = build_gateway(&config)?;

    match cli.command {
        Command::Tools => {
            println!("{}", serde_json::to_string_pretty(&dispatcher.catalog())?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Call {
            qualified_name,
            args,
        } => {
            let arguments: Value =
                serde_json::from_str(&args).context("--args must be valid JSON")?;
            let response: InvocationResponse = dispatcher
                .handle(InvocationRequest {
                    qualified_name,
                    arguments,
                })
                .await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(if response.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Serve => {
            let stdin = BufReader::new(tokio::io::stdin());
            serve(&dispatcher, stdin, tokio::io::stdout()).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Ask { prompt } => {
            let llm = OpenAICompatibleProvider::new(
                config.llm.base_url.clone(),
                config.llm_api_key(),
                config.llm.model.clone(),
            );
            let outcome = run_agent(&llm, &dispatcher, &prompt, config.llm.max_steps).await?;
            match outcome.answer {
                Some(answer) => {
                    println!("{answer}");
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!(
                        "⚠️  No final answer after {} steps ({} tool calls)",
                        outcome.steps, outcome.tool_calls
                    );
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}
