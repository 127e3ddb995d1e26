use std::{
    io::{self, Read},
    path::PathBuf,
    process::ExitCode,
};

use analysis_client::{AnalysisClient, Completion, RequestState};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shared::domain::SearchFilters;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "insights", about = "Extract research challenges for vulnerable groups")]
struct Cli {
    /// Settings file; defaults to ./insights.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// tracing filter, e.g. `debug` or `analysis_client=trace`.
    #[arg(long)]
    log_level: Option<String>,
    /// Print machine-readable JSON instead of text.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze research text. Reads stdin when neither TEXT nor --file is given.
    Analyze {
        text: Option<String>,
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Search previously extracted issues.
    Search {
        query: String,
        #[arg(long = "group")]
        groups: Vec<String>,
        #[arg(long = "category")]
        categories: Vec<String>,
    },
    /// List the available user groups and problem categories.
    Options,
    /// Check that the analysis service is up.
    Health,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        settings.api_base_url = base_url;
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        settings.request_timeout_secs = timeout_secs;
    }
    let client = AnalysisClient::connect(&settings.client_config()?)?;

    match cli.command {
        Command::Analyze {
            text,
            file,
            group,
            category,
        } => {
            let text = read_input(text, file)?;
            check_selection(&client, group.as_deref(), category.as_deref()).await;
            let group = group.unwrap_or_else(|| settings.default_group.clone());
            let category = category.unwrap_or_else(|| settings.default_category.clone());
            let completion = client.orchestrator().submit(&text, &group, &category).await;
            report(completion, cli.json)
        }
        Command::Search {
            query,
            groups,
            categories,
        } => {
            let filters = SearchFilters {
                user_group: non_empty_or(groups, &settings.default_group),
                problem_category: non_empty_or(categories, &settings.default_category),
            };
            let completion = client.orchestrator().search(&query, filters).await;
            report(completion, cli.json)
        }
        Command::Options => {
            let options = client.options().fetch_options().await;
            let source = client.options().source().await;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "groups": options.groups,
                        "categories": options.categories,
                        "source": source,
                    }))?
                );
            } else {
                print!("{}", render::render_options(&options, source));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Health => match client.health().await {
            Ok(health) => {
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&health)?);
                } else {
                    println!("analysis service status: {}", health.status);
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => {
                eprintln!("{}", err.message);
                Ok(ExitCode::FAILURE)
            }
        },
    }
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read input file '{}'", path.display()));
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read text from stdin")?;
    Ok(buf)
}

fn non_empty_or(values: Vec<String>, default: &str) -> Vec<String> {
    if values.is_empty() {
        vec![default.to_string()]
    } else {
        values
    }
}

/// Checks only selections given on the command line. Unknown values are
/// still sent; the service decides what to do with them.
async fn check_selection(client: &AnalysisClient, group: Option<&str>, category: Option<&str>) {
    if group.is_none() && category.is_none() {
        return;
    }
    let options = client.options().fetch_options().await;
    if let Some(group) = group {
        if !options.groups.iter().any(|known| known == group) {
            warn!(%group, "group is not in the known option list");
        }
    }
    if let Some(category) = category {
        if !options.categories.iter().any(|known| known == category) {
            warn!(%category, "category is not in the known option list");
        }
    }
}

fn report(completion: Completion, json: bool) -> Result<ExitCode> {
    let state = match completion {
        Completion::Applied(state) => state,
        Completion::Superseded(seq) => bail!("request {seq} was superseded before it resolved"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    }

    match state {
        RequestState::Success { issues, .. } => {
            info!(issues = issues.len(), "analysis complete");
            if !json {
                print!("{}", render::render_issues(&issues));
            }
            Ok(ExitCode::SUCCESS)
        }
        RequestState::Failed { error, .. } => {
            if !json {
                eprintln!("{}", error.message);
            }
            Ok(ExitCode::FAILURE)
        }
        RequestState::Idle | RequestState::Pending { .. } => {
            bail!("request finished without a result")
        }
    }
}
