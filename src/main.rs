//! CLI entry point for the student insights dashboard.
//!
//! Provides subcommands for loading a student CSV from a file or URL and
//! printing summary stats, chart series, AI insights and search results, and
//! for querying the analytics backend.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use student_insights::{
    analyzers::compute_summary_stats,
    config::Settings,
    infra::{backend::BackendClient, summary_provider},
    ingest::load_source,
    markdown,
    output::{append_record, print_json, print_pretty, render_search_results, render_series, render_stats, render_view, to_json},
    record::{Schema, StudentRecord},
    services::{
        dashboard_api::{DashboardApi, DateRange, PredictionInput},
        summary::summarize_or_message,
    },
    session::Session,
    stats::StatsRow,
    view::{DashboardView, Page, Series},
};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "student_insights")]
#[command(about = "Learning analytics over student CSV exports", long_about = None)]
struct Cli {
    /// Column layout of the input CSV (overrides the settings file)
    #[arg(long, global = true, value_enum)]
    schema: Option<Schema>,

    /// JSON settings file (defaults to $DASHBOARD_CONFIG when set)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print headline statistics for a CSV file or URL
    Summary {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// CSV file to append a stats row to
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Print the chart series of a dashboard page
    Charts {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        #[arg(short, long, value_enum, default_value_t = Page::Overview)]
        page: Page,

        /// Emit the view as JSON instead of text tables
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Ask the configured AI provider for a summary of the data
    Insights {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,
    },
    /// Case-insensitive search over student text fields
    Search {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        term: String,
    },
    /// Fetch a dashboard page from the analytics backend
    Fetch {
        #[arg(long)]
        start_date: Option<NaiveDate>,

        #[arg(long)]
        end_date: Option<NaiveDate>,

        #[arg(short, long, value_enum, default_value_t = Page::Overview)]
        page: Page,
    },
    /// Ask the backend for a completion likelihood
    Predict {
        #[arg(long)]
        hours_watched: f64,

        #[arg(long)]
        average_score: f64,

        #[arg(long)]
        activity_level: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/student_insights.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("student_insights.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .or_else(|| std::env::var_os("DASHBOARD_CONFIG").map(PathBuf::from));
    let mut settings =
        Settings::resolve(config_path.as_deref()).context("Failed to load settings")?;
    if let Some(schema) = cli.schema {
        settings.schema = schema;
    }
    match cli.command {
        Commands::Summary { source, history } => {
            let records = load(&source, &settings).await?;
            let stats = compute_summary_stats(&records, &settings.policy);
            print_json(&stats)?;
            print!("{}", render_stats(&stats));

            if let Some(path) = history {
                append_record(&path, &StatsRow::new(&source, &stats))?;
                info!(path = %path.display(), "Stats appended to history");
            }
        }
        Commands::Charts { source, page, json } => {
            let records = load(&source, &settings).await?;
            let view = DashboardView::build(page, &records, &settings.policy, &settings.bin_spec()?);
            print_pretty(&view);
            if json {
                println!("{}", to_json(&view)?);
            } else {
                print!("{}", render_view(&view));
            }
        }
        Commands::Insights { source } => {
            let provider = summary_provider(&settings);
            let mut session = Session::new();

            let ticket = session.begin();
            let records = load(&source, &settings).await?;
            session.apply_records(ticket, records);

            print!("{}", render_stats(&compute_summary_stats(session.records(), &settings.policy)));

            let text = summarize_or_message(provider.as_ref(), session.records()).await;
            if session.apply_insights(ticket, text) {
                if let Some(text) = session.insights() {
                    println!();
                    print!("{}", markdown::parse(text));
                }
            }
        }
        Commands::Search { source, term } => {
            let records = load(&source, &settings).await?;
            let mut session = Session::new();
            let ticket = session.begin();
            session.apply_records(ticket, records);

            let results = session.search(&term);
            if results.is_empty() {
                warn!(term = %term, "No matching students");
            }
            print!("{}", render_search_results(&results));
        }
        Commands::Fetch {
            start_date,
            end_date,
            page,
        } => {
            let client = BackendClient::new(&settings.backend_url);
            fetch_page(&client, &settings, page, DateRange { start: start_date, end: end_date }).await?;
        }
        Commands::Predict {
            hours_watched,
            average_score,
            activity_level,
        } => {
            let client = BackendClient::new(&settings.backend_url);
            let likelihood = client
                .predict(PredictionInput {
                    hours_watched,
                    average_score,
                    activity_level,
                })
                .await?;
            println!("Completion likelihood: {:.1}%", likelihood * 100.0);
        }
    }

    Ok(())
}

async fn load(source: &str, settings: &Settings) -> Result<Vec<StudentRecord>> {
    load_source(source, settings.schema, &settings.policy)
        .await
        .with_context(|| format!("Failed to load student data from {source}"))
}

/// Prints one backend dashboard page.
#[tracing::instrument(skip(api, settings))]
async fn fetch_page<A: DashboardApi>(
    api: &A,
    settings: &Settings,
    page: Page,
    range: DateRange,
) -> Result<()> {
    match page {
        Page::Overview => {
            let data = api.dashboard_data(range).await?;
            let stats = data.stats.clone();
            let records = data.into_records(&settings.policy);
            info!(students = records.len(), "Dashboard data fetched");

            let view = DashboardView::build(Page::Overview, &records, &settings.policy, &settings.bin_spec()?);
            print!("{}", render_stats(&stats));
            for chart in &view.charts {
                println!();
                print!("{}", render_series(chart.title, &chart.series));
            }
        }
        Page::Scores => {
            let data = api.scores_data().await?;
            print!("{}", render_series("Score Distribution", &Series::Counts(data.distribution())));
            println!();
            print!(
                "{}",
                render_series("Average Score by Test Preparation", &Series::Averages(data.by_test_prep()))
            );
        }
        Page::Dropouts => {
            let data = api.dropouts_data().await?;
            print!(
                "{}",
                render_series("Dropout Rate (%) by Parental Education", &Series::Averages(data.by_education()))
            );
            println!();
            print!("{}", render_series("Dropout Rate (%) by Gender", &Series::Averages(data.by_gender())));
        }
        Page::Trends => {
            let data = api.trends_data().await?;
            print!(
                "{}",
                render_series(
                    "Completion Rate (%) by Parental Education",
                    &Series::Averages(data.completion_by_education())
                )
            );
            println!();
            print!("{}", render_series("Average Scores by Subject", &Series::Averages(data.by_subject())));
        }
    }
    Ok(())
}
