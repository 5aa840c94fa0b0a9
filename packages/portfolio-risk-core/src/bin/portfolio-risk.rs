//! Portfolio Risk CLI - price normalization and risk analysis from the command line.
//!
//! Reads a raw price table (JSON) and prints a JSON envelope on stdout.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use portfolio_risk_core::{
    analyze, price_view, AnalysisConfig, AnalysisRequest, ApiResponse, JsonFileSource,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "portfolio-risk")]
#[command(about = "Portfolio risk CLI - canonical prices, statistics and Value-at-Risk")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command.
#[derive(clap::Args)]
struct Selection {
    /// Raw price table (JSON)
    #[arg(short, long)]
    data: PathBuf,
    /// Instrument identifiers (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    tickers: Vec<String>,
    /// First day of the range (YYYY-MM-DD, inclusive)
    #[arg(short, long)]
    start: NaiveDate,
    /// Last day of the range (YYYY-MM-DD, exclusive)
    #[arg(short, long)]
    end: NaiveDate,
}

impl Selection {
    fn request(&self) -> AnalysisRequest {
        AnalysisRequest::new(self.tickers.clone(), self.start, self.end)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the canonical price matrix (gaps filled for display)
    Prices {
        #[command(flatten)]
        selection: Selection,
    },
    /// Compute portfolio statistics and risk metrics
    Analyze {
        #[command(flatten)]
        selection: Selection,
        /// Portfolio weights (comma-separated, equal weight if omitted)
        #[arg(short, long, value_delimiter = ',')]
        weights: Option<Vec<f64>>,
        /// Confidence level for VaR (0.95 = 95%)
        #[arg(long)]
        confidence: Option<f64>,
        /// VaR horizon in trading days
        #[arg(long)]
        horizon: Option<u32>,
        /// Annual risk-free rate for the Sharpe ratio
        #[arg(long)]
        risk_free: Option<f64>,
        /// Configuration file (defaults to the platform config directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let (output, ok) = match cli.command {
        Commands::Prices { selection } => handle_prices(selection),
        Commands::Analyze {
            selection,
            weights,
            confidence,
            horizon,
            risk_free,
            config,
        } => handle_analyze(selection, weights, confidence, horizon, risk_free, config),
    };

    println!("{}", output);
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn render<T: Serialize>(response: &ApiResponse<T>) -> String {
    serde_json::to_string_pretty(response).unwrap_or_else(|e| {
        format!(
            "{{\"ok\":false,\"error\":\"failed to encode response: {}\"}}",
            e
        )
    })
}

fn respond<T: Serialize>(result: portfolio_risk_core::Result<T>) -> (String, bool) {
    match result {
        Ok(data) => (render(&ApiResponse::ok(data)), true),
        Err(e) => {
            tracing::error!("{}", e);
            (render(&ApiResponse::<()>::err(e.to_string())), false)
        }
    }
}

fn handle_prices(selection: Selection) -> (String, bool) {
    let source = JsonFileSource::new(&selection.data);
    respond(price_view(&source, &selection.request()))
}

fn handle_analyze(
    selection: Selection,
    weights: Option<Vec<f64>>,
    confidence: Option<f64>,
    horizon: Option<u32>,
    risk_free: Option<f64>,
    config_path: Option<PathBuf>,
) -> (String, bool) {
    let config = match config_path {
        Some(path) => AnalysisConfig::load_from_path(&path),
        None => AnalysisConfig::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => return respond::<()>(Err(e)),
    };

    let mut request = selection.request();
    request.weights = weights;
    request.confidence = confidence;
    request.horizon_days = horizon;
    request.risk_free_rate = risk_free;

    let source = JsonFileSource::new(&selection.data);
    respond(analyze(&source, &request, &config))
}
