//! services/api/src/bin/analyze.rs
//!
//! Single-process variant: analyzes one local recording without starting the server
//! and writes the PDF report to the reports directory.

use bytes::Bytes;
use clap::Parser;
use nutrifit_api::{build_analysis_service, config::Config, error::ApiError};
use nutrifit_core::{AnalysisError, AudioUpload, PdfOutcome};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "analyze",
    about = "Analyze a recorded dietician call into a NutriFit health report"
)]
struct Args {
    /// The recording to analyze (mp3, wav or m4a).
    file: PathBuf,

    /// MIME type to declare to the model. Inferred from the extension when omitted.
    #[arg(long)]
    mime_type: Option<String>,

    /// Where to write the PDF report. Overrides `REPORTS_DIR`.
    #[arg(long)]
    reports_dir: Option<PathBuf>,

    /// Skip JSON extraction and render the model's answer verbatim.
    #[arg(long)]
    raw: bool,
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "m4a" => Some("audio/mp4"),
        _ => None,
    }
}

fn print_pdf(pdf: &PdfOutcome) {
    match pdf {
        PdfOutcome::Ready(generated) => println!("PDF report: {}", generated.path.display()),
        PdfOutcome::Failed { reason } => eprintln!("PDF report unavailable: {}", reason),
    }
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(dir) = args.reports_dir.clone() {
        config.reports_dir = dir;
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with_writer(std::io::stderr)
        .init();

    let mime_type = match args.mime_type.clone() {
        Some(mime_type) => mime_type,
        None => mime_for_path(&args.file)
            .map(str::to_string)
            .ok_or_else(|| {
                ApiError::Internal(format!(
                    "cannot infer the audio type of {}; pass --mime-type",
                    args.file.display()
                ))
            })?,
    };

    let data = tokio::fs::read(&args.file).await?;
    let upload = AudioUpload {
        file_name: args
            .file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        mime_type,
        data: Bytes::from(data),
    };

    let (analysis, _) = build_analysis_service(&config)?;
    info!(file = %args.file.display(), "Analyzing audio, please wait");

    if args.raw {
        let raw = analysis.analyze_raw(&upload).await?;
        println!("{}", raw.text);
        print_pdf(&raw.pdf);
        return Ok(());
    }

    match analysis.analyze(&upload).await {
        Ok(outcome) => {
            let json = serde_json::to_string_pretty(&outcome.report)
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            println!("{}", json);
            if !outcome.remainder.is_empty() {
                println!("\n{}", outcome.remainder);
            }
            print_pdf(&outcome.pdf);
            Ok(())
        }
        Err(AnalysisError::NoJson { raw_text }) => {
            eprintln!("No JSON report found; the model answered:\n{}", raw_text);
            Err(ApiError::Analysis(AnalysisError::NoJson { raw_text }))
        }
        Err(e) => Err(e.into()),
    }
}
