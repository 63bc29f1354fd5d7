use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pq_compliance_service::analysis::{self, AnalysisResult};
use pq_compliance_service::cleaning;
use pq_compliance_service::config::{AnalysisConfig, FileType, GapFill};
use pq_compliance_service::importers::ExcelImporter;
use pq_compliance_service::store::{report, JsonStore};

#[derive(Parser)]
#[command(name = "pq-compliance-service")]
#[command(about = "Analyze power-quality meter exports against Ecuador Regulation 009/2024", long_about = None)]
struct Cli {
    /// Path to the JSON analysis store
    #[arg(long, env = "ANALYSIS_STORE", default_value = "analyses.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one or more meter exports and store the results
    Analyze {
        /// Excel files to analyze
        files: Vec<PathBuf>,

        /// File type tag: 'tendencia', 'armonicos_potencia', 'armonicos_voltaje'
        #[arg(long, default_value = "tendencia")]
        file_type: String,

        /// Worksheet name (first sheet when omitted)
        #[arg(long)]
        sheet: Option<String>,

        /// Gap-fill strategy: 'linear_interpolation', 'forward_fill',
        /// 'backward_fill', 'remove'
        #[arg(long)]
        gap_fill: Option<String>,
    },

    /// List stored analyses
    List,

    /// Export per-category CSV reports
    Export {
        /// Output directory for the report files
        #[arg(long, default_value = "reports")]
        output_dir: PathBuf,
    },

    /// Show store statistics
    Stats,

    /// Delete one stored analysis
    Delete {
        /// Analysis id to delete
        id: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env first, so a RUST_LOG set there reaches the filter below
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pq_compliance_service=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    let store = JsonStore::new(&cli.store);
    let mut config = AnalysisConfig::from_env();

    match cli.command {
        Command::Analyze {
            files,
            file_type,
            sheet,
            gap_fill,
        } => {
            if files.is_empty() {
                return Err("no input files given".into());
            }
            if let Some(tag) = gap_fill {
                config.gap_fill = GapFill::from_tag(&tag)
                    .ok_or_else(|| format!("unknown gap-fill strategy '{tag}'"))?;
            }
            let file_type = FileType::from_tag(&file_type);
            analyze_files(&store, &config, &file_type, &files, sheet.as_deref())?;
        }
        Command::List => {
            for stored in store.get_all()? {
                println!(
                    "#{:<4} {:<30} {:<20} rows={:<6} score={:>5.1} {}",
                    stored.id,
                    stored.filename,
                    stored.file_type,
                    stored.total_measurements,
                    stored.validation_score,
                    stored.timestamp.format("%Y-%m-%d %H:%M:%S"),
                );
            }
        }
        Command::Export { output_dir } => {
            let written = report::export_reports(&store, &output_dir)?;
            for path in written {
                println!("wrote {}", path.display());
            }
        }
        Command::Stats => {
            let stats = store.statistics()?;
            println!("analyses: {}", stats.total_analyses);
            for (file_type, count) in &stats.by_type {
                println!("  {file_type}: {count}");
            }
            println!("average validation score: {}", stats.average_validation_score);
        }
        Command::Delete { id } => {
            if store.delete(id)? {
                println!("deleted analysis #{id}");
            } else {
                println!("no analysis with id #{id}");
            }
        }
    }

    Ok(())
}

fn analyze_files(
    store: &JsonStore,
    config: &AnalysisConfig,
    file_type: &FileType,
    files: &[PathBuf],
    sheet: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40} {pos}/{len} {msg}")
            .expect("valid progress template"),
    );

    for path in files {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        progress.set_message(filename.clone());

        let importer = ExcelImporter::new(path.display().to_string());
        let result = match importer.read_raw_table(sheet) {
            Ok(raw) => {
                if let Ok(validation) = importer.validate_format(sheet, file_type) {
                    for issue in &validation.issues {
                        warn!(file = %filename, issue, "format validation issue");
                    }
                }
                let cleaned = cleaning::clean(&raw, file_type, config.gap_fill);
                let mut result = analysis::analyze(&cleaned, file_type, config);
                result.filename = Some(filename.clone());
                result
            }
            // The engine contract: always a result object, error or not.
            Err(e) => {
                warn!(file = %filename, error = %e, "failed to read export");
                let mut result = AnalysisResult::load_failure(file_type.as_tag(), e.to_string());
                result.filename = Some(filename.clone());
                result
            }
        };

        let id = store.save(&filename, &result)?;
        info!(id, file = %filename, "analysis stored");
        progress.inc(1);
    }
    progress.finish_with_message("done");
    Ok(())
}
