use analysis::{AnalysisConfig, AnalysisMode, AnalysisResult, Analyzer, NominatimGeocoder};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use extract::{GazetteerTagger, Tagger};
use ingest::FileReader;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "entity-graph")]
#[command(version, about = "Build an entity co-occurrence graph from text", long_about = None)]
struct Args {
    /// A .txt/.md file, or a directory of them
    path: PathBuf,

    /// Write entity_graph_<uuid>.json artifacts here
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// JSON configuration file; missing fields come from the preset its `mode` names
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON gazetteer `{ "TYPE": ["name", ...] }` replacing the bundled one
    #[arg(short, long)]
    gazetteer: Option<PathBuf>,

    /// Configuration preset, ignored when --config is given
    #[arg(long, value_enum, default_value_t = Preset::Balanced)]
    preset: Preset,

    /// Check LOC/GPE entities against the geocoding service
    #[arg(long)]
    verify_locations: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
enum Preset {
    Strict,
    Balanced,
    Lenient,
}

impl From<Preset> for AnalysisMode {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Strict => AnalysisMode::Strict,
            Preset::Balanced => AnalysisMode::Balanced,
            Preset::Lenient => AnalysisMode::Lenient,
        }
    }
}

#[derive(Serialize)]
struct DocumentReport {
    source: String,
    result: AnalysisResult,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the report
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::for_mode(args.preset.into()),
    };
    if args.verify_locations {
        config.geocoding.enabled = true;
    }
    Ok(config)
}

fn load_tagger(gazetteer: Option<&Path>) -> Result<Arc<dyn Tagger>> {
    let tagger = match gazetteer {
        Some(path) => GazetteerTagger::from_json_file(path)?,
        None => GazetteerTagger::greek_metal_scene(),
    };
    info!(names = tagger.len(), "gazetteer loaded");
    Ok(Arc::new(tagger))
}

async fn read_inputs(path: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    if path.is_dir() {
        FileReader::read_directory(path).await
    } else {
        let content = FileReader::read_file(path).await?;
        Ok(vec![(path.to_string_lossy().to_string(), content)])
    }
}

/// Location checks, when enabled, run before the artifact is written.
async fn analyze_document(
    analyzer: &Analyzer,
    bytes: &[u8],
    output_dir: Option<&Path>,
    geocoder: Option<&NominatimGeocoder>,
    timeout: Duration,
) -> analysis::Result<AnalysisResult> {
    match geocoder {
        Some(geocoder) => {
            let text = std::str::from_utf8(bytes)?;
            analyzer
                .analyze_with_locations(text, output_dir, geocoder, timeout)
                .await
        }
        None => analyzer.analyze_bytes(bytes, output_dir),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let config = load_config(&args)?;
    let analyzer = Analyzer::new(load_tagger(args.gazetteer.as_deref())?, &config);
    let geocoder = config
        .geocoding
        .enabled
        .then(|| NominatimGeocoder::from_config(&config.geocoding));
    let timeout = Duration::from_secs(config.geocoding.timeout_secs);

    let inputs = read_inputs(&args.path).await?;
    info!(documents = inputs.len(), mode = ?config.mode, "starting analysis");

    let mut reports = Vec::new();
    for (source, bytes) in inputs {
        let result = match analyze_document(
            &analyzer,
            &bytes,
            args.output_dir.as_deref(),
            geocoder.as_ref(),
            timeout,
        )
        .await
        {
            Ok(result) => result,
            Err(e) => {
                error!(source = %source, error = %e, "analysis failed, skipping document");
                continue;
            }
        };
        reports.push(DocumentReport { source, result });
    }

    let json = if args.path.is_dir() {
        serde_json::to_string_pretty(&reports)
    } else {
        match reports.first() {
            Some(report) => serde_json::to_string_pretty(&report.result),
            None => anyhow::bail!("Analysis failed for {:?}", args.path),
        }
    }
    .context("Failed to serialize analysis report")?;

    println!("{}", json);
    Ok(())
}
