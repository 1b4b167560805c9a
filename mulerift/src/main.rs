// mulerift/src/main.rs
//
// MuleRift — fraud ring consolidation over detector output
//
// Reads the pattern detectors' groups and the per-account score map from JSON,
// runs the ring engine and writes the result.
//
// Usage:
//   mulerift --detections detections.json --scores scores.json
//   mulerift --detections detections.json --scores scores.json --format table
//   mulerift --detections detections.json --config rings.json --output report.json
//
// detections.json: {"cycle_groups": [[..]], "smurfing_groups": [[..]], "shell_groups": [[..]]}
// scores.json:     {"ACC_1": {"score": 40.0, "patterns": ["cycle_length_3"]}, ...}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mulerift::events::load_score_map;
use mulerift::{report, BonusScope, DetectionResults, MergeStrategy, RingConfig, RingEngine, ScoreMap};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name    = "mulerift",
    about   = "Consolidate detected fraud patterns into scored fraud rings",
    version = env!("CARGO_PKG_VERSION"),
)]
struct Cli {
    #[arg(long, help = "Detector output JSON (cycle/smurfing/shell groups)")]
    detections: PathBuf,

    #[arg(long, help = "Per-account base score JSON; accounts without a score count as 0")]
    scores: Option<PathBuf>,

    #[arg(long, help = "Ring engine config JSON")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "json")]
    format: Format,

    #[arg(long, help = "Write output here instead of stdout")]
    output: Option<PathBuf>,

    #[arg(long, help = "Zero-padded width of ring numbers (overrides config)")]
    id_width: Option<usize>,

    #[arg(long, value_enum, help = "Which groups count towards the overlap bonus (overrides config)")]
    bonus_scope: Option<BonusScope>,

    #[arg(long, value_enum, help = "Overlap search strategy (overrides config)")]
    merge_strategy: Option<MergeStrategy>,
}

#[derive(Clone, ValueEnum)]
enum Format {
    Json,    // full AnalysisReport
    Table,   // markdown ring table
    Summary, // one line of counts
}

impl Cli {
    fn ring_config(&self) -> Result<RingConfig> {
        let mut cfg = match &self.config {
            Some(path) => RingConfig::from_json_file(path)?,
            None       => RingConfig::default(),
        };
        if let Some(w) = self.id_width       { cfg.id_width = w; }
        if let Some(s) = self.bonus_scope    { cfg.bonus_scope = s; }
        if let Some(m) = self.merge_strategy { cfg.merge_strategy = m; }
        Ok(cfg)
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    // stdout carries the report; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env()
            .add_directive("mulerift=info".parse()?))
        .with_writer(std::io::stderr)
        .compact().init();

    let cli = Cli::parse();

    let engine = RingEngine::new(cli.ring_config()?).context("ring engine config")?;
    let cfg = engine.config();
    info!(
        "merge={:?} bonus_scope={:?} ids={}_{}",
        cfg.merge_strategy,
        cfg.bonus_scope,
        cfg.id_prefix,
        "0".repeat(cfg.id_width)
    );

    let detections = DetectionResults::from_json_file(&cli.detections)
        .with_context(|| format!("loading detections from {}", cli.detections.display()))?;
    let scores = match &cli.scores {
        Some(path) => load_score_map(path)
            .with_context(|| format!("loading scores from {}", path.display()))?,
        None => ScoreMap::new(),
    };
    info!(
        "loaded {} cycle / {} smurfing / {} shell groups, {} scored accounts",
        detections.cycle_groups.len(),
        detections.smurfing_groups.len(),
        detections.shell_groups.len(),
        scores.len()
    );

    let analysis = engine.analyze(&detections, &scores)?;

    let rendered = match cli.format {
        Format::Json    => report::to_json(&analysis)? + "\n",
        Format::Table   => report::to_markdown(&analysis),
        Format::Summary => report::summary_line(&analysis) + "\n",
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("wrote {} rings to {}", analysis.fraud_rings.len(), path.display());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}
