use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::data::filter::FilterConfig;
use crate::viz::{self, ChartSpec};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Parser)]
#[command(name = "rusty-dash", version, about = "Filter a table and chart the result")]
pub struct Cli {
    /// Dataset to open at startup (.csv, .json, .parquet).
    pub file: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Columns with fewer distinct values than this are categorical.
    #[arg(long)]
    pub threshold: Option<usize>,

    /// chrono pattern used to recognise date-like text columns.
    #[arg(long)]
    pub date_format: Option<String>,
}

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    /// Dataset opened at startup; File → Open can replace it later.
    pub dataset: Option<PathBuf>,
    /// Image shown at the top of the filter panel.
    pub logo: Option<PathBuf>,
    pub filter: FilterConfig,
    pub charts: Vec<ChartSpec>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Rusty Dash: World Data".to_string(),
            dataset: None,
            logo: None,
            filter: FilterConfig::default(),
            charts: viz::default_charts(),
        }
    }
}

impl DashboardConfig {
    /// Read a JSON configuration file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Config file (if any) with command line flags layered on top.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(file) = &cli.file {
            config.dataset = Some(file.clone());
        }
        if let Some(threshold) = cli.threshold {
            config.filter.cardinality_threshold = threshold;
        }
        if let Some(fmt) = &cli.date_format {
            config.filter.date_format = fmt.clone();
        }
        Ok(config)
    }
}
