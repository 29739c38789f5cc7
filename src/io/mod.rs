// src/io/mod.rs
//
// File boundary: profile documents in, simulation reports out.
//
// - Profile documents are YAML unless the path ends in `.json`.
// - Reports are written atomically (temp file in the same directory, then
//   rename) as JSON, YAML, or the fixed-width text digest.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::SimulationParameters;
use crate::profile::Profile;
use crate::report::render_text;
use crate::simulate::SimulationReport;

/// Root of a profile file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub profile: Profile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_parameters: Option<SimulationParameters>,
}

impl ProfileDocument {
    pub fn parameters(&self) -> SimulationParameters {
        self.simulation_parameters.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Text,
}

impl OutputFormat {
    /// Guess from a file extension; JSON when unknown.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => OutputFormat::Yaml,
            Some("txt") => OutputFormat::Text,
            _ => OutputFormat::Json,
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

pub fn parse_profile_yaml(text: &str) -> Result<ProfileDocument> {
    serde_yaml::from_str(text).context("Failed to parse profile document as YAML")
}

pub fn parse_profile_json(text: &str) -> Result<ProfileDocument> {
    serde_json::from_str(text).context("Failed to parse profile document as JSON")
}

pub fn load_profile_document(path: &Path) -> Result<ProfileDocument> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile: {}", path.display()))?;
    let doc = if is_json(path) {
        parse_profile_json(&text)
    } else {
        parse_profile_yaml(&text)
    };
    doc.with_context(|| format!("Invalid profile document: {}", path.display()))
}

pub fn render_report(report: &SimulationReport, format: OutputFormat) -> Result<String> {
    let text = match format {
        OutputFormat::Json => {
            let mut s = serde_json::to_string_pretty(report)
                .context("Failed to serialize report as JSON")?;
            s.push('\n');
            s
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(report).context("Failed to serialize report as YAML")?
        }
        OutputFormat::Text => render_text(report),
    };
    Ok(text)
}

pub fn write_report(path: &Path, report: &SimulationReport, format: OutputFormat) -> Result<()> {
    let text = render_report(report, format)?;
    atomic_write(path, text.as_bytes())
}

/// Write `data` to `path` via a temp file in the same directory and a rename.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

    // Dropping the temp file on any error path removes it.
    let mut file = tempfile::Builder::new()
        .prefix(".tmp_")
        .tempfile_in(parent)
        .with_context(|| format!("Failed to create temp file in: {}", parent.display()))?;
    file.write_all(data)
        .with_context(|| format!("Failed to write temp file: {}", file.path().display()))?;
    file.as_file()
        .sync_all()
        .with_context(|| format!("Failed to sync temp file: {}", file.path().display()))?;

    file.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to rename temp file to {}", path.display()))?;
    Ok(())
}
