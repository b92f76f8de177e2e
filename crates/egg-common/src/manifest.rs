use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const MANIFEST_FILE: &str = "Egg.toml";

/// The parsed Egg.toml manifest.
#[derive(Debug, Clone)]
pub struct EggManifest {
    pub project: ProjectSection,
    pub diagnostics: DiagnosticsSection,
    /// The directory containing the Egg.toml file.
    pub root_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    pub name: String,
    /// Parsed tree (JSON) analyzed when no input is given on the command line.
    #[serde(default)]
    pub entry: Option<String>,
    /// Original program text, used to render diagnostics against the source.
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticsSection {
    #[serde(default = "default_color")]
    pub color: bool,
    #[serde(default)]
    pub quiet: bool,
}

impl Default for DiagnosticsSection {
    fn default() -> Self {
        Self {
            color: default_color(),
            quiet: false,
        }
    }
}

fn default_color() -> bool {
    true
}

impl EggManifest {
    /// `project.entry` resolved against the manifest directory.
    pub fn entry_path(&self) -> Option<PathBuf> {
        self.project.entry.as_ref().map(|p| self.root_dir.join(p))
    }

    /// `project.source` resolved against the manifest directory.
    pub fn source_path(&self) -> Option<PathBuf> {
        self.project.source.as_ref().map(|p| self.root_dir.join(p))
    }
}

/// Raw TOML structure for deserialization.
#[derive(Deserialize)]
struct RawManifest {
    project: ProjectSection,
    #[serde(default)]
    diagnostics: DiagnosticsSection,
}

/// Errors that can occur when loading a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("no Egg.toml found (searched from {0})")]
    NotFound(String),
    #[error("failed to read Egg.toml: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("invalid Egg.toml: {0}")]
    ParseError(String),
    #[error("invalid Egg.toml: project name must not be empty")]
    EmptyProjectName,
}

/// Walk up from `start_dir` looking for `Egg.toml`.
/// Returns the path to the manifest file if found.
pub fn find_manifest(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let candidate = current.join(MANIFEST_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load and validate an Egg.toml manifest from a file path.
pub fn load_manifest(path: &Path) -> Result<EggManifest, ManifestError> {
    let content = std::fs::read_to_string(path)?;
    let root_dir = path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    parse_manifest(&content, root_dir)
}

/// Parse and validate an Egg.toml manifest from a string.
pub fn parse_manifest(content: &str, root_dir: PathBuf) -> Result<EggManifest, ManifestError> {
    let raw: RawManifest =
        toml::from_str(content).map_err(|e| ManifestError::ParseError(e.to_string()))?;

    if raw.project.name.trim().is_empty() {
        return Err(ManifestError::EmptyProjectName);
    }

    Ok(EggManifest {
        project: raw.project,
        diagnostics: raw.diagnostics,
        root_dir,
    })
}

/// Find and load the manifest starting from an input file's directory.
pub fn find_and_load_manifest(input_file: &Path) -> Result<EggManifest, ManifestError> {
    let start_dir = input_file.parent().unwrap_or_else(|| Path::new("."));
    let manifest_path = find_manifest(start_dir)
        .ok_or_else(|| ManifestError::NotFound(start_dir.display().to_string()))?;
    load_manifest(&manifest_path)
}
