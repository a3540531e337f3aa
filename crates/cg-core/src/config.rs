use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::TileError;

/// Thème utilisé quand ni la config ni la CLI n'en précisent un.
pub const DEFAULT_THEME: &str = "light";

/// Default output file name.
pub const DEFAULT_OUTPUT: &str = "contribution.gif";

/// Default directory holding `<theme>/<step>.png`.
pub const DEFAULT_THEMES_DIR: &str = "themes";

/// Upper bound on render workers.
pub const MAX_WORKERS: usize = 256;

/// Run configuration. Sérialisable en TOML, chaque champ a une valeur par défaut.
///
/// # Example
/// ```
/// use cg_core::config::TileConfig;
/// let config = TileConfig::default();
/// assert_eq!(config.theme, "light");
/// assert_eq!(config.workers, 0);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TileConfig {
    /// Theme name, a sub-directory of `themes_dir`.
    pub theme: String,
    /// Directory containing the themes.
    pub themes_dir: PathBuf,
    /// Output GIF path.
    pub output: PathBuf,
    /// Render workers. 0 = available parallelism.
    pub workers: usize,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            themes_dir: PathBuf::from(DEFAULT_THEMES_DIR),
            output: PathBuf::from(DEFAULT_OUTPUT),
            workers: 0,
        }
    }
}

impl TileConfig {
    /// Worker count with `0` resolved to the machine's available parallelism.
    #[must_use]
    pub fn resolved_workers(&self) -> usize {
        if self.workers == 0 {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        } else {
            self.workers
        }
    }

    /// Clamp numeric fields and reject unusable values.
    ///
    /// # Errors
    /// Returns [`TileError::Config`] if the theme name is empty or would
    /// escape the themes directory.
    pub fn validate(&mut self) -> Result<(), TileError> {
        if self.workers > MAX_WORKERS {
            log::warn!("workers={} clamped to {MAX_WORKERS}", self.workers);
            self.workers = MAX_WORKERS;
        }
        if self.theme.trim().is_empty() {
            return Err(TileError::Config("theme name is empty".into()));
        }
        if self.theme.contains(['/', '\\']) || self.theme == ".." {
            return Err(TileError::Config(format!(
                "theme name '{}' must not contain path separators",
                self.theme
            )));
        }
        if self.output.as_os_str().is_empty() {
            return Err(TileError::Config("output path is empty".into()));
        }
        Ok(())
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    render: Option<RenderSection>,
}

/// Render section, all fields optional for partial override.
#[derive(Deserialize)]
struct RenderSection {
    theme: Option<String>,
    themes_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    workers: Option<usize>,
}

/// Parse TOML text and merge it over the defaults.
///
/// # Errors
/// Returns an error if the text is not valid TOML or fails validation.
///
/// # Example
/// ```
/// use cg_core::config::parse_config;
/// let config = parse_config("[render]\ntheme = \"dark\"\n").unwrap();
/// assert_eq!(config.theme, "dark");
/// assert_eq!(config.output.to_str(), Some("contribution.gif"));
/// ```
pub fn parse_config(content: &str) -> Result<TileConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = TileConfig::default();
    if let Some(r) = file.render {
        if let Some(v) = r.theme {
            config.theme = v;
        }
        if let Some(v) = r.themes_dir {
            config.themes_dir = v;
        }
        if let Some(v) = r.output {
            config.output = v;
        }
        if let Some(v) = r.workers {
            config.workers = v;
        }
    }

    config.validate()?;
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use cg_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<TileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Config invalide : {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(parse_config("").unwrap(), TileConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = parse_config("[render]\nworkers = 3\noutput = \"out.gif\"\n").unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.output, PathBuf::from("out.gif"));
        assert_eq!(config.theme, DEFAULT_THEME);
        assert_eq!(config.themes_dir, PathBuf::from(DEFAULT_THEMES_DIR));
    }

    #[test]
    fn workers_are_clamped() {
        let config = parse_config("[render]\nworkers = 100000\n").unwrap();
        assert_eq!(config.workers, MAX_WORKERS);
    }

    #[test]
    fn theme_with_separator_is_rejected() {
        assert!(parse_config("[render]\ntheme = \"../etc\"\n").is_err());
        assert!(parse_config("[render]\ntheme = \"\"\n").is_err());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(parse_config("[render\ntheme = 1").is_err());
    }

    #[test]
    fn resolved_workers_is_positive() {
        assert!(TileConfig::default().resolved_workers() >= 1);
        let config = TileConfig {
            workers: 7,
            ..TileConfig::default()
        };
        assert_eq!(config.resolved_workers(), 7);
    }

    #[test]
    fn load_config_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[render]\ntheme = \"dark\"").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.theme, "dark");
    }

    #[test]
    fn load_config_missing_file_errors() {
        assert!(load_config(Path::new("/definitely/not/here.toml")).is_err());
    }
}
