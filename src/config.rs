use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ExtractionError;

/// Explicit, cloneable run configuration. Never read from global state -- a
/// caller threads this through to every pipeline invocation itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub year_min: i32,
    pub year_max: i32,
    pub preserve_original_casing: bool,
    pub allow_word_separators: bool,
    pub ascii_only_slug: bool,
    /// Resolves the acronym-after-anchor open question (SPEC_FULL.md §9): stop the
    /// keyword run at the first unrecognized all-caps token rather than skipping past it.
    pub stop_at_acronym: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            year_min: 2020,
            year_max: 2040,
            preserve_original_casing: true,
            allow_word_separators: true,
            ascii_only_slug: true,
            stop_at_acronym: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    extraction: ExtractionConfig,
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<(), ExtractionError> {
        if self.year_min > self.year_max {
            return Err(ExtractionError::ConfigInvalid(format!(
                "year_min ({}) must not exceed year_max ({})",
                self.year_min, self.year_max
            )));
        }
        Ok(())
    }

    /// Loads a `[extraction]` table from a TOML file, falling back to
    /// `Default::default()` field-by-field for anything the file omits.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<ExtractionConfig, ExtractionError> {
        let text = fs::read_to_string(path.as_ref())
            .map_err(|e| ExtractionError::Io(format!("{}: {}", path.as_ref().display(), e)))?;

        let parsed: ConfigFile = toml::from_str(&text).map_err(|e| {
            ExtractionError::ConfigInvalid(format!(
                "failed to parse {} as TOML: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        parsed.extraction.validate()?;
        Ok(parsed.extraction)
    }
}
