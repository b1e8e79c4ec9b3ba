use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::ExtractionError;

/// The closed set of pattern kinds a `PatternLibrary` may hold, per SPEC_FULL.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    MarketTerm,
    DatePattern,
    ReportKeywordPrimary,
    ReportKeywordSecondary,
    ReportSeparator,
    GeographicEntity,
    GeographicAlias,
}

/// Format-type tag, overloaded across date patterns and report-keyword patterns
/// the same way the underlying spec overloads it -- the `kind` field disambiguates
/// which half of this enum is meaningful for a given record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatType {
    Terminal,
    Range,
    Bracket,
    Embedded,
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub term: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub regex: Option<String>,
    pub priority: i32,
    #[serde(default)]
    pub format_type: Option<FormatType>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Pattern {
    /// Compiles this pattern's match expression: the explicit `regex` when
    /// present, otherwise a whole-word literal built from `term` via
    /// `literal_regex` (§3's case-folding rule).
    pub fn compile(&self) -> Result<Regex, ExtractionError> {
        let result = match &self.regex {
            Some(explicit) => Regex::new(explicit),
            None => literal_regex(&self.term),
        };
        result.map_err(|e| {
            ExtractionError::PatternLibraryInvalid(format!(
                "pattern for ({:?}, {:?}) failed to compile: {}",
                self.kind, self.term, e
            ))
        })
    }
}

/// Whole-word literal match for `literal`, case-insensitive unless the literal
/// is an acronym (every alphabetic character uppercase, e.g. "US", "APAC") --
/// those stay anchored to their exact casing so a bare lowercase "us" never
/// matches the region, while mixed-case terms like "North America" still match
/// "north america" (§3, §4.4 false-positive avoidance).
pub fn literal_regex(literal: &str) -> Result<Regex, regex::Error> {
    let escaped = regex::escape(literal);
    let is_acronym = literal.chars().any(|c| c.is_alphabetic())
        && literal.chars().filter(|c| c.is_alphabetic()).all(|c| c.is_uppercase());
    if is_acronym {
        Regex::new(&format!(r"\b{}\b", escaped))
    } else {
        Regex::new(&format!(r"(?i)\b{}\b", escaped))
    }
}

/// Read-only contract the five pipeline stages consume patterns through.
/// Implementations are never mutated during a run (SPEC_FULL.md §5).
pub trait PatternLibrary {
    /// Active patterns of `kind`, sorted ascending by `priority`, then descending
    /// by `term` length (compound-first). Always total and infallible.
    fn patterns_of(&self, kind: PatternKind) -> &[Pattern];
}

fn sort_key(p: &Pattern) -> (i32, std::cmp::Reverse<usize>) {
    (p.priority, std::cmp::Reverse(p.term.len()))
}

fn validate_records(records: &[Pattern]) -> Result<(), ExtractionError> {
    let mut seen: HashSet<(PatternKind, String)> = HashSet::new();

    for record in records {
        if !record.active {
            continue;
        }

        if record.term.trim().is_empty() {
            return Err(ExtractionError::PatternLibraryInvalid(format!(
                "pattern of kind {:?} has an empty term",
                record.kind
            )));
        }

        let key = (record.kind, record.term.to_lowercase());
        if !seen.insert(key) {
            return Err(ExtractionError::PatternLibraryInvalid(format!(
                "duplicate (kind, term) pair: ({:?}, {:?})",
                record.kind, record.term
            )));
        }

        // Compiling here surfaces a malformed `regex` field at load time, rather
        // than on first use deep inside a stage.
        record.compile()?;
    }

    Ok(())
}

fn bucket(records: Vec<Pattern>) -> Result<HashMap<PatternKind, Vec<Pattern>>, ExtractionError> {
    validate_records(&records)?;

    let mut buckets: HashMap<PatternKind, Vec<Pattern>> = HashMap::new();
    for record in records.into_iter().filter(|p| p.active) {
        buckets.entry(record.kind).or_insert_with(Vec::new).push(record);
    }
    for entries in buckets.values_mut() {
        entries.sort_by_key(sort_key);
    }
    Ok(buckets)
}

/// Reference implementation backed by a `Vec<Pattern>` assembled in memory --
/// used directly by embedded callers and by the test suite.
pub struct InMemoryPatternLibrary {
    buckets: HashMap<PatternKind, Vec<Pattern>>,
    empty: Vec<Pattern>,
}

impl InMemoryPatternLibrary {
    pub fn new(records: Vec<Pattern>) -> Result<InMemoryPatternLibrary, ExtractionError> {
        Ok(InMemoryPatternLibrary {
            buckets: bucket(records)?,
            empty: Vec::new(),
        })
    }
}

impl PatternLibrary for InMemoryPatternLibrary {
    fn patterns_of(&self, kind: PatternKind) -> &[Pattern] {
        self.buckets.get(&kind).unwrap_or(&self.empty)
    }
}

#[derive(Debug, Deserialize)]
struct PatternDocument {
    #[serde(rename = "pattern", default)]
    patterns: Vec<Pattern>,
}

/// Loads a flat `patterns.toml` document (an array of `[[pattern]]` tables) the
/// same way this codebase's other configuration is loaded elsewhere:
/// `fs::read_to_string` followed by `toml::from_str`.
pub struct TomlPatternLibrary {
    inner: InMemoryPatternLibrary,
}

impl TomlPatternLibrary {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<TomlPatternLibrary, ExtractionError> {
        let text = fs::read_to_string(path.as_ref())
            .map_err(|e| ExtractionError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_str(&text)
    }

    pub fn from_str(text: &str) -> Result<TomlPatternLibrary, ExtractionError> {
        let document: PatternDocument = toml::from_str(text).map_err(|e| {
            ExtractionError::PatternLibraryInvalid(format!("failed to parse pattern document: {}", e))
        })?;

        Ok(TomlPatternLibrary {
            inner: InMemoryPatternLibrary::new(document.patterns)?,
        })
    }
}

impl PatternLibrary for TomlPatternLibrary {
    fn patterns_of(&self, kind: PatternKind) -> &[Pattern] {
        self.inner.patterns_of(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(kind: PatternKind, term: &str, priority: i32) -> Pattern {
        Pattern {
            kind,
            term: term.to_owned(),
            aliases: Vec::new(),
            regex: None,
            priority,
            format_type: None,
            active: true,
        }
    }

    #[test]
    fn sorts_compound_before_component() {
        let records = vec![
            pattern(PatternKind::GeographicEntity, "America", 5),
            pattern(PatternKind::GeographicEntity, "North America", 1),
        ];
        let library = InMemoryPatternLibrary::new(records).unwrap();
        let regions = library.patterns_of(PatternKind::GeographicEntity);
        assert_eq!(regions[0].term, "North America");
        assert_eq!(regions[1].term, "America");
    }

    #[test]
    fn rejects_duplicate_kind_term_pairs() {
        let records = vec![
            pattern(PatternKind::ReportSeparator, "&", 1),
            pattern(PatternKind::ReportSeparator, "&", 2),
        ];
        assert!(InMemoryPatternLibrary::new(records).is_err());
    }

    #[test]
    fn rejects_empty_term() {
        let records = vec![pattern(PatternKind::ReportSeparator, "   ", 1)];
        assert!(InMemoryPatternLibrary::new(records).is_err());
    }

    #[test]
    fn inactive_patterns_are_invisible_to_lookups() {
        let mut inactive = pattern(PatternKind::ReportKeywordSecondary, "industy", 10);
        inactive.active = false;
        let library = InMemoryPatternLibrary::new(vec![inactive]).unwrap();
        assert!(library.patterns_of(PatternKind::ReportKeywordSecondary).is_empty());
    }

    #[test]
    fn empty_lookup_is_valid_not_an_error() {
        let library = InMemoryPatternLibrary::new(Vec::new()).unwrap();
        assert!(library.patterns_of(PatternKind::GeographicAlias).is_empty());
    }

    #[test]
    fn acronym_terms_match_case_sensitively() {
        let regex = literal_regex("US").unwrap();
        assert!(regex.is_match("US Market"));
        assert!(!regex.is_match("the bus market"));
        assert!(!regex.is_match("USB Market")); // word boundary, not casing
    }

    #[test]
    fn mixed_case_terms_match_case_insensitively() {
        let regex = literal_regex("North America").unwrap();
        assert!(regex.is_match("north america widgets"));
    }

    #[test]
    fn loads_from_toml_document() {
        let text = r#"
            [[pattern]]
            kind = "report_keyword_primary"
            term = "Market"
            priority = 1

            [[pattern]]
            kind = "report_keyword_secondary"
            term = "industy"
            priority = 50
        "#;
        let library = TomlPatternLibrary::from_str(text).unwrap();
        assert_eq!(library.patterns_of(PatternKind::ReportKeywordPrimary).len(), 1);
        assert_eq!(library.patterns_of(PatternKind::ReportKeywordSecondary)[0].term, "industy");
    }
}
