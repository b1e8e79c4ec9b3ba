//! Optional `PostgresPatternLibrary` backend (SPEC_FULL.md §9.1), gated behind
//! the `postgres-library` feature. Loads the full pattern set once at startup
//! with a single `SELECT`, validates it exactly the way `TomlPatternLibrary`
//! validates a parsed document, and then behaves as an ordinary read-only
//! in-memory snapshot for the remainder of the run -- a caller never holds a
//! database handle open once `PostgresPatternLibrary::connect` returns.

use postgres::{Client, NoTls};

use crate::error::ExtractionError;
use crate::pattern::{FormatType, InMemoryPatternLibrary, Pattern, PatternKind, PatternLibrary};

pub struct PostgresPatternLibrary {
    inner: InMemoryPatternLibrary,
}

impl PostgresPatternLibrary {
    /// Connects with `connection_string` (a libpq-style DSN), loads every row
    /// of `pattern_library` in one query, and buckets/validates it the same
    /// way the TOML loader does. The connection is dropped before this
    /// function returns -- nothing here is held open across titles.
    pub fn connect(connection_string: &str) -> Result<PostgresPatternLibrary, ExtractionError> {
        let mut client = Client::connect(connection_string, NoTls)
            .map_err(|e| ExtractionError::Io(format!("postgres connect failed: {}", e)))?;
        Self::load_from_client(&mut client)
    }

    fn load_from_client(client: &mut Client) -> Result<PostgresPatternLibrary, ExtractionError> {
        let rows = client
            .query(
                "SELECT kind, term, aliases, regex, priority, format_type, active FROM pattern_library",
                &[],
            )
            .map_err(|e| ExtractionError::PatternLibraryInvalid(format!("pattern_library query failed: {}", e)))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let kind_text: String = row.get("kind");
            let kind = parse_kind(&kind_text)?;

            let format_type_text: Option<String> = row.get("format_type");
            let format_type = format_type_text.as_deref().map(parse_format_type).transpose()?;

            records.push(Pattern {
                kind,
                term: row.get("term"),
                aliases: row.get::<_, Option<Vec<String>>>("aliases").unwrap_or_default(),
                regex: row.get("regex"),
                priority: row.get("priority"),
                format_type,
                active: row.get("active"),
            });
        }

        Ok(PostgresPatternLibrary {
            inner: InMemoryPatternLibrary::new(records)?,
        })
    }
}

impl PatternLibrary for PostgresPatternLibrary {
    fn patterns_of(&self, kind: PatternKind) -> &[Pattern] {
        self.inner.patterns_of(kind)
    }
}

fn parse_kind(text: &str) -> Result<PatternKind, ExtractionError> {
    match text {
        "market_term" => Ok(PatternKind::MarketTerm),
        "date_pattern" => Ok(PatternKind::DatePattern),
        "report_keyword_primary" => Ok(PatternKind::ReportKeywordPrimary),
        "report_keyword_secondary" => Ok(PatternKind::ReportKeywordSecondary),
        "report_separator" => Ok(PatternKind::ReportSeparator),
        "geographic_entity" => Ok(PatternKind::GeographicEntity),
        "geographic_alias" => Ok(PatternKind::GeographicAlias),
        other => Err(ExtractionError::PatternLibraryInvalid(format!(
            "unrecognized pattern_library.kind value: {:?}",
            other
        ))),
    }
}

fn parse_format_type(text: &str) -> Result<FormatType, ExtractionError> {
    match text {
        "terminal" => Ok(FormatType::Terminal),
        "range" => Ok(FormatType::Range),
        "bracket" => Ok(FormatType::Bracket),
        "embedded" => Ok(FormatType::Embedded),
        "primary" => Ok(FormatType::Primary),
        "secondary" => Ok(FormatType::Secondary),
        other => Err(ExtractionError::PatternLibraryInvalid(format!(
            "unrecognized pattern_library.format_type value: {:?}",
            other
        ))),
    }
}
