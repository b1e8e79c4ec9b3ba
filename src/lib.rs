//! Extracts market-term classification, forecast date, report type,
//! geographic regions, and a normalized topic out of short market-research
//! report titles, by running a fixed five-stage systematic-removal pipeline
//! against an externally supplied `PatternLibrary`.

pub mod config;
pub mod error;
pub mod pattern;
pub mod pipeline;
#[cfg(feature = "postgres-library")]
pub mod postgres_library;
pub mod result;

use config::ExtractionConfig;
use pattern::PatternLibrary;
use pipeline::{date_extractor, geography, market_term, report_type, topic};
use result::{DateStatus, ExtractionResult, MarketTermType};

/// Runs the full pipeline once over `title` against `library`, per
/// SPEC_FULL.md §2: market-term classification, then date, then report type,
/// then geography, then topic normalization. Each stage consumes and strips
/// its fragment from the residual text before handing it to the next stage;
/// the final residual becomes `topic`.
pub fn extract(title: &str, library: &dyn PatternLibrary, config: &ExtractionConfig) -> ExtractionResult {
    let mut result = ExtractionResult::empty(title);

    let market_term_type = market_term::classify(title, library);
    result.market_term_type = market_term_type;

    let date = date_extractor::extract(title, library, config);
    result.extracted_date_range = date.extracted_date_range;
    result.date_status = date.status;
    if result.date_status == DateStatus::DatesMissed {
        result.push_note("date-shaped digits present but no pattern matched (dates_missed)");
    }

    let report_type = report_type::extract(&date.residual, market_term_type, library, config);
    result.extracted_report_type = report_type.extracted_report_type.clone();
    if report_type.extracted_report_type.is_none() {
        result.push_note("no report-type keyword run found around the Market anchor");
    }

    let geography = geography::extract(&report_type.residual, library);
    result.extracted_regions = geography.extracted_regions;

    let topic = topic::normalize(&geography.residual, config);
    result.topic = topic.topic;
    result.topic_name = topic.topic_name;

    result.confidence = confidence(&result, report_type.confidence_contribution);

    result
}

/// Additive confidence model weighted by SPEC_FULL.md §2's per-stage "Share"
/// column (5% / 15% / 45% / 20% / 15%): each stage contributes a value in
/// [0,1] reflecting how cleanly it matched, scaled by its share of the
/// overall extraction. The report-type stage's own 0.6-1.0 score (§4.3.3) is
/// used directly as its value; the topic stage's value follows the 0.8/0.6
/// rule from §4.5 (whether stages 1-4 all emitted a non-default value).
fn confidence(result: &ExtractionResult, report_type_score: f64) -> f64 {
    let market_term_value = 1.0; // classification never fails (§4.1)

    let date_value = match result.date_status {
        DateStatus::Success => 1.0,
        DateStatus::NoDatesPresent => 0.6, // absent, not wrong
        DateStatus::DatesMissed => 0.0,    // digits present, pattern failed
    };

    let report_type_value = if result.extracted_report_type.is_some() {
        report_type_score
    } else {
        0.0
    };

    let geography_value = if result.extracted_regions.is_empty() { 0.5 } else { 1.0 };

    let all_non_default = result.market_term_type != MarketTermType::Standard
        && result.date_status == DateStatus::Success
        && result.extracted_report_type.is_some()
        && !result.extracted_regions.is_empty();
    let topic_value = if all_non_default { 0.8 } else { 0.6 };

    let weighted = 0.05 * market_term_value
        + 0.15 * date_value
        + 0.45 * report_type_value
        + 0.20 * geography_value
        + 0.15 * topic_value;

    weighted.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pattern::{FormatType, InMemoryPatternLibrary, Pattern, PatternKind};

    fn kw(kind: PatternKind, term: &str, priority: i32) -> Pattern {
        Pattern {
            kind,
            term: term.to_owned(),
            aliases: Vec::new(),
            regex: None,
            priority,
            format_type: Some(if kind == PatternKind::ReportKeywordPrimary {
                FormatType::Primary
            } else {
                FormatType::Secondary
            }),
            active: true,
        }
    }

    fn sep(term: &str, priority: i32) -> Pattern {
        Pattern {
            kind: PatternKind::ReportSeparator,
            term: term.to_owned(),
            aliases: Vec::new(),
            regex: None,
            priority,
            format_type: None,
            active: true,
        }
    }

    fn region(term: &str, priority: i32) -> Pattern {
        Pattern {
            kind: PatternKind::GeographicEntity,
            term: term.to_owned(),
            aliases: Vec::new(),
            regex: None,
            priority,
            format_type: None,
            active: true,
        }
    }

    fn seed_library() -> InMemoryPatternLibrary {
        InMemoryPatternLibrary::new(vec![
            kw(PatternKind::ReportKeywordPrimary, "Size", 1),
            kw(PatternKind::ReportKeywordPrimary, "Share", 2),
            kw(PatternKind::ReportKeywordPrimary, "Report", 3),
            kw(PatternKind::ReportKeywordPrimary, "Analysis", 4),
            kw(PatternKind::ReportKeywordPrimary, "Industry", 5),
            kw(PatternKind::ReportKeywordPrimary, "Outlook", 6),
            kw(PatternKind::ReportKeywordPrimary, "Trends", 7),
            kw(PatternKind::ReportKeywordSecondary, "industy", 50),
            sep("&", 1),
            sep(",", 2),
            sep("and", 3),
            region("APAC", 1),
            region("Middle East", 1),
        ])
        .unwrap()
    }

    #[test]
    fn seed_scenario_one_apac_middle_east_ppe() {
        let library = seed_library();
        let config = ExtractionConfig::default();
        let title = "APAC & Middle East Personal Protective Equipment Market Size & Share Report, 2024-2030";
        let result = extract(title, &library, &config);

        assert_eq!(result.market_term_type, MarketTermType::Standard);
        assert_eq!(result.extracted_date_range.as_deref(), Some("2024-2030"));
        assert_eq!(result.date_status, DateStatus::Success);
        assert_eq!(result.extracted_report_type.as_deref(), Some("Market Size & Share Report"));
        assert_eq!(result.extracted_regions, vec!["APAC", "Middle East"]);
        assert_eq!(result.topic, "Personal Protective Equipment");
        assert_eq!(result.topic_name, "personal-protective-equipment");
    }

    #[test]
    fn seed_scenario_three_misspelling_preserved() {
        let library = seed_library();
        let config = ExtractionConfig::default();
        let title = "Cloud Computing Market in Healthcare Industy";
        let result = extract(title, &library, &config);

        assert_eq!(result.market_term_type, MarketTermType::MarketIn);
        assert_eq!(result.date_status, DateStatus::NoDatesPresent);
        assert_eq!(result.extracted_report_type.as_deref(), Some("Market Industy"));
        assert_eq!(result.topic, "Cloud Computing in Healthcare");
    }

    #[test]
    fn empty_title_is_all_defaults() {
        let library = seed_library();
        let config = ExtractionConfig::default();
        let result = extract("", &library, &config);

        assert_eq!(result.market_term_type, MarketTermType::Standard);
        assert!(result.extracted_date_range.is_none());
        assert_eq!(result.date_status, DateStatus::NoDatesPresent);
        assert!(result.extracted_report_type.is_none());
        assert!(result.extracted_regions.is_empty());
        assert_eq!(result.topic, "");
        assert_eq!(result.topic_name, "");
    }

    #[test]
    fn title_of_only_market_yields_bare_report_type() {
        let library = seed_library();
        let config = ExtractionConfig::default();
        let result = extract("Market", &library, &config);
        assert_eq!(result.extracted_report_type.as_deref(), Some("Market"));
        assert_eq!(result.topic, "");
    }

    #[test]
    fn title_of_only_a_year_has_empty_topic() {
        let library = seed_library();
        let config = ExtractionConfig::default();
        let result = extract("2030", &library, &config);
        assert_eq!(result.date_status, DateStatus::Success);
        assert_eq!(result.extracted_date_range.as_deref(), Some("2030"));
        assert_eq!(result.topic, "");
    }

    #[test]
    fn pipeline_is_a_pure_function() {
        let library = seed_library();
        let config = ExtractionConfig::default();
        let title = "APAC Widget Market Size Report, 2025";
        let first = extract(title, &library, &config);
        let second = extract(title, &library, &config);
        assert_eq!(first.topic, second.topic);
        assert_eq!(first.confidence, second.confidence);
        assert_eq!(first.extracted_regions, second.extracted_regions);
    }

    #[test]
    fn confidence_is_bounded() {
        let library = seed_library();
        let config = ExtractionConfig::default();
        let result = extract(
            "APAC & Middle East Personal Protective Equipment Market Size & Share Report, 2024-2030",
            &library,
            &config,
        );
        assert!(result.confidence > 0.0 && result.confidence <= 1.0);

        let empty_result = extract("", &library, &config);
        assert_eq!(empty_result.confidence, 0.05 + 0.15 * 0.6 + 0.20 * 0.5 + 0.15 * 0.6);
    }
}
