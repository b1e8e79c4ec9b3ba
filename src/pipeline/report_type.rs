use lazy_static::lazy_static;
use regex::Regex;

use crate::config::ExtractionConfig;
use crate::pattern::PatternLibrary;
use crate::pipeline::lexicon::{collect_forward_run, Lexicon, RunToken};
use crate::pipeline::util::{collapse_whitespace, remove_span_strip_dangling_comma, skip_whitespace, word_end};
use crate::result::MarketTermType;

lazy_static! {
    static ref MARKET_ANCHOR: Regex = Regex::new(r"(?i)\bmarket\b").unwrap();
}

pub struct ReportTypeExtraction {
    pub residual: String,
    pub extracted_report_type: Option<String>,
    pub confidence_contribution: f64,
}

fn no_match(text: &str) -> ReportTypeExtraction {
    ReportTypeExtraction {
        residual: text.to_owned(),
        extracted_report_type: None,
        confidence_contribution: 0.0,
    }
}

/// Stage 3: locate the "Market" anchor and the keyword run attached to it, per
/// SPEC_FULL.md §4.3. The standard workflow scans forward from the anchor; the
/// three market-term workflows (stage 1's classification) instead split on the
/// connector word and scan the tail of the connector's object backward, since
/// in those titles the report-type keywords trail the rearranged topic rather
/// than following "Market" directly.
pub fn extract(
    text: &str,
    market_term_type: MarketTermType,
    library: &dyn PatternLibrary,
    config: &ExtractionConfig,
) -> ReportTypeExtraction {
    let anchor = match MARKET_ANCHOR.find(text) {
        Some(m) => m,
        None => return no_match(text),
    };

    let lex = Lexicon::build(library, config.allow_word_separators);

    match market_term_type.connector() {
        None => extract_standard(text, anchor.start(), anchor.end(), &lex, config),
        Some(connector) => {
            extract_market_term(text, anchor.start(), anchor.end(), connector, &lex, config)
        }
    }
}

fn extract_standard(
    text: &str,
    anchor_start: usize,
    anchor_end: usize,
    lex: &Lexicon,
    config: &ExtractionConfig,
) -> ReportTypeExtraction {
    let (run_end, tokens) = collect_forward_run(text, anchor_end, lex, config.stop_at_acronym);

    // §4.3.1 step 4: the anchor alone is reconstructed as "Market" when no
    // keyword run follows it -- only a missing anchor (handled above) yields None.
    let extracted = render_report_type(&text[anchor_end..run_end], lex, config.preserve_original_casing);
    let residual = remove_span_strip_dangling_comma(text, anchor_start, run_end);

    ReportTypeExtraction {
        residual,
        extracted_report_type: Some(extracted),
        confidence_contribution: score(&tokens),
    }
}

fn extract_market_term(
    text: &str,
    anchor_start: usize,
    anchor_end: usize,
    connector: &str,
    lex: &Lexicon,
    config: &ExtractionConfig,
) -> ReportTypeExtraction {
    let connector_regex = match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(connector))) {
        Ok(r) => r,
        Err(_) => return extract_standard(text, anchor_start, anchor_end, lex, config),
    };

    let connector_match = match connector_regex.find(&text[anchor_end..]) {
        Some(m) => m,
        // The connector word stage 1 matched against is gone (an earlier stage
        // must have removed it, e.g. inside a stripped date span) -- fall back
        // to the standard workflow rather than failing the title outright.
        None => return extract_standard(text, anchor_start, anchor_end, lex, config),
    };
    let connector_start = anchor_end + connector_match.start();
    let connector_end = anchor_end + connector_match.end();

    let prefix = &text[..anchor_start];
    let connector_surface = &text[connector_start..connector_end];
    let remainder = &text[connector_end..];

    let (run_start_in_remainder, tokens) = collect_trailing_run(remainder, lex, config.stop_at_acronym);

    // Pipeline-forward text keeps the connector (left + connector + right-minus-run)
    // so downstream stages -- and testable property #4 -- still see "AI in Automotive"
    // rather than losing the word that explains the rearrangement (SPEC_FULL.md §4.3.2 step 4).
    let topic_part = &remainder[..run_start_in_remainder];
    let joined = format!(
        "{} {} {}",
        prefix.trim_end().trim_end_matches(','),
        connector_surface,
        topic_part.trim_start().trim_start_matches(',')
    );
    let residual = collapse_whitespace(&joined);

    // §4.3.2 step 3: an empty run still reconstructs as bare "Market".
    let extracted = render_report_type(&remainder[run_start_in_remainder..], lex, config.preserve_original_casing);

    ReportTypeExtraction {
        residual,
        extracted_report_type: Some(extracted),
        confidence_contribution: score(&tokens),
    }
}

/// Mirrors `collect_forward_run` but scans from the end of `remainder` backward:
/// the whitespace-delimited words are reversed in order (never internally --
/// this is a word-order reversal, not a character reversal, so literal keyword
/// matching still works unmodified), the existing forward scanner runs over
/// that reversed sequence, and the resulting prefix length is translated back
/// into a starting byte offset in the original `remainder`.
fn collect_trailing_run(remainder: &str, lex: &Lexicon, stop_at_acronym: bool) -> (usize, Vec<RunToken>) {
    let spans = word_spans(remainder);
    if spans.is_empty() {
        return (remainder.len(), Vec::new());
    }

    let words: Vec<&str> = spans.iter().map(|&(s, e)| &remainder[s..e]).collect();
    let reversed_text = words.iter().rev().cloned().collect::<Vec<_>>().join(" ");

    let (reversed_run_end, tokens) = collect_forward_run(&reversed_text, 0, lex, stop_at_acronym);
    let words_consumed = reversed_text[..reversed_run_end].split_whitespace().count();

    if words_consumed == 0 {
        return (remainder.len(), Vec::new());
    }

    let first_consumed_index = spans.len() - words_consumed;
    (spans[first_consumed_index].0, tokens)
}

/// Reconstructs the `"Market " + run` phrase (§4.3.1 step 4 / §4.3.2 step 3)
/// from a run span. When `preserve_original_casing` is true (the default),
/// `run_text` is used verbatim -- this is the pre-existing, exhaustively
/// tested behavior. When false, keyword tokens inside the run are rewritten to
/// their pattern's canonical `term` casing (SPEC_FULL.md §6); separators and
/// whitespace are untouched either way. The literal `"Market"` prefix is
/// always canonical casing, per §4.3.1 step 4's "prefixed by the literal".
fn render_report_type(run_text: &str, lex: &Lexicon, preserve_original_casing: bool) -> String {
    let trimmed = run_text.trim();
    if trimmed.is_empty() {
        return "Market".to_owned();
    }
    if preserve_original_casing {
        format!("Market {}", trimmed)
    } else {
        format!("Market {}", canonicalize_run(trimmed, lex))
    }
}

/// Rewrites every keyword token in `run_text` (already known to contain only
/// keywords, separators, and whitespace -- the contents of a collected run) to
/// its pattern's canonical casing, leaving separators and whitespace as-is.
fn canonicalize_run(run_text: &str, lex: &Lexicon) -> String {
    let mut out = String::with_capacity(run_text.len());
    let mut pos = 0;

    while pos < run_text.len() {
        let ws_end = skip_whitespace(run_text, pos);
        out.push_str(&run_text[pos..ws_end]);
        pos = ws_end;
        if pos >= run_text.len() {
            break;
        }

        if let Some((len, canonical)) = lex.match_keyword_canonical_at(run_text, pos) {
            out.push_str(canonical);
            pos += len;
            continue;
        }
        if let Some(len) = lex.match_punct_separator_at(run_text, pos) {
            out.push_str(&run_text[pos..pos + len]);
            pos += len;
            continue;
        }
        if let Some(len) = lex.match_word_separator_at(run_text, pos) {
            out.push_str(&run_text[pos..pos + len]);
            pos += len;
            continue;
        }

        // Not reachable for a well-formed run (everything in it was classified
        // as keyword/separator to get collected); copy through defensively
        // rather than drop a character silently.
        let end = word_end(run_text, pos);
        out.push_str(&run_text[pos..end]);
        pos = end;
    }

    out
}

fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut pos = skip_whitespace(text, 0);
    while pos < text.len() {
        let end = word_end(text, pos);
        spans.push((pos, end));
        pos = skip_whitespace(text, end);
    }
    spans
}

fn score(tokens: &[RunToken]) -> f64 {
    let keyword_count = tokens.iter().filter(|t| t.is_keyword).count();
    let mut value = 0.6 + 0.05 * keyword_count as f64;
    if value > 0.95 {
        value = 0.95;
    }
    if tokens.iter().any(|t| t.is_keyword && t.is_primary) {
        value += 0.1;
    }
    value.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{FormatType, InMemoryPatternLibrary, Pattern, PatternKind};

    fn keyword(kind: PatternKind, term: &str, priority: i32) -> Pattern {
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

    fn separator(term: &str, priority: i32) -> Pattern {
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

    fn demo_library() -> InMemoryPatternLibrary {
        InMemoryPatternLibrary::new(vec![
            keyword(PatternKind::ReportKeywordPrimary, "Size", 1),
            keyword(PatternKind::ReportKeywordPrimary, "Report", 2),
            keyword(PatternKind::ReportKeywordPrimary, "Industry", 3),
            keyword(PatternKind::ReportKeywordPrimary, "Research", 4),
            separator(",", 1),
            separator("&", 2),
        ])
        .unwrap()
    }

    #[test]
    fn standard_workflow_stops_at_acronym_by_default() {
        let library = demo_library();
        let config = ExtractionConfig::default();
        let text = "Directed Energy Weapons Market Size, DEW Industry Report";
        let extraction = extract(text, MarketTermType::Standard, &library, &config);
        assert_eq!(extraction.extracted_report_type.as_deref(), Some("Market Size"));
        assert_eq!(extraction.residual, "Directed Energy Weapons DEW Industry Report");
    }

    #[test]
    fn standard_workflow_with_no_trailing_keyword_reconstructs_bare_market() {
        let library = demo_library();
        let config = ExtractionConfig::default();
        let text = "Widget Market Overview";
        let extraction = extract(text, MarketTermType::Standard, &library, &config);
        assert_eq!(extraction.extracted_report_type.as_deref(), Some("Market"));
        assert_eq!(extraction.residual, "Widget Overview");
    }

    #[test]
    fn anchor_absent_yields_none() {
        let library = demo_library();
        let config = ExtractionConfig::default();
        let text = "Widget Overview Report";
        let extraction = extract(text, MarketTermType::Standard, &library, &config);
        assert!(extraction.extracted_report_type.is_none());
        assert_eq!(extraction.residual, text);
    }

    #[test]
    fn market_for_workflow_reconstructs_topic_and_trailing_report_type() {
        let library = demo_library();
        let config = ExtractionConfig::default();
        let text = "Global Automotive Market for Electric Vehicles Industry Report";
        let extraction = extract(text, MarketTermType::MarketFor, &library, &config);
        assert_eq!(extraction.extracted_report_type.as_deref(), Some("Market Industry Report"));
        assert_eq!(extraction.residual, "Global Automotive for Electric Vehicles");
    }

    #[test]
    fn market_for_workflow_without_trailing_keywords_still_reconstructs_bare_market() {
        let library = demo_library();
        let config = ExtractionConfig::default();
        let text = "Global Automotive Market for Electric Vehicles";
        let extraction = extract(text, MarketTermType::MarketFor, &library, &config);
        assert_eq!(extraction.extracted_report_type.as_deref(), Some("Market"));
        assert_eq!(extraction.residual, "Global Automotive for Electric Vehicles");
    }

    #[test]
    fn market_in_workflow_preserves_connector_for_downstream_stages() {
        let library = InMemoryPatternLibrary::new(vec![
            keyword(PatternKind::ReportKeywordPrimary, "Outlook", 1),
            keyword(PatternKind::ReportKeywordPrimary, "Trends", 2),
            separator("&", 1),
        ])
        .unwrap();
        let config = ExtractionConfig::default();
        let text = "Artificial Intelligence (AI) Market in Automotive Outlook & Trends";
        let extraction = extract(text, MarketTermType::MarketIn, &library, &config);
        assert_eq!(extraction.extracted_report_type.as_deref(), Some("Market Outlook & Trends"));
        assert_eq!(extraction.residual, "Artificial Intelligence (AI) in Automotive");
    }

    #[test]
    fn standard_workflow_with_original_casing_disabled_uses_pattern_casing() {
        let library = demo_library();
        let config = ExtractionConfig {
            preserve_original_casing: false,
            ..ExtractionConfig::default()
        };
        let text = "Widget market SIZE & INDUSTRY report";
        let extraction = extract(text, MarketTermType::Standard, &library, &config);
        assert_eq!(extraction.extracted_report_type.as_deref(), Some("Market Size & Industry Report"));
        assert_eq!(extraction.residual, "Widget");
    }

    #[test]
    fn standard_workflow_original_casing_disabled_canonicalizes_alias_match() {
        let mut outlook = keyword(PatternKind::ReportKeywordPrimary, "Outlook", 1);
        outlook.aliases = vec!["OUTLOOK REPORT".to_owned()];
        let library = InMemoryPatternLibrary::new(vec![outlook]).unwrap();
        let config = ExtractionConfig {
            preserve_original_casing: false,
            ..ExtractionConfig::default()
        };
        let text = "Widget Market outlook report";
        let extraction = extract(text, MarketTermType::Standard, &library, &config);
        assert_eq!(extraction.extracted_report_type.as_deref(), Some("Market Outlook"));
    }

    #[test]
    fn market_for_workflow_with_original_casing_disabled_uses_pattern_casing() {
        let library = demo_library();
        let config = ExtractionConfig {
            preserve_original_casing: false,
            ..ExtractionConfig::default()
        };
        let text = "Global Automotive market for Electric Vehicles industry REPORT";
        let extraction = extract(text, MarketTermType::MarketFor, &library, &config);
        assert_eq!(extraction.extracted_report_type.as_deref(), Some("Market Industry Report"));
        assert_eq!(extraction.residual, "Global Automotive for Electric Vehicles");
    }
}
