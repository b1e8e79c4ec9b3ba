use lazy_static::lazy_static;
use regex::Regex;

use crate::config::ExtractionConfig;
use crate::pattern::{FormatType, PatternKind, PatternLibrary};
use crate::pipeline::util::remove_span_strip_dangling_comma;
use crate::result::DateStatus;

lazy_static! {
    static ref ANY_FOUR_DIGIT_RUN: Regex = Regex::new(r"\d{4}").unwrap();
    static ref BUILTIN_BRACKET: Regex =
        Regex::new(r"[\[\(]\s*(\d{4})\s*(?:[-\x{2013}]|\bto\b)?\s*(\d{4})?\s*[\]\)]").unwrap();
    static ref BUILTIN_RANGE: Regex = Regex::new(r"\b(\d{4})\s*(?:[-\x{2013}]|\bto\b)\s*(\d{4})\b").unwrap();
    static ref BUILTIN_TERMINAL: Regex = Regex::new(r"\b(\d{4})\s*[.,]?\s*$").unwrap();
    static ref BUILTIN_EMBEDDED: Regex = Regex::new(r"\b(\d{4})\b").unwrap();
}

struct Candidate<'a> {
    format_type: FormatType,
    regex: &'a Regex,
}

pub struct DateExtraction {
    pub residual: String,
    pub extracted_date_range: Option<String>,
    pub status: DateStatus,
}

/// Stage 2: locate and strip a date expression from `title` (SPEC_FULL.md
/// §4.2). Patterns come from the library when it supplies `date_pattern`
/// records with an explicit `regex`; a library that supplies none falls back
/// to this module's own built-in expressions for the four format types, so a
/// minimal demonstration library still gets full date coverage.
pub fn extract(title: &str, library: &dyn PatternLibrary, config: &ExtractionConfig) -> DateExtraction {
    if !ANY_FOUR_DIGIT_RUN.is_match(title) {
        return DateExtraction {
            residual: title.to_owned(),
            extracted_date_range: None,
            status: DateStatus::NoDatesPresent,
        };
    }

    let library_patterns = library.patterns_of(PatternKind::DatePattern);
    let mut compiled: Vec<(FormatType, Regex)> = Vec::new();
    for pattern in library_patterns {
        if let Some(format_type) = pattern.format_type {
            if let Ok(regex) = pattern.compile() {
                compiled.push((format_type, regex));
            }
        }
    }

    let candidates: Vec<Candidate> = if compiled.is_empty() {
        vec![
            Candidate {
                format_type: FormatType::Bracket,
                regex: &BUILTIN_BRACKET,
            },
            Candidate {
                format_type: FormatType::Range,
                regex: &BUILTIN_RANGE,
            },
            Candidate {
                format_type: FormatType::Terminal,
                regex: &BUILTIN_TERMINAL,
            },
            Candidate {
                format_type: FormatType::Embedded,
                regex: &BUILTIN_EMBEDDED,
            },
        ]
    } else {
        compiled
            .iter()
            .map(|(format_type, regex)| Candidate {
                format_type: *format_type,
                regex,
            })
            .collect()
    };

    for candidate in &candidates {
        for caps in candidate.regex.captures_iter(title) {
            let whole = caps.get(0).expect("capture 0 is always present on a match");
            let years = capture_years(&caps);
            if !years.is_empty() && years.iter().all(|y| year_in_bounds(*y, config)) {
                let extracted = render_date_range(&years);
                let (removal_start, removal_end) = widen_to_enclosing_brackets(title, whole.start(), whole.end());
                let residual = remove_span_strip_dangling_comma(title, removal_start, removal_end);
                return DateExtraction {
                    residual,
                    extracted_date_range: Some(extracted),
                    status: DateStatus::Success,
                };
            }
        }
    }

    DateExtraction {
        residual: title.to_owned(),
        extracted_date_range: None,
        status: DateStatus::DatesMissed,
    }
}

fn capture_years(caps: &regex::Captures) -> Vec<i32> {
    let mut years = Vec::new();
    for i in 1..caps.len() {
        if let Some(m) = caps.get(i) {
            if let Ok(year) = m.as_str().parse::<i32>() {
                years.push(year);
            }
        }
    }
    years
}

fn year_in_bounds(year: i32, config: &ExtractionConfig) -> bool {
    year >= config.year_min && year <= config.year_max
}

fn render_date_range(years: &[i32]) -> String {
    match years {
        [single] => single.to_string(),
        [start, end] => format!("{}-{}", start, end),
        _ => years.iter().map(|y| y.to_string()).collect::<Vec<_>>().join("-"),
    }
}

/// A bracket/parenthesis format match's captured span stops at the digits; widen
/// it to include the enclosing `[`/`]` or `(`/`)` themselves so they are removed
/// along with the date rather than left as empty brackets.
fn widen_to_enclosing_brackets(text: &str, start: usize, end: usize) -> (usize, usize) {
    let opens_before = matches!(text.as_bytes().get(start.wrapping_sub(1)), Some(b'[') | Some(b'('));
    let closes_after = matches!(text.as_bytes().get(end), Some(b']') | Some(b')'));
    match (opens_before, closes_after) {
        (true, true) => (start - 1, end + 1),
        _ => (start, end),
    }
}
