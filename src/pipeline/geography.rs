use crate::pattern::{literal_regex, PatternKind, PatternLibrary};
use crate::pipeline::util::{extend_span_end_over_connector, remove_spans};

pub struct GeographyExtraction {
    pub residual: String,
    pub extracted_regions: Vec<String>,
}

/// Bare context-only qualifiers recognized as geographic only when they occupy
/// a leading position before the topic begins (SPEC_FULL.md §4.4); embedded
/// elsewhere in the residual they are left alone for the topic to keep, since
/// no pattern attribute distinguishes "qualifier" from "region" today.
const LEADING_ONLY_QUALIFIERS: &[&str] = &["global"];

fn is_leading_only_qualifier(canonical_term: &str) -> bool {
    LEADING_ONLY_QUALIFIERS
        .iter()
        .any(|q| q.eq_ignore_ascii_case(canonical_term))
}

/// Stage 4: finds every geographic entity/alias mention in `text` via a single
/// leftmost-match-wins forward scan across both pattern kinds combined and
/// sorted together (compound-first, so "North America" claims its span before
/// "America" gets a chance to), then removes all of them in one pass
/// (SPEC_FULL.md §4.4). Each match's span is widened over one trailing
/// connector (" & " / ", ") before removal so multi-region lists collapse
/// cleanly instead of leaving a stranded conjunction.
pub fn extract(text: &str, library: &dyn PatternLibrary) -> GeographyExtraction {
    // Every surface form -- a pattern's own `term` plus each of its `aliases` --
    // becomes its own matchable literal, all mapped back to that pattern's
    // canonical `term` so e.g. an alias "U.S." still emits "United States".
    let mut surfaces: Vec<(i32, usize, String, String)> = Vec::new(); // (priority, literal len, literal, canonical)
    for pattern in library
        .patterns_of(PatternKind::GeographicEntity)
        .iter()
        .chain(library.patterns_of(PatternKind::GeographicAlias).iter())
    {
        surfaces.push((pattern.priority, pattern.term.len(), pattern.term.clone(), pattern.term.clone()));
        for alias in &pattern.aliases {
            surfaces.push((pattern.priority, alias.len(), alias.clone(), pattern.term.clone()));
        }
    }
    surfaces.sort_by_key(|(priority, len, _, _)| (*priority, std::cmp::Reverse(*len)));

    let mut compiled: Vec<(String, regex::Regex)> = Vec::with_capacity(surfaces.len());
    for (_, _, literal, canonical) in &surfaces {
        if let Ok(regex) = literal_regex(literal) {
            compiled.push((canonical.clone(), regex));
        }
    }

    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut regions: Vec<(usize, String)> = Vec::new();
    let mut claimed = vec![false; text.len()];

    loop {
        let mut best: Option<(usize, usize, &str)> = None;

        for (term, regex) in &compiled {
            let leading_only = is_leading_only_qualifier(term);
            let first_unclaimed = regex.find_iter(text).find(|m| {
                !claimed[m.start()..m.end()].iter().any(|&c| c)
                    && (!leading_only || text[..m.start()].trim().is_empty())
            });
            if let Some(m) = first_unclaimed {
                match best {
                    Some((best_start, _, _)) if best_start <= m.start() => {}
                    _ => best = Some((m.start(), m.end(), term.as_str())),
                }
            }
        }

        match best {
            None => break,
            Some((start, end, term)) => {
                for slot in claimed[start..end].iter_mut() {
                    *slot = true;
                }
                let extended_end = extend_span_end_over_connector(text, end);
                for slot in claimed[end..extended_end].iter_mut() {
                    *slot = true;
                }
                spans.push((start, extended_end));
                regions.push((start, term.to_owned()));
            }
        }
    }

    spans.sort_by_key(|&(start, _)| start);
    regions.sort_by_key(|&(start, _)| start);

    let residual = remove_spans(text, &spans);
    let extracted_regions = regions.into_iter().map(|(_, term)| term).collect();

    GeographyExtraction {
        residual,
        extracted_regions,
    }
}
