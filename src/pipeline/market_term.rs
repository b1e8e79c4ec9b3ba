use crate::pattern::{PatternKind, PatternLibrary};
use crate::result::MarketTermType;

/// The three connector phrases and the classification each one maps to, tried
/// in this fixed priority order when the library itself is silent on
/// `market_term` patterns -- mirrors the date extractor's convention of
/// falling back to a built-in candidate set when the library supplies none.
const BUILTIN_CONNECTORS: [(&str, MarketTermType); 3] = [
    ("market for", MarketTermType::MarketFor),
    ("market in", MarketTermType::MarketIn),
    ("market by", MarketTermType::MarketBy),
];

fn kind_for_connector(connector: &str) -> Option<MarketTermType> {
    match connector {
        "for" => Some(MarketTermType::MarketFor),
        "in" => Some(MarketTermType::MarketIn),
        "by" => Some(MarketTermType::MarketBy),
        _ => None,
    }
}

/// Classifies the title's market-term shape (SPEC_FULL.md §4.1). Candidate
/// phrases come from the library's `market_term` patterns when it has any
/// (each pattern's `term` is expected to end in "for"/"in"/"by", e.g. "Market
/// for"); an empty library falls back to the three built-in connectors so
/// embedded callers get full classification without assembling a library.
/// Leftmost match wins; ties broken by pattern priority (lower wins).
pub fn classify(title: &str, library: &dyn PatternLibrary) -> MarketTermType {
    let library_patterns = library.patterns_of(PatternKind::MarketTerm);

    let mut best: Option<(usize, usize, i32, MarketTermType)> = None; // (start, phrase_len, priority, kind)

    if library_patterns.is_empty() {
        for (priority, (phrase, kind)) in BUILTIN_CONNECTORS.iter().enumerate() {
            consider(title, phrase, *kind, priority as i32, &mut best);
        }
    } else {
        for pattern in library_patterns {
            let connector = match last_word(&pattern.term) {
                Some(w) => w,
                None => continue,
            };
            let kind = match kind_for_connector(&connector.to_lowercase()) {
                Some(k) => k,
                None => continue,
            };
            consider(title, &pattern.term, kind, pattern.priority, &mut best);
            for alias in &pattern.aliases {
                consider(title, alias, kind, pattern.priority, &mut best);
            }
        }
    }

    // A connector phrase flush against either end of the title leaves nothing
    // to rearrange around on that side, so it degrades to Standard: nothing
    // after the connector word means no object to pull forward (§4.1's
    // trailing guard); nothing before it means no topic fragment precedes
    // "Market" either, e.g. "Market for Semiconductors Size Report".
    match best {
        Some((start, phrase_len, _, kind)) => {
            let lower = title.to_lowercase();
            let nothing_before = lower[..start].trim().is_empty();
            let nothing_after = lower[start + phrase_len..].trim().is_empty();
            if nothing_before || nothing_after {
                MarketTermType::Standard
            } else {
                kind
            }
        }
        None => MarketTermType::Standard,
    }
}

fn consider(
    title: &str,
    phrase: &str,
    kind: MarketTermType,
    priority: i32,
    best: &mut Option<(usize, usize, i32, MarketTermType)>,
) {
    let lower = title.to_lowercase();
    let phrase_lower = phrase.to_lowercase();
    let pos = match lower.find(&phrase_lower) {
        Some(p) => p,
        None => return,
    };
    let followed_by_word_boundary = lower[pos + phrase_lower.len()..]
        .chars()
        .next()
        .map(|c| !c.is_alphanumeric())
        .unwrap_or(true);
    let preceded_by_word_boundary = pos == 0
        || lower[..pos]
            .chars()
            .last()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
    if !followed_by_word_boundary || !preceded_by_word_boundary {
        return;
    }

    match *best {
        Some((best_start, _, best_priority, _))
            if best_start < pos || (best_start == pos && best_priority <= priority) => {}
        _ => *best = Some((pos, phrase_lower.len(), priority, kind)),
    }
}

fn last_word(term: &str) -> Option<&str> {
    term.split_whitespace().last()
}
