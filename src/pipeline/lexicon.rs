use crate::pattern::{Pattern, PatternKind, PatternLibrary};
use crate::pipeline::util::{looks_like_acronym, skip_whitespace, word_end};

/// Report-type keywords and separators pulled from the pattern library once
/// per stage invocation, and the small amount of classification logic the
/// run scanner needs on top of raw pattern membership.
pub struct Lexicon<'a> {
    // (search surface, canonical surface, is_primary); sorted by search-surface length desc.
    // The search surface is a pattern's `term` or one of its `aliases`; the canonical surface
    // is always the pattern's own `term`, so an alias match still canonicalizes to its parent.
    keywords: Vec<(&'a str, &'a str, bool)>,
    punctuation_separators: Vec<&'a str>, // sorted by term length desc
    word_separators: Vec<&'a str>,
    allow_word_separators: bool,
}

impl<'a> Lexicon<'a> {
    pub fn build(library: &'a dyn PatternLibrary, allow_word_separators: bool) -> Lexicon<'a> {
        let mut keywords: Vec<(&str, &str, bool)> = Vec::new();
        for p in library.patterns_of(PatternKind::ReportKeywordPrimary) {
            push_term_and_aliases(p, true, &mut keywords);
        }
        for p in library.patterns_of(PatternKind::ReportKeywordSecondary) {
            push_term_and_aliases(p, false, &mut keywords);
        }
        keywords.sort_by_key(|(term, _, _)| std::cmp::Reverse(term.len()));

        let mut punctuation_separators = Vec::new();
        let mut word_separators = Vec::new();
        for p in library.patterns_of(PatternKind::ReportSeparator) {
            if is_word_term(&p.term) {
                word_separators.push(p.term.as_str());
            } else {
                punctuation_separators.push(p.term.as_str());
            }
        }
        punctuation_separators.sort_by_key(|t| std::cmp::Reverse(t.len()));

        Lexicon {
            keywords,
            punctuation_separators,
            word_separators,
            allow_word_separators,
        }
    }

    pub fn match_keyword_at(&self, text: &str, pos: usize) -> Option<(usize, bool)> {
        let rest = text.get(pos..)?;
        for (term, _canonical, primary) in &self.keywords {
            if let Some(len) = whole_word_prefix_match(rest, term) {
                return Some((len, *primary));
            }
        }
        None
    }

    /// Same match as `match_keyword_at`, but also returns the pattern's canonical
    /// `term` surface -- used when `preserve_original_casing` is disabled so the
    /// reconstructed run uses the library's own casing instead of the title's.
    pub fn match_keyword_canonical_at(&self, text: &str, pos: usize) -> Option<(usize, &'a str)> {
        let rest = text.get(pos..)?;
        for (term, canonical, _primary) in &self.keywords {
            if let Some(len) = whole_word_prefix_match(rest, term) {
                return Some((len, canonical));
            }
        }
        None
    }

    pub fn match_punct_separator_at(&self, text: &str, pos: usize) -> Option<usize> {
        let rest = text.get(pos..)?;
        for term in &self.punctuation_separators {
            if rest.starts_with(term) {
                return Some(term.len());
            }
        }
        None
    }

    /// Word separators (`and`/`or`/`plus`) match only between whitespace, never
    /// inside a hyphenated compound: a hyphen on either side disqualifies them.
    pub fn match_word_separator_at(&self, text: &str, pos: usize) -> Option<usize> {
        if !self.allow_word_separators {
            return None;
        }
        if pos > 0 && text.as_bytes().get(pos - 1) == Some(&b'-') {
            return None;
        }
        let rest = text.get(pos..)?;
        for term in &self.word_separators {
            if let Some(len) = whole_word_prefix_match(rest, term) {
                if rest.as_bytes().get(len) == Some(&b'-') {
                    continue;
                }
                return Some(len);
            }
        }
        None
    }
}

fn push_term_and_aliases<'a>(p: &'a Pattern, primary: bool, out: &mut Vec<(&'a str, &'a str, bool)>) {
    out.push((p.term.as_str(), p.term.as_str(), primary));
    for alias in &p.aliases {
        out.push((alias.as_str(), p.term.as_str(), primary));
    }
}

fn is_word_term(term: &str) -> bool {
    term.chars().all(|c| c.is_alphabetic())
}

fn whole_word_prefix_match(rest: &str, term: &str) -> Option<usize> {
    if rest.len() < term.len() || !rest.is_char_boundary(term.len()) {
        return None;
    }
    let candidate = &rest[..term.len()];
    if !candidate.eq_ignore_ascii_case(term) {
        return None;
    }
    match rest[term.len()..].chars().next() {
        Some(c) if c.is_alphanumeric() => None,
        _ => Some(term.len()),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RunToken {
    pub start: usize,
    pub end: usize,
    pub is_keyword: bool,
    pub is_primary: bool,
}

/// Implements the state machine of SPEC_FULL.md §4.3.4: greedily collect a
/// keyword-run starting at `start`, stopping at the first foreign token, end of
/// text, or (when `stop_at_acronym` is false) skipping over a bare acronym that
/// is immediately followed by more keyword/separator material.
///
/// Returns the run's tokens (after trailing-separator trim) and the byte offset
/// one past the last kept token -- the contiguous `[start, run_end)` span is
/// exactly what the caller deletes from the title.
pub fn collect_forward_run(
    text: &str,
    start: usize,
    lex: &Lexicon,
    stop_at_acronym: bool,
) -> (usize, Vec<RunToken>) {
    let mut tokens: Vec<RunToken> = Vec::new();
    let mut run_end = start;
    let mut cursor = start;

    loop {
        let probe = skip_whitespace(text, cursor);
        if probe >= text.len() {
            break;
        }

        if let Some((len, primary)) = lex.match_keyword_at(text, probe) {
            tokens.push(RunToken {
                start: probe,
                end: probe + len,
                is_keyword: true,
                is_primary: primary,
            });
            run_end = probe + len;
            cursor = run_end;
            continue;
        }

        if let Some(len) = lex.match_punct_separator_at(text, probe) {
            tokens.push(RunToken {
                start: probe,
                end: probe + len,
                is_keyword: false,
                is_primary: false,
            });
            run_end = probe + len;
            cursor = run_end;
            continue;
        }

        if let Some(len) = lex.match_word_separator_at(text, probe) {
            tokens.push(RunToken {
                start: probe,
                end: probe + len,
                is_keyword: false,
                is_primary: false,
            });
            run_end = probe + len;
            cursor = run_end;
            continue;
        }

        // Foreign token.
        let w_end = word_end(text, probe);
        let word = &text[probe..w_end];

        if !stop_at_acronym && looks_like_acronym(word) {
            let after = skip_whitespace(text, w_end);
            let more_follows =
                lex.match_keyword_at(text, after).is_some() || lex.match_punct_separator_at(text, after).is_some();
            if more_follows {
                cursor = w_end; // swallow the acronym, run_end only advances on the next real token
                continue;
            }
        }

        break;
    }

    trim_trailing_separators(&mut tokens, start, &mut run_end);
    (run_end, tokens)
}

fn trim_trailing_separators(tokens: &mut Vec<RunToken>, start: usize, run_end: &mut usize) {
    while matches!(tokens.last(), Some(t) if !t.is_keyword) {
        tokens.pop();
    }
    *run_end = tokens.last().map(|t| t.end).unwrap_or(start);
}
