use crate::config::ExtractionConfig;

const WORD_CONNECTORS: [&str; 6] = ["for", "in", "by", "and", "or", "plus"];
const PUNCT_CONNECTORS: [&str; 6] = ["&", ",", "/", "+", "-", ";"];

pub struct TopicExtraction {
    pub topic: String,
    pub topic_name: String,
}

/// Stage 5: cleans the residual left by stages 1-4 into a display `topic` and
/// a slug `topic_name` (SPEC_FULL.md §4.5).
pub fn normalize(text: &str, config: &ExtractionConfig) -> TopicExtraction {
    let mut current = text.trim().to_owned();
    loop {
        let mut changed = false;
        if let Some(rest) = strip_leading_connector(&current) {
            current = rest.trim_start().to_owned();
            changed = true;
        }
        if let Some(rest) = strip_trailing_connector(&current) {
            current = rest.trim_end().to_owned();
            changed = true;
        }
        if !changed {
            break;
        }
    }

    let topic = collapse_whitespace(&current);
    let topic_name = slugify(&topic, config);
    TopicExtraction { topic, topic_name }
}

fn strip_leading_connector(s: &str) -> Option<&str> {
    let trimmed = s.trim_start();
    for punct in PUNCT_CONNECTORS {
        if let Some(rest) = trimmed.strip_prefix(punct) {
            return Some(rest);
        }
    }
    for word in WORD_CONNECTORS {
        if let Some(rest) = strip_prefix_ci(trimmed, word) {
            // A hyphen right after the word means it's glued to a compound like
            // "Plus-Size", not a standalone connector -- leave it alone.
            let boundary_ok = rest
                .chars()
                .next()
                .map(|c| !c.is_alphanumeric() && c != '-')
                .unwrap_or(true);
            if boundary_ok {
                return Some(rest);
            }
        }
    }
    None
}

fn strip_trailing_connector(s: &str) -> Option<&str> {
    let trimmed = s.trim_end();
    for punct in PUNCT_CONNECTORS {
        if let Some(rest) = trimmed.strip_suffix(punct) {
            return Some(rest);
        }
    }
    for word in WORD_CONNECTORS {
        if let Some(rest) = strip_suffix_ci(trimmed, word) {
            let boundary_ok = rest
                .chars()
                .last()
                .map(|c| !c.is_alphanumeric() && c != '-')
                .unwrap_or(true);
            if boundary_ok {
                return Some(rest);
            }
        }
    }
    None
}

fn strip_prefix_ci<'a>(s: &'a str, word: &str) -> Option<&'a str> {
    if s.len() < word.len() || !s.is_char_boundary(word.len()) {
        return None;
    }
    if s[..word.len()].eq_ignore_ascii_case(word) {
        Some(&s[word.len()..])
    } else {
        None
    }
}

fn strip_suffix_ci<'a>(s: &'a str, word: &str) -> Option<&'a str> {
    if s.len() < word.len() {
        return None;
    }
    let split_at = s.len() - word.len();
    if !s.is_char_boundary(split_at) {
        return None;
    }
    if s[split_at..].eq_ignore_ascii_case(word) {
        Some(&s[..split_at])
    } else {
        None
    }
}

fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut last_was_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                result.push(' ');
            }
            last_was_space = true;
        } else {
            result.push(c);
            last_was_space = false;
        }
    }
    result.trim().to_owned()
}

/// `&` and `+` become "and"/"plus" only as standalone tokens -- "C++" keeps its
/// symbol since the `+`s there are never their own whitespace-delimited token.
fn replace_standalone_symbols(s: &str) -> String {
    s.split_whitespace()
        .map(|tok| match tok {
            "&" => "and",
            "+" => "plus",
            other => other,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn slugify(topic: &str, config: &ExtractionConfig) -> String {
    let lower = topic.to_lowercase();
    let replaced = replace_standalone_symbols(&lower);

    let mut slug = String::with_capacity(replaced.len());
    let mut last_was_dash = true; // suppresses a leading dash
    for c in replaced.chars() {
        let is_alnum = if config.ascii_only_slug {
            c.is_ascii_alphanumeric()
        } else {
            c.is_alphanumeric()
        };
        if is_alnum {
            slug.push(c);
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }
    slug.trim_end_matches('-').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ExtractionConfig {
        ExtractionConfig::default()
    }

    #[test]
    fn trims_and_collapses_whitespace() {
        let extraction = normalize("  Personal   Protective Equipment  ", &config());
        assert_eq!(extraction.topic, "Personal Protective Equipment");
        assert_eq!(extraction.topic_name, "personal-protective-equipment");
    }

    #[test]
    fn strips_orphan_leading_connector() {
        let extraction = normalize(", Oil & Gas", &config());
        assert_eq!(extraction.topic, "Oil & Gas");
        assert_eq!(extraction.topic_name, "oil-and-gas");
    }

    #[test]
    fn strips_orphan_trailing_connector_word() {
        let extraction = normalize("Automotive Electronics and", &config());
        assert_eq!(extraction.topic, "Automotive Electronics");
    }

    #[test]
    fn preserves_internal_hyphen_compound() {
        let extraction = normalize("Plus-Size Fashion", &config());
        assert_eq!(extraction.topic, "Plus-Size Fashion");
        assert_eq!(extraction.topic_name, "plus-size-fashion");
    }

    #[test]
    fn empty_residual_yields_empty_topic_and_slug() {
        let extraction = normalize("", &config());
        assert_eq!(extraction.topic, "");
        assert_eq!(extraction.topic_name, "");
    }

    #[test]
    fn ampersand_and_plus_tokens_become_words_in_slug() {
        let extraction = normalize("Oil & Gas Plus Exploration", &config());
        assert_eq!(extraction.topic_name, "oil-and-gas-plus-exploration");
    }

    #[test]
    fn standalone_plus_symbol_becomes_word_but_glued_plus_is_untouched() {
        let extraction = normalize("C++ Development Tools", &config());
        assert_eq!(extraction.topic, "C++ Development Tools");
        assert_eq!(extraction.topic_name, "c-development-tools");
    }
}
