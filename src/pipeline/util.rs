/// Collapses runs of whitespace to a single ASCII space and trims the ends.
/// Shared by every stage's residual cleanup.
pub fn collapse_whitespace(s: &str) -> String {
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

/// Removes `text[start..end]`, also stripping a comma left dangling immediately
/// on either edge of the gap (modulo whitespace), then collapses whitespace.
/// Used by the date extractor and the report-type extractor's standard
/// workflow, per SPEC_FULL.md §4.2 and §4.3.1 step 5.
pub fn remove_span_strip_dangling_comma(text: &str, start: usize, end: usize) -> String {
    let before = &text[..start];
    let before_trimmed = before.trim_end();
    let before = if before_trimmed.ends_with(',') {
        &before_trimmed[..before_trimmed.len() - 1]
    } else {
        before_trimmed
    };

    let after = &text[end..];
    let after_trimmed = after.trim_start();
    let after = after_trimmed.strip_prefix(',').unwrap_or(after_trimmed);

    collapse_whitespace(&format!("{}{}", before, after))
}

/// Extends a matched span's end to swallow one immediately-adjacent connector
/// (an optional leading space, then `,` or `&`, then an optional trailing
/// space) -- used by the geographic detector so that "APAC & Middle East"
/// removes the joining " & " along with each matched region rather than
/// leaving it stranded between two deletions (SPEC_FULL.md §4.4).
pub fn extend_span_end_over_connector(text: &str, end: usize) -> usize {
    let rest = &text[end..];
    let mut chars = rest.char_indices().peekable();

    let after_space = match chars.peek() {
        Some(&(i, c)) if c == ' ' => {
            chars.next();
            i + c.len_utf8()
        }
        _ => 0,
    };

    match chars.peek() {
        Some(&(i, c)) if c == ',' || c == '&' => {
            let consumed = i + c.len_utf8();
            chars.next();
            let after_connector = match chars.peek() {
                Some(&(i2, c2)) if c2 == ' ' => i2 + c2.len_utf8(),
                _ => consumed,
            };
            end + after_connector
        }
        _ => {
            let _ = after_space;
            end
        }
    }
}

/// Removes every `[start, end)` span in `spans` (already sorted, non-overlapping,
/// in source order) from `text`, then collapses whitespace.
pub fn remove_spans(text: &str, spans: &[(usize, usize)]) -> String {
    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;
    for &(start, end) in spans {
        result.push_str(&text[cursor..start]);
        cursor = end;
    }
    result.push_str(&text[cursor..]);
    collapse_whitespace(&result)
}

/// True if `word` is a bare, unrecognized acronym: 2-6 ASCII uppercase letters.
pub fn looks_like_acronym(word: &str) -> bool {
    let len = word.chars().count();
    (2..=6).contains(&len) && word.chars().all(|c| c.is_ascii_uppercase())
}

/// Byte offset of the first non-whitespace character at or after `pos`.
pub fn skip_whitespace(text: &str, pos: usize) -> usize {
    let mut end = pos;
    for c in text[pos..].chars() {
        if c.is_whitespace() {
            end += c.len_utf8();
        } else {
            break;
        }
    }
    end
}

/// Byte offset of the end of the whitespace-delimited word starting at `pos`
/// (assumed to already be on a non-whitespace character).
pub fn word_end(text: &str, pos: usize) -> usize {
    let mut end = pos;
    for c in text[pos..].chars() {
        if c.is_whitespace() {
            break;
        }
        end += c.len_utf8();
    }
    end
}
