//! Text helpers used when packaging generated content.

/// Counts whitespace-delimited tokens.
pub fn word_count(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

/// Title-cases `text`: every letter that follows a non-letter is upper-cased,
/// every other letter is lower-cased.
///
/// `"rust's ownership model"` becomes `"Rust'S Ownership Model"`; apostrophes
/// start a new word just like spaces do.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }
    out
}

/// Truncates `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
