// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sentence-start detection for auto-capitalization.

/// Placeholder character for embedded objects (U+FFFC).
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';

const TERMINALS: [char; 6] = ['.', '?', '!', '¡', '¿', OBJECT_REPLACEMENT];
const QUOTED_TERMINALS: [char; 3] = ['.', '?', '!'];
const DOUBLE_QUOTES: [char; 3] = ['"', '\u{201D}', '\u{201E}'];

/// Whether `before_cursor` ends a sentence, so the next letter is capitalized.
///
/// A sentence ends with `. ? ! ¡ ¿` or an object replacement character,
/// followed by at least one space. With `closing_quotes` (English), a closing
/// quote or a single/double quote pair may sit between `. ? !` and the spaces.
///
/// ```
/// use understory_kbd_input::triggers_auto_caps;
///
/// assert!(triggers_auto_caps("Done. ", false));
/// assert!(!triggers_auto_caps("Done.", false));
/// assert!(triggers_auto_caps("He said \"hi.\" ", true));
/// assert!(!triggers_auto_caps("He said \"hi.\" ", false));
/// ```
pub fn triggers_auto_caps(before_cursor: &str, closing_quotes: bool) -> bool {
    let trimmed = before_cursor.trim_end_matches(' ');
    if trimmed.len() == before_cursor.len() {
        return false;
    }
    if trimmed.ends_with(TERMINALS) {
        return true;
    }
    closing_quotes && strip_closing_quote(trimmed).is_some_and(|rest| rest.ends_with(QUOTED_TERMINALS))
}

fn is_quote(c: char) -> bool {
    c == '\'' || DOUBLE_QUOTES.contains(&c)
}

/// Strips one closing quote, or a pair made of one single and one double quote.
fn strip_closing_quote(text: &str) -> Option<&str> {
    let mut chars = text.chars();
    let last = chars.next_back().filter(|&c| is_quote(c))?;
    let rest = chars.as_str();
    let mut before = rest.chars();
    match before.next_back() {
        Some(prev) if is_quote(prev) && ((prev == '\'') != (last == '\'')) => Some(before.as_str()),
        _ => Some(rest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminals_need_a_space() {
        for text in ["Hi. ", "Why?  ", "No! ", "¡ ", "¿ ", "\u{FFFC} "] {
            assert!(triggers_auto_caps(text, false), "{text:?}");
        }
        for text in ["", " ", "Hi.", "Hi ", "a, "] {
            assert!(!triggers_auto_caps(text, false), "{text:?}");
        }
    }

    #[test]
    fn english_closing_quotes() {
        for text in ["\"Go!\" ", "'Go.' ", "Go.\u{201D} ", "Go.\"' ", "Go.'\u{201E} "] {
            assert!(triggers_auto_caps(text, true), "{text:?}");
        }
        assert!(!triggers_auto_caps("Go.'' ", true), "two single quotes do not pair");
        assert!(!triggers_auto_caps("Go,\" ", true));
        assert!(!triggers_auto_caps("¿\" ", true), "only . ? ! may precede a quote");
    }
}
