//! # Character and word boundaries
//!
//! Moving the caret or deleting "one character" must step over whole
//! user-perceived characters: an emoji with a skin-tone modifier, a ZWJ
//! family, a flag made of two regional indicators, a letter with combining
//! accents or a spacing vowel sign, a Hangul syllable spelled in jamo, a CRLF.
//! Each function returns how many `char`s to step from `offset` in one
//! direction. They are pure and operate on the flattened text of a block.
//!
//! Character steps follow extended grapheme cluster boundaries. Word steps
//! skip leading whitespace and punctuation, then take the word run that
//! follows; an apostrophe counts as part of a word only when a word
//! character comes after it.

use unicode_general_category::{get_general_category, GeneralCategory};
use unicode_segmentation::{GraphemeCursor, UnicodeSegmentation};

fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices().nth(offset).map_or(text.len(), |(byte, _)| byte)
}

fn is_chameleon(c: char) -> bool {
    matches!(c, '\'' | '\u{2018}' | '\u{2019}')
}

fn is_punctuation(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::OtherPunctuation
            | GeneralCategory::OpenPunctuation
            | GeneralCategory::ClosePunctuation
            | GeneralCategory::InitialPunctuation
            | GeneralCategory::FinalPunctuation
            | GeneralCategory::ConnectorPunctuation
            | GeneralCategory::DashPunctuation
    )
}

fn first_char(cluster: &str) -> Option<char> {
    cluster.chars().next()
}

/// Word flag for each cluster in scan order. A run of apostrophes takes the
/// flag of the first cluster after the run, so one backward pass settles it.
fn word_flags(scan: &[&str]) -> Vec<bool> {
    let mut flags = vec![false; scan.len()];
    let mut following = false;
    for (i, cluster) in scan.iter().enumerate().rev() {
        let Some(c) = first_char(cluster) else {
            continue;
        };
        if is_chameleon(c) {
            flags[i] = following;
        } else {
            following = !c.is_whitespace() && !is_punctuation(c);
            flags[i] = following;
        }
    }
    flags
}

/// Leading non-word clusters, then the word run that follows
fn word_length(scan: &[&str]) -> usize {
    let flags = word_flags(scan);
    let mut length = 0;
    let mut started = false;
    for (cluster, is_word) in scan.iter().zip(flags) {
        if is_word {
            started = true;
        } else if started {
            break;
        }
        length += cluster.chars().count();
    }
    length
}

/// Chars from `offset` back to the start of the previous character
pub fn char_offset_backward(text: &str, offset: usize) -> usize {
    let byte = byte_index(text, offset);
    let mut cursor = GraphemeCursor::new(byte, text.len(), true);
    match cursor.prev_boundary(text, 0) {
        Ok(Some(start)) => text[start..byte].chars().count(),
        _ => 0,
    }
}

/// Chars from `offset` to the end of the next character
pub fn char_offset_forward(text: &str, offset: usize) -> usize {
    let byte = byte_index(text, offset);
    let mut cursor = GraphemeCursor::new(byte, text.len(), true);
    match cursor.next_boundary(text, 0) {
        Ok(Some(end)) => text[byte..end].chars().count(),
        _ => 0,
    }
}

/// Chars from `offset` back to the start of the previous word, skipping
/// whitespace and punctuation first
pub fn word_offset_backward(text: &str, offset: usize) -> usize {
    let before = &text[..byte_index(text, offset)];
    let scan: Vec<&str> = before.graphemes(true).rev().collect();
    word_length(&scan)
}

/// Chars from `offset` to the end of the next word
pub fn word_offset_forward(text: &str, offset: usize) -> usize {
    let after = &text[byte_index(text, offset)..];
    let scan: Vec<&str> = after.graphemes(true).collect();
    word_length(&scan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn len(s: &str) -> usize {
        s.chars().count()
    }

    #[test]
    fn test_plain_characters() {
        assert_eq!(char_offset_backward("abc", 3), 1);
        assert_eq!(char_offset_forward("abc", 0), 1);
        assert_eq!(char_offset_backward("abc", 0), 0);
        assert_eq!(char_offset_forward("abc", 3), 0);
    }

    #[test]
    fn test_combining_marks_stay_with_base() {
        let text = "e\u{301}x";
        assert_eq!(char_offset_forward(text, 0), 2);
        assert_eq!(char_offset_backward(text, 2), 2);
    }

    #[test]
    fn test_spacing_marks_and_jamo() {
        // Devanagari "ni": consonant plus a spacing vowel sign
        assert_eq!(char_offset_backward("\u{0928}\u{093F}", 2), 2);
        assert_eq!(char_offset_forward("\u{0928}\u{093F}", 0), 2);

        // Hangul syllable spelled with leading and vowel jamo
        assert_eq!(char_offset_backward("\u{1100}\u{1161}", 2), 2);
        assert_eq!(char_offset_forward("\u{1100}\u{1161}\u{11A8}", 0), 3);
    }

    #[test]
    fn test_crlf_is_one_character() {
        assert_eq!(char_offset_backward("a\r\n", 3), 2);
        assert_eq!(char_offset_forward("a\r\nb", 1), 2);
    }

    #[test]
    fn test_modifier_sequences() {
        let thumbs = "a👍🏽";
        assert_eq!(char_offset_backward(thumbs, len(thumbs)), 2);
        assert_eq!(char_offset_forward(thumbs, 1), 2);
    }

    #[test]
    fn test_zwj_sequences() {
        let family = "👨\u{200D}👩\u{200D}👧";
        let text = format!("x{}y", family);
        assert_eq!(char_offset_forward(&text, 1), len(family));
        assert_eq!(char_offset_backward(&text, 1 + len(family)), len(family));
    }

    #[test]
    fn test_variation_selector_and_keycap() {
        let heart = "❤\u{FE0F}";
        assert_eq!(char_offset_backward(heart, 2), 2);

        let keycap = "1\u{FE0F}\u{20E3}";
        assert_eq!(char_offset_forward(keycap, 0), 3);
        assert_eq!(char_offset_backward(keycap, 3), 3);
    }

    #[test]
    fn test_regional_indicators_pair_up() {
        let flags = "🇺🇸🇬🇧";
        assert_eq!(char_offset_backward(flags, 4), 2);
        assert_eq!(char_offset_forward(flags, 0), 2);

        // An unpaired trailing indicator stands alone.
        let odd = "🇺🇸🇬";
        assert_eq!(char_offset_backward(odd, 3), 1);
        assert_eq!(char_offset_backward(odd, 2), 2);
    }

    #[test]
    fn test_word_backward_keeps_apostrophe_with_word() {
        let text = "don't stop";
        assert_eq!(word_offset_backward(text, len(text)), 4);
        assert_eq!(word_offset_backward(text, 5), 5);
        assert_eq!(word_offset_backward(text, 6), 6);
    }

    #[test]
    fn test_word_forward() {
        let text = "  hello, world";
        assert_eq!(word_offset_forward(text, 0), 7);
        assert_eq!(word_offset_forward(text, 7), 7);
        assert_eq!(word_offset_forward("it's", 0), 4);
    }

    #[test]
    fn test_trailing_apostrophe_is_punctuation() {
        assert_eq!(word_offset_forward("dogs' bowl", 0), 4);
        assert_eq!(word_offset_backward("'quoted", 7), 6);
    }

    #[test]
    fn test_long_apostrophe_runs() {
        let run = "'".repeat(200_000);
        assert_eq!(word_offset_backward(&run, 200_000), 200_000);
        assert_eq!(word_offset_forward(&run, 0), 200_000);

        let leading = format!("{}abc def", "'".repeat(50_000));
        assert_eq!(word_offset_forward(&leading, 0), 50_003);
    }
}
