//! Locale-aware text ordering for sort keys.
//!
//! Approximates a root-locale collator at three strengths:
//! - primary: base letters, ignoring accents and case (`"joão"` ~ `"joao"`);
//! - secondary: accents (`"joao"` < `"joão"`);
//! - tertiary: case, lowercase first (`"ana"` < `"Ana"`).

use std::cmp::Ordering;

pub fn compare_text(left: &str, right: &str) -> Ordering {
    primary_key(left)
        .cmp(primary_key(right))
        .then_with(|| secondary_key(left).cmp(secondary_key(right)))
        .then_with(|| tertiary_key(left).cmp(tertiary_key(right)))
}

fn primary_key(text: &str) -> impl Iterator<Item = char> + '_ {
    text.chars().flat_map(|ch| strip_diacritic(ch).to_lowercase())
}

fn secondary_key(text: &str) -> impl Iterator<Item = char> + '_ {
    text.chars().flat_map(char::to_lowercase)
}

fn tertiary_key(text: &str) -> impl Iterator<Item = bool> + '_ {
    text.chars().map(char::is_uppercase)
}

/// Base letter for Latin-1 accented characters; anything else is unchanged.
fn strip_diacritic(ch: char) -> char {
    match ch {
        'À'..='Å' => 'A',
        'à'..='å' => 'a',
        'Ç' => 'C',
        'ç' => 'c',
        'È'..='Ë' => 'E',
        'è'..='ë' => 'e',
        'Ì'..='Ï' => 'I',
        'ì'..='ï' => 'i',
        'Ñ' => 'N',
        'ñ' => 'n',
        'Ò'..='Ö' | 'Ø' => 'O',
        'ò'..='ö' | 'ø' => 'o',
        'Ù'..='Ü' => 'U',
        'ù'..='ü' => 'u',
        'Ý' => 'Y',
        'ý' | 'ÿ' => 'y',
        _ => ch,
    }
}
