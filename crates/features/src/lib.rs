//! Feature extraction for trademark text matching.
//!
//! Provides pure functions for computing the signals used in scoring:
//! - Phonetic encodings (Soundex, Metaphone)
//! - Text normalization
//! - Edit-distance and bigram-overlap similarity
//! - The weighted similarity breakdown (see [`similarity`])

pub mod similarity;

pub use similarity::{score, MarkProfile};

use rphonetic::{Encoder, Metaphone};

/// Length of a Soundex code.
pub const SOUNDEX_LEN: usize = 4;

/// Phonetic encoding results for a mark.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneticCodes {
    pub soundex: Option<String>,
    pub metaphone: Option<String>,
}

/// Soundex digit for an uppercase ASCII letter; `None` for letters that are dropped.
fn soundex_digit(letter: char) -> Option<char> {
    match letter {
        'B' | 'F' | 'P' | 'V' => Some('1'),
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => Some('2'),
        'D' | 'T' => Some('3'),
        'L' => Some('4'),
        'M' | 'N' => Some('5'),
        'R' => Some('6'),
        _ => None,
    }
}

/// Encode a name as a 4-character Soundex code.
///
/// Non-letters are ignored. The first letter is kept as-is; later letters map
/// to digit groups, vowels and H/W/Y are dropped, and a digit equal to the
/// previously emitted digit is suppressed. The result is right-padded with
/// `'0'`. A name without letters encodes to an empty string.
pub fn soundex(name: &str) -> String {
    let mut letters = name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase());

    let Some(first) = letters.next() else {
        return String::new();
    };

    let mut code = String::with_capacity(SOUNDEX_LEN);
    code.push(first);

    let mut last_emitted = None;
    for digit in letters.filter_map(soundex_digit) {
        if code.len() == SOUNDEX_LEN {
            break;
        }
        if last_emitted == Some(digit) {
            continue;
        }
        code.push(digit);
        last_emitted = Some(digit);
    }

    while code.len() < SOUNDEX_LEN {
        code.push('0');
    }
    code
}

/// Full-length Metaphone code for a name, falling back to its first four
/// characters (uppercased) when the encoder yields nothing.
pub fn metaphone(name: &str) -> String {
    // Uncapped: a shared four-letter prefix is not a sound-alike
    let encoder = Metaphone::new(None);
    let letters: String = name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let code = if letters.is_empty() {
        String::new()
    } else {
        encoder.encode(&letters)
    };

    if code.is_empty() {
        name.chars().take(SOUNDEX_LEN).collect::<String>().to_uppercase()
    } else {
        code
    }
}

/// Compute phonetic encodings for a mark text.
pub fn compute_phonetics(text: &str) -> PhoneticCodes {
    let soundex_code = soundex(text);
    let metaphone_code = metaphone(text);

    PhoneticCodes {
        soundex: if soundex_code.is_empty() { None } else { Some(soundex_code) },
        metaphone: if metaphone_code.is_empty() { None } else { Some(metaphone_code) },
    }
}

/// Compare precomputed phonetic codes; returns the algorithm and shared code.
pub fn codes_match(codes1: &PhoneticCodes, codes2: &PhoneticCodes) -> Option<(&'static str, String)> {
    if let (Some(s1), Some(s2)) = (&codes1.soundex, &codes2.soundex) {
        if s1 == s2 {
            return Some(("soundex", s1.clone()));
        }
    }

    if let (Some(m1), Some(m2)) = (&codes1.metaphone, &codes2.metaphone) {
        if m1 == m2 {
            return Some(("metaphone", m1.clone()));
        }
    }

    None
}

/// Check if two texts are phonetically similar.
pub fn phonetic_match(text1: &str, text2: &str) -> Option<(&'static str, String)> {
    codes_match(&compute_phonetics(text1), &compute_phonetics(text2))
}

/// Lowercase and drop all whitespace.
pub fn normalize_compact(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compute Levenshtein edit distance between two strings, in characters.
pub fn edit_distance(s1: &str, s2: &str) -> usize {
    strsim::levenshtein(s1, s2)
}

/// Edit distance scaled to 0..=100, where 100 means identical.
pub fn edit_similarity(s1: &str, s2: &str) -> u8 {
    let max_len = s1.chars().count().max(s2.chars().count());
    if max_len == 0 {
        return 100;
    }
    let distance = edit_distance(s1, s2);
    let similarity = (max_len - distance) as f64 / max_len as f64 * 100.0;
    similarity.round() as u8
}

/// Bigram Sørensen–Dice coefficient scaled to 0..=100. Whitespace is ignored.
pub fn bigram_similarity(s1: &str, s2: &str) -> u8 {
    (strsim::sorensen_dice(s1, s2) * 100.0).round() as u8
}

/// Check Nice class overlap.
pub fn class_overlap(classes1: &[u16], classes2: &[u16]) -> Vec<u16> {
    classes1
        .iter()
        .filter(|c| classes2.contains(c))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soundex_known_codes() {
        assert_eq!(soundex("NIKE"), "N200");
        assert_eq!(soundex("nyke"), "N200");
        assert_eq!(soundex("Robert"), "R163");
        assert_eq!(soundex("Rupert"), "R163");
        assert_eq!(soundex("SMITH"), "S530");
        assert_eq!(soundex("Pfister"), "P123");
        assert_eq!(soundex("A"), "A000");
    }

    #[test]
    fn test_soundex_suppresses_against_last_emitted() {
        // K follows Z(2) across a vowel and is still suppressed
        assert_eq!(soundex("Tymczak"), "T520");
        assert_eq!(soundex("Lee"), "L000");
    }

    #[test]
    fn test_soundex_ignores_non_letters() {
        assert_eq!(soundex("n-i k.e!"), soundex("NIKE"));
        assert_eq!(soundex("7UP"), "U100");
        assert_eq!(soundex(""), "");
        assert_eq!(soundex("1234 !?"), "");
    }

    #[test]
    fn test_soundex_length() {
        for name in ["a", "ab", "Washington", "Xerox Corporation", "zz top", "é9b"] {
            assert_eq!(soundex(name).len(), SOUNDEX_LEN, "{name}");
        }
    }

    #[test]
    fn test_metaphone_fallback() {
        assert_eq!(metaphone("1234567"), "1234");
        assert!(!metaphone("NIKE").is_empty());
    }

    #[test]
    fn test_metaphone_is_not_truncated() {
        let long = metaphone("PHILLIPSBURG");
        let short = metaphone("FILIPSON");
        assert!(long.starts_with("FLPS") && long.len() > 4, "{long}");
        assert!(short.starts_with("FLPS") && short.len() > 4, "{short}");
        assert_ne!(long, short);

        assert!(phonetic_match("PHILLIPSBURG", "FILIPSON").is_none());
        assert_eq!(score("PHILLIPSBURG", "FILIPSON").phonetic, 0);
    }

    #[test]
    fn test_phonetic_match() {
        // These should match phonetically
        assert!(phonetic_match("SMITH", "SMYTH").is_some());
        assert!(phonetic_match("NIKE", "NYKE").is_some());
        assert!(phonetic_match("NIKE", "ADIDAS").is_none());
    }

    #[test]
    fn test_phonetic_match_ignores_empty_soundex() {
        let (algorithm, _) = phonetic_match("NIKE", "NYKE").unwrap();
        assert_eq!(algorithm, "soundex");
        assert!(compute_phonetics("").soundex.is_none());
    }

    #[test]
    fn test_normalize_compact() {
        assert_eq!(normalize_compact("  Blue  Sky "), "bluesky");
        assert_eq!(normalize_compact("ACME\tInc"), "acmeinc");
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("NIKE", "NIKE"), 0);
        assert_eq!(edit_distance("NIKE", "NYKE"), 1);
        assert_eq!(edit_distance("NIKE", "ADIDAS"), 5);
    }

    #[test]
    fn test_edit_similarity() {
        assert_eq!(edit_similarity("", ""), 100);
        assert_eq!(edit_similarity("nike", "nikey"), 80);
        assert_eq!(edit_similarity("abc", "xyz"), 0);
    }

    #[test]
    fn test_bigram_similarity() {
        assert_eq!(bigram_similarity("nike", "nike"), 100);
        assert_eq!(bigram_similarity("nike", "nikey"), 86);
        assert_eq!(bigram_similarity("ab", "cd"), 0);
    }

    #[test]
    fn test_class_overlap() {
        assert_eq!(class_overlap(&[9, 25, 42], &[25, 35, 42]), vec![25, 42]);
        assert_eq!(class_overlap(&[1, 2], &[3, 4]), Vec::<u16>::new());
    }
}
