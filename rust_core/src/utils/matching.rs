//! Name normalization and similarity scoring for bowl and team names.
//!
//! Both sides of a match are hand-typed or provider-spelled, so every
//! comparison goes through one of these canonical forms:
//! - `normalize`: compact key for exact comparison ("Hawai'i" == "HAWAII")
//! - `tokenize` + `similarity`: word-set Jaccard for fuzzy bowl labels
//! - `normalize_winner_name`: the spelling written into the `winner` column

use std::collections::HashSet;
use strsim::jaro_winkler;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Apostrophe look-alikes. The okina (U+02BB) and U+02BC are letters to
/// `char::is_alphanumeric`, so they are dropped explicitly.
const APOSTROPHES: &[char] = &['\'', '\u{2019}', '\u{2018}', '\u{02BB}', '\u{02BC}', '`'];

/// Team spellings that stand in for an undecided participant.
const PLACEHOLDER_TEAMS: &[&str] = &["tbd", "tba", "tbdtbd", "winner", "loser"];

/// Canonical comparison key: lower-case, diacritics folded, everything that
/// is not a letter or digit removed (spaces included).
///
/// `None` yields an empty key, which every matching tier treats as
/// non-matching.
pub fn normalize<'a>(text: impl Into<Option<&'a str>>) -> String {
    let Some(text) = text.into() else {
        return String::new();
    };

    text.nfkd()
        .filter(|c| !is_combining_mark(*c) && !APOSTROPHES.contains(c))
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Lower-cased whitespace-separated words. Punctuation is kept.
pub fn tokenize<'a>(text: impl Into<Option<&'a str>>) -> HashSet<String> {
    let Some(text) = text.into() else {
        return HashSet::new();
    };

    text.to_lowercase()
        .split_whitespace()
        .map(|w| w.to_string())
        .collect()
}

/// Jaccard index of the two word sets, in `[0, 1]`.
///
/// Returns 0 when either side is empty or has no words.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let ta = tokenize(a);
    let tb = tokenize(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let intersection = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    intersection as f64 / union as f64
}

/// Spelling used for the `winner` column: lower-case, apostrophes (straight
/// or curly) and periods removed, trimmed.
pub fn normalize_winner_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| !APOSTROPHES.contains(c) && *c != '.')
        .collect::<String>()
        .trim()
        .to_string()
}

/// True for empty names and bracket placeholders like "TBD".
pub fn is_placeholder_team(name: &str) -> bool {
    let key = normalize(name);
    key.is_empty() || PLACEHOLDER_TEAMS.contains(&key.as_str())
}

/// Closest label by Jaro-Winkler on canonical keys, for unmatched-row hints.
///
/// Never used to decide a match.
pub fn closest_label<'a, I>(target: &str, labels: I) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let target_key = normalize(target);
    if target_key.is_empty() {
        return None;
    }

    labels
        .into_iter()
        .filter(|label| !label.trim().is_empty())
        .map(|label| (label, jaro_winkler(&target_key, &normalize(label))))
        .fold(None::<(&'a str, f64)>, |best, (label, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((label, score)),
        })
}
