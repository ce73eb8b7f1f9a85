#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Near-duplicate detection between two lines of code.

use crate::constants::{OPERATORS, RELATED_SIMILARITY_FLOOR};

/// Characters that always form a token on their own.
const PUNCTUATION: &[char] = &['(', ')', '[', ']', '{', '}', ':', ',', ';', '.'];

/// Returns true if `a` and `b` are near-duplicates: one token swapped, one
/// operator swapped for another, or a normalized edit-distance similarity in
/// `(0.7, 1.0)`. Lines that normalize to the same text are not related, they
/// are the same line.
pub fn related(a: &str, b: &str) -> bool {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    if tokens_a == tokens_b {
        return false;
    }

    single_token_differs(&tokens_a, &tokens_b) || operator_substitution(&tokens_a, &tokens_b) || {
        let similarity = similarity(&normalize(a), &normalize(b));
        similarity > RELATED_SIMILARITY_FLOOR && similarity < 1.0
    }
}

/// Lower-cases, drops quotes, trims and collapses runs of whitespace to a
/// single space.
pub fn normalize(line: &str) -> String {
    strip_quotes(&line.to_lowercase())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Removes single and double quotes.
fn strip_quotes(text: &str) -> String {
    text.chars().filter(|c| *c != '\'' && *c != '"').collect()
}

/// Lower-cases, drops quotes and splits a line into identifier, number,
/// operator and punctuation tokens.
pub fn tokenize(line: &str) -> Vec<String> {
    let cleaned = strip_quotes(&line.to_lowercase());

    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut rest = cleaned.as_str();

    while let Some(c) = rest.chars().next() {
        if c.is_alphanumeric() || c == '_' {
            word.push(c);
            rest = &rest[c.len_utf8()..];
            continue;
        }

        if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }

        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
        } else if let Some(op) = symbolic_operator_prefix(rest) {
            tokens.push(op.to_string());
            rest = &rest[op.len()..];
        } else {
            if !PUNCTUATION.contains(&c) {
                tracing::trace!("Unrecognised symbol {c:?} kept as its own token");
            }
            tokens.push(c.to_string());
            rest = &rest[c.len_utf8()..];
        }
    }

    if !word.is_empty() {
        tokens.push(word);
    }

    tokens
}

/// Returns the longest symbolic operator that `text` starts with.
fn symbolic_operator_prefix(text: &str) -> Option<&'static str> {
    OPERATORS
        .iter()
        .filter(|op| !op.chars().any(char::is_alphabetic))
        .filter(|op| text.starts_with(**op))
        .max_by_key(|op| op.len())
        .copied()
}

/// Equal-length token sequences that differ in exactly one position.
fn single_token_differs(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().zip(b).filter(|(x, y)| x != y).count() == 1
}

/// Whether one token sequence becomes the other by swapping every
/// occurrence of one operator for another.
fn operator_substitution(a: &[String], b: &[String]) -> bool {
    let padded_a = format!(" {} ", a.join(" "));
    let padded_b = format!(" {} ", b.join(" "));

    let swaps = |from: &str, to: &str| {
        OPERATORS.iter().any(|op| {
            let needle = format!(" {op} ");
            from.contains(&needle)
                && OPERATORS
                    .iter()
                    .filter(|other| *other != op)
                    .any(|other| from.replace(&needle, &format!(" {other} ")) == to)
        })
    };

    swaps(&padded_a, &padded_b) || swaps(&padded_b, &padded_a)
}

/// Normalized similarity `(longer - distance) / longer` in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longer = a.chars().count().max(b.chars().count());
    if longer == 0 {
        return 1.0;
    }

    (longer - levenshtein_distance(a, b)) as f64 / longer as f64
}

/// Single-character insert/delete/substitute edit distance with unit costs.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
