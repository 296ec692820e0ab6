use std::collections::BTreeSet;

/// A word token of a line, with its byte range in the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lowercased token text.
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Normalize free text for catalog comparison.
///
/// Lowercases, turns punctuation into spaces and collapses whitespace, so
/// "Paint,  Flammable" and "paint flammable" compare equal.
pub fn normalize_term(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else {
            pending_space = true;
        }
    }

    out
}

/// Split a line into alphanumeric tokens, keeping byte offsets.
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in line.char_indices() {
        if c.is_alphanumeric() {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            tokens.push(make_token(line, s, i));
        }
    }

    if let Some(s) = start {
        tokens.push(make_token(line, s, line.len()));
    }

    tokens
}

fn make_token(line: &str, start: usize, end: usize) -> Token {
    Token {
        text: line[start..end].to_lowercase(),
        start,
        end,
    }
}

/// Token set of an already normalized term.
pub fn token_set(normalized: &str) -> BTreeSet<&str> {
    normalized.split(' ').filter(|t| !t.is_empty()).collect()
}

/// Jaccard similarity of two token sets. Two empty sets score 0.
pub fn jaccard(a: &BTreeSet<&str>, b: &BTreeSet<&str>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}
