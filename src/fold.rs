// 🔤 Text Folding - Normalized comparison keys for country names
//
// "Côte d'Ivoire", "Cote-d-Ivoire", "COTE D IVOIRE" → "cote d ivoire"
//
// Every comparison in the resolver happens on folded text, so this module
// must stay pure: same input, same output, no locale.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// FOLDING
// ============================================================================

/// Fold a free-text name into its comparison key.
///
/// - Trim, lowercase
/// - NFKD decomposition, combining marks removed (accent stripping)
/// - Anything that is not a letter, digit or whitespace becomes a space
/// - Whitespace runs collapsed to one space, trimmed
pub fn fold(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();

    let replaced: String = lowered
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fold an optional value; `None` folds to the empty string.
pub fn fold_opt(raw: Option<&str>) -> String {
    raw.map(fold).unwrap_or_default()
}

// ============================================================================
// QUALIFIER STRIPPING
// ============================================================================

/// Remove generic qualifier words from an already folded name.
///
/// Qualifiers match whole tokens only ("state" does not touch "states");
/// multi-token qualifiers such as "people s" match as a phrase. Connector
/// words left dangling at either edge ("iran of") are trimmed afterwards.
///
/// Example: "iran islamic republic of" → "iran"
pub fn strip_qualifiers(folded: &str, qualifiers: &[String], connectors: &[String]) -> String {
    let tokens: Vec<&str> = folded.split_whitespace().collect();
    let phrases: Vec<Vec<&str>> = qualifiers
        .iter()
        .map(|q| q.split_whitespace().collect::<Vec<_>>())
        .filter(|p| !p.is_empty())
        .collect();

    let mut kept: Vec<&str> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let matched = phrases
            .iter()
            .find(|phrase| tokens[i..].starts_with(phrase.as_slice()));

        match matched {
            Some(phrase) => i += phrase.len(),
            None => {
                kept.push(tokens[i]);
                i += 1;
            }
        }
    }

    let is_connector = |t: &str| connectors.iter().any(|c| c.as_str() == t);
    while kept.first().map_or(false, |t| is_connector(*t)) {
        kept.remove(0);
    }
    while kept.last().map_or(false, |t| is_connector(*t)) {
        kept.pop();
    }

    kept.join(" ")
}

// ============================================================================
// TESTS
// ============================================================================
