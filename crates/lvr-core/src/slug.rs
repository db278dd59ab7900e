//! URL-safe slug derivation for property addresses and agent names.

/// Derive a slug from free text.
///
/// Lowercases ASCII letters, drops every character that is not an ASCII
/// alphanumeric, whitespace or `-`, and collapses runs of whitespace/hyphens
/// into a single `-`. Leading and trailing hyphens are trimmed, so the result
/// is empty only when the input has no alphanumerics at all.
///
/// `slugify(slugify(x)) == slugify(x)` for every input.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_sep = false;

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' {
            pending_sep = true;
        }
    }

    out
}

/// Returns true when `value` is already in canonical slug form.
#[must_use]
pub fn is_slug(value: &str) -> bool {
    !value.is_empty() && slugify(value) == value
}

#[cfg(test)]
mod tests {
    use super::{is_slug, slugify};
    use proptest::prelude::*;

    #[test]
    fn address_becomes_hyphenated_slug() {
        assert_eq!(
            slugify("456 Beachside Dr, Seacrest Beach, FL 32461"),
            "456-beachside-dr-seacrest-beach-fl-32461"
        );
    }

    #[test]
    fn punctuation_is_removed_not_replaced() {
        assert_eq!(slugify("St. John's Pl."), "st-johns-pl");
        assert_eq!(slugify("A&B"), "ab");
    }

    #[test]
    fn separators_collapse_and_trim() {
        assert_eq!(slugify("  --Kaci   Wolkers--  "), "kaci-wolkers");
        assert_eq!(slugify("a - b"), "a-b");
    }

    #[test]
    fn empty_and_symbol_only_inputs_yield_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("  ,.;  "), "");
        assert!(!is_slug(""));
    }

    #[test]
    fn non_ascii_letters_are_dropped() {
        assert_eq!(slugify("Café Lane"), "caf-lane");
    }

    proptest! {
        #[test]
        fn slugify_is_idempotent(input in ".{0,64}") {
            let once = slugify(&input);
            prop_assert_eq!(slugify(&once), once.clone());
        }

        #[test]
        fn slug_charset_is_url_safe(input in ".{0,64}") {
            let slug = slugify(&input);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }
    }
}
