//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    /// Generate a library or board identifier (alphanumeric with underscores)
    pub fn identifier() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9_]{0,20}"
    }

    /// Generate a version with one to three numeric components
    pub fn loose_version() -> impl Strategy<Value = String> {
        prop::collection::vec(0u32..50, 1..=3).prop_map(|parts| {
            parts
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(".")
        })
    }

    /// Generate text that contains no unescaped `{` or `}`
    pub fn macro_free_text() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                4 => "[A-Za-z0-9 ._/=-]{1,8}",
                1 => Just(r"\{".to_string()),
                1 => Just(r"\}".to_string()),
            ],
            0..12,
        )
        .prop_map(|chunks| chunks.concat())
    }

    /// Generate a dotted property key such as `build.mcu`
    pub fn property_key() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z][a-z0-9_]{0,8}", 1..4).prop_map(|parts| parts.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_loose_version_generator(version in loose_version()) {
            let parts: Vec<&str> = version.split('.').collect();
            prop_assert!((1..=3).contains(&parts.len()));
            for part in parts {
                prop_assert!(part.parse::<u32>().is_ok());
            }
        }

        #[test]
        fn test_macro_free_text_has_only_escaped_braces(text in macro_free_text()) {
            let bytes = text.as_bytes();
            for (index, byte) in bytes.iter().enumerate() {
                if *byte == b'{' || *byte == b'}' {
                    prop_assert!(index > 0 && bytes[index - 1] == b'\\');
                }
            }
        }

        #[test]
        fn test_property_key_generator(key in property_key()) {
            prop_assert!(!key.starts_with('.'));
            prop_assert!(!key.ends_with('.'));
        }
    }
}
