use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Namespace given to keys without a colon.
pub const DEFAULT_TAG_TYPE: &str = "regular";

static LOWER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([a-z]|_)*$").unwrap());

static LOWER_COLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([a-z]|_)*:([a-z]|_)*$").unwrap());

static PROBLEM_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[=\+/&<>;'"\?%#$@,\. \t\r\n]"#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    Lower,
    LowerColon,
    #[serde(rename = "problemchars")]
    ProblemChars,
    Other,
}

/// Everything the pipeline needs to know about a raw tag key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyClass<'a> {
    pub key_type: KeyType,
    pub namespace: &'a str,
    pub local: &'a str,
    pub problematic: bool,
}

pub fn key_type(key: &str) -> KeyType {
    if LOWER.is_match(key) {
        KeyType::Lower
    } else if LOWER_COLON.is_match(key) {
        KeyType::LowerColon
    } else if PROBLEM_CHARS.is_match(key) {
        KeyType::ProblemChars
    } else {
        KeyType::Other
    }
}

pub fn has_problem_chars(key: &str) -> bool {
    PROBLEM_CHARS.is_match(key)
}

/// Splits at the first colon only; anything after it, further colons
/// included, is the local name.
pub fn split_key<'a>(key: &'a str, default_type: &'a str) -> (&'a str, &'a str) {
    key.split_once(':').unwrap_or((default_type, key))
}

pub fn classify<'a>(key: &'a str, default_type: &'a str) -> KeyClass<'a> {
    let (namespace, local) = split_key(key, default_type);
    KeyClass {
        key_type: key_type(key),
        namespace,
        local,
        problematic: has_problem_chars(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn key_types() {
        assert_eq!(key_type("highway"), KeyType::Lower);
        assert_eq!(key_type("is_in"), KeyType::Lower);
        assert_eq!(key_type("addr:street"), KeyType::LowerColon);
        assert_eq!(key_type("addr:street:name"), KeyType::Other);
        assert_eq!(key_type("name_1 2"), KeyType::ProblemChars);
        assert_eq!(key_type("fixme?"), KeyType::ProblemChars);
        assert_eq!(key_type("FIXME"), KeyType::Other);
        assert_eq!(key_type("name:es"), KeyType::LowerColon);
    }

    #[test]
    fn problem_chars_cover_whitespace_and_punctuation() {
        for key in ["a=b", "a+b", "a/b", "a&b", "a<b", "a>b", "a;b", "a'b", "a\"b", "a?b", "a%b", "a#b", "a$b", "a@b",
            "a,b", "a.b", "a b", "a\tb", "a\rb", "a\nb"]
        {
            assert!(has_problem_chars(key), "{key:?} should be problematic");
        }
        assert!(!has_problem_chars("addr:housenumber"));
    }

    #[test]
    fn classify_problematic_key_still_splits() {
        let class = classify("addr:street name", DEFAULT_TAG_TYPE);
        assert_eq!(class.key_type, KeyType::ProblemChars);
        assert!(class.problematic);
        assert_eq!(class.namespace, "addr");
        assert_eq!(class.local, "street name");
    }

    #[test]
    fn split_at_first_colon_only() {
        assert_eq!(split_key("addr:street", DEFAULT_TAG_TYPE), ("addr", "street"));
        assert_eq!(split_key("name", DEFAULT_TAG_TYPE), ("regular", "name"));
        assert_eq!(split_key("seamark:light:colour", DEFAULT_TAG_TYPE), ("seamark", "light:colour"));
    }

    proptest! {
        #[test]
        fn one_colon_splits_losslessly(prefix in "[^:]{0,10}", suffix in "[^:]{0,10}") {
            let key = format!("{prefix}:{suffix}");
            let (namespace, local) = split_key(&key, DEFAULT_TAG_TYPE);
            prop_assert_eq!(format!("{namespace}:{local}"), key);
        }

        #[test]
        fn no_colon_uses_default_namespace(key in "[^:]{0,16}") {
            let (namespace, local) = split_key(&key, DEFAULT_TAG_TYPE);
            prop_assert_eq!(namespace, DEFAULT_TAG_TYPE);
            prop_assert_eq!(local, key.as_str());
        }

        #[test]
        fn many_colons_keep_remainder(prefix in "[^:]{0,6}", rest in "[^:]{0,6}(:[^:]{0,6}){1,3}") {
            let key = format!("{prefix}:{rest}");
            let (namespace, local) = split_key(&key, DEFAULT_TAG_TYPE);
            prop_assert_eq!(namespace, prefix.as_str());
            prop_assert_eq!(local, rest.as_str());
        }
    }
}
