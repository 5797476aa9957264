use std::collections::HashSet;

use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::data::osm::RawTag;

pub const HOUSE_NUMBER_KEY: &str = "addr:housenumber";
pub const INTERPOLATION_KEY: &str = "addr:interpolation";
pub const STREET_KEY: &str = "addr:street";
pub const NAME_KEY: &str = "name";
pub const ADDRESS_NAME_KEY: &str = "addr:name";
pub const SOURCE_KEY: &str = "source";

/// Substrings that mark a `name` value as a street.
pub const STREET_TOKENS: [&str; 11] = [
    "Av.", "Ave", "Avda.", "Avenida", "Calle", "Camino", "Diagonal", "Pje", "Pje.", "Psje", "Pasaje",
];

/// Known spellings of a data source, checked in order; the first one found
/// anywhere in the value replaces the whole value.
pub const SOURCE_VARIANTS: [(&str, &str); 5] = [
    ("www.ine.cl", "Instituto Nacional de Estadistica www.ine.cl"),
    ("Instituto Nacional De Estadisticas", "Instituto Nacional de Estadistica www.ine.cl"),
    ("Bing", "Bing"),
    ("bing", "Bing"),
    ("2016 por KG", "Reconocimiento cartográfico 2016 por KG"),
];

// `A` alone is a legitimate word ("Pasaje A"), so it only expands with its period.
static STREET_ABBREVIATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:A\.|(Avda|Ave|Av|Co|Psje|Pje|Fco|Sta)\b\.?)").unwrap());

fn expansion(stem: &str) -> &'static str {
    match stem {
        "Avda" | "Ave" | "Av" => "Avenida",
        "Co" => "Cerro",
        "Psje" | "Pje" => "Pasaje",
        "Fco" => "Francisco",
        "Sta" => "Santa",
        _ => "Avenida",
    }
}

/// A house number without any digit is really a name, unless it is the
/// conventional "s/n" (sin número).
pub fn fix_house_number(tag: &mut RawTag) -> bool {
    if tag.key == HOUSE_NUMBER_KEY
        && !tag.value.chars().any(|c| c.is_ascii_digit())
        && !tag.value.eq_ignore_ascii_case("s/n")
    {
        tag.key = NAME_KEY.to_string();
        return true;
    }
    false
}

pub fn fix_interpolation(tag: &mut RawTag) -> bool {
    if tag.key == INTERPOLATION_KEY && tag.value != "even" && tag.value != "odd" {
        tag.key = ADDRESS_NAME_KEY.to_string();
        return true;
    }
    false
}

pub fn looks_like_street(value: &str) -> bool {
    STREET_TOKENS.iter().any(|token| value.contains(token))
}

pub fn infer_street(tag: &mut RawTag, known_streets: &HashSet<String>) -> bool {
    if tag.key != NAME_KEY {
        return false;
    }
    let mut changed = false;
    if known_streets.contains(&tag.value) {
        tag.key = STREET_KEY.to_string();
        changed = true;
    }
    if looks_like_street(&tag.value) {
        tag.key = STREET_KEY.to_string();
        changed = true;
    }
    changed
}

pub fn expand_street_abbreviations(value: &str) -> String {
    STREET_ABBREVIATION
        .replace_all(value, |caps: &Captures| match caps.get(1) {
            Some(stem) => expansion(stem.as_str()),
            None => expansion("A"),
        })
        .into_owned()
}

pub fn canonical_source(value: &str) -> Option<&'static str> {
    SOURCE_VARIANTS
        .iter()
        .find(|(variant, _)| value.contains(variant))
        .map(|(_, canonical)| *canonical)
}

/// Applies the rewrite rules in their fixed order. Later rules see the key
/// chosen by earlier ones, so a house number that turns out to be a name can
/// go on to become a street.
#[derive(Debug, Default, Clone)]
pub struct TagNormalizer {
    known_streets: HashSet<String>,
}

impl TagNormalizer {
    pub fn new() -> Self {
        TagNormalizer::default()
    }

    pub fn with_known_streets<I, S>(streets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TagNormalizer {
            known_streets: streets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn known_streets(&self) -> &HashSet<String> {
        &self.known_streets
    }

    pub fn observe_street(&mut self, value: &str) {
        self.known_streets.insert(value.to_string());
    }

    /// Normalizes one tag in place. Raw `addr:street` values are remembered
    /// before any rule runs so later `name` tags can match them exactly.
    pub fn normalize(&mut self, tag: &mut RawTag) {
        if tag.key == STREET_KEY {
            self.observe_street(&tag.value);
        }

        if fix_house_number(tag) {
            debug!(value = tag.value.as_str(); "House number without digits reclassified as name");
        }
        if fix_interpolation(tag) {
            debug!(value = tag.value.as_str(); "Interpolation value reclassified as addr:name");
        }
        if infer_street(tag, &self.known_streets) {
            debug!(value = tag.value.as_str(); "Name reclassified as addr:street");
        }
        if tag.key == STREET_KEY {
            tag.value = expand_street_abbreviations(&tag.value);
        }
        if tag.key == SOURCE_KEY {
            if let Some(canonical) = canonical_source(&tag.value) {
                tag.value = canonical.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(key: &str, value: &str) -> RawTag {
        let mut tag = RawTag::new(key, value);
        TagNormalizer::new().normalize(&mut tag);
        tag
    }

    #[test]
    fn house_number_without_digits_becomes_name() {
        assert_eq!(normalized("addr:housenumber", "sin numero").key, "name");
        assert_eq!(normalized("addr:housenumber", "123").key, "addr:housenumber");
        assert_eq!(normalized("addr:housenumber", "12B").key, "addr:housenumber");
        assert_eq!(normalized("addr:housenumber", "s/n").key, "addr:housenumber");
        assert_eq!(normalized("addr:housenumber", "S/N").key, "addr:housenumber");
        assert_eq!(normalized("addr:housenumber", "S/n").key, "addr:housenumber");
    }

    #[test]
    fn house_number_never_touches_value() {
        let tag = normalized("addr:housenumber", "sin numero");
        assert_eq!(tag.value, "sin numero");
    }

    #[test]
    fn interpolation_other_than_even_or_odd_becomes_address_name() {
        assert_eq!(normalized("addr:interpolation", "even").key, "addr:interpolation");
        assert_eq!(normalized("addr:interpolation", "odd").key, "addr:interpolation");
        assert_eq!(normalized("addr:interpolation", "maybe").key, "addr:name");
        assert_eq!(normalized("addr:interpolation", "Even").key, "addr:name");
    }

    #[test]
    fn name_with_street_token_becomes_street() {
        assert_eq!(normalized("name", "Calle Larga").key, "addr:street");
        assert_eq!(normalized("name", "Nueva Diagonal Oriente").key, "addr:street");
        assert_eq!(normalized("name", "Farmacia Cruz Verde").key, "name");
    }

    #[test]
    fn street_token_at_start_counts() {
        assert!(looks_like_street("Avenida Matta"));
        assert!(looks_like_street("Pasaje 3"));
    }

    #[test]
    fn name_matching_observed_street_becomes_street() {
        let mut normalizer = TagNormalizer::new();
        let mut street = RawTag::new("addr:street", "Los Leones");
        normalizer.normalize(&mut street);

        let mut name = RawTag::new("name", "Los Leones");
        normalizer.normalize(&mut name);
        assert_eq!(name.key, "addr:street");

        let mut other = RawTag::new("name", "Los Leones Norte");
        normalizer.normalize(&mut other);
        assert_eq!(other.key, "name");
    }

    #[test]
    fn seeded_streets_are_known() {
        let mut normalizer = TagNormalizer::with_known_streets(["Providencia"]);
        let mut tag = RawTag::new("name", "Providencia");
        normalizer.normalize(&mut tag);
        assert_eq!(tag.key, "addr:street");
    }

    #[test]
    fn abbreviations_expand_as_whole_words() {
        assert_eq!(expand_street_abbreviations("Av. Libertador"), "Avenida Libertador");
        assert_eq!(expand_street_abbreviations("Avda Matta"), "Avenida Matta");
        assert_eq!(expand_street_abbreviations("Ave. Grecia"), "Avenida Grecia");
        assert_eq!(expand_street_abbreviations("A. Vespucio"), "Avenida Vespucio");
        assert_eq!(expand_street_abbreviations("Pje. Los Olmos"), "Pasaje Los Olmos");
        assert_eq!(expand_street_abbreviations("Psje Uno"), "Pasaje Uno");
        assert_eq!(expand_street_abbreviations("Co. San Cristobal"), "Cerro San Cristobal");
        assert_eq!(expand_street_abbreviations("Fco. Bilbao"), "Francisco Bilbao");
        assert_eq!(expand_street_abbreviations("Sta. Rosa"), "Santa Rosa");
        assert_eq!(expand_street_abbreviations("Pasaje A"), "Pasaje A");
        assert_eq!(expand_street_abbreviations("Costanera Sur"), "Costanera Sur");
    }

    #[test]
    fn abbreviation_expansion_is_idempotent() {
        for value in ["Avenida Libertador", "Pasaje Los Olmos", "Cerro Santa Lucia", "Francisco Bilbao"] {
            assert_eq!(expand_street_abbreviations(value), value);
        }
        let once = expand_street_abbreviations("Av. Sta. Rosa");
        assert_eq!(expand_street_abbreviations(&once), once);
    }

    #[test]
    fn street_value_is_expanded_after_inference() {
        let tag = normalized("name", "Av. Libertador");
        assert_eq!(tag.key, "addr:street");
        assert_eq!(tag.value, "Avenida Libertador");
    }

    #[test]
    fn house_number_can_cascade_into_street() {
        let tag = normalized("addr:housenumber", "Pje. Los Olmos");
        assert_eq!(tag.key, "addr:street");
        assert_eq!(tag.value, "Pasaje Los Olmos");
    }

    #[test]
    fn sources_are_canonicalized() {
        assert_eq!(normalized("source", "www.ine.cl").value, "Instituto Nacional de Estadistica www.ine.cl");
        assert_eq!(
            normalized("source", "Instituto Nacional De Estadisticas").value,
            "Instituto Nacional de Estadistica www.ine.cl"
        );
        assert_eq!(normalized("source", "bing").value, "Bing");
        assert_eq!(normalized("source", "2016 por KG").value, "Reconocimiento cartográfico 2016 por KG");
        assert_eq!(normalized("source", "survey").value, "survey");
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let mut normalizer = TagNormalizer::new();
        for (key, value) in [
            ("source", "www.ine.cl"),
            ("name", "Av. Libertador"),
            ("addr:interpolation", "maybe"),
            ("addr:housenumber", "s/n"),
        ] {
            let mut tag = RawTag::new(key, value);
            normalizer.normalize(&mut tag);
            let once = tag.clone();
            normalizer.normalize(&mut tag);
            assert_eq!(tag, once);
        }
    }

    #[test]
    fn repeated_streets_are_remembered_once() {
        let mut normalizer = TagNormalizer::with_known_streets(["Los Leones"]);
        normalizer.observe_street("Los Leones");
        normalizer.observe_street("Pje. Los Olmos");
        normalizer.observe_street("Pje. Los Olmos");
        assert_eq!(normalizer.known_streets().len(), 2);
        assert!(normalizer.known_streets().contains("Pje. Los Olmos"));
    }
}
