//! Template personalization and the template-name → locale table.

use std::collections::HashMap;

/// The single substitution marker templates may carry.
pub const PLACEHOLDER: &str = "{{Name}}";

/// Label used when the caller supplies no recipient name.
pub const FALLBACK_NAME: &str = "Cliente";

/// Whether the content needs a body parameter at all.
pub fn has_placeholder(content: &str) -> bool {
    content.contains("{{")
}

/// The name that actually goes on the wire: the given one, or
/// [`FALLBACK_NAME`] when missing or blank.
pub fn display_name(name: Option<&str>) -> &str {
    match name {
        Some(n) if !n.trim().is_empty() => n,
        _ => FALLBACK_NAME,
    }
}

/// Substitute `{{Name}}`. Content without the marker passes through
/// unchanged; a missing or blank name falls back to [`FALLBACK_NAME`].
pub fn personalize(content: &str, name: Option<&str>) -> String {
    content.replace(PLACEHOLDER, display_name(name))
}

/// Finite lookup table mapping lower-cased template names to gateway
/// locale codes, with a defined default for unmapped names. Built once
/// at startup; never inferred per call site.
#[derive(Debug, Clone)]
pub struct LanguageMap {
    entries: HashMap<String, String>,
    default: String,
}

impl LanguageMap {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            entries: HashMap::new(),
            default: default.into(),
        }
    }

    /// The mappings the original deployment shipped with.
    pub fn with_defaults() -> Self {
        let mut map = Self::new("es_PAN");
        map.insert("inicio_de_conversacion", "es_PAN");
        map.insert("hello_world", "en_US");
        map
    }

    pub fn insert(&mut self, template_name: &str, locale: &str) {
        self.entries
            .insert(template_name.to_lowercase(), locale.to_string());
    }

    pub fn resolve(&self, template_name: &str) -> &str {
        self.entries
            .get(&template_name.to_lowercase())
            .map(String::as_str)
            .unwrap_or(&self.default)
    }
}

impl Default for LanguageMap {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personalize_without_marker_is_identity() {
        let content = "Hello! No variables here.";
        assert_eq!(personalize(content, Some("Ana")), content);
        assert!(!has_placeholder(content));
    }

    #[test]
    fn personalize_substitutes_name() {
        assert_eq!(personalize("Hola {{Name}}!", Some("Ana")), "Hola Ana!");
        assert!(has_placeholder("Hola {{Name}}!"));
    }

    #[test]
    fn blank_name_falls_back() {
        assert_eq!(personalize("Hola {{Name}}", None), "Hola Cliente");
        assert_eq!(personalize("Hola {{Name}}", Some("")), "Hola Cliente");
        assert_eq!(personalize("Hola {{Name}}", Some("   ")), "Hola Cliente");
    }

    #[test]
    fn locale_lookup_is_case_insensitive_with_default() {
        let map = LanguageMap::with_defaults();
        assert_eq!(map.resolve("hello_world"), "en_US");
        assert_eq!(map.resolve("Hello_World"), "en_US");
        assert_eq!(map.resolve("inicio_de_conversacion"), "es_PAN");
        assert_eq!(map.resolve("unmapped_template"), "es_PAN");
    }

    #[test]
    fn locale_map_accepts_overrides() {
        let mut map = LanguageMap::with_defaults();
        map.insert("promo_mx", "es_MX");
        assert_eq!(map.resolve("PROMO_MX"), "es_MX");
    }
}
