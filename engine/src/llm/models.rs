//! Variant-name translation
//!
//! Human-friendly variant aliases are translated to backend-canonical
//! identifiers before a client handle is created. Unmapped names pass
//! through unchanged, so a new model id works without a code change.
//! Deployments can merge their own entries on top via the
//! `[llm.model_aliases]` config table; override entries win on collision.

use std::collections::HashMap;

/// Built-in alias table: friendly name -> canonical API identifier.
fn default_alias_map() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        // Current generation
        ("claude-sonnet-4.5", "claude-sonnet-4-5"),
        ("claude-haiku-4.5", "claude-haiku-4-5"),
        ("claude-opus-4.5", "claude-opus-4-5"),
        ("claude-opus-4.1", "claude-opus-4-1"),
        // Previous generation
        ("claude-3-5-sonnet", "claude-3-5-sonnet-20241022"),
        ("claude-3-5-haiku", "claude-3-5-haiku-20241022"),
        ("claude-3-5-sonnet-latest", "claude-sonnet-4-5"),
        ("claude-3-5-haiku-latest", "claude-haiku-4-5"),
        // Convenience aliases
        ("claude-latest", "claude-sonnet-4-5"),
        ("claude-default", "claude-sonnet-4-5"),
        ("claude-fastest", "claude-haiku-4-5"),
        ("claude-smartest", "claude-opus-4-5"),
        // Gemini
        ("gemini-pro", "gemini-2.5-pro"),
        ("gemini-flash", "gemini-1.5-flash"),
    ])
}

/// Translation table from variant aliases to canonical identifiers.
#[derive(Debug, Clone)]
pub struct AliasMap {
    entries: HashMap<String, String>,
}

impl AliasMap {
    /// Build the table from defaults with `overrides` merged on top.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut entries: HashMap<String, String> = default_alias_map()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (k, v) in overrides {
            entries.insert(k.clone(), v.clone());
        }
        Self { entries }
    }

    /// Built-in defaults only.
    pub fn new() -> Self {
        Self::with_overrides(&HashMap::new())
    }

    /// Resolve an alias to its canonical identifier.
    ///
    /// Unmapped names are returned unchanged; this is not an error.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.entries.get(name).map(String::as_str).unwrap_or(name)
    }
}

impl Default for AliasMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_alias_resolves() {
        let map = AliasMap::new();
        assert_eq!(map.resolve("claude-fastest"), "claude-haiku-4-5");
        assert_eq!(map.resolve("claude-sonnet-4.5"), "claude-sonnet-4-5");
    }

    #[test]
    fn test_unmapped_name_passes_through() {
        let map = AliasMap::new();
        assert_eq!(map.resolve("claude-opus-4-5-20251101"), "claude-opus-4-5-20251101");
        assert_eq!(map.resolve("totally-new-model"), "totally-new-model");
    }

    #[test]
    fn test_override_wins_on_collision() {
        let overrides = HashMap::from([
            ("claude-smartest".to_string(), "claude-opus-9".to_string()),
            ("my-alias".to_string(), "claude-sonnet-4-5".to_string()),
        ]);
        let map = AliasMap::with_overrides(&overrides);
        assert_eq!(map.resolve("claude-smartest"), "claude-opus-9");
        assert_eq!(map.resolve("my-alias"), "claude-sonnet-4-5");
        // Untouched defaults survive the merge
        assert_eq!(map.resolve("claude-fastest"), "claude-haiku-4-5");
    }
}
