//! Translation provider abstraction.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use crate::Result;

/// Interpolation values for a translated message.
pub type TranslateParams = BTreeMap<String, String>;

/// Message lookup.
pub trait TranslationProvider: Send + Sync {
    /// Translate `key`, falling back to `default` and then to the key itself.
    fn translate(&self, key: &str, params: &TranslateParams, default: Option<&str>) -> String;

    /// Switch the active locale.
    fn change_locale(&self, _locale: &str) -> Result<()> {
        Ok(())
    }

    /// Active locale, if the provider tracks one.
    fn locale(&self) -> Option<String> {
        None
    }
}

/// Replace `{{name}}` placeholders with values from `params`.
pub fn interpolate(template: &str, params: &TranslateParams) -> String {
    let mut out = template.to_string();
    for (name, value) in params {
        out = out.replace(&format!("{{{{{name}}}}}"), value);
    }
    out
}

/// Provider used when the application supplies none: returns the default
/// text (or the key) with placeholders filled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTranslator;

impl TranslationProvider for DefaultTranslator {
    fn translate(&self, key: &str, params: &TranslateParams, default: Option<&str>) -> String {
        interpolate(default.unwrap_or(key), params)
    }
}

/// In-memory message catalogs keyed by locale.
#[derive(Debug, Default)]
pub struct StaticTranslator {
    catalogs: HashMap<String, HashMap<String, String>>,
    locale: RwLock<String>,
}

impl StaticTranslator {
    /// Create a translator with `locale` active and no messages.
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            catalogs: HashMap::new(),
            locale: RwLock::new(locale.into()),
        }
    }

    /// Add a message to a locale's catalog.
    pub fn with_message(
        mut self,
        locale: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.catalogs
            .entry(locale.into())
            .or_default()
            .insert(key.into(), message.into());
        self
    }
}

impl TranslationProvider for StaticTranslator {
    fn translate(&self, key: &str, params: &TranslateParams, default: Option<&str>) -> String {
        let locale = self.locale.read();
        let template = self
            .catalogs
            .get(locale.as_str())
            .and_then(|catalog| catalog.get(key))
            .map(String::as_str)
            .or(default)
            .unwrap_or(key);
        interpolate(template, params)
    }

    fn change_locale(&self, locale: &str) -> Result<()> {
        if !self.catalogs.contains_key(locale) {
            return Err(crate::Error::config(format!("Unknown locale: {locale}")));
        }
        *self.locale.write() = locale.to_string();
        Ok(())
    }

    fn locale(&self) -> Option<String> {
        Some(self.locale.read().clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> TranslateParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_translator_uses_default_then_key() {
        let t = DefaultTranslator;
        assert_eq!(t.translate("a.b", &TranslateParams::new(), Some("Hello")), "Hello");
        assert_eq!(t.translate("a.b", &TranslateParams::new(), None), "a.b");
    }

    #[test]
    fn test_interpolate() {
        let out = interpolate(
            "Error (status code: {{statusCode}})",
            &params(&[("statusCode", "500")]),
        );
        assert_eq!(out, "Error (status code: 500)");
    }

    #[test]
    fn test_static_translator_lookup_and_locale_switch() {
        let t = StaticTranslator::new("en")
            .with_message("en", "posts.posts", "Posts")
            .with_message("de", "posts.posts", "Beiträge");

        assert_eq!(t.translate("posts.posts", &TranslateParams::new(), None), "Posts");
        t.change_locale("de").unwrap();
        assert_eq!(t.locale().as_deref(), Some("de"));
        assert_eq!(
            t.translate("posts.posts", &TranslateParams::new(), None),
            "Beiträge"
        );
        assert_eq!(
            t.translate("users.users", &TranslateParams::new(), Some("Users")),
            "Users"
        );
    }

    #[test]
    fn test_static_translator_rejects_unknown_locale() {
        let t = StaticTranslator::new("en").with_message("en", "k", "v");
        assert!(t.change_locale("fr").is_err());
        assert_eq!(t.locale().as_deref(), Some("en"));
    }
}
