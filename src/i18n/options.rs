//! Translation runtime options.
//!
//! Every option is a named field with an explicit default. The defaults
//! reproduce the configuration the service starts with; only the language
//! lists and backend paths are filled in at bootstrap.

use crate::i18n::error::{I18nError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Placeholder replaced by the language code in backend path templates.
pub const LNG_PLACEHOLDER: &str = "{{lng}}";

/// Placeholder replaced by the namespace in backend path templates.
pub const NS_PLACEHOLDER: &str = "{{ns}}";

/// Which language codes are consulted for a given language.
///
/// For `en-US`:
/// - `All` ⇒ `en-US`, `en`, then the fallback language
/// - `CurrentOnly` ⇒ `en-US`, then the fallback language
/// - `LanguageOnly` ⇒ `en`, then the fallback language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadStrategy {
    All,
    CurrentOnly,
    LanguageOnly,
}

/// Which languages a missing key is reported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveMissingTo {
    /// The configured fallback language
    Fallback,
    /// The language the lookup was made in
    Current,
    /// Every language in the lookup hierarchy
    All,
}

/// Interpolation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolationOptions {
    /// When false, values inserted for `{{var}}` are interpolated again
    pub skip_on_variables: bool,

    /// HTML-escape inserted values; `{{- var}}` always inserts the raw value
    pub escape_value: bool,
}

impl Default for InterpolationOptions {
    fn default() -> Self {
        Self {
            skip_on_variables: false,
            escape_value: true,
        }
    }
}

/// File backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendOptions {
    /// Template for resource files, containing `{{lng}}` and `{{ns}}`
    pub load_path: String,

    /// Template for missing-key reports, containing `{{lng}}`
    pub add_path: String,
}

impl BackendOptions {
    /// Backend paths rooted at a translations directory:
    /// `<root>/{{lng}}/{{ns}}.json` and `<root>/{{lng}}/missing.json`.
    pub fn for_root(root: &Path) -> Self {
        let template = |file: &str| -> String {
            root.join(LNG_PLACEHOLDER)
                .join(file)
                .to_string_lossy()
                .into_owned()
        };

        Self {
            load_path: template(&format!("{}.json", NS_PLACEHOLDER)),
            add_path: template("missing.json"),
        }
    }

    /// Resolve the load path for a language and namespace.
    pub fn load_path_for(&self, lng: &str, ns: &str) -> PathBuf {
        PathBuf::from(
            self.load_path
                .replace(LNG_PLACEHOLDER, lng)
                .replace(NS_PLACEHOLDER, ns),
        )
    }

    /// Resolve the missing-key report path for a language and namespace.
    pub fn add_path_for(&self, lng: &str, ns: &str) -> PathBuf {
        PathBuf::from(
            self.add_path
                .replace(LNG_PLACEHOLDER, lng)
                .replace(NS_PLACEHOLDER, ns),
        )
    }
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self::for_root(Path::new("resources/translations"))
    }
}

/// Options handed to [`crate::i18n::Translator::init`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct I18nOptions {
    // ==================== Logging ====================
    /// Log resource loading at info level instead of debug
    pub debug: bool,

    // ==================== Languages, Namespaces ====================
    /// Language used when a lookup does not name one
    pub lng: String,

    /// Language consulted when a lookup fails in the requested language
    pub fallback_lng: String,

    /// Allowed languages; an empty list allows none
    pub supported_lngs: Vec<String>,

    /// Treat `en-US` as supported whenever `en` is
    pub non_explicit_supported_lngs: bool,

    /// Which codes of a language are looked up
    pub load: LoadStrategy,

    /// Languages whose bundles are loaded during init
    pub preload: Vec<String>,

    /// Lowercase the whole code (`en-US` ⇒ `en-us`)
    pub lower_case_lng: bool,

    /// Lowercase only the main language (`EN` ⇒ `en`)
    pub clean_code: bool,

    /// Namespaces loaded for every preloaded language
    pub ns: Vec<String>,

    /// Namespace used when a lookup does not name one
    pub default_ns: String,

    /// Namespaces searched after the requested one, in order
    pub fallback_ns: Vec<String>,

    // ==================== Missing keys ====================
    /// Report keys that were not found to the backend
    pub save_missing: bool,

    /// Overwrite values already present in a missing-key report
    pub update_missing: bool,

    /// Which languages a missing key is reported to
    pub save_missing_to: SaveMissingTo,

    /// Report every plural form instead of only the base key
    pub save_missing_plurals: bool,

    /// Report missing keys as `ns:key`
    pub append_namespace_to_missing_key: bool,

    // ==================== Translation defaults ====================
    /// Accept `null` as a valid translation
    pub return_null: bool,

    /// Accept `""` as a valid translation
    pub return_empty_string: bool,

    /// Accept objects as a translation result
    pub return_objects: bool,

    /// Join array values with this separator; arrays are rejected when unset
    pub join_arrays: Option<String>,

    /// Interpolation settings
    pub interpolation: InterpolationOptions,

    /// Return raw values without `{{var}}` replacement
    pub skip_interpolation: bool,

    // ==================== Backend ====================
    /// File backend paths
    pub backend: BackendOptions,

    /// Maximum number of concurrent backend reads
    pub max_parallel_reads: usize,

    // ==================== Separators ====================
    /// Separator for nested keys
    pub key_separator: String,

    /// Separator between namespace and key
    pub ns_separator: String,

    /// Separator before plural suffixes
    pub plural_separator: String,

    /// Separator before context suffixes
    pub context_separator: String,

    /// Also try a key as a flat key when nested lookup fails
    pub ignore_json_structure: bool,
}

impl Default for I18nOptions {
    fn default() -> Self {
        let namespaces = vec![
            "app".to_string(),
            "info".to_string(),
            "common".to_string(),
            "error".to_string(),
        ];
        let mut fallback_ns = namespaces.clone();
        fallback_ns.push("missing".to_string());

        Self {
            debug: true,
            lng: "en".to_string(),
            fallback_lng: "en".to_string(),
            supported_lngs: Vec::new(),
            non_explicit_supported_lngs: false,
            load: LoadStrategy::All,
            preload: Vec::new(),
            lower_case_lng: true,
            clean_code: false,
            ns: namespaces,
            default_ns: "app".to_string(),
            fallback_ns,
            save_missing: true,
            update_missing: false,
            save_missing_to: SaveMissingTo::Current,
            save_missing_plurals: true,
            append_namespace_to_missing_key: false,
            return_null: true,
            return_empty_string: true,
            return_objects: false,
            join_arrays: None,
            interpolation: InterpolationOptions::default(),
            skip_interpolation: false,
            backend: BackendOptions::default(),
            max_parallel_reads: 10,
            key_separator: ".".to_string(),
            ns_separator: ":".to_string(),
            plural_separator: "_".to_string(),
            context_separator: "_".to_string(),
            ignore_json_structure: false,
        }
    }
}

impl I18nOptions {
    /// Default options for a translations root and its discovered languages.
    ///
    /// The discovered list is used both as the supported list and as the
    /// preload list.
    pub fn for_translations(root: &Path, languages: Vec<String>) -> Self {
        Self {
            supported_lngs: languages.clone(),
            preload: languages,
            backend: BackendOptions::for_root(root),
            ..Self::default()
        }
    }

    /// Check that the options are internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.lng.trim().is_empty() {
            return Err(I18nError::InvalidOptions("lng must not be empty".into()));
        }
        if self.fallback_lng.trim().is_empty() {
            return Err(I18nError::InvalidOptions(
                "fallback_lng must not be empty".into(),
            ));
        }
        if self.ns.is_empty() {
            return Err(I18nError::InvalidOptions(
                "at least one namespace is required".into(),
            ));
        }
        if !self.ns.contains(&self.default_ns) {
            return Err(I18nError::InvalidOptions(format!(
                "default namespace '{}' is not one of {:?}",
                self.default_ns, self.ns
            )));
        }
        if self.max_parallel_reads == 0 {
            return Err(I18nError::InvalidOptions(
                "max_parallel_reads must be at least 1".into(),
            ));
        }

        for (name, value) in [
            ("key_separator", &self.key_separator),
            ("ns_separator", &self.ns_separator),
            ("plural_separator", &self.plural_separator),
            ("context_separator", &self.context_separator),
        ] {
            if value.is_empty() {
                return Err(I18nError::InvalidOptions(format!("{} must not be empty", name)));
            }
        }

        if !self.backend.load_path.contains(LNG_PLACEHOLDER)
            || !self.backend.load_path.contains(NS_PLACEHOLDER)
        {
            return Err(I18nError::InvalidOptions(format!(
                "backend load_path '{}' must contain {} and {}",
                self.backend.load_path, LNG_PLACEHOLDER, NS_PLACEHOLDER
            )));
        }
        if !self.backend.add_path.contains(LNG_PLACEHOLDER) {
            return Err(I18nError::InvalidOptions(format!(
                "backend add_path '{}' must contain {}",
                self.backend.add_path, LNG_PLACEHOLDER
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_service_configuration() {
        let options = I18nOptions::default();

        assert!(options.debug);
        assert_eq!(options.lng, "en");
        assert_eq!(options.fallback_lng, "en");
        assert_eq!(options.load, LoadStrategy::All);
        assert!(options.lower_case_lng);
        assert_eq!(options.ns, vec!["app", "info", "common", "error"]);
        assert_eq!(options.default_ns, "app");
        assert_eq!(
            options.fallback_ns,
            vec!["app", "info", "common", "error", "missing"]
        );
        assert!(options.save_missing);
        assert_eq!(options.save_missing_to, SaveMissingTo::Current);
        assert!(options.save_missing_plurals);
        assert!(options.return_null);
        assert!(options.return_empty_string);
        assert!(!options.return_objects);
        assert!(!options.interpolation.skip_on_variables);
        assert!(options.interpolation.escape_value);
        assert_eq!(options.key_separator, ".");
        assert_eq!(options.ns_separator, ":");
        assert_eq!(options.plural_separator, "_");
        assert_eq!(options.context_separator, "_");
        assert_eq!(options.max_parallel_reads, 10);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_for_translations_uses_languages_twice() {
        let languages = vec!["en".to_string(), "fr".to_string()];
        let options = I18nOptions::for_translations(Path::new("/srv/i18n"), languages.clone());

        assert_eq!(options.supported_lngs, languages);
        assert_eq!(options.preload, languages);
    }

    #[test]
    fn test_backend_paths_resolve_placeholders() {
        let backend = BackendOptions::for_root(Path::new("/srv/i18n"));

        assert_eq!(
            backend.load_path_for("fr", "common"),
            PathBuf::from("/srv/i18n/fr/common.json")
        );
        assert_eq!(
            backend.add_path_for("fr", "common"),
            PathBuf::from("/srv/i18n/fr/missing.json")
        );
    }

    #[test]
    fn test_validate_rejects_unknown_default_namespace() {
        let options = I18nOptions {
            default_ns: "nope".to_string(),
            ..I18nOptions::default()
        };
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("default namespace"));
    }

    #[test]
    fn test_validate_rejects_zero_parallel_reads() {
        let options = I18nOptions {
            max_parallel_reads: 0,
            ..I18nOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(I18nError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_separator() {
        let options = I18nOptions {
            ns_separator: String::new(),
            ..I18nOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_load_path_without_placeholders() {
        let mut options = I18nOptions::default();
        options.backend.load_path = "/srv/i18n/all.json".to_string();
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_empty_language_list_is_valid() {
        let options = I18nOptions::for_translations(Path::new("/srv/i18n"), Vec::new());
        assert!(options.validate().is_ok());
    }
}
