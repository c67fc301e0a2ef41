//! Language codes: formatting, support checks and the lookup hierarchy.

use crate::i18n::options::{I18nOptions, LoadStrategy};

/// Resolves which language codes are consulted for a lookup.
///
/// Built once from the options; the supported list is stored in formatted
/// form so `en-US` on disk matches `en-us` when codes are lowercased.
#[derive(Debug, Clone)]
pub struct LanguageResolver {
    supported: Vec<String>,
    fallback: String,
    load: LoadStrategy,
    lower_case: bool,
    clean_code: bool,
    non_explicit: bool,
}

impl LanguageResolver {
    pub fn new(options: &I18nOptions) -> Self {
        let mut resolver = Self {
            supported: Vec::new(),
            fallback: String::new(),
            load: options.load,
            lower_case: options.lower_case_lng,
            clean_code: options.clean_code,
            non_explicit: options.non_explicit_supported_lngs,
        };
        resolver.supported = options
            .supported_lngs
            .iter()
            .map(|code| resolver.format(code))
            .collect();
        resolver.fallback = resolver.format(&options.fallback_lng);
        resolver
    }

    /// Normalize a language code.
    ///
    /// # Example
    /// ```ignore
    /// // lower_case_lng = true
    /// assert_eq!(resolver.format("en-US"), "en-us");
    /// // lower_case_lng = false
    /// assert_eq!(resolver.format("EN-us"), "en-US");
    /// ```
    pub fn format(&self, code: &str) -> String {
        let code = code.trim();
        if self.lower_case {
            return code.to_lowercase();
        }

        if !code.contains('-') {
            return if self.clean_code {
                code.to_lowercase()
            } else {
                code.to_string()
            };
        }

        code.split('-')
            .enumerate()
            .map(|(index, part)| {
                if index == 0 {
                    part.to_lowercase()
                } else if part.len() == 2 {
                    part.to_uppercase()
                } else if part.len() == 4 {
                    // Script subtag, e.g. zh-Hant
                    let mut chars = part.chars();
                    match chars.next() {
                        Some(first) => {
                            first.to_uppercase().collect::<String>()
                                + &chars.as_str().to_lowercase()
                        }
                        None => String::new(),
                    }
                } else {
                    part.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("-")
    }

    /// The main language of a code (`en-US` ⇒ `en`).
    pub fn language_only(&self, code: &str) -> String {
        let main = code.split('-').next().unwrap_or(code);
        self.format(main)
    }

    /// The configured fallback language, formatted.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// The supported languages, formatted.
    pub fn supported(&self) -> &[String] {
        &self.supported
    }

    /// Check whether a (formatted) code may be looked up.
    pub fn is_supported(&self, code: &str) -> bool {
        if self.supported.iter().any(|lang| lang == code) {
            return true;
        }
        self.non_explicit
            && code.contains('-')
            && self
                .supported
                .iter()
                .any(|lang| *lang == self.language_only(code))
    }

    /// Languages consulted, in order, for a lookup in `code`.
    ///
    /// Unsupported codes are dropped; the fallback language is appended last
    /// unless already present.
    pub fn hierarchy(&self, code: &str) -> Vec<String> {
        let formatted = self.format(code);
        let mut codes: Vec<String> = Vec::new();
        let add = |candidate: String, codes: &mut Vec<String>| {
            if !candidate.is_empty() && self.is_supported(&candidate) && !codes.contains(&candidate)
            {
                codes.push(candidate);
            }
        };

        match self.load {
            LoadStrategy::All => {
                add(formatted.clone(), &mut codes);
                if formatted.contains('-') {
                    add(self.language_only(&formatted), &mut codes);
                }
            }
            LoadStrategy::CurrentOnly => add(formatted.clone(), &mut codes),
            LoadStrategy::LanguageOnly => add(self.language_only(&formatted), &mut codes),
        }

        add(self.fallback.clone(), &mut codes);
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver_with(supported: &[&str], configure: impl FnOnce(&mut I18nOptions)) -> LanguageResolver {
        let mut options = I18nOptions {
            supported_lngs: supported.iter().map(|s| s.to_string()).collect(),
            ..I18nOptions::default()
        };
        configure(&mut options);
        LanguageResolver::new(&options)
    }

    // ==================== format Tests ====================

    #[test]
    fn test_format_lowercases_everything() {
        let resolver = resolver_with(&[], |_| {});
        assert_eq!(resolver.format("en-US"), "en-us");
        assert_eq!(resolver.format("EN"), "en");
    }

    #[test]
    fn test_format_without_lowercase() {
        let resolver = resolver_with(&[], |o| o.lower_case_lng = false);
        assert_eq!(resolver.format("EN-us"), "en-US");
        assert_eq!(resolver.format("zh-hant-tw"), "zh-Hant-TW");
        assert_eq!(resolver.format("EN"), "EN");
    }

    #[test]
    fn test_format_clean_code() {
        let resolver = resolver_with(&[], |o| {
            o.lower_case_lng = false;
            o.clean_code = true;
        });
        assert_eq!(resolver.format("EN"), "en");
    }

    // ==================== is_supported Tests ====================

    #[test]
    fn test_supported_list_is_formatted() {
        let resolver = resolver_with(&["en", "pt-BR"], |_| {});
        assert!(resolver.is_supported("pt-br"));
        assert!(!resolver.is_supported("pt"));
    }

    #[test]
    fn test_non_explicit_supported() {
        let resolver = resolver_with(&["en"], |o| o.non_explicit_supported_lngs = true);
        assert!(resolver.is_supported("en-us"));
        assert!(!resolver.is_supported("fr-fr"));
    }

    // ==================== hierarchy Tests ====================

    #[test]
    fn test_hierarchy_all_strategy() {
        let resolver = resolver_with(&["en", "fr", "fr-ca"], |_| {});
        assert_eq!(resolver.hierarchy("fr-CA"), vec!["fr-ca", "fr", "en"]);
    }

    #[test]
    fn test_hierarchy_drops_unsupported_codes() {
        let resolver = resolver_with(&["en", "fr"], |_| {});
        assert_eq!(resolver.hierarchy("fr-CA"), vec!["fr", "en"]);
        assert_eq!(resolver.hierarchy("de"), vec!["en"]);
    }

    #[test]
    fn test_hierarchy_does_not_repeat_fallback() {
        let resolver = resolver_with(&["en"], |_| {});
        assert_eq!(resolver.hierarchy("en"), vec!["en"]);
    }

    #[test]
    fn test_hierarchy_current_only() {
        let resolver = resolver_with(&["en", "fr", "fr-ca"], |o| o.load = LoadStrategy::CurrentOnly);
        assert_eq!(resolver.hierarchy("fr-CA"), vec!["fr-ca", "en"]);
    }

    #[test]
    fn test_hierarchy_language_only() {
        let resolver = resolver_with(&["en", "fr", "fr-ca"], |o| o.load = LoadStrategy::LanguageOnly);
        assert_eq!(resolver.hierarchy("fr-CA"), vec!["fr", "en"]);
    }

    #[test]
    fn test_hierarchy_empty_supported_list() {
        let resolver = resolver_with(&[], |_| {});
        assert!(resolver.hierarchy("en").is_empty());
    }
}
