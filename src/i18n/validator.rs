//! Translations tree validation.
//!
//! Checks that every discovered language has a parseable file for every
//! namespace, and compares each language's keys with the fallback
//! language's keys.

use crate::i18n::backend::FsBackend;
use crate::i18n::discovery::discover_languages;
use crate::i18n::error::{I18nError, Result};
use crate::i18n::options::{BackendOptions, I18nOptions};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Validation report containing errors and warnings about a translations tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Problems that break loading (missing or malformed files)
    pub errors: Vec<String>,

    /// Keys missing from, or only present in, a non-fallback language
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Create a new empty validation report
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if the report has any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if the report is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for translations trees.
pub struct TranslationValidator;

impl TranslationValidator {
    /// Validate the tree under `root` against the namespaces and fallback
    /// language in `options`.
    ///
    /// Fails only when the root itself cannot be scanned; everything else
    /// is reported.
    pub async fn validate(root: &Path, options: &I18nOptions) -> Result<ValidationReport> {
        let mut report = ValidationReport::new();
        let mut languages = discover_languages(root).await?;
        languages.sort();

        if !languages.contains(&options.fallback_lng) {
            report.errors.push(format!(
                "Fallback language '{}' has no directory under {}",
                options.fallback_lng,
                root.display()
            ));
        }

        let backend = FsBackend::new(
            BackendOptions::for_root(root),
            &options.key_separator,
            options.max_parallel_reads,
        );

        // language -> namespace -> flattened keys
        let mut keys: BTreeMap<String, BTreeMap<String, BTreeSet<String>>> = BTreeMap::new();
        for lng in &languages {
            for ns in &options.ns {
                match backend.read(lng, ns).await {
                    Ok(Some(bundle)) => {
                        let mut flat = BTreeSet::new();
                        Self::flatten(&bundle, "", &options.key_separator, &mut flat);
                        keys.entry(lng.clone()).or_default().insert(ns.clone(), flat);
                    }
                    Ok(None) => report.errors.push(format!("{}/{}.json is missing", lng, ns)),
                    Err(I18nError::MalformedResource { message, .. }) => report
                        .errors
                        .push(format!("{}/{}.json is malformed: {}", lng, ns, message)),
                    Err(e) => report.errors.push(format!("{}/{}.json: {}", lng, ns, e)),
                }
            }
        }

        let Some(reference) = keys.get(&options.fallback_lng) else {
            return Ok(report);
        };

        for (lng, namespaces) in &keys {
            if *lng == options.fallback_lng {
                continue;
            }
            for (ns, expected) in reference {
                let Some(actual) = namespaces.get(ns) else {
                    continue;
                };
                for key in expected.difference(actual) {
                    report
                        .warnings
                        .push(format!("{}/{}.json: missing key '{}'", lng, ns, key));
                }
                for key in actual.difference(expected) {
                    report.warnings.push(format!(
                        "{}/{}.json: key '{}' is not in {}",
                        lng, ns, key, options.fallback_lng
                    ));
                }
            }
        }

        Ok(report)
    }

    /// Collect the leaf keys of a bundle, joined with `separator`.
    fn flatten(value: &Value, prefix: &str, separator: &str, out: &mut BTreeSet<String>) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}{}{}", prefix, separator, key)
                    };
                    Self::flatten(child, &path, separator, out);
                }
            }
            _ => {
                out.insert(prefix.to_string());
            }
        }
    }
}
