//! Internationalization (i18n) runtime.
//!
//! Translations live on disk as one directory per language, one JSON file
//! per namespace:
//!
//! ```text
//! resources/translations/
//!   en/app.json  en/info.json  en/common.json  en/error.json  en/missing.json
//!   fr/app.json  ...
//! ```
//!
//! # Architecture
//!
//! - `discovery`: supported languages are the subdirectories of the root
//! - `options`: every runtime option as a named field with its default
//! - `language`: code formatting and the per-lookup language hierarchy
//! - `plural`: plural categories per language
//! - `store`: loaded bundles and nested-key lookup
//! - `backend`: file loading and missing-key reports
//! - `translator`: `t(key)` with namespace/language fallback
//! - `validator`: consistency checks over a translations tree
//! - `metrics`: lookup and backend counters
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::i18n::{discover_languages, I18nOptions, TOptions, Translator};
//!
//! let languages = discover_languages(root).await?;
//! let i18n = Translator::init(I18nOptions::for_translations(root, languages)).await?;
//! let title = i18n.t("common:title", &TOptions::new().lng("fr"));
//! ```

mod backend;
mod discovery;
mod error;
mod language;
mod metrics;
mod options;
mod plural;
mod store;
mod translator;
mod validator;

pub use backend::{FsBackend, MissingKey, MissingKeyQueue};
pub use discovery::discover_languages;
pub use error::I18nError;
pub use language::LanguageResolver;
pub use metrics::{MetricsReport, TranslationMetrics};
pub use options::{BackendOptions, I18nOptions, InterpolationOptions, LoadStrategy, SaveMissingTo};
pub use plural::PluralRule;
pub use store::ResourceStore;
pub use translator::{TOptions, Translation, Translator};
pub use validator::{TranslationValidator, ValidationReport};
