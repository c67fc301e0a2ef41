//! The translation runtime: loads bundles through the fs backend at init,
//! then answers `t(key)` lookups with namespace and language fallback.

use crate::i18n::backend::{
    spawn_missing_writer, FsBackend, MissingKey, MissingKeyQueue, MISSING_QUEUE_CAPACITY,
};
use crate::i18n::error::{I18nError, Result};
use crate::i18n::language::LanguageResolver;
use crate::i18n::metrics::TranslationMetrics;
use crate::i18n::options::{I18nOptions, SaveMissingTo};
use crate::i18n::plural::{plural_suffixes, PluralRule};
use crate::i18n::store::ResourceStore;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Replacements made for one lookup, across all interpolation passes.
pub const MAX_REPLACES: usize = 1000;

/// Interpolation stops before the text grows past this many bytes.
pub const MAX_INTERPOLATED_LEN: usize = 1 << 20;

static INTERPOLATION_REGEX: OnceLock<Regex> = OnceLock::new();

/// `{{name}}`, or `{{- name}}` for a value inserted without escaping.
fn interpolation_regex() -> &'static Regex {
    INTERPOLATION_REGEX.get_or_init(|| {
        Regex::new(r"\{\{(-?)\s*([^{}]+?)\s*\}\}").expect("interpolation pattern is valid")
    })
}

/// Escape a value for HTML the way i18next does by default.
fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '/' => escaped.push_str("&#x2F;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Per-lookup options.
#[derive(Debug, Clone, Default)]
pub struct TOptions {
    /// Language to look up in; the configured `lng` when unset
    pub lng: Option<String>,

    /// Namespace to look up in; the default namespace when unset
    pub ns: Option<String>,

    /// Selects plural forms and is available as `{{count}}`
    pub count: Option<i64>,

    /// Selects context forms (`key_male`)
    pub context: Option<String>,

    /// Returned (and reported) when the key is missing
    pub default_value: Option<String>,

    /// Interpolation variables
    pub replace: HashMap<String, Value>,
}

impl TOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lng(mut self, lng: impl Into<String>) -> Self {
        self.lng = Some(lng.into());
        self
    }

    pub fn ns(mut self, ns: impl Into<String>) -> Self {
        self.ns = Some(ns.into());
        self
    }

    pub fn count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.replace.insert(name.into(), value.into());
        self
    }
}

/// Result of a lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    /// Key as requested, without namespace prefix
    pub key: String,

    /// Language the value came from, or the requested language when missing
    pub lng: String,

    /// Namespace the value came from, or the requested namespace when missing
    pub ns: String,

    pub value: Value,

    /// False when the value is the default value or the key itself
    pub found: bool,
}

impl Translation {
    /// Render the value as text; `null` renders as an empty string.
    pub fn into_text(self) -> String {
        match self.value {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

enum Accepted {
    Value(Value),
    Skip,
    Object,
}

pub struct Translator {
    options: Arc<I18nOptions>,
    resolver: LanguageResolver,
    store: ResourceStore,
    /// Formatted language code -> directory name on disk
    directories: HashMap<String, String>,
    metrics: Arc<TranslationMetrics>,
    missing_tx: Mutex<Option<MissingKeyQueue>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl Translator {
    /// Validate the options, preload every `preload × ns` bundle and start
    /// the missing-key writer when `save_missing` is on.
    ///
    /// A bundle file that does not exist is skipped with a warning; an
    /// unreadable or malformed one fails init, as do two languages whose
    /// codes format to the same code.
    pub async fn init(options: I18nOptions) -> Result<Self> {
        options.validate()?;

        let resolver = LanguageResolver::new(&options);
        let metrics = Arc::new(TranslationMetrics::new());
        let backend = Arc::new(FsBackend::new(
            options.backend.clone(),
            &options.key_separator,
            options.max_parallel_reads,
        ));

        let mut directories: HashMap<String, String> = HashMap::new();
        for lng in options.supported_lngs.iter().chain(options.preload.iter()) {
            let code = resolver.format(lng);
            match directories.get(&code) {
                Some(existing) if existing != lng => {
                    return Err(I18nError::InvalidOptions(format!(
                        "languages '{}' and '{}' both resolve to '{}'",
                        existing, lng, code
                    )));
                }
                Some(_) => {}
                None => {
                    directories.insert(code, lng.clone());
                }
            }
        }

        let store = preload(&backend, &options, &resolver, &metrics).await?;

        let (missing_tx, writer) = if options.save_missing {
            let (tx, handle) = spawn_missing_writer(
                Arc::clone(&backend),
                Arc::clone(&metrics),
                options.update_missing,
                MISSING_QUEUE_CAPACITY,
            );
            (Some(tx), Some(handle))
        } else {
            (None, None)
        };

        let loaded = store.languages().len();
        if options.debug {
            info!(
                "i18n initialized: lng={}, fallback={}, {} supported, {} loaded, namespaces {:?}",
                options.lng,
                options.fallback_lng,
                options.supported_lngs.len(),
                loaded,
                options.ns
            );
        }

        Ok(Self {
            options: Arc::new(options),
            resolver,
            store,
            directories,
            metrics,
            missing_tx: Mutex::new(missing_tx),
            writer: Mutex::new(writer),
        })
    }

    pub fn options(&self) -> &I18nOptions {
        &self.options
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    /// Supported languages, formatted.
    pub fn languages(&self) -> &[String] {
        self.resolver.supported()
    }

    /// A loaded bundle; `lng` is formatted before lookup.
    pub fn bundle(&self, lng: &str, ns: &str) -> Option<&Value> {
        self.store.bundle(&self.resolver.format(lng), ns)
    }

    /// Look up `key` and render it as text.
    pub fn t(&self, key: &str, opts: &TOptions) -> String {
        self.translate(key, opts).into_text()
    }

    /// Look up `key`, keeping the raw JSON value.
    pub fn translate(&self, key: &str, opts: &TOptions) -> Translation {
        self.metrics.record_lookup();

        let requested_lng = self
            .resolver
            .format(opts.lng.as_deref().unwrap_or(&self.options.lng));
        let (requested_ns, key) = self.split_namespace(key, opts.ns.as_deref());
        let codes = self.resolver.hierarchy(&requested_lng);

        for ns in self.namespaces(&requested_ns) {
            for code in &codes {
                for candidate in &self.key_candidates(key, code, opts) {
                    let Some(raw) = self.store.resource(
                        code,
                        &ns,
                        candidate,
                        &self.options.key_separator,
                        self.options.ignore_json_structure,
                    ) else {
                        continue;
                    };

                    let value = match self.accept(raw) {
                        Accepted::Skip => continue,
                        Accepted::Object => Value::String(format!(
                            "key '{} ({})' returned an object instead of string.",
                            key, requested_lng
                        )),
                        Accepted::Value(Value::String(text)) => {
                            Value::String(self.interpolate(&text, opts))
                        }
                        Accepted::Value(value) => value,
                    };

                    self.metrics
                        .record_hit(*code != requested_lng || ns != requested_ns);
                    return Translation {
                        key: key.to_string(),
                        lng: code.clone(),
                        ns,
                        value,
                        found: true,
                    };
                }
            }
        }

        self.metrics.record_miss();
        debug!(
            "missingKey {} {}:{} (tried {:?})",
            requested_lng, requested_ns, key, codes
        );
        self.report_missing(&requested_lng, &requested_ns, key, &codes, opts);

        let fallback = opts.default_value.clone().unwrap_or_else(|| key.to_string());
        Translation {
            key: key.to_string(),
            lng: requested_lng,
            ns: requested_ns,
            value: Value::String(self.interpolate(&fallback, opts)),
            found: false,
        }
    }

    /// Stop accepting missing keys and wait until queued ones are written.
    pub async fn close(&self) {
        if let Ok(mut tx) = self.missing_tx.lock() {
            tx.take();
        }
        let handle = match self.writer.lock() {
            Ok(mut writer) => writer.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Missing-key writer ended abnormally: {}", e);
            }
        }
    }

    /// Split `ns:key` when the prefix is a known namespace.
    fn split_namespace<'k>(&self, key: &'k str, ns: Option<&str>) -> (String, &'k str) {
        if let Some((prefix, rest)) = key.split_once(self.options.ns_separator.as_str()) {
            if self.options.ns.iter().any(|n| n == prefix)
                || self.options.fallback_ns.iter().any(|n| n == prefix)
            {
                return (prefix.to_string(), rest);
            }
        }
        let ns = ns.unwrap_or(&self.options.default_ns);
        (ns.to_string(), key)
    }

    /// The requested namespace followed by the fallback chain, without repeats.
    fn namespaces(&self, requested: &str) -> Vec<String> {
        let mut namespaces = vec![requested.to_string()];
        for ns in &self.options.fallback_ns {
            if !namespaces.contains(ns) {
                namespaces.push(ns.clone());
            }
        }
        namespaces
    }

    /// Key variants for a lookup in `code`, most specific first.
    fn key_candidates(&self, key: &str, code: &str, opts: &TOptions) -> Vec<String> {
        let plural_keys = |base: &str| -> Vec<String> {
            opts.count
                .map(|count| plural_suffixes(code, count))
                .unwrap_or_default()
                .into_iter()
                .map(|category| format!("{}{}{}", base, self.options.plural_separator, category))
                .collect()
        };

        let mut keys = Vec::new();
        if let Some(context) = opts.context.as_deref().filter(|c| !c.is_empty()) {
            let with_context = format!("{}{}{}", key, self.options.context_separator, context);
            keys.extend(plural_keys(&with_context));
            keys.push(with_context);
        }
        keys.extend(plural_keys(key));
        keys.push(key.to_string());
        keys
    }

    fn accept(&self, raw: &Value) -> Accepted {
        match raw {
            Value::Null if self.options.return_null => Accepted::Value(Value::Null),
            Value::Null => Accepted::Skip,
            Value::String(text) if text.is_empty() && !self.options.return_empty_string => {
                Accepted::Skip
            }
            Value::Array(items) => match (&self.options.join_arrays, self.options.return_objects) {
                (Some(separator), _) => Accepted::Value(Value::String(
                    items
                        .iter()
                        .map(|item| match item {
                            Value::String(text) => text.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(separator.as_str()),
                )),
                (None, true) => Accepted::Value(raw.clone()),
                (None, false) => Accepted::Object,
            },
            Value::Object(_) if self.options.return_objects => Accepted::Value(raw.clone()),
            Value::Object(_) => Accepted::Object,
            other => Accepted::Value(other.clone()),
        }
    }

    /// Replace `{{name}}` and `{{- name}}` placeholders. Unknown variables
    /// become empty.
    ///
    /// Stops after [`MAX_REPLACES`] replacements, or before the text would
    /// exceed [`MAX_INTERPOLATED_LEN`]; placeholders left at that point stay
    /// in the text.
    fn interpolate(&self, text: &str, opts: &TOptions) -> String {
        if self.options.skip_interpolation {
            return text.to_string();
        }

        let regex = interpolation_regex();
        let escape = self.options.interpolation.escape_value;
        let mut current = text.to_string();
        let mut replaces = 0;

        loop {
            let mut output = String::with_capacity(current.len());
            let mut last = 0;
            let mut replaced = 0;
            let mut exhausted = false;

            for caps in regex.captures_iter(&current) {
                let Some(whole) = caps.get(0) else {
                    continue;
                };
                if replaces >= MAX_REPLACES {
                    exhausted = true;
                    break;
                }

                let value = self.variable(&caps[2], opts);
                let value = if escape && caps[1].is_empty() {
                    escape_html(&value)
                } else {
                    value
                };

                let projected = output.len()
                    + (whole.start() - last)
                    + value.len()
                    + (current.len() - whole.end());
                if projected > MAX_INTERPOLATED_LEN {
                    exhausted = true;
                    break;
                }

                output.push_str(&current[last..whole.start()]);
                output.push_str(&value);
                last = whole.end();
                replaces += 1;
                replaced += 1;
            }

            output.push_str(&current[last..]);
            current = output;

            if exhausted {
                warn!(
                    "Interpolation stopped after {} replacements ({} bytes)",
                    replaces,
                    current.len()
                );
                break;
            }
            if replaced == 0 || self.options.interpolation.skip_on_variables {
                break;
            }
        }
        current
    }

    fn variable(&self, name: &str, opts: &TOptions) -> String {
        if name == "count" {
            if let Some(count) = opts.count {
                return count.to_string();
            }
        }

        let mut parts = name.split(self.options.key_separator.as_str());
        let found = parts
            .next()
            .and_then(|first| opts.replace.get(first))
            .and_then(|root| parts.try_fold(root, |node, part| node.get(part)));

        match found {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => {
                debug!("missed to pass in variable {} for interpolation", name);
                String::new()
            }
            Some(other) => other.to_string(),
        }
    }

    fn report_missing(&self, lng: &str, ns: &str, key: &str, codes: &[String], opts: &TOptions) {
        if !self.options.save_missing {
            return;
        }

        let targets: Vec<String> = match self.options.save_missing_to {
            SaveMissingTo::Current => vec![lng.to_string()],
            SaveMissingTo::Fallback => vec![self.resolver.fallback().to_string()],
            SaveMissingTo::All => codes.to_vec(),
        };
        let languages: Vec<String> = targets
            .iter()
            .filter_map(|code| self.directories.get(code).cloned())
            .collect();
        if languages.is_empty() {
            debug!("No report target for missing key {}:{} in {}", ns, key, lng);
            return;
        }

        let base_key = if self.options.append_namespace_to_missing_key {
            format!("{}{}{}", ns, self.options.ns_separator, key)
        } else {
            key.to_string()
        };
        let fallback_value = Value::String(
            opts.default_value
                .clone()
                .unwrap_or_else(|| key.to_string()),
        );

        let keys: Vec<String> = match opts.count {
            Some(_) if self.options.save_missing_plurals => PluralRule::for_language(lng)
                .categories()
                .iter()
                .map(|suffix| format!("{}{}{}", base_key, self.options.plural_separator, suffix))
                .collect(),
            _ => vec![base_key],
        };

        let Ok(guard) = self.missing_tx.lock() else {
            return;
        };
        let Some(tx) = guard.as_ref() else {
            return;
        };
        for key in keys {
            let missing = MissingKey {
                languages: languages.clone(),
                namespace: ns.to_string(),
                key,
                fallback_value: fallback_value.clone(),
            };
            if !tx.report(missing) {
                return;
            }
        }
    }
}

/// Load every `preload × ns` bundle with bounded parallelism.
async fn preload(
    backend: &FsBackend,
    options: &I18nOptions,
    resolver: &LanguageResolver,
    metrics: &TranslationMetrics,
) -> Result<ResourceStore> {
    let pairs: Vec<(&str, &str)> = options
        .preload
        .iter()
        .flat_map(|lng| options.ns.iter().map(move |ns| (lng.as_str(), ns.as_str())))
        .collect();

    let reads = pairs.iter().map(|(lng, ns)| async move {
        let result = backend.read(lng, ns).await;
        (*lng, *ns, result)
    });
    let results = futures::future::join_all(reads).await;
    metrics.record_parallel_reads(backend.peak_parallel_reads());

    let mut store = ResourceStore::new();
    for (lng, ns, result) in results {
        match result {
            Ok(Some(bundle)) => {
                metrics.record_backend_read();
                if options.debug {
                    info!("loaded namespace {} for language {}", ns, lng);
                } else {
                    debug!("loaded namespace {} for language {}", ns, lng);
                }
                store.add_bundle(&resolver.format(lng), ns, bundle);
            }
            Ok(None) => {
                warn!(
                    "Resource file missing: {}",
                    backend.paths().load_path_for(lng, ns).display()
                );
            }
            Err(e) => {
                metrics.record_backend_failure();
                return Err(e);
            }
        }
    }

    Ok(store)
}
