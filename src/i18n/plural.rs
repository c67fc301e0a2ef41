//! Plural categories per language.
//!
//! Covers integer counts for the rule families in common use; any language
//! without its own entry follows the English rule (`one` for ±1, `other`
//! otherwise).

/// Plural rule family of a base language code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralRule {
    /// No plural distinction (ja, zh, ko, ...)
    Invariant,
    /// `one` for 1 (en, de, es, it, ...)
    OneOther,
    /// `one` for 0 and 1 (fr, pt, hi, ...)
    ZeroOneOther,
    /// `one`, `few`, `many` by the last digits (ru, uk, be)
    EastSlavic,
    /// `one` for 1, `few`/`many` by the last digits (pl)
    Polish,
    /// `one` for 1, `few` for 2-4 (cs, sk)
    WestSlavic,
    /// `zero`, `one`, `two`, `few`, `many` (ar)
    Arabic,
}

impl PluralRule {
    /// Rule family for a language code; only the base language is considered.
    pub fn for_language(code: &str) -> Self {
        let base = code.split('-').next().unwrap_or(code).to_lowercase();
        match base.as_str() {
            "ja" | "zh" | "ko" | "vi" | "th" | "id" | "ms" | "lo" | "my" => Self::Invariant,
            "fr" | "pt" | "hi" | "fa" | "bn" | "am" | "ff" | "kab" => Self::ZeroOneOther,
            "ru" | "uk" | "be" => Self::EastSlavic,
            "pl" => Self::Polish,
            "cs" | "sk" => Self::WestSlavic,
            "ar" => Self::Arabic,
            _ => Self::OneOther,
        }
    }

    /// Every category this rule produces, in CLDR order.
    pub fn categories(self) -> &'static [&'static str] {
        match self {
            Self::Invariant => &["other"],
            Self::OneOther | Self::ZeroOneOther => &["one", "other"],
            Self::EastSlavic | Self::Polish => &["one", "few", "many", "other"],
            Self::WestSlavic => &["one", "few", "other"],
            Self::Arabic => &["zero", "one", "two", "few", "many", "other"],
        }
    }

    /// Category selected for `count`.
    pub fn select(self, count: i64) -> &'static str {
        let n = count.unsigned_abs();
        let (mod10, mod100) = (n % 10, n % 100);
        match self {
            Self::Invariant => "other",
            Self::OneOther => {
                if n == 1 {
                    "one"
                } else {
                    "other"
                }
            }
            Self::ZeroOneOther => {
                if n <= 1 {
                    "one"
                } else {
                    "other"
                }
            }
            Self::EastSlavic => {
                if mod10 == 1 && mod100 != 11 {
                    "one"
                } else if (2..=4).contains(&mod10) && !(12..=14).contains(&mod100) {
                    "few"
                } else {
                    "many"
                }
            }
            Self::Polish => {
                if n == 1 {
                    "one"
                } else if (2..=4).contains(&mod10) && !(12..=14).contains(&mod100) {
                    "few"
                } else {
                    "many"
                }
            }
            Self::WestSlavic => match n {
                1 => "one",
                2..=4 => "few",
                _ => "other",
            },
            Self::Arabic => match (n, mod100) {
                (0, _) => "zero",
                (1, _) => "one",
                (2, _) => "two",
                (_, 3..=10) => "few",
                (_, 11..=99) => "many",
                _ => "other",
            },
        }
    }
}

/// Suffixes to try for `count` in `code`, most specific first.
///
/// A count of 0 tries `zero` before the language's own category, so a
/// `key_zero` entry wins in every language.
pub fn plural_suffixes(code: &str, count: i64) -> Vec<&'static str> {
    let category = PluralRule::for_language(code).select(count);
    let mut suffixes = Vec::with_capacity(2);
    if count == 0 && category != "zero" {
        suffixes.push("zero");
    }
    suffixes.push(category);
    suffixes
}
