//! Version range formatting.

use serde::{Deserialize, Serialize};

/// How requested versions are written into manifests and the catalog.
///
/// Applied uniformly to every version the resolver writes. Non-numeric tags
/// (`latest`, `next`, `workspace:*`) always pass through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStrategy {
    /// Keep whatever literal was requested.
    Latest,
    /// Pin the bare version.
    Exact,
    /// `^` range.
    #[default]
    Caret,
    /// `~` range.
    Tilde,
}

/// Placeholder pin recorded when no version is known for a catalogued name.
pub const REGISTRY_PLACEHOLDER: &str = "latest";

/// Format a version literal under a strategy.
///
/// An existing `^`/`~`/`=` prefix is normalized away before the strategy's
/// own prefix is applied, so repeated formatting is stable.
pub fn format_version(version: &str, strategy: VersionStrategy) -> String {
    let version = version.trim();

    let base = version
        .strip_prefix('^')
        .or_else(|| version.strip_prefix('~'))
        .or_else(|| version.strip_prefix('='))
        .unwrap_or(version);

    if !base.starts_with(|c: char| c.is_ascii_digit()) {
        return version.to_string();
    }

    match strategy {
        VersionStrategy::Latest => version.to_string(),
        VersionStrategy::Exact => base.to_string(),
        VersionStrategy::Caret => format!("^{base}"),
        VersionStrategy::Tilde => format!("~{base}"),
    }
}

/// Pick the preferred version among conflicting literals.
///
/// Preference order: first non-numeric tag, else first caret literal, else
/// first tilde literal, else the first literal encountered. Stable for a
/// given input order, so callers feed literals in deterministic store order.
pub fn pick_best_version<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let versions: Vec<&str> = versions.into_iter().collect();

    versions
        .iter()
        .find(|v| !v.starts_with(|c: char| c.is_ascii_digit() || c == '^' || c == '~'))
        .or_else(|| versions.iter().find(|v| v.starts_with('^')))
        .or_else(|| versions.iter().find(|v| v.starts_with('~')))
        .or_else(|| versions.first())
        .copied()
}
