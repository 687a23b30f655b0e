//! Ordered mirror list and effective-URL construction.
//!
//! A mirror is a reverse-proxy prefix over the full origin URL, not a host
//! substitution: `https://m1` + `https://github.com/o/r/...` becomes
//! `https://m1/https://github.com/o/r/...`.

use crate::fetch::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Ordered sequence of mirror base URLs. Order defines rotation; duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MirrorList(Vec<String>);

impl MirrorList {
    pub fn new(mirrors: Vec<String>) -> Self {
        MirrorList(mirrors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Mirror index used on `attempt` (1-based): `(attempt - 1) mod len`.
    /// Deterministic; no state carries over between calls.
    pub fn index_for_attempt(&self, attempt: u32) -> usize {
        (attempt.saturating_sub(1) as usize) % self.0.len().max(1)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Effective URL for every mirror, in rotation order.
    /// Fails without touching the network if the list is empty or any URL is malformed.
    pub fn effective_urls(&self, canonical_url: &str) -> Result<Vec<String>, ConfigurationError> {
        if self.0.is_empty() {
            return Err(ConfigurationError::NoMirrors);
        }
        if canonical_url.trim().is_empty() {
            return Err(ConfigurationError::InvalidUrl {
                url: canonical_url.to_string(),
                reason: "canonical URL is empty".to_string(),
            });
        }
        self.0
            .iter()
            .map(|m| {
                let effective = effective_url(m, canonical_url);
                validate_url(&effective)?;
                Ok(effective)
            })
            .collect()
    }
}

impl From<Vec<String>> for MirrorList {
    fn from(v: Vec<String>) -> Self {
        MirrorList(v)
    }
}

impl From<&[&str]> for MirrorList {
    fn from(v: &[&str]) -> Self {
        MirrorList(v.iter().map(|s| s.to_string()).collect())
    }
}

/// `mirror + "/" + canonical`; trailing slashes on the mirror are trimmed so
/// `https://m1/` and `https://m1` behave the same. The canonical URL is kept verbatim.
pub fn effective_url(mirror: &str, canonical_url: &str) -> String {
    format!("{}/{}", mirror.trim_end_matches('/'), canonical_url)
}

fn validate_url(raw: &str) -> Result<(), ConfigurationError> {
    let parsed = url::Url::parse(raw).map_err(|e| ConfigurationError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigurationError::InvalidUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme `{}`", other),
            })
        }
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ConfigurationError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_url_prefixes_full_origin_url() {
        assert_eq!(
            effective_url(
                "https://m1",
                "https://github.com/prometheus/prometheus/releases/download/v2.53.0/sha256sums.txt"
            ),
            "https://m1/https://github.com/prometheus/prometheus/releases/download/v2.53.0/sha256sums.txt"
        );
        assert_eq!(
            effective_url("https://m2/", "org/repo/releases/download/v1.0.0/app.tar.gz"),
            "https://m2/org/repo/releases/download/v1.0.0/app.tar.gz"
        );
    }

    #[test]
    fn rotation_wraps_round_robin() {
        let m = MirrorList::from(&["a", "b", "c"][..]);
        let picks: Vec<usize> = (1..=7).map(|i| m.index_for_attempt(i)).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn empty_list_is_a_configuration_error() {
        let m = MirrorList::default();
        assert!(matches!(
            m.effective_urls("org/repo/app.tar.gz"),
            Err(ConfigurationError::NoMirrors)
        ));
    }

    #[test]
    fn malformed_mirror_rejected() {
        let m = MirrorList::from(&["https://ok.example", "ftp://old.example"][..]);
        let err = m.effective_urls("org/repo/app.tar.gz").unwrap_err();
        match err {
            ConfigurationError::InvalidUrl { url, .. } => {
                assert!(url.starts_with("ftp://old.example/"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn duplicates_are_legal() {
        let m = MirrorList::from(&["https://m1", "https://m1"][..]);
        let urls = m.effective_urls("a/b.tar.gz").unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], urls[1]);
    }
}
