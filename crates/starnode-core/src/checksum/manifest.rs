//! `sha256sum`-style manifests: one `<64-hex digest><whitespace><filename>` per line.

use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
#[error("checksum manifest has no `<sha256>  <filename>` entries ({lines} lines read)")]
pub struct ManifestParseError {
    pub lines: usize,
}

/// Filename → lowercase hex digest. Lives only for one install step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    entries: BTreeMap<String, String>,
}

impl ChecksumManifest {
    /// Parse manifest text. Lines that do not match the two-field format are
    /// ignored; a manifest with no matching line at all is an error.
    pub fn parse(text: &str) -> Result<Self, ManifestParseError> {
        let mut entries = BTreeMap::new();
        let mut lines = 0usize;
        for line in text.lines() {
            lines += 1;
            if let Some((digest, filename)) = parse_line(line) {
                // First entry wins on duplicates.
                entries.entry(filename).or_insert(digest);
            }
        }
        if entries.is_empty() {
            return Err(ManifestParseError { lines });
        }
        Ok(ChecksumManifest { entries })
    }

    /// Exact-filename lookup.
    pub fn digest_for(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(f, d)| (f.as_str(), d.as_str()))
    }
}

/// Parse one manifest line into `(digest, filename)`.
/// Accepts the `*` binary-mode marker `sha256sum -b` puts before the filename.
pub fn parse_line(line: &str) -> Option<(String, String)> {
    let mut fields = line.split_whitespace();
    let digest = fields.next()?;
    let filename = fields.next()?;
    if fields.next().is_some() {
        return None;
    }
    if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let filename = filename.strip_prefix('*').unwrap_or(filename);
    if filename.is_empty() {
        return None;
    }
    Some((digest.to_ascii_lowercase(), filename.to_string()))
}
