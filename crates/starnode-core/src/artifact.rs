//! Release artifact identities: expected file name, canonical URL and
//! checksum manifest URL for a GitHub release of the Prometheus project.

use crate::platform::Platform;

const RELEASE_HOST: &str = "https://github.com";
const MANIFEST_NAME: &str = "sha256sums.txt";

/// One downloadable component of the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    /// Archive/binary base name, e.g. `node_exporter`.
    pub name: String,
    /// `owner/repo` on GitHub.
    pub repository: String,
    /// Version without the `v` prefix.
    pub version: String,
    /// Executables copied out of the archive.
    pub binaries: Vec<String>,
}

impl ArtifactSpec {
    pub fn new(name: &str, repository: &str, version: &str, binaries: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            repository: repository.to_string(),
            version: version.trim().trim_start_matches('v').to_string(),
            binaries: binaries.iter().map(|b| b.to_string()).collect(),
        }
    }

    pub fn prometheus(version: &str) -> Self {
        Self::new("prometheus", "prometheus/prometheus", version, &["prometheus", "promtool"])
    }

    pub fn node_exporter(version: &str) -> Self {
        Self::new("node_exporter", "prometheus/node_exporter", version, &["node_exporter"])
    }

    /// `<name>-<version>.<os>-<arch>.tar.gz`
    pub fn expected_filename(&self, platform: &Platform) -> String {
        format!("{}-{}.{}.tar.gz", self.name, self.version, platform.identifier())
    }

    fn release_base(&self) -> String {
        format!(
            "{}/{}/releases/download/v{}",
            RELEASE_HOST, self.repository, self.version
        )
    }

    /// Origin URL of the archive; mirrors prefix this verbatim.
    pub fn canonical_url(&self, platform: &Platform) -> String {
        format!("{}/{}", self.release_base(), self.expected_filename(platform))
    }

    pub fn manifest_url(&self) -> String {
        format!("{}/{}", self.release_base(), MANIFEST_NAME)
    }
}
