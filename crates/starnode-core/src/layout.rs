//! Filesystem layout of an installation.

use std::path::PathBuf;

/// Where binaries, data, configuration, downloads and service definitions live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Root of the install; `bin/` and `data/` live below it.
    pub install_dir: PathBuf,
    /// Holds `prometheus.yml`.
    pub config_dir: PathBuf,
    /// Verified release archives, kept for idempotent re-runs.
    pub download_dir: PathBuf,
    /// systemd unit directory.
    pub unit_dir: PathBuf,
    /// supervisor program directory.
    pub supervisor_dir: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from("/opt/starnode"),
            config_dir: PathBuf::from("/etc/starnode"),
            download_dir: PathBuf::from("/var/cache/starnode"),
            unit_dir: PathBuf::from("/etc/systemd/system"),
            supervisor_dir: PathBuf::from("/etc/supervisor/conf.d"),
        }
    }
}

impl Layout {
    pub fn bin_dir(&self) -> PathBuf {
        self.install_dir.join("bin")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.install_dir.join("data")
    }

    pub fn binary(&self, name: &str) -> PathBuf {
        self.bin_dir().join(name)
    }

    pub fn prometheus_config(&self) -> PathBuf {
        self.config_dir.join("prometheus.yml")
    }

    /// Layout rooted entirely under `root` (tests, staged images).
    pub fn under(root: &std::path::Path) -> Self {
        Self {
            install_dir: root.join("opt/starnode"),
            config_dir: root.join("etc/starnode"),
            download_dir: root.join("var/cache/starnode"),
            unit_dir: root.join("etc/systemd/system"),
            supervisor_dir: root.join("etc/supervisor/conf.d"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths() {
        let l = Layout::default();
        assert_eq!(l.binary("prometheus"), PathBuf::from("/opt/starnode/bin/prometheus"));
        assert_eq!(l.data_dir(), PathBuf::from("/opt/starnode/data"));
        assert_eq!(l.prometheus_config(), PathBuf::from("/etc/starnode/prometheus.yml"));
    }
}
