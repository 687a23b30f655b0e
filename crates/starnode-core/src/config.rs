use crate::artifact::ArtifactSpec;
use crate::layout::Layout;
use crate::mirror::MirrorList;
use crate::platform::Platform;
use crate::retry::{Backoff, RetryPolicy};
use crate::service::{ServiceBackend, StackOptions};
use crate::transport::CurlOptions;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Delay strategy between failed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    None,
    #[default]
    Fixed,
    Exponential,
}

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per artifact (including the first).
    pub max_attempts: u32,
    #[serde(default)]
    pub backoff: BackoffKind,
    /// Fixed delay, or the base delay for exponential backoff (e.g. 0.5 = 500ms).
    pub delay_secs: f64,
    /// Cap for exponential backoff.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffKind::Fixed,
            delay_secs: 2.0,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> Result<RetryPolicy> {
        let delay = self.delay()?;
        let backoff = match self.backoff {
            BackoffKind::None => Backoff::None,
            BackoffKind::Fixed => Backoff::Fixed(delay),
            BackoffKind::Exponential => Backoff::Exponential {
                base: delay,
                max: Duration::from_secs(self.max_delay_secs),
            },
        };
        Ok(RetryPolicy {
            max_attempts: self.max_attempts,
            backoff,
        })
    }

    fn delay(&self) -> Result<Duration> {
        if !self.delay_secs.is_finite() || self.delay_secs < 0.0 {
            bail!(
                "retry.delay_secs must be a finite number of seconds >= 0, got {}",
                self.delay_secs
            );
        }
        Duration::try_from_secs_f64(self.delay_secs)
            .with_context(|| format!("retry.delay_secs = {} is out of range", self.delay_secs))
    }
}

/// Install locations (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirsConfig {
    pub install_dir: PathBuf,
    pub config_dir: PathBuf,
    pub download_dir: PathBuf,
    pub unit_dir: PathBuf,
    pub supervisor_dir: PathBuf,
}

impl Default for DirsConfig {
    fn default() -> Self {
        let layout = Layout::default();
        Self {
            install_dir: layout.install_dir,
            config_dir: layout.config_dir,
            download_dir: layout.download_dir,
            unit_dir: layout.unit_dir,
            supervisor_dir: layout.supervisor_dir,
        }
    }
}

/// Global configuration loaded from `~/.config/starnode/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarnodeConfig {
    /// Mirror base URLs, tried in order; the origin URL is appended to each.
    pub mirrors: Vec<String>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    pub connect_timeout_secs: u64,
    /// Upper bound on a single download attempt.
    pub attempt_timeout_secs: u64,
    /// Skip the download when the archive on disk already verifies.
    #[serde(default = "default_true")]
    pub reuse_verified_downloads: bool,
    pub prometheus_version: String,
    pub node_exporter_version: String,
    /// `<os>-<arch>` override, e.g. "linux-arm64". Detected when missing.
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub dirs: Option<DirsConfig>,
    /// "systemd" or "supervisor". Detected when missing.
    #[serde(default)]
    pub service_backend: Option<ServiceBackend>,
    #[serde(default)]
    pub service_user: Option<String>,
    pub prometheus_port: u16,
    pub node_exporter_port: u16,
    pub scrape_interval_secs: u32,
}

fn default_true() -> bool {
    true
}

impl Default for StarnodeConfig {
    fn default() -> Self {
        let stack = StackOptions::default();
        Self {
            mirrors: vec![
                "https://ghproxy.net".to_string(),
                "https://gh-proxy.com".to_string(),
            ],
            retry: None,
            connect_timeout_secs: 15,
            attempt_timeout_secs: 600,
            reuse_verified_downloads: true,
            prometheus_version: "2.53.0".to_string(),
            node_exporter_version: "1.8.1".to_string(),
            platform: None,
            dirs: None,
            service_backend: None,
            service_user: None,
            prometheus_port: stack.prometheus_port,
            node_exporter_port: stack.node_exporter_port,
            scrape_interval_secs: stack.scrape_interval_secs,
        }
    }
}

impl StarnodeConfig {
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        self.retry.clone().unwrap_or_default().policy()
    }

    pub fn curl_options(&self) -> CurlOptions {
        CurlOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            attempt_timeout: Duration::from_secs(self.attempt_timeout_secs),
            ..CurlOptions::default()
        }
    }

    pub fn mirror_list(&self) -> MirrorList {
        MirrorList::new(self.mirrors.clone())
    }

    pub fn layout(&self) -> Layout {
        match &self.dirs {
            Some(d) => Layout {
                install_dir: d.install_dir.clone(),
                config_dir: d.config_dir.clone(),
                download_dir: d.download_dir.clone(),
                unit_dir: d.unit_dir.clone(),
                supervisor_dir: d.supervisor_dir.clone(),
            },
            None => Layout::default(),
        }
    }

    /// Artifacts in install order: Prometheus first, then Node Exporter.
    pub fn artifacts(&self) -> Vec<ArtifactSpec> {
        vec![
            ArtifactSpec::prometheus(&self.prometheus_version),
            ArtifactSpec::node_exporter(&self.node_exporter_version),
        ]
    }

    pub fn stack_options(&self) -> StackOptions {
        StackOptions {
            prometheus_port: self.prometheus_port,
            node_exporter_port: self.node_exporter_port,
            user: self.service_user.clone(),
            scrape_interval_secs: self.scrape_interval_secs,
        }
    }

    pub fn platform(&self) -> Result<Platform> {
        match &self.platform {
            Some(p) => p
                .parse::<Platform>()
                .with_context(|| format!("invalid platform override `{p}`")),
            None => Platform::current().context("detect platform"),
        }
    }

    pub fn service_backend(&self) -> ServiceBackend {
        self.service_backend.unwrap_or_else(ServiceBackend::detect)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("starnode")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<StarnodeConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = StarnodeConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load an explicit config file; it must exist.
pub fn load_from(path: &Path) -> Result<StarnodeConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: StarnodeConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    cfg.retry_policy()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        mirrors = ["https://m1.example", "https://m2.example/"]
        connect_timeout_secs = 5
        attempt_timeout_secs = 120
        prometheus_version = "2.50.1"
        node_exporter_version = "1.7.0"
        prometheus_port = 9090
        node_exporter_port = 9100
        scrape_interval_secs = 30
    "#;

    #[test]
    fn default_config_values() {
        let cfg = StarnodeConfig::default();
        assert_eq!(cfg.mirrors.len(), 2);
        assert!(cfg.reuse_verified_downloads);
        let policy = cfg.retry_policy().unwrap();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, Backoff::Fixed(Duration::from_secs(2)));
        assert_eq!(cfg.layout(), Layout::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = StarnodeConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: StarnodeConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.mirrors, cfg.mirrors);
        assert_eq!(parsed.prometheus_version, cfg.prometheus_version);
        assert_eq!(parsed.node_exporter_port, cfg.node_exporter_port);
    }

    #[test]
    fn config_toml_custom_values() {
        let cfg: StarnodeConfig = toml::from_str(MINIMAL).unwrap();
        assert_eq!(cfg.mirror_list().len(), 2);
        assert!(cfg.retry.is_none());
        assert!(cfg.reuse_verified_downloads);
        assert_eq!(cfg.curl_options().connect_timeout, Duration::from_secs(5));
        assert_eq!(cfg.curl_options().attempt_timeout, Duration::from_secs(120));
        let artifacts = cfg.artifacts();
        assert_eq!(artifacts[0].name, "prometheus");
        assert_eq!(artifacts[0].version, "2.50.1");
        assert_eq!(artifacts[1].name, "node_exporter");
        assert_eq!(cfg.stack_options().scrape_interval_secs, 30);
    }

    #[test]
    fn config_toml_retry_section() {
        let toml = format!(
            "{MINIMAL}\n[retry]\nmax_attempts = 5\nbackoff = \"exponential\"\ndelay_secs = 0.5\nmax_delay_secs = 8\n"
        );
        let cfg: StarnodeConfig = toml::from_str(&toml).unwrap();
        let policy = cfg.retry_policy().unwrap();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(
            policy.backoff,
            Backoff::Exponential {
                base: Duration::from_millis(500),
                max: Duration::from_secs(8),
            }
        );

        let none = format!("{MINIMAL}\n[retry]\nmax_attempts = 1\nbackoff = \"none\"\ndelay_secs = 0\nmax_delay_secs = 0\n");
        let cfg: StarnodeConfig = toml::from_str(&none).unwrap();
        assert_eq!(cfg.retry_policy().unwrap().backoff, Backoff::None);
    }

    #[test]
    fn unusable_retry_delay_is_an_error() {
        for delay in ["inf", "nan", "1e30", "-1.0"] {
            let toml = format!(
                "{MINIMAL}\n[retry]\nmax_attempts = 3\nbackoff = \"fixed\"\ndelay_secs = {delay}\nmax_delay_secs = 30\n"
            );
            let cfg: StarnodeConfig = toml::from_str(&toml).unwrap();
            let err = cfg.retry_policy().unwrap_err();
            assert!(format!("{err:#}").contains("delay_secs"), "{delay}: {err:#}");
        }
    }

    #[test]
    fn load_from_rejects_infinite_delay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let toml = format!(
            "{MINIMAL}\n[retry]\nmax_attempts = 3\nbackoff = \"exponential\"\ndelay_secs = inf\nmax_delay_secs = 30\n"
        );
        fs::write(&path, toml).unwrap();
        let err = load_from(&path).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("config.toml"));
        assert!(msg.contains("delay_secs"));
    }

    #[test]
    fn config_toml_overrides() {
        let toml = format!(
            "reuse_verified_downloads = false\nplatform = \"linux-arm64\"\nservice_backend = \"supervisor\"\nservice_user = \"prometheus\"\n{MINIMAL}\n[dirs]\ninstall_dir = \"/srv/stack\"\nconfig_dir = \"/srv/etc\"\ndownload_dir = \"/srv/cache\"\nunit_dir = \"/srv/units\"\nsupervisor_dir = \"/srv/supervisor\"\n"
        );
        let cfg: StarnodeConfig = toml::from_str(&toml).unwrap();
        assert!(!cfg.reuse_verified_downloads);
        assert_eq!(cfg.platform().unwrap().identifier(), "linux-arm64");
        assert_eq!(cfg.service_backend(), ServiceBackend::Supervisor);
        assert_eq!(cfg.stack_options().user.as_deref(), Some("prometheus"));
        assert_eq!(cfg.layout().bin_dir(), PathBuf::from("/srv/stack/bin"));
    }

    #[test]
    fn bad_platform_override_is_an_error() {
        let cfg = StarnodeConfig {
            platform: Some("amd64".to_string()),
            ..StarnodeConfig::default()
        };
        assert!(cfg.platform().is_err());
    }

    #[test]
    fn load_from_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, MINIMAL).unwrap();
        assert_eq!(load_from(&path).unwrap().prometheus_version, "2.50.1");

        fs::write(&path, "mirrors = 3").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
    }
}
