//! Install pipeline: for each artifact, strictly in order,
//! `Pending → Downloaded → Verified → Installed`, then service configuration.
//!
//! Any failure rolls back every file this run placed (binaries of earlier
//! artifacts included) so no half-configured stack is left behind. Verified
//! archives in the download dir are kept; an archive that fails
//! verification is deleted.

mod ledger;

pub use ledger::InstallLedger;

use crate::artifact::ArtifactSpec;
use crate::checksum::{self, VerificationError};
use crate::extract::{self, ExtractError};
use crate::fetch::{FetchError, ResilientFetcher};
use crate::layout::Layout;
use crate::mirror::MirrorList;
use crate::platform::Platform;
use crate::service::{
    render_prometheus_config, stack_services, ServiceAction, ServiceError, ServiceManager,
    StackOptions,
};
use crate::transport::Transport;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-artifact progress. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ArtifactState {
    Pending,
    Downloaded,
    Verified,
    Installed,
}

impl fmt::Display for ArtifactState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArtifactState::Pending => "pending",
            ArtifactState::Downloaded => "downloaded",
            ArtifactState::Verified => "verified",
            ArtifactState::Installed => "installed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("{artifact}: download failed")]
    Fetch {
        artifact: String,
        #[source]
        source: FetchError,
    },
    #[error("{artifact}: integrity check failed")]
    Verification {
        artifact: String,
        #[source]
        source: VerificationError,
    },
    #[error("{artifact}: extraction failed")]
    Extract {
        artifact: String,
        #[source]
        source: ExtractError,
    },
    #[error("failed to write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("service manager")]
    Service(#[from] ServiceError),
}

impl InstallError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> InstallError + '_ {
        move |source| InstallError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Outcome for one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledArtifact {
    pub name: String,
    pub version: String,
    pub archive: PathBuf,
    pub binaries: Vec<PathBuf>,
    /// The archive was already present and verified; no download happened.
    pub reused: bool,
    pub state: ArtifactState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub artifacts: Vec<InstalledArtifact>,
    /// Services (re)started, in start order.
    pub services: Vec<String>,
}

/// Drives the pipeline with borrowed collaborators; holds no mutable state.
pub struct Installer<'a, T: Transport> {
    fetcher: &'a ResilientFetcher<T>,
    mirrors: &'a MirrorList,
    layout: &'a Layout,
    platform: Platform,
    reuse_verified: bool,
}

impl<'a, T: Transport> Installer<'a, T> {
    pub fn new(
        fetcher: &'a ResilientFetcher<T>,
        mirrors: &'a MirrorList,
        layout: &'a Layout,
        platform: Platform,
    ) -> Self {
        Self {
            fetcher,
            mirrors,
            layout,
            platform,
            reuse_verified: true,
        }
    }

    /// Skip the download when a verified archive is already in the download dir.
    pub fn reuse_verified(mut self, reuse: bool) -> Self {
        self.reuse_verified = reuse;
        self
    }

    /// Fetch, verify and install binaries only (no service configuration).
    pub fn install_artifacts(&self, artifacts: &[ArtifactSpec]) -> Result<InstallReport, InstallError> {
        let mut ledger = InstallLedger::new();
        let result = self.install_all(artifacts, &mut ledger).map(|artifacts| InstallReport {
            artifacts,
            services: Vec::new(),
        });
        settle(ledger, result, None)
    }

    /// Full provisioning run: artifacts, `prometheus.yml`, service definitions,
    /// manager reload, enable and (re)start.
    pub fn run(
        &self,
        artifacts: &[ArtifactSpec],
        stack: &StackOptions,
        manager: &dyn ServiceManager,
    ) -> Result<InstallReport, InstallError> {
        let mut ledger = InstallLedger::new();
        let mut trail = ServiceTrail::default();
        let result = self.install_all(artifacts, &mut ledger).and_then(|artifacts| {
            let services = self.configure_services(stack, manager, &mut ledger, &mut trail)?;
            Ok(InstallReport { artifacts, services })
        });
        settle(ledger, result, Some((manager, &trail)))
    }

    fn install_all(
        &self,
        artifacts: &[ArtifactSpec],
        ledger: &mut InstallLedger,
    ) -> Result<Vec<InstalledArtifact>, InstallError> {
        let mut done = Vec::with_capacity(artifacts.len());
        for spec in artifacts {
            done.push(self.install_one(spec, ledger)?);
        }
        Ok(done)
    }

    fn install_one(
        &self,
        spec: &ArtifactSpec,
        ledger: &mut InstallLedger,
    ) -> Result<InstalledArtifact, InstallError> {
        tracing::info!(artifact = %spec.name, version = %spec.version, state = %ArtifactState::Pending, "artifact");
        let (archive, reused) = self.acquire(spec)?;

        let bin_dir = self.layout.bin_dir();
        fs::create_dir_all(&bin_dir).map_err(InstallError::io(&bin_dir))?;
        // Staging inside bin_dir keeps the final rename on one filesystem.
        let staging = tempfile::Builder::new()
            .prefix(".starnode-stage-")
            .tempdir_in(&bin_dir)
            .map_err(InstallError::io(&bin_dir))?;
        let extracted = extract::extract_binaries(&archive, &spec.binaries, staging.path()).map_err(
            |source| InstallError::Extract {
                artifact: spec.name.clone(),
                source,
            },
        )?;
        let mut binaries = Vec::with_capacity(extracted.len());
        for bin in extracted {
            let target = self.layout.binary(&bin.name);
            ledger
                .place(&bin.path, &target)
                .map_err(InstallError::io(&target))?;
            binaries.push(target);
        }
        tracing::info!(artifact = %spec.name, state = %ArtifactState::Installed, binaries = binaries.len(), "artifact");

        Ok(InstalledArtifact {
            name: spec.name.clone(),
            version: spec.version.clone(),
            archive,
            binaries,
            reused,
            state: ArtifactState::Installed,
        })
    }

    /// Pending → Downloaded → Verified. Returns the archive path and whether it was reused.
    fn acquire(&self, spec: &ArtifactSpec) -> Result<(PathBuf, bool), InstallError> {
        let filename = spec.expected_filename(&self.platform);
        let fetch_err = |source| InstallError::Fetch {
            artifact: spec.name.clone(),
            source,
        };
        let verify_err = |source| InstallError::Verification {
            artifact: spec.name.clone(),
            source,
        };

        let manifest = self
            .fetcher
            .fetch_checksum_manifest(&spec.manifest_url(), self.mirrors)
            .map_err(fetch_err)?;
        // Refuse before spending bandwidth on a file that can never be verified.
        if manifest.digest_for(&filename).is_none() {
            return Err(verify_err(VerificationError::ChecksumNotFound { filename }));
        }

        let dest = self.layout.download_dir.join(&filename);
        if self.reuse_verified && dest.is_file() {
            match checksum::verify(&dest, &filename, &manifest) {
                Ok(()) => {
                    tracing::info!(artifact = %spec.name, path = %dest.display(), state = %ArtifactState::Verified, "reusing verified download");
                    return Ok((dest, true));
                }
                Err(e) => {
                    tracing::debug!(artifact = %spec.name, error = %e, "cached archive unusable, downloading again");
                }
            }
        }

        let request = self.fetcher.request(&spec.canonical_url(&self.platform), &dest);
        let local = self.fetcher.fetch(&request, self.mirrors).map_err(fetch_err)?;
        tracing::info!(artifact = %spec.name, state = %ArtifactState::Downloaded, mirror = %local.mirror, "artifact");

        if let Err(e) = checksum::verify(local.path(), &filename, &manifest) {
            if let Err(rm) = fs::remove_file(local.path()) {
                tracing::warn!(path = %local.path().display(), error = %rm, "failed to delete unverified archive");
            }
            return Err(verify_err(e));
        }
        tracing::info!(artifact = %spec.name, state = %ArtifactState::Verified, "artifact");
        Ok((local.path, false))
    }

    fn configure_services(
        &self,
        stack: &StackOptions,
        manager: &dyn ServiceManager,
        ledger: &mut InstallLedger,
        trail: &mut ServiceTrail,
    ) -> Result<Vec<String>, InstallError> {
        let backend = manager.backend();
        let tsdb = self.layout.data_dir().join("prometheus");
        fs::create_dir_all(&tsdb).map_err(InstallError::io(&tsdb))?;

        let config_path = self.layout.prometheus_config();
        ledger
            .write_file(&config_path, &render_prometheus_config(stack))
            .map_err(InstallError::io(&config_path))?;

        let services = stack_services(self.layout, stack);
        for def in &services {
            let path = backend.definition_path(self.layout, &def.name);
            ledger
                .write_file(&path, &backend.render(def))
                .map_err(InstallError::io(&path))?;
        }

        trail.reloaded = true;
        manager.ensure(ServiceAction::Reload, None)?;
        let mut started = Vec::with_capacity(services.len());
        for def in &services {
            trail.enabled.push(def.name.clone());
            manager.ensure(ServiceAction::Enable, Some(&def.name))?;
            manager.ensure(ServiceAction::Restart, Some(&def.name))?;
            tracing::info!(service = %def.name, "service started");
            started.push(def.name.clone());
        }
        Ok(started)
    }
}

/// What this run asked the service manager to do, so a failed run can undo it.
#[derive(Debug, Default)]
struct ServiceTrail {
    reloaded: bool,
    /// Services enable/restart was issued for, in order.
    enabled: Vec<String>,
}

/// Commit on success. On failure: stop and disable touched services (newest
/// first), roll back files, then reload so the manager forgets removed definitions.
fn settle(
    ledger: InstallLedger,
    result: Result<InstallReport, InstallError>,
    services: Option<(&dyn ServiceManager, &ServiceTrail)>,
) -> Result<InstallReport, InstallError> {
    let e = match result {
        Ok(report) => {
            ledger.commit();
            return Ok(report);
        }
        Err(e) => e,
    };
    if let Some((manager, trail)) = services {
        for name in trail.enabled.iter().rev() {
            for action in [ServiceAction::Stop, ServiceAction::Disable] {
                best_effort(manager, action, Some(name.as_str()));
            }
        }
    }
    let undone = ledger.rollback();
    if let Some((manager, trail)) = services {
        if trail.reloaded {
            best_effort(manager, ServiceAction::Reload, None);
        }
    }
    tracing::warn!(error = %e, undone, "install failed, rolled back");
    Err(e)
}

/// Issue a rollback command; failures are logged, never raised.
fn best_effort(manager: &dyn ServiceManager, action: ServiceAction, service: Option<&str>) {
    match manager.run(action, service) {
        Ok(out) if out.success => {}
        Ok(out) => {
            tracing::warn!(%action, service = service.unwrap_or("-"), stderr = %out.stderr.trim(), "rollback command failed")
        }
        Err(e) => tracing::warn!(%action, service = service.unwrap_or("-"), error = %e, "rollback command failed"),
    }
}
