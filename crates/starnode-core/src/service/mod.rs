//! Service-manager collaborator: systemd via `systemctl` or supervisor via
//! `supervisorctl`, invoked as child processes.
//!
//! Supervision semantics belong to the manager; this module only emits
//! definitions and issues one-shot commands.

mod unit;

pub use unit::{
    render_prometheus_config, render_supervisor_program, render_systemd_unit, stack_services,
    ServiceDefinition, StackOptions,
};

use crate::layout::Layout;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Which service manager owns the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceBackend {
    Systemd,
    Supervisor,
}

impl ServiceBackend {
    /// systemd if it is the running init, otherwise supervisor.
    pub fn detect() -> Self {
        if Path::new("/run/systemd/system").is_dir() {
            ServiceBackend::Systemd
        } else {
            ServiceBackend::Supervisor
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            ServiceBackend::Systemd => "systemctl",
            ServiceBackend::Supervisor => "supervisorctl",
        }
    }

    /// Where the definition for `service` is written.
    pub fn definition_path(&self, layout: &Layout, service: &str) -> PathBuf {
        match self {
            ServiceBackend::Systemd => layout.unit_dir.join(format!("{}.service", service)),
            ServiceBackend::Supervisor => layout.supervisor_dir.join(format!("{}.conf", service)),
        }
    }

    pub fn render(&self, def: &ServiceDefinition) -> String {
        match self {
            ServiceBackend::Systemd => render_systemd_unit(def),
            ServiceBackend::Supervisor => render_supervisor_program(def),
        }
    }

    /// Arguments for `action`, or `None` when the action is a no-op for this backend.
    pub fn command_args(&self, action: ServiceAction, service: Option<&str>) -> Option<Vec<String>> {
        let mut args: Vec<String> = match (self, action) {
            (ServiceBackend::Systemd, ServiceAction::Reload) => return Some(vec!["daemon-reload".into()]),
            (ServiceBackend::Systemd, ServiceAction::Status) => vec!["status".into(), "--no-pager".into()],
            (ServiceBackend::Systemd, a) => vec![a.verb().into()],
            (ServiceBackend::Supervisor, ServiceAction::Reload) => return Some(vec!["update".into()]),
            // `update` picks up new programs; there is no separate enable step.
            (ServiceBackend::Supervisor, ServiceAction::Enable) => return None,
            (ServiceBackend::Supervisor, ServiceAction::Disable) => vec!["remove".into()],
            (ServiceBackend::Supervisor, a) => vec![a.verb().into()],
        };
        if let Some(name) = service {
            args.push(match self {
                ServiceBackend::Systemd => format!("{}.service", name),
                ServiceBackend::Supervisor => name.to_string(),
            });
        }
        Some(args)
    }
}

/// One-shot command issued to the service manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
    Status,
    Enable,
    Disable,
    /// Re-read definitions (`daemon-reload` / `update`).
    Reload,
}

impl ServiceAction {
    fn verb(&self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
            ServiceAction::Restart => "restart",
            ServiceAction::Status => "status",
            ServiceAction::Enable => "enable",
            ServiceAction::Disable => "disable",
            ServiceAction::Reload => "reload",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Captured result of one manager command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ServiceOutput {
    /// Output for an action the backend does not need.
    pub fn skipped() -> Self {
        Self {
            success: true,
            code: None,
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to run {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` failed ({status}): {stderr}")]
    Failed {
        command: String,
        /// `exit N`, or `killed by signal`.
        status: String,
        stderr: String,
    },
}

pub trait ServiceManager {
    fn backend(&self) -> ServiceBackend;

    /// Run `action`. Errors only when the command cannot be spawned; a
    /// non-zero exit is reported through `ServiceOutput::success`.
    fn run(&self, action: ServiceAction, service: Option<&str>) -> Result<ServiceOutput, ServiceError>;

    /// Like `run`, but a non-zero exit is an error.
    fn ensure(&self, action: ServiceAction, service: Option<&str>) -> Result<ServiceOutput, ServiceError> {
        let out = self.run(action, service)?;
        if !out.success {
            return Err(ServiceError::Failed {
                command: format!("{} {}", action, service.unwrap_or_default()).trim().to_string(),
                status: out
                    .code
                    .map_or_else(|| "killed by signal".to_string(), |c| format!("exit {}", c)),
                stderr: out.stderr.trim().to_string(),
            });
        }
        Ok(out)
    }
}

/// Manager backed by the real `systemctl` / `supervisorctl` binaries.
#[derive(Debug, Clone, Copy)]
pub struct CommandServiceManager {
    backend: ServiceBackend,
}

impl CommandServiceManager {
    pub fn new(backend: ServiceBackend) -> Self {
        Self { backend }
    }
}

impl ServiceManager for CommandServiceManager {
    fn backend(&self) -> ServiceBackend {
        self.backend
    }

    fn run(&self, action: ServiceAction, service: Option<&str>) -> Result<ServiceOutput, ServiceError> {
        let Some(args) = self.backend.command_args(action, service) else {
            return Ok(ServiceOutput::skipped());
        };
        let program = self.backend.program();
        tracing::debug!(program, args = ?args, "service command");
        let out = Command::new(program)
            .args(&args)
            .output()
            .map_err(|source| ServiceError::Spawn {
                program: program.to_string(),
                source,
            })?;
        Ok(ServiceOutput {
            success: out.status.success(),
            code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }
}
