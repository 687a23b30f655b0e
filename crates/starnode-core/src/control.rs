//! `starnode start|stop|restart|status|uninstall`: a small command table, each
//! entry a one-shot action delegated to the service manager.

use crate::layout::Layout;
use crate::service::{ServiceAction, ServiceError, ServiceManager, ServiceOutput};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Stop,
    Restart,
    Status,
    Uninstall,
}

/// Name and one-line help for every command.
pub const COMMANDS: &[(ControlCommand, &str, &str)] = &[
    (ControlCommand::Start, "start", "start all services"),
    (ControlCommand::Stop, "stop", "stop all services"),
    (ControlCommand::Restart, "restart", "restart all services"),
    (ControlCommand::Status, "status", "show service status"),
    (
        ControlCommand::Uninstall,
        "uninstall",
        "stop services and remove binaries, data and service definitions",
    ),
];

impl ControlCommand {
    pub fn name(&self) -> &'static str {
        COMMANDS
            .iter()
            .find(|(c, _, _)| c == self)
            .map(|(_, n, _)| *n)
            .unwrap_or("?")
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command `{0}` (expected start, stop, restart, status or uninstall)")]
pub struct UnknownCommand(pub String);

impl FromStr for ControlCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        COMMANDS
            .iter()
            .find(|(_, n, _)| n.eq_ignore_ascii_case(s.trim()))
            .map(|(c, _, _)| *c)
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("failed to remove {}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of one action on one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReport {
    pub service: String,
    pub action: ServiceAction,
    pub output: ServiceOutput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlReport {
    pub command: ControlCommand,
    pub entries: Vec<ServiceReport>,
    /// Paths deleted by `uninstall`.
    pub removed: Vec<PathBuf>,
}

/// Dispatches control commands for a fixed, ordered set of services.
pub struct ControlTable<'a> {
    manager: &'a dyn ServiceManager,
    layout: &'a Layout,
    /// Start order; stop runs in reverse.
    services: Vec<String>,
}

impl<'a> ControlTable<'a> {
    pub fn new(manager: &'a dyn ServiceManager, layout: &'a Layout, services: Vec<String>) -> Self {
        Self {
            manager,
            layout,
            services,
        }
    }

    pub fn dispatch(&self, command: ControlCommand) -> Result<ControlReport, ControlError> {
        tracing::info!(%command, services = ?self.services, "control");
        let mut report = ControlReport {
            command,
            entries: Vec::new(),
            removed: Vec::new(),
        };
        match command {
            ControlCommand::Start => self.each(ServiceAction::Start, false, true, &mut report)?,
            ControlCommand::Restart => self.each(ServiceAction::Restart, false, true, &mut report)?,
            ControlCommand::Stop => self.each(ServiceAction::Stop, true, true, &mut report)?,
            // A stopped service is a valid status answer, not a failure.
            ControlCommand::Status => self.each(ServiceAction::Status, false, false, &mut report)?,
            ControlCommand::Uninstall => self.uninstall(&mut report)?,
        }
        Ok(report)
    }

    fn each(
        &self,
        action: ServiceAction,
        reverse: bool,
        strict: bool,
        report: &mut ControlReport,
    ) -> Result<(), ControlError> {
        let ordered: Box<dyn Iterator<Item = &String>> = if reverse {
            Box::new(self.services.iter().rev())
        } else {
            Box::new(self.services.iter())
        };
        for service in ordered {
            let output = if strict {
                self.manager.ensure(action, Some(service))?
            } else {
                self.manager.run(action, Some(service))?
            };
            report.entries.push(ServiceReport {
                service: service.clone(),
                action,
                output,
            });
        }
        Ok(())
    }

    fn uninstall(&self, report: &mut ControlReport) -> Result<(), ControlError> {
        let backend = self.manager.backend();
        for service in self.services.iter().rev() {
            for action in [ServiceAction::Stop, ServiceAction::Disable] {
                let output = self.manager.run(action, Some(service))?;
                if !output.success {
                    tracing::warn!(%service, %action, stderr = %output.stderr.trim(), "ignored during uninstall");
                }
                report.entries.push(ServiceReport {
                    service: service.clone(),
                    action,
                    output,
                });
            }
        }
        for service in &self.services {
            remove_path(&backend.definition_path(self.layout, service), &mut report.removed)?;
        }
        self.manager.ensure(ServiceAction::Reload, None)?;
        remove_path(&self.layout.install_dir, &mut report.removed)?;
        remove_path(&self.layout.config_dir, &mut report.removed)?;
        Ok(())
    }
}

/// Remove a file or directory tree; a missing path is not an error.
fn remove_path(path: &Path, removed: &mut Vec<PathBuf>) -> Result<(), ControlError> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => {
            tracing::info!(path = %path.display(), "removed");
            removed.push(path.to_path_buf());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ControlError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}
