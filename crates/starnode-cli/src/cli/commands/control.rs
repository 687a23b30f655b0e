//! `starnode start|stop|restart|status|uninstall`.

use anyhow::{Context, Result};
use starnode_core::config::StarnodeConfig;
use starnode_core::control::{ControlCommand, ControlReport, ControlTable};
use starnode_core::service::{stack_services, CommandServiceManager};

pub fn run_control(cfg: &StarnodeConfig, command: ControlCommand) -> Result<()> {
    let layout = cfg.layout();
    let services: Vec<String> = stack_services(&layout, &cfg.stack_options())
        .into_iter()
        .map(|d| d.name)
        .collect();
    let manager = CommandServiceManager::new(cfg.service_backend());
    let report = ControlTable::new(&manager, &layout, services)
        .dispatch(command)
        .with_context(|| format!("starnode {command}"))?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &ControlReport) {
    match report.command {
        ControlCommand::Status => {
            for entry in &report.entries {
                let state = if entry.output.success { "running" } else { "not running" };
                println!("== {} ({})", entry.service, state);
                print!("{}", entry.output.stdout);
            }
        }
        ControlCommand::Uninstall => {
            for path in &report.removed {
                println!("removed {}", path.display());
            }
        }
        _ => {
            for entry in &report.entries {
                println!("{} {}: ok", entry.action, entry.service);
            }
        }
    }
}
