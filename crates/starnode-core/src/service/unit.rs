//! Service definitions and the config files emitted for them.

use crate::layout::Layout;
use std::fmt::Write;

/// Settings shared by the emitted units and `prometheus.yml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackOptions {
    pub prometheus_port: u16,
    pub node_exporter_port: u16,
    /// Account the services run as; `None` leaves it to the manager's default.
    pub user: Option<String>,
    pub scrape_interval_secs: u32,
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            prometheus_port: 9090,
            node_exporter_port: 9100,
            user: None,
            scrape_interval_secs: 15,
        }
    }
}

/// Manager-agnostic description of one long-running service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub name: String,
    pub description: String,
    /// Program followed by its arguments.
    pub exec: Vec<String>,
    pub user: Option<String>,
}

impl ServiceDefinition {
    pub fn command_line(&self) -> String {
        self.exec.join(" ")
    }
}

/// Services of the stack, in start order.
pub fn stack_services(layout: &Layout, opts: &StackOptions) -> Vec<ServiceDefinition> {
    let prometheus = ServiceDefinition {
        name: "prometheus".to_string(),
        description: "Prometheus monitoring server".to_string(),
        exec: vec![
            layout.binary("prometheus").display().to_string(),
            format!("--config.file={}", layout.prometheus_config().display()),
            format!(
                "--storage.tsdb.path={}",
                layout.data_dir().join("prometheus").display()
            ),
            format!("--web.listen-address=0.0.0.0:{}", opts.prometheus_port),
        ],
        user: opts.user.clone(),
    };
    let node_exporter = ServiceDefinition {
        name: "node_exporter".to_string(),
        description: "Prometheus Node Exporter".to_string(),
        exec: vec![
            layout.binary("node_exporter").display().to_string(),
            format!("--web.listen-address=0.0.0.0:{}", opts.node_exporter_port),
        ],
        user: opts.user.clone(),
    };
    vec![prometheus, node_exporter]
}

pub fn render_systemd_unit(def: &ServiceDefinition) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "[Unit]");
    let _ = writeln!(s, "Description={}", def.description);
    let _ = writeln!(s, "Wants=network-online.target");
    let _ = writeln!(s, "After=network-online.target");
    let _ = writeln!(s);
    let _ = writeln!(s, "[Service]");
    if let Some(user) = &def.user {
        let _ = writeln!(s, "User={}", user);
        let _ = writeln!(s, "Group={}", user);
    }
    let _ = writeln!(s, "Type=simple");
    let _ = writeln!(s, "ExecStart={}", def.command_line());
    let _ = writeln!(s, "Restart=on-failure");
    let _ = writeln!(s);
    let _ = writeln!(s, "[Install]");
    let _ = writeln!(s, "WantedBy=multi-user.target");
    s
}

pub fn render_supervisor_program(def: &ServiceDefinition) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "[program:{}]", def.name);
    let _ = writeln!(s, "command={}", def.command_line());
    if let Some(user) = &def.user {
        let _ = writeln!(s, "user={}", user);
    }
    let _ = writeln!(s, "autostart=true");
    let _ = writeln!(s, "autorestart=true");
    let _ = writeln!(s, "redirect_stderr=true");
    s
}

/// Minimal `prometheus.yml` scraping itself and the local node exporter.
pub fn render_prometheus_config(opts: &StackOptions) -> String {
    format!(
        "global:\n  scrape_interval: {interval}s\n\nscrape_configs:\n  - job_name: \"prometheus\"\n    static_configs:\n      - targets: [\"localhost:{prom}\"]\n  - job_name: \"node\"\n    static_configs:\n      - targets: [\"localhost:{node}\"]\n",
        interval = opts.scrape_interval_secs,
        prom = opts.prometheus_port,
        node = opts.node_exporter_port,
    )
}
