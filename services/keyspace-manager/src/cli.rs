use clap::Parser;

use svckit::types::{CertReqs, ConsistencyLevel, KeyspaceState};

use crate::config::KeyspaceManagerConfig;

#[derive(Parser, Debug)]
#[command(name = "keyspace-manager")]
#[command(about = "Create, alter and drop keyspaces idempotently", long_about = None)]
pub struct Args {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Keyspace name
    #[arg(long)]
    pub name: Option<String>,

    /// Desired state: present or absent
    #[arg(long)]
    pub state: Option<KeyspaceState>,

    /// Replication factor for SimpleStrategy
    #[arg(long)]
    pub replication_factor: Option<u32>,

    #[arg(long)]
    pub durable_writes: Option<bool>,

    /// Per-datacentre replication as DC=RF; repeat for each datacentre
    #[arg(long = "data-centre", visible_alias = "data-center", value_parser = parse_data_centre)]
    pub data_centres: Vec<(String, u32)>,

    /// Contact point; repeat for several hosts
    #[arg(long)]
    pub login_host: Vec<String>,

    #[arg(long)]
    pub login_port: Option<u16>,

    #[arg(long)]
    pub login_user: Option<String>,

    #[arg(long, env = "KEYSPACE_MANAGER_LOGIN_PASSWORD", hide_env_values = true)]
    pub login_password: Option<String>,

    /// Encrypt connections to the cluster
    #[arg(long)]
    pub ssl: bool,

    /// CERT_NONE, CERT_OPTIONAL or CERT_REQUIRED
    #[arg(long)]
    pub ssl_cert_reqs: Option<CertReqs>,

    /// CA bundle used to verify the cluster certificate
    #[arg(long)]
    pub ssl_ca_certs: Option<String>,

    #[arg(long)]
    pub consistency_level: Option<ConsistencyLevel>,

    /// Report what would change without executing any DDL
    #[arg(long)]
    pub check: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Overlays explicitly given flags on top of the loaded configuration.
    pub fn apply(&self, config: &mut KeyspaceManagerConfig) {
        if let Some(name) = &self.name {
            config.keyspace.name = name.clone();
        }
        if let Some(state) = self.state {
            config.keyspace.state = Some(state);
        }
        if let Some(rf) = self.replication_factor {
            config.keyspace.replication_factor = rf;
        }
        if let Some(durable_writes) = self.durable_writes {
            config.keyspace.durable_writes = durable_writes;
        }
        if !self.data_centres.is_empty() {
            config.keyspace.data_centres = Some(self.data_centres.iter().cloned().collect());
        }

        let connection = &mut config.connection;
        if !self.login_host.is_empty() {
            connection.login_host = Some(self.login_host.clone());
        }
        if let Some(port) = self.login_port {
            connection.login_port = port;
        }
        if let Some(user) = &self.login_user {
            connection.login_user = Some(user.clone());
        }
        if let Some(password) = &self.login_password {
            connection.login_password = Some(password.clone());
        }
        if self.ssl {
            connection.ssl = true;
        }
        if let Some(cert_reqs) = self.ssl_cert_reqs {
            connection.ssl_cert_reqs = cert_reqs;
        }
        if let Some(ca_certs) = &self.ssl_ca_certs {
            connection.ssl_ca_certs = ca_certs.clone();
        }
        if let Some(level) = self.consistency_level {
            connection.consistency_level = level;
        }

        if self.check {
            config.check_mode = true;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}

pub fn parse_data_centre(s: &str) -> Result<(String, u32), String> {
    let (name, rf) = s
        .split_once('=')
        .ok_or_else(|| format!("expected DC=RF, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing datacentre name in '{}'", s));
    }
    let rf = rf
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid replication factor in '{}': {}", s, e))?;
    Ok((name.to_string(), rf))
}
