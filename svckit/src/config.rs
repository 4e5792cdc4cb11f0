use dns_lookup::AddrInfoHints;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::errors::KeyspaceError;
use crate::types::{CertReqs, ConsistencyLevel};

pub const DEFAULT_PORT: u16 = 9042;
const LOCALHOST: &str = "127.0.0.1";

/// Cluster connection settings, keyed the way the automation tooling names them.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub login_host: Option<Vec<String>>,
    pub login_port: u16,
    pub login_user: Option<String>,
    pub login_password: Option<String>,
    pub ssl: bool,
    pub ssl_cert_reqs: CertReqs,
    pub ssl_ca_certs: String,
    pub consistency_level: ConsistencyLevel,
    pub connection_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            login_host: None,
            login_port: DEFAULT_PORT,
            login_user: None,
            login_password: None,
            ssl: false,
            ssl_cert_reqs: CertReqs::CertNone,
            ssl_ca_certs: String::new(),
            consistency_level: ConsistencyLevel::LocalOne,
            connection_timeout_secs: 5,
            request_timeout_secs: 10,
        }
    }
}

// Hand-written so the password can never reach a log line.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("login_host", &self.login_host)
            .field("login_port", &self.login_port)
            .field("login_user", &self.login_user)
            .field("login_password", &self.login_password.as_ref().map(|_| "********"))
            .field("ssl", &self.ssl)
            .field("ssl_cert_reqs", &self.ssl_cert_reqs)
            .field("ssl_ca_certs", &self.ssl_ca_certs)
            .field("consistency_level", &self.consistency_level)
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ConnectionConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Checks everything that can be checked without touching the network.
    pub fn validate(&self) -> Result<(), KeyspaceError> {
        if self.login_port == 0 {
            return Err(KeyspaceError::ConfigError("login_port must be between 1 and 65535".to_string()));
        }

        if let Some(hosts) = &self.login_host {
            if hosts.is_empty() || hosts.iter().any(|h| h.trim().is_empty()) {
                return Err(KeyspaceError::ConfigError(
                    "login_host must not contain empty host names".to_string(),
                ));
            }
        }

        if self.ssl_cert_reqs.requires_ca_bundle() {
            if self.ssl_ca_certs.is_empty() {
                return Err(KeyspaceError::ConfigError(
                    "When verify mode is set to CERT_REQUIRED or CERT_OPTIONAL \
                     ssl_ca_certs is also required to be set and not empty"
                        .to_string(),
                ));
            }
            if !Path::new(&self.ssl_ca_certs).exists() {
                return Err(KeyspaceError::ConfigError(format!(
                    "ssl_ca_certs certificate: File not found ({})",
                    self.ssl_ca_certs
                )));
            }
        }

        Ok(())
    }

    /// Contact points for the sessions.
    ///
    /// Without explicit hosts, a local node is preferred when something is
    /// listening on the CQL port, otherwise the machine's fully-qualified name is used.
    pub async fn resolve_hosts(&self) -> Vec<String> {
        if let Some(hosts) = &self.login_host {
            return hosts.clone();
        }

        let probe = tokio::time::timeout(
            self.connection_timeout(),
            TcpStream::connect((LOCALHOST, self.login_port)),
        )
        .await;

        match probe {
            Ok(Ok(_)) => {
                debug!("Found a CQL listener on {}:{}", LOCALHOST, self.login_port);
                vec![LOCALHOST.to_string()]
            }
            _ => {
                let host = match tokio::task::spawn_blocking(local_fqdn).await {
                    Ok(host) => host,
                    Err(_) => short_hostname(),
                };
                warn!(
                    "Nothing listening on {}:{}, falling back to local host name {}",
                    LOCALHOST, self.login_port, host
                );
                vec![host]
            }
        }
    }
}

fn short_hostname() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}

/// Canonical name of this machine, or the bare host name when the resolver
/// has no canonical entry for it.
pub fn local_fqdn() -> String {
    let host = short_hostname();
    let hints = AddrInfoHints {
        flags: libc::AI_CANONNAME,
        ..AddrInfoHints::default()
    };

    let canonical = dns_lookup::getaddrinfo(Some(host.as_str()), None, Some(hints))
        .ok()
        .and_then(|mut infos| infos.find_map(|info| info.ok().and_then(|info| info.canonname)))
        .filter(|name| !name.is_empty());

    match canonical {
        Some(fqdn) => fqdn,
        None => {
            debug!("No canonical name for {}, using it as-is", host);
            host
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
