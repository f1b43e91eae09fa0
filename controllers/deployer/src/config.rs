//! Connection configuration.
//!
//! Read from the environment:
//! - `SERVER`: API server base URL (default `http://127.0.0.1:8001`, i.e. `kubectl proxy`)
//! - `TOKEN`: bearer token
//! - `CA_FILE`: PEM bundle of CA certificates trusted for the API server
//! - `NAMESPACE`: namespace to deploy into (default `default`)
//!
//! Empty values count as unset.

use crate::error::ControllerError;
use rustls::pki_types::CertificateDer;
use rustls::pki_types::pem::PemObject;
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8001";
pub const DEFAULT_NAMESPACE: &str = "default";

pub const SERVER_ENV_VAR: &str = "SERVER";
pub const TOKEN_ENV_VAR: &str = "TOKEN";
pub const CA_FILE_ENV_VAR: &str = "CA_FILE";
pub const NAMESPACE_ENV_VAR: &str = "NAMESPACE";

/// How to reach the API server
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub server: String,
    pub token: Option<String>,
    pub ca_file: Option<PathBuf>,
    pub namespace: String,
}

// Keeps the token out of logs
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server", &self.server)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("ca_file", &self.ca_file)
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl ConnectionConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());
        Self {
            server: var(SERVER_ENV_VAR).unwrap_or_else(|| DEFAULT_SERVER.to_string()),
            token: var(TOKEN_ENV_VAR),
            ca_file: var(CA_FILE_ENV_VAR).map(PathBuf::from),
            namespace: var(NAMESPACE_ENV_VAR).unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
        }
    }

    /// Build the kube client configuration.
    ///
    /// Reads and parses `ca_file` if one is set; a missing or unreadable file
    /// is an error, not a fallback to the system roots.
    pub fn to_kube_config(&self) -> Result<kube::Config, ControllerError> {
        let cluster_url: http::Uri = self.server.parse().map_err(|e| {
            ControllerError::InvalidConfig(format!("{SERVER_ENV_VAR} {:?} is not a valid URL: {e}", self.server))
        })?;

        let mut config = kube::Config::new(cluster_url);
        config.default_namespace.clone_from(&self.namespace);
        if let Some(token) = &self.token {
            config.auth_info.token = Some(token.clone().into());
        }
        if let Some(ca_file) = &self.ca_file {
            config.root_cert = Some(load_ca_certs(ca_file)?);
        }
        Ok(config)
    }
}

/// DER-encoded certificates from a PEM bundle
fn load_ca_certs(path: &Path) -> Result<Vec<Vec<u8>>, ControllerError> {
    let pem = std::fs::read(path).map_err(|e| {
        ControllerError::InvalidConfig(format!("failed to read {CA_FILE_ENV_VAR} {}: {e}", path.display()))
    })?;

    let certs = CertificateDer::pem_slice_iter(&pem)
        .map(|cert| cert.map(|der| der.to_vec()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            ControllerError::InvalidConfig(format!("failed to parse {CA_FILE_ENV_VAR} {}: {e:?}", path.display()))
        })?;

    if certs.is_empty() {
        return Err(ControllerError::InvalidConfig(format!(
            "no certificates found in {CA_FILE_ENV_VAR} {}",
            path.display()
        )));
    }
    Ok(certs)
}
