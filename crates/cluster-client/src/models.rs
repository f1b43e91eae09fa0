//! Cluster API models
//!
//! Deployments and Services are the upstream `k8s-openapi` types; only the
//! discovery response gets a model of its own.

use k8s_openapi::apimachinery::pkg::version::Info;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server version as reported by the `/version` discovery endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerVersion {
    pub major: String,
    pub minor: String,
    pub git_version: String, // e.g., "v1.30.2"
    pub platform: String,    // e.g., "linux/amd64"
}

impl From<Info> for ServerVersion {
    fn from(info: Info) -> Self {
        Self {
            major: info.major,
            minor: info.minor,
            git_version: info.git_version,
            platform: info.platform,
        }
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (major: {}, minor: {}, platform: {})",
            self.git_version, self.major, self.minor, self.platform
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let version = ServerVersion {
            major: "1".to_string(),
            minor: "30".to_string(),
            git_version: "v1.30.2".to_string(),
            platform: "linux/amd64".to_string(),
        };
        assert_eq!(
            version.to_string(),
            "v1.30.2 (major: 1, minor: 30, platform: linux/amd64)"
        );
    }

    #[test]
    fn test_from_info() {
        let info = Info {
            major: "1".to_string(),
            minor: "29".to_string(),
            git_version: "v1.29.0".to_string(),
            platform: "linux/arm64".to_string(),
            ..Default::default()
        };
        let version = ServerVersion::from(info);
        assert_eq!(version.git_version, "v1.29.0");
        assert_eq!(version.platform, "linux/arm64");
    }
}
