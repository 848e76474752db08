//! Candidate descriptors loaded from the registry file
//!
//! A candidate is one HTTP server implementation under comparison. The
//! registry file serializes these as a JSON array; once loaded they are
//! immutable for the rest of the run. Validation is done via
//! `garde::Validate`.

use crate::defaults::default_host;
use serde::{Deserialize, Serialize};

/// Network endpoint a candidate serves on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, garde::Validate)]
#[serde(deny_unknown_fields)]
pub struct Endpoint {
    /// Host the candidate binds (default: 127.0.0.1)
    #[serde(default = "default_host")]
    #[garde(length(min = 1))]
    pub host: String,

    /// TCP port the candidate listens on
    #[garde(range(min = 1))]
    pub port: u16,
}

impl Endpoint {
    /// Root URL of the candidate, probed and load-tested as-is
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }

    /// Socket address string for raw TCP connects
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// One registered candidate server
///
/// `external` marks candidates that spawn their own subprocess tree (a
/// launcher script, a clustered server); termination then targets the
/// whole process group instead of the immediate child.
#[derive(Debug, Clone, Serialize, Deserialize, garde::Validate)]
#[serde(deny_unknown_fields)]
pub struct CandidateDescriptor {
    /// Unique candidate name, used as the report row key
    #[garde(length(min = 1))]
    pub name: String,

    /// Endpoint the candidate is expected to serve on
    #[garde(dive)]
    pub endpoint: Endpoint,

    /// Executable that launches the candidate
    #[garde(length(min = 1))]
    pub command: String,

    /// Arguments passed to the launch command
    #[serde(default)]
    #[garde(skip)]
    pub args: Vec<String>,

    /// Candidate manages its own subprocess tree (default: false)
    #[serde(default)]
    #[garde(skip)]
    pub external: bool,
}
