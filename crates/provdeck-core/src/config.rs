// ── Runtime connection configuration ──
//
// Describes *how* to reach a dr-provision server. The embedding
// application builds a `ConsoleConfig` and hands it to `Console` --
// core never reads config files.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Default: the server mints itself a
    /// self-signed certificate on first start.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for one provisioning server.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Server URL (e.g. `https://192.168.124.1:8092`).
    pub url: Url,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            url: "https://127.0.0.1:8092"
                .parse()
                .expect("default URL is well-formed"),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }
}
