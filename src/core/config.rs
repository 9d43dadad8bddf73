/// Transport Configuration
///
/// Transport selection is a one-time decision made at process start and never
/// re-evaluated. Two environment variables drive it:
/// - MCP_HTTP: any non-empty value selects the HTTP transport; unset or empty
///   selects the STDIO transport
/// - PORT: HTTP listen port (default 8080); only consulted in HTTP mode

use thiserror::Error;

/// Default HTTP listen port when PORT is not set.
pub const DEFAULT_PORT: u16 = 8080;

/// The HTTP transport binds all interfaces.
pub const BIND_HOST: &str = "0.0.0.0";

/// Startup configuration errors.
///
/// A PORT value that is not a valid TCP port number must abort startup with a
/// clear message instead of surfacing as an ambiguous runtime failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a valid TCP port number (1-65535), got {0:?}")]
    InvalidPort(String),
}

/// Transport chosen at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Newline-delimited JSON-RPC over standard input/output.
    Stdio,
    /// JSON-RPC over HTTP with streaming responses enabled.
    Http { host: String, port: u16 },
}

impl Transport {
    /// Resolve the transport from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let http = std::env::var("MCP_HTTP")
            .map(|v| !v.is_empty())
            .unwrap_or(false);
        Self::resolve(http, std::env::var("PORT").ok())
    }

    // Split out from from_env so tests do not need to mutate the process
    // environment.
    fn resolve(http: bool, port: Option<String>) -> Result<Self, ConfigError> {
        if !http {
            return Ok(Transport::Stdio);
        }
        let port = match port {
            Some(raw) => raw
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or(ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };
        Ok(Transport::Http {
            host: BIND_HOST.to_string(),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_absent_selects_stdio() {
        assert_eq!(Transport::resolve(false, None).unwrap(), Transport::Stdio);
    }

    #[test]
    fn flag_absent_ignores_port() {
        // PORT only matters in HTTP mode, even when set to garbage.
        let t = Transport::resolve(false, Some("garbage".to_string())).unwrap();
        assert_eq!(t, Transport::Stdio);
    }

    #[test]
    fn flag_present_defaults_to_8080() {
        let t = Transport::resolve(true, None).unwrap();
        assert_eq!(
            t,
            Transport::Http {
                host: BIND_HOST.to_string(),
                port: DEFAULT_PORT,
            }
        );
    }

    #[test]
    fn flag_present_uses_configured_port() {
        let t = Transport::resolve(true, Some("9090".to_string())).unwrap();
        assert_eq!(
            t,
            Transport::Http {
                host: "0.0.0.0".to_string(),
                port: 9090,
            }
        );
    }

    #[test]
    fn non_numeric_port_fails_fast() {
        let err = Transport::resolve(true, Some("not-a-port".to_string())).unwrap_err();
        assert!(err.to_string().contains("not-a-port"));
    }

    #[test]
    fn out_of_range_port_fails_fast() {
        assert!(Transport::resolve(true, Some("70000".to_string())).is_err());
        assert!(Transport::resolve(true, Some("0".to_string())).is_err());
    }
}
