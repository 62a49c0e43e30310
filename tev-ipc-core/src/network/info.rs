//! Where the viewer listens.

use std::fmt;
use std::str::FromStr;

use crate::error::TevError;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 14158;

/// Host and TCP port of a running viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    host: String,
    port: u16,
}

impl ConnectionInfo {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for ConnectionInfo {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Parses `host`, `host:port`, `[v6]` or `[v6]:port`. A missing port means
/// [`DEFAULT_PORT`].
impl FromStr for ConnectionInfo {
    type Err = TevError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TevError::InvalidAddress(s.to_string()));
        }

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| TevError::InvalidAddress(s.to_string()))?;
            match tail {
                "" => (host, None),
                _ => {
                    let port = tail
                        .strip_prefix(':')
                        .ok_or_else(|| TevError::InvalidAddress(s.to_string()))?;
                    (host, Some(port))
                }
            }
        } else {
            match s.split_once(':') {
                Some((host, port)) if !port.contains(':') => (host, Some(port)),
                // Bare IPv6 literal without brackets.
                Some(_) => (s, None),
                None => (s, None),
            }
        };

        if host.is_empty() {
            return Err(TevError::InvalidAddress(s.to_string()));
        }
        let port = match port {
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| TevError::InvalidAddress(s.to_string()))?,
            None => DEFAULT_PORT,
        };
        Ok(Self::new(host, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_localhost() {
        let info = ConnectionInfo::default();
        assert_eq!(info.host(), "localhost");
        assert_eq!(info.port(), 14158);
        assert_eq!(info.to_string(), "localhost:14158");
    }

    #[test]
    fn parse_host_and_port() {
        let info: ConnectionInfo = "127.0.0.1:9000".parse().unwrap();
        assert_eq!(info, ConnectionInfo::new("127.0.0.1", 9000));

        let info: ConnectionInfo = "viewer-box".parse().unwrap();
        assert_eq!(info.port(), DEFAULT_PORT);
    }

    #[test]
    fn parse_ipv6() {
        let info: ConnectionInfo = "[::1]:7000".parse().unwrap();
        assert_eq!(info.host(), "::1");
        assert_eq!(info.port(), 7000);
        assert_eq!(info.to_string(), "[::1]:7000");

        let info: ConnectionInfo = "::1".parse().unwrap();
        assert_eq!(info.port(), DEFAULT_PORT);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<ConnectionInfo>().is_err());
        assert!(":80".parse::<ConnectionInfo>().is_err());
        assert!("host:notaport".parse::<ConnectionInfo>().is_err());
        assert!("[::1".parse::<ConnectionInfo>().is_err());
    }
}
