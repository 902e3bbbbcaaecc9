use serde::{Deserialize, Serialize};

/// Bridge service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Allow LAN access
    /// - false: localhost only, 127.0.0.1 (default)
    /// - true: bind 0.0.0.0
    #[serde(default)]
    pub allow_lan_access: bool,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upstream booking-platform host. All relayed member-API calls go to
    /// `https://{upstream_host}/...`.
    #[serde(default = "default_upstream_host")]
    pub upstream_host: String,

    /// Registrable domain of the serving site. Rewritten session cookies are
    /// scoped to `.{site_domain}` so they stay first-party across subdomains.
    #[serde(default = "default_site_domain")]
    pub site_domain: String,

    /// Upstream request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Optional directory holding the built site bundle. When set, requests
    /// outside the API routes are served from this directory.
    #[serde(default)]
    pub web_root: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            allow_lan_access: false,
            port: default_port(),
            upstream_host: default_upstream_host(),
            site_domain: default_site_domain(),
            request_timeout: default_request_timeout(),
            web_root: None,
        }
    }
}

fn default_port() -> u16 {
    8788
}

fn default_upstream_host() -> String {
    "z.coregym.club".to_string()
}

fn default_site_domain() -> String {
    "yogatungelsta.se".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl BridgeConfig {
    /// Get the actual bind address
    /// - allow_lan_access = false: "127.0.0.1" (default)
    /// - allow_lan_access = true: "0.0.0.0"
    pub fn get_bind_address(&self) -> &str {
        if self.allow_lan_access {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.port, 8788);
        assert_eq!(config.upstream_host, "z.coregym.club");
        assert_eq!(config.site_domain, "yogatungelsta.se");
        assert_eq!(config.request_timeout, 10);
        assert!(config.web_root.is_none());
    }

    #[test]
    fn test_bind_address() {
        let mut config = BridgeConfig::default();
        assert_eq!(config.get_bind_address(), "127.0.0.1");
        config.allow_lan_access = true;
        assert_eq!(config.get_bind_address(), "0.0.0.0");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: BridgeConfig = serde_json::from_str(r#"{"port": 9000}"#)
            .expect("partial config should deserialize");
        assert_eq!(config.port, 9000);
        assert_eq!(config.upstream_host, "z.coregym.club");
        assert!(!config.allow_lan_access);
    }
}
