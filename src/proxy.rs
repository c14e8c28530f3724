//! Transport selection from proxy settings.
//!
//! Whether exchanges go through a pooled direct connection or a proxy is
//! decided once, when the client is built, from the endpoint URL and a
//! [`ProxyConfig`]. The decision itself is the pure [`select_transport`].

use url::Url;

/// The transport a client uses for all of its exchanges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportKind {
    /// Direct connections from a pool.
    Pooled,
    /// Every exchange goes through this proxy.
    Proxied(Url),
}

/// Proxy settings, usually read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Proxy for `http` endpoints.
    pub http_proxy: Option<Url>,
    /// Proxy for `https` endpoints.
    pub https_proxy: Option<Url>,
    /// Hosts that bypass the proxy.
    pub no_proxy: Vec<String>,
}

impl ProxyConfig {
    /// Reads `HTTP_PROXY`, `HTTPS_PROXY` and `NO_PROXY` (or their lowercase forms).
    ///
    /// Unparsable proxy URLs are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |upper: &str, lower: &str| {
            lookup(upper)
                .or_else(|| lookup(lower))
                .filter(|value| !value.trim().is_empty())
        };

        let parse_proxy = |name: &str, value: Option<String>| {
            let value = value?;
            match Url::parse(value.trim()) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!(variable = name, error = %e, "Ignoring invalid proxy URL");
                    None
                }
            }
        };

        Self {
            http_proxy: parse_proxy("HTTP_PROXY", read("HTTP_PROXY", "http_proxy")),
            https_proxy: parse_proxy("HTTPS_PROXY", read("HTTPS_PROXY", "https_proxy")),
            no_proxy: read("NO_PROXY", "no_proxy")
                .map(|value| parse_no_proxy(&value))
                .unwrap_or_default(),
        }
    }

    /// Returns `true` if `host` matches a `NO_PROXY` entry.
    pub fn bypasses(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.no_proxy.iter().any(|entry| {
            if entry == "*" {
                return true;
            }
            let domain = entry.trim_start_matches('.');
            host == domain || host.ends_with(&format!(".{}", domain))
        })
    }
}

fn parse_no_proxy(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim().to_ascii_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Picks the transport for `url` under `config`.
///
/// # Examples
///
/// ```
/// use rpclink::proxy::{select_transport, ProxyConfig, TransportKind};
/// use url::Url;
///
/// let config = ProxyConfig {
///     https_proxy: Some(Url::parse("http://proxy.internal:3128").unwrap()),
///     no_proxy: vec!["localhost".to_string()],
///     ..Default::default()
/// };
///
/// let remote = Url::parse("https://rpc.example.com").unwrap();
/// assert!(matches!(select_transport(&remote, &config), TransportKind::Proxied(_)));
///
/// let local = Url::parse("https://localhost:8545").unwrap();
/// assert_eq!(select_transport(&local, &config), TransportKind::Pooled);
/// ```
pub fn select_transport(url: &Url, config: &ProxyConfig) -> TransportKind {
    let proxy = match url.scheme() {
        "https" => config.https_proxy.as_ref().or(config.http_proxy.as_ref()),
        "http" => config.http_proxy.as_ref(),
        _ => None,
    };

    match (proxy, url.host_str()) {
        (Some(proxy), Some(host)) if !config.bypasses(host) => TransportKind::Proxied(proxy.clone()),
        _ => TransportKind::Pooled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_no_proxy_configured_is_pooled() {
        let config = ProxyConfig::default();
        assert_eq!(
            select_transport(&url("https://rpc.example.com"), &config),
            TransportKind::Pooled
        );
    }

    #[test]
    fn test_scheme_selects_proxy() {
        let config = ProxyConfig {
            http_proxy: Some(url("http://plain-proxy:8080")),
            https_proxy: None,
            no_proxy: Vec::new(),
        };

        // https falls back to the http proxy, http uses it directly
        assert_eq!(
            select_transport(&url("https://rpc.example.com"), &config),
            TransportKind::Proxied(url("http://plain-proxy:8080"))
        );
        assert_eq!(
            select_transport(&url("http://rpc.example.com"), &config),
            TransportKind::Proxied(url("http://plain-proxy:8080"))
        );

        let config = ProxyConfig {
            http_proxy: None,
            https_proxy: Some(url("http://tls-proxy:8443")),
            no_proxy: Vec::new(),
        };
        assert_eq!(
            select_transport(&url("http://rpc.example.com"), &config),
            TransportKind::Pooled
        );
    }

    #[test]
    fn test_no_proxy_matching() {
        let config = ProxyConfig {
            http_proxy: Some(url("http://proxy:3128")),
            https_proxy: None,
            no_proxy: parse_no_proxy(" .internal, LOCALHOST ,127.0.0.1"),
        };

        assert!(config.bypasses("localhost"));
        assert!(config.bypasses("node.internal"));
        assert!(config.bypasses("internal"));
        assert!(config.bypasses("127.0.0.1"));
        assert!(!config.bypasses("notinternal"));
        assert!(!config.bypasses("example.com"));

        assert_eq!(
            select_transport(&url("http://127.0.0.1:8545"), &config),
            TransportKind::Pooled
        );
    }

    #[test]
    fn test_wildcard_bypasses_everything() {
        let config = ProxyConfig {
            http_proxy: Some(url("http://proxy:3128")),
            https_proxy: None,
            no_proxy: vec!["*".to_string()],
        };
        assert_eq!(
            select_transport(&url("http://rpc.example.com"), &config),
            TransportKind::Pooled
        );
    }

    #[test]
    fn test_from_lookup_prefers_uppercase_and_skips_invalid() {
        let vars: HashMap<&str, &str> = [
            ("HTTP_PROXY", "http://upper:1"),
            ("http_proxy", "http://lower:2"),
            ("https_proxy", "not a url"),
            ("no_proxy", "localhost,,example.org"),
        ]
        .into_iter()
        .collect();

        let config = ProxyConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.http_proxy, Some(url("http://upper:1")));
        assert_eq!(config.https_proxy, None);
        assert_eq!(config.no_proxy, vec!["localhost", "example.org"]);
    }
}
