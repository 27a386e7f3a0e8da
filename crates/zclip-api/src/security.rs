//! URL policy for caller-supplied source and webhook URLs.
//!
//! Without an allow-list a source URL may use `http`, `https`, `ftp` or
//! `ftps`, while a webhook URL is always `http`/`https` since it gets POSTed
//! to. Once allowed IPs or domains are configured the policy turns strict:
//! only `http`/`https`, and the host must exactly match one of the configured
//! entries (SSRF protection).

use std::collections::HashSet;

use tracing::warn;
use url::Url;

use crate::config::ApiConfig;

/// Maximum URL length to prevent DoS attacks.
pub const MAX_URL_LENGTH: usize = 2048;

const SOURCE_SCHEMES: &[&str] = &["http", "https", "ftp", "ftps"];
const HTTP_SCHEMES: &[&str] = &["http", "https"];

/// Why a URL was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlRejection {
    Empty,
    TooLong,
    Malformed(String),
    SchemeNotAllowed(String),
    MissingHost,
    HostNotAllowed(String),
}

impl std::fmt::Display for UrlRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "URL cannot be empty"),
            Self::TooLong => write!(f, "URL exceeds maximum length of {} characters", MAX_URL_LENGTH),
            Self::Malformed(e) => write!(f, "Invalid URL format: {}", e),
            Self::SchemeNotAllowed(scheme) => write!(f, "Scheme '{}' is not allowed", scheme),
            Self::MissingHost => write!(f, "URL must have a host"),
            Self::HostNotAllowed(host) => write!(f, "Host '{}' is not in the allow-list", host),
        }
    }
}

/// Allow-list based URL policy.
#[derive(Debug, Clone, Default)]
pub struct UrlPolicy {
    allowed_hosts: HashSet<String>,
}

impl UrlPolicy {
    /// Policy that accepts any well-formed URL.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Policy restricted to the given IPs and domains (exact host match).
    pub fn new<I, D, S, T>(allowed_ips: I, allowed_domains: D) -> Self
    where
        I: IntoIterator<Item = S>,
        D: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let allowed_hosts = allowed_ips
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .chain(
                allowed_domains
                    .into_iter()
                    .map(|s| s.as_ref().trim().to_lowercase()),
            )
            .filter(|s| !s.is_empty())
            .collect();
        Self { allowed_hosts }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(&config.allowed_ips, &config.allowed_domains)
    }

    /// Whether an allow-list is in force.
    pub fn is_strict(&self) -> bool {
        !self.allowed_hosts.is_empty()
    }

    /// Check a source URL, returning it trimmed when accepted.
    pub fn check(&self, raw: &str) -> Result<String, UrlRejection> {
        self.check_schemes(raw, SOURCE_SCHEMES)
    }

    /// Check a URL that will receive an HTTP POST.
    pub fn check_http(&self, raw: &str) -> Result<String, UrlRejection> {
        self.check_schemes(raw, HTTP_SCHEMES)
    }

    fn check_schemes(&self, raw: &str, schemes: &[&str]) -> Result<String, UrlRejection> {
        if raw.len() > MAX_URL_LENGTH {
            return Err(UrlRejection::TooLong);
        }

        let raw = raw.trim();
        if raw.is_empty() {
            return Err(UrlRejection::Empty);
        }

        let parsed = Url::parse(raw).map_err(|e| UrlRejection::Malformed(e.to_string()))?;

        let scheme = parsed.scheme();
        let schemes = if self.is_strict() { HTTP_SCHEMES } else { schemes };
        if !schemes.contains(&scheme) {
            return Err(UrlRejection::SchemeNotAllowed(scheme.to_string()));
        }

        let host = match parsed.host_str() {
            Some(h) if !h.is_empty() => h.to_lowercase(),
            _ => return Err(UrlRejection::MissingHost),
        };

        if self.is_strict() && !self.allowed_hosts.contains(&host) {
            warn!(host = %host, "URL host not in allow-list");
            return Err(UrlRejection::HostNotAllowed(host));
        }

        Ok(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_policy() -> UrlPolicy {
        UrlPolicy::new(
            [
                "us1.make.com",
                "54.209.79.175",
                "54.80.47.193",
                "54.161.178.114",
                "eu2.make.com",
                "34.254.1.9",
                "52.31.156.93",
                "52.50.32.186",
                "eu1.make.com",
                "54.75.157.176",
                "54.78.149.203",
                "52.18.144.195",
            ],
            ["example.com", "trusted.com"],
        )
    }

    #[test]
    fn test_allow_listed_hosts_pass() {
        let policy = make_policy();
        assert!(policy.is_strict());
        assert!(policy.check("http://example.com").is_ok());
        assert!(policy.check("https://trusted.com").is_ok());
        assert!(policy.check("http://us1.make.com").is_ok());
        assert!(policy.check("http://54.209.79.175").is_ok());
        assert!(policy.check("https://Example.com/img.png?x=1").is_ok());
    }

    #[test]
    fn test_unlisted_hosts_and_schemes_fail() {
        let policy = make_policy();
        assert_eq!(
            policy.check("http://invalid.com"),
            Err(UrlRejection::HostNotAllowed("invalid.com".to_string()))
        );
        assert!(matches!(
            policy.check("https://10.0.0.1"),
            Err(UrlRejection::HostNotAllowed(_))
        ));
        assert_eq!(
            policy.check("ftp://example.com"),
            Err(UrlRejection::SchemeNotAllowed("ftp".to_string()))
        );
    }

    #[test]
    fn test_no_subdomain_or_wildcard_matching() {
        let policy = make_policy();
        assert!(policy.check("https://cdn.example.com/a.png").is_err());
    }

    #[test]
    fn test_permissive_policy() {
        let policy = UrlPolicy::permissive();
        assert!(!policy.is_strict());
        assert!(policy.check("ftp://files.example.org/a.jpg").is_ok());
        assert!(policy.check("https://10.0.0.1:8443/x").is_ok());
        assert!(matches!(
            policy.check("javascript:alert(1)"),
            Err(UrlRejection::SchemeNotAllowed(_))
        ));
        assert!(matches!(policy.check("not a url"), Err(UrlRejection::Malformed(_))));
        assert_eq!(policy.check("   "), Err(UrlRejection::Empty));
    }

    #[test]
    fn test_http_check_refuses_ftp_even_when_permissive() {
        let policy = UrlPolicy::permissive();
        assert_eq!(
            policy.check_http("ftp://hooks.example.com/done"),
            Err(UrlRejection::SchemeNotAllowed("ftp".to_string()))
        );
        assert!(matches!(
            policy.check_http("ftps://hooks.example.com/done"),
            Err(UrlRejection::SchemeNotAllowed(_))
        ));
        assert!(policy.check_http("https://hooks.example.com/done").is_ok());
    }

    #[test]
    fn test_url_length_limit() {
        let policy = UrlPolicy::permissive();
        let long = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert_eq!(policy.check(&long), Err(UrlRejection::TooLong));
    }
}
