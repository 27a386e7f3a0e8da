//! Public artifact URL construction.

use std::path::{Component, Path};

use url::Url;

use crate::error::{WebhookError, WebhookResult};

/// How rendered artifacts are exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactUrlConfig {
    /// `http` or `https`
    pub scheme: String,
    /// Port advertised to callers; replaces any port on the callback host
    pub public_port: Option<u16>,
    /// Path under which the output root is served (e.g. `movies`)
    pub path_prefix: String,
}

impl Default for ArtifactUrlConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            public_port: None,
            path_prefix: "movies".to_string(),
        }
    }
}

/// Build `scheme://host[:port]/<prefix>/<output_path>`.
///
/// `callback_host` is the `Host` the request arrived on and may carry its own
/// port. A configured `public_port` overrides it; otherwise the host's port
/// (if any) is kept.
pub fn artifact_url(
    config: &ArtifactUrlConfig,
    callback_host: &str,
    output_path: &Path,
) -> WebhookResult<String> {
    let host = callback_host.trim();
    if host.is_empty() {
        return Err(WebhookError::InvalidCallbackHost(callback_host.to_string()));
    }

    let mut url = Url::parse(&format!("{}://{}", config.scheme, host))?;

    // Anything beyond host[:port] means the header was not a bare authority.
    if url.path() != "/"
        || url.query().is_some()
        || url.fragment().is_some()
        || !url.username().is_empty()
        || url.password().is_some()
        || url.host_str().is_none()
    {
        return Err(WebhookError::InvalidCallbackHost(callback_host.to_string()));
    }

    if let Some(port) = config.public_port {
        url.set_port(Some(port))
            .map_err(|_| WebhookError::InvalidCallbackHost(callback_host.to_string()))?;
    }

    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| WebhookError::InvalidCallbackHost(callback_host.to_string()))?;
        segments.pop_if_empty();
        segments.extend(config.path_prefix.split('/').filter(|s| !s.is_empty()));
        for component in output_path.components() {
            if let Component::Normal(part) = component {
                segments.push(&part.to_string_lossy());
            }
        }
    }

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(port: Option<u16>) -> ArtifactUrlConfig {
        ArtifactUrlConfig {
            scheme: "https".to_string(),
            public_port: port,
            path_prefix: "movies".to_string(),
        }
    }

    #[test]
    fn test_artifact_url_with_public_port() {
        let url = artifact_url(&config(Some(8443)), "render.example.com", Path::new("key1/abc.mp4")).unwrap();
        assert_eq!(url, "https://render.example.com:8443/movies/key1/abc.mp4");
    }

    #[test]
    fn test_public_port_replaces_host_port() {
        let url = artifact_url(&config(Some(8443)), "render.example.com:5000", Path::new("k/a.mp4")).unwrap();
        assert_eq!(url, "https://render.example.com:8443/movies/k/a.mp4");
    }

    #[test]
    fn test_host_port_kept_without_public_port() {
        let url = artifact_url(&config(None), "localhost:5000", Path::new("k/a.mp4")).unwrap();
        assert_eq!(url, "https://localhost:5000/movies/k/a.mp4");

        let url = artifact_url(&config(None), "render.example.com", Path::new("k/a.mp4")).unwrap();
        assert_eq!(url, "https://render.example.com/movies/k/a.mp4");
    }

    #[test]
    fn test_http_scheme_and_nested_prefix() {
        let cfg = ArtifactUrlConfig {
            scheme: "http".to_string(),
            public_port: Some(8080),
            path_prefix: "/static/movies/".to_string(),
        };
        let url = artifact_url(&cfg, "10.0.0.5", Path::new("k/a.mp4")).unwrap();
        assert_eq!(url, "http://10.0.0.5:8080/static/movies/k/a.mp4");
    }

    #[test]
    fn test_rejects_non_authority_hosts() {
        for host in ["", "evil.com/path", "user@evil.com", "evil.com?x=1"] {
            assert!(
                matches!(
                    artifact_url(&config(None), host, Path::new("k/a.mp4")),
                    Err(WebhookError::InvalidCallbackHost(_)) | Err(WebhookError::InvalidUrl(_))
                ),
                "host {:?} should be rejected",
                host
            );
        }
    }
}
