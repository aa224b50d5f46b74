//! Proxy discovery for registry requests.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;
use upd_info::NpmConfig;

/// Environment variables checked for a proxy, in order
const PROXY_ENV_VARS: [&str; 4] = ["HTTPS_PROXY", "https_proxy", "HTTP_PROXY", "http_proxy"];

/// Source of the proxy URL used for all registry requests
///
/// Consulted once per run, before the HTTP client is built.
#[async_trait]
pub trait ProxySource: Send + Sync {
    /// The proxy to use, if any
    async fn proxy(&self, config: &NpmConfig) -> Option<String>;
}

/// Looks at the environment, then `.npmrc`, then `npm config get proxy`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProxy;

#[async_trait]
impl ProxySource for SystemProxy {
    async fn proxy(&self, config: &NpmConfig) -> Option<String> {
        if let Some(proxy) = from_env(|name| std::env::var(name).ok()) {
            debug!(%proxy, "proxy from environment");
            return Some(proxy);
        }
        if let Some(proxy) = config.proxy() {
            debug!(%proxy, "proxy from .npmrc");
            return Some(proxy.to_string());
        }

        let output = match Command::new("npm")
            .args(["config", "get", "proxy"])
            .output()
            .await
        {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                debug!(status = %output.status, "npm config get proxy failed");
                return None;
            }
            Err(e) => {
                debug!(error = %e, "npm not available for proxy lookup");
                return None;
            }
        };
        let proxy = from_npm_output(&String::from_utf8_lossy(&output.stdout));
        if let Some(proxy) = &proxy {
            debug!(%proxy, "proxy from npm");
        }
        proxy
    }
}

/// Never uses a proxy
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProxy;

#[async_trait]
impl ProxySource for NoProxy {
    async fn proxy(&self, _config: &NpmConfig) -> Option<String> {
        None
    }
}

/// Always uses the given proxy
#[derive(Debug, Clone)]
pub struct FixedProxy(pub String);

#[async_trait]
impl ProxySource for FixedProxy {
    async fn proxy(&self, _config: &NpmConfig) -> Option<String> {
        Some(self.0.clone())
    }
}

fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    PROXY_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// `npm config get proxy` prints `null` when unset
fn from_npm_output(stdout: &str) -> Option<String> {
    let value = stdout.trim();
    (value.starts_with("http://") || value.starts_with("https://")).then(|| value.to_string())
}
