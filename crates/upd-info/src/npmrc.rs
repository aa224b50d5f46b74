//! `.npmrc` configuration: registry URLs, credentials, and proxy
//!
//! Only the keys that matter for reading package metadata are interpreted:
//!
//! - `registry` and `@scope:registry`
//! - `//host/path/:_authToken` and `//host/path/:_auth` (plus unprefixed
//!   `_authToken`/`_auth`, which apply to the default registry)
//! - `proxy` and `https-proxy`
//!
//! Values may reference environment variables as `${NAME}`.

use crate::error::{Error, Result};
use crate::types::AuthToken;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// The public npm registry
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";

/// Effective npm configuration
#[derive(Debug, Clone)]
pub struct NpmConfig {
    registry: Url,
    scoped_registries: BTreeMap<String, Url>,
    auth: BTreeMap<String, AuthToken>,
    default_auth: Option<AuthToken>,
    proxy: Option<String>,
    https_proxy: Option<String>,
}

impl Default for NpmConfig {
    fn default() -> Self {
        Self {
            registry: registry_url(DEFAULT_REGISTRY).expect("default registry URL is valid"),
            scoped_registries: BTreeMap::new(),
            auth: BTreeMap::new(),
            default_auth: None,
            proxy: None,
            https_proxy: None,
        }
    }
}

impl NpmConfig {
    /// Load `~/.npmrc` and then `<project_dir>/.npmrc`; later files win.
    ///
    /// Missing files are skipped.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let mut config = Self::default();
        let mut files: Vec<PathBuf> = Vec::new();
        if let Some(home) = dirs::home_dir() {
            files.push(home.join(".npmrc"));
        }
        files.push(project_dir.join(".npmrc"));

        for path in files {
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    debug!(path = %path.display(), "loading npm configuration");
                    config.merge_text(&text, |name| std::env::var(name).ok())?;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(Error::Config { path, source }),
            }
        }

        Ok(config)
    }

    /// Parse one `.npmrc` document on top of the defaults
    pub fn parse(text: &str, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        config.merge_text(text, env)?;
        Ok(config)
    }

    /// Apply the settings of one `.npmrc` document, overriding earlier ones
    pub fn merge_text(&mut self, text: &str, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = interpolate(unquote(value.trim()), &env);

            match key {
                "registry" => self.set_registry(&value)?,
                "proxy" => self.proxy = non_empty(value),
                "https-proxy" => self.https_proxy = non_empty(value),
                "_authToken" => self.default_auth = Some(AuthToken::Bearer(value)),
                "_auth" => self.default_auth = Some(AuthToken::Basic(value)),
                _ => {
                    if let Some(scope) = key.strip_suffix(":registry") {
                        if scope.starts_with('@') {
                            self.scoped_registries
                                .insert(scope.to_string(), registry_url(&value)?);
                        }
                    } else if let Some(prefix) = key.strip_suffix(":_authToken") {
                        self.auth
                            .insert(auth_key(prefix), AuthToken::Bearer(value));
                    } else if let Some(prefix) = key.strip_suffix(":_auth") {
                        self.auth.insert(auth_key(prefix), AuthToken::Basic(value));
                    }
                }
            }
        }
        Ok(())
    }

    /// Override the default registry
    pub fn set_registry(&mut self, url: &str) -> Result<()> {
        self.registry = registry_url(url)?;
        Ok(())
    }

    /// Registry serving `package` (scoped registries take precedence)
    pub fn registry_for(&self, package: &str) -> &Url {
        package
            .split_once('/')
            .filter(|(scope, _)| scope.starts_with('@'))
            .and_then(|(scope, _)| self.scoped_registries.get(scope))
            .unwrap_or(&self.registry)
    }

    /// Credentials for a registry URL
    ///
    /// Looks for the most specific `//host/path/` entry, walking up the path
    /// one segment at a time. Unprefixed credentials only apply to the
    /// default registry.
    pub fn auth_for(&self, registry: &Url) -> Option<&AuthToken> {
        let host = registry.host_str()?;
        let host = match registry.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let mut path = registry.path().trim_end_matches('/').to_string();

        loop {
            let key = format!("//{}{}/", host, path);
            if let Some(token) = self.auth.get(&key) {
                return Some(token);
            }
            match path.rfind('/') {
                Some(idx) => path.truncate(idx),
                None => break,
            }
        }

        if registry == &self.registry {
            self.default_auth.as_ref()
        } else {
            None
        }
    }

    /// Configured proxy (`https-proxy` wins over `proxy`)
    pub fn proxy(&self) -> Option<&str> {
        self.https_proxy.as_deref().or(self.proxy.as_deref())
    }
}

/// Parse a registry URL and make sure it ends with `/` so joins append
fn registry_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn auth_key(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    format!("{}/", trimmed)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Replace `${NAME}` references; unknown variables expand to nothing.
fn interpolate(value: &str, env: &impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                out.push_str(&env(&after[..end]).unwrap_or_default());
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = NpmConfig::default();
        assert_eq!(config.registry_for("react").as_str(), DEFAULT_REGISTRY);
        assert!(config.proxy().is_none());
    }

    #[test]
    fn test_scoped_registry() {
        let config = NpmConfig::parse(
            "registry=https://npm.example.com\n@acme:registry=https://acme.example.com/npm/\n",
            no_env,
        )
        .unwrap();

        assert_eq!(
            config.registry_for("lodash").as_str(),
            "https://npm.example.com/"
        );
        assert_eq!(
            config.registry_for("@acme/widgets").as_str(),
            "https://acme.example.com/npm/"
        );
        assert_eq!(
            config.registry_for("@other/thing").as_str(),
            "https://npm.example.com/"
        );
    }

    #[test]
    fn test_auth_token_walks_up_the_path() {
        let config = NpmConfig::parse(
            "//acme.example.com/:_authToken=${ACME_TOKEN}\n",
            |name| (name == "ACME_TOKEN").then(|| "s3cret".to_string()),
        )
        .unwrap();

        let registry = Url::parse("https://acme.example.com/npm/private/").unwrap();
        assert_eq!(
            config.auth_for(&registry),
            Some(&AuthToken::Bearer("s3cret".to_string()))
        );

        let other = Url::parse("https://registry.npmjs.org/").unwrap();
        assert!(config.auth_for(&other).is_none());
    }

    #[test]
    fn test_unprefixed_auth_only_for_default_registry() {
        let config = NpmConfig::parse("_auth=dXNlcjpwYXNz\n", no_env).unwrap();
        let default = Url::parse(DEFAULT_REGISTRY).unwrap();
        assert_eq!(
            config.auth_for(&default).map(AuthToken::header_value),
            Some("Basic dXNlcjpwYXNz".to_string())
        );

        let other = Url::parse("https://npm.example.com/").unwrap();
        assert!(config.auth_for(&other).is_none());
    }

    #[test]
    fn test_proxy_precedence_and_comments() {
        let config = NpmConfig::parse(
            "# corporate proxy\n; legacy\nproxy=http://proxy:8080\nhttps-proxy = \"http://secure:8443\"\n",
            no_env,
        )
        .unwrap();
        assert_eq!(config.proxy(), Some("http://secure:8443"));
    }

    #[test]
    fn test_invalid_registry_is_rejected() {
        let result = NpmConfig::parse("registry=not a url\n", no_env);
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_interpolate_unterminated() {
        assert_eq!(interpolate("a${B", &no_env), "a${B");
        assert_eq!(interpolate("${X}-y", &|_| Some("x".into())), "x-y");
    }
}
