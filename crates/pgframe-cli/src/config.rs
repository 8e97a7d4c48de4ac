use crate::cli::ConnectionArgs;
use pgframe::{ConnectionConfig, TlsMode, Vendor, VendorConnector};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG: &str = "pgframe.toml";

/// `pgframe.toml`:
///
/// ```toml
/// [connection]
/// vendor = "heroku"
/// dsn = "${DATABASE_URL}"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub connection: ConnectionSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionSection {
    pub vendor: Option<String>,
    pub dsn: Option<String>,
    pub host: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub port: Option<String>,
    pub tls_mode: Option<String>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
        Self::parse(&raw)
            .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e:#}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let mut file: ConfigFile = toml::from_str(raw)?;
        file.connection.expand_env()?;
        Ok(file)
    }
}

impl ConnectionSection {
    fn expand_env(&mut self) -> anyhow::Result<()> {
        self.expand_with(|key| std::env::var(key).ok())
    }

    /// Expand `${VAR}` / `${VAR:-default}` in every field, naming the field
    /// on failure.
    fn expand_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        for (name, field) in [
            ("vendor", &mut self.vendor),
            ("dsn", &mut self.dsn),
            ("host", &mut self.host),
            ("database", &mut self.database),
            ("user", &mut self.user),
            ("password", &mut self.password),
            ("port", &mut self.port),
            ("tls_mode", &mut self.tls_mode),
        ] {
            if let Some(v) = field.as_mut() {
                *v = expand_env_vars(v, &lookup)
                    .map_err(|e| anyhow::anyhow!("[connection] {name}: {e}"))?;
            }
        }
        Ok(())
    }

    pub fn to_connection_config(&self) -> anyhow::Result<ConnectionConfig> {
        let config = match (&self.dsn, &self.host) {
            (Some(_), Some(_)) => anyhow::bail!("[connection] sets both dsn and host"),
            (Some(dsn), None) => ConnectionConfig::dsn(dsn.clone()),
            (None, Some(host)) => {
                let required = |name: &str, v: &Option<String>| {
                    v.clone()
                        .ok_or_else(|| anyhow::anyhow!("[connection] is missing '{name}'"))
                };
                ConnectionConfig::discrete(
                    host.clone(),
                    required("database", &self.database)?,
                    required("user", &self.user)?,
                    required("password", &self.password)?,
                    self.port.clone().unwrap_or_else(|| "5432".to_string()),
                )
            }
            (None, None) => anyhow::bail!("[connection] needs either dsn or host"),
        };

        match &self.tls_mode {
            Some(mode) => Ok(config.with_tls_mode(mode.parse::<TlsMode>()?)),
            None => Ok(config),
        }
    }
}

/// Resolve the connector from flags, config file and environment.
///
/// Vendor precedence: `--vendor`, then the file's `vendor`, then `postgres`
/// for a DSN and `gcp` for discrete settings.
pub fn connector(args: &ConnectionArgs) -> anyhow::Result<VendorConnector> {
    let (file_vendor, config) = match config_path(args) {
        Some(path) => {
            let file = ConfigFile::load(&path)?;
            tracing::debug!(path = %path.display(), "loaded connection config");
            let config = file.connection.to_connection_config()?;
            (file.connection.vendor, config)
        }
        None => (None, ConnectionConfig::from_env()?),
    };

    let vendor = match args.vendor.as_deref().or(file_vendor.as_deref()) {
        Some(tag) => tag.to_string(),
        None if config.is_dsn() => Vendor::Postgres.to_string(),
        None => Vendor::Gcp.to_string(),
    };

    Ok(pgframe::create(&vendor, config)?)
}

fn config_path(args: &ConnectionArgs) -> Option<PathBuf> {
    if let Some(path) = &args.config {
        return Some(path.clone());
    }
    let default = PathBuf::from(DEFAULT_CONFIG);
    default.exists().then_some(default)
}

/// Substitute `${VAR}` and `${VAR:-default}` references.
///
/// As in the shell, the default applies when the variable is unset or empty.
/// A bare `$` that does not open `${` is kept literally.
fn expand_env_vars(input: &str, lookup: &impl Fn(&str) -> Option<String>) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let body = &rest[start + 2..];
        let Some(end) = body.find('}') else {
            anyhow::bail!("unterminated reference `${{{body}`");
        };

        let reference = &body[..end];
        let (key, default) = match reference.split_once(":-") {
            Some((key, default)) => (key, Some(default)),
            None => (reference, None),
        };
        if key.is_empty() {
            anyhow::bail!("empty variable name in `${{{reference}}}`");
        }

        match (lookup(key).filter(|v| !v.is_empty()), default) {
            (Some(value), _) => out.push_str(&value),
            (None, Some(default)) => out.push_str(default),
            (None, None) => anyhow::bail!("environment variable {key} is not set"),
        }
        rest = &body[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dsn_section() {
        let file = ConfigFile::parse(
            r#"
            [connection]
            vendor = "heroku"
            dsn = "postgres://u:p@h/db"
            "#,
        )
        .unwrap();
        let config = file.connection.to_connection_config().unwrap();
        assert!(config.is_dsn());
        assert_eq!(config.tls_mode(), TlsMode::Require);
        assert_eq!(file.connection.vendor.as_deref(), Some("heroku"));
    }

    #[test]
    fn discrete_section_with_tls_override() {
        let file = ConfigFile::parse(
            r#"
            [connection]
            host = "10.0.0.5"
            database = "cars"
            user = "app"
            password = "secret"
            tls_mode = "disable"
            "#,
        )
        .unwrap();
        let config = file.connection.to_connection_config().unwrap();
        assert!(!config.is_dsn());
        assert_eq!(config.tls_mode(), TlsMode::Disable);
    }

    #[test]
    fn discrete_section_requires_credentials() {
        let file = ConfigFile::parse("[connection]\nhost = \"h\"\ndatabase = \"d\"\n").unwrap();
        let err = file.connection.to_connection_config().unwrap_err();
        assert!(err.to_string().contains("user"));
    }

    #[test]
    fn dsn_and_host_are_exclusive() {
        let file = ConfigFile::parse("[connection]\ndsn = \"postgres://h/d\"\nhost = \"h\"\n").unwrap();
        assert!(file.connection.to_connection_config().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ConfigFile::parse("[connection]\nurl = \"postgres://h/d\"\n").is_err());
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn env_references_expand_with_defaults() {
        let lookup = vars(&[("DB_HOST", "db.internal"), ("EMPTY", "")]);
        assert_eq!(
            expand_env_vars("postgres://${DB_HOST}:${DB_PORT:-5432}/cars", &lookup).unwrap(),
            "postgres://db.internal:5432/cars"
        );
        assert_eq!(expand_env_vars("${EMPTY:-fallback}", &lookup).unwrap(), "fallback");
        assert_eq!(expand_env_vars("${UNSET:-}", &lookup).unwrap(), "");
        assert_eq!(expand_env_vars("plain $text", &lookup).unwrap(), "plain $text");
    }

    #[test]
    fn env_expansion_errors() {
        let lookup = vars(&[]);
        assert!(expand_env_vars("${", &lookup).is_err());
        assert!(expand_env_vars("${}", &lookup).is_err());
        assert!(expand_env_vars("${:-x}", &lookup).is_err());
        let err = expand_env_vars("${PGFRAME_UNSET}", &lookup).unwrap_err();
        assert!(err.to_string().contains("PGFRAME_UNSET"));
    }

    #[test]
    fn expansion_error_names_the_field() {
        let mut section = ConnectionSection {
            host: Some("h".to_string()),
            password: Some("${DB_PASSWORD}".to_string()),
            ..Default::default()
        };
        let err = section.expand_with(vars(&[])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "[connection] password: environment variable DB_PASSWORD is not set"
        );

        section
            .expand_with(vars(&[("DB_PASSWORD", "secret")]))
            .unwrap();
        assert_eq!(section.password.as_deref(), Some("secret"));
    }
}
