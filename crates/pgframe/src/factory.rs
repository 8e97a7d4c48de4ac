//! Vendor tags and the connector factory.

use crate::config::ConnectionConfig;
use crate::connector::{DsnConnector, HostConnector, VendorConnector};
use crate::error::{DbError, DbResult};
use std::fmt;
use std::str::FromStr;

/// Supported database vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    /// Plain PostgreSQL, configured by DSN.
    Postgres,
    /// Heroku Postgres, configured by DSN with TLS required.
    Heroku,
    /// GCP Cloud SQL, configured by host/database/user/password/port.
    Gcp,
}

impl Vendor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Postgres => "postgres",
            Vendor::Heroku => "heroku",
            Vendor::Gcp => "gcp",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vendor {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Vendor::Postgres),
            "heroku" => Ok(Vendor::Heroku),
            "gcp" => Ok(Vendor::Gcp),
            _ => Err(DbError::UnsupportedVendor(s.to_string())),
        }
    }
}

/// Build the connector for `vendor_tag`.
///
/// The tag is matched case-insensitively. GCP needs a discrete config; Heroku
/// and plain PostgreSQL need a DSN.
///
/// ```ignore
/// let db = pgframe::create("heroku", ConnectionConfig::dsn(url))?;
/// let gcp = pgframe::create("GCP", ConnectionConfig::discrete(host, db, user, pw, "5432"))?;
/// ```
pub fn create(vendor_tag: &str, config: ConnectionConfig) -> DbResult<VendorConnector> {
    let vendor: Vendor = vendor_tag.parse()?;
    let connector = match vendor {
        Vendor::Postgres | Vendor::Heroku => {
            VendorConnector::Dsn(DsnConnector::from_config(vendor, config)?)
        }
        Vendor::Gcp => VendorConnector::Host(HostConnector::from_config(vendor, config)?),
    };
    tracing::debug!(target: "pgframe.factory", vendor = %vendor, "connector created");
    Ok(connector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TlsMode;
    use crate::connector::Connector;

    fn gcp_config() -> ConnectionConfig {
        ConnectionConfig::discrete("10.0.0.5", "cars", "app", "secret", "5432")
    }

    #[test]
    fn vendor_tags_are_case_insensitive() {
        assert_eq!("Heroku".parse::<Vendor>().unwrap(), Vendor::Heroku);
        assert_eq!("GCP".parse::<Vendor>().unwrap(), Vendor::Gcp);
        assert_eq!("postgresql".parse::<Vendor>().unwrap(), Vendor::Postgres);
        assert_eq!("Postgres".parse::<Vendor>().unwrap(), Vendor::Postgres);
    }

    #[test]
    fn unknown_vendor_is_rejected() {
        let err = create("oracle", ConnectionConfig::dsn("postgres://h/db")).unwrap_err();
        assert!(matches!(err, DbError::UnsupportedVendor(ref tag) if tag == "oracle"));
    }

    #[test]
    fn heroku_gets_dsn_connector() {
        let db = create("heroku", ConnectionConfig::dsn("postgres://h/db")).unwrap();
        assert!(matches!(db, VendorConnector::Dsn(_)));
        assert_eq!(db.vendor(), Vendor::Heroku);
        assert_eq!(db.config().tls_mode(), TlsMode::Require);
        assert!(db.writer().guard().is_enabled());
    }

    #[test]
    fn gcp_gets_host_connector() {
        let db = create("gcp", gcp_config()).unwrap();
        assert!(matches!(db, VendorConnector::Host(_)));
        assert_eq!(db.vendor(), Vendor::Gcp);
        assert_eq!(db.config().tls_mode(), TlsMode::Prefer);
    }

    #[test]
    fn mismatched_config_shape_is_a_config_error() {
        assert!(matches!(
            create("gcp", ConnectionConfig::dsn("postgres://h/db")),
            Err(DbError::Config(_))
        ));
        assert!(matches!(create("heroku", gcp_config()), Err(DbError::Config(_))));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for vendor in [Vendor::Postgres, Vendor::Heroku, Vendor::Gcp] {
            assert_eq!(vendor.to_string().parse::<Vendor>().unwrap(), vendor);
        }
    }
}
