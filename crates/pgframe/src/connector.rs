//! Database connectors.
//!
//! A connector is an immutable bundle of connection settings plus a
//! [`SqlWriter`]. Every operation opens its own session, does one round trip
//! and closes the session again before returning, whether the statement
//! succeeded or not. There is no pooling and no retry.
//!
//! # Example
//! ```ignore
//! use pgframe::{Connector, DataFrame, DsnConnector};
//!
//! let db = DsnConnector::heroku(std::env::var("DATABASE_URL")?);
//! let today = db.query("SELECT current_date").await?;
//!
//! let cars = DataFrame::new()
//!     .with_column("id", [1, 2])?
//!     .with_column("name", ["Mercedes", "Toyota"])?;
//! db.insert_table("test.simple", &cars, false).await?;
//! db.update_table("test.simple", &cars, &["id"]).await?;
//! ```

use crate::config::{ConnectionConfig, TlsMode};
use crate::error::{DbError, DbResult};
use crate::factory::Vendor;
use crate::frame::DataFrame;
use crate::log::{SqlKind, log_sql, log_sql_error};
use crate::row::{decodes_binary, frame_from_rows, frame_from_text_rows};
use crate::tls::make_tls_connector;
use crate::writer::SqlWriter;
use std::future::Future;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage, SimpleQueryRow};

/// One open database connection.
///
/// Created by [`Connector::connect`]. Call [`Session::close`] when done; a
/// session that is dropped without closing still shuts its connection down
/// once the client goes away.
pub struct Session {
    client: Client,
    connection: JoinHandle<()>,
}

impl Session {
    /// Open a new connection described by `config`.
    pub async fn open(config: &ConnectionConfig) -> DbResult<Self> {
        let pg = config.to_pg_config()?;
        let connect_err =
            |e: tokio_postgres::Error| DbError::Connection(format!("{}: {e}", config.redacted()));

        tracing::debug!(target: "pgframe.session", config = %config.redacted(), "connecting");

        let (client, connection) = match config.tls_mode() {
            TlsMode::Disable => {
                let (client, connection) = pg.connect(NoTls).await.map_err(connect_err)?;
                (client, spawn_connection(connection))
            }
            mode => {
                let tls = make_tls_connector(mode)?;
                let (client, connection) = pg.connect(tls).await.map_err(connect_err)?;
                (client, spawn_connection(connection))
            }
        };

        Ok(Self { client, connection })
    }

    /// The underlying driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Run a statement and collect every row.
    ///
    /// Results whose column types all decode from the binary protocol are
    /// read with the prepared statement. Otherwise the statement runs as a
    /// simple query and cells arrive in the server's text form.
    pub async fn query(&self, sql: &str) -> DbResult<DataFrame> {
        let stmt = self.client.prepare(sql).await?;
        if stmt.columns().iter().all(|c| decodes_binary(c.type_())) {
            let rows = self.client.query(&stmt, &[]).await?;
            return frame_from_rows(stmt.columns(), &rows);
        }

        tracing::debug!(target: "pgframe.session", "reading result in text format");
        let rows: Vec<SimpleQueryRow> = self
            .client
            .simple_query(sql)
            .await?
            .into_iter()
            .filter_map(|message| match message {
                SimpleQueryMessage::Row(row) => Some(row),
                _ => None,
            })
            .collect();
        frame_from_text_rows(stmt.columns(), &rows)
    }

    /// Run one or more `;`-separated statements in a transaction and commit.
    ///
    /// On failure the transaction is rolled back and nothing is committed.
    pub async fn execute(&mut self, sql: &str) -> DbResult<()> {
        let tx = self.client.transaction().await?;
        tx.batch_execute(sql).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Close the connection and wait for its background task to finish.
    pub async fn close(self) {
        let Self { client, connection } = self;
        drop(client);
        if let Err(e) = connection.await {
            tracing::warn!(target: "pgframe.session", error = %e, "connection task did not finish cleanly");
        }
        tracing::debug!(target: "pgframe.session", "closed");
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("closed", &self.client.is_closed())
            .finish()
    }
}

fn spawn_connection<S, T>(connection: tokio_postgres::Connection<S, T>) -> JoinHandle<()>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
    T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(target: "pgframe.session", error = %e, "postgres connection error");
        }
    })
}

/// Session lifecycle plus the DML helpers built on top of it.
///
/// Implementors only supply their settings; every operation has a default
/// body. `query` and `execute` close the session on every exit path.
pub trait Connector: Send + Sync {
    fn vendor(&self) -> Vendor;

    fn config(&self) -> &ConnectionConfig;

    fn writer(&self) -> &SqlWriter;

    /// Open a new session. No pooling: each call is a fresh connection.
    fn connect(&self) -> impl Future<Output = DbResult<Session>> + Send {
        Session::open(self.config())
    }

    /// Run a query and return the full result set.
    fn query(&self, sql: &str) -> impl Future<Output = DbResult<DataFrame>> + Send {
        async move {
            log_sql(SqlKind::Query, sql);
            let session = self.connect().await?;
            let result = session.query(sql).await;
            session.close().await;
            if let Err(err) = &result {
                log_sql_error(SqlKind::Query, err);
            }
            result
        }
    }

    /// Run statement text (several statements allowed) and commit.
    fn execute(&self, sql: &str) -> impl Future<Output = DbResult<()>> + Send {
        async move {
            log_sql(SqlKind::Execute, sql);
            let mut session = self.connect().await?;
            let result = session.execute(sql).await;
            session.close().await;
            if let Err(err) = &result {
                log_sql_error(SqlKind::Execute, err);
            }
            result
        }
    }

    /// Insert every row of `data`, optionally truncating the table first.
    fn insert_table(
        &self,
        table: &str,
        data: &DataFrame,
        truncate: bool,
    ) -> impl Future<Output = DbResult<()>> + Send {
        async move {
            let sql = self.writer().insert_statement(table, data, truncate)?;
            self.execute(&sql).await
        }
    }

    /// Update rows matched on `key_columns` with the remaining columns.
    fn update_table(
        &self,
        table: &str,
        data: &DataFrame,
        key_columns: &[&str],
    ) -> impl Future<Output = DbResult<()>> + Send {
        async move {
            let sql = self.writer().update_statement(table, data, key_columns)?;
            self.execute(&sql).await
        }
    }

    /// Delete rows matching `data` (see [`SqlWriter::delete_statement`]).
    fn delete_from_table(
        &self,
        table: &str,
        data: &DataFrame,
    ) -> impl Future<Output = DbResult<()>> + Send {
        async move {
            let sql = self.writer().delete_statement(table, data)?;
            self.execute(&sql).await
        }
    }
}

/// Connector configured by a single DSN (Heroku, plain PostgreSQL).
#[derive(Debug, Clone)]
pub struct DsnConnector {
    vendor: Vendor,
    config: ConnectionConfig,
    writer: SqlWriter,
}

impl DsnConnector {
    /// Plain PostgreSQL connector.
    pub fn new(dsn: impl Into<String>, tls_mode: TlsMode) -> Self {
        Self {
            vendor: Vendor::Postgres,
            config: ConnectionConfig::dsn(dsn).with_tls_mode(tls_mode),
            writer: SqlWriter::new(),
        }
    }

    /// Heroku connector: DSN with TLS `require`.
    pub fn heroku(dsn: impl Into<String>) -> Self {
        Self {
            vendor: Vendor::Heroku,
            config: ConnectionConfig::dsn(dsn),
            writer: SqlWriter::new(),
        }
    }

    pub(crate) fn from_config(vendor: Vendor, config: ConnectionConfig) -> DbResult<Self> {
        if !config.is_dsn() {
            return Err(DbError::config(format!(
                "vendor '{vendor}' expects a DSN connection config"
            )));
        }
        Ok(Self {
            vendor,
            config,
            writer: SqlWriter::new(),
        })
    }

    /// Switch the injection guard on or off for the DML helpers.
    pub fn guard_enabled(mut self, enabled: bool) -> Self {
        self.writer = self.writer.guard_enabled(enabled);
        self
    }
}

impl Connector for DsnConnector {
    fn vendor(&self) -> Vendor {
        self.vendor
    }

    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn writer(&self) -> &SqlWriter {
        &self.writer
    }
}

/// Connector configured by discrete host/database/user/password/port (GCP).
#[derive(Debug, Clone)]
pub struct HostConnector {
    vendor: Vendor,
    config: ConnectionConfig,
    writer: SqlWriter,
}

impl HostConnector {
    /// GCP Cloud SQL connector.
    pub fn gcp(
        host: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        port: impl Into<String>,
    ) -> Self {
        Self {
            vendor: Vendor::Gcp,
            config: ConnectionConfig::discrete(host, database, user, password, port),
            writer: SqlWriter::new(),
        }
    }

    pub(crate) fn from_config(vendor: Vendor, config: ConnectionConfig) -> DbResult<Self> {
        if config.is_dsn() {
            return Err(DbError::config(format!(
                "vendor '{vendor}' expects host, database, user, password and port"
            )));
        }
        Ok(Self {
            vendor,
            config,
            writer: SqlWriter::new(),
        })
    }

    /// Switch the injection guard on or off for the DML helpers.
    pub fn guard_enabled(mut self, enabled: bool) -> Self {
        self.writer = self.writer.guard_enabled(enabled);
        self
    }

    /// Override the TLS mode (default `prefer`).
    pub fn tls_mode(mut self, mode: TlsMode) -> Self {
        self.config = self.config.with_tls_mode(mode);
        self
    }
}

impl Connector for HostConnector {
    fn vendor(&self) -> Vendor {
        self.vendor
    }

    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn writer(&self) -> &SqlWriter {
        &self.writer
    }
}

/// Any vendor's connector, as returned by [`create`](crate::factory::create).
#[derive(Debug, Clone)]
pub enum VendorConnector {
    Dsn(DsnConnector),
    Host(HostConnector),
}

impl VendorConnector {
    /// Switch the injection guard on or off for the DML helpers.
    pub fn guard_enabled(self, enabled: bool) -> Self {
        match self {
            Self::Dsn(c) => Self::Dsn(c.guard_enabled(enabled)),
            Self::Host(c) => Self::Host(c.guard_enabled(enabled)),
        }
    }
}

impl Connector for VendorConnector {
    fn vendor(&self) -> Vendor {
        match self {
            Self::Dsn(c) => c.vendor(),
            Self::Host(c) => c.vendor(),
        }
    }

    fn config(&self) -> &ConnectionConfig {
        match self {
            Self::Dsn(c) => c.config(),
            Self::Host(c) => c.config(),
        }
    }

    fn writer(&self) -> &SqlWriter {
        match self {
            Self::Dsn(c) => c.writer(),
            Self::Host(c) => c.writer(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Nothing listens on port 1, so reaching the network would fail with
    // a connection error rather than the validation errors asserted here.
    fn unreachable() -> DsnConnector {
        DsnConnector::new("postgres://u:p@127.0.0.1:1/db", TlsMode::Disable)
    }

    #[tokio::test]
    async fn empty_input_never_connects() {
        let db = unreachable();
        let empty = DataFrame::from_rows(&["id"], Vec::new()).unwrap();

        assert!(db.insert_table("t", &empty, true).await.unwrap_err().is_empty_input());
        assert!(db.update_table("t", &empty, &["id"]).await.unwrap_err().is_empty_input());
        assert!(db.delete_from_table("t", &empty).await.unwrap_err().is_empty_input());
    }

    #[tokio::test]
    async fn guard_rejects_before_connecting() {
        let db = unreachable();
        let data = DataFrame::new()
            .with_column("name", ["x'); DROP TABLE t;"])
            .unwrap();
        let err = db.insert_table("t", &data, false).await.unwrap_err();
        assert!(err.is_injection_suspected());
    }

    #[tokio::test]
    async fn connection_failure_surfaces() {
        let err = unreachable().query("SELECT 1").await.unwrap_err();
        assert!(err.is_connection(), "{err:?}");
        assert!(!err.to_string().contains(":p@"));
    }

    #[test]
    fn constructors_set_vendor_and_shape() {
        let heroku = DsnConnector::heroku("postgres://h/db");
        assert_eq!(heroku.vendor(), Vendor::Heroku);
        assert_eq!(heroku.config().tls_mode(), TlsMode::Require);

        let gcp = HostConnector::gcp("h", "db", "u", "p", "5432").tls_mode(TlsMode::Disable);
        assert_eq!(gcp.vendor(), Vendor::Gcp);
        assert!(!gcp.config().is_dsn());
        assert_eq!(gcp.config().tls_mode(), TlsMode::Disable);

        let relaxed = heroku.guard_enabled(false);
        assert!(!relaxed.writer().guard().is_enabled());
    }
}
