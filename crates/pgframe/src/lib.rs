//! # pgframe
//!
//! Move tabular data in and out of PostgreSQL (plain, Heroku, GCP Cloud SQL).
//!
//! ## Features
//!
//! - **Frames in, frames out**: `query()` returns a [`DataFrame`]; INSERT,
//!   UPDATE and DELETE statements are generated from one
//! - **Injection guard**: cell values and column names are screened for the
//!   classic `'); DROP ...;` shape before any SQL is built
//! - **One connection per call**: every operation opens, runs, commits and
//!   closes; nothing is pooled or shared
//! - **Vendor factory**: `create("heroku" | "gcp" | "postgres", config)`
//!
//! ## Example
//!
//! ```ignore
//! use pgframe::{ConnectionConfig, Connector, DataFrame};
//!
//! let db = pgframe::create("heroku", ConnectionConfig::from_env()?)?;
//!
//! let cars = DataFrame::new()
//!     .with_column("id", [1, 2, 3])?
//!     .with_column("name", ["Mercedes", "Toyota", "Ferrari"])?
//!     .with_column("price", [60000, 23000, 120000])?;
//!
//! db.insert_table("test.simple", &cars, true).await?;
//! let back = db.query("SELECT * FROM test.simple").await?;
//! assert_eq!(back.n_rows(), 3);
//!
//! db.delete_from_table("test.simple", &cars.select(&["id"])?).await?;
//! ```
//!
//! Generated DML interpolates values as literals (no bind parameters). The
//! guard is a heuristic, not an escaping layer.

pub mod config;
pub mod connector;
pub mod error;
pub mod factory;
pub mod frame;
pub mod guard;
mod log;
pub mod row;
pub mod tls;
pub mod value;
pub mod writer;

pub use config::{ConnectionConfig, TlsMode};
pub use connector::{Connector, DsnConnector, HostConnector, Session, VendorConnector};
pub use error::{DbError, DbResult};
pub use factory::{Vendor, create};
pub use frame::{Column, DataFrame};
pub use guard::{InjectionGuard, check_value};
pub use log::MAX_LOGGED_SQL;
pub use row::{RowExt, decodes_binary, frame_from_rows, frame_from_text_rows, text_value};
pub use tls::make_tls_connector;
pub use value::Value;
pub use writer::SqlWriter;
