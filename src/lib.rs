//! mocknow - a local mock of the ServiceNow Table and Aggregate REST APIs.
//!
//! Answers `sysparm_query`-style requests against a static in-memory
//! dataset exactly as the remote service would, so client code and test
//! suites can run without a network or credentials.
//!
//! # Main Components
//!
//! - **Parsers**: the sysparm filter/field-list/offset/limit grammars
//! - **Dataset**: tables of LinkCell rows with a sys_id index, plus
//!   cross-table reference resolution driven by the fields catalog
//! - **QueryRunner**: evaluates a decomposed request into the remote
//!   service's response shape
//! - **Server**: the axum HTTP surface over the runner
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use mocknow::QueryRunner;
//!
//! let runner = QueryRunner::load(Path::new("dataset"), Path::new("schemas")).unwrap();
//! let response = runner
//!     .query_url("/api/now/table/person?sysparm_query=nameISNOTEMPTY")
//!     .unwrap();
//! println!("{response}");
//! ```

pub mod dataset;
pub mod error;
pub mod query;
pub mod schema;
pub mod server;

pub use dataset::{Cell, Dataset, DisplayMode, Resolver};
pub use error::{ApiError, ApiResult};
pub use query::{parse_query, parse_request, parse_url, Endpoint, ParsedRequest, QueryRunner};
pub use schema::FieldsCatalog;
pub use server::create_router;
