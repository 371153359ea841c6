#![cfg_attr(
    not(any(feature = "pg", feature = "mysql", feature = "sqlite")),
    allow(unused_imports, unused_variables, dead_code)
)]

//! Directive-driven data access over SeaORM.
//!
//! A [`DirectiveSet`](query_core::DirectiveSet) describes what a caller wants
//! (filters, sort keys, keyword search, paging); this crate checks it against
//! the entity's attributes, compiles it into a store query and runs it.
//!
//! # Features
//! - `pg`, `mysql`, `sqlite`: enable SeaORM's SQLx backends
//!
//! # Example
//! ```rust,no_run
//! # async fn demo() -> query_db::DaoResult<()> {
//! use query_core::{DirectiveSet, Operator, SortDir};
//! use query_db::{connect, DatabaseConfig, DynamicDao};
//!
//! let conn = connect(&DatabaseConfig::default()).await?;
//! let dao = DynamicDao::new(conn);
//!
//! let directives = DirectiveSet::new()
//!     .filter("age", Operator::Between, ["18", "30"])
//!     .sort("name", SortDir::Asc)
//!     .page(1, 20);
//! # let _ = (dao, directives);
//! // let page = dao.find_page::<person::Entity>(&directives).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connect;
pub mod dao;
pub mod error;
pub mod predicate;
pub mod schema;
pub mod service;

pub use config::{DatabaseConfig, PoolCfg, QueryConfig};
pub use connect::connect;
pub use dao::{DynamicDao, KeyOf, ModelOf};
pub use error::{DaoError, DaoResult};
pub use predicate::{build_condition, filter_condition, keyword_condition, to_sea_value};
pub use schema::{is_queryable, AttributeKind, AttributeMeta, Field, RecordSchema};
pub use service::{RecordBinding, RecordService};
