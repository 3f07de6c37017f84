//! # view-types: database views as mapped entities
//!
//! Maps a read-only SQL view next to regular tables with Diesel. The program
//! seeds customers, products and orders into SQLite, creates the
//! `OrderSummary` view over a join of the three, and reads it back as
//! [`OrderView`] records.
//!
//! ## Example
//!
//! ```ignore
//! use view_types::{bootstrap, DatabaseConfig};
//!
//! let db = bootstrap::setup_database(&DatabaseConfig::default())?;
//! for order in bootstrap::read_order_views(&db)? {
//!     println!("{}", order); // "Diego ordered 12 of Empanada"
//! }
//! ```

pub mod bootstrap;
pub mod context;
pub mod database;
pub mod error;
pub mod mapping;
pub mod models;
pub mod operations;
pub mod schema;

pub use context::{orders_model, OrdersContext, Session, ViewSet};
pub use database::{ensure_deleted, Database, DatabaseConfig, SchemaObject};
pub use error::{Error, Result};
pub use mapping::{Mapped, Model, ModelBuilder};
pub use models::{Customer, NewCustomer, NewOrder, NewProduct, Order, OrderView, Product};
pub use operations::{Insert, ViewQuery};
