//! Scoped data access for one phase of the program.
//!
//! An [`OrdersContext`] owns a pooled connection for as long as it lives.
//! All reads and writes go through a [`Session`], which checks the entity
//! mapping before writing so view-backed entities never reach the database
//! as `INSERT` or `DELETE` targets.

use diesel::prelude::*;
use diesel::sql_types::Integer;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use crate::database::{DbConnection, PooledConnection};
use crate::error::{Error, Result};
use crate::mapping::{Backing, ColumnType, Mapped, Model};
use crate::models::{Customer, Order, OrderView, Product};
use crate::operations::{Insert, ViewQuery};

/// Mapping for the orders schema: three tables and the `OrderSummary` view
pub fn orders_model() -> Result<Model> {
    Model::builder()
        .table::<Customer>("Customer", |t| {
            t.key("Id").column("Name", ColumnType::Text)
        })
        .table::<Product>("Product", |t| {
            t.key("Id")
                .column("Name", ColumnType::Text)
                .optional("Description", ColumnType::Text)
        })
        .table::<Order>("Orders", |t| {
            t.key("Id")
                .column("Amount", ColumnType::Integer)
                .references("ProductId", "Product")
                .references("CustomerId", "Customer")
        })
        .view::<OrderView>("OrderSummary")
        .build()
}

/// One phase's database session; the connection returns to the pool on drop
pub struct OrdersContext {
    conn: PooledConnection,
    model: Arc<Model>,
}

impl OrdersContext {
    pub(crate) fn new(conn: PooledConnection, model: Arc<Model>) -> Self {
        OrdersContext { conn, model }
    }

    /// Session running each statement in autocommit mode
    pub fn session(&mut self) -> Session<'_> {
        Session {
            conn: &mut self.conn,
            model: &self.model,
        }
    }

    /// Run `f` in a transaction, committing on `Ok` and rolling back on `Err`
    pub fn transaction<R>(&mut self, f: impl FnOnce(&mut Session<'_>) -> Result<R>) -> Result<R> {
        let model: &Model = &self.model;
        let conn: &mut DbConnection = &mut self.conn;

        conn.transaction(|conn| f(&mut Session { conn, model }))
    }

    /// All rows of the `OrderSummary` view
    pub fn order_views(&mut self) -> Result<Vec<OrderView>> {
        self.session().view::<OrderView>()?.load()
    }

    pub fn model(&self) -> &Model {
        &self.model
    }
}

pub struct Session<'c> {
    conn: &'c mut DbConnection,
    model: &'c Model,
}

impl<'c> Session<'c> {
    /// Insert a new row of `T`, returning it with its generated key
    pub fn add<T: Insert>(&mut self, record: &T::Record) -> Result<T> {
        let table = self.model.ensure_writable(T::ENTITY)?;
        let row = T::insert(self.conn, record)?;
        debug!(entity = T::ENTITY, table = table.name, "Inserted row");
        Ok(row)
    }

    /// Delete the row of `T` with key `id`, returning the number of rows removed
    pub fn remove<T: Mapped>(&mut self, id: i32) -> Result<usize> {
        let table = self.model.ensure_writable(T::ENTITY)?;
        let key = table.key_column().map_or("Id", |c| c.name);

        let statement = format!("DELETE FROM \"{}\" WHERE \"{}\" = ?", table.name, key);
        let removed = diesel::sql_query(statement)
            .bind::<Integer, _>(id)
            .execute(self.conn)?;

        debug!(entity = T::ENTITY, id, removed, "Removed row");
        Ok(removed)
    }

    pub fn orders(&mut self) -> Result<Vec<Order>> {
        use crate::schema::orders::dsl::*;

        Ok(orders.select(Order::as_select()).load(self.conn)?)
    }

    /// Read-only collection over the view backing `T`
    pub fn view<T: ViewQuery>(&mut self) -> Result<ViewSet<'_, T>> {
        let mapping = self.model.mapping_for::<T>()?;
        let Backing::View(view) = &mapping.backing else {
            return Err(Error::UnmappedEntity(T::ENTITY.to_string()));
        };

        Ok(ViewSet {
            conn: &mut *self.conn,
            name: view.name,
            _entity: PhantomData,
        })
    }

    /// Execute raw SQL, returning the number of affected rows
    pub fn execute_sql(&mut self, sql: &str) -> Result<usize> {
        Ok(diesel::sql_query(sql).execute(self.conn)?)
    }
}

/// Rows of a view, queried on demand; nothing is cached
pub struct ViewSet<'s, T> {
    conn: &'s mut DbConnection,
    name: &'static str,
    _entity: PhantomData<T>,
}

impl<'s, T: ViewQuery> ViewSet<'s, T> {
    /// Name of the backing view
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn load(&mut self) -> Result<Vec<T>> {
        let rows = T::load_all(self.conn)?;
        debug!(view = self.name, rows = rows.len(), "Loaded view");
        Ok(rows)
    }

    pub fn count(&mut self) -> Result<i64> {
        Ok(T::count_all(self.conn)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_model_tables_in_order() {
        let model = orders_model().unwrap();

        let tables: Vec<&str> = model.tables().map(|t| t.name).collect();
        assert_eq!(tables, vec!["Customer", "Product", "Orders"]);
    }

    #[test]
    fn test_order_view_maps_to_order_summary() {
        let model = orders_model().unwrap();

        let mapping = model.mapping_for::<OrderView>().unwrap();
        assert_eq!(mapping.object_name(), "OrderSummary");
        assert!(mapping.is_read_only());
        assert!(matches!(
            model.ensure_writable(OrderView::ENTITY),
            Err(Error::ReadOnlyEntity { view: "OrderSummary", .. })
        ));
    }

    #[test]
    fn test_orders_table_references() {
        let model = orders_model().unwrap();

        let orders = model.ensure_writable(Order::ENTITY).unwrap();
        let statement = orders.create_statement();
        assert!(statement.starts_with("CREATE TABLE \"Orders\""));
        assert!(statement.contains("\"ProductId\" INTEGER NOT NULL REFERENCES \"Product\""));
        assert!(statement.contains("\"CustomerId\" INTEGER NOT NULL REFERENCES \"Customer\""));
    }
}
