//! Database setup and the read phase.

use tracing::info;

use crate::context::{orders_model, OrdersContext};
use crate::database::{ensure_deleted, Database, DatabaseConfig};
use crate::error::Result;
use crate::models::{Customer, NewCustomer, NewOrder, NewProduct, Order, OrderView, Product};

/// DDL for the `OrderSummary` view, issued verbatim after seeding
pub const CREATE_ORDER_SUMMARY_VIEW: &str = "CREATE VIEW [OrderSummary] AS
SELECT o.Id, o.Amount, p.Name AS ProductName, c.Name AS CustomerName
FROM Orders o
INNER JOIN Product p ON o.ProductId = p.Id
INNER JOIN Customer c ON o.CustomerId = c.Id";

/// Delete the database at `config.database_path`, recreate it, seed it and
/// create the `OrderSummary` view.
///
/// Destroys whatever the file held before.
pub fn setup_database(config: &DatabaseConfig) -> Result<Database> {
    ensure_deleted(&config.database_path)?;

    let db = Database::open(config.clone(), orders_model()?)?;
    if db.ensure_created()? {
        let mut ctx = db.context()?;
        seed(&mut ctx)?;
        ctx.session().execute_sql(CREATE_ORDER_SUMMARY_VIEW)?;
        info!("Created view OrderSummary");
    }

    Ok(db)
}

/// Insert two customers, two products and one order for each pair, in one
/// transaction
pub fn seed(ctx: &mut OrdersContext) -> Result<()> {
    ctx.transaction(|session| {
        let diego = session.add::<Customer>(&NewCustomer::new("Diego"))?;
        let andrew = session.add::<Customer>(&NewCustomer::new("Andrew"))?;

        let empanada = session.add::<Product>(&NewProduct::new("Empanada"))?;
        let meat_pie = session.add::<Product>(&NewProduct::new("Meat Pie"))?;

        session.add::<Order>(&NewOrder::new(12, &empanada, &diego))?;
        session.add::<Order>(&NewOrder::new(20, &meat_pie, &andrew))?;
        Ok(())
    })?;

    info!("Seeded orders");
    Ok(())
}

/// Read every row of the `OrderSummary` view in a fresh context
pub fn read_order_views(db: &Database) -> Result<Vec<OrderView>> {
    let mut ctx = db.context()?;
    ctx.order_views()
}
