//! Per-entity Diesel operations used by [`Session`](crate::context::Session)

use diesel::prelude::*;
use diesel::result::Error as DieselError;

use crate::database::DbConnection;
use crate::mapping::Mapped;
use crate::models::*;

/// Entities that can be inserted, returning the stored row with its generated key
pub trait Insert: Mapped + Sized {
    type Record;

    fn insert(conn: &mut DbConnection, record: &Self::Record) -> Result<Self, DieselError>;
}

/// Entities read from a view
pub trait ViewQuery: Mapped + Sized {
    fn load_all(conn: &mut DbConnection) -> Result<Vec<Self>, DieselError>;

    fn count_all(conn: &mut DbConnection) -> Result<i64, DieselError>;
}

// ============================================================================
// Customer
// ============================================================================

impl Insert for Customer {
    type Record = NewCustomer;

    fn insert(conn: &mut DbConnection, record: &NewCustomer) -> Result<Self, DieselError> {
        use crate::schema::customers::dsl::*;

        diesel::insert_into(customers).values(record).execute(conn)?;

        // Query back to get auto-generated id
        customers
            .order(id.desc())
            .select(Customer::as_select())
            .first(conn)
    }
}

// ============================================================================
// Product
// ============================================================================

impl Insert for Product {
    type Record = NewProduct;

    fn insert(conn: &mut DbConnection, record: &NewProduct) -> Result<Self, DieselError> {
        use crate::schema::products::dsl::*;

        diesel::insert_into(products).values(record).execute(conn)?;

        products
            .order(id.desc())
            .select(Product::as_select())
            .first(conn)
    }
}

// ============================================================================
// Order
// ============================================================================

impl Insert for Order {
    type Record = NewOrder;

    fn insert(conn: &mut DbConnection, record: &NewOrder) -> Result<Self, DieselError> {
        use crate::schema::orders::dsl::*;

        diesel::insert_into(orders).values(record).execute(conn)?;

        orders
            .order(id.desc())
            .select(Order::as_select())
            .first(conn)
    }
}

// ============================================================================
// OrderView
// ============================================================================

impl ViewQuery for OrderView {
    fn load_all(conn: &mut DbConnection) -> Result<Vec<Self>, DieselError> {
        use crate::schema::order_summary::dsl::*;

        order_summary.select(OrderView::as_select()).load(conn)
    }

    fn count_all(conn: &mut DbConnection) -> Result<i64, DieselError> {
        use crate::schema::order_summary::dsl::*;

        order_summary.count().get_result(conn)
    }
}
