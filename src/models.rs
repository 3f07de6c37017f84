//! Diesel models for the orders schema

use diesel::prelude::*;
use std::fmt;

use crate::mapping::Mapped;
use crate::schema::*;

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Customer {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = customers)]
pub struct NewCustomer {
    pub name: String,
}

impl NewCustomer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = products)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Order {
    pub id: i32,
    pub amount: i32,
    pub product_id: i32,
    pub customer_id: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub amount: i32,
    pub product_id: i32,
    pub customer_id: i32,
}

impl NewOrder {
    pub fn new(amount: i32, product: &Product, customer: &Customer) -> Self {
        Self {
            amount,
            product_id: product.id,
            customer_id: customer.id,
        }
    }
}

/// One row of the `OrderSummary` view.
///
/// Only `Queryable`/`Selectable`: there is no `Insertable` or `AsChangeset`
/// for this type, so Diesel cannot build a write against the view from it.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = order_summary)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OrderView {
    pub id: i32,
    pub amount: i32,
    pub product_name: String,
    pub customer_name: String,
}

impl fmt::Display for OrderView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ordered {} of {}",
            self.customer_name, self.amount, self.product_name
        )
    }
}

impl Mapped for Customer {
    const ENTITY: &'static str = "Customer";
}

impl Mapped for Product {
    const ENTITY: &'static str = "Product";
}

impl Mapped for Order {
    const ENTITY: &'static str = "Order";
}

impl Mapped for OrderView {
    const ENTITY: &'static str = "OrderView";
}
