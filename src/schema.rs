//! Diesel table declarations for the orders schema.
//!
//! `order_summary` is declared with `table!` like any other table, but it is
//! backed by the `OrderSummary` view and only ever appears in `SELECT`s.

diesel::table! {
    #[sql_name = "Customer"]
    customers (id) {
        #[sql_name = "Id"]
        id -> Integer,
        #[sql_name = "Name"]
        name -> Text,
    }
}

diesel::table! {
    #[sql_name = "Product"]
    products (id) {
        #[sql_name = "Id"]
        id -> Integer,
        #[sql_name = "Name"]
        name -> Text,
        #[sql_name = "Description"]
        description -> Nullable<Text>,
    }
}

diesel::table! {
    #[sql_name = "Orders"]
    orders (id) {
        #[sql_name = "Id"]
        id -> Integer,
        #[sql_name = "Amount"]
        amount -> Integer,
        #[sql_name = "ProductId"]
        product_id -> Integer,
        #[sql_name = "CustomerId"]
        customer_id -> Integer,
    }
}

diesel::table! {
    #[sql_name = "OrderSummary"]
    order_summary (id) {
        #[sql_name = "Id"]
        id -> Integer,
        #[sql_name = "Amount"]
        amount -> Integer,
        #[sql_name = "ProductName"]
        product_name -> Text,
        #[sql_name = "CustomerName"]
        customer_name -> Text,
    }
}

diesel::joinable!(orders -> customers (customer_id));
diesel::joinable!(orders -> products (product_id));

diesel::allow_tables_to_appear_in_same_query!(customers, orders, products,);
