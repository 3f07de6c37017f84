//! view-types - seeds the orders database and prints the `OrderSummary` view

use tracing_subscriber::EnvFilter;

use view_types::{bootstrap, DatabaseConfig};

fn main() -> Result<(), view_types::Error> {
    // Initialize tracing; stdout is reserved for the report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("view_types=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let db = bootstrap::setup_database(&DatabaseConfig::default())?;

    for order in bootstrap::read_order_views(&db)? {
        println!("{}", order);
    }

    Ok(())
}
