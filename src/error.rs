//! Error type shared by every database operation in the crate.

use thiserror::Error;

/// Errors surfaced while creating, seeding or reading the orders database
#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Entity '{entity}' is mapped to view '{view}' and cannot be written")]
    ReadOnlyEntity {
        entity: &'static str,
        view: &'static str,
    },

    #[error("Entity '{0}' has no table or view mapping")]
    UnmappedEntity(String),

    #[error("Duplicate mapping for '{0}'")]
    DuplicateMapping(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_message_names_entity_and_view() {
        let err = Error::ReadOnlyEntity {
            entity: "OrderView",
            view: "OrderSummary",
        };

        assert_eq!(
            err.to_string(),
            "Entity 'OrderView' is mapped to view 'OrderSummary' and cannot be written"
        );
    }

    #[test]
    fn test_diesel_error_converts() {
        let err: Error = diesel::result::Error::NotFound.into();
        assert!(matches!(err, Error::Query(diesel::result::Error::NotFound)));
    }
}
