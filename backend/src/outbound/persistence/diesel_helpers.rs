//! Error mapping shared by the Diesel adapters.
//!
//! Raw Diesel and pool errors never cross into the domain. Everything is
//! logged at debug level with the failing operation and converted into a
//! [`StoreError`].

use tracing::debug;

use crate::domain::ports::StoreError;

use super::pool::PoolError;

/// Map pool checkout and build failures to connection errors.
pub fn map_pool_error(error: PoolError) -> StoreError {
    debug!(error = %error, "connection pool failure");
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            StoreError::connection(message)
        }
    }
}

/// Map Diesel errors to store errors, tagging them with `operation`.
pub fn map_diesel_error(error: diesel::result::Error, operation: &str) -> StoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), %operation, "diesel operation failed");
        }
        _ => debug!(error = %error, %operation, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
        | DieselError::BrokenTransactionManager => {
            StoreError::connection(format!("{operation}: database connection error"))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            StoreError::query(format!(
                "{operation}: foreign key violation on {}",
                info.constraint_name().unwrap_or("unknown constraint")
            ))
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            StoreError::query(format!(
                "{operation}: unique violation on {}",
                info.constraint_name().unwrap_or("unknown constraint")
            ))
        }
        DieselError::NotFound => StoreError::query(format!("{operation}: record not found")),
        _ => StoreError::query(format!("{operation}: database error")),
    }
}

/// Bind `operation` for use with `map_err`.
pub fn diesel_error(operation: &'static str) -> impl Fn(diesel::result::Error) -> StoreError {
    move |error| map_diesel_error(error, operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    #[rstest]
    fn pool_errors_become_connection_errors() {
        let err = map_pool_error(PoolError::checkout("timed out"));
        assert_eq!(err, StoreError::connection("timed out"));
    }

    #[rstest]
    fn not_found_names_the_operation() {
        let err = map_diesel_error(DieselError::NotFound, "find_user");
        assert_eq!(err, StoreError::query("find_user: record not found"));
    }

    #[rstest]
    fn closed_connections_are_connection_errors() {
        let err = map_diesel_error(
            DieselError::DatabaseError(
                DatabaseErrorKind::ClosedConnection,
                Box::new("server closed the connection".to_owned()),
            ),
            "insert_project",
        );
        assert!(matches!(err, StoreError::Connection { .. }));
    }

    #[rstest]
    fn other_database_errors_hide_driver_text() {
        let err = map_diesel_error(
            DieselError::DatabaseError(
                DatabaseErrorKind::Unknown,
                Box::new("relation \"projects\" does not exist".to_owned()),
            ),
            "list_projects",
        );
        assert_eq!(err, StoreError::query("list_projects: database error"));
    }
}
