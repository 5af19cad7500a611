//! Conventions shared by every repository.
//!
//! Ids are `INTEGER PRIMARY KEY AUTOINCREMENT` values assigned by SQLite.
//! Entities that were never stored have `id == None`; passing one where a
//! stored row is required is an `InvalidArgument`, distinct from `NotFound`.

use sqlx::sqlite::SqliteQueryResult;

use crate::errors::AppError;

/// The id of a stored entity, or `InvalidArgument` if it has none.
pub fn require_id(id: Option<i64>, entity: &str) -> Result<i64, AppError> {
    id.ok_or_else(|| AppError::InvalidArgument(format!("{} without id passed", entity)))
}

pub(crate) fn not_found(entity: &str, id: i64) -> AppError {
    AppError::NotFound(format!("{} {} not found", entity, id))
}

/// Turn a write that matched no row into `NotFound`.
pub(crate) fn ensure_affected(
    result: &SqliteQueryResult,
    entity: &str,
    id: i64,
) -> Result<(), AppError> {
    if result.rows_affected() == 0 {
        tracing::warn!("{} {} matched no row", entity, id);
        return Err(not_found(entity, id));
    }
    Ok(())
}

/// SQLite stores booleans as integers.
pub(crate) fn flag(value: i32) -> bool {
    value != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_id_distinguishes_missing_id() {
        assert_eq!(require_id(Some(3), "Group").unwrap(), 3);
        assert!(matches!(
            require_id(None, "Group"),
            Err(AppError::InvalidArgument(_))
        ));
    }
}
