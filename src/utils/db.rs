#![forbid(unsafe_code)]

use anyhow::Result;

use crate::utils::db_statements::GET_AUTHOR_ID;
use crate::RUNTIME_CTX;

// ---------------------------------------------------------------------------
// author_exists:
// ---------------------------------------------------------------------------
/** Check that a poem's author_id references an existing author row.  Called
 * before poem inserts and updates so the caller can return a 404 instead of
 * surfacing a foreign key violation as a 500.
 */
pub async fn author_exists(author_id: i32) -> Result<bool> {
    // Get a connection to the db and start a transaction.  Uncommited transactions
    // are automatically rolled back when they go out of scope.
    // See https://docs.rs/sqlx/latest/sqlx/struct.Transaction.html.
    let mut tx = RUNTIME_CTX.db.begin().await?;

    let row = sqlx::query(GET_AUTHOR_ID)
        .bind(author_id)
        .fetch_optional(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(row.is_some())
}
