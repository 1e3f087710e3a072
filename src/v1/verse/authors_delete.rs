#![forbid(unsafe_code)]

use poem_openapi::{ OpenApi, payload::Json, Object, param::Path, ApiResponse };
use anyhow::Result;
use futures::executor::block_on;

use crate::utils::errors::HttpResult;
use crate::utils::db_statements::DELETE_AUTHOR;
use log::{error, info};

use crate::RUNTIME_CTX;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct AuthorsDeleteApi;

#[derive(Object, Debug)]
pub struct RespDeleteAuthor
{
    result_code: String,
    result_msg: String,
    num_deleted: u32,
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum VerseResponse {
    #[oai(status = 200)]
    Http200(Json<RespDeleteAuthor>),
    #[oai(status = 409)]
    Http409(Json<HttpResult>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_200(resp: RespDeleteAuthor) -> VerseResponse {
    VerseResponse::Http200(Json(resp))
}
fn make_http_409(msg: String) -> VerseResponse {
    VerseResponse::Http409(Json(HttpResult::new(409.to_string(), msg)))
}
fn make_http_500(msg: String) -> VerseResponse {
    VerseResponse::Http500(Json(HttpResult::new(500.to_string(), msg)))
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl AuthorsDeleteApi {
    #[oai(path = "/author/:id", method = "delete")]
    async fn delete_author(&self, id: Path<i32>) -> VerseResponse {
        match RespDeleteAuthor::process(*id) {
            Ok(r) => r,
            Err(e) => {
                // A foreign key violation means poems still reference the author.
                let msg = "ERROR: ".to_owned() + e.to_string().as_str();
                error!("{}", msg);
                if is_foreign_key_violation(&e) {
                    return make_http_409(
                        format!("Author {} still has poems and cannot be deleted.", *id));
                }
                make_http_500(msg)
            }
        }
    }
}

// ***************************************************************************
//                          Request/Response Methods
// ***************************************************************************
impl RespDeleteAuthor {
    /// Create a new response.
    fn new(result_code: &str, result_msg: String, num_deleted: u32) -> Self {
        Self {result_code: result_code.to_string(), result_msg, num_deleted}
    }

    /// Process the request.
    fn process(id: i32) -> Result<VerseResponse, anyhow::Error> {
        // Issue the delete call.
        let deletes = block_on(delete_author(id))?;

        // Log result and return response.  Deleting a missing author is not
        // an error, the response just reports zero deletions.
        let msg =
            if deletes < 1 {format!("Author {} NOT FOUND - Nothing deleted", id)}
            else {format!("Author {} deleted", id)};
        info!("{}", msg);
        Ok(make_http_200(RespDeleteAuthor::new("0", msg, deletes as u32)))
    }
}

// ***************************************************************************
//                          Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// is_foreign_key_violation:
// ---------------------------------------------------------------------------
// Postgres reports foreign key violations with SQLSTATE 23503.  Matching the
// code instead of the driver's message text survives message wording changes.
fn is_foreign_key_violation(e: &anyhow::Error) -> bool {
    match e.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => db_err.code().as_deref() == Some("23503"),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// delete_author:
// ---------------------------------------------------------------------------
async fn delete_author(id: i32) -> Result<u64> {
    // Get a connection to the db and start a transaction.
    let mut tx = RUNTIME_CTX.db.begin().await?;

    // Issue the db delete call.
    let result = sqlx::query(DELETE_AUTHOR)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    // Commit the transaction.
    tx.commit().await?;
    Ok(result.rows_affected())
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::is_foreign_key_violation;
    use anyhow::anyhow;

    #[test]
    fn non_database_errors_are_not_fk_violations() {
        assert!(!is_foreign_key_violation(&anyhow!("connection reset")));
        assert!(!is_foreign_key_violation(&anyhow::Error::from(sqlx::Error::RowNotFound)));
    }
}
