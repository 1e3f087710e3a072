#![forbid(unsafe_code)]

use poem_openapi::{ OpenApi, payload::Json, Object, param::Path, ApiResponse };
use anyhow::Result;
use futures::executor::block_on;

use crate::utils::errors::HttpResult;
use crate::utils::db_statements::DELETE_POEM;
use log::{error, info};

use crate::RUNTIME_CTX;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct PoemsDeleteApi;

#[derive(Object, Debug)]
pub struct RespDeletePoem
{
    result_code: String,
    result_msg: String,
    num_deleted: u32,
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum VerseResponse {
    #[oai(status = 200)]
    Http200(Json<RespDeletePoem>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_200(resp: RespDeletePoem) -> VerseResponse {
    VerseResponse::Http200(Json(resp))
}
fn make_http_500(msg: String) -> VerseResponse {
    VerseResponse::Http500(Json(HttpResult::new(500.to_string(), msg)))
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl PoemsDeleteApi {
    #[oai(path = "/poem/:id", method = "delete")]
    async fn delete_poem(&self, id: Path<i32>) -> VerseResponse {
        match RespDeletePoem::process(*id) {
            Ok(r) => r,
            Err(e) => {
                let msg = "ERROR: ".to_owned() + e.to_string().as_str();
                error!("{}", msg);
                make_http_500(msg)
            }
        }
    }
}

// ***************************************************************************
//                          Request/Response Methods
// ***************************************************************************
impl RespDeletePoem {
    /// Create a new response.
    fn new(result_code: &str, result_msg: String, num_deleted: u32) -> Self {
        Self {result_code: result_code.to_string(), result_msg, num_deleted}
    }

    /// Process the request.
    fn process(id: i32) -> Result<VerseResponse, anyhow::Error> {
        // Issue the delete call.
        let deletes = block_on(delete_poem(id))?;

        // Log result and return response.
        let msg =
            if deletes < 1 {format!("Poem {} NOT FOUND - Nothing deleted", id)}
            else {format!("Poem {} deleted", id)};
        info!("{}", msg);
        Ok(make_http_200(RespDeletePoem::new("0", msg, deletes as u32)))
    }
}

// ***************************************************************************
//                          Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// delete_poem:
// ---------------------------------------------------------------------------
async fn delete_poem(id: i32) -> Result<u64> {
    // Get a connection to the db and start a transaction.
    let mut tx = RUNTIME_CTX.db.begin().await?;

    // Issue the db delete call.
    let result = sqlx::query(DELETE_POEM)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    // Commit the transaction.
    tx.commit().await?;
    Ok(result.rows_affected())
}
