#![forbid(unsafe_code)]

use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, Object, param::Path, ApiResponse };
use anyhow::Result;
use futures::executor::block_on;

use crate::utils::errors::HttpResult;
use crate::utils::db_statements::UPDATE_AUTHOR;
use crate::utils::verse_utils::{self, timestamp_utc, timestamp_utc_to_str, RequestDebug};
use log::{error, info};

use crate::RUNTIME_CTX;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct AuthorsUpdateApi;

#[derive(Object)]
pub struct ReqUpdateAuthor
{
    name: String,
    description: Option<String>,
}

#[derive(Object, Debug)]
pub struct RespUpdateAuthor
{
    result_code: String,
    result_msg: String,
    num_updated: u32,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqUpdateAuthor {
    type Req = ReqUpdateAuthor;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Request body:");
        s.push_str("\n    name: ");
        s.push_str(&self.name);
        s.push_str("\n    description: ");
        s.push_str(self.description.as_deref().unwrap_or("None"));
        s
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum VerseResponse {
    #[oai(status = 200)]
    Http200(Json<RespUpdateAuthor>),
    #[oai(status = 400)]
    Http400(Json<HttpResult>),
    #[oai(status = 404)]
    Http404(Json<HttpResult>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_200(resp: RespUpdateAuthor) -> VerseResponse {
    VerseResponse::Http200(Json(resp))
}
fn make_http_400(msg: String) -> VerseResponse {
    VerseResponse::Http400(Json(HttpResult::new(400.to_string(), msg)))
}
fn make_http_404(msg: String) -> VerseResponse {
    VerseResponse::Http404(Json(HttpResult::new(404.to_string(), msg)))
}
fn make_http_500(msg: String) -> VerseResponse {
    VerseResponse::Http500(Json(HttpResult::new(500.to_string(), msg)))
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl AuthorsUpdateApi {
    #[oai(path = "/author/:id", method = "put")]
    async fn update_author(&self, http_req: &Request, id: Path<i32>, req: Json<ReqUpdateAuthor>) -> VerseResponse {
        match RespUpdateAuthor::process(http_req, *id, &req) {
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
impl RespUpdateAuthor {
    /// Create a new response.
    fn new(result_code: &str, result_msg: String, num_updated: u32) -> Self {
        Self {result_code: result_code.to_string(), result_msg, num_updated}
    }

    /// Process the request.
    fn process(http_req: &Request, id: i32, req: &ReqUpdateAuthor) -> Result<VerseResponse, anyhow::Error> {
        // Conditional logging depending on log level.
        verse_utils::debug_request(http_req, req);

        // -------------------- Validate Input -----------------------
        if req.name.trim().is_empty() {
            let msg = "ERROR: The author name cannot be empty.".to_string();
            error!("{}", msg);
            return Ok(make_http_400(msg));
        }

        // ------------------------ Update Database ------------------
        let updates = block_on(update_author(id, req))?;
        if updates < 1 {
            let msg = format!("Author {} NOT FOUND - Nothing updated", id);
            error!("{}", msg);
            return Ok(make_http_404(msg));
        }

        // Log result and return response.
        let msg = format!("Author {} updated", id);
        info!("{}", msg);
        Ok(make_http_200(RespUpdateAuthor::new("0", msg, updates as u32)))
    }
}

// ***************************************************************************
//                          Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// update_author:
// ---------------------------------------------------------------------------
async fn update_author(id: i32, req: &ReqUpdateAuthor) -> Result<u64> {
    // Get a connection to the db and start a transaction.
    let mut tx = RUNTIME_CTX.db.begin().await?;

    // Refresh the updated column along with the caller's values.
    let current_ts = timestamp_utc_to_str(timestamp_utc());

    // Issue the db update call.
    let result = sqlx::query(UPDATE_AUTHOR)
        .bind(&req.name)
        .bind(req.description.clone().unwrap_or_default())
        .bind(&current_ts)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    // Commit the transaction.
    tx.commit().await?;
    Ok(result.rows_affected())
}
