#![forbid(unsafe_code)]

use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, Object, param::Path, ApiResponse };
use anyhow::Result;
use futures::executor::block_on;

use crate::utils::errors::HttpResult;
use crate::utils::db::author_exists;
use crate::utils::db_statements::UPDATE_POEM;
use crate::utils::verse_utils::{self, timestamp_utc, timestamp_utc_to_str, RequestDebug};
use log::{error, info};

use crate::RUNTIME_CTX;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct PoemsUpdateApi;

#[derive(Object)]
pub struct ReqUpdatePoem
{
    title: String,
    content: Option<String>,
    author_id: i32,
}

#[derive(Object, Debug)]
pub struct RespUpdatePoem
{
    result_code: String,
    result_msg: String,
    num_updated: u32,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqUpdatePoem {
    type Req = ReqUpdatePoem;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Request body:");
        s.push_str("\n    title: ");
        s.push_str(&self.title);
        s.push_str("\n    author_id: ");
        s.push_str(&self.author_id.to_string());
        s.push_str("\n    content length: ");
        s.push_str(&self.content.as_deref().unwrap_or("").len().to_string());
        s
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum VerseResponse {
    #[oai(status = 200)]
    Http200(Json<RespUpdatePoem>),
    #[oai(status = 400)]
    Http400(Json<HttpResult>),
    #[oai(status = 404)]
    Http404(Json<HttpResult>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_200(resp: RespUpdatePoem) -> VerseResponse {
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
impl PoemsUpdateApi {
    #[oai(path = "/poem/:id", method = "put")]
    async fn update_poem(&self, http_req: &Request, id: Path<i32>, req: Json<ReqUpdatePoem>) -> VerseResponse {
        match RespUpdatePoem::process(http_req, *id, &req) {
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
impl RespUpdatePoem {
    /// Create a new response.
    fn new(result_code: &str, result_msg: String, num_updated: u32) -> Self {
        Self {result_code: result_code.to_string(), result_msg, num_updated}
    }

    /// Process the request.
    fn process(http_req: &Request, id: i32, req: &ReqUpdatePoem) -> Result<VerseResponse, anyhow::Error> {
        // Conditional logging depending on log level.
        verse_utils::debug_request(http_req, req);

        // -------------------- Validate Input -----------------------
        if req.title.trim().is_empty() {
            let msg = "ERROR: The poem title cannot be empty.".to_string();
            error!("{}", msg);
            return Ok(make_http_400(msg));
        }

        // --------------------- Check Dependencies ------------------
        // The poem may be repointed at another author, which must exist.
        if !block_on(author_exists(req.author_id))? {
            let msg = format!("Author {} NOT FOUND - Poem not updated", req.author_id);
            error!("{}", msg);
            return Ok(make_http_404(msg));
        }

        // ------------------------ Update Database ------------------
        let updates = block_on(update_poem(id, req))?;
        if updates < 1 {
            let msg = format!("Poem {} NOT FOUND - Nothing updated", id);
            error!("{}", msg);
            return Ok(make_http_404(msg));
        }

        // Log result and return response.
        let msg = format!("Poem {} updated", id);
        info!("{}", msg);
        Ok(make_http_200(RespUpdatePoem::new("0", msg, updates as u32)))
    }
}

// ***************************************************************************
//                          Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// update_poem:
// ---------------------------------------------------------------------------
async fn update_poem(id: i32, req: &ReqUpdatePoem) -> Result<u64> {
    // Get a connection to the db and start a transaction.
    let mut tx = RUNTIME_CTX.db.begin().await?;

    // Refresh the updated column along with the caller's values.
    let current_ts = timestamp_utc_to_str(timestamp_utc());

    // Issue the db update call.
    let result = sqlx::query(UPDATE_POEM)
        .bind(&req.title)
        .bind(req.content.clone().unwrap_or_default())
        .bind(req.author_id)
        .bind(&current_ts)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    // Commit the transaction.
    tx.commit().await?;
    Ok(result.rows_affected())
}
