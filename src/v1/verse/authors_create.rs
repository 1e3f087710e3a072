#![forbid(unsafe_code)]

use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, Object, ApiResponse };
use anyhow::Result;
use futures::executor::block_on;

use crate::utils::errors::HttpResult;
use crate::utils::db_statements::INSERT_AUTHOR;
use crate::utils::db_types::AuthorInput;
use crate::utils::verse_utils::{self, timestamp_utc, timestamp_utc_to_str, RequestDebug};
use log::{error, info};
use sqlx::Row;

use crate::RUNTIME_CTX;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct AuthorsCreateApi;

#[derive(Object)]
pub struct ReqCreateAuthor
{
    name: String,
    description: Option<String>,
}

#[derive(Object, Debug)]
pub struct RespCreateAuthor
{
    result_code: String,
    result_msg: String,
    id: i32,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqCreateAuthor {
    type Req = ReqCreateAuthor;
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
    #[oai(status = 201)]
    Http201(Json<RespCreateAuthor>),
    #[oai(status = 400)]
    Http400(Json<HttpResult>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_201(resp: RespCreateAuthor) -> VerseResponse {
    VerseResponse::Http201(Json(resp))
}
fn make_http_400(msg: String) -> VerseResponse {
    VerseResponse::Http400(Json(HttpResult::new(400.to_string(), msg)))
}
fn make_http_500(msg: String) -> VerseResponse {
    VerseResponse::Http500(Json(HttpResult::new(500.to_string(), msg)))
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl AuthorsCreateApi {
    #[oai(path = "/author", method = "post")]
    async fn create_author(&self, http_req: &Request, req: Json<ReqCreateAuthor>) -> VerseResponse {
        match RespCreateAuthor::process(http_req, &req) {
            Ok(r) => r,
            Err(e) => {
                // Assume a server fault if a raw error came through.
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
impl RespCreateAuthor {
    /// Create a new response.
    fn new(result_code: &str, result_msg: String, id: i32) -> Self {
        Self {result_code: result_code.to_string(), result_msg, id}
    }

    /// Process the request.
    fn process(http_req: &Request, req: &ReqCreateAuthor) -> Result<VerseResponse, anyhow::Error> {
        // Conditional logging depending on log level.
        verse_utils::debug_request(http_req, req);

        // -------------------- Validate Input -----------------------
        if req.name.trim().is_empty() {
            let msg = "ERROR: The author name cannot be empty.".to_string();
            error!("{}", msg);
            return Ok(make_http_400(msg));
        }

        // ------------------------ Update Database ------------------
        // Use the same current UTC timestamp for both time columns.
        let now = timestamp_utc();
        let current_ts = timestamp_utc_to_str(now);

        // Create the input record.
        let input_record = AuthorInput::new(
            req.name.clone(),
            req.description.clone().unwrap_or_default(),
            current_ts.clone(),
            current_ts,
        );

        // Insert the new author record.
        let id = block_on(insert_author(&input_record))?;

        // Log result and return response.
        let msg = format!("Author {} created with id {}", input_record.name, id);
        info!("{}", msg);
        Ok(make_http_201(RespCreateAuthor::new("0", msg, id)))
    }
}

// ***************************************************************************
//                          Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// insert_author:
// ---------------------------------------------------------------------------
async fn insert_author(rec: &AuthorInput) -> Result<i32> {
    // Get a connection to the db and start a transaction.  Uncommited transactions
    // are automatically rolled back when they go out of scope.
    // See https://docs.rs/sqlx/latest/sqlx/struct.Transaction.html.
    let mut tx = RUNTIME_CTX.db.begin().await?;

    // Issue the db insert call and take back the generated id.
    let row = sqlx::query(INSERT_AUTHOR)
        .bind(&rec.name)
        .bind(&rec.description)
        .bind(&rec.created)
        .bind(&rec.updated)
        .fetch_one(&mut *tx)
        .await?;
    let id: i32 = row.get(0);

    // Commit the transaction.
    tx.commit().await?;
    Ok(id)
}
