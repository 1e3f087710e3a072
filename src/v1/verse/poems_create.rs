#![forbid(unsafe_code)]

use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, Object, ApiResponse };
use anyhow::Result;
use futures::executor::block_on;
use sqlx::Row;

use crate::utils::errors::HttpResult;
use crate::utils::db::author_exists;
use crate::utils::db_statements::INSERT_POEM;
use crate::utils::db_types::PoemInput;
use crate::utils::verse_utils::{self, timestamp_utc, timestamp_utc_to_str, RequestDebug};
use log::{error, info};

use crate::RUNTIME_CTX;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct PoemsCreateApi;

#[derive(Object)]
pub struct ReqCreatePoem
{
    title: String,
    content: Option<String>,
    author_id: i32,
}

#[derive(Object, Debug)]
pub struct RespCreatePoem
{
    result_code: String,
    result_msg: String,
    id: i32,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqCreatePoem {
    type Req = ReqCreatePoem;
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
    #[oai(status = 201)]
    Http201(Json<RespCreatePoem>),
    #[oai(status = 400)]
    Http400(Json<HttpResult>),
    #[oai(status = 404)]
    Http404(Json<HttpResult>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_201(resp: RespCreatePoem) -> VerseResponse {
    VerseResponse::Http201(Json(resp))
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
impl PoemsCreateApi {
    #[oai(path = "/poem", method = "post")]
    async fn create_poem(&self, http_req: &Request, req: Json<ReqCreatePoem>) -> VerseResponse {
        match RespCreatePoem::process(http_req, &req) {
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
impl RespCreatePoem {
    /// Create a new response.
    fn new(result_code: &str, result_msg: String, id: i32) -> Self {
        Self {result_code: result_code.to_string(), result_msg, id}
    }

    /// Process the request.
    fn process(http_req: &Request, req: &ReqCreatePoem) -> Result<VerseResponse, anyhow::Error> {
        // Conditional logging depending on log level.
        verse_utils::debug_request(http_req, req);

        // -------------------- Validate Input -----------------------
        if req.title.trim().is_empty() {
            let msg = "ERROR: The poem title cannot be empty.".to_string();
            error!("{}", msg);
            return Ok(make_http_400(msg));
        }

        // --------------------- Check Dependencies ------------------
        // The referenced author must exist so we can report a clean 404
        // rather than a foreign key violation.
        if !block_on(author_exists(req.author_id))? {
            let msg = format!("Author {} NOT FOUND - Poem not created", req.author_id);
            error!("{}", msg);
            return Ok(make_http_404(msg));
        }

        // ------------------------ Update Database ------------------
        // Use the same current UTC timestamp for both time columns.
        let now = timestamp_utc();
        let current_ts = timestamp_utc_to_str(now);

        // Create the input record.
        let input_record = PoemInput::new(
            req.title.clone(),
            req.content.clone().unwrap_or_default(),
            req.author_id,
            current_ts.clone(),
            current_ts,
        );

        // Insert the new poem record.
        let id = block_on(insert_poem(&input_record))?;

        // Log result and return response.
        let msg = format!("Poem '{}' created with id {}", input_record.title, id);
        info!("{}", msg);
        Ok(make_http_201(RespCreatePoem::new("0", msg, id)))
    }
}

// ***************************************************************************
//                          Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// insert_poem:
// ---------------------------------------------------------------------------
async fn insert_poem(rec: &PoemInput) -> Result<i32> {
    // Get a connection to the db and start a transaction.
    let mut tx = RUNTIME_CTX.db.begin().await?;

    // Issue the db insert call and take back the generated id.
    let row = sqlx::query(INSERT_POEM)
        .bind(&rec.title)
        .bind(&rec.content)
        .bind(rec.author_id)
        .bind(&rec.created)
        .bind(&rec.updated)
        .fetch_one(&mut *tx)
        .await?;
    let id: i32 = row.get(0);

    // Commit the transaction.
    tx.commit().await?;
    Ok(id)
}
