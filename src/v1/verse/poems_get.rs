#![forbid(unsafe_code)]

use poem_openapi::{ OpenApi, payload::Json, Object, param::Path, ApiResponse };
use anyhow::Result;
use futures::executor::block_on;
use sqlx::Row;

use crate::utils::errors::HttpResult;
use crate::utils::db_statements::GET_POEM;
use crate::utils::db_types::Poem;
use log::{error, info};

use crate::RUNTIME_CTX;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct PoemsGetApi;

#[derive(Object, Debug)]
pub struct RespGetPoem
{
    result_code: String,
    result_msg: String,
    id: i32,
    title: String,
    content: String,
    author_id: i32,
    created: String,
    updated: String,
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum VerseResponse {
    #[oai(status = 200)]
    Http200(Json<RespGetPoem>),
    #[oai(status = 404)]
    Http404(Json<HttpResult>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_200(resp: RespGetPoem) -> VerseResponse {
    VerseResponse::Http200(Json(resp))
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
impl PoemsGetApi {
    #[oai(path = "/poem/:id", method = "get")]
    async fn get_poem(&self, id: Path<i32>) -> VerseResponse {
        match RespGetPoem::process(*id) {
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
impl RespGetPoem {
    /// Create a new response from a database row.
    fn new(result_code: &str, result_msg: String, poem: Poem) -> Self {
        Self {result_code: result_code.to_string(), result_msg,
              id: poem.id, title: poem.title, content: poem.content,
              author_id: poem.author_id, created: poem.created, updated: poem.updated}
    }

    /// Process the request.
    fn process(id: i32) -> Result<VerseResponse, anyhow::Error> {
        // Fetch the poem record if it exists.
        let poem = block_on(select_poem(id))?;
        match poem {
            Some(p) => {
                info!("Poem {} retrieved.", id);
                Ok(make_http_200(RespGetPoem::new("0", "success".to_string(), p)))
            },
            None => {
                let msg = format!("Poem {} NOT FOUND", id);
                error!("{}", msg);
                Ok(make_http_404(msg))
            },
        }
    }
}

// ***************************************************************************
//                          Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// select_poem:
// ---------------------------------------------------------------------------
async fn select_poem(id: i32) -> Result<Option<Poem>> {
    // Get a connection to the db and start a transaction.
    let mut tx = RUNTIME_CTX.db.begin().await?;

    // Issue the db select call.
    let row = sqlx::query(GET_POEM)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

    // Commit the transaction.
    tx.commit().await?;

    // Collect the row data into a poem object.
    Ok(row.map(|r| Poem::new(r.get(0), r.get(1), r.get(2), r.get(3), r.get(4), r.get(5))))
}
