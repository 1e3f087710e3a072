#![forbid(unsafe_code)]

use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, Object, param::Path, ApiResponse };
use anyhow::Result;
use futures::executor::block_on;
use sqlx::Row;

use crate::utils::errors::HttpResult;
use crate::utils::db_statements::GET_AUTHOR;
use crate::utils::db_types::Author;
use log::{error, info};

use crate::RUNTIME_CTX;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct AuthorsGetApi;

#[derive(Object, Debug)]
pub struct RespGetAuthor
{
    result_code: String,
    result_msg: String,
    id: i32,
    name: String,
    description: String,
    created: String,
    updated: String,
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum VerseResponse {
    #[oai(status = 200)]
    Http200(Json<RespGetAuthor>),
    #[oai(status = 404)]
    Http404(Json<HttpResult>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_200(resp: RespGetAuthor) -> VerseResponse {
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
impl AuthorsGetApi {
    #[oai(path = "/author/:id", method = "get")]
    async fn get_author(&self, _http_req: &Request, id: Path<i32>) -> VerseResponse {
        match RespGetAuthor::process(*id) {
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
impl RespGetAuthor {
    /// Create a new response from a database row.
    fn new(result_code: &str, result_msg: String, author: Author) -> Self {
        Self {result_code: result_code.to_string(), result_msg,
              id: author.id, name: author.name, description: author.description,
              created: author.created, updated: author.updated}
    }

    /// Process the request.
    fn process(id: i32) -> Result<VerseResponse, anyhow::Error> {
        // Fetch the author record if it exists.
        let author = block_on(select_author(id))?;
        match author {
            Some(a) => {
                info!("Author {} retrieved.", id);
                Ok(make_http_200(RespGetAuthor::new("0", "success".to_string(), a)))
            },
            None => {
                let msg = format!("Author {} NOT FOUND", id);
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
// select_author:
// ---------------------------------------------------------------------------
async fn select_author(id: i32) -> Result<Option<Author>> {
    // Get a connection to the db and start a transaction.
    let mut tx = RUNTIME_CTX.db.begin().await?;

    // Issue the db select call.
    let row = sqlx::query(GET_AUTHOR)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

    // Commit the transaction.
    tx.commit().await?;

    // Collect the row data into an author object.
    Ok(row.map(|r| Author::new(r.get(0), r.get(1), r.get(2), r.get(3), r.get(4))))
}
