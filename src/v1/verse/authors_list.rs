#![forbid(unsafe_code)]

use poem_openapi::{ OpenApi, payload::Json, Object, ApiResponse };
use anyhow::Result;
use futures::executor::block_on;
use sqlx::Row;

use crate::utils::errors::HttpResult;
use crate::utils::db_statements::LIST_AUTHORS;
use log::error;

use crate::RUNTIME_CTX;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct AuthorsListApi;

#[derive(Object, Debug)]
pub struct AuthorListElement
{
    id: i32,
    name: String,
    description: String,
    created: String,
    updated: String,
}

#[derive(Object, Debug)]
pub struct RespAuthorsList
{
    result_code: String,
    result_msg: String,
    num_authors: i32,
    authors: Vec<AuthorListElement>,
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum VerseResponse {
    #[oai(status = 200)]
    Http200(Json<RespAuthorsList>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_200(resp: RespAuthorsList) -> VerseResponse {
    VerseResponse::Http200(Json(resp))
}
fn make_http_500(msg: String) -> VerseResponse {
    VerseResponse::Http500(Json(HttpResult::new(500.to_string(), msg)))
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl AuthorsListApi {
    #[oai(path = "/author", method = "get")]
    async fn list_authors(&self) -> VerseResponse {
        match RespAuthorsList::process() {
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
impl RespAuthorsList {
    /// Process the request.
    fn process() -> Result<VerseResponse, anyhow::Error> {
        let authors = block_on(list_authors())?;
        let num_authors = authors.len() as i32;
        Ok(make_http_200(RespAuthorsList {
            result_code: "0".to_string(),
            result_msg: "success".to_string(),
            num_authors,
            authors,
        }))
    }
}

// ***************************************************************************
//                          Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// list_authors:
// ---------------------------------------------------------------------------
async fn list_authors() -> Result<Vec<AuthorListElement>> {
    // Get a connection to the db and start a transaction.
    let mut tx = RUNTIME_CTX.db.begin().await?;

    // Issue the db select call.
    let rows = sqlx::query(LIST_AUTHORS)
        .fetch_all(&mut *tx)
        .await?;

    // Commit the transaction.
    tx.commit().await?;

    // Collect the row data into element objects.
    let mut element_list: Vec<AuthorListElement> = vec!();
    for row in rows {
        element_list.push(AuthorListElement {
            id: row.get(0),
            name: row.get(1),
            description: row.get(2),
            created: row.get(3),
            updated: row.get(4),
        });
    }

    Ok(element_list)
}
