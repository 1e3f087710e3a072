#![forbid(unsafe_code)]

use poem_openapi::{ OpenApi, payload::Json, Object, param::Query, ApiResponse };
use anyhow::Result;
use futures::executor::block_on;
use sqlx::Row;

use crate::utils::errors::HttpResult;
use crate::utils::db_statements::{LIST_POEMS, LIST_POEMS_BY_AUTHOR};
use log::error;

use crate::RUNTIME_CTX;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct PoemsListApi;

#[derive(Object, Debug)]
pub struct PoemListElement
{
    id: i32,
    title: String,
    content: String,
    author_id: i32,
    created: String,
    updated: String,
}

#[derive(Object, Debug)]
pub struct RespPoemsList
{
    result_code: String,
    result_msg: String,
    num_poems: i32,
    poems: Vec<PoemListElement>,
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum VerseResponse {
    #[oai(status = 200)]
    Http200(Json<RespPoemsList>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_200(resp: RespPoemsList) -> VerseResponse {
    VerseResponse::Http200(Json(resp))
}
fn make_http_500(msg: String) -> VerseResponse {
    VerseResponse::Http500(Json(HttpResult::new(500.to_string(), msg)))
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl PoemsListApi {
    /// List all poems, optionally restricted to a single author.
    #[oai(path = "/poem", method = "get")]
    async fn list_poems(&self, author_id: Query<Option<i32>>) -> VerseResponse {
        match RespPoemsList::process(author_id.0) {
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
impl RespPoemsList {
    /// Process the request.
    fn process(author_id: Option<i32>) -> Result<VerseResponse, anyhow::Error> {
        let poems = block_on(list_poems(author_id))?;
        let num_poems = poems.len() as i32;
        Ok(make_http_200(RespPoemsList {
            result_code: "0".to_string(),
            result_msg: "success".to_string(),
            num_poems,
            poems,
        }))
    }
}

// ***************************************************************************
//                          Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// list_poems:
// ---------------------------------------------------------------------------
async fn list_poems(author_id: Option<i32>) -> Result<Vec<PoemListElement>> {
    // Get a connection to the db and start a transaction.
    let mut tx = RUNTIME_CTX.db.begin().await?;

    // Issue the db select call, filtered when an author is given.
    let rows = match author_id {
        Some(aid) => {
            sqlx::query(LIST_POEMS_BY_AUTHOR)
                .bind(aid)
                .fetch_all(&mut *tx)
                .await?
        },
        None => {
            sqlx::query(LIST_POEMS)
                .fetch_all(&mut *tx)
                .await?
        },
    };

    // Commit the transaction.
    tx.commit().await?;

    // Collect the row data into element objects.
    let mut element_list: Vec<PoemListElement> = vec!();
    for row in rows {
        element_list.push(PoemListElement {
            id: row.get(0),
            title: row.get(1),
            content: row.get(2),
            author_id: row.get(3),
            created: row.get(4),
            updated: row.get(5),
        });
    }

    Ok(element_list)
}
