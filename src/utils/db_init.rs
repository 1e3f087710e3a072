#![forbid(unsafe_code)]

use anyhow::Result;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};

use log::{info, error};
use crate::utils::config::PgConfig;
use crate::utils::db_statements::{CREATE_AUTHORS_TABLE, CREATE_POEMS_TABLE};
use crate::utils::errors::Errors;

// Database constants.
const POOL_MIN_CONNECTIONS: u32 = 2;
const POOL_MAX_CONNECTIONS: u32 = 8;

// ---------------------------------------------------------------------------
// init_db:
// ---------------------------------------------------------------------------
/** Create the postgres connection pool from the PG section of the
 * configuration file.  Pool creation failure is fatal since nothing the
 * server does works without the database.
 */
pub async fn init_db(config: &PgConfig) -> Pool<Postgres> {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database);

    let db = match PgPoolOptions::new()
        .min_connections(POOL_MIN_CONNECTIONS)
        .max_connections(POOL_MAX_CONNECTIONS)
        .connect_with(options)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            let msg = Errors::VerseError(
                format!("unable to connect to database {}: {}", config.database, e));
            error!("{}", msg);
            panic!("{}", msg);
        }
    };

    info!("Connected to database {} at {}:{}.", config.database, config.host, config.port);
    db
}

// ---------------------------------------------------------------------------
// create_tables:
// ---------------------------------------------------------------------------
/** Create the authors and poems tables.  Both statements use IF NOT EXISTS,
 * so running with --initdb against an initialized database is a no-op.
 * Authors are created first because poems carry the foreign key.
 */
pub async fn create_tables(db: &Pool<Postgres>) -> Result<()> {
    for stmt in [CREATE_AUTHORS_TABLE, CREATE_POEMS_TABLE] {
        sqlx::query(stmt).execute(db).await?;
    }
    Ok(())
}
