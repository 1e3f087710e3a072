#![forbid(unsafe_code)]

use anyhow::{Result, anyhow};
use lazy_static::lazy_static;
use log::{info, error, LevelFilter};
use serde::Deserialize;
use std::fs;
use structopt::StructOpt;

use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;

// See https://users.rust-lang.org/t/relationship-between-std-futures-futures-and-tokio/38077
// for a cogent explanation on dealing with futures and async programming in Rust.  More
// background can be found at https://rust-lang.github.io/async-book/.
use sqlx::{Pool, Postgres};
use futures::executor::block_on;

// Verse Server Utilities
use crate::utils::{db_init, errors::Errors};

// ***************************************************************************
//                                Constants
// ***************************************************************************
// Networking.
const DEFAULT_SERVER_ADDR  : &str = "0.0.0.0:8000";

// Database defaults, same as the postgres client library's.
const DEFAULT_PG_HOST      : &str = "localhost";
const DEFAULT_PG_PORT      : u16  = 5432;

// Logging pattern shared by all appenders.
const LOG_PATTERN          : &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l})} {t} - {m}{n}";

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Assign the command line arguments BEFORE RUNTIME_CTX is initialized in main.
lazy_static! {
    pub static ref SERVER_ARGS: ServerArgs = init_server_args();
}

// ***************************************************************************
//                               Config Structs
// ***************************************************************************
// ---------------------------------------------------------------------------
// CommandLineArgs:
// ---------------------------------------------------------------------------
#[derive(Debug, StructOpt)]
#[structopt(name = "verse_server", about = "Command line arguments for Verse Server.")]
pub struct ServerArgs {
    /// Path to the JSON configuration file.
    #[structopt(short = "c", long = "config", default_value = "config.json")]
    pub config: String,

    /// Print the server version and exit.
    #[structopt(short = "v", long = "version")]
    pub version: bool,

    /// Create the authors and poems tables before serving.
    ///
    /// Table creation is idempotent, so this flag is safe to pass on
    /// every start.
    #[structopt(long = "initdb")]
    pub initdb: bool,
}

// ---------------------------------------------------------------------------
// Parms:
// ---------------------------------------------------------------------------
#[derive(Debug)]
#[allow(dead_code)]
pub struct Parms {
    pub config_file: String,
    pub config: Config,
}

// ---------------------------------------------------------------------------
// RuntimeCtx:
// ---------------------------------------------------------------------------
#[derive(Debug)]
pub struct RuntimeCtx {
    pub parms: Parms,
    pub db: Pool<Postgres>,
}

// ---------------------------------------------------------------------------
// Config:
// ---------------------------------------------------------------------------
// The field renames reproduce the configuration file's historical key
// casing: top-level keys are capitalized, CORS keys are snake_case.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(rename = "PG")]
    pub pg: PgConfig,
    #[serde(rename = "CORS", default)]
    pub cors: CorsConfig,
    #[serde(rename = "Server", default = "default_server_addr")]
    pub server: String,
    #[serde(rename = "Debug", default)]
    pub debug: bool,
}

#[derive(Debug, Deserialize)]
pub struct PgConfig {
    #[serde(rename = "User")]
    pub user: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "Database")]
    pub database: String,
    #[serde(rename = "Host", default = "default_pg_host")]
    pub host: String,
    #[serde(rename = "Port", default = "default_pg_port")]
    pub port: u16,
}

// An absent CORS section denies every cross-origin request.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorsConfig {
    #[serde(default)]
    pub allow_origin: Vec<String>,
    #[serde(default)]
    pub allow_method: Vec<String>,
    #[serde(default)]
    pub allow_header: Vec<String>,
    #[serde(default)]
    pub allow_local: bool,
}

fn default_server_addr() -> String { DEFAULT_SERVER_ADDR.to_string() }
fn default_pg_host() -> String { DEFAULT_PG_HOST.to_string() }
fn default_pg_port() -> u16 { DEFAULT_PG_PORT }

// ***************************************************************************
//                            Argument Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_server_args:
// ---------------------------------------------------------------------------
/** Get the command line arguments. */
fn init_server_args() -> ServerArgs {
    ServerArgs::from_args()
}

// ***************************************************************************
//                               Log Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_log:
// ---------------------------------------------------------------------------
/** Initialize log4rs with a console appender.  The root level tracks the
 * configuration file's Debug flag.
 */
pub fn init_log(debug: bool) {
    let level = if debug { LevelFilter::Debug } else { LevelFilter::Info };
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();
    let logconfig = log4rs::config::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level));
    match logconfig {
        Ok(c) => {
            if let Err(e) = log4rs::init_config(c) {
                panic!("Log4rs initialization error: {}", e);
            }
        },
        Err(e) => panic!("Log4rs configuration error: {}", e),
    }
    info!("Log4rs initialized at level {}.", level);
}

// ***************************************************************************
//                             Parms Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// get_parms:
// ---------------------------------------------------------------------------
/** Retrieve the application parameters from the JSON configuration file
 * named on the command line, or from ./config.json when -c is omitted.
 */
fn get_parms() -> Result<Parms> {
    let config_file = SERVER_ARGS.config.clone();

    // Read the configuration file.
    let contents = match fs::read_to_string(&config_file) {
        Ok(c) => c,
        Err(e) => {
            let msg = format!("{}\n   {}", Errors::ReadingConfigFile(config_file), e);
            return Result::Err(anyhow!(msg));
        }
    };

    // Parse the JSON configuration.
    let config: Config = match serde_json::from_str(&contents) {
        Ok(c)  => c,
        Err(e) => {
            let msg = format!("{}\n   {}", Errors::JsonParseError(config_file), e);
            return Result::Err(anyhow!(msg));
        }
    };

    Ok(Parms { config_file, config })
}

// ***************************************************************************
//                             Config Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_runtime_context:
// ---------------------------------------------------------------------------
/** Load the configuration, bring up logging, and connect the database pool.
 * A missing or malformed configuration file is fatal: the error is printed
 * and the process exits with status 1.
 */
pub fn init_runtime_context() -> RuntimeCtx {
    let parms = match get_parms() {
        Ok(p) => p,
        Err(e) => {
            // Logging is not up yet, so write directly to stderr.
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    // Logging level depends on the configuration just read.
    init_log(parms.config.debug);

    // Connect the pool and optionally create the tables.
    let db = block_on(db_init::init_db(&parms.config.pg));
    if SERVER_ARGS.initdb {
        match block_on(db_init::create_tables(&db)) {
            Ok(_)  => info!("Created the authors and poems tables."),
            Err(e) => {
                let msg = Errors::VerseError(format!("table creation failed: {}", e));
                error!("{}", msg);
                panic!("{}", msg);
            }
        }
    }

    RuntimeCtx { parms, db }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use crate::utils::config::Config;

    const SAMPLE: &str = r#"{
        "PG": {"User": "verse", "Password": "secret", "Database": "versedb"},
        "CORS": {
            "allow_origin": ["example.com", "https://poems.example.org"],
            "allow_method": ["GET", "POST", "PUT", "DELETE"],
            "allow_header": ["Content-Type"],
            "allow_local": true
        },
        "Server": "127.0.0.1:9000",
        "Debug": true
    }"#;

    #[test]
    fn parse_full_config() {
        let config: Config = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(config.pg.user, "verse");
        assert_eq!(config.pg.database, "versedb");
        assert_eq!(config.pg.host, "localhost");
        assert_eq!(config.pg.port, 5432);
        assert_eq!(config.server, "127.0.0.1:9000");
        assert!(config.debug);
        assert_eq!(config.cors.allow_origin.len(), 2);
        assert!(config.cors.allow_local);
    }

    #[test]
    fn parse_minimal_config() {
        let raw = r#"{"PG": {"User": "u", "Password": "p", "Database": "d"}}"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(config.server, "0.0.0.0:8000");
        assert!(!config.debug);
        assert!(config.cors.allow_origin.is_empty());
        assert!(!config.cors.allow_local);
    }

    #[test]
    fn reject_malformed_config() {
        let raw = r#"{"PG": {"User": "u"#;
        assert!(serde_json::from_str::<Config>(raw).is_err());
    }
}
