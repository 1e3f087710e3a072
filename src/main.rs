#![forbid(unsafe_code)]

use lazy_static::lazy_static;
use log::info;
use poem::{listener::TcpListener, EndpointExt, Route};
use poem_openapi::OpenApiService;

// Verse Server Utilities
use crate::utils::config::{init_runtime_context, RuntimeCtx, SERVER_ARGS};
use crate::utils::cors::Cors;
use crate::utils::errors::Errors;
use crate::v1::verse::authors_create::AuthorsCreateApi;
use crate::v1::verse::authors_delete::AuthorsDeleteApi;
use crate::v1::verse::authors_get::AuthorsGetApi;
use crate::v1::verse::authors_list::AuthorsListApi;
use crate::v1::verse::authors_update::AuthorsUpdateApi;
use crate::v1::verse::poems_create::PoemsCreateApi;
use crate::v1::verse::poems_delete::PoemsDeleteApi;
use crate::v1::verse::poems_get::PoemsGetApi;
use crate::v1::verse::poems_list::PoemsListApi;
use crate::v1::verse::poems_update::PoemsUpdateApi;
use crate::v1::verse::version::VersionApi;

// Modules
mod utils;
mod v1;

// ***************************************************************************
//                                Constants
// ***************************************************************************
const SERVER_NAME : &str = "VerseServer"; // for poem logging

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Lazily initialize the runtime context so that it has a 'static lifetime.
// First dereference reads the configuration file, brings up logging and
// connects the database pool.  We exit if we can't read our parameters or
// access the database.
lazy_static! {
    static ref RUNTIME_CTX: RuntimeCtx = init_runtime_context();
}

// ---------------------------------------------------------------------------
// main:
// ---------------------------------------------------------------------------
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    // The -v flag prints the version and exits before any configuration
    // file is touched.
    if SERVER_ARGS.version {
        println!("version: {}", option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"));
        return Ok(());
    }

    // --------------- Initialize Server --------------
    // Announce ourselves.
    println!("Starting verse_server!");

    // Initialize the server.
    verse_init();

    // --------------- Main Loop Set Up ---------------
    // Assign base URL.
    let api_url = format!("http://{}{}", RUNTIME_CTX.parms.config.server, "/api");

    // Create a tuple with every endpoint struct registered with poem-openapi.
    let endpoints = (AuthorsCreateApi, AuthorsGetApi, AuthorsListApi,
                     AuthorsUpdateApi, AuthorsDeleteApi,
                     PoemsCreateApi, PoemsGetApi, PoemsListApi,
                     PoemsUpdateApi, PoemsDeleteApi, VersionApi);
    let api_service =
        OpenApiService::new(endpoints, "Verse Server",
                            option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"))
            .server(api_url);

    // Allow the generated openapi specs to be retrieved from the server.
    let spec = api_service.spec_endpoint();
    let spec_yaml = api_service.spec_endpoint_yaml();

    // Create the routes, wrap everything with the CORS policy and run the
    // server.  The policy is an immutable value captured by the middleware.
    let cors = Cors::new(&RUNTIME_CTX.parms.config.cors);
    let ui = api_service.swagger_ui();
    let app = Route::new()
        .nest("/api", api_service)
        .nest("/", ui)
        .at("/spec", spec)
        .at("/spec_yaml", spec_yaml)
        .with(cors);

    // ------------------ Main Loop -------------------
    let addr = RUNTIME_CTX.parms.config.server.clone();
    poem::Server::new(TcpListener::bind(addr))
        .name(SERVER_NAME)
        .run(app)
        .await
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// verse_init:
// ---------------------------------------------------------------------------
/** Initialize all subsystems and data structures other than those needed
 * to configure the main loop processor.
 */
fn verse_init() {
    // Force the reading of input parameters and initialization of the runtime
    // context.  The runtime context also initializes logging and the database,
    // which makes db connections available to all modules.
    info!("{}", Errors::InputParms(format!("{:#?}", *RUNTIME_CTX)));

    // Log build info.
    print_version_info();
}

// ---------------------------------------------------------------------------
// print_version_info:
// ---------------------------------------------------------------------------
fn print_version_info() {
    // Log build info.
    info!("{}.", format!("\n*** Running VERSE={}, BUILD_TS={}, RUSTC={}",
                        option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
                        env!("BUILD_TIMESTAMP"),
                        env!("RUSTC_VERSION")),
    );
}
