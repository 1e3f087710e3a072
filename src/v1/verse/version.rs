#![forbid(unsafe_code)]

use poem_openapi::{  OpenApi, payload::Json, Object };
use poem::Error;

// From cargo.toml.
const SERVER_VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct VersionApi;

#[derive(Object)]
struct RespVersion
{
    result_code: String,
    result_msg: String,
    server_version: String,
    build_timestamp: String,
    rustc_version: String,
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl VersionApi {
    #[oai(path = "/version", method = "get")]
    async fn get_version(&self) -> Json<RespVersion> {
        let resp = match RespVersion::process() {
            Ok(r) => r,
            Err(e) => {
                let msg = "ERROR: ".to_owned() + e.to_string().as_str();
                RespVersion::new("1", msg.as_str(), "", "", "")},
        };

        Json(resp)
    }
}

// ***************************************************************************
//                          Request/Response Methods
// ***************************************************************************
impl RespVersion {
    fn new(result_code: &str, result_msg: &str, version: &str, build_ts: &str, rustc: &str)
    -> Self {
        Self {result_code: result_code.to_string(),
              result_msg: result_msg.to_string(),
              server_version: version.to_string(),
              build_timestamp: build_ts.to_string(),
              rustc_version: rustc.to_string(),
        }
    }

    fn process() -> Result<RespVersion, Error> {
        Ok(Self::new("0",
                    "success",
                    SERVER_VERSION.unwrap_or("unknown"),
                    env!("BUILD_TIMESTAMP"),
                    env!("RUSTC_VERSION")),
        )
    }
}
