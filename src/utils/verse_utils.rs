#![forbid(unsafe_code)]

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, LevelFilter};
use poem::Request;

// ***************************************************************************
// GENERAL PUBLIC FUNCTIONS
// ***************************************************************************
// ---------------------------------------------------------------------------
// timestamp_utc:
// ---------------------------------------------------------------------------
/** Get the current UTC timestamp */
pub fn timestamp_utc() -> DateTime<Utc> {
    Utc::now()
}

// ---------------------------------------------------------------------------
// timestamp_utc_to_str:
// ---------------------------------------------------------------------------
/** Convert a UTC datetime to rfc3339 format with microsecond precision, which
 * looks like this:  2022-09-13T14:14:42.719849Z
 */
pub fn timestamp_utc_to_str(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ***************************************************************************
// REQUEST LOGGING
// ***************************************************************************
// ---------------------------------------------------------------------------
// RequestDebug:
// ---------------------------------------------------------------------------
// Implemented by request payload types so their contents can be dumped to
// the log when debug logging is in effect.
pub trait RequestDebug {
    type Req;
    fn get_request_info(&self) -> String;
}

// ---------------------------------------------------------------------------
// debug_request:
// ---------------------------------------------------------------------------
// Dump http request information to the log.
pub fn debug_request(http_req: &Request, req: &impl RequestDebug) {
    // Check that debug or higher logging is in effect.
    let level = log::max_level();
    if level < LevelFilter::Debug {
        return;
    }

    // Accumulate the output.
    let mut s = "\n".to_string();
    s += format!("  URI: {:?}\n", http_req.uri()).as_str();
    s += format!("  Method: {}\n", http_req.method()).as_str();
    s += req.get_request_info().as_str();
    debug!("{}", s);
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_rfc3339_utc() {
        let s = timestamp_utc_to_str(timestamp_utc());
        assert!(s.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&s).is_ok());
    }
}
