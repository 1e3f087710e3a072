#![forbid(unsafe_code)]

use log::warn;
use poem::http::{header, header::HeaderName, HeaderValue, Method, StatusCode};
use poem::{Endpoint, IntoResponse, Middleware, Request, Response};

use crate::utils::config::CorsConfig;

// ***************************************************************************
//                               CORS Policy
// ***************************************************************************
// ---------------------------------------------------------------------------
// CorsPolicy:
// ---------------------------------------------------------------------------
/** The immutable cross-origin policy evaluated on every request.  Built once
 * from the configuration at startup and handed to the middleware by value;
 * nothing mutates it afterwards.
 */
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_local: bool,
    allow_origin: Vec<String>,
    // Comma-joined at construction so per-request work is two lookups.
    allow_methods: String,
    allow_headers: String,
}

impl CorsPolicy {
    /** Build the policy from the CORS section of the configuration file. */
    pub fn new(config: &CorsConfig) -> Self {
        Self {
            allow_local: config.allow_local,
            allow_origin: config.allow_origin.clone(),
            allow_methods: config.allow_method.join(","),
            allow_headers: config.allow_header.join(","),
        }
    }

    // -----------------------------------------------------------------------
    // is_authorized:
    // -----------------------------------------------------------------------
    /** Decide whether the literal Origin header value is granted cross-origin
     * access.  An absent Origin header arrives here as the empty string and
     * fails every comparison.
     *
     * The local check intentionally matches only the plain-HTTP scheme, so
     * an https://localhost origin is refused unless it appears in the
     * allow-list.  Allow-list entries without an "http" prefix are treated
     * as bare hosts and match under either scheme; entries with the prefix
     * must match the origin exactly.  Both behaviors are kept for
     * compatibility with existing deployments.
     */
    pub fn is_authorized(&self, request_origin: &str) -> bool {
        if self.allow_local
            && (request_origin.starts_with("http://127.0.0.1")
                || request_origin.starts_with("http://localhost"))
        {
            return true;
        }
        for origin in &self.allow_origin {
            if !origin.starts_with("http") {
                if format!("http://{}", origin) == request_origin {
                    return true;
                }
                if format!("https://{}", origin) == request_origin {
                    return true;
                }
            } else if origin == request_origin {
                return true;
            }
        }
        false
    }

    // -----------------------------------------------------------------------
    // apply:
    // -----------------------------------------------------------------------
    /** Inject the CORS response headers.  The allow-origin header reflects
     * the request origin and is only present when the origin is authorized;
     * the method/header/credentials headers are set unconditionally.
     */
    pub fn apply(&self, resp: &mut Response, request_origin: &str) {
        if self.is_authorized(request_origin) {
            insert_header(resp, header::ACCESS_CONTROL_ALLOW_ORIGIN, request_origin);
        }
        insert_header(resp, header::ACCESS_CONTROL_ALLOW_HEADERS, &self.allow_headers);
        insert_header(resp, header::ACCESS_CONTROL_ALLOW_METHODS, &self.allow_methods);
        insert_header(resp, header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "false");
    }
}

// ---------------------------------------------------------------------------
// insert_header:
// ---------------------------------------------------------------------------
// Configuration values are operator-supplied, so a value that is not a
// legal header value is skipped with a warning rather than aborting the
// response.
fn insert_header(resp: &mut Response, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            resp.headers_mut().insert(name, v);
        },
        Err(_) => {
            warn!("Skipping CORS header {} with invalid value: {}", name, value);
        },
    }
}

// ***************************************************************************
//                              CORS Middleware
// ***************************************************************************
// ---------------------------------------------------------------------------
// Cors:
// ---------------------------------------------------------------------------
/** Poem middleware wrapping every route with the policy above. */
pub struct Cors {
    policy: CorsPolicy,
}

impl Cors {
    pub fn new(config: &CorsConfig) -> Self {
        Self { policy: CorsPolicy::new(config) }
    }
}

impl<E: Endpoint> Middleware<E> for Cors {
    type Output = CorsEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        CorsEndpoint { ep, policy: self.policy.clone() }
    }
}

// ---------------------------------------------------------------------------
// CorsEndpoint:
// ---------------------------------------------------------------------------
pub struct CorsEndpoint<E> {
    ep: E,
    policy: CorsPolicy,
}

impl<E: Endpoint> Endpoint for CorsEndpoint<E> {
    type Output = Response;

    async fn call(&self, req: Request) -> poem::Result<Self::Output> {
        let request_origin = req
            .header(header::ORIGIN)
            .unwrap_or_default()
            .to_string();

        // Preflight requests are answered here and never reach a handler.
        if req.method() == Method::OPTIONS {
            let mut resp = StatusCode::NO_CONTENT.into_response();
            self.policy.apply(&mut resp, &request_origin);
            return Ok(resp);
        }

        // Headers go on error responses too, matching the behavior of
        // setting them before dispatch.
        let mut resp = match self.ep.call(req).await {
            Ok(r)  => r.into_response(),
            Err(e) => e.into_response(),
        };
        self.policy.apply(&mut resp, &request_origin);
        Ok(resp)
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use poem::endpoint::{make, make_sync};
    use poem::EndpointExt;

    fn test_config() -> CorsConfig {
        CorsConfig {
            allow_origin: vec!["example.com".to_string(), "https://poems.example.org".to_string()],
            allow_method: vec!["GET".to_string(), "POST".to_string(), "PUT".to_string(), "DELETE".to_string()],
            allow_header: vec!["Content-Type".to_string(), "Authorization".to_string()],
            allow_local: true,
        }
    }

    fn test_policy() -> CorsPolicy {
        CorsPolicy::new(&test_config())
    }

    #[test]
    fn bare_host_matches_both_schemes() {
        let policy = test_policy();
        assert!(policy.is_authorized("http://example.com"));
        assert!(policy.is_authorized("https://example.com"));
        assert!(!policy.is_authorized("ftp://example.com"));
        assert!(!policy.is_authorized("http://example.com.evil.com"));
        assert!(!policy.is_authorized("http://evil.com"));
    }

    #[test]
    fn full_origin_matches_exactly() {
        let policy = test_policy();
        assert!(policy.is_authorized("https://poems.example.org"));
        // Entry is scheme-qualified, so the other scheme is refused.
        assert!(!policy.is_authorized("http://poems.example.org"));
        assert!(!policy.is_authorized("https://poems.example.org:8443"));
    }

    #[test]
    fn allow_local_matches_plain_http_only() {
        let policy = test_policy();
        assert!(policy.is_authorized("http://127.0.0.1:3000"));
        assert!(policy.is_authorized("http://localhost:8080"));
        assert!(policy.is_authorized("http://localhost"));
        // Scheme mismatch on the local fast path is refused.
        assert!(!policy.is_authorized("https://localhost"));
        assert!(!policy.is_authorized("https://127.0.0.1:3000"));
    }

    #[test]
    fn localhost_refused_without_allow_local() {
        let mut config = test_config();
        config.allow_local = false;
        let policy = CorsPolicy::new(&config);
        assert!(!policy.is_authorized("http://127.0.0.1:3000"));
        assert!(!policy.is_authorized("http://localhost:8080"));

        // Still reachable through an explicit allow-list entry.
        config.allow_origin.push("localhost:8080".to_string());
        let policy = CorsPolicy::new(&config);
        assert!(policy.is_authorized("http://localhost:8080"));
    }

    #[test]
    fn empty_origin_never_matches() {
        let policy = test_policy();
        assert!(!policy.is_authorized(""));
    }

    #[test]
    fn allow_list_order_is_first_match() {
        let config = CorsConfig {
            allow_origin: vec!["a.example".to_string(), "b.example".to_string()],
            ..Default::default()
        };
        let policy = CorsPolicy::new(&config);
        assert!(policy.is_authorized("https://b.example"));
    }

    #[test]
    fn apply_reflects_origin_only_when_authorized() {
        let policy = test_policy();

        let mut resp = Response::default();
        policy.apply(&mut resp, "https://example.com");
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://example.com"
        );
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            "GET,POST,PUT,DELETE"
        );
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
            "Content-Type,Authorization"
        );
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "false"
        );

        // The method/header/credentials trio is present even when the
        // origin is refused; only allow-origin is withheld.
        let mut resp = Response::default();
        policy.apply(&mut resp, "http://evil.com");
        assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            "GET,POST,PUT,DELETE"
        );
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "false"
        );
    }

    #[tokio::test]
    async fn options_short_circuits_with_204() {
        let ep = make_sync(|_| "handler ran").with(Cors::new(&test_config()));
        let req = Request::builder()
            .method(Method::OPTIONS)
            .header(header::ORIGIN, "http://example.com")
            .finish();
        let resp = ep.get_response(req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://example.com"
        );
        let body = resp.into_body().into_string().await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn non_options_requests_reach_the_handler() {
        let ep = make_sync(|_| "handler ran").with(Cors::new(&test_config()));
        let req = Request::builder()
            .method(Method::GET)
            .header(header::ORIGIN, "https://example.com")
            .finish();
        let resp = ep.get_response(req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://example.com"
        );
        let body = resp.into_body().into_string().await.unwrap();
        assert_eq!(body, "handler ran");
    }

    #[tokio::test]
    async fn error_responses_carry_cors_headers() {
        // A failing handler still gets the full header set, as if the
        // headers had been written before dispatch.
        let ep = make(|_| async {
            Err::<(), _>(poem::Error::from_status(StatusCode::INTERNAL_SERVER_ERROR))
        })
        .with(Cors::new(&test_config()));
        let req = Request::builder()
            .method(Method::GET)
            .header(header::ORIGIN, "https://example.com")
            .finish();
        let resp = ep.get_response(req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://example.com"
        );
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            "GET,POST,PUT,DELETE"
        );
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "false"
        );

        // An unauthorized origin on a failing handler gets the trio but
        // no allow-origin reflection.
        let ep = make(|_| async {
            Err::<(), _>(poem::Error::from_status(StatusCode::INTERNAL_SERVER_ERROR))
        })
        .with(Cors::new(&test_config()));
        let req = Request::builder()
            .method(Method::GET)
            .header(header::ORIGIN, "http://evil.com")
            .finish();
        let resp = ep.get_response(req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "false"
        );
    }

    #[tokio::test]
    async fn request_without_origin_gets_no_allow_origin() {
        let ep = make_sync(|_| "handler ran").with(Cors::new(&test_config()));
        let req = Request::builder().method(Method::GET).finish();
        let resp = ep.get_response(req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            "GET,POST,PUT,DELETE"
        );
    }
}
