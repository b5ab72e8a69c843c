use axum::{
    body::Body,
    http::{header, HeaderValue, Request, Response},
    middleware::Next,
};

// JSON API: nothing to script or frame. Images may come from any https host
// (game covers, streamer logos).
const CSP: &str = "default-src 'none'; img-src 'self' https:; object-src 'none'; base-uri 'none'; form-action 'none'; frame-ancestors 'none'";

/// Adds security headers to every response that does not already carry them.
pub async fn csp_middleware(req: Request<Body>, next: Next) -> Response<Body> {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();

    for (name, value) in [
        (header::CONTENT_SECURITY_POLICY, CSP),
        (header::REFERRER_POLICY, "no-referrer"),
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    ] {
        if !headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static(value));
        }
    }

    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn adds_headers_without_overriding() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .route(
                "/custom",
                get(|| async { ([(header::REFERRER_POLICY, "same-origin")], "ok") }),
            )
            .layer(axum::middleware::from_fn(csp_middleware));

        let res = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.headers()[header::CONTENT_SECURITY_POLICY], CSP);
        assert_eq!(res.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

        let res = app
            .oneshot(Request::get("/custom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.headers()[header::REFERRER_POLICY], "same-origin");
    }
}
