use axum::{
    body::Body,
    http::{header, HeaderValue, Request, Response},
    middleware::Next,
};

use crate::i18n;

/// Serves the request in the language negotiated from `Accept-Language`.
pub async fn language_middleware(req: Request<Body>, next: Next) -> Response<Body> {
    let lang = i18n::negotiate(
        req.headers()
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok()),
    );
    let mut res = i18n::with_language(lang, next.run(req)).await;
    res.headers_mut()
        .insert(header::CONTENT_LANGUAGE, HeaderValue::from_static(lang));
    res
}
