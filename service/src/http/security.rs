//! Security headers added to every API response.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{
        header::{
            HeaderName, CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION,
        },
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::Response,
    Extension,
};

use crate::config::SecurityHeadersConfig;

/// Build the header set once at startup; it is shared by every request
/// through an `Extension` layer.
///
/// Configured values that are not valid header values are skipped.
#[must_use]
pub fn build_security_headers(config: &SecurityHeadersConfig) -> Arc<HeaderMap> {
    let hsts = config.hsts_enabled.then(|| {
        if config.hsts_include_subdomains {
            format!("max-age={}; includeSubDomains", config.hsts_max_age)
        } else {
            format!("max-age={}", config.hsts_max_age)
        }
    });

    let configured: [(HeaderName, Option<&str>); 4] = [
        (X_FRAME_OPTIONS, Some(config.frame_options.as_str())),
        (
            CONTENT_SECURITY_POLICY,
            Some(config.content_security_policy.as_str()),
        ),
        (REFERRER_POLICY, Some(config.referrer_policy.as_str())),
        // HTTPS deployments only
        (STRICT_TRANSPORT_SECURITY, hsts.as_deref()),
    ];

    let mut headers = HeaderMap::new();
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));

    for (name, value) in configured {
        match value.map(HeaderValue::from_str) {
            Some(Ok(value)) => {
                headers.insert(name, value);
            }
            Some(Err(_)) => tracing::warn!(header = %name, "ignoring invalid security header value"),
            None => {}
        }
    }

    Arc::new(headers)
}

/// Copy the prebuilt security headers onto the response.
pub async fn security_headers_middleware(
    Extension(headers): Extension<Arc<HeaderMap>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let response_headers = response.headers_mut();
    for (name, value) in headers.iter() {
        response_headers.insert(name.clone(), value.clone());
    }
    response
}
