use std::collections::HashMap;

use axum::http::HeaderMap;
use ws_core::{FindQuery, TenantContext};

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USER_HEADER: &str = "x-user-id";

pub const DEFAULT_TENANT: &str = "default";
pub const ANONYMOUS_USER: &str = "anonymous";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Caller identity from `x-tenant-id` / `x-user-id`.
pub fn tenant_from_headers(headers: &HeaderMap) -> TenantContext {
    TenantContext::new(
        header(headers, TENANT_HEADER).unwrap_or(DEFAULT_TENANT),
        header(headers, USER_HEADER).unwrap_or(ANONYMOUS_USER),
    )
}

/// `?name=` is the only filter `find` understands; other keys are ignored.
pub fn find_query(query: &HashMap<String, String>) -> FindQuery {
    FindQuery {
        name: query.get("name").cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_headers_fall_back_to_defaults() {
        let ctx = tenant_from_headers(&HeaderMap::new());
        assert_eq!(ctx.tenant(), DEFAULT_TENANT);
        assert_eq!(ctx.user(), ANONYMOUS_USER);
    }

    #[test]
    fn headers_are_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_HEADER, HeaderValue::from_static(" acme "));
        headers.insert(USER_HEADER, HeaderValue::from_static("admin"));

        let ctx = tenant_from_headers(&headers);
        assert_eq!(ctx.tenant(), "acme");
        assert_eq!(ctx.user(), "admin");
    }
}
