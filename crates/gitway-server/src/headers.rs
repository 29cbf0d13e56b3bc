//! Cache-control header policies for dumb-protocol responses.
//!
//! Git's object store is content-addressed: loose objects, packs, and their
//! indexes never change once written, so they get a one-year public cache.
//! Ref metadata (`HEAD`, `info/refs`, alternates) moves with every push and
//! must never be cached.

use std::time::SystemTime;

use axum::http::{
    HeaderMap, HeaderValue,
    header::{CACHE_CONTROL, DATE, EXPIRES, PRAGMA},
};
use chrono::{DateTime, TimeDelta, Utc};

/// One year, the max-age for immutable object-store files.
const CACHE_FOREVER_SECONDS: i64 = 31_536_000;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Formats a timestamp as an RFC 7231 HTTP date.
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

/// Marks the response as never cacheable.
pub fn no_cache(headers: &mut HeaderMap) {
    headers.insert(
        EXPIRES,
        HeaderValue::from_static("Fri, 01 Jan 1980 00:00:00 GMT"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, max-age=0, must-revalidate"),
    );
}

/// Marks the response as immutable for a year.
pub fn cache_forever(headers: &mut HeaderMap) {
    let now = Utc::now();
    let expires = now + TimeDelta::seconds(CACHE_FOREVER_SECONDS);

    if let Ok(value) = HeaderValue::from_str(&now.format(HTTP_DATE_FORMAT).to_string()) {
        headers.insert(DATE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&expires.format(HTTP_DATE_FORMAT).to_string()) {
        headers.insert(EXPIRES, value);
    }
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000"),
    );
}
