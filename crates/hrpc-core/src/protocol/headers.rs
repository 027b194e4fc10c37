//! Header reconstitution rules for serverless events.
//!
//! The event format collapses repeated headers into one comma-joined string,
//! so values have to be split again. Some header families legitimately carry
//! commas (dates, credentials, URIs, address lists) and must stay whole.

/// Header names whose values are never comma-split (lower-case).
pub const NON_SPLIT_HEADERS: &[&str] = &[
    // auth
    "authorization",
    "proxy-authorization",
    // cookies
    "cookie",
    "set-cookie",
    // client identity; referer may carry a query string with commas
    "user-agent",
    "referer",
    // conditional / caching, mostly HTTP-dates
    "if-match",
    "if-none-match",
    "if-modified-since",
    "if-unmodified-since",
    "if-range",
    "last-modified",
    "expires",
    "date",
    // content
    "content-type",
    "content-disposition",
    "range",
    // misc
    "location",
    "link",
    "x-forwarded-for",
];

pub fn is_non_split(name: &str) -> bool {
    NON_SPLIT_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Split one flattened header into the individual values to re-add.
pub fn split_header_value<'a>(name: &str, value: &'a str) -> Vec<&'a str> {
    if is_non_split(name) {
        return vec![value.trim()];
    }
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
