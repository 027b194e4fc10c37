//! Cookie strings from serverless events.
//!
//! Format: `name=value; Attr=val; Flag`. The first segment is mandatory; a
//! malformed attribute is skipped without discarding the cookie.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl Cookie {
    /// Parse one event cookie string. `None` when there is no `name=value`.
    pub fn parse(raw: &str) -> Option<Cookie> {
        let mut parts = raw.split("; ");
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Cookie {
            name: name.to_string(),
            value: value.trim().to_string(),
            ..Cookie::default()
        };

        for attr in parts {
            let (key, val) = match attr.split_once('=') {
                Some((k, v)) => (k.trim().to_ascii_lowercase(), v.trim()),
                None => (attr.trim().to_ascii_lowercase(), ""),
            };
            match key.as_str() {
                "path" => cookie.path = Some(val.to_string()),
                "domain" => cookie.domain = Some(val.to_string()),
                "expires" => {
                    if let Ok(t) = DateTime::parse_from_rfc2822(val) {
                        cookie.expires = Some(t.with_timezone(&Utc));
                    }
                }
                "max-age" => {
                    if let Ok(n) = val.parse::<i64>() {
                        cookie.max_age = Some(n);
                    }
                }
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                "samesite" => {
                    cookie.same_site = match val.to_ascii_lowercase().as_str() {
                        "lax" => Some(SameSite::Lax),
                        "strict" => Some(SameSite::Strict),
                        "none" => Some(SameSite::None),
                        _ => cookie.same_site,
                    }
                }
                _ => {}
            }
        }

        Some(cookie)
    }

    /// `name=value`, the only part a `Cookie` request header carries.
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Parse every event cookie, dropping the malformed ones.
pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Vec<Cookie> {
    raw.iter()
        .filter_map(|s| {
            let parsed = Cookie::parse(s.as_ref());
            if parsed.is_none() {
                tracing::debug!(cookie = %s.as_ref(), "skipping cookie without name=value");
            }
            parsed
        })
        .collect()
}

/// Value for the reconstructed `cookie` header.
pub fn request_header(cookies: &[Cookie]) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    Some(cookies.iter().map(Cookie::pair).collect::<Vec<_>>().join("; "))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::TimeZone;

    use super::*;

    #[test]
    fn session_cookie_with_attributes() {
        let c = Cookie::parse("sid=abc123; Path=/; Max-Age=3600; Secure").unwrap();
        assert_eq!(c.name, "sid");
        assert_eq!(c.value, "abc123");
        assert_eq!(c.path.as_deref(), Some("/"));
        assert_eq!(c.max_age, Some(3600));
        assert!(c.secure);
        assert!(!c.http_only);
    }

    #[test]
    fn unknown_and_malformed_attributes_are_ignored() {
        let c = Cookie::parse("a=1; Priority=High; Max-Age=soon; HttpOnly; SameSite=STRICT").unwrap();
        assert_eq!(c.max_age, None);
        assert!(c.http_only);
        assert_eq!(c.same_site, Some(SameSite::Strict));
    }

    #[test]
    fn expires_is_rfc1123() {
        let c = Cookie::parse("a=1; Expires=Wed, 21 Oct 2015 07:28:00 GMT; Domain=example.com").unwrap();
        assert_eq!(c.expires, Some(Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap()));
        assert_eq!(c.domain.as_deref(), Some("example.com"));

        let bad = Cookie::parse("a=1; Expires=tomorrow").unwrap();
        assert_eq!(bad.expires, None);
    }

    #[test]
    fn value_may_contain_equals() {
        let c = Cookie::parse("token=a=b=c").unwrap();
        assert_eq!(c.value, "a=b=c");
    }

    #[test]
    fn cookie_without_pair_is_dropped() {
        assert!(Cookie::parse("justaname").is_none());
        let all = parse_all(&["justaname", "x=1", "y=2; Path=/"]);
        assert_eq!(all.len(), 2);
        assert_eq!(request_header(&all).as_deref(), Some("x=1; y=2"));
    }
}
