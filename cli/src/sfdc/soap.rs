//! Minimal SOAP envelope helpers
//!
//! Only what the login and metadata calls need: escaping values into an
//! envelope and pulling leaf element text back out of a response.

use std::ops::Range;

/// Escape text for use inside an XML element
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Byte offsets of one element: the whole element and its content
struct Span {
    start: usize,
    inner: Range<usize>,
    end: usize,
}

/// The next element named `tag` at or after `pos`, ignoring namespace prefixes.
/// Self-closing elements have no content and are skipped.
fn next_element(body: &str, mut pos: usize, tag: &str) -> Option<Span> {
    while let Some(offset) = body[pos..].find('<') {
        let start = pos + offset;
        let open_len = body[start..].find('>')?;
        let open = &body[start + 1..start + open_len];
        pos = start + open_len + 1;

        if open.starts_with('/') || open.starts_with('?') || open.starts_with('!') || open.ends_with('/') {
            continue;
        }

        let name = open.split_whitespace().next().unwrap_or_default();
        let local = name.rsplit(':').next().unwrap_or(name);
        if local != tag {
            continue;
        }

        let close = format!("</{}>", name);
        let inner_end = pos + body[pos..].find(&close)?;
        return Some(Span {
            start,
            inner: pos..inner_end,
            end: inner_end + close.len(),
        });
    }
    None
}

/// Text of the first element named `tag`, ignoring any namespace prefix
pub fn element_text(body: &str, tag: &str) -> Option<String> {
    next_element(body, 0, tag).map(|span| unescape(body[span.inner].trim()))
}

/// Raw content of every element named `tag`, in document order
pub fn elements<'a>(body: &'a str, tag: &str) -> Vec<&'a str> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(span) = next_element(body, pos, tag) {
        found.push(&body[span.inner]);
        pos = span.end;
    }
    found
}

/// `body` with every element named `tag` removed
pub fn strip_elements(body: &str, tag: &str) -> String {
    let mut kept = String::with_capacity(body.len());
    let mut pos = 0;
    while let Some(span) = next_element(body, pos, tag) {
        kept.push_str(&body[pos..span.start]);
        pos = span.end;
    }
    kept.push_str(&body[pos..]);
    kept
}

/// A SOAP fault: `faultcode` and `faultstring`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub code: String,
    pub message: String,
}

/// Parse a SOAP fault out of a response body, if it is one
pub fn fault(body: &str) -> Option<Fault> {
    let message = element_text(body, "faultstring")?;
    let code = element_text(body, "faultcode").unwrap_or_default();
    Some(Fault { code, message })
}

/// Wrap `body` in a SOAP 1.1 envelope with an optional session header
pub fn envelope(namespace: &str, session_id: Option<&str>, body: &str) -> String {
    let header = session_id
        .map(|id| {
            format!(
                "<soapenv:Header><ns:SessionHeader><ns:sessionId>{}</ns:sessionId></ns:SessionHeader></soapenv:Header>",
                escape(id)
            )
        })
        .unwrap_or_default();

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:ns="{}">"#,
            "{}<soapenv:Body>{}</soapenv:Body></soapenv:Envelope>"
        ),
        namespace, header, body
    )
}
