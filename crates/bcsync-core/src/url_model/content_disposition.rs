//! Content-Disposition header parsing (filename and filename*).

/// Extracts the suggested filename from a raw Content-Disposition header value.
///
/// Supports:
/// - `filename*=UTF-8''percent-encoded` (RFC 5987; decoded)
/// - `filename="value"` (quoted; strips quotes and unescapes)
/// - `filename=value` (token)
///
/// If both `filename` and `filename*` exist, `filename*` takes precedence.
pub fn parse_content_disposition_filename(header_value: &str) -> Option<String> {
    let mut filename_from_token: Option<String> = None;

    for param in header_value.trim().split(';') {
        let Some((name, v)) = param.trim().split_once('=') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let v = v.trim();

        if name == "filename*" {
            if let Some(rest) = strip_utf8_prefix(v) {
                let decoded = urlencoding::decode_binary(rest.trim_matches('"').as_bytes());
                let decoded = String::from_utf8_lossy(&decoded);
                let decoded = decode_quoted_filename(&decoded);
                if !decoded.is_empty() {
                    return Some(decoded);
                }
            }
        } else if name == "filename" {
            let unquoted = if v.len() >= 2 && v.starts_with('"') && v.ends_with('"') {
                decode_quoted_filename(&v[1..v.len() - 1])
            } else {
                v.to_string()
            };
            if !unquoted.is_empty() {
                filename_from_token = Some(unquoted);
            }
        }
    }

    filename_from_token
}

fn strip_utf8_prefix(v: &str) -> Option<&str> {
    let (charset, rest) = v.split_once("''")?;
    charset.eq_ignore_ascii_case("utf-8").then_some(rest)
}

/// Decode backslash-escaped quotes in a quoted filename value.
fn decode_quoted_filename(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '"' || next == '\\' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}
