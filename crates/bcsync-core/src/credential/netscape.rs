//! Netscape `cookies.txt` format (as written by browser export extensions and curl).

use std::path::Path;

use super::cookie::Cookie;
use super::CredentialError;

const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// Reads and parses a cookie file.
pub fn load_cookie_file(path: &Path) -> Result<Vec<Cookie>, CredentialError> {
    let data = std::fs::read_to_string(path).map_err(|e| CredentialError::CookieFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_cookie_file(&data).map_err(|reason| CredentialError::CookieFile {
        path: path.to_path_buf(),
        reason,
    })
}

/// Parses the seven tab-separated columns:
/// `domain  include_subdomains  path  secure  expires  name  value`.
pub(crate) fn parse_cookie_file(data: &str) -> Result<Vec<Cookie>, String> {
    let mut cookies = Vec::new();
    for (idx, raw) in data.lines().enumerate() {
        let line = raw.trim_end_matches(['\r', '\n']);
        let line = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => rest,
            None if line.trim_start().starts_with('#') || line.trim().is_empty() => continue,
            None => line,
        };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 7 {
            return Err(format!(
                "line {}: expected 7 tab-separated fields, found {}",
                idx + 1,
                fields.len()
            ));
        }
        let expires = fields[4]
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("line {}: invalid expiry {:?}", idx + 1, fields[4]))?;
        cookies.push(Cookie {
            domain: fields[0].to_string(),
            path: fields[2].to_string(),
            secure: fields[3].eq_ignore_ascii_case("TRUE"),
            expires,
            name: fields[5].to_string(),
            value: fields[6..].join("\t"),
        });
    }
    Ok(cookies)
}
