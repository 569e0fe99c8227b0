//! Firefox `cookies.sqlite` reader.
//!
//! The live database is locked while Firefox runs, so it is copied (with its
//! WAL file, when present) into a scratch directory and opened read-only there.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Row};

use super::cookie::Cookie;
use super::CredentialError;

const COOKIE_DB: &str = "cookies.sqlite";

/// Directories that may contain Firefox profiles, most common first.
fn profile_roots() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    vec![
        home.join(".mozilla/firefox"),
        home.join("snap/firefox/common/.mozilla/firefox"),
        home.join(".var/app/org.mozilla.firefox/.mozilla/firefox"),
        home.join("Library/Application Support/Firefox/Profiles"),
        home.join("AppData/Roaming/Mozilla/Firefox/Profiles"),
    ]
}

/// The most recently modified `cookies.sqlite` under any of `roots`.
pub(crate) fn find_cookie_db(roots: &[PathBuf]) -> Option<PathBuf> {
    let mut best: Option<(SystemTime, PathBuf)> = None;
    for root in roots {
        let Ok(entries) = std::fs::read_dir(root) else {
            continue;
        };
        for entry in entries.flatten() {
            let candidate = entry.path().join(COOKIE_DB);
            let Ok(modified) = candidate.metadata().and_then(|m| m.modified()) else {
                continue;
            };
            if best.as_ref().map_or(true, |(t, _)| modified > *t) {
                best = Some((modified, candidate));
            }
        }
    }
    best.map(|(_, p)| p)
}

/// Loads the cookies Firefox holds for `domain` (and its subdomains).
pub async fn load_firefox_cookies(domain: &str) -> Result<Vec<Cookie>, CredentialError> {
    let db = find_cookie_db(&profile_roots()).ok_or_else(|| CredentialError::BrowserStore {
        browser: "firefox".into(),
        reason: "no Firefox profile with a cookies.sqlite was found".into(),
    })?;
    tracing::debug!(path = %db.display(), "reading firefox cookie store");
    read_cookie_db(&db, domain).await
}

/// Reads cookies for `domain` from a copy of the database at `db`.
pub(crate) async fn read_cookie_db(db: &Path, domain: &str) -> Result<Vec<Cookie>, CredentialError> {
    let store_err = |reason: String| CredentialError::BrowserStore {
        browser: "firefox".into(),
        reason,
    };

    let scratch = tempfile::tempdir().map_err(|e| store_err(e.to_string()))?;
    let copy = scratch.path().join(COOKIE_DB);
    tokio::fs::copy(db, &copy)
        .await
        .map_err(|e| store_err(format!("copy {}: {}", db.display(), e)))?;
    let wal = db.with_file_name(format!("{}-wal", COOKIE_DB));
    if tokio::fs::try_exists(&wal).await.unwrap_or(false) {
        let _ = tokio::fs::copy(&wal, scratch.path().join(format!("{}-wal", COOKIE_DB))).await;
    }

    let mut conn = SqliteConnectOptions::new()
        .filename(&copy)
        .read_only(true)
        .connect()
        .await
        .map_err(|e| store_err(e.to_string()))?;

    let pattern = format!("%{}", domain);
    let rows = sqlx::query(
        "SELECT host, path, isSecure, expiry, name, value FROM moz_cookies WHERE host LIKE ?",
    )
    .bind(&pattern)
    .fetch_all(&mut conn)
    .await
    .map_err(|e| store_err(e.to_string()))?;

    let cookies = rows
        .iter()
        .map(|row| Cookie {
            domain: row.get("host"),
            path: row.get("path"),
            secure: row.get::<i64, _>("isSecure") != 0,
            expires: row.get("expiry"),
            name: row.get("name"),
            value: row.get("value"),
        })
        .collect();
    Ok(cookies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Connection;

    async fn make_db(path: &Path) {
        let mut conn = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .connect()
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE moz_cookies (id INTEGER PRIMARY KEY, host TEXT, path TEXT, \
             isSecure INTEGER, expiry INTEGER, name TEXT, value TEXT)",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        for (host, name) in [(".bandcamp.com", "identity"), ("example.com", "other")] {
            sqlx::query(
                "INSERT INTO moz_cookies (host, path, isSecure, expiry, name, value) \
                 VALUES (?, '/', 1, 2000000000, ?, 'secret')",
            )
            .bind(host)
            .bind(name)
            .execute(&mut conn)
            .await
            .unwrap();
        }
        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn reads_matching_cookies_from_copy() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join(COOKIE_DB);
        make_db(&db).await;

        let cookies = read_cookie_db(&db, "bandcamp.com").await.unwrap();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "identity");
        assert_eq!(cookies[0].domain, ".bandcamp.com");
        assert!(cookies[0].secure);
        assert_eq!(cookies[0].expires, 2_000_000_000);
    }

    #[test]
    fn find_cookie_db_picks_profile_with_store() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("abc.default")).unwrap();
        std::fs::create_dir(root.path().join("xyz.default-release")).unwrap();
        std::fs::write(root.path().join("xyz.default-release").join(COOKIE_DB), b"").unwrap();

        let found = find_cookie_db(&[root.path().to_path_buf(), root.path().join("missing")]);
        assert_eq!(found, Some(root.path().join("xyz.default-release").join(COOKIE_DB)));
        assert_eq!(find_cookie_db(&[]), None);
    }
}
