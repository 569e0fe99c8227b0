//! Minimal HTTP/1.1 storefront for integration tests.
//!
//! Serves album pages with an embedded pagedata blob, the downloads they link
//! to, a fan profile page and the paginated collection items API. Downloads
//! can be cut short to simulate dropped connections.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

pub const ARTIST: &str = "Test Artist";
pub const FAN: &str = "fan";
const FAN_ID: u64 = 7;

#[derive(Debug, Clone)]
pub struct StorefrontOptions {
    /// Body served for every download.
    pub body: Vec<u8>,
    /// The first N download requests send only half the body, then close.
    pub truncated_downloads: usize,
    /// Format keys each album page offers.
    pub formats: Vec<&'static str>,
    /// Album names in the fan's collection.
    pub collection: Vec<String>,
    /// How many collection links the profile page embeds; the rest are paged.
    pub first_page: usize,
    /// Links per collection API response.
    pub page_size: usize,
}

impl Default for StorefrontOptions {
    fn default() -> Self {
        Self {
            body: (0u8..=255).cycle().take(1000).collect(),
            truncated_downloads: 0,
            formats: vec!["flac", "mp3-320"],
            collection: Vec::new(),
            first_page: 2,
            page_size: 2,
        }
    }
}

struct Shared {
    opts: StorefrontOptions,
    base: String,
    hits: Mutex<HashMap<String, usize>>,
}

pub struct Storefront {
    shared: Arc<Shared>,
}

impl Storefront {
    /// Starts a server in a background thread. It runs until the process exits.
    pub fn start(opts: StorefrontOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let shared = Arc::new(Shared {
            opts,
            base: format!("http://127.0.0.1:{}", port),
            hits: Mutex::new(HashMap::new()),
        });
        let server = Arc::clone(&shared);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let server = Arc::clone(&server);
                thread::spawn(move || handle(stream, &server));
            }
        });
        Self { shared }
    }

    /// Storefront root, e.g. `http://127.0.0.1:12345`.
    pub fn base(&self) -> &str {
        &self.shared.base
    }

    pub fn album_url(&self, name: &str) -> String {
        format!("{}/album/{}", self.shared.base, name)
    }

    /// Requests seen for paths starting with `prefix` (e.g. `/download/one`).
    pub fn hits(&self, prefix: &str) -> usize {
        self.shared
            .hits
            .lock()
            .unwrap()
            .iter()
            .filter(|(path, _)| path.starts_with(prefix))
            .map(|(_, n)| n)
            .sum()
    }
}

fn read_request(stream: &mut TcpStream) -> Option<(String, String, String)> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&data[..header_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while data.len() < header_end + content_length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }
    let mut first = head.lines().next()?.split_whitespace();
    let method = first.next()?.to_string();
    let path = first.next()?.to_string();
    let body = String::from_utf8_lossy(&data[header_end..]).into_owned();
    Some((method, path, body))
}

fn respond(stream: &mut TcpStream, status: &str, extra_headers: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n",
        status,
        body.len(),
        extra_headers
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

fn page_with_blob(blob: &serde_json::Value) -> Vec<u8> {
    let escaped = blob
        .to_string()
        .replace('&', "&amp;")
        .replace('"', "&quot;");
    format!(
        "<!DOCTYPE html><html><body><div id=\"pagedata\" data-blob=\"{}\"></div></body></html>",
        escaped
    )
    .into_bytes()
}

fn redownload_urls(server: &Shared, names: &[String]) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = names
        .iter()
        .map(|n| (format!("p{}", n), serde_json::Value::String(format!("{}/album/{}", server.base, n))))
        .collect();
    serde_json::Value::Object(map)
}

fn handle(mut stream: TcpStream, server: &Shared) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let Some((method, path, body)) = read_request(&mut stream) else {
        return;
    };
    let hit = {
        let mut hits = server.hits.lock().unwrap();
        let n = hits.entry(path.clone()).or_insert(0);
        *n += 1;
        *n
    };
    let opts = &server.opts;

    if let Some(name) = path.strip_prefix("/album/") {
        let downloads: serde_json::Map<String, serde_json::Value> = opts
            .formats
            .iter()
            .map(|f| {
                (
                    f.to_string(),
                    serde_json::json!({"url": format!("{}/download/{}?fmt={}", server.base, name, f)}),
                )
            })
            .collect();
        let blob = serde_json::json!({
            "download_items": [{
                "title": name,
                "item_id": 1000 + name.len(),
                "artist": ARTIST,
                "type": "album",
                "downloads": downloads,
            }]
        });
        respond(&mut stream, "200 OK", "Content-Type: text/html\r\n", &page_with_blob(&blob));
        return;
    }

    if let Some(rest) = path.strip_prefix("/download/") {
        let name = rest.split('?').next().unwrap_or(rest);
        let disposition = format!(
            "Content-Disposition: attachment; filename*=UTF-8''{}%20-%20{}.zip\r\n",
            ARTIST.replace(' ', "%20"),
            name
        );
        if hit <= opts.truncated_downloads {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n",
                opts.body.len(),
                disposition
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&opts.body[..opts.body.len() / 2]);
            let _ = stream.shutdown(std::net::Shutdown::Both);
            return;
        }
        respond(&mut stream, "200 OK", &disposition, &opts.body);
        return;
    }

    if method == "POST" && path == "/api/fancollection/1/collection_items" {
        let request: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
        let offset = request["older_than_token"]
            .as_str()
            .and_then(|t| t.strip_prefix("tok"))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(opts.collection.len());
        let end = (offset + opts.page_size).min(opts.collection.len());
        let page = &opts.collection[offset.min(end)..end];
        let reply = serde_json::json!({
            "items": [],
            "redownload_urls": redownload_urls(server, page),
            "more_available": end < opts.collection.len(),
            "last_token": format!("tok{}", end),
        });
        respond(&mut stream, "200 OK", "Content-Type: application/json\r\n", reply.to_string().as_bytes());
        return;
    }

    if path == format!("/{}", FAN) {
        let first = opts.first_page.min(opts.collection.len());
        let blob = serde_json::json!({
            "collection_count": opts.collection.len(),
            "fan_data": {"fan_id": FAN_ID, "name": FAN},
            "collection_data": {
                "last_token": format!("tok{}", first),
                "redownload_urls": redownload_urls(server, &opts.collection[..first]),
            }
        });
        respond(&mut stream, "200 OK", "Content-Type: text/html\r\n", &page_with_blob(&blob));
        return;
    }

    if method == "GET" && path.matches('/').count() == 1 {
        // Any other user: a profile page without collection data.
        let blob = serde_json::json!({"identities": {"fan": null}});
        respond(&mut stream, "200 OK", "Content-Type: text/html\r\n", &page_with_blob(&blob));
        return;
    }

    respond(&mut stream, "404 Not Found", "", b"not found");
}
