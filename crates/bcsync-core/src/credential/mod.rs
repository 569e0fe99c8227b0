//! Session credentials: the storefront login cookies of the user.
//!
//! Cookies come either from a Netscape-format cookie file or straight from a
//! browser profile. Only cookies for the storefront domain are kept; the
//! resulting [`Credential`] is immutable and shared by every worker.

mod cookie;
mod firefox;
mod netscape;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub use cookie::{Cookie, Credential};
pub use firefox::load_firefox_cookies;
pub use netscape::load_cookie_file;

/// Domain whose cookies authenticate storefront requests.
pub const STOREFRONT_DOMAIN: &str = "bandcamp.com";

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("browser [{0}] is not supported for reading cookies; export them to a cookies.txt file and pass --cookies")]
    UnsupportedBrowser(Browser),
    #[error("could not read cookies from {browser}: {reason}")]
    BrowserStore { browser: String, reason: String },
    #[error("cookie file {}: {reason}", path.display())]
    CookieFile { path: PathBuf, reason: String },
}

/// Browsers a user may ask to take cookies from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    Firefox,
    Chrome,
    Chromium,
    Brave,
    Opera,
    Edge,
}

impl Browser {
    pub const ALL: [Browser; 6] = [
        Browser::Firefox,
        Browser::Chrome,
        Browser::Chromium,
        Browser::Brave,
        Browser::Opera,
        Browser::Edge,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Browser::Firefox => "firefox",
            Browser::Chrome => "chrome",
            Browser::Chromium => "chromium",
            Browser::Brave => "brave",
            Browser::Opera => "opera",
            Browser::Edge => "edge",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Browser::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown browser {:?}", s))
    }
}

/// Where to take the session cookies from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Browser(Browser),
    CookieFile(PathBuf),
}

/// Builds the storefront credential from `source`.
///
/// Chromium-family stores keep cookie values encrypted with a per-user OS key;
/// those browsers are reported as unsupported.
pub async fn load_credential(source: &CredentialSource) -> Result<Credential, CredentialError> {
    let cookies = match source {
        CredentialSource::CookieFile(path) => load_cookie_file(path)?,
        CredentialSource::Browser(Browser::Firefox) => load_firefox_cookies(STOREFRONT_DOMAIN).await?,
        CredentialSource::Browser(other) => return Err(CredentialError::UnsupportedBrowser(*other)),
    };
    let credential = Credential::new(cookies).restricted_to(STOREFRONT_DOMAIN);
    tracing::info!(cookies = credential.cookies().len(), "loaded storefront cookies");
    Ok(credential)
}
