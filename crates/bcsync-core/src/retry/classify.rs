//! Classify fetch errors into retry policy error kinds.

use super::error::FetchError;
use super::policy::ErrorKind;

/// Classify a curl error for retry decisions.
///
/// Anything libcurl reports is a transport problem, so everything that is not
/// a timeout counts as a connection failure.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        ErrorKind::Timeout
    } else {
        ErrorKind::Connection
    }
}

/// Classify a fetch error into an ErrorKind.
pub fn classify(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::Curl(ce) => classify_curl_error(ce),
        FetchError::Http(code) => ErrorKind::Http(u16::try_from(*code).unwrap_or(u16::MAX)),
        FetchError::IncompleteRead { .. } => ErrorKind::IncompleteRead,
        FetchError::Storage(_) => ErrorKind::Io,
        FetchError::NoMetadataFound
        | FetchError::MalformedMetadata(_)
        | FetchError::UnexpectedShape(_)
        | FetchError::MissingContentLength
        | FetchError::BadFilenameFormat(_) => ErrorKind::Structural,
    }
}
