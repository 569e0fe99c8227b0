//! Embedded page metadata.
//!
//! Storefront pages carry their state as JSON in the `data-blob` attribute of
//! a single `<div id="pagedata">` element.

use std::sync::OnceLock;

use scraper::{Html, Selector};

use crate::retry::FetchError;

fn pagedata_selector() -> Option<&'static Selector> {
    static SELECTOR: OnceLock<Option<Selector>> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("div#pagedata").ok()).as_ref()
}

/// Returns the HTML-unescaped `data-blob` JSON text of the page.
pub fn extract_blob(html: &str) -> Result<String, FetchError> {
    let selector = pagedata_selector().ok_or(FetchError::NoMetadataFound)?;
    let document = Html::parse_document(html);
    document
        .select(selector)
        .next()
        .and_then(|div| div.value().attr("data-blob"))
        .map(str::to_string)
        .ok_or(FetchError::NoMetadataFound)
}

/// Extracts and decodes the page's metadata blob.
pub fn parse_blob<T: serde::de::DeserializeOwned>(html: &str) -> Result<T, FetchError> {
    let blob = extract_blob(html)?;
    Ok(serde_json::from_str(&blob)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_unescaped_blob() {
        let html = r#"<html><body>
            <div id="other" data-blob="nope"></div>
            <div id="pagedata" data-blob="{&quot;a&quot;:1,&quot;b&quot;:&quot;x &amp; y&quot;}"></div>
        </body></html>"#;
        assert_eq!(extract_blob(html).unwrap(), r#"{"a":1,"b":"x & y"}"#);
        let v: serde_json::Value = parse_blob(html).unwrap();
        assert_eq!(v["b"], "x & y");
    }

    #[test]
    fn selector_parses() {
        assert!(pagedata_selector().is_some());
    }

    #[test]
    fn missing_container() {
        assert!(matches!(
            extract_blob("<html><body><p>login</p></body></html>"),
            Err(FetchError::NoMetadataFound)
        ));
        assert!(matches!(
            extract_blob(r#"<div id="pagedata"></div>"#),
            Err(FetchError::NoMetadataFound)
        ));
    }

    #[test]
    fn malformed_json() {
        let html = r#"<div id="pagedata" data-blob="{not json"></div>"#;
        assert!(matches!(
            parse_blob::<serde_json::Value>(html),
            Err(FetchError::MalformedMetadata(_))
        ));
    }
}
