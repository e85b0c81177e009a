use std::fmt;
use std::sync::Arc;

use base64::Engine as _;

use crate::foundation::error::{LatexError, LatexResult};

pub const SVG_DATA_URI_PREFIX: &str = "data:image/svg+xml;base64,";
pub const XML_PROLOGUE: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\" ?>\n";

/// Self-contained `data:` URI embedding a base64-encoded SVG document.
///
/// Cloning is cheap; the encoded text is shared.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DataUri(Arc<str>);

impl DataUri {
    /// Prefix `svg` with the XML prologue and base64-encode the UTF-8 bytes.
    pub fn encode_svg(svg: &str) -> Self {
        let mut doc = String::with_capacity(XML_PROLOGUE.len() + svg.len());
        doc.push_str(XML_PROLOGUE);
        doc.push_str(svg);
        let encoded = base64::engine::general_purpose::STANDARD.encode(doc.as_bytes());
        Self(format!("{SVG_DATA_URI_PREFIX}{encoded}").into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decoded document bytes, prologue included.
    pub fn svg_bytes(&self) -> LatexResult<Vec<u8>> {
        let payload = self
            .0
            .strip_prefix(SVG_DATA_URI_PREFIX)
            .ok_or_else(|| LatexError::decode("not an svg base64 data uri"))?;
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| LatexError::decode(format!("invalid base64 payload: {e}")))
    }

    /// The original SVG document, with the prologue stripped.
    pub fn decode_svg(&self) -> LatexResult<String> {
        let bytes = self.svg_bytes()?;
        let doc = String::from_utf8(bytes)
            .map_err(|e| LatexError::decode(format!("svg payload is not utf-8: {e}")))?;
        match doc.strip_prefix(XML_PROLOGUE) {
            Some(svg) => Ok(svg.to_string()),
            None => Err(LatexError::decode("svg payload is missing the xml prologue")),
        }
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SHOWN: usize = 48;
        if self.0.len() <= SHOWN {
            f.debug_tuple("DataUri").field(&&*self.0).finish()
        } else {
            let head = self.0.get(..SHOWN).unwrap_or(&self.0);
            write!(f, "DataUri({head:?}.. {} bytes)", self.0.len())
        }
    }
}

impl AsRef<str> for DataUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_has_svg_prefix_and_prologue() {
        let uri = DataUri::encode_svg("<svg/>");
        assert!(uri.as_str().starts_with(SVG_DATA_URI_PREFIX));
        let bytes = uri.svg_bytes().unwrap();
        assert!(bytes.starts_with(XML_PROLOGUE.as_bytes()));
        assert!(bytes.ends_with(b"<svg/>"));
    }

    #[test]
    fn decode_returns_document_exactly() {
        let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\">\n  <g data-c=\"\u{221A}\"/>\n</svg>";
        let uri = DataUri::encode_svg(svg);
        assert_eq!(uri.decode_svg().unwrap(), svg);

        let empty = DataUri::encode_svg("");
        assert_eq!(empty.decode_svg().unwrap(), "");
    }

    #[test]
    fn corrupt_payload_is_a_decode_error() {
        let uri = DataUri(Arc::from("data:image/svg+xml;base64,@@@"));
        let err = uri.svg_bytes().unwrap_err();
        assert!(matches!(err, LatexError::Decode(_)));

        let foreign = DataUri(Arc::from("data:image/png;base64,AAAA"));
        assert!(matches!(foreign.svg_bytes(), Err(LatexError::Decode(_))));
    }

    #[test]
    fn debug_truncates_long_uris() {
        let uri = DataUri::encode_svg(&"<g/>".repeat(64));
        let dbg = format!("{uri:?}");
        assert!(dbg.contains("bytes)"));
        assert!(dbg.len() < uri.as_str().len());
    }
}
