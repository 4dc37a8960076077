//! RFC 2397 `data:` URI parsing

use base64::Engine;

use crate::error::{FileError, FileResult};

/// Media type assumed when a data URI omits it
const DEFAULT_DATA_URI_MIME_TYPE: &str = "text/plain";

/// Decoded payload of a data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Parse `data:[<mediatype>][;base64],<data>`
pub fn parse_data_uri(uri: &str) -> FileResult<DataUri> {
    let uri = uri.trim();
    let rest = uri
        .get(..5)
        .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
        .map(|_| &uri[5..])
        .ok_or_else(|| FileError::InvalidDataUri("missing data: scheme".to_string()))?;

    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| FileError::InvalidDataUri("missing ',' separator".to_string()))?;

    let mut params = meta.split(';').map(str::trim);
    let media_type = params.next().unwrap_or_default();
    let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

    let mime_type = if media_type.contains('/') {
        media_type.to_lowercase()
    } else {
        DEFAULT_DATA_URI_MIME_TYPE.to_string()
    };

    let data = if is_base64 {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let compact = urlencoding::decode(&compact)
            .map(|d| d.into_owned())
            .unwrap_or(compact);
        base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| FileError::InvalidDataUri(format!("invalid base64 payload: {}", e)))?
    } else {
        urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };

    Ok(DataUri { mime_type, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base64_data_uri() {
        let parsed = parse_data_uri("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(parsed.mime_type, "image/png");
        assert_eq!(
            parsed.data,
            vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]
        );
    }

    #[test]
    fn test_parse_percent_encoded_data_uri() {
        let parsed = parse_data_uri("data:,Hello%2C%20World%21").unwrap();
        assert_eq!(parsed.mime_type, "text/plain");
        assert_eq!(parsed.data, b"Hello, World!");

        let parsed = parse_data_uri("DATA:application/xml;charset=utf-8,%3Ca%2F%3E").unwrap();
        assert_eq!(parsed.mime_type, "application/xml");
        assert_eq!(parsed.data, b"<a/>");
    }

    #[test]
    fn test_parse_invalid_data_uris() {
        assert!(matches!(
            parse_data_uri("http://example.com/a.png"),
            Err(FileError::InvalidDataUri(_))
        ));
        assert!(matches!(
            parse_data_uri("data:image/png;base64"),
            Err(FileError::InvalidDataUri(_))
        ));
        assert!(matches!(
            parse_data_uri("data:image/png;base64,@@@"),
            Err(FileError::InvalidDataUri(_))
        ));
        assert!(parse_data_uri("dat").is_err());
    }
}
