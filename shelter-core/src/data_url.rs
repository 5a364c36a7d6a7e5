//! Helpers for `data:` URLs carrying base64-encoded images.

use base64::{Engine as _, engine::general_purpose};

/// Prefix of a base64-encoded PNG data URL.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Return the base64 payload of a PNG data URL, if `url` is one.
///
/// # Examples
/// ```
/// use shelter_core::data_url::png_payload;
///
/// assert_eq!(png_payload("data:image/png;base64,iVBORw=="), Some("iVBORw=="));
/// assert_eq!(png_payload("https://example.org/icon.png"), None);
/// ```
#[must_use]
pub fn png_payload(url: &str) -> Option<&str> {
    url.strip_prefix(PNG_DATA_URL_PREFIX)
}

/// Decode the image bytes of a PNG data URL.
///
/// Returns `None` when `url` is not a PNG data URL.
///
/// # Errors
///
/// Fails when the payload is not valid standard base64.
pub fn decode_png(url: &str) -> Option<Result<Vec<u8>, base64::DecodeError>> {
    png_payload(url).map(|payload| general_purpose::STANDARD.decode(payload))
}

/// Build a data URL embedding `contents` with the given content type.
///
/// # Examples
/// ```
/// use shelter_core::data_url::encode;
///
/// assert_eq!(encode("image/png", b"png"), "data:image/png;base64,cG5n");
/// ```
#[must_use]
pub fn encode(content_type: &str, contents: &[u8]) -> String {
    format!(
        "data:{content_type};base64,{}",
        general_purpose::STANDARD.encode(contents)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn decodes_png_payload() {
        let url = encode("image/png", &[0x89, b'P', b'N', b'G']);
        let decoded = decode_png(&url).expect("png url").expect("valid base64");
        assert_eq!(decoded, vec![0x89, b'P', b'N', b'G']);
    }

    #[rstest]
    #[case("data:image/gif;base64,R0lGOD==")]
    #[case("https://example.org/icon.png")]
    #[case("images/icon-1.png")]
    fn ignores_other_references(#[case] url: &str) {
        assert!(decode_png(url).is_none());
    }

    #[rstest]
    fn reports_invalid_base64() {
        let outcome = decode_png("data:image/png;base64,***").expect("png url");
        assert!(outcome.is_err());
    }
}
