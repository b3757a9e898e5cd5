use reqwest::Url;

const SCHEME_MARKER: &str = "://";
const TOKEN_PARAM: &str = "token";

/// Extracts the verification token from a decoded QR payload.
///
/// A payload is either the bare token or a verification URL carrying the
/// token in its `token` query parameter. Anything that does not parse as a
/// URL, or a URL without that parameter, is used verbatim.
pub fn extract_token(decoded: &str) -> String {
    if !decoded.contains(SCHEME_MARKER) {
        return decoded.to_string();
    }

    match Url::parse(decoded) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == TOKEN_PARAM)
            .map(|(_, value)| value.into_owned())
            .unwrap_or_else(|| decoded.to_string()),
        Err(e) => {
            tracing::debug!("Decoded payload looks like a URL but does not parse: {e}");
            decoded.to_string()
        }
    }
}
