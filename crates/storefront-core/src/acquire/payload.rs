//! Turning relay response bodies into CSV text, and deciding whether that
//! text looks like a catalog export.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde_json::Value;

use super::error::{CsvRejection, FetchError};

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";
/// Fields relays use to carry the upstream body, in priority order.
const CONTENT_FIELDS: &[&str] = &["contents", "content", "data"];

const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Unwrap a relay body: decode a base64 data URL, or pull the content field
/// out of a JSON envelope when the relay wraps its responses.
///
/// # Errors
/// Fails on an undecodable data URL or when nothing but whitespace remains.
pub fn decode_relay_body(body: String, expects_json: bool) -> Result<String, FetchError> {
    let text = if body.starts_with(DATA_URL_PREFIX) {
        decode_data_url(&body)?
    } else if expects_json {
        match unwrap_json(&body) {
            Some(inner) if inner.starts_with(DATA_URL_PREFIX) => decode_data_url(&inner)?,
            Some(inner) => inner,
            None => {
                tracing::debug!("relay returned plain text, not JSON");
                body
            }
        }
    } else {
        body
    };

    if text.trim().is_empty() {
        return Err(FetchError::EmptyBody);
    }
    Ok(text)
}

/// Decode `data:<mime>;base64,<payload>`. Anything that is not a base64 data
/// URL is returned unchanged.
///
/// # Errors
/// Returns [`FetchError::InvalidDataUrl`] when the payload is not base64.
pub fn decode_data_url(raw: &str) -> Result<String, FetchError> {
    let Some(rest) = raw.strip_prefix(DATA_URL_PREFIX) else {
        return Ok(raw.to_string());
    };
    let first_line = rest.lines().next().unwrap_or_default();
    let Some(marker) = first_line.find(BASE64_MARKER) else {
        return Ok(raw.to_string());
    };
    let payload: String = first_line[marker + BASE64_MARKER.len()..]
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect();
    if payload.is_empty() {
        return Ok(raw.to_string());
    }

    let bytes = LENIENT_BASE64.decode(payload.as_bytes()).map_err(|err| {
        tracing::warn!(%err, "failed to decode base64 data URL");
        FetchError::InvalidDataUrl
    })?;
    let decoded = String::from_utf8_lossy(&bytes).into_owned();
    tracing::debug!(chars = decoded.len(), "decoded base64 data URL");
    Ok(decoded)
}

/// The first non-empty content field of a JSON envelope. Non-string values
/// are re-serialised. `None` when the body is not JSON at all; the raw body
/// itself when no content field is present.
fn unwrap_json(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let inner = CONTENT_FIELDS
        .iter()
        .filter_map(|field| value.get(field))
        .find(|candidate| is_truthy(candidate));
    Some(match inner {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => body.to_string(),
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

type CsvCheck = (CsvRejection, fn(&str) -> bool);

/// Checks applied to relay text, in order; the first one that matches rejects
/// the URL variant.
const CSV_CHECKS: &[CsvCheck] = &[
    (CsvRejection::Html, looks_like_html),
    (CsvRejection::Empty, is_blank),
    (CsvRejection::MissingHeader, first_line_blank),
];

/// Accept text that plausibly is a CSV export.
///
/// # Errors
/// Returns the first rejection that applies.
pub fn check_csv(text: &str) -> Result<(), CsvRejection> {
    match CSV_CHECKS.iter().find(|(_, rejects)| rejects(text)) {
        Some((rejection, _)) => Err(*rejection),
        None => Ok(()),
    }
}

fn looks_like_html(text: &str) -> bool {
    text.trim().starts_with('<') || text.contains("<!DOCTYPE")
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

fn first_line_blank(text: &str) -> bool {
    text.split('\n').next().unwrap_or_default().trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "id,name\n1,Hades\n";

    fn encoded(text: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(text)
    }

    #[test]
    fn plain_bodies_pass_through() {
        assert_eq!(decode_relay_body(CSV.to_string(), false).unwrap(), CSV);
    }

    #[test]
    fn data_urls_are_decoded_for_any_relay() {
        let body = format!("data:text/csv;base64,{}", encoded(CSV));
        assert_eq!(decode_relay_body(body, false).unwrap(), CSV);
    }

    #[test]
    fn data_url_padding_is_optional() {
        let padded = encoded("id,na");
        let trimmed = padded.trim_end_matches('=');
        assert_ne!(padded, trimmed);
        let decoded = decode_data_url(&format!("data:text/csv;base64,{trimmed}")).unwrap();
        assert_eq!(decoded, "id,na");
    }

    #[test]
    fn non_base64_data_urls_are_kept_verbatim() {
        let raw = "data:text/csv,id,name";
        assert_eq!(decode_data_url(raw).unwrap(), raw);
    }

    #[test]
    fn invalid_base64_is_a_relay_failure() {
        let err = decode_relay_body("data:text/csv;base64,@@@@".into(), false).unwrap_err();
        assert_eq!(err, FetchError::InvalidDataUrl);
    }

    #[test]
    fn json_envelopes_yield_their_content_field() {
        let body = serde_json::json!({ "contents": CSV, "status": { "http_code": 200 } });
        assert_eq!(decode_relay_body(body.to_string(), true).unwrap(), CSV);

        let body = serde_json::json!({ "contents": "", "data": CSV });
        assert_eq!(decode_relay_body(body.to_string(), true).unwrap(), CSV);
    }

    #[test]
    fn json_content_may_itself_be_a_data_url() {
        let body = serde_json::json!({
            "contents": format!("data:text/csv;base64,{}", encoded(CSV)),
        });
        assert_eq!(decode_relay_body(body.to_string(), true).unwrap(), CSV);
    }

    #[test]
    fn non_string_content_is_reserialised() {
        let body = serde_json::json!({ "data": { "rows": 1 } });
        assert_eq!(decode_relay_body(body.to_string(), true).unwrap(), r#"{"rows":1}"#);
    }

    #[test]
    fn json_without_content_fields_keeps_raw_text() {
        let body = r#"{"error":"quota"}"#;
        assert_eq!(decode_relay_body(body.into(), true).unwrap(), body);
    }

    #[test]
    fn unparsable_json_falls_back_to_raw_text() {
        assert_eq!(decode_relay_body(CSV.to_string(), true).unwrap(), CSV);
    }

    #[test]
    fn whitespace_only_bodies_are_rejected() {
        assert_eq!(
            decode_relay_body("  \n".into(), false).unwrap_err(),
            FetchError::EmptyBody
        );
        let body = serde_json::json!({ "contents": "   " });
        assert_eq!(
            decode_relay_body(body.to_string(), true).unwrap_err(),
            FetchError::EmptyBody
        );
    }

    #[test]
    fn csv_checks_reject_html_and_headerless_text() {
        assert_eq!(check_csv(CSV), Ok(()));
        assert_eq!(check_csv("  <html><body>denied"), Err(CsvRejection::Html));
        assert_eq!(
            check_csv("id,name\n<!DOCTYPE html>"),
            Err(CsvRejection::Html)
        );
        assert_eq!(check_csv(" \n\t"), Err(CsvRejection::Empty));
        assert_eq!(check_csv("   \nid,name\n"), Err(CsvRejection::MissingHeader));
    }
}
