use serde_json::Value;
use thiserror::Error;

const UID_PREFIX: &str = "UID:";

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid JSON record: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("JSON record has no usable \"id\" field")]
    MissingId,

    #[error("record carries an empty identifier")]
    EmptyIdentifier,

    #[error("unrecognised record {0:?}")]
    Unrecognized(String),
}

/// Parses one input line into a scanned identifier.
///
/// `Ok(None)` means the line was blank after cleanup.
pub fn parse_record(line: &str) -> Result<Option<String>, ParseError> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let line = line.strip_prefix('"').unwrap_or(line);
    let text = line.strip_suffix('"').unwrap_or(line).trim();
    if text.is_empty() {
        return Ok(None);
    }

    if let Some(rest) = text.strip_prefix(UID_PREFIX) {
        let id = rest.split_whitespace().collect::<String>();
        return non_empty(id).map(Some);
    }

    if text.starts_with('{') && text.ends_with('}') {
        let value: Value = serde_json::from_str(text)?;
        let id = match value.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => return Err(ParseError::MissingId),
        };
        return non_empty(id).map(Some);
    }

    Err(ParseError::Unrecognized(text.to_owned()))
}

fn non_empty(id: String) -> Result<String, ParseError> {
    if id.is_empty() {
        Err(ParseError::EmptyIdentifier)
    } else {
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(line: &str) -> Option<String> {
        parse_record(line).expect("record parses")
    }

    #[test]
    fn uid_records_drop_all_whitespace() {
        assert_eq!(id("UID: 04 A2 1B FF"), Some("04A21BFF".to_owned()));
        assert_eq!(id("UID:04a21bff\r"), Some("04a21bff".to_owned()));
    }

    #[test]
    fn json_records_accept_string_and_number_ids() {
        assert_eq!(id(r#"{"id": "card-7"}"#), Some("card-7".to_owned()));
        assert_eq!(id(r#"{"id": 42, "rssi": -60}"#), Some("42".to_owned()));
    }

    #[test]
    fn surrounding_quotes_are_stripped_once() {
        assert_eq!(id("\"UID:abc\""), Some("abc".to_owned()));
        assert_eq!(id("\"  UID:abc  \""), Some("abc".to_owned()));
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(id(""), None);
        assert_eq!(id("   \r"), None);
        assert_eq!(id("\"\""), None);
    }

    #[test]
    fn malformed_records_are_errors() {
        assert!(matches!(parse_record("{\"id\": }"), Err(ParseError::InvalidJson(_))));
        assert!(matches!(parse_record("{\"uid\": \"x\"}"), Err(ParseError::MissingId)));
        assert!(matches!(parse_record("{\"id\": null}"), Err(ParseError::MissingId)));
        assert!(matches!(parse_record("UID:   "), Err(ParseError::EmptyIdentifier)));
        assert!(matches!(parse_record("{\"id\": \"\"}"), Err(ParseError::EmptyIdentifier)));
        assert!(matches!(parse_record("reader ready"), Err(ParseError::Unrecognized(_))));
    }
}
