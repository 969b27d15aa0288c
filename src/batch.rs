//! Normalization of inbound log batches into line-delimited payloads.

use log::warn;
use serde_json::Value;
use serde_json::value::RawValue;

/// How raw input bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum InputFormat {
    /// Newline-delimited text.
    #[default]
    Text,
    /// A JSON document: an array of records, a string, or a single object.
    Json,
}

/// A log batch as handed over by the host, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum LogBatch {
    /// A single text blob, one record per line.
    Text(String),
    /// Raw bytes, decoded as UTF-8.
    Binary(Vec<u8>),
    /// Any structured value that is not a sequence of records.
    Structured(Value),
    /// Records that are already split. Used as-is.
    Lines(Vec<String>),
}

impl LogBatch {
    /// Maps a parsed JSON document onto a batch shape.
    ///
    /// Arrays become [`LogBatch::Lines`] (string elements verbatim, everything
    /// else as its JSON text), strings become [`LogBatch::Text`], and any other
    /// value is kept as [`LogBatch::Structured`].
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(items) => LogBatch::Lines(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            Value::String(s) => LogBatch::Text(s),
            other => LogBatch::Structured(other),
        }
    }

    /// Wraps raw input bytes according to `format`.
    ///
    /// Records of a JSON array keep their original text. Input that fails to
    /// parse as JSON is forwarded as text.
    pub fn from_input(raw: Vec<u8>, format: InputFormat) -> Self {
        match format {
            InputFormat::Text => LogBatch::Binary(raw),
            InputFormat::Json => {
                if let Ok(records) = serde_json::from_slice::<Vec<Box<RawValue>>>(&raw) {
                    return LogBatch::Lines(records.iter().map(|r| raw_record(r)).collect());
                }
                match serde_json::from_slice::<Value>(&raw) {
                    Ok(value) => LogBatch::from_json(value),
                    Err(e) => {
                        warn!("Input is not valid JSON ({}), forwarding it as text", e);
                        LogBatch::Binary(raw)
                    }
                }
            }
        }
    }

    /// Converts the batch into its ordered sequence of lines.
    pub fn normalize(self) -> Vec<String> {
        match self {
            LogBatch::Text(text) => split_lines(&text),
            LogBatch::Binary(bytes) => split_lines(&String::from_utf8_lossy(&bytes)),
            LogBatch::Structured(value) => split_lines(&value.to_string()),
            LogBatch::Lines(lines) => lines,
        }
    }
}

impl From<String> for LogBatch {
    fn from(text: String) -> Self {
        LogBatch::Text(text)
    }
}

impl From<&str> for LogBatch {
    fn from(text: &str) -> Self {
        LogBatch::Text(text.to_string())
    }
}

impl From<Vec<u8>> for LogBatch {
    fn from(bytes: Vec<u8>) -> Self {
        LogBatch::Binary(bytes)
    }
}

impl From<Vec<String>> for LogBatch {
    fn from(lines: Vec<String>) -> Self {
        LogBatch::Lines(lines)
    }
}

/// One array record as a line: strings unescaped, anything else verbatim.
/// A record spanning several lines is compacted so it stays a single line.
fn raw_record(record: &RawValue) -> String {
    let text = record.get();
    if let Ok(s) = serde_json::from_str::<String>(text) {
        return s;
    }
    if text.contains(['\n', '\r']) {
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            return value.to_string();
        }
    }
    text.to_string()
}

/// Trims the blob (byte order mark included) and splits it on `\n`. A blank
/// blob is an empty batch.
fn split_lines(text: &str) -> Vec<String> {
    let trimmed = text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('\n').map(str::to_string).collect()
}

/// Joins normalized lines into the request body.
pub fn to_payload(lines: &[String]) -> String {
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_text_is_trimmed_and_split() {
        let batch = LogBatch::from("  {\"a\":1}\n{\"b\":2}\n");
        assert_eq!(batch.normalize(), lines(&["{\"a\":1}", "{\"b\":2}"]));
    }

    #[test]
    fn test_text_keeps_interior_blank_lines() {
        let batch = LogBatch::from("one\n\ntwo");
        assert_eq!(batch.normalize(), lines(&["one", "", "two"]));
    }

    #[test]
    fn test_binary_matches_text() {
        let text = "first line\nsecond line\n";
        let from_text = LogBatch::from(text).normalize();
        let from_bytes = LogBatch::from(text.as_bytes().to_vec()).normalize();
        assert_eq!(from_text, from_bytes);
    }

    #[test]
    fn test_binary_invalid_utf8_is_replaced() {
        let batch = LogBatch::Binary(vec![b'o', b'k', 0xff, b'\n', b'x']);
        assert_eq!(batch.normalize(), lines(&["ok\u{fffd}", "x"]));
    }

    #[test]
    fn test_structured_value_is_serialized() {
        let value = json!({"message": "hello\nworld", "level": "info"});
        let expected = value.to_string();

        let normalized = LogBatch::Structured(value).normalize();

        // Newlines inside strings are escaped by the serializer, so one line results.
        assert_eq!(normalized, vec![expected]);
    }

    #[test]
    fn test_lines_pass_through_untouched() {
        let input = lines(&["  padded  ", "", "last"]);
        assert_eq!(LogBatch::from(input.clone()).normalize(), input);
    }

    #[test]
    fn test_blank_input_is_empty_batch() {
        assert!(LogBatch::from("").normalize().is_empty());
        assert!(LogBatch::from(" \n\t\n").normalize().is_empty());
        assert!(LogBatch::Binary(Vec::new()).normalize().is_empty());
    }

    #[test]
    fn test_from_json_array_becomes_lines() {
        let batch = LogBatch::from_json(json!(["a", {"b": 1}, 2]));
        assert_eq!(batch, LogBatch::Lines(lines(&["a", "{\"b\":1}", "2"])));
    }

    #[test]
    fn test_from_json_string_becomes_text() {
        let batch = LogBatch::from_json(json!("x\ny\n"));
        assert_eq!(batch.normalize(), lines(&["x", "y"]));
    }

    #[test]
    fn test_from_json_object_stays_structured() {
        let value = json!({"k": "v"});
        assert_eq!(
            LogBatch::from_json(value.clone()),
            LogBatch::Structured(value)
        );
    }

    #[test]
    fn test_from_input_text_is_binary() {
        let batch = LogBatch::from_input(b"a\nb".to_vec(), InputFormat::Text);
        assert_eq!(batch, LogBatch::Binary(b"a\nb".to_vec()));
    }

    #[test]
    fn test_from_input_json_array() {
        let batch = LogBatch::from_input(br#"["a", "b"]"#.to_vec(), InputFormat::Json);
        assert_eq!(batch.normalize(), lines(&["a", "b"]));
    }

    #[test]
    fn test_from_input_bad_json_falls_back_to_text() {
        let batch = LogBatch::from_input(b"not json\nat all".to_vec(), InputFormat::Json);
        assert_eq!(batch.normalize(), lines(&["not json", "at all"]));
    }

    #[test]
    fn test_from_input_json_records_keep_key_order_and_numbers() {
        let raw = br#"[{"z":1,"a":2,"n":12345678901234567890123}, "plain"]"#.to_vec();

        let normalized = LogBatch::from_input(raw, InputFormat::Json).normalize();

        assert_eq!(
            normalized,
            lines(&[r#"{"z":1,"a":2,"n":12345678901234567890123}"#, "plain"])
        );
    }

    #[test]
    fn test_from_input_json_multiline_record_is_compacted() {
        let raw = b"[\n  {\n    \"z\": 1,\n    \"a\": 2\n  }\n]".to_vec();

        let normalized = LogBatch::from_input(raw, InputFormat::Json).normalize();

        assert_eq!(normalized, lines(&[r#"{"z":1,"a":2}"#]));
    }

    #[test]
    fn test_from_json_object_keeps_key_order() {
        let value: Value = serde_json::from_str(r#"{"z":1,"a":2}"#).unwrap();
        assert_eq!(
            LogBatch::Structured(value).normalize(),
            lines(&[r#"{"z":1,"a":2}"#])
        );
    }

    #[test]
    fn test_binary_leading_bom_is_trimmed() {
        let batch = LogBatch::Binary("\u{feff}{\"a\":1}\n{\"b\":2}\n".as_bytes().to_vec());
        assert_eq!(batch.normalize(), lines(&[r#"{"a":1}"#, r#"{"b":2}"#]));
    }

    #[test]
    fn test_to_payload_joins_with_newline() {
        assert_eq!(to_payload(&lines(&["a", "b", "c"])), "a\nb\nc");
        assert_eq!(to_payload(&[]), "");
    }
}
