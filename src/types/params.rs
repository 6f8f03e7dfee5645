// src/types/params.rs
//! Request parameters as an ordered, strongly typed mapping.

use crate::constants::MULTI_VALUE_SEPARATOR;
use crate::error::Result;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// A file attached to an upload request.
#[derive(Clone, PartialEq, Eq)]
pub struct FilePayload {
    file_name: String,
    mime: Option<String>,
    bytes: Vec<u8>,
}

impl FilePayload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: None,
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk, naming the part after the file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }

    pub fn with_mime(self, mime: impl Into<String>) -> Self {
        Self {
            mime: Some(mime.into()),
            ..self
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

// Upload bodies can be megabytes; never dump them into logs.
impl fmt::Debug for FilePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePayload")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    /// Multi-valued parameter, sent joined with `|`
    List(Vec<String>),
    /// Sent as a multipart file part
    File(FilePayload),
}

impl ParamValue {
    /// The form-encoded representation, or `None` for file payloads.
    pub fn to_wire(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Int(number) => Some(number.to_string()),
            Self::List(items) => Some(items.join(MULTI_VALUE_SEPARATOR)),
            Self::File(_) => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// Converts a continuation token taken from a response back into a value.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text.clone()),
            Value::Number(number) => match number.as_i64() {
                Some(int) => Self::Int(int),
                None => Self::Text(number.to_string()),
            },
            Value::Array(items) => Self::List(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            Value::Null => Self::Text(String::new()),
            other => Self::Text(other.to_string()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for ParamValue {
    fn from(value: &[&str]) -> Self {
        Self::List(value.iter().map(|item| item.to_string()).collect())
    }
}

impl From<FilePayload> for ParamValue {
    fn from(value: FilePayload) -> Self {
        Self::File(value)
    }
}

/// Ordered mapping of parameter names to values.
///
/// Insertion order is kept so the wire form is stable and easy to read in
/// logs. Every continuation round is built as a fresh `Params` from a base
/// set plus an overlay; nothing is mutated across rounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(IndexMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chained insert for building parameter sets inline.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts or replaces a parameter, returning the previous value.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Option<ParamValue> {
        self.0.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.0.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// The wire form of a parameter, if present and not a file.
    pub fn get_wire(&self, name: &str) -> Option<String> {
        self.0.get(name).and_then(ParamValue::to_wire)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// A new set holding `self` with every entry of `overlay` applied on top.
    pub fn overlay(&self, overlay: &Params) -> Params {
        let mut merged = self.clone();
        for (name, value) in overlay.iter() {
            merged.insert(name, value.clone());
        }
        merged
    }

    /// Splits into form fields and file parts.
    pub fn split_files(&self) -> (Vec<(String, String)>, Vec<(String, FilePayload)>) {
        let mut fields = Vec::with_capacity(self.len());
        let mut files = Vec::new();
        for (name, value) in self.iter() {
            match value {
                ParamValue::File(payload) => files.push((name.to_string(), payload.clone())),
                other => {
                    if let Some(wire) = other.to_wire() {
                        fields.push((name.to_string(), wire));
                    }
                }
            }
        }
        (fields, files)
    }

    pub fn has_files(&self) -> bool {
        self.0.values().any(ParamValue::is_file)
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lists_are_joined_with_pipes() {
        let value = ParamValue::from(vec!["general", "namespaces"]);
        assert_eq!(value.to_wire().as_deref(), Some("general|namespaces"));
    }

    #[test]
    fn overlay_replaces_and_appends_without_touching_base() {
        let base = Params::new().with("action", "query").with("cmlimit", 500);
        let overlay = Params::new().with("cmlimit", 10).with("cmcontinue", "abc");

        let merged = base.overlay(&overlay);

        assert_eq!(merged.get_wire("cmlimit").as_deref(), Some("10"));
        assert_eq!(merged.get_wire("cmcontinue").as_deref(), Some("abc"));
        assert_eq!(base.get_wire("cmlimit").as_deref(), Some("500"));
        assert!(!base.contains("cmcontinue"));
    }

    #[test]
    fn files_are_split_from_form_fields() {
        let params = Params::new()
            .with("action", "upload")
            .with("file", FilePayload::new("a.png", vec![1u8, 2, 3]));

        let (fields, files) = params.split_files();

        assert_eq!(fields, vec![("action".to_string(), "upload".to_string())]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].1.file_name(), "a.png");
        assert!(params.has_files());
    }

    #[test]
    fn file_payloads_are_read_from_disk() {
        let path = std::env::temp_dir().join("wikiq-upload-test.txt");
        std::fs::write(&path, b"hello").unwrap();

        let payload = FilePayload::from_path(&path).unwrap();
        assert_eq!(payload.file_name(), "wikiq-upload-test.txt");
        assert_eq!(payload.bytes(), b"hello");

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            FilePayload::from_path(&path),
            Err(crate::error::WikiError::Io(_))
        ));
    }

    #[test]
    fn continuation_tokens_keep_their_json_type() {
        assert_eq!(ParamValue::from_json(&json!("abc|1")), ParamValue::Text("abc|1".into()));
        assert_eq!(ParamValue::from_json(&json!(42)), ParamValue::Int(42));
    }
}
