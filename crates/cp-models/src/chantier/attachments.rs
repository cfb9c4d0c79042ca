//! Photo and PDF attachments
//!
//! The remote store holds attachments as JSON-encoded text, and older
//! records carry bare data URIs instead of objects. Both shapes are
//! normalized into the tagged structs below on ingestion.

use serde::de::Deserializer;
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A photo (data URI) with an optional comment
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub data: String,
    #[serde(default)]
    pub comment: String,
}

impl ImageAttachment {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            comment: String::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    fn from_entry(entry: Value) -> Option<Self> {
        let image = match entry {
            Value::String(data) => Self::new(data),
            Value::Object(map) => Self {
                data: string_field(&map, &["data", "src"]),
                comment: string_field(&map, &["comment"]),
            },
            _ => return None,
        };
        (!image.data.is_empty()).then_some(image)
    }
}

/// A PDF document (data URI content) with its file name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PdfAttachment {
    #[serde(default)]
    pub name: String,
    pub content: String,
}

impl PdfAttachment {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    fn from_entry(entry: Value) -> Option<Self> {
        let pdf = match entry {
            Value::String(content) => Self::new("", content),
            Value::Object(map) => Self {
                name: string_field(&map, &["name"]),
                content: string_field(&map, &["content", "data"]),
            },
            _ => return None,
        };
        (!pdf.content.is_empty()).then_some(pdf)
    }
}

fn string_field(map: &serde_json::Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

/// Flatten the accepted attachment shapes into a list of raw entries
fn entries(value: Option<Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items,
        Some(Value::Object(map)) => vec![Value::Object(map)],
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Vec::new();
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Array(items)) => items,
                Ok(object @ Value::Object(_)) => vec![object],
                Ok(Value::Null) => Vec::new(),
                // a lone data URI
                _ => vec![Value::String(text)],
            }
        }
        _ => Vec::new(),
    }
}

pub(crate) fn deserialize_images<'de, D>(deserializer: D) -> Result<Vec<ImageAttachment>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(entries(value)
        .into_iter()
        .filter_map(ImageAttachment::from_entry)
        .collect())
}

pub(crate) fn deserialize_pdfs<'de, D>(deserializer: D) -> Result<Vec<PdfAttachment>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(entries(value)
        .into_iter()
        .filter_map(PdfAttachment::from_entry)
        .collect())
}

/// Attachments travel as a JSON-encoded string
pub(crate) fn serialize_as_json_string<T, S>(items: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    let encoded = serde_json::to_string(items).map_err(S::Error::custom)?;
    serializer.serialize_str(&encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_images_from_encoded_string() {
        let raw = json!(r#"[{"data":"data:image/png;base64,AAA","comment":"north wall"},"data:image/png;base64,BBB"]"#);
        let images: Vec<ImageAttachment> = entries(Some(raw))
            .into_iter()
            .filter_map(ImageAttachment::from_entry)
            .collect();

        assert_eq!(
            images,
            vec![
                ImageAttachment::new("data:image/png;base64,AAA").with_comment("north wall"),
                ImageAttachment::new("data:image/png;base64,BBB"),
            ]
        );
    }

    #[test]
    fn test_bare_data_uri_and_garbage() {
        let images: Vec<ImageAttachment> = entries(Some(json!("data:image/jpeg;base64,CCC")))
            .into_iter()
            .filter_map(ImageAttachment::from_entry)
            .collect();
        assert_eq!(images.len(), 1);

        assert!(entries(Some(json!(""))).is_empty());
        assert!(entries(Some(json!(42))).is_empty());
        assert!(entries(None).is_empty());
    }

    #[test]
    fn test_pdfs_from_array() {
        let pdfs: Vec<PdfAttachment> = entries(Some(json!([
            {"name": "devis.pdf", "content": "data:application/pdf;base64,JVBE"},
            {"name": "empty.pdf"},
            7
        ])))
        .into_iter()
        .filter_map(PdfAttachment::from_entry)
        .collect();

        assert_eq!(
            pdfs,
            vec![PdfAttachment::new("devis.pdf", "data:application/pdf;base64,JVBE")]
        );
    }
}
