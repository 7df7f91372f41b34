use serde::{Deserialize, Serialize};

/// Longest value, in bytes, the store accepts for a single attribute.
pub const MAX_VALUE_LEN: usize = 1020;

/// Separator between an attribute name and its chunk number.
const CHUNK_SEPARATOR: char = '*';

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A single item to write: its name in the store plus its attributes, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub attributes: Vec<Attribute>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Record {
            id: id.into(),
            attributes: Vec::new(),
        }
    }

    /// Adds an attribute, splitting it into chunks if the value is too long.
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.push_attribute(name, value);
        self
    }

    pub fn push_attribute(&mut self, name: &str, value: &str) {
        self.attributes.extend(chunk_value(name, value));
    }

    /// Rebuilds the value of `name` from its chunks, if the record has one.
    pub fn value(&self, name: &str) -> Option<String> {
        reassemble(name, &self.attributes)
    }
}

/// Splits `value` into attributes of at most [`MAX_VALUE_LEN`] bytes.
///
/// The first chunk keeps `name`, following chunks are named `name*1`, `name*2`, ...
/// Chunks always end on a character boundary.
pub fn chunk_value(name: &str, value: &str) -> Vec<Attribute> {
    if value.len() <= MAX_VALUE_LEN {
        return vec![Attribute::new(name, value)];
    }

    let mut chunks = Vec::with_capacity(value.len() / MAX_VALUE_LEN + 1);
    let mut rest = value;
    while !rest.is_empty() {
        let mut end = rest.len().min(MAX_VALUE_LEN);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }

        let chunk_name = match chunks.len() {
            0 => name.to_string(),
            n => format!("{name}{CHUNK_SEPARATOR}{n}"),
        };
        chunks.push(Attribute::new(chunk_name, &rest[..end]));
        rest = &rest[end..];
    }

    chunks
}

/// Concatenates the chunks of `name` found in `attributes`, ordered by chunk number.
pub fn reassemble(name: &str, attributes: &[Attribute]) -> Option<String> {
    let mut chunks: Vec<(usize, &str)> = attributes
        .iter()
        .filter_map(|attr| chunk_number(name, &attr.name).map(|n| (n, attr.value.as_str())))
        .collect();

    if chunks.is_empty() {
        return None;
    }

    chunks.sort_by_key(|(n, _)| *n);
    Some(chunks.into_iter().map(|(_, value)| value).collect())
}

fn chunk_number(name: &str, candidate: &str) -> Option<usize> {
    let suffix = candidate.strip_prefix(name)?;
    if suffix.is_empty() {
        return Some(0);
    }

    suffix.strip_prefix(CHUNK_SEPARATOR)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_values_stay_whole() {
        let value = "x".repeat(MAX_VALUE_LEN);
        let chunks = chunk_value("body", &value);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].name, "body");
        assert_eq!(reassemble("body", &chunks), Some(value));
    }

    #[test]
    fn one_byte_over_the_limit_splits() {
        let value = "y".repeat(MAX_VALUE_LEN + 1);
        let chunks = chunk_value("body", &value);

        let names: Vec<&str> = chunks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["body", "body*1"]);
        assert_eq!(chunks[0].value.len(), MAX_VALUE_LEN);
        assert_eq!(chunks[1].value, "y");
        assert_eq!(reassemble("body", &chunks), Some(value));
    }

    #[test]
    fn chunks_reassemble_regardless_of_stored_order() {
        let value: String = (0..5000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let mut chunks = chunk_value("text", &value);
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[4].name, "text*4");

        chunks.reverse();
        chunks.push(Attribute::new("textual", "not a chunk"));
        assert_eq!(reassemble("text", &chunks), Some(value));
    }

    #[test]
    fn multibyte_text_is_not_split_mid_character() {
        let value = "😊".repeat(300);
        let chunks = chunk_value("emoji", &value);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.value.len() <= MAX_VALUE_LEN);
        }
        assert_eq!(reassemble("emoji", &chunks), Some(value));
    }

    #[test]
    fn missing_attribute_reassembles_to_none() {
        let record = Record::new("1").with_attribute("first", "1");

        assert_eq!(record.value("first"), Some("1".to_string()));
        assert_eq!(record.value("second"), None);
    }
}
