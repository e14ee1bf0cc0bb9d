use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Debug, Display, Formatter};
use uuid::Uuid;

use crate::common::{Value, DOC_ID};
use crate::errors::{DocshardError, DocshardResult, ErrorKind};

/// Represents a single schema-less record: an insertion-ordered mapping of
/// string keys to [Value].
///
/// Documents are the basic unit of data in docshard. Keys are case-sensitive
/// and no uniqueness constraint besides the reserved `_id` field is enforced;
/// even `_id` uniqueness itself is never checked (a collision of two randomly
/// generated UUIDs is only statistically unlikely).
///
/// The reserved `_id` field holds the unique identifier of the document. If it
/// is absent at insertion time the owning [Collection](super::Collection)
/// assigns a fresh UUID v4 string.
///
/// Key order is preserved: a document serializes its fields in the order they
/// were inserted, and a document parsed from JSON keeps the file order.
///
/// # Examples
///
/// ```ignore
/// let mut doc = Document::new();
/// doc.put("name", "Alice")?;
/// doc.put("age", 30)?;
/// assert_eq!(doc.get("name"), Some(&Value::String("Alice".to_string())));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    /// Parses a document from a JSON object string.
    ///
    /// # Errors
    ///
    /// Returns a [ErrorKind::ParseError] if the input is not a single valid
    /// JSON object.
    pub fn parse(json: &str) -> DocshardResult<Document> {
        let doc: Document = serde_json::from_str(json.trim())?;
        Ok(doc)
    }

    /// Associates the specified [Value] with the specified key in this
    /// document. If the key already exists, its value is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> DocshardResult<()> {
        let key = key.into();
        // key cannot be empty
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(DocshardError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }

        self.data.insert(key, value.into());
        Ok(())
    }

    /// Returns the [Value] associated with the key, or `None` if this document
    /// contains no mapping for the key. Lookup is top-level only.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Removes the mapping for the key, returning the previous value if any.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the value of the reserved `_id` field, if present.
    pub fn id(&self) -> Option<&Value> {
        self.data.get(DOC_ID)
    }

    pub fn has_id(&self) -> bool {
        self.data.contains_key(DOC_ID)
    }

    /// Returns the `_id` of this document, generating and storing a fresh
    /// UUID v4 string when the field is absent. An existing `_id` is left
    /// unchanged whatever its type.
    pub fn ensure_id(&mut self) -> Value {
        if !self.data.contains_key(DOC_ID) {
            let id = Uuid::new_v4().to_string();
            self.data.insert(DOC_ID.to_string(), Value::String(id));
        }
        self.data.get(DOC_ID).cloned().unwrap_or(Value::Null)
    }

    /// Checks whether this document matches the query: for every key present
    /// in the query, this document must contain that key with an equal value.
    /// Missing query keys impose no constraint, so an empty query matches
    /// everything. Equality only, top-level keys only.
    pub fn matches(&self, query: &Document) -> bool {
        query
            .data
            .iter()
            .all(|(key, expected)| self.data.get(key) == Some(expected))
    }

    // Inserts without the empty-key check; used when rebuilding documents
    // from already-validated JSON.
    pub(crate) fn insert_raw(&mut self, key: String, value: Value) {
        self.data.insert(key, value);
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(std::fmt::Error),
        }
    }
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.data.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Document, D::Error>
    where
        D: Deserializer<'de>,
    {
        let data = IndexMap::<String, Value>::deserialize(deserializer)?;
        Ok(Document { data })
    }
}

/// Strips surrounding double quotes from a stringified macro key, so that both
/// `doc!{ name: 1 }` and `doc!{ "name": 1 }` produce the key `name`.
pub fn normalize(key: &str) -> String {
    key.trim_matches('"').to_string()
}

/// Creates a [Document] from key-value pairs.
///
/// Keys can be bare identifiers or string literals; values can be literals,
/// parenthesized expressions, nested `{...}` documents or `[...]` arrays.
///
/// # Examples
///
/// ```ignore
/// let doc = doc!{
///     name: "Alice",
///     age: 30,
///     address: { city: "New York", zip: 10001 },
///     tags: ["admin", "user"]
/// };
/// ```
#[macro_export]
macro_rules! doc {
    // match an empty document (with braces)
    ({}) => {
        $crate::collection::Document::new()
    };

    // match an empty document
    () => {
        $crate::collection::Document::new()
    };

    // match a document with key value pairs (outer braces variant)
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    // match a document with key value pairs
    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.put($crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                    .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the `doc!` macro.
/// Handles nested documents, arrays, and expressions.
#[macro_export]
macro_rules! doc_value {
    // match a nested document
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    // match an array of values
    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    // match an expression (variable, function call, literal, etc.)
    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
