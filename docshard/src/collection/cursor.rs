use std::fmt::{Display, Formatter};

use crate::collection::{Collection, Document};
use crate::common::Value;

/// A one-shot, eagerly computed query result over a [Collection].
///
/// A cursor is not a live view: it snapshots the matching documents at
/// construction time, so mutations to the source collection afterwards are not
/// reflected. The result documents are independent copies of the stored ones,
/// so projecting a field away never mutates the collection.
///
/// Construction evaluates the query immediately:
/// 1. **Matching**: a document matches iff, for every key present in the
///    query, it contains that key with an equal value (top-level equality
///    only; an empty query matches everything).
/// 2. **Projection**: every key whose projection value equals numeric `0` or
///    `false` is removed from the matching document copy. Any other
///    projection value is ignored; this is an exclusion-only projection.
///
/// Iteration is sequential, single-pass and forward-only; re-iterating
/// requires a new cursor.
#[derive(Clone, Debug)]
pub struct Cursor {
    documents: Vec<Document>,
    pos: usize,
}

impl Cursor {
    /// Runs `query` and `projection` against the collection, snapshotting the
    /// filtered and projected result set in collection order.
    pub fn new(collection: &Collection, query: Document, projection: Document) -> Cursor {
        let excluded: Vec<String> = projection
            .iter()
            .filter(|(_, value)| is_excluding(value))
            .map(|(key, _)| key.to_string())
            .collect();

        let mut documents = Vec::new();
        for stored in collection.documents() {
            if !stored.matches(&query) {
                continue;
            }

            // independent copy so projection cannot touch the stored document
            let mut doc = stored.clone();
            for key in &excluded {
                doc.remove(key);
            }
            documents.push(doc);
        }

        Cursor { documents, pos: 0 }
    }

    /// The total number of documents in this result set, independent of how
    /// far it has been iterated. Named apart from [Iterator::count], which
    /// would consume the cursor and report only the remaining items.
    pub fn size(&self) -> usize {
        self.documents.len()
    }

    /// Whether a subsequent [Cursor::next] will yield a document.
    pub fn has_next(&self) -> bool {
        self.pos < self.documents.len()
    }

    /// Yields the next document of the result set.
    pub fn next(&mut self) -> Option<Document> {
        self.advance()
    }

    /// Removes a specific document from this result set only; the underlying
    /// collection is unaffected. Returns whether the document was present.
    pub fn remove(&mut self, doc: &Document) -> bool {
        match self.documents.iter().position(|candidate| candidate == doc) {
            Some(idx) => {
                self.documents.remove(idx);
                if idx < self.pos {
                    self.pos -= 1;
                }
                true
            }
            None => false,
        }
    }

    fn advance(&mut self) -> Option<Document> {
        let doc = self.documents.get(self.pos).cloned()?;
        self.pos += 1;
        Some(doc)
    }
}

/// A projection value excludes its key when it is numeric `0` or `false`;
/// everything else is ignored.
fn is_excluding(value: &Value) -> bool {
    *value == Value::I64(0) || *value == Value::Bool(false)
}

impl Iterator for Cursor {
    type Item = Document;

    fn next(&mut self) -> Option<Document> {
        self.advance()
    }
}

impl Display for Cursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(&self.documents) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(std::fmt::Error),
        }
    }
}
