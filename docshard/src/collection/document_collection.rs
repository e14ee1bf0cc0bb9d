use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::collection::{Cursor, Document, UpdateOptions};
use crate::common::{Value, COLLECTION_EXTENSION, DOC_ID};
use crate::errors::{DocshardError, DocshardResult, ErrorKind};

/// On-disk shape of a collection file: a single JSON object with an `options`
/// object and a `documents` array in collection order.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CollectionBody {
    #[serde(default)]
    options: Document,
    #[serde(default)]
    documents: Vec<Document>,
}

/// An ordered, in-memory sequence of [Document]s backed by one JSON file on
/// disk.
///
/// A collection is identified by a base directory path and a file name. Its
/// lifecycle is explicit: [Collection::load] replaces the in-memory state from
/// the backing file, [Collection::save] serializes the full state back in one
/// write, and [Collection::connect_to] repoints the same object at a different
/// file. Switching away from unsaved data is the caller's responsibility:
/// the collection performs no autosave.
///
/// The persistence policy is: reads never fabricate a file (a missing file is
/// treated as an empty collection, and `connect_to` refuses a non-existent
/// target), while writes always create missing parent directories and the
/// file itself. Saving is not atomic; a crash mid-write can corrupt the file.
///
/// The `options` mapping is reserved for future use: it is persisted and
/// reloaded but otherwise unused.
#[derive(Clone, Debug)]
pub struct Collection {
    base_path: PathBuf,
    file_name: String,
    options: Document,
    documents: Vec<Document>,
}

impl Collection {
    /// Creates a collection bound to `<base_path>/<name>` with empty in-memory
    /// state. The backing file does not have to exist yet; a subsequent
    /// [Collection::load] of a missing file simply yields an empty collection.
    pub fn new(base_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Collection {
            base_path: base_path.into(),
            file_name: name.into(),
            options: Document::new(),
            documents: Vec::new(),
        }
    }

    /// Rebinds this collection to a different file on the same or a different
    /// base path. Fails with [ErrorKind::FileNotFound] when the target file
    /// does not exist, leaving the current binding unchanged; reads never
    /// fabricate a file.
    pub fn connect_to(
        &mut self,
        base_path: impl Into<PathBuf>,
        name: &str,
    ) -> DocshardResult<()> {
        let base_path = base_path.into();
        let candidate = base_path.join(name);
        if !candidate.is_file() {
            return Err(DocshardError::new(
                &format!("Collection file does not exist: {}", candidate.display()),
                ErrorKind::FileNotFound,
            ));
        }

        self.base_path = base_path;
        self.file_name = name.to_string();
        Ok(())
    }

    /// Replaces the in-memory state from the backing file.
    ///
    /// The file is parsed as a single JSON object with optional `documents`
    /// and `options` fields. A missing file or malformed JSON yields an empty
    /// collection, never an error. Document order in the array is collection
    /// order.
    pub fn load(&mut self) -> DocshardResult<()> {
        self.options = Document::new();
        self.documents = Vec::new();

        let path = self.path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str::<CollectionBody>(&contents) {
            Ok(body) => {
                self.options = body.options;
                self.documents = body.documents;
            }
            Err(err) => {
                log::warn!(
                    "Malformed collection file {}: {}; starting empty",
                    path.display(),
                    err
                );
            }
        }

        Ok(())
    }

    /// Serializes the full in-memory state to the backing file as one JSON
    /// write, creating missing parent directories and the file. The write is
    /// flushed and fsynced to stable storage before this returns.
    ///
    /// Saving is deliberately not atomic (no write-to-temp-then-rename); a
    /// crash mid-write can corrupt the file.
    pub fn save(&self) -> DocshardResult<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let body = CollectionBody {
            options: self.options.clone(),
            documents: self.documents.clone(),
        };

        let mut file = fs::File::create(&path)?;
        file.write_all(serde_json::to_string(&body)?.as_bytes())?;
        file.flush()?;
        file.sync_all()?;

        log::debug!(
            "Saved {} document(s) to {}",
            self.documents.len(),
            path.display()
        );
        Ok(())
    }

    /// Deletes the backing file. Returns whether the deletion succeeded.
    /// In-memory state is left untouched.
    pub fn drop_collection(&self) -> bool {
        match fs::remove_file(self.path()) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Failed to delete {}: {}", self.path().display(), err);
                false
            }
        }
    }

    /// Inserts a document at the end of the collection, assigning a fresh
    /// UUID v4 `_id` when the document does not carry one. Returns the
    /// document's id value. Uniqueness of a caller-supplied `_id` is never
    /// checked.
    pub fn insert(&mut self, mut doc: Document) -> DocshardResult<Value> {
        let id = doc.ensure_id();
        self.documents.push(doc);
        Ok(id)
    }

    /// Inserts a sequence of documents, returning their id values in order.
    pub fn insert_many(
        &mut self,
        docs: impl IntoIterator<Item = Document>,
    ) -> DocshardResult<Vec<Value>> {
        docs.into_iter().map(|doc| self.insert(doc)).collect()
    }

    /// Runs a query with a projection against the current state, yielding an
    /// eagerly evaluated [Cursor] over independent document copies.
    pub fn find(&self, query: Document, projection: Document) -> Cursor {
        Cursor::new(self, query, projection)
    }

    /// Replaces matching documents wholesale with the update document's
    /// fields, including `_id`, exactly like the wire protocol's replacement
    /// semantics. Stops after the first match unless `options.multi` is set.
    /// Returns the number of documents replaced.
    pub fn update(
        &mut self,
        query: &Document,
        update: &Document,
        options: UpdateOptions,
    ) -> usize {
        let mut indices = self.matching_indices(query);
        if !options.multi {
            indices.truncate(1);
        }

        for idx in &indices {
            self.documents[*idx] = update.clone();
        }
        indices.len()
    }

    /// Removes matching documents. With `just_one` set, at most one document
    /// (the first match in collection order) is removed. Returns the number
    /// of documents removed.
    pub fn remove(&mut self, query: &Document, just_one: bool) -> usize {
        let mut indices = self.matching_indices(query);
        if just_one {
            indices.truncate(1);
        }

        // remove back to front so earlier indices stay valid
        for idx in indices.iter().rev() {
            self.documents.remove(*idx);
        }
        indices.len()
    }

    /// Lists the `*.json` collection files in the current base path, sorted
    /// by name.
    pub fn list_collections(&self) -> DocshardResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(COLLECTION_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    // Indices of the documents matching the query, in collection order.
    // Update and remove resolve originals through this instead of through a
    // read cursor, so read results can stay independent copies.
    pub(crate) fn matching_indices(&self, query: &Document) -> Vec<usize> {
        self.documents
            .iter()
            .enumerate()
            .filter(|(_, doc)| doc.matches(query))
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Full path of the backing file.
    pub fn path(&self) -> PathBuf {
        self.base_path.join(&self.file_name)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn size(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Looks up a document by its `_id` value.
    pub fn find_by_id(&self, id: &Value) -> Option<&Document> {
        self.documents
            .iter()
            .find(|doc| doc.get(DOC_ID) == Some(id))
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(&self.documents) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(std::fmt::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use std::env;

    fn temp_base() -> PathBuf {
        let dir = env::temp_dir().join(format!("docshard-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(base: &Path) {
        let _ = fs::remove_dir_all(base);
    }

    #[test]
    fn test_insert_assigns_id_when_missing() {
        let mut collection = Collection::new(temp_base(), "test.json");
        let id = collection.insert(doc! { name: "Alice" }).unwrap();
        assert!(matches!(id, Value::String(_)));
        assert!(collection.documents()[0].has_id());
        cleanup(&collection.base_path().to_path_buf());
    }

    #[test]
    fn test_insert_preserves_existing_id() {
        let mut collection = Collection::new(temp_base(), "test.json");
        let id = collection.insert(doc! { "_id": 1, group: 1 }).unwrap();
        assert_eq!(id, Value::I64(1));
        assert_eq!(
            collection.documents()[0].get(DOC_ID),
            Some(&Value::I64(1))
        );
        cleanup(&collection.base_path().to_path_buf());
    }

    #[test]
    fn test_insert_many_appends_in_order() {
        let mut collection = Collection::new(temp_base(), "test.json");
        let ids = collection
            .insert_many(vec![doc! { n: 1 }, doc! { n: 2 }, doc! { n: 3 }])
            .unwrap();
        assert_eq!(ids.len(), 3);
        let ns: Vec<_> = collection
            .documents()
            .iter()
            .map(|doc| doc.get("n").cloned().unwrap())
            .collect();
        assert_eq!(ns, vec![Value::I64(1), Value::I64(2), Value::I64(3)]);
        cleanup(&collection.base_path().to_path_buf());
    }

    #[test]
    fn test_save_load_round_trip() {
        let base = temp_base();
        let mut collection = Collection::new(&base, "round.json");
        collection.insert(doc! { name: "Alice", age: 30 }).unwrap();
        collection.insert(doc! { name: "Bob", age: 25 }).unwrap();
        collection.save().unwrap();

        let mut reloaded = Collection::new(&base, "round.json");
        reloaded.load().unwrap();
        assert_eq!(reloaded.documents(), collection.documents());
        cleanup(&base);
    }

    #[test]
    fn test_save_creates_missing_parent_directories() {
        let base = temp_base().join("deep").join("nested");
        let mut collection = Collection::new(&base, "test.json");
        collection.insert(doc! { a: 1 }).unwrap();
        collection.save().unwrap();
        assert!(collection.path().is_file());
        cleanup(base.parent().unwrap().parent().unwrap());
    }

    #[test]
    fn test_load_missing_file_yields_empty() {
        let base = temp_base();
        let mut collection = Collection::new(&base, "absent.json");
        collection.load().unwrap();
        assert!(collection.is_empty());
        assert!(!collection.path().exists());
        cleanup(&base);
    }

    #[test]
    fn test_load_malformed_json_yields_empty() {
        let base = temp_base();
        fs::write(base.join("broken.json"), "{ not json at all").unwrap();
        let mut collection = Collection::new(&base, "broken.json");
        collection.load().unwrap();
        assert!(collection.is_empty());
        cleanup(&base);
    }

    #[test]
    fn test_load_replaces_previous_state() {
        let base = temp_base();
        let mut writer = Collection::new(&base, "data.json");
        writer.insert(doc! { n: 1 }).unwrap();
        writer.save().unwrap();

        let mut collection = Collection::new(&base, "data.json");
        collection.insert(doc! { stale: true }).unwrap();
        collection.load().unwrap();
        assert_eq!(collection.size(), 1);
        assert_eq!(collection.documents()[0].get("n"), Some(&Value::I64(1)));
        cleanup(&base);
    }

    #[test]
    fn test_file_format_shape() {
        let base = temp_base();
        let mut collection = Collection::new(&base, "shape.json");
        collection.insert(doc! { "_id": "abc", n: 1 }).unwrap();
        collection.save().unwrap();

        let raw = fs::read_to_string(collection.path()).unwrap();
        assert_eq!(raw, "{\"options\":{},\"documents\":[{\"_id\":\"abc\",\"n\":1}]}");
        cleanup(&base);
    }

    #[test]
    fn test_connect_to_missing_file_fails_and_keeps_binding() {
        let base = temp_base();
        let mut collection = Collection::new(&base, "current.json");
        let result = collection.connect_to(&base, "absent.json");
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::FileNotFound);
        assert_eq!(collection.file_name(), "current.json");
        cleanup(&base);
    }

    #[test]
    fn test_connect_to_existing_file_rebinds() {
        let base = temp_base();
        fs::write(base.join("other.json"), "{}").unwrap();
        let mut collection = Collection::new(&base, "current.json");
        collection.connect_to(&base, "other.json").unwrap();
        assert_eq!(collection.file_name(), "other.json");
        cleanup(&base);
    }

    #[test]
    fn test_update_replaces_first_match_wholesale() {
        let mut collection = Collection::new(temp_base(), "test.json");
        collection.insert(doc! { "_id": 1, group: 1 }).unwrap();
        collection.insert(doc! { "_id": 2, group: 1 }).unwrap();

        let replaced = collection.update(
            &doc! { group: 1 },
            &doc! { group: 9, note: "replaced" },
            UpdateOptions::default(),
        );
        assert_eq!(replaced, 1);
        // wholesale replacement: the old _id is gone from the first document
        assert_eq!(collection.documents()[0].get("group"), Some(&Value::I64(9)));
        assert!(!collection.documents()[0].contains_key(DOC_ID));
        // the second match is untouched
        assert_eq!(collection.documents()[1].get(DOC_ID), Some(&Value::I64(2)));
        cleanup(&collection.base_path().to_path_buf());
    }

    #[test]
    fn test_update_multi_replaces_all_matches() {
        let mut collection = Collection::new(temp_base(), "test.json");
        collection.insert(doc! { group: 1 }).unwrap();
        collection.insert(doc! { group: 1 }).unwrap();
        collection.insert(doc! { group: 2 }).unwrap();

        let replaced = collection.update(
            &doc! { group: 1 },
            &doc! { group: 9 },
            UpdateOptions::new(true, false),
        );
        assert_eq!(replaced, 2);
        assert_eq!(collection.matching_indices(&doc! { group: 9 }).len(), 2);
        cleanup(&collection.base_path().to_path_buf());
    }

    #[test]
    fn test_remove_just_one_deletes_first_match() {
        let mut collection = Collection::new(temp_base(), "test.json");
        collection.insert(doc! { "_id": 1, group: 1 }).unwrap();
        collection.insert(doc! { "_id": 2, group: 1 }).unwrap();

        let removed = collection.remove(&doc! { group: 1 }, true);
        assert_eq!(removed, 1);
        assert_eq!(collection.size(), 1);
        assert_eq!(collection.documents()[0].get(DOC_ID), Some(&Value::I64(2)));
        cleanup(&collection.base_path().to_path_buf());
    }

    #[test]
    fn test_remove_all_matches() {
        let mut collection = Collection::new(temp_base(), "test.json");
        collection.insert(doc! { group: 1 }).unwrap();
        collection.insert(doc! { group: 2 }).unwrap();
        collection.insert(doc! { group: 1 }).unwrap();

        let removed = collection.remove(&doc! { group: 1 }, false);
        assert_eq!(removed, 2);
        assert_eq!(collection.size(), 1);
        assert_eq!(collection.documents()[0].get("group"), Some(&Value::I64(2)));
        cleanup(&collection.base_path().to_path_buf());
    }

    #[test]
    fn test_remove_no_match_removes_nothing() {
        let mut collection = Collection::new(temp_base(), "test.json");
        collection.insert(doc! { group: 1 }).unwrap();
        assert_eq!(collection.remove(&doc! { group: 7 }, false), 0);
        assert_eq!(collection.size(), 1);
        cleanup(&collection.base_path().to_path_buf());
    }

    #[test]
    fn test_drop_collection_deletes_file() {
        let base = temp_base();
        let mut collection = Collection::new(&base, "dropme.json");
        collection.insert(doc! { a: 1 }).unwrap();
        collection.save().unwrap();
        assert!(collection.path().is_file());

        assert!(collection.drop_collection());
        assert!(!collection.path().exists());
        // a second drop has nothing left to delete
        assert!(!collection.drop_collection());
        cleanup(&base);
    }

    #[test]
    fn test_list_collections_filters_json_files() {
        let base = temp_base();
        fs::write(base.join("users.json"), "{}").unwrap();
        fs::write(base.join("orders.json"), "{}").unwrap();
        fs::write(base.join("notes.txt"), "").unwrap();

        let collection = Collection::new(&base, "users.json");
        let names = collection.list_collections().unwrap();
        assert_eq!(names, vec!["orders.json", "users.json"]);
        cleanup(&base);
    }

    #[test]
    fn test_display_renders_documents_array() {
        let mut collection = Collection::new(temp_base(), "test.json");
        collection.insert(doc! { "_id": "x", n: 1 }).unwrap();
        assert_eq!(collection.to_string(), "[{\"_id\":\"x\",\"n\":1}]");
        cleanup(&collection.base_path().to_path_buf());
    }

    #[test]
    fn test_find_by_id() {
        let mut collection = Collection::new(temp_base(), "test.json");
        collection.insert(doc! { "_id": 1, n: 1 }).unwrap();
        assert!(collection.find_by_id(&Value::I64(1)).is_some());
        assert!(collection.find_by_id(&Value::I64(2)).is_none());
        cleanup(&collection.base_path().to_path_buf());
    }
}
