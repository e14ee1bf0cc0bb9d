use std::path::{Path, PathBuf};
use std::{env, fs};

use docshard::collection::Collection;
use docshard::doc;
use docshard::errors::DocshardResult;

/// A unique directory path under the system temp dir. The directory is not
/// created; collections create it on save.
pub fn random_base_dir() -> PathBuf {
    env::temp_dir().join(format!("docshard-int-{}", uuid::Uuid::new_v4()))
}

/// Removes a test base directory and everything under it.
pub fn cleanup(base: &Path) {
    if let Err(err) = fs::remove_dir_all(base) {
        if err.kind() != std::io::ErrorKind::NotFound {
            eprintln!("Warning: failed to remove test directory {}: {err}", base.display());
        }
    }
}

/// Creates a collection at `base/<name>` seeded with three documents and
/// saved to disk.
pub fn seeded_collection(base: &Path, name: &str) -> DocshardResult<Collection> {
    let mut collection = Collection::new(base, name);
    collection.insert(doc! { "_id": 1, group: 1, name: "alice" })?;
    collection.insert(doc! { "_id": 2, group: 2, name: "bob" })?;
    collection.insert(doc! { "_id": 3, group: 1, name: "carol" })?;
    collection.save()?;
    Ok(collection)
}
