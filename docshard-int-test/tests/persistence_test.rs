use docshard::collection::Collection;
use docshard::common::Value;
use docshard::doc;
use docshard_int_test::test_util::{cleanup, random_base_dir, seeded_collection};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_save_then_load_restores_documents_in_order() {
    let base = random_base_dir();
    let saved = seeded_collection(&base, "users.json").unwrap();

    let mut reloaded = Collection::new(&base, "users.json");
    reloaded.load().unwrap();

    assert_eq!(reloaded.size(), saved.size());
    let names: Vec<_> = reloaded
        .documents()
        .iter()
        .map(|doc| doc.get("name").cloned().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            Value::from("alice"),
            Value::from("bob"),
            Value::from("carol")
        ]
    );
    cleanup(&base);
}

#[test]
fn test_generated_ids_survive_a_reload() {
    let base = random_base_dir();
    let mut collection = Collection::new(&base, "ids.json");
    let id = collection.insert(doc! { kind: "widget" }).unwrap();
    assert!(matches!(id, Value::String(_)));
    collection.save().unwrap();

    let mut reloaded = Collection::new(&base, "ids.json");
    reloaded.load().unwrap();
    assert_eq!(reloaded.find_by_id(&id).unwrap().get("kind"), Some(&Value::from("widget")));
    cleanup(&base);
}

#[test]
fn test_mutations_are_invisible_on_disk_until_save() {
    let base = random_base_dir();
    let mut collection = seeded_collection(&base, "users.json").unwrap();
    assert_eq!(collection.remove(&doc! { group: 1 }, false), 2);

    let mut reloaded = Collection::new(&base, "users.json");
    reloaded.load().unwrap();
    assert_eq!(reloaded.size(), 3);

    collection.save().unwrap();
    reloaded.load().unwrap();
    assert_eq!(reloaded.size(), 1);
    cleanup(&base);
}

#[test]
fn test_load_resets_unsaved_state() {
    let base = random_base_dir();
    let mut collection = seeded_collection(&base, "users.json").unwrap();
    collection.insert(doc! { "_id": 4, group: 3 }).unwrap();
    assert_eq!(collection.size(), 4);

    collection.load().unwrap();
    assert_eq!(collection.size(), 3);
    cleanup(&base);
}

#[test]
fn test_loading_a_missing_file_yields_an_empty_collection() {
    let base = random_base_dir();
    let mut collection = Collection::new(&base, "absent.json");
    collection.load().unwrap();
    assert!(collection.is_empty());
}

#[test]
fn test_loading_a_corrupt_file_yields_an_empty_collection() {
    let base = random_base_dir();
    std::fs::create_dir_all(&base).unwrap();
    std::fs::write(base.join("broken.json"), "this is not json").unwrap();

    let mut collection = Collection::new(&base, "broken.json");
    collection.load().unwrap();
    assert!(collection.is_empty());
    cleanup(&base);
}
