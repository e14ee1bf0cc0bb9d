//! Executes parsed commands against a shard's collection.

use crate::collection::{Collection, Document, UpdateOptions};
use crate::command::parser::{self, Command};
use crate::common::ROLE_SHARD;
use crate::errors::DocshardResult;

/// Help shown for any line that is not a recognized command.
const HELP_TEXT: &str = "\nUsage: docshard-shard config.properties\n\n\
Commands:\n\
\tHELP                                    \tShows the help menu.\n\
\tUSE  [collection]                       \tChange your current document collection to the specified one.\n\
\tSHOW [collections | status]             \tDisplay information about related topic.\n\
\tLIST [collections | status]             \tAlias of SHOW.\n";

/// The outcome of executing one command line.
#[derive(Clone, Debug, PartialEq)]
pub enum Execution {
    /// Text to send back to whoever issued the command.
    Output(String),
    /// The command succeeded and produces no reply.
    Quiet,
    /// The shard should shut down.
    Exit,
}

/// Runs command lines against a single collection. The engine is the shared
/// core behind both the local shard console and the server socket; callers
/// serialize access to it.
pub struct CommandEngine {
    collection: Collection,
    server_addr: String,
}

impl CommandEngine {
    pub fn new(collection: Collection, server_addr: impl Into<String>) -> Self {
        CommandEngine {
            collection,
            server_addr: server_addr.into(),
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Executes one command line and renders its reply. Command errors are
    /// part of the reply text; only `exit` escapes the loop.
    pub fn execute(&mut self, line: &str) -> Execution {
        match parser::parse(line) {
            Command::Exit => Execution::Exit,
            Command::Identify => Execution::Output(ROLE_SHARD.to_string()),
            Command::Use(name) => self.exec_use(&name),
            Command::ShowCollections => self.exec_show_collections(),
            Command::ShowStatus => self.exec_show_status(),
            Command::DumpCollection => Execution::Output(self.collection.to_string()),
            Command::Find { query, projection } => self.exec_find(&query, projection.as_deref()),
            Command::Insert { document } => self.exec_insert(&document),
            Command::Update { query, update } => self.exec_update(&query, &update),
            Command::Remove { query, just_one } => self.exec_remove(&query, just_one.as_deref()),
            Command::Save => self.exec_save(),
            Command::UnknownCall => Execution::Output(format!("Unknown call to {}", line.trim())),
            Command::Unknown => Execution::Output(HELP_TEXT.to_string()),
            Command::Invalid(message) => Execution::Output(message),
        }
    }

    fn exec_use(&mut self, name: &str) -> Execution {
        if self.collection.file_name() == name {
            return Execution::Quiet;
        }
        let base = self.collection.base_path().to_path_buf();
        match self.collection.connect_to(base, name) {
            Ok(()) => match self.collection.load() {
                Ok(()) => Execution::Quiet,
                Err(err) => Execution::Output(format!("{err}\n\nSee: SHOW COLLECTIONS\n")),
            },
            Err(err) => Execution::Output(format!("{err}\n\nSee: SHOW COLLECTIONS\n")),
        }
    }

    fn exec_show_collections(&self) -> Execution {
        match self.collection.list_collections() {
            Ok(names) => Execution::Output(names.join("\n")),
            Err(err) => Execution::Output(err.to_string()),
        }
    }

    fn exec_show_status(&self) -> Execution {
        Execution::Output(format!(
            "Using Server Address: {}\nUsing Base Path: {}\nUsing Database: {}",
            self.server_addr,
            self.collection.base_path().display(),
            self.collection.file_name(),
        ))
    }

    fn exec_find(&self, query: &str, projection: Option<&str>) -> Execution {
        let result = self.try_find(query, projection);
        match result {
            Ok(text) => Execution::Output(text),
            Err(err) => Execution::Output(err.to_string()),
        }
    }

    fn try_find(&self, query: &str, projection: Option<&str>) -> DocshardResult<String> {
        let query = parse_arg(query)?;
        let projection = match projection {
            Some(raw) => parse_arg(raw)?,
            None => Document::new(),
        };
        Ok(self.collection.find(query, projection).to_string())
    }

    fn exec_insert(&mut self, document: &str) -> Execution {
        let result = parse_arg(document).and_then(|doc| self.collection.insert(doc));
        match result {
            Ok(_) => Execution::Output("true".to_string()),
            Err(err) => Execution::Output(err.to_string()),
        }
    }

    fn exec_update(&mut self, query: &str, update: &str) -> Execution {
        let result = parse_arg(query).and_then(|query| {
            let update = parse_arg(update)?;
            Ok(self
                .collection
                .update(&query, &update, UpdateOptions::default()))
        });
        match result {
            Ok(_) => Execution::Output("true".to_string()),
            Err(err) => Execution::Output(err.to_string()),
        }
    }

    fn exec_remove(&mut self, query: &str, just_one: Option<&str>) -> Execution {
        let just_one = just_one
            .map(|raw| raw.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let result = parse_arg(query).map(|query| self.collection.remove(&query, just_one));
        match result {
            Ok(removed) => Execution::Output(if removed > 0 { "true" } else { "false" }.to_string()),
            Err(err) => Execution::Output(err.to_string()),
        }
    }

    fn exec_save(&mut self) -> Execution {
        match self.collection.save() {
            Ok(()) => Execution::Quiet,
            Err(err) => Execution::Output(err.to_string()),
        }
    }
}

/// A blank argument stands for the empty document.
fn parse_arg(raw: &str) -> DocshardResult<Document> {
    let raw = raw.trim();
    if raw.is_empty() {
        Ok(Document::new())
    } else {
        Document::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use uuid::Uuid;

    fn temp_base() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("docshard-{}", Uuid::new_v4()))
    }

    fn cleanup(base: &std::path::Path) {
        let _ = std::fs::remove_dir_all(base);
    }

    fn engine() -> CommandEngine {
        let collection = Collection::new(temp_base(), "test.json");
        CommandEngine::new(collection, "127.0.0.1")
    }

    #[test]
    fn test_exit_and_identify() {
        let mut engine = engine();
        assert_eq!(engine.execute("exit"), Execution::Exit);
        assert_eq!(
            engine.execute("identify"),
            Execution::Output("SHARD".to_string())
        );
    }

    #[test]
    fn test_insert_then_find() {
        let mut engine = engine();
        assert_eq!(
            engine.execute("db.collection.insert({\"_id\": 1, \"group\": 1})"),
            Execution::Output("true".to_string())
        );
        assert_eq!(
            engine.execute("db.collection.insert({\"_id\": 2, \"group\": 2})"),
            Execution::Output("true".to_string())
        );
        assert_eq!(
            engine.execute("db.collection.find({\"group\": 1})"),
            Execution::Output("[{\"_id\":1,\"group\":1}]".to_string())
        );
    }

    #[test]
    fn test_find_with_projection() {
        let mut engine = engine();
        engine.execute("db.collection.insert({\"_id\": 1, \"secret\": \"x\"})");
        assert_eq!(
            engine.execute("db.collection.find({}, {\"secret\": 0})"),
            Execution::Output("[{\"_id\":1}]".to_string())
        );
    }

    #[test]
    fn test_find_malformed_query_reports_parse_error() {
        let mut engine = engine();
        let reply = engine.execute("db.collection.find({not json})");
        match reply {
            Execution::Output(text) => assert!(text.contains("JSON error")),
            other => panic!("unexpected execution: {other:?}"),
        }
    }

    #[test]
    fn test_update_replaces_matches() {
        let mut engine = engine();
        engine.execute("db.collection.insert({\"_id\": 1, \"n\": 1})");
        assert_eq!(
            engine.execute("db.collection.update({\"_id\": 1}, {\"n\": 2})"),
            Execution::Output("true".to_string())
        );
        assert_eq!(
            engine.execute("db.collection.find({\"n\": 2})"),
            Execution::Output("[{\"n\":2}]".to_string())
        );
    }

    #[test]
    fn test_remove_reports_whether_anything_matched() {
        let mut engine = engine();
        engine.execute("db.collection.insert({\"_id\": 1, \"n\": 1})");
        assert_eq!(
            engine.execute("db.collection.remove({\"n\": 99})"),
            Execution::Output("false".to_string())
        );
        assert_eq!(
            engine.execute("db.collection.remove({\"n\": 1})"),
            Execution::Output("true".to_string())
        );
    }

    #[test]
    fn test_remove_just_one_keeps_later_matches() {
        let mut engine = engine();
        engine.execute("db.collection.insert({\"_id\": 1, \"n\": 1})");
        engine.execute("db.collection.insert({\"_id\": 2, \"n\": 1})");
        engine.execute("db.collection.remove({\"n\": 1}, true)");
        assert_eq!(engine.collection().size(), 1);
    }

    #[test]
    fn test_dump_collection() {
        let mut engine = engine();
        engine.execute("db.collection.insert({\"_id\": 1})");
        assert_eq!(
            engine.execute("db.collection"),
            Execution::Output("[{\"_id\":1}]".to_string())
        );
    }

    #[test]
    fn test_save_is_quiet_and_persists() {
        let mut engine = engine();
        let base = engine.collection().base_path().to_path_buf();
        engine.execute("db.collection.insert({\"_id\": 1})");
        assert_eq!(engine.execute("db.collection.save"), Execution::Quiet);

        let mut reloaded = Collection::new(&base, "test.json");
        reloaded.load().unwrap();
        assert_eq!(reloaded.size(), 1);
        cleanup(&base);
    }

    #[test]
    fn test_use_same_collection_is_quiet() {
        let mut engine = engine();
        assert_eq!(engine.execute("use test.json"), Execution::Quiet);
    }

    #[test]
    fn test_use_missing_collection_suggests_show_collections() {
        let mut engine = engine();
        let reply = engine.execute("use nope.json");
        match reply {
            Execution::Output(text) => {
                assert!(text.contains("See: SHOW COLLECTIONS"));
            }
            other => panic!("unexpected execution: {other:?}"),
        }
        // still bound to the original collection
        assert_eq!(engine.collection().file_name(), "test.json");
    }

    #[test]
    fn test_use_existing_collection_rebinds_and_loads() {
        let mut engine = engine();
        let base = engine.collection().base_path().to_path_buf();
        let mut other = Collection::new(&base, "other.json");
        other.insert(doc! { "_id": 7 }).unwrap();
        other.save().unwrap();

        assert_eq!(engine.execute("use other.json"), Execution::Quiet);
        assert_eq!(engine.collection().file_name(), "other.json");
        assert_eq!(engine.collection().size(), 1);
        cleanup(&base);
    }

    #[test]
    fn test_show_status() {
        let mut engine = engine();
        let reply = engine.execute("show status");
        match reply {
            Execution::Output(text) => {
                assert!(text.starts_with("Using Server Address: 127.0.0.1\n"));
                assert!(text.contains("Using Database: test.json"));
            }
            other => panic!("unexpected execution: {other:?}"),
        }
    }

    #[test]
    fn test_show_collections_lists_json_files() {
        let mut engine = engine();
        let base = engine.collection().base_path().to_path_buf();
        engine.execute("db.collection.insert({\"_id\": 1})");
        engine.execute("db.collection.save");

        assert_eq!(
            engine.execute("show collections"),
            Execution::Output("test.json".to_string())
        );
        cleanup(&base);
    }

    #[test]
    fn test_unknown_line_gets_help_text() {
        let mut engine = engine();
        let reply = engine.execute("help");
        match reply {
            Execution::Output(text) => assert!(text.contains("Commands:")),
            other => panic!("unexpected execution: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_db_call_is_echoed() {
        let mut engine = engine();
        assert_eq!(
            engine.execute("db.collection.explode({})"),
            Execution::Output("Unknown call to db.collection.explode({})".to_string())
        );
    }
}
