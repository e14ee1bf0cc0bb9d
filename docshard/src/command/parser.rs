//! The textual command grammar spoken on the shard console and the wire.
//!
//! Commands are single lines. Keywords are case-insensitive; JSON argument
//! text is preserved verbatim for the engine to parse. Collection operations
//! take the form `db.collection.<op>({...}, {...})`; arguments may contain
//! commas and dots inside braces or double quotes, so splitting is
//! group-aware rather than a plain `split`.

use crate::common::COMMAND_PREFIX;

/// A parsed command line, ready for execution.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// `exit` shuts the shard down.
    Exit,
    /// `identify` answers the server handshake with this node's role.
    Identify,
    /// `use <name>` rebinds the collection to another file under the same
    /// base path.
    Use(String),
    /// `show collections` / `list collections`
    ShowCollections,
    /// `show status` / `list status`
    ShowStatus,
    /// `db.collection` dumps the whole collection.
    DumpCollection,
    /// `db.collection.find(query[, projection])`
    Find {
        query: String,
        projection: Option<String>,
    },
    /// `db.collection.insert(document)`
    Insert { document: String },
    /// `db.collection.update(query, replacement)`
    Update { query: String, update: String },
    /// `db.collection.remove(query[, justOne])`
    Remove {
        query: String,
        just_one: Option<String>,
    },
    /// `db.collection.save` flushes the collection to disk.
    Save,
    /// A `db.`-prefixed line naming no known operation.
    UnknownCall,
    /// Anything else; answered with the help text.
    Unknown,
    /// A structurally broken line, carrying the message to print.
    Invalid(String),
}

/// Splits `input` on `sep`, ignoring separators inside `{}` groups or
/// double-quoted strings. Always yields at least one (possibly empty) token.
pub fn split_outside_groups(input: &str, sep: char) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_brace = false;
    let mut in_quote = false;

    for ch in input.chars() {
        if ch == sep && !in_brace && !in_quote {
            result.push(std::mem::take(&mut current));
            continue;
        }
        match ch {
            '{' => in_brace = true,
            '}' => in_brace = false,
            '"' => in_quote = !in_quote,
            _ => {}
        }
        current.push(ch);
    }
    result.push(current);
    result
}

/// Parses one command line. Parsing never fails outright; malformed input
/// comes back as [Command::Invalid] carrying the message to show the caller.
pub fn parse(line: &str) -> Command {
    let line = line.trim();
    let lower = line.to_lowercase();

    if lower == "exit" {
        return Command::Exit;
    }
    if lower == "identify" {
        return Command::Identify;
    }

    if lower.starts_with("use") {
        let parts: Vec<&str> = line.split(' ').collect();
        return match parts.as_slice() {
            [_, name] => Command::Use((*name).to_string()),
            _ => Command::Invalid("\nUsage: USE [collection_name]\n".to_string()),
        };
    }

    if lower.starts_with("show") || lower.starts_with("list") {
        let parts: Vec<&str> = line.split(' ').collect();
        return match parts.as_slice() {
            [_, arg] if arg.eq_ignore_ascii_case("collections") => Command::ShowCollections,
            [_, arg] if arg.eq_ignore_ascii_case("status") => Command::ShowStatus,
            [keyword, ..] => {
                Command::Invalid(format!("\nUsage: {keyword} [collections | status]\n"))
            }
            [] => unreachable!("split always yields at least one part"),
        };
    }

    if lower.starts_with(COMMAND_PREFIX) || lower == "db" {
        return parse_collection_command(line, &lower);
    }

    Command::Unknown
}

fn parse_collection_command(line: &str, lower: &str) -> Command {
    if lower == "db.collection" {
        return Command::DumpCollection;
    }

    // `save` takes no parenthesized arguments
    if lower.contains("db.collection.save") {
        return Command::Save;
    }

    let op = if lower.contains("db.collection.find") {
        "find"
    } else if lower.contains("db.collection.insert") {
        "insert"
    } else if lower.contains("db.collection.update") {
        "update"
    } else if lower.contains("db.collection.remove") {
        "remove"
    } else {
        return Command::UnknownCall;
    };

    let args = match call_args(line) {
        Some(args) => args,
        None => return Command::Invalid(format!("Illegal number of arguments to {op}()")),
    };

    match (op, args.as_slice()) {
        ("find", [query]) => Command::Find {
            query: query.clone(),
            projection: None,
        },
        ("find", [query, projection]) => Command::Find {
            query: query.clone(),
            projection: Some(projection.clone()),
        },
        ("insert", [document]) => Command::Insert {
            document: document.clone(),
        },
        ("update", [query, update]) => Command::Update {
            query: query.clone(),
            update: update.clone(),
        },
        ("remove", [query]) => Command::Remove {
            query: query.clone(),
            just_one: None,
        },
        ("remove", [query, just_one]) => Command::Remove {
            query: query.clone(),
            just_one: Some(just_one.clone()),
        },
        _ => Command::Invalid(format!("Illegal number of arguments to {op}()")),
    }
}

/// Extracts the comma-separated argument list between the first `(` and the
/// last `)` of the operation segment. Returns `None` when the parentheses are
/// missing or inverted.
fn call_args(line: &str) -> Option<Vec<String>> {
    let segments = split_outside_groups(line, '.');
    let call = segments.get(2)?;
    let open = call.find('(')?;
    let close = call.rfind(')')?;
    if close < open {
        return None;
    }
    Some(split_outside_groups(&call[open + 1..close], ','))
}
