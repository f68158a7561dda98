//! Discovery of declarative rule files.
//!
//! Rules are declared in `.hashmake.json` files, one per directory. A
//! rule file is a stream of JSON records (concatenated objects, no
//! enclosing array), each with `sources`, `targets`, `command`, and an
//! optional `dir` that defaults to the directory containing the file:
//!
//! ```json
//! {"sources": ["a.txt"], "targets": ["b.txt"], "command": ["cp", "a.txt", "b.txt"]}
//! {"sources": ["b.txt"], "targets": ["c.txt"], "command": ["cp", "b.txt", "c.txt"]}
//! ```
//!
//! A directory without a rule file simply contributes no rules; a rule
//! file that fails to decode is an error naming the file.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::rule::FileSetRule;

/// Name of the per-directory rule file.
pub const RULES_FILE: &str = ".hashmake.json";

/// Load the rules declared in `dir`, if any.
///
/// Returns an empty list when the directory has no rule file. Rules
/// without an explicit `dir` run in `dir` itself.
pub fn load_dir(dir: &Path) -> Result<Vec<FileSetRule>> {
    let path = dir.join(RULES_FILE);
    let file = match File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(Error::Io { path, source }),
    };

    let mut rules = Vec::new();
    let stream = serde_json::Deserializer::from_reader(BufReader::new(file))
        .into_iter::<FileSetRule>();
    for record in stream {
        let mut rule = record.map_err(|source| Error::Parse {
            path: path.clone(),
            source,
        })?;
        if rule.command.is_empty() {
            return Err(Error::EmptyCommand {
                context: path.display().to_string(),
            });
        }
        if rule.dir.as_os_str().is_empty() {
            rule.dir = dir.to_path_buf();
        }
        rules.push(rule);
    }
    log::debug!("loaded {} rule(s) from {}", rules.len(), path.display());
    Ok(rules)
}

/// Walk the tree rooted at `root` and aggregate the rules of every
/// `.hashmake.json` found, in directory-walk order.
pub fn load_tree(root: &Path) -> Result<Vec<FileSetRule>> {
    let mut rules = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|source| Error::Walk {
            path: source
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            source,
        })?;
        if entry.file_type().is_dir() {
            rules.extend(load_dir(entry.path())?);
        }
    }
    Ok(rules)
}
