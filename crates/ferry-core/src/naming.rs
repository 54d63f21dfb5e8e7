//! Naming rule expansion
//!
//! Directory and file naming rules are templates with `{placeholder}` tokens.
//! Expansion is purely in-memory; the only sources of non-determinism are
//! the clock and the random placeholders.

use chrono::Local;
use rand::distr::Alphanumeric;
use rand::Rng;

/// Generate a random alphanumeric key of `len` characters.
pub fn random_key(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Replacement table shared by directory and file rules.
pub fn base_replacements(owner_id: u64) -> Vec<(&'static str, String)> {
    let now = Local::now();
    vec![
        ("{randomkey16}", random_key(16)),
        ("{randomkey8}", random_key(8)),
        ("{timestamp}", now.timestamp().to_string()),
        ("{uid}", owner_id.to_string()),
        ("{datetime}", now.format("%Y%m%d%H%M%S").to_string()),
        ("{date}", now.format("%Y%m%d").to_string()),
        ("{year}", now.format("%Y").to_string()),
        ("{month}", now.format("%m").to_string()),
        ("{day}", now.format("%d").to_string()),
        ("{hour}", now.format("%H").to_string()),
        ("{minute}", now.format("%M").to_string()),
        ("{second}", now.format("%S").to_string()),
    ]
}

/// Substitute every placeholder in `rule` using `table`.
pub fn expand(rule: &str, table: &[(&'static str, String)]) -> String {
    table
        .iter()
        .fold(rule.to_string(), |acc, (key, value)| acc.replace(key, value))
}

/// Lexically clean a slash-separated path.
///
/// Collapses repeated separators, drops `.` segments and resolves `..`
/// without ever climbing above the root of a rooted path. An empty result is
/// `"."` for relative paths and `"/"` for rooted ones.
pub fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if rooted {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Join a directory and a file name into one cleaned path.
pub fn join_path(dir: &str, file: &str) -> String {
    if dir.is_empty() {
        return clean_path(file);
    }
    if file.is_empty() {
        return clean_path(dir);
    }
    clean_path(&format!("{}/{}", dir, file))
}
