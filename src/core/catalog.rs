//! Function catalogs.
//!
//! A catalog lists the function signatures a package exports and the packages
//! whose symbols it forwards. Catalogs are produced by the analyzer, one per
//! install path, and are read-only here.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Marker re-exporting every symbol of a package.
pub const REEXPORT_ALL: &str = "*";

/// The names a package forwards from one re-exported package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReexportList {
    /// An explicit list of names (may itself contain `*`)
    Names(Vec<String>),
    /// A single name or the wildcard marker
    Single(String),
}

impl ReexportList {
    /// Whether a lookup for `method` should follow this re-export.
    pub fn forwards(&self, method: &str) -> bool {
        let hit = |name: &str| name == method || name == REEXPORT_ALL;
        match self {
            ReexportList::Names(names) => names.iter().any(|n| hit(n)),
            ReexportList::Single(name) => hit(name),
        }
    }
}

/// A package's function catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Exported function signatures
    #[serde(default)]
    pub functions: Vec<String>,

    /// Re-export directives keyed by re-exported package name
    #[serde(default)]
    pub reexports: IndexMap<String, ReexportList>,
}

impl Catalog {
    /// Parse a catalog document.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    /// Signatures exporting `method`.
    pub fn matching_functions<'a>(&'a self, method: &'a str) -> impl Iterator<Item = &'a String> {
        self.functions
            .iter()
            .filter(move |sig| signature_exports(sig, method))
    }

    /// Packages to follow when looking up `method`.
    pub fn forwarding_packages<'a>(&'a self, method: &'a str) -> impl Iterator<Item = &'a str> {
        self.reexports
            .iter()
            .filter(move |(_, list)| list.forwards(method))
            .map(|(package, _)| package.as_str())
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Strip one trailing balanced argument list: `a.b(x, (y))` -> `a.b`.
fn callee(signature: &str) -> &str {
    let trimmed = signature.trim_end();
    if !trimmed.ends_with(')') {
        return trimmed;
    }

    let mut depth = 0usize;
    for (idx, c) in trimmed.char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' => {
                depth -= 1;
                if depth == 0 {
                    return trimmed[..idx].trim_end();
                }
            }
            _ => {}
        }
    }

    trimmed
}

/// Whether `signature` names `method` as a whole identifier at its end.
///
/// The method must be a suffix of the signature (ignoring a trailing argument
/// list) and be preceded by the start of the string or a non-identifier
/// character, so `get` matches `list.get()` but not `targetList()`.
pub fn signature_exports(signature: &str, method: &str) -> bool {
    let name = callee(signature);
    let Some(prefix) = name.strip_suffix(method) else {
        return false;
    };

    match prefix.chars().next_back() {
        None => true,
        Some(c) => !is_ident_char(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_boundary() {
        assert!(signature_exports("list.get()", "get"));
        assert!(signature_exports("get", "get"));
        assert!(signature_exports("Client#get", "get"));
        assert!(!signature_exports("targetList()", "get"));
        assert!(!signature_exports("forget()", "get"));
        assert!(!signature_exports("list.get_all()", "get"));
    }

    #[test]
    fn test_argument_lists_ignored() {
        assert!(signature_exports("foo.init()", "init"));
        assert!(signature_exports("foo.init(opts, cb)", "init"));
        assert!(signature_exports("foo.on(evt, (e) => void)", "on"));
        assert!(!signature_exports("foo.init()", "foo"));
    }

    #[test]
    fn test_unbalanced_parens() {
        assert!(!signature_exports("broken)", "get"));
        assert!(signature_exports("x.get", "get"));
    }

    #[test]
    fn test_parse_reexports() {
        let catalog = Catalog::parse(
            r#"{
                "functions": ["a.run()"],
                "reexports": {"b": ["run", "stop"], "c": "*", "d": ["*"], "e": ["other"]}
            }"#,
        )
        .unwrap();

        let forwarded: Vec<_> = catalog.forwarding_packages("run").collect();
        assert_eq!(forwarded, vec!["b", "c", "d"]);
        assert_eq!(catalog.matching_functions("run").count(), 1);
    }

    #[test]
    fn test_missing_sections_default() {
        let catalog = Catalog::parse("{}").unwrap();
        assert!(catalog.functions.is_empty());
        assert!(catalog.reexports.is_empty());
    }
}
