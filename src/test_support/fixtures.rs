//! Canned documents for common test scenarios.

use serde_json::{json, Map, Value};

/// A catalog with the given functions and `(package, names)` re-exports.
///
/// A name list of `["*"]` forwards every method.
pub fn catalog(functions: &[&str], reexports: &[(&str, &[&str])]) -> Value {
    let reexports: Map<String, Value> = reexports
        .iter()
        .map(|(package, names)| (package.to_string(), json!(names)))
        .collect();
    json!({ "functions": functions, "reexports": reexports })
}

/// A single-importer manifest declaring `(name, install path)` dependencies.
pub fn manifest(deps: &[(&str, &str)]) -> Value {
    let deps: Map<String, Value> = deps
        .iter()
        .map(|(name, path)| {
            (
                name.to_string(),
                json!({ "from": name, "version": "1.0.0", "path": path }),
            )
        })
        .collect();
    json!([{ "dependencies": deps }])
}

/// A usage document with one file calling each API.
pub fn usage(file: &str, apis: &[&str]) -> Value {
    let entries: Vec<Value> = apis
        .iter()
        .map(|api| json!({ "api": api, "importType": "esm" }))
        .collect();
    json!({ "apiUsage": { file: entries } })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_fixture() {
        let value = catalog(&["a.run()"], &[("b", &["*"])]);
        assert_eq!(value["functions"], json!(["a.run()"]));
        assert_eq!(value["reexports"]["b"], json!(["*"]));
    }

    #[test]
    fn test_manifest_fixture() {
        let value = manifest(&[("foo", "/repo/node_modules/foo")]);
        assert_eq!(value[0]["dependencies"]["foo"]["path"], "/repo/node_modules/foo");
    }
}
