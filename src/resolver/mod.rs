//! Signature resolution.
//!
//! Resolving a `(package, subpath, method)` candidate means locating the
//! package's install path in the dependency index, loading the catalog stored
//! for that path, collecting every exported signature naming the method, and
//! then following the catalog's re-exports into other packages.
//!
//! Re-export graphs can contain cycles, so each search path carries the set of
//! nodes it has already visited. The set is passed by value: sibling branches
//! of a re-export fan-out are independent searches and do not see each other's
//! visits. Duplicate results across branches are left to the caller.
//!
//! Every failure here (unknown package, missing or malformed catalog) means
//! "no matches" for that branch, never an error.

pub mod errors;
pub mod index;
pub mod locator;

use std::collections::HashSet;
use std::path::{Component, Path};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{ApiSignature, MatchCandidate};

pub use errors::CatalogError;
pub use index::{DependencyIndex, IndexBuilder};
pub use locator::{CatalogDir, CatalogKey, CatalogMap, CatalogSource};

/// How to pick among several install paths recorded for one package name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallPathStrategy {
    /// The first recorded install path
    #[default]
    First,
    /// Every distinct install path
    All,
    /// The install path closest to the calling file
    Nearest,
}

impl FromStr for InstallPathStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(InstallPathStrategy::First),
            "all" => Ok(InstallPathStrategy::All),
            "nearest" => Ok(InstallPathStrategy::Nearest),
            _ => Err(format!(
                "invalid install path strategy '{}'; expected 'first', 'all', or 'nearest'",
                s
            )),
        }
    }
}

/// A node of the re-export search.
type SearchNode = (String, String, String);

/// Resolves candidate signatures against catalogs.
pub struct SignatureResolver<'a> {
    index: &'a DependencyIndex,
    catalogs: &'a dyn CatalogSource,
    workspace_root: &'a Path,
    strategy: InstallPathStrategy,
}

impl<'a> SignatureResolver<'a> {
    pub fn new(
        index: &'a DependencyIndex,
        catalogs: &'a dyn CatalogSource,
        workspace_root: &'a Path,
    ) -> Self {
        SignatureResolver {
            index,
            catalogs,
            workspace_root,
            strategy: InstallPathStrategy::default(),
        }
    }

    /// Set the install path tie-break strategy.
    pub fn with_strategy(mut self, strategy: InstallPathStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Resolve one candidate signature.
    ///
    /// `origin` is the file the call was observed in; only the `Nearest`
    /// strategy looks at it.
    pub fn resolve(&self, signature: &ApiSignature, origin: Option<&Path>) -> Vec<MatchCandidate> {
        self.search(
            &signature.package_name,
            &signature.subpath,
            &signature.method_name,
            origin,
            HashSet::new(),
        )
    }

    fn search(
        &self,
        package: &str,
        subpath: &str,
        method: &str,
        origin: Option<&Path>,
        mut visited: HashSet<SearchNode>,
    ) -> Vec<MatchCandidate> {
        let node = (package.to_string(), subpath.to_string(), method.to_string());
        if !visited.insert(node) {
            tracing::trace!("re-export cycle at <{}>.{}", package, method);
            return Vec::new();
        }

        let mut results = Vec::new();

        for install_path in self.select_install_paths(package, origin) {
            let key = CatalogKey::for_install_path(Path::new(install_path), self.workspace_root);
            let catalog = match self.catalogs.load(&key) {
                Ok(Some(catalog)) => catalog,
                Ok(None) => {
                    tracing::debug!("no catalog for `{}` ({})", package, key);
                    continue;
                }
                Err(e) => {
                    tracing::warn!("{:#}", anyhow::Error::from(e));
                    continue;
                }
            };

            results.extend(catalog.matching_functions(method).map(|signature| {
                MatchCandidate {
                    module_name: package.to_string(),
                    module_path: install_path.to_string(),
                    function_signature: signature.clone(),
                }
            }));

            for reexported in catalog.forwarding_packages(method) {
                results.extend(self.search(reexported, "", method, origin, visited.clone()));
            }
        }

        results
    }

    /// Install paths to search for a package under the current strategy.
    fn select_install_paths(&self, package: &str, origin: Option<&Path>) -> Vec<&'a str> {
        let paths = self.index.install_paths(package);
        if paths.is_empty() {
            tracing::debug!("package `{}` not in dependency index", package);
            return paths;
        }

        match self.strategy {
            InstallPathStrategy::First => paths.into_iter().take(1).collect(),
            InstallPathStrategy::All => paths,
            InstallPathStrategy::Nearest => {
                let Some(origin) = origin else {
                    return paths.into_iter().take(1).collect();
                };
                let origin = self.workspace_root.join(origin);

                let mut best = paths[0];
                let mut best_len = shared_prefix_len(Path::new(best), &origin);
                for &candidate in &paths[1..] {
                    let len = shared_prefix_len(Path::new(candidate), &origin);
                    if len > best_len {
                        best = candidate;
                        best_len = len;
                    }
                }
                vec![best]
            }
        }
    }
}

/// Number of leading path components two paths share.
fn shared_prefix_len(a: &Path, b: &Path) -> usize {
    let a = a.components().filter(|c| !matches!(c, Component::CurDir));
    let b = b.components().filter(|c| !matches!(c, Component::CurDir));
    a.zip(b).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Catalog, DependencyRecord};
    use crate::resolver::locator::CatalogMap;
    use std::path::PathBuf;

    struct Fixture {
        root: PathBuf,
        index: DependencyIndex,
        catalogs: CatalogMap,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                root: PathBuf::from("/repo"),
                index: DependencyIndex::new(),
                catalogs: CatalogMap::new(),
            }
        }

        fn package(mut self, name: &str, path: &str, catalog: Option<&str>) -> Self {
            self.index.insert(
                name,
                DependencyRecord::new(name).with_from(name).with_path(path),
            );
            if let Some(json) = catalog {
                let key = CatalogKey::for_install_path(Path::new(path), &self.root);
                self.catalogs.insert(key, Catalog::parse(json).unwrap());
            }
            self
        }

        fn resolve(&self, strategy: InstallPathStrategy, sig: ApiSignature) -> Vec<MatchCandidate> {
            SignatureResolver::new(&self.index, &self.catalogs, &self.root)
                .with_strategy(strategy)
                .resolve(&sig, Some(Path::new("packages/b/src/index.js")))
        }

        fn first(&self, package: &str, method: &str) -> Vec<String> {
            self.resolve(
                InstallPathStrategy::First,
                ApiSignature::new(package, "", method),
            )
            .into_iter()
            .map(|m| m.function_signature)
            .collect()
        }
    }

    #[test]
    fn test_direct_match() {
        let fx = Fixture::new().package(
            "foo",
            "/repo/node_modules/foo",
            Some(r#"{"functions": ["foo.init()", "foo.reinit()"], "reexports": {}}"#),
        );

        let matches = fx.resolve(InstallPathStrategy::First, ApiSignature::new("foo", "", "init"));
        assert_eq!(
            matches,
            vec![MatchCandidate {
                module_name: "foo".to_string(),
                module_path: "/repo/node_modules/foo".to_string(),
                function_signature: "foo.init()".to_string(),
            }]
        );
    }

    #[test]
    fn test_suffix_boundary() {
        let fx = Fixture::new().package(
            "a",
            "/repo/node_modules/a",
            Some(r#"{"functions": ["targetList()"]}"#),
        );
        assert!(fx.first("a", "get").is_empty());

        let fx = Fixture::new().package(
            "a",
            "/repo/node_modules/a",
            Some(r#"{"functions": ["list.get()"]}"#),
        );
        assert_eq!(fx.first("a", "get"), vec!["list.get()"]);
    }

    #[test]
    fn test_unknown_package_and_missing_catalog() {
        let fx = Fixture::new().package("foo", "/repo/node_modules/foo", None);
        assert!(fx.first("foo", "init").is_empty());
        assert!(fx.first("nope", "init").is_empty());
    }

    #[test]
    fn test_follows_reexports() {
        let fx = Fixture::new()
            .package(
                "facade",
                "/repo/node_modules/facade",
                Some(r#"{"functions": [], "reexports": {"impl": ["run"], "other": ["stop"]}}"#),
            )
            .package(
                "impl",
                "/repo/node_modules/impl",
                Some(r#"{"functions": ["impl.run()"]}"#),
            )
            .package(
                "other",
                "/repo/node_modules/other",
                Some(r#"{"functions": ["other.run()"]}"#),
            );

        let matches = fx.resolve(
            InstallPathStrategy::First,
            ApiSignature::new("facade", "", "run"),
        );
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].module_name, "impl");
        assert_eq!(matches[0].module_path, "/repo/node_modules/impl");
    }

    #[test]
    fn test_reexport_cycle_terminates() {
        let fx = Fixture::new()
            .package(
                "a",
                "/repo/node_modules/a",
                Some(r#"{"functions": ["a.go()"], "reexports": {"b": "*"}}"#),
            )
            .package(
                "b",
                "/repo/node_modules/b",
                Some(r#"{"functions": ["b.go()"], "reexports": {"a": ["*"]}}"#),
            );

        assert_eq!(fx.first("a", "go"), vec!["a.go()", "b.go()"]);
        assert_eq!(fx.first("b", "go"), vec!["b.go()", "a.go()"]);
    }

    #[test]
    fn test_sibling_branches_do_not_share_visits() {
        // a -> {b, c}, b -> d, c -> d: d is reached once per branch.
        let fx = Fixture::new()
            .package(
                "a",
                "/repo/node_modules/a",
                Some(r#"{"reexports": {"b": "*", "c": "*"}}"#),
            )
            .package("b", "/repo/node_modules/b", Some(r#"{"reexports": {"d": "*"}}"#))
            .package("c", "/repo/node_modules/c", Some(r#"{"reexports": {"d": "*"}}"#))
            .package(
                "d",
                "/repo/node_modules/d",
                Some(r#"{"functions": ["d.go()"]}"#),
            );

        assert_eq!(fx.first("a", "go"), vec!["d.go()", "d.go()"]);
    }

    #[test]
    fn test_install_path_strategies() {
        let fx = Fixture::new()
            .package(
                "dup",
                "/repo/node_modules/dup",
                Some(r#"{"functions": ["root.go()"]}"#),
            )
            .package(
                "dup",
                "/repo/packages/b/node_modules/dup",
                Some(r#"{"functions": ["nested.go()"]}"#),
            );

        let sigs = |strategy| -> Vec<String> {
            fx.resolve(strategy, ApiSignature::new("dup", "", "go"))
                .into_iter()
                .map(|m| m.function_signature)
                .collect()
        };

        assert_eq!(sigs(InstallPathStrategy::First), vec!["root.go()"]);
        assert_eq!(sigs(InstallPathStrategy::All), vec!["root.go()", "nested.go()"]);
        assert_eq!(sigs(InstallPathStrategy::Nearest), vec!["nested.go()"]);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("ALL".parse::<InstallPathStrategy>(), Ok(InstallPathStrategy::All));
        assert!("closest".parse::<InstallPathStrategy>().is_err());
    }
}
