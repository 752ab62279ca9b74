//! Call expression parsing.
//!
//! The analyzer records calls against imported modules as
//! `<package-expr>.<method.chain>()`. From the text alone it is not known
//! whether a `/` in the package expression separates a scope, a deep import
//! path, or is part of the name, so every plausible split is produced and the
//! resolver is left to accept or reject each one.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static CALL_EXPR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([^>]+)>[.]([^()]+)\(\)").expect("call expression pattern is valid")
});

/// One interpretation of a call expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiSignature {
    /// Package name to look up in the dependency index
    pub package_name: String,

    /// Import path inside the package (may be empty)
    pub subpath: String,

    /// Called method (last segment of the method chain)
    pub method_name: String,
}

impl ApiSignature {
    pub fn new(
        package_name: impl Into<String>,
        subpath: impl Into<String>,
        method_name: impl Into<String>,
    ) -> Self {
        ApiSignature {
            package_name: package_name.into(),
            subpath: subpath.into(),
            method_name: method_name.into(),
        }
    }

    /// Parse a call expression into candidate signatures.
    ///
    /// Candidates come in a fixed order: first segment as package, then the
    /// first two segments as package (three or more segments only), then the
    /// whole expression as package. Text that is not a call expression yields
    /// no candidates.
    pub fn parse_call(expr: &str) -> Vec<ApiSignature> {
        let Some(caps) = CALL_EXPR.captures(expr) else {
            return Vec::new();
        };

        let package_expr = &caps[1];
        let method_chain = &caps[2];
        let method_name = method_chain.rsplit('.').next().unwrap_or(method_chain);

        let mut candidates = Vec::new();

        if package_expr.contains('/') {
            let segments: Vec<&str> = package_expr.split('/').collect();

            candidates.push(ApiSignature::new(
                segments[0],
                segments[1..].join("/"),
                method_name,
            ));

            if segments.len() > 2 {
                candidates.push(ApiSignature::new(
                    segments[..2].join("/"),
                    segments[2..].join("/"),
                    method_name,
                ));
            }
        }

        candidates.push(ApiSignature::new(package_expr, "", method_name));
        candidates
    }
}

impl fmt::Display for ApiSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subpath.is_empty() {
            write!(f, "<{}>.{}", self.package_name, self.method_name)
        } else {
            write!(
                f,
                "<{}>/{}.{}",
                self.package_name, self.subpath, self.method_name
            )
        }
    }
}
