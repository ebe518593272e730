//! Policy scanner: decides admit/reject for a submission before any
//! process is spawned.
//!
//! Three checks, in order, first rejection wins:
//! 1. the source must parse as a Rust file,
//! 2. every `use`/`extern crate` root must be on the import allowlist,
//! 3. the raw text must contain none of the denylisted substrings.
//!
//! The checks are syntactic, not semantic: macro-built paths or aliased
//! re-exports can slip past them. That is accepted; the worker's
//! process boundary and allowlist-by-construction dependency set are
//! the enforcement backstop, not this scanner.

use std::collections::BTreeSet;

use syn::visit::Visit;
use syn::{ItemExternCrate, ItemUse, UseTree};

use crate::config::EngineConfig;
use crate::registry::Submission;

/// The scanner's admit/reject decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub admitted: bool,
    pub reason: Option<String>,
}

impl Verdict {
    fn admit() -> Self {
        Self {
            admitted: true,
            reason: None,
        }
    }

    fn reject(reason: impl Into<String>) -> Self {
        Self {
            admitted: false,
            reason: Some(reason.into()),
        }
    }

    /// Rejection reason, or an empty string when admitted.
    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or("")
    }
}

/// A submission that passed the policy scan.
///
/// The private field makes this constructible only by
/// [`PolicyScanner::vet`], so an
/// [`ExecutionRequest`](crate::execute::ExecutionRequest) cannot exist
/// for unscanned code.
#[derive(Debug, Clone)]
pub struct AdmittedSubmission(Submission);

impl AdmittedSubmission {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn source(&self) -> &str {
        &self.0.source
    }
}

/// Scans submission source against the configured policy.
pub struct PolicyScanner<'a> {
    config: &'a EngineConfig,
}

impl<'a> PolicyScanner<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Scan raw source text. Pure: identical input yields an identical
    /// verdict.
    pub fn scan(&self, source: &str) -> Verdict {
        let file = match syn::parse_file(source) {
            Ok(file) => file,
            Err(e) => return Verdict::reject(format!("syntax error: {e}")),
        };

        let mut imports = ImportVisitor {
            allowed: &self.config.allowed_imports,
            violation: None,
        };
        imports.visit_file(&file);
        if let Some(name) = imports.violation {
            return Verdict::reject(format!("forbidden import: {name}"));
        }

        for pattern in &self.config.forbidden_patterns {
            if source.contains(pattern.as_str()) {
                return Verdict::reject(format!("forbidden pattern: {pattern}"));
            }
        }

        Verdict::admit()
    }

    /// Scan a submission and, on admission, wrap it as the proof token
    /// the execution path requires.
    pub fn vet(&self, submission: Submission) -> Result<AdmittedSubmission, Verdict> {
        let verdict = self.scan(&submission.source);
        if verdict.admitted {
            Ok(AdmittedSubmission(submission))
        } else {
            Err(verdict)
        }
    }
}

/// Collects the first import whose crate root is off the allowlist.
struct ImportVisitor<'a> {
    allowed: &'a BTreeSet<String>,
    violation: Option<String>,
}

impl ImportVisitor<'_> {
    fn check_root(&mut self, name: &str) {
        if self.violation.is_some() {
            return;
        }
        // Paths into the submission itself are not external imports.
        if matches!(name, "crate" | "self" | "super") {
            return;
        }
        if !self.allowed.contains(name) {
            self.violation = Some(name.to_string());
        }
    }

    fn check_tree_root(&mut self, tree: &UseTree) {
        match tree {
            UseTree::Path(path) => self.check_root(&path.ident.to_string()),
            UseTree::Name(name) => self.check_root(&name.ident.to_string()),
            UseTree::Rename(rename) => self.check_root(&rename.ident.to_string()),
            // `use {a, b::c};`: each group entry is its own root.
            UseTree::Group(group) => {
                for item in &group.items {
                    self.check_tree_root(item);
                }
            }
            // A bare glob cannot appear at the root of a use item.
            UseTree::Glob(_) => {}
        }
    }
}

impl<'ast> Visit<'ast> for ImportVisitor<'_> {
    fn visit_item_use(&mut self, node: &'ast ItemUse) {
        self.check_tree_root(&node.tree);
        syn::visit::visit_item_use(self, node);
    }

    fn visit_item_extern_crate(&mut self, node: &'ast ItemExternCrate) {
        self.check_root(&node.ident.to_string());
        syn::visit::visit_item_extern_crate(self, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Verdict {
        let config = EngineConfig::default();
        PolicyScanner::new(&config).scan(source)
    }

    #[test]
    fn clean_report_is_admitted() {
        let verdict = scan(
            r#"
            use rusqlite::Connection;
            use warden_report::{ReportResult, ReportValue, Table};

            fn generate_report(db: &Connection) -> ReportResult {
                let mut table = Table::new(["count"]);
                let n: i64 = db.query_row("SELECT COUNT(*) FROM data_records", [], |r| r.get(0))?;
                table.push_row(vec![serde_json::json!(n)])?;
                Ok(ReportValue::Table(table))
            }
            "#,
        );
        assert!(verdict.admitted);
        assert_eq!(verdict.reason, None);
    }

    #[test]
    fn forbidden_import_names_the_crate() {
        let verdict = scan("use tokio::net::TcpListener;\nfn generate_report() {}");
        assert!(!verdict.admitted);
        assert!(verdict.reason().contains("forbidden import: tokio"));
    }

    #[test]
    fn nested_group_imports_are_walked() {
        let verdict = scan("use {serde_json::Value, reqwest::Client};");
        assert!(!verdict.admitted);
        assert!(verdict.reason().contains("reqwest"));
    }

    #[test]
    fn use_inside_function_body_is_walked() {
        let verdict = scan(
            "fn generate_report(db: &rusqlite::Connection) -> i32 { use rayon::prelude::*; 0 }",
        );
        assert!(!verdict.admitted);
        assert!(verdict.reason().contains("rayon"));
    }

    #[test]
    fn extern_crate_is_checked() {
        let verdict = scan("extern crate libc;");
        assert!(!verdict.admitted);
        assert!(verdict.reason().contains("libc"));
    }

    #[test]
    fn crate_relative_imports_are_allowed() {
        let verdict = scan("mod helpers { pub fn f() {} }\nuse self::helpers::f;\nuse crate::helpers as h;");
        assert!(verdict.admitted);
    }

    #[test]
    fn forbidden_pattern_fires_after_imports() {
        let verdict = scan(
            "fn generate_report() { let _ = std::process::Command::new(\"sh\"); }",
        );
        assert!(!verdict.admitted);
        assert!(verdict.reason().contains("forbidden pattern: std::process"));
    }

    #[test]
    fn syntax_error_short_circuits() {
        let verdict = scan("fn generate_report( {");
        assert!(!verdict.admitted);
        assert!(verdict.reason().starts_with("syntax error"));
    }

    #[test]
    fn scan_is_idempotent() {
        let source = "use std::collections::HashMap;\nfn generate_report() {}";
        assert_eq!(scan(source), scan(source));

        let rejected = "unsafe { }";
        assert_eq!(scan(rejected), scan(rejected));
    }

    #[test]
    fn vet_wraps_only_admitted_submissions() {
        let config = EngineConfig::default();
        let scanner = PolicyScanner::new(&config);

        let good = Submission {
            name: "ok".to_string(),
            source: "fn generate_report() {}".to_string(),
        };
        assert!(scanner.vet(good).is_ok());

        let bad = Submission {
            name: "bad".to_string(),
            source: "use libloading::Library;".to_string(),
        };
        let verdict = scanner.vet(bad).unwrap_err();
        assert!(!verdict.admitted);
    }
}
