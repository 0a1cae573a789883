//! Specification linting - static analysis of service files.
//!
//! Checks JSON and YAML specification files for:
//! - syntax and unknown keys (E001)
//! - structural validation issues (E002)
//! - declarations that are legal but probably unintended (W001-W005)

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::loader::load_service;
use crate::model::Service;
use crate::overlay::{
    elaborate, same_surface, standard_enums, standard_objects, synthesize_endpoint,
    STANDARD_TYPE_NAMES,
};
use crate::schema::validate_example;
use crate::types::{ElaborateOptions, Operation};
use crate::validator::collect_issues;

const SPEC_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// Location in the document (e.g., "resources[0] (User).fields[1] (email)")
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn error(code: &str, file: &Path, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.to_string(),
            file: file.to_path_buf(),
            path: path.into(),
            message: message.into(),
        }
    }

    fn warning(code: &str, file: &Path, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, file, path, message)
        }
    }
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all `.json`, `.yaml` and `.yml`
/// files. If `strict` is true, warnings are treated as errors.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_spec_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        total_warnings += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Lint a single specification file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    debug!(file = %file.display(), "Linting.");
    let relative = file.strip_prefix(base_path).unwrap_or(file).to_path_buf();

    let service = match load_service(file) {
        Ok(s) => s,
        Err(e) => {
            return FileResult {
                file: relative,
                status: FileStatus::Error,
                diagnostics: vec![Diagnostic::error("E001", file, "/", format!("syntax error: {}", e))],
            };
        }
    };

    let mut diagnostics: Vec<Diagnostic> = collect_issues(&service)
        .into_iter()
        .map(|issue| Diagnostic::error("E002", file, issue.path, issue.message))
        .collect();
    let valid = diagnostics.is_empty();
    let elaborated = elaborate(&service);

    check_resources(&service, &elaborated, file, &mut diagnostics);
    check_standard_names(&service, file, &mut diagnostics);
    // Examples are only meaningful once every type resolves.
    if valid {
        check_examples(&elaborated, file, &mut diagnostics);
    }

    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: relative,
        status,
        diagnostics,
    }
}

fn check_resources(
    service: &Service,
    elaborated: &Service,
    file: &Path,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let options = ElaborateOptions::default();
    for (i, resource) in service.resources.iter().enumerate() {
        let path = format!("resources[{}] ({})", i, resource.name);
        if resource.operations.is_empty() {
            diagnostics.push(Diagnostic::warning(
                "W001",
                file,
                &path,
                "resource declares no operations",
            ));
        }

        for (j, endpoint) in resource.endpoints.iter().enumerate() {
            // Endpoints equal to the standard one (e.g. elaborated output) are fine.
            let shadowed = Operation::parse(&endpoint.name)
                .filter(|op| resource.has_operation(*op))
                .map(|op| {
                    let standard = synthesize_endpoint(resource, op, elaborated, &options);
                    !same_surface(endpoint, &standard)
                })
                .unwrap_or(false);
            if shadowed {
                diagnostics.push(Diagnostic::warning(
                    "W002",
                    file,
                    format!("{}.endpoints[{}] ({})", path, j, endpoint.name),
                    format!(
                        "authored endpoint replaces the standard {} endpoint",
                        endpoint.name
                    ),
                ));
            }
        }

        for (j, field) in resource.fields.iter().enumerate() {
            for op in field.operations.iter().filter(|op| !resource.has_operation(**op)) {
                diagnostics.push(Diagnostic::warning(
                    "W003",
                    file,
                    format!("{}.fields[{}] ({})", path, j, field.name),
                    format!("field is tagged {} but the resource does not declare it", op),
                ));
            }
        }
    }
}

fn check_standard_names(service: &Service, file: &Path, diagnostics: &mut Vec<Diagnostic>) {
    let enums = standard_enums();
    let objects = standard_objects();
    for (i, e) in service.enums.iter().enumerate() {
        if STANDARD_TYPE_NAMES.contains(&e.name.as_str()) && !enums.contains(e) {
            diagnostics.push(Diagnostic::warning(
                "W004",
                file,
                format!("enums[{}] ({})", i, e.name),
                format!("enum shadows the standard type {}", e.name),
            ));
        }
    }
    for (i, o) in service.objects.iter().enumerate() {
        if STANDARD_TYPE_NAMES.contains(&o.name.as_str()) && !objects.contains(o) {
            diagnostics.push(Diagnostic::warning(
                "W004",
                file,
                format!("objects[{}] ({})", i, o.name),
                format!("object shadows the standard type {}", o.name),
            ));
        }
    }
}

fn check_examples(elaborated: &Service, file: &Path, diagnostics: &mut Vec<Diagnostic>) {
    for object in &elaborated.objects {
        if let Err(e) = validate_example(&object.name, elaborated) {
            let issues = e.issues();
            if issues.is_empty() {
                diagnostics.push(Diagnostic::warning(
                    "W005",
                    file,
                    format!("objects ({})", object.name),
                    format!("cannot check example: {}", e),
                ));
            }
            for issue in issues {
                diagnostics.push(Diagnostic::warning(
                    "W005",
                    file,
                    format!("objects ({}) example {}", object.name, issue.path),
                    format!("example does not match schema: {}", issue.message),
                ));
            }
        }
    }
}

fn is_spec_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SPEC_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Collect all specification files in a path (file or directory).
fn collect_spec_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if is_spec_file(path) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if is_spec_file(&path) {
            files.push(path);
        }
    }
}
