//! Structural validation of a parsed service.
//!
//! Runs before elaboration and collects every problem instead of stopping at
//! the first. Literal casing is already enforced by deserialization; this
//! pass covers names, references and endpoint shapes.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{Issue, ValidateError};
use crate::model::{Endpoint, Field, Service};
use crate::overlay::STANDARD_TYPE_NAMES;
use crate::types::{Modifier, Primitive};

/// Validate a service.
///
/// # Errors
///
/// Returns `ValidateError::Invalid` carrying every issue found.
pub fn validate_service(service: &Service) -> Result<(), ValidateError> {
    let issues = collect_issues(service);
    if issues.is_empty() {
        Ok(())
    } else {
        debug!(count = issues.len(), "Specification has issues.");
        Err(ValidateError::Invalid { issues })
    }
}

/// Every structural issue in a service, in document order.
pub fn collect_issues(service: &Service) -> Vec<Issue> {
    let mut checker = Checker::new(service);
    checker.run();
    checker.issues
}

fn segment(kind: &str, idx: usize, name: &str) -> String {
    if name.is_empty() {
        format!("{}[{}]", kind, idx)
    } else {
        format!("{}[{}] ({})", kind, idx, name)
    }
}

struct Checker<'a> {
    service: &'a Service,
    /// Names a field type may refer to, besides primitives.
    types: HashSet<&'a str>,
    /// Names a response `bodyObject` may refer to.
    objects: HashSet<&'a str>,
    issues: Vec<Issue>,
}

impl<'a> Checker<'a> {
    fn new(service: &'a Service) -> Self {
        let mut objects: HashSet<&str> = service.objects.iter().map(|o| o.name.as_str()).collect();
        objects.extend(service.resources.iter().map(|r| r.name.as_str()));
        objects.extend(STANDARD_TYPE_NAMES.iter().copied());
        let mut types = objects.clone();
        types.extend(service.enums.iter().map(|e| e.name.as_str()));
        Self {
            service,
            types,
            objects,
            issues: Vec::new(),
        }
    }

    fn issue(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(Issue::new(path, message));
    }

    fn run(&mut self) {
        let service = self.service;
        if service.name.trim().is_empty() {
            self.issue("name", "service name must not be empty");
        }
        self.check_enums();
        self.check_objects();
        self.check_resources();
        self.check_fields("responseHeaders", &service.response_headers);
    }

    fn check_enums(&mut self) {
        let service = self.service;
        let mut seen = HashSet::new();
        for (i, e) in service.enums.iter().enumerate() {
            let path = segment("enums", i, &e.name);
            if e.name.is_empty() {
                self.issue(&path, "enum name must not be empty");
            } else if !seen.insert(e.name.as_str()) {
                self.issue(&path, format!("duplicate enum name \"{}\"", e.name));
            }
            if service.object(&e.name).is_some() {
                self.issue(&path, format!("\"{}\" is both an enum and an object", e.name));
            }
            if e.values.is_empty() {
                self.issue(&path, "enum has no values");
            }
            let mut values = HashSet::new();
            for (j, v) in e.values.iter().enumerate() {
                let vpath = format!("{}.{}", path, segment("values", j, &v.name));
                if v.name.is_empty() {
                    self.issue(vpath, "enum value name must not be empty");
                } else if !values.insert(v.name.as_str()) {
                    self.issue(vpath, format!("duplicate enum value \"{}\"", v.name));
                }
            }
        }
    }

    fn check_objects(&mut self) {
        let service = self.service;
        let mut seen = HashSet::new();
        for (i, o) in service.objects.iter().enumerate() {
            let path = segment("objects", i, &o.name);
            if o.name.is_empty() {
                self.issue(&path, "object name must not be empty");
            } else if !seen.insert(o.name.as_str()) {
                self.issue(&path, format!("duplicate object name \"{}\"", o.name));
            }
            self.check_fields(&path, &o.fields);
        }
    }

    fn check_resources(&mut self) {
        let service = self.service;
        let mut seen = HashSet::new();
        for (i, r) in service.resources.iter().enumerate() {
            let path = segment("resources", i, &r.name);
            if r.name.is_empty() {
                self.issue(&path, "resource name must not be empty");
            } else if !seen.insert(r.name.as_str()) {
                self.issue(&path, format!("duplicate resource name \"{}\"", r.name));
            }
            if service.enum_by_name(&r.name).is_some() {
                self.issue(&path, format!("resource \"{}\" collides with an enum", r.name));
            }

            let fields: Vec<Field> = r.fields.iter().map(|f| f.to_field()).collect();
            self.check_fields(&path, &fields);

            let mut names = HashSet::new();
            for (j, endpoint) in r.endpoints.iter().enumerate() {
                let epath = format!("{}.{}", path, segment("endpoints", j, &endpoint.name));
                if endpoint.name.is_empty() {
                    self.issue(&epath, "endpoint name must not be empty");
                } else if !names.insert(endpoint.name.as_str()) {
                    self.issue(&epath, format!("duplicate endpoint name \"{}\"", endpoint.name));
                }
                self.check_endpoint(&epath, endpoint);
            }
        }
    }

    fn check_endpoint(&mut self, path: &str, endpoint: &Endpoint) {
        if !endpoint.path.is_empty() && !endpoint.path.starts_with('/') {
            self.issue(
                path,
                format!("path \"{}\" must be empty or start with '/'", endpoint.path),
            );
        }

        let placeholders = endpoint.path_placeholders();
        let params: Vec<&str> = endpoint
            .request
            .path_params
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        for name in &placeholders {
            if !params.contains(name) {
                self.issue(path, format!("path placeholder {{{}}} has no path parameter", name));
            }
        }
        for name in &params {
            if !placeholders.contains(name) {
                self.issue(path, format!("path parameter \"{}\" does not appear in the path", name));
            }
        }

        let response = &endpoint.response;
        if response.body_object.is_some() && !response.body_fields.is_empty() {
            self.issue(path, "response cannot have both bodyObject and bodyFields");
        }
        if let Some(object) = &response.body_object {
            if !self.objects.contains(object.as_str()) {
                self.issue(path, format!("unknown response bodyObject \"{}\"", object));
            }
        }
        if !(100..=599).contains(&response.status_code) {
            self.issue(
                path,
                format!("status code {} is outside 100-599", response.status_code),
            );
        }
        if endpoint.has_body() && !endpoint.method.allows_body() {
            self.issue(
                path,
                format!("{} endpoints cannot have body parameters", endpoint.method),
            );
        }

        let request = &endpoint.request;
        for (kind, fields) in [
            ("request.headers", &request.headers),
            ("request.pathParams", &request.path_params),
            ("request.queryParams", &request.query_params),
            ("request.bodyParams", &request.body_params),
            ("response.headers", &response.headers),
            ("response.bodyFields", &response.body_fields),
        ] {
            self.check_fields(&format!("{}.{}", path, kind), fields);
        }
    }

    fn check_fields(&mut self, owner: &str, fields: &[Field]) {
        let mut seen = HashSet::new();
        for (i, field) in fields.iter().enumerate() {
            let path = format!("{}.{}", owner, segment("fields", i, &field.name));
            if field.name.is_empty() {
                self.issue(&path, "field name must not be empty");
            } else if !seen.insert(field.name.as_str()) {
                self.issue(&path, format!("duplicate field name \"{}\"", field.name));
            }
            for modifier in [Modifier::Nullable, Modifier::Array] {
                if field.modifiers.iter().filter(|m| **m == modifier).count() > 1 {
                    self.issue(&path, format!("modifier {} listed more than once", modifier.as_str()));
                }
            }
            if !self.resolves(&field.type_name) {
                let mut message = format!("invalid field type \"{}\"", field.type_name);
                if let Some(suggestion) = self.suggest(&field.type_name) {
                    message.push_str(&format!(" (did you mean \"{}\"?)", suggestion));
                }
                self.issue(path, message);
            }
        }
    }

    fn resolves(&self, type_name: &str) -> bool {
        Primitive::parse(type_name).is_some() || self.types.contains(type_name)
    }

    // Case-insensitive match against known names; sorted for stable output.
    fn suggest(&self, type_name: &str) -> Option<String> {
        let mut candidates: Vec<&str> = Primitive::ALL
            .iter()
            .map(|p| p.keyword())
            .chain(self.types.iter().copied())
            .filter(|name| name.eq_ignore_ascii_case(type_name))
            .collect();
        candidates.sort_unstable();
        candidates.first().map(|s| s.to_string())
    }
}
