//! In-memory representation of a service specification.
//!
//! Pure data. The serialized form uses camelCase keys and rejects unknown
//! keys, so a typo in an input document is a parse error rather than a
//! silently ignored setting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{ErrorCode, Method, Modifier, Operation, DEFAULT_TIMEOUT_MS};

/// Root aggregate of a specification.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Service {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_schemes: Vec<SecurityScheme>,
    /// Alternative requirement sets; each maps a scheme name to its scopes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_headers: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationExtension>,
    #[serde(default)]
    pub enums: Vec<Enum>,
    #[serde(default)]
    pub objects: Vec<Object>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn enum_by_name(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn object(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Whether `name` is taken by an enum or an object.
    pub fn has_type(&self, name: &str) -> bool {
        self.enum_by_name(name).is_some() || self.object(name).is_some()
    }

    /// Configured timeout, or the default when absent or non-positive.
    pub fn effective_timeout_ms(&self) -> u64 {
        match self.timeout_ms {
            Some(ms) if ms > 0 => ms as u64,
            _ => DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Retry policy advertised to generated clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RetryPolicy {
    #[serde(default)]
    pub strategy: RetryStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff: Option<Backoff>,
    /// Status codes or ranges such as `"5XX"` or `"429"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_codes: Vec<String>,
    #[serde(default)]
    pub retry_connection_errors: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryStrategy {
    #[default]
    Backoff,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Backoff {
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub max_elapsed_time_ms: u64,
    pub exponent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SecurityScheme {
    pub name: String,
    pub kind: SecuritySchemeKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// HTTP auth scheme, e.g. `bearer` or `basic`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    /// Where an API key is carried: `header`, `query` or `cookie`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SecuritySchemeKind {
    Http,
    ApiKey,
    Oauth2,
    OpenIdConnect,
}

/// Shape of the pagination extension emitted for list-like endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PaginationExtension {
    pub offset_param: String,
    pub limit_param: String,
    pub results_path: String,
}

impl Default for PaginationExtension {
    fn default() -> Self {
        Self {
            offset_param: "offset".to_string(),
            limit_param: "limit".to_string(),
            results_path: "$.data".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Enum {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnumValue {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Object {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Object {
    pub fn new(name: impl Into<String>, description: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Field {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
    #[serde(
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub example: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
        self
    }

    pub fn nullable(self) -> Self {
        self.with_modifier(Modifier::Nullable)
    }

    pub fn array(self) -> Self {
        self.with_modifier(Modifier::Array)
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.modifiers.contains(&Modifier::Nullable)
    }

    pub fn is_array(&self) -> bool {
        self.modifiers.contains(&Modifier::Array)
    }

    /// Structural equality: name, type and modifier set. Descriptions,
    /// defaults and examples do not change the shape of a field.
    pub fn same_shape(&self, other: &Field) -> bool {
        self.name == other.name
            && self.type_name == other.type_name
            && self.is_nullable() == other.is_nullable()
            && self.is_array() == other.is_array()
    }
}

/// A field of a resource, exposed for a subset of operations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourceField {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
    #[serde(
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub example: Option<String>,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl ResourceField {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, operations: &[Operation]) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            operations: operations.to_vec(),
            ..Self::default()
        }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
        self
    }

    pub fn exposed_for(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }

    /// The plain field, without the operation set.
    pub fn to_field(&self) -> Field {
        Field {
            name: self.name.clone(),
            description: self.description.clone(),
            type_name: self.type_name.clone(),
            modifiers: self.modifiers.clone(),
            default: self.default.clone(),
            example: self.example.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Resource {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Attach the standard `Meta` audit object to the entity.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub audit: bool,
    #[serde(default)]
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub fields: Vec<ResourceField>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

impl Resource {
    pub fn new(name: impl Into<String>, operations: &[Operation]) -> Self {
        Self {
            name: name.into(),
            operations: operations.to_vec(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, field: ResourceField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_audit(mut self) -> Self {
        self.audit = true;
        self
    }

    pub fn has_operation(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }

    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    /// Fields exposed for `operation`, in declaration order.
    pub fn fields_for(&self, operation: Operation) -> impl Iterator<Item = &ResourceField> {
        self.fields.iter().filter(move |f| f.exposed_for(operation))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Endpoint {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub method: Method,
    /// Relative to the resource collection; may contain `{param}` placeholders.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub request: EndpointRequest,
    #[serde(default)]
    pub response: EndpointResponse,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorCode>,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: String::new(),
            description: String::new(),
            method,
            path: path.into(),
            request: EndpointRequest::default(),
            response: EndpointResponse::default(),
            errors: Vec::new(),
        }
    }

    pub fn has_body(&self) -> bool {
        !self.request.body_params.is_empty()
    }

    pub fn advertises(&self, status: u16) -> bool {
        self.errors.iter().any(|code| code.status() == status)
    }

    /// Names of the `{param}` placeholders in the path, in order.
    pub fn path_placeholders(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.path.as_str();
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                break;
            };
            names.push(&after[..end]);
            rest = &after[end + 1..];
        }
        names
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EndpointRequest {
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path_params: Vec<Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_params: Vec<Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_params: Vec<Field>,
}

impl Default for EndpointRequest {
    fn default() -> Self {
        Self {
            content_type: default_content_type(),
            headers: Vec::new(),
            path_params: Vec::new(),
            query_params: Vec::new(),
            body_params: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EndpointResponse {
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default = "default_status_code")]
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_object: Option<String>,
}

impl Default for EndpointResponse {
    fn default() -> Self {
        Self {
            content_type: default_content_type(),
            status_code: default_status_code(),
            headers: Vec::new(),
            body_fields: Vec::new(),
            body_object: None,
        }
    }
}

/// Defaults and examples are kept as text and interpreted per type later,
/// but documents may write them as bare numbers or booleans.
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(s) => s,
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}

fn default_content_type() -> String {
    crate::types::DEFAULT_CONTENT_TYPE.to_string()
}

fn default_status_code() -> u16 {
    200
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_rejects_unknown_fields() {
        let result: Result<Field, _> =
            serde_json::from_str(r#"{"name": "id", "type": "UUID", "nulable": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn deserialize_rejects_lowercase_modifier() {
        let result: Result<Field, _> =
            serde_json::from_str(r#"{"name": "id", "type": "UUID", "modifiers": ["nullable"]}"#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("nullable"), "unexpected error: {err}");
    }

    #[test]
    fn deserialize_resource_field() {
        let field: ResourceField = serde_json::from_str(
            r#"{"name": "email", "type": "String", "operations": ["Create", "Read"]}"#,
        )
        .unwrap();
        assert!(field.exposed_for(Operation::Create));
        assert!(!field.exposed_for(Operation::Update));
        assert_eq!(field.to_field(), Field::new("email", "String"));
    }

    #[test]
    fn bare_scalar_examples_become_text() {
        let field: Field = serde_json::from_str(
            r#"{"name": "count", "type": "Int", "default": 0, "example": 42}"#,
        )
        .unwrap();
        assert_eq!(field.default.as_deref(), Some("0"));
        assert_eq!(field.example.as_deref(), Some("42"));

        let field: Field =
            serde_yaml::from_str("{ name: enabled, type: Bool, example: true }").unwrap();
        assert_eq!(field.example.as_deref(), Some("true"));
    }

    #[test]
    fn effective_timeout_falls_back() {
        let mut service = Service::new("Test");
        assert_eq!(service.effective_timeout_ms(), DEFAULT_TIMEOUT_MS);
        service.timeout_ms = Some(0);
        assert_eq!(service.effective_timeout_ms(), DEFAULT_TIMEOUT_MS);
        service.timeout_ms = Some(-5);
        assert_eq!(service.effective_timeout_ms(), DEFAULT_TIMEOUT_MS);
        service.timeout_ms = Some(2500);
        assert_eq!(service.effective_timeout_ms(), 2500);
    }

    #[test]
    fn path_placeholders_in_order() {
        let endpoint = Endpoint::new("Member", Method::Get, "/{groupId}/members/{memberId}");
        assert_eq!(endpoint.path_placeholders(), vec!["groupId", "memberId"]);
        let endpoint = Endpoint::new("List", Method::Get, "");
        assert!(endpoint.path_placeholders().is_empty());
    }

    #[test]
    fn same_shape_ignores_docs() {
        let a = Field::new("name", "String").with_description("a");
        let b = Field::new("name", "String").with_example("Ada");
        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&Field::new("name", "String").nullable()));
    }

    #[test]
    fn endpoint_defaults_fill_content_type() {
        let endpoint: Endpoint =
            serde_json::from_str(r#"{"name": "Ping", "method": "GET", "path": "/ping"}"#).unwrap();
        assert_eq!(endpoint.request.content_type, "application/json");
        assert_eq!(endpoint.response.status_code, 200);
        assert!(endpoint.errors.is_empty());
    }
}
