//! Core literal types for service specifications.
//!
//! Every literal accepted in a specification document is a closed enum here.
//! Parsing is exact-case: `Nullable` is a modifier, `nullable` is not.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default request timeout advertised to generated clients, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default content type for synthesized requests and responses.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Default `limit` query parameter value for List and Search endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Standard operations a resource can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    List,
    Search,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
        Operation::List,
        Operation::Search,
    ];

    /// Exact-case keyword, also the name of the synthesized endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "Create",
            Operation::Read => "Read",
            Operation::Update => "Update",
            Operation::Delete => "Delete",
            Operation::List => "List",
            Operation::Search => "Search",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == s)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orthogonal field annotation composed with a base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Modifier {
    Nullable,
    Array,
}

impl Modifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Nullable => "Nullable",
            Modifier::Array => "Array",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Nullable" => Some(Modifier::Nullable),
            "Array" => Some(Modifier::Array),
            _ => None,
        }
    }
}

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Whether requests with this method may carry a body.
    pub fn allows_body(&self) -> bool {
        !matches!(self, Method::Get | Method::Delete)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Int,
    Float,
    Bool,
    Date,
    Timestamp,
    Uuid,
}

impl Primitive {
    pub const ALL: [Primitive; 7] = [
        Primitive::String,
        Primitive::Int,
        Primitive::Float,
        Primitive::Bool,
        Primitive::Date,
        Primitive::Timestamp,
        Primitive::Uuid,
    ];

    /// The exact-case keyword used in specification documents.
    pub fn keyword(&self) -> &'static str {
        match self {
            Primitive::String => "String",
            Primitive::Int => "Int",
            Primitive::Float => "Float",
            Primitive::Bool => "Bool",
            Primitive::Date => "Date",
            Primitive::Timestamp => "Timestamp",
            Primitive::Uuid => "UUID",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.keyword() == s)
    }

    /// Whether values of this type support ordering comparisons.
    pub fn is_ordinal(&self) -> bool {
        matches!(
            self,
            Primitive::Int | Primitive::Float | Primitive::Date | Primitive::Timestamp
        )
    }

    /// JSON Schema `type` keyword for this primitive.
    pub fn json_type(&self) -> &'static str {
        match self {
            Primitive::Int => "integer",
            Primitive::Float => "number",
            Primitive::Bool => "boolean",
            _ => "string",
        }
    }

    /// JSON Schema `format` keyword, if any.
    pub fn json_format(&self) -> Option<&'static str> {
        match self {
            Primitive::Date => Some("date"),
            Primitive::Timestamp => Some("date-time"),
            Primitive::Uuid => Some("uuid"),
            _ => None,
        }
    }
}

/// Standard error codes advertised by every synthesized endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    UnprocessableEntity,
    RateLimited,
    Internal,
}

impl ErrorCode {
    /// All codes, in ascending HTTP status order.
    pub const ALL: [ErrorCode; 8] = [
        ErrorCode::BadRequest,
        ErrorCode::Unauthorized,
        ErrorCode::Forbidden,
        ErrorCode::NotFound,
        ErrorCode::Conflict,
        ErrorCode::UnprocessableEntity,
        ErrorCode::RateLimited,
        ErrorCode::Internal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BadRequest",
            ErrorCode::Unauthorized => "Unauthorized",
            ErrorCode::Forbidden => "Forbidden",
            ErrorCode::NotFound => "NotFound",
            ErrorCode::Conflict => "Conflict",
            ErrorCode::UnprocessableEntity => "UnprocessableEntity",
            ErrorCode::RateLimited => "RateLimited",
            ErrorCode::Internal => "Internal",
        }
    }

    /// HTTP status the code maps to.
    pub fn status(&self) -> u16 {
        match self {
            ErrorCode::BadRequest => 400,
            ErrorCode::Unauthorized => 401,
            ErrorCode::Forbidden => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::Conflict => 409,
            ErrorCode::UnprocessableEntity => 422,
            ErrorCode::RateLimited => 429,
            ErrorCode::Internal => 500,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "The request is malformed.",
            ErrorCode::Unauthorized => "The request lacks valid authentication credentials.",
            ErrorCode::Forbidden => "The caller is not allowed to perform this action.",
            ErrorCode::NotFound => "The requested resource does not exist.",
            ErrorCode::Conflict => "The request conflicts with the current state of the resource.",
            ErrorCode::UnprocessableEntity => "The request body failed validation.",
            ErrorCode::RateLimited => "Too many requests were sent in a given amount of time.",
            ErrorCode::Internal => "The server encountered an unexpected condition.",
        }
    }

    /// Error set for an endpoint. `UnprocessableEntity` only applies when
    /// the request carries body parameters.
    pub fn for_request(has_body: bool) -> Vec<ErrorCode> {
        Self::ALL
            .into_iter()
            .filter(|code| has_body || *code != ErrorCode::UnprocessableEntity)
            .collect()
    }

    /// An authored error list with `UnprocessableEntity` present iff the
    /// request has a body, in status order and without repeats.
    pub fn gate(codes: &[ErrorCode], has_body: bool) -> Vec<ErrorCode> {
        let mut gated: Vec<ErrorCode> = codes
            .iter()
            .copied()
            .filter(|code| *code != ErrorCode::UnprocessableEntity)
            .collect();
        if has_body {
            gated.push(ErrorCode::UnprocessableEntity);
        }
        gated.sort_unstable();
        gated.dedup();
        gated
    }
}

/// Options for the Type Resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeOptions {
    /// Namespace of the scalar wrapper types (e.g. `types` gives `types.String`).
    pub scalar_namespace: String,
}

impl TypeOptions {
    pub fn new(scalar_namespace: impl Into<String>) -> Self {
        Self {
            scalar_namespace: scalar_namespace.into(),
        }
    }
}

impl Default for TypeOptions {
    fn default() -> Self {
        Self::new("types")
    }
}

/// Options for the Overlay Engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElaborateOptions {
    /// Content type of synthesized requests and responses.
    pub content_type: String,
    /// Default value of the `limit` query parameter.
    pub default_page_size: u32,
}

impl ElaborateOptions {
    pub fn new() -> Self {
        Self {
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = size;
        self
    }
}

impl Default for ElaborateOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_parse_is_exact_case() {
        assert_eq!(Operation::parse("Create"), Some(Operation::Create));
        assert_eq!(Operation::parse("Search"), Some(Operation::Search));
        assert_eq!(Operation::parse("create"), None);
        assert_eq!(Operation::parse("CREATE"), None);
    }

    #[test]
    fn modifier_parse_is_exact_case() {
        assert_eq!(Modifier::parse("Nullable"), Some(Modifier::Nullable));
        assert_eq!(Modifier::parse("Array"), Some(Modifier::Array));
        assert_eq!(Modifier::parse("nullable"), None);
        assert_eq!(Modifier::parse("array"), None);
    }

    #[test]
    fn modifier_serde_rejects_lowercase() {
        let ok: Modifier = serde_json::from_str(r#""Nullable""#).unwrap();
        assert_eq!(ok, Modifier::Nullable);
        assert!(serde_json::from_str::<Modifier>(r#""nullable""#).is_err());
    }

    #[test]
    fn method_serde_is_uppercase() {
        assert_eq!(serde_json::to_string(&Method::Patch).unwrap(), r#""PATCH""#);
        assert!(serde_json::from_str::<Method>(r#""get""#).is_err());
    }

    #[test]
    fn primitive_keywords() {
        assert_eq!(Primitive::parse("UUID"), Some(Primitive::Uuid));
        assert_eq!(Primitive::parse("Uuid"), None);
        assert_eq!(Primitive::parse("string"), None);
        assert!(Primitive::Timestamp.is_ordinal());
        assert!(!Primitive::String.is_ordinal());
        assert!(!Primitive::Bool.is_ordinal());
    }

    #[test]
    fn error_code_statuses() {
        let statuses: Vec<u16> = ErrorCode::ALL.iter().map(|c| c.status()).collect();
        assert_eq!(statuses, vec![400, 401, 403, 404, 409, 422, 429, 500]);
    }

    #[test]
    fn error_set_gated_on_body() {
        assert!(!ErrorCode::for_request(false).contains(&ErrorCode::UnprocessableEntity));
        assert!(ErrorCode::for_request(true).contains(&ErrorCode::UnprocessableEntity));
        assert_eq!(ErrorCode::for_request(false).len(), 7);
        assert_eq!(ErrorCode::for_request(true).len(), 8);
    }

    #[test]
    fn authored_codes_gated() {
        use ErrorCode::*;
        assert_eq!(
            ErrorCode::gate(&[Internal, NotFound, Internal], true),
            vec![NotFound, UnprocessableEntity, Internal]
        );
        assert_eq!(ErrorCode::gate(&[UnprocessableEntity], false), vec![]);
        assert_eq!(ErrorCode::gate(&ErrorCode::ALL, true), ErrorCode::ALL.to_vec());
    }

    #[test]
    fn elaborate_options_builder() {
        let opts = ElaborateOptions::new()
            .content_type("application/vnd.api+json")
            .default_page_size(10);
        assert_eq!(opts.content_type, "application/vnd.api+json");
        assert_eq!(opts.default_page_size, 10);
    }
}
