//! apispec
//!
//! Elaboration of declarative service specifications into complete API models.
//!
//! A specification declares resources, their fields and the standard
//! operations they support. [`elaborate`] expands it into a full service:
//! default endpoints, recursive filter objects for searching, and the
//! standard `Error`, `Meta` and `Pagination` types. The type resolver and
//! graph walker turn the result into target-language types, examples and
//! JSON Schemas.
//!
//! # Example
//!
//! ```
//! use apispec::{elaborate, example, load_service_str, validate_service, Format, TypeOptions, TypeResolver};
//!
//! let spec = r#"
//! name: Accounts
//! resources:
//!   - name: User
//!     operations: [Create, Read, Search]
//!     fields:
//!       - { name: id, type: UUID, operations: [Read] }
//!       - { name: email, type: String, operations: [Create, Read, Search] }
//! "#;
//!
//! let service = load_service_str(spec, Format::Yaml).unwrap();
//! validate_service(&service).unwrap();
//!
//! let elaborated = elaborate(&service);
//! let user = elaborated.resource("User").unwrap();
//! assert_eq!(user.endpoints.len(), 3);
//! assert_eq!(user.endpoint("Search").unwrap().path, "/_search");
//!
//! // Filter roots hold their conditions as optionals.
//! let resolver = TypeResolver::new(&elaborated, TypeOptions::default());
//! let root = elaborated.object("UserFilter").unwrap();
//! let equals = resolver.resolve_member(root, root.field("equals").unwrap());
//! assert_eq!(equals.to_string(), "*UserFilterEquals");
//!
//! // The self-referential combinators stop at the first repeat.
//! let value = example("UserFilter", &elaborated).unwrap();
//! assert_eq!(value["and"], serde_json::json!([]));
//! ```
//!
//! # Modifier Rules
//!
//! | Modifiers | Primitive / enum | Object |
//! |-----------|------------------|--------|
//! | (none) | `types.String` | `Address` |
//! | `Nullable` | `types.String` | `Address` |
//! | `Array` | `[]types.String` | `[]Address` |
//! | `Array`, `Nullable` | `[]types.String` | `[]Address` |

mod error;
mod filter;
mod linter;
mod loader;
mod model;
mod overlay;
mod resolver;
mod schema;
mod types;
mod validator;
mod walker;

pub use error::{Issue, LoadError, ValidateError};
pub use filter::{
    condition_name, filter_name, filter_role, filterable_fields, is_filterable, FilterFamily,
    FilterRole, COMBINATORS,
};
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{is_url, load_service, load_service_auto, load_service_str, Format};
pub use model::{
    Backoff, Endpoint, EndpointRequest, EndpointResponse, Enum, EnumValue, Field, Object,
    PaginationExtension, Resource, ResourceField, RetryPolicy, RetryStrategy, SecurityScheme,
    SecuritySchemeKind, Server, Service,
};
pub use overlay::{
    elaborate, elaborate_with, entity_object, standard_enums, standard_objects,
    synthesize_endpoint, synthesize_endpoints, ERROR_CODE_ENUM, ERROR_OBJECT, META_OBJECT,
    PAGINATION_OBJECT, STANDARD_TYPE_NAMES,
};
pub use resolver::{classify, resolve_type, TargetType, TypeRef, TypeResolver};
pub use schema::{
    body_schema, bundle, components, enum_schema, field_schema, fields_schema, object_schema,
    validate_against_schema, validate_example,
};
pub use types::{
    ElaborateOptions, ErrorCode, Method, Modifier, Operation, Primitive, TypeOptions,
    DEFAULT_CONTENT_TYPE, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_MS,
};
pub use validator::{collect_issues, validate_service};
pub use walker::{
    emits_reference, example, parse_scalar, reachable_objects, referenced_enums, request_bodies,
    same_shape_list, walk, BodyRegistry, RequestBody, Visiting, Walker,
};

#[cfg(feature = "remote")]
pub use loader::load_service_url;
