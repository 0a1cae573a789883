//! Type resolution - maps field types onto target-language type expressions.
//!
//! A field's type name is classified once against the service into a closed
//! [`TypeRef`]; modifiers are then composed around the base type:
//!
//! | Modifiers            | Primitive / enum        | Object                 |
//! |----------------------|-------------------------|------------------------|
//! | (none)               | `types.String`          | `Address`              |
//! | `Nullable`           | `types.String`          | `Address`              |
//! | `Array`              | `[]types.String`        | `[]Address`            |
//! | `Array` + `Nullable` | `[]types.String`        | `[]Address`            |
//!
//! Scalar wrappers carry null-ability themselves, and nested objects are
//! always plain values. The single exception is the filter family: a
//! condition object held directly by a filter root is optional (`*T`), so
//! that "unset" can be told apart from "empty".

use std::collections::HashMap;
use std::fmt;

use crate::filter::{filter_role, FilterRole};
use crate::model::{Field, Object, Service};
use crate::types::{Primitive, TypeOptions};

/// Classification of a field type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(Primitive),
    /// Index into `Service::enums`.
    Enum(usize),
    /// Index into `Service::objects`.
    Object(usize),
    /// Not a known primitive, enum or object. Treated as a primitive the
    /// model does not enumerate.
    Unknown,
}

impl TypeRef {
    pub fn is_object(&self) -> bool {
        matches!(self, TypeRef::Object(_))
    }
}

/// Target-language type expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetType {
    /// Namespaced scalar wrapper, e.g. `types.String`.
    Scalar(String),
    /// Bare object name.
    Named(String),
    Optional(Box<TargetType>),
    Sequence(Box<TargetType>),
}

impl TargetType {
    pub fn is_optional(&self) -> bool {
        matches!(self, TargetType::Optional(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, TargetType::Sequence(_))
    }

    /// The innermost scalar or named type.
    pub fn base(&self) -> &TargetType {
        match self {
            TargetType::Optional(inner) | TargetType::Sequence(inner) => inner.base(),
            other => other,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::Scalar(name) | TargetType::Named(name) => f.write_str(name),
            TargetType::Optional(inner) => write!(f, "*{}", inner),
            TargetType::Sequence(inner) => write!(f, "[]{}", inner),
        }
    }
}

/// Classify a type name by lookup against the service.
///
/// Primitive keywords win over enum and object names; enums win over objects.
pub fn classify(type_name: &str, service: &Service) -> TypeRef {
    if let Some(primitive) = Primitive::parse(type_name) {
        return TypeRef::Primitive(primitive);
    }
    if let Some(idx) = service.enums.iter().position(|e| e.name == type_name) {
        return TypeRef::Enum(idx);
    }
    if let Some(idx) = service.objects.iter().position(|o| o.name == type_name) {
        return TypeRef::Object(idx);
    }
    TypeRef::Unknown
}

/// Resolve a field's target type outside of any enclosing object.
pub fn resolve_type(field: &Field, service: &Service, options: &TypeOptions) -> TargetType {
    TypeResolver::new(service, options.clone()).resolve(field)
}

/// Resolver holding a name index built once per service.
#[derive(Debug)]
pub struct TypeResolver<'a> {
    service: &'a Service,
    index: HashMap<&'a str, TypeRef>,
    options: TypeOptions,
}

impl<'a> TypeResolver<'a> {
    pub fn new(service: &'a Service, options: TypeOptions) -> Self {
        let mut index = HashMap::new();
        for (idx, e) in service.enums.iter().enumerate() {
            index.entry(e.name.as_str()).or_insert(TypeRef::Enum(idx));
        }
        for (idx, o) in service.objects.iter().enumerate() {
            index.entry(o.name.as_str()).or_insert(TypeRef::Object(idx));
        }
        Self {
            service,
            index,
            options,
        }
    }

    pub fn service(&self) -> &'a Service {
        self.service
    }

    pub fn classify(&self, type_name: &str) -> TypeRef {
        if let Some(primitive) = Primitive::parse(type_name) {
            return TypeRef::Primitive(primitive);
        }
        self.index.get(type_name).copied().unwrap_or(TypeRef::Unknown)
    }

    /// The object a type name refers to, if any.
    pub fn object(&self, type_name: &str) -> Option<&'a Object> {
        match self.classify(type_name) {
            TypeRef::Object(idx) => self.service.objects.get(idx),
            _ => None,
        }
    }

    /// Resolve a field with no enclosing-object context.
    pub fn resolve(&self, field: &Field) -> TargetType {
        compose(self.base(&field.type_name), field.is_array(), false)
    }

    /// Resolve a field declared inside `owner`.
    ///
    /// Applies the filter-family exception: a non-array field of a filter
    /// root whose type is a condition object resolves to an optional.
    /// Deeper condition fields and self-referential combinator arrays stay plain.
    pub fn resolve_member(&self, owner: &Object, field: &Field) -> TargetType {
        let optional = !field.is_array()
            && self.classify(&field.type_name).is_object()
            && matches!(
                filter_role(&owner.name, self.service),
                Some(FilterRole::Root { .. })
            )
            && matches!(
                filter_role(&field.type_name, self.service),
                Some(FilterRole::Condition { .. })
            );
        compose(self.base(&field.type_name), field.is_array(), optional)
    }

    /// Resolve every field of an object, in declaration order.
    pub fn resolve_object(&self, object: &Object) -> Vec<(String, TargetType)> {
        object
            .fields
            .iter()
            .map(|field| (field.name.clone(), self.resolve_member(object, field)))
            .collect()
    }

    fn base(&self, type_name: &str) -> TargetType {
        let ns = &self.options.scalar_namespace;
        match self.classify(type_name) {
            TypeRef::Primitive(p) => TargetType::Scalar(format!("{}.{}", ns, p.keyword())),
            TypeRef::Enum(_) => {
                TargetType::Scalar(format!("{}.{}", ns, Primitive::String.keyword()))
            }
            TypeRef::Object(_) => TargetType::Named(type_name.to_string()),
            TypeRef::Unknown => TargetType::Scalar(format!("{}.{}", ns, type_name)),
        }
    }
}

// Array outside; nullability never adds a wrapper of its own.
fn compose(base: TargetType, array: bool, optional: bool) -> TargetType {
    if array {
        TargetType::Sequence(Box::new(base))
    } else if optional {
        TargetType::Optional(Box::new(base))
    } else {
        base
    }
}
