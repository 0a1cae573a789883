//! Graph walking over the object-reference graph.
//!
//! Three uses share the same cycle rule: example generation, reachability
//! for schema bundling, and request-body deduplication. Entering an object
//! that is already on the recursion stack short-circuits the branch.

use std::collections::HashSet;

use serde_json::{Map, Number, Value};

use crate::error::ValidateError;
use crate::model::{Enum, Field, Object, Service};
use crate::resolver::{TypeRef, TypeResolver};
use crate::types::{Primitive, TypeOptions};

const EXAMPLE_DATE: &str = "2024-01-01";
const EXAMPLE_TIMESTAMP: &str = "2024-01-01T12:00:00Z";
const EXAMPLE_UUID: &str = "123e4567-e89b-12d3-a456-426614174000";

/// Names of the objects currently on the recursion stack.
#[derive(Debug, Clone, Default)]
pub struct Visiting {
    names: HashSet<String>,
}

impl Visiting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `name`. Returns false if it is already being visited.
    pub fn enter(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    pub fn leave(&mut self, name: &str) {
        self.names.remove(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

/// Example instance of the object named `name`.
///
/// # Errors
///
/// Returns `ValidateError::UnknownObject` if no object has that name.
pub fn example(name: &str, service: &Service) -> Result<Value, ValidateError> {
    let object = service
        .object(name)
        .ok_or_else(|| ValidateError::UnknownObject {
            name: name.to_string(),
        })?;
    let walker = Walker::new(service);
    Ok(walker
        .example_object(object, &mut Visiting::new())
        .unwrap_or_else(|| Value::Object(Map::new())))
}

/// Cycle-safe walk of `object`, producing an example value.
///
/// Returns `None` when `object` is already in `visiting`.
pub fn walk(object: &Object, service: &Service, visiting: &mut Visiting) -> Option<Value> {
    Walker::new(service).example_object(object, visiting)
}

/// Whether a field is emitted as a named schema reference rather than inline.
pub fn emits_reference(field: &Field, service: &Service) -> bool {
    matches!(
        crate::resolver::classify(&field.type_name, service),
        TypeRef::Object(_) | TypeRef::Enum(_)
    )
}

/// Example generator bound to one service.
pub struct Walker<'a> {
    resolver: TypeResolver<'a>,
}

impl<'a> Walker<'a> {
    pub fn new(service: &'a Service) -> Self {
        Self {
            resolver: TypeResolver::new(service, TypeOptions::default()),
        }
    }

    pub fn example_object(&self, object: &Object, visiting: &mut Visiting) -> Option<Value> {
        if !visiting.enter(&object.name) {
            return None;
        }
        let mut map = Map::new();
        for field in &object.fields {
            if let Some(value) = self.example_field(field, visiting) {
                map.insert(field.name.clone(), value);
            }
        }
        visiting.leave(&object.name);
        Some(Value::Object(map))
    }

    /// Example for one field. `None` means the field is omitted.
    pub fn example_field(&self, field: &Field, visiting: &mut Visiting) -> Option<Value> {
        match self.resolver.classify(&field.type_name) {
            TypeRef::Object(_) => {
                let object = self.resolver.object(&field.type_name)?;
                let value = self.example_object(object, visiting);
                if field.is_array() {
                    Some(Value::Array(value.into_iter().collect()))
                } else {
                    value
                }
            }
            kind => {
                let value = self.scalar_example(field, kind);
                if field.is_array() {
                    Some(Value::Array(vec![value]))
                } else {
                    Some(value)
                }
            }
        }
    }

    fn scalar_example(&self, field: &Field, kind: TypeRef) -> Value {
        let declared = field.example.as_deref().or(field.default.as_deref());
        match kind {
            TypeRef::Primitive(p) => match declared {
                Some(text) => parse_scalar(p, text),
                None => primitive_example(p),
            },
            TypeRef::Enum(idx) => match declared {
                Some(text) => Value::String(text.to_string()),
                None => self
                    .resolver
                    .service()
                    .enums
                    .get(idx)
                    .and_then(|e| e.values.first())
                    .map(|v| Value::String(v.name.clone()))
                    .unwrap_or(Value::Null),
            },
            TypeRef::Unknown | TypeRef::Object(_) => declared
                .map(|text| Value::String(text.to_string()))
                .unwrap_or(Value::Null),
        }
    }
}

fn primitive_example(p: Primitive) -> Value {
    match p {
        Primitive::String => Value::from("string"),
        Primitive::Int => Value::from(1),
        Primitive::Float => Value::from(1.5),
        Primitive::Bool => Value::Bool(true),
        Primitive::Date => Value::from(EXAMPLE_DATE),
        Primitive::Timestamp => Value::from(EXAMPLE_TIMESTAMP),
        Primitive::Uuid => Value::from(EXAMPLE_UUID),
    }
}

/// Interpret a declared example or default for a primitive.
///
/// Text that does not parse as the primitive is kept as a string.
pub fn parse_scalar(p: Primitive, text: &str) -> Value {
    let parsed = match p {
        Primitive::Int => text.trim().parse::<i64>().ok().map(Value::from),
        Primitive::Float => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        Primitive::Bool => match text.trim() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::String(text.to_string()))
}

/// `root` and every object reachable from it, depth-first in declaration
/// order, each listed once.
pub fn reachable_objects<'a>(root: &'a Object, service: &'a Service) -> Vec<&'a Object> {
    let resolver = TypeResolver::new(service, TypeOptions::default());
    let mut seen = Visiting::new();
    let mut out = Vec::new();
    collect_reachable(root, &resolver, &mut seen, &mut out);
    out
}

fn collect_reachable<'a>(
    object: &'a Object,
    resolver: &TypeResolver<'a>,
    seen: &mut Visiting,
    out: &mut Vec<&'a Object>,
) {
    // Never left: each object is emitted once.
    if !seen.enter(&object.name) {
        return;
    }
    out.push(object);
    for field in &object.fields {
        if let Some(next) = resolver.object(&field.type_name) {
            collect_reachable(next, resolver, seen, out);
        }
    }
}

/// Enums referenced by the fields of `objects`, in first-use order.
pub fn referenced_enums<'a>(objects: &[&Object], service: &'a Service) -> Vec<&'a Enum> {
    let mut out: Vec<&Enum> = Vec::new();
    for field in objects.iter().flat_map(|o| o.fields.iter()) {
        if let Some(e) = service.enum_by_name(&field.type_name) {
            if !out.iter().any(|seen| seen.name == e.name) {
                out.push(e);
            }
        }
    }
    out
}

/// Structural equality of two field lists, in order.
pub fn same_shape_list(a: &[Field], b: &[Field]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_shape(y))
}

/// Named request-body shapes with first-writer-wins naming.
#[derive(Debug, Clone, Default)]
pub struct BodyRegistry {
    entries: Vec<(String, Vec<Field>)>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the service's objects, so a body equal
    /// to an existing object reuses its name.
    pub fn seeded(service: &Service) -> Self {
        Self {
            entries: service
                .objects
                .iter()
                .map(|o| (o.name.clone(), o.fields.clone()))
                .collect(),
        }
    }

    /// Register `fields` under `name` and return the name the shape resolves to.
    ///
    /// An equal shape already registered wins. A different shape under a
    /// taken name gets the first free numeric suffix.
    pub fn register(&mut self, name: &str, fields: &[Field]) -> String {
        if let Some((existing, _)) = self
            .entries
            .iter()
            .find(|(_, shape)| same_shape_list(shape, fields))
        {
            return existing.clone();
        }
        let mut candidate = name.to_string();
        let mut n = 2;
        while self.contains(&candidate) {
            candidate = format!("{}{}", name, n);
            n += 1;
        }
        self.entries.push((candidate.clone(), fields.to_vec()));
        candidate
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&[Field]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, fields)| fields.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

/// A shared request-body schema and the endpoints using it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    pub name: String,
    pub fields: Vec<Field>,
    /// `Resource.Endpoint` identifiers, in declaration order.
    pub used_by: Vec<String>,
    /// True when the shape is an existing object rather than a new body.
    pub existing_object: bool,
}

/// Deduplicated request bodies of every endpoint that has body parameters.
pub fn request_bodies(service: &Service) -> Vec<RequestBody> {
    let mut registry = BodyRegistry::seeded(service);
    let mut bodies: Vec<RequestBody> = Vec::new();
    for resource in &service.resources {
        for endpoint in resource.endpoints.iter().filter(|e| e.has_body()) {
            let wanted = format!("{}{}Request", resource.name, endpoint.name);
            let name = registry.register(&wanted, &endpoint.request.body_params);
            let user = format!("{}.{}", resource.name, endpoint.name);
            match bodies.iter_mut().find(|b| b.name == name) {
                Some(body) => body.used_by.push(user),
                None => bodies.push(RequestBody {
                    existing_object: service.object(&name).is_some(),
                    fields: registry.get(&name).map(<[Field]>::to_vec).unwrap_or_default(),
                    name,
                    used_by: vec![user],
                }),
            }
        }
    }
    bodies
}
