//! JSON Schema projection of the object graph.
//!
//! Named objects and enums are always emitted as `$ref`s into `$defs`, never
//! inlined, so shared and self-referential types project to a finite document.

use serde_json::{json, Map, Value};

use crate::error::{Issue, ValidateError};
use crate::model::{Enum, Field, Object, Service};
use crate::resolver::{classify, TypeRef};
use crate::walker::{example, reachable_objects, referenced_enums, RequestBody};

pub const DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";
pub const DEFS_PREFIX: &str = "#/$defs/";

fn reference(name: &str) -> Value {
    json!({ "$ref": format!("{}{}", DEFS_PREFIX, name) })
}

/// Schema of a single field.
///
/// `Nullable` applies to the element of an array and is ignored for objects.
pub fn field_schema(field: &Field, service: &Service) -> Value {
    let nullable = field.is_nullable();
    let element = match classify(&field.type_name, service) {
        TypeRef::Object(_) => reference(&field.type_name),
        TypeRef::Enum(_) if nullable => {
            json!({ "anyOf": [reference(&field.type_name), { "type": "null" }] })
        }
        TypeRef::Enum(_) => reference(&field.type_name),
        TypeRef::Primitive(p) => {
            let mut schema = Map::new();
            if nullable {
                schema.insert("type".into(), json!([p.json_type(), "null"]));
            } else {
                schema.insert("type".into(), json!(p.json_type()));
            }
            if let Some(format) = p.json_format() {
                schema.insert("format".into(), json!(format));
            }
            Value::Object(schema)
        }
        // Unknown scalars accept anything.
        TypeRef::Unknown => json!({}),
    };

    let mut schema = if field.is_array() {
        json!({ "type": "array", "items": element })
    } else {
        element
    };
    if !field.description.is_empty() {
        if let Value::Object(map) = &mut schema {
            if !map.contains_key("$ref") {
                map.insert("description".into(), json!(field.description));
            }
        }
    }
    schema
}

/// Schema for an ordered field list: `required` lists non-nullable fields.
pub fn fields_schema(fields: &[Field], service: &Service) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        properties.insert(field.name.clone(), field_schema(field, service));
        if !field.is_nullable() {
            required.push(Value::String(field.name.clone()));
        }
    }
    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".into(), Value::Array(required));
    }
    schema.insert("additionalProperties".into(), json!(false));
    Value::Object(schema)
}

pub fn object_schema(object: &Object, service: &Service) -> Value {
    let mut schema = fields_schema(&object.fields, service);
    if let Value::Object(map) = &mut schema {
        map.insert("title".into(), json!(object.name));
        if !object.description.is_empty() {
            map.insert("description".into(), json!(object.description));
        }
    }
    schema
}

pub fn enum_schema(e: &Enum) -> Value {
    let values: Vec<&str> = e.values.iter().map(|v| v.name.as_str()).collect();
    let mut schema = json!({ "title": e.name, "type": "string", "enum": values });
    if !e.description.is_empty() {
        schema["description"] = json!(e.description);
    }
    schema
}

/// Self-contained schema document for the object named `name`.
///
/// # Errors
///
/// Returns `ValidateError::UnknownObject` if no object has that name.
pub fn bundle(name: &str, service: &Service) -> Result<Value, ValidateError> {
    let root = service
        .object(name)
        .ok_or_else(|| ValidateError::UnknownObject {
            name: name.to_string(),
        })?;
    let objects = reachable_objects(root, service);
    let mut defs = Map::new();
    for e in referenced_enums(&objects, service) {
        defs.insert(e.name.clone(), enum_schema(e));
    }
    for object in &objects {
        defs.insert(object.name.clone(), object_schema(object, service));
    }
    Ok(json!({
        "$schema": DRAFT,
        "$ref": format!("{}{}", DEFS_PREFIX, name),
        "$defs": defs,
    }))
}

/// `$defs` for every enum and object of the service, in declaration order.
pub fn components(service: &Service) -> Value {
    let mut defs = Map::new();
    for e in &service.enums {
        defs.insert(e.name.clone(), enum_schema(e));
    }
    for object in &service.objects {
        defs.insert(object.name.clone(), object_schema(object, service));
    }
    Value::Object(defs)
}

/// Schema of a deduplicated request body. Bodies that are existing objects
/// are a reference to that object.
pub fn body_schema(body: &RequestBody, service: &Service) -> Value {
    if body.existing_object {
        return reference(&body.name);
    }
    let mut schema = fields_schema(&body.fields, service);
    schema["title"] = json!(body.name);
    schema
}

/// Check that the generated example of `name` conforms to its generated schema.
///
/// # Errors
///
/// `UnknownObject` for a missing object, `Invalid` with JSON-pointer paths
/// when the example does not conform.
pub fn validate_example(name: &str, service: &Service) -> Result<(), ValidateError> {
    let schema = bundle(name, service)?;
    let instance = example(name, service)?;
    validate_against_schema(&schema, &instance)
}

/// Validate a JSON value against a schema document.
pub fn validate_against_schema(schema: &Value, instance: &Value) -> Result<(), ValidateError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| ValidateError::InvalidSchema {
        message: e.to_string(),
    })?;

    let issues: Vec<Issue> = validator
        .iter_errors(instance)
        .map(|e| Issue::new(e.instance_path.to_string(), e.to_string()))
        .collect();

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { issues })
    }
}
