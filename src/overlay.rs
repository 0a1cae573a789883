//! Overlay Engine - expands minimal resource declarations into a complete
//! service.
//!
//! The pass runs in a fixed order over a clone of the input:
//!
//! 1. standard enums and objects (`ErrorCode`, `Error`, `Meta`, `Pagination`)
//! 2. one entity object per resource
//! 3. filter families for searchable resources
//! 4. one endpoint per declared operation
//! 5. error sets: filled where absent, `UnprocessableEntity` gated on a body
//!
//! Every step skips names that already exist, so authored declarations win
//! and running the pass over its own output changes nothing.

use tracing::{debug, info, warn};

use crate::filter::{filter_name, is_filterable, FamilyBuilder};
use crate::model::{
    Endpoint, EndpointRequest, EndpointResponse, Enum, EnumValue, Field, Object, Resource, Service,
};
use crate::types::{ElaborateOptions, ErrorCode, Method, Operation, Primitive};

pub const ERROR_CODE_ENUM: &str = "ErrorCode";
pub const ERROR_OBJECT: &str = "Error";
pub const META_OBJECT: &str = "Meta";
pub const PAGINATION_OBJECT: &str = "Pagination";

/// Every name the overlay may add at service level.
pub const STANDARD_TYPE_NAMES: [&str; 4] =
    [ERROR_CODE_ENUM, ERROR_OBJECT, META_OBJECT, PAGINATION_OBJECT];

/// Name of the audit field attached to audited entities.
pub const META_FIELD: &str = "meta";

/// Path of item-level endpoints, relative to the collection.
pub const ITEM_PATH: &str = "/{id}";
pub const SEARCH_PATH: &str = "/_search";

pub fn meta_field() -> Field {
    Field::new(META_FIELD, META_OBJECT).with_description("Audit metadata.")
}

pub fn standard_enums() -> Vec<Enum> {
    vec![Enum {
        name: ERROR_CODE_ENUM.to_string(),
        description: "Machine-readable error code.".to_string(),
        values: ErrorCode::ALL
            .iter()
            .map(|code| EnumValue {
                name: code.as_str().to_string(),
                description: format!("{} {}", code.status(), code.description()),
            })
            .collect(),
    }]
}

pub fn standard_objects() -> Vec<Object> {
    let string = Primitive::String.keyword();
    let int = Primitive::Int.keyword();
    let timestamp = Primitive::Timestamp.keyword();
    vec![
        Object::new(
            ERROR_OBJECT,
            "Error returned by every endpoint on failure.",
            vec![
                Field::new("code", ERROR_CODE_ENUM),
                Field::new("message", string).with_description("Human-readable explanation."),
                Field::new("requestId", string).with_description("Identifier of the failed request."),
            ],
        ),
        Object::new(
            META_OBJECT,
            "Audit metadata.",
            vec![
                Field::new("createdAt", timestamp),
                Field::new("createdBy", string).nullable(),
                Field::new("updatedAt", timestamp),
                Field::new("updatedBy", string).nullable(),
            ],
        ),
        Object::new(
            PAGINATION_OBJECT,
            "Position of a page within a result set.",
            vec![
                Field::new("offset", int),
                Field::new("limit", int),
                Field::new("total", int).with_description("Total number of matching records."),
            ],
        ),
    ]
}

/// The object returned as a resource's full entity: fields tagged `Read`,
/// then `meta` when audited.
pub fn entity_object(resource: &Resource) -> Object {
    let mut fields: Vec<Field> = resource
        .fields_for(Operation::Read)
        .map(|f| f.to_field())
        .collect();
    if resource.audit && !fields.iter().any(|f| f.name == META_FIELD) {
        fields.push(meta_field());
    }
    Object::new(resource.name.clone(), resource.description.clone(), fields)
}

/// Elaborate with default options.
pub fn elaborate(service: &Service) -> Service {
    elaborate_with(service, &ElaborateOptions::default())
}

/// Produce the elaborated form of `service`. The input is not modified.
pub fn elaborate_with(service: &Service, options: &ElaborateOptions) -> Service {
    let mut out = service.clone();
    let types_before = out.enums.len() + out.objects.len();

    add_standard_types(&mut out);
    add_entities(&mut out);
    add_filter_families(&mut out);

    let mut synthesized = 0;
    for idx in 0..out.resources.len() {
        let endpoints = synthesize_endpoints(&out.resources[idx], &out, options);
        synthesized += endpoints.len();
        out.resources[idx].endpoints.extend(endpoints);
    }

    fill_errors(&mut out);

    info!(
        service = %out.name,
        endpoints = synthesized,
        types = out.enums.len() + out.objects.len() - types_before,
        "Elaborated service."
    );
    out
}

fn add_standard_types(service: &mut Service) {
    for e in standard_enums() {
        match service.enum_by_name(&e.name) {
            Some(existing) if *existing != e => {
                warn!(name = %e.name, "Authored enum shadows a standard type; keeping it.")
            }
            Some(_) => {}
            None if service.object(&e.name).is_some() => {
                warn!(name = %e.name, "Authored object shadows a standard enum; keeping it.")
            }
            None => {
                debug!(name = %e.name, "Added standard enum.");
                service.enums.push(e);
            }
        }
    }
    for o in standard_objects() {
        match service.object(&o.name) {
            Some(existing) if *existing != o => {
                warn!(name = %o.name, "Authored object shadows a standard type; keeping it.")
            }
            Some(_) => {}
            None if service.enum_by_name(&o.name).is_some() => {
                warn!(name = %o.name, "Authored enum shadows a standard object; keeping it.")
            }
            None => {
                debug!(name = %o.name, "Added standard object.");
                service.objects.push(o);
            }
        }
    }
}

fn add_entities(service: &mut Service) {
    let entities: Vec<Object> = service.resources.iter().map(entity_object).collect();
    for entity in entities {
        match service.object(&entity.name) {
            Some(existing) if *existing != entity => {
                warn!(resource = %entity.name, "Authored object shadows the entity; keeping it.")
            }
            Some(_) => {}
            None if service.has_type(&entity.name) => {
                warn!(resource = %entity.name, "Entity name is taken by an enum; skipping.")
            }
            None => {
                debug!(resource = %entity.name, "Added entity object.");
                service.objects.push(entity);
            }
        }
    }
}

fn add_filter_families(service: &mut Service) {
    let created = {
        let mut builder = FamilyBuilder::new(service);
        for resource in service.resources.iter().filter(|r| is_filterable(r)) {
            builder.build(resource);
        }
        builder.into_objects()
    };
    service.objects.extend(created);
}

/// Endpoints to append to `resource`, one per declared operation that has
/// no endpoint of the same name yet.
pub fn synthesize_endpoints(
    resource: &Resource,
    service: &Service,
    options: &ElaborateOptions,
) -> Vec<Endpoint> {
    let mut out: Vec<Endpoint> = Vec::new();
    for &op in &resource.operations {
        if out.iter().any(|e| e.name == op.as_str()) {
            continue;
        }
        let endpoint = synthesize_endpoint(resource, op, service, options);
        match resource.endpoint(op.as_str()) {
            Some(authored) if !same_surface(authored, &endpoint) => {
                warn!(
                    resource = %resource.name,
                    endpoint = op.as_str(),
                    "Authored endpoint replaces the standard one."
                );
            }
            Some(_) => {}
            None => {
                debug!(
                    resource = %resource.name,
                    endpoint = op.as_str(),
                    method = %endpoint.method,
                    path = %endpoint.path,
                    "Synthesized endpoint."
                );
                out.push(endpoint);
            }
        }
    }
    out
}

/// Whether two endpoints expose the same method, path, request and response.
/// Errors are ignored, as they may still be filled in.
pub(crate) fn same_surface(a: &Endpoint, b: &Endpoint) -> bool {
    a.method == b.method && a.path == b.path && a.request == b.request && a.response == b.response
}

/// The standard endpoint for one operation.
pub fn synthesize_endpoint(
    resource: &Resource,
    op: Operation,
    service: &Service,
    options: &ElaborateOptions,
) -> Endpoint {
    let tagged = |tag: Operation| -> Vec<Field> {
        resource.fields_for(tag).map(|f| f.to_field()).collect()
    };
    let mut request = EndpointRequest {
        content_type: options.content_type.clone(),
        ..EndpointRequest::default()
    };
    let mut response = EndpointResponse {
        content_type: options.content_type.clone(),
        ..EndpointResponse::default()
    };

    let (method, path) = match op {
        Operation::Create => {
            request.body_params = tagged(Operation::Create);
            response.status_code = 201;
            response.body_object = Some(resource.name.clone());
            (Method::Post, "")
        }
        Operation::Read => {
            request.path_params = vec![id_param()];
            response.body_object = Some(resource.name.clone());
            (Method::Get, ITEM_PATH)
        }
        Operation::Update => {
            request.path_params = vec![id_param()];
            request.body_params = tagged(Operation::Update);
            response.body_object = Some(resource.name.clone());
            (Method::Patch, ITEM_PATH)
        }
        Operation::Delete => {
            request.path_params = vec![id_param()];
            response.status_code = 204;
            (Method::Delete, ITEM_PATH)
        }
        Operation::List => {
            request.query_params = page_params(options);
            request
                .query_params
                .extend(tagged(Operation::List).into_iter().map(Field::nullable));
            response.body_fields = page_body(resource);
            (Method::Get, "")
        }
        Operation::Search => {
            request.query_params = page_params(options);
            request.body_params = service
                .object(&filter_name(&resource.name))
                .map(|o| o.fields.clone())
                .unwrap_or_default();
            response.body_fields = page_body(resource);
            (Method::Post, SEARCH_PATH)
        }
    };

    let mut endpoint = Endpoint::new(op.as_str(), method, path);
    endpoint.title = format!("{} {}", op, resource.name);
    endpoint.description = describe(op, &resource.name);
    endpoint.request = request;
    endpoint.response = response;
    endpoint.errors = ErrorCode::for_request(endpoint.has_body());
    endpoint
}

fn describe(op: Operation, resource: &str) -> String {
    match op {
        Operation::Create => format!("Create a new {}.", resource),
        Operation::Read => format!("Get a {} by id.", resource),
        Operation::Update => format!("Update an existing {}.", resource),
        Operation::Delete => format!("Delete a {}.", resource),
        Operation::List => format!("List {} records.", resource),
        Operation::Search => format!("Search {} records with a filter.", resource),
    }
}

fn id_param() -> Field {
    Field::new("id", Primitive::Uuid.keyword()).with_description("Resource identifier.")
}

fn page_params(options: &ElaborateOptions) -> Vec<Field> {
    vec![
        Field::new("offset", Primitive::Int.keyword())
            .with_description("Number of records to skip.")
            .with_default("0"),
        Field::new("limit", Primitive::Int.keyword())
            .with_description("Maximum number of records to return.")
            .with_default(options.default_page_size.to_string()),
    ]
}

fn page_body(resource: &Resource) -> Vec<Field> {
    vec![
        Field::new("data", resource.name.clone()).array(),
        Field::new("pagination", PAGINATION_OBJECT),
    ]
}

fn fill_errors(service: &mut Service) {
    for resource in &mut service.resources {
        for endpoint in &mut resource.endpoints {
            let has_body = endpoint.has_body();
            if endpoint.errors.is_empty() {
                endpoint.errors = ErrorCode::for_request(has_body);
                continue;
            }
            let gated = ErrorCode::gate(&endpoint.errors, has_body);
            if gated != endpoint.errors {
                warn!(
                    resource = %resource.name,
                    endpoint = %endpoint.name,
                    has_body,
                    "Authored errors disagree with the request body; adjusting UnprocessableEntity."
                );
                endpoint.errors = gated;
            }
        }
    }
}
