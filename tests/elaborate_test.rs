//! Integration tests for elaboration, type resolution and graph walking.

use apispec::{
    elaborate, example, load_service, load_service_str, request_bodies, resolve_type,
    validate_example, validate_service, walk, Endpoint, ErrorCode, Field, Format, Method,
    Modifier, Object, Operation, Resource, ResourceField, Service, TargetType, TypeOptions,
    TypeResolver, Visiting,
};
use serde_json::json;
use std::path::Path;

fn user_service(ops: &[Operation]) -> Service {
    let mut service = Service::new("Accounts");
    service.resources.push(
        Resource::new("User", ops)
            .with_field(ResourceField::new("id", "UUID", &[Operation::Read]))
            .with_field(ResourceField::new(
                "email",
                "String",
                &[Operation::Create, Operation::Read, Operation::Search],
            )),
    );
    service
}

fn fixture() -> Service {
    load_service(Path::new("tests/fixtures/schools.yaml")).unwrap()
}

mod scenarios {
    use super::*;

    #[test]
    fn user_create_read() {
        let out = elaborate(&user_service(&[Operation::Create, Operation::Read]));
        let user = out.resource("User").unwrap();
        assert_eq!(user.endpoints.len(), 2);

        let create = user.endpoint("Create").unwrap();
        assert_eq!(create.method, Method::Post);
        assert_eq!(create.request.body_params, vec![Field::new("email", "String")]);
        assert_eq!(create.response.status_code, 201);
        assert_eq!(create.response.body_object.as_deref(), Some("User"));
        assert!(create.errors.contains(&ErrorCode::UnprocessableEntity));

        let read = user.endpoint("Read").unwrap();
        assert_eq!(read.method, Method::Get);
        assert_eq!(read.path, "/{id}");
        assert_eq!(read.response.status_code, 200);
        assert_eq!(read.response.body_object.as_deref(), Some("User"));
        assert!(!read.errors.contains(&ErrorCode::UnprocessableEntity));

        let entity = out.object("User").unwrap();
        let names: Vec<&str> = entity.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "email"]);
    }

    #[test]
    fn user_search_filter_family() {
        let out = elaborate(&user_service(&[Operation::Search]));
        let root = out.object("UserFilter").unwrap();

        let equals = root.field("equals").unwrap();
        assert_eq!(equals.type_name, "UserFilterEquals");
        let email = out
            .object("UserFilterEquals")
            .unwrap()
            .field("email")
            .unwrap();
        assert_eq!(email.type_name, "String");

        for name in ["and", "or", "not"] {
            let combinator = root.field(name).unwrap();
            assert_eq!(combinator.type_name, "UserFilter");
            assert!(combinator.is_array());
        }

        let value = example("UserFilter", &out).unwrap();
        assert_eq!(value["equals"], json!({"email": "string"}));
        assert_eq!(value["and"], json!([]));
        assert_eq!(value["or"], json!([]));
        validate_example("UserFilter", &out).unwrap();
    }

    #[test]
    fn school_pointer_asymmetry() {
        let mut service = Service::new("Schools");
        service.resources.push(
            Resource::new("School", &[Operation::Search])
                .with_audit()
                .with_field(ResourceField::new("name", "String", &[Operation::Search])),
        );
        let out = elaborate(&service);
        let resolver = TypeResolver::new(&out, TypeOptions::default());

        let root = out.object("SchoolFilter").unwrap();
        let equals = resolver.resolve_member(root, root.field("equals").unwrap());
        assert_eq!(equals.to_string(), "*SchoolFilterEquals");

        let nested = out.object("SchoolFilterEquals").unwrap();
        let meta = resolver.resolve_member(nested, nested.field("meta").unwrap());
        assert_eq!(meta, TargetType::Named("MetaFilterEquals".into()));

        let and = resolver.resolve_member(root, root.field("and").unwrap());
        assert_eq!(and.to_string(), "[]SchoolFilter");
    }

    #[test]
    fn authored_object_named_like_a_root_stays_plain() {
        let mut service = user_service(&[Operation::Read]);
        service.objects.push(Object::new(
            "UserFilterEquals",
            "",
            vec![Field::new("email", "String")],
        ));
        service.objects.push(Object::new(
            "UserFilter",
            "Saved search.",
            vec![Field::new("equals", "UserFilterEquals")],
        ));
        let out = elaborate(&service);
        let resolver = TypeResolver::new(&out, TypeOptions::default());
        let saved = out.object("UserFilter").unwrap();
        let equals = resolver.resolve_member(saved, saved.field("equals").unwrap());
        assert_eq!(equals, TargetType::Named("UserFilterEquals".into()));
    }
}

mod error_gating {
    use super::*;

    #[test]
    fn status_422_iff_body() {
        let out = elaborate(&fixture());
        for resource in &out.resources {
            for endpoint in &resource.endpoints {
                assert_eq!(
                    endpoint.advertises(422),
                    endpoint.has_body(),
                    "{}.{}",
                    resource.name,
                    endpoint.name
                );
                for status in [400, 401, 403, 404, 409, 429, 500] {
                    assert!(endpoint.advertises(status));
                }
            }
        }
    }

    #[test]
    fn authored_lists_follow_body_rule() {
        let mut service = user_service(&[Operation::Read]);
        let mut invite = Endpoint::new("Invite", Method::Post, "/invite");
        invite.request.body_params = vec![Field::new("email", "String")];
        invite.errors = vec![ErrorCode::Internal];
        let mut ping = Endpoint::new("Ping", Method::Get, "/ping");
        ping.errors = vec![ErrorCode::UnprocessableEntity];
        service.resources[0].endpoints = vec![invite, ping];

        let out = elaborate(&service);
        for endpoint in &out.resources[0].endpoints {
            assert_eq!(endpoint.advertises(422), endpoint.has_body(), "{}", endpoint.name);
        }
        let invite = out.resources[0].endpoint("Invite").unwrap();
        assert!(invite.advertises(500));
        assert!(!invite.advertises(400));
    }

    #[test]
    fn errors_are_in_status_order() {
        let out = elaborate(&fixture());
        for endpoint in out.resources.iter().flat_map(|r| &r.endpoints) {
            let statuses: Vec<u16> = endpoint.errors.iter().map(|e| e.status()).collect();
            let mut sorted = statuses.clone();
            sorted.sort_unstable();
            assert_eq!(statuses, sorted);
        }
    }
}

mod standard_objects {
    use super::*;

    #[test]
    fn added_after_authored_types() {
        let out = elaborate(&fixture());
        let enums: Vec<&str> = out.enums.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(enums, vec!["Level", "ErrorCode"]);
        let objects: Vec<&str> = out.objects.iter().take(6).map(|o| o.name.as_str()).collect();
        assert_eq!(
            objects,
            vec!["Address", "Error", "Meta", "Pagination", "School", "Teacher"]
        );
    }

    #[test]
    fn error_code_statuses() {
        let out = elaborate(&Service::new("Empty"));
        let codes = out.enum_by_name("ErrorCode").unwrap();
        let described: Vec<&str> = codes.values.iter().map(|v| v.description.as_str()).collect();
        assert!(described[0].starts_with("400"));
        assert!(described[5].starts_with("422"));
        assert!(described[7].starts_with("500"));
    }

    #[test]
    fn meta_shape() {
        let out = elaborate(&Service::new("Empty"));
        let meta = out.object("Meta").unwrap();
        let shape: Vec<(&str, &str, bool)> = meta
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.type_name.as_str(), f.is_nullable()))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("createdAt", "Timestamp", false),
                ("createdBy", "String", true),
                ("updatedAt", "Timestamp", false),
                ("updatedBy", "String", true),
            ]
        );
    }
}

mod filter_family {
    use super::*;

    #[test]
    fn fixture_family_members() {
        let out = elaborate(&fixture());
        let root = out.object("SchoolFilter").unwrap();
        let fields: Vec<(&str, &str)> = root
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.type_name.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("equals", "SchoolFilterEquals"),
                ("notEquals", "SchoolFilterEquals"),
                ("greaterThan", "SchoolFilterRange"),
                ("smallerThan", "SchoolFilterRange"),
                ("greaterOrEqual", "SchoolFilterRange"),
                ("smallerOrEqual", "SchoolFilterRange"),
                ("contains", "SchoolFilterContains"),
                ("notContains", "SchoolFilterContains"),
                ("like", "SchoolFilterLike"),
                ("notLike", "SchoolFilterLike"),
                ("null", "SchoolFilterNull"),
                ("notNull", "SchoolFilterNull"),
                ("and", "SchoolFilter"),
                ("or", "SchoolFilter"),
                ("not", "SchoolFilter"),
            ]
        );
        assert!(root.fields.iter().all(|f| f.is_nullable()));

        let range = out.object("SchoolFilterRange").unwrap();
        let names: Vec<&str> = range.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["founded", "pupils", "meta"]);

        let null = out.object("SchoolFilterNull").unwrap();
        assert_eq!(null.field("pupils").unwrap().type_name, "Bool");
        assert_eq!(null.field("address").unwrap().type_name, "AddressFilterNull");
        assert!(null.field("name").is_none());
    }

    #[test]
    fn list_only_resource_with_list_fields() {
        let mut service = Service::new("Test");
        service.resources.push(
            Resource::new("Tag", &[Operation::List])
                .with_field(ResourceField::new("label", "String", &[Operation::List])),
        );
        let out = elaborate(&service);
        assert!(out.object("TagFilter").is_some());
        // List takes its filters as query parameters, not a body
        assert!(!out.resource("Tag").unwrap().endpoint("List").unwrap().has_body());
    }

    #[test]
    fn self_referencing_resource_terminates() {
        let mut service = Service::new("Org");
        service.resources.push(
            Resource::new("Employee", &[Operation::Read, Operation::Search])
                .with_field(ResourceField::new("name", "String", &[Operation::Read, Operation::Search]))
                .with_field(ResourceField::new(
                    "manager",
                    "Employee",
                    &[Operation::Read, Operation::Search],
                )),
        );
        let out = elaborate(&service);
        let equals = out.object("EmployeeFilterEquals").unwrap();
        assert!(equals.field("name").is_some());
        assert_eq!(
            equals.field("manager").unwrap().type_name,
            "EmployeeFilterEquals"
        );
        example("EmployeeFilter", &out).unwrap();
        example("Employee", &out).unwrap();
        validate_example("EmployeeFilter", &out).unwrap();
    }

    fn mutual_resources(a_first: bool) -> Service {
        let a = Resource::new("A", &[Operation::Read, Operation::Search])
            .with_field(ResourceField::new("label", "String", &[Operation::Read, Operation::Search]))
            .with_field(ResourceField::new("b", "B", &[Operation::Read, Operation::Search]));
        let b = Resource::new("B", &[Operation::Read, Operation::Search])
            .with_field(ResourceField::new("code", "Int", &[Operation::Read, Operation::Search]))
            .with_field(ResourceField::new("a", "A", &[Operation::Read, Operation::Search]));
        let mut service = Service::new("Graph");
        service.resources = if a_first { vec![a, b] } else { vec![b, a] };
        service
    }

    #[test]
    fn mutual_resources_independent_of_declaration_order() {
        for a_first in [true, false] {
            let out = elaborate(&mutual_resources(a_first));
            let names = |object: &str| -> Vec<String> {
                out.object(object)
                    .unwrap()
                    .fields
                    .iter()
                    .map(|f| format!("{}: {}", f.name, f.type_name))
                    .collect()
            };
            assert_eq!(names("AFilterEquals"), vec!["label: String", "b: BFilterEquals"]);
            assert_eq!(names("BFilterEquals"), vec!["code: Int", "a: AFilterEquals"]);
            assert_eq!(names("BFilterRange"), vec!["code: Int", "a: AFilterRange"]);
            validate_example("AFilter", &out).unwrap();
            validate_example("BFilter", &out).unwrap();
        }
    }
}

mod idempotence {
    use super::*;

    #[test]
    fn elaborate_twice_is_noop() {
        let once = elaborate(&fixture());
        assert_eq!(elaborate(&once), once);
    }

    #[test]
    fn authored_endpoint_precedence() {
        let mut service = user_service(&[Operation::Read]);
        let mut custom = Endpoint::new("Read", Method::Get, "/{id}");
        custom.request.path_params = vec![Field::new("id", "String")];
        service.resources[0].endpoints.push(custom.clone());

        let out = elaborate(&service);
        let user = out.resource("User").unwrap();
        assert_eq!(user.endpoints.len(), 1);
        assert_eq!(user.endpoints[0].request, custom.request);
    }

    #[test]
    fn elaborated_output_still_validates() {
        let out = elaborate(&fixture());
        validate_service(&out).unwrap();
    }
}

mod determinism {
    use super::*;

    #[test]
    fn byte_identical_output() {
        let service = fixture();
        let a = serde_json::to_string(&elaborate(&service)).unwrap();
        let b = serde_json::to_string(&elaborate(&service)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn json_and_yaml_inputs_agree() {
        let yaml = std::fs::read_to_string("tests/fixtures/schools.yaml").unwrap();
        let from_yaml = load_service_str(&yaml, Format::Yaml).unwrap();
        let json = serde_json::to_string(&from_yaml).unwrap();
        let from_json = load_service_str(&json, Format::Json).unwrap();
        assert_eq!(elaborate(&from_yaml), elaborate(&from_json));
    }
}

mod walker_termination {
    use super::*;

    fn mutual() -> Service {
        let mut service = Service::new("Graph");
        service.objects.push(Object::new(
            "A",
            "",
            vec![Field::new("label", "String"), Field::new("b", "B").nullable()],
        ));
        service.objects.push(Object::new(
            "B",
            "",
            vec![Field::new("a", "A").nullable(), Field::new("peers", "A").array()],
        ));
        service
    }

    #[test]
    fn mutual_reference() {
        let service = mutual();
        assert_eq!(
            example("A", &service).unwrap(),
            json!({"label": "string", "b": {"peers": []}})
        );
        assert_eq!(
            example("B", &service).unwrap(),
            json!({"a": {"label": "string"}, "peers": [{"label": "string"}]})
        );
    }

    #[test]
    fn visiting_state_is_restored() {
        let service = mutual();
        let mut visiting = Visiting::new();
        walk(&service.objects[0], &service, &mut visiting).unwrap();
        assert!(visiting.is_empty());
    }

    #[test]
    fn large_acyclic_chain_completes() {
        let mut service = Service::new("Chain");
        for i in 0..200 {
            let next = format!("N{}", i + 1);
            let fields = if i == 199 {
                vec![Field::new("end", "Bool")]
            } else {
                vec![Field::new("next", next)]
            };
            service.objects.push(Object::new(format!("N{}", i), "", fields));
        }
        let value = example("N0", &service).unwrap();
        let mut depth = 0;
        let mut cursor = &value;
        while let Some(next) = cursor.get("next") {
            cursor = next;
            depth += 1;
        }
        assert_eq!(depth, 199);
        assert_eq!(cursor["end"], json!(true));
    }
}

mod modifier_mapping {
    use super::*;

    #[test]
    fn nullable_never_wraps() {
        let out = elaborate(&fixture());
        let opts = TypeOptions::default();
        for object in &out.objects {
            for field in &object.fields {
                let plain = Field {
                    modifiers: field
                        .modifiers
                        .iter()
                        .copied()
                        .filter(|m| *m != Modifier::Nullable)
                        .collect(),
                    ..field.clone()
                };
                let with = resolve_type(field, &out, &opts);
                let without = resolve_type(&plain, &out, &opts);
                assert_eq!(with, without, "{}.{}", object.name, field.name);
                assert!(!with.is_optional());
                assert_eq!(with.is_sequence(), field.is_array());
            }
        }
    }
}

mod request_body_dedup {
    use super::*;

    #[test]
    fn first_writer_wins() {
        let out = elaborate(&fixture());
        let bodies = request_bodies(&out);
        let names: Vec<&str> = bodies.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["SchoolCreateRequest", "SchoolUpdateRequest", "SchoolFilter"]
        );
        assert_eq!(bodies[0].used_by, vec!["School.Create", "Teacher.Create"]);
        assert!(!bodies[0].existing_object);
        // the search body is the filter root itself
        assert!(bodies[2].existing_object);
    }
}
