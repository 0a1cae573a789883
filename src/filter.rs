//! Filter families - recursive query-filter objects generated per resource.
//!
//! For a resource `User` the family is rooted at `UserFilter`:
//!
//! ```text
//! UserFilter
//!   equals, notEquals                 -> UserFilterEquals
//!   greaterThan, smallerThan, ...     -> UserFilterRange
//!   contains, notContains             -> UserFilterContains
//!   like, notLike                     -> UserFilterLike
//!   null, notNull                     -> UserFilterNull
//!   and, or, not                      -> []UserFilter
//! ```
//!
//! Condition objects hold one member per eligible field. Object-typed fields
//! become nested condition objects of the same family (`meta: MetaFilterEquals`).
//! Families with no eligible members are left out of the root.

use tracing::debug;

use crate::model::{Field, Object, Resource, Service};
use crate::resolver::{TypeRef, TypeResolver};
use crate::types::{Operation, Primitive, TypeOptions};
use crate::walker::Visiting;

/// Boolean combinator fields of a filter root, each an array of the root itself.
pub const COMBINATORS: [&str; 3] = ["and", "or", "not"];

/// Comparison family of a condition object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterFamily {
    Equals,
    Range,
    Contains,
    Like,
    Null,
}

impl FilterFamily {
    pub const ALL: [FilterFamily; 5] = [
        FilterFamily::Equals,
        FilterFamily::Range,
        FilterFamily::Contains,
        FilterFamily::Like,
        FilterFamily::Null,
    ];

    /// Suffix appended to `<Base>Filter` to name the condition object.
    pub fn suffix(&self) -> &'static str {
        match self {
            FilterFamily::Equals => "Equals",
            FilterFamily::Range => "Range",
            FilterFamily::Contains => "Contains",
            FilterFamily::Like => "Like",
            FilterFamily::Null => "Null",
        }
    }

    /// Fields this family contributes to a filter root.
    pub fn root_fields(&self) -> &'static [&'static str] {
        match self {
            FilterFamily::Equals => &["equals", "notEquals"],
            FilterFamily::Range => &[
                "greaterThan",
                "smallerThan",
                "greaterOrEqual",
                "smallerOrEqual",
            ],
            FilterFamily::Contains => &["contains", "notContains"],
            FilterFamily::Like => &["like", "notLike"],
            FilterFamily::Null => &["null", "notNull"],
        }
    }

    /// Member type for a non-object field, or `None` if the field does not
    /// take part in this family.
    fn member_type(&self, field: &Field, kind: TypeRef) -> Option<String> {
        let scalar = !matches!(kind, TypeRef::Object(_));
        match self {
            FilterFamily::Equals => (scalar && !field.is_array()).then(|| field.type_name.clone()),
            FilterFamily::Range => match kind {
                TypeRef::Primitive(p) if p.is_ordinal() && !field.is_array() => {
                    Some(field.type_name.clone())
                }
                _ => None,
            },
            FilterFamily::Contains => match kind {
                TypeRef::Primitive(Primitive::String) if !field.is_array() => {
                    Some(field.type_name.clone())
                }
                TypeRef::Primitive(_) | TypeRef::Enum(_) if field.is_array() => {
                    Some(field.type_name.clone())
                }
                _ => None,
            },
            FilterFamily::Like => match kind {
                TypeRef::Primitive(Primitive::String) if !field.is_array() => {
                    Some(field.type_name.clone())
                }
                _ => None,
            },
            FilterFamily::Null => (field.is_nullable() || field.is_array())
                .then(|| Primitive::Bool.keyword().to_string()),
        }
    }
}

/// Role of an object within a filter family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterRole {
    /// `<Resource>Filter`.
    Root { base: String },
    /// `<Base>Filter<Suffix>` where base is a resource or an object.
    Condition { base: String, family: FilterFamily },
}

pub fn filter_name(base: &str) -> String {
    format!("{}Filter", base)
}

pub fn condition_name(base: &str, family: FilterFamily) -> String {
    format!("{}Filter{}", base, family.suffix())
}

/// Recognize a filter-family object by name against the service.
pub fn filter_role(name: &str, service: &Service) -> Option<FilterRole> {
    for family in FilterFamily::ALL {
        let suffix = format!("Filter{}", family.suffix());
        if let Some(base) = name.strip_suffix(suffix.as_str()) {
            if !base.is_empty() && (service.resource(base).is_some() || service.object(base).is_some())
            {
                return Some(FilterRole::Condition {
                    base: base.to_string(),
                    family,
                });
            }
        }
    }
    let base = name.strip_suffix("Filter")?;
    service.resource(base)?;
    if let Some(object) = service.object(name) {
        if !has_combinators(object) {
            return None;
        }
    }
    Some(FilterRole::Root {
        base: base.to_string(),
    })
}

// Authored objects named like a root only count as one with all combinators.
fn has_combinators(object: &Object) -> bool {
    COMBINATORS.iter().all(|name| {
        object
            .field(name)
            .is_some_and(|f| f.is_array() && f.type_name == object.name)
    })
}

/// Whether the overlay builds a filter family for this resource.
pub fn is_filterable(resource: &Resource) -> bool {
    resource.has_operation(Operation::Search)
        || (resource.has_operation(Operation::List)
            && resource.fields_for(Operation::List).next().is_some())
}

/// Fields a resource can be filtered on: those tagged `Search` or `List`,
/// plus the audit metadata when the resource is audited.
pub fn filterable_fields(resource: &Resource) -> Vec<Field> {
    let mut fields: Vec<Field> = resource
        .fields
        .iter()
        .filter(|f| f.exposed_for(Operation::Search) || f.exposed_for(Operation::List))
        .map(|f| f.to_field())
        .collect();
    if resource.audit && !fields.iter().any(|f| f.name == crate::overlay::META_FIELD) {
        fields.push(crate::overlay::meta_field());
    }
    fields
}

/// Builds filter-family objects against a service snapshot.
///
/// Objects that already exist in the snapshot (authored or from a previous
/// pass) are reused by name and never rebuilt.
pub(crate) struct FamilyBuilder<'a> {
    service: &'a Service,
    resolver: TypeResolver<'a>,
    created: Vec<Object>,
    visiting: Visiting,
}

impl<'a> FamilyBuilder<'a> {
    pub(crate) fn new(service: &'a Service) -> Self {
        Self {
            service,
            resolver: TypeResolver::new(service, TypeOptions::default()),
            created: Vec::new(),
            visiting: Visiting::new(),
        }
    }

    /// Build the family rooted at `<Resource>Filter`. Returns false when the
    /// root already exists.
    pub(crate) fn build(&mut self, resource: &Resource) -> bool {
        let root_name = filter_name(&resource.name);
        if self.exists(&root_name) {
            debug!(resource = %resource.name, "Filter root already present; keeping it.");
            return false;
        }

        let root_at = self.created.len();
        let mut fields = Vec::new();
        for family in FilterFamily::ALL {
            let Some(condition) = self.condition(&resource.name, family) else {
                continue;
            };
            for name in family.root_fields() {
                fields.push(
                    Field::new(*name, condition.clone())
                        .nullable()
                        .with_description(format!("{} condition.", family.suffix())),
                );
            }
        }
        for name in COMBINATORS {
            fields.push(
                Field::new(name, root_name.clone())
                    .array()
                    .nullable()
                    .with_description(format!("Nested filters combined with {}.", name.to_uppercase())),
            );
        }

        debug!(resource = %resource.name, root = %root_name, "Synthesized filter family.");
        self.created.insert(
            root_at,
            Object::new(
                root_name,
                format!("Filter for searching {} records.", resource.name),
                fields,
            ),
        );
        true
    }

    pub(crate) fn into_objects(self) -> Vec<Object> {
        self.created
    }

    fn exists(&self, name: &str) -> bool {
        self.service.has_type(name) || self.created.iter().any(|o| o.name == name)
    }

    /// Name of the condition object for `base`, building it if needed.
    /// `None` when it would be empty.
    ///
    /// A `base` already being built is referenced by name. Its object is
    /// never empty, since the member leading back to it is kept.
    fn condition(&mut self, base: &str, family: FilterFamily) -> Option<String> {
        let name = condition_name(base, family);
        if self.exists(&name) {
            return Some(name);
        }
        if !self.visiting.enter(base) {
            return Some(name);
        }

        let fields = self.base_fields(base);
        let mut members = Vec::new();
        for field in &fields {
            let kind = self.resolver.classify(&field.type_name);
            let member_type = match kind {
                TypeRef::Object(_) if field.is_array() => {
                    (family == FilterFamily::Null).then(|| Primitive::Bool.keyword().to_string())
                }
                TypeRef::Object(_) => self.condition(&field.type_name, family),
                other => family.member_type(field, other),
            };
            if let Some(member_type) = member_type {
                members.push(
                    Field::new(field.name.clone(), member_type)
                        .nullable()
                        .with_description(field.description.clone()),
                );
            }
        }

        self.visiting.leave(base);
        if members.is_empty() {
            return None;
        }
        self.created.push(Object::new(
            name.clone(),
            format!("{} conditions on {}.", family.suffix(), base),
            members,
        ));
        Some(name)
    }

    // Resources contribute their filterable fields; other objects all fields.
    fn base_fields(&self, base: &str) -> Vec<Field> {
        if let Some(resource) = self.service.resource(base) {
            return filterable_fields(resource);
        }
        self.resolver
            .object(base)
            .map(|o| o.fields.clone())
            .unwrap_or_default()
    }
}
