//! Builds the [`DispatchKey`] each of the five calls is fingerprinted under.

use std::collections::BTreeMap;

use rebac_model::{DispatchKey, DispatchKind, ObjectRef, RelationReference};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Context maps are folded into the key as one hash rather than every field,
/// so a caveated request's fingerprint stays a fixed size regardless of how
/// much context the caller passed.
fn context_digest(context: &BTreeMap<String, Value>) -> String {
    if context.is_empty() {
        return String::new();
    }
    let canonical = serde_json::to_vec(context).unwrap_or_default();
    hex::encode(Sha256::digest(canonical))
}

pub fn check_key(
    resource: &ObjectRef,
    relation: &str,
    subject: &ObjectRef,
    subject_relation: Option<&str>,
    context: &BTreeMap<String, Value>,
    at_revision: &str,
) -> DispatchKey {
    DispatchKey {
        kind: DispatchKind::Check,
        at_revision: at_revision.to_string(),
        resource_relation: RelationReference::new(resource.namespace.clone(), relation.to_string()),
        resource_ids: vec![resource.object_id.clone()],
        subject_namespace: subject.namespace.clone(),
        subject_object_id: subject.object_id.clone(),
        subject_relation: subject_relation.map(str::to_string),
        extra: vec![context_digest(context)],
    }
}

pub fn expand_key(resource: &ObjectRef, relation: &str, at_revision: &str) -> DispatchKey {
    DispatchKey {
        kind: DispatchKind::Expand,
        at_revision: at_revision.to_string(),
        resource_relation: RelationReference::new(resource.namespace.clone(), relation.to_string()),
        resource_ids: vec![resource.object_id.clone()],
        subject_namespace: String::new(),
        subject_object_id: String::new(),
        subject_relation: None,
        extra: Vec::new(),
    }
}

pub fn reachable_resources_key(
    resource_namespace: &str,
    resource_relation: &str,
    subject: &ObjectRef,
    subject_relation: Option<&str>,
    context: &BTreeMap<String, Value>,
    at_revision: &str,
) -> DispatchKey {
    DispatchKey {
        kind: DispatchKind::ReachableResources,
        at_revision: at_revision.to_string(),
        resource_relation: RelationReference::new(resource_namespace.to_string(), resource_relation.to_string()),
        resource_ids: Vec::new(),
        subject_namespace: subject.namespace.clone(),
        subject_object_id: subject.object_id.clone(),
        subject_relation: subject_relation.map(str::to_string),
        extra: vec![context_digest(context)],
    }
}

pub fn lookup_resources_key(
    resource_namespace: &str,
    resource_relation: &str,
    subject: &ObjectRef,
    subject_relation: Option<&str>,
    candidate_resource_ids: &[String],
    context: &BTreeMap<String, Value>,
    at_revision: &str,
) -> DispatchKey {
    DispatchKey {
        kind: DispatchKind::LookupResources,
        at_revision: at_revision.to_string(),
        resource_relation: RelationReference::new(resource_namespace.to_string(), resource_relation.to_string()),
        resource_ids: candidate_resource_ids.to_vec(),
        subject_namespace: subject.namespace.clone(),
        subject_object_id: subject.object_id.clone(),
        subject_relation: subject_relation.map(str::to_string),
        extra: vec![context_digest(context)],
    }
}

pub fn lookup_subjects_key(
    resource: &ObjectRef,
    relation: &str,
    subject_namespace: &str,
    context: &BTreeMap<String, Value>,
    at_revision: &str,
) -> DispatchKey {
    DispatchKey {
        kind: DispatchKind::LookupSubjects,
        at_revision: at_revision.to_string(),
        resource_relation: RelationReference::new(resource.namespace.clone(), relation.to_string()),
        resource_ids: vec![resource.object_id.clone()],
        subject_namespace: subject_namespace.to_string(),
        subject_object_id: String::new(),
        subject_relation: None,
        extra: vec![context_digest(context)],
    }
}
