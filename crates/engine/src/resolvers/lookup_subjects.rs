//! LookupSubjects (C3.5): which subjects of a given namespace hold
//! `relation` on `resource`, found by flattening the `Expand` tree rather
//! than probing one candidate subject at a time.

use rebac_model::{ExpandDepth, FoundSubject, FoundSubjectSet, RelationTupleTreeNode};
use rebac_storage::RevisionReader;

use crate::dispatch_trait::Dispatch;
use crate::error::Result;
use crate::schema::SchemaIndex;
use crate::types::{ExpandRequest, LookupSubjectsRequest, LookupSubjectsResponse};

pub async fn lookup_subjects(
    schema: &dyn SchemaIndex,
    storage: &dyn RevisionReader,
    dispatch: &dyn Dispatch,
    request: LookupSubjectsRequest,
) -> Result<LookupSubjectsResponse> {
    let response = super::expand::expand(
        schema,
        storage,
        dispatch,
        ExpandRequest {
            resource: request.resource.clone(),
            relation: request.relation.clone(),
            depth: ExpandDepth::Recursive,
            meta: request.meta.clone(),
        },
    )
    .await?;

    let mut found = Vec::new();
    let mut excluded = Vec::new();
    flatten(&response.tree, &request.subject_namespace, &mut found, &mut excluded);

    found.sort();
    found.dedup();
    excluded.sort();
    excluded.dedup();

    Ok(LookupSubjectsResponse {
        subjects: FoundSubjectSet {
            subjects: found,
            excluded_subjects: excluded,
        },
        meta: response.meta,
    })
}

fn flatten(
    node: &RelationTupleTreeNode,
    subject_namespace: &str,
    found: &mut Vec<FoundSubject>,
    excluded: &mut Vec<FoundSubject>,
) {
    match node {
        RelationTupleTreeNode::Leaf { subjects } => {
            for subject in subjects {
                if subject.namespace == subject_namespace {
                    found.push(FoundSubject {
                        subject_namespace: subject.namespace.clone(),
                        subject_object_id: subject.object_id.clone(),
                        subject_relation: None,
                    });
                }
            }
        }
        RelationTupleTreeNode::Union(children) => {
            for child in children {
                flatten(child, subject_namespace, found, excluded);
            }
        }
        // Conservative: only the first branch's subjects are reported as
        // candidates, matching the same posture `ReachableResources` takes.
        RelationTupleTreeNode::Intersection(children) => {
            if let Some(first) = children.first() {
                flatten(first, subject_namespace, found, excluded);
            }
        }
        RelationTupleTreeNode::Exclusion { base, subtracted } => {
            flatten(base, subject_namespace, found, excluded);
            flatten(subtracted, subject_namespace, excluded, &mut Vec::new());
        }
        RelationTupleTreeNode::DepthExhausted => {}
    }
}
