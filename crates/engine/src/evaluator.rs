//! The rewrite tree evaluator (C2): interprets a [`CompiledRewrite`] against
//! the tuples for one resource, producing a [`ResourceCheckResult`] for one
//! candidate subject.
//!
//! `ComputedUserset` recurses locally (same resource, different relation —
//! always resolvable from the tuples already fetched here). `This` and
//! `TupleToUserset` may need the membership of a *different* resource, so
//! those recurse through the injected [`Dispatch`] trait, which is where
//! C4's depth budget, cache, and peer routing live. This crate only ever
//! decrements the budget it was handed; it never enforces `DEPTH_EXCEEDED`
//! itself — the dispatcher does, by refusing to hand out a `ResolverMeta`
//! with `depth_remaining` left to give.

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use rebac_model::{
    CaveatExpression, CompiledRewrite, ObjectRef, RelationTuple, ResolverMeta, ResourceCheckResult,
    ResponseMeta,
};
use rebac_storage::{RelationshipFilter, RevisionReader};
use serde_json::Value;

use crate::dispatch_trait::Dispatch;
use crate::error::{EngineError, Result};
use crate::schema::SchemaIndex;
use crate::types::CheckRequest;

/// Evaluates `resource#relation` for `subject` at the revision/depth in
/// `meta`. Returns the merged [`ResponseMeta`] of this evaluation and every
/// sub-call it made.
pub async fn evaluate_check(
    schema: &dyn SchemaIndex,
    storage: &dyn RevisionReader,
    dispatch: &dyn Dispatch,
    resource: &ObjectRef,
    relation: &str,
    subject: &ObjectRef,
    subject_relation: Option<&str>,
    context: &BTreeMap<String, Value>,
    meta: &ResolverMeta,
) -> Result<(ResourceCheckResult, ResponseMeta)> {
    tracing::trace!(resource = %resource, relation, subject = %subject, "evaluating check");
    let namespace = schema.namespace(&resource.namespace)?;
    let rewrite = namespace
        .rewrite_for(relation)
        .ok_or_else(|| EngineError::UnknownRelation {
            namespace: resource.namespace.clone(),
            relation: relation.to_string(),
        })?;

    evaluate_rewrite(
        schema,
        storage,
        dispatch,
        rewrite,
        resource,
        relation,
        subject,
        subject_relation,
        context,
        meta,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
fn evaluate_rewrite<'a>(
    schema: &'a dyn SchemaIndex,
    storage: &'a dyn RevisionReader,
    dispatch: &'a dyn Dispatch,
    rewrite: &'a CompiledRewrite,
    resource: &'a ObjectRef,
    relation: &'a str,
    subject: &'a ObjectRef,
    subject_relation: Option<&'a str>,
    context: &'a BTreeMap<String, Value>,
    meta: &'a ResolverMeta,
) -> BoxFuture<'a, Result<(ResourceCheckResult, ResponseMeta)>> {
    Box::pin(async move {
        match rewrite {
            CompiledRewrite::This => {
                evaluate_this(schema, storage, dispatch, resource, relation, subject, subject_relation, context, meta).await
            }
            CompiledRewrite::ComputedUserset { relation: target_relation } => {
                let next_meta = descend(meta)?;
                evaluate_check(
                    schema,
                    storage,
                    dispatch,
                    resource,
                    target_relation,
                    subject,
                    subject_relation,
                    context,
                    &next_meta,
                )
                .await
            }
            CompiledRewrite::TupleToUserset {
                tupleset_relation,
                computed_userset_on_subject,
            } => {
                evaluate_tuple_to_userset(
                    schema,
                    storage,
                    dispatch,
                    resource,
                    tupleset_relation,
                    computed_userset_on_subject,
                    subject,
                    subject_relation,
                    context,
                    meta,
                )
                .await
            }
            CompiledRewrite::Union(children) => {
                let mut acc = ResourceCheckResult::not_member();
                let mut total_meta = ResponseMeta::default();
                for child in children {
                    let (result, child_meta) = evaluate_rewrite(
                        schema, storage, dispatch, child, resource, relation, subject, subject_relation, context, meta,
                    )
                    .await?;
                    total_meta.merge(&child_meta);
                    acc = acc.union(result);
                    if acc.membership == rebac_model::Membership::Member {
                        break;
                    }
                }
                Ok((acc, total_meta))
            }
            CompiledRewrite::Intersection(children) => {
                let mut acc: Option<ResourceCheckResult> = None;
                let mut total_meta = ResponseMeta::default();
                for child in children {
                    let (result, child_meta) = evaluate_rewrite(
                        schema, storage, dispatch, child, resource, relation, subject, subject_relation, context, meta,
                    )
                    .await?;
                    total_meta.merge(&child_meta);
                    acc = Some(match acc {
                        None => result,
                        Some(prev) => prev.intersect(result),
                    });
                    if acc.as_ref().unwrap().membership == rebac_model::Membership::NotMember {
                        break;
                    }
                }
                Ok((acc.unwrap_or_else(ResourceCheckResult::member), total_meta))
            }
            CompiledRewrite::Exclusion { base, subtracted } => {
                let (base_result, mut total_meta) = evaluate_rewrite(
                    schema, storage, dispatch, base, resource, relation, subject, subject_relation, context, meta,
                )
                .await?;
                if base_result.membership == rebac_model::Membership::NotMember {
                    return Ok((base_result, total_meta));
                }
                let (subtracted_result, subtracted_meta) = evaluate_rewrite(
                    schema, storage, dispatch, subtracted, resource, relation, subject, subject_relation, context, meta,
                )
                .await?;
                total_meta.merge(&subtracted_meta);
                Ok((base_result.exclude(subtracted_result), total_meta))
            }
        }
    })
}

fn descend(meta: &ResolverMeta) -> Result<ResolverMeta> {
    meta.descend().ok_or(EngineError::DepthExceeded)
}

#[allow(clippy::too_many_arguments)]
async fn evaluate_this(
    schema: &dyn SchemaIndex,
    storage: &dyn RevisionReader,
    dispatch: &dyn Dispatch,
    resource: &ObjectRef,
    relation: &str,
    subject: &ObjectRef,
    subject_relation: Option<&str>,
    context: &BTreeMap<String, Value>,
    meta: &ResolverMeta,
) -> Result<(ResourceCheckResult, ResponseMeta)> {
    let tuples = storage
        .query_relationships(
            &meta.at_revision,
            &RelationshipFilter::for_namespace(resource.namespace.clone())
                .with_object_ids(vec![resource.object_id.clone()])
                .with_relation(relation),
        )
        .await?;

    let mut acc = ResourceCheckResult::not_member();
    let mut total_meta = ResponseMeta::default();

    for tuple in &tuples {
        let (result, tuple_meta) = evaluate_tuple_subject(
            schema, storage, dispatch, tuple, subject, subject_relation, context, meta,
        )
        .await?;
        total_meta.merge(&tuple_meta);
        acc = acc.union(result);
        if acc.membership == rebac_model::Membership::Member {
            break;
        }
    }

    Ok((acc, total_meta))
}

/// Whether `subject` is covered by one stored tuple, recursing through
/// `Dispatch` when the tuple's subject is itself a userset rather than a
/// terminal object.
async fn evaluate_tuple_subject(
    schema: &dyn SchemaIndex,
    _storage: &dyn RevisionReader,
    dispatch: &dyn Dispatch,
    tuple: &RelationTuple,
    subject: &ObjectRef,
    subject_relation: Option<&str>,
    context: &BTreeMap<String, Value>,
    meta: &ResolverMeta,
) -> Result<(ResourceCheckResult, ResponseMeta)> {
    if tuple.is_terminal_subject() {
        let direct_match = tuple.subject_namespace == subject.namespace
            && tuple.subject_object_id == subject.object_id
            && subject_relation.is_none();
        let wildcard_match = tuple.is_wildcard_subject() && tuple.subject_namespace == subject.namespace;

        if !direct_match && !wildcard_match {
            return Ok((ResourceCheckResult::not_member(), ResponseMeta::default()));
        }
        let result = match &tuple.caveat_name {
            None => ResourceCheckResult::member(),
            Some(name) => {
                let declared_params = schema
                    .namespace(&tuple.namespace)
                    .map(|ns| ns.caveat_params(name))
                    .unwrap_or(&[]);
                ResourceCheckResult::caveated(
                    CaveatExpression::Named {
                        caveat_name: name.clone(),
                        context: tuple.caveat_context.clone(),
                    },
                    missing_fields(declared_params, context, &tuple.caveat_context),
                )
            }
        };
        return Ok((result, ResponseMeta::default()));
    }

    // The tuple's subject is a userset: `tuple.subject()#tuple.subject_relation`.
    // Whether our target subject belongs to it is itself a Check, which may
    // route to a different peer, so it goes through `Dispatch`.
    let next_meta = descend(meta)?;
    let userset_relation = tuple
        .subject_userset()
        .expect("non-terminal subject always has a userset relation")
        .relation;

    let response = dispatch
        .check(CheckRequest {
            resource: tuple.subject(),
            relation: userset_relation,
            subject: subject.clone(),
            subject_relation: subject_relation.map(str::to_string),
            context: context.clone(),
            meta: next_meta,
            debug: rebac_model::DebugSetting::NoDebug,
        })
        .await?;

    Ok((response.result, response.meta))
}

#[allow(clippy::too_many_arguments)]
async fn evaluate_tuple_to_userset(
    schema: &dyn SchemaIndex,
    storage: &dyn RevisionReader,
    dispatch: &dyn Dispatch,
    resource: &ObjectRef,
    tupleset_relation: &str,
    computed_userset_on_subject: &str,
    subject: &ObjectRef,
    subject_relation: Option<&str>,
    context: &BTreeMap<String, Value>,
    meta: &ResolverMeta,
) -> Result<(ResourceCheckResult, ResponseMeta)> {
    let _ = schema;
    let tupleset = storage
        .query_relationships(
            &meta.at_revision,
            &RelationshipFilter::for_namespace(resource.namespace.clone())
                .with_object_ids(vec![resource.object_id.clone()])
                .with_relation(tupleset_relation),
        )
        .await?;

    let mut acc = ResourceCheckResult::not_member();
    let mut total_meta = ResponseMeta::default();

    for tuple in &tupleset {
        if !tuple.is_terminal_subject() {
            // A tupleset relation whose own subject is itself a userset is a
            // malformed tuple-to-userset reference; skip rather than guess.
            continue;
        }
        let next_meta = descend(meta)?;
        let response = dispatch
            .check(CheckRequest {
                resource: tuple.subject(),
                relation: computed_userset_on_subject.to_string(),
                subject: subject.clone(),
                subject_relation: subject_relation.map(str::to_string),
                context: context.clone(),
                meta: next_meta,
                debug: rebac_model::DebugSetting::NoDebug,
            })
            .await?;

        total_meta.merge(&response.meta);
        acc = acc.union(response.result);
        if acc.membership == rebac_model::Membership::Member {
            break;
        }
    }

    Ok((acc, total_meta))
}

/// Declared caveat parameters not covered by either the request's `context`
/// or the tuple's own `caveat_context` recorded at write time.
fn missing_fields(
    declared_params: &[String],
    context: &BTreeMap<String, Value>,
    tuple_caveat_context: &BTreeMap<String, Value>,
) -> Vec<String> {
    declared_params
        .iter()
        .filter(|param| !context.contains_key(*param) && !tuple_caveat_context.contains_key(*param))
        .cloned()
        .collect()
}
