//! Expand (C3.2): the tree of subjects/usersets that make up a relation,
//! without evaluating membership for any particular subject.

use futures::future::BoxFuture;
use rebac_model::{
    CompiledRewrite, ExpandDepth, ObjectRef, RelationTupleTreeNode, ResolverMeta, ResponseMeta,
};
use rebac_storage::{RelationshipFilter, RevisionReader};

use crate::dispatch_trait::Dispatch;
use crate::error::{EngineError, Result};
use crate::schema::SchemaIndex;
use crate::types::{ExpandRequest, ExpandResponse};

pub async fn expand(
    schema: &dyn SchemaIndex,
    storage: &dyn RevisionReader,
    dispatch: &dyn Dispatch,
    request: ExpandRequest,
) -> Result<ExpandResponse> {
    let namespace = schema.namespace(&request.resource.namespace)?;
    let rewrite = namespace
        .rewrite_for(&request.relation)
        .ok_or_else(|| EngineError::UnknownRelation {
            namespace: request.resource.namespace.clone(),
            relation: request.relation.clone(),
        })?;

    let (tree, meta) = expand_rewrite(
        schema,
        storage,
        dispatch,
        rewrite,
        &request.resource,
        &request.relation,
        request.depth,
        &request.meta,
    )
    .await?;

    Ok(ExpandResponse { tree, meta })
}

fn expand_rewrite<'a>(
    schema: &'a dyn SchemaIndex,
    storage: &'a dyn RevisionReader,
    dispatch: &'a dyn Dispatch,
    rewrite: &'a CompiledRewrite,
    resource: &'a ObjectRef,
    relation: &'a str,
    depth: ExpandDepth,
    meta: &'a ResolverMeta,
) -> BoxFuture<'a, Result<(RelationTupleTreeNode, ResponseMeta)>> {
    Box::pin(async move {
        match rewrite {
            CompiledRewrite::This => expand_this(storage, resource, relation, meta).await,
            CompiledRewrite::ComputedUserset { relation: target } => {
                let namespace = schema.namespace(&resource.namespace)?;
                let child_rewrite = namespace.rewrite_for(target).ok_or_else(|| EngineError::UnknownRelation {
                    namespace: resource.namespace.clone(),
                    relation: target.clone(),
                })?;
                expand_rewrite(schema, storage, dispatch, child_rewrite, resource, target, depth, meta).await
            }
            CompiledRewrite::TupleToUserset {
                tupleset_relation,
                computed_userset_on_subject,
            } => {
                expand_tuple_to_userset(
                    schema,
                    storage,
                    dispatch,
                    resource,
                    tupleset_relation,
                    computed_userset_on_subject,
                    depth,
                    meta,
                )
                .await
            }
            CompiledRewrite::Union(children) => {
                let mut nodes = Vec::new();
                let mut total_meta = ResponseMeta::default();
                for child in children {
                    let (node, child_meta) =
                        expand_rewrite(schema, storage, dispatch, child, resource, relation, depth, meta).await?;
                    total_meta.merge(&child_meta);
                    nodes.push(node);
                }
                Ok((RelationTupleTreeNode::Union(nodes), total_meta))
            }
            CompiledRewrite::Intersection(children) => {
                let mut nodes = Vec::new();
                let mut total_meta = ResponseMeta::default();
                for child in children {
                    let (node, child_meta) =
                        expand_rewrite(schema, storage, dispatch, child, resource, relation, depth, meta).await?;
                    total_meta.merge(&child_meta);
                    nodes.push(node);
                }
                Ok((RelationTupleTreeNode::Intersection(nodes), total_meta))
            }
            CompiledRewrite::Exclusion { base, subtracted } => {
                let (base_node, mut total_meta) =
                    expand_rewrite(schema, storage, dispatch, base, resource, relation, depth, meta).await?;
                let (subtracted_node, subtracted_meta) =
                    expand_rewrite(schema, storage, dispatch, subtracted, resource, relation, depth, meta).await?;
                total_meta.merge(&subtracted_meta);
                Ok((
                    RelationTupleTreeNode::Exclusion {
                        base: Box::new(base_node),
                        subtracted: Box::new(subtracted_node),
                    },
                    total_meta,
                ))
            }
        }
    })
}

async fn expand_this(
    storage: &dyn RevisionReader,
    resource: &ObjectRef,
    relation: &str,
    meta: &ResolverMeta,
) -> Result<(RelationTupleTreeNode, ResponseMeta)> {
    let tuples = storage
        .query_relationships(
            &meta.at_revision,
            &RelationshipFilter::for_namespace(resource.namespace.clone())
                .with_object_ids(vec![resource.object_id.clone()])
                .with_relation(relation),
        )
        .await?;

    // Leaf subjects are stored as object references; a subject that is
    // itself a userset shows up as that userset's owning object; callers
    // recurse into `Expand` on its relation to see its own members.
    let subjects = tuples.into_iter().map(|tuple| tuple.subject()).collect();

    Ok((
        RelationTupleTreeNode::Leaf { subjects },
        ResponseMeta::default(),
    ))
}

#[allow(clippy::too_many_arguments)]
async fn expand_tuple_to_userset(
    _schema: &dyn SchemaIndex,
    storage: &dyn RevisionReader,
    dispatch: &dyn Dispatch,
    resource: &ObjectRef,
    tupleset_relation: &str,
    computed_userset_on_subject: &str,
    depth: ExpandDepth,
    meta: &ResolverMeta,
) -> Result<(RelationTupleTreeNode, ResponseMeta)> {
    if matches!(depth, ExpandDepth::Shallow) {
        return Ok((RelationTupleTreeNode::DepthExhausted, ResponseMeta::default()));
    }

    let tupleset = storage
        .query_relationships(
            &meta.at_revision,
            &RelationshipFilter::for_namespace(resource.namespace.clone())
                .with_object_ids(vec![resource.object_id.clone()])
                .with_relation(tupleset_relation),
        )
        .await?;

    let mut nodes = Vec::new();
    let mut total_meta = ResponseMeta::default();

    for tuple in &tupleset {
        if !tuple.is_terminal_subject() {
            continue;
        }
        let Some(next_meta) = meta.descend() else {
            nodes.push(RelationTupleTreeNode::DepthExhausted);
            continue;
        };
        let response = dispatch
            .expand(ExpandRequest {
                resource: tuple.subject(),
                relation: computed_userset_on_subject.to_string(),
                depth,
                meta: next_meta,
            })
            .await?;
        total_meta.merge(&response.meta);
        nodes.push(response.tree);
    }

    Ok((RelationTupleTreeNode::Union(nodes), total_meta))
}
