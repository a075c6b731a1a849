//! LookupResources (C3.4): confirm membership for an already-known
//! candidate set of resource ids, one `Check` per candidate.
//!
//! Candidate discovery (typically a prior `ReachableResources` call) is the
//! caller's job — this resolver exists so a caller holding `RequiresCheck`
//! candidates (or any other externally-sourced id list) can resolve them to
//! a definite or caveated permission without hand-rolling the `Check` loop
//! itself.

use rebac_model::{ObjectRef, ResolvedPermission, ResolvedResource, ResponseMeta};
use rebac_storage::RevisionReader;

use crate::dispatch_trait::Dispatch;
use crate::error::Result;
use crate::evaluator::evaluate_check;
use crate::schema::SchemaIndex;
use crate::types::{LookupResourcesRequest, LookupResourcesResponse};

pub async fn lookup_resources(
    schema: &dyn SchemaIndex,
    storage: &dyn RevisionReader,
    dispatch: &dyn Dispatch,
    request: LookupResourcesRequest,
) -> Result<LookupResourcesResponse> {
    let mut resources = Vec::new();
    let mut total_meta = ResponseMeta::default();

    for candidate_id in &request.candidate_resource_ids {
        let resource = ObjectRef::new(request.resource_namespace.clone(), candidate_id.clone());
        let (result, meta) = evaluate_check(
            schema,
            storage,
            dispatch,
            &resource,
            &request.resource_relation,
            &request.subject,
            request.subject_relation.as_deref(),
            &request.context,
            &request.meta,
        )
        .await?;
        total_meta.merge(&meta);

        if result.membership.is_not_member() {
            continue;
        }

        let permission = if result.membership.is_member() {
            ResolvedPermission::HasPermission
        } else {
            ResolvedPermission::ConditionallyHasPermission
        };

        resources.push(ResolvedResource {
            resource_id: candidate_id.clone(),
            permission,
            missing_required_context: result.missing_expr_fields,
        });
    }

    Ok(LookupResourcesResponse {
        resources,
        meta: total_meta,
    })
}
