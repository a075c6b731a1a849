//! Check (C3.1): does `subject` have `relation` on `resource`?

use rebac_model::{DebugSetting, DebugTraceNode};
use rebac_storage::RevisionReader;

use crate::dispatch_trait::Dispatch;
use crate::error::Result;
use crate::evaluator::evaluate_check;
use crate::schema::SchemaIndex;
use crate::types::{CheckRequest, CheckResponse};

pub async fn check(
    schema: &dyn SchemaIndex,
    storage: &dyn RevisionReader,
    dispatch: &dyn Dispatch,
    request: CheckRequest,
) -> Result<CheckResponse> {
    let (result, meta) = evaluate_check(
        schema,
        storage,
        dispatch,
        &request.resource,
        &request.relation,
        &request.subject,
        request.subject_relation.as_deref(),
        &request.context,
        &request.meta,
    )
    .await?;

    let debug_trace = match request.debug {
        DebugSetting::NoDebug => None,
        DebugSetting::Basic | DebugSetting::Full => Some(DebugTraceNode::leaf(
            format!("{}#{}", request.resource.namespace, request.relation),
            request.resource.to_string(),
            false,
        )),
    };

    Ok(CheckResponse {
        result,
        meta,
        debug_trace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rebac_model::{
        CompiledNamespace, CompiledRewrite, ObjectRef, RelationTuple, ResolverMeta,
    };
    use rebac_storage::InMemoryRevisionReader;
    use std::collections::BTreeMap;

    use crate::schema::InMemorySchemaIndex;
    use crate::types::{
        ExpandRequest, ExpandResponse, LookupResourcesRequest, LookupResourcesResponse,
        LookupSubjectsRequest, LookupSubjectsResponse, ReachableResourcesRequest,
        ReachableResourcesResponse,
    };

    struct NoRecursion;

    #[async_trait]
    impl Dispatch for NoRecursion {
        async fn check(&self, _request: CheckRequest) -> Result<CheckResponse> {
            panic!("this test's schema never needs a recursive dispatch call");
        }
        async fn expand(&self, _request: ExpandRequest) -> Result<ExpandResponse> {
            unimplemented!()
        }
        async fn reachable_resources(
            &self,
            _request: ReachableResourcesRequest,
        ) -> Result<ReachableResourcesResponse> {
            unimplemented!()
        }
        async fn lookup_resources(
            &self,
            _request: LookupResourcesRequest,
        ) -> Result<LookupResourcesResponse> {
            unimplemented!()
        }
        async fn lookup_subjects(
            &self,
            _request: LookupSubjectsRequest,
        ) -> Result<LookupSubjectsResponse> {
            unimplemented!()
        }
    }

    fn tuple(object_id: &str, relation: &str, subject_id: &str) -> RelationTuple {
        RelationTuple {
            namespace: "document".into(),
            object_id: object_id.into(),
            relation: relation.into(),
            subject_namespace: "user".into(),
            subject_object_id: subject_id.into(),
            subject_relation: None,
            caveat_name: None,
            caveat_context: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn direct_tuple_grants_membership() {
        let storage = InMemoryRevisionReader::new();
        storage.write_at(1, vec![tuple("doc1", "viewer", "alice")]);

        let schema = InMemorySchemaIndex::new().with_namespace(CompiledNamespace {
            namespace: "document".into(),
            relations: [("viewer".to_string(), CompiledRewrite::This)].into(),
            caveats: BTreeMap::new(),
        });

        let response = check(
            &schema,
            &storage,
            &NoRecursion,
            CheckRequest {
                resource: ObjectRef::new("document", "doc1"),
                relation: "viewer".into(),
                subject: ObjectRef::new("user", "alice"),
                subject_relation: None,
                context: BTreeMap::new(),
                meta: ResolverMeta::new("1", 50),
                debug: DebugSetting::NoDebug,
            },
        )
        .await
        .unwrap();

        assert!(response.result.is_member());
        // No recursive sub-calls were needed for a direct tuple match; the
        // dispatcher (C4) is the one that counts this call itself as one
        // dispatch once it wraps this resolver.
        assert_eq!(response.meta.dispatch_count, 0);
    }

    #[tokio::test]
    async fn missing_tuple_is_not_a_member() {
        let storage = InMemoryRevisionReader::new();
        storage.write_at(1, vec![tuple("doc1", "viewer", "alice")]);

        let schema = InMemorySchemaIndex::new().with_namespace(CompiledNamespace {
            namespace: "document".into(),
            relations: [("viewer".to_string(), CompiledRewrite::This)].into(),
            caveats: BTreeMap::new(),
        });

        let response = check(
            &schema,
            &storage,
            &NoRecursion,
            CheckRequest {
                resource: ObjectRef::new("document", "doc1"),
                relation: "viewer".into(),
                subject: ObjectRef::new("user", "bob"),
                subject_relation: None,
                context: BTreeMap::new(),
                meta: ResolverMeta::new("1", 50),
                debug: DebugSetting::NoDebug,
            },
        )
        .await
        .unwrap();

        assert!(!response.result.is_member());
    }

    #[tokio::test]
    async fn caveated_tuple_reports_declared_params_absent_from_context() {
        let storage = InMemoryRevisionReader::new();
        storage.write_at(
            1,
            vec![RelationTuple {
                namespace: "document".into(),
                object_id: "doc1".into(),
                relation: "edit".into(),
                subject_namespace: "user".into(),
                subject_object_id: "dan".into(),
                subject_relation: None,
                caveat_name: Some("ts_after".into()),
                caveat_context: BTreeMap::new(),
            }],
        );

        let schema = InMemorySchemaIndex::new().with_namespace(CompiledNamespace {
            namespace: "document".into(),
            relations: [("edit".to_string(), CompiledRewrite::This)].into(),
            caveats: [("ts_after".to_string(), vec!["now".to_string()])].into(),
        });

        let response = check(
            &schema,
            &storage,
            &NoRecursion,
            CheckRequest {
                resource: ObjectRef::new("document", "doc1"),
                relation: "edit".into(),
                subject: ObjectRef::new("user", "dan"),
                subject_relation: None,
                context: BTreeMap::new(),
                meta: ResolverMeta::new("1", 50),
                debug: DebugSetting::NoDebug,
            },
        )
        .await
        .unwrap();

        assert_eq!(response.result.membership, rebac_model::Membership::CaveatedMember);
        assert_eq!(response.result.missing_expr_fields, vec!["now".to_string()]);
    }

    #[tokio::test]
    async fn caveated_tuple_with_context_supplying_the_param_has_no_missing_fields() {
        let storage = InMemoryRevisionReader::new();
        storage.write_at(
            1,
            vec![RelationTuple {
                namespace: "document".into(),
                object_id: "doc1".into(),
                relation: "edit".into(),
                subject_namespace: "user".into(),
                subject_object_id: "dan".into(),
                subject_relation: None,
                caveat_name: Some("ts_after".into()),
                caveat_context: BTreeMap::new(),
            }],
        );

        let schema = InMemorySchemaIndex::new().with_namespace(CompiledNamespace {
            namespace: "document".into(),
            relations: [("edit".to_string(), CompiledRewrite::This)].into(),
            caveats: [("ts_after".to_string(), vec!["now".to_string()])].into(),
        });

        let mut context = BTreeMap::new();
        context.insert("now".to_string(), serde_json::json!("2026-07-28T00:00:00Z"));

        let response = check(
            &schema,
            &storage,
            &NoRecursion,
            CheckRequest {
                resource: ObjectRef::new("document", "doc1"),
                relation: "edit".into(),
                subject: ObjectRef::new("user", "dan"),
                subject_relation: None,
                context,
                meta: ResolverMeta::new("1", 50),
                debug: DebugSetting::NoDebug,
            },
        )
        .await
        .unwrap();

        assert!(response.result.missing_expr_fields.is_empty());
    }
}
