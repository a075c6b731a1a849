//! Relationship query filters passed to `RevisionReader::query_relationships`.

/// Narrows a subject to an optional relation and/or a specific object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectFilter {
    pub namespace: Option<String>,
    pub object_id: Option<String>,
    pub relation: Option<String>,
}

impl SubjectFilter {
    #[must_use]
    pub fn namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }

    #[must_use]
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }
}

/// Filters tuples by `(namespace, optional object_ids, optional relation,
/// optional subject filter)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipFilter {
    pub namespace: String,
    pub object_ids: Option<Vec<String>>,
    pub relation: Option<String>,
    pub subject_filter: Option<SubjectFilter>,
}

impl RelationshipFilter {
    #[must_use]
    pub fn for_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_object_ids(mut self, object_ids: Vec<String>) -> Self {
        self.object_ids = Some(object_ids);
        self
    }

    #[must_use]
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    #[must_use]
    pub fn with_subject_filter(mut self, subject_filter: SubjectFilter) -> Self {
        self.subject_filter = Some(subject_filter);
        self
    }

    #[must_use]
    pub fn matches(&self, tuple: &rebac_model::RelationTuple) -> bool {
        if tuple.namespace != self.namespace {
            return false;
        }
        if let Some(ids) = &self.object_ids {
            if !ids.iter().any(|id| id == &tuple.object_id) {
                return false;
            }
        }
        if let Some(relation) = &self.relation {
            if relation != &tuple.relation {
                return false;
            }
        }
        if let Some(subject) = &self.subject_filter {
            if let Some(ns) = &subject.namespace {
                if ns != &tuple.subject_namespace {
                    return false;
                }
            }
            if let Some(id) = &subject.object_id {
                if id != &tuple.subject_object_id {
                    return false;
                }
            }
            if let Some(rel) = &subject.relation {
                if Some(rel) != tuple.subject_relation.as_ref() {
                    return false;
                }
            }
        }
        true
    }
}
