//! Compiled permission expressions — the rewrite tree the engine interprets.

use serde::{Deserialize, Serialize};

use crate::tuple::RelationReference;

/// A tree of operator nodes, already reduced from schema source text. The
/// schema compiler that produces this tree is out of scope for this crate;
/// it is consumed as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompiledRewrite {
    /// Direct tuples in the `(resource, relation)` column.
    This,
    /// Rewrite to `(same resource, given relation)`.
    ComputedUserset { relation: String },
    /// For each tuple in `resource#tupleset_relation` whose subject is an
    /// object `O`, recurse on `O#computed_userset_on_subject`.
    TupleToUserset {
        tupleset_relation: String,
        computed_userset_on_subject: String,
    },
    Union(Vec<CompiledRewrite>),
    Intersection(Vec<CompiledRewrite>),
    Exclusion {
        base: Box<CompiledRewrite>,
        subtracted: Box<CompiledRewrite>,
    },
}

impl CompiledRewrite {
    pub fn union(children: impl IntoIterator<Item = CompiledRewrite>) -> Self {
        Self::Union(children.into_iter().collect())
    }

    pub fn intersection(children: impl IntoIterator<Item = CompiledRewrite>) -> Self {
        Self::Intersection(children.into_iter().collect())
    }

    pub fn exclusion(base: CompiledRewrite, subtracted: CompiledRewrite) -> Self {
        Self::Exclusion {
            base: Box::new(base),
            subtracted: Box::new(subtracted),
        }
    }

    pub fn computed_userset(relation: impl Into<String>) -> Self {
        Self::ComputedUserset {
            relation: relation.into(),
        }
    }

    pub fn tuple_to_userset(
        tupleset_relation: impl Into<String>,
        computed_userset_on_subject: impl Into<String>,
    ) -> Self {
        Self::TupleToUserset {
            tupleset_relation: tupleset_relation.into(),
            computed_userset_on_subject: computed_userset_on_subject.into(),
        }
    }
}

/// A compiled namespace: one rewrite tree per relation/permission name, plus
/// the declared parameter name for each caveat a tuple in this namespace may
/// reference. The caveat's expression body is out of scope here (evaluating
/// it is the caller's job); only the parameter names it requires are needed,
/// to know which of them a request's `context` is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompiledNamespace {
    pub namespace: String,
    pub relations: std::collections::BTreeMap<String, CompiledRewrite>,
    pub caveats: std::collections::BTreeMap<String, Vec<String>>,
}

impl CompiledNamespace {
    #[must_use]
    pub fn rewrite_for(&self, relation: &str) -> Option<&CompiledRewrite> {
        self.relations.get(relation)
    }

    #[must_use]
    pub fn reference(&self, relation: &str) -> RelationReference {
        RelationReference::new(self.namespace.clone(), relation.to_string())
    }

    /// The declared parameter names for `caveat_name`, or an empty slice if
    /// this namespace has no such caveat (callers have no bound we can
    /// enforce, so we report "nothing missing" rather than error).
    #[must_use]
    pub fn caveat_params(&self, caveat_name: &str) -> &[String] {
        self.caveats.get(caveat_name).map_or(&[], Vec::as_slice)
    }
}
