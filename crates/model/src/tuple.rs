//! Relation tuples and the object/userset references they connect.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The sentinel subject-relation string meaning "the subject object itself",
/// as opposed to a named relation used for userset indirection.
pub const SELF_SUBJECT_RELATION: &str = "...";

/// The wildcard subject id meaning "every subject of this namespace".
pub const WILDCARD_SUBJECT_ID: &str = "*";

/// A `(namespace, relation)` pair — the schema object that denotes a column
/// of the graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationReference {
    pub namespace: String,
    pub relation: String,
}

impl RelationReference {
    pub fn new(namespace: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            relation: relation.into(),
        }
    }
}

impl fmt::Display for RelationReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.namespace, self.relation)
    }
}

/// A reference to a single object: `namespace:object_id`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub namespace: String,
    pub object_id: String,
}

impl ObjectRef {
    pub fn new(namespace: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            object_id: object_id.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.object_id)
    }
}

/// An immutable fact:
/// `(namespace, object_id, relation) -> (subject_namespace, subject_object_id, subject_relation)`
/// plus an optional caveat.
///
/// `subject_relation == None` is the terminal case ("..."): the subject is a
/// concrete object, not a userset. `subject_relation == Some(rel)` means the
/// subject is itself a userset `subject_namespace:subject_object_id#rel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationTuple {
    pub namespace: String,
    pub object_id: String,
    pub relation: String,
    pub subject_namespace: String,
    pub subject_object_id: String,
    pub subject_relation: Option<String>,
    pub caveat_name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub caveat_context: BTreeMap<String, serde_json::Value>,
}

impl RelationTuple {
    #[must_use]
    pub fn resource(&self) -> ObjectRef {
        ObjectRef::new(self.namespace.clone(), self.object_id.clone())
    }

    #[must_use]
    pub fn resource_relation(&self) -> RelationReference {
        RelationReference::new(self.namespace.clone(), self.relation.clone())
    }

    #[must_use]
    pub fn subject(&self) -> ObjectRef {
        ObjectRef::new(self.subject_namespace.clone(), self.subject_object_id.clone())
    }

    /// `true` when this tuple's subject is a concrete object rather than a
    /// userset indirection (i.e. `subject_relation` is unset or the literal
    /// `...` sentinel).
    #[must_use]
    pub fn is_terminal_subject(&self) -> bool {
        match &self.subject_relation {
            None => true,
            Some(rel) => rel == SELF_SUBJECT_RELATION,
        }
    }

    /// `true` when the subject is the public wildcard (`namespace:*`).
    #[must_use]
    pub fn is_wildcard_subject(&self) -> bool {
        self.subject_object_id == WILDCARD_SUBJECT_ID
    }

    /// The userset this tuple's subject denotes, if it is not terminal.
    #[must_use]
    pub fn subject_userset(&self) -> Option<RelationReference> {
        if self.is_terminal_subject() {
            None
        } else {
            self.subject_relation
                .as_ref()
                .map(|rel| RelationReference::new(self.subject_namespace.clone(), rel.clone()))
        }
    }

    #[must_use]
    pub fn has_caveat(&self) -> bool {
        self.caveat_name.is_some()
    }
}

impl fmt::Display for RelationTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}#{}@{}:{}",
            self.namespace, self.object_id, self.relation, self.subject_namespace, self.subject_object_id
        )?;
        if let Some(rel) = &self.subject_relation {
            if rel != SELF_SUBJECT_RELATION {
                write!(f, "#{rel}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_subject_has_no_relation() {
        let t = RelationTuple {
            namespace: "document".into(),
            object_id: "doc1".into(),
            relation: "viewer".into(),
            subject_namespace: "user".into(),
            subject_object_id: "alice".into(),
            subject_relation: None,
            caveat_name: None,
            caveat_context: BTreeMap::new(),
        };
        assert!(t.is_terminal_subject());
        assert!(t.subject_userset().is_none());
        assert_eq!(t.to_string(), "document:doc1#viewer@user:alice");
    }

    #[test]
    fn userset_subject_is_not_terminal() {
        let t = RelationTuple {
            namespace: "document".into(),
            object_id: "doc1".into(),
            relation: "viewer".into(),
            subject_namespace: "group".into(),
            subject_object_id: "eng".into(),
            subject_relation: Some("member".into()),
            caveat_name: None,
            caveat_context: BTreeMap::new(),
        };
        assert!(!t.is_terminal_subject());
        assert_eq!(
            t.subject_userset(),
            Some(RelationReference::new("group", "member"))
        );
    }

    #[test]
    fn ellipsis_sentinel_is_terminal() {
        let t = RelationTuple {
            namespace: "document".into(),
            object_id: "doc1".into(),
            relation: "viewer".into(),
            subject_namespace: "user".into(),
            subject_object_id: "alice".into(),
            subject_relation: Some(SELF_SUBJECT_RELATION.into()),
            caveat_name: None,
            caveat_context: BTreeMap::new(),
        };
        assert!(t.is_terminal_subject());
    }

    #[test]
    fn wildcard_subject_detected() {
        let t = RelationTuple {
            namespace: "document".into(),
            object_id: "doc1".into(),
            relation: "viewer".into(),
            subject_namespace: "user".into(),
            subject_object_id: "*".into(),
            subject_relation: None,
            caveat_name: None,
            caveat_context: BTreeMap::new(),
        };
        assert!(t.is_wildcard_subject());
    }
}
