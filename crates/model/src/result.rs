//! Per-resource check results and the caveat expression AST that gates
//! `CAVEATED_MEMBER` results.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// `NOT_MEMBER < CAVEATED_MEMBER < MEMBER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Membership {
    NotMember,
    CaveatedMember,
    Member,
}

impl Membership {
    /// Least-upper-bound, used by `UNION`.
    #[must_use]
    pub fn join(self, other: Membership) -> Membership {
        self.max(other)
    }

    #[must_use]
    pub fn is_member(self) -> bool {
        matches!(self, Membership::Member)
    }

    #[must_use]
    pub fn is_not_member(self) -> bool {
        matches!(self, Membership::NotMember)
    }
}

/// A boolean expression over named caveats, evaluated against
/// caller-supplied context at response time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CaveatExpression {
    Named {
        caveat_name: String,
        context: std::collections::BTreeMap<String, serde_json::Value>,
    },
    And(Box<CaveatExpression>, Box<CaveatExpression>),
    Or(Box<CaveatExpression>, Box<CaveatExpression>),
    Not(Box<CaveatExpression>),
}

impl CaveatExpression {
    #[must_use]
    pub fn and(self, other: CaveatExpression) -> CaveatExpression {
        CaveatExpression::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: CaveatExpression) -> CaveatExpression {
        CaveatExpression::Or(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn negate(self) -> CaveatExpression {
        CaveatExpression::Not(Box::new(self))
    }

    /// Collects the distinct caveat names referenced anywhere in the tree,
    /// used to compute `missing_expr_fields` in the caller's context.
    pub fn caveat_names(&self, out: &mut BTreeSet<String>) {
        match self {
            CaveatExpression::Named { caveat_name, .. } => {
                out.insert(caveat_name.clone());
            }
            CaveatExpression::And(a, b) | CaveatExpression::Or(a, b) => {
                a.caveat_names(out);
                b.caveat_names(out);
            }
            CaveatExpression::Not(a) => a.caveat_names(out),
        }
    }
}

/// Per-resource result of a permission check.
///
/// Invariants (enforced by the constructors below):
/// - `NOT_MEMBER` carries no expression.
/// - `MEMBER` carries no expression and no missing fields.
/// - `CAVEATED_MEMBER` carries a non-trivial expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceCheckResult {
    pub membership: Membership,
    pub caveat_expression: Option<CaveatExpression>,
    pub missing_expr_fields: Vec<String>,
}

impl ResourceCheckResult {
    #[must_use]
    pub fn not_member() -> Self {
        Self {
            membership: Membership::NotMember,
            caveat_expression: None,
            missing_expr_fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn member() -> Self {
        Self {
            membership: Membership::Member,
            caveat_expression: None,
            missing_expr_fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn caveated(expression: CaveatExpression, missing_expr_fields: Vec<String>) -> Self {
        Self {
            membership: Membership::CaveatedMember,
            caveat_expression: Some(expression),
            missing_expr_fields,
        }
    }

    #[must_use]
    pub fn is_member(&self) -> bool {
        self.membership.is_member()
    }

    /// `UNION`: least-upper-bound of membership; caveated children's
    /// expressions are OR-ed.
    #[must_use]
    pub fn union(self, other: ResourceCheckResult) -> ResourceCheckResult {
        match (self.membership, other.membership) {
            (Membership::Member, _) | (_, Membership::Member) => ResourceCheckResult::member(),
            (Membership::NotMember, Membership::NotMember) => ResourceCheckResult::not_member(),
            (Membership::NotMember, Membership::CaveatedMember) => other,
            (Membership::CaveatedMember, Membership::NotMember) => self,
            (Membership::CaveatedMember, Membership::CaveatedMember) => {
                let mut missing = self.missing_expr_fields;
                for field in other.missing_expr_fields {
                    if !missing.contains(&field) {
                        missing.push(field);
                    }
                }
                let expr = self
                    .caveat_expression
                    .expect("caveated result always carries an expression")
                    .or(other
                        .caveat_expression
                        .expect("caveated result always carries an expression"));
                ResourceCheckResult::caveated(expr, missing)
            }
        }
    }

    /// `INTERSECTION`: short-circuits on `NOT_MEMBER`; caveats AND-ed.
    #[must_use]
    pub fn intersect(self, other: ResourceCheckResult) -> ResourceCheckResult {
        match (self.membership, other.membership) {
            (Membership::NotMember, _) | (_, Membership::NotMember) => {
                ResourceCheckResult::not_member()
            }
            (Membership::Member, Membership::Member) => ResourceCheckResult::member(),
            (Membership::Member, Membership::CaveatedMember) => other,
            (Membership::CaveatedMember, Membership::Member) => self,
            (Membership::CaveatedMember, Membership::CaveatedMember) => {
                let mut missing = self.missing_expr_fields;
                for field in other.missing_expr_fields {
                    if !missing.contains(&field) {
                        missing.push(field);
                    }
                }
                let expr = self
                    .caveat_expression
                    .expect("caveated result always carries an expression")
                    .and(other
                        .caveat_expression
                        .expect("caveated result always carries an expression"));
                ResourceCheckResult::caveated(expr, missing)
            }
        }
    }

    /// `EXCLUSION(self, subtracted)`.
    #[must_use]
    pub fn exclude(self, subtracted: ResourceCheckResult) -> ResourceCheckResult {
        if self.membership == Membership::NotMember {
            return ResourceCheckResult::not_member();
        }
        match subtracted.membership {
            Membership::Member => ResourceCheckResult::not_member(),
            Membership::NotMember => self,
            Membership::CaveatedMember => {
                let mut missing = self.missing_expr_fields.clone();
                for field in &subtracted.missing_expr_fields {
                    if !missing.contains(field) {
                        missing.push(field.clone());
                    }
                }
                let negated = subtracted
                    .caveat_expression
                    .expect("caveated result always carries an expression")
                    .negate();
                let expr = match self.caveat_expression {
                    Some(base_expr) => base_expr.and(negated),
                    None => negated,
                };
                ResourceCheckResult::caveated(expr, missing)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_with_not_member_is_identity() {
        let a = ResourceCheckResult::caveated(
            CaveatExpression::Named {
                caveat_name: "ts_after".into(),
                context: Default::default(),
            },
            vec!["now".into()],
        );
        let out = a.clone().union(ResourceCheckResult::not_member());
        assert_eq!(out, a);
    }

    #[test]
    fn intersection_with_member_is_identity() {
        let a = ResourceCheckResult::caveated(
            CaveatExpression::Named {
                caveat_name: "ts_after".into(),
                context: Default::default(),
            },
            vec!["now".into()],
        );
        let out = a.clone().intersect(ResourceCheckResult::member());
        assert_eq!(out, a);
    }

    #[test]
    fn exclusion_with_not_member_is_identity() {
        let a = ResourceCheckResult::member();
        let out = a.clone().exclude(ResourceCheckResult::not_member());
        assert_eq!(out, a);
    }

    #[test]
    fn exclusion_with_member_is_not_member() {
        let a = ResourceCheckResult::member();
        let out = a.exclude(ResourceCheckResult::member());
        assert_eq!(out.membership, Membership::NotMember);
    }
}

#[cfg(test)]
mod algebra_properties {
    use super::*;
    use proptest::prelude::*;

    fn arbitrary_result() -> impl Strategy<Value = ResourceCheckResult> {
        prop_oneof![
            Just(ResourceCheckResult::not_member()),
            Just(ResourceCheckResult::member()),
            "[a-z]{3,8}".prop_map(|name| ResourceCheckResult::caveated(
                CaveatExpression::Named {
                    caveat_name: name,
                    context: Default::default(),
                },
                vec!["now".into()],
            )),
        ]
    }

    proptest! {
        // The rewrite algebra's identities, generalized
        // over any `a`, not just a fixed caveated example.
        #[test]
        fn union_with_not_member_is_identity(a in arbitrary_result()) {
            prop_assert_eq!(a.clone().union(ResourceCheckResult::not_member()), a);
        }

        #[test]
        fn intersection_with_member_is_identity(a in arbitrary_result()) {
            prop_assert_eq!(a.clone().intersect(ResourceCheckResult::member()), a);
        }

        #[test]
        fn exclusion_with_not_member_is_identity(a in arbitrary_result()) {
            prop_assert_eq!(a.clone().exclude(ResourceCheckResult::not_member()), a);
        }

        #[test]
        fn exclusion_with_member_is_not_member(a in arbitrary_result()) {
            prop_assume!(!a.membership.is_not_member());
            let out = a.exclude(ResourceCheckResult::member());
            prop_assert_eq!(out.membership, Membership::NotMember);
        }

        #[test]
        fn union_is_never_weaker_than_either_operand(a in arbitrary_result(), b in arbitrary_result()) {
            let joined = a.membership.join(b.membership);
            let out = a.union(b);
            prop_assert_eq!(out.membership, joined);
        }
    }
}
