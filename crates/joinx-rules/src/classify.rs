//! # Join Condition Classification
//!
//! One AND-clause of a join condition mixes several kinds of conjuncts:
//! equality comparisons usable as hash keys, at most one inequality (the
//! ASOF match direction), filters that touch only one side, and residual
//! conditions that need both. Classification separates them:
//!
//! - Equality predicates become key pairs, null-safety flagged per key.
//! - An inequality is recorded as the clause's ASOF direction and its
//!   column pair joins the key list, after the equalities. Inequalities
//!   are only legal under ASOF strictness, and only one per clause.
//! - Each of the three filter lists is conjoined into a single boolean
//!   column registered in its DAG: left filters in the left pre-join DAG,
//!   right filters in the right pre-join DAG, residual conditions in the
//!   post-join DAG.
//!
//! Classification never decides *where* a filter runs -- that is the
//! pushdown policy's and the selector's job.

use joinx_core::error::JoinPlanError;
use joinx_core::expr::{ActionsDag, DataType};
use joinx_core::join::{
    AsofInequality, JoinActionRef, JoinCondition, JoinExpressionActions, JoinStrictness,
    PredicateOperator,
};
use joinx_core::runtime::JoinKey;

/// The classified parts of one AND-clause.
#[derive(Debug, Clone)]
pub struct ClassifiedCondition {
    /// Key pairs, equalities first; the ASOF pair (if any) comes last.
    pub keys: Vec<JoinKey>,
    /// Match direction of the clause's single inequality predicate.
    pub asof_inequality: Option<AsofInequality>,
    /// Conjoined left-only filter, registered in the left pre-join DAG.
    pub left_filter: Option<JoinActionRef>,
    /// Conjoined right-only filter, registered in the right pre-join DAG.
    pub right_filter: Option<JoinActionRef>,
    /// Conjoined residual condition, registered in the post-join DAG.
    pub residual_filter: Option<JoinActionRef>,
}

/// Conjoin a filter list into a single boolean output of `dag`.
///
/// An empty list yields None. A single condition is re-exported as is;
/// several are combined under one `and` node.
pub fn concat_conditions(
    conditions: &[JoinActionRef],
    dag: &mut ActionsDag,
) -> Option<JoinActionRef> {
    if conditions.is_empty() {
        return None;
    }
    if conditions.len() == 1 {
        let only = conditions[0].clone();
        dag.add_or_replace_in_outputs(only.node);
        return Some(only);
    }

    let arguments = conditions.iter().map(|c| c.node).collect();
    let conjunction = dag.add_function("and", arguments, DataType::Bool);
    dag.add_or_replace_in_outputs(conjunction);
    Some(JoinActionRef::new(dag, conjunction))
}

/// Classify one AND-clause under the given strictness.
///
/// Registers the conjoined filter columns in their DAGs as a side effect.
/// Fails before touching any DAG: operator checks run over the whole
/// clause first.
pub fn classify_condition(
    condition: &JoinCondition,
    strictness: JoinStrictness,
    actions: &mut JoinExpressionActions,
) -> Result<ClassifiedCondition, JoinPlanError> {
    let mut keys = Vec::with_capacity(condition.predicates.len());
    let mut asof_inequality = None;
    let mut asof_key = None;

    for predicate in &condition.predicates {
        match predicate.op {
            PredicateOperator::Equal | PredicateOperator::NullSafeEqual => {
                keys.push(JoinKey::new(
                    predicate.left.column_name.clone(),
                    predicate.right.column_name.clone(),
                    predicate.op == PredicateOperator::NullSafeEqual,
                ));
            }
            op => {
                if strictness != JoinStrictness::Asof {
                    return Err(JoinPlanError::InvalidCondition(format!(
                        "inequality predicate is only allowed in ASOF join: {}",
                        condition
                    )));
                }
                if asof_inequality.is_some() {
                    return Err(JoinPlanError::InvalidCondition(format!(
                        "multiple inequality predicates in join condition: {}",
                        condition
                    )));
                }
                asof_inequality = op.asof_inequality();
                asof_key = Some(JoinKey::new(
                    predicate.left.column_name.clone(),
                    predicate.right.column_name.clone(),
                    false,
                ));
            }
        }
    }

    // The ASOF pair participates in matching like any key, ordered after
    // the equalities.
    keys.extend(asof_key);

    Ok(ClassifiedCondition {
        keys,
        asof_inequality,
        left_filter: concat_conditions(
            &condition.left_filter_conditions,
            &mut actions.left_pre_join_actions,
        ),
        right_filter: concat_conditions(
            &condition.right_filter_conditions,
            &mut actions.right_pre_join_actions,
        ),
        residual_filter: concat_conditions(
            &condition.residual_conditions,
            &mut actions.post_join_actions,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinx_core::expr::{Column, DataType, Header};
    use joinx_core::join::{JoinPredicate, PredicateOperator};

    fn setup() -> (Header, Header, JoinExpressionActions) {
        let left = Header::new(vec![
            Column::new("l_id", DataType::Int64),
            Column::new("l_ts", DataType::Date),
            Column::new("l_flag", DataType::Bool),
            Column::new("l_extra", DataType::Bool),
        ]);
        let right = Header::new(vec![
            Column::new("r_id", DataType::Int64),
            Column::new("r_ts", DataType::Date),
        ]);
        let actions = JoinExpressionActions::from_headers(&left, &right);
        (left, right, actions)
    }

    fn predicate(
        actions: &JoinExpressionActions,
        left: &str,
        right: &str,
        op: PredicateOperator,
    ) -> JoinPredicate {
        let left_node = actions.left_pre_join_actions.find_output(left).unwrap();
        let right_node = actions.right_pre_join_actions.find_output(right).unwrap();
        JoinPredicate {
            left: JoinActionRef::new(&actions.left_pre_join_actions, left_node),
            right: JoinActionRef::new(&actions.right_pre_join_actions, right_node),
            op,
        }
    }

    #[test]
    fn test_equality_keys_with_per_key_null_safety() {
        let (_, _, mut actions) = setup();
        let condition = JoinCondition {
            predicates: vec![
                predicate(&actions, "l_id", "r_id", PredicateOperator::Equal),
                predicate(&actions, "l_ts", "r_ts", PredicateOperator::NullSafeEqual),
            ],
            ..Default::default()
        };

        let classified =
            classify_condition(&condition, JoinStrictness::All, &mut actions).unwrap();
        assert_eq!(classified.keys.len(), 2);
        assert!(!classified.keys[0].null_safe);
        assert!(classified.keys[1].null_safe);
        assert!(classified.asof_inequality.is_none());
        assert!(classified.left_filter.is_none());
    }

    #[test]
    fn test_inequality_outside_asof_is_rejected() {
        let (_, _, mut actions) = setup();
        let condition = JoinCondition {
            predicates: vec![predicate(&actions, "l_ts", "r_ts", PredicateOperator::Greater)],
            ..Default::default()
        };

        let err = classify_condition(&condition, JoinStrictness::All, &mut actions).unwrap_err();
        assert!(matches!(err, JoinPlanError::InvalidCondition(_)));
        // The message names the clause.
        assert!(err.to_string().contains("l_ts > r_ts"));
    }

    #[test]
    fn test_asof_inequality_becomes_last_key() {
        let (_, _, mut actions) = setup();
        let condition = JoinCondition {
            predicates: vec![
                predicate(&actions, "l_ts", "r_ts", PredicateOperator::GreaterOrEquals),
                predicate(&actions, "l_id", "r_id", PredicateOperator::Equal),
            ],
            ..Default::default()
        };

        let classified =
            classify_condition(&condition, JoinStrictness::Asof, &mut actions).unwrap();
        assert_eq!(classified.asof_inequality, Some(AsofInequality::GreaterOrEquals));
        assert_eq!(classified.keys.len(), 2);
        assert_eq!(classified.keys[0].left_name, "l_id");
        assert_eq!(classified.keys[1].left_name, "l_ts");
    }

    #[test]
    fn test_second_inequality_is_rejected() {
        let (_, _, mut actions) = setup();
        let condition = JoinCondition {
            predicates: vec![
                predicate(&actions, "l_ts", "r_ts", PredicateOperator::Greater),
                predicate(&actions, "l_id", "r_id", PredicateOperator::Less),
            ],
            ..Default::default()
        };

        let err = classify_condition(&condition, JoinStrictness::Asof, &mut actions).unwrap_err();
        assert!(err.to_string().contains("multiple inequality predicates"));
    }

    #[test]
    fn test_filters_conjoined_into_dags() {
        let (_, _, mut actions) = setup();
        let flag = actions.left_pre_join_actions.find_output("l_flag").unwrap();
        let extra = actions.left_pre_join_actions.find_output("l_extra").unwrap();
        let condition = JoinCondition {
            predicates: vec![predicate(&actions, "l_id", "r_id", PredicateOperator::Equal)],
            left_filter_conditions: vec![
                JoinActionRef::new(&actions.left_pre_join_actions, flag),
                JoinActionRef::new(&actions.left_pre_join_actions, extra),
            ],
            ..Default::default()
        };

        let classified =
            classify_condition(&condition, JoinStrictness::All, &mut actions).unwrap();
        let left_filter = classified.left_filter.unwrap();
        assert_eq!(left_filter.column_name, "and(l_flag, l_extra)");
        assert!(actions
            .left_pre_join_actions
            .find_output("and(l_flag, l_extra)")
            .is_some());
        assert!(classified.right_filter.is_none());
        assert!(classified.residual_filter.is_none());
    }

    #[test]
    fn test_single_filter_is_reexported_not_wrapped() {
        let (_, _, mut actions) = setup();
        let flag = actions.left_pre_join_actions.find_output("l_flag").unwrap();
        let refs = vec![JoinActionRef::new(&actions.left_pre_join_actions, flag)];

        let result = concat_conditions(&refs, &mut actions.left_pre_join_actions).unwrap();
        assert_eq!(result.column_name, "l_flag");
        assert!(concat_conditions(&[], &mut actions.left_pre_join_actions).is_none());
    }
}
