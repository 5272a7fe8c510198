//! # Pushdown Decision Table
//!
//! Answers one question: may a filter taken from the ON clause run before
//! (or independently of) the join? Two gates apply:
//!
//! - **Strictness**: ALL/ANY/RIGHT_ANY/SEMI joins keep per-row semantics
//!   under pre-filtering. ANTI inverts match existence and ASOF picks the
//!   nearest candidate, so removing candidate rows early changes their
//!   results -- neither ever allows pushdown.
//! - **Kind**: INNER and the structural kinds (CROSS/COMMA/PASTE) discard
//!   no rows, so any side may be pre-filtered. For outer kinds only the
//!   *discarded* side is safe: a LEFT join may pre-filter its right side,
//!   a RIGHT join its left side. Pre-filtering the null-padded side would
//!   drop rows that must instead survive with a null-padded match.
//!
//! Residual (cross-side) filters consult the table with no side at all;
//! the selector additionally requires a single disjunct for those, since
//! one OR-alternative's filter cannot become an unconditional post-filter.

use joinx_core::join::{JoinKind, JoinStrictness, JoinTableSide};

/// Whether a filter from the ON clause of a join with the given kind and
/// strictness may be evaluated before the join. `side` is the input the
/// filter reads from; `None` means it reads both (a residual condition).
pub fn can_push_down_from_on(
    kind: JoinKind,
    strictness: JoinStrictness,
    side: Option<JoinTableSide>,
) -> bool {
    if strictness != JoinStrictness::All
        && strictness != JoinStrictness::Any
        && strictness != JoinStrictness::RightAny
        && strictness != JoinStrictness::Semi
    {
        return false;
    }

    kind == JoinKind::Inner
        || kind == JoinKind::Cross
        || kind == JoinKind::Comma
        || kind == JoinKind::Paste
        || (side == Some(JoinTableSide::Left) && kind == JoinKind::Right)
        || (side == Some(JoinTableSide::Right) && kind == JoinKind::Left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinx_core::join::JoinTableSide::{Left, Right};

    #[test]
    fn test_side_independent_kinds_allow_both_sides() {
        for kind in [JoinKind::Inner, JoinKind::Cross, JoinKind::Comma, JoinKind::Paste] {
            assert!(can_push_down_from_on(kind, JoinStrictness::All, Some(Left)));
            assert!(can_push_down_from_on(kind, JoinStrictness::All, Some(Right)));
            assert!(can_push_down_from_on(kind, JoinStrictness::All, None));
        }
    }

    #[test]
    fn test_outer_kinds_allow_only_the_discarded_side() {
        // LEFT join: left rows survive null-padded, right rows without a
        // match are discarded. Only the right side may be pre-filtered.
        assert!(can_push_down_from_on(JoinKind::Left, JoinStrictness::All, Some(Right)));
        assert!(!can_push_down_from_on(JoinKind::Left, JoinStrictness::All, Some(Left)));

        assert!(can_push_down_from_on(JoinKind::Right, JoinStrictness::All, Some(Left)));
        assert!(!can_push_down_from_on(JoinKind::Right, JoinStrictness::All, Some(Right)));

        // FULL keeps unmatched rows of both sides.
        assert!(!can_push_down_from_on(JoinKind::Full, JoinStrictness::All, Some(Left)));
        assert!(!can_push_down_from_on(JoinKind::Full, JoinStrictness::All, Some(Right)));
    }

    #[test]
    fn test_residual_follows_kind_only() {
        assert!(can_push_down_from_on(JoinKind::Inner, JoinStrictness::All, None));
        assert!(!can_push_down_from_on(JoinKind::Left, JoinStrictness::All, None));
        assert!(!can_push_down_from_on(JoinKind::Right, JoinStrictness::All, None));
        assert!(!can_push_down_from_on(JoinKind::Full, JoinStrictness::All, None));
    }

    #[test]
    fn test_anti_and_asof_never_push() {
        for strictness in [JoinStrictness::Anti, JoinStrictness::Asof] {
            assert!(!can_push_down_from_on(JoinKind::Inner, strictness, Some(Left)));
            assert!(!can_push_down_from_on(JoinKind::Inner, strictness, None));
        }
        for strictness in [
            JoinStrictness::All,
            JoinStrictness::Any,
            JoinStrictness::RightAny,
            JoinStrictness::Semi,
        ] {
            assert!(can_push_down_from_on(JoinKind::Inner, strictness, Some(Left)));
        }
    }
}
