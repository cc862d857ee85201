//! Lock-step traversal of two nominally identical types.
//!
//! The driver walks both types together and reports events to a callback
//! sink: leaves whose structure matches, aggregate entry/exit, and shape
//! mismatches. A mismatch prunes its subtree — the walk does not descend
//! into children whose parents already disagree.

use crate::error::IrResult;
use crate::ids::TypeId;
use crate::types::{Type, TypeDb};

/// The position of a child within the aggregate pair being walked.
#[derive(Debug, Clone, Copy)]
pub struct ZipParent {
    /// The left-hand aggregate.
    pub lhs: TypeId,
    /// The right-hand aggregate.
    pub rhs: TypeId,
    /// The child's index within the aggregate.
    pub index: usize,
    /// The aggregate's child count.
    pub count: usize,
}

/// Event sink for [`zip_types`].
pub trait ZipTypesCallbacks {
    /// Called when the walk enters a structurally matched aggregate pair.
    fn aggregate_start(
        &mut self,
        lhs: TypeId,
        rhs: TypeId,
        parent: Option<&ZipParent>,
    ) -> IrResult<()>;

    /// Called when the walk leaves a structurally matched aggregate pair.
    fn aggregate_end(
        &mut self,
        lhs: TypeId,
        rhs: TypeId,
        parent: Option<&ZipParent>,
    ) -> IrResult<()>;

    /// Called on a pair of matched-structure leaves.
    fn matched_leaf(
        &mut self,
        lhs: TypeId,
        rhs: TypeId,
        parent: Option<&ZipParent>,
    ) -> IrResult<()>;

    /// Called on a shape mismatch; the subtree below it is pruned.
    fn type_mismatch(
        &mut self,
        lhs: TypeId,
        rhs: TypeId,
        parent: Option<&ZipParent>,
    ) -> IrResult<()>;
}

/// Walks `lhs` and `rhs` in lock-step, reporting events to `callbacks`.
///
/// Aggregates zip when they have the same variant and compatible shape:
/// tuples of equal arity, structs with equal nominal name and field names,
/// arrays regardless of size (sizes may differ while element types match),
/// channels, metas, and functions of equal arity. Everything else is a
/// mismatch at that position.
pub fn zip_types(
    lhs: TypeId,
    rhs: TypeId,
    db: &TypeDb,
    callbacks: &mut dyn ZipTypesCallbacks,
) -> IrResult<()> {
    walk(lhs, rhs, db, callbacks, None)
}

fn walk(
    lhs: TypeId,
    rhs: TypeId,
    db: &TypeDb,
    callbacks: &mut dyn ZipTypesCallbacks,
    parent: Option<&ZipParent>,
) -> IrResult<()> {
    let children: Vec<(TypeId, TypeId)> = match (db.get(lhs), db.get(rhs)) {
        (Type::Bits { width: lw }, Type::Bits { width: rw }) => {
            return if lw == rw {
                callbacks.matched_leaf(lhs, rhs, parent)
            } else {
                callbacks.type_mismatch(lhs, rhs, parent)
            };
        }
        (Type::Tuple { elements: le }, Type::Tuple { elements: re }) if le.len() == re.len() => {
            le.iter().copied().zip(re.iter().copied()).collect()
        }
        (
            Type::Struct {
                name: ln,
                fields: lf,
            },
            Type::Struct {
                name: rn,
                fields: rf,
            },
        ) if ln == rn
            && lf.len() == rf.len()
            && lf.iter().zip(rf.iter()).all(|(l, r)| l.0 == r.0) =>
        {
            lf.iter().map(|f| f.1).zip(rf.iter().map(|f| f.1)).collect()
        }
        (Type::Array { element: le, .. }, Type::Array { element: re, .. }) => {
            vec![(*le, *re)]
        }
        (Type::Chan { payload: lp }, Type::Chan { payload: rp }) => vec![(*lp, *rp)],
        (Type::Meta { inner: li }, Type::Meta { inner: ri }) => vec![(*li, *ri)],
        (
            Type::Function {
                params: lp,
                ret: lr,
            },
            Type::Function {
                params: rp,
                ret: rr,
            },
        ) if lp.len() == rp.len() => {
            let mut pairs: Vec<(TypeId, TypeId)> =
                lp.iter().copied().zip(rp.iter().copied()).collect();
            pairs.push((*lr, *rr));
            pairs
        }
        _ => return callbacks.type_mismatch(lhs, rhs, parent),
    };

    callbacks.aggregate_start(lhs, rhs, parent)?;
    let count = children.len();
    for (index, (cl, cr)) in children.into_iter().enumerate() {
        let position = ZipParent {
            lhs,
            rhs,
            index,
            count,
        };
        walk(cl, cr, db, callbacks, Some(&position))?;
    }
    callbacks.aggregate_end(lhs, rhs, parent)
}
