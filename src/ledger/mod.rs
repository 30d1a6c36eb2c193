//! The two currency ledgers.
//!
//! Both share the same shape: a denormalized balance mutated through a
//! designated entry point plus an append-only audit log. They differ in
//! strictness: the gem balance is guarded by a conditional atomic debit
//! and never goes negative, while the point counter accepts any signed
//! delta.

pub mod gems;
pub mod points;

pub use gems::{
    DebitOutcome, GemAccount, GemLedger, GemTransaction, GemTransactionKind, GemTransactionStatus,
    SpendReceipt,
};
pub use points::{
    PointAction, PointLedger, PointRefs, PointTransaction, PointTransactionKind,
};
