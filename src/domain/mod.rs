pub mod split;
pub mod transaction;

pub use split::{calculate_split, round2, ImpactSplit, SplitError, DEFAULT_SPLIT_PERCENTAGE};
pub use transaction::{
    Environment, Metadata, NewTransaction, Transaction, TransactionKind, TransactionStatus,
};
