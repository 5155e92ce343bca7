pub mod payout;

pub use payout::{BatchRecipient, PayoutOutcome, PayoutRequest, PayoutService};
