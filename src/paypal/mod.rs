pub mod client;

pub use client::{
    ConnectionCheck, PayPalClient, PayPalError, PayoutAmount, PayoutBatch, PayoutItem,
    PayoutResponse, SenderBatchHeader,
};
