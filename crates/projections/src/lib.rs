//! Query-side state for the transaction processing platform.
//!
//! This crate folds committed events into denormalized state:
//! - [`MerchantBalanceProjection`] - running balance per
//!   `(estate, merchant)` partition with an immutable balance history
//! - [`VoucherProjection`] - per-voucher lifecycle state
//! - [`ReadModelRepository`] - the relational read-model contract, with an
//!   in-memory implementation, updated by [`ReadModelHandler`]
//!
//! All handlers are idempotent under redelivery; the balance projection
//! additionally requires ordered delivery per partition and is routed on
//! the dispatcher's ordered pipeline.

pub mod error;
pub mod merchant_balance;
pub mod read_model;
pub mod voucher;

pub use error::{ProjectionError, Result};
pub use merchant_balance::{
    BalanceEntryType, BalanceHistoryEntry, InMemoryMerchantBalanceRepository,
    MerchantBalanceProjection, MerchantBalanceRepository, MerchantBalanceState,
};
pub use read_model::{
    ContractRow, EstateRow, InMemoryReadModel, MerchantRow, ReadModelHandler, ReadModelRepository,
    SettlementRow, TransactionRow,
};
pub use voucher::{
    InMemoryVoucherStateRepository, VoucherProjection, VoucherState, VoucherStateRepository,
};
