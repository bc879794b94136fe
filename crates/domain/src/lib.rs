//! Domain layer for the transaction processing platform.
//!
//! This crate provides the core domain abstractions:
//! - Aggregate trait for event-sourced entities
//! - DomainEvent trait for domain events
//! - AggregateRepository for load-replay-save with optimistic concurrency
//! - The nine aggregate state machines (transaction, settlement, voucher,
//!   estate, merchant, contract, operator, float, reconciliation)
//! - The fee calculation engine

pub mod aggregate;
pub mod contract;
pub mod error;
pub mod estate;
pub mod fees;
pub mod float;
pub mod merchant;
pub mod operator;
pub mod reconciliation;
pub mod repository;
pub mod settlement;
pub mod transaction;
pub mod values;
pub mod voucher;

pub use aggregate::{Aggregate, DomainEvent, SnapshotCapable};
pub use contract::{Contract, ContractError, ContractEvent, ContractService};
pub use error::ServiceError;
pub use estate::{Estate, EstateError, EstateEvent, EstateService};
pub use fees::{CalculatedFee, CalculationType, FeeToCalculate, FeeType, calculate_fees};
pub use float::{Float, FloatError, FloatEvent, FloatService, float_aggregate_id};
pub use merchant::{Merchant, MerchantError, MerchantEvent, MerchantService};
pub use operator::{Operator, OperatorError, OperatorEvent, OperatorService};
pub use reconciliation::{
    Reconciliation, ReconciliationError, ReconciliationEvent, ReconciliationService,
};
pub use repository::{AggregateRepository, CommandOutcome};
pub use settlement::{
    Settlement, SettlementError, SettlementEvent, SettlementFee, SettlementService,
    SettlementState, settlement_aggregate_id,
};
pub use transaction::{
    Transaction, TransactionError, TransactionEvent, TransactionService, TransactionState,
    TransactionType,
};
pub use values::{ContractId, EstateId, FeeId, MerchantId, Money, OperatorId, ProductId};
pub use voucher::{Voucher, VoucherError, VoucherEvent, VoucherService, voucher_aggregate_id};
