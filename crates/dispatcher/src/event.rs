//! The closed platform event enumeration and its decode registry.
//!
//! Event envelopes carry a string discriminator; the registry maps each
//! known discriminator to a decode function producing [`PlatformEvent`].
//! Extending the platform with a new event type requires a new registry
//! entry against a concrete decoder - there is no runtime reflection and
//! no default fallthrough.

use std::collections::HashMap;

use domain::{
    ContractEvent, DomainEvent, EstateEvent, FloatEvent, MerchantEvent, OperatorEvent,
    ReconciliationEvent, SettlementEvent, TransactionEvent, VoucherEvent,
};
use event_store::EventEnvelope;

use crate::error::DispatchError;

/// Every event kind the platform can emit, as one closed enumeration.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    Transaction(TransactionEvent),
    Settlement(SettlementEvent),
    Merchant(MerchantEvent),
    Estate(EstateEvent),
    Contract(ContractEvent),
    Operator(OperatorEvent),
    Voucher(VoucherEvent),
    Float(FloatEvent),
    Reconciliation(ReconciliationEvent),
}

impl PlatformEvent {
    /// Returns the wire discriminator of the wrapped event.
    pub fn event_type(&self) -> &'static str {
        match self {
            PlatformEvent::Transaction(e) => e.event_type(),
            PlatformEvent::Settlement(e) => e.event_type(),
            PlatformEvent::Merchant(e) => e.event_type(),
            PlatformEvent::Estate(e) => e.event_type(),
            PlatformEvent::Contract(e) => e.event_type(),
            PlatformEvent::Operator(e) => e.event_type(),
            PlatformEvent::Voucher(e) => e.event_type(),
            PlatformEvent::Float(e) => e.event_type(),
            PlatformEvent::Reconciliation(e) => e.event_type(),
        }
    }
}

/// Returns the ordering partition key for an event.
///
/// Events that carry merchant identity partition by `estate:merchant`, so
/// the ordered pipeline folds one merchant's history sequentially while
/// different merchants proceed in parallel. Everything else partitions by
/// its own stream.
pub fn partition_key(event: &PlatformEvent, envelope: &EventEnvelope) -> String {
    match event {
        PlatformEvent::Transaction(TransactionEvent::TransactionHasBeenCompleted(data)) => {
            format!("{}:{}", data.estate_id, data.merchant_id)
        }
        PlatformEvent::Merchant(MerchantEvent::MerchantDepositMade(data)) => {
            format!("{}:{}", data.estate_id, data.merchant_id)
        }
        PlatformEvent::Merchant(MerchantEvent::MerchantWithdrawalMade(data)) => {
            format!("{}:{}", data.estate_id, data.merchant_id)
        }
        PlatformEvent::Settlement(SettlementEvent::MerchantFeeSettled(data)) => {
            format!("{}:{}", data.estate_id, data.merchant_id)
        }
        _ => envelope.aggregate_id.to_string(),
    }
}

type DecodeFn = fn(&serde_json::Value) -> Result<PlatformEvent, serde_json::Error>;

fn decode_transaction(payload: &serde_json::Value) -> Result<PlatformEvent, serde_json::Error> {
    serde_json::from_value::<TransactionEvent>(payload.clone()).map(PlatformEvent::Transaction)
}

fn decode_settlement(payload: &serde_json::Value) -> Result<PlatformEvent, serde_json::Error> {
    serde_json::from_value::<SettlementEvent>(payload.clone()).map(PlatformEvent::Settlement)
}

fn decode_merchant(payload: &serde_json::Value) -> Result<PlatformEvent, serde_json::Error> {
    serde_json::from_value::<MerchantEvent>(payload.clone()).map(PlatformEvent::Merchant)
}

fn decode_estate(payload: &serde_json::Value) -> Result<PlatformEvent, serde_json::Error> {
    serde_json::from_value::<EstateEvent>(payload.clone()).map(PlatformEvent::Estate)
}

fn decode_contract(payload: &serde_json::Value) -> Result<PlatformEvent, serde_json::Error> {
    serde_json::from_value::<ContractEvent>(payload.clone()).map(PlatformEvent::Contract)
}

fn decode_operator(payload: &serde_json::Value) -> Result<PlatformEvent, serde_json::Error> {
    serde_json::from_value::<OperatorEvent>(payload.clone()).map(PlatformEvent::Operator)
}

fn decode_voucher(payload: &serde_json::Value) -> Result<PlatformEvent, serde_json::Error> {
    serde_json::from_value::<VoucherEvent>(payload.clone()).map(PlatformEvent::Voucher)
}

fn decode_float(payload: &serde_json::Value) -> Result<PlatformEvent, serde_json::Error> {
    serde_json::from_value::<FloatEvent>(payload.clone()).map(PlatformEvent::Float)
}

fn decode_reconciliation(payload: &serde_json::Value) -> Result<PlatformEvent, serde_json::Error> {
    serde_json::from_value::<ReconciliationEvent>(payload.clone())
        .map(PlatformEvent::Reconciliation)
}

/// Process-wide immutable mapping from wire discriminator to decoder.
///
/// Built once at startup and passed into the dispatcher.
pub struct EventTypeRegistry {
    decoders: HashMap<&'static str, DecodeFn>,
}

impl EventTypeRegistry {
    /// Builds the registry covering every event type this build knows.
    pub fn standard() -> Self {
        let mut decoders: HashMap<&'static str, DecodeFn> = HashMap::new();

        decoders.insert("TransactionHasStarted", decode_transaction);
        decoders.insert("AdditionalRequestDataRecorded", decode_transaction);
        decoders.insert("ProductDetailsAdded", decode_transaction);
        decoders.insert("TransactionHasBeenLocallyAuthorised", decode_transaction);
        decoders.insert("TransactionHasBeenLocallyDeclined", decode_transaction);
        decoders.insert("TransactionHasBeenCompleted", decode_transaction);

        decoders.insert("SettlementCreated", decode_settlement);
        decoders.insert("MerchantFeeAddedPendingSettlement", decode_settlement);
        decoders.insert("MerchantFeeSettled", decode_settlement);
        decoders.insert("SettlementProcessingStarted", decode_settlement);
        decoders.insert("SettlementCompleted", decode_settlement);

        decoders.insert("MerchantCreated", decode_merchant);
        decoders.insert("MerchantDepositMade", decode_merchant);
        decoders.insert("MerchantWithdrawalMade", decode_merchant);

        decoders.insert("EstateCreated", decode_estate);
        decoders.insert("OperatorAddedToEstate", decode_estate);

        decoders.insert("ContractCreated", decode_contract);
        decoders.insert("ContractProductAdded", decode_contract);
        decoders.insert("TransactionFeeAdded", decode_contract);

        decoders.insert("OperatorCreated", decode_operator);

        decoders.insert("VoucherIssued", decode_voucher);
        decoders.insert("VoucherFullyRedeemed", decode_voucher);

        decoders.insert("FloatCreatedForContractProduct", decode_float);
        decoders.insert("FloatCreditPurchased", decode_float);
        decoders.insert("FloatDecreasedByTransaction", decode_float);

        decoders.insert("ReconciliationHasStarted", decode_reconciliation);
        decoders.insert("OverallTotalsRecorded", decode_reconciliation);
        decoders.insert("ReconciliationHasBeenCompleted", decode_reconciliation);

        Self { decoders }
    }

    /// Returns true if the discriminator is known.
    pub fn knows(&self, event_type: &str) -> bool {
        self.decoders.contains_key(event_type)
    }

    /// Decodes an envelope payload into the closed event enumeration.
    pub fn decode(&self, envelope: &EventEnvelope) -> Result<PlatformEvent, DispatchError> {
        let decoder = self
            .decoders
            .get(envelope.event_type.as_str())
            .ok_or_else(|| DispatchError::UnknownEventType(envelope.event_type.clone()))?;

        decoder(&envelope.payload).map_err(|source| DispatchError::Decode {
            event_type: envelope.event_type.clone(),
            source,
        })
    }
}
