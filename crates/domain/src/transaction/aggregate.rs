//! Transaction aggregate implementation.

use std::collections::HashMap;

use chrono::Utc;
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::values::{ContractId, EstateId, MerchantId, Money, ProductId};

use super::{
    TransactionError,
    additional_data::validate_request_fields,
    events::{
        AdditionalRequestDataRecordedData, ProductDetailsAddedData, TransactionCompletedData,
        TransactionDeclinedData, TransactionEvent, TransactionHasStartedData,
        TransactionLocallyAuthorisedData,
    },
};

/// The kind of transaction a device submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Device logon check.
    Logon,

    /// A product sale.
    Sale,

    /// End-of-day totals reconciliation.
    Reconciliation,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransactionType::Logon => "Logon",
            TransactionType::Sale => "Sale",
            TransactionType::Reconciliation => "Reconciliation",
        };
        write!(f, "{name}")
    }
}

/// How a transaction was resolved before completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionOutcome {
    /// Authorised with the given code.
    Authorised { authorisation_code: String },

    /// Declined with the given response code.
    Declined { response_code: String },
}

/// Observable lifecycle state, derived from the applied events.
///
/// ```text
/// NotStarted ──► Started ──► ProductAssigned ──┬──► Authorised ──► Completed
///                   │                          └──► Declined ────► Completed
///                   └──────────────────────────────┘ (non-sale types)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    NotStarted,
    Started,
    ProductAssigned,
    Authorised,
    Declined,
    Completed,
}

/// Transaction aggregate root.
///
/// Tracks a single device-submitted transaction from start through local
/// authorisation or decline to completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transaction {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    estate_id: Option<EstateId>,
    merchant_id: Option<MerchantId>,
    transaction_type: Option<TransactionType>,
    transaction_number: String,
    device_identifier: String,
    transaction_amount: Option<Money>,
    additional_request_data: Option<HashMap<String, String>>,
    contract_id: Option<ContractId>,
    product_id: Option<ProductId>,
    outcome: Option<TransactionOutcome>,
    completed: bool,
}

impl Aggregate for Transaction {
    type Event = TransactionEvent;
    type Error = TransactionError;

    fn aggregate_type() -> &'static str {
        "Transaction"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            TransactionEvent::TransactionHasStarted(data) => {
                self.id = Some(data.transaction_id);
                self.estate_id = Some(data.estate_id);
                self.merchant_id = Some(data.merchant_id);
                self.transaction_type = Some(data.transaction_type);
                self.transaction_number = data.transaction_number;
                self.device_identifier = data.device_identifier;
                self.transaction_amount = data.transaction_amount;
            }
            TransactionEvent::AdditionalRequestDataRecorded(data) => {
                self.additional_request_data = Some(data.fields);
            }
            TransactionEvent::ProductDetailsAdded(data) => {
                self.contract_id = Some(data.contract_id);
                self.product_id = Some(data.product_id);
            }
            TransactionEvent::TransactionHasBeenLocallyAuthorised(data) => {
                self.outcome = Some(TransactionOutcome::Authorised {
                    authorisation_code: data.authorisation_code,
                });
            }
            TransactionEvent::TransactionHasBeenLocallyDeclined(data) => {
                self.outcome = Some(TransactionOutcome::Declined {
                    response_code: data.response_code,
                });
            }
            TransactionEvent::TransactionHasBeenCompleted(_) => {
                self.completed = true;
            }
        }
    }
}

// Query methods
impl Transaction {
    /// Returns the estate the transaction belongs to.
    pub fn estate_id(&self) -> Option<EstateId> {
        self.estate_id
    }

    /// Returns the merchant the transaction was processed for.
    pub fn merchant_id(&self) -> Option<MerchantId> {
        self.merchant_id
    }

    /// Returns the transaction type.
    pub fn transaction_type(&self) -> Option<TransactionType> {
        self.transaction_type
    }

    /// Returns the sale amount, if any.
    pub fn transaction_amount(&self) -> Option<Money> {
        self.transaction_amount
    }

    /// Returns the attached contract product, if any.
    pub fn product(&self) -> Option<(ContractId, ProductId)> {
        self.contract_id.zip(self.product_id)
    }

    /// Returns the recorded additional request data, if any.
    pub fn additional_request_data(&self) -> Option<&HashMap<String, String>> {
        self.additional_request_data.as_ref()
    }

    /// Returns the authorisation/decline outcome, if resolved.
    pub fn outcome(&self) -> Option<&TransactionOutcome> {
        self.outcome.as_ref()
    }

    /// Returns the derived lifecycle state.
    pub fn state(&self) -> TransactionState {
        if self.id.is_none() {
            return TransactionState::NotStarted;
        }
        if self.completed {
            return TransactionState::Completed;
        }
        match self.outcome {
            Some(TransactionOutcome::Authorised { .. }) => TransactionState::Authorised,
            Some(TransactionOutcome::Declined { .. }) => TransactionState::Declined,
            None if self.product_id.is_some() => TransactionState::ProductAssigned,
            None => TransactionState::Started,
        }
    }
}

// Command methods (return events)
impl Transaction {
    /// Starts a new transaction.
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        &self,
        transaction_id: AggregateId,
        estate_id: EstateId,
        merchant_id: MerchantId,
        transaction_type: TransactionType,
        transaction_number: impl Into<String>,
        device_identifier: impl Into<String>,
        transaction_amount: Option<Money>,
    ) -> Result<Vec<TransactionEvent>, TransactionError> {
        if self.id.is_some() {
            return Err(TransactionError::AlreadyStarted);
        }

        let transaction_number = transaction_number.into();
        if transaction_number.is_empty() {
            return Err(TransactionError::InvalidField {
                field: "transaction_number",
                reason: "must not be empty",
            });
        }

        let device_identifier = device_identifier.into();
        if device_identifier.is_empty() {
            return Err(TransactionError::InvalidField {
                field: "device_identifier",
                reason: "must not be empty",
            });
        }

        match (transaction_type, transaction_amount) {
            (TransactionType::Sale, None) => {
                return Err(TransactionError::InvalidField {
                    field: "transaction_amount",
                    reason: "required for sale transactions",
                });
            }
            (TransactionType::Sale, Some(amount)) if !amount.is_positive() => {
                return Err(TransactionError::InvalidField {
                    field: "transaction_amount",
                    reason: "must be positive",
                });
            }
            _ => {}
        }

        Ok(vec![TransactionEvent::TransactionHasStarted(
            TransactionHasStartedData {
                transaction_id,
                estate_id,
                merchant_id,
                transaction_type,
                transaction_number,
                device_identifier,
                transaction_amount,
                started_at: Utc::now(),
            },
        )])
    }

    /// Records operator-specific request data against the allow-list.
    pub fn record_additional_request_data(
        &self,
        fields: HashMap<String, String>,
    ) -> Result<Vec<TransactionEvent>, TransactionError> {
        self.ensure_started_and_open()?;

        if self.additional_request_data.is_some() {
            return Err(TransactionError::AdditionalDataAlreadyRecorded);
        }

        validate_request_fields(&fields)?;

        Ok(vec![TransactionEvent::AdditionalRequestDataRecorded(
            AdditionalRequestDataRecordedData { fields },
        )])
    }

    /// Attaches the contract product being sold.
    pub fn add_product_details(
        &self,
        contract_id: ContractId,
        product_id: ProductId,
    ) -> Result<Vec<TransactionEvent>, TransactionError> {
        self.ensure_started_and_open()?;

        let transaction_type = self.transaction_type.ok_or(TransactionError::NotStarted)?;
        if transaction_type != TransactionType::Sale {
            return Err(TransactionError::ProductNotApplicable(transaction_type));
        }

        if self.product_id.is_some() {
            return Err(TransactionError::ProductAlreadyAssigned);
        }

        Ok(vec![TransactionEvent::ProductDetailsAdded(
            ProductDetailsAddedData {
                contract_id,
                product_id,
            },
        )])
    }

    /// Authorises the transaction locally.
    pub fn authorise_locally(
        &self,
        authorisation_code: impl Into<String>,
        response_code: impl Into<String>,
        response_message: impl Into<String>,
    ) -> Result<Vec<TransactionEvent>, TransactionError> {
        self.ensure_started_and_open()?;

        if self.outcome.is_some() {
            return Err(TransactionError::AlreadyResolved);
        }

        // A sale cannot authorise without knowing what is being sold
        if self.transaction_type == Some(TransactionType::Sale) && self.product_id.is_none() {
            return Err(TransactionError::ProductRequired);
        }

        Ok(vec![
            TransactionEvent::TransactionHasBeenLocallyAuthorised(
                TransactionLocallyAuthorisedData {
                    authorisation_code: authorisation_code.into(),
                    response_code: response_code.into(),
                    response_message: response_message.into(),
                },
            ),
        ])
    }

    /// Declines the transaction locally.
    pub fn decline_locally(
        &self,
        response_code: impl Into<String>,
        response_message: impl Into<String>,
    ) -> Result<Vec<TransactionEvent>, TransactionError> {
        self.ensure_started_and_open()?;

        if self.outcome.is_some() {
            return Err(TransactionError::AlreadyResolved);
        }

        Ok(vec![TransactionEvent::TransactionHasBeenLocallyDeclined(
            TransactionDeclinedData {
                response_code: response_code.into(),
                response_message: response_message.into(),
            },
        )])
    }

    /// Completes the transaction.
    pub fn complete(&self) -> Result<Vec<TransactionEvent>, TransactionError> {
        if self.id.is_none() {
            return Err(TransactionError::NotStarted);
        }
        if self.completed {
            return Err(TransactionError::AlreadyCompleted);
        }

        let (is_authorised, response_code) = match &self.outcome {
            Some(TransactionOutcome::Authorised { .. }) => (true, "0000".to_string()),
            Some(TransactionOutcome::Declined { response_code }) => {
                (false, response_code.clone())
            }
            None => return Err(TransactionError::NotResolved),
        };

        let estate_id = self.estate_id.ok_or(TransactionError::NotStarted)?;
        let merchant_id = self.merchant_id.ok_or(TransactionError::NotStarted)?;

        Ok(vec![TransactionEvent::TransactionHasBeenCompleted(
            TransactionCompletedData {
                estate_id,
                merchant_id,
                is_authorised,
                response_code,
                transaction_amount: self.transaction_amount,
                completed_at: Utc::now(),
            },
        )])
    }

    fn ensure_started_and_open(&self) -> Result<(), TransactionError> {
        if self.id.is_none() {
            return Err(TransactionError::NotStarted);
        }
        if self.completed {
            return Err(TransactionError::AlreadyCompleted);
        }
        Ok(())
    }
}
