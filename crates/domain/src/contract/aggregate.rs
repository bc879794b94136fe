//! Contract aggregate implementation.

use common::AggregateId;
use event_store::Version;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::fees::{CalculationType, FeeToCalculate, FeeType};
use crate::values::{ContractId, EstateId, FeeId, Money, OperatorId, ProductId};

use super::{
    ContractError,
    events::{
        ContractCreatedData, ContractEvent, ContractProductAddedData, TransactionFeeAddedData,
    },
};

/// A product sellable under a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractProduct {
    /// The product identity.
    pub product_id: ProductId,

    /// Product name.
    pub product_name: String,

    /// Text shown on the device.
    pub display_text: String,

    /// Fixed sale value; `None` for variable-value products.
    pub value: Option<Money>,
}

/// A transaction fee configured for a contract product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractFee {
    /// The configured fee identity.
    pub fee_id: FeeId,

    /// Product the fee applies to.
    pub product_id: ProductId,

    /// Human-readable description.
    pub description: String,

    /// How the fee value is interpreted.
    pub calculation_type: CalculationType,

    /// Who the fee applies to.
    pub fee_type: FeeType,

    /// The configured fee value.
    pub value: Decimal,
}

/// Contract aggregate root: the product and fee schedule agreed between an
/// estate and an operator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contract {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    estate_id: Option<EstateId>,
    operator_id: Option<OperatorId>,
    description: String,
    products: Vec<ContractProduct>,
    fees: Vec<ContractFee>,
}

impl Aggregate for Contract {
    type Event = ContractEvent;
    type Error = ContractError;

    fn aggregate_type() -> &'static str {
        "Contract"
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
            ContractEvent::ContractCreated(data) => {
                self.id = Some(AggregateId::from_uuid(data.contract_id.as_uuid()));
                self.estate_id = Some(data.estate_id);
                self.operator_id = Some(data.operator_id);
                self.description = data.description;
            }
            ContractEvent::ContractProductAdded(data) => {
                self.products.push(ContractProduct {
                    product_id: data.product_id,
                    product_name: data.product_name,
                    display_text: data.display_text,
                    value: data.value,
                });
            }
            ContractEvent::TransactionFeeAdded(data) => {
                self.fees.push(ContractFee {
                    fee_id: data.fee_id,
                    product_id: data.product_id,
                    description: data.description,
                    calculation_type: data.calculation_type,
                    fee_type: data.fee_type,
                    value: data.value,
                });
            }
        }
    }
}

// Query methods
impl Contract {
    /// Returns the operator supplying the products.
    pub fn operator_id(&self) -> Option<OperatorId> {
        self.operator_id
    }

    /// Returns the contract description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the products sellable under this contract.
    pub fn products(&self) -> &[ContractProduct] {
        &self.products
    }

    /// Returns all configured fees.
    pub fn fees(&self) -> &[ContractFee] {
        &self.fees
    }

    /// Returns the fee schedule for a product, ready for calculation.
    pub fn transaction_fees_for_product(&self, product_id: ProductId) -> Vec<FeeToCalculate> {
        self.fees
            .iter()
            .filter(|fee| fee.product_id == product_id)
            .map(|fee| FeeToCalculate {
                fee_id: fee.fee_id,
                calculation_type: fee.calculation_type,
                fee_type: fee.fee_type,
                value: fee.value,
            })
            .collect()
    }
}

// Command methods (return events)
impl Contract {
    /// Creates the contract.
    pub fn create(
        &self,
        contract_id: ContractId,
        estate_id: EstateId,
        operator_id: OperatorId,
        description: impl Into<String>,
    ) -> Result<Vec<ContractEvent>, ContractError> {
        if self.id.is_some() {
            return Err(ContractError::AlreadyCreated);
        }

        let description = description.into();
        if description.is_empty() {
            return Err(ContractError::DescriptionRequired);
        }

        Ok(vec![ContractEvent::ContractCreated(ContractCreatedData {
            contract_id,
            estate_id,
            operator_id,
            description,
        })])
    }

    /// Adds a product to the contract.
    ///
    /// `value` is the fixed sale price; pass `None` for variable-value
    /// products whose amount is chosen at sale time.
    pub fn add_product(
        &self,
        product_id: ProductId,
        product_name: impl Into<String>,
        display_text: impl Into<String>,
        value: Option<Money>,
    ) -> Result<Vec<ContractEvent>, ContractError> {
        self.require_created()?;

        let product_name = product_name.into();
        if product_name.is_empty() {
            return Err(ContractError::ProductNameRequired);
        }

        if let Some(value) = value
            && !value.is_positive()
        {
            return Err(ContractError::InvalidProductValue);
        }

        if self.products.iter().any(|p| p.product_name == product_name) {
            return Err(ContractError::DuplicateProduct(product_name));
        }

        Ok(vec![ContractEvent::ContractProductAdded(
            ContractProductAddedData {
                product_id,
                product_name,
                display_text: display_text.into(),
                value,
            },
        )])
    }

    /// Configures a transaction fee for an existing contract product.
    pub fn add_transaction_fee(
        &self,
        fee_id: FeeId,
        product_id: ProductId,
        description: impl Into<String>,
        calculation_type: CalculationType,
        fee_type: FeeType,
        value: Decimal,
    ) -> Result<Vec<ContractEvent>, ContractError> {
        self.require_created()?;

        if !self.products.iter().any(|p| p.product_id == product_id) {
            return Err(ContractError::ProductNotFound(product_id));
        }

        if value <= Decimal::ZERO {
            return Err(ContractError::InvalidFeeValue);
        }

        Ok(vec![ContractEvent::TransactionFeeAdded(
            TransactionFeeAddedData {
                fee_id,
                product_id,
                description: description.into(),
                calculation_type,
                fee_type,
                value,
            },
        )])
    }

    fn require_created(&self) -> Result<(), ContractError> {
        if self.id.is_none() {
            return Err(ContractError::NotCreated);
        }
        Ok(())
    }
}
