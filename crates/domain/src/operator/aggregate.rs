//! Operator aggregate implementation.

use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::values::{EstateId, OperatorId};

use super::{
    OperatorError,
    events::{OperatorCreatedData, OperatorEvent},
};

/// Operator aggregate root: a product supplier merchants transact with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operator {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    estate_id: Option<EstateId>,
    name: String,
    require_custom_merchant_number: bool,
    require_custom_terminal_number: bool,
}

impl Aggregate for Operator {
    type Event = OperatorEvent;
    type Error = OperatorError;

    fn aggregate_type() -> &'static str {
        "Operator"
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
            OperatorEvent::OperatorCreated(data) => {
                self.id = Some(AggregateId::from_uuid(data.operator_id.as_uuid()));
                self.estate_id = Some(data.estate_id);
                self.name = data.name;
                self.require_custom_merchant_number = data.require_custom_merchant_number;
                self.require_custom_terminal_number = data.require_custom_terminal_number;
            }
        }
    }
}

impl Operator {
    /// Returns the operator's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether devices must supply a custom merchant number.
    pub fn require_custom_merchant_number(&self) -> bool {
        self.require_custom_merchant_number
    }

    /// Returns whether devices must supply a custom terminal number.
    pub fn require_custom_terminal_number(&self) -> bool {
        self.require_custom_terminal_number
    }

    /// Creates the operator.
    pub fn create(
        &self,
        operator_id: OperatorId,
        estate_id: EstateId,
        name: impl Into<String>,
        require_custom_merchant_number: bool,
        require_custom_terminal_number: bool,
    ) -> Result<Vec<OperatorEvent>, OperatorError> {
        if self.id.is_some() {
            return Err(OperatorError::AlreadyCreated);
        }

        let name = name.into();
        if name.is_empty() {
            return Err(OperatorError::NameRequired);
        }

        Ok(vec![OperatorEvent::OperatorCreated(OperatorCreatedData {
            operator_id,
            estate_id,
            name,
            require_custom_merchant_number,
            require_custom_terminal_number,
        })])
    }
}
