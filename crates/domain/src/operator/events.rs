//! Operator domain events.

use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::values::{EstateId, OperatorId};

/// Events that can occur on an operator aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OperatorEvent {
    /// The operator was created.
    OperatorCreated(OperatorCreatedData),
}

impl DomainEvent for OperatorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OperatorEvent::OperatorCreated(_) => "OperatorCreated",
        }
    }
}

/// Data for OperatorCreated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorCreatedData {
    /// The operator identity.
    pub operator_id: OperatorId,

    /// Estate the operator was registered under.
    pub estate_id: EstateId,

    /// Display name (e.g. "Safaricom").
    pub name: String,

    /// Whether devices must supply an operator-specific merchant number.
    pub require_custom_merchant_number: bool,

    /// Whether devices must supply an operator-specific terminal number.
    pub require_custom_terminal_number: bool,
}
