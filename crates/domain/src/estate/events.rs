//! Estate domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::values::{EstateId, OperatorId};

/// Events that can occur on an estate aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EstateEvent {
    /// The estate was created.
    EstateCreated(EstateCreatedData),

    /// An operator was made available to the estate's merchants.
    OperatorAddedToEstate(OperatorAddedToEstateData),
}

impl DomainEvent for EstateEvent {
    fn event_type(&self) -> &'static str {
        match self {
            EstateEvent::EstateCreated(_) => "EstateCreated",
            EstateEvent::OperatorAddedToEstate(_) => "OperatorAddedToEstate",
        }
    }
}

/// Data for EstateCreated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstateCreatedData {
    /// The estate identity.
    pub estate_id: EstateId,

    /// Display name.
    pub estate_name: String,

    /// When the estate was created.
    pub created_at: DateTime<Utc>,
}

/// Data for OperatorAddedToEstate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorAddedToEstateData {
    /// The estate the operator was added to.
    pub estate_id: EstateId,

    /// The operator made available.
    pub operator_id: OperatorId,
}
