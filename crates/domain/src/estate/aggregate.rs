//! Estate aggregate implementation.

use chrono::Utc;
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::values::{EstateId, OperatorId};

use super::{
    EstateError,
    events::{EstateCreatedData, EstateEvent, OperatorAddedToEstateData},
};

/// Estate aggregate root: the top-level tenant merchants live under.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Estate {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    estate_name: String,
    operators: Vec<OperatorId>,
}

impl Aggregate for Estate {
    type Event = EstateEvent;
    type Error = EstateError;

    fn aggregate_type() -> &'static str {
        "Estate"
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
            EstateEvent::EstateCreated(data) => {
                self.id = Some(AggregateId::from_uuid(data.estate_id.as_uuid()));
                self.estate_name = data.estate_name;
            }
            EstateEvent::OperatorAddedToEstate(data) => {
                self.operators.push(data.operator_id);
            }
        }
    }
}

// Query methods
impl Estate {
    /// Returns the estate's display name.
    pub fn estate_name(&self) -> &str {
        &self.estate_name
    }

    /// Returns the operators available to this estate.
    pub fn operators(&self) -> &[OperatorId] {
        &self.operators
    }
}

// Command methods (return events)
impl Estate {
    /// Creates the estate.
    pub fn create(
        &self,
        estate_id: EstateId,
        estate_name: impl Into<String>,
    ) -> Result<Vec<EstateEvent>, EstateError> {
        if self.id.is_some() {
            return Err(EstateError::AlreadyCreated);
        }

        let estate_name = estate_name.into();
        if estate_name.is_empty() {
            return Err(EstateError::NameRequired);
        }

        Ok(vec![EstateEvent::EstateCreated(EstateCreatedData {
            estate_id,
            estate_name,
            created_at: Utc::now(),
        })])
    }

    /// Makes an operator available to the estate's merchants.
    pub fn add_operator(&self, operator_id: OperatorId) -> Result<Vec<EstateEvent>, EstateError> {
        let estate_id = match self.id {
            Some(id) => EstateId::from_uuid(id.as_uuid()),
            None => return Err(EstateError::NotCreated),
        };

        if self.operators.contains(&operator_id) {
            return Err(EstateError::OperatorAlreadyAdded(operator_id));
        }

        Ok(vec![EstateEvent::OperatorAddedToEstate(
            OperatorAddedToEstateData {
                estate_id,
                operator_id,
            },
        )])
    }
}
