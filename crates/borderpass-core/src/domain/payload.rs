//! Typed form payloads, one per process kind.
//!
//! Payloads are set when a process is submitted and never touched by
//! reviewers. They are stored as JSON next to the process kind, so the
//! serialized form carries no tag of its own.

use serde::{Deserialize, Serialize};

use super::process::ProcessKind;
use crate::error::{BorderpassError, Result};

/// Form data attached to a process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FormPayload {
    MinorTravel(MinorTravelForm),
    VehicleAdmission(VehicleAdmissionForm),
    Declaration(DeclarationForm),
}

impl FormPayload {
    /// Decode a JSON payload as the form for `kind`.
    pub fn from_value(kind: ProcessKind, value: serde_json::Value) -> Result<Self> {
        let payload = match kind {
            ProcessKind::MinorTravel => Self::MinorTravel(decode(kind, value)?),
            ProcessKind::VehicleAdmission => Self::VehicleAdmission(decode(kind, value)?),
            ProcessKind::Declaration => Self::Declaration(decode(kind, value)?),
        };
        Ok(payload)
    }

    /// The process kind this form belongs to.
    pub fn kind(&self) -> ProcessKind {
        match self {
            Self::MinorTravel(_) => ProcessKind::MinorTravel,
            Self::VehicleAdmission(_) => ProcessKind::VehicleAdmission,
            Self::Declaration(_) => ProcessKind::Declaration,
        }
    }

    /// Check required fields and confirmations.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::MinorTravel(form) => form.validate(),
            Self::VehicleAdmission(form) => form.validate(),
            Self::Declaration(form) => form.validate(),
        }
    }

    /// Serialize to a JSON value for storage.
    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

fn decode<T: serde::de::DeserializeOwned>(kind: ProcessKind, value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| BorderpassError::Validation(format!("invalid {} form: {}", kind, e)))
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BorderpassError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn require_confirmed(field: &str, value: bool) -> Result<()> {
    if !value {
        return Err(BorderpassError::Validation(format!("{} must be confirmed", field)));
    }
    Ok(())
}

/// Authorization for a minor crossing with a guardian.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinorTravelForm {
    pub minor_name: String,
    /// National id or passport number.
    pub minor_document: String,
    pub minor_birth_date: String,
    pub minor_nationality: String,
    pub guardian_name: String,
    pub guardian_document: String,
    pub guardian_relation: String,
    pub guardian_phone: String,
    #[serde(default)]
    pub authorization_confirmed: bool,
}

impl MinorTravelForm {
    fn validate(&self) -> Result<()> {
        require("minor_name", &self.minor_name)?;
        require("minor_document", &self.minor_document)?;
        require("minor_birth_date", &self.minor_birth_date)?;
        require("minor_nationality", &self.minor_nationality)?;
        require("guardian_name", &self.guardian_name)?;
        require("guardian_document", &self.guardian_document)?;
        require("guardian_relation", &self.guardian_relation)?;
        require("guardian_phone", &self.guardian_phone)?;
        require_confirmed("authorization_confirmed", self.authorization_confirmed)
    }
}

/// Temporary admission of a vehicle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleAdmissionForm {
    pub plate: String,
    pub make: String,
    pub model: String,
    pub year: String,
    pub color: String,
    #[serde(default)]
    pub engine_number: Option<String>,
    pub owner_name: String,
    pub owner_document: String,
    pub owner_address: String,
    pub departure_date: String,
    #[serde(default)]
    pub return_date: Option<String>,
    pub travel_reason: String,
    #[serde(default)]
    pub documents_confirmed: bool,
}

impl VehicleAdmissionForm {
    fn validate(&self) -> Result<()> {
        require("plate", &self.plate)?;
        require("make", &self.make)?;
        require("model", &self.model)?;
        require("year", &self.year)?;
        require("color", &self.color)?;
        require("owner_name", &self.owner_name)?;
        require("owner_document", &self.owner_document)?;
        require("owner_address", &self.owner_address)?;
        require("departure_date", &self.departure_date)?;
        require("travel_reason", &self.travel_reason)?;
        require_confirmed("documents_confirmed", self.documents_confirmed)
    }
}

/// Sworn declaration of animal and plant products carried across.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclarationForm {
    pub food: FoodDeclaration,
    pub plants: PlantDeclaration,
    pub pets: Option<PetDeclaration>,
    pub truth_declared: bool,
}

impl DeclarationForm {
    fn validate(&self) -> Result<()> {
        if self.food.declares_any() {
            require("food.details", self.food.details.as_deref().unwrap_or_default())?;
        }
        if self.plants.declares_any() {
            require(
                "plants.details",
                self.plants.details.as_deref().unwrap_or_default(),
            )?;
        }
        if let Some(pets) = &self.pets {
            require("pets.kind", &pets.kind)?;
            if pets.quantity == 0 {
                return Err(BorderpassError::Validation(
                    "pets.quantity must be at least 1".into(),
                ));
            }
        }
        require_confirmed("truth_declared", self.truth_declared)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodDeclaration {
    pub fruits: bool,
    pub meat: bool,
    pub dairy: bool,
    pub processed: bool,
    pub details: Option<String>,
}

impl FoodDeclaration {
    fn declares_any(&self) -> bool {
        self.fruits || self.meat || self.dairy || self.processed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantDeclaration {
    pub seeds: bool,
    pub live: bool,
    pub wood: bool,
    pub herbs: bool,
    pub details: Option<String>,
}

impl PlantDeclaration {
    fn declares_any(&self) -> bool {
        self.seeds || self.live || self.wood || self.herbs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetDeclaration {
    pub kind: String,
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_declaration() {
        let payload = FormPayload::from_value(
            ProcessKind::Declaration,
            json!({
                "food": {"fruits": true, "details": "apples and oranges"},
                "truth_declared": true
            }),
        )
        .unwrap();

        assert_eq!(payload.kind(), ProcessKind::Declaration);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_declared_food_requires_details() {
        let payload = FormPayload::from_value(
            ProcessKind::Declaration,
            json!({"food": {"meat": true}, "truth_declared": true}),
        )
        .unwrap();

        let err = payload.validate().unwrap_err();
        assert!(err.to_string().contains("food.details"));
    }

    #[test]
    fn test_declaration_requires_sworn_statement() {
        let payload = FormPayload::Declaration(DeclarationForm::default());
        let err = payload.validate().unwrap_err();
        assert!(err.to_string().contains("truth_declared"));
    }

    #[test]
    fn test_minor_travel_missing_field() {
        let payload = FormPayload::from_value(
            ProcessKind::MinorTravel,
            json!({
                "minor_name": "Ana",
                "minor_document": "P123",
                "minor_birth_date": "2015-04-01",
                "minor_nationality": "CL",
                "guardian_name": "  ",
                "guardian_document": "P456",
                "guardian_relation": "aunt",
                "guardian_phone": "+56 9 1234 5678",
                "authorization_confirmed": true
            }),
        )
        .unwrap();

        let err = payload.validate().unwrap_err();
        assert!(err.to_string().contains("guardian_name"));
    }

    #[test]
    fn test_vehicle_requires_confirmation() {
        let form = VehicleAdmissionForm {
            plate: "AB1234".into(),
            make: "Toyota".into(),
            model: "Corolla".into(),
            year: "2020".into(),
            color: "white".into(),
            owner_name: "Juan Perez".into(),
            owner_document: "98765432-1".into(),
            owner_address: "Av. Siempre Viva 123".into(),
            departure_date: "2024-11-20".into(),
            travel_reason: "tourism".into(),
            ..Default::default()
        };

        let err = FormPayload::VehicleAdmission(form.clone())
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("documents_confirmed"));

        let confirmed = VehicleAdmissionForm {
            documents_confirmed: true,
            ..form
        };
        assert!(FormPayload::VehicleAdmission(confirmed).validate().is_ok());
    }

    #[test]
    fn test_malformed_json_is_validation_error() {
        let result = FormPayload::from_value(ProcessKind::VehicleAdmission, json!({"plate": 7}));
        assert!(matches!(result, Err(BorderpassError::Validation(_))));
    }

    #[test]
    fn test_to_value_has_no_tag() {
        let payload = FormPayload::Declaration(DeclarationForm {
            truth_declared: true,
            ..Default::default()
        });
        let value = payload.to_value().unwrap();
        assert_eq!(value["truth_declared"], json!(true));
        assert!(value.get("kind").is_none());

        let back = FormPayload::from_value(ProcessKind::Declaration, value).unwrap();
        assert_eq!(back, payload);
    }
}
