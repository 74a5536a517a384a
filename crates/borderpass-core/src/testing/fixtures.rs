//! Ready-made valid forms and profiles for tests.

use crate::domain::{
    DeclarationForm, FoodDeclaration, FormPayload, MinorTravelForm, UserProfile,
    VehicleAdmissionForm,
};

/// A sworn declaration carrying fruit.
pub fn declaration_form() -> FormPayload {
    FormPayload::Declaration(DeclarationForm {
        food: FoodDeclaration {
            fruits: true,
            details: Some("two apples".into()),
            ..Default::default()
        },
        truth_declared: true,
        ..Default::default()
    })
}

pub fn vehicle_form() -> FormPayload {
    FormPayload::VehicleAdmission(VehicleAdmissionForm {
        plate: "AB1234".into(),
        make: "Toyota".into(),
        model: "Hilux".into(),
        year: "2021".into(),
        color: "white".into(),
        engine_number: None,
        owner_name: "Juan Perez".into(),
        owner_document: "12345678-9".into(),
        owner_address: "Calle Falsa 123".into(),
        departure_date: "2024-11-20".into(),
        return_date: Some("2024-11-27".into()),
        travel_reason: "tourism".into(),
        documents_confirmed: true,
    })
}

pub fn minor_travel_form() -> FormPayload {
    FormPayload::MinorTravel(MinorTravelForm {
        minor_name: "Ana Perez".into(),
        minor_document: "23456789-0".into(),
        minor_birth_date: "2015-04-01".into(),
        minor_nationality: "CL".into(),
        guardian_name: "Juan Perez".into(),
        guardian_document: "12345678-9".into(),
        guardian_relation: "father".into(),
        guardian_phone: "+56 9 1234 5678".into(),
        authorization_confirmed: true,
    })
}

pub fn profile(name: &str) -> UserProfile {
    UserProfile {
        name: name.into(),
        ..Default::default()
    }
}
