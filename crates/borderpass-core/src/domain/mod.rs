mod activity;
mod notification;
mod payload;
mod process;
mod stats;
mod user;

pub use activity::{ActivityAction, ActivityLogEntry, NewActivity};
pub use notification::{NewNotification, Notification, Severity};
pub use payload::{
    DeclarationForm, FoodDeclaration, FormPayload, MinorTravelForm, PetDeclaration,
    PlantDeclaration, VehicleAdmissionForm,
};
pub use process::{
    AgricultureReview, AgricultureStatus, FinalStatus, IdentityReview, IdentityStatus,
    NewProcess, OverallStatus, Process, ProcessKind, ProcessUpdate, Review,
};
pub use stats::ProcessStats;
pub use user::{NewUser, User, UserProfile};
