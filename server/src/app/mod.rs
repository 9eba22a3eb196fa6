//! Application layer.
//!
//! - [`VolunteerHubApp`] connects the store, installs metrics and wires the
//!   services into the HTTP state
//! - The services hold the operations behind every endpoint

mod coordinator;
mod services;

pub use coordinator::{StartupError, VolunteerHubApp};
pub use services::{
    AttendanceService, EventService, PERMISSION_DENIED, ProfileService, ProfileView,
    ServiceError, SuggestionService,
};
