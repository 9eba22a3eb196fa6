//! Volunteer Hub: a volunteer-event management backend.
//!
//! Volunteers browse a public event catalog and register for events; once an
//! event is full, further registrations land on the waitlist. Admins create
//! events, review attendees, upload certificates and manage roles. An
//! optional Anthropic-backed engine suggests events that fit a volunteer's
//! skills and interests.
//!
//! # Architecture
//!
//! ```text
//!   HTTP (axum)          api/*  ──►  app services  ──►  DocumentStore
//!        │                               │                  ▲
//!   correlation id,                      ▼                  │
//!   trace span               RegistrationHandler ───────────┘
//!                            (transaction + retry)
//! ```
//!
//! The registration transaction reads the user and the event, decides
//! `registered` or `waitlisted`, and writes the registration, the user's
//! registered set and the participant count together. Lost races are retried
//! with backoff, so N concurrent registrations against C free seats yield
//! exactly C registered volunteers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod app;
pub mod config;
pub mod server;
pub mod suggestions;

pub use app::{StartupError, VolunteerHubApp};
pub use config::Config;
pub use server::{AppState, build_router};
pub use suggestions::AnthropicSuggestionEngine;
