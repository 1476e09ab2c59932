//! # OPD Core
//!
//! Core business logic for the outpatient-department encounter system.
//!
//! The centrepiece is the consultation-completion workflow: one call that
//! reconciles the Patient, Visit, Prescription and Bill aggregates for an
//! encounter atomically, with reuse-or-create semantics for same-day visits
//! and retry on transient storage failures.
//!
//! **No API concerns**: HTTP servers, authentication and request transports
//! live in the binaries; this crate only takes a [`ConsultationRequest`] and
//! an [`EncounterStore`] and returns a [`ConsultationResult`].

pub mod actor;
pub mod config;
pub mod entities;
pub mod error;
pub mod seed;
pub mod store;
pub mod workflow;

mod keylock;
mod retry;

pub use actor::Actor;
pub use config::{config_from_env_values, CoreConfig};
pub use error::{OpdError, OpdResult};
pub use seed::SeedData;
pub use store::memory::MemoryStore;
pub use store::{EncounterStore, StoreTx};
pub use workflow::{CompletionWorkflow, ConsultationRequest, ConsultationResult};
