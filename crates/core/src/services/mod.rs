//! Business logic services.

#![allow(missing_docs)]

pub mod capacity;
pub mod eligibility;
pub mod event;
pub mod event_lock;
pub mod export;
pub mod notification;
pub mod pairing;
pub mod phase_scheduler;
pub mod presentation;
pub mod registration;
pub mod user;
pub mod voting;
pub mod waitlist;

pub use capacity::CapacitySnapshot;
pub use eligibility::{EligibilityCheck, ProfileEligibility};
pub use event::{CreateEventInput, EventService};
pub use event_lock::{EventLockGuard, EventLockRegistry};
pub use export::ExportService;
pub use notification::NotificationService;
pub use pairing::{
    GreedyRoundRobin, PairingService, PairingStrategy, PlannedPair, ScoredPair,
};
pub use phase_scheduler::PhaseScheduler;
pub use presentation::PresentationService;
pub use registration::RegistrationService;
pub use user::{CreateUserInput, UserService};
pub use voting::{CreateOptionInput, OptionTally, VotingService};
