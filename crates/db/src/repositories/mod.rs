//! Database repositories.

#![allow(missing_docs)]

pub mod event;
pub mod notification;
pub mod pair;
pub mod presentation;
pub mod registration;
pub mod user;
pub mod voting;

pub use event::EventRepository;
pub use notification::NotificationRepository;
pub use pair::PairRepository;
pub use presentation::{PresentationSlotRepository, RatingRepository};
pub use registration::RegistrationRepository;
pub use user::UserRepository;
pub use voting::{ActivityOptionRepository, ActivityVoteRepository, VotingSessionRepository};
