//! Database entities.

#![allow(missing_docs)]

pub mod activity_option;
pub mod activity_vote;
pub mod event;
pub mod notification;
pub mod pair;
pub mod presentation_slot;
pub mod rating;
pub mod registration;
pub mod user;
pub mod voting_session;

pub use activity_option::Entity as ActivityOption;
pub use activity_vote::Entity as ActivityVote;
pub use event::Entity as Event;
pub use notification::Entity as Notification;
pub use pair::Entity as Pair;
pub use presentation_slot::Entity as PresentationSlot;
pub use rating::Entity as Rating;
pub use registration::Entity as Registration;
pub use user::Entity as User;
pub use voting_session::Entity as VotingSession;
