//! HTTP collaborators: the Membership Store and the confirmation notifier.

pub mod notifier;
pub mod store;

pub use notifier::{EmailJsNotifier, Notifier};
pub use store::{MembershipStore, SheetClient};
