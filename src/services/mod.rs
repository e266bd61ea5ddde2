//! Service layer for Cargomail.
//!
//! Contains the contact change-log rules and the services built on them:
//! - Status (contact status state machine)
//! - Policy (which sequences a mutation advances)
//! - Sequencer (per-user counters and write scopes)
//! - Contacts (mutations and incremental sync reads)
//! - Users (provisioning)
//! - Mail (capabilities consumed by the mail transport)

mod contacts;
pub mod mail;
pub mod policy;
pub mod sequencer;
pub mod status;
mod users;

pub use contacts::ContactService;
pub use mail::{AuthHandler, MailHandler, MailIngest};
pub use policy::{ChangeLogEffect, ChangeLogPolicy, MutationKind};
pub use sequencer::{Allocation, SequenceAllocator, UserWriteScope};
pub use status::StatusStateMachine;
pub use users::UserService;
