//! Data models for Tally

mod amount;
mod category;
mod conflict;
mod id;
mod mutation;
mod record;

pub use category::Category;
pub use conflict::{conflict_id, ConflictRecord, Resolution};
pub use id::EntityId;
pub use mutation::{EntityKind, Mutation, MutationEntry, OpKind};
pub use record::{Record, RecordKind};
