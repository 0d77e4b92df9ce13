pub mod add;
pub mod common;
pub mod conflicts;
pub mod delete;
pub mod edit;
pub mod list;
pub mod queue;
pub mod status;
pub mod sync;
pub mod watch;
