mod boundaries;
mod engine;
mod session;

pub use boundaries::ShiftBoundaries;
pub use engine::{Phase, ShiftTimer, Snapshot, Status, BREAK_PROMPT_SECS, END_SOON_SECS};
pub use session::Session;
