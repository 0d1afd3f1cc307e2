pub mod session;

pub use session::{SessionRecord, SessionStats};
