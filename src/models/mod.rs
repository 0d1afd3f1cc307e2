pub mod session_config;

pub use session_config::{
    SessionConfig, MAX_DURATION_MINUTES, MAX_STRICTNESS, MIN_DURATION_MINUTES,
};
