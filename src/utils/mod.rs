//! Utilities - terminal styling, progress indicators and logging setup

pub mod logging;
pub mod progress;
pub mod styling;

pub use logging::init_logging;
pub use progress::*;
pub use styling::*;
