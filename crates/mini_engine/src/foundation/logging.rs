//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging for tests; repeated calls are ignored
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
