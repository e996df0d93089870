//! Platform abstraction
//!
//! Handles browser/native differences for logging setup. Storage lives in
//! `persistence`; everything else in the crate is platform-independent.

/// Initialize logging for the current platform. Call once at startup.
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Initialize logging for the current platform. Call once at startup.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
