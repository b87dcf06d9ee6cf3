// Logging setup: wasm-logger in the browser, env_logger natively.
// See DESIGN.md: Logging

use std::sync::Once;

use log::LevelFilter;

static INSTALL: Once = Once::new();

/// Install the backend once; every call sets the active level.
/// The backend itself accepts everything, `log::max_level` does the filtering.
pub fn init_logging(level: LevelFilter) {
    INSTALL.call_once(install);
    log::set_max_level(level);
}

#[cfg(target_arch = "wasm32")]
fn install() {
    wasm_logger::init(wasm_logger::Config::new(log::Level::Trace).module_prefix("landing_core"));
}

#[cfg(not(target_arch = "wasm32"))]
fn install() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace"))
        .is_test(cfg!(test))
        .try_init();
}
