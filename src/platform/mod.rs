//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time for frame timestamps
//! - Logger setup
//! - Key/value storage (LocalStorage on web, in-memory on native)
//! - Calendar date for the daily play gate

use chrono::NaiveDate;

/// Source of host wall-clock timestamps (ms)
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Real time: `performance.now()` in the browser, `Instant` on native
#[derive(Debug, Clone)]
pub struct SystemClock {
    #[cfg(not(target_arch = "wasm32"))]
    origin: std::time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            origin: std::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> u64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now) as u64
    }
}

/// Hand-driven clock for headless runs and tests
#[derive(Debug, Default)]
pub struct ManualClock {
    now: std::cell::Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: std::cell::Cell::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) -> u64 {
        let now = self.now.get() + ms;
        self.now.set(now);
        now
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Install the logger for this target. Safe to call more than once.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).try_init();
}

#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Local calendar date
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Milliseconds since the Unix epoch
pub fn unix_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Key/value storage for small JSON blobs
pub mod storage {
    #[cfg(target_arch = "wasm32")]
    fn local_storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }

    #[cfg(target_arch = "wasm32")]
    pub fn get(key: &str) -> Option<String> {
        local_storage()?.get_item(key).ok().flatten()
    }

    #[cfg(target_arch = "wasm32")]
    pub fn set(key: &str, value: &str) -> bool {
        local_storage().is_some_and(|s| s.set_item(key, value).is_ok())
    }

    #[cfg(not(target_arch = "wasm32"))]
    thread_local! {
        static MEMORY: std::cell::RefCell<std::collections::HashMap<String, String>> =
            std::cell::RefCell::new(std::collections::HashMap::new());
    }

    // Native has no LocalStorage; values live for the life of the thread
    #[cfg(not(target_arch = "wasm32"))]
    pub fn get(key: &str) -> Option<String> {
        MEMORY.with(|m| m.borrow().get(key).cloned())
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn set(key: &str, value: &str) -> bool {
        MEMORY.with(|m| m.borrow_mut().insert(key.to_string(), value.to_string()));
        true
    }
}
