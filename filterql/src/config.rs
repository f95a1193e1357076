use log::warn;
use std::env;
use std::time::Duration;

/// Default maximum single-request result window before scrolling kicks in.
pub const DEFAULT_MAX_RESULT_WINDOW: u64 = 10_000;

/// Default scroll cursor keep-alive.
pub const DEFAULT_SCROLL_KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Tuning knobs for retrieval and aggregation compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalConfig {
    /// `page_no * page_size` above this forces scroll mode.
    pub max_result_window: u64,
    /// Keep-alive passed on every scroll round trip.
    pub scroll_keep_alive: Duration,
    /// Bucket cap for terms aggregations; `None` keeps the engine default.
    pub terms_bucket_cap: Option<u32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_result_window: DEFAULT_MAX_RESULT_WINDOW,
            scroll_keep_alive: DEFAULT_SCROLL_KEEP_ALIVE,
            terms_bucket_cap: None,
        }
    }
}

impl RetrievalConfig {
    /// Defaults with environment overrides, in the same spirit as the rest
    /// of the deployment configuration:
    /// `FILTERQL_MAX_RESULT_WINDOW`, `FILTERQL_SCROLL_KEEP_ALIVE_SECS`,
    /// `FILTERQL_TERMS_BUCKET_CAP`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(window) = env_u64("FILTERQL_MAX_RESULT_WINDOW") {
            config.max_result_window = window;
        }
        if let Some(secs) = env_u64("FILTERQL_SCROLL_KEEP_ALIVE_SECS") {
            config.scroll_keep_alive = Duration::from_secs(secs);
        }
        if let Some(cap) = env_u64("FILTERQL_TERMS_BUCKET_CAP") {
            config.terms_bucket_cap = u32::try_from(cap).ok();
        }
        config
    }
}

fn env_u64(name: &str) -> Option<u64> {
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring non-numeric {}={}", name, raw);
            None
        }
    }
}
