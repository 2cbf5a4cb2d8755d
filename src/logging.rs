//! Console Logging
//!
//! Routes the `log` facade to the browser console via `console_log`.
//! Messages carry a bracketed component prefix such as `[CACHE]` or `[MERGE]`.

use log::Level;

/// Most verbose level forwarded to the console
pub fn max_level() -> Level {
    if cfg!(debug_assertions) {
        Level::Debug
    } else {
        Level::Info
    }
}

/// Install the console logger. A second call is a no-op.
pub fn init() {
    if console_log::init_with_level(max_level()).is_err() {
        log::debug!("[APP] logger already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_level_matches_build() {
        let expected = if cfg!(debug_assertions) { Level::Debug } else { Level::Info };
        assert_eq!(max_level(), expected);
        assert!(max_level() >= Level::Info);
    }
}
