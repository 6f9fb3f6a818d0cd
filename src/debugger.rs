use std::sync::atomic::{AtomicU8, Ordering};

/// How much structural tracing the index and the disk emit to stderr.
/// `Info` reports root changes and height transitions, `Debug` adds
/// splits and merges, `Trace` adds per-key and per-block events.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd)]
pub enum DebugLevel {
    Off = 0,
    Info = 1,
    Debug = 2,
    Trace = 3,
}

impl DebugLevel {
    /// Clamping parse for the CLI's `--debug=N` flag.
    pub fn from_u8(level: u8) -> Self {
        match level {
            0 => DebugLevel::Off,
            1 => DebugLevel::Info,
            2 => DebugLevel::Debug,
            _ => DebugLevel::Trace,
        }
    }
}

static DEBUG_LEVEL: AtomicU8 = AtomicU8::new(DebugLevel::Off as u8);

pub fn set_debug_level(level: DebugLevel) {
    DEBUG_LEVEL.store(level as u8, Ordering::Relaxed);
}

#[doc(hidden)]
pub fn enabled(level: DebugLevel) -> bool {
    level as u8 <= DEBUG_LEVEL.load(Ordering::Relaxed)
}

#[macro_export]
macro_rules! db_debug {
    ($lvl:expr, $($arg:tt)*) => {
        if $crate::debugger::enabled($lvl) {
            eprintln!($($arg)*);
        }
    };
}
