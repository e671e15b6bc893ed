/*!
Diagnostic output from the library.

Everything the library reports goes out through [`tracing`], so installing any
subscriber is enough to see it. Programs that don't use `tracing` can instead
hook a plain callback with [`set_log_method`], which receives the same events
along with a numeric [`LogLevel`]:

```no_run
use crazyradio::log::{LogLevel, set_log_method};

set_log_method(|level, msg| {
    if level <= LogLevel::Info {
        eprintln!("[{level}] {msg}");
    }
});
```

*/
use std::fmt;
use std::sync::{Arc, RwLock};

/// Severity of a log message, most severe first.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// The library can't continue.
    Fatal = 0,
    /// An operation failed.
    Error = 1,
    /// Something unexpected, but the operation went ahead.
    Warn = 2,
    /// General progress information.
    Info = 3,
    /// Per-call tracing of USB requests.
    Debug = 4,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal => f.write_str("FATAL"),
            Self::Error => f.write_str("ERROR"),
            Self::Warn => f.write_str("WARN"),
            Self::Info => f.write_str("INFO"),
            Self::Debug => f.write_str("DEBUG"),
        }
    }
}

type LogMethod = Arc<dyn Fn(LogLevel, &fmt::Arguments<'_>) + Send + Sync>;

static LOG_METHOD: RwLock<Option<LogMethod>> = RwLock::new(None);

/// Install a process-wide callback that receives every library log message.
///
/// Replaces any callback installed before.
pub fn set_log_method<F>(method: F)
where
    F: Fn(LogLevel, &fmt::Arguments<'_>) + Send + Sync + 'static,
{
    let method: LogMethod = Arc::new(method);
    match LOG_METHOD.write() {
        Ok(mut guard) => *guard = Some(method),
        Err(poisoned) => *poisoned.into_inner() = Some(method),
    }
    crate::radio_debug!("set crazyradio log function");
}

/// Remove the callback installed with [`set_log_method`].
pub fn clear_log_method() {
    match LOG_METHOD.write() {
        Ok(mut guard) => *guard = None,
        Err(poisoned) => *poisoned.into_inner() = None,
    }
}

#[doc(hidden)]
pub fn emit(level: LogLevel, args: fmt::Arguments<'_>) {
    // Clone out of the lock so the callback may itself log or swap the method.
    let method = match LOG_METHOD.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    if let Some(method) = method {
        method(level, &args);
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! radio_log {
    ($level:ident, $tlevel:ident, $($arg:tt)+) => {{
        ::tracing::$tlevel!($($arg)+);
        $crate::log::emit($crate::log::LogLevel::$level, format_args!($($arg)+));
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! radio_debug {
    ($($arg:tt)+) => { $crate::radio_log!(Debug, debug, $($arg)+) };
}

#[doc(hidden)]
#[macro_export]
macro_rules! radio_info {
    ($($arg:tt)+) => { $crate::radio_log!(Info, info, $($arg)+) };
}

#[doc(hidden)]
#[macro_export]
macro_rules! radio_warn {
    ($($arg:tt)+) => { $crate::radio_log!(Warn, warn, $($arg)+) };
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn level_order() {
        assert!(LogLevel::Fatal < LogLevel::Error);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert_eq!(LogLevel::Debug as u8, 4);
        assert_eq!(LogLevel::Warn.to_string(), "WARN");
    }

    #[test]
    fn callback_receives_messages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        set_log_method(move |level, msg| {
            sink.lock().unwrap().push((level, msg.to_string()));
        });
        crate::radio_debug!("Setting channel to {:02x}", 100);
        crate::radio_warn!("odd reply");
        clear_log_method();
        crate::radio_debug!("not captured");

        let seen = seen.lock().unwrap();
        assert!(seen.contains(&(LogLevel::Debug, String::from("set crazyradio log function"))));
        assert!(seen.contains(&(LogLevel::Debug, String::from("Setting channel to 64"))));
        assert!(seen.contains(&(LogLevel::Warn, String::from("odd reply"))));
        assert!(!seen.iter().any(|(_, m)| m == "not captured"));
    }
}
