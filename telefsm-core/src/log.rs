//! Per-instance leveled logging.
//!
//! `tracing` wants a constant level at every call site, while instances pick
//! their verbosity at runtime. `inst_log!` fans out to the five constant
//! levels and tags each record with the subsystem and instance name.

macro_rules! inst_log {
    ($level:expr, $subsys:expr, $fsm:expr, $($arg:tt)+) => {{
        let level: ::tracing::Level = $level;
        if level == ::tracing::Level::ERROR {
            ::tracing::error!(subsys = $subsys, fsm = %$fsm, $($arg)+);
        } else if level == ::tracing::Level::WARN {
            ::tracing::warn!(subsys = $subsys, fsm = %$fsm, $($arg)+);
        } else if level == ::tracing::Level::INFO {
            ::tracing::info!(subsys = $subsys, fsm = %$fsm, $($arg)+);
        } else if level == ::tracing::Level::DEBUG {
            ::tracing::debug!(subsys = $subsys, fsm = %$fsm, $($arg)+);
        } else {
            ::tracing::trace!(subsys = $subsys, fsm = %$fsm, $($arg)+);
        }
    }};
}

pub(crate) use inst_log;
