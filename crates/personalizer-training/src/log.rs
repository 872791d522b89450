//! Logging-Shim: mit dem Feature `telemetry` über `tracing`, sonst `eprintln!`.

#[cfg(feature = "telemetry")]
macro_rules! warn_event {
    ($($arg:tt)*) => { ::tracing::warn!($($arg)*) };
}

#[cfg(not(feature = "telemetry"))]
macro_rules! warn_event {
    ($($arg:tt)*) => { eprintln!("warning: {}", format_args!($($arg)*)) };
}

#[cfg(feature = "telemetry")]
macro_rules! debug_event {
    ($($arg:tt)*) => { ::tracing::debug!($($arg)*) };
}

// Ohne Telemetrie bleiben Debug-Meldungen stumm.
#[cfg(not(feature = "telemetry"))]
macro_rules! debug_event {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

pub(crate) use debug_event;
pub(crate) use warn_event;
