//! Thin wrappers over `tracing` so call sites compile to nothing without the feature.

macro_rules! trace_event {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!(target: "erased_storage", $($arg)*);
    };
}

macro_rules! warn_event {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!(target: "erased_storage", $($arg)*);
    };
}
