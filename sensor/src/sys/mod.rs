//! Platform-specific orientation sources.

#[cfg(all(target_os = "linux", feature = "iio"))]
mod linux;

#[cfg(all(target_os = "linux", feature = "iio"))]
pub(crate) use linux::*;

// Fallback when no backend is compiled in
#[cfg(not(all(target_os = "linux", feature = "iio")))]
mod fallback {
    use crate::{Orientation, SensorError, SensorStream};

    pub fn orientation_available() -> bool {
        false
    }

    pub async fn orientation_read() -> Result<Option<Orientation>, SensorError> {
        Err(SensorError::NotAvailable)
    }

    pub fn orientation_watch(
        _interval_ms: u32,
    ) -> Result<SensorStream<Option<Orientation>>, SensorError> {
        Err(SensorError::NotAvailable)
    }
}

#[cfg(not(all(target_os = "linux", feature = "iio")))]
pub(crate) use fallback::*;
