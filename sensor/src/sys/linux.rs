//! Linux orientation through the iio-sensor-proxy D-Bus service.
//!
//! Convertible laptops and tablets (ThinkPads, Surface devices) expose an
//! accelerometer through iio-sensor-proxy, which already reports a coarse
//! orientation name.

use futures::stream;
use log::{debug, warn};
use zbus::blocking::{Connection, Proxy};

use crate::{Orientation, SensorError, SensorStream};

const IIO_PROXY_BUS: &str = "net.hadess.SensorProxy";
const IIO_PROXY_PATH: &str = "/net/hadess/SensorProxy";
const IIO_PROXY_IFACE: &str = "net.hadess.SensorProxy";

fn unknown(e: zbus::Error) -> SensorError {
    SensorError::Unknown(e.to_string())
}

fn proxy(conn: &Connection) -> Result<Proxy<'static>, SensorError> {
    Proxy::new(conn, IIO_PROXY_BUS, IIO_PROXY_PATH, IIO_PROXY_IFACE).map_err(unknown)
}

pub fn orientation_available() -> bool {
    Connection::system()
        .map_err(unknown)
        .and_then(|conn| {
            proxy(&conn)?
                .get_property::<bool>("HasAccelerometer")
                .map_err(|e| SensorError::Unknown(e.to_string()))
        })
        .unwrap_or(false)
}

pub async fn orientation_read() -> Result<Option<Orientation>, SensorError> {
    let conn = Connection::system().map_err(unknown)?;
    let proxy = proxy(&conn)?;

    let has = proxy
        .get_property::<bool>("HasAccelerometer")
        .map_err(|e| SensorError::Unknown(e.to_string()))?;
    if !has {
        return Err(SensorError::NotAvailable);
    }

    // Readings only update while a client holds a claim.
    proxy
        .call_method("ClaimAccelerometer", &())
        .map_err(unknown)?;
    let name: String = proxy
        .get_property("AccelerometerOrientation")
        .map_err(|e| SensorError::Unknown(e.to_string()))?;
    debug!("iio-sensor-proxy orientation: {name}");

    Ok(Orientation::from_iio(&name))
}

pub fn orientation_watch(
    interval_ms: u32,
) -> Result<SensorStream<Option<Orientation>>, SensorError> {
    if !orientation_available() {
        return Err(SensorError::NotAvailable);
    }
    let interval = std::time::Duration::from_millis(u64::from(interval_ms));
    Ok(Box::pin(stream::unfold(true, move |first| async move {
        if !first {
            futures_timer::Delay::new(interval).await;
        }
        match orientation_read().await {
            Ok(orientation) => Some((orientation, false)),
            Err(e) => {
                warn!("orientation watch stopped: {e}");
                None
            }
        }
    })))
}
