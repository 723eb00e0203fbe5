//! MAX6675 on a Linux spidev character device.
//!
//! A plain `read(2)` on `/dev/spidevB.C` performs a half-duplex transfer that
//! clocks out zeros, which is all the MAX6675 needs.

use std::path::{Path, PathBuf};

use thermowatch_protocol::Reading;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncReadExt;

use crate::max6675::{self, FRAME_LEN};
use crate::{SensorError, SensorFuture, SensorSource};

/// Thermocouple read through a spidev device node.
pub struct SpidevSource {
    path: PathBuf,
    name: String,
    file: Option<File>,
}

impl SpidevSource {
    /// Opens the device node.
    ///
    /// Failure here means the sensor is unavailable for the whole run.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SensorError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path).await?;
        tracing::info!(device = %path.display(), "spi device opened");

        Ok(Self {
            name: format!("max6675@{}", path.display()),
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_frame(&mut self) -> Result<Reading, SensorError> {
        let file = self.file.as_mut().ok_or(SensorError::Closed)?;
        let mut frame = [0u8; FRAME_LEN];
        file.read_exact(&mut frame).await?;

        let celsius = max6675::decode(frame)?;
        Ok(Reading::now(celsius))
    }
}

impl SensorSource for SpidevSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self) -> SensorFuture<'_, Result<Reading, SensorError>> {
        Box::pin(self.read_frame())
    }

    fn close(&mut self) -> SensorFuture<'_, ()> {
        Box::pin(async move {
            if self.file.take().is_some() {
                tracing::info!(device = %self.path.display(), "spi device closed");
            }
        })
    }
}
