//! MAX6675 cold-junction-compensated thermocouple converter.
//!
//! The chip shifts out one 16-bit big-endian frame per conversion:
//!
//! | bit   | meaning                          |
//! |-------|----------------------------------|
//! | 15    | dummy sign bit, always 0         |
//! | 14..3 | 12-bit temperature, 0.25 °C/LSB  |
//! | 2     | thermocouple input open          |
//! | 1     | device id, always 0              |
//! | 0     | three-state                      |

use thermowatch_protocol::constants::THERMOCOUPLE_OPEN;

use crate::SensorError;

/// Bytes per conversion frame.
pub const FRAME_LEN: usize = 2;

/// Degrees Celsius per LSB.
pub const RESOLUTION_C: f64 = 0.25;

const DUMMY_SIGN_BIT: u16 = 0x8000;
const OPEN_INPUT_BIT: u16 = 0x0004;

/// Decodes a raw frame into degrees Celsius.
///
/// A set sign bit means nothing valid was clocked in (a floating bus reads
/// `0xFFFF`) and is reported as [`SensorError::InvalidFrame`]. The open-input
/// bit is a [`SensorError::Fault`].
pub fn decode(frame: [u8; FRAME_LEN]) -> Result<f64, SensorError> {
    let raw = u16::from_be_bytes(frame);

    if raw & DUMMY_SIGN_BIT != 0 {
        return Err(SensorError::InvalidFrame(raw));
    }
    if raw & OPEN_INPUT_BIT != 0 {
        return Err(SensorError::Fault(THERMOCOUPLE_OPEN.to_string()));
    }

    Ok(f64::from(raw >> 3) * RESOLUTION_C)
}
