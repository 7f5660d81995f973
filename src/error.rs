//! Error Types
//!
//! The geometry and sun-position core is total and never fails. Errors only
//! arise at the edges: parsing user-supplied date/time strings and talking to
//! the high-precision ephemeris.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TwinError {
    #[error("Invalid time format '{0}'. Use HH:MM, HH:MM:SS, or HH:MM:SS.ns")]
    InvalidTime(String),

    #[error("Invalid date-time '{0}'. Use YYYY-MM-DDTHH:MM")]
    InvalidDateTime(String),

    #[error("Local time {0} does not exist in time zone {1} (DST gap)")]
    NonexistentLocalTime(String, String),

    #[error("Could not parse date '{0}': {1}")]
    InvalidDate(String, String),

    #[error("Ephemeris failure: {0}")]
    Ephemeris(String),
}

pub type Result<T> = std::result::Result<T, TwinError>;
