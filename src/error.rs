//! Error type shared by every fallible operation in the crate.

use std::fmt;

use crate::math::Real;

#[derive(Debug)]
pub enum SphError {
    /// Kernel radius must be strictly positive and finite.
    InvalidKernelRadius(Real),
    /// A simulation parameter is out of its valid range.
    InvalidParameter { name: &'static str, value: Real },
    /// The requested particle count is zero.
    InvalidParticleCount(usize),
    /// The seeding pattern cannot place the requested number of particles.
    SeedingOverflow { requested: usize, capacity: usize },
    /// The domain does not hold the 3x3 cell block a neighbor scan needs.
    GridTooSmall { columns: usize, rows: usize },
    Io(std::io::Error),
    Csv(csv::Error),
    /// A trace record contained a field that is not an `x y` pair.
    MalformedRecord {
        record: u64,
        field: usize,
        reason: String,
    },
    /// A density, pressure, position or velocity became NaN or infinite.
    NonFinite {
        quantity: &'static str,
        index: usize,
    },
}

impl SphError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SphError::InvalidKernelRadius(_)
                | SphError::InvalidParameter { .. }
                | SphError::InvalidParticleCount(_)
                | SphError::SeedingOverflow { .. }
                | SphError::GridTooSmall { .. }
        )
    }
}

impl fmt::Display for SphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SphError::InvalidKernelRadius(radius) => {
                write!(f, "kernel radius must be positive, got {}", radius)
            }
            SphError::InvalidParameter { name, value } => {
                write!(f, "invalid value for {}: {}", name, value)
            }
            SphError::InvalidParticleCount(count) => {
                write!(f, "particle count must be positive, got {}", count)
            }
            SphError::SeedingOverflow {
                requested,
                capacity,
            } => write!(
                f,
                "requested {} particles but the seeding pattern only fits {}",
                requested, capacity
            ),
            SphError::GridTooSmall { columns, rows } => write!(
                f,
                "neighbor grid needs at least 3x3 cells, got {}x{}",
                columns, rows
            ),
            SphError::Io(e) => write!(f, "I/O error: {}", e),
            SphError::Csv(e) => write!(f, "trace format error: {}", e),
            SphError::MalformedRecord {
                record,
                field,
                reason,
            } => write!(
                f,
                "malformed trace record {} field {}: {}",
                record, field, reason
            ),
            SphError::NonFinite { quantity, index } => {
                write!(f, "non-finite {} at particle {}", quantity, index)
            }
        }
    }
}

impl std::error::Error for SphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SphError::Io(e) => Some(e),
            SphError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SphError {
    fn from(e: std::io::Error) -> Self {
        SphError::Io(e)
    }
}

impl From<csv::Error> for SphError {
    fn from(e: csv::Error) -> Self {
        SphError::Csv(e)
    }
}

pub type SphResult<T> = Result<T, SphError>;
