use thiserror::Error;

/// Errors produced when a record transition would break an invariant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("too many additional guests: got {got}, max allowed {max}")]
    TooManyGuests { got: usize, max: u32 },
}
