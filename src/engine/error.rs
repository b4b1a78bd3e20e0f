#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Time-of-day string did not parse as a 12-hour clock value.
    InvalidTime(String),
    /// Slot is older than now minus the skew tolerance.
    PastSlot,
    /// Court capacity for the slot is exhausted.
    CourtFull,
    /// Instructor sub-capacity for the slot is exhausted.
    InstructorBusy,
    /// No pending reservation matches the confirmation key.
    NotFound,
    /// Check-in key unknown or reservation in a non-checkable state.
    InvalidCode,
    /// Key generation collided on every attempt. Internal; retried before
    /// being surfaced.
    KeySpaceExhausted,
    LimitExceeded(&'static str),
}

impl EngineError {
    /// Stable snake_case code for the wire layer.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidTime(_) => "invalid_time",
            EngineError::PastSlot => "past_slot",
            EngineError::CourtFull => "court_full",
            EngineError::InstructorBusy => "instructor_busy",
            EngineError::NotFound => "not_found",
            EngineError::InvalidCode => "invalid_code",
            EngineError::KeySpaceExhausted => "internal",
            EngineError::LimitExceeded(_) => "limit_exceeded",
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidTime(input) => write!(f, "unparseable time of day: {input:?}"),
            EngineError::PastSlot => write!(f, "slot is in the past"),
            EngineError::CourtFull => write!(f, "no court capacity left for this slot"),
            EngineError::InstructorBusy => write!(f, "no instructor capacity left for this slot"),
            EngineError::NotFound => write!(f, "no pending reservation for this key"),
            EngineError::InvalidCode => write!(f, "confirmation code not valid for check-in"),
            EngineError::KeySpaceExhausted => {
                write!(f, "could not generate a unique confirmation key")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
