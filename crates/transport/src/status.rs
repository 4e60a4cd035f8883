/// How an electron's transport ended.
///
/// The numeric codes follow the convention used by microscopic transport
/// codes, so downstream analyses can keep their existing selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The electron left the sensor area.
    LeftDriftArea,
    /// The per-electron step limit was reached.
    TooManyIterations,
    /// Transport could not continue, for example in a vanishing field.
    CalculationAbandoned,
    /// The electron left the drift medium.
    LeftDriftMedium,
    /// The electron was captured by an electronegative gas.
    Attached,
}

impl Status {
    /// Returns the integer code stored in the output.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::LeftDriftArea => -1,
            Self::TooManyIterations => -2,
            Self::CalculationAbandoned => -3,
            Self::LeftDriftMedium => -5,
            Self::Attached => -7,
        }
    }

    /// Looks up the status for an integer code.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::LeftDriftArea),
            -2 => Some(Self::TooManyIterations),
            -3 => Some(Self::CalculationAbandoned),
            -5 => Some(Self::LeftDriftMedium),
            -7 => Some(Self::Attached),
            _ => None,
        }
    }
}
