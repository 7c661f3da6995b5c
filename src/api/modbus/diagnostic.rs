//! Status word interpretation.
//!
//! Everything here is pure: given the raw status word and, optionally, the
//! fault code register, it derives the drive state without touching the bus.

use serde::Serialize;
use std::fmt;

use super::error::DriveError;

pub const FAULT_BIT: u16 = 0x0008;
pub const RUNNING_BIT: u16 = 0x0004;
pub const WARNING_BIT: u16 = 0x0080;

/// Fault code as reported alongside a FAULT state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultCode {
    Code(u16),
    /// Faulted, but the code register was unreadable or still zero.
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveState {
    Ready,
    Running,
    Fault(FaultCode),
}

impl DriveState {
    pub fn token(&self) -> &'static str {
        match self {
            DriveState::Ready => "READY",
            DriveState::Running => "RUNNING",
            DriveState::Fault(_) => "FAULT",
        }
    }
}

impl fmt::Display for DriveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Result of evaluating one status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Diagnosis {
    pub status_word: u16,
    pub state: DriveState,
    /// Alarm/warning bit, orthogonal to `state`.
    pub warning: bool,
}

impl Diagnosis {
    pub fn is_fault(&self) -> bool {
        matches!(self.state, DriveState::Fault(_))
    }

    pub fn is_running(&self) -> bool {
        self.state == DriveState::Running
    }

    /// Concrete fault code, if the drive is faulted.
    ///
    /// A fault without a usable code is an error, never `Ok(None)`.
    pub fn fault_code(&self) -> Result<Option<u16>, DriveError> {
        match self.state {
            DriveState::Fault(FaultCode::Code(code)) => Ok(Some(code)),
            DriveState::Fault(FaultCode::Unavailable) => Err(DriveError::FaultCodeUnavailable),
            DriveState::Ready | DriveState::Running => Ok(None),
        }
    }

    /// Human-readable one-liner for operator output.
    pub fn describe(&self) -> String {
        let mut text = match self.state {
            DriveState::Fault(FaultCode::Code(code)) => {
                format!("FAULT (code {code}: {})", fault_description(code))
            }
            DriveState::Fault(FaultCode::Unavailable) => {
                "FAULT (code unavailable)".to_string()
            }
            DriveState::Running => "RUNNING".to_string(),
            DriveState::Ready => "READY (no active fault)".to_string(),
        };
        if self.warning {
            text.push_str(", alarm/warning active");
        }
        text
    }
}

/// Status token: `READY`, `RUNNING` or `FAULT`, suffixed with `+WARNING`.
impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.warning {
            write!(f, "{}+WARNING", self.state.token())
        } else {
            f.write_str(self.state.token())
        }
    }
}

/// Derive the drive state from a status word and an optional fault code.
///
/// Precedence: fault bit, then running bit, then ready. A zero or missing
/// fault code while faulted is reported as [`FaultCode::Unavailable`].
pub fn evaluate(status_word: u16, fault_code: Option<u16>) -> Diagnosis {
    let state = if status_word & FAULT_BIT != 0 {
        match fault_code {
            Some(code) if code != 0 => DriveState::Fault(FaultCode::Code(code)),
            _ => DriveState::Fault(FaultCode::Unavailable),
        }
    } else if status_word & RUNNING_BIT != 0 {
        DriveState::Running
    } else {
        DriveState::Ready
    };

    Diagnosis {
        status_word,
        state,
        warning: status_word & WARNING_BIT != 0,
    }
}

pub fn fault_description(code: u16) -> &'static str {
    match code {
        1 => "OVERCURRENT",
        2 => "DC OVERVOLT",
        3 => "DEV OVERTEMP",
        4 => "SHORT CIRC",
        6 => "DC UNDERVOLT",
        7 => "AI1 LOSS",
        8 => "AI2 LOSS",
        9 => "MOT OVERTEMP",
        10 => "PANEL LOSS",
        11 => "ID RUN FAIL",
        12 => "MOTOR STALL",
        14 => "EXT FAULT 1",
        15 => "EXT FAULT 2",
        16 => "EARTH FAULT",
        22 => "SUPPLY PHASE",
        24 => "OVERSPEED",
        28 => "SERIAL 1 ERR",
        _ => "UNKNOWN FAULT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_bit_wins_over_running() {
        for word in 0..=u16::MAX {
            if word & FAULT_BIT != 0 {
                assert!(evaluate(word, Some(1)).is_fault(), "word {word:#06x}");
                assert!(evaluate(word, None).is_fault(), "word {word:#06x}");
            }
        }
    }

    #[test]
    fn test_running_and_ready() {
        for word in 0..=u16::MAX {
            let diag = evaluate(word, None);
            match (word & FAULT_BIT != 0, word & RUNNING_BIT != 0) {
                (false, true) => assert_eq!(diag.state, DriveState::Running),
                (false, false) => assert_eq!(diag.state, DriveState::Ready),
                (true, _) => {}
            }
        }
    }

    #[test]
    fn test_warning_is_orthogonal() {
        for word in 0..=u16::MAX {
            let diag = evaluate(word, Some(3));
            assert_eq!(diag.warning, word & WARNING_BIT != 0);
            let without = evaluate(word & !WARNING_BIT, Some(3));
            assert_eq!(diag.state, without.state);
        }
    }

    #[test]
    fn test_fault_code_unavailable() {
        let unreadable = evaluate(0x0008, None);
        assert_eq!(unreadable.state, DriveState::Fault(FaultCode::Unavailable));
        assert!(matches!(
            unreadable.fault_code(),
            Err(DriveError::FaultCodeUnavailable)
        ));
        assert_eq!(unreadable.describe(), "FAULT (code unavailable)");

        let zero = evaluate(0x0008, Some(0));
        assert_eq!(zero.state, DriveState::Fault(FaultCode::Unavailable));

        let known = evaluate(0x0008, Some(9));
        assert_eq!(known.fault_code().ok(), Some(Some(9)));
        assert_eq!(known.describe(), "FAULT (code 9: MOT OVERTEMP)");
    }

    #[test]
    fn test_fault_code_ignored_without_fault_bit() {
        let diag = evaluate(0x0004, Some(7));
        assert_eq!(diag.state, DriveState::Running);
        assert_eq!(diag.fault_code().ok(), Some(None));
    }

    #[test]
    fn test_status_tokens() {
        assert_eq!(evaluate(0x0000, None).to_string(), "READY");
        assert_eq!(evaluate(0x0004, None).to_string(), "RUNNING");
        assert_eq!(evaluate(0x000C, Some(1)).to_string(), "FAULT");
        assert_eq!(evaluate(0x0084, None).to_string(), "RUNNING+WARNING");
        assert_eq!(
            evaluate(0x0080, None).describe(),
            "READY (no active fault), alarm/warning active"
        );
    }
}
