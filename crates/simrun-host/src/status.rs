use std::fmt;

use simrun_abi::SIMRUN_STATUS_OK;

/// Status code returned by a backend run. Meaning beyond `0 == success` is backend-defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendStatus(i32);

impl BackendStatus {
    pub const SUCCESS: Self = Self(SIMRUN_STATUS_OK);

    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    pub const fn code(self) -> i32 {
        self.0
    }

    pub const fn is_success(self) -> bool {
        self.0 == SIMRUN_STATUS_OK
    }

    /// Process exit code for this status. A failing status never maps to `0`.
    pub fn exit_code(self) -> u8 {
        if self.is_success() {
            return 0;
        }
        match (self.0 & 0xff) as u8 {
            0 => 1,
            low => low,
        }
    }
}

impl From<i32> for BackendStatus {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_success() {
        assert!(BackendStatus::new(0).is_success());
        assert_eq!(BackendStatus::SUCCESS.exit_code(), 0);
    }

    #[test]
    fn small_failures_keep_their_code() {
        assert_eq!(BackendStatus::new(1).exit_code(), 1);
        assert_eq!(BackendStatus::new(42).exit_code(), 42);
        assert_eq!(BackendStatus::new(255).exit_code(), 255);
    }

    #[test]
    fn failures_never_map_to_zero() {
        for code in [256, 512, -256, i32::MIN] {
            let status = BackendStatus::new(code);
            assert!(!status.is_success());
            assert_ne!(status.exit_code(), 0, "status {code}");
        }
    }

    #[test]
    fn negative_codes_keep_low_byte() {
        assert_eq!(BackendStatus::new(-1).exit_code(), 255);
    }
}
