use std::ffi::{CString, NulError};
use std::fmt;
use std::path::Path;

/// Argument buffer handed to the backend's run entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    bytes: Vec<u8>,
}

impl RunArgs {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Encodes `path` in the platform's native byte representation.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::from_bytes(encode_path(path.as_ref()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_c_string(&self) -> Result<CString, NulError> {
        CString::new(self.bytes.clone())
    }
}

impl fmt::Display for RunArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes))
    }
}

#[cfg(unix)]
fn encode_path(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn encode_path(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_encodes_to_its_bytes() {
        let args = RunArgs::from_path("/tmp/epdll");
        assert_eq!(args.as_bytes(), b"/tmp/epdll");
        assert_eq!(args.to_string(), "/tmp/epdll");
    }

    #[test]
    fn c_string_is_nul_terminated() {
        let c = RunArgs::from_path("/tmp/epdll").to_c_string().unwrap();
        assert_eq!(c.as_bytes_with_nul(), b"/tmp/epdll\0");
    }

    #[test]
    fn interior_nul_cannot_be_dispatched() {
        assert!(RunArgs::from_bytes(b"/tmp/\0epdll".to_vec()).to_c_string().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_path_bytes_pass_through_unchanged() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let raw = b"/tmp/ep\xffdll";
        let args = RunArgs::from_path(Path::new(OsStr::from_bytes(raw)));
        assert_eq!(args.as_bytes(), raw);
    }
}
