use std::cell::RefCell;
use std::ops::RangeInclusive;

/// An error from operating the Crazyradio.
///
/// Errors split into two groups, see [`Error::source_kind`]:
///
/// - `Io`, `Transfer`, `Timeout`, and `ShortTransfer` come from the USB stack
///   or from the dongle not accepting a request. A failed packet operation
///   can usually be retried without reopening the radio.
/// - `ValueRange`, `InvalidMode`, `InvalidParameter`, `NoDevice`, and
///   `NotEnoughDevices` are detected by this library before any USB traffic
///   happens.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Underlying OS I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Transfer error from `nusb`.
    #[error("USB transfer error")]
    Transfer(#[from] nusb::transfer::TransferError),

    /// A control transfer didn't complete within the configured timeout.
    #[error("USB control transfer timed out")]
    Timeout,

    /// The dongle accepted fewer bytes than were sent with a control request.
    #[error("Short control transfer: sent {expected} bytes, device took {actual}")]
    #[allow(missing_docs)]
    ShortTransfer { expected: usize, actual: usize },

    /// A radio parameter is out of its allowed range.
    #[error("Invalid {param} ({val}), must be {}-{}", .range.start(), .range.end())]
    #[allow(missing_docs)]
    ValueRange {
        param: &'static str,
        range: RangeInclusive<u32>,
        val: u32,
    },

    /// The requested mode is neither PTX (0) nor PRX (2).
    #[error("Invalid mode ({0}), must be 0 (PTX) or 2 (PRX)")]
    InvalidMode(u16),

    /// Some argument to a function is invalid in a way not easily expressed as
    /// a range.
    #[error("Invalid Parameter: {0}")]
    InvalidParameter(&'static str),

    /// No device with the Crazyradio VID/PID is attached.
    #[error("No Crazyradio VID/PID found")]
    NoDevice,

    /// Crazyradios are attached, but not enough of them to reach the requested
    /// index.
    #[error("Cannot find Crazyradio #{index}, only {found} attached")]
    #[allow(missing_docs)]
    NotEnoughDevices { index: usize, found: usize },

    /// Returned data from the Crazyradio didn't make any sense.
    #[error("Invalid return data")]
    ReturnData,
}

/// Where an [`Error`] originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The USB stack or the dongle itself.
    Usb,
    /// This library's own checks.
    Radio,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usb => f.write_str("usb"),
            Self::Radio => f.write_str("radio"),
        }
    }
}

impl Error {
    /// Whether this error came from USB or from a local check.
    pub fn source_kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::Transfer(_) | Self::Timeout | Self::ShortTransfer { .. } => {
                ErrorKind::Usb
            }
            _ => ErrorKind::Radio,
        }
    }

    pub(crate) fn range(param: &'static str, range: RangeInclusive<u32>, val: u32) -> Self {
        Self::ValueRange { param, range, val }
    }
}

/// The most recent error seen on the current thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LastError {
    /// Where the error came from.
    pub kind: ErrorKind,
    /// The error's message, including its source chain.
    pub message: String,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<LastError>> = const { RefCell::new(None) };
}

/// Get the last error recorded by a failed operation on this thread.
pub fn last_error() -> Option<LastError> {
    LAST_ERROR.with(|e| e.borrow().clone())
}

/// Get a printable description of the last error recorded on this thread.
///
/// Returns `"Success"` if nothing has failed yet.
pub fn last_error_string() -> String {
    last_error()
        .map(|e| e.message)
        .unwrap_or_else(|| String::from("Success"))
}

/// Forget the last error recorded on this thread.
pub fn clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}

fn describe(err: &Error) -> String {
    use std::error::Error as _;
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(s) = source {
        msg.push_str(": ");
        msg.push_str(&s.to_string());
        source = s.source();
    }
    msg
}

/// Record the error of a failed operation as this thread's last error.
pub(crate) fn track<T>(res: Result<T, Error>) -> Result<T, Error> {
    if let Err(err) = &res {
        let kind = err.source_kind();
        let message = describe(err);
        radio_debug!("Setting {} error: {}", kind, message);
        LAST_ERROR.with(|e| *e.borrow_mut() = Some(LastError { kind, message }));
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(Error::Timeout.source_kind(), ErrorKind::Usb);
        assert_eq!(
            Error::ShortTransfer {
                expected: 5,
                actual: 0
            }
            .source_kind(),
            ErrorKind::Usb
        );
        assert_eq!(Error::NoDevice.source_kind(), ErrorKind::Radio);
        assert_eq!(Error::InvalidMode(1).source_kind(), ErrorKind::Radio);
        assert_eq!(
            Error::Io(std::io::Error::other("gone")).source_kind(),
            ErrorKind::Usb
        );
    }

    #[test]
    fn messages() {
        assert_eq!(
            Error::range("channel", 0..=126, 127).to_string(),
            "Invalid channel (127), must be 0-126"
        );
        assert_eq!(Error::NoDevice.to_string(), "No Crazyradio VID/PID found");
        assert_eq!(
            Error::NotEnoughDevices { index: 2, found: 1 }.to_string(),
            "Cannot find Crazyradio #2, only 1 attached"
        );
    }

    #[test]
    fn last_error_tracking() {
        clear_last_error();
        assert_eq!(last_error_string(), "Success");
        assert!(last_error().is_none());

        let ok: Result<u8, Error> = track(Ok(3));
        assert_eq!(ok.unwrap(), 3);
        assert!(last_error().is_none());

        let err = track::<()>(Err(Error::InvalidMode(7)));
        assert!(err.is_err());
        let last = last_error().unwrap();
        assert_eq!(last.kind, ErrorKind::Radio);
        assert_eq!(
            last_error_string(),
            "Invalid mode (7), must be 0 (PTX) or 2 (PRX)"
        );

        let _ = track::<()>(Err(Error::Io(std::io::Error::other("unplugged"))));
        let last = last_error().unwrap();
        assert_eq!(last.kind, ErrorKind::Usb);
        assert_eq!(last.message, "I/O error: unplugged");

        clear_last_error();
        assert_eq!(last_error_string(), "Success");
    }

    #[test]
    fn last_error_is_per_thread() {
        let _ = track::<()>(Err(Error::NoDevice));
        let other = std::thread::spawn(last_error).join().unwrap();
        assert!(other.is_none());
        assert_eq!(last_error().unwrap().message, "No Crazyradio VID/PID found");
    }
}
