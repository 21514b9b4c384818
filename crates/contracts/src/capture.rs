//! CaptureDriver / FormatNormalizer traits - camera collaborator boundary
//!
//! Defines the interface a producer loop drives, decoupling the loop from the
//! concrete camera SDK. Mock cameras and real hardware implement the same API.

use std::time::Duration;

use crate::{ContractError, DisplayFormat, RawCapture};

/// Result of one blocking wait on the driver
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    /// A complete image was delivered
    Complete(RawCapture),
    /// Nothing arrived within the timeout
    Timeout,
    /// The driver delivered a partial/corrupt image
    Incomplete,
}

/// Per-source capture driver.
///
/// One instance is owned by exactly one producer thread, hence `Send` but
/// not `Sync`.
///
/// # Example
///
/// ```ignore
/// driver.arm_trigger()?;
/// if let CaptureOutcome::Complete(raw) = driver.wait_for_capture(Duration::from_millis(1000))? {
///     let ts = driver.timestamp(&raw);
/// }
/// ```
pub trait CaptureDriver: Send {
    /// Source identifier (used for logging and metrics)
    fn source_id(&self) -> &str;

    /// Arm/fire one capture
    ///
    /// Idempotent from the caller's point of view: firing again before the
    /// previous image was collected must not corrupt the driver.
    fn arm_trigger(&mut self) -> Result<(), ContractError>;

    /// Block until one capture result arrives or `timeout` elapses
    ///
    /// # Errors
    /// Returns a driver error; timeouts and incomplete images are not errors.
    fn wait_for_capture(&mut self, timeout: Duration) -> Result<CaptureOutcome, ContractError>;

    /// Extract the source-local capture timestamp (ns)
    fn timestamp(&self, raw: &RawCapture) -> u64 {
        raw.timestamp_ns
    }
}

/// Raw sensor buffer to display payload conversion
///
/// Stateless; one instance is shared by every producer thread.
pub trait FormatNormalizer: Send + Sync {
    /// Normalized payload type
    type Output: Send + 'static;

    /// Convert a raw capture into the common display format
    ///
    /// Takes ownership of the raw buffer; it is not needed afterwards.
    fn convert(
        &self,
        raw: RawCapture,
        target: &DisplayFormat,
    ) -> Result<Self::Output, ContractError>;
}

impl<T: CaptureDriver + ?Sized> CaptureDriver for Box<T> {
    fn source_id(&self) -> &str {
        (**self).source_id()
    }

    fn arm_trigger(&mut self) -> Result<(), ContractError> {
        (**self).arm_trigger()
    }

    fn wait_for_capture(&mut self, timeout: Duration) -> Result<CaptureOutcome, ContractError> {
        (**self).wait_for_capture(timeout)
    }

    fn timestamp(&self, raw: &RawCapture) -> u64 {
        (**self).timestamp(raw)
    }
}
