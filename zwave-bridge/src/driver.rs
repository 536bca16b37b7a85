//! Outbound command seam to the device driver
//!
//! The driver owns framing, radio I/O and retries. The bridge only hands it
//! "set value" commands and never waits for them: completion shows up later
//! as an ordinary value-changed event.

use parking_lot::Mutex;
use zwave_state::{RawValue, ValueId};

/// Outbound half of the driver interface
pub trait DeviceDriver: Send + Sync {
    /// Queue a new value for a device value (fire-and-forget)
    fn set_value(&self, value_id: ValueId, value: RawValue);
}

/// One recorded outbound command
#[derive(Debug, Clone, PartialEq)]
pub struct SetValueCommand {
    pub value_id: ValueId,
    pub value: RawValue,
}

/// Driver that records commands instead of sending them
///
/// Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    commands: Mutex<Vec<SetValueCommand>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands issued so far, oldest first
    pub fn commands(&self) -> Vec<SetValueCommand> {
        self.commands.lock().clone()
    }

    /// Drain the recorded commands
    pub fn take(&self) -> Vec<SetValueCommand> {
        std::mem::take(&mut *self.commands.lock())
    }
}

impl DeviceDriver for RecordingDriver {
    fn set_value(&self, value_id: ValueId, value: RawValue) {
        tracing::debug!("Recorded set {} = {}", value_id, value);
        self.commands.lock().push(SetValueCommand { value_id, value });
    }
}
