//! Motion-module power control over the camera adapter's monitor-command channel

use crate::error::{MotionModuleError, Result};
use log::debug;
use std::thread;
use std::time::Duration;

// Adapter monitor-command opcodes
pub const CMD_IRB: u8 = 0x01; // Read from I2C (8x8)
pub const CMD_IWB: u8 = 0x02; // Write to I2C (8x8)
pub const CMD_GVD: u8 = 0x03; // Get version and date
pub const CMD_IAP_IRB: u8 = 0x04; // Read from IAP I2C (8x8)
pub const CMD_IAP_IWB: u8 = 0x05; // Write to IAP I2C (8x8)
pub const CMD_FRCNT: u8 = 0x06; // Read frame counter
pub const CMD_GLD: u8 = 0x07; // Get logger data
pub const CMD_GPW: u8 = 0x08; // Write to GPIO
pub const CMD_GPR: u8 = 0x09; // Read from GPIO
pub const CMD_MMPWR: u8 = 0x0A; // Motion module power up/down
pub const CMD_DSPWR: u8 = 0x0B; // Depth module power up/down
pub const CMD_EXT_TRIG: u8 = 0x0C; // External trigger mode
pub const CMD_FW_UPDATE: u8 = 0x0D; // Firmware update
pub const CMD_MM_ACTIVATE: u8 = 0x0E; // Motion module event activation

/// Auxiliary adapter channel carrying all motion-module commands
pub const AUX_CHANNEL: u8 = 1;

/// Warm-up wait the module needs after video output powers on for streaming
pub const STREAMING_SETTLE_DELAY: Duration = Duration::from_millis(2000);

/// Power/output mode of the motion module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingState {
    /// Both outputs off
    Idle,
    /// Inertial streaming only
    Streaming,
    /// Event reporting only
    Eventing,
    /// Streaming and event reporting together
    FullLoad,
}

/// A caller-facing toggle of one module output feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    VideoOutput,
    EventsOutput,
}

impl TryFrom<u8> for ControlRequest {
    type Error = MotionModuleError;

    /// Map a raw monitor-protocol control id to a request. Valid range is [1,2].
    fn try_from(raw: u8) -> Result<Self> {
        match raw {
            1 => Ok(ControlRequest::VideoOutput),
            2 => Ok(ControlRequest::EventsOutput),
            other => Err(MotionModuleError::UnsupportedControl(other)),
        }
    }
}

/// Physical module output, mapped 1:1 to a monitor-command opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareOutput {
    VideoOutput,
    EventsOutput,
}

impl HardwareOutput {
    /// Monitor-command opcode that switches this output
    pub fn opcode(self) -> u8 {
        match self {
            HardwareOutput::VideoOutput => CMD_MMPWR,
            HardwareOutput::EventsOutput => CMD_MM_ACTIVATE,
        }
    }
}

/// One monitor command: opcode plus a single numeric parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorCommand {
    pub opcode: u8,
    pub param: u32,
}

/// Synchronous command channel to the camera adapter.
///
/// Implementations own the underlying device handle and carry their own
/// timing and retry policy; `&mut self` keeps outbound commands mutually
/// exclusive, so no two commands from one controller are ever in flight
/// at once.
pub trait CommandTransport {
    fn send_command(&mut self, channel: u8, command: MonitorCommand) -> Result<()>;
}

/// One step of a state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwAction {
    /// Switch a module output on or off
    SetOutput(HardwareOutput, bool),
    /// Block until the module has stabilized
    Settle(Duration),
}

/// Ordered hardware actions required to move between two operating states.
///
/// Pairs not listed are state-only changes with no hardware side effect;
/// the outputs they need are already in the right configuration.
pub fn transition_plan(from: OperatingState, to: OperatingState) -> &'static [HwAction] {
    use HardwareOutput::{EventsOutput, VideoOutput};
    use HwAction::{SetOutput, Settle};
    use OperatingState::{Eventing, FullLoad, Idle, Streaming};

    match (from, to) {
        (Idle, Streaming) => &[
            SetOutput(VideoOutput, true),
            Settle(STREAMING_SETTLE_DELAY),
        ],
        (Idle, Eventing) => &[
            SetOutput(VideoOutput, true),
            SetOutput(EventsOutput, true),
        ],
        (Streaming, Idle) => &[SetOutput(VideoOutput, false)],
        (Streaming, FullLoad) => &[SetOutput(EventsOutput, true)],
        (Eventing, Idle) => &[SetOutput(EventsOutput, false)],
        _ => &[],
    }
}

impl OperatingState {
    /// Next state reachable from `self` by toggling `request`, if any.
    ///
    /// The reachable set follows the module's step encoding: video output
    /// moves one state, events output moves two, enable steps forward and
    /// disable steps back. Combinations that would land outside the four
    /// defined states are unreachable.
    pub fn requested_state(self, request: ControlRequest, enable: bool) -> Option<OperatingState> {
        use ControlRequest::{EventsOutput, VideoOutput};
        use OperatingState::{Eventing, FullLoad, Idle, Streaming};

        match (self, request, enable) {
            (Idle, VideoOutput, true) => Some(Streaming),
            (Idle, EventsOutput, true) => Some(Eventing),
            (Streaming, VideoOutput, true) => Some(Eventing),
            (Streaming, VideoOutput, false) => Some(Idle),
            (Streaming, EventsOutput, true) => Some(FullLoad),
            (Eventing, VideoOutput, true) => Some(FullLoad),
            (Eventing, VideoOutput, false) => Some(Streaming),
            (Eventing, EventsOutput, false) => Some(Idle),
            (FullLoad, VideoOutput, false) => Some(Eventing),
            (FullLoad, EventsOutput, false) => Some(Streaming),
            _ => None,
        }
    }
}

/// Power/output state machine for the motion module.
///
/// Holds the module's current operating state and the exclusive command
/// transport to the device. Starts in [`OperatingState::Idle`].
pub struct PowerController<T: CommandTransport> {
    transport: T,
    state: OperatingState,
}

impl<T: CommandTransport> PowerController<T> {
    /// Create a controller bound to `transport` for its entire lifetime
    pub fn new(transport: T) -> Self {
        PowerController {
            transport,
            state: OperatingState::Idle,
        }
    }

    #[cfg(test)]
    fn at_state(transport: T, state: OperatingState) -> Self {
        PowerController { transport, state }
    }

    /// Current operating state
    pub fn state(&self) -> OperatingState {
        self.state
    }

    /// Apply a feature toggle, issuing whatever hardware commands the
    /// resulting state change requires.
    ///
    /// Fails with [`MotionModuleError::InvalidTransition`] if the toggle has
    /// no reachable target state; the current state is preserved. A toggle
    /// whose target equals the current state is a no-op. The Idle→Streaming
    /// transition blocks for [`STREAMING_SETTLE_DELAY`].
    pub fn request(&mut self, request: ControlRequest, enable: bool) -> Result<()> {
        let candidate = self.state.requested_state(request, enable).ok_or(
            MotionModuleError::InvalidTransition {
                request,
                enable,
                state: self.state,
            },
        )?;

        if candidate == self.state {
            return Ok(());
        }

        for action in transition_plan(self.state, candidate) {
            match *action {
                HwAction::SetOutput(output, on) => self.set_output(output, on)?,
                HwAction::Settle(delay) => thread::sleep(delay),
            }
        }

        debug!("motion module state {:?} -> {:?}", self.state, candidate);
        self.state = candidate;
        Ok(())
    }

    /// Send one output-control command on the auxiliary channel.
    ///
    /// Fails with [`MotionModuleError::Transport`] if the underlying send
    /// fails or times out; no retry is attempted here.
    pub fn set_output(&mut self, output: HardwareOutput, enable: bool) -> Result<()> {
        let command = MonitorCommand {
            opcode: output.opcode(),
            param: enable as u32,
        };

        debug!(
            "set {:?} = {} (opcode 0x{:02X})",
            output, enable, command.opcode
        );
        self.transport.send_command(AUX_CHANNEL, command)
    }

    /// Toggle the module's inertial streaming output
    pub fn toggle_video_output(&mut self, on: bool) -> Result<()> {
        self.request(ControlRequest::VideoOutput, on)
    }

    /// Toggle the module's event reporting output
    pub fn toggle_events_output(&mut self, on: bool) -> Result<()> {
        self.request(ControlRequest::EventsOutput, on)
    }
}
