//! Motion-module interface for camera-attached inertial peripherals
//!
//! This library governs the auxiliary motion-sensing module of a camera
//! device. It drives the module's power/output state machine over the
//! adapter's monitor-command channel and decodes the fixed-layout binary
//! telemetry packets the module streams back. The USB transport itself,
//! device enumeration and the video pipelines stay outside; callers plug
//! in their transport through the [`CommandTransport`] trait and feed raw
//! buffers to the decoder.
//!
//! # Quick Start
//!
//! ## Power control
//! ```no_run
//! use motion_module_interface::{
//!     CommandTransport, MonitorCommand, PowerController, Result,
//! };
//!
//! struct UsbMonitor; // wraps the real device handle
//!
//! impl CommandTransport for UsbMonitor {
//!     fn send_command(&mut self, channel: u8, command: MonitorCommand) -> Result<()> {
//!         // issue the monitor command over USB here
//!         Ok(())
//!     }
//! }
//!
//! let mut control = PowerController::new(UsbMonitor);
//!
//! // power the module into streaming mode (blocks ~2 s while it settles)
//! control.toggle_video_output(true)?;
//!
//! // add event reporting on top
//! control.toggle_events_output(true)?;
//! # Ok::<(), motion_module_interface::MotionModuleError>(())
//! ```
//!
//! ## Telemetry decoding
//! ```
//! use motion_module_interface::{parse_motion_packets, PACKET_SIZE};
//!
//! // one raw transfer from the module's interrupt endpoint
//! let buffer = vec![0u8; PACKET_SIZE];
//!
//! for event in parse_motion_packets(&buffer) {
//!     for sample in &event.samples {
//!         println!("{:?} axes: {:?}", sample.source, sample.axes);
//!     }
//! }
//! ```

pub mod control;
pub mod error;
pub mod packet;

// Re-export public API
pub use control::{
    CommandTransport, ControlRequest, HardwareOutput, HwAction, MonitorCommand, OperatingState,
    PowerController, transition_plan, AUX_CHANNEL, STREAMING_SETTLE_DELAY,
};
pub use error::{MotionModuleError, Result};
pub use packet::{
    parse_motion, parse_motion_packets, parse_timestamp, MotionEvent, MotionSample, MotionSource,
    TimestampEntry, PACKET_SIZE,
};
