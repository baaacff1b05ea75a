//! Motion telemetry packet decoding
//!
//! The module streams fixed-layout 104-byte packets: an 8-byte header,
//! four 12-byte inertial entry slots and eight 6-byte timestamp entry
//! slots. The header says how many slots of each kind are actually
//! populated. All multi-byte fields are little-endian.

use log::debug;

/// Packet header size in bytes
pub const PACKET_HEADER_SIZE: usize = 8;
/// Inertial entry slots per packet
pub const IMU_ENTRY_SLOTS: usize = 4;
/// Bytes per inertial entry
pub const IMU_ENTRY_SIZE: usize = 12;
/// Timestamp entry slots per packet
pub const TIMESTAMP_ENTRY_SLOTS: usize = 8;
/// Bytes per timestamp entry
pub const TIMESTAMP_ENTRY_SIZE: usize = 6;
/// Offset of the timestamp entry block within a packet
pub const TIMESTAMP_BLOCK_OFFSET: usize = PACKET_HEADER_SIZE + IMU_ENTRY_SLOTS * IMU_ENTRY_SIZE;
/// Total packet size in bytes
pub const PACKET_SIZE: usize = TIMESTAMP_BLOCK_OFFSET + TIMESTAMP_ENTRY_SLOTS * TIMESTAMP_ENTRY_SIZE;

// Physical-unit conversion for the module's fixed sensor ranges
const STANDARD_GRAVITY: f32 = 9.871;
const ACCEL_RANGE_G_PER_LSB: f32 = 0.00195; // ±4 g
const GYRO_RANGE_DPS: f32 = 2000.0;

/// Accelerometer raw-to-m/s² conversion factor
pub const ACCEL_TRANSFORM_FACTOR: f32 = ACCEL_RANGE_G_PER_LSB * STANDARD_GRAVITY;
/// Gyroscope raw-to-rad/s conversion factor
pub const GYRO_TRANSFORM_FACTOR: f32 =
    (GYRO_RANGE_DPS * std::f32::consts::PI) / (180.0 * 32768.0);

// Accelerometer raw readings carry 4 low padding bits
const ACCEL_DATA_SHIFT: u32 = 4;

/// Origin of a telemetry entry, from the 3-bit source id field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionSource {
    Accelerometer,
    Gyroscope,
    /// Sources this core does not interpret (camera frame markers,
    /// external sync pulses); their readings pass through unscaled
    Other(u8),
}

impl MotionSource {
    fn from_bits(word: u16) -> Self {
        match word & 0x7 {
            0 => MotionSource::Accelerometer,
            1 => MotionSource::Gyroscope,
            other => MotionSource::Other(other as u8),
        }
    }
}

/// Timing metadata carried by every telemetry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampEntry {
    pub source: MotionSource,
    /// 12-bit rolling frame counter
    pub frame_number: u16,
    /// Device-tick timestamp; granularity is defined by the peripheral
    pub timestamp: u32,
}

/// One decoded inertial sample in physical units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub source: MotionSource,
    /// 12-bit rolling frame counter
    pub frame_number: u16,
    /// Device-tick timestamp; granularity is defined by the peripheral
    pub timestamp: u32,
    /// Validity flag reported by the module for this sample
    pub is_valid: bool,
    /// X/Y/Z axes: m/s² for accelerometer entries, rad/s for gyroscope
    /// entries, raw counts for other sources
    pub axes: [f32; 3],
}

/// One decoded telemetry packet
#[derive(Debug, Clone, PartialEq)]
pub struct MotionEvent {
    pub error_state: u16,
    pub status: u16,
    /// Up to [`IMU_ENTRY_SLOTS`] inertial samples
    pub samples: Vec<MotionSample>,
    /// Up to [`TIMESTAMP_ENTRY_SLOTS`] timestamp-only entries
    pub timestamps: Vec<TimestampEntry>,
}

/// Split a raw transfer into packets and decode each one.
///
/// Trailing bytes that do not form a complete packet are discarded. A packet
/// whose header declares more entries than the packet has slots for is
/// dropped in full and decoding continues with the next packet; malformed
/// packets are not an error. Events come back in packet order.
pub fn parse_motion_packets(data: &[u8]) -> Vec<MotionEvent> {
    let mut events = Vec::with_capacity(data.len() / PACKET_SIZE);

    for packet in data.chunks_exact(PACKET_SIZE) {
        let error_state = u16::from_le_bytes([packet[0], packet[1]]);
        let status = u16::from_le_bytes([packet[2], packet[3]]);
        let imu_entries = u16::from_le_bytes([packet[4], packet[5]]) as usize;
        let timestamp_entries = u16::from_le_bytes([packet[6], packet[7]]) as usize;

        if imu_entries > IMU_ENTRY_SLOTS || timestamp_entries > TIMESTAMP_ENTRY_SLOTS {
            debug!(
                "dropping packet with bad header: {} imu entries, {} timestamp entries",
                imu_entries, timestamp_entries
            );
            continue;
        }

        let mut samples = Vec::with_capacity(imu_entries);
        for i in 0..imu_entries {
            let offset = PACKET_HEADER_SIZE + i * IMU_ENTRY_SIZE;
            samples.push(parse_motion(&packet[offset..offset + IMU_ENTRY_SIZE]));
        }

        let mut timestamps = Vec::with_capacity(timestamp_entries);
        for i in 0..timestamp_entries {
            let offset = TIMESTAMP_BLOCK_OFFSET + i * TIMESTAMP_ENTRY_SIZE;
            timestamps.push(parse_timestamp(
                &packet[offset..offset + TIMESTAMP_ENTRY_SIZE],
            ));
        }

        events.push(MotionEvent {
            error_state,
            status,
            samples,
            timestamps,
        });
    }

    events
}

/// Decode the 6-byte timing field shared by both entry kinds.
///
/// The leading 16-bit word is little-endian on the wire: bits [0:2] carry
/// the source id, bits [3:14] the frame counter. Bytes 2-5 are a
/// little-endian 32-bit timestamp.
///
/// # Panics
/// Panics if `data` is shorter than [`TIMESTAMP_ENTRY_SIZE`].
pub fn parse_timestamp(data: &[u8]) -> TimestampEntry {
    let word = u16::from_le_bytes([data[0], data[1]]);

    TimestampEntry {
        source: MotionSource::from_bits(word),
        frame_number: (word & 0x7fff) >> 3,
        timestamp: u32::from_le_bytes([data[2], data[3], data[4], data[5]]),
    }
}

/// Decode one 12-byte inertial entry into a physical-unit sample.
///
/// The first 6 bytes are the shared timing field plus the validity flag in
/// bit 15. Bytes 6-11 are three signed 16-bit raw axis readings; the
/// accelerometer pads its readings with 4 low bits, which are shifted out
/// before scaling.
///
/// # Panics
/// Panics if `data` is shorter than [`IMU_ENTRY_SIZE`].
pub fn parse_motion(data: &[u8]) -> MotionSample {
    let timing = parse_timestamp(&data[..TIMESTAMP_ENTRY_SIZE]);
    let is_valid = data[1] >> 7 != 0; // bit 15 of the leading word

    let raw = [
        i16::from_le_bytes([data[6], data[7]]),
        i16::from_le_bytes([data[8], data[9]]),
        i16::from_le_bytes([data[10], data[11]]),
    ];

    let (shift, factor) = match timing.source {
        MotionSource::Accelerometer => (ACCEL_DATA_SHIFT, ACCEL_TRANSFORM_FACTOR),
        MotionSource::Gyroscope => (0, GYRO_TRANSFORM_FACTOR),
        MotionSource::Other(_) => (0, 1.0),
    };

    let mut axes = [0.0f32; 3];
    for (axis, &value) in axes.iter_mut().zip(raw.iter()) {
        *axis = (value >> shift) as f32 * factor;
    }

    MotionSample {
        source: timing.source,
        frame_number: timing.frame_number,
        timestamp: timing.timestamp,
        is_valid,
        axes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC_ACCEL: u8 = 0;
    const SRC_GYRO: u8 = 1;

    fn encode_timing(source: u8, frame: u16, timestamp: u32, valid: bool) -> [u8; 6] {
        let word =
            (source as u16 & 0x7) | ((frame & 0xfff) << 3) | ((valid as u16) << 15);

        let mut out = [0u8; 6];
        out[..2].copy_from_slice(&word.to_le_bytes());
        out[2..].copy_from_slice(&timestamp.to_le_bytes());
        out
    }

    fn encode_imu_entry(
        source: u8,
        frame: u16,
        timestamp: u32,
        valid: bool,
        raw: [i16; 3],
    ) -> [u8; 12] {
        let mut out = [0u8; 12];
        out[..6].copy_from_slice(&encode_timing(source, frame, timestamp, valid));
        for (i, value) in raw.iter().enumerate() {
            out[6 + i * 2..8 + i * 2].copy_from_slice(&value.to_le_bytes());
        }
        out
    }

    fn build_packet(
        status: u16,
        imu: &[[u8; IMU_ENTRY_SIZE]],
        timestamps: &[[u8; TIMESTAMP_ENTRY_SIZE]],
    ) -> [u8; PACKET_SIZE] {
        let mut packet = [0u8; PACKET_SIZE];
        packet[2..4].copy_from_slice(&status.to_le_bytes());
        packet[4..6].copy_from_slice(&(imu.len() as u16).to_le_bytes());
        packet[6..8].copy_from_slice(&(timestamps.len() as u16).to_le_bytes());

        for (i, entry) in imu.iter().enumerate() {
            let offset = PACKET_HEADER_SIZE + i * IMU_ENTRY_SIZE;
            packet[offset..offset + IMU_ENTRY_SIZE].copy_from_slice(entry);
        }
        for (i, entry) in timestamps.iter().enumerate() {
            let offset = TIMESTAMP_BLOCK_OFFSET + i * TIMESTAMP_ENTRY_SIZE;
            packet[offset..offset + TIMESTAMP_ENTRY_SIZE].copy_from_slice(entry);
        }

        packet
    }

    #[test]
    fn test_packet_size_constants() {
        assert_eq!(TIMESTAMP_BLOCK_OFFSET, 56);
        assert_eq!(PACKET_SIZE, 104);
    }

    #[test]
    fn test_empty_buffer() {
        assert!(parse_motion_packets(&[]).is_empty());
    }

    #[test]
    fn test_short_buffer_yields_nothing() {
        let buffer = vec![0u8; PACKET_SIZE - 1];
        assert!(parse_motion_packets(&buffer).is_empty());
    }

    #[test]
    fn test_trailing_bytes_discarded() {
        let mut buffer = build_packet(7, &[], &[]).to_vec();
        buffer.extend_from_slice(&[0xFF; 50]);

        let events = parse_motion_packets(&buffer);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, 7);
    }

    #[test]
    fn test_multiple_packets_in_order() {
        let mut buffer = Vec::new();
        for status in [10u16, 20, 30] {
            buffer.extend_from_slice(&build_packet(status, &[], &[]));
        }

        let events = parse_motion_packets(&buffer);
        assert_eq!(events.len(), 3);
        let statuses: Vec<u16> = events.iter().map(|e| e.status).collect();
        assert_eq!(statuses, vec![10, 20, 30]);
    }

    #[test]
    fn test_bad_header_drops_whole_packet() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&build_packet(1, &[], &[]));

        // imu entry count of 5 exceeds the 4 available slots
        let mut bad = build_packet(2, &[], &[]);
        bad[4..6].copy_from_slice(&5u16.to_le_bytes());
        buffer.extend_from_slice(&bad);

        // timestamp entry count of 9 exceeds the 8 available slots
        let mut bad = build_packet(3, &[], &[]);
        bad[6..8].copy_from_slice(&9u16.to_le_bytes());
        buffer.extend_from_slice(&bad);

        buffer.extend_from_slice(&build_packet(4, &[], &[]));

        let events = parse_motion_packets(&buffer);
        let statuses: Vec<u16> = events.iter().map(|e| e.status).collect();
        assert_eq!(statuses, vec![1, 4]);
    }

    #[test]
    fn test_header_fields_decoded() {
        let mut packet = build_packet(0xBEEF, &[], &[]);
        packet[0..2].copy_from_slice(&0xCAFEu16.to_le_bytes());

        let events = parse_motion_packets(&packet);
        assert_eq!(events[0].error_state, 0xCAFE);
        assert_eq!(events[0].status, 0xBEEF);
        assert!(events[0].samples.is_empty());
        assert!(events[0].timestamps.is_empty());
    }

    #[test]
    fn test_timestamp_bitfields() {
        let entry = parse_timestamp(&encode_timing(4, 0xABC, 0xDEAD_BEEF, false));

        assert_eq!(entry.source, MotionSource::Other(4));
        assert_eq!(entry.frame_number, 0xABC);
        assert_eq!(entry.timestamp, 0xDEAD_BEEF);
    }

    #[test]
    fn test_valid_bit_does_not_leak_into_frame_number() {
        let with_valid = parse_timestamp(&encode_timing(SRC_GYRO, 0xFFF, 1, true));
        let without = parse_timestamp(&encode_timing(SRC_GYRO, 0xFFF, 1, false));

        assert_eq!(with_valid.frame_number, 0xFFF);
        assert_eq!(with_valid.frame_number, without.frame_number);
    }

    #[test]
    fn test_is_valid_flag() {
        let valid = parse_motion(&encode_imu_entry(SRC_GYRO, 1, 2, true, [0, 0, 0]));
        let invalid = parse_motion(&encode_imu_entry(SRC_GYRO, 1, 2, false, [0, 0, 0]));

        assert!(valid.is_valid);
        assert!(!invalid.is_valid);
    }

    #[test]
    fn test_accel_shift_and_scale() {
        // 1 LSB after the 4-bit pad is shifted out
        let sample = parse_motion(&encode_imu_entry(SRC_ACCEL, 0, 0, true, [16, -16, 0]));

        assert_eq!(sample.source, MotionSource::Accelerometer);
        assert!((sample.axes[0] - ACCEL_TRANSFORM_FACTOR).abs() < 1e-6);
        assert!((sample.axes[1] + ACCEL_TRANSFORM_FACTOR).abs() < 1e-6);
        assert_eq!(sample.axes[2], 0.0);
    }

    #[test]
    fn test_accel_full_scale() {
        // largest positive padded reading: 2047 effective LSBs ≈ +4 g
        let raw = 2047i16 << 4;
        let sample = parse_motion(&encode_imu_entry(SRC_ACCEL, 0, 0, true, [raw, 0, 0]));

        let expected = 2047.0 * ACCEL_TRANSFORM_FACTOR;
        assert!((sample.axes[0] - expected).abs() < 1e-3);
        // ≈ full-scale range in m/s²
        assert!((sample.axes[0] - 4.0 * 9.871).abs() < 0.1);
    }

    #[test]
    fn test_gyro_full_scale() {
        let sample = parse_motion(&encode_imu_entry(SRC_GYRO, 0, 0, true, [i16::MAX, 0, 0]));

        // ±2000 °/s full scale expressed in rad/s
        let expected = 2000.0f32.to_radians();
        assert!((sample.axes[0] - expected).abs() < 0.01);
    }

    #[test]
    fn test_gyro_sample_end_to_end() {
        let entry = encode_imu_entry(SRC_GYRO, 42, 1_000_000, true, [100, -100, 0]);
        let packet = build_packet(0, &[entry], &[]);

        let events = parse_motion_packets(&packet);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].samples.len(), 1);
        assert!(events[0].timestamps.is_empty());

        let sample = &events[0].samples[0];
        assert_eq!(sample.source, MotionSource::Gyroscope);
        assert_eq!(sample.frame_number, 42);
        assert_eq!(sample.timestamp, 1_000_000);
        assert!((sample.axes[0] - 100.0 * GYRO_TRANSFORM_FACTOR).abs() < 1e-6);
        assert!((sample.axes[1] + 100.0 * GYRO_TRANSFORM_FACTOR).abs() < 1e-6);
        assert_eq!(sample.axes[2], 0.0);
    }

    #[test]
    fn test_other_source_passes_through_unscaled() {
        let sample = parse_motion(&encode_imu_entry(3, 0, 0, true, [5, -5, 123]));

        assert_eq!(sample.source, MotionSource::Other(3));
        assert_eq!(sample.axes, [5.0, -5.0, 123.0]);
    }

    #[test]
    fn test_full_packet_all_slots() {
        let imu: Vec<[u8; IMU_ENTRY_SIZE]> = (0..IMU_ENTRY_SLOTS as u16)
            .map(|i| encode_imu_entry(SRC_ACCEL, i, i as u32, true, [0, 0, 0]))
            .collect();
        let timestamps: Vec<[u8; TIMESTAMP_ENTRY_SIZE]> = (0..TIMESTAMP_ENTRY_SLOTS as u16)
            .map(|i| encode_timing(SRC_GYRO, 100 + i, i as u32, false))
            .collect();

        let packet = build_packet(0, &imu, &timestamps);
        let events = parse_motion_packets(&packet);

        assert_eq!(events[0].samples.len(), IMU_ENTRY_SLOTS);
        assert_eq!(events[0].timestamps.len(), TIMESTAMP_ENTRY_SLOTS);
        let frames: Vec<u16> = events[0].timestamps.iter().map(|t| t.frame_number).collect();
        assert_eq!(frames, vec![100, 101, 102, 103, 104, 105, 106, 107]);
    }
}
