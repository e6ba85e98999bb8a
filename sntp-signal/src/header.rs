//! The 48-byte NTPv3/v4 fixed header (spec.md §3.1/§4.4): an immutable
//! buffer with accessors, built through a mutable [`NtpHeaderBuilder`].

use crate::error::ReadError;
use crate::instant::Duration;
use crate::timestamp::Timestamp64;
use crate::wire::heapless_ascii::AsciiField;
use crate::wire::{
    pow2_to_duration, read_32_signed_fixed_point_duration,
    read_32_unsigned_fixed_point_duration, read_ascii, read_i8, read_u32, read_u8,
    write_32_signed_fixed_point_duration, write_32_unsigned_fixed_point_duration, write_ascii,
    write_i8, write_u32, write_u8,
};

const LEN: usize = 48;

const LEAP_SHIFT: u8 = 6;
const LEAP_MASK: u8 = 0b1100_0000;
const VERSION_SHIFT: u8 = 3;
const VERSION_MASK: u8 = 0b0011_1000;
const MODE_SHIFT: u8 = 0;
const MODE_MASK: u8 = 0b0000_0111;

const OFF_FLAGS: usize = 0;
const OFF_STRATUM: usize = 1;
const OFF_POLL: usize = 2;
const OFF_PRECISION: usize = 3;
const OFF_ROOT_DELAY: usize = 4;
const OFF_ROOT_DISPERSION: usize = 8;
const OFF_REF_ID: usize = 12;
const OFF_REF_TIMESTAMP: usize = 16;
const OFF_ORIGINATE_TIMESTAMP: usize = 24;
const OFF_RECEIVE_TIMESTAMP: usize = 32;
const OFF_TRANSMIT_TIMESTAMP: usize = 40;

/// Lenient poll-exponent range accepted at read time by default: some
/// deployed servers use values below the RFC-suggested 4 (spec.md §9).
pub const POLL_RANGE_LENIENT: core::ops::RangeInclusive<u8> = 0..=17;
/// The RFC 4330-suggested strict poll-exponent range, exposed only as a
/// constant for callers who want it (spec.md §9).
pub const POLL_RANGE_STRICT: core::ops::RangeInclusive<u8> = 4..=17;

fn read_timestamp(buf: &[u8; LEN], offset: usize) -> Timestamp64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    Timestamp64::from_be_bytes(bytes)
}

fn write_timestamp(buf: &mut [u8; LEN], offset: usize, value: Timestamp64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_be_bytes());
}

/// An immutable, validated-on-write 48-byte NTP header.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct NtpHeader {
    bytes: [u8; LEN],
}

impl NtpHeader {
    #[must_use]
    pub fn to_bytes(&self) -> [u8; LEN] {
        self.bytes
    }

    /// Reinterprets a raw 48-byte buffer as a header with no validation
    /// beyond size (which is guaranteed by the `[u8; 48]` type itself).
    /// Field-level validation happens lazily, per accessor, per spec.md §4.4.
    #[must_use]
    pub fn from_bytes(bytes: [u8; LEN]) -> Self {
        NtpHeader { bytes }
    }

    #[must_use]
    pub fn leap(&self) -> u8 {
        (self.bytes[OFF_FLAGS] & LEAP_MASK) >> LEAP_SHIFT
    }

    #[must_use]
    pub fn version(&self) -> u8 {
        (self.bytes[OFF_FLAGS] & VERSION_MASK) >> VERSION_SHIFT
    }

    #[must_use]
    pub fn mode(&self) -> u8 {
        (self.bytes[OFF_FLAGS] & MODE_MASK) >> MODE_SHIFT
    }

    #[must_use]
    pub fn stratum(&self) -> u8 {
        read_u8(&self.bytes, OFF_STRATUM)
    }

    /// Reads the poll exponent, checked against [`POLL_RANGE_LENIENT`].
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::InvalidNtpValue`] if the raw value is outside
    /// the lenient range.
    pub fn poll(&self) -> Result<u8, ReadError> {
        let raw = read_u8(&self.bytes, OFF_POLL);
        if POLL_RANGE_LENIENT.contains(&raw) {
            Ok(raw)
        } else {
            Err(ReadError::InvalidNtpValue("poll exponent outside [0, 17]"))
        }
    }

    #[must_use]
    pub fn precision(&self) -> i8 {
        read_i8(&self.bytes, OFF_PRECISION)
    }

    /// The server clock's precision as a duration (`2^precision` seconds).
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::InvalidNtpValue`] if `precision()` is `>= 0`
    /// (per spec.md, the exponent must be negative) or `< -62`.
    pub fn precision_duration(&self) -> Result<Duration, ReadError> {
        let exp = self.precision();
        if exp >= 0 {
            return Err(ReadError::InvalidNtpValue("precision exponent must be negative"));
        }
        pow2_to_duration(-i32::from(exp))
    }

    #[must_use]
    pub fn root_delay(&self) -> Duration {
        read_32_signed_fixed_point_duration(&self.bytes, OFF_ROOT_DELAY)
    }

    #[must_use]
    pub fn root_dispersion(&self) -> Duration {
        read_32_unsigned_fixed_point_duration(&self.bytes, OFF_ROOT_DISPERSION)
    }

    /// Raw 4-byte reference identifier (ASCII for KoD/stratum-1 servers,
    /// packed IPv4 for stratum 2-15).
    #[must_use]
    pub fn reference_identifier_bytes(&self) -> [u8; 4] {
        let raw = read_u32(&self.bytes, OFF_REF_ID);
        raw.to_be_bytes()
    }

    /// Reference identifier interpreted as an ASCII code (valid for
    /// stratum 0/1 responses; stratum 2-15 responses pack an IPv4 address
    /// in this field instead and callers should use
    /// [`NtpHeader::reference_identifier_bytes`] there).
    #[must_use]
    pub fn reference_identifier_ascii(&self) -> AsciiField {
        read_ascii(&self.bytes, OFF_REF_ID, 4)
    }

    #[must_use]
    pub fn reference_timestamp(&self) -> Timestamp64 {
        read_timestamp(&self.bytes, OFF_REF_TIMESTAMP)
    }

    #[must_use]
    pub fn originate_timestamp(&self) -> Timestamp64 {
        read_timestamp(&self.bytes, OFF_ORIGINATE_TIMESTAMP)
    }

    #[must_use]
    pub fn receive_timestamp(&self) -> Timestamp64 {
        read_timestamp(&self.bytes, OFF_RECEIVE_TIMESTAMP)
    }

    #[must_use]
    pub fn transmit_timestamp(&self) -> Timestamp64 {
        read_timestamp(&self.bytes, OFF_TRANSMIT_TIMESTAMP)
    }
}

/// A mutable, in-place builder over a 48-byte buffer. Setters validate
/// their argument's range immediately (write-time errors per spec.md §7);
/// [`NtpHeaderBuilder::build`] hands ownership of the finished buffer to
/// an immutable [`NtpHeader`].
#[derive(Debug, Clone)]
pub struct NtpHeaderBuilder {
    bytes: [u8; LEN],
}

impl Default for NtpHeaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NtpHeaderBuilder {
    #[must_use]
    pub fn new() -> Self {
        NtpHeaderBuilder { bytes: [0u8; LEN] }
    }

    /// Starts from an existing header's bytes, so individual fields can be
    /// overwritten without reconstructing the rest.
    #[must_use]
    pub fn from_header(header: &NtpHeader) -> Self {
        NtpHeaderBuilder { bytes: header.bytes }
    }

    /// # Errors
    ///
    /// Returns [`ReadError::InvalidArgument`] if `leap > 3`.
    pub fn leap(&mut self, leap: u8) -> Result<&mut Self, ReadError> {
        if leap > 3 {
            return Err(ReadError::InvalidArgument("leap indicator out of [0, 3]"));
        }
        self.set_flags(LEAP_MASK, LEAP_SHIFT, leap);
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`ReadError::InvalidArgument`] if `version > 7`.
    pub fn version(&mut self, version: u8) -> Result<&mut Self, ReadError> {
        if version > 7 {
            return Err(ReadError::InvalidArgument("version out of [0, 7]"));
        }
        self.set_flags(VERSION_MASK, VERSION_SHIFT, version);
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`ReadError::InvalidArgument`] if `mode > 7`.
    pub fn mode(&mut self, mode: u8) -> Result<&mut Self, ReadError> {
        if mode > 7 {
            return Err(ReadError::InvalidArgument("mode out of [0, 7]"));
        }
        self.set_flags(MODE_MASK, MODE_SHIFT, mode);
        Ok(self)
    }

    fn set_flags(&mut self, mask: u8, shift: u8, value: u8) {
        let cleared = self.bytes[OFF_FLAGS] & !mask;
        self.bytes[OFF_FLAGS] = cleared | (value << shift);
    }

    pub fn stratum(&mut self, stratum: u8) -> &mut Self {
        write_u8(&mut self.bytes, OFF_STRATUM, stratum);
        self
    }

    /// # Errors
    ///
    /// Returns [`ReadError::InvalidArgument`] if `poll` is outside
    /// [`POLL_RANGE_LENIENT`].
    pub fn poll(&mut self, poll: u8) -> Result<&mut Self, ReadError> {
        if !POLL_RANGE_LENIENT.contains(&poll) {
            return Err(ReadError::InvalidArgument("poll exponent outside [0, 17]"));
        }
        write_u8(&mut self.bytes, OFF_POLL, poll);
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`ReadError::InvalidArgument`] if `precision >= 0`.
    pub fn precision(&mut self, precision: i8) -> Result<&mut Self, ReadError> {
        if precision >= 0 {
            return Err(ReadError::InvalidArgument("precision exponent must be negative"));
        }
        write_i8(&mut self.bytes, OFF_PRECISION, precision);
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`ReadError::InvalidArgument`] if `delay.seconds()` is
    /// outside `[-2^15, 2^15)`.
    pub fn root_delay(&mut self, delay: Duration) -> Result<&mut Self, ReadError> {
        write_32_signed_fixed_point_duration(&mut self.bytes, OFF_ROOT_DELAY, delay)?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`ReadError::InvalidArgument`] if `dispersion.seconds()` is
    /// outside `[0, 2^16)`.
    pub fn root_dispersion(&mut self, dispersion: Duration) -> Result<&mut Self, ReadError> {
        write_32_unsigned_fixed_point_duration(&mut self.bytes, OFF_ROOT_DISPERSION, dispersion)?;
        Ok(self)
    }

    pub fn reference_identifier_bytes(&mut self, id: [u8; 4]) -> &mut Self {
        self.bytes[OFF_REF_ID..OFF_REF_ID + 4].copy_from_slice(&id);
        self
    }

    /// # Errors
    ///
    /// Returns [`ReadError::InvalidArgument`] if `id` is longer than 4
    /// bytes or contains a byte outside `[32, 126]`.
    pub fn reference_identifier_ascii(&mut self, id: &str) -> Result<&mut Self, ReadError> {
        write_ascii(&mut self.bytes, OFF_REF_ID, 4, id)?;
        Ok(self)
    }

    pub fn reference_timestamp(&mut self, ts: Timestamp64) -> &mut Self {
        write_timestamp(&mut self.bytes, OFF_REF_TIMESTAMP, ts);
        self
    }

    pub fn originate_timestamp(&mut self, ts: Timestamp64) -> &mut Self {
        write_timestamp(&mut self.bytes, OFF_ORIGINATE_TIMESTAMP, ts);
        self
    }

    pub fn receive_timestamp(&mut self, ts: Timestamp64) -> &mut Self {
        write_timestamp(&mut self.bytes, OFF_RECEIVE_TIMESTAMP, ts);
        self
    }

    pub fn transmit_timestamp(&mut self, ts: Timestamp64) -> &mut Self {
        write_timestamp(&mut self.bytes, OFF_TRANSMIT_TIMESTAMP, ts);
        self
    }

    /// Finalizes the builder into an immutable [`NtpHeader`].
    #[must_use]
    pub fn build(&self) -> NtpHeader {
        NtpHeader { bytes: self.bytes }
    }
}
