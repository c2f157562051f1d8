use thiserror::Error;

/// Offsets, widths and encodings of the status frame fields.
pub mod layout;

use layout::{
    Encoding, Field, DRY_CONTACT, DRY_CONTACTS, FRAME_LEN, HARDWARE_VERSION, OPTICAL_RELAY,
    OPTICAL_RELAYS, RELAY, SELF_TEMPERATURE, SOFTWARE_VERSION,
};

/// The first characters of frames built by [`encode`].
const HEADER: &[u8] = b"TSC1";

/// A decoded status response.
///
/// Only ever published after a complete frame decoded successfully,
/// so no field is ever left at some placeholder value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceStatus {
    /// Hardware version.
    pub hardware_version: u8,

    /// Software version.
    pub software_version: u8,

    /// Device internal temperature, in device units.
    pub self_temperature: u8,

    /// Electromagnetic relay state.
    pub relay_state: u8,

    /// Optical relays.
    pub optical_relay_state: OpticalRelays,

    /// One byte per dry contact, as reported.
    pub dry_contact_state: [u8; DRY_CONTACTS],
}

impl DeviceStatus {
    /// A status with some fields filled in.
    /// The mock device reports this unless told otherwise.
    pub fn example() -> Self {
        let mut dry_contact_state = [b'0'; DRY_CONTACTS];
        dry_contact_state[2] = b'1';
        dry_contact_state[17] = b'1';

        Self {
            hardware_version: 0x12,
            software_version: 0x15,
            self_temperature: 0x22,
            relay_state: 0,
            optical_relay_state: OpticalRelays::from_bits([false, true, false, true]),
            dry_contact_state,
        }
    }
}

/// The state of the four optical relays, packed the way the device reports them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpticalRelays(u8);

impl OpticalRelays {
    /// One flag per relay, most significant first.
    pub fn from_bits(bits: [bool; OPTICAL_RELAYS]) -> Self {
        Self(bits.iter().fold(0, |acc, on| (acc << 1) | u8::from(*on)))
    }

    fn from_nibble(nibble: u8) -> Self {
        Self(nibble & 0x0F)
    }

    /// The hex digit as it appears in a frame.
    pub fn nibble(&self) -> u8 {
        self.0
    }

    /// `'0'`/`'1'` per relay, most significant first.
    pub fn bits(&self) -> [char; OPTICAL_RELAYS] {
        [3, 2, 1, 0].map(|shift| if (self.0 >> shift) & 1 == 1 { '1' } else { '0' })
    }
}

/// Why a frame was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedFrame {
    /// Not enough characters to hold every field.
    #[error("Frame is {len} characters long, at least {} are needed", FRAME_LEN)]
    TooShort {
        /// The length of the rejected frame.
        len: usize,
    },

    /// Some field did not hold what its encoding requires.
    #[error("Field `{field}` at {start}..{end} is not {encoding}: `{found}`")]
    BadField {
        /// Name of the field.
        field: &'static str,

        /// First character of the field.
        start: usize,

        /// One past the last character of the field.
        end: usize,

        /// What was expected.
        encoding: Encoding,

        /// What was there instead, lossily converted.
        found: String,
    },
}

impl MalformedFrame {
    fn bad_field(field: &Field, raw: &[u8]) -> Self {
        Self::BadField {
            field: field.name,
            start: field.range.start,
            end: field.range.end,
            encoding: field.encoding,
            found: String::from_utf8_lossy(raw).into_owned(),
        }
    }
}

fn field_bytes<'frame>(frame: &'frame [u8], field: &Field) -> &'frame [u8] {
    &frame[field.range.clone()]
}

fn hex_value(frame: &[u8], field: &Field) -> Result<u8, MalformedFrame> {
    let raw = field_bytes(frame, field);

    // `from_str_radix` would let a leading `+` through.
    if !raw.iter().all(u8::is_ascii_hexdigit) {
        return Err(MalformedFrame::bad_field(field, raw));
    }

    std::str::from_utf8(raw)
        .ok()
        .and_then(|digits| u8::from_str_radix(digits, 16).ok())
        .ok_or_else(|| MalformedFrame::bad_field(field, raw))
}

fn decimal_digit(frame: &[u8], field: &Field) -> Result<u8, MalformedFrame> {
    match field_bytes(frame, field) {
        [digit] if digit.is_ascii_digit() => Ok(digit - b'0'),
        raw => Err(MalformedFrame::bad_field(field, raw)),
    }
}

fn nibble(frame: &[u8], field: &Field) -> Result<OpticalRelays, MalformedFrame> {
    // A single hex digit never exceeds 0xF.
    hex_value(frame, field).map(OpticalRelays::from_nibble)
}

fn contacts(frame: &[u8], field: &Field) -> Result<[u8; DRY_CONTACTS], MalformedFrame> {
    let raw = field_bytes(frame, field);

    // Control characters would split the one line reply.
    if raw.iter().any(u8::is_ascii_control) {
        return Err(MalformedFrame::bad_field(field, raw));
    }

    raw.try_into().map_err(|_| MalformedFrame::bad_field(field, raw))
}

/// Decode a raw status response.
///
/// Characters beyond the last field (such as a trailing `\r\n`) are ignored.
/// Either every field decodes, or the whole frame is rejected.
pub fn decode(frame: &[u8]) -> Result<DeviceStatus, MalformedFrame> {
    if frame.len() < FRAME_LEN {
        return Err(MalformedFrame::TooShort { len: frame.len() });
    }

    Ok(DeviceStatus {
        hardware_version: hex_value(frame, &HARDWARE_VERSION)?,
        software_version: hex_value(frame, &SOFTWARE_VERSION)?,
        self_temperature: hex_value(frame, &SELF_TEMPERATURE)?,
        relay_state: decimal_digit(frame, &RELAY)?,
        optical_relay_state: nibble(frame, &OPTICAL_RELAY)?,
        dry_contact_state: contacts(frame, &DRY_CONTACT)?,
    })
}

fn put(frame: &mut [u8], field: &Field, bytes: &[u8]) {
    let width = field.width().min(bytes.len());

    frame[field.range.start..field.range.start + width].copy_from_slice(&bytes[..width]);
}

/// Build a frame which [`decode`]s back into the given status.
///
/// Positions not covered by a field are filled with `'0'`.
/// Relay states above 9 are truncated to their last digit.
pub fn encode(status: &DeviceStatus) -> Vec<u8> {
    let mut frame = vec![b'0'; FRAME_LEN];
    frame[..HEADER.len()].copy_from_slice(HEADER);

    let optical = status.optical_relay_state.nibble();

    put(
        &mut frame,
        &HARDWARE_VERSION,
        format!("{:02X}", status.hardware_version).as_bytes(),
    );
    put(
        &mut frame,
        &SOFTWARE_VERSION,
        format!("{:02X}", status.software_version).as_bytes(),
    );
    put(&mut frame, &OPTICAL_RELAY, format!("{optical:X}").as_bytes());
    put(
        &mut frame,
        &RELAY,
        format!("{}", status.relay_state % 10).as_bytes(),
    );
    put(&mut frame, &DRY_CONTACT, &status.dry_contact_state);
    put(
        &mut frame,
        &SELF_TEMPERATURE,
        format!("{:02X}", status.self_temperature).as_bytes(),
    );

    frame
}
