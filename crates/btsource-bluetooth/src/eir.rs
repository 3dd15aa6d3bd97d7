//! Extended inquiry response (EIR) payload parsing.
//!
//! An EIR payload is a sequence of `[length][type][data...]` fields where
//! `length` counts the type byte plus the data. A zero length ends the
//! significant part of the payload.

use btsource_core::{ParseError, MAX_DEVICE_NAME_LEN};

/// Shortened local name.
pub const EIR_TYPE_SHORT_LOCAL_NAME: u8 = 0x08;
/// Complete local name.
pub const EIR_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;
/// TX power level.
pub const EIR_TYPE_TX_POWER_LEVEL: u8 = 0x0A;

/// Longest EIR payload a controller delivers.
pub const MAX_EIR_LEN: usize = 240;

/// Iterator over the fields of an EIR payload.
///
/// Yields `(type, data)` pairs and stops after the first malformed field.
pub struct EirFields<'a> {
    payload: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> EirFields<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            payload,
            offset: 0,
            done: false,
        }
    }
}

impl<'a> Iterator for EirFields<'a> {
    type Item = Result<(u8, &'a [u8]), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.payload.len() {
            return None;
        }

        let len = self.payload[self.offset] as usize;
        if len == 0 {
            self.done = true;
            return None;
        }

        let end = self.offset + 1 + len;
        if end > self.payload.len() {
            self.done = true;
            return Some(Err(ParseError::TruncatedEir {
                offset: self.offset,
            }));
        }

        let field_type = self.payload[self.offset + 1];
        let data = &self.payload[self.offset + 2..end];
        self.offset = end;
        Some(Ok((field_type, data)))
    }
}

/// Find the data of the first well-formed field of `field_type`.
pub fn resolve(payload: &[u8], field_type: u8) -> Option<&[u8]> {
    EirFields::new(payload)
        .map_while(Result::ok)
        .find(|(t, _)| *t == field_type)
        .map(|(_, data)| data)
}

/// Extract the advertised device name.
///
/// Prefers the complete local name and falls back to the shortened one. The
/// result is cut to [`MAX_DEVICE_NAME_LEN`] bytes.
pub fn device_name(payload: &[u8]) -> Option<&[u8]> {
    let name = resolve(payload, EIR_TYPE_COMPLETE_LOCAL_NAME)
        .or_else(|| resolve(payload, EIR_TYPE_SHORT_LOCAL_NAME))?;
    Some(&name[..name.len().min(MAX_DEVICE_NAME_LEN)])
}

/// Builds EIR payloads, for simulated peers and tests.
#[derive(Debug, Default, Clone)]
pub struct EirBuilder {
    buf: Vec<u8>,
}

impl EirBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw field. Data beyond what fits in one field is dropped.
    pub fn field(mut self, field_type: u8, data: &[u8]) -> Self {
        let data = &data[..data.len().min(u8::MAX as usize - 1)];
        self.buf.push(data.len() as u8 + 1);
        self.buf.push(field_type);
        self.buf.extend_from_slice(data);
        self
    }

    pub fn complete_name(self, name: &str) -> Self {
        self.field(EIR_TYPE_COMPLETE_LOCAL_NAME, name.as_bytes())
    }

    pub fn short_name(self, name: &str) -> Self {
        self.field(EIR_TYPE_SHORT_LOCAL_NAME, name.as_bytes())
    }

    pub fn tx_power(self, dbm: i8) -> Self {
        self.field(EIR_TYPE_TX_POWER_LEVEL, &[dbm as u8])
    }

    /// Finish the payload, zero padded to [`MAX_EIR_LEN`] like a controller
    /// delivers it. Oversized payloads are cut.
    pub fn build(mut self) -> Vec<u8> {
        self.buf.resize(MAX_EIR_LEN, 0);
        self.buf
    }
}
