//! The sensor reading record, sent node -> station once per
//! reading cycle.

use crate::schema::{
    decode_record, encode_record, get_f32, get_text, get_u32, put_f32, put_text, put_u32,
    Decoded, Field, FieldKind, WireRecord,
};
use crate::text::fixed_str;

pub const UNITS_LEN: usize = 4;
pub const STATUS_TEXT_LEN: usize = 12;

/// Bytes on the wire for one [`SensorPayload`]
pub const SENSOR_PAYLOAD_LEN: usize = <SensorPayload as WireRecord>::WIRE_LEN;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorPayload {
    /// Averaged capacitance of the sensing capacitor
    pub capacitance: f32,
    /// Milliseconds on the node clock spent taking the measurement
    pub sensor_time: u32,
    /// Successful transmissions since the node booted
    pub ct_success: u32,
    /// Failed transmissions since the last successful one
    pub ct_errors: u32,
    /// Unit label, e.g. `pF`
    pub units: [u8; UNITS_LEN],
    /// Free text debug field
    pub status_text: [u8; STATUS_TEXT_LEN],
}

fn decode_capacitance(p: &mut SensorPayload, b: &[u8]) {
    p.capacitance = get_f32(b);
}

fn encode_capacitance(p: &SensorPayload, b: &mut [u8]) {
    put_f32(b, p.capacitance);
}

fn decode_sensor_time(p: &mut SensorPayload, b: &[u8]) {
    p.sensor_time = get_u32(b);
}

fn encode_sensor_time(p: &SensorPayload, b: &mut [u8]) {
    put_u32(b, p.sensor_time);
}

fn decode_ct_success(p: &mut SensorPayload, b: &[u8]) {
    p.ct_success = get_u32(b);
}

fn encode_ct_success(p: &SensorPayload, b: &mut [u8]) {
    put_u32(b, p.ct_success);
}

fn decode_ct_errors(p: &mut SensorPayload, b: &[u8]) {
    p.ct_errors = get_u32(b);
}

fn encode_ct_errors(p: &SensorPayload, b: &mut [u8]) {
    put_u32(b, p.ct_errors);
}

fn decode_units(p: &mut SensorPayload, b: &[u8]) {
    p.units = get_text(b);
}

fn encode_units(p: &SensorPayload, b: &mut [u8]) {
    put_text(b, &p.units);
}

fn decode_status_text(p: &mut SensorPayload, b: &[u8]) {
    p.status_text = get_text(b);
}

fn encode_status_text(p: &SensorPayload, b: &mut [u8]) {
    put_text(b, &p.status_text);
}

impl WireRecord for SensorPayload {
    // Numeric fields first, text last. Keep this order in lockstep
    // with the node firmware; it builds against this same table.
    const SCHEMA: &'static [Field<Self>] = &[
        Field {
            name: "capacitance",
            kind: FieldKind::F32,
            decode: decode_capacitance,
            encode: encode_capacitance,
        },
        Field {
            name: "sensorTime",
            kind: FieldKind::U32,
            decode: decode_sensor_time,
            encode: encode_sensor_time,
        },
        Field {
            name: "ctSuccess",
            kind: FieldKind::U32,
            decode: decode_ct_success,
            encode: encode_ct_success,
        },
        Field {
            name: "ctErrors",
            kind: FieldKind::U32,
            decode: decode_ct_errors,
            encode: encode_ct_errors,
        },
        Field {
            name: "units",
            kind: FieldKind::Text(UNITS_LEN),
            decode: decode_units,
            encode: encode_units,
        },
        Field {
            name: "statusText",
            kind: FieldKind::Text(STATUS_TEXT_LEN),
            decode: decode_status_text,
            encode: encode_status_text,
        },
    ];
}

impl SensorPayload {
    pub fn decode(bytes: &[u8]) -> Decoded<Self> {
        decode_record(bytes)
    }

    pub fn encode(&self, out: &mut [u8]) -> usize {
        encode_record(self, out)
    }

    pub fn to_bytes(&self) -> [u8; SENSOR_PAYLOAD_LEN] {
        let mut buf = [0u8; SENSOR_PAYLOAD_LEN];
        self.encode(&mut buf);
        buf
    }

    pub fn units_str(&self) -> &str {
        fixed_str(&self.units)
    }

    pub fn status_str(&self) -> &str {
        fixed_str(&self.status_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::fixed_text;
    use proptest::prelude::*;

    fn sample() -> SensorPayload {
        SensorPayload {
            capacitance: 187.25,
            sensor_time: 3012,
            ct_success: 41,
            ct_errors: 2,
            units: fixed_text("pF"),
            status_text: fixed_text("OK"),
        }
    }

    #[test]
    fn layout_is_32_bytes() {
        assert_eq!(SENSOR_PAYLOAD_LEN, 32);
        let widths: usize = SensorPayload::SCHEMA.iter().map(|f| f.width()).sum();
        assert_eq!(widths, SENSOR_PAYLOAD_LEN);
    }

    #[test]
    fn field_offsets_follow_declared_order() {
        let bytes = sample().to_bytes();
        assert_eq!(&bytes[0..4], &187.25f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &3012u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &41u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &2u32.to_le_bytes());
        assert_eq!(&bytes[16..20], b"pF\0\0");
        assert_eq!(&bytes[20..22], b"OK");
        assert!(bytes[22..32].iter().all(|b| *b == 0));
    }

    #[test]
    fn decode_known_frame() {
        let decoded = SensorPayload::decode(&sample().to_bytes());
        assert_eq!(decoded.record, sample());
        assert_eq!(decoded.cursor, SENSOR_PAYLOAD_LEN);
        assert_eq!(decoded.record.units_str(), "pF");
        assert_eq!(decoded.record.status_str(), "OK");
    }

    #[test]
    fn oversized_receive_buffer_ignores_tail() {
        let mut rx = [0xffu8; 40];
        rx[..SENSOR_PAYLOAD_LEN].copy_from_slice(&sample().to_bytes());
        assert_eq!(SensorPayload::decode(&rx).record, sample());
    }

    #[test]
    fn truncated_frame_keeps_leading_fields() {
        let bytes = sample().to_bytes();
        let decoded = SensorPayload::decode(&bytes[..10]);
        assert_eq!(decoded.record.capacitance, 187.25);
        assert_eq!(decoded.record.sensor_time, 3012);
        // two of the four ct_success bytes made it
        assert_eq!(decoded.record.ct_success, 41);
        assert_eq!(decoded.record.ct_errors, 0);
        assert_eq!(decoded.record.units_str(), "");
        assert_eq!(decoded.cursor, SENSOR_PAYLOAD_LEN);
    }

    proptest! {
        #[test]
        fn reencode_reproduces_wire_bytes(bytes in proptest::collection::vec(any::<u8>(), SENSOR_PAYLOAD_LEN)) {
            let decoded = SensorPayload::decode(&bytes);
            prop_assert_eq!(decoded.cursor, SENSOR_PAYLOAD_LEN);
            let mut out = [0u8; SENSOR_PAYLOAD_LEN];
            prop_assert_eq!(decoded.record.encode(&mut out), SENSOR_PAYLOAD_LEN);
            prop_assert_eq!(&out[..], &bytes[..]);
        }
    }
}
