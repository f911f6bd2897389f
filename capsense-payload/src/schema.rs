//! Schema driven codec for the fixed-layout radio records.
//!
//! A record type lists its fields once, in wire order, as [`Field`]
//! descriptors. Decoding walks that list against a byte slice,
//! handing each field exactly `width` bytes at the current cursor and
//! advancing the cursor by the same width. Encoding is the same walk
//! in reverse. Scalars are little-endian on the wire (both the AVR
//! node and the ARM station are little-endian, so the bytes are
//! copied verbatim).

use crate::MAX_PAYLOAD_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    I16,
    U32,
    F32,
    /// Fixed width character array, not guaranteed to be NUL terminated
    Text(usize),
}

impl FieldKind {
    pub const fn width(self) -> usize {
        match self {
            FieldKind::U8 => 1,
            FieldKind::I16 => 2,
            FieldKind::U32 | FieldKind::F32 => 4,
            FieldKind::Text(len) => len,
        }
    }
}

/// One entry of a record's wire layout
pub struct Field<T> {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Loads the field from exactly `kind.width()` bytes
    pub decode: fn(&mut T, &[u8]),
    /// Stores the field into exactly `kind.width()` bytes
    pub encode: fn(&T, &mut [u8]),
}

impl<T> Field<T> {
    pub const fn width(&self) -> usize {
        self.kind.width()
    }
}

/// Sum of the widths of every field in `schema`
pub const fn wire_len<T>(schema: &[Field<T>]) -> usize {
    let mut len = 0;
    let mut i = 0;
    while i < schema.len() {
        len += schema[i].kind.width();
        i += 1;
    }
    len
}

/// A record with a fixed, declared wire layout
pub trait WireRecord: Default + Sized + 'static {
    const SCHEMA: &'static [Field<Self>];
    const WIRE_LEN: usize = wire_len(Self::SCHEMA);
    /// Evaluated by the codec; a layout wider than one radio payload
    /// fails to compile
    const FITS_RADIO: () = assert!(
        Self::WIRE_LEN <= MAX_PAYLOAD_LEN,
        "record layout exceeds the radio payload limit"
    );
}

/// Result of decoding: the record plus the final cursor position,
/// which always equals [`WireRecord::WIRE_LEN`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoded<T> {
    pub record: T,
    pub cursor: usize,
}

/// Load a record field by field from `bytes`.
///
/// An undersized buffer is not an error: bytes past the end of
/// `bytes` read as zero. Bytes past the end of the schema are ignored.
pub fn decode_record<T: WireRecord>(bytes: &[u8]) -> Decoded<T> {
    #[allow(clippy::let_unit_value)]
    let () = T::FITS_RADIO;
    let mut record = T::default();
    let mut scratch = [0u8; MAX_PAYLOAD_LEN];
    let mut cursor = 0;

    for field in T::SCHEMA {
        let width = field.width();
        let window = &mut scratch[..width];
        window.fill(0);

        let available = bytes.len().saturating_sub(cursor).min(window.len());
        if let Some(src) = bytes.get(cursor..cursor + available) {
            window[..available].copy_from_slice(src);
        }

        (field.decode)(&mut record, window);
        cursor += width;
    }

    Decoded { record, cursor }
}

/// Store a record field by field into `out`, returning the number of
/// bytes written. Fields that run past the end of `out` are cut off.
pub fn encode_record<T: WireRecord>(record: &T, out: &mut [u8]) -> usize {
    #[allow(clippy::let_unit_value)]
    let () = T::FITS_RADIO;
    let mut scratch = [0u8; MAX_PAYLOAD_LEN];
    let mut cursor = 0;

    for field in T::SCHEMA {
        let width = field.width();
        let window = &mut scratch[..width];
        window.fill(0);
        (field.encode)(record, window);

        let fits = out.len().saturating_sub(cursor).min(window.len());
        if let Some(dst) = out.get_mut(cursor..cursor + fits) {
            dst.copy_from_slice(&window[..fits]);
        }
        cursor += width;
    }

    cursor.min(out.len())
}

// Scalar accessors shared by the record schemas. Short slices are
// zero extended rather than rejected.

fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    let n = bytes.len().min(N);
    buf[..n].copy_from_slice(&bytes[..n]);
    buf
}

fn put_array(out: &mut [u8], bytes: &[u8]) {
    let n = out.len().min(bytes.len());
    out[..n].copy_from_slice(&bytes[..n]);
}

pub(crate) fn get_u8(bytes: &[u8]) -> u8 {
    bytes.first().copied().unwrap_or_default()
}

pub(crate) fn put_u8(out: &mut [u8], val: u8) {
    put_array(out, &[val]);
}

pub(crate) fn get_i16(bytes: &[u8]) -> i16 {
    i16::from_le_bytes(le_array(bytes))
}

pub(crate) fn put_i16(out: &mut [u8], val: i16) {
    put_array(out, &val.to_le_bytes());
}

pub(crate) fn get_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes(le_array(bytes))
}

pub(crate) fn put_u32(out: &mut [u8], val: u32) {
    put_array(out, &val.to_le_bytes());
}

pub(crate) fn get_f32(bytes: &[u8]) -> f32 {
    f32::from_le_bytes(le_array(bytes))
}

pub(crate) fn put_f32(out: &mut [u8], val: f32) {
    put_array(out, &val.to_le_bytes());
}

pub(crate) fn get_text<const N: usize>(bytes: &[u8]) -> [u8; N] {
    le_array(bytes)
}

pub(crate) fn put_text(out: &mut [u8], text: &[u8]) {
    put_array(out, text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Triple {
        flag: u8,
        offset: i16,
        count: u32,
    }

    fn decode_flag(p: &mut Triple, b: &[u8]) {
        p.flag = get_u8(b);
    }
    fn encode_flag(p: &Triple, b: &mut [u8]) {
        put_u8(b, p.flag);
    }
    fn decode_offset(p: &mut Triple, b: &[u8]) {
        p.offset = get_i16(b);
    }
    fn encode_offset(p: &Triple, b: &mut [u8]) {
        put_i16(b, p.offset);
    }
    fn decode_count(p: &mut Triple, b: &[u8]) {
        p.count = get_u32(b);
    }
    fn encode_count(p: &Triple, b: &mut [u8]) {
        put_u32(b, p.count);
    }

    impl WireRecord for Triple {
        const SCHEMA: &'static [Field<Self>] = &[
            Field {
                name: "flag",
                kind: FieldKind::U8,
                decode: decode_flag,
                encode: encode_flag,
            },
            Field {
                name: "offset",
                kind: FieldKind::I16,
                decode: decode_offset,
                encode: encode_offset,
            },
            Field {
                name: "count",
                kind: FieldKind::U32,
                decode: decode_count,
                encode: encode_count,
            },
        ];
    }

    #[test]
    fn packed_offsets_have_no_padding() {
        // a C compiler would pad `offset` to 2 and `count` to 4
        let bytes = [0x07, 0xfe, 0xff, 0x01, 0x02, 0x03, 0x04];
        let decoded = decode_record::<Triple>(&bytes);
        assert_eq!(
            decoded.record,
            Triple {
                flag: 7,
                offset: -2,
                count: 0x0403_0201,
            }
        );
        assert_eq!(decoded.cursor, 7);
        assert_eq!(Triple::WIRE_LEN, 7);
    }

    #[test]
    fn layouts_fit_one_radio_payload() {
        let () = Triple::FITS_RADIO;
        let () = crate::SensorPayload::FITS_RADIO;
        let () = crate::AckPayload::FITS_RADIO;
        assert!(crate::SENSOR_PAYLOAD_LEN <= MAX_PAYLOAD_LEN);
        assert!(crate::ACK_PAYLOAD_LEN <= MAX_PAYLOAD_LEN);

        // widest field is a whole payload; the cursor and the bytes agree
        #[derive(Debug, Default, PartialEq)]
        struct Wide([u8; MAX_PAYLOAD_LEN]);
        fn decode_wide(w: &mut Wide, b: &[u8]) {
            w.0 = get_text(b);
        }
        fn encode_wide(w: &Wide, b: &mut [u8]) {
            put_text(b, &w.0);
        }
        impl WireRecord for Wide {
            const SCHEMA: &'static [Field<Self>] = &[Field {
                name: "wide",
                kind: FieldKind::Text(MAX_PAYLOAD_LEN),
                decode: decode_wide,
                encode: encode_wide,
            }];
        }

        let bytes = [0x5au8; MAX_PAYLOAD_LEN];
        let decoded = decode_record::<Wide>(&bytes);
        assert_eq!(decoded.record, Wide(bytes));
        assert_eq!(decoded.cursor, MAX_PAYLOAD_LEN);
        let mut out = [0u8; MAX_PAYLOAD_LEN];
        assert_eq!(encode_record(&decoded.record, &mut out), MAX_PAYLOAD_LEN);
        assert_eq!(out, bytes);
    }

    #[test]
    fn short_buffer_reads_zeroes() {
        let decoded = decode_record::<Triple>(&[0x01, 0x02]);
        assert_eq!(decoded.record.flag, 1);
        assert_eq!(decoded.record.offset, 2);
        assert_eq!(decoded.record.count, 0);
        assert_eq!(decoded.cursor, Triple::WIRE_LEN);

        let empty = decode_record::<Triple>(&[]);
        assert_eq!(empty.record, Triple::default());
    }

    #[test]
    fn encode_truncates_to_output() {
        let triple = Triple {
            flag: 0xaa,
            offset: 0x1122,
            count: 0xdead_beef,
        };
        let mut out = [0u8; 4];
        assert_eq!(encode_record(&triple, &mut out), 4);
        assert_eq!(out, [0xaa, 0x22, 0x11, 0xef]);

        let mut full = [0u8; 10];
        assert_eq!(encode_record(&triple, &mut full), 7);
        assert_eq!(&full[7..], &[0, 0, 0]);
    }
}
