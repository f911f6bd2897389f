//! ACK payload, station -> node, piggybacked on the radio's
//! acknowledgement of each received reading.

use crate::schema::{
    decode_record, encode_record, get_f32, get_i16, get_u32, get_u8, put_f32, put_i16, put_u32,
    put_u8, Decoded, Field, FieldKind, WireRecord,
};
use crate::PayloadError;

pub const ACK_PAYLOAD_LEN: usize = <AckPayload as WireRecord>::WIRE_LEN;

/// Commands the station can send back to the node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// No command back
    None = 0,
    /// Sleep for `uli_cmd_data` milliseconds, then take a reading
    /// and send it
    SleepThenReport = 1,
}

impl TryFrom<u8> for Command {
    type Error = PayloadError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(Command::None),
            1 => Ok(Command::SleepThenReport),
            other => Err(PayloadError::UnknownCommand(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AckPayload {
    pub command: u8,
    pub ui_cmd_data: u8,
    /// 16 bits on both ends (an `int` on the AVR node)
    pub i_cmd_data: i16,
    pub uli_cmd_data: u32,
    pub f_cmd_data: f32,
}

fn decode_command(p: &mut AckPayload, b: &[u8]) {
    p.command = get_u8(b);
}

fn encode_command(p: &AckPayload, b: &mut [u8]) {
    put_u8(b, p.command);
}

fn decode_ui(p: &mut AckPayload, b: &[u8]) {
    p.ui_cmd_data = get_u8(b);
}

fn encode_ui(p: &AckPayload, b: &mut [u8]) {
    put_u8(b, p.ui_cmd_data);
}

fn decode_i(p: &mut AckPayload, b: &[u8]) {
    p.i_cmd_data = get_i16(b);
}

fn encode_i(p: &AckPayload, b: &mut [u8]) {
    put_i16(b, p.i_cmd_data);
}

fn decode_uli(p: &mut AckPayload, b: &[u8]) {
    p.uli_cmd_data = get_u32(b);
}

fn encode_uli(p: &AckPayload, b: &mut [u8]) {
    put_u32(b, p.uli_cmd_data);
}

fn decode_f(p: &mut AckPayload, b: &[u8]) {
    p.f_cmd_data = get_f32(b);
}

fn encode_f(p: &AckPayload, b: &mut [u8]) {
    put_f32(b, p.f_cmd_data);
}

impl WireRecord for AckPayload {
    const SCHEMA: &'static [Field<Self>] = &[
        Field {
            name: "command",
            kind: FieldKind::U8,
            decode: decode_command,
            encode: encode_command,
        },
        Field {
            name: "uiCmdData",
            kind: FieldKind::U8,
            decode: decode_ui,
            encode: encode_ui,
        },
        Field {
            name: "iCmdData",
            kind: FieldKind::I16,
            decode: decode_i,
            encode: encode_i,
        },
        Field {
            name: "uliCmdData",
            kind: FieldKind::U32,
            decode: decode_uli,
            encode: encode_uli,
        },
        Field {
            name: "fCmdData",
            kind: FieldKind::F32,
            decode: decode_f,
            encode: encode_f,
        },
    ];
}

impl AckPayload {
    /// ACK that carries no command
    pub fn none() -> Self {
        Self::default()
    }

    pub fn sleep_then_report(sleep_ms: u32) -> Self {
        Self {
            command: Command::SleepThenReport as u8,
            uli_cmd_data: sleep_ms,
            ..Self::default()
        }
    }

    pub fn command(&self) -> Result<Command, PayloadError> {
        Command::try_from(self.command)
    }

    pub fn decode(bytes: &[u8]) -> Decoded<Self> {
        decode_record(bytes)
    }

    pub fn encode(&self, out: &mut [u8]) -> usize {
        encode_record(self, out)
    }

    pub fn to_bytes(&self) -> [u8; ACK_PAYLOAD_LEN] {
        let mut buf = [0u8; ACK_PAYLOAD_LEN];
        self.encode(&mut buf);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_is_12_bytes() {
        assert_eq!(ACK_PAYLOAD_LEN, 12);
        assert_eq!(AckPayload::none().to_bytes(), [0u8; 12]);
    }

    #[test]
    fn sleep_command_layout() {
        let ack = AckPayload::sleep_then_report(90_000);
        let bytes = ack.to_bytes();
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[4..8], &90_000u32.to_le_bytes());

        let decoded = AckPayload::decode(&bytes);
        assert_eq!(decoded.cursor, ACK_PAYLOAD_LEN);
        assert_eq!(decoded.record.command(), Ok(Command::SleepThenReport));
        assert_eq!(decoded.record.uli_cmd_data, 90_000);
    }

    #[test]
    fn signed_field_keeps_sign() {
        let ack = AckPayload {
            i_cmd_data: -300,
            ..AckPayload::none()
        };
        assert_eq!(AckPayload::decode(&ack.to_bytes()).record.i_cmd_data, -300);
    }

    #[test]
    fn unknown_command_is_rejected() {
        let ack = AckPayload {
            command: 9,
            ..AckPayload::none()
        };
        assert_eq!(ack.command(), Err(PayloadError::UnknownCommand(9)));
    }
}
