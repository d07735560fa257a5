pub mod stream;

use stream::{Stream, StreamExt as _};
use winnow::{
    ModalResult, Parser,
    binary::{
        Endianness, be_u8, be_u16,
        bits::{bits, bool as take_bool, take as take_bits},
    },
    error::{ContextError, ErrMode},
    token::{any, literal, take},
};

use crate::{header::NdefHeader, ndef_type::NdefType, record::NdefRecord};

/// NDEF message TLV tag in type 2 tag memory.
const TLV_NDEF_MESSAGE: u8 = 0x03;
/// Terminator TLV, marks the end of the used tag memory.
const TLV_TERMINATOR: u8 = 0xFE;

/// Parse a complete message. A leading NDEF TLV, as read out of type 2 tag
/// memory, is unwrapped first; bare record bytes are parsed as-is.
pub fn parse_message(input: &mut Stream<'_>) -> ModalResult<Vec<NdefRecord>> {
    if input.as_ref().first() == Some(&TLV_NDEF_MESSAGE) {
        return parse_tlv_message(input);
    }

    parse_ndef_records(input)
}

/// Records until one carries the message-end flag, at least one.
pub fn parse_ndef_records(input: &mut Stream<'_>) -> ModalResult<Vec<NdefRecord>> {
    let mut records = Vec::new();

    loop {
        let record = parse_ndef_record.parse_next(input)?;
        let message_end = record.header.message_end;
        records.push(record);

        if message_end {
            break;
        }
    }

    Ok(records)
}

pub fn parse_ndef_record(input: &mut Stream<'_>) -> ModalResult<NdefRecord> {
    let header = parse_header.parse_next(input)?;
    let type_ = parse_type(input, header.type_length)?;
    let id = parse_id(input, header.id_length)?;
    let payload = parse_payload(input, header.payload_length)?;

    Ok(NdefRecord {
        header,
        type_,
        id,
        payload,
    })
}

/// 0x03, a length (one byte, or 0xFF followed by a big-endian u16), the
/// message itself, then an optional terminator TLV.
fn parse_tlv_message(input: &mut Stream<'_>) -> ModalResult<Vec<NdefRecord>> {
    let _ = literal([TLV_NDEF_MESSAGE]).parse_next(input)?;

    let length_indicator = be_u8.parse_next(input)?;
    let message_length = if length_indicator == 255 {
        be_u16.parse_next(input)?
    } else {
        length_indicator as u16
    };

    let start_len = input.len();
    let records = parse_ndef_records(input)?;
    let parsed_bytes = start_len - input.len();

    if parsed_bytes != message_length as usize {
        return Err(ErrMode::Cut(ContextError::new()));
    }

    if input.as_ref().first() == Some(&TLV_TERMINATOR) {
        let _ = any.parse_next(input)?;
    }

    Ok(records)
}

// private

fn parse_header_byte(input: &mut Stream<'_>) -> ModalResult<(bool, bool, bool, bool, bool, u8)> {
    bits::<_, _, ErrMode<ContextError>, _, _>((
        take_bool,
        take_bool,
        take_bool,
        take_bool,
        take_bool,
        take_bits(3_u8),
    ))
    .parse_next(input)
}

fn parse_header(input: &mut Stream<'_>) -> ModalResult<NdefHeader> {
    let (message_begin, message_end, chunked, short_record, has_id_length, type_name_format) =
        parse_header_byte(input)?;

    let type_length = winnow::binary::u8.parse_next(input)?;
    let type_name_format = NdefType::from_code(type_name_format);

    let payload_length = if short_record {
        any.map(|x: u8| x as u32).parse_next(input)?
    } else {
        winnow::binary::u32(Endianness::Big).parse_next(input)?
    };

    let id_length = if has_id_length {
        Some(any.parse_next(input)?)
    } else {
        None
    };

    Ok(NdefHeader {
        message_begin,
        message_end,
        chunked,
        short_record,
        has_id_length,
        type_name_format,
        type_length,
        payload_length,
        id_length,
    })
}

fn parse_type(input: &mut Stream<'_>, type_length: u8) -> ModalResult<Vec<u8>> {
    take(type_length as usize)
        .map(|s: &[u8]| s.to_vec())
        .parse_next(input)
}

fn parse_id(input: &mut Stream<'_>, id_length: Option<u8>) -> ModalResult<Option<Vec<u8>>> {
    if let Some(id_len) = id_length {
        take(id_len as usize)
            .map(|s: &[u8]| Some(s.to_vec()))
            .parse_next(input)
    } else {
        Ok(None)
    }
}

fn parse_payload(input: &mut Stream<'_>, payload_length: u32) -> ModalResult<Vec<u8>> {
    take(payload_length as usize)
        .map(|s: &[u8]| s.to_vec())
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_record_bytes(message_begin: bool, message_end: bool, language: &str, text: &str) -> Vec<u8> {
        let mut payload = vec![language.len() as u8];
        payload.extend_from_slice(language.as_bytes());
        payload.extend_from_slice(text.as_bytes());

        let mut header = 0b0001_0001; // SR, TNF well-known
        if message_begin {
            header |= 0b1000_0000;
        }
        if message_end {
            header |= 0b0100_0000;
        }

        let mut bytes = vec![header, 0x01, payload.len() as u8, b'T'];
        bytes.extend_from_slice(&payload);
        bytes
    }

    fn wrap_in_tlv(message: &[u8]) -> Vec<u8> {
        let mut tlv = vec![TLV_NDEF_MESSAGE];

        if message.len() < 255 {
            tlv.push(message.len() as u8);
        } else {
            tlv.push(0xFF);
            tlv.extend_from_slice(&(message.len() as u16).to_be_bytes());
        }

        tlv.extend_from_slice(message);
        tlv.push(TLV_TERMINATOR);
        tlv
    }

    #[test]
    fn known_header_parse() {
        let mut header_bytes = stream::new(&[0xD1, 0x01, 0x0D, 0x55, 0x02]);
        let header = parse_header(&mut header_bytes).unwrap();

        assert!(header.message_begin);
        assert!(header.message_end);
        assert!(!header.chunked);
        assert!(header.short_record);
        assert!(!header.has_id_length);
        assert_eq!(header.type_name_format, NdefType::WellKnown);
        assert_eq!(header.type_length, 1);
        assert_eq!(header.payload_length, 13);
    }

    #[test]
    fn parses_bare_single_record_message() {
        let bytes = text_record_bytes(true, true, "en", "Hello");
        let mut input = stream::new(&bytes);

        let records = parse_message(&mut input).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].type_, b"T".to_vec());
        assert_eq!(records[0].id, None);
        assert_eq!(records[0].payload, b"\x02enHello".to_vec());
        assert!(input.is_empty());
    }

    #[test]
    fn parses_two_record_message() {
        let mut bytes = text_record_bytes(true, false, "en", "Hello");
        bytes.extend_from_slice(&text_record_bytes(false, true, "en", "World"));

        let mut input = stream::new(&bytes);
        let records = parse_message(&mut input).unwrap();

        assert_eq!(records.len(), 2);
        assert!(!records[0].header.message_end);
        assert!(records[1].header.message_end);
        assert_eq!(records[1].payload, b"\x02enWorld".to_vec());
    }

    #[test]
    fn parses_record_with_id() {
        let bytes = vec![0xD9, 0x01, 0x02, 0x01, 0x54, 0xAA, 0x02, 0x03];
        let mut input = stream::new(&bytes);

        let record = parse_ndef_record(&mut input).unwrap();
        assert!(record.header.has_id_length);
        assert_eq!(record.id, Some(vec![0xAA]));
        assert_eq!(record.payload, vec![0x02, 0x03]);
    }

    #[test]
    fn parses_long_record_header() {
        let text = "x".repeat(300);
        let mut payload = vec![0x02, b'e', b'n'];
        payload.extend_from_slice(text.as_bytes());

        // MB, ME, long record, TNF well-known
        let mut bytes = vec![0xC1, 0x01];
        bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        bytes.push(b'T');
        bytes.extend_from_slice(&payload);

        let mut input = stream::new(&bytes);
        let records = parse_message(&mut input).unwrap();

        assert_eq!(records.len(), 1);
        assert!(!records[0].header.short_record);
        assert_eq!(records[0].header.payload_length, payload.len() as u32);
    }

    #[test]
    fn parses_tlv_wrapped_message() {
        let message = text_record_bytes(true, true, "de", "Karte");
        let bytes = wrap_in_tlv(&message);

        let mut input = stream::new(&bytes);
        let records = parse_message(&mut input).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload, b"\x02deKarte".to_vec());
        assert!(input.is_empty());
    }

    #[test]
    fn parses_tlv_with_extended_length() {
        let message = {
            let text = "y".repeat(400);
            let mut payload = vec![0x02, b'e', b'n'];
            payload.extend_from_slice(text.as_bytes());

            let mut bytes = vec![0xC1, 0x01];
            bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            bytes.push(b'T');
            bytes.extend_from_slice(&payload);
            bytes
        };

        let bytes = wrap_in_tlv(&message);
        assert_eq!(bytes[1], 0xFF);

        let mut input = stream::new(&bytes);
        let records = parse_message(&mut input).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn leaves_trailing_bytes_unconsumed() {
        let mut bytes = text_record_bytes(true, true, "en", "Hello");
        bytes.extend_from_slice(&[0x00, 0x00, 0x00]);

        let mut input = stream::new(&bytes);
        let _ = parse_message(&mut input).unwrap();

        assert_eq!(input.len(), 3);
    }

    #[test]
    fn truncated_message_is_incomplete() {
        let bytes = text_record_bytes(true, true, "en", "Hello");
        let mut input = stream::new(&bytes[..6]);

        let result = parse_message(&mut input);
        assert!(matches!(result, Err(error) if error.is_incomplete()));
    }
}
