use tracing::debug;

use crate::{error::NdefParseError, parser, record::NdefRecord};

/// An NDEF message, an ordered sequence of records. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, uniffi::Record)]
pub struct NdefMessage {
    pub records: Vec<NdefRecord>,
}

impl NdefMessage {
    pub fn new(records: Vec<NdefRecord>) -> Self {
        Self { records }
    }

    /// Parse a bare NDEF message, or one wrapped in the NDEF TLV found in
    /// type 2 tag memory.
    pub fn parse(data: &[u8]) -> Result<Self, NdefParseError> {
        let mut input = parser::stream::new(data);
        let records =
            parser::parse_message(&mut input).map_err(NdefParseError::from_parse_error)?;

        debug!("parsed NDEF message with {} records", records.len());
        Ok(Self { records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_single_text_record() {
        let bytes = vec![
            0xD1, 0x01, 0x08, 0x54, 0x02, b'e', b'n', b'H', b'e', b'l', b'l', b'o',
        ];

        let message = NdefMessage::parse(&bytes).unwrap();
        assert_eq!(message.records.len(), 1);
        assert_eq!(message.records[0].type_, b"T".to_vec());
        assert_eq!(message.records[0].payload.len(), 8);
    }

    #[test]
    fn truncated_data_is_incomplete() {
        let bytes = vec![0xD1, 0x01, 0x08, 0x54, 0x02];
        assert_eq!(NdefMessage::parse(&bytes), Err(NdefParseError::Incomplete));
    }

    #[test]
    fn tlv_length_mismatch_is_malformed() {
        // TLV claims 3 bytes but the record inside spans 5
        let bytes = vec![0x03, 0x03, 0xD1, 0x01, 0x01, 0x54, 0x00];
        assert!(matches!(
            NdefMessage::parse(&bytes),
            Err(NdefParseError::Malformed(_))
        ));
    }
}
