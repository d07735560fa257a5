use crate::record::NdefRecord;

/// Low 6 bits of the status byte give the language code length, bit 7
/// selects UTF-16.
const LANGUAGE_CODE_LENGTH_MASK: u8 = 0x3F;
const UTF16_FLAG: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum TextPayloadFormat {
    Utf8,
    Utf16,
}

/// A decoded well-known Text record payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, uniffi::Record)]
pub struct TextPayload {
    pub format: TextPayloadFormat,
    pub language: String,
    pub text: String,
}

impl TextPayload {
    /// Decode a single record. `None` for anything that is not a well formed
    /// well-known Text record, malformed payloads included.
    pub fn from_record(record: &NdefRecord) -> Option<Self> {
        if !record.is_text() {
            return None;
        }

        let payload = record.payload.as_slice();
        let status = *payload.first()?;

        let language_code_length = (status & LANGUAGE_CODE_LENGTH_MASK) as usize;
        if payload.len() <= language_code_length + 1 {
            return None;
        }

        let language =
            String::from_utf8_lossy(&payload[1..1 + language_code_length]).to_string();
        let text_bytes = &payload[1 + language_code_length..];

        if status & UTF16_FLAG == 0 {
            let text = std::str::from_utf8(text_bytes).ok()?.to_string();
            return Some(Self {
                format: TextPayloadFormat::Utf8,
                language,
                text,
            });
        }

        if text_bytes.len() % 2 != 0 {
            return None;
        }

        let units: Vec<u16> = text_bytes
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();

        let text = String::from_utf16(&units).ok()?;
        Some(Self {
            format: TextPayloadFormat::Utf16,
            language,
            text,
        })
    }
}

/// Concatenated text of every well-known Text record, in record order.
/// Records that are not text, or carry a malformed payload, contribute
/// nothing; this never fails.
pub fn decode_text(records: &[NdefRecord]) -> String {
    records
        .iter()
        .filter_map(TextPayload::from_record)
        .map(|payload| payload.text)
        .collect()
}
