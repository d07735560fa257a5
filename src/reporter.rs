//! Structural projection of detected messages for the application boundary.

use cardlink_ndef::{NdefMessage, NdefRecord};

/// One record of a detection notification, bytes in transportable hex form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, uniffi::Record)]
pub struct DetectedRecord {
    /// Integer code of the record's type name format
    pub type_: u8,
    pub identifier: String,
    pub payload: String,
}

/// Outward facing projection of one NDEF message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, uniffi::Record)]
pub struct DetectedMessage {
    pub records: Vec<DetectedRecord>,
}

/// Raw structural echo of the detected messages. No filtering and no
/// decoding; text extraction only ever affects the status message.
pub fn report(messages: &[NdefMessage]) -> Vec<DetectedMessage> {
    messages.iter().map(detected_message).collect()
}

fn detected_message(message: &NdefMessage) -> DetectedMessage {
    let records = message.records.iter().map(detected_record).collect();
    DetectedMessage { records }
}

fn detected_record(record: &NdefRecord) -> DetectedRecord {
    DetectedRecord {
        type_: record.header.type_name_format.code(),
        identifier: hex::encode(record.id.as_deref().unwrap_or_default()),
        payload: hex::encode(&record.payload),
    }
}
