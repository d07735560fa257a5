use crate::{
    error::NdefParseError,
    message::NdefMessage,
    record::NdefRecord,
    text::{self, TextPayload},
};

#[uniffi::export]
fn parse_ndef_message(data: Vec<u8>) -> Result<NdefMessage, NdefParseError> {
    NdefMessage::parse(&data)
}

#[uniffi::export]
fn decode_text_records(records: Vec<NdefRecord>) -> String {
    text::decode_text(&records)
}

#[uniffi::export]
fn string_from_record(record: NdefRecord) -> Option<String> {
    TextPayload::from_record(&record).map(|payload| payload.text)
}

#[uniffi::export]
fn data_from_records(records: Vec<NdefRecord>) -> Vec<u8> {
    records
        .into_iter()
        .filter(|record| !record.is_text())
        .flat_map(|record| record.payload)
        .collect()
}
