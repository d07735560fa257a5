use crate::{header::NdefHeader, ndef_type::NdefType};

/// A single NDEF record. The payload is kept as the raw bytes found on the
/// tag so it can be echoed across the application boundary unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, uniffi::Record)]
pub struct NdefRecord {
    pub header: NdefHeader,
    pub type_: Vec<u8>,
    pub id: Option<Vec<u8>>,
    pub payload: Vec<u8>,
}

impl NdefRecord {
    pub fn type_name_format(&self) -> NdefType {
        self.header.type_name_format
    }

    /// True for a well-known Text ("T") record.
    pub fn is_text(&self) -> bool {
        self.header.type_name_format == NdefType::WellKnown && self.type_ == b"T"
    }
}
