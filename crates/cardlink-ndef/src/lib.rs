pub mod error;
pub mod header;
pub mod message;
pub mod ndef_type;
pub mod parser;
pub mod record;
pub mod text;

mod ffi;

pub use error::NdefParseError;
pub use header::NdefHeader;
pub use message::NdefMessage;
pub use ndef_type::NdefType;
pub use record::NdefRecord;
pub use text::{TextPayload, TextPayloadFormat, decode_text};

uniffi::setup_scaffolding!();
