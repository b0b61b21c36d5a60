//! Records, their wire format and the cards printed from them.

mod card;
mod payload;

pub use card::EncodedCard;
pub use payload::{hash_text, Metadata, PayloadCodec, Record, RecordHash};
