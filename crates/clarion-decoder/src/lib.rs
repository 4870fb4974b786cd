//! [crates/clarion-decoder/src/lib.rs]
//! Flow-export wire decoding: NetFlow v5 (fixed format), NetFlow v9,
//! and IPFIX (both template-based). The template-based formats share
//! a per-exporter template cache and a bounded buffer for data records
//! that outrun their template.

pub mod common;
pub mod decoder;
pub mod errors;
pub mod field;
pub mod ipfix;
pub mod template;
pub mod v5;
pub mod v9;

pub use decoder::{DecodeOutcome, FlowDecoder};
pub use errors::DecodeError;
pub use template::{PendingRecord, Template, TemplateCache, TemplateField};
