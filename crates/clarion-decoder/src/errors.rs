//! [crates/clarion-decoder/src/errors.rs]

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("packet too short: need at least {needed} bytes, got {available}")]
    ShortPacket { needed: usize, available: usize },
    #[error("unsupported NetFlow/IPFIX version {found}")]
    BadVersion { found: u16 },
    #[error("data flowset references unknown template {template_id} from exporter {exporter_id}")]
    UnknownTemplate { exporter_id: String, template_id: u16 },
    #[error("malformed record: {reason}")]
    MalformedRecord { reason: String },
    #[error("flow timestamps skewed beyond tolerance: {reason}")]
    TimeSkew { reason: String },
}
