use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("directory snapshot is older than the currently installed one")]
    StaleDirectorySnapshot,

    #[error("session event end time precedes its start time")]
    InvertedSessionWindow,
}
