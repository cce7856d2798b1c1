use thiserror::Error;

/// The single recoverable failure surfaced by this crate.
///
/// `read` on an empty, stopped queue raises this; every other condition
/// (including a full queue) is a success-valued `false`, not an error.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum QueueError {
    #[error("Queue has been stopped already")]
    Stopped,
}
