//! Request handlers.

pub mod home;
pub mod tasks;

use thiserror::Error;

use crate::background::QueueError;
use crate::database::StoreError;

/// Anything a view does not handle itself. Turned into a `500` by the router.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Template(#[from] askama::Error),
}
