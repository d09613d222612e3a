use std::sync::Arc;

use crate::errors::SourceError;
use crate::model::PlayerSnapshot;

/// Source of player state polled once per tick.
///
/// Implementations must return within a bounded network timeout; an expired
/// timeout is reported as [`SourceError::Unavailable`].
pub trait StatusSource {
    fn fetch(&self) -> Result<PlayerSnapshot, SourceError>;
}

impl<S: StatusSource + ?Sized> StatusSource for Box<S> {
    fn fetch(&self) -> Result<PlayerSnapshot, SourceError> {
        (**self).fetch()
    }
}

impl<S: StatusSource + ?Sized> StatusSource for Arc<S> {
    fn fetch(&self) -> Result<PlayerSnapshot, SourceError> {
        (**self).fetch()
    }
}
