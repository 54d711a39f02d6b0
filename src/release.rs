//! Scoped release of a [`FrameSource`].
//!
//! [`ReleaseGuard`] owns an open source for the duration of a run and closes
//! it exactly once: either through an explicit [`release`](ReleaseGuard::release)
//! at the end of the pipeline, or from `Drop` when an earlier step returned
//! an error.
//!
//! Close failures are logged at `warn` and discarded. A failed close never
//! replaces the outcome of the run it belongs to.

use std::ops::{Deref, DerefMut};

use crate::source::FrameSource;

/// Owns a [`FrameSource`] and releases it exactly once.
#[derive(Debug)]
pub struct ReleaseGuard<S: FrameSource> {
    source: S,
    released: bool,
}

impl<S: FrameSource> ReleaseGuard<S> {
    /// Take ownership of an open source.
    pub fn new(source: S) -> Self {
        Self {
            source,
            released: false,
        }
    }

    /// Release the source now.
    ///
    /// Closes the audio sub-resource (if open) and then the reader. Each step
    /// swallows its own error.
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if self.source.has_audio() {
            if let Err(error) = self.source.close_audio() {
                log::warn!("Ignoring audio close failure: {error}");
            }
        }
        if let Err(error) = self.source.close() {
            log::warn!("Ignoring reader close failure: {error}");
        }
    }
}

impl<S: FrameSource> Deref for ReleaseGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.source
    }
}

impl<S: FrameSource> DerefMut for ReleaseGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: FrameSource> Drop for ReleaseGuard<S> {
    fn drop(&mut self) {
        self.release_once();
    }
}
