//! Async persistence seam

use async_trait::async_trait;
use std::path::Path;

use crate::Result;

/// Save and restore state to a file
#[async_trait]
pub trait Persist {
    /// Write the current state to `path`
    async fn save(&self, path: &Path) -> Result<()>;

    /// Replace the current state with the contents of `path`.
    ///
    /// Implementations must leave `self` untouched when this returns an error.
    async fn load(&mut self, path: &Path) -> Result<()>;
}
