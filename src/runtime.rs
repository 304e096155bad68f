//! Lifecycle of the host test framework's runtime container. The container
//! is built before an import or export runs and released unconditionally
//! afterwards, including on failure paths.

use tracing::debug;

use crate::caps::Caps;
use crate::errors::Result;

pub struct RuntimeContainer {
    caps: Caps,
    cleaned: bool,
}

impl RuntimeContainer {
    pub async fn build(caps: Caps) -> Result<Self> {
        debug!("building runtime container");
        Ok(RuntimeContainer {
            caps,
            cleaned: false,
        })
    }

    pub fn caps(&self) -> &Caps {
        &self.caps
    }

    pub async fn clean(&mut self) -> Result<()> {
        debug!("releasing runtime container");
        self.cleaned = true;
        Ok(())
    }

    pub fn is_cleaned(&self) -> bool {
        self.cleaned
    }
}

/// Releases the container, logging instead of propagating on failure.
pub async fn clean_quietly(container: &mut RuntimeContainer) {
    if let Err(err) = container.clean().await {
        debug!("error during container cleanup: {}", err);
    }
}
