use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use eyre::{eyre, Result};
use tracing::warn;

/// raised once by Ctrl+C, polled by the sweep between steps
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    raised: Arc<AtomicBool>,
}

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// register the process-wide handler; it can only be installed once
    pub fn install() -> Result<Self> {
        let flag = Self::new();
        let handler_flag = flag.clone();
        ctrlc::set_handler(move || {
            warn!("Ctrl+C received, flushing the report after the current step");
            handler_flag.raise();
        })
        .map_err(|e| eyre!("cannot install the Ctrl+C handler: {}", e))?;
        Ok(flag)
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}
