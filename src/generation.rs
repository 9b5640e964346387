//! Render generation counter.
//!
//! Every navigation bumps the counter and hands the new value to the render
//! it starts. Async continuations compare their token with the counter before
//! touching shared state; a mismatch means a newer request exists and the
//! continuation drops its result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct RenderGeneration {
    counter: Arc<AtomicU64>,
}

impl RenderGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Start a new generation, invalidating every outstanding token.
    pub fn advance(&self) -> GenerationToken {
        let value = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        GenerationToken {
            value,
            counter: self.counter.clone(),
        }
    }

    /// Token for the generation already in progress.
    pub fn token(&self) -> GenerationToken {
        GenerationToken {
            value: self.current(),
            counter: self.counter.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationToken {
    value: u64,
    counter: Arc<AtomicU64>,
}

impl GenerationToken {
    /// A token nobody else can invalidate, for one-off renders outside a viewer.
    pub fn unguarded() -> Self {
        RenderGeneration::new().token()
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::SeqCst) == self.value
    }
}
