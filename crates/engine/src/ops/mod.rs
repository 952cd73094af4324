use std::sync::Arc;

use crate::store::DocumentStore;
use crate::{EngineError, ResultEngine};

mod donations;
mod programs;
pub mod reports;
mod users;
mod volunteers;

pub use donations::DonationFeed;

/// Run a block inside a store transaction, committing on success and rolling
/// back (by drop) on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let mut $tx = $self.store.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// The domain service layer: every operation talks to the document store
/// through [`DocumentStore`], and every multi-document aggregate update runs
/// inside the store's transaction primitive.
pub struct Engine {
    store: Arc<dyn DocumentStore>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Shared handle to the underlying store.
    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store)
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn DocumentStore>>,
}

impl EngineBuilder {
    /// Pass the required document store.
    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> ResultEngine<Engine> {
        let store = self
            .store
            .ok_or_else(|| EngineError::InvalidField("store is required".to_string()))?;
        Ok(Engine { store })
    }
}
