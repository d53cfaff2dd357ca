//! Shared handles every engine works with.

use std::sync::Arc;

use duka_core::Settings;
use duka_db::Store;

use crate::ids::IdGenerator;
use crate::locks::AggregateLocks;

/// Store, settings, locks and id clock. Cheap to clone; clones share the
/// same locks so engines built from one context serialize against each
/// other.
#[derive(Clone)]
pub struct EngineContext {
    store: Arc<dyn Store>,
    settings: Arc<Settings>,
    locks: AggregateLocks,
    ids: Arc<IdGenerator>,
}

impl EngineContext {
    pub fn new(store: Arc<dyn Store>, settings: Settings) -> Self {
        EngineContext {
            store,
            settings: Arc::new(settings),
            locks: AggregateLocks::new(),
            ids: Arc::new(IdGenerator::new()),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn locks(&self) -> &AggregateLocks {
        &self.locks
    }

    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }
}
