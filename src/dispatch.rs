//! Dispatch Table
//!
//! Fixed mapping from [`Category`] to the backend that executes it, resolved
//! once at startup.

use crate::backend::GenerationBackend;
use crate::category::Category;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default, Clone)]
pub struct DispatchTable {
    backends: HashMap<Category, Arc<dyn GenerationBackend>>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the backend for `category`
    pub fn register(mut self, category: Category, backend: Arc<dyn GenerationBackend>) -> Self {
        self.backends.insert(category, backend);
        self
    }

    pub fn resolve(&self, category: Category) -> Option<Arc<dyn GenerationBackend>> {
        self.backends.get(&category).cloned()
    }

    pub fn contains(&self, category: Category) -> bool {
        self.backends.contains_key(&category)
    }

    /// Registered categories in a stable order
    pub fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self.backends.keys().copied().collect();
        categories.sort();
        categories
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTable")
            .field("categories", &self.categories())
            .finish()
    }
}
