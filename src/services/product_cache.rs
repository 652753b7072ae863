// src/services/product_cache.rs

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::inventory::Product;

#[derive(Default)]
struct CacheState {
    // Incrementa a cada invalidação; impede gravar uma listagem lida antes dela
    generation: u64,
    products: Option<Arc<Vec<Product>>>,
}

/// Cache em memória da listagem de produtos, invalidado a cada mutação.
#[derive(Clone, Default)]
pub struct ProductListCache {
    state: Arc<RwLock<CacheState>>,
}

impl ProductListCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Devolve a listagem em cache e a geração atual.
    pub async fn get(&self) -> (u64, Option<Arc<Vec<Product>>>) {
        let state = self.state.read().await;
        (state.generation, state.products.clone())
    }

    /// Guarda a listagem apenas se ninguém invalidou desde `generation`.
    pub async fn put(&self, generation: u64, products: Arc<Vec<Product>>) -> bool {
        let mut state = self.state.write().await;
        if state.generation != generation {
            return false;
        }
        state.products = Some(products);
        true
    }

    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        state.generation = state.generation.wrapping_add(1);
        state.products = None;
        tracing::debug!(generation = state.generation, "Cache de produtos invalidado");
    }
}
