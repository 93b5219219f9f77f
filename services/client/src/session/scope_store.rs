//! services/client/src/session/scope_store.rs
//!
//! Client-side cache of the known scopes, in backend order.

use crate::error::SessionError;
use pocket_rag_core::domain::{Scope, ScopeId};
use pocket_rag_core::ports::RetrievalBackend;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub struct ScopeStore {
    backend: Arc<dyn RetrievalBackend>,
    scopes: RwLock<Vec<Scope>>,
}

impl ScopeStore {
    pub fn new(backend: Arc<dyn RetrievalBackend>) -> Self {
        Self {
            backend,
            scopes: RwLock::new(Vec::new()),
        }
    }

    /// A copy of the cached scopes.
    pub async fn scopes(&self) -> Vec<Scope> {
        self.scopes.read().await.clone()
    }

    pub async fn get(&self, scope_id: &ScopeId) -> Option<Scope> {
        self.scopes
            .read()
            .await
            .iter()
            .find(|s| &s.id == scope_id)
            .cloned()
    }

    /// Fetches every scope and replaces the cache wholesale.
    ///
    /// On failure the previous cache is kept as it was.
    pub async fn list_scopes(&self) -> Result<Vec<Scope>, SessionError> {
        match self.backend.list_scopes().await {
            Ok(scopes) => {
                info!("Fetched {} scope(s).", scopes.len());
                *self.scopes.write().await = scopes.clone();
                Ok(scopes)
            }
            Err(e) => {
                warn!("Failed to fetch scopes, keeping the cached list: {}", e);
                Err(e.into())
            }
        }
    }

    pub async fn create_scope(&self, name: &str) -> Result<Scope, SessionError> {
        let name = validate_name(name)?;
        let scope = self.backend.create_scope(name).await?;
        info!("Created scope {} ('{}').", scope.id, scope.name);
        self.scopes.write().await.push(scope.clone());
        Ok(scope)
    }

    /// Renames a scope in place, keeping its id and position.
    ///
    /// A rename to the name already cached returns the cached scope without a request.
    pub async fn rename_scope(&self, scope_id: &ScopeId, new_name: &str) -> Result<Scope, SessionError> {
        let name = validate_name(new_name)?;
        if let Some(existing) = self.get(scope_id).await {
            if existing.name == name {
                debug!("Scope {} already named '{}', skipping rename.", scope_id, name);
                return Ok(existing);
            }
        }

        let renamed = self.backend.rename_scope(scope_id, name).await?;
        let mut scopes = self.scopes.write().await;
        match scopes.iter_mut().find(|s| &s.id == scope_id) {
            Some(slot) => *slot = renamed.clone(),
            None => warn!("Renamed scope {} is not in the cache.", scope_id),
        }
        info!("Renamed scope {} to '{}'.", scope_id, renamed.name);
        Ok(renamed)
    }
}

fn validate_name(name: &str) -> Result<&str, SessionError> {
    let name = name.trim();
    if name.is_empty() {
        Err(SessionError::validation("Subject name must not be empty."))
    } else {
        Ok(name)
    }
}
