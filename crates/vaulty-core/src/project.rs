//! Projects recorded in the store

use crate::context::Context;
use crate::store::StoreProject;
use crate::Result;

impl Context {
    /// Store entry of the current project, if any.
    pub fn get_project_from_store(&self) -> Result<Option<StoreProject>> {
        let config = self.config()?;
        let store = self.store()?;
        Ok(store.data.projects.get(&config.project_key()).cloned())
    }

    /// Remove the current project from the store. No-op when absent.
    pub fn remove_project_from_store(&self) -> Result<bool> {
        let key = self.config()?.project_key();
        if !self.store()?.data.projects.contains_key(&key) {
            return Ok(false);
        }
        self.update_store(|data| {
            data.projects.remove(&key);
        })?;
        Ok(true)
    }

    /// Every project root recorded in the store.
    pub fn list_projects(&self) -> Result<Vec<String>> {
        Ok(self.store()?.data.projects.keys().cloned().collect())
    }
}
