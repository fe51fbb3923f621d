use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::edit::BufferId;
use crate::editor::{BufferHandle, Workspace};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no document is registered for {0}")]
    NotFound(BufferId),
}

/// Binds wire buffer ids to workspace buffers.
///
/// Entries are created on first sync (or an explicit [`bind`](Self::bind))
/// and are never removed.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    by_id: BTreeMap<BufferId, BufferHandle>,
    by_handle: HashMap<BufferHandle, BufferId>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the buffer bound to `id`, opening a new one named `filename`
    /// if the id is unknown.
    pub fn get_or_create(
        &mut self,
        workspace: &mut Workspace,
        id: BufferId,
        filename: &str,
    ) -> BufferHandle {
        if let Some(&handle) = self.by_id.get(&id) {
            return handle;
        }
        let handle = workspace.create_buffer(filename);
        self.bind(id, handle);
        tracing::debug!("opened buffer for {id} ({filename})");
        handle
    }

    /// Bind an already open buffer to `id`, e.g. the file the local user
    /// shares. A previous binding of `id` is replaced.
    pub fn bind(&mut self, id: BufferId, handle: BufferHandle) {
        if let Some(old) = self.by_id.insert(id, handle) {
            self.by_handle.remove(&old);
        }
        self.by_handle.insert(handle, id);
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if nothing is bound to `id`.
    pub fn resolve(&self, id: BufferId) -> Result<BufferHandle, RegistryError> {
        self.by_id
            .get(&id)
            .copied()
            .ok_or(RegistryError::NotFound(id))
    }

    /// Reverse lookup: which id a buffer is shared under.
    pub fn current_id(&self, handle: BufferHandle) -> Option<BufferId> {
        self.by_handle.get(&handle).copied()
    }

    /// The id of the workspace's active buffer, if it is shared.
    pub fn active_id(&self, workspace: &Workspace) -> Option<BufferId> {
        workspace
            .active()
            .and_then(|handle| self.current_id(handle))
    }

    /// All bindings in id order.
    pub fn iter(&self) -> impl Iterator<Item = (BufferId, BufferHandle)> + '_ {
        self.by_id.iter().map(|(id, handle)| (*id, *handle))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
