//! Folder access grants.
//!
//! A grant is a capability for a directory subtree. Every filesystem access
//! under a granted root goes through an [`AccessGuard`] obtained from the
//! [`GrantRegistry`], which calls `begin_use` when the first holder appears
//! and `end_use` when the last holder goes away.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

#[cfg(test)]
mod tests;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("no folder grant covers {0}")]
    NoGrant(PathBuf),
    #[error("access denied for {0}")]
    Denied(PathBuf),
}

/// A permission token for a directory subtree.
pub trait FolderAccessGrant: Send + Sync {
    /// Root of the subtree covered by this grant.
    fn root(&self) -> &Path;
    /// Start using the grant. Returns `false` when it is not usable.
    fn begin_use(&self) -> bool;
    /// Stop using the grant. Called once per successful `begin_use`.
    fn end_use(&self);
}

/// Grant for an ordinary folder with no scoping mechanism behind it.
#[derive(Debug, Clone)]
pub struct PlainFolderGrant {
    root: PathBuf,
}

impl PlainFolderGrant {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FolderAccessGrant for PlainFolderGrant {
    fn root(&self) -> &Path {
        &self.root
    }

    fn begin_use(&self) -> bool {
        self.root.is_dir()
    }

    fn end_use(&self) {}
}

struct GrantSlot {
    grant: Arc<dyn FolderAccessGrant>,
    holders: usize,
    retired: bool,
}

/// Reference-counted registry of folder grants, keyed by root path.
#[derive(Default)]
pub struct GrantRegistry {
    slots: Mutex<HashMap<PathBuf, GrantSlot>>,
}

impl GrantRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register (or replace) the grant for its root.
    ///
    /// Replacing a grant that still has holders keeps the holder count; the
    /// new grant receives the eventual `end_use`.
    pub fn register(&self, grant: Arc<dyn FolderAccessGrant>) {
        let root = grant.root().to_path_buf();
        let Ok(mut slots) = self.slots.lock() else {
            return;
        };
        let holders = slots.get(&root).map_or(0, |s| s.holders);
        slots.insert(
            root,
            GrantSlot {
                grant,
                holders,
                retired: false,
            },
        );
    }

    /// Forget the grant for `root`.
    ///
    /// With guards outstanding the slot is retired instead: it accepts no new
    /// holders and disappears after the last release.
    pub fn remove(&self, root: &Path) {
        let Ok(mut slots) = self.slots.lock() else {
            return;
        };
        match slots.get_mut(root) {
            Some(slot) if slot.holders > 0 => slot.retired = true,
            Some(_) => {
                slots.remove(root);
            }
            None => {}
        }
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        self.slots
            .lock()
            .map(|s| {
                s.iter()
                    .filter(|(_, slot)| !slot.retired)
                    .map(|(root, _)| root.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of live guards for the grant rooted at `root`.
    pub fn holders(&self, root: &Path) -> usize {
        self.slots
            .lock()
            .ok()
            .and_then(|s| s.get(root).map(|slot| slot.holders))
            .unwrap_or(0)
    }

    /// Acquire access to `path`, which must lie under a registered root.
    pub fn acquire(self: &Arc<Self>, path: &Path) -> Result<AccessGuard, AccessError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| AccessError::Denied(path.to_path_buf()))?;

        // Deepest covering root wins when grants are nested.
        let root = slots
            .iter()
            .filter(|(root, slot)| !slot.retired && path.starts_with(root))
            .map(|(root, _)| root)
            .max_by_key(|root| root.components().count())
            .cloned()
            .ok_or_else(|| AccessError::NoGrant(path.to_path_buf()))?;

        let slot = slots
            .get_mut(&root)
            .ok_or_else(|| AccessError::NoGrant(path.to_path_buf()))?;
        if slot.holders == 0 && !slot.grant.begin_use() {
            tracing::warn!(root = %root.display(), "folder grant refused access");
            return Err(AccessError::Denied(path.to_path_buf()));
        }
        slot.holders += 1;

        Ok(AccessGuard {
            registry: Arc::clone(self),
            root,
        })
    }

    fn release(&self, root: &Path) {
        let Ok(mut slots) = self.slots.lock() else {
            return;
        };
        let Some(slot) = slots.get_mut(root) else {
            return;
        };
        slot.holders = slot.holders.saturating_sub(1);
        if slot.holders == 0 {
            slot.grant.end_use();
            if slot.retired {
                slots.remove(root);
            }
        }
    }
}

/// Held access to a granted subtree; released on drop.
pub struct AccessGuard {
    registry: Arc<GrantRegistry>,
    root: PathBuf,
}

impl AccessGuard {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for AccessGuard {
    fn drop(&mut self) {
        self.registry.release(&self.root);
    }
}
