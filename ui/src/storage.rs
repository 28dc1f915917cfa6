//! Durable storage for the current clash id.
//!
//! One value survives a reload: the id of the clash this viewer is part of.
//! Browser builds keep it in `localStorage`, native builds in a small file.
//! Storage failures are logged and otherwise ignored.

use std::cell::Cell;
use std::rc::Rc;

use crate::types::ClashId;

/// Key (browser) and file name (native) of the stored clash id.
pub const CLASH_ID_KEY: &str = "currentClashId";

pub trait SessionStore {
    fn load(&self) -> Option<ClashId>;
    fn save(&mut self, id: ClashId);
    fn clear(&mut self);
}

// ---------------------------------------------------------------------------
// In-memory store: fallback when nothing durable is available
// ---------------------------------------------------------------------------

/// Non-durable store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore(Rc<Cell<Option<ClashId>>>);

impl MemoryStore {
    pub fn get(&self) -> Option<ClashId> {
        self.0.get()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Option<ClashId> {
        self.0.get()
    }

    fn save(&mut self, id: ClashId) {
        self.0.set(Some(id));
    }

    fn clear(&mut self) {
        self.0.set(None);
    }
}

// ---------------------------------------------------------------------------
// Native: one file holding the id as text
// ---------------------------------------------------------------------------

#[cfg(not(target_arch = "wasm32"))]
pub struct FileStore {
    path: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    pub fn new(path: std::path::PathBuf) -> Self {
        Self { path }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SessionStore for FileStore {
    fn load(&self) -> Option<ClashId> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let id = contents.trim().parse().ok();
                if id.is_none() {
                    log::warn!("ignoring unreadable clash id in {}", self.path.display());
                }
                id
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("failed to read {}: {e}", self.path.display());
                None
            }
        }
    }

    fn save(&mut self, id: ClashId) {
        if let Some(dir) = self.path.parent()
            && let Err(e) = std::fs::create_dir_all(dir)
        {
            log::warn!("failed to create {}: {e}", dir.display());
            return;
        }
        if let Err(e) = std::fs::write(&self.path, id.to_string()) {
            log::warn!("failed to write {}: {e}", self.path.display());
        }
    }

    fn clear(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("failed to remove {}: {e}", self.path.display()),
        }
    }
}

// ---------------------------------------------------------------------------
// Browser: window.localStorage
// ---------------------------------------------------------------------------

#[cfg(target_arch = "wasm32")]
pub struct LocalStorageStore {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl SessionStore for LocalStorageStore {
    fn load(&self) -> Option<ClashId> {
        self.storage
            .get_item(CLASH_ID_KEY)
            .ok()
            .flatten()
            .and_then(|s| s.trim().parse().ok())
    }

    fn save(&mut self, id: ClashId) {
        if let Err(e) = self.storage.set_item(CLASH_ID_KEY, &id.to_string()) {
            log::warn!("failed to persist clash id: {e:?}");
        }
    }

    fn clear(&mut self) {
        if let Err(e) = self.storage.remove_item(CLASH_ID_KEY) {
            log::warn!("failed to clear clash id: {e:?}");
        }
    }
}

/// `localStorage` when the browser allows it, memory otherwise.
#[cfg(target_arch = "wasm32")]
pub fn browser_store() -> Box<dyn SessionStore> {
    match LocalStorageStore::open() {
        Some(store) => Box::new(store),
        None => {
            log::warn!("localStorage unavailable, clash id will not survive a reload");
            Box::new(MemoryStore::default())
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("clashboard-store-{}", std::process::id()))
            .join(CLASH_ID_KEY);
        let mut store = FileStore::new(path.clone());
        assert_eq!(store.load(), None);

        store.save(31);
        assert_eq!(store.load(), Some(31));
        assert_eq!(FileStore::new(path.clone()).load(), Some(31));

        store.clear();
        assert_eq!(store.load(), None);
        // clearing twice is fine
        store.clear();
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn memory_store_clones_share_state() {
        let observer = MemoryStore::default();
        let mut store = observer.clone();
        store.save(4);
        assert_eq!(observer.get(), Some(4));
        store.clear();
        assert_eq!(observer.get(), None);
    }
}
