//! Track registry.
//!
//! An integer-keyed map from track id to track entity. The control
//! thread takes the write lock for structural changes (insert, remove);
//! the audio thread only ever `try_read`s, so a tick never blocks on the
//! control thread — at worst it renders one tick of silence while a
//! mutation is in flight.

use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock, RwLockReadGuard},
};

use crate::track::Track;

pub(crate) type TrackMap = BTreeMap<i32, Arc<Track>>;

/// Keyed collection of tracks. Iteration order is ascending by id and
/// stable between mutations.
pub struct TrackRegistry {
    map: RwLock<TrackMap>,
}

impl TrackRegistry {
    pub(crate) fn new() -> Self {
        Self {
            map: RwLock::new(BTreeMap::new()),
        }
    }

    /// Inserts a track, returning the displaced entity if the id was
    /// already present.
    pub fn insert(&self, track: Arc<Track>) -> Option<Arc<Track>> {
        self.map.write().unwrap().insert(track.id(), track)
    }

    /// Looks up a track by id.
    pub fn get(&self, id: i32) -> Option<Arc<Track>> {
        self.map.read().unwrap().get(&id).cloned()
    }

    /// Removes a track by id, returning it if it existed.
    pub fn remove(&self, id: i32) -> Option<Arc<Track>> {
        self.map.write().unwrap().remove(&id)
    }

    /// Removes every track, returning the drained entities.
    pub fn drain(&self) -> Vec<Arc<Track>> {
        let mut map = self.map.write().unwrap();
        let drained: Vec<_> = map.values().cloned().collect();
        map.clear();
        drained
    }

    /// Number of registered tracks.
    pub fn len(&self) -> usize {
        self.map.read().unwrap().len()
    }

    /// Returns `true` if no tracks are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-blocking read access for the audio thread.
    pub(crate) fn try_read(&self) -> Option<RwLockReadGuard<'_, TrackMap>> {
        self.map.try_read().ok()
    }
}
