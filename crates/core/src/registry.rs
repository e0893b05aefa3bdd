//! Room registry - the set of live rooms keyed by room key
//!
//! Keys are drawn from a generator and inserted through the map's entry API,
//! so the uniqueness check and the insertion happen under the same shard lock.
//! Rooms are never removed; finished debates stay readable by key.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{ParticipantId, RoomKey, DEFAULT_KEY_LENGTH};
use crate::room::{Room, RoomRules, SharedRoom};

/// Attempts at drawing an unused key before giving up
pub const MAX_KEY_ATTEMPTS: u32 = 32;

type KeyGenerator = Box<dyn Fn() -> RoomKey + Send + Sync>;

/// Central store of rooms
pub struct RoomRegistry {
    rooms: DashMap<RoomKey, Arc<SharedRoom>>,
    keygen: KeyGenerator,
}

impl RoomRegistry {
    /// Random keys of `key_length` characters
    pub fn new(key_length: usize) -> Self {
        Self::with_key_generator(move || RoomKey::generate(&mut rand::thread_rng(), key_length))
    }

    pub fn with_key_generator(keygen: impl Fn() -> RoomKey + Send + Sync + 'static) -> Self {
        Self {
            rooms: DashMap::new(),
            keygen: Box::new(keygen),
        }
    }

    /// Create a waiting room under a fresh key
    pub fn create(
        &self,
        host: ParticipantId,
        topic: String,
        rules: RoomRules,
    ) -> Result<(RoomKey, Arc<SharedRoom>)> {
        for attempt in 1..=MAX_KEY_ATTEMPTS {
            let key = (self.keygen)();
            match self.rooms.entry(key.clone()) {
                Entry::Occupied(_) => {
                    debug!(room_key = %key, attempt, "Room key collision, drawing again");
                }
                Entry::Vacant(slot) => {
                    let room = Arc::new(SharedRoom::new(Room::new(key.clone(), host, topic, rules)?));
                    slot.insert(Arc::clone(&room));
                    info!(room_key = %key, rounds = rules.rounds_target, "Room created");
                    return Ok((key, room));
                }
            }
        }
        Err(Error::KeySpaceExhausted(MAX_KEY_ATTEMPTS))
    }

    pub fn get(&self, key: &RoomKey) -> Result<Arc<SharedRoom>> {
        self.rooms
            .get(key)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::RoomNotFound(key.clone()))
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_LENGTH)
    }
}

impl std::fmt::Debug for RoomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomRegistry").field("rooms", &self.rooms.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn scripted(keys: &[&str]) -> impl Fn() -> RoomKey + Send + Sync + 'static {
        let queue: Mutex<VecDeque<RoomKey>> =
            Mutex::new(keys.iter().map(|k| RoomKey::new(*k)).collect());
        move || queue.lock().unwrap().pop_front().unwrap_or_else(|| RoomKey::new("LAST00"))
    }

    fn create(registry: &RoomRegistry, host: &str) -> Result<(RoomKey, Arc<SharedRoom>)> {
        registry.create(ParticipantId::new(host), "topic".into(), RoomRules::default())
    }

    #[test]
    fn test_create_and_get() {
        let registry = RoomRegistry::default();
        let (key, _) = create(&registry, "alice").unwrap();
        assert_eq!(key.as_str().len(), DEFAULT_KEY_LENGTH);
        assert!(registry.get(&key).is_ok());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_key_is_not_found() {
        let registry = RoomRegistry::default();
        let err = registry.get(&RoomKey::new("NOPE00")).unwrap_err();
        assert!(matches!(err, Error::RoomNotFound(_)));
    }

    #[test]
    fn test_collision_draws_again() {
        let registry = RoomRegistry::with_key_generator(scripted(&["AAAAAA", "AAAAAA", "BBBBBB"]));
        let (first, _) = create(&registry, "alice").unwrap();
        let (second, _) = create(&registry, "bob").unwrap();
        assert_eq!(first.as_str(), "AAAAAA");
        assert_eq!(second.as_str(), "BBBBBB");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_exhausted_key_space() {
        let registry = RoomRegistry::with_key_generator(|| RoomKey::new("SAME00"));
        create(&registry, "alice").unwrap();
        let err = create(&registry, "bob").unwrap_err();
        assert!(matches!(err, Error::KeySpaceExhausted(MAX_KEY_ATTEMPTS)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_room_is_not_registered() {
        let registry = RoomRegistry::default();
        let err = registry
            .create(ParticipantId::new(" "), "topic".into(), RoomRules::default())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(registry.is_empty());
    }
}
