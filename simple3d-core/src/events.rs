//! Pick/hover event dispatch.
//!
//! A [`Dispatcher`] keeps one registry per [`EventKind`], mapping an
//! [`ObjectId`] to a single callback. A pointer event is turned into a ray,
//! the scene is ray cast, and callbacks registered for the hit objects run in
//! hit order (nearest first).
//!
//! The matching callbacks are snapshotted before the first one runs, so a
//! callback may register, unregister or remove objects freely: those changes
//! apply from the next dispatch on.
//!
//! The dispatcher holds ids only. Objects removed from the scene without
//! [`Dispatcher::unregister_all`] leave entries that never match again.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::projection::{Camera, Viewport};
use crate::scene::{Hit, ObjectId, Scene};

/// Kind of pointer event a callback is registered for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Hover,
    /// Any host-defined event name
    Custom(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Click => "click",
            EventKind::Hover => "hover",
            EventKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "click" => Ok(EventKind::Click),
            "hover" | "pointermove" => Ok(EventKind::Hover),
            "" => Err(Error::UnknownEventKind(s.to_string())),
            other => Ok(EventKind::Custom(other.to_string())),
        }
    }
}

/// Which hits along the ray receive callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Every registered object the ray passes through, nearest first
    #[default]
    AllHits,
    /// Only the nearest object along the ray, if it is registered
    NearestHit,
}

impl FromStr for DeliveryMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "all_hits" | "all" => Ok(DeliveryMode::AllHits),
            "nearest_hit" | "nearest" => Ok(DeliveryMode::NearestHit),
            other => Err(Error::invalid(format!("unknown delivery mode '{other}'"))),
        }
    }
}

/// What a callback is handed
#[derive(Debug, Clone, PartialEq)]
pub struct PickEvent {
    pub kind: EventKind,
    pub hit: Hit,
    pub screen_x: f32,
    pub screen_y: f32,
}

type Callback<C> = Rc<RefCell<dyn FnMut(&PickEvent, &mut C)>>;

struct Registries<C> {
    by_kind: HashMap<EventKind, HashMap<ObjectId, Callback<C>>>,
    mode: DeliveryMode,
}

/// Cloneable handle to the event registries.
///
/// `C` is the context callbacks receive mutably; the default is the
/// [`Scene`] being dispatched against.
pub struct Dispatcher<C = Scene> {
    inner: Rc<RefCell<Registries<C>>>,
}

impl<C> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C> Default for Dispatcher<C> {
    fn default() -> Self {
        Self::new(DeliveryMode::default())
    }
}

impl<C> fmt::Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let counts: HashMap<&EventKind, usize> =
            inner.by_kind.iter().map(|(kind, entries)| (kind, entries.len())).collect();
        f.debug_struct("Dispatcher")
            .field("mode", &inner.mode)
            .field("registered", &counts)
            .finish()
    }
}

impl<C> Dispatcher<C> {
    pub fn new(mode: DeliveryMode) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registries {
                by_kind: HashMap::new(),
                mode,
            })),
        }
    }

    pub fn mode(&self) -> DeliveryMode {
        self.inner.borrow().mode
    }

    pub fn set_mode(&self, mode: DeliveryMode) {
        self.inner.borrow_mut().mode = mode;
    }

    /// Register `callback` for `(object, kind)`, silently replacing any
    /// earlier one. Returns true when a callback was replaced.
    pub fn register<F>(&self, object: ObjectId, kind: EventKind, callback: F) -> bool
    where
        F: FnMut(&PickEvent, &mut C) + 'static,
    {
        let callback: Callback<C> = Rc::new(RefCell::new(callback));
        let mut inner = self.inner.borrow_mut();
        let replaced = inner
            .by_kind
            .entry(kind.clone())
            .or_default()
            .insert(object, callback)
            .is_some();
        if replaced {
            log::debug!("events: replaced {kind} callback for {object}");
        } else {
            log::debug!("events: registered {kind} callback for {object}");
        }
        replaced
    }

    /// Remove the callback for `(object, kind)`. Unknown pairs are a no-op.
    pub fn unregister(&self, object: ObjectId, kind: &EventKind) -> bool {
        let mut inner = self.inner.borrow_mut();
        let removed = inner
            .by_kind
            .get_mut(kind)
            .map_or(false, |entries| entries.remove(&object).is_some());
        if removed {
            log::debug!("events: unregistered {kind} callback for {object}");
        }
        removed
    }

    /// Remove every callback registered for `object`; returns how many went
    pub fn unregister_all(&self, object: ObjectId) -> usize {
        let mut inner = self.inner.borrow_mut();
        let removed = inner
            .by_kind
            .values_mut()
            .map(|entries| entries.remove(&object).is_some())
            .filter(|removed| *removed)
            .count();
        if removed > 0 {
            log::debug!("events: dropped {removed} callback(s) for {object}");
        }
        removed
    }

    pub fn is_registered(&self, object: ObjectId, kind: &EventKind) -> bool {
        self.inner
            .borrow()
            .by_kind
            .get(kind)
            .map_or(false, |entries| entries.contains_key(&object))
    }

    /// Number of callbacks registered for `kind`
    pub fn len(&self, kind: &EventKind) -> usize {
        self.inner.borrow().by_kind.get(kind).map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().by_kind.values().all(HashMap::is_empty)
    }

    /// Resolve a pointer position to the ordered hits under it
    pub fn pick(
        &self,
        scene: &Scene,
        camera: &Camera,
        viewport: &Viewport,
        screen_x: f32,
        screen_y: f32,
    ) -> Result<Vec<Hit>> {
        let ndc = viewport.screen_to_ndc(screen_x, screen_y)?;
        let ray = camera.ray_through(&ndc)?;
        Ok(scene.cast_ray(&ray))
    }

    /// Invoke the callbacks registered for `kind` on the given hits.
    ///
    /// `hits` must be ordered nearest first. Returns the number of callbacks run.
    pub fn deliver(&self, kind: &EventKind, hits: &[Hit], screen: (f32, f32), context: &mut C) -> usize {
        let snapshot: Vec<(Hit, Callback<C>)> = {
            let inner = self.inner.borrow();
            let Some(entries) = inner.by_kind.get(kind) else {
                return 0;
            };
            let candidates = match inner.mode {
                DeliveryMode::AllHits => hits,
                DeliveryMode::NearestHit => &hits[..hits.len().min(1)],
            };
            candidates
                .iter()
                .filter_map(|hit| entries.get(&hit.object).map(|callback| (*hit, Rc::clone(callback))))
                .collect()
        };

        log::trace!("events: {kind} at {screen:?} -> {} hit(s), {} callback(s)", hits.len(), snapshot.len());

        let mut invoked = 0;
        for (hit, callback) in snapshot {
            let event = PickEvent {
                kind: kind.clone(),
                hit,
                screen_x: screen.0,
                screen_y: screen.1,
            };
            match callback.try_borrow_mut() {
                Ok(mut callback) => {
                    (&mut *callback)(&event, context);
                    invoked += 1;
                }
                Err(_) => {
                    log::warn!("events: skipped re-entrant {kind} callback for {}", hit.object);
                }
            }
        }
        invoked
    }
}

impl Dispatcher<Scene> {
    /// Route one pointer event: pick, then deliver with the scene as context
    pub fn dispatch(
        &self,
        scene: &mut Scene,
        camera: &Camera,
        viewport: &Viewport,
        screen_x: f32,
        screen_y: f32,
        kind: &EventKind,
    ) -> Result<usize> {
        let hits = self.pick(scene, camera, viewport, screen_x, screen_y)?;
        Ok(self.deliver(kind, &hits, (screen_x, screen_y), scene))
    }
}
