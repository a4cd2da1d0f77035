/// Generic named-key resource cache.
///
/// A `ResourceCache<R>` maps a logical name to at most one live resource.
/// Lookups hand out typed `ResourceHandle<R>` values backed by versioned
/// slotmap keys, so a handle to a destroyed entry resolves to nothing
/// instead of aliasing a newer resource created under the same name.
///
/// Creation is either synchronous (the factory uploads immediately) or
/// asynchronous: the entry is inserted in a not-ready state and a
/// `LoadTicket` is returned to the loader. Completed tickets are queued and
/// applied by `process_completions` on the frame-loop thread, which is the
/// only place an entry turns ready.

use std::marker::PhantomData;
use crossbeam_channel::{Receiver, Sender};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use crate::error::Result;
use crate::graphics::GraphicsContext;
use crate::{engine_debug, engine_warn};

new_key_type! {
    /// Key of a cache entry
    pub struct ResourceKey;
}

// ===== RESOURCE TRAIT =====

/// A GPU-backed object stored in a `ResourceCache`
pub trait Resource {
    /// Data delivered by an asynchronous load
    type Payload: Send + 'static;

    /// Whether the GPU objects exist and the resource can be used for drawing
    fn is_ready(&self) -> bool;

    /// Finish an asynchronous load (GPU upload) on the frame-loop thread
    fn complete(&mut self, ctx: &mut GraphicsContext, payload: Self::Payload) -> Result<()>;

    /// Release the GPU objects owned by this resource
    fn release(&mut self, ctx: &mut GraphicsContext);
}

// ===== HANDLE =====

/// Typed handle to a cache entry
pub struct ResourceHandle<R> {
    key: ResourceKey,
    _marker: PhantomData<fn() -> R>,
}

impl<R> ResourceHandle<R> {
    fn new(key: ResourceKey) -> Self {
        Self { key, _marker: PhantomData }
    }

    pub fn key(&self) -> ResourceKey {
        self.key
    }
}

impl<R> Clone for ResourceHandle<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for ResourceHandle<R> {}

impl<R> PartialEq for ResourceHandle<R> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<R> Eq for ResourceHandle<R> {}

impl<R> std::hash::Hash for ResourceHandle<R> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<R> std::fmt::Debug for ResourceHandle<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ResourceHandle({:?})", self.key)
    }
}

// ===== ASYNC COMPLETION =====

struct Completion<P> {
    key: ResourceKey,
    outcome: std::result::Result<P, String>,
}

/// One-shot completion token for an asynchronous load
///
/// Consumed by `complete` or `fail`. Can be moved to a loader thread; the
/// result is only applied by `ResourceCache::process_completions`.
pub struct LoadTicket<P> {
    key: ResourceKey,
    sender: Sender<Completion<P>>,
}

impl<P> LoadTicket<P> {
    /// Deliver the loaded payload
    pub fn complete(self, payload: P) {
        let _ = self.sender.send(Completion { key: self.key, outcome: Ok(payload) });
    }

    /// Report a failed load; the entry stays not-ready until destroyed
    pub fn fail(self, reason: impl Into<String>) {
        let _ = self.sender.send(Completion { key: self.key, outcome: Err(reason.into()) });
    }
}

// ===== CACHE =====

struct Entry<R> {
    name: String,
    resource: R,
}

/// Named-key cache of GPU resources
pub struct ResourceCache<R: Resource> {
    label: &'static str,
    entries: SlotMap<ResourceKey, Entry<R>>,
    names: FxHashMap<String, ResourceKey>,
    sender: Sender<Completion<R::Payload>>,
    receiver: Receiver<Completion<R::Payload>>,
}

impl<R: Resource> ResourceCache<R> {
    /// Create an empty cache; `label` names the resource kind in logs
    pub fn new(label: &'static str) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            label,
            entries: SlotMap::with_key(),
            names: FxHashMap::default(),
            sender,
            receiver,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Return the entry for `name`, building it with `factory` on a miss
    ///
    /// An existing entry is returned whether it is ready or still pending;
    /// `factory` runs at most once per name between two destroys.
    pub fn get_or_create<F>(&mut self, name: &str, factory: F) -> ResourceHandle<R>
    where
        F: FnOnce() -> R,
    {
        if let Some(&key) = self.names.get(name) {
            return ResourceHandle::new(key);
        }
        let key = self.entries.insert(Entry { name: name.to_string(), resource: factory() });
        self.names.insert(name.to_string(), key);
        engine_debug!("vista3d::ResourceCache", "{} '{}' created", self.label, name);
        ResourceHandle::new(key)
    }

    /// Asynchronous variant of `get_or_create`
    ///
    /// `pending` builds the not-ready placeholder. A `LoadTicket` is returned
    /// only when the entry was created by this call.
    pub fn get_or_create_async<F>(
        &mut self,
        name: &str,
        pending: F,
    ) -> (ResourceHandle<R>, Option<LoadTicket<R::Payload>>)
    where
        F: FnOnce() -> R,
    {
        if let Some(&key) = self.names.get(name) {
            return (ResourceHandle::new(key), None);
        }
        let handle = self.get_or_create(name, pending);
        let ticket = LoadTicket { key: handle.key, sender: self.sender.clone() };
        (handle, Some(ticket))
    }

    /// Apply queued load completions; returns the number of entries that became ready
    pub fn process_completions(&mut self, ctx: &mut GraphicsContext) -> usize {
        let mut became_ready = 0;
        while let Ok(completion) = self.receiver.try_recv() {
            let Some(entry) = self.entries.get_mut(completion.key) else {
                engine_debug!("vista3d::ResourceCache",
                    "{} load completed after destroy, discarded", self.label);
                continue;
            };
            match completion.outcome {
                Ok(_) if entry.resource.is_ready() => {
                    engine_warn!("vista3d::ResourceCache",
                        "{} '{}' is already ready, completion ignored", self.label, entry.name);
                }
                Ok(payload) => match entry.resource.complete(ctx, payload) {
                    Ok(()) if entry.resource.is_ready() => became_ready += 1,
                    Ok(()) => {}
                    Err(err) => {
                        engine_warn!("vista3d::ResourceCache",
                            "{} '{}' upload failed: {}", self.label, entry.name, err);
                    }
                },
                Err(reason) => {
                    engine_warn!("vista3d::ResourceCache",
                        "{} '{}' load failed: {}", self.label, entry.name, reason);
                }
            }
        }
        became_ready
    }

    // ===== LOOKUP =====

    pub fn find(&self, name: &str) -> Option<ResourceHandle<R>> {
        self.names.get(name).map(|&key| ResourceHandle::new(key))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn get(&self, handle: ResourceHandle<R>) -> Option<&R> {
        self.entries.get(handle.key).map(|e| &e.resource)
    }

    pub fn get_mut(&mut self, handle: ResourceHandle<R>) -> Option<&mut R> {
        self.entries.get_mut(handle.key).map(|e| &mut e.resource)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&R> {
        self.find(name).and_then(|h| self.get(h))
    }

    /// True only for a live entry whose resource is ready
    pub fn is_ready(&self, handle: ResourceHandle<R>) -> bool {
        self.get(handle).is_some_and(|r| r.is_ready())
    }

    pub fn name_of(&self, handle: ResourceHandle<R>) -> Option<&str> {
        self.entries.get(handle.key).map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceHandle<R>, &str, &R)> {
        self.entries
            .iter()
            .map(|(key, e)| (ResourceHandle::new(key), e.name.as_str(), &e.resource))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ResourceHandle<R>, &str, &mut R)> {
        self.entries
            .iter_mut()
            .map(|(key, e)| (ResourceHandle::new(key), e.name.as_str(), &mut e.resource))
    }

    // ===== DESTRUCTION =====

    /// Release the resource and remove its name; false for a stale handle
    pub fn destroy(&mut self, ctx: &mut GraphicsContext, handle: ResourceHandle<R>) -> bool {
        let Some(mut entry) = self.entries.remove(handle.key) else {
            return false;
        };
        self.names.remove(&entry.name);
        entry.resource.release(ctx);
        engine_debug!("vista3d::ResourceCache", "{} '{}' destroyed", self.label, entry.name);
        true
    }

    pub fn destroy_by_name(&mut self, ctx: &mut GraphicsContext, name: &str) -> bool {
        match self.find(name) {
            Some(handle) => self.destroy(ctx, handle),
            None => false,
        }
    }

    /// Release every resource
    pub fn destroy_all(&mut self, ctx: &mut GraphicsContext) {
        for (_, mut entry) in self.entries.drain() {
            entry.resource.release(ctx);
        }
        self.names.clear();
    }
}

#[cfg(test)]
#[path = "resource_cache_tests.rs"]
mod tests;
