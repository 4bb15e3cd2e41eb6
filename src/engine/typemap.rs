//! By-type singleton storage.
//!
//! [`TypeMap`] owns at most one value per Rust type, keyed by
//! [`TypeId`]. The world core uses it for world-level singletons
//! ("resources") that do not belong to any entity.
//!
//! Values are stored type-erased in individually owned buffers together
//! with per-type drop and clone functions, which is what makes the map's
//! [`Clone`] a deep copy: both the keying table and every value buffer are
//! duplicated, so mutating a clone never touches the original.

use std::any::TypeId;

use ahash::AHashMap;

struct TypeEntry {
    type_id: TypeId,
    data: *mut u8,
    drop_fn: unsafe fn(*mut u8),
    clone_fn: unsafe fn(*const u8) -> *mut u8,
}

unsafe fn drop_boxed<T>(pointer: *mut u8) {
    drop(unsafe { Box::from_raw(pointer.cast::<T>()) });
}

unsafe fn clone_boxed<T: Clone>(pointer: *const u8) -> *mut u8 {
    let value = unsafe { (*pointer.cast::<T>()).clone() };
    Box::into_raw(Box::new(value)).cast::<u8>()
}

/// Map from a type to one owned value of that type.
#[derive(Default)]
pub struct TypeMap {
    entries: Vec<TypeEntry>,
    indices: AHashMap<TypeId, usize>,
}

// Stored values are constrained to Send + Sync at insertion.
unsafe impl Send for TypeMap {}
unsafe impl Sync for TypeMap {}

impl TypeMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores `value`, replacing (and dropping) any previous value of the
    /// same type.
    pub fn put<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        let type_id = TypeId::of::<T>();
        let data = Box::into_raw(Box::new(value)).cast::<u8>();
        match self.indices.get(&type_id) {
            Some(&index) => {
                let entry = &mut self.entries[index];
                unsafe { (entry.drop_fn)(entry.data) };
                entry.data = data;
            }
            None => {
                self.indices.insert(type_id, self.entries.len());
                self.entries.push(TypeEntry {
                    type_id,
                    data,
                    drop_fn: drop_boxed::<T>,
                    clone_fn: clone_boxed::<T>,
                });
            }
        }
    }

    /// Returns `true` if a value of type `T` is stored.
    #[inline]
    pub fn contains<T: 'static>(&self) -> bool {
        self.indices.contains_key(&TypeId::of::<T>())
    }

    /// Shared access to the stored `T`, if present.
    pub fn get_opt<T: 'static>(&self) -> Option<&T> {
        let index = *self.indices.get(&TypeId::of::<T>())?;
        Some(unsafe { &*self.entries[index].data.cast::<T>() })
    }

    /// Mutable access to the stored `T`, if present.
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        let index = *self.indices.get(&TypeId::of::<T>())?;
        Some(unsafe { &mut *self.entries[index].data.cast::<T>() })
    }

    /// Shared access to the stored `T`.
    ///
    /// ## Panics
    /// Panics if no value of type `T` is stored; probe with
    /// [`TypeMap::contains`] or use [`TypeMap::get_opt`].
    pub fn get<T: 'static>(&self) -> &T {
        self.get_opt::<T>().unwrap_or_else(|| {
            panic!("no value of type {} is stored", std::any::type_name::<T>())
        })
    }

    /// Removes and returns the stored `T`, if present.
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        let index = self.indices.remove(&TypeId::of::<T>())?;
        let entry = self.entries.swap_remove(index);
        if index < self.entries.len() {
            self.indices.insert(self.entries[index].type_id, index);
        }
        let boxed = unsafe { Box::from_raw(entry.data.cast::<T>()) };
        Some(*boxed)
    }
}

impl Clone for TypeMap {
    fn clone(&self) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|entry| TypeEntry {
                type_id: entry.type_id,
                data: unsafe { (entry.clone_fn)(entry.data) },
                drop_fn: entry.drop_fn,
                clone_fn: entry.clone_fn,
            })
            .collect();
        Self {
            entries,
            indices: self.indices.clone(),
        }
    }
}

impl Drop for TypeMap {
    fn drop(&mut self) {
        for entry in &self.entries {
            unsafe { (entry.drop_fn)(entry.data) };
        }
    }
}
