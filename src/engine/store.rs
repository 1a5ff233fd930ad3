//! Entity store
//!
//! A flat ordered list; append order is draw order. Update and prune happen in
//! one traversal.

#[derive(Debug, Clone)]
pub struct EntityStore<T> {
    items: Vec<T>,
    /// Spawns beyond this are dropped (low-power particle budgets)
    cap: Option<usize>,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EntityStore<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            cap: None,
        }
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            items: Vec::with_capacity(cap.min(1024)),
            cap: Some(cap),
        }
    }

    pub fn set_cap(&mut self, cap: Option<usize>) {
        self.cap = cap;
    }

    pub fn cap(&self) -> Option<usize> {
        self.cap
    }

    /// Append an entity. Returns false if the store is at its cap.
    pub fn spawn(&mut self, entity: T) -> bool {
        if self.cap.is_some_and(|cap| self.items.len() >= cap) {
            return false;
        }
        self.items.push(entity);
        true
    }

    /// Append an entity, evicting the oldest one when the store is at its cap
    pub fn spawn_evicting(&mut self, entity: T) -> Option<T> {
        let evicted = match self.cap {
            Some(0) => return Some(entity),
            Some(cap) if self.items.len() >= cap => Some(self.items.remove(0)),
            _ => None,
        };
        self.items.push(entity);
        evicted
    }

    /// Mutate every entity in place and drop those for which `f` returns false
    pub fn update_retain<F>(&mut self, f: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        self.items.retain_mut(f);
    }

    /// Drop entities failing `alive` without mutating them
    pub fn retain<F>(&mut self, alive: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.items.retain(alive);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<'a, T> IntoIterator for &'a EntityStore<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> Extend<T> for EntityStore<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for entity in iter {
            if !self.spawn(entity) {
                break;
            }
        }
    }
}
