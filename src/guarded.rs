use crate::error::MapError;
use crate::lexicon::Lexicon;
use log::{debug, error, trace};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

type Guard<'a, K, V> = MutexGuard<'a, Lexicon<K, V>>;

/// A thread-safe lexicon guarded by a single mutex
///
/// Every operation takes the lock, runs the matching [`Lexicon`] operation
/// and releases the lock before returning, so operations on one instance are
/// totally ordered. Cloning a `SyncLexicon` clones the handle: both clones
/// share the same pairs.
///
/// Callbacks passed to `each`, `filter`, `map` and friends run while the
/// lock is held. A callback must not call back into the same instance, or
/// it will deadlock.
///
/// # Examples
///
/// ```
/// use sovran_lexicon::{SyncLexicon, MapError};
/// use std::thread;
///
/// let scores = SyncLexicon::<String, u32>::new();
///
/// let handles: Vec<_> = (0..4)
///     .map(|worker| {
///         let scores = scores.clone();
///         thread::spawn(move || -> Result<(), MapError> {
///             for round in 0..10 {
///                 scores.add(format!("{}-{}", worker, round), round)?;
///             }
///             Ok(())
///         })
///     })
///     .collect();
///
/// for handle in handles {
///     handle.join().unwrap()?;
/// }
///
/// assert_eq!(scores.len()?, 40);
/// # Ok::<(), MapError>(())
/// ```
///
/// # Panics
///
/// A callback that panics unwinds out of the operation that ran it. The lock
/// is released on the way out and the pairs keep whatever changes were made
/// before the panic; later operations on the instance carry on normally.
pub struct SyncLexicon<K, V> {
    items: Arc<Mutex<Lexicon<K, V>>>,
}

impl<K, V> SyncLexicon<K, V> {
    /// Creates a new, empty SyncLexicon
    pub fn new() -> Self {
        Self::from(Lexicon::new())
    }

    /// Creates an empty SyncLexicon with room for at least `capacity` pairs
    pub fn with_capacity(capacity: usize) -> Self {
        trace!("creating lexicon with capacity {}", capacity);
        Self::from(Lexicon::with_capacity(capacity))
    }

    fn lock(&self) -> Guard<'_, K, V> {
        self.items.lock().unwrap_or_else(|poisoned| {
            error!("a callback panicked while holding the lexicon lock; recovering");
            self.items.clear_poison();
            poisoned.into_inner()
        })
    }

    fn is_same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }

    /// Locks two distinct instances in address order so that concurrent
    /// `a.op(&b)` and `b.op(&a)` cannot deadlock. Returns `(ours, theirs)`.
    fn lock_pair<'a>(
        &'a self,
        other: &'a Self,
    ) -> (Guard<'a, K, V>, Guard<'a, K, V>) {
        if Arc::as_ptr(&self.items) < Arc::as_ptr(&other.items) {
            let ours = self.lock();
            let theirs = other.lock();
            (ours, theirs)
        } else {
            let theirs = other.lock();
            let ours = self.lock();
            (ours, theirs)
        }
    }

    /// Returns the number of pairs
    pub fn len(&self) -> Result<usize, MapError> {
        Ok(self.lock().len())
    }

    /// Returns true if the lexicon holds no pairs
    pub fn is_empty(&self) -> Result<bool, MapError> {
        Ok(self.lock().is_empty())
    }

    pub fn is_populated(&self) -> Result<bool, MapError> {
        Ok(self.lock().is_populated())
    }

    pub fn equal_length(&self, other: &Self) -> Result<bool, MapError> {
        if self.is_same(other) {
            let _store = self.lock();
            return Ok(true);
        }
        let (ours, theirs) = self.lock_pair(other);
        Ok(ours.equal_length(&theirs))
    }

    /// Removes every pair
    pub fn clear(&self) -> Result<(), MapError> {
        self.lock().clear();
        Ok(())
    }

    /// Calls `f` once for every pair while holding the lock
    pub fn each<F>(&self, f: F) -> Result<(), MapError>
    where
        F: FnMut(&K, &V),
    {
        self.lock().each(f);
        Ok(())
    }

    /// Calls `f` for each pair until it returns `false`
    pub fn each_break<F>(&self, f: F) -> Result<(), MapError>
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.lock().each_break(f);
        Ok(())
    }

    pub fn each_key<F>(&self, f: F) -> Result<(), MapError>
    where
        F: FnMut(&K),
    {
        self.lock().each_key(f);
        Ok(())
    }

    pub fn each_key_break<F>(&self, f: F) -> Result<(), MapError>
    where
        F: FnMut(&K) -> bool,
    {
        self.lock().each_key_break(f);
        Ok(())
    }

    pub fn each_value<F>(&self, f: F) -> Result<(), MapError>
    where
        F: FnMut(&V),
    {
        self.lock().each_value(f);
        Ok(())
    }

    pub fn each_value_break<F>(&self, f: F) -> Result<(), MapError>
    where
        F: FnMut(&V) -> bool,
    {
        self.lock().each_value_break(f);
        Ok(())
    }

    /// Applies a fallible function to all pairs, stopping at the first error
    ///
    /// # Errors
    ///
    /// Returns the first error returned by `f`.
    pub fn apply<F>(&self, mut f: F) -> Result<(), MapError>
    where
        F: FnMut(&K, &V) -> Result<(), MapError>,
    {
        let store = self.lock();
        for (key, value) in store.iter() {
            f(key, value)?;
        }
        Ok(())
    }

    /// Runs `f` against the whole lexicon under a single acquisition of the lock
    ///
    /// Use it for compound updates that must not interleave with other
    /// callers, such as a read-modify-write across several keys.
    ///
    /// ```
    /// use sovran_lexicon::{SyncLexicon, MapError};
    ///
    /// let accounts: SyncLexicon<&str, i64> = [("alice", 100), ("bob", 20)].into_iter().collect();
    ///
    /// let moved = accounts.mutate(|store| {
    ///     let amount = store.fetch("alice").min(30);
    ///     store.add("alice", store.fetch("alice") - amount);
    ///     store.add("bob", store.fetch("bob") + amount);
    ///     amount
    /// })?;
    ///
    /// assert_eq!(moved, 30);
    /// assert_eq!(accounts.fetch("bob")?, 50);
    /// # Ok::<(), MapError>(())
    /// ```
    pub fn mutate<F, R>(&self, f: F) -> Result<R, MapError>
    where
        F: FnOnce(&mut Lexicon<K, V>) -> R,
    {
        let mut store = self.lock();
        Ok(f(&mut store))
    }

    /// Copies the current pairs out into a plain [`Lexicon`]
    ///
    /// The copy is a point-in-time view and can be used without the lock.
    pub fn snapshot(&self) -> Result<Lexicon<K, V>, MapError>
    where
        K: Clone,
        V: Clone,
    {
        Ok(self.lock().clone())
    }
}

impl<K, V> SyncLexicon<K, V>
where
    K: Eq + Hash,
{
    /// Builds a SyncLexicon from several sources merged in order; later keys win
    pub fn from_maps<I, M>(sources: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: IntoIterator<Item = (K, V)>,
    {
        Self::from(Lexicon::from_maps(sources))
    }

    /// Stores `value` under `key`, overwriting any previous value
    pub fn add(&self, key: K, value: V) -> Result<(), MapError> {
        self.lock().add(key, value);
        Ok(())
    }

    pub fn add_length(&self, key: K, value: V) -> Result<usize, MapError> {
        Ok(self.lock().add_length(key, value))
    }

    /// Stores `value` only when `key` is absent and reports whether it did
    pub fn add_ok(&self, key: K, value: V) -> Result<bool, MapError> {
        Ok(self.lock().add_ok(key, value))
    }

    /// Inserts every pair of every source under one lock acquisition
    pub fn add_many<I, M>(&self, sources: I) -> Result<(), MapError>
    where
        I: IntoIterator<Item = M>,
        M: IntoIterator<Item = (K, V)>,
    {
        self.lock().add_many(sources);
        Ok(())
    }

    pub fn add_many_func<I, M, F>(&self, sources: I, predicate: F) -> Result<(), MapError>
    where
        I: IntoIterator<Item = M>,
        M: IntoIterator<Item = (K, V)>,
        F: FnMut(usize, &K, &V) -> bool,
    {
        self.lock().add_many_func(sources, predicate);
        Ok(())
    }

    /// Per-pair insertion outcomes, see [`Lexicon::add_many_ok`]
    pub fn add_many_ok<I, M>(&self, sources: I) -> Result<Vec<bool>, MapError>
    where
        I: IntoIterator<Item = M>,
        M: IntoIterator<Item = (K, V)>,
    {
        Ok(self.lock().add_many_ok(sources))
    }

    pub fn delete<Q>(&self, key: &Q) -> Result<(), MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        self.lock().delete(key);
        Ok(())
    }

    pub fn delete_length<Q>(&self, key: &Q) -> Result<usize, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        Ok(self.lock().delete_length(key))
    }

    /// Ensures `key` is absent; `Ok(true)` whether or not it was present
    pub fn delete_ok<Q>(&self, key: &Q) -> Result<bool, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        Ok(self.lock().delete_ok(key))
    }

    /// Removes a value from the lexicon
    ///
    /// # Returns
    ///
    /// Returns `Ok(true)` if the key was present and removed, `Ok(false)` if not present.
    pub fn remove<Q>(&self, key: &Q) -> Result<bool, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        Ok(self.lock().remove(key))
    }

    pub fn delete_many<'a, Q, I>(&self, keys: I) -> Result<(), MapError>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        self.lock().delete_many(keys);
        Ok(())
    }

    pub fn delete_many_ok<'a, Q, I>(&self, keys: I) -> Result<Vec<bool>, MapError>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        Ok(self.lock().delete_many_ok(keys))
    }

    pub fn delete_many_func<F>(&self, predicate: F) -> Result<(), MapError>
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.lock().delete_many_func(predicate);
        Ok(())
    }

    pub fn delete_many_values<'a, I>(&self, values: I) -> Result<(), MapError>
    where
        V: PartialEq + 'a,
        I: IntoIterator<Item = &'a V>,
    {
        self.lock().delete_many_values(values);
        Ok(())
    }

    /// Retrieves a clone of the value under `key`
    ///
    /// Absence is reported as `Ok(None)`, never as an error.
    pub fn get<Q>(&self, key: &Q) -> Result<Option<V>, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
        V: Clone,
    {
        Ok(self.lock().get(key).cloned())
    }

    pub fn get_length<Q>(&self, key: &Q) -> Result<(Option<V>, usize), MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
        V: Clone,
    {
        let store = self.lock();
        let (value, length) = store.get_length(key);
        Ok((value.cloned(), length))
    }

    /// Like [`get`](Self::get) but yields `V::default()` when absent
    pub fn fetch<Q>(&self, key: &Q) -> Result<V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
        V: Clone + Default,
    {
        Ok(self.lock().fetch(key))
    }

    pub fn get_many<'a, Q, I>(&self, keys: I) -> Result<Vec<V>, MapError>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
        V: Clone,
    {
        Ok(self.lock().get_many(keys))
    }

    pub fn has<Q>(&self, key: &Q) -> Result<bool, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        Ok(self.lock().has(key))
    }

    pub fn has_many<'a, Q, I>(&self, keys: I) -> Result<Vec<bool>, MapError>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        Ok(self.lock().has_many(keys))
    }

    pub fn has_all<'a, Q, I>(&self, keys: I) -> Result<bool, MapError>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        Ok(self.lock().has_all(keys))
    }

    pub fn has_none<'a, Q, I>(&self, keys: I) -> Result<bool, MapError>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        Ok(self.lock().has_none(keys))
    }

    pub fn not<Q>(&self, key: &Q) -> Result<bool, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        Ok(self.lock().not(key))
    }

    pub fn not_many<'a, Q, I>(&self, keys: I) -> Result<Vec<bool>, MapError>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        Ok(self.lock().not_many(keys))
    }

    /// Removes `key` and returns its value, or `V::default()` when absent
    pub fn pop<Q>(&self, key: &Q) -> Result<V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
        V: Default,
    {
        Ok(self.lock().pop(key))
    }

    /// Removes `key` and returns its value if it was present
    ///
    /// The lookup and the removal happen under one lock acquisition.
    pub fn pop_ok<Q>(&self, key: &Q) -> Result<Option<V>, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        Ok(self.lock().pop_ok(key))
    }

    pub fn pop_many<'a, Q, I>(&self, keys: I) -> Result<Vec<V>, MapError>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        Ok(self.lock().pop_many(keys))
    }

    pub fn pop_many_func<F>(&self, predicate: F) -> Result<Vec<V>, MapError>
    where
        K: Clone,
        F: FnMut(&K, &V) -> bool,
    {
        Ok(self.lock().pop_many_func(predicate))
    }

    /// Returns a new, independent SyncLexicon with the pairs matching `predicate`
    pub fn filter<F>(&self, predicate: F) -> Result<Self, MapError>
    where
        K: Clone,
        V: Clone,
        F: FnMut(&K, &V) -> bool,
    {
        Ok(Self::from(self.lock().filter(predicate)))
    }

    pub fn map<F>(&self, f: F) -> Result<Self, MapError>
    where
        K: Clone,
        F: FnMut(&K, &V) -> V,
    {
        Ok(Self::from(self.lock().map(f)))
    }

    /// See [`Lexicon::map_break`]; the pair that stops the mapping is excluded
    pub fn map_break<F>(&self, f: F) -> Result<Self, MapError>
    where
        K: Clone,
        F: FnMut(&K, &V) -> Option<V>,
    {
        Ok(Self::from(self.lock().map_break(f)))
    }

    /// Copies every pair of `other` into `self`, overwriting on collision
    ///
    /// Both locks are held for the duration of the copy.
    pub fn merge(&self, other: &Self) -> Result<(), MapError>
    where
        K: Clone,
        V: Clone,
    {
        self.merge_func(other, |_, _| true)
    }

    pub fn merge_func<F>(&self, other: &Self, predicate: F) -> Result<(), MapError>
    where
        K: Clone,
        V: Clone,
        F: FnMut(&K, &V) -> bool,
    {
        if self.is_same(other) {
            let mut store = self.lock();
            let source = store.clone();
            store.merge_func(&source, predicate);
            return Ok(());
        }
        let (mut ours, theirs) = self.lock_pair(other);
        ours.merge_func(&theirs, predicate);
        Ok(())
    }

    /// Merges every source in order, later sources winning on collision
    ///
    /// The receiver and all sources stay locked for the whole call, so no
    /// other caller observes a partly merged lexicon.
    pub fn merge_many<'a, I>(&self, others: I) -> Result<(), MapError>
    where
        K: Clone + 'a,
        V: Clone + 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        self.merge_many_func(others, |_, _, _| true)
    }

    pub fn merge_many_func<'a, I, F>(&self, others: I, mut predicate: F) -> Result<(), MapError>
    where
        K: Clone + 'a,
        V: Clone + 'a,
        I: IntoIterator<Item = &'a Self>,
        F: FnMut(usize, &K, &V) -> bool,
    {
        let sources: Vec<&Self> = others.into_iter().collect();

        // Every distinct handle, locked in address order like `lock_pair`
        let mut handles: Vec<&Self> = vec![self];
        for source in &sources {
            if !handles.iter().any(|held| held.is_same(source)) {
                handles.push(*source);
            }
        }
        handles.sort_by_key(|handle| Arc::as_ptr(&handle.items));
        let mut guards: Vec<(*const Mutex<Lexicon<K, V>>, Guard<'_, K, V>)> = handles
            .iter()
            .map(|handle| (Arc::as_ptr(&handle.items), handle.lock()))
            .collect();

        let position = guards
            .iter()
            .position(|(ptr, _)| *ptr == Arc::as_ptr(&self.items))
            .unwrap_or_default();
        let (_, mut ours) = guards.swap_remove(position);

        for (index, source) in sources.iter().enumerate() {
            if self.is_same(source) {
                let copy = ours.clone();
                ours.merge_func(&copy, |key, value| predicate(index, key, value));
                continue;
            }
            let theirs = guards
                .iter()
                .find(|(ptr, _)| *ptr == Arc::as_ptr(&source.items));
            if let Some((_, theirs)) = theirs {
                ours.merge_func(theirs, |key, value| predicate(index, key, value));
            }
        }
        debug!("merged {} sources under one critical section", sources.len());
        Ok(())
    }

    pub fn intersection(&self, other: &Self) -> Result<Self, MapError>
    where
        K: Clone,
        V: Clone + PartialEq,
    {
        self.intersection_func(other, |_, a, b| a == b)
    }

    pub fn intersection_func<F>(&self, other: &Self, predicate: F) -> Result<Self, MapError>
    where
        K: Clone,
        V: Clone,
        F: FnMut(&K, &V, &V) -> bool,
    {
        if self.is_same(other) {
            let store = self.lock();
            return Ok(Self::from(store.intersection_func(&store, predicate)));
        }
        let (ours, theirs) = self.lock_pair(other);
        Ok(Self::from(ours.intersection_func(&theirs, predicate)))
    }

    /// Returns the first key found whose value equals `value`
    pub fn contains(&self, value: &V) -> Result<Option<K>, MapError>
    where
        K: Clone,
        V: PartialEq,
    {
        Ok(self.lock().contains(value))
    }

    pub fn equal(&self, other: &Self) -> Result<bool, MapError>
    where
        V: PartialEq,
    {
        self.equal_func(other, |a, b| a == b)
    }

    pub fn equal_func<F>(&self, other: &Self, f: F) -> Result<bool, MapError>
    where
        F: FnMut(&V, &V) -> bool,
    {
        if self.is_same(other) {
            let store = self.lock();
            return Ok(store.equal_func(&store, f));
        }
        let (ours, theirs) = self.lock_pair(other);
        Ok(ours.equal_func(&theirs, f))
    }

    /// Returns a vector of all keys
    pub fn keys(&self) -> Result<Vec<K>, MapError>
    where
        K: Clone,
    {
        Ok(self.lock().keys())
    }

    /// Returns a vector of all values
    pub fn values(&self) -> Result<Vec<V>, MapError>
    where
        V: Clone,
    {
        Ok(self.lock().values())
    }

    pub fn keys_func<F>(&self, predicate: F) -> Result<Vec<K>, MapError>
    where
        K: Clone,
        F: FnMut(&K) -> bool,
    {
        Ok(self.lock().keys_func(predicate))
    }

    pub fn values_func<F>(&self, predicate: F) -> Result<Vec<V>, MapError>
    where
        V: Clone,
        F: FnMut(&K, &V) -> bool,
    {
        Ok(self.lock().values_func(predicate))
    }

    /// Moves every pair into `other`, leaving `self` empty
    ///
    /// Both locks are held for the whole move. Passing the receiver itself
    /// leaves it unchanged.
    pub fn empty_into(&self, other: &Self) -> Result<(), MapError> {
        if self.is_same(other) {
            let _store = self.lock();
            return Ok(());
        }
        let (mut ours, mut theirs) = self.lock_pair(other);
        debug!("moving {} pairs into another lexicon", ours.len());
        ours.empty_into(&mut theirs);
        Ok(())
    }

    /// Moves every pair out of `other` into `self`, leaving `other` empty
    pub fn take_from(&self, other: &Self) -> Result<(), MapError> {
        if self.is_same(other) {
            let _store = self.lock();
            return Ok(());
        }
        let (mut ours, mut theirs) = self.lock_pair(other);
        debug!("taking {} pairs from another lexicon", theirs.len());
        ours.take_from(&mut theirs);
        Ok(())
    }

    /// Overwrites each value for which `f` returns `Some`
    pub fn replace_many<F>(&self, f: F) -> Result<(), MapError>
    where
        F: FnMut(&K, &V) -> Option<V>,
    {
        self.lock().replace_many(f);
        Ok(())
    }

    /// Gets a value by executing a closure with read access
    ///
    /// Useful for inspecting values that are expensive or impossible to clone.
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_lexicon::{SyncLexicon, MapError};
    ///
    /// let store = SyncLexicon::<String, Vec<i32>>::new();
    /// store.add("numbers".to_string(), vec![1, 2, 3])?;
    ///
    /// let length = store.with("numbers", |v| v.len())?;
    /// assert_eq!(length, 3);
    /// # Ok::<(), MapError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `MapError::KeyNotFound` if the key doesn't exist
    pub fn with<Q, F, R>(&self, key: &Q, f: F) -> Result<R, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash + Debug,
        F: FnOnce(&V) -> R,
    {
        let store = self.lock();
        let value = store
            .get(key)
            .ok_or_else(|| MapError::KeyNotFound(format!("{:?}", key)))?;
        Ok(f(value))
    }

    /// Gets a value by executing a closure with write access
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_lexicon::{SyncLexicon, MapError};
    ///
    /// let store = SyncLexicon::<String, Vec<i32>>::new();
    /// store.add("numbers".to_string(), vec![1, 2, 3])?;
    ///
    /// let new_len = store.with_mut("numbers", |v| {
    ///     v.push(4);
    ///     v.len()
    /// })?;
    ///
    /// assert_eq!(new_len, 4);
    /// assert_eq!(store.get("numbers")?, Some(vec![1, 2, 3, 4]));
    /// # Ok::<(), MapError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `MapError::KeyNotFound` if the key doesn't exist
    pub fn with_mut<Q, F, R>(&self, key: &Q, f: F) -> Result<R, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash + Debug,
        F: FnOnce(&mut V) -> R,
    {
        let mut store = self.lock();
        let value = store
            .get_mut(key)
            .ok_or_else(|| MapError::KeyNotFound(format!("{:?}", key)))?;
        Ok(f(value))
    }
}

impl<K, V> Clone for SyncLexicon<K, V> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<K, V> Default for SyncLexicon<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Debug for SyncLexicon<K, V>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.items.try_lock() {
            Ok(store) => f.debug_tuple("SyncLexicon").field(&*store).finish(),
            Err(_) => f.write_str("SyncLexicon(<locked>)"),
        }
    }
}

impl<K, V> From<Lexicon<K, V>> for SyncLexicon<K, V> {
    fn from(lexicon: Lexicon<K, V>) -> Self {
        Self {
            items: Arc::new(Mutex::new(lexicon)),
        }
    }
}

impl<K, V> From<HashMap<K, V>> for SyncLexicon<K, V> {
    fn from(items: HashMap<K, V>) -> Self {
        Self::from(Lexicon::from(items))
    }
}

impl<K, V> FromIterator<(K, V)> for SyncLexicon<K, V>
where
    K: Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Lexicon<K, V>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_pair_locking_in_both_directions() -> Result<(), MapError> {
        let a = SyncLexicon::from_maps([[(1, 1), (2, 2)]]);
        let b = SyncLexicon::from_maps([[(3, 3)]]);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let (a, b) = (a.clone(), b.clone());
                thread::spawn(move || -> Result<(), MapError> {
                    for _ in 0..200 {
                        if i % 2 == 0 {
                            a.merge(&b)?;
                        } else {
                            b.merge(&a)?;
                        }
                    }
                    Ok(())
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap()?;
        }

        assert!(a.equal(&b)?);
        assert_eq!(a.len()?, 3);
        Ok(())
    }

    #[test]
    fn test_operations_with_self() -> Result<(), MapError> {
        let a = SyncLexicon::from_maps([[("x", 1), ("y", 2)]]);
        let alias = a.clone();

        a.merge(&alias)?;
        assert_eq!(a.len()?, 2);
        assert!(a.equal(&alias)?);
        assert!(a.equal_length(&alias)?);
        assert_eq!(a.intersection(&alias)?.len()?, 2);

        a.empty_into(&alias)?;
        a.take_from(&alias)?;
        assert_eq!(a.len()?, 2);
        Ok(())
    }

    #[test]
    fn test_panicking_callback_does_not_break_later_calls() -> Result<(), MapError> {
        let store = SyncLexicon::from_maps([[("k", 1)]]);
        let inner = store.clone();

        let result = thread::spawn(move || {
            let _ = inner.each(|_, _| panic!("callback failure"));
        })
        .join();
        assert!(result.is_err());

        assert_eq!(store.len()?, 1);
        store.add("j", 2)?;
        assert_eq!(store.get("j")?, Some(2));
        assert_eq!(store.fetch("k")?, 1);
        Ok(())
    }

    #[test]
    fn test_merge_many_is_one_critical_section() -> Result<(), MapError> {
        let target = SyncLexicon::<&str, i32>::new();
        let first = SyncLexicon::from_maps([[("a", 1)]]);
        let second = SyncLexicon::from_maps([[("b", 2)]]);

        // Hold the second source busy so the merge has to wait on it
        let busy = second.clone();
        let holder = thread::spawn(move || {
            let _ = busy.each(|_, _| thread::sleep(Duration::from_millis(300)));
        });
        thread::sleep(Duration::from_millis(50));

        let merging = (target.clone(), first.clone(), second.clone());
        let merger = thread::spawn(move || {
            let (target, first, second) = merging;
            target.merge_many([&first, &second])
        });
        thread::sleep(Duration::from_millis(100));

        let observed = target.len()?;
        merger.join().unwrap()?;
        holder.join().unwrap();

        assert_ne!(observed, 1, "saw a lexicon with only some sources merged");
        assert_eq!(target.len()?, 2);
        Ok(())
    }

    #[test]
    fn test_merge_many_with_self_and_duplicates() -> Result<(), MapError> {
        let target = SyncLexicon::from_maps([[("x", 1)]]);
        let other = SyncLexicon::from_maps([[("y", 2)]]);

        target.merge_many([&other, &target.clone(), &other])?;
        assert_eq!(target.len()?, 2);

        let mut seen = Vec::new();
        target.merge_many_func([&other, &other], |index, _, _| {
            seen.push(index);
            false
        })?;
        assert_eq!(seen, vec![0, 1]);
        Ok(())
    }

    #[test]
    fn test_mutate_runs_under_one_lock() -> Result<(), MapError> {
        let store = SyncLexicon::from_maps([[("hits", 0u32), ("misses", 0)]]);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || -> Result<(), MapError> {
                    for _ in 0..250 {
                        store.mutate(|lexicon| {
                            let hits = lexicon.fetch("hits");
                            lexicon.add("hits", hits + 1).add("misses", hits);
                        })?;
                    }
                    Ok(())
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap()?;
        }

        assert_eq!(store.fetch("hits")?, 1000);
        assert_eq!(store.fetch("misses")?, 999);
        Ok(())
    }

    #[test]
    fn test_debug_output() -> Result<(), MapError> {
        let store = SyncLexicon::from_maps([[("k", 1)]]);
        assert_eq!(format!("{:?}", store), "SyncLexicon(Lexicon { items: {\"k\": 1} })");
        Ok(())
    }
}
