use std::borrow::Borrow;
use std::collections::hash_map::{self, Entry, HashMap};
use std::hash::Hash;

/// An unordered key-value container with traversal, transformation and
/// set-like composition helpers.
///
/// `Lexicon` is the single-threaded profile of the crate: it owns a
/// [`HashMap`] and layers convenience operations on top of it. Use
/// [`SyncLexicon`](crate::SyncLexicon) when the container is shared between
/// threads.
///
/// Iteration order is unspecified and may differ between calls.
///
/// # Examples
///
/// ```
/// use sovran_lexicon::Lexicon;
///
/// let mut fruit = Lexicon::new();
/// fruit.add("apple", 5).add("banana", 3).add("cherry", 8);
///
/// let ripe = fruit.filter(|_, count| *count > 4);
/// assert_eq!(ripe.len(), 2);
/// assert_eq!(fruit.len(), 3);
///
/// assert!(fruit.add_ok("grape", 1));
/// assert!(!fruit.add_ok("grape", 7));
/// assert_eq!(fruit.get("grape"), Some(&1));
/// ```
#[derive(Clone, Debug)]
pub struct Lexicon<K, V> {
    items: HashMap<K, V>,
}

impl<K, V> Lexicon<K, V> {
    /// Creates an empty lexicon.
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
        }
    }

    /// Creates an empty lexicon with room for at least `capacity` pairs.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: HashMap::with_capacity(capacity),
        }
    }

    /// Returns the number of pairs.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_populated(&self) -> bool {
        !self.is_empty()
    }

    /// Returns true when both lexicons hold the same number of pairs.
    pub fn equal_length(&self, other: &Self) -> bool {
        self.len() == other.len()
    }

    /// Iterates over all pairs in unspecified order.
    pub fn iter(&self) -> hash_map::Iter<'_, K, V> {
        self.items.iter()
    }

    /// Consumes the lexicon, returning the underlying map.
    pub fn into_inner(self) -> HashMap<K, V> {
        self.items
    }

    /// Calls `f` once for every pair.
    pub fn each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for (key, value) in &self.items {
            f(key, value);
        }
    }

    /// Calls `f` for each pair until it returns `false`.
    ///
    /// Pairs after the one that stopped the traversal are not visited. Since
    /// the order is unspecified, which pairs those are is unspecified too.
    pub fn each_break<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        for (key, value) in &self.items {
            if !f(key, value) {
                break;
            }
        }
    }

    pub fn each_key<F>(&self, mut f: F)
    where
        F: FnMut(&K),
    {
        self.each(|key, _| f(key));
    }

    pub fn each_key_break<F>(&self, mut f: F)
    where
        F: FnMut(&K) -> bool,
    {
        self.each_break(|key, _| f(key));
    }

    pub fn each_value<F>(&self, mut f: F)
    where
        F: FnMut(&V),
    {
        self.each(|_, value| f(value));
    }

    pub fn each_value_break<F>(&self, mut f: F)
    where
        F: FnMut(&V) -> bool,
    {
        self.each_break(|_, value| f(value));
    }

    /// Removes every pair.
    pub fn clear(&mut self) -> &mut Self {
        self.items.clear();
        self
    }
}

impl<K, V> Lexicon<K, V>
where
    K: Eq + Hash,
{
    /// Builds a lexicon from several sources merged in order.
    ///
    /// When two sources share a key, the later one wins.
    ///
    /// ```
    /// use sovran_lexicon::Lexicon;
    ///
    /// let lexicon = Lexicon::from_maps([vec![("a", 1), ("b", 2)], vec![("a", 3)]]);
    /// assert_eq!(lexicon.get("a"), Some(&3));
    /// assert_eq!(lexicon.len(), 2);
    /// ```
    pub fn from_maps<I, M>(sources: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: IntoIterator<Item = (K, V)>,
    {
        let mut lexicon = Self::new();
        lexicon.add_many(sources);
        lexicon
    }

    /// Inserts `value` under `key`, overwriting any previous value.
    pub fn add(&mut self, key: K, value: V) -> &mut Self {
        self.items.insert(key, value);
        self
    }

    /// Inserts `value` under `key` and returns the new length.
    pub fn add_length(&mut self, key: K, value: V) -> usize {
        self.add(key, value).len()
    }

    /// Inserts only when `key` is absent. Returns whether the insertion happened.
    pub fn add_ok(&mut self, key: K, value: V) -> bool {
        match self.items.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(value);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Inserts every pair of every source, in order. Last write wins.
    pub fn add_many<I, M>(&mut self, sources: I) -> &mut Self
    where
        I: IntoIterator<Item = M>,
        M: IntoIterator<Item = (K, V)>,
    {
        for source in sources {
            self.items.extend(source);
        }
        self
    }

    /// Inserts the pairs for which `predicate(source_index, key, value)` holds.
    pub fn add_many_func<I, M, F>(&mut self, sources: I, mut predicate: F) -> &mut Self
    where
        I: IntoIterator<Item = M>,
        M: IntoIterator<Item = (K, V)>,
        F: FnMut(usize, &K, &V) -> bool,
    {
        for (index, source) in sources.into_iter().enumerate() {
            for (key, value) in source {
                if predicate(index, &key, &value) {
                    self.items.insert(key, value);
                }
            }
        }
        self
    }

    /// Runs [`add_ok`](Self::add_ok) for every pair and records each outcome
    /// in encounter order.
    ///
    /// Presence is checked when the pair is processed, so a key inserted by
    /// an earlier pair of the same call makes later duplicates report `false`.
    pub fn add_many_ok<I, M>(&mut self, sources: I) -> Vec<bool>
    where
        I: IntoIterator<Item = M>,
        M: IntoIterator<Item = (K, V)>,
    {
        let mut outcomes = Vec::new();
        for source in sources {
            for (key, value) in source {
                outcomes.push(self.add_ok(key, value));
            }
        }
        outcomes
    }

    /// Removes `key` if present. Absence is not an error.
    pub fn delete<Q>(&mut self, key: &Q) -> &mut Self
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        self.items.remove(key);
        self
    }

    /// Removes `key` and returns the new length.
    pub fn delete_length<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        self.delete(key).len()
    }

    /// Ensures `key` is absent and reports that it is.
    ///
    /// The result is `true` whether or not the key was present beforehand.
    /// Use [`remove`](Self::remove) or [`pop_ok`](Self::pop_ok) to learn
    /// whether something was actually removed.
    pub fn delete_ok<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        !self.delete(key).has(key)
    }

    /// Removes `key`, returning `true` only if an entry was present.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        self.items.remove(key).is_some()
    }

    pub fn delete_many<'a, Q, I>(&mut self, keys: I) -> &mut Self
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        for key in keys {
            self.items.remove(key);
        }
        self
    }

    /// Runs [`delete_ok`](Self::delete_ok) for every key, in order.
    pub fn delete_many_ok<'a, Q, I>(&mut self, keys: I) -> Vec<bool>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        keys.into_iter().map(|key| self.delete_ok(key)).collect()
    }

    /// Removes every pair for which `predicate` holds.
    pub fn delete_many_func<F>(&mut self, mut predicate: F) -> &mut Self
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.items.retain(|key, value| !predicate(key, value));
        self
    }

    /// Removes every pair whose value equals one of `values`.
    pub fn delete_many_values<'a, I>(&mut self, values: I) -> &mut Self
    where
        V: PartialEq + 'a,
        I: IntoIterator<Item = &'a V>,
    {
        let values: Vec<&V> = values.into_iter().collect();
        self.items
            .retain(|_, value| !values.iter().any(|candidate| *candidate == value));
        self
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        self.items.get(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        self.items.get_mut(key)
    }

    /// Looks up `key` and also reports the current length.
    pub fn get_length<Q>(&self, key: &Q) -> (Option<&V>, usize)
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        (self.get(key), self.len())
    }

    /// Returns a copy of the value under `key`, or `V::default()` when absent.
    pub fn fetch<Q>(&self, key: &Q) -> V
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
        V: Clone + Default,
    {
        self.get(key).cloned().unwrap_or_default()
    }

    /// Looks up each key. Absent keys are left out of the result.
    pub fn get_many<'a, Q, I>(&self, keys: I) -> Vec<V>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
        V: Clone,
    {
        keys.into_iter()
            .filter_map(|key| self.items.get(key).cloned())
            .collect()
    }

    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        self.items.contains_key(key)
    }

    /// Presence of each key, one slot per key.
    pub fn has_many<'a, Q, I>(&self, keys: I) -> Vec<bool>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        keys.into_iter().map(|key| self.has(key)).collect()
    }

    /// True when every key is present. Stops at the first absent key.
    pub fn has_all<'a, Q, I>(&self, keys: I) -> bool
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        keys.into_iter().all(|key| self.has(key))
    }

    /// True when no key is present. Stops at the first present key.
    pub fn has_none<'a, Q, I>(&self, keys: I) -> bool
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        keys.into_iter().all(|key| self.not(key))
    }

    pub fn not<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        !self.has(key)
    }

    pub fn not_many<'a, Q, I>(&self, keys: I) -> Vec<bool>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        keys.into_iter().map(|key| self.not(key)).collect()
    }

    /// Removes `key` and returns its value, or `V::default()` when absent.
    pub fn pop<Q>(&mut self, key: &Q) -> V
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
        V: Default,
    {
        self.pop_ok(key).unwrap_or_default()
    }

    /// Removes `key` and returns its value if it was present.
    pub fn pop_ok<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        self.items.remove(key)
    }

    /// Pops each key in order. Absent keys contribute nothing.
    pub fn pop_many<'a, Q, I>(&mut self, keys: I) -> Vec<V>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        keys.into_iter()
            .filter_map(|key| self.items.remove(key))
            .collect()
    }

    /// Pops every pair for which `predicate` holds and returns their values.
    pub fn pop_many_func<F>(&mut self, mut predicate: F) -> Vec<V>
    where
        K: Clone,
        F: FnMut(&K, &V) -> bool,
    {
        let matched: Vec<K> = self
            .items
            .iter()
            .filter(|(key, value)| predicate(key, value))
            .map(|(key, _)| key.clone())
            .collect();
        matched
            .iter()
            .filter_map(|key| self.items.remove(key))
            .collect()
    }

    /// Returns a new lexicon holding the pairs for which `predicate` holds.
    pub fn filter<F>(&self, mut predicate: F) -> Self
    where
        K: Clone,
        V: Clone,
        F: FnMut(&K, &V) -> bool,
    {
        self.items
            .iter()
            .filter(|(key, value)| predicate(key, value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Returns a new lexicon with `f` applied to every value.
    pub fn map<F>(&self, mut f: F) -> Self
    where
        K: Clone,
        F: FnMut(&K, &V) -> V,
    {
        self.map_break(|key, value| Some(f(key, value)))
    }

    /// Like [`map`](Self::map), but stops as soon as `f` returns `None`.
    ///
    /// The pair that stopped the mapping is not part of the result.
    pub fn map_break<F>(&self, mut f: F) -> Self
    where
        K: Clone,
        F: FnMut(&K, &V) -> Option<V>,
    {
        let mut mapped = Self::new();
        for (key, value) in &self.items {
            match f(key, value) {
                Some(value) => mapped.add(key.clone(), value),
                None => break,
            };
        }
        mapped
    }

    /// Copies every pair of `other` into `self`, overwriting on collision.
    pub fn merge(&mut self, other: &Self) -> &mut Self
    where
        K: Clone,
        V: Clone,
    {
        self.merge_func(other, |_, _| true)
    }

    /// Copies the pairs of `other` for which `predicate` holds.
    pub fn merge_func<F>(&mut self, other: &Self, mut predicate: F) -> &mut Self
    where
        K: Clone,
        V: Clone,
        F: FnMut(&K, &V) -> bool,
    {
        for (key, value) in &other.items {
            if predicate(key, value) {
                self.items.insert(key.clone(), value.clone());
            }
        }
        self
    }

    pub fn merge_many<'a, I>(&mut self, others: I) -> &mut Self
    where
        K: Clone + 'a,
        V: Clone + 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        for other in others {
            self.merge(other);
        }
        self
    }

    /// Merges each source, passing its position to `predicate`.
    pub fn merge_many_func<'a, I, F>(&mut self, others: I, mut predicate: F) -> &mut Self
    where
        K: Clone + 'a,
        V: Clone + 'a,
        I: IntoIterator<Item = &'a Self>,
        F: FnMut(usize, &K, &V) -> bool,
    {
        for (index, other) in others.into_iter().enumerate() {
            self.merge_func(other, |key, value| predicate(index, key, value));
        }
        self
    }

    /// Pairs present in both lexicons under the same key with equal values.
    pub fn intersection(&self, other: &Self) -> Self
    where
        K: Clone,
        V: Clone + PartialEq,
    {
        self.intersection_func(other, |_, a, b| a == b)
    }

    /// Keeps the receiver's pairs whose key is in `other` and for which
    /// `predicate(key, ours, theirs)` holds.
    pub fn intersection_func<F>(&self, other: &Self, mut predicate: F) -> Self
    where
        K: Clone,
        V: Clone,
        F: FnMut(&K, &V, &V) -> bool,
    {
        let mut shared = Self::new();
        for (key, value) in &self.items {
            if let Some(theirs) = other.items.get(key) {
                if predicate(key, value, theirs) {
                    shared.add(key.clone(), value.clone());
                }
            }
        }
        shared
    }

    /// Returns the first key found whose value equals `value`.
    pub fn contains(&self, value: &V) -> Option<K>
    where
        K: Clone,
        V: PartialEq,
    {
        self.items
            .iter()
            .find(|(_, candidate)| *candidate == value)
            .map(|(key, _)| key.clone())
    }

    pub fn equal(&self, other: &Self) -> bool
    where
        V: PartialEq,
    {
        self.equal_func(other, |a, b| a == b)
    }

    /// Same length and, for every key of `self`, `other` holds that key with
    /// a value accepted by `f`.
    pub fn equal_func<F>(&self, other: &Self, mut f: F) -> bool
    where
        F: FnMut(&V, &V) -> bool,
    {
        if !self.equal_length(other) {
            return false;
        }
        self.items.iter().all(|(key, value)| match other.items.get(key) {
            Some(theirs) => f(value, theirs),
            None => false,
        })
    }

    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.items.keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.items.values().cloned().collect()
    }

    pub fn keys_func<F>(&self, mut predicate: F) -> Vec<K>
    where
        K: Clone,
        F: FnMut(&K) -> bool,
    {
        self.items
            .keys()
            .filter(|key| predicate(key))
            .cloned()
            .collect()
    }

    pub fn values_func<F>(&self, mut predicate: F) -> Vec<V>
    where
        V: Clone,
        F: FnMut(&K, &V) -> bool,
    {
        self.items
            .iter()
            .filter(|(key, value)| predicate(key, value))
            .map(|(_, value)| value.clone())
            .collect()
    }

    /// Moves every pair into `other`, leaving `self` empty.
    pub fn empty_into(&mut self, other: &mut Self) -> &mut Self {
        other.items.extend(self.items.drain());
        self
    }

    /// Moves every pair out of `other` into `self`, leaving `other` empty.
    pub fn take_from(&mut self, other: &mut Self) -> &mut Self {
        self.items.extend(other.items.drain());
        self
    }

    /// Overwrites each value for which `f` returns `Some`.
    pub fn replace_many<F>(&mut self, mut f: F) -> &mut Self
    where
        F: FnMut(&K, &V) -> Option<V>,
    {
        for (key, value) in self.items.iter_mut() {
            if let Some(replacement) = f(key, value) {
                *value = replacement;
            }
        }
        self
    }
}

impl<K, V> Default for Lexicon<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> PartialEq for Lexicon<K, V>
where
    K: Eq + Hash,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl<K, V> Eq for Lexicon<K, V>
where
    K: Eq + Hash,
    V: Eq,
{
}

impl<K, V> From<HashMap<K, V>> for Lexicon<K, V> {
    fn from(items: HashMap<K, V>) -> Self {
        Self { items }
    }
}

impl<K, V> FromIterator<(K, V)> for Lexicon<K, V>
where
    K: Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<K, V> Extend<(K, V)> for Lexicon<K, V>
where
    K: Eq + Hash,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<K, V> IntoIterator for Lexicon<K, V> {
    type Item = (K, V);
    type IntoIter = hash_map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, K, V> IntoIterator for &'a Lexicon<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = hash_map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
