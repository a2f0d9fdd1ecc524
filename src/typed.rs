use crate::any_lexicon::AnyLexicon;
use crate::any_value::AnyValue;
use crate::error::MapError;
use crate::guarded::SyncLexicon;
use crate::lexicon::Lexicon;
use log::warn;
use std::any::{type_name, Any};
use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

/// Values a [`TypedLexicon`] can hold.
///
/// Implemented for every type that is thread-safe, cloneable, comparable,
/// printable and has a zero value.
pub trait TypedValue: Any + Send + Sync + Clone + PartialEq + Debug + Default {}

impl<T> TypedValue for T where T: Any + Send + Sync + Clone + PartialEq + Debug + Default {}

/// Lexicon of booleans.
pub type Booler<K> = TypedLexicon<K, bool>;
/// Lexicon of bytes.
pub type Byter<K> = TypedLexicon<K, u8>;
/// Lexicon of integers.
pub type Inter<K> = TypedLexicon<K, i64>;
/// Lexicon of strings.
pub type Stringer<K> = TypedLexicon<K, String>;

/// A thread-safe lexicon whose values are all of type `V`, stored in
/// type-erased form
///
/// `TypedLexicon` is a façade over the same storage an [`AnyLexicon`] uses.
/// Every write stores a `V`; every read checks the stored value back into a
/// `V`. Should the storage hold a value of another type (only possible when
/// it is shared with an `AnyLexicon` writer), reads see `V::default()` and a
/// warning is logged.
///
/// # Examples
///
/// ```
/// use sovran_lexicon::{Inter, MapError};
///
/// let stock = Inter::<&str>::new();
/// stock.add("apple", 5)?;
/// stock.add("banana", 3)?;
///
/// let doubled = stock.map(|_, count| count * 2)?;
/// assert_eq!(doubled.fetch("apple")?, 10);
/// assert_eq!(stock.fetch("apple")?, 5);
/// assert_eq!(stock.fetch("cherry")?, 0);
/// # Ok::<(), MapError>(())
/// ```
pub struct TypedLexicon<K, V> {
    inner: SyncLexicon<K, AnyValue>,
    _marker: PhantomData<fn() -> V>,
}

impl<K, V> TypedLexicon<K, V>
where
    K: Eq + Hash,
    V: TypedValue,
{
    /// Creates a new, empty TypedLexicon
    pub fn new() -> Self {
        Self::from_shared(SyncLexicon::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_shared(SyncLexicon::with_capacity(capacity))
    }

    /// Builds a TypedLexicon from several sources merged in order; later keys win
    pub fn from_maps<I, M>(sources: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: IntoIterator<Item = (K, V)>,
    {
        Self::from_shared(SyncLexicon::from_maps(erase_sources(sources)))
    }

    pub(crate) fn from_shared(inner: SyncLexicon<K, AnyValue>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Returns an untyped handle over the same storage
    pub fn as_any(&self) -> AnyLexicon<K> {
        AnyLexicon::from(self.inner.clone())
    }

    fn view<R>(value: &AnyValue, f: impl FnOnce(&V) -> R) -> R {
        match value.downcast_ref::<V>() {
            Some(typed) => f(typed),
            None => {
                Self::mismatch(value);
                f(&V::default())
            }
        }
    }

    fn cast(value: &AnyValue) -> V {
        Self::view(value, V::clone)
    }

    fn mismatch(value: &AnyValue) {
        warn!(
            "typed lexicon expected {} but found {}; using the default value",
            type_name::<V>(),
            value.type_name()
        );
    }

    pub fn len(&self) -> Result<usize, MapError> {
        self.inner.len()
    }

    pub fn is_empty(&self) -> Result<bool, MapError> {
        self.inner.is_empty()
    }

    pub fn is_populated(&self) -> Result<bool, MapError> {
        self.inner.is_populated()
    }

    pub fn equal_length(&self, other: &Self) -> Result<bool, MapError> {
        self.inner.equal_length(&other.inner)
    }

    pub fn clear(&self) -> Result<(), MapError> {
        self.inner.clear()
    }

    pub fn add(&self, key: K, value: V) -> Result<(), MapError> {
        self.inner.add(key, AnyValue::new(value))
    }

    pub fn add_length(&self, key: K, value: V) -> Result<usize, MapError> {
        self.inner.add_length(key, AnyValue::new(value))
    }

    pub fn add_ok(&self, key: K, value: V) -> Result<bool, MapError> {
        self.inner.add_ok(key, AnyValue::new(value))
    }

    pub fn add_many<I, M>(&self, sources: I) -> Result<(), MapError>
    where
        I: IntoIterator<Item = M>,
        M: IntoIterator<Item = (K, V)>,
    {
        self.inner.add_many(erase_sources(sources))
    }

    pub fn add_many_func<I, M, F>(&self, sources: I, mut predicate: F) -> Result<(), MapError>
    where
        I: IntoIterator<Item = M>,
        M: IntoIterator<Item = (K, V)>,
        F: FnMut(usize, &K, &V) -> bool,
    {
        self.inner
            .add_many_func(erase_sources(sources), |index, key, value| {
                Self::view(value, |typed| predicate(index, key, typed))
            })
    }

    pub fn add_many_ok<I, M>(&self, sources: I) -> Result<Vec<bool>, MapError>
    where
        I: IntoIterator<Item = M>,
        M: IntoIterator<Item = (K, V)>,
    {
        self.inner.add_many_ok(erase_sources(sources))
    }

    pub fn delete<Q>(&self, key: &Q) -> Result<(), MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        self.inner.delete(key)
    }

    pub fn delete_length<Q>(&self, key: &Q) -> Result<usize, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        self.inner.delete_length(key)
    }

    /// Ensures `key` is absent; `Ok(true)` whether or not it was present
    pub fn delete_ok<Q>(&self, key: &Q) -> Result<bool, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        self.inner.delete_ok(key)
    }

    pub fn remove<Q>(&self, key: &Q) -> Result<bool, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        self.inner.remove(key)
    }

    pub fn delete_many<'a, Q, I>(&self, keys: I) -> Result<(), MapError>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        self.inner.delete_many(keys)
    }

    pub fn delete_many_ok<'a, Q, I>(&self, keys: I) -> Result<Vec<bool>, MapError>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        self.inner.delete_many_ok(keys)
    }

    pub fn delete_many_func<F>(&self, mut predicate: F) -> Result<(), MapError>
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.inner
            .delete_many_func(|key, value| Self::view(value, |typed| predicate(key, typed)))
    }

    pub fn delete_many_values<'a, I>(&self, values: I) -> Result<(), MapError>
    where
        I: IntoIterator<Item = &'a V>,
    {
        let erased: Vec<AnyValue> = values.into_iter().cloned().map(AnyValue::new).collect();
        self.inner.delete_many_values(&erased)
    }

    pub fn get<Q>(&self, key: &Q) -> Result<Option<V>, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        Ok(self.inner.get(key)?.map(|value| Self::cast(&value)))
    }

    pub fn get_length<Q>(&self, key: &Q) -> Result<(Option<V>, usize), MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        let (value, length) = self.inner.get_length(key)?;
        Ok((value.map(|value| Self::cast(&value)), length))
    }

    /// Value under `key`, or `V::default()` when absent
    pub fn fetch<Q>(&self, key: &Q) -> Result<V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        Ok(self.get(key)?.unwrap_or_default())
    }

    pub fn get_many<'a, Q, I>(&self, keys: I) -> Result<Vec<V>, MapError>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        Ok(self.inner.get_many(keys)?.iter().map(Self::cast).collect())
    }

    pub fn has<Q>(&self, key: &Q) -> Result<bool, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        self.inner.has(key)
    }

    pub fn has_many<'a, Q, I>(&self, keys: I) -> Result<Vec<bool>, MapError>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        self.inner.has_many(keys)
    }

    pub fn has_all<'a, Q, I>(&self, keys: I) -> Result<bool, MapError>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        self.inner.has_all(keys)
    }

    pub fn has_none<'a, Q, I>(&self, keys: I) -> Result<bool, MapError>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        self.inner.has_none(keys)
    }

    pub fn not<Q>(&self, key: &Q) -> Result<bool, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        self.inner.not(key)
    }

    pub fn not_many<'a, Q, I>(&self, keys: I) -> Result<Vec<bool>, MapError>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        self.inner.not_many(keys)
    }

    pub fn pop<Q>(&self, key: &Q) -> Result<V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        Ok(self.pop_ok(key)?.unwrap_or_default())
    }

    pub fn pop_ok<Q>(&self, key: &Q) -> Result<Option<V>, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        Ok(self.inner.pop_ok(key)?.map(|value| Self::cast(&value)))
    }

    pub fn pop_many<'a, Q, I>(&self, keys: I) -> Result<Vec<V>, MapError>
    where
        K: Borrow<Q>,
        Q: 'a + ?Sized + Eq + Hash,
        I: IntoIterator<Item = &'a Q>,
    {
        Ok(self.inner.pop_many(keys)?.iter().map(Self::cast).collect())
    }

    pub fn pop_many_func<F>(&self, mut predicate: F) -> Result<Vec<V>, MapError>
    where
        K: Clone,
        F: FnMut(&K, &V) -> bool,
    {
        let popped = self
            .inner
            .pop_many_func(|key, value| Self::view(value, |typed| predicate(key, typed)))?;
        Ok(popped.iter().map(Self::cast).collect())
    }

    pub fn each<F>(&self, mut f: F) -> Result<(), MapError>
    where
        F: FnMut(&K, &V),
    {
        self.inner
            .each(|key, value| Self::view(value, |typed| f(key, typed)))
    }

    pub fn each_break<F>(&self, mut f: F) -> Result<(), MapError>
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.inner
            .each_break(|key, value| Self::view(value, |typed| f(key, typed)))
    }

    pub fn each_key<F>(&self, f: F) -> Result<(), MapError>
    where
        F: FnMut(&K),
    {
        self.inner.each_key(f)
    }

    pub fn each_key_break<F>(&self, f: F) -> Result<(), MapError>
    where
        F: FnMut(&K) -> bool,
    {
        self.inner.each_key_break(f)
    }

    pub fn each_value<F>(&self, mut f: F) -> Result<(), MapError>
    where
        F: FnMut(&V),
    {
        self.inner
            .each_value(|value| Self::view(value, |typed| f(typed)))
    }

    pub fn each_value_break<F>(&self, mut f: F) -> Result<(), MapError>
    where
        F: FnMut(&V) -> bool,
    {
        self.inner
            .each_value_break(|value| Self::view(value, |typed| f(typed)))
    }

    /// Applies a fallible function to all pairs, stopping at the first error
    pub fn apply<F>(&self, mut f: F) -> Result<(), MapError>
    where
        F: FnMut(&K, &V) -> Result<(), MapError>,
    {
        self.inner
            .apply(|key, value| Self::view(value, |typed| f(key, typed)))
    }

    pub fn filter<F>(&self, mut predicate: F) -> Result<Self, MapError>
    where
        K: Clone,
        F: FnMut(&K, &V) -> bool,
    {
        let filtered = self
            .inner
            .filter(|key, value| Self::view(value, |typed| predicate(key, typed)))?;
        Ok(Self::from_shared(filtered))
    }

    pub fn map<F>(&self, mut f: F) -> Result<Self, MapError>
    where
        K: Clone,
        F: FnMut(&K, &V) -> V,
    {
        let mapped = self
            .inner
            .map(|key, value| AnyValue::new(Self::view(value, |typed| f(key, typed))))?;
        Ok(Self::from_shared(mapped))
    }

    /// Like [`map`](Self::map) but stops at the first `None`, which is excluded
    pub fn map_break<F>(&self, mut f: F) -> Result<Self, MapError>
    where
        K: Clone,
        F: FnMut(&K, &V) -> Option<V>,
    {
        let mapped = self.inner.map_break(|key, value| {
            Self::view(value, |typed| f(key, typed)).map(AnyValue::new)
        })?;
        Ok(Self::from_shared(mapped))
    }

    pub fn merge(&self, other: &Self) -> Result<(), MapError>
    where
        K: Clone,
    {
        self.inner.merge(&other.inner)
    }

    pub fn merge_func<F>(&self, other: &Self, mut predicate: F) -> Result<(), MapError>
    where
        K: Clone,
        F: FnMut(&K, &V) -> bool,
    {
        self.inner.merge_func(&other.inner, |key, value| {
            Self::view(value, |typed| predicate(key, typed))
        })
    }

    pub fn merge_many<'a, I>(&self, others: I) -> Result<(), MapError>
    where
        K: Clone + 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        self.inner
            .merge_many(others.into_iter().map(|other| &other.inner))
    }

    pub fn merge_many_func<'a, I, F>(&self, others: I, mut predicate: F) -> Result<(), MapError>
    where
        K: Clone + 'a,
        I: IntoIterator<Item = &'a Self>,
        F: FnMut(usize, &K, &V) -> bool,
    {
        self.inner.merge_many_func(
            others.into_iter().map(|other| &other.inner),
            |index, key, value| Self::view(value, |typed| predicate(index, key, typed)),
        )
    }

    pub fn intersection(&self, other: &Self) -> Result<Self, MapError>
    where
        K: Clone,
    {
        Ok(Self::from_shared(self.inner.intersection(&other.inner)?))
    }

    pub fn intersection_func<F>(&self, other: &Self, mut predicate: F) -> Result<Self, MapError>
    where
        K: Clone,
        F: FnMut(&K, &V, &V) -> bool,
    {
        let shared = self.inner.intersection_func(&other.inner, |key, ours, theirs| {
            Self::view(ours, |ours| Self::view(theirs, |theirs| predicate(key, ours, theirs)))
        })?;
        Ok(Self::from_shared(shared))
    }

    pub fn contains(&self, value: &V) -> Result<Option<K>, MapError>
    where
        K: Clone,
    {
        self.inner.contains(&AnyValue::new(value.clone()))
    }

    pub fn equal(&self, other: &Self) -> Result<bool, MapError> {
        self.inner.equal(&other.inner)
    }

    pub fn equal_func<F>(&self, other: &Self, mut f: F) -> Result<bool, MapError>
    where
        F: FnMut(&V, &V) -> bool,
    {
        self.inner.equal_func(&other.inner, |ours, theirs| {
            Self::view(ours, |ours| Self::view(theirs, |theirs| f(ours, theirs)))
        })
    }

    pub fn keys(&self) -> Result<Vec<K>, MapError>
    where
        K: Clone,
    {
        self.inner.keys()
    }

    pub fn values(&self) -> Result<Vec<V>, MapError> {
        Ok(self.inner.values()?.iter().map(Self::cast).collect())
    }

    pub fn keys_func<F>(&self, predicate: F) -> Result<Vec<K>, MapError>
    where
        K: Clone,
        F: FnMut(&K) -> bool,
    {
        self.inner.keys_func(predicate)
    }

    pub fn values_func<F>(&self, mut predicate: F) -> Result<Vec<V>, MapError>
    where
        F: FnMut(&K, &V) -> bool,
    {
        let values = self
            .inner
            .values_func(|key, value| Self::view(value, |typed| predicate(key, typed)))?;
        Ok(values.iter().map(Self::cast).collect())
    }

    pub fn empty_into(&self, other: &Self) -> Result<(), MapError> {
        self.inner.empty_into(&other.inner)
    }

    pub fn take_from(&self, other: &Self) -> Result<(), MapError> {
        self.inner.take_from(&other.inner)
    }

    pub fn replace_many<F>(&self, mut f: F) -> Result<(), MapError>
    where
        F: FnMut(&K, &V) -> Option<V>,
    {
        self.inner.replace_many(|key, value| {
            Self::view(value, |typed| f(key, typed)).map(AnyValue::new)
        })
    }

    /// Runs `f` against the value under `key` without cloning it
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
        self.inner.with(key, |value| Self::view(value, f))
    }

    /// Runs `f` against a mutable view of the value under `key`
    ///
    /// A stored value of the wrong type is replaced by `V::default()` first.
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
        self.inner.with_mut(key, |value| {
            if !value.is_type::<V>() {
                Self::mismatch(value);
                *value = AnyValue::new(V::default());
            }
            match value.downcast_mut::<V>() {
                Some(typed) => f(typed),
                None => f(&mut V::default()),
            }
        })
    }

    /// Runs `f` against a typed copy of the whole lexicon under one lock
    ///
    /// The copy replaces the stored pairs once `f` returns. If `f` panics the
    /// stored pairs are left untouched.
    pub fn mutate<F, R>(&self, f: F) -> Result<R, MapError>
    where
        K: Clone,
        F: FnOnce(&mut Lexicon<K, V>) -> R,
    {
        self.inner.mutate(|store| {
            let mut typed: Lexicon<K, V> = store
                .iter()
                .map(|(key, value)| (key.clone(), Self::cast(value)))
                .collect();
            let result = f(&mut typed);
            *store = typed
                .into_iter()
                .map(|(key, value)| (key, AnyValue::new(value)))
                .collect();
            result
        })
    }

    /// Copies the current pairs out into a plain [`Lexicon`]
    pub fn snapshot(&self) -> Result<Lexicon<K, V>, MapError>
    where
        K: Clone,
    {
        Ok(self
            .inner
            .snapshot()?
            .into_iter()
            .map(|(key, value)| (key, Self::cast(&value)))
            .collect())
    }
}

fn erase_sources<K, V, I, M>(sources: I) -> impl Iterator<Item = impl Iterator<Item = (K, AnyValue)>>
where
    V: TypedValue,
    I: IntoIterator<Item = M>,
    M: IntoIterator<Item = (K, V)>,
{
    sources.into_iter().map(|source| {
        source
            .into_iter()
            .map(|(key, value)| (key, AnyValue::new(value)))
    })
}

impl<K, V> Clone for TypedLexicon<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, V> Default for TypedLexicon<K, V>
where
    K: Eq + Hash,
    V: TypedValue,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Debug for TypedLexicon<K, V>
where
    K: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedLexicon")
            .field("value_type", &type_name::<V>())
            .field("inner", &self.inner)
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for TypedLexicon<K, V>
where
    K: Eq + Hash,
    V: TypedValue,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_maps([iter])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_substitute_default_on_foreign_value() -> Result<(), MapError> {
        let flags = Booler::<&str>::new();
        flags.add("ready", true)?;

        let untyped = flags.as_any();
        untyped.set("broken", "not a bool".to_string())?;

        assert_eq!(flags.get("broken")?, Some(false));
        assert!(flags.fetch("ready")?);
        assert_eq!(flags.len()?, 2);
        Ok(())
    }

    #[test]
    fn test_with_mut_repairs_foreign_value() -> Result<(), MapError> {
        let counts = Inter::<&str>::new();
        counts.as_any().set("hits", 1.5f64)?;

        counts.with_mut("hits", |hits| *hits += 1)?;
        assert_eq!(counts.get("hits")?, Some(1));
        assert!(counts.as_any().get_as::<i64, _>("hits").is_ok());
        Ok(())
    }

    #[test]
    fn test_views_share_storage() -> Result<(), MapError> {
        let store = AnyLexicon::<u32>::new();
        let names: Stringer<u32> = store.typed();
        names.add(1, "one".to_string())?;

        assert_eq!(store.get_as::<String, _>(&1)?, "one");
        assert_eq!(store.typed::<String>().fetch(&1)?, "one");
        Ok(())
    }

    #[test]
    fn test_mutate_swaps_atomically() -> Result<(), MapError> {
        let slots: Stringer<u8> = [(1, "left".to_string()), (2, "right".to_string())]
            .into_iter()
            .collect();
        slots.as_any().set(3, 7i64)?;

        let swapped = slots.mutate(|lexicon| {
            let left = lexicon.pop(&1);
            let right = lexicon.pop(&2);
            lexicon.add(1, right).add(2, left);
            lexicon.len()
        })?;

        assert_eq!(swapped, 3);
        assert_eq!(slots.fetch(&1)?, "right");
        assert_eq!(slots.fetch(&2)?, "left");
        // The foreign value came back as the default string
        assert_eq!(slots.as_any().get_as::<String, _>(&3)?, "");
        Ok(())
    }

    #[test]
    fn test_bytes_round_through_snapshot() -> Result<(), MapError> {
        let bytes: Byter<char> = [('a', b'a'), ('b', b'b')].into_iter().collect();
        let snapshot = bytes.snapshot()?;
        assert_eq!(snapshot.get(&'a'), Some(&b'a'));
        assert_eq!(snapshot.len(), 2);
        Ok(())
    }
}
