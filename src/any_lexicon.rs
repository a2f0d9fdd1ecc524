use crate::any_value::AnyValue;
use crate::error::MapError;
use crate::guarded::SyncLexicon;
use crate::typed::{TypedLexicon, TypedValue};
use std::any::Any;
use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Deref;

/// A thread-safe lexicon whose values may be of any type
///
/// Values are stored as [`AnyValue`] and their type is checked when they are
/// read back. All of the [`SyncLexicon`] operations are available through
/// `Deref`; the methods below add type-aware access on top.
///
/// # Examples
///
/// ```
/// use sovran_lexicon::{AnyLexicon, MapError};
///
/// let store = AnyLexicon::<String>::new();
/// store.set("number".to_string(), 42i32)?;
/// store.set("text".to_string(), "Hello, world!".to_string())?;
///
/// assert_eq!(store.get_as::<i32, _>("number")?, 42);
/// assert!(matches!(store.get_as::<bool, _>("text"), Err(MapError::TypeMismatch)));
/// assert_eq!(store.len()?, 2);
/// # Ok::<(), MapError>(())
/// ```
#[derive(Debug)]
pub struct AnyLexicon<K> {
    inner: SyncLexicon<K, AnyValue>,
}

impl<K> AnyLexicon<K>
where
    K: Eq + Hash,
{
    /// Creates a new, empty AnyLexicon
    pub fn new() -> Self {
        Self {
            inner: SyncLexicon::new(),
        }
    }

    /// Stores a value of any type, replacing whatever `key` held before
    pub fn set<T>(&self, key: K, value: T) -> Result<(), MapError>
    where
        T: Any + Send + Sync + Clone + PartialEq + Debug,
    {
        self.inner.add(key, AnyValue::new(value))
    }

    /// Retrieves a clone of the value under `key` as a `T`
    ///
    /// # Errors
    ///
    /// - Returns `MapError::KeyNotFound` if the key doesn't exist
    /// - Returns `MapError::TypeMismatch` if the stored value is not a `T`
    pub fn get_as<T, Q>(&self, key: &Q) -> Result<T, MapError>
    where
        T: Clone + 'static,
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash + Debug,
    {
        self.with_as(key, |value: &T| value.clone())
    }

    /// Runs `f` against the value under `key` viewed as a `T`
    ///
    /// # Errors
    ///
    /// - Returns `MapError::KeyNotFound` if the key doesn't exist
    /// - Returns `MapError::TypeMismatch` if the stored value is not a `T`
    pub fn with_as<T, Q, F, R>(&self, key: &Q, f: F) -> Result<R, MapError>
    where
        T: 'static,
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash + Debug,
        F: FnOnce(&T) -> R,
    {
        self.inner
            .with(key, |value| value.downcast_ref::<T>().map(f))?
            .ok_or(MapError::TypeMismatch)
    }

    /// Runs `f` against a mutable view of the value under `key` as a `T`
    ///
    /// ```
    /// use sovran_lexicon::{AnyLexicon, MapError};
    ///
    /// let store = AnyLexicon::<&str>::new();
    /// store.set("visits", 0u64)?;
    /// store.with_mut_as("visits", |visits: &mut u64| *visits += 1)?;
    /// assert_eq!(store.get_as::<u64, _>("visits")?, 1);
    /// # Ok::<(), MapError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// - Returns `MapError::KeyNotFound` if the key doesn't exist
    /// - Returns `MapError::TypeMismatch` if the stored value is not a `T`
    pub fn with_mut_as<T, Q, F, R>(&self, key: &Q, f: F) -> Result<R, MapError>
    where
        T: 'static,
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash + Debug,
        F: FnOnce(&mut T) -> R,
    {
        self.inner
            .with_mut(key, |value| value.downcast_mut::<T>().map(f))?
            .ok_or(MapError::TypeMismatch)
    }

    /// Returns a typed view over the same storage
    ///
    /// Writes through the view are visible here and the other way around.
    pub fn typed<V: TypedValue>(&self) -> TypedLexicon<K, V> {
        TypedLexicon::from_shared(self.inner.clone())
    }
}

impl<K> Deref for AnyLexicon<K> {
    type Target = SyncLexicon<K, AnyValue>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<K> Clone for AnyLexicon<K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K> Default for AnyLexicon<K> {
    fn default() -> Self {
        Self {
            inner: SyncLexicon::new(),
        }
    }
}

impl<K> From<SyncLexicon<K, AnyValue>> for AnyLexicon<K> {
    fn from(inner: SyncLexicon<K, AnyValue>) -> Self {
        Self { inner }
    }
}
