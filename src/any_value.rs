use std::any::{Any, TypeId};
use std::fmt::{self, Debug};

/// Object-safe view of a stored value that keeps clone, equality and debug
/// formatting available after the concrete type is erased.
trait Erased: Any + Send + Sync {
    fn clone_box(&self) -> Box<dyn Erased>;
    fn eq_dyn(&self, other: &dyn Erased) -> bool;
    fn fmt_dyn(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> Erased for T
where
    T: Any + Send + Sync + Clone + PartialEq + Debug,
{
    fn clone_box(&self) -> Box<dyn Erased> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn Erased) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn fmt_dyn(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A type-erased value that preserves type information.
///
/// Values of different types never compare equal; values of the same type
/// compare with that type's `PartialEq`.
///
/// ```
/// use sovran_lexicon::AnyValue;
///
/// let a = AnyValue::new(42i64);
/// assert!(a.is_type::<i64>());
/// assert_eq!(a.downcast_ref::<i64>(), Some(&42));
/// assert_ne!(a, AnyValue::new(42i32));
/// assert_eq!(a, AnyValue::new(42i64));
/// ```
pub struct AnyValue {
    type_id: TypeId,
    type_name: &'static str,
    value: Box<dyn Erased>,
}

impl AnyValue {
    /// Wraps a value of any cloneable, comparable, thread-safe type.
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync + Clone + PartialEq + Debug,
    {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            value: Box::new(value),
        }
    }

    /// Check if the contained value is of type T
    pub fn is_type<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Name of the stored type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Get a reference to the contained value if it is of type T
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if !self.is_type::<T>() {
            return None;
        }
        self.value.as_any().downcast_ref::<T>()
    }

    /// Get a mutable reference to the contained value if it is of type T
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        if !self.is_type::<T>() {
            return None;
        }
        self.value.as_any_mut().downcast_mut::<T>()
    }
}

impl Clone for AnyValue {
    fn clone(&self) -> Self {
        Self {
            type_id: self.type_id,
            type_name: self.type_name,
            value: self.value.clone_box(),
        }
    }
}

impl PartialEq for AnyValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.value.eq_dyn(other.value.as_ref())
    }
}

impl Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt_dyn(f)
    }
}
