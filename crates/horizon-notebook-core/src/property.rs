//! Change-detecting values.
//!
//! A [`Property`] wraps a value behind a lock and makes every assignment
//! report whether it actually changed anything. Models and widgets build
//! their "setting a field to its current value is a no-op" rule on top of
//! it: the notification signal is emitted only when the property says so.
//!
//! # Example
//!
//! ```
//! use horizon_notebook_core::{Property, Signal, ValueChange};
//!
//! struct Cell {
//!     source: Property<String>,
//!     source_changed: Signal<ValueChange<String>>,
//! }
//!
//! impl Cell {
//!     fn set_source(&self, source: &str) {
//!         if let Some(change) = self.source.change(source.to_string()) {
//!             self.source_changed.emit(change);
//!         }
//!     }
//! }
//! ```

use std::fmt;

use parking_lot::RwLock;

/// The old and new value of a property assignment that changed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueChange<T> {
    /// The value before the assignment.
    pub old_value: T,
    /// The value after the assignment.
    pub new_value: T,
}

/// A value that tracks whether assignments change it.
///
/// `Property<T>` uses interior mutability with a `RwLock`, so it can be
/// shared between a widget and the closures it connects to signals.
///
/// # Example
///
/// ```
/// use horizon_notebook_core::Property;
///
/// let prop = Property::new(42);
/// assert!(!prop.set(42));
/// assert!(prop.set(100));
/// assert_eq!(prop.get(), 100);
/// ```
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Set the value, returning `true` if it changed.
    pub fn set(&self, value: T) -> bool {
        self.replace(value).is_some()
    }

    /// Set the value, returning the previous one if it changed.
    pub fn replace(&self, value: T) -> Option<T> {
        let mut current = self.value.write();
        if *current == value {
            return None;
        }
        Some(std::mem::replace(&mut *current, value))
    }

    /// Set the value, returning the full change record if it changed.
    pub fn change(&self, value: T) -> Option<ValueChange<T>> {
        let new_value = value.clone();
        self.replace(value).map(|old_value| ValueChange {
            old_value,
            new_value,
        })
    }

    /// Mutate the value in place, returning the change record if the
    /// mutation left it different.
    pub fn update<F>(&self, f: F) -> Option<ValueChange<T>>
    where
        F: FnOnce(&mut T),
    {
        let mut current = self.value.write();
        let old_value = current.clone();
        f(&mut *current);
        if *current == old_value {
            None
        } else {
            Some(ValueChange {
                old_value,
                new_value: current.clone(),
            })
        }
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &*self.value.read())
            .finish()
    }
}
