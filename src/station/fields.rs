//! Named accessors over individual state fields.
//!
//! External glue (view bindings, inspectors) reads and writes single fields
//! through a station without knowing the whole state shape. Writes travel the
//! same command queue as actions, so they are serialized with reducer runs
//! and published the same way.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised by field lookups and table construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Field '{0}' is registered more than once")]
    Duplicate(String),

    #[error("Unknown field '{0}'")]
    Unknown(String),

    #[error("Field '{field}' holds {expected}, not {requested}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        requested: &'static str,
    },
}

/// Typed get/set pair for one field of `S`.
///
/// Usually declared with [`field!`](crate::field).
pub struct Field<S, V> {
    name: &'static str,
    get: fn(&S) -> &V,
    get_mut: fn(&mut S) -> &mut V,
}

impl<S, V> Clone for Field<S, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, V> Copy for Field<S, V> {}

impl<S, V> Field<S, V> {
    pub const fn new(name: &'static str, get: fn(&S) -> &V, get_mut: fn(&mut S) -> &mut V) -> Self {
        Self { name, get, get_mut }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get<'a>(&self, state: &'a S) -> &'a V {
        (self.get)(state)
    }

    pub fn get_mut<'a>(&self, state: &'a mut S) -> &'a mut V {
        (self.get_mut)(state)
    }
}

/// Declare a [`Field`] named after a struct member.
///
/// ```
/// use dripper::{field, Field};
///
/// struct Profile { name: String }
///
/// let name: Field<Profile, String> = field!(Profile, name);
/// assert_eq!(name.name(), "name");
/// ```
#[macro_export]
macro_rules! field {
    ($state:ty, $member:ident) => {
        $crate::Field::new(
            stringify!($member),
            |state: &$state| &state.$member,
            |state: &mut $state| &mut state.$member,
        )
    };
}

pub(crate) trait ErasedField<S>: Send + Sync {
    fn key(&self) -> &'static str;
    fn value_type(&self) -> (TypeId, &'static str);
    fn read(&self, state: &S) -> Box<dyn Any>;
    fn write(&self, state: &mut S, value: Box<dyn Any + Send>);
}

impl<S, V> ErasedField<S> for Field<S, V>
where
    S: 'static,
    V: Clone + 'static,
{
    fn key(&self) -> &'static str {
        self.name
    }

    fn value_type(&self) -> (TypeId, &'static str) {
        (TypeId::of::<V>(), type_name::<V>())
    }

    fn read(&self, state: &S) -> Box<dyn Any> {
        Box::new(self.get(state).clone())
    }

    fn write(&self, state: &mut S, value: Box<dyn Any + Send>) {
        match value.downcast::<V>() {
            Ok(value) => *self.get_mut(state) = *value,
            Err(_) => tracing::error!(field = self.name, "field write with mismatched type dropped"),
        }
    }
}

/// Symbolic-key table of fields, checked for duplicates as it is built.
pub struct FieldTable<S> {
    fields: HashMap<&'static str, Arc<dyn ErasedField<S>>>,
}

impl<S: 'static> FieldTable<S> {
    pub fn new() -> Self {
        Self {
            fields: HashMap::new(),
        }
    }

    /// Register `field` under its name.
    pub fn with<V>(mut self, field: Field<S, V>) -> Result<Self, FieldError>
    where
        V: Clone + 'static,
    {
        if self.fields.contains_key(field.name()) {
            return Err(FieldError::Duplicate(field.name().to_string()));
        }
        self.fields.insert(field.name(), Arc::new(field));
        Ok(self)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up `key` and check that it holds a `V`.
    pub(crate) fn lookup<V: 'static>(&self, key: &str) -> Result<Arc<dyn ErasedField<S>>, FieldError> {
        let field = self
            .fields
            .get(key)
            .ok_or_else(|| FieldError::Unknown(key.to_string()))?;
        let (type_id, expected) = field.value_type();
        if type_id != TypeId::of::<V>() {
            return Err(FieldError::TypeMismatch {
                field: key.to_string(),
                expected,
                requested: type_name::<V>(),
            });
        }
        Ok(Arc::clone(field))
    }

    pub(crate) fn read<V: 'static>(&self, key: &str, state: &S) -> Result<V, FieldError> {
        let field = self.lookup::<V>(key)?;
        field
            .read(state)
            .downcast::<V>()
            .map(|value| *value)
            .map_err(|_| FieldError::TypeMismatch {
                field: key.to_string(),
                expected: field.value_type().1,
                requested: type_name::<V>(),
            })
    }
}

impl<S: 'static> Default for FieldTable<S> {
    fn default() -> Self {
        Self::new()
    }
}
