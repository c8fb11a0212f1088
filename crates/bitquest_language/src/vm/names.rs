//! The name table.

use std::collections::BTreeMap;

use bitquest_foundation::{Error, Result, Value};

use super::host::Builtins;

/// Identifier bindings for one run.
///
/// Locals are created by stores and always shadow a builtin of the same
/// name. Builtins are never copied into the table; a load that misses the
/// locals asks the enabled [`Builtins`] set.
#[derive(Clone, Debug, Default)]
pub struct NameTable {
    locals: BTreeMap<String, Value>,
    builtins: Builtins,
}

impl NameTable {
    /// Creates a table with no locals over the given builtins.
    #[must_use]
    pub fn new(builtins: Builtins) -> Self {
        Self {
            locals: BTreeMap::new(),
            builtins,
        }
    }

    /// Resolves a name: locals first, then builtins.
    ///
    /// # Errors
    /// Returns `NameError` if the name is bound in neither.
    pub fn load(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.locals.get(name) {
            return Ok(value.clone());
        }
        self.builtins
            .lookup(name)
            .map(Value::Builtin)
            .ok_or_else(|| Error::name_error(name))
    }

    /// Binds `name` in the local table, creating or overwriting it.
    pub fn store(&mut self, name: &str, value: Value) {
        match self.locals.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.locals.insert(name.to_string(), value);
            }
        }
    }

    /// Returns a local binding.
    #[must_use]
    pub fn local(&self, name: &str) -> Option<&Value> {
        self.locals.get(name)
    }

    /// Iterates over local bindings in name order.
    pub fn locals(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.locals.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of local bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locals.len()
    }

    /// Returns true if there are no local bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }
}
