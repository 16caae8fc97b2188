//! The flat fieldbus variable space.
//!
//! A mapping from hierarchical path (string) to typed cell, shared between
//! the PLC core and the supervisor. The address space is fixed: every path is
//! declared up front, and writes are type-checked against the declared cell.
//! Writes are atomic per cell; no cross-cell atomicity is offered — the
//! handshake protocol is designed so no invariant spans two cells.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CellError;

/// A single typed fieldbus value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    Str(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::Str(_) => "string",
        }
    }
}

type Subscriber = Box<dyn Fn(&str, &Value) + Send>;

/// The variable space. One instance per cell process.
#[derive(Default)]
pub struct VarSpace {
    cells: BTreeMap<String, Value>,
    subscribers: Vec<(String, Subscriber)>,
}

impl VarSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a path with its initial value. Used while seeding the address
    /// space; overwrites silently, no notification.
    pub fn declare(&mut self, path: &str, initial: Value) {
        self.cells.insert(path.to_string(), initial);
    }

    pub fn read(&self, path: &str) -> Result<&Value, CellError> {
        self.cells
            .get(path)
            .ok_or_else(|| CellError::UnknownPath(path.to_string()))
    }

    /// Write a value. The cell must exist and hold the same type. Returns
    /// whether the stored value changed; subscribers are notified only on
    /// change, so listeners see diffs.
    pub fn write(&mut self, path: &str, value: Value) -> Result<bool, CellError> {
        let cell = self
            .cells
            .get_mut(path)
            .ok_or_else(|| CellError::UnknownPath(path.to_string()))?;
        if std::mem::discriminant(cell) != std::mem::discriminant(&value) {
            return Err(CellError::TypeMismatch {
                path: path.to_string(),
                expected: cell.type_name(),
                got: value.type_name(),
            });
        }
        if *cell == value {
            return Ok(false);
        }
        *cell = value.clone();
        for (prefix, callback) in &self.subscribers {
            if path.starts_with(prefix.as_str()) {
                callback(path, &value);
            }
        }
        Ok(true)
    }

    /// Register a change listener for all paths under `prefix`.
    pub fn subscribe(&mut self, prefix: &str, callback: impl Fn(&str, &Value) + Send + 'static) {
        self.subscribers.push((prefix.to_string(), Box::new(callback)));
    }

    pub fn list_paths(&self, prefix: &str) -> Vec<String> {
        self.cells
            .keys()
            .filter(|p| p.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Clone of the whole address space, for inspection endpoints.
    pub fn dump(&self) -> BTreeMap<String, Value> {
        self.cells.clone()
    }

    // ── Typed accessors ──

    pub fn read_bool(&self, path: &str) -> Result<bool, CellError> {
        match self.read(path)? {
            Value::Bool(b) => Ok(*b),
            other => Err(type_error(path, "bool", other)),
        }
    }

    pub fn read_i16(&self, path: &str) -> Result<i16, CellError> {
        match self.read(path)? {
            Value::I16(v) => Ok(*v),
            other => Err(type_error(path, "i16", other)),
        }
    }

    pub fn read_i32(&self, path: &str) -> Result<i32, CellError> {
        match self.read(path)? {
            Value::I32(v) => Ok(*v),
            other => Err(type_error(path, "i32", other)),
        }
    }

    pub fn read_i64(&self, path: &str) -> Result<i64, CellError> {
        match self.read(path)? {
            Value::I64(v) => Ok(*v),
            other => Err(type_error(path, "i64", other)),
        }
    }

    pub fn read_str(&self, path: &str) -> Result<&str, CellError> {
        match self.read(path)? {
            Value::Str(s) => Ok(s),
            other => Err(type_error(path, "string", other)),
        }
    }

    pub fn write_bool(&mut self, path: &str, v: bool) -> Result<bool, CellError> {
        self.write(path, Value::Bool(v))
    }

    pub fn write_i16(&mut self, path: &str, v: i16) -> Result<bool, CellError> {
        self.write(path, Value::I16(v))
    }

    pub fn write_i32(&mut self, path: &str, v: i32) -> Result<bool, CellError> {
        self.write(path, Value::I32(v))
    }

    pub fn write_i64(&mut self, path: &str, v: i64) -> Result<bool, CellError> {
        self.write(path, Value::I64(v))
    }

    pub fn write_str(&mut self, path: &str, v: &str) -> Result<bool, CellError> {
        if let Ok(Value::Str(current)) = self.read(path) {
            if current == v {
                return Ok(false);
            }
        }
        self.write(path, Value::Str(v.to_string()))
    }
}

fn type_error(path: &str, expected: &'static str, got: &Value) -> CellError {
    CellError::TypeMismatch {
        path: path.to_string(),
        expected,
        got: got.type_name(),
    }
}

impl std::fmt::Debug for VarSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VarSpace")
            .field("cells", &self.cells.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn write_requires_declared_path_and_matching_type() {
        let mut vars = VarSpace::new();
        vars.declare("A/x", Value::I64(0));

        assert!(matches!(
            vars.write("A/y", Value::I64(1)),
            Err(CellError::UnknownPath(_))
        ));
        assert!(matches!(
            vars.write("A/x", Value::Bool(true)),
            Err(CellError::TypeMismatch { .. })
        ));
        assert!(vars.write("A/x", Value::I64(5)).unwrap());
        assert_eq!(vars.read_i64("A/x").unwrap(), 5);
    }

    #[test]
    fn subscribers_fire_on_change_only() {
        let mut vars = VarSpace::new();
        vars.declare("PlcToEco/a", Value::I32(0));
        vars.declare("EcoToPlc/b", Value::I32(0));

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        vars.subscribe("PlcToEco/", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        vars.write("PlcToEco/a", Value::I32(1)).unwrap();
        vars.write("PlcToEco/a", Value::I32(1)).unwrap(); // no change
        vars.write("EcoToPlc/b", Value::I32(9)).unwrap(); // outside prefix
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn list_paths_filters_by_prefix() {
        let mut vars = VarSpace::new();
        vars.declare("EcoToPlc/x", Value::Bool(false));
        vars.declare("PlcToEco/y", Value::Bool(false));
        vars.declare("PlcToEco/z", Value::Bool(false));
        assert_eq!(vars.list_paths("PlcToEco/").len(), 2);
        assert_eq!(vars.list_paths("").len(), 3);
    }
}
