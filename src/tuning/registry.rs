use std::fmt;

use crate::error::TuneableError;

/// Callback invoked with the host context and the new value after a user change.
pub type OnChange<S, T> = Box<dyn Fn(&mut S, T)>;

/// Current value of a tuneable, tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TuneableValue {
    Bool(bool),
    Float(f64),
    Int(i64),
}

impl TuneableValue {
    fn kind(&self) -> &'static str {
        match self {
            TuneableValue::Bool(_) => "bool",
            TuneableValue::Float(_) => "float",
            TuneableValue::Int(_) => "int",
        }
    }
}

impl fmt::Display for TuneableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuneableValue::Bool(b) => write!(f, "{b}"),
            TuneableValue::Float(v) => write!(f, "{v:.2}"),
            TuneableValue::Int(i) => write!(f, "{i}"),
        }
    }
}

enum Binding<S> {
    Bool {
        value: bool,
        on_change: OnChange<S, bool>,
    },
    Float {
        value: f64,
        min: f64,
        max: f64,
        on_change: OnChange<S, f64>,
    },
    Int {
        value: i64,
        min: i64,
        max: i64,
        on_change: OnChange<S, i64>,
    },
}

/// One user-adjustable parameter as shown by the host UI.
pub struct Tuneable<S> {
    pub name: String,
    pub description: String,
    binding: Binding<S>,
}

impl<S> Tuneable<S> {
    pub fn value(&self) -> TuneableValue {
        match &self.binding {
            Binding::Bool { value, .. } => TuneableValue::Bool(*value),
            Binding::Float { value, .. } => TuneableValue::Float(*value),
            Binding::Int { value, .. } => TuneableValue::Int(*value),
        }
    }

    /// Numeric bounds as `(min, max)`; `None` for booleans.
    pub fn bounds(&self) -> Option<(TuneableValue, TuneableValue)> {
        match &self.binding {
            Binding::Bool { .. } => None,
            Binding::Float { min, max, .. } => {
                Some((TuneableValue::Float(*min), TuneableValue::Float(*max)))
            }
            Binding::Int { min, max, .. } => Some((TuneableValue::Int(*min), TuneableValue::Int(*max))),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Registry of tuneables for a host context `S`.
///
/// Values are clamped to their bounds. The callback runs only when the
/// stored value actually changes.
pub struct Tuneables<S> {
    entries: Vec<Tuneable<S>>,
}

impl<S> Default for Tuneables<S> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<S> Tuneables<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_bool(
        &mut self,
        value: bool,
        name: &str,
        description: &str,
        on_change: impl Fn(&mut S, bool) + 'static,
    ) -> usize {
        self.push(name, description, Binding::Bool {
            value,
            on_change: Box::new(on_change),
        })
    }

    pub fn register_float(
        &mut self,
        value: f64,
        min: f64,
        max: f64,
        name: &str,
        description: &str,
        on_change: impl Fn(&mut S, f64) + 'static,
    ) -> usize {
        self.push(name, description, Binding::Float {
            value: value.clamp(min, max),
            min,
            max,
            on_change: Box::new(on_change),
        })
    }

    pub fn register_int(
        &mut self,
        value: i64,
        min: i64,
        max: i64,
        name: &str,
        description: &str,
        on_change: impl Fn(&mut S, i64) + 'static,
    ) -> usize {
        self.push(name, description, Binding::Int {
            value: value.clamp(min, max),
            min,
            max,
            on_change: Box::new(on_change),
        })
    }

    fn push(&mut self, name: &str, description: &str, binding: Binding<S>) -> usize {
        self.entries.push(Tuneable {
            name: name.to_string(),
            description: description.to_string(),
            binding,
        });
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tuneable<S>> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tuneable<S>> {
        self.entries.iter()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|t| t.name == name)
    }

    /// Store a new value and notify the host. Returns the value actually stored.
    pub fn set(&mut self, index: usize, new_val: TuneableValue, host: &mut S) -> Result<TuneableValue, TuneableError> {
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(TuneableError::UnknownIndex(index))?;

        let stored = match (&mut entry.binding, new_val) {
            (Binding::Bool { value, on_change }, TuneableValue::Bool(v)) => {
                if *value != v {
                    *value = v;
                    on_change(host, v);
                }
                TuneableValue::Bool(*value)
            }
            (Binding::Float { value, min, max, on_change }, TuneableValue::Float(v)) => {
                let v = v.clamp(*min, *max);
                if *value != v {
                    *value = v;
                    on_change(host, v);
                }
                TuneableValue::Float(*value)
            }
            (Binding::Int { value, min, max, on_change }, TuneableValue::Int(v)) => {
                let v = v.clamp(*min, *max);
                if *value != v {
                    *value = v;
                    on_change(host, v);
                }
                TuneableValue::Int(*value)
            }
            (binding, other) => {
                let expected = match binding {
                    Binding::Bool { .. } => "bool",
                    Binding::Float { .. } => "float",
                    Binding::Int { .. } => "int",
                };
                return Err(TuneableError::KindMismatch {
                    name: entry.name.clone(),
                    expected,
                    actual: other.kind(),
                });
            }
        };

        log::info!("{} = {}", entry.name, stored);
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Host {
        flag_calls: Vec<bool>,
        level: f64,
        count: i64,
    }

    fn registry() -> Tuneables<Host> {
        let mut t = Tuneables::new();
        t.register_bool(false, "Flag", "a flag", |h: &mut Host, v| h.flag_calls.push(v));
        t.register_float(5.0, 1.0, 25.0, "Level", "a level", |h: &mut Host, v| h.level = v);
        t.register_int(100, 1, 3000, "Count", "a count", |h: &mut Host, v| h.count = v);
        t
    }

    #[test]
    fn callback_runs_on_change_only() {
        let mut t = registry();
        let mut host = Host::default();

        t.set(0, TuneableValue::Bool(false), &mut host).unwrap();
        assert!(host.flag_calls.is_empty());

        t.set(0, TuneableValue::Bool(true), &mut host).unwrap();
        assert_eq!(host.flag_calls, vec![true]);
        assert_eq!(t.get(0).unwrap().value(), TuneableValue::Bool(true));
    }

    #[test]
    fn numeric_values_are_clamped() {
        let mut t = registry();
        let mut host = Host::default();

        let stored = t.set(1, TuneableValue::Float(40.0), &mut host).unwrap();
        assert_eq!(stored, TuneableValue::Float(25.0));
        assert_eq!(host.level, 25.0);

        let stored = t.set(2, TuneableValue::Int(0), &mut host).unwrap();
        assert_eq!(stored, TuneableValue::Int(1));
        assert_eq!(host.count, 1);
    }

    #[test]
    fn kind_mismatch_and_unknown_index() {
        let mut t = registry();
        let mut host = Host::default();

        assert!(matches!(
            t.set(1, TuneableValue::Bool(true), &mut host),
            Err(TuneableError::KindMismatch { expected: "float", actual: "bool", .. })
        ));
        assert_eq!(
            t.set(9, TuneableValue::Int(1), &mut host),
            Err(TuneableError::UnknownIndex(9))
        );
    }

    #[test]
    fn lookup_by_name_and_bounds() {
        let t = registry();
        assert_eq!(t.len(), 3);
        assert_eq!(t.position("Count"), Some(2));
        assert_eq!(
            t.get(2).unwrap().bounds(),
            Some((TuneableValue::Int(1), TuneableValue::Int(3000)))
        );
        assert!(t.get(0).unwrap().bounds().is_none());
    }
}
