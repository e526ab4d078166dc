//! The stored shape of a state: plain JSON leaves, containers, and smart
//! values that resolve to a current value when read.

use crate::computed::ComputedValue;
use crate::path::{Path, Seg};
use crate::persisted::PersistedValue;
use crate::smart::SmartValue;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// One slot of a state tree.
///
/// Objects and arrays are kept as nodes so smart values can live anywhere
/// inside them. `From<Value>` builds containers recursively.
#[derive(Debug, Clone)]
pub enum StateNode {
    /// A primitive (null, boolean, number, string).
    Value(Value),
    Object(IndexMap<String, StateNode>),
    Array(Vec<StateNode>),
    Computed(ComputedValue),
    Persisted(PersistedValue),
}

impl StateNode {
    pub fn object<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, StateNode)>,
        K: Into<String>,
    {
        StateNode::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator<Item = StateNode>,
    {
        StateNode::Array(items.into_iter().collect())
    }

    pub fn is_container(&self) -> bool {
        matches!(self, StateNode::Object(_) | StateNode::Array(_))
    }

    pub fn is_smart(&self) -> bool {
        matches!(self, StateNode::Computed(_) | StateNode::Persisted(_))
    }

    /// Plain JSON with every smart value resolved to its current value.
    pub fn to_value(&self) -> Value {
        match self {
            StateNode::Value(value) => value.clone(),
            StateNode::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect::<Map<String, Value>>(),
            ),
            StateNode::Array(items) => Value::Array(items.iter().map(StateNode::to_value).collect()),
            StateNode::Computed(value) => value.get(),
            StateNode::Persisted(value) => value.get(),
        }
    }

    /// Rebuild any `Value` variant holding an object or array as nodes.
    pub(crate) fn normalized(self) -> Self {
        match self {
            StateNode::Value(value @ (Value::Object(_) | Value::Array(_))) => StateNode::from(value),
            StateNode::Object(entries) => StateNode::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.normalized()))
                    .collect(),
            ),
            StateNode::Array(items) => {
                StateNode::Array(items.into_iter().map(StateNode::normalized).collect())
            }
            other => other,
        }
    }

    fn child(&self, seg: &Seg) -> Option<&StateNode> {
        match self {
            StateNode::Object(entries) => entries.get(key_of(seg).as_str()),
            StateNode::Array(items) => items.get(seg.as_position()?),
            _ => None,
        }
    }

    fn child_mut(&mut self, seg: &Seg) -> Option<&mut StateNode> {
        match self {
            StateNode::Object(entries) => entries.get_mut(key_of(seg).as_str()),
            StateNode::Array(items) => items.get_mut(seg.as_position()?),
            _ => None,
        }
    }

    /// The node stored at `segs`. Does not descend into smart values.
    pub(crate) fn get(&self, segs: &[Seg]) -> Option<&StateNode> {
        segs.iter().try_fold(self, |node, seg| node.child(seg))
    }

    pub(crate) fn get_mut(&mut self, segs: &[Seg]) -> Option<&mut StateNode> {
        segs.iter().try_fold(self, |node, seg| node.child_mut(seg))
    }

    /// The unwrapped value at `segs`, looking inside smart values' current
    /// values when the path continues past them.
    pub(crate) fn read(&self, segs: &[Seg]) -> Option<Value> {
        let Some((first, rest)) = segs.split_first() else {
            return Some(self.to_value());
        };
        match self {
            StateNode::Object(_) | StateNode::Array(_) => self.child(first)?.read(rest),
            StateNode::Computed(_) | StateNode::Persisted(_) => read_value(&self.to_value(), segs),
            StateNode::Value(_) => None,
        }
    }

    /// The first smart value met while walking `segs`, with the number of
    /// segments consumed to reach it.
    pub(crate) fn smart_on_path(&self, segs: &[Seg]) -> Option<(usize, SmartValue)> {
        let mut node = self;
        for (i, seg) in segs.iter().enumerate() {
            node = node.child(seg)?;
            if let Some(smart) = node.as_smart() {
                return Some((i + 1, smart));
            }
        }
        None
    }

    /// Store `node` at `segs`, returning whatever it replaced. Arrays grow
    /// with nulls when written past their end, by at most
    /// [`MAX_ARRAY_GAP`] slots.
    pub(crate) fn insert(&mut self, segs: &[Seg], node: StateNode) -> Result<Option<StateNode>, String> {
        let (last, parents) = segs.split_last().ok_or("empty path")?;
        let parent = self
            .get_mut(parents)
            .ok_or_else(|| "parent does not exist".to_string())?;
        match parent {
            StateNode::Object(entries) => Ok(entries.insert(key_of(last), node)),
            StateNode::Array(items) => {
                let pos = last
                    .as_position()
                    .ok_or_else(|| format!("`{}` is not an array position", key_of(last)))?;
                if pos < items.len() {
                    Ok(Some(std::mem::replace(&mut items[pos], node)))
                } else {
                    check_gap(items.len(), pos)?;
                    items.resize_with(pos, || StateNode::Value(Value::Null));
                    items.push(node);
                    Ok(None)
                }
            }
            _ => Err("parent is not an object or array".to_string()),
        }
    }

    fn as_smart(&self) -> Option<SmartValue> {
        match self {
            StateNode::Computed(value) => Some(SmartValue::Computed(value.clone())),
            StateNode::Persisted(value) => Some(SmartValue::Persisted(value.clone())),
            _ => None,
        }
    }

    /// Every smart value in this subtree, with its path relative to it.
    pub(crate) fn smart_values(&self) -> Vec<(Path, SmartValue)> {
        let mut found = Vec::new();
        self.collect_smart(&Path::new(), &mut found);
        found
    }

    fn collect_smart(&self, at: &Path, found: &mut Vec<(Path, SmartValue)>) {
        match self {
            StateNode::Object(entries) => {
                for (key, child) in entries {
                    child.collect_smart(&at.clone().key(key.as_str()), found);
                }
            }
            StateNode::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    child.collect_smart(&at.clone().index(i), found);
                }
            }
            other => {
                if let Some(smart) = other.as_smart() {
                    found.push((at.clone(), smart));
                }
            }
        }
    }
}

/// Most null slots a single write past the end of an array may add.
pub(crate) const MAX_ARRAY_GAP: usize = 1024;

fn check_gap(len: usize, pos: usize) -> Result<(), String> {
    if pos - len > MAX_ARRAY_GAP {
        return Err(format!(
            "index {pos} is more than {MAX_ARRAY_GAP} past the end of an array of length {len}"
        ));
    }
    Ok(())
}

fn key_of(seg: &Seg) -> String {
    match seg {
        Seg::Key(key) => key.clone(),
        Seg::Index(i) => i.to_string(),
    }
}

fn read_value(value: &Value, segs: &[Seg]) -> Option<Value> {
    segs.iter()
        .try_fold(value, |value, seg| match value {
            Value::Object(map) => map.get(key_of(seg).as_str()),
            Value::Array(items) => items.get(seg.as_position()?),
            _ => None,
        })
        .cloned()
}

/// Write `value` at `segs` inside a plain JSON tree.
pub(crate) fn write_value(target: &mut Value, segs: &[Seg], value: Value) -> Result<(), String> {
    let Some((last, parents)) = segs.split_last() else {
        *target = value;
        return Ok(());
    };
    let mut cursor = target;
    for seg in parents {
        let next = match cursor {
            Value::Object(map) => map.get_mut(key_of(seg).as_str()),
            Value::Array(items) => seg.as_position().and_then(|pos| items.get_mut(pos)),
            _ => None,
        };
        cursor = next.ok_or_else(|| "parent does not exist".to_string())?;
    }
    match cursor {
        Value::Object(map) => {
            map.insert(key_of(last), value);
            Ok(())
        }
        Value::Array(items) => {
            let pos = last
                .as_position()
                .ok_or_else(|| format!("`{}` is not an array position", key_of(last)))?;
            if pos < items.len() {
                items[pos] = value;
            } else {
                check_gap(items.len(), pos)?;
                items.resize(pos, Value::Null);
                items.push(value);
            }
            Ok(())
        }
        _ => Err("parent is not an object or array".to_string()),
    }
}

impl From<Value> for StateNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                StateNode::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            Value::Array(items) => StateNode::Array(items.into_iter().map(Into::into).collect()),
            primitive => StateNode::Value(primitive),
        }
    }
}

impl From<ComputedValue> for StateNode {
    fn from(value: ComputedValue) -> Self {
        StateNode::Computed(value)
    }
}

impl From<PersistedValue> for StateNode {
    fn from(value: PersistedValue) -> Self {
        StateNode::Persisted(value)
    }
}

impl From<bool> for StateNode {
    fn from(value: bool) -> Self {
        StateNode::Value(Value::Bool(value))
    }
}

impl From<i64> for StateNode {
    fn from(value: i64) -> Self {
        StateNode::Value(Value::from(value))
    }
}

impl From<f64> for StateNode {
    fn from(value: f64) -> Self {
        StateNode::Value(Value::from(value))
    }
}

impl From<&str> for StateNode {
    fn from(value: &str) -> Self {
        StateNode::Value(Value::from(value))
    }
}

impl From<String> for StateNode {
    fn from(value: String) -> Self {
        StateNode::Value(Value::String(value))
    }
}
