//! Typed slot payloads

use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::types::ValueType;

/// A value cached in a slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Float(f32),
    Int(i64),
    Bool(bool),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Matrix(Mat4),
    Text(String),
    List(Vec<Value>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Float(0.0)
    }
}

impl Value {
    /// The well-defined fallback for a slot whose dependencies are missing
    pub fn default_for(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Any | ValueType::Float => Value::Float(0.0),
            ValueType::Int => Value::Int(0),
            ValueType::Bool => Value::Bool(false),
            ValueType::Vec2 => Value::Vec2(Vec2::ZERO),
            ValueType::Vec3 => Value::Vec3(Vec3::ZERO),
            ValueType::Vec4 => Value::Vec4(Vec4::ZERO),
            ValueType::Matrix => Value::Matrix(Mat4::IDENTITY),
            ValueType::Text => Value::Text(String::new()),
            ValueType::List => Value::List(Vec::new()),
        }
    }

    /// The type tag of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Float(_) => ValueType::Float,
            Value::Int(_) => ValueType::Int,
            Value::Bool(_) => ValueType::Bool,
            Value::Vec2(_) => ValueType::Vec2,
            Value::Vec3(_) => ValueType::Vec3,
            Value::Vec4(_) => ValueType::Vec4,
            Value::Matrix(_) => ValueType::Matrix,
            Value::Text(_) => ValueType::Text,
            Value::List(_) => ValueType::List,
        }
    }

    /// Convert along the closed conversion table of [`ValueType::is_compatible_with`].
    ///
    /// Returns `None` when no conversion exists.
    pub fn convert_to(&self, target: ValueType) -> Option<Value> {
        if target == ValueType::Any || self.value_type() == target {
            return Some(self.clone());
        }

        let converted = match (self, target) {
            (Value::Int(i), ValueType::Float) => Value::Float(*i as f32),
            (Value::Bool(b), ValueType::Float) => Value::Float(if *b { 1.0 } else { 0.0 }),
            (Value::Bool(b), ValueType::Int) => Value::Int(i64::from(*b)),
            (Value::Float(f), ValueType::Vec2) => Value::Vec2(Vec2::splat(*f)),
            (Value::Float(f), ValueType::Vec3) => Value::Vec3(Vec3::splat(*f)),
            (Value::Float(f), ValueType::Vec4) => Value::Vec4(Vec4::splat(*f)),
            (other, ValueType::List) => Value::List(vec![other.clone()]),
            _ => return None,
        };
        Some(converted)
    }

    /// Float view of scalar values
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f32),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            Value::Vec2(v) => Some(*v),
            Value::Float(f) => Some(Vec2::splat(*f)),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Value::Vec3(v) => Some(*v),
            Value::Float(f) => Some(Vec3::splat(*f)),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<Mat4> {
        match self {
            Value::Matrix(m) => Some(*m),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Split a scalar or vector into its float components.
    ///
    /// Non-numeric values have no components.
    pub fn components(&self) -> Vec<f64> {
        match self {
            Value::Float(f) => vec![f64::from(*f)],
            Value::Int(i) => vec![*i as f64],
            Value::Bool(b) => vec![if *b { 1.0 } else { 0.0 }],
            Value::Vec2(v) => v.to_array().iter().map(|c| f64::from(*c)).collect(),
            Value::Vec3(v) => v.to_array().iter().map(|c| f64::from(*c)).collect(),
            Value::Vec4(v) => v.to_array().iter().map(|c| f64::from(*c)).collect(),
            _ => Vec::new(),
        }
    }

    /// Rebuild a value of `value_type` from float components.
    ///
    /// Missing components read as zero.
    pub fn from_components(value_type: ValueType, components: &[f64]) -> Value {
        let c = |i: usize| components.get(i).copied().unwrap_or(0.0) as f32;
        match value_type {
            ValueType::Float | ValueType::Any => Value::Float(c(0)),
            ValueType::Int => Value::Int(components.first().copied().unwrap_or(0.0).round() as i64),
            ValueType::Bool => Value::Bool(c(0) >= 0.5),
            ValueType::Vec2 => Value::Vec2(Vec2::new(c(0), c(1))),
            ValueType::Vec3 => Value::Vec3(Vec3::new(c(0), c(1), c(2))),
            ValueType::Vec4 => Value::Vec4(Vec4::new(c(0), c(1), c(2), c(3))),
            other => Value::default_for(other),
        }
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Vec2> for Value {
    fn from(value: Vec2) -> Self {
        Value::Vec2(value)
    }
}

impl From<Vec3> for Value {
    fn from(value: Vec3) -> Self {
        Value::Vec3(value)
    }
}

impl From<Mat4> for Value {
    fn from(value: Mat4) -> Self {
        Value::Matrix(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}
