//! Per-symbol curve bindings
//!
//! The animator maps `(placement, input)` pairs to one curve per value
//! component. It is owned by the symbol that holds the placements, so a
//! child instance looks its curves up through its parent's symbol.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::curve::{Curve, Keyframe};
use crate::types::{ChildId, InputId};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BindingKey {
    child: ChildId,
    input: InputId,
}

/// Serialized form of one binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveBinding {
    pub child: ChildId,
    pub input: InputId,
    pub curves: Vec<Curve>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CurveBinding>", into = "Vec<CurveBinding>")]
pub struct Animator {
    bindings: IndexMap<BindingKey, Vec<Curve>>,
}

impl From<Vec<CurveBinding>> for Animator {
    fn from(bindings: Vec<CurveBinding>) -> Self {
        Self {
            bindings: bindings
                .into_iter()
                .map(|b| {
                    (
                        BindingKey {
                            child: b.child,
                            input: b.input,
                        },
                        b.curves,
                    )
                })
                .collect(),
        }
    }
}

impl From<Animator> for Vec<CurveBinding> {
    fn from(animator: Animator) -> Self {
        animator
            .bindings
            .into_iter()
            .map(|(key, curves)| CurveBinding {
                child: key.child,
                input: key.input,
                curves,
            })
            .collect()
    }
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(child: ChildId, input: &str) -> BindingKey {
        BindingKey {
            child,
            input: input.to_string(),
        }
    }

    /// True iff at least one curve is bound to the pair
    pub fn is_animated(&self, child: ChildId, input: &str) -> bool {
        self.bindings
            .get(&Self::key(child, input))
            .is_some_and(|curves| !curves.is_empty())
    }

    /// Bound curves, one per value component
    pub fn curves_for_input(&self, child: ChildId, input: &str) -> Option<&[Curve]> {
        self.bindings
            .get(&Self::key(child, input))
            .map(Vec::as_slice)
    }

    /// Bind curves to an input, replacing any existing binding
    pub fn bind(&mut self, child: ChildId, input: &str, curves: Vec<Curve>) {
        self.bindings.insert(Self::key(child, input), curves);
    }

    pub fn unbind(&mut self, child: ChildId, input: &str) -> Option<Vec<Curve>> {
        self.bindings.shift_remove(&Self::key(child, input))
    }

    /// Drop every binding of a removed placement
    pub fn remove_child(&mut self, child: ChildId) {
        self.bindings.retain(|key, _| key.child != child);
    }

    /// Add a key to one component curve, binding `component_count` empty
    /// curves first if the input was not animated.
    pub fn add_keyframe(
        &mut self,
        child: ChildId,
        input: &str,
        component_count: usize,
        component: usize,
        key: Keyframe,
    ) {
        let curves = self
            .bindings
            .entry(Self::key(child, input))
            .or_default();
        let needed = component_count.max(component + 1);
        if curves.len() < needed {
            curves.resize_with(needed, Curve::new);
        }
        curves[component].add_key(key);
    }

    /// Remove the key at `time` from one component curve.
    ///
    /// The binding is dropped once every component curve is empty.
    pub fn remove_keyframe(
        &mut self,
        child: ChildId,
        input: &str,
        component: usize,
        time: f64,
    ) -> Option<Keyframe> {
        let key = Self::key(child, input);
        let curves = self.bindings.get_mut(&key)?;
        let removed = curves.get_mut(component)?.remove_key_at(time)?;
        if curves.iter().all(Curve::is_empty) {
            self.bindings.shift_remove(&key);
        }
        Some(removed)
    }

    /// Animated value of an input at `time`.
    ///
    /// Each component samples its own curve; a component whose curve has no
    /// usable neighbours takes the matching component of `fallback`.
    pub fn evaluate(&self, child: ChildId, input: &str, time: f64, fallback: &Value) -> Value {
        let Some(curves) = self.curves_for_input(child, input) else {
            return fallback.clone();
        };
        let base = fallback.components();
        if base.is_empty() {
            return fallback.clone();
        }

        let components: Vec<f64> = base
            .iter()
            .enumerate()
            .map(|(i, default)| {
                curves
                    .get(i)
                    .and_then(|curve| curve.sample_bound(time))
                    .unwrap_or(*default)
            })
            .collect();
        Value::from_components(fallback.value_type(), &components)
    }

    /// Number of bound inputs
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
