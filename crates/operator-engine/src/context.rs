//! Evaluation context threaded through every pull
//!
//! The context is owned by the pull call stack. A node that wants to change
//! what its subgraph sees (time, camera, resolution, named variables) opens
//! a [`ContextScope`], mutates through it, pulls, and lets the scope drop.
//! Dropping restores every field the scope could have touched, which covers
//! `?` returns, early `return`s and unwinding alike.
//!
//! # Example
//!
//! ```ignore
//! let mut scope = ctx.scoped();
//! scope.requested_resolution /= 3;
//! scope.set_float_variable("k", 5.0);
//! let value = inputs.pull("command", &mut scope)?;
//! // scope dropped here: resolution and "k" are back to their old values
//! ```

use std::any::Any;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use glam::{Mat4, UVec2};
use indexmap::IndexMap;

/// Typed map of object-valued named variables
///
/// Values are reference counted so snapshots and overrides share them
/// instead of cloning payloads.
#[derive(Clone, Default)]
pub struct ObjectVariables {
    inner: IndexMap<String, Rc<dyn Any>>,
}

impl ObjectVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed read. `None` if absent or of a different type.
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.inner.get(key).and_then(|v| v.downcast_ref())
    }

    /// Untyped shared handle
    pub fn get_rc(&self, key: &str) -> Option<Rc<dyn Any>> {
        self.inner.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn insert(&mut self, key: String, value: Rc<dyn Any>) -> Option<Rc<dyn Any>> {
        self.inner.insert(key, value)
    }
}

impl fmt::Debug for ObjectVariables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.inner.keys()).finish()
    }
}

/// Ambient state of one pull evaluation
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    /// Global playback time in seconds
    pub time: f64,
    /// Time as seen by the current subgraph (differs under remapping)
    pub local_time: f64,
    pub camera_to_clip: Mat4,
    pub world_to_camera: Mat4,
    pub object_to_world: Mat4,
    pub requested_resolution: UVec2,
    float_variables: IndexMap<String, f32>,
    object_variables: ObjectVariables,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self {
            time: 0.0,
            local_time: 0.0,
            camera_to_clip: Mat4::IDENTITY,
            world_to_camera: Mat4::IDENTITY,
            object_to_world: Mat4::IDENTITY,
            requested_resolution: UVec2::new(1920, 1080),
            float_variables: IndexMap::new(),
            object_variables: ObjectVariables::new(),
        }
    }
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root context for a frame at `time`
    pub fn at_time(time: f64) -> Self {
        Self {
            time,
            local_time: time,
            ..Self::default()
        }
    }

    pub fn with_resolution(mut self, resolution: UVec2) -> Self {
        self.requested_resolution = resolution;
        self
    }

    /// Open a restoring scope over this context
    pub fn scoped(&mut self) -> ContextScope<'_> {
        ContextScope::new(self)
    }

    pub fn float_variable(&self, key: &str) -> Option<f32> {
        self.float_variables.get(key).copied()
    }

    pub fn object_variables(&self) -> &ObjectVariables {
        &self.object_variables
    }

    pub fn object_variable<T: 'static>(&self, key: &str) -> Option<&T> {
        self.object_variables.get(key)
    }

    /// Set a float variable without restoration.
    ///
    /// Meant for root contexts built by the host. Nodes go through a
    /// [`ContextScope`].
    pub fn set_float_variable(&mut self, key: impl Into<String>, value: f32) {
        self.float_variables.insert(key.into(), value);
    }

    /// Set an object variable without restoration
    pub fn set_object_variable<T: 'static>(&mut self, key: impl Into<String>, value: T) {
        self.object_variables.insert(key.into(), Rc::new(value));
    }

    /// Keys of the float variables currently in scope, in insertion order
    pub fn float_variable_keys(&self) -> Vec<String> {
        self.float_variables.keys().cloned().collect()
    }

    pub fn object_variable_keys(&self) -> Vec<String> {
        self.object_variables.keys().map(str::to_string).collect()
    }

    /// All named-variable keys currently in scope
    pub fn variable_keys(&self) -> Vec<String> {
        let mut keys = self.float_variable_keys();
        for key in self.object_variables.keys() {
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
        keys
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldSnapshot {
    time: f64,
    local_time: f64,
    camera_to_clip: Mat4,
    world_to_camera: Mat4,
    object_to_world: Mat4,
    requested_resolution: UVec2,
}

impl FieldSnapshot {
    fn take(ctx: &EvaluationContext) -> Self {
        Self {
            time: ctx.time,
            local_time: ctx.local_time,
            camera_to_clip: ctx.camera_to_clip,
            world_to_camera: ctx.world_to_camera,
            object_to_world: ctx.object_to_world,
            requested_resolution: ctx.requested_resolution,
        }
    }

    fn restore(self, ctx: &mut EvaluationContext) {
        ctx.time = self.time;
        ctx.local_time = self.local_time;
        ctx.camera_to_clip = self.camera_to_clip;
        ctx.world_to_camera = self.world_to_camera;
        ctx.object_to_world = self.object_to_world;
        ctx.requested_resolution = self.requested_resolution;
    }
}

/// Journal entry: the key and, if it existed, its map position and value
enum VariableOverride {
    Float(String, Option<(usize, f32)>),
    Object(String, Option<(usize, Rc<dyn Any>)>),
}

fn overwrite<V>(map: &mut IndexMap<String, V>, key: String, value: V) -> Option<(usize, V)> {
    match map.insert_full(key, value) {
        (index, Some(previous)) => Some((index, previous)),
        (_, None) => None,
    }
}

fn hide<V>(map: &mut IndexMap<String, V>, key: &str) -> Option<(usize, V)> {
    map.shift_remove_full(key)
        .map(|(index, _, previous)| (index, previous))
}

/// Undo one journal entry, putting a removed key back where it was
fn restore<V>(map: &mut IndexMap<String, V>, key: String, previous: Option<(usize, V)>) {
    match previous {
        Some((_, value)) if map.contains_key(&key) => {
            map.insert(key, value);
        }
        Some((index, value)) => {
            map.shift_insert(index.min(map.len()), key, value);
        }
        None => {
            map.shift_remove(&key);
        }
    }
}

/// Scope guard over an [`EvaluationContext`]
///
/// Snapshots the scalar and matrix fields on entry and journals every
/// variable write made through the guard. Both are undone on drop, variable
/// writes in reverse order.
pub struct ContextScope<'a> {
    ctx: &'a mut EvaluationContext,
    snapshot: FieldSnapshot,
    journal: Vec<VariableOverride>,
}

impl<'a> ContextScope<'a> {
    fn new(ctx: &'a mut EvaluationContext) -> Self {
        let snapshot = FieldSnapshot::take(ctx);
        Self {
            ctx,
            snapshot,
            journal: Vec::new(),
        }
    }

    /// Override a float variable until the scope ends
    pub fn set_float_variable(&mut self, key: impl Into<String>, value: f32) {
        let key = key.into();
        let previous = overwrite(&mut self.ctx.float_variables, key.clone(), value);
        self.journal.push(VariableOverride::Float(key, previous));
    }

    /// Hide a float variable until the scope ends
    pub fn remove_float_variable(&mut self, key: &str) {
        let previous = hide(&mut self.ctx.float_variables, key);
        self.journal
            .push(VariableOverride::Float(key.to_string(), previous));
    }

    /// Override an object variable until the scope ends
    pub fn set_object_variable<T: 'static>(&mut self, key: impl Into<String>, value: T) {
        self.set_object_variable_rc(key, Rc::new(value));
    }

    /// Override an object variable with an already shared value
    pub fn set_object_variable_rc(&mut self, key: impl Into<String>, value: Rc<dyn Any>) {
        let key = key.into();
        let previous = overwrite(&mut self.ctx.object_variables.inner, key.clone(), value);
        self.journal.push(VariableOverride::Object(key, previous));
    }

    pub fn remove_object_variable(&mut self, key: &str) {
        let previous = hide(&mut self.ctx.object_variables.inner, key);
        self.journal
            .push(VariableOverride::Object(key.to_string(), previous));
    }
}

impl Deref for ContextScope<'_> {
    type Target = EvaluationContext;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for ContextScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        while let Some(entry) = self.journal.pop() {
            match entry {
                VariableOverride::Float(key, previous) => {
                    restore(&mut self.ctx.float_variables, key, previous);
                }
                VariableOverride::Object(key, previous) => {
                    restore(&mut self.ctx.object_variables.inner, key, previous);
                }
            }
        }
        self.snapshot.restore(self.ctx);
    }
}
