//! # TaskRegistry: explicit type-tag-to-decoder mapping.
//!
//! Replaces open-ended runtime reflection with a finite registry populated
//! at startup. Each registered [`TaskKind`] contributes one decoder that
//! turns structural state back into a boxed task.
//!
//! ## Rules
//! - Registering the same tag twice fails with [`CodecError::DuplicateKind`].
//! - Lookup is by exact tag string; there is no fallback.

use std::collections::HashMap;

use crate::error::CodecError;
use crate::tasks::{BoxedTask, TaskKind};

/// Reconstructs a boxed task from its structural state.
type DecodeFn = fn(serde_json::Value) -> Result<BoxedTask, CodecError>;

/// Registry of task decoders, keyed by concrete type tag.
///
/// Supplied by the embedding application and consumed by
/// [`Codec`](crate::codec::Codec).
///
/// ## Example
/// ```ignore
/// let mut registry = TaskRegistry::new();
/// registry.register::<DoAdd>()?;
/// registry.register::<DoDivide>()?;
/// let codec = Codec::new(registry);
/// ```
#[derive(Default)]
pub struct TaskRegistry {
    decoders: HashMap<&'static str, DecodeFn>,
}

impl TaskRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Registers a decoder for `T` under `T::KIND`.
    ///
    /// Fails with [`CodecError::DuplicateKind`] if the tag is taken.
    pub fn register<T: TaskKind>(&mut self) -> Result<(), CodecError> {
        if self.decoders.contains_key(T::KIND) {
            return Err(CodecError::DuplicateKind {
                kind: T::KIND.to_string(),
            });
        }
        self.decoders.insert(T::KIND, decode_as::<T>);
        Ok(())
    }

    /// Looks up the decoder for a type tag.
    pub(crate) fn decoder(&self, kind: &str) -> Option<DecodeFn> {
        self.decoders.get(kind).copied()
    }

    /// Returns the registered type tags (unsorted).
    pub fn kinds(&self) -> Vec<&'static str> {
        self.decoders.keys().copied().collect()
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

/// Monomorphized decoder stored in the registry for each `T`.
fn decode_as<T: TaskKind>(state: serde_json::Value) -> Result<BoxedTask, CodecError> {
    let task: T = serde_json::from_value(state)?;
    Ok(Box::new(task))
}
