//! # Codec: hydrate/dehydrate between tasks and transportable payloads.
//!
//! Serializes a task instance plus its concrete type tag into a single
//! text payload, and reconstructs a polymorphic [`BoxedTask`] from that
//! payload via an explicit [`TaskRegistry`] — tagged-variant dispatch, not
//! reflection.
//!
//! ## Payload layout
//! ```text
//! {"kind":"<type tag>","state":{ ...structural task state... }}
//! ```
//!
//! ## Round-trip law
//! For every registered task kind, `decode(encode(t))` yields a task whose
//! id and input fields equal `t`'s. The whole persistence story depends on
//! this invariant.
//!
//! ## Rules
//! - Decoding an unknown type tag fails with [`CodecError::UnknownTaskKind`]
//!   and is **never** silently swallowed.
//! - The registry is populated once at startup by the embedding application;
//!   the queue never hardcodes concrete task types.

mod registry;

pub use registry::TaskRegistry;

use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::tasks::{BoxedTask, Task};

/// On-the-wire envelope pairing a type tag with structural task state.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    kind: String,
    state: serde_json::Value,
}

/// Reversible task serializer backed by a [`TaskRegistry`].
///
/// Cheap to share; the queue holds it behind an `Arc` and hands it to every
/// store strategy that needs to materialize payloads.
pub struct Codec {
    registry: TaskRegistry,
}

impl Codec {
    /// Creates a codec over the given decoder registry.
    pub fn new(registry: TaskRegistry) -> Self {
        Self { registry }
    }

    /// Encodes a task into a transportable payload.
    ///
    /// Captures the task's type tag and a structural snapshot of its state.
    pub fn encode(&self, task: &dyn Task) -> Result<String, CodecError> {
        let envelope = Envelope {
            kind: task.kind().to_string(),
            state: task.state()?,
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    /// Reconstructs a task from an encoded payload.
    ///
    /// Looks up the decoder by the envelope's type tag; an unregistered tag
    /// fails with [`CodecError::UnknownTaskKind`].
    pub fn decode(&self, payload: &str) -> Result<BoxedTask, CodecError> {
        let envelope: Envelope =
            serde_json::from_str(payload).map_err(|e| CodecError::BadEnvelope {
                reason: e.to_string(),
            })?;
        let decode = self
            .registry
            .decoder(&envelope.kind)
            .ok_or(CodecError::UnknownTaskKind {
                kind: envelope.kind,
            })?;
        decode(envelope.state)
    }

    /// Returns the type tags this codec can reconstruct.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.registry.kinds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutionError;
    use crate::tasks::{snapshot, TaskKind};
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Echo {
        id: String,
        input: String,
        output: Option<String>,
    }

    #[async_trait]
    impl Task for Echo {
        fn id(&self) -> &str {
            &self.id
        }
        fn kind(&self) -> &'static str {
            Self::KIND
        }
        fn state(&self) -> Result<serde_json::Value, CodecError> {
            snapshot(self)
        }
        async fn execute(&mut self) -> Result<(), ExecutionError> {
            self.output = Some(self.input.clone());
            Ok(())
        }
    }

    impl TaskKind for Echo {
        const KIND: &'static str = "test.echo";
    }

    fn codec() -> Codec {
        let mut registry = TaskRegistry::new();
        registry.register::<Echo>().unwrap();
        Codec::new(registry)
    }

    #[test]
    fn round_trip_preserves_id_and_input() {
        let codec = codec();
        let task = Echo {
            id: "echo-1".into(),
            input: "ping".into(),
            output: None,
        };

        let payload = codec.encode(&task).unwrap();
        let back = codec.decode(&payload).unwrap();

        assert_eq!(back.id(), "echo-1");
        assert_eq!(back.kind(), Echo::KIND);
        let state = back.state().unwrap();
        assert_eq!(state["input"], "ping");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let codec = codec();
        let payload = r#"{"kind":"test.stranger","state":{}}"#;

        let err = codec.decode(payload).unwrap_err();
        assert!(matches!(err, CodecError::UnknownTaskKind { kind } if kind == "test.stranger"));
    }

    #[test]
    fn malformed_envelope_is_rejected() {
        let codec = codec();
        let err = codec.decode("not json at all").unwrap_err();
        assert!(matches!(err, CodecError::BadEnvelope { .. }));
    }

    #[test]
    fn kinds_reports_the_registered_tags() {
        assert_eq!(codec().kinds(), vec![Echo::KIND]);
    }
}
