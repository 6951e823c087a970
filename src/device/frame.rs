//! # Wire frame: `"{slot:04} {token}"`.
//!
//! A dispatch message is a single text frame whose first token is the
//! zero-padded 4-digit slot number, a single-space separator, and the
//! remainder is the opaque token (a task id or a full encoded payload,
//! depending on the store strategy). Pools of 10000 or more slots are
//! unsupported by this format.

use thiserror::Error;

/// Errors produced while reading a wire frame.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FrameError {
    /// The frame has no separator or an empty token.
    #[error("malformed frame: {reason}")]
    Malformed {
        /// What made the frame unreadable.
        reason: String,
    },

    /// The slot prefix is not a zero-padded 4-digit number.
    #[error("bad slot prefix '{prefix}'")]
    BadSlot {
        /// The offending prefix text.
        prefix: String,
    },
}

/// Parsed dispatch frame: a slot address and an opaque token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Target slot (1-based). The dispatcher clamps this into range before
    /// send; receivers never do.
    pub slot: usize,
    /// Opaque token text (may itself contain spaces).
    pub token: String,
}

impl Frame {
    /// Builds a frame for the given slot and token.
    pub fn new(slot: usize, token: impl Into<String>) -> Self {
        Self {
            slot,
            token: token.into(),
        }
    }

    /// Renders the wire text: zero-padded slot, one space, token.
    pub fn encode(&self) -> String {
        format!("{:04} {}", self.slot, self.token)
    }

    /// Parses wire text back into a frame.
    ///
    /// Splits at the **first** space only, so tokens containing spaces
    /// survive intact.
    pub fn parse(line: &str) -> Result<Self, FrameError> {
        let (prefix, token) = line.split_once(' ').ok_or_else(|| FrameError::Malformed {
            reason: "missing separator".to_string(),
        })?;
        if token.is_empty() {
            return Err(FrameError::Malformed {
                reason: "empty token".to_string(),
            });
        }
        if prefix.len() != 4 || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FrameError::BadSlot {
                prefix: prefix.to_string(),
            });
        }
        let slot = prefix.parse::<usize>().map_err(|_| FrameError::BadSlot {
            prefix: prefix.to_string(),
        })?;
        Ok(Self {
            slot,
            token: token.to_string(),
        })
    }
}
