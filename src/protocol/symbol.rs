//! Symbol encoding.
//!
//! Update requests carry one symbol as a Unicode codepoint. The end-of-string
//! marker is codepoint 0 on the wire and the empty string in score responses,
//! so the NUL character cannot be observed as a symbol of its own.

use crate::error::{Result, StateLmError};

/// Codepoint of the end-of-string marker.
pub const END_OF_STRING: i32 = 0;

/// A single observed symbol: a character or the end-of-string marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// One Unicode scalar value.
    Char(char),
    /// End of the observed string.
    EndOfString,
}

impl Symbol {
    /// Whether this symbol can be sent without colliding with end-of-string.
    pub fn is_encodable(self) -> bool {
        self != Self::Char('\0')
    }

    /// Codepoint sent in update requests.
    pub fn codepoint(self) -> i32 {
        match self {
            Self::Char(c) => c as i32,
            Self::EndOfString => END_OF_STRING,
        }
    }

    /// Decode a wire codepoint, rejecting values that are not scalar values.
    pub fn from_codepoint(codepoint: i32) -> Result<Self> {
        if codepoint == END_OF_STRING {
            return Ok(Self::EndOfString);
        }
        u32::try_from(codepoint)
            .ok()
            .and_then(char::from_u32)
            .map(Self::Char)
            .ok_or_else(|| {
                StateLmError::InvalidArgument(format!("invalid codepoint {codepoint}"))
            })
    }

    /// Text form as it appears in score responses.
    pub fn as_text(self) -> String {
        match self {
            Self::Char(c) => c.to_string(),
            Self::EndOfString => String::new(),
        }
    }

    /// Parse the text form of a response symbol.
    pub fn from_text(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Ok(Self::EndOfString),
            (Some('\0'), None) => Err(nul_error()),
            (Some(c), None) => Ok(Self::Char(c)),
            _ => Err(StateLmError::InvalidArgument(format!(
                "expected a single symbol, got {text:?}"
            ))),
        }
    }
}

fn nul_error() -> StateLmError {
    StateLmError::InvalidArgument(
        "NUL is reserved for end-of-string and cannot be observed".to_string(),
    )
}

/// Reject text containing NUL before any of it is sent.
pub fn check_text(text: &str) -> Result<()> {
    if text.contains('\0') {
        return Err(nul_error());
    }
    Ok(())
}

/// Require `context` to be exactly one character.
pub fn single_char(context: &str) -> Result<char> {
    match Symbol::from_text(context)? {
        Symbol::Char(c) => Ok(c),
        Symbol::EndOfString => Err(StateLmError::InvalidArgument(
            "context increment must not be empty".to_string(),
        )),
    }
}
