use std::convert::TryFrom;
use std::fmt;
use serde_derive::Deserialize;

/// Name of the module being scaffolded.
///
/// Every derived token is computed from this value, so it is validated once
/// up front: non-empty, ASCII letters, digits and underscores only, not
/// starting with a digit.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct ModuleName(String);

impl ModuleName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InvalidIdentifierReason {
    Empty,
    LeadingDigit,
    InvalidChar { c: char, pos: usize },
}

impl fmt::Display for InvalidIdentifierReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InvalidIdentifierReason::Empty => write!(f, "the name is empty"),
            InvalidIdentifierReason::LeadingDigit => write!(f, "the name starts with a digit"),
            InvalidIdentifierReason::InvalidChar { c, pos } => write!(f, "invalid character {:?} at position {}", c, pos),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid module name {string:?}: {reason}")]
pub struct InvalidIdentifier {
    pub string: String,
    pub reason: InvalidIdentifierReason,
}

impl TryFrom<String> for ModuleName {
    type Error = InvalidIdentifier;

    fn try_from(string: String) -> Result<Self, Self::Error> {
        let reason = match string.chars().next() {
            None => Some(InvalidIdentifierReason::Empty),
            Some(c) if c.is_ascii_digit() => Some(InvalidIdentifierReason::LeadingDigit),
            Some(_) => string
                .char_indices()
                .find(|(_, c)| !c.is_ascii_alphanumeric() && *c != '_')
                .map(|(pos, c)| InvalidIdentifierReason::InvalidChar { c, pos }),
        };

        match reason {
            Some(reason) => Err(InvalidIdentifier { string, reason }),
            None => Ok(ModuleName(string)),
        }
    }
}

impl<'a> TryFrom<&'a str> for ModuleName {
    type Error = InvalidIdentifier;

    fn try_from(string: &'a str) -> Result<Self, Self::Error> {
        ModuleName::try_from(string.to_owned())
    }
}

impl std::str::FromStr for ModuleName {
    type Err = InvalidIdentifier;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        ModuleName::try_from(string)
    }
}
