use std::convert::TryFrom;
use std::fmt;
use serde_derive::Deserialize;

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct TemplateId(String);

impl TemplateId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::borrow::Borrow<str> for TemplateId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TemplateId {
    type Error = TemplateIdError;

    fn try_from(string: String) -> Result<Self, Self::Error> {
        if string.is_empty() {
            return Err(TemplateIdError { string });
        }
        for c in string.chars() {
            if c != '-' && c != '_' && !c.is_ascii_alphanumeric() {
                return Err(TemplateIdError { string });
            }
        }
        Ok(TemplateId(string))
    }
}

impl<'a> TryFrom<&'a str> for TemplateId {
    type Error = TemplateIdError;

    fn try_from(string: &'a str) -> Result<Self, Self::Error> {
        TemplateId::try_from(string.to_owned())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid template id {string:?}, only ASCII letters, digits, - and _ are allowed")]
pub struct TemplateIdError {
    string: String,
}
