use std::convert::TryFrom;
use std::fmt;
use serde_derive::Deserialize;

/// Label grouping templates, e.g. `module-commands`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Tag(String);

impl Tag {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::borrow::Borrow<str> for Tag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Tag {
    type Error = TagError;

    fn try_from(string: String) -> Result<Self, Self::Error> {
        if string.is_empty() {
            return Err(TagError { string });
        }
        for c in string.chars() {
            if c != '-' && (c < 'a' || c > 'z') && (c < '0' || c > '9') {
                return Err(TagError { string });
            }
        }
        Ok(Tag(string))
    }
}

impl<'a> TryFrom<&'a str> for Tag {
    type Error = TagError;

    fn try_from(string: &'a str) -> Result<Self, Self::Error> {
        Tag::try_from(string.to_owned())
    }
}

impl std::str::FromStr for Tag {
    type Err = TagError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        Tag::try_from(string)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid tag {string:?}, only a-z, 0-9 and - are allowed")]
pub struct TagError {
    string: String,
}

#[cfg(test)]
mod tests {
    use super::Tag;
    use std::convert::TryFrom;

    #[test]
    fn accepts_kebab_case() {
        assert_eq!(Tag::try_from("module-commands").unwrap().as_str(), "module-commands");
    }

    #[test]
    fn rejects_uppercase_and_empty() {
        assert!(Tag::try_from("Module").is_err());
        assert!(Tag::try_from("module_commands").is_err());
        assert!(Tag::try_from("").is_err());
    }
}
