//! Derives placeholder values from a module name.

use std::fmt;
use std::convert::TryFrom;
use crate::types::ModuleName;
use crate::template::Query;
use crate::Map;

/// Placeholder keys recognized in templates and output paths.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TokenKey {
    /// Canonical (studly) module name, used for class names and directories.
    ModuleName,
    /// The module name exactly as given.
    ModuleNameVerbatim,
    ModuleNameToLower,
    ModuleNameToUpper,
    ModuleNameStudly,
    ModuleNameSnake,
    ModuleNameKebab,
    ModuleNameCamel,
    /// Human-readable description, `"<Title Case> module"` unless overridden.
    ModuleDescription,
}

impl TokenKey {
    pub const ALL: &'static [TokenKey] = &[
        TokenKey::ModuleName,
        TokenKey::ModuleNameVerbatim,
        TokenKey::ModuleNameToLower,
        TokenKey::ModuleNameToUpper,
        TokenKey::ModuleNameStudly,
        TokenKey::ModuleNameSnake,
        TokenKey::ModuleNameKebab,
        TokenKey::ModuleNameCamel,
        TokenKey::ModuleDescription,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TokenKey::ModuleName => "MODULE_NAME",
            TokenKey::ModuleNameVerbatim => "MODULE_NAME_VERBATIM",
            TokenKey::ModuleNameToLower => "MODULE_NAME_TO_LOWER",
            TokenKey::ModuleNameToUpper => "MODULE_NAME_TO_UPPER",
            TokenKey::ModuleNameStudly => "MODULE_NAME_STUDLY",
            TokenKey::ModuleNameSnake => "MODULE_NAME_SNAKE",
            TokenKey::ModuleNameKebab => "MODULE_NAME_KEBAB",
            TokenKey::ModuleNameCamel => "MODULE_NAME_CAMEL",
            TokenKey::ModuleDescription => "MODULE_DESCRIPTION",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        TokenKey::ALL.iter().copied().find(|candidate| candidate.as_str() == key)
    }

    pub fn description(self) -> &'static str {
        match self {
            TokenKey::ModuleName => "module name in StudlyCase (Billing)",
            TokenKey::ModuleNameVerbatim => "module name exactly as given",
            TokenKey::ModuleNameToLower => "module name in lower case (billing)",
            TokenKey::ModuleNameToUpper => "module name in upper case (BILLING)",
            TokenKey::ModuleNameStudly => "module name in StudlyCase (BillingReports)",
            TokenKey::ModuleNameSnake => "module name in snake_case (billing_reports)",
            TokenKey::ModuleNameKebab => "module name in kebab-case (billing-reports)",
            TokenKey::ModuleNameCamel => "module name in camelCase (billingReports)",
            TokenKey::ModuleDescription => "human-readable description",
        }
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown placeholder key {0}")]
pub struct UnknownTokenKey(pub String);

impl<'a> TryFrom<&'a str> for TokenKey {
    type Error = UnknownTokenKey;

    fn try_from(key: &'a str) -> Result<Self, Self::Error> {
        TokenKey::from_key(key).ok_or_else(|| UnknownTokenKey(key.to_owned()))
    }
}

impl std::str::FromStr for TokenKey {
    type Err = UnknownTokenKey;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        TokenKey::try_from(key)
    }
}

/// User-supplied values replacing derived ones.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Overrides(Map<TokenKey, String>);

impl Overrides {
    pub fn new() -> Self {
        Overrides::default()
    }

    pub fn insert<V: Into<String>>(&mut self, key: TokenKey, value: V) -> Option<String> {
        self.0.insert(key, value.into())
    }

    pub fn with_description<V: Into<String>>(mut self, description: V) -> Self {
        self.insert(TokenKey::ModuleDescription, description);
        self
    }

    /// Builds overrides from string keys, rejecting keys that aren't placeholders.
    pub fn parse<I, K, V>(pairs: I) -> Result<Self, UnknownTokenKey> where I: IntoIterator<Item=(K, V)>, K: AsRef<str>, V: Into<String> {
        let mut overrides = Overrides::new();
        for (key, value) in pairs {
            let key = TokenKey::try_from(key.as_ref())?;
            overrides.insert(key, value);
        }
        Ok(overrides)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Values of all placeholders for one module.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TokenMap(Map<TokenKey, String>);

impl TokenMap {
    pub fn value(&self, key: TokenKey) -> Option<&str> {
        self.0.get(&key).map(AsRef::as_ref)
    }

    pub fn iter(&self) -> impl '_ + Iterator<Item=(TokenKey, &str)> {
        self.0.iter().map(|(key, value)| (*key, value.as_str()))
    }
}

impl Query for TokenMap {
    fn get(&self, key: &str) -> Option<&str> {
        TokenKey::from_key(key).and_then(|key| self.value(key))
    }
}

fn or_verbatim(derived: String, verbatim: &str) -> String {
    if derived.is_empty() {
        verbatim.to_owned()
    } else {
        derived
    }
}

/// Computes every placeholder value for `name`.
///
/// Deterministic: the same name and overrides always produce the same map.
pub fn resolve(name: &ModuleName, overrides: &Overrides) -> TokenMap {
    use heck::{ToKebabCase, ToLowerCamelCase, ToPascalCase, ToSnakeCase, ToTitleCase};

    let verbatim = name.as_str();
    // names consisting only of underscores have no case-converted form
    let studly = or_verbatim(verbatim.to_pascal_case(), verbatim);
    let title = or_verbatim(verbatim.to_title_case(), verbatim);

    let mut values = Map::new();
    values.insert(TokenKey::ModuleName, studly.clone());
    values.insert(TokenKey::ModuleNameVerbatim, verbatim.to_owned());
    values.insert(TokenKey::ModuleNameToLower, verbatim.to_lowercase());
    values.insert(TokenKey::ModuleNameToUpper, verbatim.to_uppercase());
    values.insert(TokenKey::ModuleNameStudly, studly);
    values.insert(TokenKey::ModuleNameSnake, or_verbatim(verbatim.to_snake_case(), verbatim));
    values.insert(TokenKey::ModuleNameKebab, or_verbatim(verbatim.to_kebab_case(), verbatim));
    values.insert(TokenKey::ModuleNameCamel, or_verbatim(verbatim.to_lower_camel_case(), verbatim));
    values.insert(TokenKey::ModuleDescription, format!("{} module", title));

    for (key, value) in &overrides.0 {
        values.insert(*key, value.clone());
    }

    TokenMap(values)
}
