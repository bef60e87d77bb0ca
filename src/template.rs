//! Placeholder tokenizer and expansion.
//!
//! A placeholder is an opening bracket, one or more of `A-Z` and `_`, and a
//! closing bracket: `[MODULE_NAME]`. Anything else containing brackets is
//! plain text, which keeps array literals such as `['Module Name']` in
//! generated sources intact.
//!
//! The key of a placeholder is always the whole bracketed run, so a shorter
//! key that happens to be a prefix of a longer one (`MODULE_NAME` inside
//! `MODULE_NAME_TO_LOWER`) can never match part of it.

use std::collections::{HashMap, BTreeMap};
use std::borrow::{Borrow, Cow};

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Component<'a> {
    /// Literal text and its byte offset in the template.
    Constant(&'a str, usize),
    /// Placeholder key (without brackets) and the byte offset of its opening bracket.
    Variable(&'a str, usize),
}

#[derive(Debug, Clone)]
pub struct Parser<'a> {
    remaining: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn vars(self) -> impl 'a + Iterator<Item=(&'a str, usize)> {
        self.filter_map(|component| match component {
            Component::Variable(var, pos) => Some((var, pos)),
            Component::Constant(_, _) => None,
        })
    }
}

/// Returns the length of the key if a placeholder starts at the beginning of `input`.
fn placeholder_at(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    if bytes.first() != Some(&b'[') {
        return None;
    }
    let len = bytes[1..]
        .iter()
        .take_while(|b| b.is_ascii_uppercase() || **b == b'_')
        .count();
    if len > 0 && bytes.get(len + 1) == Some(&b']') {
        Some(len)
    } else {
        None
    }
}

impl<'a> Iterator for Parser<'a> {
    type Item = Component<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }

        if let Some(len) = placeholder_at(self.remaining) {
            let res = Component::Variable(&self.remaining[1..(len + 1)], self.pos);
            self.remaining = &self.remaining[(len + 2)..];
            self.pos += len + 2;
            return Some(res);
        }

        // Skip the current byte: either it's not a bracket or the bracket doesn't open a placeholder.
        let mut scan = self.remaining.chars().next().map_or(1, char::len_utf8);
        let end = loop {
            match self.remaining[scan..].find('[') {
                Some(offset) => {
                    let candidate = scan + offset;
                    if placeholder_at(&self.remaining[candidate..]).is_some() {
                        break candidate;
                    }
                    scan = candidate + 1;
                },
                None => break self.remaining.len(),
            }
        };

        let res = Component::Constant(&self.remaining[..end], self.pos);
        self.remaining = &self.remaining[end..];
        self.pos += end;
        Some(res)
    }
}

pub fn parse<'a>(template: &'a str) -> Parser<'a> {
    Parser {
        remaining: template,
        pos: 0,
    }
}

/// Returns true if `input` contains anything the tokenizer would treat as a placeholder.
pub fn contains_placeholder(input: &str) -> bool {
    parse(input).vars().next().is_some()
}

pub trait Query {
    fn get(&self, key: &str) -> Option<&str>;
}

impl<T: Query> Query for &T {
    fn get(&self, key: &str) -> Option<&str> {
        (*self).get(key)
    }
}

impl<S1, S2> Query for HashMap<S1, S2> where S1: Borrow<str> + Eq + std::hash::Hash, S2: AsRef<str> {
    fn get(&self, key: &str) -> Option<&str> {
        HashMap::get(self, key).map(AsRef::as_ref)
    }
}

impl<S1, S2> Query for BTreeMap<S1, S2> where S1: Borrow<str> + Eq + Ord, S2: AsRef<str> {
    fn get(&self, key: &str) -> Option<&str> {
        BTreeMap::get(self, key).map(AsRef::as_ref)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("no value for placeholder [{key}] at byte {pos}")]
pub struct MissingVariable {
    pub key: String,
    pub pos: usize,
}

/// Replaces every placeholder in `template` with its value in a single pass.
///
/// Values are copied verbatim and never scanned for placeholders themselves.
pub fn expand_to_cow<'a, V: Query>(template: &'a str, vars: V) -> Result<Cow<'a, str>, MissingVariable> {
    if !contains_placeholder(template) {
        return Ok(Cow::Borrowed(template));
    }

    let mut out = String::with_capacity(template.len());
    for component in parse(template) {
        match component {
            Component::Constant(val, _) => out.push_str(val),
            Component::Variable(key, pos) => {
                let value = vars.get(key).ok_or_else(|| MissingVariable { key: key.to_owned(), pos })?;
                out.push_str(value);
            },
        }
    }
    Ok(Cow::Owned(out))
}

#[cfg(test)]
mod tests {
    use super::Component::{self, *};
    use std::collections::BTreeMap;

    fn check(template: &str, expected: &[Component<'_>]) {
        let components = super::parse(template).collect::<Vec<_>>();
        assert_eq!(&*components, expected);
    }

    macro_rules! test_case {
        ($name:ident, $template:expr $(, $expected:expr)*) => {
            #[test]
            fn $name() {
                check($template, &[$($expected),*]);
            }
        }
    }

    test_case!(empty, "");
    test_case!(single_constant, "foo", Constant("foo", 0));
    test_case!(single_var, "[FOO]", Variable("FOO", 0));
    test_case!(var_begin, "[FOO]bar", Variable("FOO", 0), Constant("bar", 5));
    test_case!(var_end, "bar[FOO]", Constant("bar", 0), Variable("FOO", 3));
    test_case!(var_middle, "foo[BAR]baz", Constant("foo", 0), Variable("BAR", 3), Constant("baz", 8));
    test_case!(consecutive_vars, "[FOO][BAR]", Variable("FOO", 0), Variable("BAR", 5));
    test_case!(underscores, "[MODULE_NAME_TO_LOWER]:info", Variable("MODULE_NAME_TO_LOWER", 0), Constant(":info", 22));
    test_case!(lowercase_is_literal, "[foo]", Constant("[foo]", 0));
    test_case!(empty_brackets_literal, "[]x", Constant("[]x", 0));
    test_case!(digits_are_literal, "[FOO1]", Constant("[FOO1]", 0));
    test_case!(unclosed_is_literal, "[FOO", Constant("[FOO", 0));
    test_case!(stray_closing, "FOO]", Constant("FOO]", 0));
    test_case!(double_open, "[[FOO]", Constant("[", 0), Variable("FOO", 1));
    test_case!(double_close, "[FOO]]", Variable("FOO", 0), Constant("]", 5));
    test_case!(php_array, "['[NAME]', 'x']", Constant("['", 0), Variable("NAME", 2), Constant("', 'x']", 8));
    test_case!(space_inside, "[FOO BAR]", Constant("[FOO BAR]", 0));
    test_case!(multibyte_around, "ž[FOO]ž", Constant("ž", 0), Variable("FOO", 2), Constant("ž", 7));

    fn vars() -> BTreeMap<&'static str, &'static str> {
        let mut vars = BTreeMap::new();
        vars.insert("MODULE_NAME", "Billing");
        vars.insert("MODULE_NAME_TO_LOWER", "billing");
        vars
    }

    #[test]
    fn longer_key_wins_over_prefix() {
        let expanded = super::expand_to_cow("[MODULE_NAME_TO_LOWER]/[MODULE_NAME]", vars()).unwrap();
        assert_eq!(expanded, "billing/Billing");
    }

    #[test]
    fn values_are_not_rescanned() {
        let mut vars = vars();
        vars.insert("MODULE_DESCRIPTION", "uses [MODULE_NAME] literally");
        let expanded = super::expand_to_cow("[MODULE_DESCRIPTION]", vars).unwrap();
        assert_eq!(expanded, "uses [MODULE_NAME] literally");
    }

    #[test]
    fn plain_text_is_borrowed() {
        let expanded = super::expand_to_cow("nothing [here]", vars()).unwrap();
        assert!(matches!(expanded, std::borrow::Cow::Borrowed(_)));
    }

    #[test]
    fn missing_variable_reports_position() {
        let error = super::expand_to_cow("ab[MODULE_SNAKE]", vars()).unwrap_err();
        assert_eq!(error.key, "MODULE_SNAKE");
        assert_eq!(error.pos, 2);
    }
}
