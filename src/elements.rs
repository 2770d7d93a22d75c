//! The element collection

use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::Index;

use regex::Regex;
use tracing::{debug, trace};

use crate::element::{Element, ElementDef, ElementId, Transition};
use crate::error::{LookupError, QueryError, ResolveError};
use crate::query::{Attribute, Predicate};
use crate::strings::StringTable;

/// Ordered, name-indexed set of resolved elements.
///
/// Built once from definitions and a string table; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Elements {
    elements: Vec<Element>,
    by_name: HashMap<String, ElementId>,
}

/// How to address a single element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key<'k> {
    Index(usize),
    Name(&'k str),
}

impl From<usize> for Key<'_> {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl From<ElementId> for Key<'_> {
    fn from(id: ElementId) -> Self {
        Key::Index(id.index())
    }
}

impl<'k> From<&'k str> for Key<'k> {
    fn from(name: &'k str) -> Self {
        Key::Name(name)
    }
}

impl<'k> From<&'k String> for Key<'k> {
    fn from(name: &'k String) -> Self {
        Key::Name(name)
    }
}

/// Keys arriving as loosely typed data, e.g. from a command line or a JSON query.
impl<'k> TryFrom<&'k serde_json::Value> for Key<'k> {
    type Error = LookupError;

    fn try_from(value: &'k serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;
        match value {
            Value::String(name) => Ok(Key::Name(name)),
            Value::Number(n) => n
                .as_u64()
                .and_then(|i| usize::try_from(i).ok())
                .map(Key::Index)
                .ok_or(LookupError::UnsupportedKey("a negative or fractional number")),
            Value::Null => Err(LookupError::UnsupportedKey("null")),
            Value::Bool(_) => Err(LookupError::UnsupportedKey("a boolean")),
            Value::Array(_) => Err(LookupError::UnsupportedKey("a list")),
            Value::Object(_) => Err(LookupError::UnsupportedKey("a mapping")),
        }
    }
}

/// What [`Elements::find`] searches with.
pub enum Needle<'n> {
    /// Matches when `name` or `pretty_name` contains the text.
    Substring(&'n str),
    /// Matches when the pattern is found anywhere in `name` or `pretty_name`.
    Pattern(&'n Regex),
    Function(&'n dyn Fn(&Element) -> bool),
    Predicate(&'n Predicate),
}

impl<'n> Needle<'n> {
    pub fn function(f: &'n impl Fn(&Element) -> bool) -> Self {
        Needle::Function(f)
    }
}

impl<'n> From<&'n str> for Needle<'n> {
    fn from(text: &'n str) -> Self {
        Needle::Substring(text)
    }
}

impl<'n> From<&'n String> for Needle<'n> {
    fn from(text: &'n String) -> Self {
        Needle::Substring(text)
    }
}

impl<'n> From<&'n Regex> for Needle<'n> {
    fn from(pattern: &'n Regex) -> Self {
        Needle::Pattern(pattern)
    }
}

impl<'n> From<&'n Predicate> for Needle<'n> {
    fn from(predicate: &'n Predicate) -> Self {
        Needle::Predicate(predicate)
    }
}

impl<'n> TryFrom<&'n serde_json::Value> for Needle<'n> {
    type Error = LookupError;

    fn try_from(value: &'n serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;
        match value {
            Value::String(text) => Ok(Needle::Substring(text)),
            Value::Null => Err(LookupError::UnsupportedNeedle("null")),
            Value::Bool(_) => Err(LookupError::UnsupportedNeedle("a boolean")),
            Value::Number(_) => Err(LookupError::UnsupportedNeedle("a number")),
            Value::Array(_) => Err(LookupError::UnsupportedNeedle("a list")),
            Value::Object(_) => Err(LookupError::UnsupportedNeedle("a mapping")),
        }
    }
}

impl Elements {
    /// Index `definitions` by name and resolve transition targets and display names.
    pub fn new(
        definitions: impl IntoIterator<Item = ElementDef>,
        strings: &StringTable,
    ) -> Result<Self, ResolveError> {
        let definitions: Vec<ElementDef> = definitions.into_iter().collect();

        let mut by_name = HashMap::with_capacity(definitions.len());
        for (i, def) in definitions.iter().enumerate() {
            if by_name.insert(def.name.clone(), ElementId(i)).is_some() {
                return Err(ResolveError::DuplicateElement(def.name.clone()));
            }
        }

        let elements = definitions
            .into_iter()
            .map(|def| {
                trace!(element = %def.name, "resolving");
                def.resolve(&by_name, strings)
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = elements.len(), "resolved element collection");
        Ok(Self { elements, by_name })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0)
    }

    pub fn id(&self, name: &str) -> Option<ElementId> {
        self.by_name.get(name).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<&Element> {
        self.id(name).and_then(|id| self.get(id))
    }

    /// Look up by position or by name.
    pub fn lookup<'k>(&self, key: impl Into<Key<'k>>) -> Result<&Element, LookupError> {
        match key.into() {
            Key::Index(index) => self.elements.get(index).ok_or(LookupError::IndexOutOfRange {
                index,
                len: self.elements.len(),
            }),
            Key::Name(name) => self
                .by_name(name)
                .ok_or_else(|| LookupError::UnknownElement(name.to_string())),
        }
    }

    /// The element a resolved transition leads to.
    ///
    /// # Panics
    ///
    /// If `transition` was resolved against a different collection.
    pub fn target(&self, transition: &Transition) -> &Element {
        &self.elements[transition.target.0]
    }

    /// The transition's byproduct, when it names a known element.
    pub fn byproduct(&self, transition: &Transition) -> Option<&Element> {
        transition.byproduct.and_then(|id| self.get(id))
    }

    /// All elements matching `needle`, in collection order.
    pub fn find<'n>(&self, needle: impl Into<Needle<'n>>) -> Result<Vec<&Element>, QueryError> {
        let needle = needle.into();
        let mut found = Vec::new();
        for element in &self.elements {
            let hit = match &needle {
                Needle::Substring(text) => element.name.contains(*text) || element.pretty_name.contains(*text),
                Needle::Pattern(pattern) => pattern.is_match(&element.name) || pattern.is_match(&element.pretty_name),
                Needle::Function(f) => f(element),
                Needle::Predicate(predicate) => predicate.evaluate(self, element)?,
            };
            if hit {
                found.push(element);
            }
        }
        debug!(matches = found.len(), "find");
        Ok(found)
    }

    /// Order `selection` by the value of `key`, smallest first.
    ///
    /// Fails if any two keys cannot be compared.
    pub fn sorted_by<'a>(
        &'a self,
        selection: impl IntoIterator<Item = &'a Element>,
        key: &Attribute,
    ) -> Result<Vec<&'a Element>, QueryError> {
        let mut keyed = selection
            .into_iter()
            .map(|element| Ok((key.evaluate(self, element)?, element)))
            .collect::<Result<Vec<_>, QueryError>>()?;

        // every key must be comparable before sorting starts
        if let Some(((first, _), rest)) = keyed.split_first() {
            for (other, _) in rest {
                first.try_cmp(other)?;
            }
        }

        let mut failure = None;
        keyed.sort_by(|(a, _), (b, _)| {
            a.try_cmp(b).unwrap_or_else(|e| {
                failure.get_or_insert(e);
                Ordering::Equal
            })
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(keyed.into_iter().map(|(_, element)| element).collect()),
        }
    }
}

impl Index<usize> for Elements {
    type Output = Element;
    fn index(&self, index: usize) -> &Element {
        &self.elements[index]
    }
}

impl Index<ElementId> for Elements {
    type Output = Element;
    fn index(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }
}

impl Index<&str> for Elements {
    type Output = Element;
    fn index(&self, name: &str) -> &Element {
        match self.by_name(name) {
            Some(element) => element,
            None => panic!("no element named '{name}'"),
        }
    }
}

impl<'a> IntoIterator for &'a Elements {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;
    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
