//! Message bags and live-component validation failures.
//!
//! Bags and their fields keep insertion order, because emission order is
//! part of the recorded entry stream.

use thiserror::Error;

/// An ordered field → messages map for one validation context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBag {
    entries: Vec<(String, Vec<String>)>,
}

impl MessageBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` to `field`, creating the field entry on first use.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        let message = message.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.entries.push((field, vec![message])),
        }
    }

    /// Set all messages for `field` at once, replacing any existing entry.
    pub fn insert<I, M>(&mut self, field: impl Into<String>, messages: I)
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        let field = field.into();
        let messages: Vec<String> = messages.into_iter().map(Into::into).collect();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some((_, slot)) => *slot = messages,
            None => self.entries.push((field, messages)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Field names in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(field, _)| field.as_str())
    }

    /// `(field, messages)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }
}

/// Named validation contexts for one request, e.g. two independent forms on
/// the same page flashing into separate bags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBags {
    bags: Vec<(String, MessageBag)>,
}

impl ErrorBags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bag` under `name`, replacing any existing bag of that name.
    pub fn insert(&mut self, name: impl Into<String>, bag: MessageBag) {
        let name = name.into();
        match self.bags.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = bag,
            None => self.bags.push((name, bag)),
        }
    }

    /// Mutable access to the bag named `name`, creating it when absent.
    pub fn bag_mut(&mut self, name: &str) -> &mut MessageBag {
        let index = match self.bags.iter().position(|(existing, _)| existing == name) {
            Some(index) => index,
            None => {
                self.bags.push((name.to_string(), MessageBag::new()));
                self.bags.len() - 1
            }
        };
        &mut self.bags[index].1
    }

    pub fn is_empty(&self) -> bool {
        self.bags.is_empty()
    }

    /// `(bag name, bag)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MessageBag)> {
        self.bags.iter().map(|(name, bag)| (name.as_str(), bag))
    }
}

/// Key of one entry in a [`ValidationFailure`].
///
/// Live-component runtimes merge positional list entries into the same
/// structure as the field errors; only `Field` keys name real inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKey {
    /// A named input field.
    Field(String),
    /// A positional entry merged in by the component runtime.
    Position(usize),
}

/// A validation failure raised mid-request, either by a direct validation
/// call or inside a live-component callback.
#[derive(Debug, Clone, Error)]
#[error("validation failed for error bag `{bag}`")]
pub struct ValidationFailure {
    /// The error bag the failed validation was declared against.
    pub bag: String,
    /// Field → messages entries, in the order the validator produced them.
    pub errors: Vec<(ErrorKey, Vec<String>)>,
}

impl ValidationFailure {
    pub fn new(bag: impl Into<String>) -> Self {
        Self {
            bag: bag.into(),
            errors: Vec::new(),
        }
    }

    /// Add messages for a named field.
    pub fn field<I, M>(mut self, name: impl Into<String>, messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        self.errors.push((
            ErrorKey::Field(name.into()),
            messages.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Add a positional entry, as a component runtime would merge one in.
    pub fn position<I, M>(mut self, index: usize, messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        self.errors.push((
            ErrorKey::Position(index),
            messages.into_iter().map(Into::into).collect(),
        ));
        self
    }
}
