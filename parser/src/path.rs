//! Tracking of the location of events within a document.
//!
//! A [`Path`] is a stack with one [`PathEntry`] per open collection. The entry tells where in
//! that collection the next node goes: which index of a sequence, or whether a mapping expects a
//! key or the value of a given key.
//!
//! The [`Parser`] updates the path around each event it hands to an [`EventReceiver`]:
//!   - Before the event, a collection end pops the entry of the collection it closes.
//!   - The receiver sees the path, which for any event is the location of the node the event
//!     belongs to.
//!   - After the event, a collection start pushes an entry for its contents. A scalar, an alias
//!     or a collection end completes a node and advances the entry of the enclosing collection.
//!
//! [`Parser`]: crate::Parser
//! [`EventReceiver`]: crate::EventReceiver

use std::fmt;

use crate::event::Event;

/// What is known of the key of a mapping entry.
#[derive(Clone, PartialEq, Debug, Eq, Hash)]
pub enum Key {
    /// The key has not been read yet.
    Pending,
    /// The key is a scalar with this value.
    Scalar(String),
    /// The key is a collection or an alias.
    Complex,
}

/// One level of a [`Path`].
#[derive(Clone, PartialEq, Debug, Eq, Hash)]
pub enum PathEntry {
    /// The next node of the mapping is a key. The payload is [`Key::Pending`].
    MappingKey(Key),
    /// The next node of the mapping is the value for the given (completed) key.
    MappingValue(Key),
    /// The next node of the sequence is at this index.
    SequenceIndex(usize),
}

/// The stack of locations from the document root to the current event.
#[derive(Clone, PartialEq, Debug, Eq, Default)]
pub struct Path {
    entries: Vec<PathEntry>,
}

impl Path {
    /// Create an empty path, located at the root of a document.
    #[must_use]
    pub fn new() -> Path {
        Path::default()
    }

    /// Return the number of open collections.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Return the number of open collections.
    ///
    /// This is the same as [`Self::depth`].
    #[must_use]
    pub fn current_depth(&self) -> usize {
        self.depth()
    }

    /// Return the entry at nesting level `i`, 0 being the outermost collection.
    #[must_use]
    pub fn entry_at(&self, i: usize) -> Option<&PathEntry> {
        self.entries.get(i)
    }

    /// Return the entry of the innermost open collection.
    #[must_use]
    pub fn last(&self) -> Option<&PathEntry> {
        self.entries.last()
    }

    /// Iterate over the entries, from the outermost collection to the innermost.
    pub fn iter(&self) -> std::slice::Iter<'_, PathEntry> {
        self.entries.iter()
    }

    /// Return whether no collection is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return whether we are at the root of a document (no collection is open).
    #[must_use]
    pub fn in_root(&self) -> bool {
        self.is_empty()
    }

    /// Return whether the innermost open collection is a mapping.
    #[must_use]
    pub fn in_mapping(&self) -> bool {
        matches!(
            self.last(),
            Some(PathEntry::MappingKey(_) | PathEntry::MappingValue(_))
        )
    }

    /// Return whether the innermost open collection is a sequence.
    #[must_use]
    pub fn in_sequence(&self) -> bool {
        matches!(self.last(), Some(PathEntry::SequenceIndex(_)))
    }

    /// Return whether the current node is a key of the innermost mapping.
    #[must_use]
    pub fn in_mapping_key(&self) -> bool {
        matches!(self.last(), Some(PathEntry::MappingKey(_)))
    }

    /// Return whether the current node is a value of the innermost mapping.
    #[must_use]
    pub fn in_mapping_value(&self) -> bool {
        matches!(self.last(), Some(PathEntry::MappingValue(_)))
    }

    /// Update the path before `event` is handed out.
    pub(crate) fn before(&mut self, event: &Event) {
        if event.is_collection_end() {
            self.entries.pop();
        }
    }

    /// Update the path after `event` has been handed out.
    pub(crate) fn after(&mut self, event: &Event) {
        match event {
            Event::SequenceStart { .. } => self.entries.push(PathEntry::SequenceIndex(0)),
            Event::MappingStart { .. } => self.entries.push(PathEntry::MappingKey(Key::Pending)),
            Event::Scalar { value, .. } => self.complete(Key::Scalar(value.clone())),
            Event::Alias { .. } | Event::SequenceEnd | Event::MappingEnd => {
                self.complete(Key::Complex);
            }
            _ => {}
        }
    }

    /// Record the completion of a node in the innermost collection.
    ///
    /// `node` is what the node would be as a key. It is only kept if the node was a key.
    pub(crate) fn complete(&mut self, node: Key) {
        let Some(entry) = self.entries.last_mut() else {
            return;
        };
        let next = match &*entry {
            PathEntry::MappingKey(_) => PathEntry::MappingValue(node),
            PathEntry::MappingValue(_) => PathEntry::MappingKey(Key::Pending),
            PathEntry::SequenceIndex(i) => PathEntry::SequenceIndex(i + 1),
        };
        *entry = next;
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathEntry;
    type IntoIter = std::slice::Iter<'a, PathEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Renders the path as `/key/0/other`.
///
/// Mappings waiting for a key add no component. Keys that are not scalars render as `{}`.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut written = false;
        for entry in &self.entries {
            match entry {
                PathEntry::MappingKey(_) => continue,
                PathEntry::MappingValue(Key::Scalar(key)) => write!(f, "/{key}")?,
                PathEntry::MappingValue(_) => f.write_str("/{}")?,
                PathEntry::SequenceIndex(i) => write!(f, "/{i}")?,
            }
            written = true;
        }
        if !written {
            f.write_str("/")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::event::{CollectionStyle, Event};
    use crate::scanner::ScalarStyle;

    use super::{Key, Path, PathEntry};

    fn scalar(v: &str) -> Event {
        Event::Scalar {
            style: ScalarStyle::Plain,
            value: v.into(),
            anchor: None,
            tag: None,
        }
    }

    fn mapping() -> Event {
        Event::MappingStart {
            style: CollectionStyle::Block,
            anchor: None,
            tag: None,
        }
    }

    fn feed(path: &mut Path, ev: &Event) {
        path.before(ev);
        path.after(ev);
    }

    #[test]
    fn keys_and_values_alternate() {
        let mut path = Path::new();
        assert_eq!(path.to_string(), "/");
        feed(&mut path, &mapping());
        assert!(path.in_mapping_key());
        feed(&mut path, &scalar("a"));
        assert_eq!(
            path.last(),
            Some(&PathEntry::MappingValue(Key::Scalar("a".into())))
        );
        assert_eq!(path.to_string(), "/a");
        feed(&mut path, &scalar("1"));
        assert!(path.in_mapping_key());
        feed(&mut path, &Event::MappingEnd);
        assert!(path.in_root());
    }

    #[test]
    fn sequences_count_completed_nodes() {
        let mut path = Path::new();
        feed(
            &mut path,
            &Event::SequenceStart {
                style: CollectionStyle::Flow,
                anchor: None,
                tag: None,
            },
        );
        feed(&mut path, &scalar("x"));
        feed(&mut path, &mapping());
        feed(&mut path, &Event::MappingEnd);
        feed(&mut path, &Event::Alias { anchor: "a".into() });
        assert_eq!(path.entry_at(0), Some(&PathEntry::SequenceIndex(3)));
        assert!(path.in_sequence());
        assert_eq!(path.depth(), 1);
    }

    #[test]
    fn complex_keys() {
        let mut path = Path::new();
        feed(&mut path, &mapping());
        feed(&mut path, &mapping());
        feed(&mut path, &Event::MappingEnd);
        assert!(path.in_mapping_value());
        feed(
            &mut path,
            &Event::SequenceStart {
                style: CollectionStyle::Block,
                anchor: None,
                tag: None,
            },
        );
        assert_eq!(path.to_string(), "/{}/0");
        assert_eq!(path.current_depth(), 2);
    }
}
