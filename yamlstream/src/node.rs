//! The in-memory tree of a YAML document.
#![allow(clippy::module_name_repetitions)]

use std::{io::Read, rc::Rc};

use yamlstream_parser::{CollectionStyle, Input, Parser, ScalarStyle, Tag};

use crate::{
    composer::{ComposeError, Composer},
    schema::{ResolvedScalar, Schema},
};

/// A node of a composed YAML document.
///
/// Nodes keep the presentation they were read with (scalar and collection styles) so that they
/// can be emitted back similarly, but the presentation does not take part in equality.
///
/// # Examples
/// ```
/// use yamlstream::Node;
///
/// let doc = Node::load_from_str("fruits: [apple, &b banana]\nfavorite: *b").unwrap();
/// assert_eq!(doc.get("fruits").and_then(|f| f.get_index(0)).and_then(Node::as_str), Some("apple"));
/// // Aliases resolve to the anchored node.
/// assert_eq!(doc.get("favorite").and_then(Node::as_str), Some("banana"));
/// assert!(doc.get("favorite").is_some_and(Node::is_alias));
/// ```
#[derive(Clone, PartialEq, Debug, Eq)]
pub enum Node {
    /// A scalar, with its value left unresolved (`12` is the string `"12"`).
    Scalar(Scalar),
    /// A sequence of nodes.
    Sequence(Sequence),
    /// An ordered list of key/value pairs.
    Mapping(Mapping),
    /// A reference to a node anchored earlier in the document.
    Alias(Alias),
}

/// A scalar node.
#[derive(Clone, Debug, Eq)]
pub struct Scalar {
    /// The value, with escapes resolved.
    pub value: String,
    /// The style the scalar was written with. Only a hint for emitting.
    pub style: ScalarStyle,
    /// The anchor of the scalar, if any.
    pub anchor: Option<String>,
    /// The tag of the scalar, if any.
    pub tag: Option<Tag>,
}

/// A sequence node.
#[derive(Clone, Debug, Eq, Default)]
pub struct Sequence {
    /// The entries of the sequence.
    pub items: Vec<Node>,
    /// Whether the sequence was written in block or in flow style. Only a hint for emitting.
    pub style: CollectionStyle,
    /// The anchor of the sequence, if any.
    pub anchor: Option<String>,
    /// The tag of the sequence, if any.
    pub tag: Option<Tag>,
}

/// A mapping node.
///
/// Entries are kept in document order. Keys may be any node and are not checked for unicity.
#[derive(Clone, Debug, Eq, Default)]
pub struct Mapping {
    /// The key/value pairs of the mapping.
    pub entries: Vec<(Node, Node)>,
    /// Whether the mapping was written in block or in flow style. Only a hint for emitting.
    pub style: CollectionStyle,
    /// The anchor of the mapping, if any.
    pub anchor: Option<String>,
    /// The tag of the mapping, if any.
    pub tag: Option<Tag>,
}

/// An alias node.
///
/// The target is shared between every alias referring to the same anchor.
#[derive(Clone, PartialEq, Debug, Eq)]
pub struct Alias {
    /// The name of the anchor.
    pub anchor: String,
    /// The node the anchor was bound to.
    pub target: Rc<Node>,
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.anchor == other.anchor && self.tag == other.tag
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items && self.anchor == other.anchor && self.tag == other.tag
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries && self.anchor == other.anchor && self.tag == other.tag
    }
}

impl Drop for Node {
    /// Drop the nodes below `self` one at a time, so that deep trees do not exhaust the stack.
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.take_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.take_children(&mut pending);
        }
    }
}

impl Scalar {
    /// Create an untagged, unanchored scalar whose style the emitter will choose.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            style: ScalarStyle::Any,
            anchor: None,
            tag: None,
        }
    }
}

impl Sequence {
    /// Create an untagged, unanchored sequence.
    #[must_use]
    pub fn new(items: Vec<Node>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }
}

impl Mapping {
    /// Create an untagged, unanchored mapping.
    #[must_use]
    pub fn new(entries: Vec<(Node, Node)>) -> Self {
        Self {
            entries,
            ..Default::default()
        }
    }

    /// Return the value of the first entry whose key is the scalar `key`.
    ///
    /// Aliased keys are followed.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }
}

impl Node {
    /// Load the first document of `source`.
    ///
    /// # Errors
    /// Returns a [`ComposeError`] if `source` is not valid YAML or contains no document.
    pub fn load_from_str(source: &str) -> Result<Node, ComposeError> {
        first_document(Self::load_all_from_str(source)?)
    }

    /// Load every document of `source`.
    ///
    /// ```
    /// use yamlstream::Node;
    ///
    /// let docs = Node::load_all_from_str("first\n---\n- second").unwrap();
    /// assert_eq!(docs.len(), 2);
    /// assert_eq!(docs[0].as_str(), Some("first"));
    /// assert_eq!(docs[1].as_sequence().map(<[Node]>::len), Some(1));
    /// ```
    ///
    /// # Errors
    /// Returns a [`ComposeError`] if `source` is not valid YAML. An error in a latter document
    /// prevents the former from being returned.
    pub fn load_all_from_str(source: &str) -> Result<Vec<Node>, ComposeError> {
        Self::load_all_from_parser(&mut Parser::new_from_str(source))
    }

    /// Load every document read from `reader`.
    ///
    /// # Errors
    /// Returns a [`ComposeError`] if reading fails or if the input is not valid YAML.
    pub fn load_all_from_reader<R: Read>(reader: R) -> Result<Vec<Node>, ComposeError> {
        Self::load_all_from_parser(&mut Parser::new_from_reader(reader))
    }

    /// Load the remaining documents of `parser`.
    ///
    /// # Errors
    /// Returns a [`ComposeError`] if the parser fails.
    pub fn load_all_from_parser<T: Input>(
        parser: &mut Parser<T>,
    ) -> Result<Vec<Node>, ComposeError> {
        let mut composer = Composer::new();
        // A failing composer terminates the load, it does not make it fail.
        parser.load(&mut composer)?;
        composer.into_documents()
    }

    /// Return the anchor of the node. Aliases have none.
    #[must_use]
    pub fn anchor(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar { anchor, .. })
            | Node::Sequence(Sequence { anchor, .. })
            | Node::Mapping(Mapping { anchor, .. }) => anchor.as_deref(),
            Node::Alias(_) => None,
        }
    }

    /// Return the tag of the node. Aliases have none.
    #[must_use]
    pub fn tag(&self) -> Option<&Tag> {
        match self {
            Node::Scalar(Scalar { tag, .. })
            | Node::Sequence(Sequence { tag, .. })
            | Node::Mapping(Mapping { tag, .. }) => tag.as_ref(),
            Node::Alias(_) => None,
        }
    }

    /// Follow aliases until a scalar or a collection is reached.
    #[must_use]
    pub fn resolve(&self) -> &Node {
        let mut node = self;
        while let Node::Alias(alias) = node {
            node = &alias.target;
        }
        node
    }

    /// Return the value of the node if it is a scalar or an alias to one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self.resolve() {
            Node::Scalar(scalar) => Some(&scalar.value),
            _ => None,
        }
    }

    /// Resolve the value of a scalar, or of an alias to one, with `schema`.
    ///
    /// Returns `None` for collections, and for scalars whose tag names a type their value does
    /// not have (`!!int abc`). Scalars built with [`Node::from`] have no style and resolve to
    /// strings.
    #[must_use]
    pub fn resolve_scalar(&self, schema: Schema) -> Option<ResolvedScalar<'_>> {
        match self.resolve() {
            Node::Scalar(scalar) => schema.resolve(&scalar.value, scalar.style, scalar.tag.as_ref()),
            _ => None,
        }
    }

    /// Return whether the node is a null scalar in the core schema (`~`, `null`, empty).
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self.resolve_scalar(Schema::Core), Some(ResolvedScalar::Null))
    }

    /// Return the value of the node if it is a boolean in the core schema.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.resolve_scalar(Schema::Core)? {
            ResolvedScalar::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// Return the value of the node if it is an integer in the core schema.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self.resolve_scalar(Schema::Core)? {
            ResolvedScalar::Integer(i) => Some(i),
            _ => None,
        }
    }

    /// Return the value of the node if it is a number in the core schema.
    ///
    /// Integers are converted.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self.resolve_scalar(Schema::Core)? {
            ResolvedScalar::FloatingPoint(f) => Some(f),
            ResolvedScalar::Integer(i) => Some(i as f64),
            _ => None,
        }
    }

    /// Return the entries of the node if it is a sequence or an alias to one.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self.resolve() {
            Node::Sequence(sequence) => Some(&sequence.items),
            _ => None,
        }
    }

    /// Return the node as a mapping if it is a mapping or an alias to one.
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self.resolve() {
            Node::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }

    /// Return the value of the node in the mapping for the scalar `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|mapping| mapping.get(key))
    }

    /// Return the entry at `index` if the node is a sequence.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Node> {
        self.as_sequence().and_then(|items| items.get(index))
    }

    /// Return whether the node is a scalar.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Node::Scalar(_))
    }

    /// Return whether the node is a sequence.
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        matches!(self, Node::Sequence(_))
    }

    /// Return whether the node is a mapping.
    #[must_use]
    pub fn is_mapping(&self) -> bool {
        matches!(self, Node::Mapping(_))
    }

    /// Return whether the node is an alias.
    #[must_use]
    pub fn is_alias(&self) -> bool {
        matches!(self, Node::Alias(_))
    }

    /// Return whether the node is a plain empty scalar, the way an omitted node is read.
    #[must_use]
    pub fn is_empty_scalar(&self) -> bool {
        matches!(self, Node::Scalar(s) if s.value.is_empty() && s.style == ScalarStyle::Plain)
    }

    /// Move the children of the node into `out`.
    ///
    /// The target of an alias is only taken when the alias holds its last reference.
    fn take_children(&mut self, out: &mut Vec<Node>) {
        match self {
            Node::Scalar(_) => {}
            Node::Sequence(sequence) => out.append(&mut sequence.items),
            Node::Mapping(mapping) => {
                for (key, value) in mapping.entries.drain(..) {
                    out.push(key);
                    out.push(value);
                }
            }
            Node::Alias(alias) => {
                if let Some(target) = Rc::get_mut(&mut alias.target) {
                    target.take_children(out);
                }
            }
        }
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Scalar(Scalar::new(value))
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Scalar(Scalar::new(value))
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Sequence(Sequence::new(items))
    }
}

impl From<Vec<(Node, Node)>> for Node {
    fn from(entries: Vec<(Node, Node)>) -> Self {
        Node::Mapping(Mapping::new(entries))
    }
}

/// Return the first document, failing if there is none.
fn first_document(documents: Vec<Node>) -> Result<Node, ComposeError> {
    documents
        .into_iter()
        .next()
        .ok_or_else(ComposeError::no_document)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_style_is_not_compared() {
        let mut a = Scalar::new("x");
        let b = Scalar::new("x");
        a.style = ScalarStyle::DoubleQuoted;
        assert_eq!(a, b);
        let mut seq = Sequence::new(vec!["x".into()]);
        seq.style = CollectionStyle::Flow;
        assert_eq!(Node::Sequence(seq), Node::from(vec![Node::from("x")]));
        a.tag = Some(Tag::parse("!!str"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_accessors() {
        let doc = Node::load_from_str("a: [1, {b: c}]\n? [k]\n: v").unwrap();
        assert_eq!(
            doc.get("a")
                .and_then(|a| a.get_index(1))
                .and_then(|m| m.get("b"))
                .and_then(Node::as_str),
            Some("c")
        );
        assert_eq!(doc.get("missing"), None);
        assert_eq!(doc.get_index(0), None);
        assert_eq!(doc.as_mapping().map(|m| m.entries.len()), Some(2));
        assert!(doc.as_mapping().unwrap().entries[1].0.is_sequence());
    }

    #[test]
    fn test_typed_accessors() {
        let doc = Node::load_from_str(
            "n: ~\ne:\nb: True\ni: 0x10\nf: 1.5e1\nq: '12'\nt: !!int '7'\nbad: !!int x\nd: &ref no\nr: *ref",
        )
        .unwrap();
        let get = |key| doc.get(key).unwrap();
        assert!(get("n").is_null());
        assert!(get("e").is_null());
        assert!(!get("q").is_null());
        assert_eq!(get("b").as_bool(), Some(true));
        assert_eq!(get("i").as_i64(), Some(16));
        assert_eq!(get("i").as_f64(), Some(16.0));
        assert_eq!(get("f").as_f64(), Some(15.0));
        assert_eq!(get("f").as_i64(), None);
        assert_eq!(get("q").as_i64(), None);
        assert_eq!(get("t").as_i64(), Some(7));
        assert_eq!(get("bad").resolve_scalar(Schema::Core), None);
        assert_eq!(get("r").as_bool(), None);
        assert_eq!(
            get("r").resolve_scalar(Schema::Yaml11),
            Some(ResolvedScalar::Boolean(false))
        );
        assert_eq!(doc.resolve_scalar(Schema::Core), None);
        assert_eq!(Node::from("12").as_i64(), None);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(Node::load_all_from_str("# nothing").unwrap(), vec![]);
        assert!(matches!(
            Node::load_from_str(""),
            Err(ComposeError::Structure(_))
        ));
        assert!(matches!(
            Node::load_from_str("[a"),
            Err(ComposeError::Parse(_))
        ));
    }

    #[test]
    fn test_drop_deep_trees() {
        let mut node = Node::from("leaf");
        for i in 0..100_000 {
            node = if i % 2 == 0 {
                Node::from(vec![node])
            } else {
                Node::from(vec![(Node::from("k"), node)])
            };
        }
        let shared = Rc::new(node);
        let alias = Node::Alias(Alias {
            anchor: "deep".into(),
            target: Rc::clone(&shared),
        });
        drop(shared);
        // The alias holds the last reference to the tree.
        drop(Node::from(vec![alias]));
    }

    #[test]
    fn test_empty_scalar() {
        let doc = Node::load_from_str("a:\nb: ''").unwrap();
        assert!(doc.get("a").is_some_and(Node::is_empty_scalar));
        assert!(!doc.get("b").is_some_and(Node::is_empty_scalar));
    }
}
