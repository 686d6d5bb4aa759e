use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Index of a [`Node`] inside an [`Ast`].
pub type NodeId = usize;

/// The predefined classes reachable through `\d`, `\a` and `\w`.
#[derive(Hash, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CharClass {
    /// `\d`: `0-9`
    Digit,
    /// `\a`: `0-9`, `A-Z`, `a-z` and `_`
    Alphanumeric,
    /// `\w`: `A-Z` and `a-z`
    Alphabetic,
}

impl CharClass {
    pub fn contains(self, byte: u8) -> bool {
        match self {
            CharClass::Digit => byte.is_ascii_digit(),
            CharClass::Alphanumeric => byte.is_ascii_alphanumeric() || byte == b'_',
            CharClass::Alphabetic => byte.is_ascii_alphabetic(),
        }
    }

    /// All bytes in this class, in ascending order.
    pub fn bytes(self) -> impl Iterator<Item = u8> {
        (0..=u8::MAX).filter(move |&b| self.contains(b))
    }

    fn escape_letter(self) -> char {
        match self {
            CharClass::Digit => 'd',
            CharClass::Alphanumeric => 'a',
            CharClass::Alphabetic => 'w',
        }
    }
}

/// A single-character atom.
#[derive(Hash, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharAtom {
    /// An unescaped literal byte.
    Byte(u8),
    /// A literal byte written with a backslash. Never treated as syntax.
    Escaped(u8),
    Class(CharClass),
}

impl CharAtom {
    /// The literal byte this atom matches, with any escape stripped.
    pub fn literal(self) -> Option<u8> {
        match self {
            CharAtom::Byte(b) | CharAtom::Escaped(b) => Some(b),
            CharAtom::Class(_) => None,
        }
    }
}

#[derive(Hash, Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Pipe(NodeId, NodeId),
    Concat(NodeId, NodeId),
    StarRep(NodeId),
    OptRep(NodeId),
    PlusRep(NodeId),
    /// `{n}`
    ValRep(NodeId, u32),
    /// `{min,max}`
    BoundedRep(NodeId, u32, u32),
    /// `[...]`
    CharSelect(BTreeSet<u8>),
    /// `[^...]`
    CharExcl(BTreeSet<u8>),
    Char(CharAtom),
}

impl Node {
    /// The children of this node, left to right.
    pub fn operands(&self) -> Vec<NodeId> {
        match self {
            Node::Pipe(l, r) | Node::Concat(l, r) => vec![*l, *r],
            Node::StarRep(c)
            | Node::OptRep(c)
            | Node::PlusRep(c)
            | Node::ValRep(c, _)
            | Node::BoundedRep(c, _, _) => vec![*c],
            Node::CharSelect(_) | Node::CharExcl(_) | Node::Char(_) => vec![],
        }
    }

    fn is_postfix(&self) -> bool {
        matches!(
            self,
            Node::StarRep(_)
                | Node::OptRep(_)
                | Node::PlusRep(_)
                | Node::ValRep(..)
                | Node::BoundedRep(..)
        )
    }
}

/// A parsed pattern. Nodes live in an arena and refer to their operands by index;
/// operands are always pushed before the node that uses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Ast {
    pub(crate) fn new(nodes: Vec<Node>, root: NodeId) -> Self {
        debug_assert!(root < nodes.len());
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn root_node(&self) -> &Node {
        self.node(self.root)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Renders the tree back into pattern syntax, adding parentheses only where
    /// precedence requires them. Every byte is written as it was parsed.
    pub fn to_pattern_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.render_node(&mut out, self.root);
        out
    }

    fn render_operand(&self, out: &mut Vec<u8>, id: NodeId, grouped: bool) {
        if grouped {
            out.push(b'(');
            self.render_node(out, id);
            out.push(b')');
        } else {
            self.render_node(out, id);
        }
    }

    fn render_node(&self, out: &mut Vec<u8>, id: NodeId) {
        match self.node(id) {
            Node::Pipe(l, r) => {
                self.render_node(out, *l);
                out.push(b'|');
                self.render_node(out, *r);
            }
            Node::Concat(l, r) => {
                self.render_operand(out, *l, matches!(self.node(*l), Node::Pipe(..)));
                self.render_operand(out, *r, matches!(self.node(*r), Node::Pipe(..)));
            }
            postfix @ (Node::StarRep(c)
            | Node::OptRep(c)
            | Node::PlusRep(c)
            | Node::ValRep(c, _)
            | Node::BoundedRep(c, _, _)) => {
                let child = self.node(*c);
                let grouped = !(child.is_postfix() || child.operands().is_empty());
                self.render_operand(out, *c, grouped);
                match postfix {
                    Node::StarRep(_) => out.push(b'*'),
                    Node::OptRep(_) => out.push(b'?'),
                    Node::PlusRep(_) => out.push(b'+'),
                    Node::ValRep(_, n) => out.extend_from_slice(format!("{{{n}}}").as_bytes()),
                    Node::BoundedRep(_, min, max) => {
                        out.extend_from_slice(format!("{{{min},{max}}}").as_bytes())
                    }
                    _ => unreachable!(),
                }
            }
            Node::CharSelect(set) => {
                out.push(b'[');
                out.extend(set);
                out.push(b']');
            }
            Node::CharExcl(set) => {
                out.extend_from_slice(b"[^");
                out.extend(set);
                out.push(b']');
            }
            Node::Char(CharAtom::Byte(b)) => out.push(*b),
            Node::Char(CharAtom::Escaped(b)) => out.extend([b'\\', *b]),
            Node::Char(CharAtom::Class(c)) => {
                out.extend_from_slice(format!("\\{}", c.escape_letter()).as_bytes())
            }
        }
    }
}

/// Same as [`Ast::to_pattern_bytes`], read as UTF-8.
///
/// Bracket sets are written in byte order, so a multi-byte character inside
/// `[...]` has its bytes reordered and shows up as replacement characters.
/// Use [`Ast::to_pattern_bytes`] when the exact bytes matter.
impl Display for Ast {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.to_pattern_bytes()))
    }
}
