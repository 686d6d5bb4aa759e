use crate::ast::{Ast, CharAtom, CharClass, Node, NodeId};
use std::collections::BTreeSet;
use thiserror::Error;

/// A syntax error in a pattern. Every variant carries the byte offset at which
/// the problem was found.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of pattern at {position}: expected {expected}")]
    UnexpectedEnd {
        position: usize,
        expected: &'static str,
    },
    #[error("expected {expected} at {position}, found '{found}'")]
    UnexpectedChar {
        position: usize,
        expected: &'static str,
        found: char,
    },
    #[error("missing operand before '{operator}' at {position}")]
    MissingOperand { position: usize, operator: char },
    #[error("invalid repetition bounds {{{min},{max}}} at {position}")]
    InvalidBounds { position: usize, min: u32, max: u32 },
    /// Also raised when nested repetitions together copy their innermost operand
    /// more than `limit` times; `count` is then the product of the nested counts.
    #[error("repetition count {count} at {position} exceeds the limit of {limit}")]
    RepetitionTooLarge {
        position: usize,
        count: u64,
        limit: u32,
    },
}

impl ParseError {
    pub fn position(&self) -> usize {
        match self {
            ParseError::UnexpectedEnd { position, .. }
            | ParseError::UnexpectedChar { position, .. }
            | ParseError::MissingOperand { position, .. }
            | ParseError::InvalidBounds { position, .. }
            | ParseError::RepetitionTooLarge { position, .. } => *position,
        }
    }
}

/// What sits under the cursor, with escapes already decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token {
    End,
    Byte(u8),
    Escaped(u8),
    Class(CharClass),
    /// A backslash as the very last byte.
    DanglingEscape,
}

impl Token {
    fn width(self) -> usize {
        match self {
            Token::End => 0,
            Token::Byte(_) | Token::DanglingEscape => 1,
            Token::Escaped(_) | Token::Class(_) => 2,
        }
    }
}

pub(crate) struct RegexParser<'a> {
    input: &'a [u8],
    pos: usize,
    nodes: Vec<Node>,
    /// Per node, how many copies of its most repeated operand the NFA builder will make.
    copies: Vec<u64>,
    max_repetition: u32,
}

impl<'a> RegexParser<'a> {
    pub(crate) fn new(input: &'a [u8], max_repetition: u32) -> Self {
        Self {
            input,
            pos: 0,
            nodes: Vec::new(),
            copies: Vec::new(),
            max_repetition,
        }
    }

    pub(crate) fn parse(mut self) -> Result<Ast, ParseError> {
        let root = self.parse_expr()?;
        match self.peek() {
            Token::End => Ok(Ast::new(self.nodes, root)),
            // a ')' without an opening parenthesis
            _ => Err(self.missing_operand()),
        }
    }

    fn peek(&self) -> Token {
        let Some(&c1) = self.input.get(self.pos) else {
            return Token::End;
        };
        if c1 != b'\\' {
            return Token::Byte(c1);
        }
        match self.input.get(self.pos + 1) {
            None => Token::DanglingEscape,
            Some(b'd') => Token::Class(CharClass::Digit),
            Some(b'a') => Token::Class(CharClass::Alphanumeric),
            Some(b'w') => Token::Class(CharClass::Alphabetic),
            Some(&c2) => Token::Escaped(c2),
        }
    }

    fn advance(&mut self) {
        self.pos += self.peek().width();
    }

    fn push(&mut self, node: Node) -> NodeId {
        let copies = match &node {
            Node::ValRep(c, n) => self.copies[*c].saturating_mul(u64::from((*n).max(1))),
            Node::BoundedRep(c, _, max) => self.copies[*c].saturating_mul(u64::from(*max)),
            other => other
                .operands()
                .into_iter()
                .map(|c| self.copies[c])
                .max()
                .unwrap_or(1),
        };
        self.copies.push(copies);
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn found(&self) -> char {
        self.input[self.pos] as char
    }

    fn missing_operand(&self) -> ParseError {
        ParseError::MissingOperand {
            position: self.pos,
            operator: self.found(),
        }
    }

    fn expect(&mut self, byte: u8, expected: &'static str) -> Result<(), ParseError> {
        match self.peek() {
            Token::Byte(b) if b == byte => {
                self.advance();
                Ok(())
            }
            Token::End => Err(ParseError::UnexpectedEnd {
                position: self.pos,
                expected,
            }),
            _ => Err(ParseError::UnexpectedChar {
                position: self.pos,
                expected,
                found: self.found(),
            }),
        }
    }

    fn is_at_branch_end(&self) -> bool {
        matches!(self.peek(), Token::End | Token::Byte(b'|') | Token::Byte(b')'))
    }

    /// `expr := branch ('|' expr)?`
    fn parse_expr(&mut self) -> Result<NodeId, ParseError> {
        let first = self.parse_branch()?;
        let mut rest = Vec::new();
        while self.peek() == Token::Byte(b'|') {
            self.advance();
            rest.push(self.parse_branch()?);
        }
        Ok(self.fold_right(first, rest, Node::Pipe))
    }

    /// `branch := postfix branch?`
    fn parse_branch(&mut self) -> Result<NodeId, ParseError> {
        let first = self.parse_postfix()?;
        let mut rest = Vec::new();
        while !self.is_at_branch_end() {
            rest.push(self.parse_postfix()?);
        }
        Ok(self.fold_right(first, rest, Node::Concat))
    }

    // a b c => a (b c)
    fn fold_right(
        &mut self,
        first: NodeId,
        rest: Vec<NodeId>,
        build: fn(NodeId, NodeId) -> Node,
    ) -> NodeId {
        let mut operands = rest.into_iter().rev();
        let Some(last) = operands.next() else {
            return first;
        };
        operands
            .chain([first])
            .fold(last, |right, left| self.push(build(left, right)))
    }

    /// `postfix := atom ('+' | '?' | '*' | '{' n '}' | '{' n ',' m '}')*`
    fn parse_postfix(&mut self) -> Result<NodeId, ParseError> {
        let mut node = self.parse_atom()?;
        loop {
            node = match self.peek() {
                Token::Byte(b'+') => {
                    self.advance();
                    self.push(Node::PlusRep(node))
                }
                Token::Byte(b'?') => {
                    self.advance();
                    self.push(Node::OptRep(node))
                }
                Token::Byte(b'*') => {
                    self.advance();
                    self.push(Node::StarRep(node))
                }
                Token::Byte(b'{') => {
                    let rep = self.parse_repetition(node)?;
                    self.push(rep)
                }
                _ => return Ok(node),
            }
        }
    }

    fn parse_repetition(&mut self, child: NodeId) -> Result<Node, ParseError> {
        let start = self.pos;
        self.expect(b'{', "'{'")?;
        let min = self.parse_number()?;
        if self.peek() != Token::Byte(b',') {
            self.expect(b'}', "',' or '}'")?;
            self.check_nested(child, min.max(1), start)?;
            return Ok(Node::ValRep(child, min));
        }
        self.advance();
        let max = self.parse_number()?;
        self.expect(b'}', "'}'")?;
        if min > max || max == 0 {
            return Err(ParseError::InvalidBounds {
                position: start,
                min,
                max,
            });
        }
        self.check_nested(child, max, start)?;
        Ok(Node::BoundedRep(child, min, max))
    }

    // repetitions inside repetitions multiply the number of copies
    fn check_nested(&self, child: NodeId, count: u32, position: usize) -> Result<(), ParseError> {
        let total = self.copies[child].saturating_mul(u64::from(count));
        if total > u64::from(self.max_repetition) {
            return Err(ParseError::RepetitionTooLarge {
                position,
                count: total,
                limit: self.max_repetition,
            });
        }
        Ok(())
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Token::Byte(b' ') {
            self.advance();
        }
    }

    fn parse_number(&mut self) -> Result<u32, ParseError> {
        self.skip_spaces();
        let start = self.pos;
        let mut value: u64 = 0;
        while let Token::Byte(b @ b'0'..=b'9') = self.peek() {
            value = value.saturating_mul(10).saturating_add(u64::from(b - b'0'));
            self.advance();
        }
        if self.pos == start {
            return match self.peek() {
                Token::End => Err(ParseError::UnexpectedEnd {
                    position: self.pos,
                    expected: "a number",
                }),
                _ => Err(ParseError::UnexpectedChar {
                    position: self.pos,
                    expected: "a number",
                    found: self.found(),
                }),
            };
        }
        if value > u64::from(self.max_repetition) {
            return Err(ParseError::RepetitionTooLarge {
                position: start,
                count: value,
                limit: self.max_repetition,
            });
        }
        self.skip_spaces();
        // fits: bounded by max_repetition
        Ok(value as u32)
    }

    fn parse_set(&mut self) -> Result<BTreeSet<u8>, ParseError> {
        let mut set = BTreeSet::new();
        while let Some(&b) = self.input.get(self.pos) {
            if b == b']' {
                self.pos += 1;
                return Ok(set);
            }
            set.insert(b);
            self.pos += 1;
        }
        Err(ParseError::UnexpectedEnd {
            position: self.pos,
            expected: "']'",
        })
    }

    /// `atom := '(' expr ')' | '[' set ']' | '[^' set ']' | char`
    fn parse_atom(&mut self) -> Result<NodeId, ParseError> {
        let node = match self.peek() {
            Token::End => {
                return Err(ParseError::UnexpectedEnd {
                    position: self.pos,
                    expected: "an operand",
                })
            }
            Token::DanglingEscape => {
                return Err(ParseError::UnexpectedEnd {
                    position: self.pos + 1,
                    expected: "a character after '\\'",
                })
            }
            Token::Byte(b'(') => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(b')', "')'")?;
                return Ok(inner);
            }
            Token::Byte(b'[') => {
                self.advance();
                let node = if self.peek() == Token::Byte(b'^') {
                    self.advance();
                    Node::CharExcl(self.parse_set()?)
                } else {
                    Node::CharSelect(self.parse_set()?)
                };
                // the closing ']' is already consumed
                return Ok(self.push(node));
            }
            Token::Byte(b'+' | b'?' | b'*' | b'{' | b'|' | b')') => {
                return Err(self.missing_operand())
            }
            Token::Byte(b']' | b'}' | b',') => {
                return Err(ParseError::UnexpectedChar {
                    position: self.pos,
                    expected: "an operand",
                    found: self.found(),
                })
            }
            Token::Byte(b) => Node::Char(CharAtom::Byte(b)),
            Token::Escaped(b) => Node::Char(CharAtom::Escaped(b)),
            Token::Class(c) => Node::Char(CharAtom::Class(c)),
        };
        self.advance();
        Ok(self.push(node))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{CharAtom::*, CharClass, Node};
    use crate::{parse_regex, ParseError};
    use pretty_assertions::assert_eq;

    fn root(pattern: &str) -> Node {
        parse_regex(pattern).unwrap().root_node().clone()
    }

    #[test]
    fn test_atoms() {
        assert_eq!(root("a"), Node::Char(Byte(b'a')));
        assert_eq!(root("."), Node::Char(Byte(b'.')));
        assert_eq!(root("\\("), Node::Char(Escaped(b'(')));
        assert_eq!(root("\\."), Node::Char(Escaped(b'.')));
        assert_eq!(root("\\d"), Node::Char(Class(CharClass::Digit)));
        assert_eq!(root("\\a"), Node::Char(Class(CharClass::Alphanumeric)));
        assert_eq!(root("\\w"), Node::Char(Class(CharClass::Alphabetic)));
        assert_eq!(root("[cab]"), Node::CharSelect([b'a', b'b', b'c'].into()));
        assert_eq!(root("[^ab]"), Node::CharExcl([b'a', b'b'].into()));
        assert_eq!(root("[]"), Node::CharSelect([].into()));
        assert_eq!(root("[^]"), Node::CharExcl([].into()));
        assert_eq!(root("[\\]"), Node::CharSelect([b'\\'].into()));
        assert_eq!(root("((a))"), Node::Char(Byte(b'a')));

        let ast = parse_regex("[ab]c").unwrap();
        let Node::Concat(l, r) = ast.root_node() else {
            panic!("expected concat at the root");
        };
        assert_eq!(ast.node(*l), &Node::CharSelect([b'a', b'b'].into()));
        assert_eq!(ast.node(*r), &Node::Char(Byte(b'c')));
    }

    #[test]
    fn test_operators() {
        let ast = parse_regex("a{ 2 , 3 }").unwrap();
        let Node::BoundedRep(child, 2, 3) = ast.root_node() else {
            panic!("expected bounded repetition, got {:?}", ast.root_node());
        };
        assert_eq!(ast.node(*child), &Node::Char(Byte(b'a')));

        assert!(matches!(root("a{4}"), Node::ValRep(_, 4)));
        assert!(matches!(root("a{0}"), Node::ValRep(_, 0)));
        assert!(matches!(root("a*"), Node::StarRep(_)));
        assert!(matches!(root("a+"), Node::PlusRep(_)));
        assert!(matches!(root("a?"), Node::OptRep(_)));
        assert!(matches!(root("ab"), Node::Concat(..)));
        assert!(matches!(root("a|b"), Node::Pipe(..)));
    }

    #[test]
    fn test_disambiguation() {
        // postfix operators chain outwards
        let ast = parse_regex("a+*").unwrap();
        let Node::StarRep(inner) = ast.root_node() else {
            panic!("expected star at the root");
        };
        assert!(matches!(ast.node(*inner), Node::PlusRep(_)));

        // concat and alternation are right-associated
        let ast = parse_regex("abc").unwrap();
        let Node::Concat(l, r) = ast.root_node() else {
            panic!("expected concat at the root");
        };
        assert_eq!(ast.node(*l), &Node::Char(Byte(b'a')));
        assert!(matches!(ast.node(*r), Node::Concat(..)));

        let ast = parse_regex("a|b|c").unwrap();
        let Node::Pipe(l, r) = ast.root_node() else {
            panic!("expected pipe at the root");
        };
        assert_eq!(ast.node(*l), &Node::Char(Byte(b'a')));
        assert!(matches!(ast.node(*r), Node::Pipe(..)));

        // postfix < concat < pipe
        assert_eq!(
            parse_regex("ab*|c").unwrap().to_string(),
            parse_regex("(a(b*))|c").unwrap().to_string()
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_regex("(ab").unwrap_err(),
            ParseError::UnexpectedEnd {
                position: 3,
                expected: "')'"
            }
        );
        assert_eq!(
            parse_regex("[ab").unwrap_err(),
            ParseError::UnexpectedEnd {
                position: 3,
                expected: "']'"
            }
        );
        assert_eq!(
            parse_regex("a{2").unwrap_err(),
            ParseError::UnexpectedEnd {
                position: 3,
                expected: "',' or '}'"
            }
        );
        assert_eq!(
            parse_regex("a{2,3x").unwrap_err(),
            ParseError::UnexpectedChar {
                position: 5,
                expected: "'}'",
                found: 'x'
            }
        );
        assert_eq!(
            parse_regex("a{}").unwrap_err(),
            ParseError::UnexpectedChar {
                position: 2,
                expected: "a number",
                found: '}'
            }
        );
        assert_eq!(
            parse_regex("*a").unwrap_err(),
            ParseError::MissingOperand {
                position: 0,
                operator: '*'
            }
        );
        assert_eq!(
            parse_regex("a|").unwrap_err(),
            ParseError::UnexpectedEnd {
                position: 2,
                expected: "an operand"
            }
        );
        assert_eq!(
            parse_regex("a)").unwrap_err(),
            ParseError::MissingOperand {
                position: 1,
                operator: ')'
            }
        );
        assert_eq!(
            parse_regex("()").unwrap_err(),
            ParseError::MissingOperand {
                position: 1,
                operator: ')'
            }
        );
        assert_eq!(
            parse_regex("a]").unwrap_err(),
            ParseError::UnexpectedChar {
                position: 1,
                expected: "an operand",
                found: ']'
            }
        );
        assert_eq!(
            parse_regex("a\\").unwrap_err(),
            ParseError::UnexpectedEnd {
                position: 2,
                expected: "a character after '\\'"
            }
        );
        assert_eq!(
            parse_regex("").unwrap_err(),
            ParseError::UnexpectedEnd {
                position: 0,
                expected: "an operand"
            }
        );
        assert_eq!(
            parse_regex("a{3,2}").unwrap_err(),
            ParseError::InvalidBounds {
                position: 1,
                min: 3,
                max: 2
            }
        );
        assert_eq!(
            parse_regex("a{0,0}").unwrap_err(),
            ParseError::InvalidBounds {
                position: 1,
                min: 0,
                max: 0
            }
        );
        assert!(matches!(
            parse_regex("a{99999999999999999999999}").unwrap_err(),
            ParseError::RepetitionTooLarge { position: 2, .. }
        ));
    }

    #[test]
    fn nested_repetitions_share_the_limit() {
        assert_eq!(
            parse_regex("((a{1000}){1000}){1000}").unwrap_err(),
            ParseError::RepetitionTooLarge {
                position: 10,
                count: 1_000_000,
                limit: 1000
            }
        );
        assert_eq!(
            parse_regex("(a{300}){2,300}").unwrap_err(),
            ParseError::RepetitionTooLarge {
                position: 8,
                count: 90_000,
                limit: 1000
            }
        );
        // `|`, concatenation and `*` do not multiply
        assert!(parse_regex("(a{10}|b{100}){10}").is_ok());
        assert!(parse_regex("a{1000}b{1000}").is_ok());
        assert!(parse_regex("((a{10})*){100}").is_ok());
        assert!(parse_regex("(a{0}){1000}").is_ok());
    }

    #[test]
    fn test_error_positions_are_reported() {
        let err = parse_regex("ab(c|d").unwrap_err();
        assert_eq!(err.position(), 6);
        assert_eq!(
            err.to_string(),
            "unexpected end of pattern at 6: expected ')'"
        );
    }
}
