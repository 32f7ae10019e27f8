//! XPath 1.0 subset: lexer and recursive-descent parser.

use crate::error::LocatorError;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare(CmpOp, Box<Expr>, Box<Expr>),
    Negate(Box<Expr>),
    Union(Box<Expr>, Box<Expr>),
    Path(LocationPath),
    /// `(expr)[pred]/steps`, or a bare primary expression
    Filter {
        primary: Box<Expr>,
        predicates: Vec<Expr>,
        steps: Vec<Step>,
    },
    Literal(String),
    Number(f64),
    Function(Function, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn descendant_or_self() -> Self {
        Self { axis: Axis::DescendantOrSelf, test: NodeTest::Node, predicates: Vec::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfAxis,
    Parent,
    Ancestor,
    AncestorOrSelf,
    Following,
    FollowingSibling,
    Preceding,
    PrecedingSibling,
    Attribute,
}

impl Axis {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "self" => Axis::SelfAxis,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "following" => Axis::Following,
            "following-sibling" => Axis::FollowingSibling,
            "preceding" => Axis::Preceding,
            "preceding-sibling" => Axis::PrecedingSibling,
            "attribute" => Axis::Attribute,
            _ => return None,
        })
    }

    /// Reverse axes number their positions nearest-first
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Parent
                | Axis::Ancestor
                | Axis::AncestorOrSelf
                | Axis::Preceding
                | Axis::PrecedingSibling
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// `*`
    Any,
    Name(String),
    Text,
    Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    NormalizeSpace,
    Contains,
    StartsWith,
    Concat,
    String,
    Name,
    LocalName,
    Count,
    Not,
    True,
    False,
    Position,
    Last,
    StringLength,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "normalize-space" => Function::NormalizeSpace,
            "contains" => Function::Contains,
            "starts-with" => Function::StartsWith,
            "concat" => Function::Concat,
            "string" => Function::String,
            "name" => Function::Name,
            "local-name" => Function::LocalName,
            "count" => Function::Count,
            "not" => Function::Not,
            "true" => Function::True,
            "false" => Function::False,
            "position" => Function::Position,
            "last" => Function::Last,
            "string-length" => Function::StringLength,
            _ => return None,
        })
    }

    fn accepts(self, argc: usize) -> bool {
        match self {
            Function::NormalizeSpace
            | Function::String
            | Function::Name
            | Function::LocalName
            | Function::StringLength => argc <= 1,
            Function::Contains | Function::StartsWith => argc == 2,
            Function::Concat => argc >= 2,
            Function::Count | Function::Not => argc == 1,
            Function::True | Function::False | Function::Position | Function::Last => argc == 0,
        }
    }
}

// ---- lexer --------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Pipe,
    Dot,
    DotDot,
    Star,
    ColonColon,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Minus,
    Literal(String),
    Number(f64),
    Name(String),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Literal(s) => format!("'{s}'"),
            Token::Number(n) => n.to_string(),
            Token::Name(n) => n.clone(),
            other => format!("{other:?}"),
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, LocatorError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        let next = chars.get(i + 1).map(|&(_, c)| c);
        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '/' if next == Some('/') => {
                i += 2;
                Token::DoubleSlash
            }
            '/' => {
                i += 1;
                Token::Slash
            }
            '[' => {
                i += 1;
                Token::LBracket
            }
            ']' => {
                i += 1;
                Token::RBracket
            }
            '(' => {
                i += 1;
                Token::LParen
            }
            ')' => {
                i += 1;
                Token::RParen
            }
            '@' => {
                i += 1;
                Token::At
            }
            ',' => {
                i += 1;
                Token::Comma
            }
            '|' => {
                i += 1;
                Token::Pipe
            }
            '*' => {
                i += 1;
                Token::Star
            }
            '-' => {
                i += 1;
                Token::Minus
            }
            '=' => {
                i += 1;
                Token::Eq
            }
            '!' if next == Some('=') => {
                i += 2;
                Token::Neq
            }
            '<' if next == Some('=') => {
                i += 2;
                Token::Le
            }
            '<' => {
                i += 1;
                Token::Lt
            }
            '>' if next == Some('=') => {
                i += 2;
                Token::Ge
            }
            '>' => {
                i += 1;
                Token::Gt
            }
            ':' if next == Some(':') => {
                i += 2;
                Token::ColonColon
            }
            '.' if next == Some('.') => {
                i += 2;
                Token::DotDot
            }
            '.' if !next.map(|n| n.is_ascii_digit()).unwrap_or(false) => {
                i += 1;
                Token::Dot
            }
            '\'' | '"' => {
                let quote = c;
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end].1 != quote {
                    end += 1;
                }
                if end >= chars.len() {
                    return Err(LocatorError::UnterminatedLiteral(offset));
                }
                let value: String = chars[start..end].iter().map(|&(_, c)| c).collect();
                i = end + 1;
                Token::Literal(value)
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().map(|&(_, c)| c).collect();
                let value = text.parse::<f64>().map_err(|_| LocatorError::UnexpectedToken {
                    token: text.clone(),
                    offset,
                })?;
                Token::Number(value)
            }
            c if is_name_start(c) => {
                let start = i;
                while i < chars.len() && is_name_char(chars[i].1) {
                    i += 1;
                }
                // a name may carry a namespace prefix, but never swallow `::`
                if i + 1 < chars.len()
                    && chars[i].1 == ':'
                    && chars[i + 1].1 != ':'
                    && is_name_start(chars[i + 1].1)
                {
                    i += 1;
                    while i < chars.len() && is_name_char(chars[i].1) {
                        i += 1;
                    }
                }
                // names never end with '-' or '.', those belong to the next token
                while i > start + 1 && matches!(chars[i - 1].1, '-' | '.') {
                    i -= 1;
                }
                Token::Name(chars[start..i].iter().map(|&(_, c)| c).collect())
            }
            other => {
                return Err(LocatorError::UnexpectedToken { token: other.to_string(), offset })
            }
        };
        tokens.push((token, offset));
    }
    Ok(tokens)
}

// ---- parser -------------------------------------------------------------

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    source_len: usize,
}

/// Parse an XPath expression
pub fn parse(input: &str) -> Result<Expr, LocatorError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(LocatorError::UnexpectedEnd("empty expression".to_string()));
    }
    let mut parser = Parser { tokens, pos: 0, source_len: input.len() };
    let expr = parser.parse_or()?;
    if let Some((token, offset)) = parser.tokens.get(parser.pos) {
        return Err(LocatorError::UnexpectedToken { token: token.describe(), offset: *offset });
    }
    Ok(expr)
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, expected: &str) -> LocatorError {
        match self.tokens.get(self.pos) {
            Some((token, offset)) => {
                LocatorError::UnexpectedToken { token: token.describe(), offset: *offset }
            }
            None => LocatorError::UnexpectedEnd(format!("expected {expected} at {}", self.source_len)),
        }
    }

    fn expect(&mut self, token: Token, expected: &str) -> Result<(), LocatorError> {
        if self.peek() == Some(&token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Name(n)) if n == keyword)
    }

    fn parse_or(&mut self) -> Result<Expr, LocatorError> {
        let mut left = self.parse_and()?;
        while self.at_keyword("or") {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, LocatorError> {
        let mut left = self.parse_equality()?;
        while self.at_keyword("and") {
            self.pos += 1;
            let right = self.parse_equality()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, LocatorError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CmpOp::Eq,
                Some(Token::Neq) => CmpOp::Neq,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_relational()?;
            left = Expr::Compare(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_relational(&mut self) -> Result<Expr, LocatorError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => CmpOp::Lt,
                Some(Token::Le) => CmpOp::Le,
                Some(Token::Gt) => CmpOp::Gt,
                Some(Token::Ge) => CmpOp::Ge,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Compare(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, LocatorError> {
        if self.peek() == Some(&Token::Minus) {
            self.pos += 1;
            return Ok(Expr::Negate(Box::new(self.parse_unary()?)));
        }
        self.parse_union()
    }

    fn parse_union(&mut self) -> Result<Expr, LocatorError> {
        let mut left = self.parse_path()?;
        while self.peek() == Some(&Token::Pipe) {
            self.pos += 1;
            let right = self.parse_path()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn starts_step(&self) -> bool {
        match self.peek() {
            Some(Token::Star | Token::At | Token::Dot | Token::DotDot) => true,
            Some(Token::Name(name)) => match self.peek_at(1) {
                Some(Token::LParen) => name == "text" || name == "node",
                _ => true,
            },
            _ => false,
        }
    }

    fn parse_path(&mut self) -> Result<Expr, LocatorError> {
        match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                let steps = if self.starts_step() { self.parse_relative_steps()? } else { Vec::new() };
                Ok(Expr::Path(LocationPath { absolute: true, steps }))
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                let mut steps = vec![Step::descendant_or_self()];
                steps.extend(self.parse_relative_steps()?);
                Ok(Expr::Path(LocationPath { absolute: true, steps }))
            }
            _ if self.starts_step() => {
                let steps = self.parse_relative_steps()?;
                Ok(Expr::Path(LocationPath { absolute: false, steps }))
            }
            _ => self.parse_filter(),
        }
    }

    fn parse_filter(&mut self) -> Result<Expr, LocatorError> {
        let primary = self.parse_primary()?;
        let predicates = self.parse_predicates()?;
        let mut steps = Vec::new();
        match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                steps = self.parse_relative_steps()?;
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                steps.push(Step::descendant_or_self());
                steps.extend(self.parse_relative_steps()?);
            }
            _ => {}
        }
        if predicates.is_empty() && steps.is_empty() {
            return Ok(primary);
        }
        Ok(Expr::Filter { primary: Box::new(primary), predicates, steps })
    }

    fn parse_primary(&mut self) -> Result<Expr, LocatorError> {
        match self.advance() {
            Some(Token::Literal(s)) => Ok(Expr::Literal(s)),
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Name(name)) if self.peek() == Some(&Token::LParen) => {
                self.pos += 1;
                let function =
                    Function::lookup(&name).ok_or_else(|| LocatorError::UnknownFunction(name.clone()))?;
                let mut args = Vec::new();
                if self.peek() != Some(&Token::RParen) {
                    args.push(self.parse_or()?);
                    while self.peek() == Some(&Token::Comma) {
                        self.pos += 1;
                        args.push(self.parse_or()?);
                    }
                }
                self.expect(Token::RParen, "')'")?;
                if !function.accepts(args.len()) {
                    return Err(LocatorError::Arity { name, got: args.len() });
                }
                Ok(Expr::Function(function, args))
            }
            Some(_) => {
                self.pos -= 1;
                Err(self.unexpected("expression"))
            }
            None => Err(self.unexpected("expression")),
        }
    }

    fn parse_relative_steps(&mut self) -> Result<Vec<Step>, LocatorError> {
        let mut steps = vec![self.parse_step()?];
        loop {
            match self.peek() {
                Some(Token::Slash) => {
                    self.pos += 1;
                    steps.push(self.parse_step()?);
                }
                Some(Token::DoubleSlash) => {
                    self.pos += 1;
                    steps.push(Step::descendant_or_self());
                    steps.push(self.parse_step()?);
                }
                _ => return Ok(steps),
            }
        }
    }

    fn parse_step(&mut self) -> Result<Step, LocatorError> {
        match self.peek() {
            Some(Token::Dot) => {
                self.pos += 1;
                return Ok(Step { axis: Axis::SelfAxis, test: NodeTest::Node, predicates: Vec::new() });
            }
            Some(Token::DotDot) => {
                self.pos += 1;
                return Ok(Step { axis: Axis::Parent, test: NodeTest::Node, predicates: Vec::new() });
            }
            _ => {}
        }

        let axis = if self.peek() == Some(&Token::At) {
            self.pos += 1;
            Axis::Attribute
        } else if let (Some(Token::Name(name)), Some(Token::ColonColon)) = (self.peek(), self.peek_at(1)) {
            let axis = Axis::from_name(name).ok_or_else(|| LocatorError::UnknownAxis(name.clone()))?;
            self.pos += 2;
            axis
        } else {
            Axis::Child
        };

        let test = match self.advance() {
            Some(Token::Star) => NodeTest::Any,
            Some(Token::Name(name)) if self.peek() == Some(&Token::LParen) => {
                let test = match name.as_str() {
                    "text" => NodeTest::Text,
                    "node" => NodeTest::Node,
                    _ => return Err(LocatorError::Unsupported(format!("node test {name}()"))),
                };
                self.pos += 1;
                self.expect(Token::RParen, "')'")?;
                test
            }
            Some(Token::Name(name)) => NodeTest::Name(name),
            Some(_) => {
                self.pos -= 1;
                return Err(self.unexpected("node test"));
            }
            None => return Err(self.unexpected("node test")),
        };

        let predicates = self.parse_predicates()?;
        Ok(Step { axis, test, predicates })
    }

    fn parse_predicates(&mut self) -> Result<Vec<Expr>, LocatorError> {
        let mut predicates = Vec::new();
        while self.peek() == Some(&Token::LBracket) {
            self.pos += 1;
            predicates.push(self.parse_or()?);
            self.expect(Token::RBracket, "']'")?;
        }
        Ok(predicates)
    }
}
