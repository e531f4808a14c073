//! Recursive-descent parser for the supported XPath subset.

use crate::error::StoreError;
use crate::query::lexer::{tokenize, Token};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    Literal(String),
    Number(f64),
    Call(Function, Vec<Expr>),
    Path(PathExpr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Contains,
    StartsWith,
    Not,
    Count,
    Position,
    Last,
    String,
    StringLength,
    NormalizeSpace,
    True,
    False,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "contains" => Function::Contains,
            "starts-with" => Function::StartsWith,
            "not" => Function::Not,
            "count" => Function::Count,
            "position" => Function::Position,
            "last" => Function::Last,
            "string" => Function::String,
            "string-length" => Function::StringLength,
            "normalize-space" => Function::NormalizeSpace,
            "true" => Function::True,
            "false" => Function::False,
            _ => return None,
        })
    }

    /// Accepted argument counts (inclusive).
    fn arity(self) -> (usize, usize) {
        match self {
            Function::Contains | Function::StartsWith => (2, 2),
            Function::Not | Function::Count => (1, 1),
            Function::Position | Function::Last | Function::True | Function::False => (0, 0),
            Function::String | Function::StringLength | Function::NormalizeSpace => (0, 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    pub start: PathStart,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathStart {
    /// `/`: the document node
    Root,
    /// A relative path, evaluated from the context item
    Context,
    /// `collection('alias')` or `collection()` for the default collection
    Collection {
        name: Option<String>,
        predicates: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    DescendantOrSelf,
    Attribute,
    SelfNode,
    Parent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    Name(String),
    Any,
    Text,
    Node,
}

impl Step {
    fn descendant_or_self() -> Self {
        Step {
            axis: Axis::DescendantOrSelf,
            test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }
}

pub fn parse(input: &str) -> Result<Expr, StoreError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(StoreError::QueryFailure("Empty query expression".to_string()));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if let Some(token) = parser.peek() {
        return Err(StoreError::QueryFailure(format!(
            "Unexpected token {:?} at position {}",
            token, parser.pos
        )));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), StoreError> {
        match self.advance() {
            Some(ref token) if *token == expected => Ok(()),
            Some(token) => Err(StoreError::QueryFailure(format!(
                "Expected {:?}, found {:?}",
                expected, token
            ))),
            None => Err(StoreError::QueryFailure(format!(
                "Expected {:?}, found end of expression",
                expected
            ))),
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Name(name)) if name == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Expr, StoreError> {
        let mut left = self.parse_and()?;
        while self.eat_keyword("or") {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, StoreError> {
        let mut left = self.parse_comparison()?;
        while self.eat_keyword("and") {
            let right = self.parse_comparison()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, StoreError> {
        let mut left = self.parse_primary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CompareOp::Eq,
                Some(Token::NotEq) => CompareOp::NotEq,
                Some(Token::Lt) => CompareOp::Lt,
                Some(Token::LtEq) => CompareOp::LtEq,
                Some(Token::Gt) => CompareOp::Gt,
                Some(Token::GtEq) => CompareOp::GtEq,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_primary()?;
            left = Expr::Compare(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, StoreError> {
        match self.peek().cloned() {
            Some(Token::Literal(value)) => {
                self.pos += 1;
                Ok(Expr::Literal(value))
            }
            Some(Token::Number(value)) => {
                self.pos += 1;
                Ok(Expr::Number(value))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Name(name))
                if self.peek_at(1) == Some(&Token::LParen)
                    && !matches!(name.as_str(), "collection" | "text" | "node") =>
            {
                self.parse_call(&name)
            }
            Some(_) => Ok(Expr::Path(self.parse_path()?)),
            None => Err(StoreError::QueryFailure(
                "Unexpected end of expression".to_string(),
            )),
        }
    }

    fn parse_call(&mut self, name: &str) -> Result<Expr, StoreError> {
        let function = Function::lookup(name)
            .ok_or_else(|| StoreError::QueryFailure(format!("Unknown function: {}()", name)))?;
        self.pos += 1;
        self.expect(Token::LParen)?;

        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            args.push(self.parse_or()?);
            while self.peek() == Some(&Token::Comma) {
                self.pos += 1;
                args.push(self.parse_or()?);
            }
        }
        self.expect(Token::RParen)?;

        let (min, max) = function.arity();
        if args.len() < min || args.len() > max {
            return Err(StoreError::QueryFailure(format!(
                "{}() takes {} argument(s), got {}",
                name,
                if min == max {
                    min.to_string()
                } else {
                    format!("{} to {}", min, max)
                },
                args.len()
            )));
        }
        Ok(Expr::Call(function, args))
    }

    fn parse_path(&mut self) -> Result<PathExpr, StoreError> {
        let mut steps = Vec::new();
        let start = match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                if !self.at_step_start() {
                    return Ok(PathExpr {
                        start: PathStart::Root,
                        steps,
                    });
                }
                steps.push(self.parse_step()?);
                PathStart::Root
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                steps.push(Step::descendant_or_self());
                steps.push(self.parse_step()?);
                PathStart::Root
            }
            Some(Token::Name(name)) if name == "collection" => self.parse_collection()?,
            _ => {
                steps.push(self.parse_step()?);
                PathStart::Context
            }
        };

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
                _ => break,
            }
        }

        Ok(PathExpr { start, steps })
    }

    fn parse_collection(&mut self) -> Result<PathStart, StoreError> {
        self.pos += 1;
        self.expect(Token::LParen)?;
        let name = match self.peek().cloned() {
            Some(Token::Literal(name)) => {
                self.pos += 1;
                Some(name)
            }
            _ => None,
        };
        self.expect(Token::RParen)?;
        let predicates = self.parse_predicates()?;
        Ok(PathStart::Collection { name, predicates })
    }

    fn at_step_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Name(_) | Token::Star | Token::At | Token::Dot | Token::DotDot)
        )
    }

    fn parse_step(&mut self) -> Result<Step, StoreError> {
        let (axis, test) = match self.advance() {
            Some(Token::Dot) => (Axis::SelfNode, NodeTest::Node),
            Some(Token::DotDot) => (Axis::Parent, NodeTest::Node),
            Some(Token::Star) => (Axis::Child, NodeTest::Any),
            Some(Token::At) => match self.advance() {
                Some(Token::Name(name)) => (Axis::Attribute, NodeTest::Name(name)),
                Some(Token::Star) => (Axis::Attribute, NodeTest::Any),
                other => {
                    return Err(StoreError::QueryFailure(format!(
                        "Expected attribute name after '@', found {:?}",
                        other
                    )))
                }
            },
            Some(Token::Name(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    let test = match name.as_str() {
                        "text" => NodeTest::Text,
                        "node" => NodeTest::Node,
                        _ => {
                            return Err(StoreError::QueryFailure(format!(
                                "Function {}() cannot be used as a location step",
                                name
                            )))
                        }
                    };
                    self.pos += 1;
                    self.expect(Token::RParen)?;
                    (Axis::Child, test)
                } else {
                    (Axis::Child, NodeTest::Name(name))
                }
            }
            other => {
                return Err(StoreError::QueryFailure(format!(
                    "Expected location step, found {:?}",
                    other
                )))
            }
        };

        let predicates = self.parse_predicates()?;
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_predicates(&mut self) -> Result<Vec<Expr>, StoreError> {
        let mut predicates = Vec::new();
        while self.peek() == Some(&Token::LBracket) {
            self.pos += 1;
            predicates.push(self.parse_or()?);
            self.expect(Token::RBracket)?;
        }
        Ok(predicates)
    }
}

/// Collect every collection name referenced by `collection(...)`.
///
/// `None` entries stand for `collection()` without an argument.
pub fn collection_refs(expr: &Expr) -> Vec<Option<String>> {
    let mut refs = Vec::new();
    collect_refs(expr, &mut refs);
    refs
}

fn collect_refs(expr: &Expr, refs: &mut Vec<Option<String>>) {
    match expr {
        Expr::Or(a, b) | Expr::And(a, b) | Expr::Compare(_, a, b) => {
            collect_refs(a, refs);
            collect_refs(b, refs);
        }
        Expr::Call(_, args) => args.iter().for_each(|arg| collect_refs(arg, refs)),
        Expr::Path(path) => {
            if let PathStart::Collection { name, predicates } = &path.start {
                refs.push(name.clone());
                predicates.iter().for_each(|p| collect_refs(p, refs));
            }
            for step in &path.steps {
                step.predicates.iter().for_each(|p| collect_refs(p, refs));
            }
        }
        Expr::Literal(_) | Expr::Number(_) => {}
    }
}
