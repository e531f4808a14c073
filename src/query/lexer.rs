//! Tokenizer for path expressions

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Dot,
    DotDot,
    Star,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Literal(String),
    Number(f64),
    Name(String),
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, StoreError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '/' => {
                if next == Some('/') {
                    tokens.push(Token::DoubleSlash);
                    i += 2;
                } else {
                    tokens.push(Token::Slash);
                    i += 1;
                }
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '@' => {
                tokens.push(Token::At);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Eq);
                i += 1;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::NotEq);
                i += 2;
            }
            '<' => {
                if next == Some('=') {
                    tokens.push(Token::LtEq);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                if next == Some('=') {
                    tokens.push(Token::GtEq);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '\'' | '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == c)
                    .ok_or_else(|| {
                        StoreError::QueryFailure(format!("Unterminated string literal at {}", i))
                    })?;
                tokens.push(Token::Literal(chars[i + 1..i + 1 + end].iter().collect()));
                i += end + 2;
            }
            '.' if next.is_some_and(|n| n.is_ascii_digit()) => {
                let (number, len) = read_number(&chars[i..])?;
                tokens.push(Token::Number(number));
                i += len;
            }
            '.' => {
                if next == Some('.') {
                    tokens.push(Token::DotDot);
                    i += 2;
                } else {
                    tokens.push(Token::Dot);
                    i += 1;
                }
            }
            c if c.is_ascii_digit() => {
                let (number, len) = read_number(&chars[i..])?;
                tokens.push(Token::Number(number));
                i += len;
            }
            c if is_name_start(c) => {
                let len = chars[i..]
                    .iter()
                    .take_while(|&&ch| is_name_char(ch))
                    .count();
                tokens.push(Token::Name(chars[i..i + len].iter().collect()));
                i += len;
            }
            other => {
                return Err(StoreError::QueryFailure(format!(
                    "Unexpected character {:?} at {}",
                    other, i
                )));
            }
        }
    }

    Ok(tokens)
}

fn read_number(chars: &[char]) -> Result<(f64, usize), StoreError> {
    let len = chars
        .iter()
        .take_while(|ch| ch.is_ascii_digit() || **ch == '.')
        .count();
    let text: String = chars[..len].iter().collect();
    text.parse::<f64>()
        .map(|n| (n, len))
        .map_err(|_| StoreError::QueryFailure(format!("Invalid number: {}", text)))
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}
