//! Runtime annotation mini-language.
//!
//! Grammar, lowest precedence first (whitespace is insignificant):
//!
//! ```text
//! annotation := alt
//! alt        := par ( '|' par )*
//! par        := seq ( '#' seq )*
//! seq        := group ( ';' group )*
//! group      := post+
//! post       := primary ( ('@' | '+') NUMBER )?
//! primary    := ID | 'skip' | '(' alt ')' | 'opt' '(' alt ')'
//!             | 'try' '(' alt ')' '?' post ':' post
//! ID         := ('G' | 'T') DIGITS ('.' DIGITS)*
//! ```
//!
//! `@n` repeats an element `n` times in sequence, `+n` runs `n` copies in
//! parallel. Juxtaposed elements (`G1.1G1.2`) form a group that implies no
//! ordering between its members. Parsing is pure; the facts the builder
//! consumes are extracted from the tree by [`crate::core::facts`].

use crate::core::error::ModelError;
use crate::core::facts::AnnotationFacts;
use crate::core::types::CardinalityKind;

/// Parsed annotation expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Id(String),
    Skip,
    Group(Vec<Expr>),
    Seq(Vec<Expr>),
    Par(Vec<Expr>),
    Alt(Vec<Expr>),
    Opt(Box<Expr>),
    Try {
        body: Box<Expr>,
        success: Box<Expr>,
        failure: Box<Expr>,
    },
    Card {
        body: Box<Expr>,
        kind: CardinalityKind,
        count: u32,
    },
}

/// Parse `text` (the annotation of element `el_id`) into its fact tables.
///
/// An empty or blank annotation yields empty tables; the structural
/// validator decides whether such an annotation is acceptable.
pub fn parse_annotation(el_id: &str, text: &str) -> Result<AnnotationFacts, ModelError> {
    if text.trim().is_empty() {
        return Ok(AnnotationFacts::default());
    }
    let expr = parse_expr(el_id, text)?;
    Ok(AnnotationFacts::from_expr(&expr))
}

/// Parse `text` into an expression tree.
pub fn parse_expr(el_id: &str, text: &str) -> Result<Expr, ModelError> {
    let tokens = tokenize(el_id, text)?;
    let mut parser = Parser {
        el_id,
        tokens,
        pos: 0,
        end: text.len(),
    };
    let expr = parser.alt()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(parser.error_at(token.offset, "unexpected trailing input")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Id(String),
    Number(u32),
    Skip,
    Opt,
    Try,
    LParen,
    RParen,
    Semi,
    Hash,
    Pipe,
    Question,
    Colon,
    At,
    Plus,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

fn tokenize(el_id: &str, text: &str) -> Result<Vec<Token>, ModelError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let start = pos;
        let byte = bytes[pos];
        let single = match byte {
            b'(' => Some(TokenKind::LParen),
            b')' => Some(TokenKind::RParen),
            b';' => Some(TokenKind::Semi),
            b'#' => Some(TokenKind::Hash),
            b'|' => Some(TokenKind::Pipe),
            b'?' => Some(TokenKind::Question),
            b':' => Some(TokenKind::Colon),
            b'@' => Some(TokenKind::At),
            b'+' => Some(TokenKind::Plus),
            _ => None,
        };
        if let Some(kind) = single {
            tokens.push(Token {
                kind,
                offset: start,
            });
            pos += 1;
            continue;
        }
        if byte.is_ascii_whitespace() {
            pos += 1;
            continue;
        }
        if byte == b'G' || byte == b'T' {
            pos += 1;
            let digits = take_digits(bytes, pos);
            if digits == pos {
                return Err(lex_error(el_id, start, "identifier needs digits after G/T"));
            }
            pos = digits;
            while pos < bytes.len() && bytes[pos] == b'.' {
                let after = take_digits(bytes, pos + 1);
                if after == pos + 1 {
                    return Err(lex_error(el_id, pos, "identifier component must be numeric"));
                }
                pos = after;
            }
            tokens.push(Token {
                kind: TokenKind::Id(text[start..pos].to_string()),
                offset: start,
            });
            continue;
        }
        if byte.is_ascii_digit() {
            pos = take_digits(bytes, pos);
            let value = text[start..pos]
                .parse::<u32>()
                .map_err(|_| lex_error(el_id, start, "number out of range"))?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                offset: start,
            });
            continue;
        }
        if byte.is_ascii_lowercase() {
            while pos < bytes.len() && bytes[pos].is_ascii_lowercase() {
                pos += 1;
            }
            let kind = match &text[start..pos] {
                "skip" => TokenKind::Skip,
                "opt" => TokenKind::Opt,
                "try" => TokenKind::Try,
                word => {
                    return Err(lex_error(el_id, start, &format!("unknown keyword '{word}'")));
                }
            };
            tokens.push(Token {
                kind,
                offset: start,
            });
            continue;
        }
        let ch = text[start..].chars().next().unwrap_or('?');
        return Err(lex_error(el_id, start, &format!("unexpected character '{ch}'")));
    }
    Ok(tokens)
}

fn take_digits(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    pos
}

fn lex_error(el_id: &str, offset: usize, reason: &str) -> ModelError {
    ModelError::Annotation {
        el_id: el_id.to_string(),
        offset,
        reason: reason.to_string(),
    }
}

struct Parser<'a> {
    el_id: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek().is_some_and(|token| &token.kind == kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ModelError> {
        match self.advance() {
            Some(token) if token.kind == kind => Ok(()),
            Some(token) => Err(self.error_at(token.offset, &format!("expected {what}"))),
            None => Err(self.error_at(self.end, &format!("expected {what}, found end of input"))),
        }
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |token| token.offset)
    }

    fn try_branch(&mut self) -> Result<Expr, ModelError> {
        let start = self.offset();
        let branch = self.post()?;
        match branch {
            Expr::Id(_) | Expr::Skip => Ok(branch),
            _ => Err(self.error_at(start, "try branches must be an identifier or 'skip'")),
        }
    }

    fn error_at(&self, offset: usize, reason: &str) -> ModelError {
        lex_error(self.el_id, offset, reason)
    }

    fn alt(&mut self) -> Result<Expr, ModelError> {
        let mut branches = vec![self.par()?];
        while self.at(&TokenKind::Pipe) {
            self.advance();
            branches.push(self.par()?);
        }
        Ok(collapse(branches, Expr::Alt))
    }

    fn par(&mut self) -> Result<Expr, ModelError> {
        let mut branches = vec![self.seq()?];
        while self.at(&TokenKind::Hash) {
            self.advance();
            branches.push(self.seq()?);
        }
        Ok(collapse(branches, Expr::Par))
    }

    fn seq(&mut self) -> Result<Expr, ModelError> {
        let mut steps = vec![self.group()?];
        while self.at(&TokenKind::Semi) {
            self.advance();
            steps.push(self.group()?);
        }
        Ok(collapse(steps, Expr::Seq))
    }

    fn group(&mut self) -> Result<Expr, ModelError> {
        let mut members = vec![self.post()?];
        while self.starts_primary() {
            members.push(self.post()?);
        }
        Ok(collapse(members, Expr::Group))
    }

    fn starts_primary(&self) -> bool {
        self.peek().is_some_and(|token| {
            matches!(
                token.kind,
                TokenKind::Id(_)
                    | TokenKind::Skip
                    | TokenKind::Opt
                    | TokenKind::Try
                    | TokenKind::LParen
            )
        })
    }

    fn post(&mut self) -> Result<Expr, ModelError> {
        let start = self.offset();
        let body = self.primary()?;
        let kind = if self.at(&TokenKind::At) {
            CardinalityKind::Seq
        } else if self.at(&TokenKind::Plus) {
            CardinalityKind::Par
        } else {
            return Ok(body);
        };
        self.advance();
        match self.advance() {
            Some(Token {
                kind: TokenKind::Number(count),
                offset,
            }) => {
                if count == 0 {
                    return Err(self.error_at(offset, "cardinality must be at least 1"));
                }
                if !matches!(body, Expr::Id(_)) {
                    return Err(self.error_at(start, "cardinality applies to a single identifier"));
                }
                Ok(Expr::Card {
                    body: Box::new(body),
                    kind,
                    count,
                })
            }
            Some(token) => Err(self.error_at(token.offset, "expected cardinality count")),
            None => Err(self.error_at(self.end, "expected cardinality count, found end of input")),
        }
    }

    fn primary(&mut self) -> Result<Expr, ModelError> {
        let Some(token) = self.advance() else {
            return Err(self.error_at(self.end, "unexpected end of input"));
        };
        match token.kind {
            TokenKind::Id(id) => Ok(Expr::Id(id)),
            TokenKind::Skip => Ok(Expr::Skip),
            TokenKind::LParen => {
                let inner = self.alt()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Opt => {
                self.expect(TokenKind::LParen, "'(' after opt")?;
                let inner = self.alt()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Expr::Opt(Box::new(inner)))
            }
            TokenKind::Try => {
                self.expect(TokenKind::LParen, "'(' after try")?;
                let body_start = self.offset();
                let body = self.alt()?;
                if !matches!(body, Expr::Id(_)) {
                    return Err(self.error_at(body_start, "try applies to a single identifier"));
                }
                self.expect(TokenKind::RParen, "')'")?;
                self.expect(TokenKind::Question, "'?' after try(...)")?;
                let success = self.try_branch()?;
                self.expect(TokenKind::Colon, "':' between try branches")?;
                let failure = self.try_branch()?;
                Ok(Expr::Try {
                    body: Box::new(body),
                    success: Box::new(success),
                    failure: Box::new(failure),
                })
            }
            _ => Err(self.error_at(token.offset, "expected identifier, 'skip', 'opt', 'try' or '('")),
        }
    }
}

fn collapse(mut items: Vec<Expr>, wrap: fn(Vec<Expr>) -> Expr) -> Expr {
    if items.len() == 1 {
        items.remove(0)
    } else {
        wrap(items)
    }
}
