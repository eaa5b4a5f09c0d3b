//! A recursive descent parser for While, over a `logos` lexer.

use crate::syntax::{AExp, BExp, Stm};
use crate::Error;
use logos::Logos;
use std::fmt;

/// While tokens
#[derive(Logos, Clone, Copy, Debug, Eq, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"#[^\n]*")]
enum Token<'a> {
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("skip")]
    Skip,
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[token(":=")]
    Assign,
    #[token("<=")]
    Le,
    #[token("=")]
    Eq,
    #[token(";")]
    Semicolon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("&")]
    And,
    #[token("!")]
    Bang,

    /// Non-negative integer literal. A literal past `i64::MAX` is a lex error.
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Number(i64),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice())]
    Identifier(&'a str),

    // Never produced by the lexer, appended after the last token.
    End,
}

impl<'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match *self {
            Token::If => "if",
            Token::Then => "then",
            Token::Else => "else",
            Token::While => "while",
            Token::Do => "do",
            Token::Try => "try",
            Token::Catch => "catch",
            Token::Skip => "skip",
            Token::True => "true",
            Token::False => "false",
            Token::Assign => ":=",
            Token::Le => "<=",
            Token::Eq => "=",
            Token::Semicolon => ";",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::And => "&",
            Token::Bang => "!",
            Token::Number(n) => return write!(f, "number `{}`", n),
            Token::Identifier(name) => return write!(f, "identifier `{}`", name),
            Token::End => return write!(f, "end of input"),
        };
        write!(f, "`{}`", text)
    }
}

#[derive(Clone, Debug)]
struct Lexeme<'a> {
    token: Token<'a>,
    line: usize,
    column: usize,
}

/// Line and column, both from 1, of a byte offset into `source`.
fn position(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (line, before[line_start..].chars().count() + 1)
}

fn lex(source: &str) -> Result<Vec<Lexeme<'_>>, Error> {
    let mut lexemes = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(token) = lexer.next() {
        let (line, column) = position(source, lexer.span().start);
        match token {
            Ok(token) => lexemes.push(Lexeme {
                token,
                line,
                column,
            }),
            Err(()) => {
                let slice = lexer.slice();
                let message = if slice.bytes().all(|b| b.is_ascii_digit()) {
                    format!("number `{}` is out of range", slice)
                } else {
                    format!("unexpected character `{}`", slice)
                };
                return Err(Error::Parse {
                    line,
                    column,
                    message,
                });
            }
        }
    }

    let (line, column) = position(source, source.len());
    lexemes.push(Lexeme {
        token: Token::End,
        line,
        column,
    });
    Ok(lexemes)
}

struct Parser<'a> {
    lexemes: Vec<Lexeme<'a>>,
    position: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Token<'a> {
        self.lexemes[self.position].token
    }

    fn next(&mut self) -> Token<'a> {
        let token = self.peek();
        if token != Token::End {
            self.position += 1;
        }
        token
    }

    fn error<T, S: Into<String>>(&self, message: S) -> Result<T, Error> {
        let lexeme = &self.lexemes[self.position];
        Err(Error::Parse {
            line: lexeme.line,
            column: lexeme.column,
            message: message.into(),
        })
    }

    fn eat(&mut self, token: Token<'a>) -> bool {
        if self.peek() == token {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token<'a>) -> Result<(), Error> {
        if self.eat(token) {
            Ok(())
        } else {
            self.error(format!("expected {}, found {}", token, self.peek()))
        }
    }

    fn program(&mut self) -> Result<Stm, Error> {
        let mut stm = self.statement()?;
        while self.eat(Token::Semicolon) {
            stm = Stm::compound(stm, self.statement()?);
        }
        Ok(stm)
    }

    fn statement(&mut self) -> Result<Stm, Error> {
        match self.next() {
            Token::Identifier(variable) => {
                self.expect(Token::Assign)?;
                Ok(Stm::assign(variable, self.aexp()?))
            }
            Token::Skip => Ok(Stm::Skip),
            Token::If => {
                let guard = self.bexp()?;
                self.expect(Token::Then)?;
                let then = self.statement()?;
                self.expect(Token::Else)?;
                let else_ = self.statement()?;
                Ok(Stm::if_(guard, then, else_))
            }
            Token::While => {
                let guard = self.bexp()?;
                self.expect(Token::Do)?;
                Ok(Stm::while_(guard, self.statement()?))
            }
            Token::Try => {
                let body = self.statement()?;
                self.expect(Token::Catch)?;
                Ok(Stm::try_catch(body, self.statement()?))
            }
            Token::LParen => {
                let stm = self.program()?;
                self.expect(Token::RParen)?;
                Ok(stm)
            }
            Token::LBrace => {
                let stm = self.program()?;
                self.expect(Token::RBrace)?;
                Ok(stm)
            }
            token => {
                self.position -= usize::from(token != Token::End);
                self.error(format!("expected a statement, found {}", token))
            }
        }
    }

    fn aexp(&mut self) -> Result<AExp, Error> {
        let mut aexp = self.term()?;
        loop {
            if self.eat(Token::Plus) {
                aexp = AExp::add(aexp, self.term()?);
            } else if self.eat(Token::Minus) {
                aexp = AExp::sub(aexp, self.term()?);
            } else {
                return Ok(aexp);
            }
        }
    }

    fn term(&mut self) -> Result<AExp, Error> {
        let mut aexp = self.factor()?;
        loop {
            if self.eat(Token::Star) {
                aexp = AExp::mul(aexp, self.factor()?);
            } else if self.eat(Token::Slash) {
                aexp = AExp::div(aexp, self.factor()?);
            } else {
                return Ok(aexp);
            }
        }
    }

    fn factor(&mut self) -> Result<AExp, Error> {
        match self.next() {
            Token::Number(n) => Ok(AExp::num(n)),
            Token::Identifier(name) => Ok(AExp::var(name)),
            Token::Minus => match self.factor()? {
                AExp::Num(n) => Ok(AExp::num(-n)),
                aexp => Ok(AExp::sub(AExp::num(0), aexp)),
            },
            Token::LParen => {
                let aexp = self.aexp()?;
                self.expect(Token::RParen)?;
                Ok(aexp)
            }
            token => {
                self.position -= usize::from(token != Token::End);
                self.error(format!("expected an arithmetic expression, found {}", token))
            }
        }
    }

    fn bexp(&mut self) -> Result<BExp, Error> {
        let mut bexp = self.bunary()?;
        while self.eat(Token::And) {
            bexp = BExp::and(bexp, self.bunary()?);
        }
        Ok(bexp)
    }

    fn bunary(&mut self) -> Result<BExp, Error> {
        if self.eat(Token::True) {
            return Ok(BExp::True);
        }
        if self.eat(Token::False) {
            return Ok(BExp::False);
        }
        if self.eat(Token::Bang) {
            return Ok(BExp::not(self.bunary()?));
        }
        if self.peek() == Token::LParen {
            // Either a parenthesised boolean, or a comparison whose left
            // operand starts with a parenthesis.
            let start = self.position;
            self.position += 1;
            if let Ok(bexp) = self.bexp() {
                if self.eat(Token::RParen) {
                    return Ok(bexp);
                }
            }
            self.position = start;
        }
        let lhs = self.aexp()?;
        if self.eat(Token::Eq) {
            Ok(BExp::eq(lhs, self.aexp()?))
        } else if self.eat(Token::Le) {
            Ok(BExp::le(lhs, self.aexp()?))
        } else {
            self.error(format!("expected `=` or `<=`, found {}", self.peek()))
        }
    }
}

/// Parse the text of a While program.
pub fn parse(source: &str) -> Result<Stm, Error> {
    let mut parser = Parser {
        lexemes: lex(source)?,
        position: 0,
    };
    let program = parser.program()?;
    match parser.peek() {
        Token::End => Ok(program),
        token => parser.error(format!("expected `;` or end of input, found {}", token)),
    }
}

#[test]
fn lex_tokens() {
    let tokens: Vec<Token> = lex("iffy := if # comment\n  x_1<=-42 {}")
        .unwrap()
        .into_iter()
        .map(|lexeme| lexeme.token)
        .collect();
    assert_eq!(
        tokens,
        vec![
            Token::Identifier("iffy"),
            Token::Assign,
            Token::If,
            Token::Identifier("x_1"),
            Token::Le,
            Token::Minus,
            Token::Number(42),
            Token::LBrace,
            Token::RBrace,
            Token::End,
        ]
    );

    let lexemes = lex("a\n  bc d").unwrap();
    let positions: Vec<(usize, usize)> = lexemes.iter().map(|l| (l.line, l.column)).collect();
    assert_eq!(positions, vec![(1, 1), (2, 3), (2, 6), (2, 7)]);
}

#[test]
fn parse_statements() {
    let program = parse("x := 1; while x <= 10 do x := x + 1").unwrap();
    assert_eq!(
        program,
        Stm::compound(
            Stm::assign("x", AExp::num(1)),
            Stm::while_(
                BExp::le(AExp::var("x"), AExp::num(10)),
                Stm::assign("x", AExp::add(AExp::var("x"), AExp::num(1)))
            )
        )
    );
}

#[test]
fn parse_precedence() {
    let program = parse("y := 1 - 2 * -x / 3").unwrap();
    assert_eq!(
        program,
        Stm::assign(
            "y",
            AExp::sub(
                AExp::num(1),
                AExp::div(
                    AExp::mul(AExp::num(2), AExp::sub(AExp::num(0), AExp::var("x"))),
                    AExp::num(3)
                )
            )
        )
    );

    let program = parse("y := -1").unwrap();
    assert_eq!(program, Stm::assign("y", AExp::num(-1)));
}

#[test]
fn parse_guards() {
    let program = parse("if !(x = 0) & (x + 1) <= y then skip else skip").unwrap();
    assert_eq!(
        program,
        Stm::if_(
            BExp::and(
                BExp::not(BExp::eq(AExp::var("x"), AExp::num(0))),
                BExp::le(AExp::add(AExp::var("x"), AExp::num(1)), AExp::var("y"))
            ),
            Stm::Skip,
            Stm::Skip
        )
    );
}

#[test]
fn parse_try_with_braces() {
    let program = parse(
        "# nested handlers\n\
         try { try { x := 1/0 } catch { skip } } catch { skip }",
    )
    .unwrap();
    assert_eq!(
        program,
        Stm::try_catch(
            Stm::try_catch(
                Stm::assign("x", AExp::div(AExp::num(1), AExp::num(0))),
                Stm::Skip
            ),
            Stm::Skip
        )
    );
}

#[test]
fn parse_errors() {
    match parse("x := 1;\ny = 2") {
        Err(Error::Parse { line, column, .. }) => {
            assert_eq!(line, 2);
            assert_eq!(column, 3);
        }
        r => panic!("expected a parse error, got {:?}", r),
    }
    assert!(parse("x := 1 $ 2").is_err());
    assert!(parse("if x then skip else skip").is_err());
    assert!(parse("while true do").is_err());
    match parse("x := 99999999999999999999") {
        Err(Error::Parse { column, message, .. }) => {
            assert_eq!(column, 6);
            assert!(message.contains("out of range"));
        }
        r => panic!("expected a parse error, got {:?}", r),
    }
}
