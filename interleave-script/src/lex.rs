// The bump/peek cursor is modeled on Cursor in rustc_lexer.

use std::iter::FusedIterator;
use std::str::Chars;

use unicode_ident::{is_xid_continue, is_xid_start};

use crate::error::SyntaxError;
use crate::number::hex_value;
use crate::token::{Keyword, Punct, Token, TokenKind};

const EOF_CHAR: char = '\0';

/// Lexer for snippet source.
///
/// # Grammar
///
/// ```bnf
/// ident          ::= (XID_Start | "$" | "_") (XID_Continue | "$")*
/// number         ::= dec_number | hex_number
/// dec_number     ::= ([0-9]+ ("." [0-9]*)? | "." [0-9]+) ([eE] [-+]? [0-9]+)?
/// hex_number     ::= "0" [xX] [0-9 a-f A-F]+
/// string         ::= "\"" … "\"" | "'" … "'"
/// line_comment   ::= "//" [^\n]*
/// block_comment  ::= "/*" .*? "*/"
/// ```
#[derive(Clone, Debug)]
pub struct Lexer<'a> {
    chars: Chars<'a>,
    line: u32,
    newline_before: bool,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            chars: src.chars(),
            line: 1,
            newline_before: false,
            done: false,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_trivia()?;
        let line = self.line;
        let newline_before = self.newline_before;
        self.newline_before = false;

        let ch = match self.bump() {
            Some(ch) => ch,
            None => {
                return Ok(Token {
                    kind: TokenKind::Eof,
                    line,
                    newline_before: true,
                })
            }
        };
        let kind = match ch {
            '0'..='9' => self.number(ch)?,
            '.' if self.peek().is_ascii_digit() => self.number(ch)?,
            '"' | '\'' => self.string(ch)?,
            _ if is_ident_start(ch) => self.ident(ch),
            _ => TokenKind::Punct(self.punct(ch)?),
        };
        Ok(Token {
            kind,
            line,
            newline_before,
        })
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn peek(&self) -> char {
        self.chars.clone().next().unwrap_or(EOF_CHAR)
    }

    fn peek2(&self) -> char {
        let mut chars = self.chars.clone();
        chars.next();
        chars.next().unwrap_or(EOF_CHAR)
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == ch && !self.chars.as_str().is_empty() {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        loop {
            match self.peek() {
                '\n' => {
                    self.bump();
                    self.newline_before = true;
                }
                ch if ch.is_whitespace() => {
                    self.bump();
                }
                '/' if self.peek2() == '/' => {
                    while !self.chars.as_str().is_empty() && self.peek() != '\n' {
                        self.bump();
                    }
                }
                '/' if self.peek2() == '*' => {
                    let line = self.line;
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('*') if self.peek() == '/' => {
                                self.bump();
                                break;
                            }
                            Some('\n') => self.newline_before = true,
                            Some(_) => {}
                            None => return Err(SyntaxError::new("unterminated comment", line)),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn ident(&mut self, first: char) -> TokenKind {
        let mut name = String::from(first);
        while is_ident_continue(self.peek()) && !self.chars.as_str().is_empty() {
            name.push(self.peek());
            self.bump();
        }
        match name.parse::<Keyword>() {
            Ok(kw) => TokenKind::Keyword(kw),
            Err(()) => TokenKind::Ident(name),
        }
    }

    fn number(&mut self, first: char) -> Result<TokenKind, SyntaxError> {
        if first == '0' && matches!(self.peek(), 'x' | 'X') {
            self.bump();
            let mut digits = String::new();
            while self.peek().is_ascii_hexdigit() {
                digits.push(self.peek());
                self.bump();
            }
            if digits.is_empty() {
                return Err(SyntaxError::new("invalid hexadecimal literal", self.line));
            }
            return Ok(TokenKind::Number(hex_value(&digits)));
        }

        let mut text = String::from(first);
        let mut seen_dot = first == '.';
        loop {
            match self.peek() {
                ch @ '0'..='9' => {
                    text.push(ch);
                    self.bump();
                }
                '.' if !seen_dot => {
                    seen_dot = true;
                    text.push('.');
                    self.bump();
                }
                'e' | 'E' => {
                    text.push('e');
                    self.bump();
                    if matches!(self.peek(), '+' | '-') {
                        text.push(self.peek());
                        self.bump();
                    }
                    if !self.peek().is_ascii_digit() {
                        return Err(SyntaxError::new("missing exponent", self.line));
                    }
                    while self.peek().is_ascii_digit() {
                        text.push(self.peek());
                        self.bump();
                    }
                    break;
                }
                _ => break,
            }
        }
        if is_ident_start(self.peek()) && !self.chars.as_str().is_empty() {
            return Err(SyntaxError::new(
                "identifier starts immediately after numeric literal",
                self.line,
            ));
        }
        text.parse()
            .map(TokenKind::Number)
            .map_err(|_| SyntaxError::new(format!("invalid number `{text}`"), self.line))
    }

    fn string(&mut self, quote: char) -> Result<TokenKind, SyntaxError> {
        let line = self.line;
        let mut s = String::new();
        loop {
            match self.bump() {
                Some(ch) if ch == quote => return Ok(TokenKind::String(s)),
                Some('\n') | None => return Err(SyntaxError::new("unterminated string", line)),
                Some('\\') => {
                    let ch = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some('b') => '\u{8}',
                        Some('f') => '\u{c}',
                        Some('v') => '\u{b}',
                        Some('u') => self.unicode_escape()?,
                        Some(ch) => ch,
                        None => return Err(SyntaxError::new("unterminated string", line)),
                    };
                    s.push(ch);
                }
                Some(ch) => s.push(ch),
            }
        }
    }

    fn unicode_escape(&mut self) -> Result<char, SyntaxError> {
        let mut digits = String::with_capacity(4);
        for _ in 0..4 {
            match self.bump() {
                Some(ch) if ch.is_ascii_hexdigit() => digits.push(ch),
                _ => return Err(SyntaxError::new("invalid Unicode escape", self.line)),
            }
        }
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| SyntaxError::new("invalid Unicode escape", self.line))
    }

    fn punct(&mut self, ch: char) -> Result<Punct, SyntaxError> {
        let p = match ch {
            '(' => Punct::LParen,
            ')' => Punct::RParen,
            '{' => Punct::LBrace,
            '}' => Punct::RBrace,
            '[' => Punct::LBracket,
            ']' => Punct::RBracket,
            ';' => Punct::Semi,
            ',' => Punct::Comma,
            '.' => Punct::Dot,
            ':' => Punct::Colon,
            '?' if self.eat('?') => Punct::Nullish,
            '?' => Punct::Question,
            '+' if self.eat('+') => Punct::Inc,
            '+' if self.eat('=') => Punct::PlusAssign,
            '+' => Punct::Plus,
            '-' if self.eat('-') => Punct::Dec,
            '-' if self.eat('=') => Punct::MinusAssign,
            '-' => Punct::Minus,
            '*' if self.eat('=') => Punct::StarAssign,
            '*' => Punct::Star,
            '/' if self.eat('=') => Punct::SlashAssign,
            '/' => Punct::Slash,
            '%' if self.eat('=') => Punct::PercentAssign,
            '%' => Punct::Percent,
            '=' if self.eat('=') => {
                if self.eat('=') {
                    Punct::StrictEq
                } else {
                    Punct::Eq
                }
            }
            '=' => Punct::Assign,
            '!' if self.eat('=') => {
                if self.eat('=') {
                    Punct::StrictNe
                } else {
                    Punct::Ne
                }
            }
            '!' => Punct::Not,
            '<' if self.eat('=') => Punct::Le,
            '<' => Punct::Lt,
            '>' if self.eat('=') => Punct::Ge,
            '>' => Punct::Gt,
            '&' if self.eat('&') => Punct::And,
            '|' if self.eat('|') => Punct::Or,
            _ => {
                return Err(SyntaxError::new(
                    format!("invalid or unexpected token `{ch}`"),
                    self.line,
                ))
            }
        };
        Ok(p)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let tok = self.next_token();
        if matches!(tok, Ok(Token { kind: TokenKind::Eof, .. }) | Err(_)) {
            self.done = true;
        }
        Some(tok)
    }
}

impl FusedIterator for Lexer<'_> {}

fn is_ident_start(ch: char) -> bool {
    ch == '$' || ch == '_' || is_xid_start(ch)
}

fn is_ident_continue(ch: char) -> bool {
    ch == '$' || is_xid_continue(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .map(|tok| tok.map(|tok| tok.kind))
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn statement() {
        assert_eq!(
            kinds("let x = 1, y = 2;"),
            vec![
                TokenKind::Keyword(Keyword::Let),
                TokenKind::Ident("x".into()),
                TokenKind::Punct(Punct::Assign),
                TokenKind::Number(1.0),
                TokenKind::Punct(Punct::Comma),
                TokenKind::Ident("y".into()),
                TokenKind::Punct(Punct::Assign),
                TokenKind::Number(2.0),
                TokenKind::Punct(Punct::Semi),
                TokenKind::Eof,
            ],
        );
    }

    #[test]
    fn compound_operators() {
        assert_eq!(
            kinds("a += b === c !== d ?? e++"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Punct(Punct::PlusAssign),
                TokenKind::Ident("b".into()),
                TokenKind::Punct(Punct::StrictEq),
                TokenKind::Ident("c".into()),
                TokenKind::Punct(Punct::StrictNe),
                TokenKind::Ident("d".into()),
                TokenKind::Punct(Punct::Nullish),
                TokenKind::Ident("e".into()),
                TokenKind::Punct(Punct::Inc),
                TokenKind::Eof,
            ],
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("0 1.5 .25 1e3 2E-2 0xff"),
            vec![
                TokenKind::Number(0.0),
                TokenKind::Number(1.5),
                TokenKind::Number(0.25),
                TokenKind::Number(1000.0),
                TokenKind::Number(0.02),
                TokenKind::Number(255.0),
                TokenKind::Eof,
            ],
        );
        assert!(Lexer::new("3x").next().unwrap().is_err());
        assert!(Lexer::new("0x").next().unwrap().is_err());
    }

    #[test]
    fn long_hex_numbers() {
        assert_eq!(
            kinds("0x10000000000000000 0x0000000000000000000ff"),
            vec![
                TokenKind::Number(2f64.powi(64)),
                TokenKind::Number(255.0),
                TokenKind::Eof,
            ],
        );
        // 2^65 + 1 rounds to 2^65, and 2^53 + 3 rounds up to 2^53 + 4.
        assert_eq!(kinds("0x20000000000000001")[0], TokenKind::Number(2f64.powi(65)));
        assert_eq!(
            kinds("0x20000000000003")[0],
            TokenKind::Number(2f64.powi(53) + 4.0),
        );
        // Digits past the first 32 still break a tie upward.
        let tie = format!("0x1{}8{}1", "0".repeat(13), "0".repeat(39));
        let up = 2f64.powi(164) * (2f64.powi(52) + 1.0);
        assert_eq!(kinds(&tie)[0], TokenKind::Number(up));
        assert_eq!(
            kinds(&format!("0x1{}", "0".repeat(300)))[0],
            TokenKind::Number(f64::INFINITY),
        );
    }

    #[test]
    fn strings_and_escapes() {
        assert_eq!(
            kinds(r#"'a"b' "c\nA""#),
            vec![
                TokenKind::String("a\"b".into()),
                TokenKind::String("c\nA".into()),
                TokenKind::Eof,
            ],
        );
        let err = Lexer::new("\"abc").next().unwrap().unwrap_err();
        assert_eq!(err, SyntaxError::new("unterminated string", 1));
    }

    #[test]
    fn comments_and_line_breaks() {
        let toks = Lexer::new("a // one\n/* two\nthree */ b")
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(toks[0].kind, TokenKind::Ident("a".into()));
        assert!(!toks[0].newline_before);
        assert_eq!(toks[1].kind, TokenKind::Ident("b".into()));
        assert!(toks[1].newline_before);
        assert_eq!(toks[1].line, 3);
    }
}
