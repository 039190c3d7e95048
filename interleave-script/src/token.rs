use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use phf::{phf_map, Map};
use strum::Display;

/// Snippet token.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based line of the first character.
    pub line: u32,
    /// Whether a line break separates this token from the previous one. Used
    /// for automatic semicolon insertion.
    pub newline_before: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Keyword(Keyword),
    Number(f64),
    String(String),
    Punct(Punct),
    Eof,
}

macro_rules! keywords {
    ($(#[doc = $doc:literal])? enum $Keyword:ident { $($text:literal => $Kw:ident),* $(,)? }) => {
        $(#[doc = $doc])?
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $Keyword {
            $($Kw),*
        }

        impl FromStr for $Keyword {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                static KEYWORDS: Map<&'static str, $Keyword> = phf_map! {
                    $($text => $Keyword::$Kw,)*
                };

                KEYWORDS.get(s).copied().ok_or(())
            }
        }

        impl AsRef<str> for $Keyword {
            fn as_ref(&self) -> &str {
                match *self {
                    $($Keyword::$Kw => $text,)*
                }
            }
        }
    };
}

keywords! {
    /// Reserved word.
    enum Keyword {
        "let" => Let,
        "const" => Const,
        "var" => Var,
        "if" => If,
        "else" => Else,
        "while" => While,
        "for" => For,
        "new" => New,
        "return" => Return,
        "throw" => Throw,
        "typeof" => Typeof,
        "true" => True,
        "false" => False,
        "null" => Null,
        "undefined" => Undefined,
    }
}

/// Punctuator.
#[derive(Display, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Punct {
    #[strum(serialize = "(")]
    LParen,
    #[strum(serialize = ")")]
    RParen,
    #[strum(serialize = "{")]
    LBrace,
    #[strum(serialize = "}")]
    RBrace,
    #[strum(serialize = "[")]
    LBracket,
    #[strum(serialize = "]")]
    RBracket,
    #[strum(serialize = ";")]
    Semi,
    #[strum(serialize = ",")]
    Comma,
    #[strum(serialize = ".")]
    Dot,
    #[strum(serialize = ":")]
    Colon,
    #[strum(serialize = "?")]
    Question,
    #[strum(serialize = "??")]
    Nullish,
    #[strum(serialize = "=")]
    Assign,
    #[strum(serialize = "+=")]
    PlusAssign,
    #[strum(serialize = "-=")]
    MinusAssign,
    #[strum(serialize = "*=")]
    StarAssign,
    #[strum(serialize = "/=")]
    SlashAssign,
    #[strum(serialize = "%=")]
    PercentAssign,
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "-")]
    Minus,
    #[strum(serialize = "*")]
    Star,
    #[strum(serialize = "/")]
    Slash,
    #[strum(serialize = "%")]
    Percent,
    #[strum(serialize = "++")]
    Inc,
    #[strum(serialize = "--")]
    Dec,
    #[strum(serialize = "!")]
    Not,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
    #[strum(serialize = "===")]
    StrictEq,
    #[strum(serialize = "!==")]
    StrictNe,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "identifier `{name}`"),
            TokenKind::Keyword(kw) => write!(f, "`{}`", kw.as_ref()),
            TokenKind::Number(_) => write!(f, "number"),
            TokenKind::String(_) => write!(f, "string"),
            TokenKind::Punct(p) => write!(f, "`{p}`"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}
