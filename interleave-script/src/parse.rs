use std::collections::HashSet;
use std::rc::Rc;

use crate::ast::{BinaryOp, DeclKind, Expr, LogicalOp, Program, Stmt, UnaryOp};
use crate::error::SyntaxError;
use crate::lex::Lexer;
use crate::number::format_number;
use crate::token::{Keyword, Punct, Token, TokenKind};
use crate::MAX_NESTING;

/// Recursive-descent parser over a fully lexed token buffer.
#[derive(Debug)]
pub struct Parser {
    toks: Vec<Token>,
    pos: usize,
    /// Names declared with `let`/`const` in each enclosing block.
    scopes: Vec<HashSet<Rc<str>>>,
    /// Nesting of the syntax being parsed. Bounds both parser recursion and
    /// the depth of the tree it builds.
    depth: usize,
}

/// Parses a whole snippet.
pub fn parse(src: &str) -> Result<Program, SyntaxError> {
    let toks = Lexer::new(src).collect::<Result<Vec<_>, _>>()?;
    Parser::new(toks).program()
}

impl Parser {
    pub fn new(mut toks: Vec<Token>) -> Self {
        if toks.last().map_or(true, |tok| tok.kind != TokenKind::Eof) {
            let line = toks.last().map_or(1, |tok| tok.line);
            toks.push(Token {
                kind: TokenKind::Eof,
                line,
                newline_before: true,
            });
        }
        Parser {
            toks,
            pos: 0,
            scopes: vec![HashSet::new()],
            depth: 0,
        }
    }

    pub fn program(mut self) -> Result<Program, SyntaxError> {
        let mut body = Vec::new();
        while !self.at_eof() {
            body.push(self.stmt()?);
        }
        Ok(Program { body })
    }

    fn peek(&self) -> &Token {
        // The buffer always ends with Eof.
        &self.toks[self.pos.min(self.toks.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.toks.len() {
            self.pos += 1;
        }
        tok
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn is_punct(&self, p: Punct) -> bool {
        self.peek().kind == TokenKind::Punct(p)
    }

    fn is_keyword(&self, kw: Keyword) -> bool {
        self.peek().kind == TokenKind::Keyword(kw)
    }

    fn eat_punct(&mut self, p: Punct) -> bool {
        if self.is_punct(p) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, p: Punct) -> Result<(), SyntaxError> {
        if self.eat_punct(p) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn unexpected(&self) -> SyntaxError {
        let tok = self.peek();
        SyntaxError::new(format!("unexpected {}", tok.kind), tok.line)
    }

    /// Ends a statement at `;`, or by automatic semicolon insertion before
    /// `}`, end of input, or a line break.
    fn semicolon(&mut self) -> Result<(), SyntaxError> {
        if self.eat_punct(Punct::Semi) {
            return Ok(());
        }
        let tok = self.peek();
        if tok.newline_before || tok.kind == TokenKind::Punct(Punct::RBrace) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn deepen(&mut self) -> Result<(), SyntaxError> {
        if self.depth >= MAX_NESTING {
            return Err(SyntaxError::new(
                format!("nesting exceeds {MAX_NESTING} levels"),
                self.peek().line,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    /// Parses one nested construct. Chains that the callee builds in a loop
    /// count toward the depth until it returns.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        let depth = self.depth;
        self.deepen()?;
        let result = parse(self);
        self.depth = depth;
        result
    }

    fn ident(&mut self) -> Result<Rc<str>, SyntaxError> {
        match self.peek().kind.clone() {
            TokenKind::Ident(name) => {
                self.bump();
                Ok(name.into())
            }
            _ => Err(self.unexpected()),
        }
    }

    fn stmt(&mut self) -> Result<Stmt, SyntaxError> {
        self.nested(Self::statement)
    }

    fn statement(&mut self) -> Result<Stmt, SyntaxError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Punct(Punct::Semi) => {
                self.bump();
                Ok(Stmt::Empty)
            }
            TokenKind::Punct(Punct::LBrace) => {
                self.bump();
                self.scopes.push(HashSet::new());
                let mut body = Vec::new();
                while !self.is_punct(Punct::RBrace) {
                    if self.at_eof() {
                        return Err(self.unexpected());
                    }
                    body.push(self.stmt()?);
                }
                self.bump();
                self.scopes.pop();
                Ok(Stmt::Block(body))
            }
            TokenKind::Keyword(Keyword::Let) => self.decl(DeclKind::Let),
            TokenKind::Keyword(Keyword::Const) => self.decl(DeclKind::Const),
            TokenKind::Keyword(Keyword::Var) => self.decl(DeclKind::Var),
            TokenKind::Keyword(Keyword::Return) => {
                self.bump();
                let next = self.peek();
                let value = if next.newline_before
                    || matches!(
                        next.kind,
                        TokenKind::Punct(Punct::Semi | Punct::RBrace) | TokenKind::Eof
                    ) {
                    None
                } else {
                    Some(self.expr()?)
                };
                self.semicolon()?;
                Ok(Stmt::Return(value))
            }
            TokenKind::Keyword(Keyword::Throw) => {
                self.bump();
                if self.peek().newline_before {
                    return Err(SyntaxError::new("illegal newline after throw", tok.line));
                }
                let value = self.expr()?;
                self.semicolon()?;
                Ok(Stmt::Throw(value))
            }
            TokenKind::Keyword(Keyword::If) => {
                self.bump();
                self.expect_punct(Punct::LParen)?;
                let cond = self.expr()?;
                self.expect_punct(Punct::RParen)?;
                let then = self.stmt()?;
                let otherwise = if self.is_keyword(Keyword::Else) {
                    self.bump();
                    Some(Box::new(self.stmt()?))
                } else {
                    None
                };
                Ok(Stmt::If(cond, Box::new(then), otherwise))
            }
            TokenKind::Keyword(Keyword::While) => {
                self.bump();
                self.expect_punct(Punct::LParen)?;
                let cond = self.expr()?;
                self.expect_punct(Punct::RParen)?;
                let body = self.stmt()?;
                Ok(Stmt::While(cond, Box::new(body)))
            }
            TokenKind::Keyword(Keyword::For) => self.for_loop(),
            _ => {
                let e = self.expr()?;
                self.semicolon()?;
                Ok(Stmt::Expr(e))
            }
        }
    }

    fn for_loop(&mut self) -> Result<Stmt, SyntaxError> {
        self.bump();
        self.expect_punct(Punct::LParen)?;
        self.scopes.push(HashSet::new());
        let init = match self.peek().kind {
            TokenKind::Punct(Punct::Semi) => None,
            TokenKind::Keyword(Keyword::Let) => Some(self.declarators(DeclKind::Let)?),
            TokenKind::Keyword(Keyword::Const) => Some(self.declarators(DeclKind::Const)?),
            TokenKind::Keyword(Keyword::Var) => Some(self.declarators(DeclKind::Var)?),
            _ => Some(Stmt::Expr(self.expr()?)),
        };
        self.expect_punct(Punct::Semi)?;
        let cond = if self.is_punct(Punct::Semi) {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect_punct(Punct::Semi)?;
        let update = if self.is_punct(Punct::RParen) {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect_punct(Punct::RParen)?;
        let body = self.stmt()?;
        self.scopes.pop();
        Ok(Stmt::For {
            init: init.map(Box::new),
            cond,
            update,
            body: Box::new(body),
        })
    }

    fn decl(&mut self, kind: DeclKind) -> Result<Stmt, SyntaxError> {
        let decl = self.declarators(kind)?;
        self.semicolon()?;
        Ok(decl)
    }

    /// Parses a declaration up to, but not including, its terminator.
    fn declarators(&mut self, kind: DeclKind) -> Result<Stmt, SyntaxError> {
        self.bump();
        let mut bindings = Vec::new();
        loop {
            let line = self.peek().line;
            let name = self.ident()?;
            let init = if self.eat_punct(Punct::Assign) {
                Some(self.assign()?)
            } else {
                None
            };
            if kind == DeclKind::Const && init.is_none() {
                return Err(SyntaxError::new(
                    "missing initializer in const declaration",
                    line,
                ));
            }
            if kind != DeclKind::Var {
                let fresh = self
                    .scopes
                    .last_mut()
                    .map_or(true, |scope| scope.insert(name.clone()));
                if !fresh {
                    return Err(SyntaxError::new(
                        format!("identifier '{name}' has already been declared"),
                        line,
                    ));
                }
            }
            bindings.push((name, init));
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        Ok(Stmt::Decl(kind, bindings))
    }

    pub fn expr(&mut self) -> Result<Expr, SyntaxError> {
        self.assign()
    }

    fn assign(&mut self) -> Result<Expr, SyntaxError> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> Result<Expr, SyntaxError> {
        let line = self.peek().line;
        let lhs = self.conditional()?;
        let op = match self.peek().kind {
            TokenKind::Punct(Punct::Assign) => None,
            TokenKind::Punct(Punct::PlusAssign) => Some(BinaryOp::Add),
            TokenKind::Punct(Punct::MinusAssign) => Some(BinaryOp::Sub),
            TokenKind::Punct(Punct::StarAssign) => Some(BinaryOp::Mul),
            TokenKind::Punct(Punct::SlashAssign) => Some(BinaryOp::Div),
            TokenKind::Punct(Punct::PercentAssign) => Some(BinaryOp::Rem),
            _ => return Ok(lhs),
        };
        if !lhs.is_assignable() {
            return Err(SyntaxError::new(
                "invalid left-hand side in assignment",
                line,
            ));
        }
        self.bump();
        let rhs = self.assign()?;
        Ok(Expr::Assign(op, Box::new(lhs), Box::new(rhs)))
    }

    fn conditional(&mut self) -> Result<Expr, SyntaxError> {
        let cond = self.logical_or()?;
        if !self.eat_punct(Punct::Question) {
            return Ok(cond);
        }
        let then = self.assign()?;
        self.expect_punct(Punct::Colon)?;
        let otherwise = self.assign()?;
        Ok(Expr::Conditional(
            Box::new(cond),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    fn logical_or(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.logical_and()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Punct(Punct::Or) => LogicalOp::Or,
                TokenKind::Punct(Punct::Nullish) => LogicalOp::Nullish,
                _ => return Ok(lhs),
            };
            self.bump();
            self.deepen()?;
            let rhs = self.logical_and()?;
            lhs = Expr::Logical(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn logical_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.equality()?;
        while self.eat_punct(Punct::And) {
            self.deepen()?;
            let rhs = self.equality()?;
            lhs = Expr::Logical(LogicalOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.relational()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Punct(Punct::Eq) => BinaryOp::LooseEq,
                TokenKind::Punct(Punct::Ne) => BinaryOp::LooseNe,
                TokenKind::Punct(Punct::StrictEq) => BinaryOp::StrictEq,
                TokenKind::Punct(Punct::StrictNe) => BinaryOp::StrictNe,
                _ => return Ok(lhs),
            };
            self.bump();
            self.deepen()?;
            let rhs = self.relational()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn relational(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Punct(Punct::Lt) => BinaryOp::Lt,
                TokenKind::Punct(Punct::Le) => BinaryOp::Le,
                TokenKind::Punct(Punct::Gt) => BinaryOp::Gt,
                TokenKind::Punct(Punct::Ge) => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            self.bump();
            self.deepen()?;
            let rhs = self.additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Punct(Punct::Plus) => BinaryOp::Add,
                TokenKind::Punct(Punct::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.bump();
            self.deepen()?;
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Punct(Punct::Star) => BinaryOp::Mul,
                TokenKind::Punct(Punct::Slash) => BinaryOp::Div,
                TokenKind::Punct(Punct::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.bump();
            self.deepen()?;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        self.nested(Self::unary_op)
    }

    fn unary_op(&mut self) -> Result<Expr, SyntaxError> {
        let tok = self.peek().clone();
        let op = match tok.kind {
            TokenKind::Punct(Punct::Minus) => UnaryOp::Neg,
            TokenKind::Punct(Punct::Plus) => UnaryOp::Plus,
            TokenKind::Punct(Punct::Not) => UnaryOp::Not,
            TokenKind::Keyword(Keyword::Typeof) => UnaryOp::Typeof,
            TokenKind::Punct(p @ (Punct::Inc | Punct::Dec)) => {
                self.bump();
                let target = self.unary()?;
                if !target.is_assignable() {
                    return Err(SyntaxError::new(
                        "invalid left-hand side expression in prefix operation",
                        tok.line,
                    ));
                }
                let delta = if p == Punct::Inc { 1.0 } else { -1.0 };
                return Ok(Expr::Update(Box::new(target), delta, true));
            }
            _ => return self.postfix(),
        };
        self.bump();
        let operand = self.unary()?;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn postfix(&mut self) -> Result<Expr, SyntaxError> {
        let e = self.call()?;
        let tok = self.peek();
        if tok.newline_before {
            return Ok(e);
        }
        let delta = match tok.kind {
            TokenKind::Punct(Punct::Inc) => 1.0,
            TokenKind::Punct(Punct::Dec) => -1.0,
            _ => return Ok(e),
        };
        if !e.is_assignable() {
            return Err(SyntaxError::new(
                "invalid left-hand side expression in postfix operation",
                tok.line,
            ));
        }
        self.bump();
        Ok(Expr::Update(Box::new(e), delta, false))
    }

    fn call(&mut self) -> Result<Expr, SyntaxError> {
        let mut e = if self.is_keyword(Keyword::New) {
            self.new_expr()?
        } else {
            self.primary()?
        };
        loop {
            e = match self.peek().kind {
                TokenKind::Punct(Punct::Dot) => {
                    self.bump();
                    Expr::Member(Box::new(e), self.property_name()?)
                }
                TokenKind::Punct(Punct::LBracket) => {
                    self.bump();
                    let index = self.expr()?;
                    self.expect_punct(Punct::RBracket)?;
                    Expr::Index(Box::new(e), Box::new(index))
                }
                TokenKind::Punct(Punct::LParen) => {
                    self.bump();
                    let args = self.list(Punct::RParen, Self::assign)?;
                    Expr::Call(Box::new(e), args)
                }
                _ => return Ok(e),
            };
            self.deepen()?;
        }
    }

    /// Parses `new callee(args)`, where the callee has no calls of its own
    /// and the arguments may be omitted.
    fn new_expr(&mut self) -> Result<Expr, SyntaxError> {
        self.bump();
        let mut callee = if self.is_keyword(Keyword::New) {
            self.nested(Self::new_expr)?
        } else {
            self.primary()?
        };
        loop {
            callee = match self.peek().kind {
                TokenKind::Punct(Punct::Dot) => {
                    self.bump();
                    Expr::Member(Box::new(callee), self.property_name()?)
                }
                TokenKind::Punct(Punct::LBracket) => {
                    self.bump();
                    let index = self.expr()?;
                    self.expect_punct(Punct::RBracket)?;
                    Expr::Index(Box::new(callee), Box::new(index))
                }
                _ => break,
            };
            self.deepen()?;
        }
        let args = if self.eat_punct(Punct::LParen) {
            self.list(Punct::RParen, Self::assign)?
        } else {
            Vec::new()
        };
        Ok(Expr::New(Box::new(callee), args))
    }

    /// Parses the name after `.`, which may be a reserved word.
    fn property_name(&mut self) -> Result<Rc<str>, SyntaxError> {
        match self.peek().kind.clone() {
            TokenKind::Ident(name) => {
                self.bump();
                Ok(name.into())
            }
            TokenKind::Keyword(kw) => {
                self.bump();
                Ok(kw.as_ref().into())
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Parses comma-separated items up to and including `close`, allowing a
    /// trailing comma.
    fn list<T>(
        &mut self,
        close: Punct,
        mut item: impl FnMut(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<Vec<T>, SyntaxError> {
        let mut items = Vec::new();
        while !self.eat_punct(close) {
            items.push(item(self)?);
            if !self.eat_punct(Punct::Comma) {
                self.expect_punct(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        let tok = self.bump();
        let e = match tok.kind {
            TokenKind::Number(n) => Expr::Number(n),
            TokenKind::String(s) => Expr::String(s.into()),
            TokenKind::Ident(name) => Expr::Ident(name.into()),
            TokenKind::Keyword(Keyword::True) => Expr::Bool(true),
            TokenKind::Keyword(Keyword::False) => Expr::Bool(false),
            TokenKind::Keyword(Keyword::Null) => Expr::Null,
            TokenKind::Keyword(Keyword::Undefined) => Expr::Undefined,
            TokenKind::Punct(Punct::LParen) => {
                let e = self.expr()?;
                self.expect_punct(Punct::RParen)?;
                e
            }
            TokenKind::Punct(Punct::LBracket) => {
                Expr::Array(self.list(Punct::RBracket, Self::assign)?)
            }
            TokenKind::Punct(Punct::LBrace) => {
                Expr::Object(self.list(Punct::RBrace, Self::property)?)
            }
            _ => {
                self.pos -= 1;
                return Err(self.unexpected());
            }
        };
        Ok(e)
    }

    fn property(&mut self) -> Result<(Rc<str>, Expr), SyntaxError> {
        let tok = self.bump();
        let key: Rc<str> = match tok.kind {
            TokenKind::Ident(name) => {
                if !self.is_punct(Punct::Colon) {
                    let name: Rc<str> = name.into();
                    return Ok((name.clone(), Expr::Ident(name)));
                }
                name.into()
            }
            TokenKind::Keyword(kw) => kw.as_ref().into(),
            TokenKind::String(s) => s.into(),
            TokenKind::Number(n) => format_number(n).into(),
            _ => {
                self.pos -= 1;
                return Err(self.unexpected());
            }
        };
        self.expect_punct(Punct::Colon)?;
        let value = self.assign()?;
        Ok((key, value))
    }
}
