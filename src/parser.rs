pub mod ast;

use crate::config::Dialect;
use crate::keywords::Keywords;
use crate::parser::ast::{ArithOp, Assignment, Expr, Procedure, Program, RelOp, Stmt};
use crate::scanner::token::{Token, TokenKind};
use crate::scanner::{ScanError, Scanner};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl From<ScanError> for ParseError {
    fn from(e: ScanError) -> Self {
        ParseError {
            line: e.line,
            message: format!("scan error: {}", e.message),
        }
    }
}

/// One-token-lookahead recursive descent over a `Scanner`.
///
/// The scanner merges operand runs greedily, so `eat` matches whole lexemes:
/// `:=` arrives as one token, and an unexpected run like `((` simply fails
/// to match the `(` the grammar wants.
pub struct Parser {
    scanner: Scanner,
    keywords: Keywords,
    dialect: Dialect,
    token: Token,
}

impl Parser {
    pub fn new(
        mut scanner: Scanner,
        keywords: Keywords,
        dialect: Dialect,
    ) -> Result<Self, ParseError> {
        let token = scanner.next_token()?;
        Ok(Parser {
            scanner,
            keywords,
            dialect,
            token,
        })
    }

    // utility methods
    fn advance(&mut self) -> Result<(), ParseError> {
        self.token = self.scanner.next_token()?;
        Ok(())
    }

    fn current_display(&self) -> &str {
        if self.token.kind == TokenKind::Eof {
            "end of file"
        } else {
            &self.token.lexeme
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            line: self.token.line,
            message: message.into(),
        }
    }

    fn eat(&mut self, expected: &str) -> Result<(), ParseError> {
        if self.token.lexeme != expected {
            return Err(self.error(format!(
                "expected '{}', found '{}'",
                expected,
                self.current_display()
            )));
        }
        self.advance()
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String, ParseError> {
        if self.token.kind != TokenKind::Identifier {
            return Err(self.error(format!(
                "expected {}, found '{}'",
                what,
                self.current_display()
            )));
        }
        let name = self.token.lexeme.clone();
        self.advance()?;
        Ok(name)
    }

    pub fn parse_program(mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        while self.token.kind != TokenKind::Eof {
            statements.push(self.parse_statement()?);
        }
        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        if self.token.lexeme == self.keywords.begin {
            self.parse_block()
        } else if self.token.lexeme == self.keywords.writeln {
            self.parse_writeln()
        } else if self.token.lexeme == self.keywords.if_ {
            self.parse_if()
        } else if self.token.lexeme == self.keywords.while_ {
            self.parse_while()
        } else if self.token.lexeme == self.keywords.for_ {
            self.parse_for()
        } else if self.token.lexeme == self.keywords.readln {
            self.parse_readln()
        } else if self.token.lexeme == self.keywords.procedure {
            self.parse_procedure_declaration()
        } else if self.token.kind == TokenKind::Identifier {
            Ok(Stmt::Assign(self.parse_assignment()?))
        } else if self.token.kind == TokenKind::Eof {
            Err(self.error("unexpected end of file"))
        } else {
            Err(self.error(format!("unexpected token '{}'", self.token.lexeme)))
        }
    }

    fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        self.advance()?; // BEGIN
        let mut statements = Vec::new();
        while self.token.lexeme != self.keywords.end {
            if self.token.kind == TokenKind::Eof {
                return Err(self.error(format!(
                    "unexpected end of file, expected '{}'",
                    self.keywords.end
                )));
            }
            statements.push(self.parse_statement()?);
        }
        self.advance()?; // END
        if self.token.lexeme == ";" {
            self.advance()?;
        } else if self.token.kind != TokenKind::Eof {
            // `END.` ends the whole input before a `;` can be scanned
            return Err(self.error(format!(
                "expected ';' after '{}', found '{}'",
                self.keywords.end,
                self.current_display()
            )));
        }
        Ok(Stmt::Block(statements))
    }

    fn parse_writeln(&mut self) -> Result<Stmt, ParseError> {
        self.advance()?; // WRITELN
        self.eat("(")?;
        let expr = self.parse_term()?;
        self.eat(")")?;
        self.eat(";")?;
        Ok(Stmt::Writeln(expr))
    }

    fn parse_readln(&mut self) -> Result<Stmt, ParseError> {
        self.advance()?; // READLN
        self.eat("(")?;
        let name = self.expect_identifier("an identifier")?;
        self.eat(")")?;
        self.eat(";")?;
        Ok(Stmt::Readln { name })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.advance()?; // IF
        let condition = self.parse_condition()?;
        let then_kw = self.keywords.then.clone();
        self.eat(&then_kw)?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.token.lexeme == self.keywords.else_ {
            self.advance()?;
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.advance()?; // WHILE
        let condition = self.parse_condition()?;
        let do_kw = self.keywords.do_.clone();
        self.eat(&do_kw)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::While { condition, body })
    }

    // `FOR x := a TO b DO body` desugars here: the loop the interpreter runs
    // is `x := a; WHILE x < b DO BEGIN body; x := x + 1 END`.
    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.advance()?; // FOR
        let init = self.parse_assignment()?;
        let to_kw = self.keywords.to.clone();
        self.eat(&to_kw)?;
        let bound = self.parse_term()?;
        let do_kw = self.keywords.do_.clone();
        self.eat(&do_kw)?;
        let body = Box::new(self.parse_statement()?);

        let variable = init.name.clone();
        let condition = Expr::Compare {
            left: Box::new(Expr::Variable(variable.clone())),
            op: RelOp::Lt,
            right: Box::new(bound),
        };
        let update = Assignment {
            name: variable.clone(),
            value: Expr::Binary {
                left: Box::new(Expr::Variable(variable)),
                op: ArithOp::Add,
                right: Box::new(Expr::Number(1)),
            },
        };
        Ok(Stmt::For {
            init,
            condition,
            update,
            body,
        })
    }

    fn parse_procedure_declaration(&mut self) -> Result<Stmt, ParseError> {
        self.advance()?; // PROCEDURE
        let name = self.expect_identifier("a procedure name")?;
        self.eat("(")?;
        let mut params = Vec::new();
        while self.token.lexeme != ")" {
            params.push(self.expect_identifier("a parameter name")?);
        }
        self.advance()?; // )
        let body = self.parse_statement()?;
        Ok(Stmt::Procedure(Rc::new(Procedure { name, params, body })))
    }

    fn parse_assignment(&mut self) -> Result<Assignment, ParseError> {
        let line = self.token.line;
        let name = self.expect_identifier("an identifier")?;
        self.eat(":=")?;
        let value = self.parse_term()?;
        if self.token.lexeme == ";" {
            self.advance()?;
        } else if self.token.line != line {
            // the `;` may only be omitted while the next token stays on the
            // same line, which is what lets `FOR x := 0 TO …` parse
            return Err(ParseError {
                line,
                message: format!("missing ';' after assignment to '{}'", name),
            });
        }
        Ok(Assignment { name, value })
    }

    fn parse_condition(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_term()?;
        if self.token.kind != TokenKind::Operator {
            return Err(self.error(format!("'{}' is not an operator", self.current_display())));
        }
        let op = match self.token.lexeme.as_str() {
            "=" => RelOp::Eq,
            "<>" => RelOp::Ne,
            "<" => RelOp::Lt,
            ">" => RelOp::Gt,
            "<=" => RelOp::Le,
            ">=" => RelOp::Ge,
            other => {
                return Err(self.error(format!("'{}' is not a relational operator", other)));
            }
        };
        self.advance()?;
        let right = self.parse_term()?;
        Ok(Expr::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    // `*` and `/` take another factor, so they chain left-to-right. `+` and
    // `-` recurse back into the whole term, which makes `2 - 3 - 1` parse as
    // `2 - ( 3 - 1 )` unless the left-assoc-sums dialect flag is set.
    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut result = self.parse_factor()?;
        loop {
            let op = match self.token.lexeme.as_str() {
                "*" => ArithOp::Mul,
                "/" => ArithOp::Div,
                "+" => ArithOp::Add,
                "-" => ArithOp::Sub,
                _ => return Ok(result),
            };
            self.advance()?;
            let right = match op {
                ArithOp::Mul | ArithOp::Div => self.parse_factor()?,
                ArithOp::Add | ArithOp::Sub => {
                    if self.dialect.left_assoc_sums {
                        self.parse_factor()?
                    } else {
                        self.parse_term()?
                    }
                }
            };
            result = Expr::Binary {
                left: Box::new(result),
                op,
                right: Box::new(right),
            };
        }
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        if self.token.lexeme == "(" {
            self.advance()?;
            let term = self.parse_term()?;
            self.eat(")")?;
            return Ok(term);
        }
        if self.token.lexeme == "-" {
            // unary minus rewrites to multiplication by -1
            self.advance()?;
            let operand = self.parse_factor()?;
            return Ok(Expr::Binary {
                left: Box::new(Expr::Number(-1)),
                op: ArithOp::Mul,
                right: Box::new(operand),
            });
        }
        match self.token.kind {
            TokenKind::Identifier => {
                let name = self.token.lexeme.clone();
                self.advance()?;
                if self.token.lexeme == "(" {
                    self.advance()?;
                    let mut args = Vec::new();
                    // no separator between arguments: terms self-delimit
                    while self.token.lexeme != ")" {
                        if self.token.kind == TokenKind::Eof {
                            return Err(self.error(format!(
                                "unexpected end of file in arguments of '{}'",
                                name
                            )));
                        }
                        args.push(self.parse_term()?);
                    }
                    self.advance()?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            TokenKind::Number => {
                let value: i64 = self
                    .token
                    .lexeme
                    .parse()
                    .map_err(|_| self.error(format!("invalid number '{}'", self.token.lexeme)))?;
                self.advance()?;
                Ok(Expr::Number(value))
            }
            _ => Err(self.error(format!(
                "unexpected token '{}'",
                self.current_display()
            ))),
        }
    }
}
