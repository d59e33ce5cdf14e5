pub mod environment;

use crate::config::Dialect;
use crate::interpreter::environment::Environment;
use crate::parser::ast::{ArithOp, Assignment, Expr, Program, RelOp, Stmt};
use std::io::{BufRead, Write};

#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub message: String,
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

fn runtime_error(message: impl Into<String>) -> RuntimeError {
    RuntimeError {
        message: message.into(),
    }
}

fn compare(op: RelOp, l: i64, r: i64) -> bool {
    match op {
        RelOp::Eq => l == r,
        RelOp::Ne => l != r,
        RelOp::Lt => l < r,
        RelOp::Gt => l > r,
        RelOp::Le => l <= r,
        RelOp::Ge => l >= r,
    }
}

/// Walks the AST directly. All mutable state lives in the environment; the
/// tree itself is never modified. `READLN` pulls tokens from `input`,
/// `WRITELN` prints lines to `output`.
pub struct Interpreter<R, W> {
    env: Environment,
    dialect: Dialect,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Interpreter<R, W> {
    pub fn new(env: Environment, dialect: Dialect, input: R, output: W) -> Self {
        Interpreter {
            env,
            dialect,
            input,
            output,
        }
    }

    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        for statement in &program.statements {
            self.execute(statement)?;
        }
        Ok(())
    }

    fn execute(&mut self, statement: &Stmt) -> Result<(), RuntimeError> {
        match statement {
            Stmt::Assign(assignment) => self.execute_assignment(assignment),

            Stmt::Block(statements) => {
                for statement in statements {
                    self.execute(statement)?;
                }
                Ok(())
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)? == 1 {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    // the reference behavior re-evaluates the condition on
                    // the way into ELSE; the single-eval-else dialect flag
                    // skips the second evaluation
                    if self.dialect.single_eval_else || self.evaluate(condition)? == 0 {
                        self.execute(else_branch)?;
                    }
                }
                Ok(())
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)? == 1 {
                    self.execute(body)?;
                }
                Ok(())
            }

            Stmt::For {
                init,
                condition,
                update,
                body,
            } => {
                self.execute_assignment(init)?;
                match condition {
                    // the parser always builds `var < bound` here; the bound
                    // is evaluated once, before the first iteration, and the
                    // loop variable is re-read on every check
                    Expr::Compare { left, op, right } => {
                        let bound = self.evaluate(right)?;
                        loop {
                            let current = self.evaluate(left)?;
                            if !compare(*op, current, bound) {
                                break;
                            }
                            self.execute(body)?;
                            self.execute_assignment(update)?;
                        }
                    }
                    other => {
                        while self.evaluate(other)? == 1 {
                            self.execute(body)?;
                            self.execute_assignment(update)?;
                        }
                    }
                }
                Ok(())
            }

            Stmt::Readln { name } => {
                let word = self.next_input_token()?;
                if !word.chars().all(|c| c.is_ascii_digit()) {
                    return Err(runtime_error(format!(
                        "expected a number from input, got '{}'",
                        word
                    )));
                }
                let value: i64 = word
                    .parse()
                    .map_err(|_| runtime_error(format!("number '{}' is out of range", word)))?;
                self.env.set(name, value);
                Ok(())
            }

            Stmt::Writeln(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)
                    .map_err(|e| runtime_error(format!("failed to write output: {}", e)))
            }

            Stmt::Procedure(procedure) => {
                self.env.declare_procedure(procedure.clone());
                Ok(())
            }
        }
    }

    fn execute_assignment(&mut self, assignment: &Assignment) -> Result<(), RuntimeError> {
        let value = self.evaluate(&assignment.value)?;
        self.env.set(&assignment.name, value);
        Ok(())
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<i64, RuntimeError> {
        match expr {
            Expr::Number(n) => Ok(*n),

            Expr::Variable(name) => Ok(self.env.get(name)),

            Expr::Binary { left, op, right } => {
                let l = self.evaluate(left)?;
                let r = self.evaluate(right)?;
                match op {
                    ArithOp::Add => Ok(l.wrapping_add(r)),
                    ArithOp::Sub => Ok(l.wrapping_sub(r)),
                    ArithOp::Mul => Ok(l.wrapping_mul(r)),
                    ArithOp::Div => {
                        if r == 0 {
                            Err(runtime_error(format!("division by zero: {} / 0", l)))
                        } else {
                            Ok(l.wrapping_div(r))
                        }
                    }
                }
            }

            Expr::Compare { left, op, right } => {
                let l = self.evaluate(left)?;
                let r = self.evaluate(right)?;
                Ok(compare(*op, l, r) as i64)
            }

            Expr::Call { name, args } => self.call_procedure(name, args),
        }
    }

    fn call_procedure(&mut self, name: &str, args: &[Expr]) -> Result<i64, RuntimeError> {
        let procedure = self
            .env
            .procedure(name)
            .ok_or_else(|| runtime_error(format!("undefined procedure '{}'", name)))?;
        if procedure.params.len() != args.len() {
            return Err(runtime_error(format!(
                "procedure '{}' expects {} argument(s), got {}",
                name,
                procedure.params.len(),
                args.len()
            )));
        }

        // arguments evaluate in the caller's environment; the frame itself
        // hangs off the root, never off the caller
        let mut frame = Environment::frame(self.env.globals_handle());
        for (param, arg) in procedure.params.iter().zip(args) {
            let value = self.evaluate(arg)?;
            frame.declare(param, value);
        }
        // the slot named after the procedure is the implicit return value
        frame.declare(&procedure.name, 0);

        let caller = std::mem::replace(&mut self.env, frame);
        let result = self.execute(&procedure.body);
        let mut frame = std::mem::replace(&mut self.env, caller);
        result?;
        Ok(frame.get(&procedure.name))
    }

    /// One whitespace-delimited token from the input source. Several tokens
    /// on one line feed successive reads.
    fn next_input_token(&mut self) -> Result<String, RuntimeError> {
        let mut word = String::new();
        loop {
            let buf = self
                .input
                .fill_buf()
                .map_err(|e| runtime_error(format!("failed to read input: {}", e)))?;
            if buf.is_empty() {
                break;
            }
            let mut used = 0;
            let mut done = false;
            for &byte in buf {
                used += 1;
                if byte.is_ascii_whitespace() {
                    if !word.is_empty() {
                        done = true;
                        break;
                    }
                } else {
                    word.push(byte as char);
                }
            }
            self.input.consume(used);
            if done {
                break;
            }
        }
        if word.is_empty() {
            return Err(runtime_error("unexpected end of input"));
        }
        Ok(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn interpreter() -> Interpreter<Cursor<Vec<u8>>, Vec<u8>> {
        Interpreter::new(
            Environment::new(),
            Dialect::default(),
            Cursor::new(Vec::new()),
            Vec::new(),
        )
    }

    fn num(n: i64) -> Box<Expr> {
        Box::new(Expr::Number(n))
    }

    #[test]
    fn comparison_results_are_plain_integers() {
        let mut interp = interpreter();
        // (3 < 5) + 5: a comparison value flows straight into arithmetic
        let expr = Expr::Binary {
            left: Box::new(Expr::Compare {
                left: num(3),
                op: RelOp::Lt,
                right: num(5),
            }),
            op: ArithOp::Add,
            right: num(5),
        };
        assert_eq!(interp.evaluate(&expr).unwrap(), 6);
    }

    #[test]
    fn comparison_can_be_stored_in_a_variable() {
        let mut interp = interpreter();
        let program = Program {
            statements: vec![Stmt::Assign(Assignment {
                name: "x".into(),
                value: Expr::Compare {
                    left: num(4),
                    op: RelOp::Ge,
                    right: num(4),
                },
            })],
        };
        interp.run(&program).unwrap();
        assert_eq!(interp.env.get("x"), 1);
    }

    #[test]
    fn division_truncates_toward_zero() {
        let mut interp = interpreter();
        let div = |a, b| Expr::Binary {
            left: num(a),
            op: ArithOp::Div,
            right: num(b),
        };
        assert_eq!(interp.evaluate(&div(7, 2)).unwrap(), 3);
        assert_eq!(interp.evaluate(&div(-7, 2)).unwrap(), -3);
        assert!(interp.evaluate(&div(1, 0)).is_err());
    }
}
