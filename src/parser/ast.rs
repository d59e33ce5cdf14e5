use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq, // =
    Ne, // <>
    Lt, // <
    Gt, // >
    Le, // <=
    Ge, // >=
}

/// Every expression evaluates to a single integer. A comparison is an
/// ordinary expression yielding 1 or 0, so it can be stored, printed, or fed
/// back into arithmetic.
#[derive(Debug, Clone)]
pub enum Expr {
    Number(i64),
    Variable(String),
    Binary {
        left: Box<Expr>,
        op: ArithOp,
        right: Box<Expr>,
    },
    Compare {
        left: Box<Expr>,
        op: RelOp,
        right: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Assign(Assignment),
    Block(Vec<Stmt>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    /// Built by the parser from `FOR x := a TO b DO body`: `init` is
    /// `x := a`, `condition` is `x < b`, `update` is `x := x + 1`. The
    /// interpreter never sees the surface form.
    For {
        init: Assignment,
        condition: Expr,
        update: Assignment,
        body: Box<Stmt>,
    },
    Readln {
        name: String,
    },
    Writeln(Expr),
    /// Executing the declaration registers the procedure in the root
    /// environment, wherever in the program it appears.
    Procedure(Rc<Procedure>),
}

#[derive(Debug, Clone)]
pub struct Procedure {
    pub name: String,
    pub params: Vec<String>,
    pub body: Stmt,
}

#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        })
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RelOp::Eq => "=",
            RelOp::Ne => "<>",
            RelOp::Lt => "<",
            RelOp::Gt => ">",
            RelOp::Le => "<=",
            RelOp::Ge => ">=",
        })
    }
}

// The printed form keeps a space between every token. The scanner merges
// adjacent operand characters into one run, so `((` would not re-scan as two
// parentheses.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) if *n < 0 => write!(f, "( 0 - {} )", n.unsigned_abs()),
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Variable(name) => f.write_str(name),
            Expr::Binary { left, op, right } => write!(f, "( {} {} {} )", left, op, right),
            Expr::Compare { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expr::Call { name, args } => {
                write!(f, "{} (", name)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                f.write_str(" )")
            }
        }
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} := {}", self.name, self.value)
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Assign(assignment) => write!(f, "{} ;", assignment),
            Stmt::Block(statements) => {
                f.write_str("BEGIN\n")?;
                for statement in statements {
                    writeln!(f, "{}", statement)?;
                }
                f.write_str("END ;")
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(f, "IF {} THEN {}", condition, then_branch)?;
                if let Some(else_branch) = else_branch {
                    write!(f, " ELSE {}", else_branch)?;
                }
                Ok(())
            }
            Stmt::While { condition, body } => write!(f, "WHILE {} DO {}", condition, body),
            Stmt::For {
                init,
                condition,
                update: _,
                body,
            } => {
                // recover the surface bound from the desugared condition
                let bound = match condition {
                    Expr::Compare { right, .. } => right,
                    _ => unreachable!("FOR condition is always a comparison"),
                };
                write!(f, "FOR {} TO {} DO {}", init, bound, body)
            }
            Stmt::Readln { name } => write!(f, "READLN ( {} ) ;", name),
            Stmt::Writeln(expr) => write!(f, "WRITELN ( {} ) ;", expr),
            Stmt::Procedure(procedure) => {
                write!(f, "PROCEDURE {} (", procedure.name)?;
                for param in &procedure.params {
                    write!(f, " {}", param)?;
                }
                write!(f, " )\n{}", procedure.body)
            }
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{}", statement)?;
        }
        Ok(())
    }
}
