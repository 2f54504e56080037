//! Debug dump of IR trees in a JavaScript-like surface syntax.

use std::fmt;

use crate::expr::{Expression, Literal};
use crate::stmt::{Block, Function, Statement};

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(text) | Self::Float(text) => f.write_str(text),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Identifier(name) => f.write_str(name),
            Self::Binary { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Self::Logical { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Self::Assign { op, target, value } => write!(f, "{target} {} {value}", op.symbol()),
            Self::Unary { op, operand } => write!(f, "{}{operand}", op.symbol()),
            Self::Update {
                op,
                prefix: true,
                target,
            } => write!(f, "{}{target}", op.symbol()),
            Self::Update { op, target, .. } => write!(f, "{target}{}", op.symbol()),
            Self::Member { object, property } => write!(f, "{object}.{property}"),
            Self::Index { object, index } => write!(f, "{object}[{index}]"),
            Self::Call { callee, arguments } => {
                write!(f, "{callee}(")?;
                for (i, arg) in arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

fn write_indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    write!(f, "{:width$}", "", width = depth * 2)
}

fn write_block(f: &mut fmt::Formatter<'_>, block: &Block, depth: usize) -> fmt::Result {
    writeln!(f, "{{")?;
    for stmt in &block.statements {
        write_statement(f, stmt, depth + 1)?;
    }
    write_indent(f, depth)?;
    write!(f, "}}")
}

fn write_inline(f: &mut fmt::Formatter<'_>, stmt: &Statement, depth: usize) -> fmt::Result {
    match stmt {
        Statement::Block(block) => write_block(f, block, depth),
        other => write_block(f, &Block::new([other.clone()]), depth),
    }
}

fn write_header(f: &mut fmt::Formatter<'_>, stmt: &Statement) -> fmt::Result {
    match stmt {
        Statement::Declare { kind, name, init } => {
            write!(f, "{} {name}", kind.keyword())?;
            if let Some(init) = init {
                write!(f, " = {init}")?;
            }
            Ok(())
        }
        Statement::Expression(e) => write!(f, "{e}"),
        _ => Ok(()),
    }
}

fn write_statement(f: &mut fmt::Formatter<'_>, stmt: &Statement, depth: usize) -> fmt::Result {
    write_indent(f, depth)?;
    match stmt {
        Statement::Block(block) => write_block(f, block, depth)?,
        Statement::Return(None) => write!(f, "return;")?,
        Statement::Return(Some(e)) => write!(f, "return {e};")?,
        Statement::If {
            condition,
            accept,
            reject,
        } => {
            write!(f, "if ({condition}) ")?;
            write_inline(f, accept, depth)?;
            if let Some(reject) = reject {
                write!(f, " else ")?;
                write_inline(f, reject, depth)?;
            }
        }
        Statement::For {
            init,
            condition,
            update,
            body,
        } => {
            write!(f, "for (")?;
            if let Some(init) = init {
                write_header(f, init)?;
            }
            write!(f, "; ")?;
            if let Some(condition) = condition {
                write!(f, "{condition}")?;
            }
            write!(f, "; ")?;
            if let Some(update) = update {
                write_header(f, update)?;
            }
            write!(f, ") ")?;
            write_inline(f, body, depth)?;
        }
        Statement::While { condition, body } => {
            write!(f, "while ({condition}) ")?;
            write_inline(f, body, depth)?;
        }
        Statement::Declare { .. } | Statement::Expression(_) => {
            write_header(f, stmt)?;
            write!(f, ";")?;
        }
        Statement::Break => write!(f, "break;")?,
        Statement::Continue => write!(f, "continue;")?,
    }
    writeln!(f)
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_statement(f, self, 0)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) ", self.params.join(", "))?;
        write_block(f, &self.body, 0)?;
        writeln!(f)
    }
}
