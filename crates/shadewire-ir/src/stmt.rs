//! Statements and function bodies.

use crate::expr::Expression;

/// A braced statement list; it introduces a lexical scope.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: impl IntoIterator<Item = Statement>) -> Self {
        Self {
            statements: statements.into_iter().collect(),
        }
    }
}

/// `let` binds an immutable value, `var` a mutable one.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum DeclarationKind {
    Let,
    Var,
}

impl DeclarationKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Let => "let",
            Self::Var => "var",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Block(Block),
    Return(Option<Expression>),
    If {
        condition: Expression,
        accept: Box<Statement>,
        /// Another `If` here is rendered as `else if`.
        reject: Option<Box<Statement>>,
    },
    For {
        init: Option<Box<Statement>>,
        condition: Option<Expression>,
        update: Option<Box<Statement>>,
        body: Box<Statement>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    Declare {
        kind: DeclarationKind,
        name: String,
        init: Option<Expression>,
    },
    Expression(Expression),
    Break,
    Continue,
}

impl Statement {
    pub fn block(statements: impl IntoIterator<Item = Statement>) -> Self {
        Self::Block(Block::new(statements))
    }

    pub fn ret(value: Expression) -> Self {
        Self::Return(Some(value))
    }

    pub fn let_(name: impl Into<String>, init: Expression) -> Self {
        Self::Declare {
            kind: DeclarationKind::Let,
            name: name.into(),
            init: Some(init),
        }
    }

    pub fn var(name: impl Into<String>, init: Option<Expression>) -> Self {
        Self::Declare {
            kind: DeclarationKind::Var,
            name: name.into(),
            init,
        }
    }

    pub fn expr(expression: Expression) -> Self {
        Self::Expression(expression)
    }

    pub fn if_(condition: Expression, accept: Statement, reject: Option<Statement>) -> Self {
        Self::If {
            condition,
            accept: Box::new(accept),
            reject: reject.map(Box::new),
        }
    }

    pub fn for_(
        init: Option<Statement>,
        condition: Option<Expression>,
        update: Option<Statement>,
        body: Statement,
    ) -> Self {
        Self::For {
            init: init.map(Box::new),
            condition,
            update: update.map(Box::new),
            body: Box::new(body),
        }
    }

    pub fn while_(condition: Expression, body: Statement) -> Self {
        Self::While {
            condition,
            body: Box::new(body),
        }
    }
}

/// A transpiled host function: parameter names plus a body.
///
/// Parameter and return types come from the function's declared shell,
/// not from the IR.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Function {
    pub params: Vec<String>,
    pub body: Block,
}

impl Function {
    pub fn new<S: Into<String>>(params: impl IntoIterator<Item = S>, body: Block) -> Self {
        Self {
            params: params.into_iter().map(Into::into).collect(),
            body,
        }
    }
}
