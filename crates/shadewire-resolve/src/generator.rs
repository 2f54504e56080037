//! WGSL generation for transpiled function bodies.
//!
//! The generator walks the IR with a typed scope stack, so member access,
//! indexing and numeric literal typing are decided from known types rather
//! than from the text produced so far. Anything the body references by name
//! that is not a local is looked up in the function's externals and resolved
//! through the [`ResolutionCtx`].

use std::collections::{BTreeSet, HashMap};

use shadewire_ir::{AssignOp, BinaryOp, Block, Expression, Literal, Statement, UnaryOp};
use shadewire_schema::{Attribute, Scalar, Schema, VectorSize, io::with_locations};

use crate::builtins::{self, Builtin, ReturnRule};
use crate::context::ResolutionCtx;
use crate::error::{GenerationError, ResolveError};
use crate::item::{Function, Item, Stage, Value};
use crate::literal;
use crate::snippet::{Snippet, SnippetType};

type Result<T> = std::result::Result<T, ResolveError>;

/// `@vertex`, `@fragment` or `@compute @workgroup_size(..)`, with a
/// trailing space; empty for plain functions.
pub(crate) fn stage_attributes(stage: Stage) -> String {
    match stage {
        Stage::Plain => String::new(),
        Stage::Vertex => "@vertex ".into(),
        Stage::Fragment => "@fragment ".into(),
        Stage::Compute {
            workgroup_size: [x, y, z],
        } => format!("@compute @workgroup_size({x}, {y}, {z}) "),
    }
}

/// Attributes written in front of a struct member. Loose structs only
/// carry IO attributes; their layout lives on the host side.
pub(crate) fn member_attributes(schema: &Schema, loose: bool) -> String {
    let mut out = String::new();
    if let Some(builtin) = schema.builtin() {
        out.push_str(&format!("{builtin} "));
    }
    for attribute in schema.attributes() {
        let layout = matches!(attribute, Attribute::Align(_) | Attribute::Size(_));
        if !(loose && layout) {
            out.push_str(&format!("{attribute} "));
        }
    }
    out
}

/// Either generated text or a host value that has not been emitted yet.
///
/// Keeping values unemitted lets member access on records, calls to helpers
/// and calls to schemas happen at resolve time.
enum Operand {
    Code(Snippet),
    Value(Value),
}

/// Hands out `@location` indices to entry-point parameters that have none.
struct Locations {
    used: BTreeSet<u32>,
    next: u32,
}

impl Locations {
    fn new<'a>(schemas: impl IntoIterator<Item = &'a Schema>) -> Self {
        Self {
            used: schemas.into_iter().filter_map(Schema::location).collect(),
            next: 0,
        }
    }

    fn next_free(&mut self) -> u32 {
        while self.used.contains(&self.next) {
            self.next += 1;
        }
        self.used.insert(self.next);
        self.next
    }
}

pub(crate) struct Generator<'c, 'r> {
    ctx: &'c mut ResolutionCtx<'r>,
    externals: &'r [(String, Value)],
    scopes: Vec<HashMap<String, SnippetType>>,
    indent: usize,
    return_type: Option<Schema>,
}

impl<'c, 'r> Generator<'c, 'r> {
    pub(crate) fn new(ctx: &'c mut ResolutionCtx<'r>, externals: &'r [(String, Value)]) -> Self {
        Self {
            ctx,
            externals,
            scopes: Vec::new(),
            indent: 0,
            return_type: None,
        }
    }

    /// Emits the full declaration of `function` under `name`.
    pub(crate) fn function(
        &mut self,
        name: &str,
        function: &Function,
        ir: &shadewire_ir::Function,
    ) -> Result<String> {
        if ir.params.len() != function.params.len() {
            return Err(GenerationError::ArgumentCount {
                function: name.to_string(),
                expected: function.params.len(),
                found: ir.params.len(),
            }
            .into());
        }

        let mut locations = Locations::new(&function.params);
        let mut scope = HashMap::new();
        let mut params = Vec::with_capacity(ir.params.len());
        for (param, schema) in ir.params.iter().zip(&function.params) {
            let (attributes, schema) = self.io(function.stage, schema, &mut locations)?;
            let ty = self.ctx.resolve_schema(&schema)?;
            params.push(format!("{attributes}{param}: {ty}"));
            scope.insert(param.clone(), SnippetType::concrete(&schema));
        }

        let result = match &function.result {
            Some(schema) => {
                let mut locations = Locations::new([schema]);
                let (attributes, schema) = self.io(function.stage, schema, &mut locations)?;
                self.return_type = Some(schema.data());
                format!(" -> {attributes}{}", self.ctx.resolve_schema(&schema)?)
            }
            None => String::new(),
        };

        self.scopes.push(scope);
        let body = self.block(&ir.body)?;
        self.scopes.pop();

        Ok(format!(
            "{}fn {name}({}){result} {body}\n",
            stage_attributes(function.stage),
            params.join(", ")
        ))
    }

    /// IO attributes and the (possibly located) schema of an entry-point
    /// parameter or result.
    fn io(
        &mut self,
        stage: Stage,
        schema: &Schema,
        locations: &mut Locations,
    ) -> Result<(String, Schema)> {
        if !stage.is_entry_point() {
            return Ok((String::new(), schema.clone()));
        }
        if schema.as_struct().is_some() {
            return Ok((String::new(), with_locations(schema)?));
        }
        if let Some(builtin) = schema.builtin() {
            return Ok((format!("{builtin} "), schema.clone()));
        }
        let location = schema.location().unwrap_or_else(|| locations.next_free());
        let mut attributes = format!("@location({location}) ");
        for attribute in schema.attributes() {
            if let Attribute::Interpolate(..) = attribute {
                attributes.push_str(&format!("{attribute} "));
            }
        }
        Ok((attributes, schema.clone()))
    }

    fn pad(&self) -> String {
        "  ".repeat(self.indent)
    }

    fn local(&self, name: &str) -> Option<&SnippetType> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn external(&self, name: &str) -> Option<&'r Value> {
        self.externals
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Returns `true` if `name` refers to a local or an external.
    fn is_bound(&self, name: &str) -> bool {
        self.local(name).is_some() || self.external(name).is_some()
    }

    fn block(&mut self, block: &Block) -> Result<String> {
        self.scopes.push(HashMap::new());
        self.indent += 1;
        let mut out = String::from("{\n");
        for statement in &block.statements {
            out.push_str(&self.statement(statement)?);
        }
        self.indent -= 1;
        self.scopes.pop();
        out.push_str(&self.pad());
        out.push('}');
        Ok(out)
    }

    /// A statement used as a body; non-block statements get braces.
    fn body(&mut self, statement: &Statement) -> Result<String> {
        match statement {
            Statement::Block(block) => self.block(block),
            other => self.block(&Block::new([other.clone()])),
        }
    }

    fn statement(&mut self, statement: &Statement) -> Result<String> {
        let line = match statement {
            Statement::Block(block) => self.block(block)?,
            Statement::Return(None) => "return;".into(),
            Statement::Return(Some(value)) => {
                let value = self.expression(value)?;
                let value = match self.return_type.clone() {
                    Some(ty) => self.ctx.concretize(value, &ty)?,
                    None => value,
                };
                format!("return {};", value.code)
            }
            Statement::If {
                condition,
                accept,
                reject,
            } => self.if_chain(condition, accept, reject.as_deref())?,
            Statement::For {
                init,
                condition,
                update,
                body,
            } => {
                // Variables declared in the header are visible in the body only.
                self.scopes.push(HashMap::new());
                let init = match init {
                    Some(init) => self.simple_statement(init)?,
                    None => String::new(),
                };
                let condition = match condition {
                    Some(condition) => self.expression(condition)?.code,
                    None => String::new(),
                };
                let update = match update {
                    Some(update) => self.simple_statement(update)?,
                    None => String::new(),
                };
                let body = self.body(body)?;
                self.scopes.pop();
                format!("for ({init}; {condition}; {update}) {body}")
            }
            Statement::While { condition, body } => {
                let condition = self.expression(condition)?;
                let body = self.body(body)?;
                format!("while {} {body}", condition.code)
            }
            Statement::Declare { .. } | Statement::Expression(_) => {
                format!("{};", self.simple_statement(statement)?)
            }
            Statement::Break => "break;".into(),
            Statement::Continue => "continue;".into(),
        };
        Ok(format!("{}{line}\n", self.pad()))
    }

    fn if_chain(
        &mut self,
        condition: &Expression,
        accept: &Statement,
        reject: Option<&Statement>,
    ) -> Result<String> {
        let condition = self.expression(condition)?;
        let mut out = format!("if {} {}", condition.code, self.body(accept)?);
        match reject {
            Some(Statement::If {
                condition,
                accept,
                reject,
            }) => {
                out.push_str(" else ");
                out.push_str(&self.if_chain(condition, accept, reject.as_deref())?);
            }
            Some(other) => {
                out.push_str(" else ");
                out.push_str(&self.body(other)?);
            }
            None => {}
        }
        Ok(out)
    }

    /// Declarations and expression statements, without the trailing `;`.
    /// These are also the only statements allowed in a `for` header.
    fn simple_statement(&mut self, statement: &Statement) -> Result<String> {
        match statement {
            Statement::Declare { kind, name, init } => {
                let Some(init) = init else {
                    return Err(GenerationError::UntypedDeclaration(name.clone()).into());
                };
                let init = self.expression(init)?;
                let ty = init.ty.clone().defaulted();
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(name.clone(), ty);
                }
                Ok(format!("{} {name} = {}", kind.keyword(), init.code))
            }
            Statement::Expression(expression) => self.expression_statement(expression),
            other => Err(GenerationError::NotRepresentable(format!(
                "statement '{}' in a for header",
                other.to_string().trim()
            ))
            .into()),
        }
    }

    fn expression_statement(&mut self, expression: &Expression) -> Result<String> {
        match expression {
            Expression::Assign { op, target, value } => {
                let target = self.expression(target)?;
                let value = self.expression(value)?;
                let value = match (op, target.ty.schema()) {
                    (AssignOp::Assign, Some(schema)) => self.ctx.concretize(value, schema)?,
                    _ => self.unify_with(value, &target.ty)?,
                };
                Ok(format!("{} {} {}", target.code, op.symbol(), value.code))
            }
            Expression::Update { op, target, .. } => {
                let target = self.expression(target)?;
                Ok(format!("{}{}", target.code, op.symbol()))
            }
            other => {
                let snippet = self.expression(other)?;
                match (other, &snippet.ty) {
                    (Expression::Call { .. }, SnippetType::Void | SnippetType::Unknown) => {
                        Ok(snippet.code)
                    }
                    _ => Ok(format!("_ = {}", snippet.code)),
                }
            }
        }
    }

    fn expression(&mut self, expression: &Expression) -> Result<Snippet> {
        let operand = self.operand(expression)?;
        self.emit(operand)
    }

    fn emit(&mut self, operand: Operand) -> Result<Snippet> {
        match operand {
            Operand::Code(snippet) => Ok(snippet),
            Operand::Value(value) => self.ctx.resolve_value(&value),
        }
    }

    fn operand(&mut self, expression: &Expression) -> Result<Operand> {
        let snippet = match expression {
            Expression::Literal(Literal::Int(text)) => literal::abstract_int(text)?,
            Expression::Literal(Literal::Float(text)) => literal::abstract_float(text)?,
            Expression::Literal(Literal::Bool(b)) => Snippet::typed(b.to_string(), &Schema::BOOL),
            Expression::Identifier(name) => return self.identifier(name),
            Expression::Member { object, property } => return self.member(object, property),
            Expression::Index { object, index } => return self.index(object, index),
            Expression::Call { callee, arguments } => return self.call(callee, arguments),
            Expression::Binary { op, left, right } => self.binary(*op, left, right)?,
            Expression::Logical { op, left, right } => {
                let left = self.expression(left)?;
                let right = self.expression(right)?;
                let code = format!("({} {} {})", left.code, op.symbol(), right.code);
                Snippet::typed(code, &Schema::BOOL)
            }
            Expression::Unary { op, operand } => {
                let operand = self.expression(operand)?;
                let code = if operand.code.starts_with('-') {
                    format!("{}({})", op.symbol(), operand.code)
                } else {
                    format!("{}{}", op.symbol(), operand.code)
                };
                let ty = match op {
                    UnaryOp::Not => SnippetType::Concrete(Schema::BOOL),
                    UnaryOp::Negate | UnaryOp::BitwiseNot => operand.ty,
                };
                Snippet::new(code, ty)
            }
            Expression::Assign { .. } | Expression::Update { .. } => {
                return Err(GenerationError::AssignmentInExpression.into());
            }
        };
        Ok(Operand::Code(snippet))
    }

    /// Local scope, then externals, then WGSL type names.
    fn identifier(&mut self, name: &str) -> Result<Operand> {
        if let Some(ty) = self.local(name) {
            return Ok(Operand::Code(Snippet::new(name, ty.clone())));
        }
        if let Some(value) = self.external(name) {
            return Ok(Operand::Value(value.clone()));
        }
        if let Some(schema) = builtins::constructor(name) {
            return Ok(Operand::Value(Value::Schema(schema)));
        }
        Err(GenerationError::UnknownIdentifier(name.to_string()).into())
    }

    fn member(&mut self, object: &Expression, property: &str) -> Result<Operand> {
        if let Some(root) = object.path()
            && let Some(namespace) = root.split('.').next()
            && builtins::is_namespace(namespace)
            && !self.is_bound(namespace)
        {
            return Err(GenerationError::UnmappedBuiltin(format!("{root}.{property}")).into());
        }

        match self.operand(object)? {
            Operand::Value(value) => self.value_member(value, property),
            Operand::Code(snippet) => Ok(Operand::Code(self.code_member(snippet, property)?)),
        }
    }

    /// Member access on a host value. Slots and derived values are looked
    /// through first; `.value` and `.$` only perform that unwrapping.
    fn value_member(&mut self, value: Value, property: &str) -> Result<Operand> {
        let unwrapped = self.ctx.unwrap_value(&value)?;
        if matches!(property, "value" | "$") {
            return Ok(Operand::Value(unwrapped));
        }
        match &unwrapped {
            Value::Record(_) => unwrapped
                .field(property)
                .cloned()
                .map(Operand::Value)
                .ok_or_else(|| {
                    GenerationError::InvalidMemberAccess {
                        property: property.to_string(),
                        target: "record".into(),
                    }
                    .into()
                }),
            Value::Item(_) | Value::Code(_) => {
                let snippet = self.ctx.resolve_value(&unwrapped)?;
                Ok(Operand::Code(self.code_member(snippet, property)?))
            }
            other => Err(GenerationError::InvalidMemberAccess {
                property: property.to_string(),
                target: other.describe(),
            }
            .into()),
        }
    }

    fn code_member(&mut self, snippet: Snippet, property: &str) -> Result<Snippet> {
        let invalid = |target: String| GenerationError::InvalidMemberAccess {
            property: property.to_string(),
            target,
        };
        let schema = match &snippet.ty {
            SnippetType::Concrete(schema) => schema.clone(),
            SnippetType::Unknown => {
                return Ok(Snippet::raw(format!("{}.{property}", snippet.code)));
            }
            other => return Err(invalid(other.to_string()).into()),
        };

        match schema.undecorated() {
            Schema::Array(a) | Schema::LooseArray(a) if property == "length" => {
                Ok(if a.is_runtime_sized() {
                    Snippet::typed(format!("arrayLength(&{})", snippet.code), &Schema::U32)
                } else {
                    Snippet::new(a.count().to_string(), SnippetType::AbstractInt)
                })
            }
            Schema::Struct(s) | Schema::LooseStruct(s) => {
                let field = s.field(property).ok_or_else(|| invalid(schema.to_string()))?;
                Ok(Snippet::new(
                    format!("{}.{property}", snippet.code),
                    SnippetType::concrete(&field.schema),
                ))
            }
            Schema::Vector { size, scalar } => {
                let count = swizzle(property, *size).ok_or_else(|| invalid(schema.to_string()))?;
                let ty = match VectorSize::from_count(count) {
                    Some(size) => Schema::Vector {
                        size,
                        scalar: *scalar,
                    },
                    None => Schema::Scalar(*scalar),
                };
                Ok(Snippet::typed(format!("{}.{property}", snippet.code), &ty))
            }
            _ => Err(invalid(schema.to_string()).into()),
        }
    }

    fn index(&mut self, object: &Expression, index: &Expression) -> Result<Operand> {
        let base = self.operand(object)?;
        let index = self.expression(index)?;

        let base = match base {
            Operand::Value(value) => {
                let value = self.ctx.unwrap_value(&value)?;
                if let Value::Array(items) = &value
                    && index.ty == SnippetType::AbstractInt
                {
                    let position = literal::parse_int(&index.code)
                        .and_then(|i| usize::try_from(i).ok())
                        .and_then(|i| items.get(i))
                        .ok_or_else(|| {
                            GenerationError::InvalidIndex(format!("array value at {}", index.code))
                        })?;
                    return Ok(Operand::Value(position.clone()));
                }
                self.ctx.resolve_value(&value)?
            }
            Operand::Code(snippet) => snippet,
        };

        let ty = match &base.ty {
            SnippetType::Concrete(schema) => match schema.undecorated() {
                Schema::Array(a) | Schema::LooseArray(a) => SnippetType::concrete(a.element()),
                Schema::Vector { scalar, .. } => SnippetType::Concrete(Schema::Scalar(*scalar)),
                Schema::Matrix { size } => SnippetType::Concrete(Schema::Vector {
                    size: *size,
                    scalar: Scalar::F32,
                }),
                other => return Err(GenerationError::InvalidIndex(other.to_string()).into()),
            },
            SnippetType::Unknown => SnippetType::Unknown,
            other => return Err(GenerationError::InvalidIndex(other.to_string()).into()),
        };
        Ok(Operand::Code(Snippet::new(
            format!("{}[{}]", base.code, index.code),
            ty,
        )))
    }

    fn call(&mut self, callee: &Expression, arguments: &[Expression]) -> Result<Operand> {
        if let Some(path) = callee.path() {
            let root = path.split('.').next().unwrap_or_default();
            if !self.is_bound(root) {
                if let Some(builtin) = builtins::lookup(&path) {
                    return Ok(Operand::Code(self.builtin_call(builtin, arguments)?));
                }
                if path.contains('.') && builtins::is_namespace(root) {
                    return Err(GenerationError::UnmappedBuiltin(path).into());
                }
            }
        }

        match self.operand(callee)? {
            Operand::Value(value) => self.call_value(value, arguments),
            Operand::Code(snippet) => {
                let args = self.arguments(arguments, &[])?;
                Ok(Operand::Code(Snippet::raw(format!(
                    "{}({})",
                    snippet.code,
                    join(&args)
                ))))
            }
        }
    }

    /// Calls a host value. The documented inlining rule: a call is evaluated
    /// at resolve time exactly when the callee is a [`Value::Helper`].
    fn call_value(&mut self, value: Value, arguments: &[Expression]) -> Result<Operand> {
        let value = self.ctx.unwrap_value(&value)?;
        match value {
            Value::Helper(helper) => {
                let args = arguments
                    .iter()
                    .map(|a| self.compile_time_value(a))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Operand::Value(helper.call(&args)?))
            }
            Value::Schema(schema) => Ok(Operand::Code(self.construct(&schema, arguments)?)),
            Value::Item(item) if item.function().is_some() => {
                Ok(Operand::Code(self.call_function(&item, arguments)?))
            }
            Value::Code(snippet) => {
                let args = self.arguments(arguments, &[])?;
                Ok(Operand::Code(Snippet::raw(format!(
                    "{}({})",
                    snippet.code,
                    join(&args)
                ))))
            }
            other => Err(GenerationError::NotCallable(other.describe()).into()),
        }
    }

    /// The host-side value of a helper argument.
    fn compile_time_value(&mut self, expression: &Expression) -> Result<Value> {
        let snippet = match self.operand(expression)? {
            Operand::Value(value) => return Ok(value),
            Operand::Code(snippet) => snippet,
        };
        let value = match &snippet.ty {
            SnippetType::AbstractInt => literal::parse_int(&snippet.code).map(Value::AbstractInt),
            SnippetType::AbstractFloat => {
                literal::parse_float(&snippet.code).map(Value::AbstractFloat)
            }
            SnippetType::Concrete(schema) if *schema == Schema::BOOL => {
                snippet.code.parse().ok().map(Value::Bool)
            }
            _ => None,
        };
        Ok(value.unwrap_or(Value::Code(snippet)))
    }

    /// Generates call arguments, binding abstract ones to `params` by position.
    fn arguments(&mut self, arguments: &[Expression], params: &[Schema]) -> Result<Vec<Snippet>> {
        arguments
            .iter()
            .enumerate()
            .map(|(i, argument)| {
                let snippet = self.expression(argument)?;
                match params.get(i) {
                    Some(param) => self.ctx.concretize(snippet, param),
                    None => Ok(snippet),
                }
            })
            .collect()
    }

    fn construct(&mut self, schema: &Schema, arguments: &[Expression]) -> Result<Snippet> {
        let name = self.ctx.resolve_schema(schema)?;
        let data = schema.data();
        let params: Vec<Schema> = match data.undecorated() {
            Schema::Struct(s) | Schema::LooseStruct(s) => {
                if !arguments.is_empty() && arguments.len() != s.fields().len() {
                    return Err(GenerationError::ArgumentCount {
                        function: name,
                        expected: s.fields().len(),
                        found: arguments.len(),
                    }
                    .into());
                }
                s.fields().iter().map(|f| f.schema.data()).collect()
            }
            Schema::Vector { scalar, .. } => vec![Schema::Scalar(*scalar); arguments.len()],
            Schema::Matrix { .. } => vec![Schema::F32; arguments.len()],
            Schema::Array(a) => vec![a.element().data(); arguments.len()],
            _ => Vec::new(),
        };
        let args = self.arguments(arguments, &params)?;
        Ok(Snippet::typed(format!("{name}({})", join(&args)), &data))
    }

    fn call_function(&mut self, item: &Item, arguments: &[Expression]) -> Result<Snippet> {
        let registry = self.ctx.registry();
        let Some(handle) = item.function() else {
            return Err(GenerationError::NotCallable("item".into()).into());
        };
        let function = &registry.functions()[handle];
        let name = self.ctx.resolve_item(item)?.code;
        if arguments.len() != function.params.len() {
            return Err(GenerationError::ArgumentCount {
                function: name,
                expected: function.params.len(),
                found: arguments.len(),
            }
            .into());
        }
        let params: Vec<Schema> = function.params.iter().map(Schema::data).collect();
        let args = self.arguments(arguments, &params)?;
        let ty = match &function.result {
            Some(result) => SnippetType::concrete(result),
            None => SnippetType::Void,
        };
        Ok(Snippet::new(format!("{name}({})", join(&args)), ty))
    }

    fn builtin_call(&mut self, builtin: Builtin, arguments: &[Expression]) -> Result<Snippet> {
        let mut args = self.arguments(arguments, &[])?;

        // Abstract arguments take the scalar type of the first concrete one.
        let common = args
            .iter()
            .filter_map(|a| a.ty.scalar())
            .find(|s| *s != Scalar::BOOL);
        if let Some(scalar) = common {
            for arg in &mut args {
                if arg.ty.is_abstract() {
                    *arg = self
                        .ctx
                        .concretize(arg.clone(), &Schema::Scalar(scalar))?;
                }
            }
        }

        let first = args.first().map(|a| a.ty.clone()).unwrap_or(SnippetType::Unknown);
        let ty = match builtin.ret {
            ReturnRule::FirstArg => first,
            ReturnRule::ComponentScalar => match first.scalar() {
                Some(scalar) => SnippetType::Concrete(Schema::Scalar(scalar)),
                None => first,
            },
            ReturnRule::Fixed(fixed) => SnippetType::Concrete(fixed.schema()),
            ReturnRule::Void => SnippetType::Void,
        };
        if builtin.takes_pointer
            && let Some(first) = args.first_mut()
        {
            first.code = format!("&{}", first.code);
        }
        Ok(Snippet::new(format!("{}({})", builtin.wgsl, join(&args)), ty))
    }

    fn binary(&mut self, op: BinaryOp, left: &Expression, right: &Expression) -> Result<Snippet> {
        let left = self.expression(left)?;
        let right = self.expression(right)?;
        let (left, right) = if op.is_shift() {
            let right = self.ctx.concretize(right, &Schema::U32)?;
            (left, right)
        } else {
            let left = self.unify_with(left, &right.ty)?;
            let right = self.unify_with(right, &left.ty)?;
            (left, right)
        };
        let ty = binary_type(op, &left.ty, &right.ty);
        Ok(Snippet::new(
            format!("({} {} {})", left.code, op.symbol(), right.code),
            ty,
        ))
    }

    /// Concretizes an abstract snippet to the component scalar of `partner`.
    fn unify_with(&mut self, snippet: Snippet, partner: &SnippetType) -> Result<Snippet> {
        match partner.scalar() {
            Some(scalar) if snippet.ty.is_abstract() => {
                self.ctx.concretize(snippet, &Schema::Scalar(scalar))
            }
            _ => Ok(snippet),
        }
    }
}

fn join(args: &[Snippet]) -> String {
    args.iter()
        .map(|a| a.code.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Number of components selected by a swizzle, if it is valid for `size`.
fn swizzle(property: &str, size: VectorSize) -> Option<usize> {
    const SETS: [&str; 2] = ["xyzw", "rgba"];
    let count = property.len();
    if !(1..=4).contains(&count) {
        return None;
    }
    SETS.iter()
        .any(|set| {
            property
                .chars()
                .all(|c| set.find(c).is_some_and(|i| (i as u64) < size.count()))
        })
        .then_some(count)
}

/// Result type of a binary operation with already unified operands.
fn binary_type(op: BinaryOp, left: &SnippetType, right: &SnippetType) -> SnippetType {
    if left.is_abstract() && right.is_abstract() {
        return if op.is_comparison() {
            SnippetType::Concrete(Schema::BOOL)
        } else if *left == SnippetType::AbstractFloat || *right == SnippetType::AbstractFloat {
            SnippetType::AbstractFloat
        } else {
            SnippetType::AbstractInt
        };
    }
    if op.is_comparison() {
        let vector = [left, right].into_iter().find_map(|ty| match ty.schema() {
            Some(Schema::Vector { size, .. }) => Some(*size),
            _ => None,
        });
        return SnippetType::Concrete(match vector {
            Some(size) => Schema::Vector {
                size,
                scalar: Scalar::BOOL,
            },
            None => Schema::BOOL,
        });
    }
    if op.is_shift() {
        return left.clone();
    }
    match (left.schema(), right.schema()) {
        (Some(Schema::Matrix { .. }), Some(v @ Schema::Vector { .. }))
        | (Some(v @ Schema::Vector { .. }), Some(Schema::Matrix { .. }))
            if op == BinaryOp::Multiply =>
        {
            SnippetType::Concrete(v.clone())
        }
        (Some(Schema::Scalar(_)), Some(r @ (Schema::Vector { .. } | Schema::Matrix { .. }))) => {
            SnippetType::Concrete(r.clone())
        }
        (Some(_), _) => left.clone(),
        (None, Some(_)) => right.clone(),
        (None, None) => SnippetType::Unknown,
    }
}
