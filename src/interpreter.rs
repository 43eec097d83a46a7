//! Tree-walking evaluator.
//!
//! Holds the globals environment, the environment active at the current
//! point of execution, and the resolver's side table mapping
//! reference-bearing expressions to lexical depths.  Non-local exits
//! (`return` and runtime errors) travel as [`Unwind`] values through `?`;
//! function and lambda calls catch the `Return` arm, the driver catches the
//! `Error` arm at the top level.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::callable::{Callable, Class, Function, Instance, Lambda, NativeFunction};
use crate::environment::Environment;
use crate::error::{CorvidError, ErrorReporter};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Non-local exits from evaluation.
#[derive(Debug)]
pub enum Unwind {
    /// A `return` statement, caught at the nearest function boundary.
    Return(Value),

    /// A runtime error, propagated to the top level.
    Error(CorvidError),
}

impl From<CorvidError> for Unwind {
    fn from(err: CorvidError) -> Self {
        Unwind::Error(err)
    }
}

/// Result alias for evaluation; `Err` is an unwind, not necessarily an error.
pub type Exec<T> = std::result::Result<T, Unwind>;

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    /// Resolver side table: reference-expression identity → scope distance.
    locals: HashMap<ExprId, usize>,
    output: Rc<RefCell<dyn Write>>,
}

impl Interpreter {
    pub fn new(output: Rc<RefCell<dyn Write>>) -> Self {
        let globals: Rc<RefCell<Environment>> = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(Rc::new(NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: clock_native,
            })),
        );

        Interpreter {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Record a reference expression as a local at the given depth.  Called
    /// by the resolver; references absent from the table are globals.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Run the program.  Stops at the first runtime error.
    pub fn interpret(&mut self, statements: &[Stmt], reporter: &mut ErrorReporter) {
        info!("Interpreting {} statement(s)", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}

                Err(Unwind::Error(e)) => {
                    reporter.runtime_error(&e);
                    return;
                }

                // The resolver rejects top-level `return`.
                Err(Unwind::Return(_)) => {
                    debug!("Return unwind escaped to top level");
                    return;
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> Exec<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.output.borrow_mut(), "{}", value)
                    .map_err(|e| Unwind::Error(CorvidError::Io(e)))?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = if let Some(expr) = initializer {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let environment: Rc<RefCell<Environment>> = Rc::new(RefCell::new(
                    Environment::with_enclosing(self.environment.clone()),
                ));

                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function(declaration) => {
                let function: Function =
                    Function::new(declaration.clone(), self.environment.clone(), false);

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(Unwind::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    /// Execute statements under the given environment, restoring the prior
    /// environment on every exit path (including unwinds).
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Exec<()> {
        let previous: Rc<RefCell<Environment>> =
            std::mem::replace(&mut self.environment, environment);

        let mut result: Exec<()> = Ok(());

        for stmt in statements {
            result = self.execute(stmt);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Exec<()> {
        // 1. The superclass expression must evaluate to a class.
        let superclass_value: Option<Rc<Class>> = match superclass {
            Some(expr) => {
                let value: Value = self.evaluate(expr)?;

                match value {
                    Value::Class(class) => Some(class),

                    _ => {
                        let super_name: &Token = match expr {
                            Expr::Variable { name, .. } => name,
                            _ => unreachable!("superclass is always a variable"),
                        };

                        return Err(
                            CorvidError::runtime(super_name, "Superclass must be a class.").into()
                        );
                    }
                }
            }

            None => None,
        };

        // 2. Two-phase definition lets methods refer to the class by name.
        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        // 3. Methods of a subclass close over an extra frame holding `super`.
        let previous: Rc<RefCell<Environment>> = self.environment.clone();

        if let Some(superclass) = &superclass_value {
            let environment: Rc<RefCell<Environment>> = Rc::new(RefCell::new(
                Environment::with_enclosing(self.environment.clone()),
            ));

            environment
                .borrow_mut()
                .define("super", Value::Class(superclass.clone()));

            self.environment = environment;
        }

        // 4. Build the method table; `init` is the initializer.
        let mut method_map: HashMap<String, Rc<Function>> = HashMap::new();

        for method in methods {
            let is_initializer: bool = method.name.lexeme == "init";

            let function: Function =
                Function::new(method.clone(), self.environment.clone(), is_initializer);

            method_map.insert(method.name.lexeme.clone(), Rc::new(function));
        }

        let class: Class = Class::new(name.lexeme.clone(), superclass_value.clone(), method_map);

        // 5. Drop the `super` frame before binding the class name.
        if superclass_value.is_some() {
            self.environment = previous;
        }

        let assigned: bool = self
            .environment
            .borrow_mut()
            .assign(&name.lexeme, Value::Class(Rc::new(class)));

        debug_assert!(assigned, "class name vanished between define and assign");

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Exec<Value> {
        match expr {
            Expr::Literal(token) => self.evaluate_literal(token),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { op, right } => self.evaluate_unary(op, right),

            Expr::Binary { left, op, right } => self.evaluate_binary(left, op, right),

            Expr::Logical { left, op, right } => self.evaluate_logical(left, op, right),

            Expr::Variable { id, name } => self.lookup_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                let assigned: bool = match self.locals.get(id) {
                    Some(distance) => Environment::assign_at(
                        &self.environment,
                        *distance,
                        &name.lexeme,
                        value.clone(),
                    ),

                    None => self.globals.borrow_mut().assign(&name.lexeme, value.clone()),
                };

                if !assigned {
                    return Err(CorvidError::runtime(
                        name,
                        format!("Undefined variable '{}'.", name.lexeme),
                    )
                    .into());
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Lambda(declaration) => Ok(Value::Lambda(Rc::new(Lambda::new(
                declaration.clone(),
                self.environment.clone(),
            )))),

            Expr::Get { object, name } => {
                let object: Value = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => Instance::get(&instance, &name.lexeme)
                        .ok_or_else(|| {
                            CorvidError::runtime(
                                name,
                                format!("Undefined property '{}'.", name.lexeme),
                            )
                            .into()
                        }),

                    _ => Err(
                        CorvidError::runtime(name, "Only instances have properties.").into(),
                    ),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object: Value = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => {
                        let value: Value = self.evaluate(value)?;

                        instance.borrow_mut().set(&name.lexeme, value.clone());

                        Ok(value)
                    }

                    _ => Err(CorvidError::runtime(name, "Only instances have fields.").into()),
                }
            }

            Expr::This { id, keyword } => self.lookup_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_literal(&self, token: &Token) -> Exec<Value> {
        match &token.token_type {
            TokenType::NUMBER(n) => Ok(Value::Number(*n)),

            TokenType::STRING(s) => Ok(Value::String(s.clone())),

            TokenType::TRUE => Ok(Value::Bool(true)),

            TokenType::FALSE => Ok(Value::Bool(false)),

            TokenType::NIL => Ok(Value::Nil),

            _ => Err(CorvidError::runtime(token, "Invalid literal.").into()),
        }
    }

    fn evaluate_unary(&mut self, op: &Token, right: &Expr) -> Exec<Value> {
        let value: Value = self.evaluate(right)?;

        match op.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(CorvidError::runtime(op, "Operand must be a number.").into()),
            },

            TokenType::BANG => Ok(Value::Bool(!value.is_truthy())),

            _ => Err(CorvidError::runtime(op, "Invalid unary operator.").into()),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Exec<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        match op.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(CorvidError::runtime(
                    op,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(CorvidError::runtime(op, "Operands must be numbers.").into()),
            },

            TokenType::STAR => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(CorvidError::runtime(op, "Operands must be numbers.").into()),
            },

            // Division by zero follows IEEE-754.
            TokenType::SLASH => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),

                _ => Err(CorvidError::runtime(op, "Operands must be numbers.").into()),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            TokenType::LESS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(CorvidError::runtime(op, "Operands must be numbers.").into()),
            },

            TokenType::LESS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(CorvidError::runtime(op, "Operands must be numbers.").into()),
            },

            TokenType::GREATER => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(CorvidError::runtime(op, "Operands must be numbers.").into()),
            },

            TokenType::GREATER_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(CorvidError::runtime(op, "Operands must be numbers.").into()),
            },

            _ => Err(CorvidError::runtime(op, "Invalid binary operator.").into()),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, op: &Token, right: &Expr) -> Exec<Value> {
        let left_val: Value = self.evaluate(left)?;

        match op.token_type {
            // Short-circuit: the operand itself is the result, uncoerced.
            TokenType::OR => {
                if left_val.is_truthy() {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            TokenType::AND => {
                if !left_val.is_truthy() {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            _ => Err(CorvidError::runtime(op, "Invalid logical operator.").into()),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Exec<Value> {
        let callee_val: Value = self.evaluate(callee)?;

        let mut args: Vec<Value> = Vec::with_capacity(arguments.len());

        for argument in arguments {
            args.push(self.evaluate(argument)?);
        }

        let callable: &dyn Callable = match &callee_val {
            Value::Function(function) => function.as_ref(),

            Value::Lambda(lambda) => lambda.as_ref(),

            Value::Class(class) => class,

            Value::NativeFunction(native) => native.as_ref(),

            _ => {
                return Err(
                    CorvidError::runtime(paren, "Can only call functions and classes.").into(),
                );
            }
        };

        if args.len() != callable.arity() {
            return Err(CorvidError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    args.len()
                ),
            )
            .into());
        }

        callable.call(self, args)
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Exec<Value> {
        // The resolver records the depth of the `super` frame; `this` lives
        // one frame below it.
        let distance: usize = match self.locals.get(&id) {
            Some(distance) => *distance,

            None => {
                return Err(CorvidError::runtime(keyword, "Undefined variable 'super'.").into());
            }
        };

        let superclass: Rc<Class> =
            match Environment::get_at(&self.environment, distance, "super") {
                Some(Value::Class(class)) => class,

                _ => {
                    return Err(
                        CorvidError::runtime(keyword, "Undefined variable 'super'.").into()
                    );
                }
            };

        let instance: Rc<RefCell<Instance>> =
            match Environment::get_at(&self.environment, distance - 1, "this") {
                Some(Value::Instance(instance)) => instance,

                _ => {
                    return Err(
                        CorvidError::runtime(keyword, "Undefined variable 'this'.").into()
                    );
                }
            };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),

            None => Err(CorvidError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )
            .into()),
        }
    }

    fn lookup_variable(&self, id: ExprId, name: &Token) -> Exec<Value> {
        let value: Option<Value> = match self.locals.get(&id) {
            Some(distance) => Environment::get_at(&self.environment, *distance, &name.lexeme),

            None => self.globals.borrow().get(&name.lexeme),
        };

        value.ok_or_else(|| {
            CorvidError::runtime(name, format!("Undefined variable '{}'.", name.lexeme)).into()
        })
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Rc::new(RefCell::new(io::stdout())))
    }
}

/// Wall-clock seconds since the Unix epoch.
fn clock_native(_args: &[Value]) -> Value {
    let timestamp: f64 = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);

    Value::Number(timestamp)
}
