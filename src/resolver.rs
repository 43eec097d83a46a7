//! Static resolution pass.
//!
//! A single AST walk between parsing and evaluation that:
//! 1. **Builds lexical scopes**: maintains a stack of `HashMap<String, bool>`
//!    tracking declared (false) and fully defined (true) names in each
//!    nested block, function, or class body.
//! 2. **Enforces static rules**: redeclaration in the same scope, reading a
//!    variable in its own initializer, `return` outside a function or with a
//!    value inside an initializer, `this`/`super` outside their classes.
//! 3. **Records binding distances**: for every reference-bearing expression
//!    (`Variable`, `Assign`, `This`, `Super`), notes its lexical depth in
//!    the interpreter's side table so the runtime climbs exactly the right
//!    number of environment frames.  References not found in any scope are
//!    globals and stay out of the table.
//!
//! Errors are reported through the driver's [`ErrorReporter`] and resolution
//! continues, so one run surfaces every static error at once.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::error::{CorvidError, ErrorReporter};
use crate::interpreter::Interpreter;
use crate::token::Token;

/// What kind of function body we are inside.  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ClassType {
    /// Not inside any class.
    None,

    /// Inside a class declaration _without_ a superclass.
    Class,

    /// Inside a class declaration _with_ a superclass.
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and records binding
/// distances by calling back into the interpreter.
pub struct Resolver<'i, 'r> {
    interpreter: &'i mut Interpreter,
    reporter: &'r mut ErrorReporter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'i, 'r> Resolver<'i, 'r> {
    /// Create a new resolver bound to the given interpreter and reporter.
    pub fn new(interpreter: &'i mut Interpreter, reporter: &'r mut ErrorReporter) -> Self {
        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top-level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    fn error(&mut self, token: &Token, msg: &str) {
        let err: CorvidError = CorvidError::resolve(token, msg);

        self.reporter.error(&err);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        debug!("Resolving stmt: {:?}", stmt);

        match stmt {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),

            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // Declare before the initializer, define after: reading the
                // name inside its own initializer is a static error.
                self.declare(name);

                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                self.define(name);
            }

            Stmt::Function(declaration) => {
                // Define eagerly so the function can recurse.
                self.declare(&declaration.name);
                self.define(&declaration.name);

                self.resolve_function(
                    FunctionType::Function,
                    &declaration.params,
                    &declaration.body,
                );
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code!");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Can't return a value from an initializer!");
                    }

                    self.resolve_expr(expr);
                }
            }
        }
    }

    fn resolve_class(&mut self, name: &Token, superclass: Option<&Expr>, methods: &[Rc<FunctionDecl>]) {
        // 1. Declare & define the class name so methods can refer to it.
        self.declare(name);
        self.define(name);

        // 2. Save and enter the class context.
        let enclosing_class: ClassType = self.current_class;

        self.current_class = if superclass.is_some() {
            ClassType::Subclass
        } else {
            ClassType::Class
        };

        // 3. Resolve the superclass reference, guarding self-inheritance.
        if let Some(super_expr) = superclass {
            if let Expr::Variable {
                name: super_name, ..
            } = super_expr
            {
                if super_name.lexeme == name.lexeme {
                    self.error(super_name, "A class can't inherit from itself.");
                }
            }

            self.resolve_expr(super_expr);

            // 4. Open the `super` scope surrounding every method.
            self.begin_scope();
            self.scope_insert("super");
        }

        // 5. Open the implicit `this` scope, one level inside `super`.
        self.begin_scope();
        self.scope_insert("this");

        // 6. Resolve each method in its own function context.
        for method in methods {
            let kind: FunctionType = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };

            self.resolve_function(kind, &method.params, &method.body);
        }

        // 7. Close the `this` scope, then the `super` scope if present.
        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        // 8. Restore the outer class context.
        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.error(name, "Can't read local variable in its own initializer!");
                    }
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Lambda(declaration) => {
                self.resolve_function(
                    FunctionType::Function,
                    &declaration.params,
                    &declaration.body,
                );
            }

            Expr::Get { object, .. } => {
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class!");
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(keyword, "Can't use 'super' outside of a class!");
                        return;
                    }

                    ClassType::Class => {
                        self.error(keyword, "Can't use 'super' in a class with no superclass!");
                        return;
                    }

                    ClassType::Subclass => {}
                }

                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    ///
    /// `kind` distinguishes plain functions, methods, and initializers.
    fn resolve_function(&mut self, kind: FunctionType, params: &[Token], body: &[Stmt]) {
        let enclosing: FunctionType = self.current_function;

        self.current_function = kind;

        self.begin_scope();

        for param in params {
            self.declare(param);
            self.define(param);
        }

        for stmt in body {
            self.resolve_stmt(stmt);
        }

        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Insert an implicit binding (`this`/`super`) into the innermost scope.
    fn scope_insert(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.reporter.error(&CorvidError::resolve(
                    name,
                    "Already a variable with this name in this scope!",
                ));

                return;
            }

            // Declared but not yet defined.
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────

    /// Record this reference as a local at depth `d`, or leave it global.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                self.interpreter.note_local(id, depth);

                return;
            }
        }

        // Not found in any scope: resolves against globals at runtime.
        debug!("Resolved '{}' as global", name.lexeme);
    }
}
