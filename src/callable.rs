//! Runtime callables: user functions and lambdas, classes (calling one
//! constructs an instance), and natives.
//!
//! A `Function` pairs its declaration with the environment captured where
//! the declaration was evaluated; `bind` layers one extra frame holding
//! `this` on top of that closure.  Debug output prints environments by
//! address because closure chains can be cyclic.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::{FunctionDecl, LambdaDecl};
use crate::environment::Environment;
use crate::interpreter::{Exec, Interpreter, Unwind};
use crate::value::Value;

/// The capability set shared by everything that can be called.
pub trait Callable {
    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Exec<Value>;
}

// ─────────────────────────────────────────────────────────────────────────
// User functions
// ─────────────────────────────────────────────────────────────────────────

pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl Function {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Function {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// A copy of this method whose closure has `this` bound to `instance`.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Function {
        let environment: Rc<RefCell<Environment>> = Rc::new(RefCell::new(
            Environment::with_enclosing(self.closure.clone()),
        ));

        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        Function {
            declaration: self.declaration.clone(),
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }

    /// The `this` an initializer returns, at depth 0 of its closure.
    fn bound_this(&self) -> Value {
        Environment::get_at(&self.closure, 0, "this").unwrap_or(Value::Nil)
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Exec<Value> {
        debug!("Calling function '{}'", self.name());

        let environment: Rc<RefCell<Environment>> = Rc::new(RefCell::new(
            Environment::with_enclosing(self.closure.clone()),
        ));

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(&param.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, environment) {
            Ok(()) => {}

            Err(Unwind::Return(value)) => {
                // An initializer's return is always the bound instance.
                if self.is_initializer {
                    return Ok(self.bound_this());
                }

                return Ok(value);
            }

            Err(err) => return Err(err),
        }

        if self.is_initializer {
            Ok(self.bound_this())
        } else {
            Ok(Value::Nil)
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("closure", &self.closure.as_ptr())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Lambdas
// ─────────────────────────────────────────────────────────────────────────

pub struct Lambda {
    declaration: Rc<LambdaDecl>,
    closure: Rc<RefCell<Environment>>,
}

impl Lambda {
    pub fn new(declaration: Rc<LambdaDecl>, closure: Rc<RefCell<Environment>>) -> Self {
        Lambda {
            declaration,
            closure,
        }
    }
}

impl Callable for Lambda {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Exec<Value> {
        debug!("Calling lambda of arity {}", self.arity());

        let environment: Rc<RefCell<Environment>> = Rc::new(RefCell::new(
            Environment::with_enclosing(self.closure.clone()),
        ));

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(&param.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, environment) {
            Ok(()) => Ok(Value::Nil),

            Err(Unwind::Return(value)) => Ok(value),

            Err(err) => Err(err),
        }
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("params", &self.declaration.params.len())
            .field("closure", &self.closure.as_ptr())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Classes and instances
// ─────────────────────────────────────────────────────────────────────────

pub struct Class {
    pub name: String,
    superclass: Option<Rc<Class>>,
    methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Rc<Function>>,
    ) -> Self {
        Class {
            name,
            superclass,
            methods,
        }
    }

    /// Method lookup walks the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }

        if let Some(superclass) = &self.superclass {
            return superclass.find_method(name);
        }

        None
    }
}

impl Callable for Rc<Class> {
    // Calling a class constructs an instance; arity comes from `init`.
    fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Exec<Value> {
        debug!("Instantiating class '{}'", self.name);

        let instance: Rc<RefCell<Instance>> = Rc::new(RefCell::new(Instance::new(self.clone())));

        if let Some(initializer) = self.find_method("init") {
            initializer
                .bind(instance.clone())
                .call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field(
                "superclass",
                &self.superclass.as_ref().map(|sc| sc.name.as_str()),
            )
            .field("methods", &self.methods.keys())
            .finish()
    }
}

pub struct Instance {
    class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    /// Property read: fields shadow methods; methods come back bound to the
    /// instance.  `None` means the property is undefined.
    pub fn get(instance: &Rc<RefCell<Instance>>, name: &str) -> Option<Value> {
        if let Some(value) = instance.borrow().fields.get(name) {
            return Some(value.clone());
        }

        let method: Rc<Function> = instance.borrow().class.find_method(name)?;

        Some(Value::Function(Rc::new(method.bind(instance.clone()))))
    }

    /// Fields are created on first assignment.
    pub fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("fields", &self.fields.keys())
            .finish()
    }
}

/// A built-in bound in globals at interpreter construction.
#[derive(Debug)]
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: fn(&[Value]) -> Value,
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter, arguments: Vec<Value>) -> Exec<Value> {
        Ok((self.func)(&arguments))
    }
}
