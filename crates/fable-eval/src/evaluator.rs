//! Core expression evaluator.

use crate::config::EvalConfig;
use crate::env::Environment;
use crate::error::{EvalError, EvalResult};
use crate::fold;
use crate::prelude::{self, FOLDABLE, FUNCTOR, MONAD, SELF_TYPE};
use crate::registry::{Implementation, Instance, InstanceRegistry, Resolution};
use crate::value::{tags, Closure, NativeFn, Suspended, Thunk, ThunkState, Value};
use fable_types::ast::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

/// Counters collected while evaluating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvalStats {
    /// Expression steps (the gas consumed).
    pub steps: u64,
    /// Function invocations, closures and natives alike.
    pub applications: u64,
    /// Interface method dispatches.
    pub dispatches: u64,
    /// Thunks evaluated (memoized hits are not counted).
    pub thunks_forced: u64,
}

#[derive(Debug, Clone)]
struct ConstructorInfo {
    type_name: String,
    arity: usize,
}

/// The core evaluator: walks AST nodes and produces Values.
pub struct Evaluator {
    /// Local variable environment (scoped).
    pub env: Environment,
    /// Top-level bindings, each a lazily evaluated thunk.
    globals: BTreeMap<String, Value>,
    /// Built-in functions, visible unless shadowed.
    builtins: BTreeMap<&'static str, NativeFn>,
    data_types: BTreeSet<String>,
    constructors: BTreeMap<String, ConstructorInfo>,
    registry: InstanceRegistry,
    config: EvalConfig,
    stats: EvalStats,
    depth: usize,
}

impl Evaluator {
    /// An evaluator with no interfaces, instances or built-ins.
    pub fn new(config: EvalConfig) -> Self {
        Self {
            env: Environment::new(),
            globals: BTreeMap::new(),
            builtins: BTreeMap::new(),
            data_types: BTreeSet::new(),
            constructors: BTreeMap::new(),
            registry: InstanceRegistry::new(),
            config,
            stats: EvalStats::default(),
            depth: 0,
        }
    }

    /// An evaluator with the prelude installed.
    pub fn with_prelude(config: EvalConfig) -> EvalResult<Self> {
        let mut eval = Self::new(config);
        prelude::install(&mut eval)?;
        Ok(eval)
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn stats(&self) -> EvalStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = EvalStats::default();
    }

    pub fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    /// Consume one unit of gas. Returns error if exhausted.
    fn tick(&mut self) -> EvalResult<()> {
        self.stats.steps += 1;
        if self.stats.steps > self.config.gas_limit {
            Err(EvalError::GasExhausted(self.config.gas_limit))
        } else {
            Ok(())
        }
    }

    fn enter(&mut self) -> EvalResult<()> {
        if self.depth >= self.config.max_depth {
            return Err(EvalError::DepthExceeded(self.config.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Reject values nested deeper than `max_depth`, so printing, comparing
    /// and dropping them stays within the native stack.
    fn bounded(&self, value: Value) -> EvalResult<Value> {
        let limit = self.config.max_depth;
        if value.nesting(limit) > limit {
            return Err(EvalError::DepthExceeded(limit));
        }
        Ok(value)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Declarations
    // ══════════════════════════════════════════════════════════════════════

    /// Declare an algebraic data type and its constructors.
    pub fn declare_data(&mut self, decl: &DataDecl) -> EvalResult<()> {
        if self.is_known_type(&decl.name) {
            return Err(EvalError::InvalidInput(format!(
                "duplicate data type '{}'",
                decl.name
            )));
        }
        for ctor in &decl.constructors {
            if self.constructors.contains_key(&ctor.name) {
                return Err(EvalError::DuplicateConstructor(ctor.name.clone()));
            }
        }
        for ctor in &decl.constructors {
            self.constructors.insert(
                ctor.name.clone(),
                ConstructorInfo {
                    type_name: decl.name.clone(),
                    arity: ctor.arity,
                },
            );
        }
        self.data_types.insert(decl.name.clone());
        log::debug!(
            "declared data {} ({} constructors)",
            decl.name,
            decl.constructors.len()
        );
        Ok(())
    }

    pub fn declare_interface(&mut self, decl: InterfaceDecl) -> EvalResult<()> {
        self.registry.declare_interface(decl)
    }

    /// Register an instance written in Fable. Method bodies are evaluated
    /// once, with `Self` naming the instance type.
    pub fn register_instance(&mut self, decl: &InstanceDecl) -> EvalResult<()> {
        if !self.is_known_type(&decl.type_name) {
            return Err(EvalError::InvalidInput(format!(
                "instance of '{}' for unknown type '{}'",
                decl.interface, decl.type_name
            )));
        }
        let mut instance = Instance::new(&decl.interface, &decl.type_name);
        for method in &decl.methods {
            if instance.methods.contains_key(&method.name) {
                return Err(EvalError::InvalidInput(format!(
                    "method '{}' defined twice in instance {} {}",
                    method.name, decl.interface, decl.type_name
                )));
            }
            let value = self.eval_in_instance(&method.body, &decl.type_name)?;
            instance = instance.value(&method.name, value);
        }
        self.registry.register(instance)
    }

    /// Register an instance implemented in Rust.
    pub fn register_native_instance(&mut self, instance: Instance) -> EvalResult<()> {
        self.registry.register(instance)
    }

    pub fn define_builtin(&mut self, native: NativeFn) {
        self.builtins.insert(native.name, native);
    }

    /// Bind a top-level name. The value is computed on first use.
    pub fn define_global(&mut self, name: &str, value: Expr) {
        let thunk = Thunk::new(Suspended::Expr {
            expr: Rc::new(value),
            env: Environment::new(),
        });
        if self
            .globals
            .insert(name.to_string(), Value::Thunk(thunk))
            .is_some()
        {
            log::warn!("top-level binding '{name}' redefined");
        }
    }

    fn is_known_type(&self, name: &str) -> bool {
        matches!(
            name,
            tags::INT | tags::BOOL | tags::STRING | tags::UNIT | tags::LIST | tags::FUNCTION
        ) || self.data_types.contains(name)
    }

    /// Register a program's declarations and bindings.
    ///
    /// Bindings are installed before instances so instance bodies can
    /// refer to top-level functions.
    pub fn load_program(&mut self, program: &Program) -> EvalResult<()> {
        for decl in &program.data {
            self.declare_data(decl)?;
        }
        for decl in &program.interfaces {
            self.declare_interface(decl.clone())?;
        }
        for binding in &program.bindings {
            self.define_global(&binding.name, binding.value.clone());
        }
        for decl in &program.instances {
            self.register_instance(decl)?;
        }
        log::debug!(
            "loaded program: {} data types, {} interfaces, {} instances, {} bindings",
            program.data.len(),
            program.interfaces.len(),
            program.instances.len(),
            program.bindings.len()
        );
        Ok(())
    }

    /// Load a program and evaluate `main` to a fully forced value.
    pub fn run(&mut self, program: &Program) -> EvalResult<Value> {
        self.load_program(program)?;
        self.eval(&program.main)
    }

    /// Evaluate an expression and force the result completely.
    pub fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        let value = self.eval_expr(expr)?;
        self.force_deep(value)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression to a Value. The result may be a thunk.
    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        self.tick()?;
        match expr {
            Expr::Lit(lit) => Ok(literal_value(lit)),
            Expr::Var(name) => self.eval_var(name),
            Expr::Lambda { params, body } => Ok(Value::Closure(Rc::new(Closure {
                params: params.clone(),
                body: (**body).clone(),
                env: self.env.clone(),
            }))),
            Expr::Apply { func, args } => self.eval_apply(func, args),
            Expr::Let { name, value, body } => self.eval_let(name, value, body),
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => self.eval_if(condition, then_branch, else_branch),
            Expr::Construct { constructor, args } => self.eval_construct(constructor, args),
            Expr::List(items) => {
                let values = self.eval_args(items)?;
                self.bounded(Value::List(values))
            }
            Expr::Match { subject, arms } => self.eval_match(subject, arms),
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right),
            Expr::Unary { op, operand } => self.eval_unary(*op, operand),
            Expr::Method {
                interface,
                method,
                at,
                args,
            } => {
                let at = at
                    .as_deref()
                    .map(|name| self.resolve_type_name(name))
                    .transpose()?;
                let args = self.eval_args(args)?;
                self.call_method(interface, method, at.as_deref(), args)
            }
            Expr::Map { func, functor } => {
                let args = vec![self.eval_expr(func)?, self.eval_expr(functor)?];
                self.call_method(FUNCTOR, "map", None, args)
            }
            Expr::Bind { monad, func } => {
                let args = vec![self.eval_expr(monad)?, self.eval_expr(func)?];
                self.call_method(MONAD, "bind", None, args)
            }
            Expr::Pure { type_name, value } => {
                let type_name = self.resolve_type_name(type_name)?;
                let args = vec![self.eval_expr(value)?];
                self.call_method(MONAD, "pure", Some(&type_name), args)
            }
            Expr::Fold {
                direction,
                func,
                seed,
                foldable,
            } => {
                let args = vec![
                    self.eval_expr(func)?,
                    self.eval_expr(seed)?,
                    self.eval_expr(foldable)?,
                ];
                self.call_method(FOLDABLE, direction.method_name(), None, args)
            }
        }
    }

    fn eval_args(&mut self, exprs: &[Expr]) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs {
            values.push(self.eval_expr(expr)?);
        }
        Ok(values)
    }

    // ── Identifiers & application ────────────────────────────────────────

    fn eval_var(&self, name: &str) -> EvalResult<Value> {
        if let Some(value) = self.env.get(name) {
            return Ok(value.clone());
        }
        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }
        if let Some(info) = self.constructors.get(name) {
            return Ok(if info.arity == 0 {
                Value::data(&info.type_name, name, Vec::new())
            } else {
                Value::Constructor {
                    type_name: info.type_name.clone(),
                    constructor: name.to_string(),
                    arity: info.arity,
                }
            });
        }
        if let Some(native) = self.builtins.get(name) {
            return Ok(Value::Native(*native));
        }
        Err(EvalError::UndefinedVariable(name.to_string()))
    }

    fn eval_apply(&mut self, func: &Expr, args: &[Expr]) -> EvalResult<Value> {
        let func = self.eval_expr(func)?;
        let args = self.eval_args(args)?;
        self.apply(func, args)
    }

    /// Apply a function value to arguments (curried).
    ///
    /// Fewer arguments than the function takes produce a partial
    /// application; extra arguments are applied to the result.
    pub fn apply(&mut self, func: Value, args: Vec<Value>) -> EvalResult<Value> {
        let func = self.force(func)?;
        if let Value::Partial {
            func: inner,
            args: mut prior,
        } = func
        {
            prior.extend(args);
            return self.apply(*inner, prior);
        }

        // Zero-argument methods such as `mempty` may be plain values.
        if args.is_empty() {
            let nullary = match &func {
                Value::Closure(closure) => closure.params.is_empty(),
                Value::Native(native) => native.arity == 0,
                _ => false,
            };
            if !nullary {
                return Ok(func);
            }
        }

        let arity = match &func {
            Value::Closure(closure) => closure.params.len(),
            Value::Native(native) => native.arity,
            Value::Constructor { arity, .. } => *arity,
            other => return Err(EvalError::NotCallable(other.type_tag().to_string())),
        };
        if args.len() < arity {
            return Ok(Value::Partial {
                func: Box::new(func),
                args,
            });
        }

        let mut args = args;
        let rest = args.split_off(arity);
        let result = self.invoke(func, args)?;
        if rest.is_empty() {
            Ok(result)
        } else {
            self.apply(result, rest)
        }
    }

    /// Call a saturated function.
    fn invoke(&mut self, func: Value, args: Vec<Value>) -> EvalResult<Value> {
        self.stats.applications += 1;
        match func {
            Value::Closure(closure) => self.call_closure(&closure, args),
            Value::Native(native) => {
                let result = (native.func)(self, args)?;
                self.bounded(result)
            }
            Value::Constructor {
                type_name,
                constructor,
                ..
            } => self.bounded(Value::Data {
                type_name,
                constructor,
                fields: args,
            }),
            other => Err(EvalError::NotCallable(other.type_tag().to_string())),
        }
    }

    fn call_closure(&mut self, closure: &Closure, args: Vec<Value>) -> EvalResult<Value> {
        self.enter()?;
        let saved = std::mem::replace(&mut self.env, closure.env.clone());
        self.env.push_scope();
        for (param, arg) in closure.params.iter().zip(args) {
            self.env.define(param, arg);
        }
        let result = self.eval_expr(&closure.body);
        self.env = saved;
        self.exit();
        result
    }

    // ── Binding forms & control flow ─────────────────────────────────────

    fn eval_let(&mut self, name: &str, value: &Expr, body: &Expr) -> EvalResult<Value> {
        let value = self.eval_expr(value)?;
        self.env.push_scope();
        self.env.define(name, value);
        let result = self.eval_expr(body);
        self.env.pop_scope();
        result
    }

    fn eval_if(
        &mut self,
        condition: &Expr,
        then_branch: &Expr,
        else_branch: &Expr,
    ) -> EvalResult<Value> {
        let cond = self.eval_expr(condition)?;
        if self.expect_bool(cond, "if condition")? {
            self.eval_expr(then_branch)
        } else {
            self.eval_expr(else_branch)
        }
    }

    fn eval_construct(&mut self, constructor: &str, args: &[Expr]) -> EvalResult<Value> {
        let info = self
            .constructors
            .get(constructor)
            .cloned()
            .ok_or_else(|| EvalError::UnknownConstructor(constructor.to_string()))?;
        if args.len() != info.arity {
            return Err(EvalError::ConstructorArity {
                constructor: constructor.to_string(),
                expected: info.arity,
                found: args.len(),
            });
        }
        let fields = self.eval_args(args)?;
        self.bounded(Value::Data {
            type_name: info.type_name,
            constructor: constructor.to_string(),
            fields,
        })
    }

    fn eval_match(&mut self, subject: &Expr, arms: &[MatchArm]) -> EvalResult<Value> {
        let subject = self.eval_expr(subject)?;
        let subject = self.force(subject)?;

        for arm in arms {
            let mut bindings = Vec::new();
            if self.match_pattern(&arm.pattern, &subject, &mut bindings)? {
                self.env.push_scope();
                for (name, value) in bindings {
                    self.env.define(&name, value);
                }
                let result = self.eval_expr(&arm.body);
                self.env.pop_scope();
                return result;
            }
        }
        Err(EvalError::NonExhaustiveMatch(subject.to_string()))
    }

    /// Try to match a pattern against a value, collecting bindings.
    ///
    /// Binders and wildcards leave the value unforced.
    fn match_pattern(
        &mut self,
        pattern: &Pattern,
        value: &Value,
        bindings: &mut Vec<(String, Value)>,
    ) -> EvalResult<bool> {
        match pattern {
            Pattern::Wildcard => Ok(true),
            Pattern::Bind(name) => {
                bindings.push((name.clone(), value.clone()));
                Ok(true)
            }
            Pattern::Lit(lit) => {
                let value = self.force(value.clone())?;
                Ok(literal_value(lit).structural_eq(&value))
            }
            Pattern::Constructor { name, fields } => {
                if !self.constructors.contains_key(name) {
                    return Err(EvalError::UnknownConstructor(name.clone()));
                }
                let value = self.force(value.clone())?;
                let Value::Data {
                    constructor,
                    fields: values,
                    ..
                } = &value
                else {
                    return Ok(false);
                };
                if constructor != name {
                    return Ok(false);
                }
                if fields.len() != values.len() {
                    return Err(EvalError::ConstructorArity {
                        constructor: name.clone(),
                        expected: values.len(),
                        found: fields.len(),
                    });
                }
                for (pattern, field) in fields.iter().zip(values) {
                    if !self.match_pattern(pattern, field, bindings)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Pattern::Nil => {
                let value = self.force(value.clone())?;
                Ok(matches!(&value, Value::List(items) if items.is_empty()))
            }
            Pattern::Cons { head, tail } => {
                let value = self.force(value.clone())?;
                match value {
                    Value::List(mut items) if !items.is_empty() => {
                        let rest = items.split_off(1);
                        let first = items.remove(0);
                        Ok(self.match_pattern(head, &first, bindings)?
                            && self.match_pattern(tail, &Value::List(rest), bindings)?)
                    }
                    _ => Ok(false),
                }
            }
        }
    }

    // ── Operators ────────────────────────────────────────────────────────

    fn eval_binary(&mut self, op: BinOp, left: &Expr, right: &Expr) -> EvalResult<Value> {
        // Short-circuit for logical operators
        if op == BinOp::And || op == BinOp::Or {
            let lv = self.eval_expr(left)?;
            let lb = self.expect_bool(lv, op.symbol())?;
            if (op == BinOp::And && !lb) || (op == BinOp::Or && lb) {
                return Ok(Value::Bool(lb));
            }
            let rv = self.eval_expr(right)?;
            return Ok(Value::Bool(self.expect_bool(rv, op.symbol())?));
        }

        let lv = self.eval_expr(left)?;
        let rv = self.eval_expr(right)?;

        if op == BinOp::Eq || op == BinOp::NotEq {
            let lv = self.force_deep(lv)?;
            let rv = self.force_deep(rv)?;
            let equal = lv.structural_eq(&rv);
            return Ok(Value::Bool(if op == BinOp::Eq { equal } else { !equal }));
        }

        let lv = self.force(lv)?;
        let rv = self.force(rv)?;
        match op {
            BinOp::Add => checked_arith(&lv, &rv, op, i64::checked_add),
            BinOp::Sub => checked_arith(&lv, &rv, op, i64::checked_sub),
            BinOp::Mul => checked_arith(&lv, &rv, op, i64::checked_mul),
            BinOp::Div | BinOp::Mod => {
                if rv == Value::Int(0) {
                    let what = if op == BinOp::Div { "division" } else { "modulo" };
                    return Err(EvalError::ArithmeticTrap(format!("{what} by zero")));
                }
                if op == BinOp::Div {
                    checked_arith(&lv, &rv, op, i64::checked_div)
                } else {
                    checked_arith(&lv, &rv, op, i64::checked_rem)
                }
            }
            BinOp::Less => compare(&lv, &rv, op, |o| o.is_lt()),
            BinOp::LessEq => compare(&lv, &rv, op, |o| o.is_le()),
            BinOp::Greater => compare(&lv, &rv, op, |o| o.is_gt()),
            BinOp::GreaterEq => compare(&lv, &rv, op, |o| o.is_ge()),
            BinOp::Append => match (lv, rv) {
                (Value::List(mut a), Value::List(b)) => {
                    a.extend(b);
                    Ok(Value::List(a))
                }
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
                (a, b) => Err(EvalError::TypeMismatch(format!(
                    "cannot apply '++' to {} and {}",
                    a.type_tag(),
                    b.type_tag()
                ))),
            },
            BinOp::Eq | BinOp::NotEq | BinOp::And | BinOp::Or => unreachable!("handled above"),
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr) -> EvalResult<Value> {
        let val = self.eval_expr(operand)?;
        match op {
            UnaryOp::Neg => match self.force(val)? {
                Value::Int(n) => n
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| EvalError::ArithmeticTrap("integer overflow in negation".into())),
                other => Err(EvalError::TypeMismatch(format!(
                    "cannot negate {}",
                    other.type_tag()
                ))),
            },
            UnaryOp::Not => Ok(Value::Bool(!self.expect_bool(val, "not")?)),
        }
    }

    fn expect_bool(&mut self, value: Value, context: &str) -> EvalResult<bool> {
        match self.force(value)? {
            Value::Bool(b) => Ok(b),
            other => Err(EvalError::TypeMismatch(format!(
                "{context} requires Bool, got {}",
                other.type_tag()
            ))),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Interface dispatch
    // ══════════════════════════════════════════════════════════════════════

    /// `Self` inside an instance method names the instance type.
    fn resolve_type_name(&self, name: &str) -> EvalResult<String> {
        if name != SELF_TYPE {
            return Ok(name.to_string());
        }
        match self.env.get(SELF_TYPE) {
            Some(Value::Str(tag)) => Ok(tag.clone()),
            _ => Err(EvalError::TypeMismatch(
                "'Self' used outside an instance method".into(),
            )),
        }
    }

    /// Call `interface.method`, finding the type tag as the method's
    /// signature prescribes. `at` overrides the dispatch type.
    pub fn call_method(
        &mut self,
        interface: &str,
        method: &str,
        at: Option<&str>,
        mut args: Vec<Value>,
    ) -> EvalResult<Value> {
        let sig = self.registry.method_sig(interface, method)?;
        let (arity, dispatch) = (sig.arity, sig.dispatch);
        if args.len() != arity {
            return Err(EvalError::ArityMismatch {
                name: format!("{interface}.{method}"),
                expected: arity,
                found: args.len(),
            });
        }

        let type_tag = match (at, dispatch) {
            (Some(tag), _) => tag.to_string(),
            (None, Dispatch::Arg(i)) => {
                let forced = self.force(args[i].clone())?;
                let tag = forced.type_tag().to_string();
                args[i] = forced;
                tag
            }
            (None, Dispatch::Explicit) => {
                return Err(EvalError::TypeMismatch(format!(
                    "'{interface}.{method}' needs an explicit type"
                )));
            }
        };
        self.dispatch(&type_tag, interface, method, args)
    }

    /// Invoke the implementation registered for `(type_tag, interface)`.
    pub fn dispatch(
        &mut self,
        type_tag: &str,
        interface: &str,
        method: &str,
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        self.stats.dispatches += 1;
        let func = match self.registry.resolve(type_tag, interface, method)? {
            Resolution::Implemented(Implementation::Native(native)) => Value::Native(native),
            Resolution::Implemented(Implementation::Value(value)) => value,
            Resolution::Default(body) => self.eval_in_instance(&body, type_tag)?,
        };
        self.apply(func, args)
    }

    /// Evaluate a method body in a fresh environment binding `Self`.
    fn eval_in_instance(&mut self, body: &Expr, type_tag: &str) -> EvalResult<Value> {
        let saved = std::mem::replace(&mut self.env, Environment::new());
        self.env.define(SELF_TYPE, Value::str(type_tag));
        let result = self.eval_expr(body);
        self.env = saved;
        result
    }

    // ══════════════════════════════════════════════════════════════════════
    // Forcing
    // ══════════════════════════════════════════════════════════════════════

    /// Force a value to weak head normal form.
    pub fn force(&mut self, value: Value) -> EvalResult<Value> {
        match value {
            Value::Thunk(thunk) => self.force_thunk(&thunk),
            other => Ok(other),
        }
    }

    fn force_thunk(&mut self, thunk: &Thunk) -> EvalResult<Value> {
        let state = std::mem::replace(&mut *thunk.0.borrow_mut(), ThunkState::Forcing);
        let suspended = match state {
            ThunkState::Pending(suspended) => suspended,
            ThunkState::Done(value) => {
                *thunk.0.borrow_mut() = ThunkState::Done(value.clone());
                return Ok(value);
            }
            ThunkState::Failed(err) => {
                *thunk.0.borrow_mut() = ThunkState::Failed(err.clone());
                return Err(err);
            }
            ThunkState::Forcing => return Err(EvalError::CyclicThunk),
        };

        self.stats.thunks_forced += 1;
        log::trace!("forcing thunk at depth {}", self.depth);
        let result = self
            .run_suspended(suspended)
            .and_then(|value| self.force(value));
        *thunk.0.borrow_mut() = match &result {
            Ok(value) => ThunkState::Done(value.clone()),
            Err(err) => ThunkState::Failed(err.clone()),
        };
        result
    }

    fn run_suspended(&mut self, suspended: Suspended) -> EvalResult<Value> {
        match suspended {
            Suspended::Expr { expr, env } => {
                let saved = std::mem::replace(&mut self.env, env);
                let result = self.eval_expr(&expr);
                self.env = saved;
                result
            }
            Suspended::FoldRight {
                func,
                seed,
                items,
                start,
            } => fold::foldr_from(self, func, seed, items, start),
        }
    }

    /// Force a value and everything reachable through lists and data fields.
    /// Fails with `DepthExceeded` past `max_depth` levels of nesting.
    pub fn force_deep(&mut self, value: Value) -> EvalResult<Value> {
        self.force_deep_at(value, 0)
    }

    fn force_deep_at(&mut self, value: Value, level: usize) -> EvalResult<Value> {
        let value = self.force(value)?;
        if level >= self.config.max_depth && value.nesting(0) > 0 {
            return Err(EvalError::DepthExceeded(self.config.max_depth));
        }
        match value {
            Value::List(items) => Ok(Value::List(
                items
                    .into_iter()
                    .map(|item| self.force_deep_at(item, level + 1))
                    .collect::<EvalResult<_>>()?,
            )),
            Value::Data {
                type_name,
                constructor,
                fields,
            } => Ok(Value::Data {
                type_name,
                constructor,
                fields: fields
                    .into_iter()
                    .map(|field| self.force_deep_at(field, level + 1))
                    .collect::<EvalResult<_>>()?,
            }),
            other => Ok(other),
        }
    }
}

/// Load and run a program with the prelude installed.
pub fn run_program(program: &Program, config: EvalConfig) -> EvalResult<Value> {
    let mut eval = Evaluator::with_prelude(config)?;
    eval.run(program)
}

/// Parse a JSON program and run it.
pub fn run_program_json(source: &str, config: EvalConfig) -> EvalResult<Value> {
    let program = Program::from_json(source)?;
    run_program(&program, config)
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Int(n) => Value::Int(*n),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Str(s) => Value::Str(s.clone()),
        Literal::Unit => Value::Unit,
    }
}

fn checked_arith(
    lv: &Value,
    rv: &Value,
    op: BinOp,
    f: fn(i64, i64) -> Option<i64>,
) -> EvalResult<Value> {
    match (lv, rv) {
        (Value::Int(a), Value::Int(b)) => f(*a, *b).map(Value::Int).ok_or_else(|| {
            EvalError::ArithmeticTrap(format!("integer overflow in '{}'", op.symbol()))
        }),
        _ => Err(EvalError::TypeMismatch(format!(
            "cannot apply '{}' to {} and {}",
            op.symbol(),
            lv.type_tag(),
            rv.type_tag()
        ))),
    }
}

fn compare(
    lv: &Value,
    rv: &Value,
    op: BinOp,
    test: fn(std::cmp::Ordering) -> bool,
) -> EvalResult<Value> {
    let ordering = match (lv, rv) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        _ => {
            return Err(EvalError::TypeMismatch(format!(
                "cannot compare {} and {} with '{}'",
                lv.type_tag(),
                rv.type_tag(),
                op.symbol()
            )))
        }
    };
    Ok(Value::Bool(test(ordering)))
}
