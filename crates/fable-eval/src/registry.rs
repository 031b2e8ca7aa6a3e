//! Interface declarations and the `(type tag, interface)` instance table.

use crate::error::{EvalError, EvalResult};
use crate::value::{NativeFn, Value};
use fable_types::ast::{Dispatch, Expr, InterfaceDecl, MethodSig};
use std::collections::BTreeMap;
use std::rc::Rc;

/// How an instance implements one method.
#[derive(Debug, Clone)]
pub enum Implementation {
    /// Implemented in Rust.
    Native(NativeFn),
    /// A function value produced by evaluating the instance's method body.
    Value(Value),
}

/// The outcome of resolving a method for a type tag.
#[derive(Debug, Clone)]
pub enum Resolution {
    Implemented(Implementation),
    /// The instance omits the method; evaluate the interface default.
    Default(Rc<Expr>),
}

/// One `instance Interface Type { ... }`.
#[derive(Debug, Clone)]
pub struct Instance {
    pub interface: String,
    pub type_tag: String,
    pub methods: BTreeMap<String, Implementation>,
}

impl Instance {
    pub fn new(interface: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            type_tag: type_tag.into(),
            methods: BTreeMap::new(),
        }
    }

    pub fn native(mut self, method: &str, native: NativeFn) -> Self {
        self.methods
            .insert(method.to_string(), Implementation::Native(native));
        self
    }

    pub fn value(mut self, method: &str, value: Value) -> Self {
        self.methods
            .insert(method.to_string(), Implementation::Value(value));
        self
    }
}

struct InterfaceEntry {
    decl: InterfaceDecl,
    defaults: BTreeMap<String, Rc<Expr>>,
}

/// Registry of interfaces and their instances.
///
/// Enforces coherence (one instance per `(type tag, interface)` pair) and
/// superinterface constraints at registration time, so dispatch only has
/// to look the pair up.
#[derive(Default)]
pub struct InstanceRegistry {
    interfaces: BTreeMap<String, InterfaceEntry>,
    instances: BTreeMap<(String, String), Instance>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an interface. Superinterfaces must already be declared.
    pub fn declare_interface(&mut self, decl: InterfaceDecl) -> EvalResult<()> {
        if self.interfaces.contains_key(&decl.name) {
            return Err(EvalError::DuplicateInterface(decl.name));
        }
        for sup in &decl.superinterfaces {
            if !self.interfaces.contains_key(sup) {
                return Err(EvalError::UnknownInterface(sup.clone()));
            }
        }
        for sig in &decl.methods {
            if let Dispatch::Arg(i) = sig.dispatch {
                if i >= sig.arity {
                    return Err(EvalError::InvalidInput(format!(
                        "method '{}.{}' dispatches on argument {i} but takes {}",
                        decl.name, sig.name, sig.arity
                    )));
                }
            }
        }
        let defaults = decl
            .methods
            .iter()
            .filter_map(|m| m.default.clone().map(|d| (m.name.clone(), Rc::new(d))))
            .collect();
        log::debug!(
            "declared interface {} ({} methods)",
            decl.name,
            decl.methods.len()
        );
        self.interfaces
            .insert(decl.name.clone(), InterfaceEntry { decl, defaults });
        Ok(())
    }

    pub fn interface(&self, name: &str) -> Option<&InterfaceDecl> {
        self.interfaces.get(name).map(|entry| &entry.decl)
    }

    /// Look up a method signature.
    pub fn method_sig(&self, interface: &str, method: &str) -> EvalResult<&MethodSig> {
        let entry = self
            .interfaces
            .get(interface)
            .ok_or_else(|| EvalError::UnknownInterface(interface.to_string()))?;
        entry
            .decl
            .methods
            .iter()
            .find(|m| m.name == method)
            .ok_or_else(|| EvalError::UnknownMethod {
                interface: interface.to_string(),
                method: method.to_string(),
            })
    }

    /// Register an instance.
    pub fn register(&mut self, instance: Instance) -> EvalResult<()> {
        let entry = self
            .interfaces
            .get(&instance.interface)
            .ok_or_else(|| EvalError::UnknownInterface(instance.interface.clone()))?;

        let key = (instance.type_tag.clone(), instance.interface.clone());
        if self.instances.contains_key(&key) {
            return Err(EvalError::DuplicateInstance {
                interface: instance.interface,
                type_tag: instance.type_tag,
            });
        }

        for sup in &entry.decl.superinterfaces {
            if !self.has_instance(&instance.type_tag, sup) {
                return Err(EvalError::MissingSuperinstance {
                    interface: instance.interface,
                    superinterface: sup.clone(),
                    type_tag: instance.type_tag,
                });
            }
        }

        for name in instance.methods.keys() {
            if !entry.decl.methods.iter().any(|m| &m.name == name) {
                return Err(EvalError::UnknownMethod {
                    interface: instance.interface,
                    method: name.clone(),
                });
            }
        }

        for sig in &entry.decl.methods {
            if sig.default.is_none() && !instance.methods.contains_key(&sig.name) {
                return Err(EvalError::MissingMethod {
                    interface: instance.interface,
                    type_tag: instance.type_tag,
                    method: sig.name.clone(),
                });
            }
        }

        log::debug!(
            "registered instance {} {}",
            instance.interface,
            instance.type_tag
        );
        self.instances.insert(key, instance);
        Ok(())
    }

    pub fn has_instance(&self, type_tag: &str, interface: &str) -> bool {
        self.instances
            .contains_key(&(type_tag.to_string(), interface.to_string()))
    }

    /// Find the implementation of `interface.method` for `type_tag`.
    pub fn resolve(&self, type_tag: &str, interface: &str, method: &str) -> EvalResult<Resolution> {
        let instance = self
            .instances
            .get(&(type_tag.to_string(), interface.to_string()))
            .ok_or_else(|| EvalError::NoInstance {
                interface: interface.to_string(),
                type_tag: type_tag.to_string(),
            })?;

        if let Some(implementation) = instance.methods.get(method) {
            log::trace!("dispatch {interface}.{method} @ {type_tag}");
            return Ok(Resolution::Implemented(implementation.clone()));
        }

        let entry = self
            .interfaces
            .get(interface)
            .ok_or_else(|| EvalError::UnknownInterface(interface.to_string()))?;
        match entry.defaults.get(method) {
            Some(default) => {
                log::trace!("dispatch {interface}.{method} @ {type_tag} (default)");
                Ok(Resolution::Default(Rc::clone(default)))
            }
            None => Err(EvalError::UnknownMethod {
                interface: interface.to_string(),
                method: method.to_string(),
            }),
        }
    }

    /// Interfaces implemented by `type_tag`, in name order.
    pub fn interfaces_of(&self, type_tag: &str) -> Vec<&str> {
        self.instances
            .keys()
            .filter(|(tag, _)| tag == type_tag)
            .map(|(_, interface)| interface.as_str())
            .collect()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}
