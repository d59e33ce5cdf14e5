use crate::parser::ast::Procedure;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// The root frame: global variables plus the program-wide procedure table.
/// Procedures always live here, no matter which frame declares them.
#[derive(Debug, Default)]
pub struct Globals {
    variables: HashMap<String, i64>,
    procedures: HashMap<String, Rc<Procedure>>,
}

/// Scoping is exactly two levels deep: the shared root and, inside a
/// procedure call, one owned local frame. There is no chain of enclosing
/// scopes and nothing ever captures a frame.
#[derive(Debug)]
pub struct Environment {
    globals: Rc<RefCell<Globals>>,
    locals: Option<HashMap<String, i64>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            globals: Rc::new(RefCell::new(Globals::default())),
            locals: None,
        }
    }

    /// A fresh call frame sharing the given root.
    pub fn frame(globals: Rc<RefCell<Globals>>) -> Self {
        Environment {
            globals,
            locals: Some(HashMap::new()),
        }
    }

    pub fn globals_handle(&self) -> Rc<RefCell<Globals>> {
        Rc::clone(&self.globals)
    }

    /// Declares in the current frame, shadowing a root binding of the same
    /// name for the lifetime of the frame.
    pub fn declare(&mut self, name: &str, value: i64) {
        match &mut self.locals {
            Some(locals) => {
                locals.insert(name.to_string(), value);
            }
            None => {
                self.globals
                    .borrow_mut()
                    .variables
                    .insert(name.to_string(), value);
            }
        }
    }

    /// Writes through to whichever frame already declared the name: the
    /// current frame wins, then the root; a name declared nowhere is declared
    /// in the current frame.
    pub fn set(&mut self, name: &str, value: i64) {
        if let Some(locals) = &mut self.locals {
            if let Some(slot) = locals.get_mut(name) {
                *slot = value;
                return;
            }
        }
        if let Some(slot) = self.globals.borrow_mut().variables.get_mut(name) {
            *slot = value;
            return;
        }
        self.declare(name, value);
    }

    /// Reads the name from the current frame, then the root. A name declared
    /// in neither is declared at 0 in the current frame first; reading an
    /// unknown variable never fails.
    pub fn get(&mut self, name: &str) -> i64 {
        if let Some(locals) = &self.locals {
            if let Some(value) = locals.get(name) {
                return *value;
            }
        }
        if let Some(value) = self.globals.borrow().variables.get(name) {
            return *value;
        }
        self.declare(name, 0);
        0
    }

    /// Last declaration wins; there is no overloading.
    pub fn declare_procedure(&mut self, procedure: Rc<Procedure>) {
        self.globals
            .borrow_mut()
            .procedures
            .insert(procedure.name.clone(), procedure);
    }

    pub fn procedure(&self, name: &str) -> Option<Rc<Procedure>> {
        self.globals.borrow().procedures.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::Stmt;

    #[test]
    fn reading_an_unknown_name_declares_it_at_zero() {
        let mut env = Environment::new();
        assert_eq!(env.get("q"), 0);
        // now declared: a later root write is visible
        env.set("q", 7);
        assert_eq!(env.get("q"), 7);
    }

    #[test]
    fn frame_write_through_prefers_local_then_root() {
        let mut root = Environment::new();
        root.set("g", 1);

        let mut frame = Environment::frame(root.globals_handle());
        frame.declare("p", 10);

        frame.set("p", 11); // local slot
        frame.set("g", 2); // root slot
        frame.set("fresh", 3); // declared in the frame

        assert_eq!(frame.get("p"), 11);
        assert_eq!(root.get("g"), 2);
        assert_eq!(root.get("fresh"), 0); // frame-local, root never saw it
    }

    #[test]
    fn auto_vivification_in_a_frame_stays_in_the_frame() {
        let mut root = Environment::new();
        let mut frame = Environment::frame(root.globals_handle());
        assert_eq!(frame.get("x"), 0);
        assert_eq!(root.get("x"), 0); // fresh vivification at the root too
        root.set("x", 5);
        // the frame's own 0 still shadows the root's 5
        assert_eq!(frame.get("x"), 0);
    }

    #[test]
    fn procedures_land_in_the_root_from_any_frame() {
        let mut root = Environment::new();
        let mut frame = Environment::frame(root.globals_handle());
        frame.declare_procedure(Rc::new(Procedure {
            name: "p".into(),
            params: vec![],
            body: Stmt::Block(vec![]),
        }));
        assert!(root.procedure("p").is_some());
        assert_eq!(root.procedure("p").unwrap().name, "p");
        assert!(root.procedure("missing").is_none());
    }
}
