use crate::object::Object;
use std::{cell::RefCell, collections::HashMap, rc::Rc};

/// A frame of name→value bindings chained to the frame it encloses.
/// Frames are shared: any number of functions and macros may capture the
/// same frame and keep it alive after the defining call returns. Cycles
/// (a function bound in its own defining frame) are tolerated; frames
/// caught in one are retained for the interpreter's lifetime.
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Rc<Object>>,
    outer: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::default()))
    }

    pub fn enclosed(outer: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment {
            store: HashMap::new(),
            outer: Some(Rc::clone(outer)),
        }))
    }

    /// Walks outward until a binding is found or the chain ends.
    pub fn get(&self, name: &str) -> Option<Rc<Object>> {
        match self.store.get(name) {
            Some(value) => Some(Rc::clone(value)),
            None => self
                .outer
                .as_ref()
                .and_then(|outer| outer.borrow().get(name)),
        }
    }

    /// Writes into this frame only; outer bindings are shadowed, never
    /// overwritten.
    pub fn set(&mut self, name: &str, value: Rc<Object>) {
        self.store.insert(name.to_owned(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::Environment;
    use crate::object::Object;
    use std::rc::Rc;

    #[test]
    fn recursive_lookup() {
        let outer = Environment::new();
        let enclosed = Environment::enclosed(&outer);

        outer.borrow_mut().set("fib", Rc::new(Object::Number(1)));

        let found = enclosed.borrow().get("fib");
        match found {
            Some(value) => match value.as_ref() {
                Object::Number(1) => {}
                other => panic!("unexpected value: {:?}", other),
            },
            None => panic!("binding not visible from enclosed frame"),
        }
    }

    #[test]
    fn set_shadows_without_touching_outer() {
        let outer = Environment::new();
        outer.borrow_mut().set("x", Rc::new(Object::Number(1)));

        let enclosed = Environment::enclosed(&outer);
        enclosed.borrow_mut().set("x", Rc::new(Object::Number(2)));

        let enclosed_x = enclosed.borrow().get("x").unwrap();
        match enclosed_x.as_ref() {
            Object::Number(2) => {}
            other => panic!("unexpected value: {:?}", other),
        }
        let outer_x = outer.borrow().get("x").unwrap();
        match outer_x.as_ref() {
            Object::Number(1) => {}
            other => panic!("unexpected value: {:?}", other),
        }
    }

    #[test]
    fn missing_names_resolve_to_none() {
        let env = Environment::new();
        assert!(env.borrow().get("nope").is_none());
    }
}
