use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A cleanup action that runs at most once, however many clones call it.
#[derive(Clone)]
pub struct Teardown(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Teardown {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    /// Runs the action. Returns `false` (and does nothing) if it already ran.
    pub fn run(&self) -> bool {
        // Take first: the action may drop or re-enter clones of this handle.
        let f = self.0.borrow_mut().take();
        match f {
            Some(f) => {
                f();
                true
            }
            None => false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.0.borrow().is_none()
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Teardown")
            .field("done", &self.is_done())
            .finish()
    }
}

/// Register `teardown` with the current scope, if there is one.
pub(crate) fn attach_to_scope(teardown: &Teardown) {
    if let Some(scope) = crate::scope::current_scope() {
        let t = teardown.clone();
        scope.add_teardown(move || {
            t.run();
        });
    }
}
