//! The thread-local "current target" stack.
//!
//! Entering a scope pushes a shared target; leaving it pops that same
//! target. Scopes must be left in reverse order of entry. [`enter`] returns
//! a guard that leaves the scope when dropped, including on early return
//! and unwinding.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::target::Target;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Arc<Target>>> = const { RefCell::new(Vec::new()) };
}

/// Push `target` onto this thread's stack.
pub fn enter_scope(target: &Arc<Target>) {
    CONTEXT_STACK.with(|stack| stack.borrow_mut().push(Arc::clone(target)));
}

/// Pop `target` off this thread's stack.
///
/// # Panics
///
/// Panics if the stack is empty or its top is not the very object `target`
/// points to.
pub fn exit_scope(target: &Arc<Target>) {
    CONTEXT_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let top = stack
            .last()
            .unwrap_or_else(|| panic!("exiting target scope {target} with an empty context stack"));
        assert!(
            Arc::ptr_eq(top, target),
            "target scopes exited out of order: expected {top}, got {target}"
        );
        stack.pop();
    });
}

/// The innermost target of this thread.
///
/// # Panics
///
/// Panics if no scope is active and `allow_missing` is false.
pub fn current(allow_missing: bool) -> Option<Arc<Target>> {
    let top = CONTEXT_STACK.with(|stack| stack.borrow().last().cloned());
    assert!(
        top.is_some() || allow_missing,
        "Target context required. Please enter a target scope first"
    );
    top
}

/// Number of active scopes on this thread.
pub fn depth() -> usize {
    CONTEXT_STACK.with(|stack| stack.borrow().len())
}

/// Leaves its scope on drop. Bound to the thread that created it.
#[must_use = "the scope is left as soon as the guard is dropped"]
pub struct TargetScope {
    target: Arc<Target>,
    _not_send: PhantomData<*const ()>,
}

impl TargetScope {
    pub fn target(&self) -> &Arc<Target> {
        &self.target
    }
}

impl Drop for TargetScope {
    fn drop(&mut self) {
        exit_scope(&self.target);
    }
}

/// Enter a scope for `target`, left when the returned guard drops.
pub fn enter(target: &Arc<Target>) -> TargetScope {
    enter_scope(target);
    TargetScope {
        target: Arc::clone(target),
        _not_send: PhantomData,
    }
}

/// Run `f` with `target` as the current target.
pub fn with_target<R>(target: &Arc<Target>, f: impl FnOnce() -> R) -> R {
    let _scope = enter(target);
    f()
}
