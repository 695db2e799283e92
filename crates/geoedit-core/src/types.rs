//! Type aliases for commonly used shared and callback types.
//!
//! Interaction tools live on the UI thread and share their session state with
//! the disposers they hand to the interaction slot, hence the `Rc<RefCell<_>>`
//! family. Callbacks crossing into async code are `Send + Sync`.

use std::cell::RefCell;
use std::rc::Rc;

/// Single-threaded shared mutable state.
pub type Shared<T> = Rc<RefCell<T>>;

/// Optional single-threaded shared state, `None` while no session exists.
pub type SharedOption<T> = Rc<RefCell<Option<T>>>;

/// A callback that receives a single parameter.
pub type DataCallback<T> = Box<dyn Fn(T) + Send + Sync>;

/// Creates a new [`Shared`] value.
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}
