#![forbid(unsafe_code)]

//! Idempotent document title writes.

use std::cell::RefCell;
use std::rc::Rc;

use tabwire_backend::TitleHost;

/// Remembers the last title applied and skips writes that would not change it.
pub struct TitleSync<T> {
    host: Rc<T>,
    last: RefCell<String>,
}

impl<T: TitleHost> TitleSync<T> {
    /// Start from the title the document has now.
    pub fn new(host: Rc<T>) -> Self {
        let last = RefCell::new(host.title());
        Self { host, last }
    }

    /// Write `title` unless it is already applied. Returns whether the
    /// document was written.
    pub fn set_title(&self, title: &str) -> bool {
        if *self.last.borrow() == title {
            return false;
        }
        self.host.set_title(title);
        *self.last.borrow_mut() = title.to_owned();
        true
    }

    /// Last title applied.
    #[must_use]
    pub fn current(&self) -> String {
        self.last.borrow().clone()
    }
}
