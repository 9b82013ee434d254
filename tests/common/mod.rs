#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::session::{Outcome, Session};

/// In-memory program output that stays readable after the session owns it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn session() -> (Session, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let session = Session::with_output(Box::new(buffer.clone()));
    (session, buffer)
}

/// Runs `source` in a fresh session.  Returns the outcome, everything the
/// program printed, and each diagnostic rendered as text.
pub fn run(source: &str) -> (Outcome, String, Vec<String>) {
    let (mut session, buffer) = session();
    let outcome = session.run(source);

    let diagnostics = session
        .reporter()
        .diagnostics()
        .iter()
        .map(ToString::to_string)
        .collect();

    (outcome, buffer.contents(), diagnostics)
}
