use std::{cell::RefCell, io, rc::Rc};

use synctest::formatter::common::color::SupportsColor;

mod lib;

mod conformance;
mod reporting;

/// A shared output target, the harness owns one handle and the test reads the other.
#[derive(Debug, Default, Clone)]
struct Buffer(Rc<RefCell<Vec<u8>>>);

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut *self.0.borrow_mut(), buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SupportsColor for Buffer {
    fn supports_color(&self) -> bool {
        false
    }
}

impl Buffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}
