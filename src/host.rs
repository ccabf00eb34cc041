use crate::canvas::{Point, Size};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub const DEFAULT_CONTENT_BOTTOM: f32 = 32.0;

#[derive(Debug, Clone, PartialEq)]
pub struct HostNode {
    pub size: Size,
    pub content_bottom: f32,
    dirty: bool,
}

impl HostNode {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            content_bottom: DEFAULT_CONTENT_BOTTOM,
            dirty: true,
        }
    }

    pub fn set_dirty_canvas(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

#[derive(Debug, Default)]
pub struct InputSurface {
    attributes: HashMap<String, String>,
}

pub type SharedSurface = Rc<RefCell<InputSurface>>;

impl InputSurface {
    pub fn shared() -> SharedSurface {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        if self.attribute(name) != Some(value) {
            self.attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.remove(name);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Consumed,
    Ignored,
}

impl Handled {
    pub fn is_consumed(self) -> bool {
        matches!(self, Handled::Consumed)
    }
}

pub trait HostHandler {
    fn pointer_down(&mut self, _position: Point) -> Handled {
        Handled::Ignored
    }

    fn pointer_move(&mut self, _position: Point) -> Handled {
        Handled::Ignored
    }

    fn removed(&mut self) {}
}
