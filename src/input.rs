use crate::actions::Action;
use crate::canvas::{Point, Size};
use crate::hits::{HitKind, HitRegionRegistry};
use crate::host::{Handled, HostHandler, HostNode, SharedSurface};
use crate::state::WidgetState;
use tracing::debug;

pub const CURSOR_ATTRIBUTE: &str = "data-sysdash-cursor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    Hand,
    Arrow,
}

impl CursorHint {
    pub fn as_str(self) -> &'static str {
        match self {
            CursorHint::Hand => "hand",
            CursorHint::Arrow => "arrow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Toggled(&'static str),
    Action(Action),
    Stale,
    Delegated(Handled),
}

impl Dispatch {
    pub fn is_consumed(self) -> bool {
        match self {
            Dispatch::Toggled(_) | Dispatch::Action(_) | Dispatch::Stale => true,
            Dispatch::Delegated(handled) => handled.is_consumed(),
        }
    }
}

pub struct InteractionDispatcher {
    surface: SharedSurface,
    host: Vec<Box<dyn HostHandler>>,
}

impl InteractionDispatcher {
    pub fn new(surface: SharedSurface) -> Self {
        Self {
            surface,
            host: Vec::new(),
        }
    }

    pub fn push_host_handler(&mut self, handler: Box<dyn HostHandler>) {
        self.host.push(handler);
    }

    pub fn surface(&self) -> &SharedSurface {
        &self.surface
    }

    // Regions of a superseded generation never match; the event goes straight
    // to the host chain.
    pub fn pointer_down(
        &mut self,
        registry: &HitRegionRegistry,
        generation: u64,
        position: Point,
        state: &mut WidgetState,
        node: &mut HostNode,
    ) -> Dispatch {
        if generation != registry.generation() {
            debug!(
                generation,
                current = registry.generation(),
                "pointer event against superseded regions"
            );
        } else if let Some(region) = registry.hit_test_at(generation, position) {
            return match region.kind {
                HitKind::CategoryHeader => {
                    if state.toggle_collapsed(region.key) {
                        node.set_dirty_canvas();
                        Dispatch::Toggled(region.key)
                    } else {
                        Dispatch::Stale
                    }
                }
                HitKind::Button => match Action::from_key(region.key) {
                    Some(action) => Dispatch::Action(action),
                    None => Dispatch::Stale,
                },
            };
        }

        let handled = self
            .host
            .iter_mut()
            .map(|h| h.pointer_down(position))
            .find(|h| h.is_consumed())
            .unwrap_or(Handled::Ignored);
        Dispatch::Delegated(handled)
    }

    pub fn pointer_move(
        &mut self,
        registry: &HitRegionRegistry,
        bounds: Size,
        position: Point,
    ) -> Option<CursorHint> {
        let hint = if bounds.contains(position) {
            let hint = if registry.is_hotspot(position) {
                CursorHint::Hand
            } else {
                CursorHint::Arrow
            };
            self.surface
                .borrow_mut()
                .set_attribute(CURSOR_ATTRIBUTE, hint.as_str());
            Some(hint)
        } else {
            self.clear_hint();
            None
        };

        for handler in &mut self.host {
            if handler.pointer_move(position).is_consumed() {
                break;
            }
        }
        hint
    }

    pub fn clear_hint(&self) {
        self.surface.borrow_mut().remove_attribute(CURSOR_ATTRIBUTE);
    }

    pub fn detach(&mut self) {
        self.clear_hint();
        for handler in &mut self.host {
            handler.removed();
        }
        self.host.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Rect;
    use crate::catalog::CATEGORIES;
    use crate::hits::RegionFrame;
    use crate::host::InputSurface;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Probe {
        downs: Rc<Cell<u32>>,
        moves: Rc<Cell<u32>>,
        removed: Rc<Cell<bool>>,
        consume: bool,
    }

    impl HostHandler for Probe {
        fn pointer_down(&mut self, _position: Point) -> Handled {
            self.downs.set(self.downs.get() + 1);
            if self.consume {
                Handled::Consumed
            } else {
                Handled::Ignored
            }
        }

        fn pointer_move(&mut self, _position: Point) -> Handled {
            self.moves.set(self.moves.get() + 1);
            Handled::Ignored
        }

        fn removed(&mut self) {
            self.removed.set(true);
        }
    }

    fn registry() -> HitRegionRegistry {
        let mut frame = RegionFrame::new();
        frame.button("copy", Rect::new(10.0, 10.0, 50.0, 20.0));
        frame.header("== System ==", Rect::new(10.0, 40.0, 200.0, 24.0));
        frame.header("== Retired ==", Rect::new(10.0, 70.0, 200.0, 24.0));
        let mut registry = HitRegionRegistry::new();
        registry.commit(frame);
        registry
    }

    fn node() -> HostNode {
        let mut node = HostNode::new(Size::new(300.0, 200.0));
        node.take_dirty();
        node
    }

    #[test]
    fn header_click_toggles_and_marks_dirty() {
        let registry = registry();
        let mut dispatcher = InteractionDispatcher::new(InputSurface::shared());
        let mut state = WidgetState::new(CATEGORIES);
        let mut node = node();

        let out = dispatcher.pointer_down(
            &registry,
            registry.generation(),
            Point::new(11.0, 41.0),
            &mut state,
            &mut node,
        );
        assert_eq!(out, Dispatch::Toggled("== System =="));
        assert!(out.is_consumed());
        assert!(state.is_collapsed("== System =="));
        assert!(node.is_dirty());
    }

    #[test]
    fn button_click_maps_to_action() {
        let registry = registry();
        let mut dispatcher = InteractionDispatcher::new(InputSurface::shared());
        let out = dispatcher.pointer_down(
            &registry,
            registry.generation(),
            Point::new(60.0, 30.0),
            &mut WidgetState::default(),
            &mut node(),
        );
        assert_eq!(out, Dispatch::Action(Action::Copy));
    }

    #[test]
    fn stale_clicks_change_nothing() {
        let registry = registry();
        let mut dispatcher = InteractionDispatcher::new(InputSurface::shared());
        let mut state = WidgetState::new(CATEGORIES);
        let mut node = node();

        let unknown = dispatcher.pointer_down(
            &registry,
            registry.generation(),
            Point::new(20.0, 80.0),
            &mut state,
            &mut node,
        );
        assert_eq!(unknown, Dispatch::Stale);

        let old = dispatcher.pointer_down(
            &registry,
            registry.generation() - 1,
            Point::new(20.0, 50.0),
            &mut state,
            &mut node,
        );
        assert_eq!(old, Dispatch::Delegated(Handled::Ignored));
        assert!(!state.is_collapsed("== System =="));
        assert!(!node.is_dirty());
    }

    #[test]
    fn superseded_generation_still_reaches_host_handlers() {
        let mut registry = registry();
        let old = registry.generation();
        let mut frame = RegionFrame::new();
        frame.header("== System ==", Rect::new(10.0, 40.0, 200.0, 24.0));
        registry.commit(frame);

        let mut dispatcher = InteractionDispatcher::new(InputSurface::shared());
        let host = Probe {
            consume: true,
            ..Probe::default()
        };
        let downs = host.downs.clone();
        dispatcher.push_host_handler(Box::new(host));
        let mut state = WidgetState::new(CATEGORIES);
        let mut node = node();

        let empty = dispatcher.pointer_down(
            &registry,
            old,
            Point::new(250.0, 150.0),
            &mut state,
            &mut node,
        );
        assert_eq!(empty, Dispatch::Delegated(Handled::Consumed));
        assert_eq!(downs.get(), 1);

        // Over a header, but the click was aimed at the old frame.
        let header = dispatcher.pointer_down(
            &registry,
            old,
            Point::new(20.0, 50.0),
            &mut state,
            &mut node,
        );
        assert_eq!(header, Dispatch::Delegated(Handled::Consumed));
        assert_eq!(downs.get(), 2);
        assert!(!state.is_collapsed("== System =="));
        assert!(!node.is_dirty());
    }

    #[test]
    fn misses_fall_through_to_host_in_order() {
        let registry = registry();
        let mut dispatcher = InteractionDispatcher::new(InputSurface::shared());
        let first = Probe::default();
        let second = Probe {
            consume: true,
            ..Probe::default()
        };
        let third = Probe::default();
        let (d1, d2, d3) = (first.downs.clone(), second.downs.clone(), third.downs.clone());
        dispatcher.push_host_handler(Box::new(first));
        dispatcher.push_host_handler(Box::new(second));
        dispatcher.push_host_handler(Box::new(third));

        let out = dispatcher.pointer_down(
            &registry,
            registry.generation(),
            Point::new(250.0, 150.0),
            &mut WidgetState::default(),
            &mut node(),
        );
        assert_eq!(out, Dispatch::Delegated(Handled::Consumed));
        assert_eq!((d1.get(), d2.get(), d3.get()), (1, 1, 0));

        // A hit never reaches the host.
        dispatcher.pointer_down(
            &registry,
            registry.generation(),
            Point::new(20.0, 20.0),
            &mut WidgetState::default(),
            &mut node(),
        );
        assert_eq!(d1.get(), 1);
    }

    #[test]
    fn cursor_hint_tracks_hotspots_and_bounds() {
        let registry = registry();
        let surface = InputSurface::shared();
        let mut dispatcher = InteractionDispatcher::new(surface.clone());
        let probe = Probe::default();
        let moves = probe.moves.clone();
        dispatcher.push_host_handler(Box::new(probe));
        let bounds = Size::new(300.0, 200.0);

        assert_eq!(
            dispatcher.pointer_move(&registry, bounds, Point::new(20.0, 20.0)),
            Some(CursorHint::Hand)
        );
        assert_eq!(surface.borrow().attribute(CURSOR_ATTRIBUTE), Some("hand"));

        dispatcher.pointer_move(&registry, bounds, Point::new(250.0, 150.0));
        assert_eq!(surface.borrow().attribute(CURSOR_ATTRIBUTE), Some("arrow"));

        assert_eq!(
            dispatcher.pointer_move(&registry, bounds, Point::new(-1.0, 5.0)),
            None
        );
        assert_eq!(surface.borrow().attribute(CURSOR_ATTRIBUTE), None);
        assert_eq!(moves.get(), 3);
    }

    #[test]
    fn detach_clears_hint_and_notifies_host() {
        let registry = registry();
        let surface = InputSurface::shared();
        let mut dispatcher = InteractionDispatcher::new(surface.clone());
        let probe = Probe::default();
        let removed = probe.removed.clone();
        dispatcher.push_host_handler(Box::new(probe));

        dispatcher.pointer_move(&registry, Size::new(300.0, 200.0), Point::new(20.0, 20.0));
        dispatcher.detach();
        assert_eq!(surface.borrow().attribute(CURSOR_ATTRIBUTE), None);
        assert!(removed.get());
    }
}
