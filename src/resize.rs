use crate::host::HostNode;
use crate::render::{LayoutMode, LayoutOutput};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizePolicy {
    pub min_height: f32,
    pub max_height: f32,
    pub fallback_min_height: f32,
    pub padding: f32,
    pub fallback_padding: f32,
    pub min_width: f32,
}

impl Default for ResizePolicy {
    fn default() -> Self {
        Self {
            min_height: 220.0,
            max_height: 1100.0,
            fallback_min_height: 180.0,
            padding: 14.0,
            fallback_padding: 10.0,
            min_width: 520.0,
        }
    }
}

impl ResizePolicy {
    pub fn with_min_width(mut self, min_width: f32) -> Self {
        self.min_width = min_width;
        self
    }

    pub fn desired_height(&self, output: &LayoutOutput) -> f32 {
        match output.mode {
            LayoutMode::Snapshot => (output.content_bottom + self.padding)
                .clamp(self.min_height, self.max_height),
            LayoutMode::Fallback => {
                (output.content_bottom + self.fallback_padding).max(self.fallback_min_height)
            }
        }
    }

    pub fn apply(&self, node: &mut HostNode, output: &LayoutOutput) -> bool {
        let desired = self.desired_height(output);
        if node.size.height == desired {
            return false;
        }
        node.size.height = desired;
        true
    }

    pub fn apply_width_floor(&self, node: &mut HostNode) -> bool {
        if node.size.width >= self.min_width {
            return false;
        }
        node.size.width = self.min_width;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Size;

    fn output(mode: LayoutMode, content_bottom: f32) -> LayoutOutput {
        LayoutOutput {
            mode,
            content_bottom,
        }
    }

    #[test]
    fn snapshot_height_is_clamped() {
        let policy = ResizePolicy::default();
        assert_eq!(policy.desired_height(&output(LayoutMode::Snapshot, 10.0)), 220.0);
        assert_eq!(policy.desired_height(&output(LayoutMode::Snapshot, 400.0)), 414.0);
        assert_eq!(policy.desired_height(&output(LayoutMode::Snapshot, 5000.0)), 1100.0);
    }

    #[test]
    fn fallback_height_has_floor_only() {
        let policy = ResizePolicy::default();
        assert_eq!(policy.desired_height(&output(LayoutMode::Fallback, 50.0)), 180.0);
        assert_eq!(policy.desired_height(&output(LayoutMode::Fallback, 2000.0)), 2010.0);
    }

    #[test]
    fn apply_only_when_changed() {
        let policy = ResizePolicy::default();
        let mut node = HostNode::new(Size::new(560.0, 360.0));
        let out = output(LayoutMode::Snapshot, 400.0);
        assert!(policy.apply(&mut node, &out));
        assert_eq!(node.size.height, 414.0);
        assert!(!policy.apply(&mut node, &out));
    }

    #[test]
    fn width_floor_never_shrinks() {
        let policy = ResizePolicy::default();
        let mut narrow = HostNode::new(Size::new(300.0, 360.0));
        assert!(policy.apply_width_floor(&mut narrow));
        assert_eq!(narrow.size.width, 520.0);

        let mut wide = HostNode::new(Size::new(900.0, 360.0));
        assert!(!policy.apply_width_floor(&mut wide));
        assert_eq!(wide.size.width, 900.0);
    }
}
