use crate::canvas::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Button,
    CategoryHeader,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HitRegion {
    pub kind: HitKind,
    pub key: &'static str,
    pub rect: Rect,
}

#[derive(Debug, Default)]
pub struct RegionFrame {
    regions: Vec<HitRegion>,
}

impl RegionFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn button(&mut self, key: &'static str, rect: Rect) {
        self.regions.push(HitRegion {
            kind: HitKind::Button,
            key,
            rect,
        });
    }

    pub fn header(&mut self, key: &'static str, rect: Rect) {
        self.regions.push(HitRegion {
            kind: HitKind::CategoryHeader,
            key,
            rect,
        });
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct HitRegionRegistry {
    generation: u64,
    regions: Vec<HitRegion>,
}

impl HitRegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn regions(&self) -> &[HitRegion] {
        &self.regions
    }

    pub fn commit(&mut self, frame: RegionFrame) -> u64 {
        self.regions = frame.regions;
        self.generation += 1;
        self.generation
    }

    pub fn clear(&mut self) {
        self.regions.clear();
        self.generation += 1;
    }

    pub fn hit_test(&self, point: Point) -> Option<&HitRegion> {
        self.regions.iter().find(|r| r.rect.contains_point(point))
    }

    pub fn hit_test_at(&self, generation: u64, point: Point) -> Option<&HitRegion> {
        if generation != self.generation {
            return None;
        }
        self.hit_test(point)
    }

    pub fn is_hotspot(&self, point: Point) -> bool {
        self.hit_test(point).is_some()
    }
}
