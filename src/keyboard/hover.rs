//! Pointer hover detection against key bounds.
//!
//! The pointer is cast as a ray into the keyboard. Every key box the ray
//! passes through is hovered; keys the ray no longer hits are released from
//! hover. The detector keeps only the set of hovered handles and delegates
//! all state changes to [`Keyboard::set_hover`].

use glam::Vec3;

use super::{KeyId, Keyboard};

/// Height above the keyboard plane that pointer rays start from.
const POINTER_EYE_HEIGHT: f32 = 100.0;

/// A ray in keyboard space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point
    pub origin: Vec3,
    /// Direction (need not be normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a ray from an origin and direction.
    #[must_use]
    pub const fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Straight-down ray through a point on the keyboard plane.
    #[must_use]
    pub fn from_pointer(x: f32, y: f32) -> Self {
        Self::new(Vec3::new(x, y, POINTER_EYE_HEIGHT), Vec3::NEG_Z)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Creates a box from two corners.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Distance along `ray` to the first hit, if the ray hits the box.
    ///
    /// Slab test; a ray starting inside the box hits at distance 0. Points
    /// on a face count as inside.
    #[must_use]
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let mut t_near = 0.0_f32;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            let (min, max) = (self.min[axis], self.max[axis]);

            // Parallel to this slab: no crossing, only containment.
            if direction == 0.0 {
                if origin < min || origin > max {
                    return None;
                }
                continue;
            }

            let t1 = (min - origin) / direction;
            let t2 = (max - origin) / direction;
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
            if t_near > t_far {
                return None;
            }
        }

        Some(t_near)
    }
}

/// Hovered-key bookkeeping between pointer moves.
#[derive(Debug, Clone, Default)]
pub struct HoverDetector {
    hovered: Vec<KeyId>,
}

/// Keys whose hover state changed on one pointer update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoverChange {
    /// Keys that became hovered
    pub entered: Vec<KeyId>,
    /// Keys that stopped being hovered
    pub left: Vec<KeyId>,
}

impl HoverDetector {
    /// Creates a detector with nothing hovered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys hit by `ray`, nearest first.
    #[must_use]
    pub fn pick(keyboard: &Keyboard, ray: &Ray) -> Vec<(KeyId, f32)> {
        let mut hits: Vec<(KeyId, f32)> = keyboard
            .ids()
            .filter_map(|id| {
                let key = keyboard.instance(id)?;
                key.bounds().intersect(ray).map(|distance| (id, distance))
            })
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits
    }

    /// Updates hover state for a pointer move.
    ///
    /// `None` means the pointer left the keyboard, which clears all hover.
    pub fn update(&mut self, ray: Option<&Ray>, keyboard: &mut Keyboard) -> HoverChange {
        let hit: Vec<KeyId> = ray
            .map(|ray| Self::pick(keyboard, ray).into_iter().map(|(id, _)| id).collect())
            .unwrap_or_default();

        let mut change = HoverChange::default();

        for id in &self.hovered {
            if !hit.contains(id) {
                keyboard.set_hover(*id, false);
                change.left.push(*id);
            }
        }

        for id in &hit {
            if !self.hovered.contains(id) {
                keyboard.set_hover(*id, true);
                change.entered.push(*id);
            }
        }

        self.hovered = hit;
        change
    }

    /// Clears all hover state.
    pub fn clear(&mut self, keyboard: &mut Keyboard) {
        self.update(None, keyboard);
    }

    /// Currently hovered keys.
    #[must_use]
    pub fn hovered(&self) -> &[KeyId] {
        &self.hovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::{HOVER_DEPTH, REST_DEPTH};
    use crate::layout::LayoutTable;

    fn center_of(keyboard: &Keyboard, name: &str) -> (f32, f32) {
        let id = keyboard.ids_named(name)[0];
        let bounds = keyboard.instance(id).unwrap().bounds();
        let center = (bounds.min + bounds.max) / 2.0;
        (center.x, center.y)
    }

    #[test]
    fn test_aabb_intersection() {
        let aabb = Aabb::new(Vec3::new(0.0, 0.0, -1.0), Vec3::new(2.0, 2.0, 1.0));
        let hit = aabb.intersect(&Ray::from_pointer(1.0, 1.0));
        assert_eq!(hit, Some(POINTER_EYE_HEIGHT - 1.0));

        assert_eq!(aabb.intersect(&Ray::from_pointer(3.0, 1.0)), None);

        let away = Ray::new(Vec3::new(1.0, 1.0, 10.0), Vec3::Z);
        assert_eq!(aabb.intersect(&away), None);
    }

    #[test]
    fn test_aabb_edges_count_as_hits() {
        let aabb = Aabb::new(Vec3::new(0.0, 0.0, -1.0), Vec3::new(2.0, 2.0, 1.0));
        let expected = Some(POINTER_EYE_HEIGHT - 1.0);

        assert_eq!(aabb.intersect(&Ray::from_pointer(0.0, 1.0)), expected);
        assert_eq!(aabb.intersect(&Ray::from_pointer(2.0, 1.0)), expected);
        assert_eq!(aabb.intersect(&Ray::from_pointer(1.0, 0.0)), expected);
        assert_eq!(aabb.intersect(&Ray::from_pointer(2.0, 2.0)), expected);
        assert_eq!(aabb.intersect(&Ray::from_pointer(2.001, 1.0)), None);
        assert_eq!(aabb.intersect(&Ray::from_pointer(-0.001, 1.0)), None);
    }

    #[test]
    fn test_key_edge_hovers_the_key() {
        let mut keyboard = Keyboard::from_layout(&LayoutTable::standard());
        let mut detector = HoverDetector::new();
        let q = keyboard.ids_named("q")[0];
        let bounds = keyboard.instance(q).unwrap().bounds();

        let ray = Ray::from_pointer(bounds.min.x, (bounds.min.y + bounds.max.y) / 2.0);
        let change = detector.update(Some(&ray), &mut keyboard);
        assert_eq!(change.entered, vec![q]);
    }

    #[test]
    fn test_hover_enters_and_leaves() {
        let mut keyboard = Keyboard::from_layout(&LayoutTable::standard());
        let mut detector = HoverDetector::new();
        let (qx, qy) = center_of(&keyboard, "q");
        let (wx, wy) = center_of(&keyboard, "w");
        let q = keyboard.ids_named("q")[0];
        let w = keyboard.ids_named("w")[0];

        let change = detector.update(Some(&Ray::from_pointer(qx, qy)), &mut keyboard);
        assert_eq!(change.entered, vec![q]);
        assert!(keyboard.instance(q).unwrap().is_hovered());
        assert_eq!(keyboard.instance(q).unwrap().target_depth(), HOVER_DEPTH);

        let change = detector.update(Some(&Ray::from_pointer(wx, wy)), &mut keyboard);
        assert_eq!(change.left, vec![q]);
        assert_eq!(change.entered, vec![w]);
        assert!(!keyboard.instance(q).unwrap().is_hovered());
        assert_eq!(keyboard.instance(q).unwrap().target_depth(), REST_DEPTH);

        detector.clear(&mut keyboard);
        assert!(detector.hovered().is_empty());
        assert!(!keyboard.instance(w).unwrap().is_hovered());
    }

    #[test]
    fn test_pointer_in_gap_hovers_nothing() {
        let mut keyboard = Keyboard::from_layout(&LayoutTable::standard());
        let mut detector = HoverDetector::new();
        let (qx, qy) = center_of(&keyboard, "q");

        // Halfway between two rows falls in the vertical gap.
        let change = detector.update(Some(&Ray::from_pointer(qx, qy + 9.5)), &mut keyboard);
        assert!(change.entered.is_empty());
    }

    #[test]
    fn test_unchanged_pointer_reports_no_change() {
        let mut keyboard = Keyboard::from_layout(&LayoutTable::standard());
        let mut detector = HoverDetector::new();
        let (ax, ay) = center_of(&keyboard, "a");
        let ray = Ray::from_pointer(ax, ay);

        detector.update(Some(&ray), &mut keyboard);
        let change = detector.update(Some(&ray), &mut keyboard);
        assert_eq!(change, HoverChange::default());
    }
}
