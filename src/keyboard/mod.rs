//! Per-key animation state.
//!
//! Every physical key of the layout is one [`KeyInstance`] in an arena owned
//! by [`Keyboard`]. Logical names map to one or more handles, so a name like
//! `shift` drives both Shift keys at once. Input only moves a key's target
//! depth; [`Keyboard::tick`] animates the rendered depth toward it.

pub mod hover;
pub mod spring;

use std::collections::HashMap;

use glam::Vec3;

use crate::layout::{is_special_key, normalize_key_name, LayoutTable, KEY_HEIGHT};
use crate::models::RgbColor;

pub use hover::{Aabb, HoverChange, HoverDetector, Ray};
pub use spring::SpringState;

/// Target depth while a key is physically held.
pub const PRESSED_DEPTH: f32 = 2.0;

/// Target depth while the pointer rests on a key.
pub const HOVER_DEPTH: f32 = 1.0;

/// Target depth at rest.
pub const REST_DEPTH: f32 = 0.0;

/// Key cap thickness along the depth axis.
const KEY_THICKNESS: f32 = 10.0;

/// Handle to one key instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(usize);

impl KeyId {
    /// Position of the instance in [`Keyboard::instances`].
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One renderable key.
#[derive(Debug, Clone)]
pub struct KeyInstance {
    name: String,
    label: &'static str,
    row: u8,
    target_depth: f32,
    spring: SpringState,
    is_hovered: bool,
    color: RgbColor,
    bounds: Aabb,
}

impl KeyInstance {
    /// Normalized key name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display label (case preserved).
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Layout row.
    #[must_use]
    pub const fn row(&self) -> u8 {
        self.row
    }

    /// Depth the spring is moving toward.
    #[must_use]
    pub const fn target_depth(&self) -> f32 {
        self.target_depth
    }

    /// Rendered depth.
    #[must_use]
    pub const fn current_depth(&self) -> f32 {
        self.spring.current
    }

    /// Spring velocity.
    #[must_use]
    pub const fn velocity(&self) -> f32 {
        self.spring.velocity
    }

    /// Whether the pointer is over this key.
    #[must_use]
    pub const fn is_hovered(&self) -> bool {
        self.is_hovered
    }

    /// Key cap color.
    #[must_use]
    pub const fn color(&self) -> RgbColor {
        self.color
    }

    /// Bounds on the keyboard plane at rest.
    #[must_use]
    pub const fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Whether the key takes the special key color.
    #[must_use]
    pub fn is_special(&self) -> bool {
        is_special_key(&self.name)
    }
}

/// Arena of key instances with a name index.
#[derive(Debug, Clone)]
pub struct Keyboard {
    instances: Vec<KeyInstance>,
    by_name: HashMap<String, Vec<KeyId>>,
}

impl Keyboard {
    /// Builds one instance per placed key in `layout`.
    #[must_use]
    pub fn from_layout(layout: &LayoutTable) -> Self {
        let mut instances = Vec::with_capacity(layout.keys().len());
        let mut by_name: HashMap<String, Vec<KeyId>> = HashMap::new();

        for (idx, def) in layout.keys().iter().enumerate() {
            let name = def.key_name();
            let bounds = Aabb::new(
                Vec3::new(def.x, def.y - KEY_HEIGHT / 2.0, -KEY_THICKNESS / 2.0),
                Vec3::new(def.x + def.width, def.y + KEY_HEIGHT / 2.0, KEY_THICKNESS / 2.0),
            );
            by_name.entry(name.clone()).or_default().push(KeyId(idx));
            instances.push(KeyInstance {
                name,
                label: def.name,
                row: def.row,
                target_depth: REST_DEPTH,
                spring: SpringState::default(),
                is_hovered: false,
                color: RgbColor::default(),
                bounds,
            });
        }

        Self { instances, by_name }
    }

    /// Handles for a key name (any spelling [`normalize_key_name`] accepts).
    ///
    /// Empty for names the layout does not contain.
    #[must_use]
    pub fn ids_named(&self, name: &str) -> &[KeyId] {
        self.by_name
            .get(&normalize_key_name(name))
            .map_or(&[], Vec::as_slice)
    }

    /// All handles in arena order.
    pub fn ids(&self) -> impl Iterator<Item = KeyId> {
        (0..self.instances.len()).map(KeyId)
    }

    /// Looks up an instance by handle.
    #[must_use]
    pub fn instance(&self, id: KeyId) -> Option<&KeyInstance> {
        self.instances.get(id.0)
    }

    /// All instances in arena order.
    #[must_use]
    pub fn instances(&self) -> &[KeyInstance] {
        &self.instances
    }

    /// Presses every instance of `name`. Returns how many were matched.
    ///
    /// Idempotent; unknown names change nothing.
    pub fn press(&mut self, name: &str) -> usize {
        self.update_named(name, |key| key.target_depth = PRESSED_DEPTH)
    }

    /// Releases every instance of `name`. Returns how many were matched.
    ///
    /// A hovered key returns to hover depth instead of rest.
    pub fn release(&mut self, name: &str) -> usize {
        self.update_named(name, |key| {
            key.target_depth = if key.is_hovered {
                HOVER_DEPTH
            } else {
                REST_DEPTH
            };
        })
    }

    /// Sets hover state for one instance.
    ///
    /// Hover only deepens a resting key and only lifts a key it deepened, so
    /// a held key stays pressed through hover changes.
    pub fn set_hover(&mut self, id: KeyId, hovered: bool) {
        let Some(key) = self.instances.get_mut(id.0) else {
            return;
        };
        key.is_hovered = hovered;
        if hovered {
            if key.target_depth < HOVER_DEPTH {
                key.target_depth = HOVER_DEPTH;
            }
        } else if key.target_depth == HOVER_DEPTH {
            key.target_depth = REST_DEPTH;
        }
    }

    /// Advances every spring one frame.
    pub fn tick(&mut self) {
        for key in &mut self.instances {
            key.spring.step(key.target_depth);
        }
    }

    /// Colors the given instances.
    pub fn set_color(&mut self, ids: &[KeyId], color: RgbColor) {
        for id in ids {
            if let Some(key) = self.instances.get_mut(id.0) {
                key.color = color;
            }
        }
    }

    /// Colors every key with the special or normal theme color.
    pub fn apply_theme(&mut self, special: RgbColor, normal: RgbColor) {
        for key in &mut self.instances {
            key.color = if is_special_key(&key.name) {
                special
            } else {
                normal
            };
        }
    }

    /// Returns every key to rest immediately and clears hover.
    pub fn reset(&mut self) {
        for key in &mut self.instances {
            key.target_depth = REST_DEPTH;
            key.spring = SpringState::default();
            key.is_hovered = false;
        }
    }

    /// True when every spring has settled on its target.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.instances
            .iter()
            .all(|key| key.spring.is_settled(key.target_depth, 1e-3))
    }

    fn update_named(&mut self, name: &str, mut apply: impl FnMut(&mut KeyInstance)) -> usize {
        let Some(ids) = self.by_name.get(&normalize_key_name(name)) else {
            return 0;
        };
        for id in ids {
            if let Some(key) = self.instances.get_mut(id.0) {
                apply(key);
            }
        }
        ids.len()
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::from_layout(&LayoutTable::standard())
    }
}
