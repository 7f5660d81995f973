//! Drawable scene description
//!
//! Flat list of primitives handed to the renderer: the frame, its glass
//! surface, one box per placed panel, the sun sphere with its directional
//! light, and the sky. Everything is in world space.

use serde::Serialize;

use crate::layout::{BoxGeometry, Layout, PanelPlacement, PlaneGeometry};
use crate::sky::Sky;
use crate::sun::SunPosition;

const SUN_SPHERE_RADIUS: f64 = 20.0;
const SUN_EMISSIVE_INTENSITY: f64 = 1.5;
const GLASS_OPACITY: f64 = 0.3;
const PANEL_ROUGHNESS: f64 = 0.65;
const PANEL_METALNESS: f64 = 0.25;

const BLACK: [f64; 3] = [0.0, 0.0, 0.0];
const WHITE: [f64; 3] = [1.0, 1.0, 1.0];
const RED: [f64; 3] = [1.0, 0.0, 0.0];
const YELLOW: [f64; 3] = [1.0, 1.0, 0.0];
const SKY_BLUE: [f64; 3] = [135.0 / 255.0, 206.0 / 255.0, 235.0 / 255.0];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Material {
    pub color: [f64; 3],
    pub emissive: [f64; 3],
    pub emissive_intensity: f64,
    pub opacity: f64,
    pub roughness: f64,
    pub metalness: f64,
    pub wireframe: bool,
    /// Draw with the panel texture map
    pub textured: bool,
}

impl Material {
    fn plain(color: [f64; 3]) -> Self {
        Self {
            color,
            emissive: BLACK,
            emissive_intensity: 0.0,
            opacity: 1.0,
            roughness: 1.0,
            metalness: 0.0,
            wireframe: false,
            textured: false,
        }
    }

    fn wireframe(color: [f64; 3]) -> Self {
        Self { wireframe: true, ..Self::plain(color) }
    }

    fn glass() -> Self {
        Self { opacity: GLASS_OPACITY, ..Self::plain(SKY_BLUE) }
    }

    fn healthy_panel() -> Self {
        Self {
            textured: true,
            roughness: PANEL_ROUGHNESS,
            metalness: PANEL_METALNESS,
            ..Self::plain(WHITE)
        }
    }

    /// Untextured red-tinted panel whose red channel and glow follow `pulse`.
    fn faulted_panel(pulse: f64) -> Self {
        Self {
            color: [pulse, 100.0 / 255.0, 100.0 / 255.0],
            emissive: RED,
            emissive_intensity: 0.5 * pulse,
            roughness: PANEL_ROUGHNESS,
            metalness: PANEL_METALNESS,
            ..Self::plain(WHITE)
        }
    }

    fn sun() -> Self {
        Self { emissive: YELLOW, emissive_intensity: SUN_EMISSIVE_INTENSITY, ..Self::plain(WHITE) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    #[serde(rename = "box")]
    Cuboid {
        name: String,
        geometry: BoxGeometry,
        material: Material,
    },
    Plane {
        name: String,
        geometry: PlaneGeometry,
        material: Material,
    },
    Sphere {
        name: String,
        center: [f64; 3],
        radius: f64,
        material: Material,
    },
    DirectionalLight {
        position: [f64; 3],
        intensity: f64,
        cast_shadow: bool,
    },
    AmbientLight {
        intensity: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub background: [f64; 3],
    pub star_count: u32,
    pub primitives: Vec<Primitive>,
}

impl Scene {
    /// Compose the scene from the derived layout and sun state.
    ///
    /// `pulse` is the current fault highlight brightness, `sun_intensity` the
    /// directional light strength.
    pub fn compose(layout: &Layout, sun: &SunPosition, sun_intensity: f64, pulse: f64) -> Self {
        let sky = Sky::from_sun_height(sun.y);
        let mut primitives = Vec::with_capacity(layout.placements.len() + 5);

        primitives.push(Primitive::AmbientLight { intensity: sky.ambient_intensity });
        primitives.push(Primitive::Sphere {
            name: "sun".to_string(),
            center: sun.as_array(),
            radius: SUN_SPHERE_RADIUS,
            material: Material::sun(),
        });
        primitives.push(Primitive::DirectionalLight {
            position: sun.as_array(),
            intensity: sun_intensity,
            cast_shadow: true,
        });
        primitives.push(Primitive::Cuboid {
            name: "frame".to_string(),
            geometry: layout.frame,
            material: Material::wireframe(BLACK),
        });
        primitives.extend(
            layout.placements.iter().map(|p| panel_primitive(p, layout.height_from_ground, pulse)),
        );
        primitives.push(Primitive::Plane {
            name: "glass".to_string(),
            geometry: layout.glass,
            material: Material::glass(),
        });

        Self { background: sky.background, star_count: sky.star_count, primitives }
    }

    pub fn panels(&self) -> impl Iterator<Item = (&str, &BoxGeometry, &Material)> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Cuboid { name, geometry, material } if name.starts_with("panel-") => {
                Some((name.as_str(), geometry, material))
            }
            _ => None,
        })
    }
}

fn panel_primitive(p: &PanelPlacement, height_from_ground: f64, pulse: f64) -> Primitive {
    let material = if p.faulted { Material::faulted_panel(pulse) } else { Material::healthy_panel() };
    Primitive::Cuboid {
        name: format!("panel-{}", p.index),
        geometry: BoxGeometry { center: p.world_position(height_from_ground), size: p.size },
        material,
    }
}
