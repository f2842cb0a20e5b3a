use std::path::{Path, PathBuf};

use glam::Vec3;

use super::light::DirectionalLight;
use super::transform::Transform;

/// A static model placed in the scene
#[derive(Debug, Clone)]
pub struct SceneryEntry {
    pub name: &'static str,
    pub mesh: PathBuf,
    pub texture: PathBuf,
    pub transform: Transform,
}

/// Where the player spawns and which assets it uses.
#[derive(Debug, Clone)]
pub struct PlayerSpawn {
    pub mesh: PathBuf,
    pub texture: PathBuf,
    pub normal_map: PathBuf,
    pub transform: Transform,
}

/// Everything in the world other than the player's controller state.
pub struct Scene {
    pub player: PlayerSpawn,
    pub scenery: Vec<SceneryEntry>,
    pub sun: DirectionalLight,
}

// (name, mesh, texture, position, scale, rotation)
const SCENERY: [(&str, &str, &str, [f32; 3], f32, [f32; 3]); 6] = [
    ("crab", "crab.obj", "crab.png", [0.0, 0.0, -150.0], 5.0, [-90.0, 0.0, 0.0]),
    ("dolphin", "dolphin.obj", "dolphin.jpg", [120.0, -225.0, 300.0], 0.15, [-120.0, -45.0, 0.0]),
    ("goldfish", "goldfish.obj", "goldfish.jpg", [180.0, -275.0, 380.0], 1.5, [45.0, -90.0, 90.0]),
    ("shark", "shark.obj", "shark.jpg", [-225.0, -195.0, 375.0], 0.3, [0.0, -90.0, 0.0]),
    ("fish", "fish.obj", "brickwall.jpg", [-275.0, -260.0, 435.0], 2.5, [-180.0, 0.0, 0.0]),
    ("obelisk", "obelisk.obj", "obelisk.jpg", [0.0, -500.0, 900.0], 10.0, [-90.0, 0.0, 0.0]),
];

impl Scene {
    /// The dive site: the submersible at the surface and six models below it.
    pub fn dive_site(asset_root: &Path) -> Self {
        let scenery = SCENERY
            .iter()
            .map(|&(name, mesh, texture, pos, scale, rot)| SceneryEntry {
                name,
                mesh: asset_root.join(mesh),
                texture: asset_root.join(texture),
                transform: Transform::new(Vec3::from_array(pos), scale, Vec3::from_array(rot)),
            })
            .collect();

        Self {
            player: PlayerSpawn {
                mesh: asset_root.join("fish.obj"),
                texture: asset_root.join("brickwall.jpg"),
                normal_map: asset_root.join("brickwall_normal.jpg"),
                transform: Transform::new(Vec3::ZERO, 0.1, Vec3::ZERO),
            },
            scenery,
            sun: DirectionalLight::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dive_site_layout() {
        let scene = Scene::dive_site(Path::new("assets"));
        assert_eq!(scene.scenery.len(), 6);
        assert_eq!(scene.player.transform.position, Vec3::ZERO);
        assert_eq!(scene.player.mesh, Path::new("assets").join("fish.obj"));
        assert_eq!(scene.player.normal_map, Path::new("assets").join("brickwall_normal.jpg"));

        let obelisk = scene.scenery.iter().find(|e| e.name == "obelisk").unwrap();
        assert_eq!(obelisk.transform.position, Vec3::new(0.0, -500.0, 900.0));
        assert_eq!(obelisk.transform.scale, Vec3::splat(10.0));
        // Everything but the crab sits below the surface
        assert!(scene.scenery.iter().filter(|e| e.name != "crab").all(|e| e.transform.position.y < 0.0));
    }
}
