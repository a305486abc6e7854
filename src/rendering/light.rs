use crate::utils::{Rgb, Vector3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HemisphereLight {
    pub sky_color: Rgb,
    pub ground_color: Rgb,
    pub intensity: f32,
    pub position: Vector3,
}

impl Default for HemisphereLight {
    fn default() -> Self {
        Self {
            sky_color: Rgb(0xffffff),
            ground_color: Rgb(0x8d8d8d),
            intensity: 6.0,
            position: Vector3::new(0.0, 20.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalLight {
    pub color: Rgb,
    pub intensity: f32,
    pub position: Vector3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Rgb(0xffffff),
            intensity: 2.5,
            position: Vector3::new(10.0, 20.0, 5.0),
        }
    }
}

/// Shadow map settings of the directional light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowParams {
    pub cast_shadow: bool,
    pub map_size_width: u32,
    pub map_size_height: u32,
    /// Softness
    pub radius: f32,
    pub bias: f32,
    pub camera_top: f32,
    pub camera_bottom: f32,
    pub camera_left: f32,
    pub camera_right: f32,
    pub camera_near: f32,
    pub camera_far: f32,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            cast_shadow: true,
            map_size_width: 2048,
            map_size_height: 2048,
            radius: 3.0,
            bias: -0.001,
            camera_top: 2.0,
            camera_bottom: -2.0,
            camera_left: -2.0,
            camera_right: 2.0,
            camera_near: 10.0,
            camera_far: 40.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingState {
    pub hemisphere: HemisphereLight,
    pub directional: DirectionalLight,
    pub shadow: ShadowParams,
}
