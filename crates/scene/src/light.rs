use glam::Vec3;

/// Point light with distance attenuation.
///
/// Attenuation defaults follow the usual constant/linear/quadratic table for
/// a ~50 unit radius.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub on: bool,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl PointLight {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            color: Vec3::ONE,
            intensity: 1.0,
            on: true,
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

/// Spot light descriptor consumed by the shader-side light array.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub color: Vec3,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            color: Vec3::ONE,
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

/// Headlamp-style light: position and direction are synced from the camera
/// every frame by the render loop.
///
/// `cut_off`/`outer_cut_off` are cone cosines, not angles.
#[derive(Debug, Clone, PartialEq)]
pub struct FlashLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub cut_off: f32,
    pub outer_cut_off: f32,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub on: bool,
}

impl FlashLight {
    pub fn new(position: Vec3, direction: Vec3) -> Self {
        Self {
            position,
            direction,
            ..Self::default()
        }
    }
}

impl Default for FlashLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            color: Vec3::ONE,
            intensity: 1.0,
            cut_off: 12.5_f32.to_radians().cos(),
            outer_cut_off: 17.5_f32.to_radians().cos(),
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
            on: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_light_defaults() {
        let light = PointLight::new(Vec3::new(2.42, 1.7, -1.5));
        assert!(light.on);
        assert_eq!(light.intensity, 1.0);
        assert_eq!(light.color, Vec3::ONE);
        assert_eq!(light.constant, 1.0);
    }

    #[test]
    fn flash_light_cone_is_stored_as_cosines() {
        let light = FlashLight::default();
        // Inner cone is tighter, so its cosine is larger.
        assert!(light.cut_off > light.outer_cut_off);
        assert!(light.cut_off < 1.0);
    }

    #[test]
    fn flash_light_tracks_given_pose() {
        let light = FlashLight::new(Vec3::splat(1.0), Vec3::X);
        assert_eq!(light.position, Vec3::splat(1.0));
        assert_eq!(light.direction, Vec3::X);
    }
}
