use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cook-Torrance material parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PbrMaterial {
    pub name: String,
    pub albedo: Vec3,
    pub metallic: f32,
    pub roughness: f32,
    pub ao: f32,
}

impl Default for PbrMaterial {
    fn default() -> Self {
        Self {
            name: "default".into(),
            albedo: Vec3::new(0.5, 0.0, 0.0),
            metallic: 0.1,
            roughness: 0.4,
            ao: 1.0,
        }
    }
}

/// Errors from loading the material preset file.
#[derive(Debug, thiserror::Error)]
pub enum MaterialError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("preset file contains no materials")]
    Empty,
}

/// Named preset registry with one current selection and a mutable working
/// copy for live tuning.
///
/// Selecting a preset resets the working copy; slider edits only touch the
/// working copy, so presets themselves stay pristine.
#[derive(Debug, Clone)]
pub struct MaterialLibrary {
    materials: Vec<PbrMaterial>,
    current: usize,
    working: PbrMaterial,
}

impl MaterialLibrary {
    /// Load presets from a JSON array file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MaterialError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let materials: Vec<PbrMaterial> = serde_json::from_str(&data)?;
        if materials.is_empty() {
            return Err(MaterialError::Empty);
        }
        let working = materials[0].clone();
        Ok(Self {
            materials,
            current: 0,
            working,
        })
    }

    /// Load presets, falling back to the built-in list when the side file is
    /// missing or malformed.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(library) => library,
            Err(err) => {
                tracing::warn!(
                    path = %path.as_ref().display(),
                    "material preset file unusable ({err}), using built-ins"
                );
                Self::default()
            }
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.materials.iter().map(|m| m.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Switch the current preset; out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) {
        if index < self.materials.len() {
            self.current = index;
            self.working = self.materials[index].clone();
        }
    }

    /// The live-tunable copy of the current preset.
    pub fn working(&self) -> &PbrMaterial {
        &self.working
    }

    pub fn working_mut(&mut self) -> &mut PbrMaterial {
        &mut self.working
    }
}

impl Default for MaterialLibrary {
    fn default() -> Self {
        let materials = builtin_presets();
        let working = materials[0].clone();
        Self {
            materials,
            current: 0,
            working,
        }
    }
}

fn builtin_presets() -> Vec<PbrMaterial> {
    vec![
        PbrMaterial::default(),
        PbrMaterial {
            name: "gold".into(),
            albedo: Vec3::new(1.0, 0.766, 0.336),
            metallic: 1.0,
            roughness: 0.18,
            ao: 1.0,
        },
        PbrMaterial {
            name: "silver".into(),
            albedo: Vec3::new(0.972, 0.960, 0.915),
            metallic: 1.0,
            roughness: 0.25,
            ao: 1.0,
        },
        PbrMaterial {
            name: "blue plastic".into(),
            albedo: Vec3::new(0.05, 0.15, 0.7),
            metallic: 0.0,
            roughness: 0.35,
            ao: 1.0,
        },
        PbrMaterial {
            name: "rubber".into(),
            albedo: Vec3::new(0.1, 0.1, 0.1),
            metallic: 0.0,
            roughness: 0.9,
            ao: 1.0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_presets_from_json() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"[{{"name":"test","albedo":[0.1,0.2,0.3],"metallic":0.5,"roughness":0.6,"ao":0.9}}]"#
        )
        .unwrap();

        let library = MaterialLibrary::load(tmp.path()).unwrap();
        assert_eq!(library.len(), 1);
        assert_eq!(library.working().name, "test");
        assert_eq!(library.working().albedo, Vec3::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn empty_preset_file_is_an_error() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "[]").unwrap();
        assert!(matches!(
            MaterialLibrary::load(tmp.path()),
            Err(MaterialError::Empty)
        ));
    }

    #[test]
    fn missing_file_falls_back_to_builtins() {
        let library = MaterialLibrary::load_or_default("/nonexistent/materials.json");
        assert!(library.len() > 1);
        assert_eq!(library.current_index(), 0);
    }

    #[test]
    fn select_resets_working_copy() {
        let mut library = MaterialLibrary::default();
        library.working_mut().metallic = 0.123;
        library.select(1);
        assert_eq!(library.working().name, "gold");
        assert_eq!(library.working().metallic, 1.0);

        // Out-of-range selection is ignored.
        library.select(99);
        assert_eq!(library.current_index(), 1);
    }
}
