use glam::{Mat4, Vec3};
use lumen_scene::{FlashLight, SpotLight};
use std::collections::HashMap;

/// A resolved location inside a uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub offset: usize,
    pub size: usize,
}

/// Resolves uniform names to block locations.
///
/// Lookup is treated as expensive; [`UniformStage`] memoizes the result per
/// distinct name. A name that does not exist resolves to `None` — the
/// backend-agnostic replacement for the "not found" sentinel of location
/// queries.
pub trait UniformLayout {
    fn locate(&self, name: &str) -> Option<UniformSlot>;
    /// Total byte size of the staging block.
    fn byte_len(&self) -> usize;
}

/// Declared field table for one uniform block.
#[derive(Debug, Clone, Default)]
pub struct BlockLayout {
    fields: Vec<(String, UniformSlot)>,
    len: usize,
}

impl BlockLayout {
    pub fn new(len: usize) -> Self {
        Self {
            fields: Vec::new(),
            len,
        }
    }

    pub fn field(mut self, name: impl Into<String>, offset: usize, size: usize) -> Self {
        debug_assert!(offset + size <= self.len);
        self.fields.push((name.into(), UniformSlot { offset, size }));
        self
    }
}

impl UniformLayout for BlockLayout {
    fn locate(&self, name: &str) -> Option<UniformSlot> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, slot)| *slot)
    }

    fn byte_len(&self) -> usize {
        self.len
    }
}

/// CPU staging block with a memoized name→slot cache and typed setters.
///
/// The memo holds `Option<UniformSlot>` so misses are cached too: setting a
/// uniform the layout lacks stays a silent no-op and never re-queries.
pub struct UniformStage {
    layout: Box<dyn UniformLayout>,
    memo: HashMap<String, Option<UniformSlot>>,
    bytes: Vec<u8>,
    dirty: bool,
}

impl UniformStage {
    pub fn new(layout: impl UniformLayout + 'static) -> Self {
        let bytes = vec![0; layout.byte_len()];
        Self {
            layout: Box::new(layout),
            memo: HashMap::new(),
            bytes,
            dirty: true,
        }
    }

    /// Resolve a name through the memo; issues at most one layout query per
    /// distinct name.
    fn slot(&mut self, name: &str) -> Option<UniformSlot> {
        if let Some(cached) = self.memo.get(name) {
            return *cached;
        }
        let resolved = self.layout.locate(name);
        self.memo.insert(name.to_owned(), resolved);
        resolved
    }

    fn write(&mut self, name: &str, data: &[u8]) {
        let Some(slot) = self.slot(name) else {
            return;
        };
        debug_assert!(data.len() <= slot.size, "uniform {name} overflows its slot");
        let end = slot.offset + data.len().min(slot.size);
        self.bytes[slot.offset..end].copy_from_slice(&data[..end - slot.offset]);
        self.dirty = true;
    }

    pub fn set_u32(&mut self, name: &str, value: u32) {
        self.write(name, bytemuck::bytes_of(&value));
    }

    pub fn set_f32(&mut self, name: &str, value: f32) {
        self.write(name, bytemuck::bytes_of(&value));
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.write(name, bytemuck::bytes_of(&value.to_array()));
    }

    pub fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.write(name, bytemuck::bytes_of(&value.to_cols_array()));
    }

    /// Serialize a spot-light array as `spot_lights[i].field` plus a count.
    /// The field-name and indexing convention is shader ABI; do not change
    /// it without changing the WGSL side.
    pub fn set_spot_lights(&mut self, lights: &[SpotLight]) {
        self.set_u32("num_spot_lights", lights.len() as u32);
        for (i, light) in lights.iter().enumerate() {
            self.set_vec3(&format!("spot_lights[{i}].position"), light.position);
            self.set_vec3(&format!("spot_lights[{i}].color"), light.color);
            self.set_f32(&format!("spot_lights[{i}].constant"), light.constant);
            self.set_f32(&format!("spot_lights[{i}].linear"), light.linear);
            self.set_f32(&format!("spot_lights[{i}].quadratic"), light.quadratic);
        }
    }

    /// Serialize the flash-light array; color is premultiplied by intensity.
    pub fn set_flash_lights(&mut self, lights: &[FlashLight]) {
        self.set_u32("num_flash_lights", lights.len() as u32);
        for (i, light) in lights.iter().enumerate() {
            self.set_vec3(&format!("flash_lights[{i}].position"), light.position);
            self.set_vec3(&format!("flash_lights[{i}].direction"), light.direction);
            self.set_vec3(
                &format!("flash_lights[{i}].color"),
                light.color * light.intensity,
            );
            self.set_f32(&format!("flash_lights[{i}].cut_off"), light.cut_off);
            self.set_f32(
                &format!("flash_lights[{i}].outer_cut_off"),
                light.outer_cut_off,
            );
            self.set_f32(&format!("flash_lights[{i}].constant"), light.constant);
            self.set_f32(&format!("flash_lights[{i}].linear"), light.linear);
            self.set_f32(&format!("flash_lights[{i}].quadratic"), light.quadratic);
            self.set_u32(&format!("flash_lights[{i}].on"), light.on as u32);
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns whether the staging block changed since the last call and
    /// clears the flag; the backend uploads only when true.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Drop all memoized lookups. Called when a re-link changes the
    /// program's interface.
    pub fn reset_cache(&mut self) {
        self.memo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingLayout {
        inner: BlockLayout,
        queries: Rc<Cell<usize>>,
    }

    impl UniformLayout for CountingLayout {
        fn locate(&self, name: &str) -> Option<UniformSlot> {
            self.queries.set(self.queries.get() + 1);
            self.inner.locate(name)
        }

        fn byte_len(&self) -> usize {
            self.inner.byte_len()
        }
    }

    fn counting_stage() -> (UniformStage, Rc<Cell<usize>>) {
        let queries = Rc::new(Cell::new(0));
        let layout = CountingLayout {
            inner: BlockLayout::new(128)
                .field("view", 0, 64)
                .field("roughness", 64, 4)
                .field("albedo", 80, 12),
            queries: queries.clone(),
        };
        (UniformStage::new(layout), queries)
    }

    #[test]
    fn second_lookup_hits_the_cache() {
        let (mut stage, queries) = counting_stage();
        stage.set_f32("roughness", 0.5);
        stage.set_f32("roughness", 0.7);
        stage.set_f32("roughness", 0.9);
        assert_eq!(queries.get(), 1);
    }

    #[test]
    fn distinct_names_query_once_each() {
        let (mut stage, queries) = counting_stage();
        stage.set_f32("roughness", 0.5);
        stage.set_vec3("albedo", Vec3::ONE);
        stage.set_vec3("albedo", Vec3::ZERO);
        assert_eq!(queries.get(), 2);
    }

    #[test]
    fn missing_name_is_a_cached_no_op() {
        let (mut stage, queries) = counting_stage();
        let before = stage.bytes().to_vec();
        stage.set_f32("does_not_exist", 1.0);
        stage.set_f32("does_not_exist", 2.0);
        assert_eq!(stage.bytes(), &before[..]);
        assert_eq!(queries.get(), 1);
    }

    #[test]
    fn reset_cache_forces_requery() {
        let (mut stage, queries) = counting_stage();
        stage.set_f32("roughness", 0.5);
        stage.reset_cache();
        stage.set_f32("roughness", 0.5);
        assert_eq!(queries.get(), 2);
    }

    #[test]
    fn values_land_at_declared_offsets() {
        let layout = BlockLayout::new(32).field("a", 0, 4).field("b", 16, 12);
        let mut stage = UniformStage::new(layout);
        stage.set_f32("a", 1.0);
        stage.set_vec3("b", Vec3::new(1.0, 2.0, 3.0));

        let bytes = stage.bytes();
        assert_eq!(&bytes[0..4], bytemuck::bytes_of(&1.0f32));
        assert_eq!(&bytes[16..28], bytemuck::bytes_of(&[1.0f32, 2.0, 3.0]));
    }

    #[test]
    fn dirty_flag_tracks_writes() {
        let (mut stage, _) = counting_stage();
        assert!(stage.take_dirty());
        assert!(!stage.take_dirty());
        stage.set_f32("roughness", 0.2);
        assert!(stage.take_dirty());
    }

    #[test]
    fn flash_lights_serialize_with_indexed_field_names() {
        let layout = BlockLayout::new(256)
            .field("num_flash_lights", 0, 4)
            .field("flash_lights[0].position", 16, 12)
            .field("flash_lights[0].color", 32, 12)
            .field("flash_lights[0].on", 44, 4);
        let mut stage = UniformStage::new(layout);

        let mut light = FlashLight::default();
        light.color = Vec3::new(0.5, 0.5, 0.5);
        light.intensity = 2.0;
        light.on = true;
        stage.set_flash_lights(&[light]);

        let bytes = stage.bytes();
        assert_eq!(&bytes[0..4], bytemuck::bytes_of(&1u32));
        // Color is premultiplied by intensity at serialization time.
        assert_eq!(&bytes[32..44], bytemuck::bytes_of(&[1.0f32, 1.0, 1.0]));
        assert_eq!(&bytes[44..48], bytemuck::bytes_of(&1u32));
    }

    #[test]
    fn spot_light_count_is_written_even_when_empty() {
        let layout = BlockLayout::new(16).field("num_spot_lights", 0, 4);
        let mut stage = UniformStage::new(layout);
        stage.set_spot_lights(&[]);
        assert_eq!(&stage.bytes()[0..4], bytemuck::bytes_of(&0u32));
    }
}
