use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub base_color: [u8; 4],
    #[serde(default)]
    pub flags: MaterialFlags,
    #[serde(default)]
    pub metallic_factor: u8, // 0-255 -> 0.0-1.0
    #[serde(default = "Material::default_roughness")]
    pub roughness_factor: u8, // 0-255 -> 0.0-1.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialFlags(u32);

impl MaterialFlags {
    pub const NONE: Self = Self(0);
    pub const ALPHA_BLEND: Self = Self(1 << 0);
    pub const DOUBLE_SIDED: Self = Self(1 << 1);

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for MaterialFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for MaterialFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl Material {
    pub fn new(name: impl Into<String>, color: [u8; 4]) -> Self {
        Self {
            name: name.into(),
            base_color: color,
            flags: MaterialFlags::NONE,
            metallic_factor: 0,
            roughness_factor: Self::default_roughness(),
        }
    }

    pub fn with_alpha(mut self) -> Self {
        self.flags |= MaterialFlags::ALPHA_BLEND;
        self
    }

    pub fn double_sided(mut self) -> Self {
        self.flags |= MaterialFlags::DOUBLE_SIDED;
        self
    }

    /// Short name used when naming generated nodes and assets: the first
    /// whitespace-separated word of the material name.
    pub fn display_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("Material")
    }

    const fn default_roughness() -> u8 {
        255
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_takes_first_word() {
        let material = Material::new("Stone Wall (Instance)", [128, 128, 128, 255]);
        assert_eq!(material.display_name(), "Stone");
    }

    #[test]
    fn display_name_of_blank_material_falls_back() {
        let material = Material::new("   ", [255; 4]);
        assert_eq!(material.display_name(), "Material");
    }

    #[test]
    fn builders_set_flags() {
        let material = Material::new("Glass", [255; 4]).with_alpha().double_sided();
        assert!(material.flags.contains(MaterialFlags::ALPHA_BLEND));
        assert!(material.flags.contains(MaterialFlags::DOUBLE_SIDED));
    }
}
