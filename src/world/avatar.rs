//! Avatar appearance data: the slot enums and the per-session avatar record.

use crate::utils::Rgb;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body-part attachment points on the base model.
///
/// The string form is the node name used inside the model files and the
/// asset subfolder the part meshes live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelSlot {
    #[serde(rename = "head")]
    Head,
    #[serde(rename = "body_up_A", alias = "body_up_a")]
    BodyUpA,
    #[serde(rename = "hand")]
    Hand,
}

impl ModelSlot {
    pub const ALL: [ModelSlot; 3] = [ModelSlot::Head, ModelSlot::BodyUpA, ModelSlot::Hand];

    pub fn name(&self) -> &'static str {
        match self {
            ModelSlot::Head => "head",
            ModelSlot::BodyUpA => "body_up_A",
            ModelSlot::Hand => "hand",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.name() == name)
    }
}

impl fmt::Display for ModelSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Face texture layers drawn over the skin on the head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceSlot {
    Eyes,
    Mouth,
    Face,
}

impl FaceSlot {
    /// Layer order, bottom to top (the skin sits below all of them).
    pub const ALL: [FaceSlot; 3] = [FaceSlot::Eyes, FaceSlot::Mouth, FaceSlot::Face];

    pub fn name(&self) -> &'static str {
        match self {
            FaceSlot::Eyes => "eyes",
            FaceSlot::Mouth => "mouth",
            FaceSlot::Face => "face",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.name() == name)
    }

    /// Infer the layer from a catalog texture name such as `eyes_02`
    pub fn from_texture_name(texture: &str) -> Option<Self> {
        texture.split('_').next().and_then(Self::from_name)
    }
}

impl fmt::Display for FaceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mesh regions of the base model that receive a generated texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRegion {
    Head,
    Body,
    Ear,
    Hand,
}

impl TextureRegion {
    /// Regions that take the plain tinted skin.
    pub const SKIN: [TextureRegion; 3] = [TextureRegion::Ear, TextureRegion::Body, TextureRegion::Hand];

    pub fn name(&self) -> &'static str {
        match self {
            TextureRegion::Head => "head",
            TextureRegion::Body => "body",
            TextureRegion::Ear => "ear",
            TextureRegion::Hand => "hand",
        }
    }

    /// Resolve the region a node belongs to from its name prefix
    /// (`head_mesh` -> head, `body_up_A` -> body).
    pub fn from_node_name(name: &str) -> Option<Self> {
        match name.split('_').next()? {
            "head" => Some(TextureRegion::Head),
            "body" => Some(TextureRegion::Body),
            "ear" => Some(TextureRegion::Ear),
            "hand" => Some(TextureRegion::Hand),
            _ => None,
        }
    }
}

/// A single write into [`AvatarState`].
#[derive(Debug, Clone, PartialEq)]
pub enum AvatarEntry {
    Model(ModelSlot, String),
    Face(FaceSlot, String),
    Skin(Rgb),
}

/// What the avatar should look like. An empty string means "none".
///
/// Serializes as a flat record, e.g.
/// `{"head":"head_01","body_up_A":"","hand":"","eyes":"eyes_01",...,"skin":16770257}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarState {
    head: String,
    #[serde(rename = "body_up_A", alias = "body_up_a")]
    body_up_a: String,
    hand: String,
    eyes: String,
    mouth: String,
    face: String,
    skin: Rgb,
}

impl Default for AvatarState {
    fn default() -> Self {
        Self {
            head: String::new(),
            body_up_a: String::new(),
            hand: String::new(),
            eyes: String::new(),
            mouth: String::new(),
            face: String::new(),
            skin: Rgb(0xffe4d1),
        }
    }
}

impl AvatarState {
    pub fn model(&self, slot: ModelSlot) -> &str {
        match slot {
            ModelSlot::Head => &self.head,
            ModelSlot::BodyUpA => &self.body_up_a,
            ModelSlot::Hand => &self.hand,
        }
    }

    pub fn face(&self, slot: FaceSlot) -> &str {
        match slot {
            FaceSlot::Eyes => &self.eyes,
            FaceSlot::Mouth => &self.mouth,
            FaceSlot::Face => &self.face,
        }
    }

    pub fn skin(&self) -> Rgb {
        self.skin
    }

    /// Overwrite one entry. Names are not checked against any catalog.
    pub fn set(&mut self, entry: AvatarEntry) {
        match entry {
            AvatarEntry::Model(slot, name) => *self.model_mut(slot) = name,
            AvatarEntry::Face(slot, name) => *self.face_mut(slot) = name,
            AvatarEntry::Skin(color) => self.skin = color,
        }
    }

    pub fn set_model(&mut self, slot: ModelSlot, name: impl Into<String>) {
        self.set(AvatarEntry::Model(slot, name.into()));
    }

    pub fn set_face(&mut self, slot: FaceSlot, name: impl Into<String>) {
        self.set(AvatarEntry::Face(slot, name.into()));
    }

    pub fn set_skin(&mut self, color: Rgb) {
        self.set(AvatarEntry::Skin(color));
    }

    pub fn reset(&mut self, defaults: &AvatarState) {
        *self = defaults.clone();
    }

    /// Slots with a non-empty part selection, in slot order
    pub fn selected_models(&self) -> impl Iterator<Item = (ModelSlot, &str)> + '_ {
        ModelSlot::ALL
            .into_iter()
            .map(|slot| (slot, self.model(slot)))
            .filter(|(_, name)| !name.is_empty())
    }

    fn model_mut(&mut self, slot: ModelSlot) -> &mut String {
        match slot {
            ModelSlot::Head => &mut self.head,
            ModelSlot::BodyUpA => &mut self.body_up_a,
            ModelSlot::Hand => &mut self.hand,
        }
    }

    fn face_mut(&mut self, slot: FaceSlot) -> &mut String {
        match slot {
            FaceSlot::Eyes => &mut self.eyes,
            FaceSlot::Mouth => &mut self.mouth,
            FaceSlot::Face => &mut self.face,
        }
    }
}
