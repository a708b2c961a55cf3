//! Core world data model: traits, characters, lore, locations, regions, NPCs.
//!
//! World-pack identifiers (`location_id`, `region_id`, `npc_id`) are plain
//! snake_case strings, matching the pack's on-disk JSON; only `LoreEntry::uid`
//! is a numeric identifier.

use crate::i18n::LocalizedString;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A double-edged character quality: something that helps in some
/// situations and hinders in others.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trait {
    pub name: LocalizedString,
    pub description: LocalizedString,
    pub positive_aspect: LocalizedString,
    pub negative_aspect: LocalizedString,
}

/// Error returned when a `PlayerCharacter` invariant is violated.
#[derive(Debug, thiserror::Error)]
pub enum CharacterError {
    #[error("a character must have between 1 and 4 traits, got {0}")]
    TraitCountOutOfRange(usize),
    #[error("fate_points must be between 0 and 5, got {0}")]
    FatePointsOutOfRange(i32),
    #[error("duplicate tag: {0}")]
    DuplicateTag(String),
}

/// The player's character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerCharacter {
    pub name: String,
    pub concept: LocalizedString,
    pub traits: Vec<Trait>,
    pub fate_points: i32,
    tags: Vec<String>,
}

impl PlayerCharacter {
    /// Construct a character, validating all three invariants:
    /// `1 <= traits.len() <= 4`, `0 <= fate_points <= 5`, no duplicate tags.
    pub fn new(
        name: impl Into<String>,
        concept: LocalizedString,
        traits: Vec<Trait>,
        fate_points: i32,
        tags: Vec<String>,
    ) -> Result<Self, CharacterError> {
        if !(1..=4).contains(&traits.len()) {
            return Err(CharacterError::TraitCountOutOfRange(traits.len()));
        }
        if !(0..=5).contains(&fate_points) {
            return Err(CharacterError::FatePointsOutOfRange(fate_points));
        }
        let mut seen = HashSet::new();
        for tag in &tags {
            if !seen.insert(tag.clone()) {
                return Err(CharacterError::DuplicateTag(tag.clone()));
            }
        }
        Ok(Self {
            name: name.into(),
            concept,
            traits,
            fate_points,
            tags,
        })
    }

    /// A character's default starting fate point total.
    pub const STARTING_FATE_POINTS: i32 = 3;

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Append a tag; rejects duplicates, preserving the no-duplicates invariant.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> Result<(), CharacterError> {
        let tag = tag.into();
        if self.tags.contains(&tag) {
            return Err(CharacterError::DuplicateTag(tag));
        }
        self.tags.push(tag);
        Ok(())
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Visibility tier of a [`LoreEntry`]: `basic` entries are auto-revealed,
/// `detailed` ones only surface on explicit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoreVisibility {
    Basic,
    Detailed,
}

/// A fragment of world background, optionally gated by keywords, region, or
/// location. See [`crate::lore`] for how these are scored and retrieved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoreEntry {
    pub uid: i64,
    pub primary_keys: Vec<String>,
    #[serde(default)]
    pub secondary_keys: Vec<String>,
    pub content: LocalizedString,
    #[serde(default)]
    pub constant: bool,
    #[serde(default = "default_true")]
    pub selective: bool,
    #[serde(default = "default_order")]
    pub order: i32,
    #[serde(default = "default_visibility")]
    pub visibility: LoreVisibility,
    #[serde(default)]
    pub applicable_regions: Vec<String>,
    #[serde(default)]
    pub applicable_locations: Vec<String>,
}

fn default_true() -> bool {
    true
}
fn default_order() -> i32 {
    100
}
fn default_visibility() -> LoreVisibility {
    LoreVisibility::Basic
}

impl LoreEntry {
    /// Whether this entry is restricted to a specific set of locations.
    pub fn has_location_restriction(&self) -> bool {
        !self.applicable_locations.is_empty()
    }

    /// Whether this entry is restricted to a specific set of regions.
    pub fn has_region_restriction(&self) -> bool {
        !self.applicable_regions.is_empty()
    }
}

/// A hierarchical grouping of locations sharing tone and atmosphere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: LocalizedString,
    pub description: LocalizedString,
    #[serde(default)]
    pub narrative_tone: Option<LocalizedString>,
    #[serde(default)]
    pub atmosphere_keywords: Vec<String>,
    #[serde(default)]
    pub location_ids: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The sentinel region id used when a location declares no `region_id`.
pub const GLOBAL_REGION_ID: &str = "_global";

impl Region {
    /// The synthetic region substituted for locations with no `region_id`:
    /// empty tone/keywords, id `_global`, localized display name.
    pub fn global_sentinel() -> Self {
        Self {
            id: GLOBAL_REGION_ID.to_string(),
            name: LocalizedString::new("全局区域", "Global Region"),
            description: LocalizedString::default(),
            narrative_tone: None,
            atmosphere_keywords: Vec::new(),
            location_ids: Vec::new(),
            tags: Vec::new(),
        }
    }
}

/// A scene where gameplay happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: LocalizedString,
    pub description: LocalizedString,
    #[serde(default)]
    pub atmosphere: Option<LocalizedString>,
    #[serde(default)]
    pub region_id: Option<String>,
    #[serde(default)]
    pub connected_locations: Vec<String>,
    #[serde(default)]
    pub present_npc_ids: Vec<String>,
    #[serde(default)]
    pub visible_items: Vec<String>,
    #[serde(default)]
    pub hidden_items: Vec<String>,
    /// Pre-migration packs store items in a flat, undifferentiated list;
    /// `visible_items` falls back to this when empty (see
    /// [`crate::location_context`]).
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub lore_tags: Vec<String>,
}

impl Location {
    pub fn is_connected_to(&self, other: &str) -> bool {
        self.connected_locations.iter().any(|id| id == other)
    }
}

/// NPC narrative layer: determines how an NPC speaks. Injected into the
/// roleplaying sub-agent's system prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Soul {
    pub name: String,
    pub description: LocalizedString,
    pub personality: Vec<String>,
    pub speech_style: LocalizedString,
    #[serde(default)]
    pub example_dialogue: Vec<DialogueExample>,
}

/// A single few-shot (player utterance, NPC reply) example pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueExample {
    pub user: String,
    pub npc: String,
}

/// NPC data layer: structured, backend-managed state, never directly
/// editable by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub current_location: String,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub relations: HashMap<String, i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub memory: HashMap<String, Vec<String>>,
    /// `location_id -> [lore uid]`. Empty map means no restriction
    /// (backward-compat rule): the NPC knows all lore.
    #[serde(default)]
    pub location_knowledge: HashMap<String, Vec<i64>>,
}

impl Body {
    /// Clamp a relation delta into `[-100, 100]` and apply it, inserting a
    /// fresh `0` baseline if the entity was previously unknown.
    pub fn adjust_relation(&mut self, entity_id: &str, delta: i32) -> i32 {
        let current = *self.relations.get(entity_id).unwrap_or(&0);
        let new = (current + delta).clamp(-100, 100);
        self.relations.insert(entity_id.to_string(), new);
        new
    }
}

/// A non-player character: a narrative [`Soul`] plus a data [`Body`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    pub id: String,
    pub soul: Soul,
    pub body: Body,
}

/// A ready-to-play character template offered at session creation.
/// **\[SUPPLEMENT\]**: named by `spec.md` §6's world-pack description but
/// elaborated from `original_source`'s `PresetCharacter` model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetCharacter {
    pub id: String,
    pub name: String,
    pub concept: LocalizedString,
    pub traits: Vec<Trait>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trait_fixture() -> Trait {
        Trait {
            name: LocalizedString::new("勇敢", "Brave"),
            description: LocalizedString::new("无所畏惧", "Fearless"),
            positive_aspect: LocalizedString::new("冲锋在前", "Leads the charge"),
            negative_aspect: LocalizedString::new("鲁莽", "Reckless"),
        }
    }

    #[test]
    fn rejects_zero_traits() {
        let err = PlayerCharacter::new(
            "Hero",
            LocalizedString::new("冒险者", "Adventurer"),
            vec![],
            3,
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, CharacterError::TraitCountOutOfRange(0)));
    }

    #[test]
    fn rejects_five_traits() {
        let traits = std::iter::repeat_with(trait_fixture).take(5).collect();
        let err = PlayerCharacter::new(
            "Hero",
            LocalizedString::new("冒险者", "Adventurer"),
            traits,
            3,
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, CharacterError::TraitCountOutOfRange(5)));
    }

    #[test]
    fn rejects_fate_points_out_of_range() {
        let err = PlayerCharacter::new(
            "Hero",
            LocalizedString::new("冒险者", "Adventurer"),
            vec![trait_fixture()],
            6,
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, CharacterError::FatePointsOutOfRange(6)));
    }

    #[test]
    fn rejects_duplicate_tags() {
        let err = PlayerCharacter::new(
            "Hero",
            LocalizedString::new("冒险者", "Adventurer"),
            vec![trait_fixture()],
            3,
            vec!["injured".to_string(), "injured".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, CharacterError::DuplicateTag(_)));
    }

    #[test]
    fn add_tag_rejects_duplicate() {
        let mut pc = PlayerCharacter::new(
            "Hero",
            LocalizedString::new("冒险者", "Adventurer"),
            vec![trait_fixture()],
            3,
            vec!["injured".to_string()],
        )
        .unwrap();
        assert!(pc.add_tag("injured").is_err());
        assert!(pc.add_tag("armed").is_ok());
        assert!(pc.has_tag("armed"));
    }

    #[test]
    fn relation_clamps_to_range() {
        let mut body = Body {
            current_location: "study".into(),
            inventory: vec![],
            relations: HashMap::new(),
            tags: vec![],
            memory: HashMap::new(),
            location_knowledge: HashMap::new(),
        };
        assert_eq!(body.adjust_relation("pc", 150), 100);
        assert_eq!(body.adjust_relation("pc", -500), -100);
    }

    #[test]
    fn global_sentinel_has_fixed_id() {
        assert_eq!(Region::global_sentinel().id, GLOBAL_REGION_ID);
    }
}
