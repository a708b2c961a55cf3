//! World pack catalog: the loaded, immutable content of a single game world
//! (lore, NPCs, locations, regions, preset characters) plus its lookups.

use crate::error::{AstinusError, WorldPackLoadError};
use crate::i18n::LocalizedString;
use crate::model::{LoreEntry, LoreVisibility, Location, Npc, PresetCharacter, Region};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Era/genre/tone triple used to introduce a world pack's setting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldPackSetting {
    pub era: LocalizedString,
    pub genre: LocalizedString,
    pub tone: LocalizedString,
}

/// **\[SUPPLEMENT\]**: pack-level metadata, resolved from
/// `original_source`'s `WorldPackInfo` model. `starting_location_id`
/// resolves which location a freshly created session starts in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldPackInfo {
    pub id: String,
    pub name: LocalizedString,
    pub description: LocalizedString,
    pub starting_location_id: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default)]
    pub setting: Option<WorldPackSetting>,
    #[serde(default)]
    pub player_hook: Option<LocalizedString>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}
fn default_author() -> String {
    "Unknown".to_string()
}

/// The loaded content of one world: lore entries keyed by uid, NPCs and
/// locations keyed by their string ids, regions, and preset characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldPack {
    pub info: WorldPackInfo,
    #[serde(default)]
    pub entries: HashMap<i64, LoreEntry>,
    #[serde(default)]
    pub npcs: HashMap<String, Npc>,
    #[serde(default)]
    pub locations: HashMap<String, Location>,
    #[serde(default)]
    pub preset_characters: Vec<PresetCharacter>,
    #[serde(default)]
    pub regions: HashMap<String, Region>,
}

impl WorldPack {
    pub fn get_entry(&self, uid: i64) -> Option<&LoreEntry> {
        self.entries.get(&uid)
    }

    pub fn get_npc(&self, npc_id: &str) -> Option<&Npc> {
        self.npcs.get(npc_id)
    }

    pub fn get_location(&self, location_id: &str) -> Option<&Location> {
        self.locations.get(location_id)
    }

    pub fn get_region(&self, region_id: &str) -> Option<&Region> {
        self.regions.get(region_id)
    }

    pub fn get_preset_character(&self, preset_id: &str) -> Option<&PresetCharacter> {
        self.preset_characters.iter().find(|p| p.id == preset_id)
    }

    /// All entries with `constant = true`.
    pub fn constant_entries(&self) -> Vec<&LoreEntry> {
        self.entries.values().filter(|e| e.constant).collect()
    }

    /// The region containing `location_id`, or `None` if the location has
    /// no `region_id` or the location itself is unknown. Callers wanting
    /// the `_global` sentinel should substitute it themselves (see
    /// [`crate::location_context`]).
    pub fn get_location_region(&self, location_id: &str) -> Option<&Region> {
        let location = self.get_location(location_id)?;
        let region_id = location.region_id.as_ref()?;
        self.get_region(region_id)
    }

    /// Lore applicable to `location_id` at the given `visibility` tier:
    /// constant entries, entries scoped to this location, entries scoped to
    /// its region, and unrestricted (global) entries. Sorted by `order`.
    pub fn lore_for_location(
        &self,
        location_id: &str,
        visibility: LoreVisibility,
    ) -> Vec<&LoreEntry> {
        let region = self.get_location_region(location_id);

        let mut matches: Vec<&LoreEntry> = self
            .entries
            .values()
            .filter(|entry| {
                if entry.constant {
                    return true;
                }
                if entry.visibility != visibility {
                    return false;
                }
                if entry.has_location_restriction() {
                    return entry.applicable_locations.iter().any(|l| l == location_id);
                }
                if entry.has_region_restriction() {
                    return region.is_some_and(|r| entry.applicable_regions.iter().any(|g| g == &r.id));
                }
                true
            })
            .collect();

        matches.sort_by_key(|e| e.order);
        matches
    }

    /// Entries whose primary (or, if `include_secondary`, secondary) keys
    /// bidirectionally substring-match `keyword`, sorted by `order`.
    pub fn search_entries_by_keyword(&self, keyword: &str, include_secondary: bool) -> Vec<&LoreEntry> {
        let keyword_lower = keyword.to_lowercase();
        let bidirectional = |k: &str| {
            let k_lower = k.to_lowercase();
            keyword_lower.contains(&k_lower) || k_lower.contains(&keyword_lower)
        };

        let mut matches: Vec<&LoreEntry> = self
            .entries
            .values()
            .filter(|entry| {
                if entry.primary_keys.iter().any(|k| bidirectional(k)) {
                    return true;
                }
                include_secondary && entry.secondary_keys.iter().any(|k| bidirectional(k))
            })
            .collect();

        matches.sort_by_key(|e| e.order);
        matches
    }
}

/// Parse and validate a world-pack JSON document already read into memory.
/// On a schema error, reports the JSON Pointer path to the offending field
/// via `serde_path_to_error`; the caller attaches the file path.
pub fn parse(json: &str) -> Result<WorldPack, WorldPackLoadError> {
    let deserializer = &mut serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(deserializer).map_err(|e| WorldPackLoadError::Json {
        path: e.path().to_string(),
        source: e.into_inner(),
    })
}

/// Load and validate a world-pack JSON file from disk.
pub async fn load(path: impl AsRef<Path>) -> Result<WorldPack, AstinusError> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy().to_string();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AstinusError::WorldPack {
            path: path_str.clone(),
            source: WorldPackLoadError::Read(e),
        })?;
    parse(&content).map_err(|source| AstinusError::WorldPack { path: path_str, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::LocalizedString;
    use crate::model::LoreVisibility;

    fn entry(uid: i64, primary: &[&str], order: i32, constant: bool) -> LoreEntry {
        LoreEntry {
            uid,
            primary_keys: primary.iter().map(|s| s.to_string()).collect(),
            secondary_keys: vec![],
            content: LocalizedString::new("内容", "content"),
            constant,
            selective: true,
            order,
            visibility: LoreVisibility::Basic,
            applicable_regions: vec![],
            applicable_locations: vec![],
        }
    }

    fn empty_pack() -> WorldPack {
        WorldPack {
            info: WorldPackInfo {
                id: "test-pack".into(),
                name: LocalizedString::new("世界", "World"),
                description: LocalizedString::default(),
                starting_location_id: "start".into(),
                version: default_version(),
                author: default_author(),
                setting: None,
                player_hook: None,
            },
            entries: HashMap::new(),
            npcs: HashMap::new(),
            locations: HashMap::new(),
            preset_characters: vec![],
            regions: HashMap::new(),
        }
    }

    #[test]
    fn search_matches_bidirectional_substring() {
        let mut pack = empty_pack();
        pack.entries.insert(1, entry(1, &["王城"], 100, false));
        let hits = pack.search_entries_by_keyword("王", true);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].uid, 1);
    }

    #[test]
    fn search_sorts_by_order() {
        let mut pack = empty_pack();
        pack.entries.insert(1, entry(1, &["castle"], 200, false));
        pack.entries.insert(2, entry(2, &["castle gate"], 50, false));
        let hits = pack.search_entries_by_keyword("castle", true);
        assert_eq!(hits.iter().map(|e| e.uid).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn lore_for_location_includes_constant_regardless_of_visibility() {
        let mut pack = empty_pack();
        let mut always = entry(1, &[], 100, true);
        always.visibility = LoreVisibility::Detailed;
        pack.entries.insert(1, always);
        let result = pack.lore_for_location("anywhere", LoreVisibility::Basic);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn lore_for_location_filters_by_restriction() {
        let mut pack = empty_pack();
        let mut restricted = entry(1, &[], 100, false);
        restricted.applicable_locations = vec!["tavern".to_string()];
        pack.entries.insert(1, restricted);

        assert_eq!(pack.lore_for_location("tavern", LoreVisibility::Basic).len(), 1);
        assert_eq!(pack.lore_for_location("forest", LoreVisibility::Basic).len(), 0);
    }

    #[test]
    fn lore_for_location_includes_unrestricted_global_entries() {
        let mut pack = empty_pack();
        pack.entries.insert(1, entry(1, &[], 100, false));
        assert_eq!(pack.lore_for_location("anywhere", LoreVisibility::Basic).len(), 1);
    }

    #[test]
    fn parse_reads_a_minimal_world_pack() {
        let json = r#"{
            "info": {
                "id": "demo",
                "name": {"cn": "演示", "en": "Demo"},
                "description": {"cn": "", "en": ""},
                "starting_location_id": "start"
            },
            "locations": {
                "start": {"id": "start", "name": {"cn": "起点", "en": "Start"}, "description": {"cn": "", "en": ""}}
            }
        }"#;
        let pack = parse(json).unwrap();
        assert_eq!(pack.info.id, "demo");
        assert_eq!(pack.info.starting_location_id, "start");
        assert!(pack.get_location("start").is_some());
    }

    #[test]
    fn parse_reports_json_pointer_path_on_schema_error() {
        let json = r#"{
            "info": {
                "id": "demo",
                "name": {"cn": "演示", "en": "Demo"},
                "description": {"cn": "", "en": ""},
                "starting_location_id": "start"
            },
            "locations": {
                "start": {"id": "start", "name": "not-a-localized-string", "description": {"cn": "", "en": ""}}
            }
        }"#;
        let err = parse(json).unwrap_err();
        match err {
            WorldPackLoadError::Json { path, .. } => assert!(path.contains("locations"), "path was: {path}"),
            WorldPackLoadError::Read(_) => panic!("expected a Json error"),
        }
    }
}
