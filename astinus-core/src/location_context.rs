//! Location Context Assembler: aggregates a region + location + basic lore
//! + atmosphere guidance into a per-turn context bundle.

use crate::i18n::{Lang, LocalizedString};
use crate::model::{LoreVisibility, Region};
use crate::world_pack::WorldPack;
use std::collections::HashSet;

/// Region summary injected into a scene bundle.
#[derive(Debug, Clone)]
pub struct RegionContext {
    pub id: String,
    pub name: String,
    pub narrative_tone: Option<String>,
    pub atmosphere_keywords: Vec<String>,
}

/// Location summary injected into a scene bundle.
#[derive(Debug, Clone)]
pub struct LocationContext {
    pub id: String,
    pub name: String,
    pub description: String,
    pub atmosphere: Option<String>,
    pub visible_items: Vec<String>,
    pub hidden_items_revealed: Vec<String>,
    pub hidden_items_remaining: Vec<String>,
}

/// Full per-turn scene bundle: region, location, basic lore, and a
/// concatenated atmosphere guidance string.
#[derive(Debug, Clone)]
pub struct SceneBundle {
    pub region: RegionContext,
    pub location: LocationContext,
    pub basic_lore: Vec<String>,
    pub atmosphere_guidance: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LocationContextError {
    #[error("unknown location: {0}")]
    UnknownLocation(String),
}

/// Assemble the [`SceneBundle`] for `location_id`: region (or the `_global`
/// sentinel when the location has no region), location detail with
/// discovered/undiscovered hidden items split out, basic lore sorted by
/// order, and a concatenated atmosphere-guidance string.
pub fn assemble_scene(
    pack: &WorldPack,
    location_id: &str,
    discovered_items: &HashSet<String>,
    lang: Lang,
) -> Result<SceneBundle, LocationContextError> {
    let location = pack
        .get_location(location_id)
        .ok_or_else(|| LocationContextError::UnknownLocation(location_id.to_string()))?;

    let region = pack
        .get_location_region(location_id)
        .cloned()
        .unwrap_or_else(Region::global_sentinel);

    let visible_items = if location.visible_items.is_empty() {
        location.items.clone()
    } else {
        location.visible_items.clone()
    };

    let hidden_items_revealed: Vec<String> = location
        .hidden_items
        .iter()
        .filter(|id| discovered_items.contains(*id))
        .cloned()
        .collect();
    let hidden_items_remaining: Vec<String> = location
        .hidden_items
        .iter()
        .filter(|id| !discovered_items.contains(*id))
        .cloned()
        .collect();

    let basic_lore: Vec<String> = pack
        .lore_for_location(location_id, LoreVisibility::Basic)
        .into_iter()
        .map(|entry| entry.content.get(lang).to_string())
        .collect();

    let atmosphere_guidance = build_atmosphere_guidance(&region, location, lang);

    Ok(SceneBundle {
        region: RegionContext {
            id: region.id.clone(),
            name: region.name.get(lang).to_string(),
            narrative_tone: region.narrative_tone.as_ref().map(|t| t.get(lang).to_string()),
            atmosphere_keywords: region.atmosphere_keywords.clone(),
        },
        location: LocationContext {
            id: location.id.clone(),
            name: location.name.get(lang).to_string(),
            description: location.description.get(lang).to_string(),
            atmosphere: location.atmosphere.as_ref().map(|a| a.get(lang).to_string()),
            visible_items,
            hidden_items_revealed,
            hidden_items_remaining,
        },
        basic_lore,
        atmosphere_guidance,
    })
}

fn build_atmosphere_guidance(region: &Region, location: &crate::model::Location, lang: Lang) -> String {
    let mut parts = Vec::new();
    if let Some(tone) = &region.narrative_tone {
        let tone = tone.get(lang);
        if !tone.is_empty() {
            parts.push(tone.to_string());
        }
    }
    if let Some(atmosphere) = &location.atmosphere {
        let atmosphere = atmosphere.get(lang);
        if !atmosphere.is_empty() {
            parts.push(atmosphere.to_string());
        }
    }
    if !region.atmosphere_keywords.is_empty() {
        let label = LocalizedString::new("氛围关键词", "atmosphere keywords").get(lang).to_string();
        parts.push(format!("{label}: {}", region.atmosphere_keywords.join(", ")));
    }
    parts.join(" | ")
}

/// Lore visible to `npc_id` at `location_id`, gated by [`crate::model::Body::location_knowledge`]:
/// an empty map means the NPC knows all pack lore (legacy packs); otherwise
/// only the uids listed for this location are returned.
pub fn filter_npc_lore<'a>(
    pack: &'a WorldPack,
    npc_id: &str,
    location_id: &str,
) -> Vec<&'a crate::model::LoreEntry> {
    let Some(npc) = pack.get_npc(npc_id) else {
        return Vec::new();
    };

    if npc.body.location_knowledge.is_empty() {
        return pack.entries.values().collect();
    }

    match npc.body.location_knowledge.get(location_id) {
        Some(uids) => uids.iter().filter_map(|uid| pack.get_entry(*uid)).collect(),
        None => Vec::new(),
    }
}
