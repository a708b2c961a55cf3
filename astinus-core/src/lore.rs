//! Lore Retriever: hybrid keyword + vector search over a world pack's lore.

use crate::i18n::{Lang, LocalizedString};
use crate::model::{LoreEntry, LoreVisibility};
use crate::vector_store::VectorStore;
use crate::world_pack::WorldPack;
use std::collections::HashMap;

/// Scoring weights, mirroring [`crate::config::Config`]'s lore-retrieval
/// fields so callers can pass either.
#[derive(Debug, Clone, Copy)]
pub struct LoreWeights {
    pub kw_primary_weight: f32,
    pub kw_secondary_weight: f32,
    pub vector_weight: f32,
    pub dual_match_boost: f32,
    pub lore_top_k: usize,
}

impl Default for LoreWeights {
    fn default() -> Self {
        Self {
            kw_primary_weight: 2.0,
            kw_secondary_weight: 1.0,
            vector_weight: 0.8,
            dual_match_boost: 1.5,
            lore_top_k: 5,
        }
    }
}

/// Score forced onto constant entries, unconditionally above any
/// non-constant, non-dual-matched candidate.
const CONSTANT_SCORE: f32 = 2.0;

const VECTOR_SEARCH_K: usize = 10;
const MAX_QUERY_TERMS: usize = 5;

const STOPWORDS_EN: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "of", "to", "in", "on", "at", "and", "or", "it",
    "this", "that", "with", "for", "as", "be",
];
const STOPWORDS_CN: &[&str] = &["的", "了", "是", "在", "我", "你", "他", "她", "它", "和", "吗", "呢"];

/// Tokenize a query: split on whitespace/punctuation for Latin scripts,
/// per-character for CJK text, drop stop-words and length-1 tokens, dedupe,
/// cap at [`MAX_QUERY_TERMS`].
pub fn tokenize(query: &str, lang: Lang) -> Vec<String> {
    let raw: Vec<String> = match lang {
        Lang::Cn => query.chars().filter(|c| !c.is_whitespace()).map(|c| c.to_string()).collect(),
        Lang::En => query
            .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase())
            .collect(),
    };

    let stopwords: &[&str] = match lang {
        Lang::Cn => STOPWORDS_CN,
        Lang::En => STOPWORDS_EN,
    };

    let mut seen = std::collections::HashSet::new();
    let mut terms = Vec::new();
    for token in raw {
        if token.chars().count() <= 1 {
            continue;
        }
        if stopwords.contains(&token.as_str()) {
            continue;
        }
        if seen.insert(token.clone()) {
            terms.push(token);
        }
        if terms.len() >= MAX_QUERY_TERMS {
            break;
        }
    }
    terms
}

fn bidirectional_match(term: &str, key: &str) -> bool {
    let term = term.to_lowercase();
    let key = key.to_lowercase();
    term.contains(&key) || key.contains(&term)
}

/// Compute keyword + vector candidate scores for a (non-empty) query.
/// Vector-store failures are swallowed: keyword-only scoring still applies.
async fn score_candidates(
    pack: &WorldPack,
    query: &str,
    lang: Lang,
    vector_store: Option<&(dyn VectorStore)>,
    query_embedding: Option<&[f32]>,
    weights: LoreWeights,
) -> HashMap<i64, f32> {
    let mut scores: HashMap<i64, f32> = HashMap::new();
    let terms = tokenize(query, lang);

    for entry in pack.entries.values() {
        for term in &terms {
            if entry.primary_keys.iter().any(|k| bidirectional_match(term, k)) {
                *scores.entry(entry.uid).or_insert(0.0) += weights.kw_primary_weight;
                break;
            }
        }
    }
    for entry in pack.entries.values() {
        if scores.contains_key(&entry.uid) {
            continue;
        }
        for term in &terms {
            if entry.secondary_keys.iter().any(|k| bidirectional_match(term, k)) {
                *scores.entry(entry.uid).or_insert(0.0) += weights.kw_secondary_weight;
                break;
            }
        }
    }

    if let (Some(store), Some(embedding)) = (vector_store, query_embedding) {
        let collection = match lang {
            Lang::Cn => "lore_cn",
            Lang::En => "lore_en",
        };
        if let Ok(hits) = store.query(collection, embedding, VECTOR_SEARCH_K).await {
            for hit in hits {
                if let Ok(uid) = hit.record.id.parse::<i64>() {
                    let vector_score = weights.vector_weight * hit.score;
                    scores
                        .entry(uid)
                        .and_modify(|s| *s *= weights.dual_match_boost)
                        .or_insert(vector_score);
                }
            }
        }
    }

    for entry in pack.constant_entries() {
        scores.insert(entry.uid, CONSTANT_SCORE);
    }

    scores
}

fn passes_filters(entry: &LoreEntry, current_location: Option<&str>, current_region: Option<&str>) -> bool {
    if entry.visibility == LoreVisibility::Detailed && !entry.constant {
        return false;
    }
    if entry.has_location_restriction() {
        if !current_location.is_some_and(|loc| entry.applicable_locations.iter().any(|l| l == loc)) {
            return false;
        }
    }
    if entry.has_region_restriction()
        && !current_region.is_some_and(|reg| entry.applicable_regions.iter().any(|r| r == reg))
    {
        return false;
    }
    true
}

/// The internal ranked-entries operation used by the Coordinator.
pub async fn search_entries<'a>(
    pack: &'a WorldPack,
    query: &str,
    current_location: Option<&str>,
    current_region: Option<&str>,
    lang: Lang,
    vector_store: Option<&(dyn VectorStore)>,
    query_embedding: Option<&[f32]>,
    weights: LoreWeights,
) -> Vec<&'a LoreEntry> {
    let scores = if query.trim().is_empty() {
        pack.constant_entries()
            .into_iter()
            .map(|e| (e.uid, CONSTANT_SCORE))
            .collect::<HashMap<_, _>>()
    } else {
        score_candidates(pack, query, lang, vector_store, query_embedding, weights).await
    };

    let mut candidates: Vec<&LoreEntry> = scores
        .keys()
        .filter_map(|uid| pack.get_entry(*uid))
        .filter(|entry| passes_filters(entry, current_location, current_region))
        .collect();

    candidates.sort_by(|a, b| {
        let score_a = scores[&a.uid];
        let score_b = scores[&b.uid];
        score_b
            .partial_cmp(&score_a)
            .unwrap()
            .then_with(|| a.order.cmp(&b.order))
    });
    candidates.truncate(weights.lore_top_k);
    candidates
}

/// Format ranked entries as the header + bracketed-keys body the Coordinator
/// injects into its prompt.
pub fn format_lore(entries: &[&LoreEntry], query: &str, lang: Lang) -> String {
    if query.trim().is_empty() {
        let header = LocalizedString::new("没有提供查询内容：", "No query provided:").get(lang).to_string();
        return format_entries(&header, entries, lang);
    }
    let template = LocalizedString::new(
        format!("与「{query}」相关的背景信息："),
        format!("Background information related to '{query}':"),
    );
    format_entries(template.get(lang), entries, lang)
}

fn format_entries(header: &str, entries: &[&LoreEntry], lang: Lang) -> String {
    let mut out = String::from(header);
    for entry in entries {
        out.push('\n');
        out.push_str(&format!("[{}] {}", entry.primary_keys.join(", "), entry.content.get(lang)));
    }
    out
}

/// The public operation: search then format in one call.
#[allow(clippy::too_many_arguments)]
pub async fn search(
    pack: &WorldPack,
    query: &str,
    current_location: Option<&str>,
    current_region: Option<&str>,
    lang: Lang,
    vector_store: Option<&(dyn VectorStore)>,
    query_embedding: Option<&[f32]>,
    weights: LoreWeights,
) -> String {
    let entries = search_entries(
        pack,
        query,
        current_location,
        current_region,
        lang,
        vector_store,
        query_embedding,
        weights,
    )
    .await;
    format_lore(&entries, query, lang)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::LocalizedString;
    use crate::world_pack::WorldPackInfo;
    use std::collections::HashMap as Map;

    fn entry(uid: i64, primary: &[&str], constant: bool, order: i32) -> LoreEntry {
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

    fn pack_with(entries: Vec<LoreEntry>) -> WorldPack {
        let mut map = Map::new();
        for e in entries {
            map.insert(e.uid, e);
        }
        WorldPack {
            info: WorldPackInfo {
                id: "test-pack".into(),
                name: LocalizedString::new("世界", "World"),
                description: LocalizedString::default(),
                starting_location_id: "start".into(),
                version: "1.0.0".into(),
                author: "Unknown".into(),
                setting: None,
                player_hook: None,
            },
            entries: map,
            npcs: Map::new(),
            locations: Map::new(),
            preset_characters: vec![],
            regions: Map::new(),
        }
    }

    #[test]
    fn tokenize_drops_stopwords_and_short_tokens() {
        let terms = tokenize("the a castle is old", Lang::En);
        assert_eq!(terms, vec!["castle".to_string(), "old".to_string()]);
    }

    #[test]
    fn tokenize_caps_at_five_terms() {
        let terms = tokenize("alpha beta gamma delta epsilon zeta eta", Lang::En);
        assert_eq!(terms.len(), 5);
    }

    #[test]
    fn tokenize_cn_splits_per_character() {
        let terms = tokenize("古老城堡", Lang::Cn);
        assert!(terms.contains(&"古".to_string()));
    }

    #[tokio::test]
    async fn empty_query_returns_only_constant_entries() {
        let pack = pack_with(vec![entry(1, &["castle"], true, 100), entry(2, &["forest"], false, 50)]);
        let results = search_entries(&pack, "", None, None, Lang::En, None, None, LoreWeights::default()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].uid, 1);
    }

    #[tokio::test]
    async fn keyword_match_surfaces_entry() {
        let pack = pack_with(vec![entry(1, &["ancient castle"], false, 100)]);
        let results = search_entries(&pack, "castle", None, None, Lang::En, None, None, LoreWeights::default()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].uid, 1);
    }

    #[tokio::test]
    async fn detailed_entries_are_filtered_unless_constant() {
        let mut hidden = entry(1, &["secret"], false, 100);
        hidden.visibility = LoreVisibility::Detailed;
        let pack = pack_with(vec![hidden]);
        let results = search_entries(&pack, "secret", None, None, Lang::En, None, None, LoreWeights::default()).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn location_restriction_filters_out_non_matching_location() {
        let mut restricted = entry(1, &["gate"], false, 100);
        restricted.applicable_locations = vec!["courtyard".to_string()];
        let pack = pack_with(vec![restricted]);

        let results = search_entries(&pack, "gate", Some("dungeon"), None, Lang::En, None, None, LoreWeights::default()).await;
        assert!(results.is_empty());

        let results = search_entries(&pack, "gate", Some("courtyard"), None, Lang::En, None, None, LoreWeights::default()).await;
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn results_sorted_by_score_then_order() {
        let pack = pack_with(vec![entry(1, &["castle"], true, 200), entry(2, &["castle gate"], false, 50)]);
        let results = search_entries(&pack, "castle", None, None, Lang::En, None, None, LoreWeights::default()).await;
        assert_eq!(results[0].uid, 1);
    }

    /// Never more than `lore_top_k` results, whatever the match count.
    #[tokio::test]
    async fn results_never_exceed_lore_top_k() {
        let entries: Vec<LoreEntry> = (0..20).map(|i| entry(i, &["castle"], false, i as i32)).collect();
        let pack = pack_with(entries);
        let weights = LoreWeights { lore_top_k: 3, ..LoreWeights::default() };
        let results = search_entries(&pack, "castle", None, None, Lang::En, None, None, weights).await;
        assert_eq!(results.len(), 3);
    }

    /// A constant entry clears the visibility filter (detailed, non-constant
    /// entries are dropped) regardless of whether the query matches it.
    #[tokio::test]
    async fn constant_entry_survives_even_with_no_keyword_match() {
        let mut always = entry(1, &["unrelated"], true, 0);
        always.visibility = LoreVisibility::Detailed;
        let pack = pack_with(vec![always]);
        let weights = LoreWeights { lore_top_k: 1, ..LoreWeights::default() };
        let results = search_entries(&pack, "castle", None, None, Lang::En, None, None, weights).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].uid, 1);
    }

    #[test]
    fn format_lore_includes_header_and_bracketed_keys() {
        let e = entry(1, &["castle", "keep"], false, 100);
        let refs = vec![&e];
        let text = format_lore(&refs, "castle", Lang::En);
        assert!(text.starts_with("Background information related to 'castle':"));
        assert!(text.contains("[castle, keep]"));
    }

    #[test]
    fn format_lore_empty_query_uses_no_query_header() {
        let text = format_lore(&[], "", Lang::En);
        assert_eq!(text, "No query provided:");
    }
}
