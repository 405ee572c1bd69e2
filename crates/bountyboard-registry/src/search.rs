use crate::agent::RegistryAgent;

/// List agents with optional category and online filters, truncated to
/// `limit`.
pub fn list_agents<'a>(
    agents: &'a [RegistryAgent],
    category: Option<&str>,
    online_only: bool,
    limit: usize,
) -> Vec<&'a RegistryAgent> {
    let category = category.map(str::to_lowercase);
    agents
        .iter()
        .filter(|a| {
            category
                .as_deref()
                .is_none_or(|c| a.category.to_lowercase() == c)
        })
        .filter(|a| !online_only || a.online)
        .take(limit)
        .collect()
}

/// Case-insensitive substring search over agent name, category, and
/// capability tags. Each whitespace-separated token matches on its own
/// and scores add up, so a multi-word query like "logo design" surfaces
/// agents that hit any of its words. Name hits rank above category/tag
/// hits, then online agents before offline, then name ascending.
pub fn search_agents<'a>(
    agents: &'a [RegistryAgent],
    query: &str,
    limit: usize,
) -> Vec<&'a RegistryAgent> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let mut tokens: Vec<&str> = needle.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.dedup();

    let mut hits: Vec<(u32, &RegistryAgent)> = agents
        .iter()
        .filter_map(|agent| {
            let score: u32 = tokens
                .iter()
                .map(|token| {
                    if agent.name_matches(token) {
                        2
                    } else if agent.tag_matches(token) {
                        1
                    } else {
                        0
                    }
                })
                .sum();
            (score > 0).then_some((score, agent))
        })
        .collect();

    hits.sort_by(|(score_a, a), (score_b, b)| {
        score_b
            .cmp(score_a)
            .then(b.online.cmp(&a.online))
            .then(a.name.cmp(&b.name))
    });
    hits.into_iter().take(limit).map(|(_, a)| a).collect()
}
