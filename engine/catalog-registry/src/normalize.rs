/// Sports treated as popular when first created
pub const POPULAR_SPORTS: &[&str] = &[
    "soccer",
    "football",
    "basketball",
    "american football",
    "baseball",
    "ice hockey",
    "tennis",
    "cricket",
    "golf",
    "motorsport",
    "rugby",
    "fighting",
];

/// Comparison key for fuzzy name matching
///
/// Lowercases, drops everything outside `[a-z0-9 -]`, collapses whitespace
/// and trims. Any whitespace character counts as a separator.
pub fn normalize_name(name: &str) -> String {
    let filtered: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | ' ' | '-'))
        .collect();

    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Index key for merge and lookup: [`normalize_name`], or for names with
/// nothing in `[a-z0-9]` (e.g. Cyrillic or CJK) the lowercased name with
/// whitespace collapsed
pub fn name_key(name: &str) -> String {
    let normalized = normalize_name(name);
    if !normalized.is_empty() {
        return normalized;
    }
    name.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// URL slug: lowercase alphanumerics joined by single dashes
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

/// Whether an already-normalized sport name is in the popular set
pub fn is_popular_sport(normalized: &str) -> bool {
    POPULAR_SPORTS.contains(&normalized)
}

/// Whether the sport is association football under either common name
pub fn is_soccer(name: &str) -> bool {
    let normalized = normalize_name(name);
    normalized == "soccer" || normalized == "football" || normalized.contains("soccer")
}
