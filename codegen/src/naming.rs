//! Identifier derivation from schema names.

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while",
];

fn sanitize(name: String) -> String {
    let mut out: String = name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect();

    if out.chars().next().map_or(true, |ch| ch.is_ascii_digit()) {
        out.insert(0, '_');
    }

    if KEYWORDS.contains(&out.as_str()) {
        out.push('_');
    }

    out
}

/// `campaignStatus` / `CAMPAIGN_STATUS` / `campaign-status` to
/// `CampaignStatus`.
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    let mut prev_upper = false;

    for ch in name.chars() {
        if !ch.is_ascii_alphanumeric() {
            upper_next = true;
            prev_upper = false;
            continue;
        }

        if upper_next {
            out.extend(ch.to_uppercase());
        } else if ch.is_ascii_uppercase() && prev_upper {
            // Runs of capitals (SHOUTING enum values) lowercase after the
            // first letter.
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }

        prev_upper = ch.is_ascii_uppercase();
        upper_next = false;
    }

    sanitize(out)
}

/// `enhancedCpcEnabled` / `CampaignService` to `enhanced_cpc_enabled` /
/// `campaign_service`.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;

    for ch in name.chars() {
        if !ch.is_ascii_alphanumeric() {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev_lower = false;
            continue;
        }

        if ch.is_ascii_uppercase() {
            if prev_lower && !out.is_empty() {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        }
    }

    sanitize(out)
}
