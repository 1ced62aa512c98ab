//! Text rendering utilities for human-friendly output.
//!
//! Used by error messages (cycle chains, suggestions) and by the
//! wiring plan summary (conditional chains, aggregate member lists).

/// Renders a dependency chain as a readable string.
///
/// # Examples
/// ```
/// use tarkib_support::rendering::render_chain;
///
/// let chain = vec!["IReport", "IRenderer", "IReport"];
/// assert_eq!(render_chain(&chain), "IReport → IRenderer → IReport");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Renders a flag-conditioned selection as a right-associative ternary.
///
/// Each branch is `(flag, chosen implementation)`; `None` renders as
/// `absent`, the terminal a conditional chain reaches when nothing
/// unconditional backs it.
///
/// ```
/// use tarkib_support::rendering::render_conditional;
///
/// let branches = vec![("Fast", Some("FastCodec")), ("Legacy", None)];
/// assert_eq!(
///     render_conditional(&branches, Some("DefaultCodec")),
///     "Fast ? FastCodec : Legacy ? absent : DefaultCodec",
/// );
/// ```
pub fn render_conditional(branches: &[(&str, Option<&str>)], fallback: Option<&str>) -> String {
    let mut result = String::new();
    for (flag, chosen) in branches {
        result.push_str(flag);
        result.push_str(" ? ");
        result.push_str(chosen.unwrap_or("absent"));
        result.push_str(" : ");
    }
    result.push_str(fallback.unwrap_or("absent"));
    result
}

/// Renders aggregate members, guarded ones as `name if flag`.
///
/// ```
/// use tarkib_support::rendering::render_members;
///
/// let members = vec![("Csv", None), ("Json", Some("JsonEnabled"))];
/// assert_eq!(render_members(&members), "[Csv, Json if JsonEnabled]");
/// ```
pub fn render_members(members: &[(&str, Option<&str>)]) -> String {
    let rendered: Vec<String> = members
        .iter()
        .map(|(name, guard)| match guard {
            Some(flag) => format!("{name} if {flag}"),
            None => (*name).to_string(),
        })
        .collect();
    format!("[{}]", rendered.join(", "))
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use tarkib_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::services::user::UserService");
/// assert_eq!(short, "UserService");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>");
/// assert_eq!(short, "Arc<dyn Logger>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    // keep only the last path segment of every component:
    // "Arc<dyn my_app::Logger>" → "Arc<dyn Logger>"
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut current_segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                current_segment.clear();
            }
            '<' | '>' | ',' | ' ' | '[' | ']' => {
                result.push_str(&current_segment);
                result.push(ch);
                current_segment.clear();
            }
            _ => current_segment.push(ch),
        }
    }

    result.push_str(&current_segment);
    result
}

/// Generates "did you mean?" suggestions based on registered types.
///
/// Compares the requested type name against available names and
/// returns up to `max_suggestions` close matches, best first.
pub fn suggest_similar(requested: &str, available: &[&str], max_suggestions: usize) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    let requested_short = shorten_type_name(requested).to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter_map(|&name| {
            if name == requested {
                return None;
            }
            let name_lower = name.to_lowercase();
            let name_short = shorten_type_name(name).to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 100));
            }

            if name_short.contains(&requested_short) || requested_short.contains(&name_short) {
                return Some((name, 80));
            }

            let common = name_short
                .chars()
                .zip(requested_short.chars())
                .take_while(|(a, b)| a == b)
                .count();

            if common >= 3 {
                return Some((name, common * 10));
            }

            None
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}
