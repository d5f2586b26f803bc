//! Plain-text renderings of profiles for terminal display.

use std::fmt::Write as _;

use super::profiles::{PolicyProfile, ProfileRegistry};

const GROUP_HEADER: &str = "group";
const DEFAULT_ROW: &str = "default";

/// Multi-line description of a profile and its rules.
pub fn format_profile(profile: &PolicyProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Profile: {}", profile.name);
    if !profile.description.is_empty() {
        let _ = writeln!(out, "  {}", profile.description);
    }
    let _ = writeln!(out, "Default action: {}", profile.default_action);

    if profile.rules.is_empty() {
        out.push_str("Rules: none\n");
        return out;
    }

    out.push_str("Rules:\n");
    let width = profile
        .rules
        .iter()
        .map(|rule| rule.group.as_str().len())
        .max()
        .unwrap_or_default();
    for rule in &profile.rules {
        let _ = writeln!(out, "  {:<width$}  {}", rule.group, rule.action);
    }
    out
}

/// Table of every known group against every profile.
///
/// Cells show the action of a rule written for exactly that group; blank
/// cells inherit from an ancestor or the default row.
pub fn profile_comparison(registry: &ProfileRegistry) -> String {
    let groups = registry.known_groups();
    let profiles: Vec<&PolicyProfile> = registry.profiles().collect();

    let group_width = groups
        .iter()
        .map(|group| group.as_str().len())
        .chain([GROUP_HEADER.len(), DEFAULT_ROW.len()])
        .max()
        .unwrap_or_default();
    let widths: Vec<usize> = profiles
        .iter()
        .map(|profile| profile.name.len().max("confirm".len()))
        .collect();

    let mut out = String::new();
    let _ = write!(out, "{GROUP_HEADER:<group_width$}");
    for (profile, width) in profiles.iter().zip(&widths) {
        let _ = write!(out, " | {:<width$}", profile.name);
    }
    push_trimmed_line(&mut out);

    let separator_len = group_width + widths.iter().map(|width| width + 3).sum::<usize>();
    out.push_str(&"-".repeat(separator_len));
    out.push('\n');

    for group in &groups {
        let _ = write!(out, "{:<group_width$}", group.as_str());
        for (profile, width) in profiles.iter().zip(&widths) {
            let cell = profile
                .explicit_action(group)
                .map_or("", |action| action.as_str());
            let _ = write!(out, " | {cell:<width$}");
        }
        push_trimmed_line(&mut out);
    }

    let _ = write!(out, "{DEFAULT_ROW:<group_width$}");
    for (profile, width) in profiles.iter().zip(&widths) {
        let _ = write!(out, " | {:<width$}", profile.default_action.as_str());
    }
    push_trimmed_line(&mut out);
    out
}

fn push_trimmed_line(out: &mut String) {
    let trimmed = out.trim_end_matches(' ').len();
    out.truncate(trimmed);
    out.push('\n');
}
