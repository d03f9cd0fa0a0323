// src/core/env_grouping.rs

//! # Environment Grouping
//!
//! Partitions the environment list into display groups.
//!
//! - **Manual mode** (at least one group defined): groups are processed in order and the
//!   first group that matches an environment claims it. A group's glob `pattern` wins over
//!   its explicit `environments` list. Groups left empty are dropped.
//! - **Automatic mode** (no groups defined): environments are bucketed by their lowercase
//!   `prefix-` and groups appear in first-seen order.
//!
//! In both modes, anything unclaimed lands in a trailing "Other" group, which is omitted
//! when empty. Every input environment ends up in exactly one group.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet, hash_map::Entry};

use crate::constants::{OTHER_GROUP_ICON, OTHER_GROUP_ID, OTHER_GROUP_NAME};
use crate::models::{EnvGroup, Environment};

lazy_static! {
    static ref PREFIX_RE: Regex = Regex::new(r"^([a-z]+)-").unwrap();
}

/// Converts a glob with `*` and `?` into an anchored regex source. Every other character
/// is matched literally.
pub fn glob_to_regex(pattern: &str) -> String {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    let mut literal = String::new();
    for ch in pattern.chars() {
        match ch {
            '*' | '?' => {
                source.push_str(&regex::escape(&literal));
                literal.clear();
                source.push_str(if ch == '*' { ".*" } else { "." });
            }
            _ => literal.push(ch),
        }
    }
    source.push_str(&regex::escape(&literal));
    source.push('$');
    source
}

/// Compiles a glob pattern. The escaped source is always a valid regex; `None` is only
/// returned if the regex engine rejects it (e.g. size limits).
pub fn compile_pattern(pattern: &str) -> Option<Regex> {
    match Regex::new(&glob_to_regex(pattern)) {
        Ok(re) => Some(re),
        Err(e) => {
            log::warn!("Ignoring environment group pattern '{}': {}", pattern, e);
            None
        }
    }
}

pub fn matches_pattern(pattern: &str, environment: &str) -> bool {
    compile_pattern(pattern).is_some_and(|re| re.is_match(environment))
}

/// Groups `environments` for display, using `manual_groups` when any are defined.
pub fn group_environments(
    environments: &[Environment],
    manual_groups: &[EnvGroup],
) -> Vec<EnvGroup> {
    // Duplicated entries are collapsed up front so every environment is placed once.
    let mut seen = HashSet::new();
    let unique: Vec<&Environment> = environments
        .iter()
        .filter(|env| seen.insert(env.as_str()))
        .collect();

    if manual_groups.is_empty() {
        auto_groups(&unique)
    } else {
        manual_groups_with_leftovers(&unique, manual_groups)
    }
}

fn manual_groups_with_leftovers(
    environments: &[&Environment],
    groups: &[EnvGroup],
) -> Vec<EnvGroup> {
    let known: HashSet<&str> = environments.iter().map(|e| e.as_str()).collect();
    let mut claimed: HashSet<&str> = HashSet::new();
    let mut result = Vec::new();

    for group in groups {
        let members: Vec<Environment> = match &group.pattern {
            Some(pattern) => {
                let Some(re) = compile_pattern(pattern) else {
                    continue;
                };
                environments
                    .iter()
                    .filter(|env| re.is_match(env) && !claimed.contains(env.as_str()))
                    .map(|env| env.to_string())
                    .collect()
            }
            None => {
                let mut listed = HashSet::new();
                group
                    .environments
                    .iter()
                    .filter(|env| known.contains(env.as_str()))
                    .filter(|env| !claimed.contains(env.as_str()))
                    .filter(|env| listed.insert(env.as_str()))
                    .cloned()
                    .collect()
            }
        };

        if members.is_empty() {
            log::debug!("Environment group '{}' matched nothing; dropped.", group.id);
            continue;
        }

        for member in &members {
            if let Some(env) = environments.iter().find(|e| *e == &member) {
                claimed.insert(env.as_str());
            }
        }

        result.push(EnvGroup {
            environments: members,
            ..group.clone()
        });
    }

    let leftovers: Vec<Environment> = environments
        .iter()
        .filter(|env| !claimed.contains(env.as_str()))
        .map(|env| env.to_string())
        .collect();
    if !leftovers.is_empty() {
        result.push(other_group(leftovers));
    }
    result
}

fn auto_groups(environments: &[&Environment]) -> Vec<EnvGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<Environment>> = HashMap::new();
    let mut leftovers = Vec::new();

    for env in environments {
        let prefix = PREFIX_RE
            .captures(env)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        // An `other-` prefix joins the trailing group so group ids stay unique.
        match prefix {
            Some(prefix) if prefix != OTHER_GROUP_ID => match buckets.entry(prefix) {
                Entry::Occupied(mut slot) => slot.get_mut().push(env.to_string()),
                Entry::Vacant(slot) => {
                    order.push(slot.key().clone());
                    slot.insert(vec![env.to_string()]);
                }
            },
            _ => leftovers.push(env.to_string()),
        }
    }

    let mut result: Vec<EnvGroup> = order
        .into_iter()
        .filter_map(|prefix| {
            let members = buckets.remove(&prefix)?;
            Some(EnvGroup {
                name: format!("{} Environments", title_case(&prefix)),
                icon: Some(prefix_icon(&prefix).to_string()),
                id: prefix,
                pattern: None,
                environments: members,
                color: None,
            })
        })
        .collect();

    if !leftovers.is_empty() {
        result.push(other_group(leftovers));
    }
    result
}

fn other_group(environments: Vec<Environment>) -> EnvGroup {
    EnvGroup {
        id: OTHER_GROUP_ID.to_string(),
        name: OTHER_GROUP_NAME.to_string(),
        pattern: None,
        environments,
        icon: Some(OTHER_GROUP_ICON.to_string()),
        color: None,
    }
}

/// Icon for an automatically derived group.
pub fn prefix_icon(prefix: &str) -> &'static str {
    match prefix {
        "lab" => "🧪",
        "platform" => "🚀",
        "prod" | "production" => "🔥",
        "staging" => "🎭",
        "dev" | "development" => "💻",
        "test" => "🧪",
        "qa" => "✅",
        _ => OTHER_GROUP_ICON,
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envs(list: &[&str]) -> Vec<Environment> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn pattern_group(id: &str, pattern: &str) -> EnvGroup {
        EnvGroup {
            id: id.into(),
            name: id.to_uppercase(),
            pattern: Some(pattern.into()),
            environments: vec![],
            icon: None,
            color: None,
        }
    }

    fn list_group(id: &str, members: &[&str]) -> EnvGroup {
        EnvGroup {
            id: id.into(),
            name: id.to_uppercase(),
            pattern: None,
            environments: envs(members),
            icon: None,
            color: None,
        }
    }

    fn assert_covers_once(groups: &[EnvGroup], input: &[Environment]) {
        let mut all: Vec<&Environment> =
            groups.iter().flat_map(|g| g.environments.iter()).collect();
        all.sort();
        let mut expected: Vec<&Environment> = input.iter().collect();
        expected.sort();
        expected.dedup();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_glob_translation_escapes_metacharacters() {
        assert!(glob_to_regex("lab-*").starts_with("^lab"));
        assert!(glob_to_regex("lab-*").ends_with(".*$"));
        assert!(matches_pattern("lab-*", "lab-01"));
        assert!(matches_pattern("prod.?", "prod.1"));
        assert!(!matches_pattern("prod.?", "prodx1"));
        assert!(matches_pattern("a+b", "a+b"));
        assert!(!matches_pattern("a+b", "aab"));
        assert!(!matches_pattern("lab-*", "xlab-01"));
    }

    #[test]
    fn test_pattern_group_claims_first() {
        let input = envs(&["lab-01", "lab-02", "prod-1"]);
        let groups = vec![
            pattern_group("lab", "lab-*"),
            list_group("all", &["lab-01", "prod-1"]),
        ];
        let result = group_environments(&input, &groups);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "lab");
        assert_eq!(result[0].environments, envs(&["lab-01", "lab-02"]));
        assert_eq!(result[1].id, "all");
        assert_eq!(result[1].environments, envs(&["prod-1"]));
        assert_covers_once(&result, &input);
    }

    #[test]
    fn test_manual_leftovers_and_empty_groups() {
        let input = envs(&["lab-01", "prod", "sandbox"]);
        let groups = vec![
            pattern_group("lab", "lab-*"),
            pattern_group("qa", "qa-*"),
            list_group("ghost", &["does-not-exist"]),
        ];
        let result = group_environments(&input, &groups);

        let ids: Vec<&str> = result.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["lab", OTHER_GROUP_ID]);
        assert_eq!(result[1].environments, envs(&["prod", "sandbox"]));
        assert_eq!(result[1].icon.as_deref(), Some(OTHER_GROUP_ICON));
        assert_covers_once(&result, &input);
    }

    #[test]
    fn test_manual_without_leftovers_has_no_other_group() {
        let input = envs(&["lab-01"]);
        let result = group_environments(&input, &[pattern_group("lab", "*")]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "lab");
    }

    #[test]
    fn test_pattern_takes_precedence_over_list() {
        let input = envs(&["lab-01", "prod"]);
        let mut group = pattern_group("lab", "lab-*");
        group.environments = envs(&["prod"]);
        let result = group_environments(&input, &[group]);
        assert_eq!(result[0].environments, envs(&["lab-01"]));
        assert_eq!(result[1].environments, envs(&["prod"]));
    }

    #[test]
    fn test_auto_mode_by_prefix() {
        let input = envs(&["prod-eu", "lab-01", "prod-us", "localhost", "qa-1", "lab-02"]);
        let result = group_environments(&input, &[]);

        let ids: Vec<&str> = result.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["prod", "lab", "qa", OTHER_GROUP_ID]);
        assert_eq!(result[0].name, "Prod Environments");
        assert_eq!(result[0].icon.as_deref(), Some("🔥"));
        assert_eq!(result[0].environments, envs(&["prod-eu", "prod-us"]));
        assert_eq!(result[2].icon.as_deref(), Some("✅"));
        assert_eq!(result[3].environments, envs(&["localhost"]));
        assert_covers_once(&result, &input);
    }

    #[test]
    fn test_auto_mode_other_prefix_joins_trailing_group() {
        let input = envs(&["other-1", "dev-1", "localhost"]);
        let result = group_environments(&input, &[]);

        let ids: Vec<&str> = result.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["dev", OTHER_GROUP_ID]);
        assert_eq!(result[1].environments, envs(&["other-1", "localhost"]));
        assert_covers_once(&result, &input);
    }

    #[test]
    fn test_auto_mode_ignores_uppercase_prefixes() {
        let input = envs(&["PROD-1", "dev-1"]);
        let result = group_environments(&input, &[]);
        assert_eq!(result[0].id, "dev");
        assert_eq!(result[0].icon.as_deref(), Some("💻"));
        assert_eq!(result[1].environments, envs(&["PROD-1"]));
    }

    #[test]
    fn test_duplicates_are_collapsed() {
        let input = envs(&["lab-01", "lab-01", "prod"]);
        let auto = group_environments(&input, &[]);
        assert_covers_once(&auto, &input);
        let manual = group_environments(&input, &[list_group("x", &["lab-01", "lab-01"])]);
        assert_eq!(manual[0].environments, envs(&["lab-01"]));
        assert_covers_once(&manual, &input);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_environments(&[], &[]).is_empty());
        assert!(group_environments(&[], &[pattern_group("lab", "*")]).is_empty());
    }
}
