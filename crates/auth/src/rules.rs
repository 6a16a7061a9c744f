//! The authorization gate over a command's rule strings.
//!
//! Rules are opaque beyond two forms: `allow` / `true` always pass, and any
//! other rule passes when the user holds every `bundle:permission` it names
//! (after `must have`, when present). A rule naming no permission denies,
//! and so does a command without rules.

use std::{collections::BTreeSet, sync::LazyLock};

use {regex::Regex, switchyard_store::RolePermission};

static QUALIFIED_PERMISSION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"([A-Za-z0-9_.\-]+):([A-Za-z0-9_.\-*]+)").ok());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Human-readable reason for the refusal.
    Deny(String),
}

/// `allow` and `true`, case-insensitively.
#[must_use]
pub fn is_unconditional(rule: &str) -> bool {
    let rule = rule.trim();
    rule.eq_ignore_ascii_case("allow") || rule.eq_ignore_ascii_case("true")
}

/// Qualified permissions a rule requires.
#[must_use]
pub fn required_permissions(rule: &str) -> Vec<RolePermission> {
    let Some(re) = QUALIFIED_PERMISSION.as_ref() else {
        return Vec::new();
    };
    let lower = rule.to_ascii_lowercase();
    let requirement = match lower.rfind("must have") {
        Some(at) => &rule[at + "must have".len()..],
        None => rule,
    };
    re.captures_iter(requirement)
        .map(|caps| RolePermission::new(&caps[1], &caps[2]))
        .collect()
}

/// Every rule must pass.
#[must_use]
pub fn evaluate_rules(rules: &[String], granted: &BTreeSet<RolePermission>) -> Decision {
    if rules.is_empty() {
        return Decision::Deny("the command has no rules".into());
    }
    for rule in rules {
        if is_unconditional(rule) {
            continue;
        }
        let required = required_permissions(rule);
        if required.is_empty() {
            return Decision::Deny(format!("rule {rule:?} names no permission"));
        }
        if let Some(missing) = required.iter().find(|p| !granted.contains(*p)) {
            return Decision::Deny(format!("missing permission {missing}"));
        }
    }
    Decision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;

    fn granted(perms: &[&str]) -> BTreeSet<RolePermission> {
        perms.iter().filter_map(|p| RolePermission::parse(p)).collect()
    }

    fn rules(rules: &[&str]) -> Vec<String> {
        rules.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn unconditional_rules() {
        let none = granted(&[]);
        assert_eq!(evaluate_rules(&rules(&["allow"]), &none), Decision::Allow);
        assert_eq!(evaluate_rules(&rules(&["TRUE", " Allow "]), &none), Decision::Allow);
    }

    #[test]
    fn no_rules_denies() {
        assert!(matches!(
            evaluate_rules(&[], &granted(&["deploy:prod"])),
            Decision::Deny(_)
        ));
    }

    #[test]
    fn permission_rules() {
        let held = granted(&["deploy:prod", "site:admin"]);
        let rule = "when command is deploy:ship must have deploy:prod";
        assert_eq!(required_permissions(rule), vec![RolePermission::new("deploy", "prod")]);
        assert_eq!(evaluate_rules(&rules(&[rule]), &held), Decision::Allow);
        assert_eq!(
            evaluate_rules(&rules(&["must have deploy:prod and site:admin"]), &held),
            Decision::Allow
        );
        assert_eq!(
            evaluate_rules(&rules(&["must have deploy:staging"]), &held),
            Decision::Deny("missing permission deploy:staging".into())
        );
    }

    #[test]
    fn every_rule_must_pass() {
        let held = granted(&["deploy:prod"]);
        assert!(matches!(
            evaluate_rules(&rules(&["allow", "must have site:admin"]), &held),
            Decision::Deny(_)
        ));
    }

    #[test]
    fn rule_without_permission_denies() {
        assert!(matches!(
            evaluate_rules(&rules(&["must be nice"]), &granted(&["deploy:prod"])),
            Decision::Deny(_)
        ));
    }
}
