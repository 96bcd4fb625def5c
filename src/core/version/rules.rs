// ─── Platform Rules ───
// Descriptor rules decide whether a library or argument applies here.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::core::platform::Platform;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsConstraint>,
    /// Launcher features the rule is conditioned on (modern arguments only).
    #[serde(default)]
    pub features: Option<BTreeMap<String, bool>>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct OsConstraint {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
    /// OS version regex; not evaluated.
    #[serde(default)]
    pub version: Option<String>,
}

/// Launcher features a rule may ask about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
    pub custom_resolution: bool,
    pub demo_user: bool,
}

impl Features {
    fn enabled(&self, name: &str) -> bool {
        match name {
            "has_custom_resolution" => self.custom_resolution,
            "is_demo_user" => self.demo_user,
            _ => false,
        }
    }
}

impl OsConstraint {
    pub fn matches(&self, platform: &Platform) -> bool {
        let name_ok = self
            .name
            .as_deref()
            .map_or(true, |name| name == platform.rule_os_name());
        let arch_ok = self
            .arch
            .as_deref()
            .map_or(true, |arch| arch == platform.rule_arch_name());
        name_ok && arch_ok
    }
}

impl Rule {
    pub fn allow() -> Self {
        Self {
            action: RuleAction::Allow,
            os: None,
            features: None,
        }
    }

    pub fn for_os(action: RuleAction, os_name: &str) -> Self {
        Self {
            action,
            os: Some(OsConstraint {
                name: Some(os_name.to_string()),
                ..OsConstraint::default()
            }),
            features: None,
        }
    }

    /// Whether this rule's conditions hold here.
    pub fn applies(&self, platform: &Platform, features: &Features) -> bool {
        let os_ok = self.os.as_ref().map_or(true, |os| os.matches(platform));
        let features_ok = self.features.as_ref().map_or(true, |wanted| {
            wanted
                .iter()
                .all(|(name, value)| features.enabled(name) == *value)
        });
        os_ok && features_ok
    }
}

/// Evaluate a rule list: no rules means included; otherwise every rule that
/// applies overwrites the verdict in order, so the last applicable rule wins.
pub fn rules_allow(rules: &[Rule], platform: &Platform, features: &Features) -> bool {
    if rules.is_empty() {
        return true;
    }

    let mut allowed = false;
    for rule in rules {
        if rule.applies(platform, features) {
            allowed = rule.action == RuleAction::Allow;
        }
    }
    allowed
}
