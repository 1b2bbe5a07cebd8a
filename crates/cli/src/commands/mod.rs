pub mod check;
pub mod resolve;

use anyhow::Context;
use layerguard_constraints::InMemoryRuleStore;
use layerguard_core::LayerguardConfig;

/// Load the rule fixture named by the configuration
pub fn load_rules(config: &LayerguardConfig) -> anyhow::Result<InMemoryRuleStore> {
    let path = config
        .constraints
        .rules_file
        .as_ref()
        .context("no rules file given: pass --rules or set LAYERGUARD_RULES_FILE")?;

    InMemoryRuleStore::load_file(path)
        .with_context(|| format!("failed to load rules from {}", path.display()))
}
