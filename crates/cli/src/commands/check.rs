use super::load_rules;
use layerguard_constraints::RuleKind;
use layerguard_core::LayerguardConfig;
use std::fmt::Write;

/// Load the rule fixture and describe it per layer
pub fn run(config: &LayerguardConfig) -> anyhow::Result<String> {
    let store = load_rules(config)?;
    let mut out = String::new();

    writeln!(
        out,
        "{} constraints, {} rules",
        store.constraint_count(),
        store.rule_count()
    )?;

    for layer in store.layers() {
        writeln!(out, "{}", layer)?;
        for constraint in store.constraints_for_layer(layer) {
            let rules = store.rules_for_constraint(constraint.id);
            let count = |kind: RuleKind| rules.iter().filter(|r| r.kind == kind).count();
            let blank = rules.iter().filter(|r| r.is_blank()).count();

            write!(
                out,
                "  constraint {} [{}]: {} subset string, {} expression",
                constraint.id,
                if constraint.active { "active" } else { "inactive" },
                count(RuleKind::SubsetString),
                count(RuleKind::Expression),
            )?;
            if blank > 0 {
                write!(out, " ({} blank, ignored)", blank)?;
            }
            if let Some(description) = &constraint.description {
                write!(out, " - {}", description)?;
            }
            writeln!(out)?;
        }
    }

    tracing::info!(
        constraints = store.constraint_count(),
        rules = store.rule_count(),
        "Rule fixture is valid"
    );
    Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_check_summary() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "constraints": [
                    {{"id": 1, "layer": "countries", "description": "editors only"}},
                    {{"id": 2, "layer": "countries", "active": false}},
                    {{"id": 3, "layer": "cities"}}
                ],
                "rules": [
                    {{"id": 1, "constraint": 1, "kind": "expression", "user": 2, "rule": "a = 1"}},
                    {{"id": 2, "constraint": 1, "kind": "subset_string", "group": "g", "rule": ""}},
                    {{"id": 3, "constraint": 3, "kind": "subset_string", "user": 2, "rule": "b = 2"}}
                ]
            }}"#
        )
        .unwrap();

        let config = LayerguardConfig::testing().with_rules_file(file.path());
        let output = run(&config).unwrap();

        assert_eq!(
            output,
            "3 constraints, 3 rules\n\
             cities\n  constraint 3 [active]: 1 subset string, 0 expression\n\
             countries\n  constraint 1 [active]: 1 subset string, 1 expression (1 blank, ignored) - editors only\n  \
             constraint 2 [inactive]: 0 subset string, 0 expression"
        );
    }

    #[test]
    fn test_check_reports_malformed_fixture() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "constraints: [{{id: 1, layer: a}}]\nrules: [{{id: 9, constraint: 2, kind: expression, user: 1, rule: x}}]"
        )
        .unwrap();

        let config = LayerguardConfig::testing().with_rules_file(file.path());
        let err = run(&config).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("failed to load rules"));
        assert!(message.contains("Unknown constraint: 2"));
    }
}
