//! End-to-end constraint filtering
//!
//! Loads a rule fixture from disk and runs feature requests for several users
//! through the standard filter pipeline, the way a plot or export endpoint
//! would before handing the query to the rendering engine.

use layerguard_constraints::{
    ConstraintError, ConstraintFilterEngine, FilterContext, FilterPipeline,
    InMemorySessionTokenStore, InMemoryRuleStore, LayerQueryState, RuleKind, UserContext,
};
use layerguard_core::ConstraintsConfig;
use std::io::Write;
use std::sync::Arc;

const RULES: &str = r#"
constraints:
  - id: 1
    layer: countries
    description: Geographic restriction for editors
  - id: 2
    layer: cities
  - id: 3
    layer: rivers
    active: false
rules:
  - id: 1
    constraint: 1
    kind: expression
    user: 2
    rule: "intersects_bbox( $geometry,  geom_from_wkt( 'POLYGON((8 51, 11 51, 11 52, 11 52, 8 51))') )"
  - id: 2
    constraint: 2
    kind: subset_string
    group: editors
    rule: "\"ISO2_CODE\" = 'IT'"
  - id: 3
    constraint: 2
    kind: subset_string
    user: 2
    rule: "\"POPULATION\" > 10000"
  - id: 4
    constraint: 3
    kind: subset_string
    user: 2
    rule: "basin = 'Po'"
"#;

fn load_store() -> InMemoryRuleStore {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(RULES.as_bytes()).unwrap();
    InMemoryRuleStore::load_file(file.path()).unwrap()
}

fn editor() -> UserContext {
    UserContext::new("2", "editor01").with_group("editors")
}

fn viewer() -> UserContext {
    UserContext::new("3", "viewer01").with_group("viewers")
}

#[test]
fn test_spatial_rule_restricts_only_the_constrained_user() {
    let engine = ConstraintFilterEngine::new(Arc::new(load_store()));

    let restricted = engine
        .apply_all(&editor(), "countries", &LayerQueryState::new())
        .unwrap();
    assert!(restricted
        .filter_expression
        .as_deref()
        .unwrap()
        .starts_with("intersects_bbox( $geometry"));
    assert_eq!(restricted.subset_string, None);

    let unrestricted = engine
        .apply_all(&viewer(), "countries", &LayerQueryState::new())
        .unwrap();
    assert!(unrestricted.is_unrestricted());
}

#[test]
fn test_user_and_group_rules_combine() {
    let engine = ConstraintFilterEngine::new(Arc::new(load_store()));
    let state = LayerQueryState::new().with_subset_string("\"CAPITAL\" = 1");

    let result = engine
        .apply(RuleKind::SubsetString, &editor(), "cities", &state)
        .unwrap();
    assert_eq!(
        result.subset_string.as_deref(),
        Some("(\"CAPITAL\" = 1) AND ((\"ISO2_CODE\" = 'IT') AND (\"POPULATION\" > 10000))")
    );
}

#[test]
fn test_inactive_constraint_does_not_apply() {
    let engine = ConstraintFilterEngine::new(Arc::new(load_store()));
    let state = LayerQueryState::new().with_subset_string("length > 100");

    let result = engine
        .apply(RuleKind::SubsetString, &editor(), "rivers", &state)
        .unwrap();
    assert_eq!(result, state);
}

#[test]
fn test_full_pipeline_with_session_token_and_bbox() {
    let engine = Arc::new(ConstraintFilterEngine::new(Arc::new(load_store())));

    let mut sessions = InMemorySessionTokenStore::new();
    let token = sessions.create_token("2");
    sessions
        .add_layer_filter(token, "cities", "\"NAME\" LIKE 'R%'")
        .unwrap();

    let pipeline =
        FilterPipeline::from_config(&ConstraintsConfig::default(), engine, Arc::new(sessions));

    let user = editor();
    let token = token.to_string();
    let ctx = FilterContext::new(&user, "cities")
        .with_filter_token(&token)
        .with_bbox("9.7,41.4,13.0,45.6");

    let result = pipeline.run(&ctx, LayerQueryState::new()).unwrap();
    assert_eq!(
        result.subset_string.as_deref(),
        Some("(\"ISO2_CODE\" = 'IT') AND (\"POPULATION\" > 10000)")
    );
    assert_eq!(
        result.filter_expression.as_deref(),
        Some(
            "(\"NAME\" LIKE 'R%') AND (intersects_bbox($geometry, geom_from_wkt('POLYGON((9.7 41.4, 13 41.4, 13 45.6, 9.7 45.6, 9.7 41.4))')))"
        )
    );
}

#[test]
fn test_pipeline_rejects_foreign_session_token() {
    let engine = Arc::new(ConstraintFilterEngine::new(Arc::new(load_store())));

    let mut sessions = InMemorySessionTokenStore::new();
    let token = sessions.create_token("2").to_string();

    let pipeline =
        FilterPipeline::from_config(&ConstraintsConfig::default(), engine, Arc::new(sessions));

    let user = viewer();
    let ctx = FilterContext::new(&user, "cities").with_filter_token(&token);
    let err = pipeline.run(&ctx, LayerQueryState::new()).unwrap_err();
    assert!(matches!(err, ConstraintError::UnknownSessionToken { .. }));
}

#[test]
fn test_disabled_backends_are_skipped() {
    let engine = Arc::new(ConstraintFilterEngine::new(Arc::new(load_store())));
    let config = ConstraintsConfig {
        subset_string_rules: false,
        bbox_filter: false,
        ..ConstraintsConfig::default()
    };
    let pipeline =
        FilterPipeline::from_config(&config, engine, Arc::new(InMemorySessionTokenStore::new()));

    let user = editor();
    let ctx = FilterContext::new(&user, "cities").with_bbox("not,a,bbox,at-all");
    let state = LayerQueryState::new().with_subset_string("\"CAPITAL\" = 1");

    let result = pipeline.run(&ctx, state.clone()).unwrap();
    assert_eq!(result, state);
}

#[test]
fn test_owner_rules_on_parcels() {
    let mut store = InMemoryRuleStore::new();
    store.add_constraint(layerguard_constraints::SingleLayerConstraint::new(1, "parcels"));
    store
        .add_rule(layerguard_constraints::ConstraintRule::new(
            1,
            1,
            layerguard_constraints::RuleSubject::User("42".to_string()),
            RuleKind::SubsetString,
            "owner_id = 42",
        ))
        .unwrap();
    store
        .add_rule(layerguard_constraints::ConstraintRule::new(
            2,
            1,
            layerguard_constraints::RuleSubject::User("42".to_string()),
            RuleKind::Expression,
            "NAME = 'X'",
        ))
        .unwrap();
    let engine = ConstraintFilterEngine::new(Arc::new(store));
    let owner = UserContext::new("42", "owner");

    let with_existing = LayerQueryState::new().with_subset_string("status = 'A'");
    assert_eq!(
        engine
            .apply_subset_string_filter(&owner, "parcels", &with_existing)
            .unwrap()
            .subset_string
            .as_deref(),
        Some("(status = 'A') AND (owner_id = 42)")
    );

    assert_eq!(
        engine
            .apply_subset_string_filter(&owner, "parcels", &LayerQueryState::new())
            .unwrap()
            .subset_string
            .as_deref(),
        Some("owner_id = 42")
    );

    let stranger = UserContext::new("1", "stranger");
    assert_eq!(
        engine
            .apply_subset_string_filter(&stranger, "parcels", &with_existing)
            .unwrap(),
        with_existing
    );

    let spatial = LayerQueryState::new().with_filter_expression("intersects_bbox(...)");
    assert_eq!(
        engine
            .apply_expression_filter(&owner, "parcels", &spatial)
            .unwrap()
            .filter_expression
            .as_deref(),
        Some("(intersects_bbox(...)) AND (NAME = 'X')")
    );
}
