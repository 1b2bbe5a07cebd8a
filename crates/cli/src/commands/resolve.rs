use super::load_rules;
use layerguard_constraints::{
    ConstraintFilterEngine, FilterContext, FilterPipeline, InMemorySessionTokenStore,
    LayerQueryState, UserContext,
};
use layerguard_core::LayerguardConfig;
use std::sync::Arc;

/// Inputs of `layerguard resolve`
#[derive(Debug, Clone, Default)]
pub struct ResolveArgs {
    pub user: Option<String>,
    pub groups: Vec<String>,
    pub layer: String,
    pub subset: Option<String>,
    pub expression: Option<String>,
    pub bbox: Option<String>,
    pub json: bool,
}

impl ResolveArgs {
    fn user_context(&self) -> UserContext {
        let base = match &self.user {
            Some(id) => UserContext::new(id.clone(), id.clone()),
            None => UserContext::anonymous(),
        };
        self.groups
            .iter()
            .fold(base, |user, group| user.with_group(group.clone()))
    }

    fn initial_state(&self) -> LayerQueryState {
        LayerQueryState {
            subset_string: self.subset.clone(),
            filter_expression: self.expression.clone(),
        }
    }
}

/// Run the standard filter pipeline for one user and layer.
///
/// Session tokens live in the web tier, so the CLI runs with an empty token store.
pub fn run(config: &LayerguardConfig, args: &ResolveArgs) -> anyhow::Result<String> {
    let store = load_rules(config)?;
    let engine = Arc::new(ConstraintFilterEngine::new(Arc::new(store)).with_config(&config.constraints));
    let pipeline = FilterPipeline::from_config(
        &config.constraints,
        engine,
        Arc::new(InMemorySessionTokenStore::new()),
    );

    let user = args.user_context();
    let mut ctx = FilterContext::new(&user, &args.layer);
    if let Some(bbox) = args.bbox.as_deref() {
        ctx = ctx.with_bbox(bbox);
    }

    let state = pipeline.run(&ctx, args.initial_state())?;
    tracing::info!(layer = %args.layer, user = %user.username, "Resolved layer restriction");

    if args.json {
        return Ok(serde_json::to_string_pretty(&state)?);
    }

    Ok(format!(
        "layer:             {}\nsubset string:     {}\nfilter expression: {}",
        args.layer,
        state.subset_string.as_deref().unwrap_or("<none>"),
        state.filter_expression.as_deref().unwrap_or("<none>"),
    ))
}
