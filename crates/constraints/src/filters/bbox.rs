//! `in_bbox` filter backend

use super::{FilterBackend, FilterContext};
use crate::state::LayerQueryState;
use crate::types::RuleKind;
use crate::{ConstraintError, ConstraintResult};
use std::fmt;
use std::str::FromStr;

/// Axis aligned bounding box in layer coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl Bbox {
    /// Closed WKT polygon ring for the box
    pub fn to_wkt(&self) -> String {
        format!(
            "POLYGON(({minx} {miny}, {maxx} {miny}, {maxx} {maxy}, {minx} {maxy}, {minx} {miny}))",
            minx = self.minx,
            miny = self.miny,
            maxx = self.maxx,
            maxy = self.maxy,
        )
    }

    /// Spatial filter expression selecting features intersecting the box
    pub fn to_expression(&self) -> String {
        format!(
            "intersects_bbox($geometry, geom_from_wkt('{}'))",
            self.to_wkt()
        )
    }
}

impl FromStr for Bbox {
    type Err = ConstraintError;

    /// Parse `minx,miny,maxx,maxy`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        ConstraintError::invalid_bbox(s, format!("'{}' is not a finite number", part.trim()))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let &[minx, miny, maxx, maxy] = values.as_slice() else {
            return Err(ConstraintError::invalid_bbox(
                s,
                format!("expected 4 comma separated values, got {}", values.len()),
            ));
        };

        if minx > maxx || miny > maxy {
            return Err(ConstraintError::invalid_bbox(s, "min corner exceeds max corner"));
        }

        Ok(Self {
            minx,
            miny,
            maxx,
            maxy,
        })
    }
}

impl fmt::Display for Bbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.minx, self.miny, self.maxx, self.maxy)
    }
}

/// Restricts the feature request to the `in_bbox` request parameter
#[derive(Debug, Clone, Copy, Default)]
pub struct BboxFilter;

impl FilterBackend for BboxFilter {
    fn apply_filter(
        &self,
        ctx: &FilterContext<'_>,
        state: LayerQueryState,
    ) -> ConstraintResult<LayerQueryState> {
        match ctx.in_bbox {
            Some(raw) => {
                let bbox: Bbox = raw.parse()?;
                Ok(state.restricted(RuleKind::Expression, &bbox.to_expression()))
            }
            None => Ok(state),
        }
    }

    fn name(&self) -> &'static str {
        "BboxFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserContext;

    #[test]
    fn test_parse_bbox() {
        let bbox: Bbox = "9.7,41.4,13.0,45.6".parse().unwrap();
        assert_eq!(
            bbox,
            Bbox {
                minx: 9.7,
                miny: 41.4,
                maxx: 13.0,
                maxy: 45.6
            }
        );
        assert_eq!(bbox.to_string(), "9.7,41.4,13,45.6");

        let spaced: Bbox = " 8 , 51 , 11 , 52 ".parse().unwrap();
        assert_eq!(spaced.minx, 8.0);
    }

    #[test]
    fn test_invalid_bbox() {
        for raw in ["", "1,2,3", "1,2,3,4,5", "a,2,3,4", "3,2,1,4", "1,4,3,2", "NaN,1,2,3", "inf,1,2,3"] {
            assert!(
                matches!(raw.parse::<Bbox>(), Err(ConstraintError::InvalidBbox { .. })),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_expression() {
        let bbox: Bbox = "8,51,11,52".parse().unwrap();
        assert_eq!(
            bbox.to_expression(),
            "intersects_bbox($geometry, geom_from_wkt('POLYGON((8 51, 11 51, 11 52, 8 52, 8 51))'))"
        );
    }

    #[test]
    fn test_filter_composes_onto_expression() {
        let user = UserContext::anonymous();
        let ctx = FilterContext::new(&user, "cities").with_bbox("8,51,11,52");

        let state = BboxFilter
            .apply_filter(&ctx, LayerQueryState::new().with_filter_expression("\"ISO2\" = 'DE'"))
            .unwrap();
        assert_eq!(
            state.filter_expression.as_deref(),
            Some("(\"ISO2\" = 'DE') AND (intersects_bbox($geometry, geom_from_wkt('POLYGON((8 51, 11 51, 11 52, 8 52, 8 51))')))")
        );
    }

    #[test]
    fn test_filter_without_bbox_passes_through() {
        let user = UserContext::anonymous();
        let state = LayerQueryState::new().with_subset_string("a = 1");
        let result = BboxFilter
            .apply_filter(&FilterContext::new(&user, "cities"), state.clone())
            .unwrap();
        assert_eq!(result, state);
    }
}
