// Boundary policies that fill the one-cell halo around every field

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ScalarField, VectorField, sim::config::ConfigError};

/// Right-edge x velocity pinned by the wind tunnel policy unless configured otherwise
pub const DEFAULT_WIND_TUNNEL_INFLOW: f32 = 0.003;

/// How a single halo cell is derived from the interior.
#[derive(Clone, Copy, Debug, PartialEq)]
enum EdgeRule {
    /// Copy the nearest interior neighbor (zero gradient)
    Copy,
    /// Negate the nearest interior neighbor (no penetration)
    Negate,
    /// Copy the interior cell on the opposite side of the domain (periodic)
    Wrap,
    /// Pin to a constant
    Fixed(f32),
}

impl EdgeRule {
    fn resolve(self, near: f32, far: f32) -> f32 {
        match self {
            EdgeRule::Copy => near,
            EdgeRule::Negate => -near,
            EdgeRule::Wrap => far,
            EdgeRule::Fixed(value) => value,
        }
    }
}

/// A rule for populating the halo of a scalar field from its interior.
///
/// Every policy finishes by setting the four corners to the mean of their
/// two adjacent edge cells.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryPolicy {
    /// Zero-gradient on every edge
    Mirror,
    /// Negated on the left/right edges, copied on top/bottom
    OpposeX,
    /// Negated on the top/bottom edges, copied on left/right
    OpposeY,
    /// Periodic in y, copied on left/right
    YWrap,
    /// Periodic in y, copied on the left, drained to zero on the right
    YWrapXSink,
    /// Periodic in y, copied on the left, constant intake on the right
    WindTunnel { inflow: f32 },
}

impl BoundaryPolicy {
    /// Rules for the (left, right, top/bottom) edges
    fn rules(&self) -> (EdgeRule, EdgeRule, EdgeRule) {
        match *self {
            BoundaryPolicy::Mirror => (EdgeRule::Copy, EdgeRule::Copy, EdgeRule::Copy),
            BoundaryPolicy::OpposeX => (EdgeRule::Negate, EdgeRule::Negate, EdgeRule::Copy),
            BoundaryPolicy::OpposeY => (EdgeRule::Copy, EdgeRule::Copy, EdgeRule::Negate),
            BoundaryPolicy::YWrap => (EdgeRule::Copy, EdgeRule::Copy, EdgeRule::Wrap),
            BoundaryPolicy::YWrapXSink => (EdgeRule::Copy, EdgeRule::Fixed(0.), EdgeRule::Wrap),
            BoundaryPolicy::WindTunnel { inflow } => {
                (EdgeRule::Copy, EdgeRule::Fixed(inflow), EdgeRule::Wrap)
            }
        }
    }

    /// Rewrite the halo of `field` from its interior. Interior cells are
    /// never touched.
    ///
    /// Parameters
    /// - `field` - A padded field with at least one interior cell per axis
    pub fn apply(&self, field: &mut ScalarField) {
        let (rows, cols) = field.shape();
        let (last_r, last_c) = (rows - 2, cols - 2);
        let (edge_r, edge_c) = (rows - 1, cols - 1);

        let (left, right, vertical) = self.rules();

        // left & right edges
        for r in 1..=last_r {
            let (first, last) = (field[(r, 1)], field[(r, last_c)]);
            field[(r, 0)] = left.resolve(first, last);
            field[(r, edge_c)] = right.resolve(last, first);
        }

        // top & bottom edges
        for c in 1..=last_c {
            let (first, last) = (field[(1, c)], field[(last_r, c)]);
            field[(0, c)] = vertical.resolve(first, last);
            field[(edge_r, c)] = vertical.resolve(last, first);
        }

        update_corners(field);
    }
}

impl FromStr for BoundaryPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mirror" => Ok(BoundaryPolicy::Mirror),
            "oppose-x" => Ok(BoundaryPolicy::OpposeX),
            "oppose-y" => Ok(BoundaryPolicy::OpposeY),
            "y-wrap" => Ok(BoundaryPolicy::YWrap),
            "y-wrap-x-sink" => Ok(BoundaryPolicy::YWrapXSink),
            "wind-tunnel" => Ok(BoundaryPolicy::WindTunnel {
                inflow: DEFAULT_WIND_TUNNEL_INFLOW,
            }),
            other => Err(ConfigError::UnknownBoundary(other.to_string())),
        }
    }
}

/// Set each corner to the average of its two adjacent edge cells
fn update_corners(field: &mut ScalarField) {
    let (rows, cols) = field.shape();
    let (edge_r, edge_c) = (rows - 1, cols - 1);

    field[(0, 0)] = 0.5 * (field[(0, 1)] + field[(1, 0)]);
    field[(0, edge_c)] = 0.5 * (field[(0, edge_c - 1)] + field[(1, edge_c)]);
    field[(edge_r, 0)] = 0.5 * (field[(edge_r, 1)] + field[(edge_r - 1, 0)]);
    field[(edge_r, edge_c)] = 0.5 * (field[(edge_r, edge_c - 1)] + field[(edge_r - 1, edge_c)]);
}

/// The compound policy applied to a velocity field. The two components need
/// different symmetry, so each axis gets its own `BoundaryPolicy`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VelocityBoundary {
    /// Solid walls on all four sides
    Walls,
    /// Walls left/right, periodic top/bottom
    #[default]
    WrapY,
    /// Constant intake on the right edge, walls top/bottom
    WindTunnel { inflow: f32 },
}

/// Per-axis `[x, y]` policies used while diffusing and advecting velocity.
/// Transport always sees solid walls; the compound policy only shapes the
/// projected field.
pub const TRANSPORT_POLICIES: [BoundaryPolicy; 2] =
    [BoundaryPolicy::OpposeX, BoundaryPolicy::OpposeY];

impl VelocityBoundary {
    /// The per-axis policies applied after projection, as `[x, y]`
    pub fn policies(&self) -> [BoundaryPolicy; 2] {
        match *self {
            VelocityBoundary::Walls => [BoundaryPolicy::OpposeX, BoundaryPolicy::OpposeY],
            VelocityBoundary::WrapY => [BoundaryPolicy::OpposeX, BoundaryPolicy::YWrap],
            VelocityBoundary::WindTunnel { inflow } => {
                [BoundaryPolicy::WindTunnel { inflow }, BoundaryPolicy::OpposeY]
            }
        }
    }

    pub fn apply(&self, velocity: &mut VectorField) {
        let [bc_x, bc_y] = self.policies();
        bc_x.apply(&mut velocity[0]);
        bc_y.apply(&mut velocity[1]);
    }
}

impl FromStr for VelocityBoundary {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "walls" => Ok(VelocityBoundary::Walls),
            "wrap-y" => Ok(VelocityBoundary::WrapY),
            "wind-tunnel" => Ok(VelocityBoundary::WindTunnel {
                inflow: DEFAULT_WIND_TUNNEL_INFLOW,
            }),
            other => Err(ConfigError::UnknownBoundary(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use na::{DMatrix, dmatrix};
    use rand::Rng;

    use super::*;

    const ALL_POLICIES: [BoundaryPolicy; 6] = [
        BoundaryPolicy::Mirror,
        BoundaryPolicy::OpposeX,
        BoundaryPolicy::OpposeY,
        BoundaryPolicy::YWrap,
        BoundaryPolicy::YWrapXSink,
        BoundaryPolicy::WindTunnel { inflow: 0.25 },
    ];

    fn random_field(rows: usize, cols: usize) -> ScalarField {
        let mut rng = rand::rng();
        DMatrix::from_fn(rows, cols, |_, _| rng.random_range(-1.0..1.0))
    }

    /// 3x3 interior with a distinct value in every cell and garbage in the halo
    fn sample_field() -> ScalarField {
        dmatrix![
            9., 9., 9., 9., 9.;
            9., 1., 2., 3., 9.;
            9., 4., 5., 6., 9.;
            9., 7., 8., 9., 9.;
            9., 9., 9., 9., 9.;
        ]
    }

    #[test]
    fn test_mirror() {
        let mut field = sample_field();
        BoundaryPolicy::Mirror.apply(&mut field);

        let expected: ScalarField = dmatrix![
            1.,  1., 2., 3., 3.;
            1.,  1., 2., 3., 3.;
            4.,  4., 5., 6., 6.;
            7.,  7., 8., 9., 9.;
            7.,  7., 8., 9., 9.;
        ];

        assert_eq!(expected, field);
    }

    #[test]
    fn test_oppose_x() {
        let mut field = sample_field();
        BoundaryPolicy::OpposeX.apply(&mut field);

        assert_eq!(field.column(0).rows(1, 3), -field.column(1).rows(1, 3));
        assert_eq!(field.column(4).rows(1, 3), -field.column(3).rows(1, 3));
        assert_eq!(field.row(0).columns(1, 3), field.row(1).columns(1, 3));
        assert_eq!(field.row(4).columns(1, 3), field.row(3).columns(1, 3));
    }

    #[test]
    fn test_oppose_y() {
        let mut field = sample_field();
        BoundaryPolicy::OpposeY.apply(&mut field);

        assert_eq!(field.row(0).columns(1, 3), -field.row(1).columns(1, 3));
        assert_eq!(field.row(4).columns(1, 3), -field.row(3).columns(1, 3));
        assert_eq!(field.column(0).rows(1, 3), field.column(1).rows(1, 3));
        assert_eq!(field.column(4).rows(1, 3), field.column(3).rows(1, 3));
    }

    #[test]
    fn test_wrap_and_sink() {
        let mut field = sample_field();
        BoundaryPolicy::YWrapXSink.apply(&mut field);

        // bottom halo holds the top interior row and vice versa
        assert_eq!(field.row(0).columns(1, 3), field.row(3).columns(1, 3));
        assert_eq!(field.row(4).columns(1, 3), field.row(1).columns(1, 3));

        // left copied, right drained
        assert_eq!(field.column(0).rows(1, 3), field.column(1).rows(1, 3));
        assert!(field.column(4).rows(1, 3).iter().all(|v| *v == 0.));
    }

    #[test]
    fn test_wind_tunnel_inflow() {
        let mut field = sample_field();
        BoundaryPolicy::WindTunnel { inflow: 0.003 }.apply(&mut field);

        assert!(field.column(4).rows(1, 3).iter().all(|v| *v == 0.003));
        assert_eq!(field.row(0).columns(1, 3), field.row(3).columns(1, 3));
        assert_eq!(field.row(4).columns(1, 3), field.row(1).columns(1, 3));
    }

    #[test]
    fn test_y_wrap_keeps_right_edge() {
        let mut field = sample_field();
        BoundaryPolicy::YWrap.apply(&mut field);

        assert_eq!(field.column(4).rows(1, 3), field.column(3).rows(1, 3));
        assert_eq!(field.row(0).columns(1, 3), field.row(3).columns(1, 3));
    }

    #[test]
    fn test_interior_untouched() {
        for policy in ALL_POLICIES {
            let before = random_field(6, 7);
            let mut field = before.clone();
            policy.apply(&mut field);

            assert_eq!(
                before.view((1, 1), (4, 5)),
                field.view((1, 1), (4, 5)),
                "{policy:?} modified the interior"
            );
        }
    }

    #[test]
    fn test_corners_are_edge_averages() {
        for policy in ALL_POLICIES {
            let mut field = random_field(6, 8);
            policy.apply(&mut field);

            let (er, ec) = (5, 7);
            assert_eq!(field[(0, 0)], 0.5 * (field[(0, 1)] + field[(1, 0)]));
            assert_eq!(field[(0, ec)], 0.5 * (field[(0, ec - 1)] + field[(1, ec)]));
            assert_eq!(field[(er, 0)], 0.5 * (field[(er, 1)] + field[(er - 1, 0)]));
            assert_eq!(
                field[(er, ec)],
                0.5 * (field[(er, ec - 1)] + field[(er - 1, ec)])
            );
        }
    }

    #[test]
    fn test_idempotent() {
        for policy in ALL_POLICIES {
            let mut field = random_field(7, 5);
            policy.apply(&mut field);
            let once = field.clone();
            policy.apply(&mut field);

            assert_eq!(once, field, "{policy:?} is not idempotent");
        }
    }

    #[test]
    fn test_velocity_boundary_axes() {
        let mut velocity = [sample_field(), sample_field()];
        VelocityBoundary::WrapY.apply(&mut velocity);

        let mut expected_x = sample_field();
        BoundaryPolicy::OpposeX.apply(&mut expected_x);
        let mut expected_y = sample_field();
        BoundaryPolicy::YWrap.apply(&mut expected_y);

        assert_eq!(expected_x, velocity[0]);
        assert_eq!(expected_y, velocity[1]);
    }

    #[test]
    fn test_transport_policies_are_walls() {
        assert_eq!(TRANSPORT_POLICIES, VelocityBoundary::Walls.policies());
        assert_ne!(TRANSPORT_POLICIES, VelocityBoundary::WrapY.policies());
    }

    #[test]
    fn test_parse_selectors() {
        assert_eq!(
            "y-wrap-x-sink".parse::<BoundaryPolicy>().unwrap(),
            BoundaryPolicy::YWrapXSink
        );
        assert_eq!(
            "wind-tunnel".parse::<VelocityBoundary>().unwrap(),
            VelocityBoundary::WindTunnel {
                inflow: DEFAULT_WIND_TUNNEL_INFLOW
            }
        );
        assert!(matches!(
            "periodic".parse::<BoundaryPolicy>(),
            Err(ConfigError::UnknownBoundary(s)) if s == "periodic"
        ));
        assert!("mirror".parse::<VelocityBoundary>().is_err());
    }
}
