pub mod autodiff;
pub mod averaging;
pub mod directions;
pub mod display;
pub mod engine;
pub mod error;
pub mod fields;
pub mod momentum;
pub mod params;
pub mod path;
pub mod trail;
/// The `photon_core` crate computes the motion of a point photon along parametric paths
/// and the quantities displayed alongside it.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `PathGeometry` (one path family).
/// - **Path**: torus knot, S-curve double lobe and C-curve Viviani families, with
///   analytic (dual number) or finite-difference velocities.
/// - **Fields / Momentum**: unit E/B directions and momentum decompositions per family.
/// - **Averaging / Trail**: per-cycle means and bounded trail buffers.
/// - **Engine**: the per-frame pipeline driven by the host.
pub mod traits;

pub use engine::{FrameSnapshot, NeverObstructed, OcclusionOracle, PhotonEngine};
pub use params::ParameterSet;
pub use traits::Vec3;
