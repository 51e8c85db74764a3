//! Core-level thermal-hydraulics: many assemblies marched together.
//!
//! [`CoreSolver`] builds every assembly's subchannel network, picks a shared
//! axial mesh and runs the outer iteration: duct-wall heat exchange between
//! neighbors ([`coupler`]) and inlet flow allocation ([`balancer`]).
//! Assemblies are marched in parallel on the rayon pool; each round yields
//! an immutable [`CoreSnapshot`].

pub mod balancer;
pub mod config;
pub mod controller;
pub mod coupler;
pub mod error;

pub use balancer::{BalanceConfig, BalanceMetric, BalanceMode, FlowBalancer};
pub use config::{AssemblySpec, CoreSpec, DuctMaterials, PeripheryBoundary, SolverConfig};
pub use controller::{
    ConvergenceReport, CoreSnapshot, CoreSolution, CoreSolver, FailureDiagnostic, FailureStage,
    SolveFailure, SolveResult, SolveState,
};
pub use coupler::{DuctCoupler, DuctGeometry, FaceHeat};
pub use error::{CoreError, CoreResult};
