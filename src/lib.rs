#![deny(missing_docs)]
//! Production planning over consecutive periods, as a linear program
//! written in the .lp file format and solved either in-process or by an
//! external solver (CBC, GLPK, Gurobi, CPLEX).
//!
//! ```
//! use prod_planning::planning::{GlobalParameters, PeriodRecord, PlanningModel};
//! use prod_planning::solve::{SolveAdapter, SolverConfig, SolverKind};
//!
//! let periods = [PeriodRecord { demand: 100., production_capacity: 150., production_cost: 5. }];
//! let params = GlobalParameters { initial_inventory: 0., holding_cost: 1. };
//! let model = PlanningModel::build(&periods, &params).unwrap();
//! let adapter = SolveAdapter::new(SolverKind::Native, SolverConfig::default()).unwrap();
//! let plan = model.optimize(&adapter).unwrap();
//! assert!((plan.objective_value - 500.).abs() < 1e-6);
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod lp_format;
pub mod output;
pub mod pipeline;
pub mod planning;
pub mod problem;
pub mod solve;
pub mod solvers;
pub mod util;

pub use error::{PlanningError, PlanningResult};
