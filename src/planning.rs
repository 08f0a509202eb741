//! The period-indexed production planning model.
//!
//! For every period `t` the model holds a production variable `X_t` and an
//! end-of-period inventory variable `I_t`, both continuous and non-negative:
//!
//! ```text
//! minimize    holding_cost * Σ I_t + Σ production_cost_t * X_t
//! subject to  X_0 - I_0 = demand_0 - initial_inventory
//!             I_{t-1} + X_t - I_t = demand_t          t >= 1
//!             X_t <= production_capacity_t
//! ```
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PlanningError, PlanningResult};
use crate::lp_format::LpObjective;
use crate::problem::{LinearExpression, Problem, Variable};
use crate::solve::{SolveAdapter, SolveResult};
use crate::solvers::Status;

/// Input data of one planning period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    /// Units to deliver during the period
    pub demand: f64,
    /// Maximum units produced during the period
    pub production_capacity: f64,
    /// Cost of one produced unit
    pub production_cost: f64,
}

/// Parameters shared by all periods
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalParameters {
    /// Stock available before the first period
    pub initial_inventory: f64,
    /// Cost of holding one unit for one period
    pub holding_cost: f64,
}

/// The two families of decision variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// `X_t`, units produced
    Production,
    /// `I_t`, units in stock at the end of the period
    Inventory,
}

impl VariableKind {
    fn prefix(self) -> &'static str {
        match self {
            VariableKind::Production => "X",
            VariableKind::Inventory => "I",
        }
    }

    /// LP name of the variable of this kind for `period`
    pub fn name(self, period: usize) -> String {
        format!("{}_{}", self.prefix(), period)
    }

    /// Recover the kind and the period from a variable name.
    ///
    /// ```
    /// use prod_planning::planning::VariableKind;
    ///
    /// assert_eq!(VariableKind::parse("X_3"), Some((VariableKind::Production, 3)));
    /// assert_eq!(VariableKind::parse("I_0"), Some((VariableKind::Inventory, 0)));
    /// assert_eq!(VariableKind::parse("Y_0"), None);
    /// assert_eq!(VariableKind::parse("X_"), None);
    /// ```
    pub fn parse(name: &str) -> Option<(VariableKind, usize)> {
        let (prefix, period) = name.split_once('_')?;
        let kind = match prefix {
            "X" => VariableKind::Production,
            "I" => VariableKind::Inventory,
            _ => return None,
        };
        if period.is_empty() || !period.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some((kind, period.parse().ok()?))
    }
}

const BALANCE_PREFIX: &str = "inv_balance";
const CAPACITY_PREFIX: &str = "prod_cap_month_";

fn check_value(value: f64, what: &str) -> PlanningResult<()> {
    if value.is_nan() {
        Err(PlanningError::InvalidInput(format!("{} is missing", what)))
    } else if !value.is_finite() || value < 0. {
        Err(PlanningError::InvalidInput(format!(
            "{} must be a finite non-negative number, got {}",
            what, value
        )))
    } else {
        Ok(())
    }
}

fn validate(periods: &[PeriodRecord], params: &GlobalParameters) -> PlanningResult<()> {
    if periods.is_empty() {
        return Err(PlanningError::InvalidInput(
            "at least one period is required".to_string(),
        ));
    }
    check_value(params.initial_inventory, "initial_inventory")?;
    check_value(params.holding_cost, "holding_cost")?;
    for (t, record) in periods.iter().enumerate() {
        check_value(record.demand, &format!("demand of period {}", t))?;
        check_value(
            record.production_capacity,
            &format!("production_capacity of period {}", t),
        )?;
        check_value(
            record.production_cost,
            &format!("production_cost of period {}", t),
        )?;
    }
    Ok(())
}

/// A built production planning LP. Production variables come first, then inventory variables.
#[derive(Debug, Clone)]
pub struct PlanningModel {
    problem: Problem,
    periods: usize,
}

impl PlanningModel {
    /// Build the LP from the ordered period records
    pub fn build(periods: &[PeriodRecord], params: &GlobalParameters) -> PlanningResult<Self> {
        validate(periods, params)?;
        let n = periods.len();

        let variables: Vec<Variable> = [VariableKind::Production, VariableKind::Inventory]
            .iter()
            .flat_map(|kind| (0..n).map(move |t| Variable::non_negative(kind.name(t))))
            .collect();

        let mut problem = Problem {
            name: "prod_planning".to_string(),
            sense: LpObjective::Minimize,
            objective: LinearExpression::default(),
            variables,
            constraints: Vec::with_capacity(2 * n),
        };

        // inventory balance
        for (t, record) in periods.iter().enumerate() {
            let production = VariableKind::Production.name(t);
            let inventory = VariableKind::Inventory.name(t);
            let (lhs, rhs) = if t == 0 {
                (
                    LinearExpression::default()
                        .with_term(production, 1.)
                        .with_term(inventory, -1.),
                    record.demand - params.initial_inventory,
                )
            } else {
                (
                    LinearExpression::default()
                        .with_term(VariableKind::Inventory.name(t - 1), 1.)
                        .with_term(production, 1.)
                        .with_term(inventory, -1.),
                    record.demand,
                )
            };
            problem.add_constraint(format!("{}{}", BALANCE_PREFIX, t), lhs, Ordering::Equal, rhs);
        }

        // production capacity
        for (t, record) in periods.iter().enumerate() {
            problem.add_constraint(
                format!("{}{}", CAPACITY_PREFIX, t),
                LinearExpression::default().with_term(VariableKind::Production.name(t), 1.),
                Ordering::Less,
                record.production_capacity,
            );
        }

        // holding cost, then production cost
        let holding = (0..n).map(|t| (VariableKind::Inventory.name(t), params.holding_cost));
        let production = periods
            .iter()
            .enumerate()
            .map(|(t, record)| (VariableKind::Production.name(t), record.production_cost));
        problem.objective = holding.chain(production).collect();

        Ok(PlanningModel { problem, periods: n })
    }

    /// The underlying LP, in the solver-neutral representation
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// Number of planning periods
    pub fn period_count(&self) -> usize {
        self.periods
    }

    /// `X_period`, if the period exists
    pub fn production_variable(&self, period: usize) -> Option<&Variable> {
        (period < self.periods).then(|| &self.problem.variables[period])
    }

    /// `I_period`, if the period exists
    pub fn inventory_variable(&self, period: usize) -> Option<&Variable> {
        (period < self.periods).then(|| &self.problem.variables[self.periods + period])
    }

    /// Number of inventory balance constraints
    pub fn balance_constraint_count(&self) -> usize {
        self.count_constraints(BALANCE_PREFIX)
    }

    /// Number of production capacity constraints
    pub fn capacity_constraint_count(&self) -> usize {
        self.count_constraints(CAPACITY_PREFIX)
    }

    fn count_constraints(&self, prefix: &str) -> usize {
        self.problem
            .constraints
            .iter()
            .filter(|c| c.name.as_deref().map_or(false, |n| n.starts_with(prefix)))
            .count()
    }

    /// Objective value of the given variable assignment
    pub fn objective_value(&self, result: &SolveResult) -> f64 {
        self.problem
            .objective
            .evaluate(|name| result.variable_values.get(name).copied())
    }

    /// Solve the model and read the plan back.
    /// Any status without a solution is an error, so no partial plan is ever returned.
    pub fn optimize(&self, adapter: &SolveAdapter) -> PlanningResult<ProductionPlan> {
        info!("Optimization starts!");
        let start = Instant::now();
        let result = adapter.solve(self)?;
        info!(
            status = ?result.status,
            "Optimization took {:.4} sec",
            start.elapsed().as_secs_f64()
        );
        self.plan(&result)
    }

    /// Turn a solve result of this model into a plan, checking its status
    /// and that every period has both of its values.
    pub fn plan(&self, result: &SolveResult) -> PlanningResult<ProductionPlan> {
        let quality = match result.status {
            Status::Optimal => "optimal",
            Status::SubOptimal => {
                warn!("the solver stopped before proving optimality");
                "feasible"
            }
            Status::Infeasible => return Err(PlanningError::Infeasible),
            Status::Unbounded => return Err(PlanningError::Unbounded),
            Status::Unknown => {
                return Err(PlanningError::SolveFailed(
                    "the solver did not report a solution".to_string(),
                ))
            }
        };

        let periods = extract_plan(result)?;
        if periods.len() != self.periods {
            return Err(PlanningError::SolveFailed(format!(
                "the solution covers {} periods out of {}",
                periods.len(),
                self.periods
            )));
        }
        let objective_value = result
            .objective_value
            .unwrap_or_else(|| self.objective_value(result));
        info!(
            "The solution is {} and the objective value is ${}",
            quality,
            format_money(objective_value)
        );
        Ok(ProductionPlan {
            objective_value,
            periods,
        })
    }
}

/// Decision values of one period
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodPlan {
    /// 0-based period index
    pub period: usize,
    /// Units produced
    pub production: f64,
    /// End-of-period inventory
    pub inventory: f64,
}

/// Solved plan, ordered by period
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionPlan {
    /// Total holding and production cost
    pub objective_value: f64,
    /// One entry per period
    pub periods: Vec<PeriodPlan>,
}

/// Group the solver values by period. Variables foreign to the model are skipped.
pub fn extract_plan(result: &SolveResult) -> PlanningResult<Vec<PeriodPlan>> {
    let mut by_period: BTreeMap<usize, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for (name, value) in &result.variable_values {
        let Some((kind, period)) = VariableKind::parse(name) else {
            continue;
        };
        let entry = by_period.entry(period).or_default();
        match kind {
            VariableKind::Production => entry.0 = Some(*value),
            VariableKind::Inventory => entry.1 = Some(*value),
        }
    }

    by_period
        .into_iter()
        .map(|(period, values)| match values {
            (Some(production), Some(inventory)) => Ok(PeriodPlan {
                period,
                production,
                inventory,
            }),
            (None, _) => Err(missing(VariableKind::Production, period)),
            (_, None) => Err(missing(VariableKind::Inventory, period)),
        })
        .collect()
}

fn missing(kind: VariableKind, period: usize) -> PlanningError {
    PlanningError::SolveFailed(format!("no value for {}", kind.name(period)))
}

/// `1234567.891` as `1,234,567.89`
fn format_money(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, decimals) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::new();
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if value < 0. { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, decimals)
}
