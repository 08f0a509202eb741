//! Concrete, owned types for describing a linear problem.
//! Any of them can be handed to a solver through [LpProblem].
use std::cmp::Ordering;
use std::fmt;
use std::fmt::Formatter;

use crate::lp_format::{
    AsLinearExpression, AsVariable, Constraint, LpObjective, LpProblem, WriteToLpFileFormat,
};

/// A variable to optimize
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// The variable name should be unique in the problem and have a name accepted by the solver
    pub name: String,
    /// Restrict the variable to integer values
    pub is_integer: bool,
    /// -INFINITY if there is no lower bound
    pub lower_bound: f64,
    /// INFINITY if there is no upper bound
    pub upper_bound: f64,
}

impl Variable {
    /// A continuous variable with a lower bound of zero and no upper bound
    pub fn non_negative(name: impl Into<String>) -> Self {
        Variable {
            name: name.into(),
            is_integer: false,
            lower_bound: 0.,
            upper_bound: f64::INFINITY,
        }
    }
}

impl AsVariable for Variable {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_integer(&self) -> bool {
        self.is_integer
    }

    fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    fn upper_bound(&self) -> f64 {
        self.upper_bound
    }
}

/// A weighted sum of variables, referenced by name
///
/// ```
/// use prod_planning::problem::LinearExpression;
///
/// let expr = LinearExpression::default()
///     .with_term("x", 2.)
///     .with_term("y", 1.)
///     .with_term("z", -0.5);
/// assert_eq!(expr.to_string(), "2 x + y - 0.5 z");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpression {
    terms: Vec<(String, f64)>,
}

impl LinearExpression {
    /// Append `coefficient * name` to the expression
    pub fn add_term(&mut self, name: impl Into<String>, coefficient: f64) {
        self.terms.push((name.into(), coefficient));
    }

    /// Builder-style [LinearExpression::add_term]
    pub fn with_term(mut self, name: impl Into<String>, coefficient: f64) -> Self {
        self.add_term(name, coefficient);
        self
    }

    /// Number of terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the expression has no term at all
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value of the expression for the given variable assignment.
    /// Variables missing from `value_of` count as zero.
    pub fn evaluate(&self, value_of: impl Fn(&str) -> Option<f64>) -> f64 {
        self.terms
            .iter()
            .map(|(name, coefficient)| coefficient * value_of(name).unwrap_or(0.))
            .sum()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for LinearExpression {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        LinearExpression {
            terms: iter.into_iter().map(|(n, c)| (n.into(), c)).collect(),
        }
    }
}

impl AsLinearExpression for LinearExpression {
    fn terms(&self) -> &[(String, f64)] {
        &self.terms
    }
}

impl WriteToLpFileFormat for LinearExpression {
    fn to_lp_file_format(&self, f: &mut Formatter) -> fmt::Result {
        for (idx, (name, coefficient)) in self.terms.iter().enumerate() {
            let magnitude = coefficient.abs();
            match (idx, coefficient.is_sign_negative()) {
                (0, false) => {}
                (0, true) => f.write_str("- ")?,
                (_, false) => f.write_str(" + ")?,
                (_, true) => f.write_str(" - ")?,
            }
            if magnitude != 1. {
                write!(f, "{} ", magnitude)?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

impl fmt::Display for LinearExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.to_lp_file_format(f)
    }
}

/// An owned linear problem
#[derive(Debug, Clone)]
pub struct Problem<EXPR = LinearExpression, VAR = Variable> {
    /// Written as a comment on the first line of the .lp file
    pub name: String,
    /// Minimize or maximize
    pub sense: LpObjective,
    /// Function to optimize
    pub objective: EXPR,
    /// All the variables referenced by the objective and the constraints
    pub variables: Vec<VAR>,
    /// Rows of the problem
    pub constraints: Vec<Constraint<EXPR>>,
}

impl Problem {
    /// Add a named constraint `lhs <operator> rhs`
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        lhs: LinearExpression,
        operator: Ordering,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name: Some(name.into()),
            lhs,
            operator,
            rhs,
        });
    }
}

impl<'a, EXPR: 'a, VAR: 'a> LpProblem<'a> for Problem<EXPR, VAR>
where
    &'a VAR: AsVariable,
    &'a EXPR: WriteToLpFileFormat + AsLinearExpression,
{
    type Variable = &'a VAR;
    type Expression = &'a EXPR;
    type ConstraintIterator = Box<dyn Iterator<Item = Constraint<&'a EXPR>> + 'a>;
    type VariableIterator = std::slice::Iter<'a, VAR>;

    fn name(&self) -> &str {
        &self.name
    }

    fn variables(&'a self) -> Self::VariableIterator {
        self.variables.iter()
    }

    fn objective(&'a self) -> Self::Expression {
        &self.objective
    }

    fn sense(&self) -> LpObjective {
        self.sense
    }

    fn constraints(&'a self) -> Self::ConstraintIterator {
        Box::new(self.constraints.iter().map(
            |Constraint {
                 name,
                 lhs,
                 operator,
                 rhs,
             }| Constraint {
                name: name.clone(),
                lhs,
                operator: *operator,
                rhs: *rhs,
            },
        ))
    }
}
