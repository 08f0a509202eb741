use std::cmp::Ordering;
use std::fs;

use prod_planning::lp_format::{Constraint, LpObjective, LpProblem};
use prod_planning::problem::{LinearExpression, Problem, Variable};

fn expr(terms: &[(&str, f64)]) -> LinearExpression {
    terms.iter().map(|(name, c)| (*name, *c)).collect()
}

#[test]
fn simple_problem() {
    let pb = Problem {
        name: "my_problem".to_string(),
        sense: LpObjective::Minimize,
        objective: expr(&[("x", 2.), ("y", 1.)]),
        variables: vec![
            Variable {
                name: "x".to_string(),
                is_integer: false,
                lower_bound: f64::NEG_INFINITY,
                upper_bound: f64::INFINITY,
            },
            Variable::non_negative("y"),
            Variable {
                name: "z".to_string(),
                is_integer: false,
                lower_bound: 1.,
                upper_bound: 10.,
            },
        ],
        constraints: vec![Constraint {
            name: None,
            lhs: expr(&[("x", 1.), ("y", 1.), ("z", 1.)]),
            operator: Ordering::Greater,
            rhs: 5.0,
        }],
    };
    let expected_str = "\\ my_problem

Minimize
  obj: 2 x + y

Subject To
  c0: x + y + z >= 5

Bounds
  x free
  0 <= y
  1 <= z <= 10

End
";
    assert_eq!(pb.display_lp().to_string(), expected_str);
}

#[test]
fn with_integers() {
    let pb = Problem {
        name: "int_problem".to_string(),
        sense: LpObjective::Maximize,
        objective: expr(&[("x", 1.), ("y", -1.)]),
        variables: vec![
            Variable {
                name: "x".to_string(),
                is_integer: true,
                lower_bound: -10.,
                upper_bound: 10.,
            },
            Variable {
                name: "y".to_string(),
                is_integer: true,
                lower_bound: f64::NEG_INFINITY,
                upper_bound: 16.5,
            },
        ],
        constraints: vec![Constraint {
            name: None,
            lhs: expr(&[("x", 1.), ("y", -1.)]),
            operator: Ordering::Less,
            rhs: -5.0,
        }],
    };
    let expected_str = "\\ int_problem

Maximize
  obj: x - y

Subject To
  c0: x - y <= -5

Bounds
  -10 <= x <= 10
  y <= 16.5

Generals
  x
  y

End
";
    assert_eq!(pb.display_lp().to_string(), expected_str);
}

#[test]
fn named_rows_and_file_output() {
    let mut pb = Problem {
        name: "prod_planning".to_string(),
        sense: LpObjective::Minimize,
        objective: expr(&[("I_0", 2.), ("X_0", 1.5)]),
        variables: vec![Variable::non_negative("X_0"), Variable::non_negative("I_0")],
        constraints: vec![],
    };
    pb.add_constraint("inv_balance0", expr(&[("X_0", 1.), ("I_0", -1.)]), Ordering::Equal, 30.);
    pb.add_constraint("prod_cap_month_0", expr(&[("X_0", 1.)]), Ordering::Less, 40.);

    let expected_str = "\\ prod_planning

Minimize
  obj: 2 I_0 + 1.5 X_0

Subject To
  inv_balance0: X_0 - I_0 = 30
  prod_cap_month_0: X_0 <= 40

Bounds
  0 <= X_0
  0 <= I_0

End
";
    assert_eq!(pb.display_lp().to_string(), expected_str);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prod_planning.lp");
    pb.write_lp_file(&path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), expected_str);

    let tmp = pb.to_tmp_file().unwrap();
    assert_eq!(fs::read_to_string(tmp.path()).unwrap(), expected_str);
}

#[test]
fn leading_negative_term() {
    assert_eq!(expr(&[("a", -1.), ("b", -3.)]).to_string(), "- a - 3 b");
}
