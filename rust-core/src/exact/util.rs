use std::collections::BTreeMap;

use num_bigint::BigInt;

use crate::symbolic::{number, Expr, Symbol};
use crate::{MoireError, Result};

/// Replaces dummy symbols by plain symbols of the same name.
pub fn undummy(expr: &Expr) -> Result<Expr> {
    let substitutions: BTreeMap<Symbol, Expr> = expr
        .free_symbols()
        .into_iter()
        .filter(Symbol::is_dummy)
        .map(|symbol| {
            let plain = Expr::from(symbol.undummied());
            (symbol, plain)
        })
        .collect();
    if substitutions.is_empty() {
        return Ok(expr.clone());
    }
    expr.subs(&substitutions)
}

/// Squarefree test for a concrete integer scalar.
pub fn is_squarefree(value: &Expr) -> Result<bool> {
    if value.has_free_symbols() {
        return Err(MoireError::NotYetDetermined(format!(
            "cannot test {} for squarefreeness",
            value
        )));
    }
    let n = integer_parameter("squarefree test argument", value)?;
    Ok(number::is_squarefree(&n))
}

pub(crate) fn integer_parameter(name: &str, value: &Expr) -> Result<BigInt> {
    value.to_integer().ok_or_else(|| {
        MoireError::ValidationError(format!("{} must be an integer, got {}", name, value))
    })
}

pub(crate) fn all_concrete(values: &[&Expr]) -> bool {
    values.iter().all(|value| !value.has_free_symbols())
}
