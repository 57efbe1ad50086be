//! Named arithmetic functions over the property store.
//!
//! A function is a single operation node; a node collects values from
//! referenced properties, inline literals, an optional embedded lookup
//! table, and nested sub-operations, then reduces them with its operation
//! kind. This mirrors the `function` element of the aircraft description.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::table::{LookupTable, TableError};
use crate::properties::PropertyStore;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FunctionError {
    #[error("function has no operation")]
    EmptyExpression,

    #[error(transparent)]
    Table(#[from] TableError),
}

/// The twelve operation kinds of the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    Product,
    Sum,
    Difference,
    Quotient,
    Pow,
    Abs,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
}

impl OpKind {
    pub fn tag(&self) -> &'static str {
        match self {
            OpKind::Product => "product",
            OpKind::Sum => "sum",
            OpKind::Difference => "difference",
            OpKind::Quotient => "quotient",
            OpKind::Pow => "pow",
            OpKind::Abs => "abs",
            OpKind::Sin => "sin",
            OpKind::Cos => "cos",
            OpKind::Tan => "tan",
            OpKind::Asin => "asin",
            OpKind::Acos => "acos",
            OpKind::Atan => "atan",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "product" => OpKind::Product,
            "sum" => OpKind::Sum,
            "difference" => OpKind::Difference,
            "quotient" => OpKind::Quotient,
            "pow" => OpKind::Pow,
            "abs" => OpKind::Abs,
            "sin" => OpKind::Sin,
            "cos" => OpKind::Cos,
            "tan" => OpKind::Tan,
            "asin" => OpKind::Asin,
            "acos" => OpKind::Acos,
            "atan" => OpKind::Atan,
            _ => return None,
        })
    }
}

/// One operation node: value sources in collection order plus the reduction
/// kind. Nested operations keep their declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OpKind,
    pub properties: Vec<String>,
    pub values: Vec<f64>,
    pub table: Option<LookupTable>,
    pub nested: Vec<Operation>,
}

impl Operation {
    pub fn new(kind: OpKind) -> Self {
        Self {
            kind,
            properties: Vec::new(),
            values: Vec::new(),
            table: None,
            nested: Vec::new(),
        }
    }

    /// Collect and reduce. An absent property contributes 0.0; a zero
    /// divisor leaves the quotient accumulator unchanged.
    pub fn evaluate(&self, store: &PropertyStore) -> Result<f64, FunctionError> {
        let mut collected: Vec<f64> = Vec::new();

        for name in &self.properties {
            collected.push(store.get(name));
        }
        collected.extend_from_slice(&self.values);

        if let Some(table) = &self.table {
            let inputs: Vec<f64> = table
                .independent_vars
                .iter()
                .map(|var| store.get(var))
                .collect();
            collected.push(table.interpolate(&inputs)?);
        }

        for sub in &self.nested {
            collected.push(sub.evaluate(store)?);
        }

        Ok(reduce(self.kind, &collected))
    }
}

/// A named function wrapping either an operation node or a bare table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub operation: Option<Operation>,
    pub table: Option<LookupTable>,
}

impl FunctionDef {
    pub fn evaluate(&self, store: &PropertyStore) -> Result<f64, FunctionError> {
        if let Some(op) = &self.operation {
            return op.evaluate(store);
        }
        if let Some(table) = &self.table {
            let inputs: Vec<f64> = table
                .independent_vars
                .iter()
                .map(|var| store.get(var))
                .collect();
            return Ok(table.interpolate(&inputs)?);
        }
        Err(FunctionError::EmptyExpression)
    }
}

fn reduce(kind: OpKind, values: &[f64]) -> f64 {
    match kind {
        OpKind::Product => values.iter().product(),
        OpKind::Sum => values.iter().sum(),
        OpKind::Difference => match values.split_first() {
            Some((&first, rest)) => rest.iter().fold(first, |acc, v| acc - v),
            None => 0.0,
        },
        OpKind::Quotient => match values.split_first() {
            Some((&first, rest)) => rest
                .iter()
                .fold(first, |acc, &v| if v != 0.0 { acc / v } else { acc }),
            None => 0.0,
        },
        OpKind::Pow => match values {
            [] => 0.0,
            [x] => *x,
            [x, y, ..] => x.powf(*y),
        },
        OpKind::Abs => values.first().map_or(0.0, |v| v.abs()),
        OpKind::Sin => values.first().map_or(0.0, |v| v.sin()),
        OpKind::Cos => values.first().map_or(0.0, |v| v.cos()),
        OpKind::Tan => values.first().map_or(0.0, |v| v.tan()),
        OpKind::Asin => values.first().map_or(0.0, |v| v.asin()),
        OpKind::Acos => values.first().map_or(0.0, |v| v.acos()),
        OpKind::Atan => values.first().map_or(0.0, |v| v.atan()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::table::{Table1D, TableData};
    use approx::assert_relative_eq;

    fn op_with_values(kind: OpKind, values: &[f64]) -> Operation {
        let mut op = Operation::new(kind);
        op.values = values.to_vec();
        op
    }

    #[test]
    fn test_basic_reductions() {
        let store = PropertyStore::new();
        let cases = [
            (OpKind::Product, vec![2.0, 3.0], 6.0),
            (OpKind::Sum, vec![1.0, 2.0, 3.0], 6.0),
            (OpKind::Difference, vec![5.0, 2.0], 3.0),
            (OpKind::Quotient, vec![8.0, 2.0], 4.0),
            (OpKind::Pow, vec![2.0, 3.0], 8.0),
            (OpKind::Abs, vec![-5.0], 5.0),
        ];
        for (kind, values, expected) in cases {
            let op = op_with_values(kind, &values);
            assert_relative_eq!(op.evaluate(&store).unwrap(), expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_transcendentals_use_first_value() {
        let store = PropertyStore::new();
        let op = op_with_values(OpKind::Sin, &[std::f64::consts::FRAC_PI_2, 99.0]);
        assert_relative_eq!(op.evaluate(&store).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_product_reduces_to_one() {
        let store = PropertyStore::new();
        let op = Operation::new(OpKind::Product);
        assert_relative_eq!(op.evaluate(&store).unwrap(), 1.0);
    }

    #[test]
    fn test_zero_divisor_leaves_accumulator() {
        let store = PropertyStore::new();
        let op = op_with_values(OpKind::Quotient, &[8.0, 0.0, 2.0]);
        assert_relative_eq!(op.evaluate(&store).unwrap(), 4.0);
    }

    #[test]
    fn test_property_collection() {
        let store = PropertyStore::new();
        store.set("radius", 100.0);
        let mut op = op_with_values(OpKind::Product, &[2.0, 3.14159]);
        op.properties.push("radius".into());
        assert_relative_eq!(op.evaluate(&store).unwrap(), 628.318, epsilon = 1e-2);
    }

    #[test]
    fn test_absent_property_contributes_zero() {
        let store = PropertyStore::new();
        let mut op = op_with_values(OpKind::Sum, &[5.0]);
        op.properties.push("missing/name".into());
        assert_relative_eq!(op.evaluate(&store).unwrap(), 5.0);
    }

    #[test]
    fn test_nested_operation() {
        let store = PropertyStore::new();
        store.set("radius", 100.0);

        let mut inner = op_with_values(OpKind::Sum, &[200.0]);
        inner.properties.push("radius".into());

        let mut outer = op_with_values(OpKind::Product, &[3.14159, 2.0]);
        outer.nested.push(inner);

        assert_relative_eq!(
            outer.evaluate(&store).unwrap(),
            3.14159 * 2.0 * 300.0,
            epsilon = 1e-2
        );
    }

    #[test]
    fn test_embedded_table_inputs_from_store() {
        let store = PropertyStore::new();
        store.set("aero/alpha-deg", 5.0);

        let mut op = op_with_values(OpKind::Product, &[2.0]);
        op.table = Some(LookupTable {
            name: "lift".into(),
            independent_vars: vec!["aero/alpha-deg".into()],
            lookup_types: vec!["row".into()],
            data: TableData::OneD(Table1D {
                indices: vec![-10.0, 0.0, 10.0],
                values: vec![0.1, 0.0, 0.1],
            }),
        });

        assert_relative_eq!(op.evaluate(&store).unwrap(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_function_errors() {
        let store = PropertyStore::new();
        let f = FunctionDef {
            name: "empty".into(),
            description: String::new(),
            operation: None,
            table: None,
        };
        assert_eq!(f.evaluate(&store), Err(FunctionError::EmptyExpression));
    }
}
