use std::fmt;

use md_parsers::{
    ParameterMapping,
    ParamValue,
    Tensor,
};
use shared::{
    numeric_methods::{mean, median_lower},
    shape_str,
};


#[derive(Clone, Debug, PartialEq)]
pub enum KeyComparison {
    /// Tensors with zero difference, or scalars that are equal.
    Identical,

    /// Tensors whose differences do not exceed the tolerance, but are not all zero.
    WithinTolerance { max_diff: f64, mean_diff: f64 },

    Differ { max_diff: f64, mean_diff: f64, nan_count: usize },

    ShapeMismatch { lhs: Vec<usize>, rhs: Vec<usize> },

    /// Both scalars, but different.
    ValueMismatch,

    /// One tensor and one scalar.
    TypeMismatch { lhs: String, rhs: String },
}


impl KeyComparison {
    pub fn is_identical(&self) -> bool {
        matches!(self, KeyComparison::Identical | KeyComparison::WithinTolerance { .. })
    }
}


#[derive(Clone, Debug, PartialEq)]
pub struct KeyReport {
    pub key:        String,
    pub is_tensor:  bool,
    pub comparison: KeyComparison,
}


impl fmt::Display for KeyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use KeyComparison::*;

        match &self.comparison {
            Identical if self.is_tensor => write!(f, "✓ {:50} | IDENTICAL", self.key),
            Identical => write!(f, "✓ {}: IDENTICAL", self.key),
            WithinTolerance { max_diff, mean_diff } =>
                write!(f, "≈ {:50} | max_diff: {:.6e} | mean_diff: {:.6e}", self.key, max_diff, mean_diff),
            Differ { max_diff, mean_diff, nan_count: 0 } =>
                write!(f, "  {:50} | max_diff: {:.6e} | mean_diff: {:.6e}", self.key, max_diff, mean_diff),
            Differ { max_diff, mean_diff, nan_count } =>
                write!(f, "  {:50} | max_diff: {:.6e} | mean_diff: {:.6e} | NaN: {}", self.key, max_diff, mean_diff, nan_count),
            ShapeMismatch { lhs, rhs } =>
                write!(f, "✗ {}: Different shapes {} vs {}", self.key, shape_str(lhs), shape_str(rhs)),
            ValueMismatch => write!(f, "✗ {}: Different values", self.key),
            TypeMismatch { lhs, rhs } =>
                write!(f, "✗ {}: Different value types, {} vs {}", self.key, lhs, rhs),
        }
    }
}


/// Result of comparing two mappings with the same keys.
#[derive(Clone, Debug, PartialEq)]
pub struct CompareReport {
    pub tolerance:    f64,
    pub keys:         Vec<KeyReport>,

    /// Number of elements of all shape-matching tensors.
    pub total_params: usize,

    /// Statistics of the absolute difference over all shape-matching tensors, NaN excluded.
    pub max_diff:     f64,
    pub mean_diff:    Option<f64>,
    pub median_diff:  Option<f64>,
}


impl CompareReport {
    pub fn is_identical(&self) -> bool {
        self.keys.iter().all(|k| k.comparison.is_identical())
    }

    pub fn ndiffering(&self) -> usize {
        self.keys.iter().filter(|k| !k.comparison.is_identical()).count()
    }
}


impl fmt::Display for CompareReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "-".repeat(80))?;
        for k in self.keys.iter() {
            writeln!(f, "{}", k)?;
        }
        writeln!(f, "{}", "-".repeat(80))?;
        write!(f, "Total parameters: {}", self.total_params)?;

        if !self.is_identical() {
            writeln!(f)?;
            write!(f, "Maximum absolute difference: {:.6e}", self.max_diff)?;
            if let Some(m) = self.mean_diff {
                write!(f, "\nMean absolute difference: {:.6e}", m)?;
            }
            if let Some(m) = self.median_diff {
                write!(f, "\nMedian absolute difference: {:.6e}", m)?;
            }
        }
        Ok(())
    }
}


#[derive(Clone, Debug, PartialEq)]
pub enum CompareOutcome {
    /// The key sets differ, values were not compared.
    KeyMismatch {
        only_in_first:  Vec<String>,
        only_in_second: Vec<String>,
    },
    Compared(CompareReport),
}


impl CompareOutcome {
    pub fn is_identical(&self) -> bool {
        match self {
            CompareOutcome::KeyMismatch { .. } => false,
            CompareOutcome::Compared(r) => r.is_identical(),
        }
    }
}


fn value_type(v: &ParamValue) -> String {
    match v {
        ParamValue::Tensor(t) => format!("tensor{}", shape_str(&t.shape)),
        ParamValue::Scalar(_) => String::from("scalar"),
    }
}


/// Absolute differences of two equally shaped tensors, with NaN entries removed, and the
/// number of removed entries.
fn abs_diff(lhs: &Tensor, rhs: &Tensor) -> (Vec<f64>, usize) {
    let mut nan_count = 0;
    let diffs = lhs.data.iter()
        .zip(rhs.data.iter())
        .map(|(a, b)| (a - b).abs())
        .filter(|d| {
            let nan = d.is_nan();
            if nan { nan_count += 1; }
            !nan
        })
        .collect::<Vec<_>>();
    (diffs, nan_count)
}


fn compare_tensors(lhs: &Tensor, rhs: &Tensor, tolerance: f64) -> (KeyComparison, Vec<f64>) {
    let (diffs, nan_count) = abs_diff(lhs, rhs);
    let max_diff = diffs.iter().cloned().fold(0.0f64, f64::max);
    let mean_diff = if diffs.is_empty() { 0.0 } else { mean(&diffs) };

    let comparison = if nan_count > 0 || max_diff > tolerance {
        KeyComparison::Differ { max_diff, mean_diff, nan_count }
    } else if max_diff > 0.0 {
        KeyComparison::WithinTolerance { max_diff, mean_diff }
    } else {
        KeyComparison::Identical
    };

    (comparison, diffs)
}


/// Compare `first` and `second` key by key.
///
/// Two tensors are identical when no absolute difference exceeds `tolerance`; with
/// `tolerance == 0.0` this is exact equality. Any NaN difference makes the tensors differ.
pub fn compare_checkpoints(first: &ParameterMapping, second: &ParameterMapping, tolerance: f64) -> CompareOutcome {
    let only_in_first = first.keys()
        .filter(|k| second.get(k).is_none())
        .cloned()
        .collect::<Vec<_>>();
    let only_in_second = second.keys()
        .filter(|k| first.get(k).is_none())
        .cloned()
        .collect::<Vec<_>>();

    if !only_in_first.is_empty() || !only_in_second.is_empty() {
        return CompareOutcome::KeyMismatch { only_in_first, only_in_second };
    }

    let mut keys = Vec::with_capacity(first.len());
    let mut all_diffs = vec![];
    let mut total_params = 0usize;
    let mut max_diff = 0.0f64;

    for (key, lhs) in first.params.iter() {
        let rhs = match second.get(key) {
            Some(v) => v,
            None => continue,
        };

        let (is_tensor, comparison) = match (lhs, rhs) {
            (ParamValue::Tensor(a), ParamValue::Tensor(b)) => {
                if a.shape != b.shape {
                    (true, KeyComparison::ShapeMismatch { lhs: a.shape.clone(), rhs: b.shape.clone() })
                } else {
                    let (comparison, diffs) = compare_tensors(a, b, tolerance);
                    total_params += a.numel();
                    max_diff = diffs.iter().cloned().fold(max_diff, f64::max);
                    all_diffs.extend(diffs);
                    (true, comparison)
                }
            },
            (ParamValue::Scalar(a), ParamValue::Scalar(b)) => {
                if a == b {
                    (false, KeyComparison::Identical)
                } else {
                    (false, KeyComparison::ValueMismatch)
                }
            },
            (a, b) => (false, KeyComparison::TypeMismatch { lhs: value_type(a), rhs: value_type(b) }),
        };

        keys.push(KeyReport { key: key.clone(), is_tensor, comparison });
    }

    let mean_diff = if all_diffs.is_empty() { None } else { Some(mean(&all_diffs)) };
    let median_diff = median_lower(&all_diffs);

    CompareOutcome::Compared(CompareReport {
        tolerance,
        keys,
        total_params,
        max_diff,
        mean_diff,
        median_diff,
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    fn tensor(shape: Vec<usize>, data: Vec<f64>) -> ParamValue {
        ParamValue::Tensor(Tensor::new(shape, data).unwrap())
    }

    fn mapping(w: Vec<f64>) -> ParameterMapping {
        [
            ("encoder.weight".to_string(), tensor(vec![2, 3], w)),
            ("encoder.bias".to_string(),   tensor(vec![3], vec![0.1, 0.2, 0.3])),
            ("epoch".to_string(),          ParamValue::Scalar("100".into())),
        ].into_iter().collect()
    }

    fn report(outcome: CompareOutcome) -> CompareReport {
        match outcome {
            CompareOutcome::Compared(r) => r,
            other => panic!("expected a value comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_identical() {
        let a = mapping(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let outcome = compare_checkpoints(&a, &a.clone(), 0.0);
        assert!(outcome.is_identical());

        let r = report(outcome);
        assert_eq!(r.max_diff, 0.0);
        assert_eq!(r.total_params, 9);
        assert_eq!(r.keys.len(), 3);
        assert!(r.keys.iter().all(|k| k.comparison == KeyComparison::Identical));
    }

    #[test]
    fn test_single_value_differs() {
        let delta = 0.125;
        let a = mapping(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = mapping(vec![1.0, 2.0, 3.0 + delta, 4.0, 5.0, 6.0]);

        let outcome = compare_checkpoints(&a, &b, 0.0);
        assert!(!outcome.is_identical());

        let r = report(outcome);
        assert_eq!(r.max_diff, delta);
        assert_eq!(r.ndiffering(), 1);
        assert_eq!(r.median_diff, Some(0.0));
        assert!((r.mean_diff.unwrap() - delta / 9.0).abs() < 1e-15);

        let w = r.keys.iter().find(|k| k.key == "encoder.weight").unwrap();
        assert_eq!(w.comparison, KeyComparison::Differ { max_diff: delta, mean_diff: delta / 6.0, nan_count: 0 });
    }

    #[test]
    fn test_single_ulp_is_different() {
        let x = 1.0f64;
        let next = f64::from_bits(x.to_bits() + 1);
        let a = mapping(vec![x; 6]);
        let b = mapping(vec![x, x, x, x, x, next]);
        assert!(!compare_checkpoints(&a, &b, 0.0).is_identical());
        assert!(compare_checkpoints(&a, &b, 1e-12).is_identical());
    }

    #[test]
    fn test_tolerance() {
        let a = mapping(vec![1.0; 6]);
        let b = mapping(vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.001]);

        let r = report(compare_checkpoints(&a, &b, 0.01));
        assert!(r.is_identical());
        let w = r.keys.iter().find(|k| k.key == "encoder.weight").unwrap();
        assert!(matches!(w.comparison, KeyComparison::WithinTolerance { .. }));

        assert!(!compare_checkpoints(&a, &b, 1e-4).is_identical());
    }

    #[test]
    fn test_key_mismatch() {
        let a = mapping(vec![1.0; 6]);
        let mut b = a.clone();
        b.params.remove("epoch");
        b.params.insert("step".into(), ParamValue::Scalar("7".into()));
        b.params.insert("decoder.bias".into(), tensor(vec![1], vec![0.0]));

        let outcome = compare_checkpoints(&a, &b, 0.0);
        assert_eq!(outcome, CompareOutcome::KeyMismatch {
            only_in_first:  vec!["epoch".into()],
            only_in_second: vec!["decoder.bias".into(), "step".into()],
        });
        assert!(!outcome.is_identical());
    }

    #[test]
    fn test_shape_mismatch_continues() {
        let a = mapping(vec![1.0; 6]);
        let mut b = mapping(vec![1.0; 6]);
        b.params.insert("encoder.bias".into(), tensor(vec![1, 3], vec![0.1, 0.2, 0.3]));
        b.params.insert("epoch".into(), ParamValue::Scalar("101".into()));

        let r = report(compare_checkpoints(&a, &b, 0.0));
        assert_eq!(r.keys.len(), 3);
        assert_eq!(r.ndiffering(), 2);
        assert_eq!(r.total_params, 6);
        assert_eq!(r.max_diff, 0.0);

        let bias = r.keys.iter().find(|k| k.key == "encoder.bias").unwrap();
        assert_eq!(bias.comparison, KeyComparison::ShapeMismatch { lhs: vec![3], rhs: vec![1, 3] });
        assert_eq!(bias.to_string(), "✗ encoder.bias: Different shapes (3,) vs (1, 3)");

        let epoch = r.keys.iter().find(|k| k.key == "epoch").unwrap();
        assert_eq!(epoch.comparison, KeyComparison::ValueMismatch);
    }

    #[test]
    fn test_type_mismatch_and_nan() {
        let a = mapping(vec![1.0; 6]);
        let mut b = mapping(vec![1.0, f64::NAN, 1.0, 1.0, 1.0, 1.0]);
        b.params.insert("epoch".into(), tensor(vec![1], vec![100.0]));

        let r = report(compare_checkpoints(&a, &b, 0.5));
        let w = r.keys.iter().find(|k| k.key == "encoder.weight").unwrap();
        assert_eq!(w.comparison, KeyComparison::Differ { max_diff: 0.0, mean_diff: 0.0, nan_count: 1 });
        assert_eq!(r.total_params, 9);

        let epoch = r.keys.iter().find(|k| k.key == "epoch").unwrap();
        assert!(matches!(epoch.comparison, KeyComparison::TypeMismatch { .. }));
        assert!(!r.is_identical());
    }
}
