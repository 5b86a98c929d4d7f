use crate::bridge::{self, Bindings, ForeignValue, RuntimeHandle};
use crate::config::clamp_points;
use crate::error::RuntimeError;
use rand::Rng;
use serde::{Deserialize, Serialize};

const PYTHON_SNIPPET: &str = r#"
import numpy as np
import pandas as pd
x = np.random.normal(0.0, 1.0, int(n))
y = 2.0 * x + np.random.normal(0.0, 0.5, int(n))
df = pd.DataFrame({"x": x, "y": y})
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetSource {
    Native,
    Python,
}

impl DatasetSource {
    pub fn label(&self) -> &'static str {
        match self {
            DatasetSource::Native => "Rust Generated Data",
            DatasetSource::Python => "Python Generated Data",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            DatasetSource::Native => DatasetSource::Python,
            DatasetSource::Python => DatasetSource::Native,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub source: DatasetSource,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn points(&self) -> Vec<(f64, f64)> {
        self.x.iter().copied().zip(self.y.iter().copied()).collect()
    }

    /// (x_min, x_max, y_min, y_max)，空数据时给出单位区间
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        fn range(values: &[f64]) -> (f64, f64) {
            let (lo, hi) = values
                .iter()
                .filter(|v| v.is_finite())
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });
            if lo > hi {
                (-1.0, 1.0)
            } else if lo == hi {
                (lo - 1.0, hi + 1.0)
            } else {
                (lo, hi)
            }
        }
        let (x0, x1) = range(&self.x);
        let (y0, y1) = range(&self.y);
        (x0, x1, y0, y1)
    }
}

/// 按数据源生成 n 个点（n 限制在 50–500）
pub fn generate(
    source: DatasetSource,
    n: u32,
    handle: &RuntimeHandle,
) -> Result<Dataset, RuntimeError> {
    let n = clamp_points(n);
    match source {
        DatasetSource::Native => Ok(generate_native(n as usize, &mut rand::thread_rng())),
        DatasetSource::Python => generate_python(n, handle),
    }
}

/// x ~ N(0, 1)，y = 2x + N(0, 0.5)
pub fn generate_native<R: Rng>(n: usize, rng: &mut R) -> Dataset {
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    for _ in 0..n {
        let xi = normal(rng, 0.0, 1.0);
        x.push(xi);
        y.push(2.0 * xi + normal(rng, 0.0, 0.5));
    }
    Dataset {
        x,
        y,
        source: DatasetSource::Native,
    }
}

/// Box-Muller
fn normal<R: Rng>(rng: &mut R, mean: f64, sd: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + sd * z
}

pub fn generate_python(n: u32, handle: &RuntimeHandle) -> Result<Dataset, RuntimeError> {
    let mut bindings = Bindings::new();
    bindings.insert("n".to_string(), ForeignValue::Int(i64::from(n)));
    let frame = bridge::run(handle, PYTHON_SNIPPET, &bindings, Some("df"))?;
    dataset_from_frame(&frame)
}

/// DataFrame 转换结果 `{"x": [...], "y": [...]}` → Dataset
pub fn dataset_from_frame(frame: &ForeignValue) -> Result<Dataset, RuntimeError> {
    let x = frame.numeric_column("x")?;
    let y = frame.numeric_column("y")?;
    if x.len() != y.len() {
        return Err(RuntimeError::MarshalFailure(format!(
            "column lengths differ: x={} y={}",
            x.len(),
            y.len()
        )));
    }
    Ok(Dataset {
        x,
        y,
        source: DatasetSource::Python,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PythonConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn native_dataset_has_requested_rows() {
        let mut rng = StdRng::seed_from_u64(7);
        let data = generate_native(200, &mut rng);
        assert_eq!(data.len(), 200);
        assert_eq!(data.y.len(), 200);
        assert!(data.x.iter().chain(data.y.iter()).all(|v| v.is_finite()));
    }

    #[test]
    fn native_dataset_is_reproducible_with_seed() {
        let a = generate_native(50, &mut StdRng::seed_from_u64(1));
        let b = generate_native(50, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn generate_clamps_point_count() {
        let handle = RuntimeHandle::unavailable();
        let data = generate(DatasetSource::Native, 10_000, &handle).unwrap();
        assert_eq!(data.len(), 500);
        let data = generate(DatasetSource::Native, 3, &handle).unwrap();
        assert_eq!(data.len(), 50);
    }

    #[test]
    fn python_source_without_runtime_is_an_error() {
        let handle = RuntimeHandle::unavailable();
        assert!(matches!(
            generate(DatasetSource::Python, 200, &handle),
            Err(RuntimeError::RuntimeUnavailable(_))
        ));
    }

    #[test]
    fn frame_columns_become_dataset() {
        let frame = ForeignValue::from_json(json!({"x": [0.0, 1.0], "y": [0.5, 2.5]})).unwrap();
        let data = dataset_from_frame(&frame).unwrap();
        assert_eq!(data.points(), vec![(0.0, 0.5), (1.0, 2.5)]);
        assert_eq!(data.source, DatasetSource::Python);
    }

    #[test]
    fn ragged_frame_is_rejected() {
        let frame = ForeignValue::from_json(json!({"x": [0.0, 1.0], "y": [0.5]})).unwrap();
        assert!(matches!(
            dataset_from_frame(&frame),
            Err(RuntimeError::MarshalFailure(_))
        ));
    }

    #[test]
    fn bounds_handle_degenerate_data() {
        let empty = Dataset {
            x: vec![],
            y: vec![],
            source: DatasetSource::Native,
        };
        assert_eq!(empty.bounds(), (-1.0, 1.0, -1.0, 1.0));
        let flat = Dataset {
            x: vec![2.0, 2.0],
            y: vec![0.0, 4.0],
            source: DatasetSource::Native,
        };
        assert_eq!(flat.bounds(), (1.0, 3.0, 0.0, 4.0));
    }

    #[test]
    fn live_python_dataset_has_x_and_y() {
        let handle = RuntimeHandle::initialize(&PythonConfig::default());
        match generate(DatasetSource::Python, 200, &handle) {
            Ok(data) => {
                assert_eq!(data.len(), 200);
                assert_eq!(data.y.len(), 200);
            }
            // 本机没有 Python 或没有 numpy/pandas
            Err(RuntimeError::RuntimeUnavailable(_)) | Err(RuntimeError::ModuleNotFound { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}
