use super::Transfer;
use ndarray::{ArrayView1, ArrayViewMut1, Zip};
use serde::{Deserialize, Serialize};

/// 阶跃层：x > 0 输出 1，否则输出 0。不可导，因此没有反向传播
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepLayer;

impl Transfer for StepLayer {
    fn class_name(&self) -> &'static str {
        "StepLayer"
    }

    fn forward(&self, inbuf: ArrayView1<f64>, outbuf: ArrayViewMut1<f64>, _params: &[f64]) {
        Zip::from(outbuf)
            .and(inbuf)
            .for_each(|o, &x| *o = if x > 0.0 { 1.0 } else { 0.0 });
    }
}
