use super::Transfer;
use crate::nn::NetError;
use ndarray::{ArrayView1, ArrayViewMut1};
use serde::{Deserialize, Serialize};

/// 偏置单元：没有输入，恒输出 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BiasUnit;

impl Transfer for BiasUnit {
    fn class_name(&self) -> &'static str {
        "BiasUnit"
    }

    fn dims(&self, _dim: usize) -> (usize, usize) {
        (0, 1)
    }

    fn forward(&self, _inbuf: ArrayView1<f64>, mut outbuf: ArrayViewMut1<f64>, _params: &[f64]) {
        outbuf.fill(1.0);
    }

    fn backward(
        &self,
        _outerr: ArrayView1<f64>,
        _inerr: ArrayViewMut1<f64>,
        _outbuf: ArrayView1<f64>,
        _inbuf: ArrayView1<f64>,
        _params: &[f64],
        _derivs: &mut [f64],
    ) -> Result<(), NetError> {
        Ok(())
    }
}
