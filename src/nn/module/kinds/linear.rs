use super::Transfer;
use crate::nn::NetError;
use ndarray::{ArrayView1, ArrayViewMut1};
use serde::{Deserialize, Serialize};

/// 恒等变换：输出 = 输入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinearLayer;

impl Transfer for LinearLayer {
    fn class_name(&self) -> &'static str {
        "LinearLayer"
    }

    fn forward(&self, inbuf: ArrayView1<f64>, mut outbuf: ArrayViewMut1<f64>, _params: &[f64]) {
        outbuf.assign(&inbuf);
    }

    fn backward(
        &self,
        outerr: ArrayView1<f64>,
        mut inerr: ArrayViewMut1<f64>,
        _outbuf: ArrayView1<f64>,
        _inbuf: ArrayView1<f64>,
        _params: &[f64],
        _derivs: &mut [f64],
    ) -> Result<(), NetError> {
        inerr.assign(&outerr);
        Ok(())
    }
}
