use super::Transfer;
use crate::nn::NetError;
use ndarray::{ArrayView1, ArrayViewMut1, Zip};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SigmoidLayer;

impl Transfer for SigmoidLayer {
    fn class_name(&self) -> &'static str {
        "SigmoidLayer"
    }

    fn forward(&self, inbuf: ArrayView1<f64>, outbuf: ArrayViewMut1<f64>, _params: &[f64]) {
        Zip::from(outbuf)
            .and(inbuf)
            .for_each(|o, &x| *o = 1.0 / (1.0 + (-x).exp()));
    }

    // σ'(x) = σ(x)(1 - σ(x))，直接用输出行计算
    fn backward(
        &self,
        outerr: ArrayView1<f64>,
        inerr: ArrayViewMut1<f64>,
        outbuf: ArrayView1<f64>,
        _inbuf: ArrayView1<f64>,
        _params: &[f64],
        _derivs: &mut [f64],
    ) -> Result<(), NetError> {
        Zip::from(inerr)
            .and(outerr)
            .and(outbuf)
            .for_each(|e, &oe, &y| *e = oe * y * (1.0 - y));
        Ok(())
    }
}
