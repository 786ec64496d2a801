use super::Transfer;
use crate::nn::NetError;
use ndarray::{ArrayView1, ArrayViewMut1, Zip};
use serde::{Deserialize, Serialize};

/// 带参数的平移层：out = in + b，b 的维度与层维度相同
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShiftLayer;

impl Transfer for ShiftLayer {
    fn class_name(&self) -> &'static str {
        "ShiftLayer"
    }

    fn paramdim(&self, dim: usize) -> usize {
        dim
    }

    fn forward(&self, inbuf: ArrayView1<f64>, outbuf: ArrayViewMut1<f64>, params: &[f64]) {
        Zip::from(outbuf)
            .and(inbuf)
            .and(ArrayView1::from(params))
            .for_each(|o, &x, &b| *o = x + b);
    }

    fn backward(
        &self,
        outerr: ArrayView1<f64>,
        mut inerr: ArrayViewMut1<f64>,
        _outbuf: ArrayView1<f64>,
        _inbuf: ArrayView1<f64>,
        _params: &[f64],
        derivs: &mut [f64],
    ) -> Result<(), NetError> {
        inerr.assign(&outerr);
        for (d, &e) in derivs.iter_mut().zip(outerr.iter()) {
            *d += e;
        }
        Ok(())
    }
}
