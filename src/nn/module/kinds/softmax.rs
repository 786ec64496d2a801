use super::Transfer;
use crate::nn::NetError;
use ndarray::{ArrayView1, ArrayViewMut1};
use serde::{Deserialize, Serialize};

/// Softmax 输出层
///
/// 反向时把输出误差原样传回输入，即假定它与交叉熵损失配合使用
/// （此时 ∂L/∂x = y - t，正好就是外部给出的输出误差）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SoftmaxLayer;

impl Transfer for SoftmaxLayer {
    fn class_name(&self) -> &'static str {
        "SoftmaxLayer"
    }

    fn forward(&self, inbuf: ArrayView1<f64>, mut outbuf: ArrayViewMut1<f64>, _params: &[f64]) {
        let max = inbuf.fold(f64::NEG_INFINITY, |acc, &x| acc.max(x));
        let exps = inbuf.mapv(|x| (x - max).exp());
        let sum = exps.sum();
        outbuf.assign(&(exps / sum));
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
