/*
 * @Author       : 老董
 * @Date         : 2026-03-03
 * @Description  : 层（Layer）的具体变换类型
 *
 * 每种类型只负责“单个时间步、一行数据”上的数值变换，
 * 缓冲区管理、时间偏移和参数归属都由外层的 Layer/Network 处理。
 */

mod bias;
mod linear;
mod shift;
mod sigmoid;
mod softmax;
mod step;
mod tanh;

pub use bias::BiasUnit;
pub use linear::LinearLayer;
pub use shift::ShiftLayer;
pub use sigmoid::SigmoidLayer;
pub use softmax::SoftmaxLayer;
pub use step::StepLayer;
pub use tanh::TanhLayer;

use crate::nn::NetError;
use enum_dispatch::enum_dispatch;
use ndarray::{ArrayView1, ArrayViewMut1};
use serde::{Deserialize, Serialize};

#[enum_dispatch]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    LinearLayer(LinearLayer),
    SigmoidLayer(SigmoidLayer),
    TanhLayer(TanhLayer),
    SoftmaxLayer(SoftmaxLayer),
    BiasUnit(BiasUnit),
    StepLayer(StepLayer),
    ShiftLayer(ShiftLayer),
}

#[enum_dispatch(LayerKind)]
pub trait Transfer {
    fn class_name(&self) -> &'static str;

    /// 由构造维度得到 (indim, outdim)
    fn dims(&self, dim: usize) -> (usize, usize) {
        (dim, dim)
    }

    fn paramdim(&self, _dim: usize) -> usize {
        0
    }

    /// 根据输入行计算输出行（输出行在调用前不保证为零，需整体写入）
    fn forward(&self, inbuf: ArrayView1<f64>, outbuf: ArrayViewMut1<f64>, params: &[f64]);

    /// 根据输出误差计算输入误差，并把参数梯度累加进 `derivs`
    fn backward(
        &self,
        _outerr: ArrayView1<f64>,
        _inerr: ArrayViewMut1<f64>,
        _outbuf: ArrayView1<f64>,
        _inbuf: ArrayView1<f64>,
        _params: &[f64],
        _derivs: &mut [f64],
    ) -> Result<(), NetError> {
        Err(NetError::MissingBackward(self.class_name().to_string()))
    }
}
