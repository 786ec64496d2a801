/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : 连接的具体变换类型
 *
 * 连接的前向/反向都是“累加”语义：多条连接汇入同一模块时，
 * 目标输入缓冲区（或源输出误差缓冲区）中的贡献相加。
 */

use crate::nn::NetError;
use enum_dispatch::enum_dispatch;
use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Axis, s};
use serde::{Deserialize, Serialize};

#[enum_dispatch]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionKind {
    IdentityConnection(IdentityConnection),
    FullConnection(FullConnection),
    LinearConnection(LinearConnection),
    SubsamplingConnection(SubsamplingConnection),
}

#[enum_dispatch(ConnectionKind)]
pub trait Transform {
    fn class_name(&self) -> &'static str;

    fn paramdim(&self, indim: usize, outdim: usize) -> usize;

    /// 检查（切片后的）两端维度是否适用于该连接类型，不适用时返回原因
    fn check_dims(&self, _indim: usize, _outdim: usize) -> Result<(), String> {
        Ok(())
    }

    /// outbuf += f(inbuf)
    fn forward(
        &self,
        inbuf: ArrayView1<f64>,
        outbuf: ArrayViewMut1<f64>,
        params: &[f64],
    ) -> Result<(), NetError>;

    /// inerr += f'(outerr)，derivs += ∂/∂params
    fn backward(
        &self,
        outerr: ArrayView1<f64>,
        inerr: ArrayViewMut1<f64>,
        inbuf: ArrayView1<f64>,
        params: &[f64],
        derivs: &mut [f64],
    ) -> Result<(), NetError>;
}

fn equal_dims(indim: usize, outdim: usize) -> Result<(), String> {
    if indim == outdim {
        Ok(())
    } else {
        Err(format!("输入维度 {} 与输出维度 {} 必须相同", indim, outdim))
    }
}

fn shape_error(expected: usize, got: usize) -> NetError {
    NetError::DimensionMismatch {
        expected,
        got,
        message: "连接参数长度与权重矩阵形状不一致".to_string(),
    }
}

// ========== IdentityConnection ==========

/// 恒等连接：out += in，无参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdentityConnection;

impl Transform for IdentityConnection {
    fn class_name(&self) -> &'static str {
        "IdentityConnection"
    }

    fn paramdim(&self, _indim: usize, _outdim: usize) -> usize {
        0
    }

    fn check_dims(&self, indim: usize, outdim: usize) -> Result<(), String> {
        equal_dims(indim, outdim)
    }

    fn forward(
        &self,
        inbuf: ArrayView1<f64>,
        mut outbuf: ArrayViewMut1<f64>,
        _params: &[f64],
    ) -> Result<(), NetError> {
        outbuf += &inbuf;
        Ok(())
    }

    fn backward(
        &self,
        outerr: ArrayView1<f64>,
        mut inerr: ArrayViewMut1<f64>,
        _inbuf: ArrayView1<f64>,
        _params: &[f64],
        _derivs: &mut [f64],
    ) -> Result<(), NetError> {
        inerr += &outerr;
        Ok(())
    }
}

// ========== FullConnection ==========

/// 全连接：out += W·in，W 为 outdim × indim，按行优先存放在参数中
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FullConnection;

impl Transform for FullConnection {
    fn class_name(&self) -> &'static str {
        "FullConnection"
    }

    fn paramdim(&self, indim: usize, outdim: usize) -> usize {
        indim * outdim
    }

    fn forward(
        &self,
        inbuf: ArrayView1<f64>,
        mut outbuf: ArrayViewMut1<f64>,
        params: &[f64],
    ) -> Result<(), NetError> {
        let shape = (outbuf.len(), inbuf.len());
        let weights = ArrayView2::from_shape(shape, params)
            .map_err(|_| shape_error(shape.0 * shape.1, params.len()))?;
        outbuf += &weights.dot(&inbuf);
        Ok(())
    }

    fn backward(
        &self,
        outerr: ArrayView1<f64>,
        mut inerr: ArrayViewMut1<f64>,
        inbuf: ArrayView1<f64>,
        params: &[f64],
        derivs: &mut [f64],
    ) -> Result<(), NetError> {
        let shape = (outerr.len(), inbuf.len());
        let expected = shape.0 * shape.1;
        let weights = ArrayView2::from_shape(shape, params)
            .map_err(|_| shape_error(expected, params.len()))?;
        inerr += &weights.t().dot(&outerr);

        let got = derivs.len();
        let mut grads =
            ArrayViewMut2::from_shape(shape, derivs).map_err(|_| shape_error(expected, got))?;
        let column = outerr.insert_axis(Axis(1));
        let row = inbuf.insert_axis(Axis(0));
        grads += &column.dot(&row);
        Ok(())
    }
}

// ========== LinearConnection ==========

/// 逐元素加权：out_i += w_i · in_i
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinearConnection;

impl Transform for LinearConnection {
    fn class_name(&self) -> &'static str {
        "LinearConnection"
    }

    fn paramdim(&self, indim: usize, _outdim: usize) -> usize {
        indim
    }

    fn check_dims(&self, indim: usize, outdim: usize) -> Result<(), String> {
        equal_dims(indim, outdim)
    }

    fn forward(
        &self,
        inbuf: ArrayView1<f64>,
        mut outbuf: ArrayViewMut1<f64>,
        params: &[f64],
    ) -> Result<(), NetError> {
        if params.len() != inbuf.len() {
            return Err(shape_error(inbuf.len(), params.len()));
        }
        outbuf += &(&inbuf * &ArrayView1::from(params));
        Ok(())
    }

    fn backward(
        &self,
        outerr: ArrayView1<f64>,
        mut inerr: ArrayViewMut1<f64>,
        inbuf: ArrayView1<f64>,
        params: &[f64],
        derivs: &mut [f64],
    ) -> Result<(), NetError> {
        if params.len() != inbuf.len() || derivs.len() != inbuf.len() {
            return Err(shape_error(inbuf.len(), params.len().min(derivs.len())));
        }
        inerr += &(&outerr * &ArrayView1::from(params));
        let mut grads = ArrayViewMut1::from(derivs);
        grads += &(&outerr * &inbuf);
        Ok(())
    }
}

// ========== SubsamplingConnection ==========

/// 降采样：输入按 outdim 等分成块，out_i += w_i · mean(块 i)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubsamplingConnection;

impl Transform for SubsamplingConnection {
    fn class_name(&self) -> &'static str {
        "SubsamplingConnection"
    }

    fn paramdim(&self, _indim: usize, outdim: usize) -> usize {
        outdim
    }

    fn check_dims(&self, indim: usize, outdim: usize) -> Result<(), String> {
        if outdim == 0 || indim % outdim != 0 {
            return Err(format!(
                "输入维度 {} 必须是输出维度 {} 的正整数倍",
                indim, outdim
            ));
        }
        Ok(())
    }

    fn forward(
        &self,
        inbuf: ArrayView1<f64>,
        mut outbuf: ArrayViewMut1<f64>,
        params: &[f64],
    ) -> Result<(), NetError> {
        let outdim = outbuf.len();
        if params.len() != outdim || outdim == 0 {
            return Err(shape_error(outdim, params.len()));
        }
        let block = inbuf.len() / outdim;
        for (i, (o, &w)) in outbuf.iter_mut().zip(params).enumerate() {
            let mean = inbuf
                .slice(s![i * block..(i + 1) * block])
                .mean()
                .unwrap_or(0.0);
            *o += w * mean;
        }
        Ok(())
    }

    fn backward(
        &self,
        outerr: ArrayView1<f64>,
        mut inerr: ArrayViewMut1<f64>,
        inbuf: ArrayView1<f64>,
        params: &[f64],
        derivs: &mut [f64],
    ) -> Result<(), NetError> {
        let outdim = outerr.len();
        if params.len() != outdim || derivs.len() != outdim || outdim == 0 {
            return Err(shape_error(outdim, params.len()));
        }
        let block = inbuf.len() / outdim;
        for i in 0..outdim {
            let range = i * block..(i + 1) * block;
            let mean = inbuf.slice(s![range.clone()]).mean().unwrap_or(0.0);
            derivs[i] += outerr[i] * mean;
            let share = params[i] * outerr[i] / block as f64;
            inerr.slice_mut(s![range]).iter_mut().for_each(|e| *e += share);
        }
        Ok(())
    }
}
