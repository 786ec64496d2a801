/*
 * @Author       : 老董
 * @Date         : 2026-03-03
 * @Description  : 叶子模块 Layer：一个具体变换（LayerKind）+ 通用的模块状态
 */

use super::kinds::{
    BiasUnit, LayerKind, LinearLayer, ShiftLayer, SigmoidLayer, SoftmaxLayer, StepLayer,
    TanhLayer, Transfer,
};
use super::{Activatable, ModuleCore, TimeStep};
use crate::nn::NetError;
use crate::nn::buffer::ModuleBuffers;
use crate::nn::params::{DEFAULT_INIT_STD, ParamStore, ParameterVector};
use log::trace;
use ndarray::ArrayView1;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct Layer {
    core: ModuleCore,
    kind: LayerKind,
    /// 已经前向过的时间步数（反向传播只能作用于这些时间步）
    seqlen: usize,
}

impl Layer {
    /// 创建一个层；`name` 为空时，加入网络时会自动命名为 `{类名}_{n}`
    ///
    /// 带参数的层类型用 N(0, 1) 随机初始化参数。
    pub fn new(kind: impl Into<LayerKind>, dim: usize, name: &str) -> Result<Self, NetError> {
        Self::new_with_rng(kind, dim, name, &mut rand::thread_rng())
    }

    pub fn new_with_rng<R: Rng + ?Sized>(
        kind: impl Into<LayerKind>,
        dim: usize,
        name: &str,
        rng: &mut R,
    ) -> Result<Self, NetError> {
        let kind = kind.into();
        let params = ParameterVector::initialize(kind.paramdim(dim), DEFAULT_INIT_STD, rng)?;
        Ok(Self::from_parts(kind, dim, name, params))
    }

    fn from_parts(kind: LayerKind, dim: usize, name: &str, params: ParameterVector) -> Self {
        let (indim, outdim) = kind.dims(dim);
        Self {
            core: ModuleCore::new(name, indim, outdim, params),
            kind,
            seqlen: 0,
        }
    }

    // ========== 无参数层的便捷构造 ==========

    pub fn linear(dim: usize, name: &str) -> Self {
        Self::from_parts(LinearLayer.into(), dim, name, ParameterVector::default())
    }

    pub fn sigmoid(dim: usize, name: &str) -> Self {
        Self::from_parts(SigmoidLayer.into(), dim, name, ParameterVector::default())
    }

    pub fn tanh(dim: usize, name: &str) -> Self {
        Self::from_parts(TanhLayer.into(), dim, name, ParameterVector::default())
    }

    pub fn softmax(dim: usize, name: &str) -> Self {
        Self::from_parts(SoftmaxLayer.into(), dim, name, ParameterVector::default())
    }

    pub fn step(dim: usize, name: &str) -> Self {
        Self::from_parts(StepLayer.into(), dim, name, ParameterVector::default())
    }

    pub fn bias(name: &str) -> Self {
        Self::from_parts(BiasUnit.into(), 1, name, ParameterVector::default())
    }

    /// 平移层，参数初值为 0
    pub fn shift(dim: usize, name: &str) -> Self {
        Self::from_parts(ShiftLayer.into(), dim, name, ParameterVector::zeros(dim))
    }

    // ========== 访问器 ==========

    pub fn kind(&self) -> &LayerKind {
        &self.kind
    }

    /// 自有参数；层已嵌入网络时返回 None（此时请通过网络读取）
    pub fn params(&self) -> Option<&[f64]> {
        self.core.params.owned().map(ParameterVector::params)
    }

    pub fn derivs(&self) -> Option<&[f64]> {
        self.core.params.owned().map(ParameterVector::derivs)
    }

    pub fn set_parameters(&mut self, values: &[f64]) -> Result<(), NetError> {
        let name = self.core.name.clone();
        self.core
            .params
            .owned_mut()
            .ok_or_else(|| embedded(&name))?
            .set_parameters(values)
    }

    pub fn reset_derivatives(&mut self) -> Result<(), NetError> {
        let name = self.core.name.clone();
        self.core
            .params
            .owned_mut()
            .ok_or_else(|| embedded(&name))?
            .reset_derivatives();
        Ok(())
    }

    /// 声明一个与标准缓冲区同步扩容/清零的额外缓冲区
    pub fn declare_buffer(&mut self, name: &str, dim: usize) {
        self.core.buffers.declare(name, dim);
    }
}

fn embedded(name: &str) -> NetError {
    NetError::OwnershipViolation(format!(
        "{} 已嵌入网络，其参数只能通过所在网络读写",
        name
    ))
}

impl Activatable for Layer {
    fn core(&self) -> &ModuleCore {
        &self.core
    }

    /// 单独使用的层没有时间维度：每次都在当前偏移处计算
    fn activate(&mut self, input: &[f64]) -> Result<Vec<f64>, NetError> {
        if input.len() != self.core.indim {
            return Err(NetError::DimensionMismatch {
                expected: self.core.indim,
                got: input.len(),
                message: format!("{} 的输入长度不符", self.core.name),
            });
        }
        let t = self.core.offset;
        self.core.ensure_capacity(t);
        self.core
            .buffers
            .input
            .row_mut(t)
            .assign(&ArrayView1::from(input));

        let name = self.core.name.clone();
        let store = self.core.params.take_owned(&name)?;
        let result = self.forward_at(t, store.params());
        self.core.params = ParamStore::Owned(store);
        result?;

        Ok(self.core.buffers.output.row(t).to_vec())
    }

    fn back_activate(&mut self, outerr: &[f64]) -> Result<Vec<f64>, NetError> {
        if outerr.len() != self.core.outdim {
            return Err(NetError::DimensionMismatch {
                expected: self.core.outdim,
                got: outerr.len(),
                message: format!("{} 的输出误差长度不符", self.core.name),
            });
        }
        let t = self.core.offset;
        if t >= self.seqlen {
            return Err(NetError::BackwardWithoutForward(self.core.name.clone()));
        }
        self.core
            .buffers
            .outerror
            .row_mut(t)
            .assign(&ArrayView1::from(outerr));

        let name = self.core.name.clone();
        let mut store = self.core.params.take_owned(&name)?;
        let result = {
            let (params, derivs) = store.split_mut();
            self.backward_at(t, params, derivs)
        };
        self.core.params = ParamStore::Owned(store);
        result?;

        Ok(self.core.buffers.inerror.row(t).to_vec())
    }

    fn reset(&mut self) {
        self.core.buffers.zero();
        self.core.offset = 0;
        self.seqlen = 0;
    }

    fn grow_buffers(&mut self) {
        self.core.buffers.grow();
    }

    fn reset_buffers(&mut self, rows: usize) {
        self.core.buffers.resize(rows);
        self.core.offset = 0;
        self.seqlen = 0;
    }
}

impl TimeStep for Layer {
    fn core_mut(&mut self) -> &mut ModuleCore {
        &mut self.core
    }

    fn forward_at(&mut self, t: usize, params: &[f64]) -> Result<(), NetError> {
        if self.core.ensure_capacity(t) {
            trace!(
                "层 {} 的缓冲区扩容至 {} 行",
                self.core.name,
                self.core.buffers.capacity()
            );
        }
        self.core.offset = t;
        let ModuleBuffers { input, output, .. } = &mut self.core.buffers;
        self.kind.forward(input.row(t), output.row_mut(t), params);
        self.seqlen = self.seqlen.max(t + 1);
        Ok(())
    }

    fn backward_at(&mut self, t: usize, params: &[f64], derivs: &mut [f64]) -> Result<(), NetError> {
        if t >= self.seqlen {
            return Err(NetError::BackwardWithoutForward(format!(
                "{}（时间步 {}）",
                self.core.name, t
            )));
        }
        self.core.offset = t;
        let ModuleBuffers {
            input,
            output,
            inerror,
            outerror,
            ..
        } = &mut self.core.buffers;
        self.kind
            .backward(
                outerror.row(t),
                inerror.row_mut(t),
                output.row(t),
                input.row(t),
                params,
                derivs,
            )
            .map_err(|e| match e {
                NetError::MissingBackward(class) => {
                    NetError::MissingBackward(format!("{}（{}）", self.core.name, class))
                }
                other => other,
            })
    }

    fn shift_buffers(&mut self) {
        self.core.buffers.shift_left();
    }
}
