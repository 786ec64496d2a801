/*
 * @Author       : 老董
 * @Date         : 2026-03-06
 * @Description  : Network 对外的激活接口：前馈、循环、遗忘三种时间语义
 */

use super::{Network, NetworkKind};
use crate::nn::NetError;
use crate::nn::module::{Activatable, ModuleCore, TimeStep};
use crate::nn::params::ParamStore;
use ndarray::ArrayView1;

impl Network {
    /// 以本网络自有的扁平参数数组驱动 `f`；已嵌入的网络没有自有参数，返回所有权错误
    fn with_own_params<R>(
        &mut self,
        f: impl FnOnce(&mut Self, &[f64], &mut [f64]) -> Result<R, NetError>,
    ) -> Result<R, NetError> {
        let name = self.core.name.clone();
        let mut store = self.core.params.take_owned(&name)?;
        let result = {
            let (params, derivs) = store.split_mut();
            f(self, params, derivs)
        };
        self.core.params = ParamStore::Owned(store);
        result
    }

    fn step_forward(&mut self, t: usize, input: &[f64]) -> Result<(), NetError> {
        self.ensure_capacity(t);
        self.core
            .buffers
            .input
            .row_mut(t)
            .assign(&ArrayView1::from(input));
        self.with_own_params(|net, params, _| net.forward_at(t, params))
    }
}

impl Activatable for Network {
    fn core(&self) -> &ModuleCore {
        &self.core
    }

    /// - 前馈网络：先 reset，再在第 0 个时间步计算
    /// - 循环网络：在当前时间步计算，然后时间步加一
    /// - 遗忘模式：第一次用第 0 步，之后总在第 1 步计算再整体前移，结果始终位于第 0 行
    fn activate(&mut self, input: &[f64]) -> Result<Vec<f64>, NetError> {
        self.ensure_sorted()?;
        if input.len() != self.core.indim {
            return Err(NetError::DimensionMismatch {
                expected: self.core.indim,
                got: input.len(),
                message: format!("网络 {} 的输入长度不符", self.name()),
            });
        }

        let row = match self.kind {
            NetworkKind::FeedForward => {
                self.reset();
                self.step_forward(0, input)?;
                self.time = 1;
                0
            }
            NetworkKind::Recurrent { forget: false } => {
                let t = self.time;
                self.step_forward(t, input)?;
                self.time = t + 1;
                t
            }
            NetworkKind::Recurrent { forget: true } => {
                if self.time == 0 {
                    self.step_forward(0, input)?;
                    self.time = 1;
                } else {
                    self.step_forward(1, input)?;
                    self.shift_buffers();
                }
                0
            }
        };
        Ok(self.core.buffers.output.row(row).to_vec())
    }

    /// 对最近一个尚未反向的时间步做反向传播（时间步减一），返回该步的输入误差
    fn back_activate(&mut self, outerr: &[f64]) -> Result<Vec<f64>, NetError> {
        self.ensure_sorted()?;
        if self.kind.is_forgetful() {
            return Err(NetError::ForgetfulBackward(self.name().to_string()));
        }
        if outerr.len() != self.core.outdim {
            return Err(NetError::DimensionMismatch {
                expected: self.core.outdim,
                got: outerr.len(),
                message: format!("网络 {} 的输出误差长度不符", self.name()),
            });
        }
        if self.time == 0 {
            return Err(NetError::BackwardWithoutForward(self.name().to_string()));
        }

        let t = self.time - 1;
        self.core
            .buffers
            .outerror
            .row_mut(t)
            .assign(&ArrayView1::from(outerr));
        self.with_own_params(|net, params, derivs| net.backward_at(t, params, derivs))?;
        self.time = t;
        Ok(self.core.buffers.inerror.row(t).to_vec())
    }

    fn reset(&mut self) {
        self.core.buffers.zero();
        self.core.offset = 0;
        for module in &mut self.modules {
            module.reset();
        }
        self.time = 0;
        self.max_offset = 0;
    }

    fn grow_buffers(&mut self) {
        self.core.buffers.grow();
        for module in &mut self.modules {
            module.grow_buffers();
        }
    }

    fn reset_buffers(&mut self, rows: usize) {
        self.core.buffers.resize(rows);
        self.core.offset = 0;
        for module in &mut self.modules {
            module.reset_buffers(rows);
        }
        self.time = 0;
        self.max_offset = 0;
    }
}
