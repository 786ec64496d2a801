/*
 * @Author       : 老董
 * @Date         : 2026-03-06
 * @Description  : Network 单个时间步的前向传播与缓冲区管理（TimeStep 实现）
 */

use super::Network;
use crate::nn::NetError;
use crate::nn::module::{Activatable, ModuleCore, TimeStep};
use crate::nn::params::sub;
use log::trace;

impl Network {
    /// 扩容直到第 t 行可用（本网络与所有后代同步扩容）
    pub(crate) fn ensure_capacity(&mut self, t: usize) {
        while self.core.buffers.capacity() <= t {
            self.grow_buffers();
            trace!(
                "网络 {} 的缓冲区扩容至 {} 行",
                self.name(),
                self.core.buffers.capacity()
            );
        }
    }

    /// 把本网络输入缓冲区第 t 行按输入模块顺序切开，覆盖写入各输入模块
    fn scatter_input(&mut self, t: usize) {
        let mut index = 0;
        for &m in &self.inmodules {
            let module = &mut self.modules[m.0];
            let dim = module.indim();
            let src = self.core.buffers.input.slice(t, index..index + dim);
            module.core_mut().buffers.input.row_mut(t).assign(&src);
            index += dim;
        }
    }

    /// 按输出模块顺序把各输出模块第 t 行的输出拼接到本网络输出缓冲区
    fn gather_output(&mut self, t: usize) {
        let mut index = 0;
        for &m in &self.outmodules {
            let module = &self.modules[m.0];
            let dim = module.outdim();
            self.core
                .buffers
                .output
                .slice_mut(t, index..index + dim)
                .assign(&module.core().buffers.output.row(t));
            index += dim;
        }
    }
}

impl TimeStep for Network {
    fn core_mut(&mut self) -> &mut ModuleCore {
        &mut self.core
    }

    /// 第 t 个时间步的前向传播
    ///
    /// 顺序：分发输入 → 循环连接（t-1 → t）→ 按拓扑序依次激活模块及其出边 → 汇总输出。
    fn forward_at(&mut self, t: usize, params: &[f64]) -> Result<(), NetError> {
        self.ensure_sorted()?;
        self.ensure_capacity(t);
        self.core.offset = t;
        self.scatter_input(t);

        if t > 0 && self.kind.is_recurrent() {
            for &c in &self.recurrent_order {
                let conn = &self.connections[c.0];
                let range = conn.param_range(&self.groups)?;
                conn.forward(&mut self.modules, t - 1, t, sub(params, range, &conn.name)?)?;
            }
        }

        for &m in &self.order {
            let module = &mut self.modules[m.0];
            let range = module.core().params.range(module.name())?;
            let module_params = sub(params, range, module.name())?;
            module.forward_at(t, module_params)?;
            for &c in &self.outgoing[m.0] {
                let conn = &self.connections[c.0];
                let range = conn.param_range(&self.groups)?;
                conn.forward(&mut self.modules, t, t, sub(params, range, &conn.name)?)?;
            }
        }

        self.gather_output(t);
        self.max_offset = self.max_offset.max(t + 1);
        Ok(())
    }

    fn backward_at(&mut self, t: usize, params: &[f64], derivs: &mut [f64]) -> Result<(), NetError> {
        self.backward_step(t, params, derivs)
    }

    fn shift_buffers(&mut self) {
        self.core.buffers.shift_left();
        for module in &mut self.modules {
            module.shift_buffers();
        }
    }
}
