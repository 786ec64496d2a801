/*
 * @Author       : 老董
 * @Date         : 2026-03-06
 * @Description  : Network 单个时间步的反向传播（BPTT）
 *
 * 反向传播按时间倒序逐步进行。第 t 步时，循环连接把第 t+1 步
 * 目标模块的输入误差传回第 t 步源模块的输出误差，再按拓扑逆序处理各模块。
 */

use super::Network;
use crate::nn::NetError;
use crate::nn::module::{Activatable, TimeStep};
use crate::nn::params::{sub, sub_mut};

impl Network {
    pub(super) fn backward_step(
        &mut self,
        t: usize,
        params: &[f64],
        derivs: &mut [f64],
    ) -> Result<(), NetError> {
        self.ensure_sorted()?;
        if self.kind.is_forgetful() {
            return Err(NetError::ForgetfulBackward(self.name().to_string()));
        }
        if t >= self.max_offset {
            return Err(NetError::BackwardWithoutForward(format!(
                "网络 {} 的时间步 {}（已前向 {} 步）",
                self.name(),
                t,
                self.max_offset
            )));
        }
        self.core.offset = t;
        self.scatter_outerror(t);

        if self.kind.is_recurrent() && t + 1 < self.max_offset {
            for &c in &self.recurrent_order {
                let conn = &self.connections[c.0];
                let range = conn.param_range(&self.groups)?;
                conn.backward(
                    &mut self.modules,
                    t,
                    t + 1,
                    sub(params, range.clone(), &conn.name)?,
                    sub_mut(derivs, range, &conn.name)?,
                )?;
            }
        }

        for &m in self.order.iter().rev() {
            for &c in &self.outgoing[m.0] {
                let conn = &self.connections[c.0];
                let range = conn.param_range(&self.groups)?;
                conn.backward(
                    &mut self.modules,
                    t,
                    t,
                    sub(params, range.clone(), &conn.name)?,
                    sub_mut(derivs, range, &conn.name)?,
                )?;
            }
            let module = &mut self.modules[m.0];
            let range = module.core().params.range(module.name())?;
            let module_params = sub(params, range.clone(), module.name())?;
            let module_derivs = sub_mut(derivs, range, module.name())?;
            module.backward_at(t, module_params, module_derivs)?;
        }

        self.gather_inerror(t);
        Ok(())
    }

    /// 本网络第 t 行输出误差按输出模块顺序切开，覆盖写入各输出模块
    fn scatter_outerror(&mut self, t: usize) {
        let mut index = 0;
        for &m in &self.outmodules {
            let module = &mut self.modules[m.0];
            let dim = module.outdim();
            let src = self.core.buffers.outerror.slice(t, index..index + dim);
            module.core_mut().buffers.outerror.row_mut(t).assign(&src);
            index += dim;
        }
    }

    fn gather_inerror(&mut self, t: usize) {
        let mut index = 0;
        for &m in &self.inmodules {
            let module = &self.modules[m.0];
            let dim = module.indim();
            self.core
                .buffers
                .inerror
                .slice_mut(t, index..index + dim)
                .assign(&module.core().buffers.inerror.row(t));
            index += dim;
        }
    }
}
