/*
 * @Author       : 老董
 * @Date         : 2026-03-07
 * @Description  : Network 参数与导数的读写
 *
 * 只有最外层网络持有扁平数组，因此整体读写（params/derivs/set_parameters…）
 * 只对最外层网络有效；各组件的切片读写需要网络已排序。
 */

use super::{ConnectionId, GroupId, ModuleId, Network, ParamSlot};
use crate::nn::NetError;
use crate::nn::module::Activatable;
use crate::nn::params::{ParameterVector, sub, sub_mut};
use std::ops::Range;

impl Network {
    // ========== 整体 ==========

    fn own_vector(&self) -> Result<&ParameterVector, NetError> {
        self.core.params.owned().ok_or_else(|| self.embedded_error())
    }

    fn own_vector_mut(&mut self) -> Result<&mut ParameterVector, NetError> {
        let err = self.embedded_error();
        self.core.params.owned_mut().ok_or(err)
    }

    fn embedded_error(&self) -> NetError {
        NetError::OwnershipViolation(format!(
            "网络 {} 已嵌入其他网络，参数由最外层网络持有",
            self.name()
        ))
    }

    /// 扁平参数数组（排序前为空）
    pub fn params(&self) -> Result<&[f64], NetError> {
        Ok(self.own_vector()?.params())
    }

    /// 可写的扁平参数数组；对它的修改会直接体现在各组件的参数切片上
    pub fn params_mut(&mut self) -> Result<&mut [f64], NetError> {
        Ok(self.own_vector_mut()?.params_mut())
    }

    pub fn derivs(&self) -> Result<&[f64], NetError> {
        Ok(self.own_vector()?.derivs())
    }

    pub fn set_parameters(&mut self, values: &[f64]) -> Result<(), NetError> {
        self.ensure_sorted()?;
        self.own_vector_mut()?.set_parameters(values)
    }

    /// 导数清零（每轮训练开始前调用）
    pub fn reset_derivatives(&mut self) -> Result<(), NetError> {
        self.own_vector_mut()?.reset_derivatives();
        Ok(())
    }

    /// 在全部参数上叠加 N(0, std_dev²) 噪声
    pub fn mutate(&mut self, std_dev: f64) -> Result<(), NetError> {
        self.ensure_sorted()?;
        let mut rng = self.rng.take();
        let result = self.own_vector_mut().and_then(|pv| match rng.as_mut() {
            Some(rng) => pv.mutate(std_dev, rng),
            None => pv.mutate(std_dev, &mut rand::thread_rng()),
        });
        self.rng = rng;
        result
    }

    /// 以 N(0, std_dev²) 重新采样全部参数
    pub fn randomize(&mut self, std_dev: f64) -> Result<(), NetError> {
        self.ensure_sorted()?;
        let mut rng = self.rng.take();
        let result = self.own_vector_mut().and_then(|pv| match rng.as_mut() {
            Some(rng) => pv.randomize(std_dev, rng),
            None => pv.randomize(std_dev, &mut rand::thread_rng()),
        });
        self.rng = rng;
        result
    }

    /// 扁平数组的布局：`(组件, 区间)`，组件形如 `module:名称`、`connection:名称`、`group:名称`
    pub fn param_layout(&self) -> Result<Vec<(String, Range<usize>)>, NetError> {
        self.ensure_sorted()?;
        self.param_slots()
            .into_iter()
            .filter(|&slot| self.slot_store(slot).is_some_and(|s| s.paramdim() > 0))
            .map(|slot| Ok((self.slot_name(slot), self.slot_range(slot)?)))
            .collect()
    }

    // ========== 组件切片 ==========

    fn read_slot(&self, slot: ParamSlot) -> Result<&[f64], NetError> {
        self.ensure_sorted()?;
        let range = self.slot_range(slot)?;
        sub(self.params()?, range, &self.slot_name(slot))
    }

    fn read_slot_derivs(&self, slot: ParamSlot) -> Result<&[f64], NetError> {
        self.ensure_sorted()?;
        let range = self.slot_range(slot)?;
        sub(self.derivs()?, range, &self.slot_name(slot))
    }

    fn write_slot(&mut self, slot: ParamSlot) -> Result<&mut [f64], NetError> {
        self.ensure_sorted()?;
        let range = self.slot_range(slot)?;
        let name = self.slot_name(slot);
        sub_mut(self.params_mut()?, range, &name)
    }

    /// 模块（层或子网络整体）的参数切片
    pub fn module_params(&self, id: ModuleId) -> Result<&[f64], NetError> {
        self.module(id)?;
        self.read_slot(ParamSlot::Module(id))
    }

    pub fn module_params_mut(&mut self, id: ModuleId) -> Result<&mut [f64], NetError> {
        self.module(id)?;
        self.write_slot(ParamSlot::Module(id))
    }

    pub fn module_derivs(&self, id: ModuleId) -> Result<&[f64], NetError> {
        self.module(id)?;
        self.read_slot_derivs(ParamSlot::Module(id))
    }

    /// 连接的参数切片；成员连接返回其共享参数组的切片
    pub fn connection_params(&self, id: ConnectionId) -> Result<&[f64], NetError> {
        match self.connection(id)?.shared_group() {
            Some(group) => self.read_slot(ParamSlot::Group(group)),
            None => self.read_slot(ParamSlot::Connection(id)),
        }
    }

    /// 成员连接不拥有参数，必须通过共享参数组修改
    pub fn connection_params_mut(&mut self, id: ConnectionId) -> Result<&mut [f64], NetError> {
        let conn = self.connection(id)?;
        if let Some(group) = conn.shared_group() {
            return Err(NetError::OwnershipViolation(format!(
                "连接 {} 的参数属于共享参数组 {}，只能通过参数组修改",
                conn.name(),
                self.group(group)?.name()
            )));
        }
        self.write_slot(ParamSlot::Connection(id))
    }

    pub fn connection_derivs(&self, id: ConnectionId) -> Result<&[f64], NetError> {
        match self.connection(id)?.shared_group() {
            Some(group) => self.read_slot_derivs(ParamSlot::Group(group)),
            None => self.read_slot_derivs(ParamSlot::Connection(id)),
        }
    }

    pub fn group_params(&self, id: GroupId) -> Result<&[f64], NetError> {
        self.group(id)?;
        self.read_slot(ParamSlot::Group(id))
    }

    pub fn group_params_mut(&mut self, id: GroupId) -> Result<&mut [f64], NetError> {
        self.group(id)?;
        self.write_slot(ParamSlot::Group(id))
    }

    pub fn group_derivs(&self, id: GroupId) -> Result<&[f64], NetError> {
        self.group(id)?;
        self.read_slot_derivs(ParamSlot::Group(id))
    }
}
