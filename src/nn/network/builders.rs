/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : Network 构建期 API（添加模块、连接、共享参数组）
 *
 * 任何拓扑修改都会把网络标记为“未排序”，必须重新 sort_modules 后才能激活。
 */

use super::{ConnectionId, GroupId, ModuleId, Network};
use crate::nn::NetError;
use crate::nn::connection::{
    Connection, ConnectionSpec, Endpoints, ParamSource, Transform, resolve_slices,
};
use crate::nn::module::{Activatable, Module, TimeStep};
use crate::nn::params::{DEFAULT_INIT_STD, ParamStore, ParameterVector};
use crate::nn::shared::SharedParameterGroup;
use log::warn;

impl Network {
    // ========== 模块 ==========

    /// 加入一个模块（层或已排序的子网络）
    ///
    /// 名称为空时自动生成 `{类名}_{n}`；同一网络内名称必须唯一。
    pub fn add_module(&mut self, module: impl Into<Module>) -> Result<ModuleId, NetError> {
        let mut module = module.into();
        if let Some(child) = module.as_network() {
            if !child.is_sorted() {
                return Err(NetError::NotSorted(format!(
                    "{}（子网络必须先排序才能加入网络 {}）",
                    child.name(),
                    self.name()
                )));
            }
            if child.core().is_embedded() {
                return Err(NetError::OwnershipViolation(format!(
                    "子网络 {} 已属于其他网络",
                    child.name()
                )));
            }
            // 遗忘模式的移位只由最外层的 activate 驱动，嵌入后缓冲区会无限增长
            if child.kind().is_forgetful() {
                return Err(NetError::InvalidOperation(format!(
                    "遗忘模式的网络 {} 不能作为子网络加入网络 {}",
                    child.name(),
                    self.name()
                )));
            }
            if !self.kind.is_recurrent() && child.kind().is_recurrent() {
                warn!(
                    "循环网络 {} 被加入前馈网络 {}：前馈网络每次激活都会重置，子网络的循环状态不会跨激活保留",
                    child.name(),
                    self.name()
                );
            }
        }

        let name = if module.name().is_empty() {
            let generated = self.generate_module_name(module.class_name());
            module.core_mut().name = generated.clone();
            generated
        } else {
            module.name().to_string()
        };
        if self.names.contains_key(&name) {
            return Err(NetError::DuplicateName(format!(
                "模块 {} 已存在于网络 {}",
                name,
                self.name()
            )));
        }

        let id = ModuleId(self.modules.len());
        self.modules.push(module);
        self.names.insert(name, id);
        self.sorted = false;
        Ok(id)
    }

    /// 加入模块并标记为输入模块
    pub fn add_input_module(&mut self, module: impl Into<Module>) -> Result<ModuleId, NetError> {
        let id = self.add_module(module)?;
        self.mark_input_module(id)?;
        Ok(id)
    }

    /// 加入模块并标记为输出模块
    pub fn add_output_module(&mut self, module: impl Into<Module>) -> Result<ModuleId, NetError> {
        let id = self.add_module(module)?;
        self.mark_output_module(id)?;
        Ok(id)
    }

    /// 把已有模块标记为输入模块（网络输入按标记顺序拼接）
    pub fn mark_input_module(&mut self, id: ModuleId) -> Result<(), NetError> {
        self.module(id)?;
        if !self.inmodules.contains(&id) {
            self.inmodules.push(id);
            self.sorted = false;
        }
        Ok(())
    }

    /// 把已有模块标记为输出模块（网络输出按标记顺序拼接）
    pub fn mark_output_module(&mut self, id: ModuleId) -> Result<(), NetError> {
        self.module(id)?;
        if !self.outmodules.contains(&id) {
            self.outmodules.push(id);
            self.sorted = false;
        }
        Ok(())
    }

    // ========== 连接 ==========

    /// 加入一条普通（同一时间步内）连接
    pub fn add_connection(&mut self, spec: ConnectionSpec) -> Result<ConnectionId, NetError> {
        self.insert_connection(spec, false)
    }

    /// 加入一条循环连接：从时间步 t-1 的源输出到时间步 t 的目标输入
    ///
    /// 仅循环网络可用；循环连接允许自环，也不参与拓扑排序。
    pub fn add_recurrent_connection(
        &mut self,
        spec: ConnectionSpec,
    ) -> Result<ConnectionId, NetError> {
        if !self.kind.is_recurrent() {
            return Err(NetError::InvalidOperation(format!(
                "前馈网络 {} 不能添加循环连接",
                self.name()
            )));
        }
        self.insert_connection(spec, true)
    }

    fn insert_connection(
        &mut self,
        spec: ConnectionSpec,
        recurrent: bool,
    ) -> Result<ConnectionId, NetError> {
        let source = self.module(spec.from)?;
        let target = self.module(spec.to)?;

        let name = if spec.name.is_empty() {
            self.generate_connection_name(spec.kind.class_name())
        } else {
            spec.name.clone()
        };
        if self.connections.iter().any(|c| c.name == name) {
            return Err(NetError::DuplicateName(format!(
                "连接 {} 已存在于网络 {}",
                name,
                self.name()
            )));
        }

        let ends = Endpoints {
            from_name: source.name(),
            from_outdim: source.outdim(),
            to_name: target.name(),
            to_indim: target.indim(),
        };
        let (in_slice, out_slice) = resolve_slices(&spec, &name, &ends)?;
        let paramdim = spec.kind.paramdim(in_slice.len(), out_slice.len());

        let params = match spec.group {
            Some(group) => {
                let group_dim = self.group(group)?.paramdim();
                if group_dim != paramdim {
                    return Err(NetError::SliceMismatch {
                        connection: name,
                        message: format!(
                            "需要 {} 个参数，但共享参数组 {} 有 {} 个",
                            paramdim, self.groups[group.0].name, group_dim
                        ),
                    });
                }
                ParamSource::Shared(group)
            }
            None => ParamSource::Own(ParamStore::Owned(self.init_params(paramdim)?)),
        };

        let id = ConnectionId(self.connections.len());
        self.connections.push(Connection {
            name,
            kind: spec.kind,
            from: spec.from,
            to: spec.to,
            in_slice,
            out_slice,
            recurrent,
            params,
        });
        self.sorted = false;
        Ok(id)
    }

    // ========== 共享参数组 ==========

    /// 新建一个 `dim` 维共享参数组，参数按 N(0, 1) 初始化
    pub fn new_shared_group(&mut self, name: &str, dim: usize) -> Result<GroupId, NetError> {
        if dim == 0 {
            return Err(NetError::InvalidOperation(format!(
                "共享参数组 {} 的参数维度必须大于 0",
                name
            )));
        }
        let name = if name.is_empty() {
            self.generate_group_name()
        } else {
            name.to_string()
        };
        if self.groups.iter().any(|g| g.name == name) {
            return Err(NetError::DuplicateName(format!(
                "共享参数组 {} 已存在于网络 {}",
                name,
                self.name()
            )));
        }
        let params = self.init_params(dim)?;
        let id = GroupId(self.groups.len());
        self.groups
            .push(SharedParameterGroup::new(&name, ParamStore::Owned(params)));
        self.sorted = false;
        Ok(id)
    }

    // ========== 辅助 ==========

    fn init_params(&mut self, dim: usize) -> Result<ParameterVector, NetError> {
        match self.rng.as_mut() {
            Some(rng) => ParameterVector::initialize(dim, DEFAULT_INIT_STD, rng),
            None => ParameterVector::initialize(dim, DEFAULT_INIT_STD, &mut rand::thread_rng()),
        }
    }

    /// 生成 `{类名}_{n}` 形式、在模块中唯一的名称
    fn generate_module_name(&self, class: &str) -> String {
        unique_name(class, self.modules.len() + 1, |n| self.names.contains_key(n))
    }

    fn generate_connection_name(&self, class: &str) -> String {
        unique_name(class, self.connections.len() + 1, |n| {
            self.connections.iter().any(|c| c.name == n)
        })
    }

    fn generate_group_name(&self) -> String {
        unique_name("SharedGroup", self.groups.len() + 1, |n| {
            self.groups.iter().any(|g| g.name == n)
        })
    }
}

fn unique_name(class: &str, start: usize, taken: impl Fn(&str) -> bool) -> String {
    let mut counter = start;
    loop {
        let name = format!("{}_{}", class, counter);
        if !taken(&name) {
            return name;
        }
        counter += 1;
    }
}
