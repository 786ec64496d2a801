/*
 * @Author       : 老董
 * @Date         : 2026-03-08
 * @Description  : Network 与 NetworkDescriptor 的互转，以及 Display 输出
 */

use super::{ConnectionId, GroupId, ModuleId, Network, ParamSlot};
use crate::nn::NetError;
use crate::nn::connection::{ConnectionDisplay, ConnectionSpec};
use crate::nn::descriptor::{
    ConnectionDescriptor, GroupDescriptor, ModuleDescriptor, ModuleTypeDescriptor,
    NetworkDescriptor,
};
use crate::nn::module::{Activatable, Layer, Module};
use crate::nn::params::sub;
use std::fmt;

impl Network {
    /// 导出网络的完整描述（结构 + 参数），网络必须已排序且是最外层网络
    pub fn describe(&self) -> Result<NetworkDescriptor, NetError> {
        self.describe_with(self.params()?)
    }

    /// 以给定的扁平参数数组（本网络的参数区间）导出描述，嵌套网络递归使用父级切片
    fn describe_with(&self, params: &[f64]) -> Result<NetworkDescriptor, NetError> {
        self.ensure_sorted()?;
        let mut desc = NetworkDescriptor::new(self.name(), self.kind);

        for (i, module) in self.modules.iter().enumerate() {
            let slot = ParamSlot::Module(ModuleId(i));
            let values = sub(params, self.slot_range(slot)?, module.name())?;
            let (module_type, layer_params) = match module {
                Module::Layer(layer) => (
                    ModuleTypeDescriptor::Layer {
                        kind: *layer.kind(),
                        dim: layer.outdim(),
                    },
                    values.to_vec(),
                ),
                Module::Network(net) => (
                    ModuleTypeDescriptor::Network(Box::new(net.describe_with(values)?)),
                    Vec::new(),
                ),
            };
            desc.modules.push(ModuleDescriptor {
                name: module.name().to_string(),
                module: module_type,
                params: layer_params,
            });
        }

        desc.input_modules = self
            .inmodules
            .iter()
            .map(|m| self.modules[m.0].name().to_string())
            .collect();
        desc.output_modules = self
            .outmodules
            .iter()
            .map(|m| self.modules[m.0].name().to_string())
            .collect();

        for (i, group) in self.groups.iter().enumerate() {
            let range = self.slot_range(ParamSlot::Group(GroupId(i)))?;
            desc.shared_groups.push(GroupDescriptor {
                name: group.name.clone(),
                params: sub(params, range, &group.name)?.to_vec(),
            });
        }

        for (i, conn) in self.connections.iter().enumerate() {
            let (shared_group, values) = match conn.shared_group() {
                Some(group) => (Some(self.groups[group.0].name.clone()), Vec::new()),
                None => {
                    let range = self.slot_range(ParamSlot::Connection(ConnectionId(i)))?;
                    (None, sub(params, range, &conn.name)?.to_vec())
                }
            };
            desc.connections.push(ConnectionDescriptor {
                name: conn.name.clone(),
                kind: conn.kind,
                from: self.modules[conn.from.0].name().to_string(),
                to: self.modules[conn.to.0].name().to_string(),
                in_slice: (conn.in_slice.start, conn.in_slice.end),
                out_slice: (conn.out_slice.start, conn.out_slice.end),
                recurrent: conn.recurrent,
                shared_group,
                params: values,
            });
        }
        Ok(desc)
    }

    /// 由描述重建网络（已排序，参数与描述一致）
    pub fn from_descriptor(desc: &NetworkDescriptor) -> Result<Self, NetError> {
        desc.check_version()?;
        let mut net = Self::with_kind(&desc.name, desc.kind);

        for md in &desc.modules {
            let module: Module = match &md.module {
                ModuleTypeDescriptor::Layer { kind, dim } => {
                    Layer::new(*kind, *dim, &md.name)?.into()
                }
                ModuleTypeDescriptor::Network(inner) => Self::from_descriptor(inner)?.into(),
            };
            net.add_module(module)?;
        }
        for name in &desc.input_modules {
            let id = net.module_id(name)?;
            net.mark_input_module(id)?;
        }
        for name in &desc.output_modules {
            let id = net.module_id(name)?;
            net.mark_output_module(id)?;
        }
        for gd in &desc.shared_groups {
            net.new_shared_group(&gd.name, gd.params.len())?;
        }
        for cd in &desc.connections {
            let from = net.module_id(&cd.from)?;
            let to = net.module_id(&cd.to)?;
            let spec = match &cd.shared_group {
                Some(group) => ConnectionSpec::shared(net.group_id(group)?, cd.kind, from, to),
                None => ConnectionSpec::new(cd.kind, from, to),
            }
            .named(&cd.name)
            .in_slice(cd.in_slice.0, cd.in_slice.1)
            .out_slice(cd.out_slice.0, cd.out_slice.1);
            if cd.recurrent {
                net.add_recurrent_connection(spec)?;
            } else {
                net.add_connection(spec)?;
            }
        }

        net.sort_modules()?;

        for (i, md) in desc.modules.iter().enumerate() {
            if matches!(md.module, ModuleTypeDescriptor::Layer { .. }) {
                copy_into(net.module_params_mut(ModuleId(i))?, &md.params, &md.name)?;
            }
        }
        for (i, gd) in desc.shared_groups.iter().enumerate() {
            copy_into(net.group_params_mut(GroupId(i))?, &gd.params, &gd.name)?;
        }
        for (i, cd) in desc.connections.iter().enumerate() {
            if cd.shared_group.is_none() {
                copy_into(net.connection_params_mut(ConnectionId(i))?, &cd.params, &cd.name)?;
            }
        }
        Ok(net)
    }
}

fn copy_into(target: &mut [f64], values: &[f64], owner: &str) -> Result<(), NetError> {
    if target.len() != values.len() {
        return Err(NetError::DimensionMismatch {
            expected: target.len(),
            got: values.len(),
            message: format!("{} 的参数个数与描述不一致", owner),
        });
    }
    target.copy_from_slice(values);
    Ok(())
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |ids: &[ModuleId]| {
            ids.iter()
                .map(|m| self.modules[m.0].name())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let connections = |ids: &[ConnectionId]| {
            ids.iter()
                .map(|c| {
                    let conn = &self.connections[c.0];
                    ConnectionDisplay {
                        connection: conn,
                        from: self.modules[conn.from.0].name(),
                        to: self.modules[conn.to.0].name(),
                    }
                    .to_string()
                })
                .collect::<Vec<_>>()
                .join(", ")
        };

        writeln!(f, "{} ({})", self.name(), self.kind.class_name())?;
        if !self.sorted {
            return writeln!(f, "   （尚未排序，{} 个模块）", self.modules.len());
        }
        writeln!(f, "   Modules:")?;
        writeln!(f, "    [{}]", names(&self.order))?;
        writeln!(f, "   Connections:")?;
        writeln!(f, "    [{}]", connections(&self.sorted_connections()))?;
        if self.kind.is_recurrent() {
            writeln!(f, "   Recurrent Connections:")?;
            writeln!(f, "    [{}]", connections(&self.recurrent_order))?;
        }
        Ok(())
    }
}
