/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : 拓扑排序与扁平参数数组的聚合
 */

use super::{ConnectionId, GroupId, ModuleId, Network, ParamSlot};
use crate::nn::NetError;
use crate::nn::connection::ParamSource;
use crate::nn::module::{Activatable, TimeStep};
use crate::nn::params::{ParamStore, ParamView, ParameterVector};
use log::debug;
use std::collections::BTreeSet;
use std::ops::Range;

impl Network {
    /// 确定执行顺序，并把所有参数聚合进本网络的扁平数组
    ///
    /// - 只考虑非循环连接；就绪模块中总是先取名称最小的，结果与插入顺序无关
    /// - 子网络必须已经排序；已嵌入其他网络的网络不能再排序
    /// - 排序后输入/输出维度按输入/输出模块重新计算，缓冲区清空为 1 行
    pub fn sort_modules(&mut self) -> Result<(), NetError> {
        if self.core.params.is_view() {
            return Err(NetError::OwnershipViolation(format!(
                "网络 {} 已嵌入其他网络，不能单独排序",
                self.name()
            )));
        }
        if let Some(child) = self
            .modules
            .iter()
            .filter_map(|m| m.as_network())
            .find(|n| !n.is_sorted())
        {
            return Err(NetError::NotSorted(child.name().to_string()));
        }

        self.order = self.topological_sort()?;

        let mut outgoing = vec![Vec::new(); self.modules.len()];
        let mut recurrent = Vec::new();
        for (i, c) in self.connections.iter().enumerate() {
            if c.recurrent {
                recurrent.push(ConnectionId(i));
            } else {
                outgoing[c.from.0].push(ConnectionId(i));
            }
        }
        for list in &mut outgoing {
            list.sort_by(|a: &ConnectionId, b: &ConnectionId| {
                self.connections[a.0].name.cmp(&self.connections[b.0].name)
            });
        }
        recurrent.sort_by(|a, b| self.connections[a.0].name.cmp(&self.connections[b.0].name));
        let mut groups: Vec<GroupId> = (0..self.groups.len()).map(GroupId).collect();
        groups.sort_by(|a, b| self.groups[a.0].name.cmp(&self.groups[b.0].name));
        self.outgoing = outgoing;
        self.recurrent_order = recurrent;
        self.group_order = groups;

        self.aggregate_params()?;

        let indim = self.inmodules.iter().map(|m| self.modules[m.0].indim()).sum();
        let outdim = self
            .outmodules
            .iter()
            .map(|m| self.modules[m.0].outdim())
            .sum();
        self.core.indim = indim;
        self.core.outdim = outdim;
        self.core.buffers.redim(indim, outdim, 1);
        self.reset_buffers(1);
        self.sorted = true;

        debug!(
            "网络 {} 排序完成：{} 个模块，{} 条连接（其中循环连接 {} 条），{} 个参数，维度 {} -> {}",
            self.name(),
            self.modules.len(),
            self.connections.len(),
            self.recurrent_order.len(),
            self.paramdim(),
            indim,
            outdim
        );
        Ok(())
    }

    /// Kahn 算法：就绪集合按 (名称, 下标) 有序，每次取出最小者
    fn topological_sort(&self) -> Result<Vec<ModuleId>, NetError> {
        let n = self.modules.len();
        let mut indegree = vec![0usize; n];
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
        for c in self.connections.iter().filter(|c| !c.recurrent) {
            children[c.from.0].push(c.to.0);
            indegree[c.to.0] += 1;
        }

        let mut ready: BTreeSet<(&str, usize)> = (0..n)
            .filter(|&i| indegree[i] == 0)
            .map(|i| (self.modules[i].name(), i))
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some((_, i)) = ready.pop_first() {
            order.push(ModuleId(i));
            for &child in &children[i] {
                indegree[child] -= 1;
                if indegree[child] == 0 {
                    ready.insert((self.modules[child].name(), child));
                }
            }
        }

        if order.len() != n {
            return Err(NetError::Cycle(self.name().to_string()));
        }
        Ok(order)
    }

    /// 参数在扁平数组中的排列顺序：
    /// 按执行顺序依次是每个模块、其自有参数的非循环出边；然后是共享参数组；最后是自有参数的循环连接
    pub(crate) fn param_slots(&self) -> Vec<ParamSlot> {
        let owns_params = |c: &ConnectionId| {
            matches!(self.connections[c.0].params, ParamSource::Own(_))
        };
        let mut slots = Vec::new();
        for &m in &self.order {
            slots.push(ParamSlot::Module(m));
            slots.extend(
                self.outgoing[m.0]
                    .iter()
                    .filter(|c| owns_params(c))
                    .map(|&c| ParamSlot::Connection(c)),
            );
        }
        slots.extend(self.group_order.iter().map(|&g| ParamSlot::Group(g)));
        slots.extend(
            self.recurrent_order
                .iter()
                .filter(|c| owns_params(c))
                .map(|&c| ParamSlot::Connection(c)),
        );
        slots
    }

    pub(crate) fn slot_store(&self, slot: ParamSlot) -> Option<&ParamStore> {
        match slot {
            ParamSlot::Module(m) => Some(&self.modules[m.0].core().params),
            ParamSlot::Connection(c) => match &self.connections[c.0].params {
                ParamSource::Own(store) => Some(store),
                ParamSource::Shared(_) => None,
            },
            ParamSlot::Group(g) => Some(&self.groups[g.0].params),
        }
    }

    fn slot_store_mut(&mut self, slot: ParamSlot) -> Option<&mut ParamStore> {
        match slot {
            ParamSlot::Module(m) => Some(&mut self.modules[m.0].core_mut().params),
            ParamSlot::Connection(c) => match &mut self.connections[c.0].params {
                ParamSource::Own(store) => Some(store),
                ParamSource::Shared(_) => None,
            },
            ParamSlot::Group(g) => Some(&mut self.groups[g.0].params),
        }
    }

    pub(crate) fn slot_name(&self, slot: ParamSlot) -> String {
        match slot {
            ParamSlot::Module(m) => format!("module:{}", self.modules[m.0].name()),
            ParamSlot::Connection(c) => format!("connection:{}", self.connections[c.0].name),
            ParamSlot::Group(g) => format!("group:{}", self.groups[g.0].name),
        }
    }

    /// 参数组件在本网络扁平数组中的区间
    pub(crate) fn slot_range(&self, slot: ParamSlot) -> Result<Range<usize>, NetError> {
        match self.slot_store(slot) {
            Some(store) => store.range(&self.slot_name(slot)),
            None => Ok(0..0),
        }
    }

    /// 把所有组件当前的参数值（自有的或旧数组中的）按 param_slots 的顺序拼成新的扁平数组，
    /// 并把各组件改为指向新数组的视图
    fn aggregate_params(&mut self) -> Result<(), NetError> {
        let old = match std::mem::take(&mut self.core.params) {
            ParamStore::Owned(pv) => pv,
            ParamStore::View(view) => {
                self.core.params = ParamStore::View(view);
                return Err(NetError::OwnershipViolation(format!(
                    "网络 {} 已嵌入其他网络，不能重新聚合参数",
                    self.name()
                )));
            }
        };

        let mut params = Vec::with_capacity(old.paramdim());
        let mut derivs = Vec::with_capacity(old.paramdim());
        for slot in self.param_slots() {
            let name = self.slot_name(slot);
            let Some(store) = self.slot_store_mut(slot) else {
                continue;
            };
            if store.paramdim() == 0 {
                continue;
            }
            let current = store.extract(&old, &name)?;
            *store = ParamStore::View(ParamView::new(params.len(), current.paramdim()));
            params.extend_from_slice(current.params());
            derivs.extend_from_slice(current.derivs());
        }
        self.core.params = ParamStore::Owned(ParameterVector::from_parts(params, derivs));
        Ok(())
    }
}
