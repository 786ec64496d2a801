/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : Network：由模块和连接组成的（可嵌套的）网络
 *
 * 子模块划分：
 * - builders:  添加模块/连接/共享参数组（构建期 API）
 * - sort:      拓扑排序与扁平参数数组的聚合
 * - params:    参数与导数的读写
 * - forward:   单个时间步的前向传播与缓冲区管理
 * - backward:  单个时间步的反向传播（含 BPTT 的循环连接部分）
 * - activate:  对外的 activate/back_activate/reset（前馈、循环、遗忘三种语义）
 * - describe:  Display 与描述符（NetworkDescriptor）互转
 * - model_io:  模型/参数文件的保存与加载
 */

mod activate;
mod backward;
mod builders;
mod describe;
mod forward;
mod model_io;
mod params;
mod sort;

use super::connection::Connection;
use super::module::{Activatable, Module, ModuleCore};
use super::params::ParameterVector;
use super::shared::SharedParameterGroup;
use super::NetError;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ========== 句柄类型 ==========

/// 模块在所属网络中的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(pub usize);

/// 连接在所属网络中的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub usize);

/// 共享参数组在所属网络中的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub usize);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({})", self.0)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId({})", self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({})", self.0)
    }
}

/// 网络的执行语义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkKind {
    /// 前馈：每次激活前都会 reset，只使用第 0 个时间步
    FeedForward,
    /// 循环：按时间步展开，允许循环连接；`forget` 为 true 时只保留最近的时间步
    Recurrent { forget: bool },
}

impl NetworkKind {
    pub const fn is_recurrent(&self) -> bool {
        matches!(self, Self::Recurrent { .. })
    }

    pub const fn is_forgetful(&self) -> bool {
        matches!(self, Self::Recurrent { forget: true })
    }

    pub const fn class_name(&self) -> &'static str {
        match self {
            Self::FeedForward => "FeedForwardNetwork",
            Self::Recurrent { .. } => "RecurrentNetwork",
        }
    }
}

/// 参数在扁平数组中的归属（按聚合顺序排列）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParamSlot {
    Module(ModuleId),
    Connection(ConnectionId),
    Group(GroupId),
}

// ========== Network ==========

/// 模块 + 连接组成的网络
///
/// 网络本身也是一个模块（[`Module::Network`]），可以被加入另一个网络。
/// 构建完成后必须调用 [`Network::sort_modules`]：它确定执行顺序，
/// 并把所有后代的参数聚合成一份扁平数组（由最外层网络持有）。
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) core: ModuleCore,
    kind: NetworkKind,
    modules: Vec<Module>,
    names: HashMap<String, ModuleId>,
    connections: Vec<Connection>,
    groups: Vec<SharedParameterGroup>,
    inmodules: Vec<ModuleId>,
    outmodules: Vec<ModuleId>,
    /// 排序结果：模块执行顺序
    order: Vec<ModuleId>,
    /// 每个模块的非循环出边，按连接名排序
    outgoing: Vec<Vec<ConnectionId>>,
    recurrent_order: Vec<ConnectionId>,
    group_order: Vec<GroupId>,
    sorted: bool,
    /// 下一次 activate 使用的时间步
    time: usize,
    /// 已前向过的时间步数
    max_offset: usize,
    rng: Option<StdRng>,
}

impl Network {
    // ========== 创建 ==========

    /// 前馈网络
    pub fn new(name: &str) -> Self {
        Self::with_kind(name, NetworkKind::FeedForward)
    }

    /// 循环网络
    pub fn recurrent(name: &str) -> Self {
        Self::with_kind(name, NetworkKind::Recurrent { forget: false })
    }

    /// 遗忘模式的循环网络：缓冲区只保留最近的时间步，不支持反向传播
    pub fn forgetful(name: &str) -> Self {
        Self::with_kind(name, NetworkKind::Recurrent { forget: true })
    }

    pub fn with_kind(name: &str, kind: NetworkKind) -> Self {
        Self {
            core: ModuleCore::new(name, 0, 0, ParameterVector::default()),
            kind,
            modules: Vec::new(),
            names: HashMap::new(),
            connections: Vec::new(),
            groups: Vec::new(),
            inmodules: Vec::new(),
            outmodules: Vec::new(),
            order: Vec::new(),
            outgoing: Vec::new(),
            recurrent_order: Vec::new(),
            group_order: Vec::new(),
            sorted: false,
            time: 0,
            max_offset: 0,
            rng: None,
        }
    }

    /// 带固定随机种子：之后新建的连接参数、共享参数组以及 mutate/randomize 都可复现
    pub fn with_kind_and_seed(name: &str, kind: NetworkKind, seed: u64) -> Self {
        let mut net = Self::with_kind(name, kind);
        net.set_seed(seed);
        net
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.rng = Some(StdRng::seed_from_u64(seed));
    }

    // ========== 访问器 ==========

    pub fn kind(&self) -> NetworkKind {
        self.kind
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, id: ModuleId) -> Result<&Module, NetError> {
        self.modules
            .get(id.0)
            .ok_or_else(|| NetError::ModuleNotFound(format!("{}（网络 {}）", id, self.name())))
    }

    /// 按名称查找模块
    pub fn module_id(&self, name: &str) -> Result<ModuleId, NetError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| NetError::ModuleNotFound(format!("{}（网络 {}）", name, self.name())))
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connection(&self, id: ConnectionId) -> Result<&Connection, NetError> {
        self.connections.get(id.0).ok_or_else(|| {
            NetError::ConnectionNotFound(format!("{}（网络 {}）", id, self.name()))
        })
    }

    pub fn connection_id(&self, name: &str) -> Result<ConnectionId, NetError> {
        self.connections
            .iter()
            .position(|c| c.name == name)
            .map(ConnectionId)
            .ok_or_else(|| {
                NetError::ConnectionNotFound(format!("{}（网络 {}）", name, self.name()))
            })
    }

    pub fn groups(&self) -> &[SharedParameterGroup] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> Result<&SharedParameterGroup, NetError> {
        self.groups
            .get(id.0)
            .ok_or_else(|| NetError::GroupNotFound(format!("{}（网络 {}）", id, self.name())))
    }

    pub fn group_id(&self, name: &str) -> Result<GroupId, NetError> {
        self.groups
            .iter()
            .position(|g| g.name == name)
            .map(GroupId)
            .ok_or_else(|| NetError::GroupNotFound(format!("{}（网络 {}）", name, self.name())))
    }

    pub fn inmodules(&self) -> &[ModuleId] {
        &self.inmodules
    }

    pub fn outmodules(&self) -> &[ModuleId] {
        &self.outmodules
    }

    /// 排序后的模块执行顺序（未排序时为空）
    pub fn sorted_modules(&self) -> &[ModuleId] {
        &self.order
    }

    /// 非循环连接，按执行顺序排列（每个模块的出边按名称排序）
    pub fn sorted_connections(&self) -> Vec<ConnectionId> {
        self.order
            .iter()
            .flat_map(|m| self.outgoing[m.0].iter().copied())
            .collect()
    }

    /// 循环连接，按名称排序
    pub fn recurrent_connections(&self) -> &[ConnectionId] {
        &self.recurrent_order
    }

    /// 下一次 activate 将使用的时间步
    pub fn time(&self) -> usize {
        self.time
    }

    fn ensure_sorted(&self) -> Result<(), NetError> {
        if self.sorted {
            Ok(())
        } else {
            Err(NetError::NotSorted(self.name().to_string()))
        }
    }

    /// 复制网络：结构、参数和共享关系都被复制；
    /// `keep_buffers` 为 false 时副本的缓冲区被清空并回到第 0 个时间步
    ///
    /// 带种子的网络会从自己的随机流中为副本派生新种子，
    /// 因此多个副本各自 mutate 的结果互不相同，但整体仍可复现。
    pub fn copy(&mut self, keep_buffers: bool) -> Self {
        let mut copy = self.clone();
        if let Some(rng) = self.rng.as_mut() {
            copy.rng = Some(StdRng::seed_from_u64(rng.r#gen()));
        }
        if !keep_buffers {
            copy.reset();
        }
        copy
    }
}
