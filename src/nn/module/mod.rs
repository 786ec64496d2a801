/*
 * @Author       : 老董
 * @Date         : 2026-03-03
 * @Description  : 模块（Module）：网络中的计算单元
 *
 * 模块分两类：叶子层（Layer）和嵌套网络（Network）。两者对外都是
 * “indim 维输入 → outdim 维输出、可选地带 paramdim 个参数”的黑盒，
 * 由 enum_dispatch 统一分发。
 */

pub mod kinds;
mod layer;
mod state;

pub use kinds::{LayerKind, Transfer};
pub use layer::Layer;
pub use state::ModuleCore;

use crate::nn::{NetError, Network};
use enum_dispatch::enum_dispatch;

#[enum_dispatch]
#[derive(Debug, Clone)]
pub enum Module {
    Layer(Layer),
    Network(Network),
}

/// 模块对外的激活接口
#[enum_dispatch(Module)]
pub trait Activatable {
    fn core(&self) -> &ModuleCore;

    fn name(&self) -> &str {
        self.core().name()
    }

    fn indim(&self) -> usize {
        self.core().indim()
    }

    fn outdim(&self) -> usize {
        self.core().outdim()
    }

    fn paramdim(&self) -> usize {
        self.core().paramdim()
    }

    /// 当前时间偏移（下一次/最近一次处理的时间步）
    fn offset(&self) -> usize {
        self.core().offset()
    }

    /// 激活一个时间步：写入输入、前向计算并返回该步的输出
    fn activate(&mut self, input: &[f64]) -> Result<Vec<f64>, NetError>;

    /// 对最近一次尚未反向的时间步做反向传播，返回输入误差
    fn back_activate(&mut self, outerr: &[f64]) -> Result<Vec<f64>, NetError>;

    /// 清零所有缓冲区并回到第 0 个时间步，参数保持不变
    fn reset(&mut self);

    /// 所有缓冲区的时间容量翻倍，已有行保留在前半部分（网络会同步扩容所有后代）
    fn grow_buffers(&mut self);

    /// 把所有缓冲区重新分配为 `rows` 行并清零，回到第 0 个时间步
    fn reset_buffers(&mut self, rows: usize);
}

/// 网络内部驱动模块的接口：参数切片由外部（所属网络）传入
#[enum_dispatch(Module)]
pub(crate) trait TimeStep {
    fn core_mut(&mut self) -> &mut ModuleCore;

    fn forward_at(&mut self, t: usize, params: &[f64]) -> Result<(), NetError>;

    fn backward_at(&mut self, t: usize, params: &[f64], derivs: &mut [f64])
    -> Result<(), NetError>;

    fn shift_buffers(&mut self);
}

impl Module {
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Layer(layer) => layer.kind().class_name(),
            Self::Network(net) => net.kind().class_name(),
        }
    }

    pub fn as_layer(&self) -> Option<&Layer> {
        match self {
            Self::Layer(layer) => Some(layer),
            Self::Network(_) => None,
        }
    }

    pub fn as_network(&self) -> Option<&Network> {
        match self {
            Self::Network(net) => Some(net),
            Self::Layer(_) => None,
        }
    }
}
