/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : 负责模块化神经网络（modular network）的构建与执行
 */

mod buffer;
mod connection;
mod descriptor;
mod error;
mod gradient_check;
mod module;
mod network;
mod params;
mod shared;
mod shortcuts;

pub use buffer::{Buffer, ModuleBuffers};
pub use connection::{
    Connection, ConnectionKind, ConnectionSpec, FullConnection, IdentityConnection,
    LinearConnection, SubsamplingConnection, Transform,
};
pub use descriptor::{
    ConnectionDescriptor, GroupDescriptor, ModuleDescriptor, ModuleTypeDescriptor,
    NetworkDescriptor,
};
pub use error::NetError;
pub use gradient_check::{GradientReport, Sequence, check_gradient, total_loss};
pub use module::kinds::{
    BiasUnit, LinearLayer, ShiftLayer, SigmoidLayer, SoftmaxLayer, StepLayer, TanhLayer,
};
pub use module::{Activatable, Layer, LayerKind, Module, ModuleCore, Transfer};
pub use network::{ConnectionId, GroupId, ModuleId, Network, NetworkKind};
pub use params::{DEFAULT_INIT_STD, ParameterVector};
pub use shared::SharedParameterGroup;
pub use shortcuts::{BuildOptions, build_network};

#[cfg(test)]
mod tests;
