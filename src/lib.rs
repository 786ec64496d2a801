//! # modnet
//!
//! `modnet` 是一个模块化神经网络的构建与执行底座：
//! 由可互换的计算单元（模块，[`nn::Module`]）和带方向、可带参数的连接（[`nn::Connection`]）组成的图，
//! 既能表达前馈拓扑，也能表达按时间展开的循环拓扑（BPTT），
//! 并支持任意层级嵌套的子网络的前向激活与反向误差/梯度传播。
//!
//! 具体层的数值、优化算法、数据集等都不在本 crate 范围内，它们只通过
//! `activate`/`back_activate`/`params`/`derivs` 这组接口与网络打交道。

pub mod nn;
pub mod utils;
