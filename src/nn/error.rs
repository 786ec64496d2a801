/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : 网络构建与执行过程中的错误类型
 */

use thiserror::Error;

/// 网络操作错误类型
///
/// 所有可恢复的失败都以该枚举返回，携带出错组件的名称或维度信息；
/// 只有内部不变量被破坏时才会 panic。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    /// 在 `sort_modules()` 之前（或拓扑修改之后）就尝试激活/读取参数
    #[error("网络 {0} 尚未排序（请先调用 sort_modules）")]
    NotSorted(String),

    /// 非循环连接构成了环
    #[error("网络 {0} 的非循环连接中存在环")]
    Cycle(String),

    /// 连接的切片范围与两端模块的维度不一致
    #[error("连接 {connection} 的切片无效：{message}")]
    SliceMismatch { connection: String, message: String },

    /// 输入/误差/参数向量长度不符
    #[error("维度不匹配：期望 {expected}，实际 {got}。{message}")]
    DimensionMismatch {
        expected: usize,
        got: usize,
        message: String,
    },

    /// 写入不属于自己的参数（嵌入后的模块、共享参数组的成员连接等）
    #[error("参数所有权冲突：{0}")]
    OwnershipViolation(String),

    /// 反向传播的时间步没有对应的前向激活
    #[error("{0}：没有与之对应的前向激活，无法反向传播")]
    BackwardWithoutForward(String),

    /// 模块类型没有实现反向传播
    #[error("{0} 没有实现反向传播")]
    MissingBackward(String),

    /// 遗忘模式下只保留最近的时间步，不能做 BPTT
    #[error("网络 {0} 处于遗忘模式，不支持反向传播")]
    ForgetfulBackward(String),

    #[error("找不到模块：{0}")]
    ModuleNotFound(String),

    #[error("找不到连接：{0}")]
    ConnectionNotFound(String),

    #[error("找不到共享参数组：{0}")]
    GroupNotFound(String),

    #[error("名称重复：{0}")]
    DuplicateName(String),

    #[error("无效操作：{0}")]
    InvalidOperation(String),

    #[error("文件读写失败：{0}")]
    Io(String),

    #[error("序列化/反序列化失败：{0}")]
    Serialization(String),
}

impl From<std::io::Error> for NetError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for NetError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<bincode::Error> for NetError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
