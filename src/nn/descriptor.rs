/*
 * @Author       : 老董
 * @Date         : 2026-03-08
 * @Description  : 网络描述符（Network Descriptor）
 *                 可序列化的中间表示，用于保存/加载与调试输出
 */

use super::NetError;
use super::connection::ConnectionKind;
use super::module::LayerKind;
use super::network::NetworkKind;
use serde::{Deserialize, Serialize};

/// 网络的可序列化描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    /// 描述格式版本，加载时必须与 [`NetworkDescriptor::FORMAT_VERSION`] 一致
    pub version: String,
    pub name: String,
    pub kind: NetworkKind,
    /// 所有模块，按加入网络的顺序
    pub modules: Vec<ModuleDescriptor>,
    pub input_modules: Vec<String>,
    pub output_modules: Vec<String>,
    /// 所有连接（含循环连接），按加入网络的顺序
    pub connections: Vec<ConnectionDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_groups: Vec<GroupDescriptor>,
}

/// 模块描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: String,
    pub module: ModuleTypeDescriptor,
    /// 层自己的参数；子网络的参数记录在其嵌套描述中
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<f64>,
}

/// 模块类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ModuleTypeDescriptor {
    Layer { kind: LayerKind, dim: usize },
    Network(Box<NetworkDescriptor>),
}

/// 连接描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    pub name: String,
    pub kind: ConnectionKind,
    pub from: String,
    pub to: String,
    pub in_slice: (usize, usize),
    pub out_slice: (usize, usize),
    #[serde(default)]
    pub recurrent: bool,
    /// 成员连接所属的共享参数组；为 None 时参数记录在 `params` 中
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_group: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<f64>,
}

/// 共享参数组描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDescriptor {
    pub name: String,
    pub params: Vec<f64>,
}

impl NetworkDescriptor {
    /// 当前描述格式版本
    pub const FORMAT_VERSION: &'static str = "1";

    pub fn new(name: &str, kind: NetworkKind) -> Self {
        Self {
            version: Self::FORMAT_VERSION.to_string(),
            name: name.to_string(),
            kind,
            modules: Vec::new(),
            input_modules: Vec::new(),
            output_modules: Vec::new(),
            connections: Vec::new(),
            shared_groups: Vec::new(),
        }
    }

    /// 检查格式版本（不递归，嵌套描述在重建时各自检查）
    pub fn check_version(&self) -> Result<(), NetError> {
        if self.version != Self::FORMAT_VERSION {
            return Err(NetError::Serialization(format!(
                "不支持的模型描述版本：{}（网络 {}，当前版本 {}）",
                self.version,
                self.name,
                Self::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// 参数总数（含嵌套网络）
    pub fn total_params(&self) -> usize {
        let modules: usize = self
            .modules
            .iter()
            .map(|m| match &m.module {
                ModuleTypeDescriptor::Layer { .. } => m.params.len(),
                ModuleTypeDescriptor::Network(inner) => inner.total_params(),
            })
            .sum();
        let connections: usize = self.connections.iter().map(|c| c.params.len()).sum();
        let groups: usize = self.shared_groups.iter().map(|g| g.params.len()).sum();
        modules + connections + groups
    }

    /// 序列化为 JSON 字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 从 JSON 字符串解析
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
