/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : 共享参数组：多条成员连接引用同一段参数
 */

use super::params::ParamStore;

/// 共享参数组（母连接）
///
/// 参数组自己持有参数（并入网络后是网络扁平数组上的一段视图），
/// 成员连接只记录所属参数组，读写参数都必须经过参数组。
/// 所有成员反向传播时的梯度都累加到同一段导数上。
#[derive(Debug, Clone)]
pub struct SharedParameterGroup {
    pub(crate) name: String,
    pub(crate) params: ParamStore,
}

impl SharedParameterGroup {
    pub(crate) fn new(name: &str, params: ParamStore) -> Self {
        Self {
            name: name.to_string(),
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn paramdim(&self) -> usize {
        self.params.paramdim()
    }
}
