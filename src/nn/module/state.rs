/*
 * @Author       : 老董
 * @Date         : 2026-03-03
 * @Description  : 所有模块共有的状态：名称、维度、时间偏移、缓冲区和参数
 */

use crate::nn::buffer::ModuleBuffers;
use crate::nn::params::{ParamStore, ParameterVector};

#[derive(Debug, Clone)]
pub struct ModuleCore {
    pub(crate) name: String,
    pub(crate) indim: usize,
    pub(crate) outdim: usize,
    pub(crate) offset: usize,
    pub(crate) buffers: ModuleBuffers,
    pub(crate) params: ParamStore,
}

impl ModuleCore {
    pub(crate) fn new(name: &str, indim: usize, outdim: usize, params: ParameterVector) -> Self {
        Self {
            name: name.to_string(),
            indim,
            outdim,
            offset: 0,
            buffers: ModuleBuffers::new(indim, outdim, 1),
            params: ParamStore::Owned(params),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn indim(&self) -> usize {
        self.indim
    }

    pub fn outdim(&self) -> usize {
        self.outdim
    }

    pub fn paramdim(&self) -> usize {
        self.params.paramdim()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn buffers(&self) -> &ModuleBuffers {
        &self.buffers
    }

    /// 参数是否已经并入某个网络的扁平数组
    pub fn is_embedded(&self) -> bool {
        self.params.is_view()
    }

    /// 仅扩展本模块自己的缓冲区，直到第 t 行可用；返回是否发生了扩容
    pub(crate) fn ensure_capacity(&mut self, t: usize) -> bool {
        let mut grew = false;
        while self.buffers.capacity() <= t {
            self.buffers.grow();
            grew = true;
        }
        grew
    }
}
