/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : 连接（Connection）：从源模块输出缓冲区的一段切片，
 *                 到目标模块输入缓冲区的一段切片的有向变换
 */

mod kinds;

pub use kinds::{
    ConnectionKind, FullConnection, IdentityConnection, LinearConnection, SubsamplingConnection,
    Transform,
};

use crate::nn::buffer::ModuleBuffers;
use crate::nn::module::{Activatable, Module, TimeStep};
use crate::nn::params::ParamStore;
use crate::nn::shared::SharedParameterGroup;
use crate::nn::{GroupId, ModuleId, NetError};
use std::fmt;
use std::ops::Range;

/// 连接的构建描述，交给 `Network::add_connection` 解析
///
/// 切片端点缺省时分别取 0 与对应模块的维度。
#[derive(Debug, Clone)]
pub struct ConnectionSpec {
    pub(crate) name: String,
    pub(crate) kind: ConnectionKind,
    pub(crate) from: ModuleId,
    pub(crate) to: ModuleId,
    pub(crate) in_from: usize,
    pub(crate) in_to: Option<usize>,
    pub(crate) out_from: usize,
    pub(crate) out_to: Option<usize>,
    pub(crate) group: Option<GroupId>,
}

impl ConnectionSpec {
    pub fn new(kind: impl Into<ConnectionKind>, from: ModuleId, to: ModuleId) -> Self {
        Self {
            name: String::new(),
            kind: kind.into(),
            from,
            to,
            in_from: 0,
            in_to: None,
            out_from: 0,
            out_to: None,
            group: None,
        }
    }

    pub fn identity(from: ModuleId, to: ModuleId) -> Self {
        Self::new(IdentityConnection, from, to)
    }

    pub fn full(from: ModuleId, to: ModuleId) -> Self {
        Self::new(FullConnection, from, to)
    }

    pub fn linear(from: ModuleId, to: ModuleId) -> Self {
        Self::new(LinearConnection, from, to)
    }

    pub fn subsampling(from: ModuleId, to: ModuleId) -> Self {
        Self::new(SubsamplingConnection, from, to)
    }

    /// 成员连接：参数不属于自己，而是引用共享参数组
    pub fn shared(
        group: GroupId,
        kind: impl Into<ConnectionKind>,
        from: ModuleId,
        to: ModuleId,
    ) -> Self {
        Self {
            group: Some(group),
            ..Self::new(kind, from, to)
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn in_slice(mut self, from: usize, to: usize) -> Self {
        self.in_from = from;
        self.in_to = Some(to);
        self
    }

    pub fn out_slice(mut self, from: usize, to: usize) -> Self {
        self.out_from = from;
        self.out_to = Some(to);
        self
    }

    pub fn in_slice_from(mut self, from: usize) -> Self {
        self.in_from = from;
        self
    }

    pub fn in_slice_to(mut self, to: usize) -> Self {
        self.in_to = Some(to);
        self
    }

    pub fn out_slice_from(mut self, from: usize) -> Self {
        self.out_from = from;
        self
    }

    pub fn out_slice_to(mut self, to: usize) -> Self {
        self.out_to = Some(to);
        self
    }
}

/// 连接参数的来源
#[derive(Debug, Clone)]
pub(crate) enum ParamSource {
    Own(ParamStore),
    Shared(GroupId),
}

/// 已解析（切片、维度均已校验）的连接
#[derive(Debug, Clone)]
pub struct Connection {
    pub(crate) name: String,
    pub(crate) kind: ConnectionKind,
    pub(crate) from: ModuleId,
    pub(crate) to: ModuleId,
    pub(crate) in_slice: Range<usize>,
    pub(crate) out_slice: Range<usize>,
    pub(crate) recurrent: bool,
    pub(crate) params: ParamSource,
}

impl Connection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ConnectionKind {
        &self.kind
    }

    /// 源模块
    pub fn source(&self) -> ModuleId {
        self.from
    }

    /// 目标模块
    pub fn target(&self) -> ModuleId {
        self.to
    }

    pub fn in_slice(&self) -> Range<usize> {
        self.in_slice.clone()
    }

    pub fn out_slice(&self) -> Range<usize> {
        self.out_slice.clone()
    }

    /// 切片后的输入维度
    pub fn indim(&self) -> usize {
        self.in_slice.len()
    }

    pub fn outdim(&self) -> usize {
        self.out_slice.len()
    }

    pub fn paramdim(&self) -> usize {
        self.kind.paramdim(self.indim(), self.outdim())
    }

    pub fn is_recurrent(&self) -> bool {
        self.recurrent
    }

    pub fn shared_group(&self) -> Option<GroupId> {
        match self.params {
            ParamSource::Shared(group) => Some(group),
            ParamSource::Own(_) => None,
        }
    }

    /// 参数在所属网络扁平数组中的区间（成员连接取其参数组的区间）
    pub(crate) fn param_range(
        &self,
        groups: &[SharedParameterGroup],
    ) -> Result<Range<usize>, NetError> {
        match &self.params {
            ParamSource::Own(store) => store.range(&self.name),
            ParamSource::Shared(group) => groups
                .get(group.0)
                .ok_or_else(|| NetError::GroupNotFound(format!("{:?}", group)))?
                .params
                .range(&self.name),
        }
    }

    /// 源模块第 `in_t` 行输出切片 → 目标模块第 `out_t` 行输入切片（累加）
    pub(crate) fn forward(
        &self,
        modules: &mut [Module],
        in_t: usize,
        out_t: usize,
        params: &[f64],
    ) -> Result<(), NetError> {
        let inbuf = self
            .endpoint(modules, self.from)?
            .core()
            .buffers()
            .output()
            .slice(in_t, self.in_slice.clone())
            .to_owned();
        let target = self.endpoint_mut(modules, self.to)?;
        let outbuf = target
            .core_mut()
            .buffers
            .input
            .slice_mut(out_t, self.out_slice.clone());
        self.kind.forward(inbuf.view(), outbuf, params)
    }

    /// 目标模块第 `out_t` 行输入误差切片 → 源模块第 `in_t` 行输出误差切片（累加），
    /// 同时累加参数梯度
    pub(crate) fn backward(
        &self,
        modules: &mut [Module],
        in_t: usize,
        out_t: usize,
        params: &[f64],
        derivs: &mut [f64],
    ) -> Result<(), NetError> {
        let outerr = self
            .endpoint(modules, self.to)?
            .core()
            .buffers()
            .inerror()
            .slice(out_t, self.out_slice.clone())
            .to_owned();
        let source = self.endpoint_mut(modules, self.from)?;
        let ModuleBuffers {
            output, outerror, ..
        } = &mut source.core_mut().buffers;
        self.kind.backward(
            outerr.view(),
            outerror.slice_mut(in_t, self.in_slice.clone()),
            output.slice(in_t, self.in_slice.clone()),
            params,
            derivs,
        )
    }

    fn endpoint<'a>(&self, modules: &'a [Module], id: ModuleId) -> Result<&'a Module, NetError> {
        modules
            .get(id.0)
            .ok_or_else(|| NetError::ModuleNotFound(format!("{}（连接 {}）", id, self.name)))
    }

    fn endpoint_mut<'a>(
        &self,
        modules: &'a mut [Module],
        id: ModuleId,
    ) -> Result<&'a mut Module, NetError> {
        modules
            .get_mut(id.0)
            .ok_or_else(|| NetError::ModuleNotFound(format!("{}（连接 {}）", id, self.name)))
    }
}

/// 解析时使用的两端维度
pub(crate) struct Endpoints<'a> {
    pub(crate) from_name: &'a str,
    pub(crate) from_outdim: usize,
    pub(crate) to_name: &'a str,
    pub(crate) to_indim: usize,
}

/// 校验切片并得到 (in_slice, out_slice)
pub(crate) fn resolve_slices(
    spec: &ConnectionSpec,
    name: &str,
    ends: &Endpoints<'_>,
) -> Result<(Range<usize>, Range<usize>), NetError> {
    let in_to = spec.in_to.unwrap_or(ends.from_outdim);
    let out_to = spec.out_to.unwrap_or(ends.to_indim);
    let mismatch = |message: String| NetError::SliceMismatch {
        connection: name.to_string(),
        message,
    };
    if spec.in_from > in_to || in_to > ends.from_outdim {
        return Err(mismatch(format!(
            "输入切片 [{}, {}) 超出了 {} 的输出维度 {}",
            spec.in_from, in_to, ends.from_name, ends.from_outdim
        )));
    }
    if spec.out_from > out_to || out_to > ends.to_indim {
        return Err(mismatch(format!(
            "输出切片 [{}, {}) 超出了 {} 的输入维度 {}",
            spec.out_from, out_to, ends.to_name, ends.to_indim
        )));
    }
    let (in_slice, out_slice) = (spec.in_from..in_to, spec.out_from..out_to);
    spec.kind
        .check_dims(in_slice.len(), out_slice.len())
        .map_err(|reason| mismatch(format!("{}：{}", spec.kind.class_name(), reason)))?;
    Ok((in_slice, out_slice))
}

/// 形如 `<FullConnection 'w': 'a' -> 'b'>` 的描述，两端以模块名给出
pub(crate) struct ConnectionDisplay<'a> {
    pub(crate) connection: &'a Connection,
    pub(crate) from: &'a str,
    pub(crate) to: &'a str,
}

impl fmt::Display for ConnectionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.connection;
        write!(
            f,
            "<{} '{}': '{}' -> '{}'>",
            c.kind.class_name(),
            c.name,
            self.from,
            self.to
        )
    }
}
