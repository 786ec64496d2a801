/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : 参数向量及其“拥有/视图”两种存储形态
 *
 * 最外层网络持有唯一一份扁平参数数组（以及同形的导数数组），
 * 其后代模块、连接、共享参数组只记录自己在父级数组中的区间（ParamView）。
 * 嵌套网络的区间相对于其父网络的区间，所以多层偏移可以逐级叠加。
 */

use super::NetError;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// 新建参数时所用高斯分布的默认标准差
pub const DEFAULT_INIT_STD: f64 = 1.0;

/// 参数值 + 同长度的导数累加区
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterVector {
    params: Vec<f64>,
    derivs: Vec<f64>,
}

impl ParameterVector {
    pub fn zeros(dim: usize) -> Self {
        Self {
            params: vec![0.0; dim],
            derivs: vec![0.0; dim],
        }
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        let derivs = vec![0.0; values.len()];
        Self {
            params: values,
            derivs,
        }
    }

    pub(crate) fn from_parts(params: Vec<f64>, derivs: Vec<f64>) -> Self {
        debug_assert_eq!(params.len(), derivs.len());
        Self { params, derivs }
    }

    /// 以 N(0, std_dev²) 随机初始化一个 `dim` 维参数向量
    pub fn initialize<R: Rng + ?Sized>(
        dim: usize,
        std_dev: f64,
        rng: &mut R,
    ) -> Result<Self, NetError> {
        let mut pv = Self::zeros(dim);
        pv.randomize(std_dev, rng)?;
        Ok(pv)
    }

    pub fn paramdim(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &[f64] {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut [f64] {
        &mut self.params
    }

    pub fn derivs(&self) -> &[f64] {
        &self.derivs
    }

    pub fn derivs_mut(&mut self) -> &mut [f64] {
        &mut self.derivs
    }

    /// 同时借出只读参数与可写导数（反向传播时使用）
    pub fn split_mut(&mut self) -> (&[f64], &mut [f64]) {
        (&self.params, &mut self.derivs)
    }

    /// 整体替换参数值，长度必须一致
    pub fn set_parameters(&mut self, values: &[f64]) -> Result<(), NetError> {
        if values.len() != self.params.len() {
            return Err(NetError::DimensionMismatch {
                expected: self.params.len(),
                got: values.len(),
                message: "参数向量长度与 paramdim 不一致".to_string(),
            });
        }
        self.params.copy_from_slice(values);
        Ok(())
    }

    pub fn reset_derivatives(&mut self) {
        self.derivs.iter_mut().for_each(|d| *d = 0.0);
    }

    /// 用 N(0, std_dev²) 重新采样全部参数
    pub fn randomize<R: Rng + ?Sized>(&mut self, std_dev: f64, rng: &mut R) -> Result<(), NetError> {
        let normal = gaussian(std_dev)?;
        for p in &mut self.params {
            *p = normal.sample(rng);
        }
        Ok(())
    }

    /// 在现有参数上叠加 N(0, std_dev²) 噪声
    pub fn mutate<R: Rng + ?Sized>(&mut self, std_dev: f64, rng: &mut R) -> Result<(), NetError> {
        let normal = gaussian(std_dev)?;
        for p in &mut self.params {
            *p += normal.sample(rng);
        }
        Ok(())
    }
}

fn gaussian(std_dev: f64) -> Result<Normal<f64>, NetError> {
    // Normal::new 只拒绝非有限值，负数需要自己检查
    if !(std_dev.is_finite() && std_dev >= 0.0) {
        return Err(NetError::InvalidOperation(format!(
            "无效的标准差 {}：必须是非负有限数",
            std_dev
        )));
    }
    Normal::new(0.0, std_dev).map_err(|e| {
        NetError::InvalidOperation(format!("无效的标准差 {}：{}", std_dev, e))
    })
}

/// 参数在父级扁平数组中的区间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ParamView {
    offset: usize,
    len: usize,
}

impl ParamView {
    pub(crate) const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    pub(crate) const fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// 参数的存储形态：尚未并入网络时自己拥有，并入后只是父级数组上的一个视图
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ParamStore {
    Owned(ParameterVector),
    View(ParamView),
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::Owned(ParameterVector::default())
    }
}

impl ParamStore {
    pub(crate) fn paramdim(&self) -> usize {
        match self {
            Self::Owned(pv) => pv.paramdim(),
            Self::View(view) => view.len,
        }
    }

    pub(crate) const fn is_view(&self) -> bool {
        matches!(self, Self::View(_))
    }

    /// 在父级数组中的区间；无参数的组件恒为空区间
    pub(crate) fn range(&self, owner: &str) -> Result<Range<usize>, NetError> {
        match self {
            Self::View(view) => Ok(view.range()),
            Self::Owned(pv) if pv.paramdim() == 0 => Ok(0..0),
            Self::Owned(_) => Err(NetError::NotSorted(format!(
                "{}（参数尚未并入所在网络的扁平数组）",
                owner
            ))),
        }
    }

    /// 取出当前的参数值与导数：自有的直接克隆，视图则从父级旧数组中切出
    pub(crate) fn extract(
        &self,
        parent: &ParameterVector,
        owner: &str,
    ) -> Result<ParameterVector, NetError> {
        match self {
            Self::Owned(pv) => Ok(pv.clone()),
            Self::View(view) => {
                let range = view.range();
                match (
                    parent.params().get(range.clone()),
                    parent.derivs().get(range),
                ) {
                    (Some(params), Some(derivs)) => {
                        Ok(ParameterVector::from_parts(params.to_vec(), derivs.to_vec()))
                    }
                    _ => Err(NetError::DimensionMismatch {
                        expected: view.offset + view.len,
                        got: parent.paramdim(),
                        message: format!("{} 的参数区间超出了父级数组", owner),
                    }),
                }
            }
        }
    }

    /// 暂时取走自有的参数向量；视图形态说明组件已被嵌入，不能由自己驱动
    pub(crate) fn take_owned(&mut self, owner: &str) -> Result<ParameterVector, NetError> {
        match std::mem::take(self) {
            Self::Owned(pv) => Ok(pv),
            view => {
                *self = view;
                Err(NetError::OwnershipViolation(format!(
                    "{} 已嵌入其他网络，只能通过最外层网络驱动",
                    owner
                )))
            }
        }
    }

    pub(crate) fn owned(&self) -> Option<&ParameterVector> {
        match self {
            Self::Owned(pv) => Some(pv),
            Self::View(_) => None,
        }
    }

    pub(crate) fn owned_mut(&mut self) -> Option<&mut ParameterVector> {
        match self {
            Self::Owned(pv) => Some(pv),
            Self::View(_) => None,
        }
    }
}

/// 在扁平数组中按区间取只读切片
pub(crate) fn sub<'a>(
    params: &'a [f64],
    range: Range<usize>,
    owner: &str,
) -> Result<&'a [f64], NetError> {
    let len = params.len();
    params
        .get(range.clone())
        .ok_or_else(|| out_of_range(range, len, owner))
}

/// 在扁平数组中按区间取可写切片
pub(crate) fn sub_mut<'a>(
    params: &'a mut [f64],
    range: Range<usize>,
    owner: &str,
) -> Result<&'a mut [f64], NetError> {
    let len = params.len();
    params
        .get_mut(range.clone())
        .ok_or_else(|| out_of_range(range, len, owner))
}

fn out_of_range(range: Range<usize>, len: usize, owner: &str) -> NetError {
    NetError::DimensionMismatch {
        expected: range.end,
        got: len,
        message: format!("{} 的参数区间 {:?} 超出了数组长度", owner, range),
    }
}
