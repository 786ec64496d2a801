/*
 * @Author       : 老董
 * @Date         : 2026-03-09
 * @Description  : 数值梯度校验：比较反向传播得到的导数与中心差分的数值导数
 *
 * 损失取 L = ½·Σ(y - target)²，因此每个时间步的输出误差为 y - target。
 */

use super::module::Activatable;
use super::{NetError, Network};
use std::ops::Range;

/// 一条序列：每个时间步的 (输入, 目标输出)
pub type Sequence = Vec<(Vec<f64>, Vec<f64>)>;

/// 梯度校验结果
#[derive(Debug, Clone)]
pub struct GradientReport {
    /// 反向传播累加出的导数
    pub analytic: Vec<f64>,
    /// 中心差分得到的导数
    pub numeric: Vec<f64>,
    /// 参数布局，用于定位误差最大的组件
    pub layout: Vec<(String, Range<usize>)>,
}

impl GradientReport {
    /// 逐分量误差 |a - n| / max(1, |a|, |n|) 的最大值
    pub fn max_error(&self) -> f64 {
        self.errors().fold(0.0, f64::max)
    }

    pub fn is_ok(&self, tolerance: f64) -> bool {
        self.max_error() <= tolerance
    }

    /// 误差最大的参数所在组件
    pub fn worst_component(&self) -> Option<&str> {
        let (index, _) = self
            .errors()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        self.layout
            .iter()
            .find(|(_, range)| range.contains(&index))
            .map(|(name, _)| name.as_str())
    }

    fn errors(&self) -> impl Iterator<Item = f64> + '_ {
        self.analytic
            .iter()
            .zip(&self.numeric)
            .map(|(&a, &n)| (a - n).abs() / 1f64.max(a.abs()).max(n.abs()))
    }
}

/// 对最外层网络做梯度校验
///
/// 前馈网络逐样本 activate/back_activate；循环网络先前向整条序列，再按时间倒序反向。
/// 校验结束后网络参数保持不变，缓冲区被 reset，导数中保留解析梯度。
pub fn check_gradient(
    net: &mut Network,
    sequences: &[Sequence],
    epsilon: f64,
) -> Result<GradientReport, NetError> {
    net.reset_derivatives()?;
    for sequence in sequences {
        accumulate_derivs(net, sequence)?;
    }
    let analytic = net.derivs()?.to_vec();

    let mut numeric = vec![0.0; analytic.len()];
    for (i, slot) in numeric.iter_mut().enumerate() {
        let original = net.params()?[i];
        net.params_mut()?[i] = original + epsilon;
        let plus = total_loss(net, sequences);
        net.params_mut()?[i] = original - epsilon;
        let minus = total_loss(net, sequences);
        net.params_mut()?[i] = original;
        *slot = (plus? - minus?) / (2.0 * epsilon);
    }
    net.reset();

    Ok(GradientReport {
        analytic,
        numeric,
        layout: net.param_layout()?,
    })
}

fn output_error(output: &[f64], target: &[f64]) -> Result<Vec<f64>, NetError> {
    if output.len() != target.len() {
        return Err(NetError::DimensionMismatch {
            expected: output.len(),
            got: target.len(),
            message: "目标输出长度与网络输出维度不一致".to_string(),
        });
    }
    Ok(output.iter().zip(target).map(|(y, t)| y - t).collect())
}

fn accumulate_derivs(net: &mut Network, sequence: &Sequence) -> Result<(), NetError> {
    net.reset();
    if !net.kind().is_recurrent() {
        for (input, target) in sequence {
            let output = net.activate(input)?;
            net.back_activate(&output_error(&output, target)?)?;
        }
        return Ok(());
    }

    let mut errors = Vec::with_capacity(sequence.len());
    for (input, target) in sequence {
        let output = net.activate(input)?;
        errors.push(output_error(&output, target)?);
    }
    for error in errors.iter().rev() {
        net.back_activate(error)?;
    }
    Ok(())
}

/// ½·Σ(y - target)²，对所有序列求和
pub fn total_loss(net: &mut Network, sequences: &[Sequence]) -> Result<f64, NetError> {
    let mut loss = 0.0;
    for sequence in sequences {
        net.reset();
        for (input, target) in sequence {
            let output = net.activate(input)?;
            loss += 0.5
                * output_error(&output, target)?
                    .iter()
                    .map(|e| e * e)
                    .sum::<f64>();
        }
    }
    Ok(loss)
}
