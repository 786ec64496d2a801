/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : 按时间索引的缓冲区（行 = 时间步，列 = 维度）
 */

use ndarray::{Array2, ArrayView1, ArrayViewMut1, s};
use std::ops::Range;

/// 二维缓冲区：第 t 行存放时间步 t 的数据
///
/// 容量不足时按倍数扩展，已有行的数据原样保留。
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    data: Array2<f64>,
}

impl Buffer {
    pub fn new(rows: usize, dim: usize) -> Self {
        Self {
            data: Array2::zeros((rows, dim)),
        }
    }

    /// 当前可用的时间步数
    pub fn capacity(&self) -> usize {
        self.data.nrows()
    }

    pub fn dim(&self) -> usize {
        self.data.ncols()
    }

    pub fn row(&self, t: usize) -> ArrayView1<'_, f64> {
        self.data.row(t)
    }

    pub fn row_mut(&mut self, t: usize) -> ArrayViewMut1<'_, f64> {
        self.data.row_mut(t)
    }

    pub fn slice(&self, t: usize, range: Range<usize>) -> ArrayView1<'_, f64> {
        self.data.slice(s![t, range])
    }

    pub fn slice_mut(&mut self, t: usize, range: Range<usize>) -> ArrayViewMut1<'_, f64> {
        self.data.slice_mut(s![t, range])
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    /// 容量翻倍（0 行时扩到 1 行），旧数据复制到新缓冲区的前部
    pub fn grow(&mut self) {
        let rows = self.capacity();
        let mut data = Array2::zeros(((rows * 2).max(1), self.dim()));
        data.slice_mut(s![..rows, ..]).assign(&self.data);
        self.data = data;
    }

    /// 全部清零，容量不变
    pub fn zero(&mut self) {
        self.data.fill(0.0);
    }

    /// 重新分配为 `rows` 行的零缓冲区
    pub fn resize(&mut self, rows: usize) {
        self.data = Array2::zeros((rows, self.dim()));
    }

    /// 所有行整体前移一行，最后一行清零（遗忘模式使用）
    pub fn shift_left(&mut self) {
        let rows = self.capacity();
        if rows == 0 {
            return;
        }
        let shifted = self.data.slice(s![1.., ..]).to_owned();
        self.data.slice_mut(s![..rows - 1, ..]).assign(&shifted);
        self.data.row_mut(rows - 1).fill(0.0);
    }
}

/// 每个模块都有的四个标准缓冲区，外加按需声明的额外缓冲区
///
/// 所有缓冲区始终保持相同的行数，扩容/清零/移位总是同步进行。
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleBuffers {
    pub(crate) input: Buffer,
    pub(crate) output: Buffer,
    pub(crate) inerror: Buffer,
    pub(crate) outerror: Buffer,
    extra: Vec<(String, Buffer)>,
}

impl ModuleBuffers {
    pub fn new(indim: usize, outdim: usize, rows: usize) -> Self {
        Self {
            input: Buffer::new(rows, indim),
            output: Buffer::new(rows, outdim),
            inerror: Buffer::new(rows, indim),
            outerror: Buffer::new(rows, outdim),
            extra: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.input.capacity()
    }

    pub fn input(&self) -> &Buffer {
        &self.input
    }

    pub fn output(&self) -> &Buffer {
        &self.output
    }

    pub fn inerror(&self) -> &Buffer {
        &self.inerror
    }

    pub fn outerror(&self) -> &Buffer {
        &self.outerror
    }

    /// 声明一个额外缓冲区；同名再次声明时按新维度重建
    pub fn declare(&mut self, name: &str, dim: usize) {
        let buffer = Buffer::new(self.capacity(), dim);
        match self.extra.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = buffer,
            None => self.extra.push((name.to_string(), buffer)),
        }
    }

    pub fn extra(&self, name: &str) -> Option<&Buffer> {
        self.extra.iter().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    pub fn extra_mut(&mut self, name: &str) -> Option<&mut Buffer> {
        self.extra
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b)
    }

    pub fn extra_names(&self) -> impl Iterator<Item = &str> {
        self.extra.iter().map(|(n, _)| n.as_str())
    }

    fn all_mut(&mut self) -> impl Iterator<Item = &mut Buffer> {
        [
            &mut self.input,
            &mut self.output,
            &mut self.inerror,
            &mut self.outerror,
        ]
        .into_iter()
        .chain(self.extra.iter_mut().map(|(_, b)| b))
    }

    pub(crate) fn grow(&mut self) {
        self.all_mut().for_each(Buffer::grow);
    }

    pub(crate) fn zero(&mut self) {
        self.all_mut().for_each(Buffer::zero);
    }

    pub(crate) fn resize(&mut self, rows: usize) {
        self.all_mut().for_each(|b| b.resize(rows));
    }

    pub(crate) fn shift_left(&mut self) {
        self.all_mut().for_each(Buffer::shift_left);
    }

    /// 维度变化后（网络重新排序）重建四个标准缓冲区，额外缓冲区保持维度
    pub(crate) fn redim(&mut self, indim: usize, outdim: usize, rows: usize) {
        self.input = Buffer::new(rows, indim);
        self.output = Buffer::new(rows, outdim);
        self.inerror = Buffer::new(rows, indim);
        self.outerror = Buffer::new(rows, outdim);
        self.extra.iter_mut().for_each(|(_, b)| b.resize(rows));
    }
}
