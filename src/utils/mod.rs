//! # 常用接口模块
//!
//! 本模块提供一些测试中常用的宏

pub mod macro_for_unit_test;
