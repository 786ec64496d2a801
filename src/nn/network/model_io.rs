/*
 * @Author       : 老董
 * @Date         : 2026-03-08
 * @Description  : Network 模型与参数文件的保存/加载
 *
 * - save_model/load_model：完整模型（结构 + 参数）写成一个 JSON 文件
 * - save_params/load_params：只写扁平参数数组（魔数 + 版本 + bincode 负载），
 *   加载时要求网络结构（参数布局）与保存时一致
 */

use super::Network;
use crate::nn::NetError;
use crate::nn::descriptor::NetworkDescriptor;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// 参数文件的负载：布局（组件名 + 长度）与参数值
#[derive(Debug, Serialize, Deserialize)]
struct ParamsPayload {
    layout: Vec<(String, usize)>,
    values: Vec<f64>,
}

impl Network {
    /// 参数文件魔数
    const PARAMS_MAGIC: &'static [u8; 4] = b"MNPR";
    /// 参数文件版本
    const PARAMS_VERSION: u32 = 1;

    /// 保存完整模型（结构与参数）为 JSON
    ///
    /// # 示例
    /// ```ignore
    /// net.save_model("models/xor.json")?;
    /// let restored = Network::load_model("models/xor.json")?;
    /// ```
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<(), NetError> {
        let json = self.describe()?.to_json()?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// 从 JSON 文件重建完整模型（已排序）
    pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Self, NetError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let descriptor = NetworkDescriptor::from_json(&json)?;
        Self::from_descriptor(&descriptor)
    }

    /// 保存扁平参数数组到二进制文件
    pub fn save_params<P: AsRef<Path>>(&self, path: P) -> Result<(), NetError> {
        let payload = ParamsPayload {
            layout: self
                .param_layout()?
                .into_iter()
                .map(|(name, range)| (name, range.len()))
                .collect(),
            values: self.params()?.to_vec(),
        };

        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        writer.write_all(Self::PARAMS_MAGIC)?;
        writer.write_all(&Self::PARAMS_VERSION.to_le_bytes())?;
        bincode::serialize_into(&mut writer, &payload)?;
        writer.flush()?;
        Ok(())
    }

    /// 从二进制文件加载参数到本网络
    pub fn load_params<P: AsRef<Path>>(&mut self, path: P) -> Result<(), NetError> {
        let mut reader = BufReader::new(File::open(path.as_ref())?);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != Self::PARAMS_MAGIC {
            return Err(NetError::Serialization(
                "无效的参数文件：缺少 MNPR 魔数，请确认文件由 save_params() 生成".to_string(),
            ));
        }
        let mut version_bytes = [0u8; 4];
        reader.read_exact(&mut version_bytes)?;
        let version = u32::from_le_bytes(version_bytes);
        if version != Self::PARAMS_VERSION {
            return Err(NetError::Serialization(format!(
                "不支持的参数文件版本：{}",
                version
            )));
        }

        let payload: ParamsPayload = bincode::deserialize_from(&mut reader)?;
        let layout: Vec<(String, usize)> = self
            .param_layout()?
            .into_iter()
            .map(|(name, range)| (name, range.len()))
            .collect();
        if layout != payload.layout {
            return Err(NetError::InvalidOperation(format!(
                "参数文件的布局与网络 {} 不一致",
                self.core.name
            )));
        }
        self.set_parameters(&payload.values)
    }
}
