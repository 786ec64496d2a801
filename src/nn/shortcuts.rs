/*
 * @Author       : 老董
 * @Date         : 2026-03-09
 * @Description  : 快捷构建：按层维度列表搭建一个全连接网络
 */

use super::connection::ConnectionSpec;
use super::module::kinds::{LinearLayer, SigmoidLayer};
use super::module::{Layer, LayerKind};
use super::params::DEFAULT_INIT_STD;
use super::{ModuleId, NetError, Network, NetworkKind};

/// `build_network` 的选项
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    /// 是否加入偏置单元（连接到每个隐藏层）
    pub bias: bool,
    /// 偏置单元是否也连接到输出层
    pub output_bias: bool,
    pub hidden: LayerKind,
    pub output: LayerKind,
    /// 构建循环网络（即使没有循环连接）
    pub recurrent: bool,
    /// 每个隐藏层加一条全连接的循环自连接（隐含 recurrent）
    pub recurrent_hidden: bool,
    /// 固定随机种子，使参数初始化可复现
    pub seed: Option<u64>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            bias: true,
            output_bias: true,
            hidden: SigmoidLayer.into(),
            output: LinearLayer.into(),
            recurrent: false,
            recurrent_hidden: false,
            seed: None,
        }
    }
}

impl BuildOptions {
    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_output_bias(mut self, output_bias: bool) -> Self {
        self.output_bias = output_bias;
        self
    }

    pub fn with_hidden(mut self, kind: impl Into<LayerKind>) -> Self {
        self.hidden = kind.into();
        self
    }

    pub fn with_output(mut self, kind: impl Into<LayerKind>) -> Self {
        self.output = kind.into();
        self
    }

    pub fn with_recurrent(mut self, recurrent: bool) -> Self {
        self.recurrent = recurrent;
        self
    }

    pub fn with_recurrent_hidden(mut self, recurrent_hidden: bool) -> Self {
        self.recurrent_hidden = recurrent_hidden;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// 按 `layers`（输入维度、若干隐藏层维度、输出维度）搭建并排序一个全连接网络
///
/// 模块命名为 `in`、`hidden0`、`hidden1`…、`out`、`bias`；相邻层之间是 FullConnection。
///
/// # 示例
/// ```ignore
/// let net = build_network(&[2, 3, 1], &BuildOptions::default().with_seed(42))?;
/// ```
pub fn build_network(layers: &[usize], options: &BuildOptions) -> Result<Network, NetError> {
    if layers.len() < 2 {
        return Err(NetError::InvalidOperation(format!(
            "build_network 至少需要输入层和输出层的维度，实际只给了 {} 个",
            layers.len()
        )));
    }
    let kind = if options.recurrent || options.recurrent_hidden {
        NetworkKind::Recurrent { forget: false }
    } else {
        NetworkKind::FeedForward
    };
    let mut net = match options.seed {
        Some(seed) => Network::with_kind_and_seed("network", kind, seed),
        None => Network::with_kind("network", kind),
    };

    let last = layers.len() - 1;
    let input = net.add_input_module(Layer::linear(layers[0], "in"))?;
    let output = net.add_output_module(Layer::new(options.output, layers[last], "out")?)?;
    let bias = if options.bias {
        let bias = net.add_module(Layer::bias("bias"))?;
        if options.output_bias {
            net.add_connection(ConnectionSpec::full(bias, output))?;
        }
        Some(bias)
    } else {
        None
    };

    let mut hidden: Vec<ModuleId> = Vec::with_capacity(last - 1);
    for (i, &dim) in layers[1..last].iter().enumerate() {
        let id = net.add_module(Layer::new(options.hidden, dim, &format!("hidden{}", i))?)?;
        if let Some(bias) = bias {
            net.add_connection(ConnectionSpec::full(bias, id))?;
        }
        hidden.push(id);
    }

    let mut prev = input;
    for &id in &hidden {
        net.add_connection(ConnectionSpec::full(prev, id))?;
        prev = id;
    }
    net.add_connection(ConnectionSpec::full(prev, output))?;

    if options.recurrent_hidden {
        for &id in &hidden {
            net.add_recurrent_connection(ConnectionSpec::full(id, id))?;
        }
    }

    net.sort_modules()?;
    if options.seed.is_some() {
        // 层自带的参数来自线程随机数，这里用网络的种子统一重采样
        net.randomize(DEFAULT_INIT_STD)?;
    }
    Ok(net)
}
