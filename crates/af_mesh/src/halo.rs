// crates/af_mesh/src/halo.rs

//! Halo 交换抽象
//!
//! 分布式并行（区域分解）在本层之下实现；求解器核心只依赖这组窄原语：
//! 按名称交换一个逐点字段、全局归约、判定本进程是否为报告进程。
//!
//! 单分区运行使用 [`NoHalo`]（所有操作为恒等）。

use af_foundation::AfResult;

/// Halo 交换与全局归约原语
///
/// 实现必须保证 `exchange_point_field` 返回后，所有 halo 点
/// 持有其属主分区的最新值（同步语义，内部可以分 initiate/complete 两段）。
pub trait HaloExchange: Send + Sync {
    /// 交换一个逐点字段
    ///
    /// # 参数
    /// - `name`: 字段名（通信调度标识）
    /// - `components`: 每点分量数
    /// - `data`: 长度 = 点数 × 分量数 的扁平数组
    fn exchange_point_field(&self, name: &str, components: usize, data: &mut [f64])
        -> AfResult<()>;

    /// 全局浮点求和归约
    fn reduce_sum_f64(&self, local: f64) -> f64;

    /// 全局整型求和归约（诊断计数器用）
    fn reduce_sum_u64(&self, local: u64) -> u64;

    /// 本进程是否为指定的报告进程
    ///
    /// 诊断信息只在报告进程上输出一次，避免重复消息。
    fn is_master(&self) -> bool;
}

/// 单分区实现：无通信
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHalo;

impl NoHalo {
    /// 创建单分区 halo 实现
    pub fn new() -> Self {
        Self
    }
}

impl HaloExchange for NoHalo {
    fn exchange_point_field(
        &self,
        _name: &str,
        _components: usize,
        _data: &mut [f64],
    ) -> AfResult<()> {
        Ok(())
    }

    fn reduce_sum_f64(&self, local: f64) -> f64 {
        local
    }

    fn reduce_sum_u64(&self, local: u64) -> u64 {
        local
    }

    fn is_master(&self) -> bool {
        true
    }
}
