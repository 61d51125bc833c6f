// crates/af_physics/src/assembly/atomic.rs

//! 原子通量累加器
//!
//! 显式路径的并行散布：用 compare-exchange 循环在 `AtomicU64`
//! 的位表示上实现 f64 原子加法，线程间无锁无竞争写。
//!
//! 注意浮点求和顺序随线程调度变化——跨线程数的位级可复现性
//! 不是目标（隐式路径的有序串行散布才提供确定性）。

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{FluxVector, N_VAR};

/// f64 原子加法（CAS 循环，标量累加器也复用）
#[inline]
pub fn atomic_add_f64(atomic: &AtomicU64, val: f64) {
    let mut old = atomic.load(Ordering::Relaxed);
    loop {
        let new = (f64::from_bits(old) + val).to_bits();
        match atomic.compare_exchange_weak(old, new, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break,
            Err(x) => old = x,
        }
    }
}

/// 原子残差累加器
pub struct AtomicResidual {
    n_points: usize,
    bits: Vec<AtomicU64>,
}

impl AtomicResidual {
    /// 创建并清零
    pub fn new(n_points: usize) -> Self {
        Self {
            n_points,
            bits: (0..n_points * N_VAR).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    /// 点数
    #[inline]
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// 全部清零
    pub fn reset(&self) {
        for a in &self.bits {
            a.store(0f64.to_bits(), Ordering::Relaxed);
        }
    }

    /// 向点 i 累加一个块（线程安全）
    pub fn add(&self, i: usize, f: &FluxVector) {
        for k in 0..N_VAR {
            atomic_add_f64(&self.bits[i * N_VAR + k], f[k]);
        }
    }

    /// 边通量反对称散布: +flux 到 i, −flux 到 j（线程安全）
    pub fn accumulate_edge(&self, i: usize, j: usize, flux: &FluxVector) {
        for k in 0..N_VAR {
            atomic_add_f64(&self.bits[i * N_VAR + k], flux[k]);
            atomic_add_f64(&self.bits[j * N_VAR + k], -flux[k]);
        }
    }

    /// 收集为普通块向量
    pub fn collect(&self) -> Vec<FluxVector> {
        (0..self.n_points)
            .map(|i| {
                let mut blk = [0.0; N_VAR];
                for k in 0..N_VAR {
                    blk[k] = f64::from_bits(self.bits[i * N_VAR + k].load(Ordering::Relaxed));
                }
                blk
            })
            .collect()
    }
}
