// crates/af_physics/src/numerics/linear_algebra/bicgstab.rs

//! 预条件 BiCGStab 迭代求解器
//!
//! 适用于非对称系统（上风离散的 Jacobian）。工作向量在求解器内
//! 预分配，solve 内不做堆分配。
//!
//! 达到迭代上限而未到容差是正常结果而非错误：部分收敛的解仍被
//! 返回并由调用方使用（稳健性/性能权衡），状态记录在
//! [`SolverStatus::MaxIterationsReached`] 中。

use af_foundation::Tolerance;
use serde::{Deserialize, Serialize};

use super::bcsr::BlockCsrMatrix;
use super::preconditioner::Preconditioner;
use super::vector_ops::{axpy, copy, dot, norm2};

/// 求解器配置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SolverControl {
    /// 相对收敛容差
    pub rtol: f64,
    /// 绝对收敛容差
    pub atol: f64,
    /// 最大迭代次数
    pub max_iter: usize,
}

impl Default for SolverControl {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-14,
            max_iter: 100,
        }
    }
}

/// 求解状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// 收敛
    Converged,
    /// 达到最大迭代次数（非致命，解仍可用）
    MaxIterationsReached,
    /// 发散
    Diverged,
    /// 停滞（正交性破坏）
    Stagnated,
}

/// 求解结果
#[derive(Debug, Clone, Copy)]
pub struct SolverResult {
    /// 求解状态
    pub status: SolverStatus,
    /// 迭代次数
    pub iterations: usize,
    /// 最终残差范数
    pub residual_norm: f64,
    /// 初始残差范数
    pub initial_residual_norm: f64,
}

impl SolverResult {
    /// 是否收敛
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }
}

/// BiCGStab 求解器（带预分配工作区）
pub struct BiCgStab {
    control: SolverControl,
    r: Vec<f64>,
    r0: Vec<f64>,
    p: Vec<f64>,
    v: Vec<f64>,
    s: Vec<f64>,
    t: Vec<f64>,
    p_hat: Vec<f64>,
    s_hat: Vec<f64>,
}

impl BiCgStab {
    /// 创建求解器
    pub fn new(control: SolverControl) -> Self {
        Self {
            control,
            r: Vec::new(),
            r0: Vec::new(),
            p: Vec::new(),
            v: Vec::new(),
            s: Vec::new(),
            t: Vec::new(),
            p_hat: Vec::new(),
            s_hat: Vec::new(),
        }
    }

    /// 求解配置
    pub fn control(&self) -> &SolverControl {
        &self.control
    }

    fn ensure_workspace(&mut self, n: usize) {
        if self.r.len() != n {
            self.r = vec![0.0; n];
            self.r0 = vec![0.0; n];
            self.p = vec![0.0; n];
            self.v = vec![0.0; n];
            self.s = vec![0.0; n];
            self.t = vec![0.0; n];
            self.p_hat = vec![0.0; n];
            self.s_hat = vec![0.0; n];
        }
    }

    /// 求解 A·x = b
    ///
    /// # 参数
    /// - `matrix`: 系数矩阵
    /// - `b`: 右端项
    /// - `x`: 解向量（输入初始猜测，输出解）
    /// - `precond`: 预条件器
    pub fn solve<P: Preconditioner>(
        &mut self,
        matrix: &BlockCsrMatrix,
        b: &[f64],
        x: &mut [f64],
        precond: &P,
    ) -> SolverResult {
        let n = b.len();
        self.ensure_workspace(n);
        let SolverControl {
            rtol,
            atol,
            max_iter,
        } = self.control;
        let tiny = Tolerance::default().stagnation;

        // r = b − A·x
        matrix.mul_vec(x, &mut self.r);
        for i in 0..n {
            self.r[i] = b[i] - self.r[i];
        }
        copy(&self.r, &mut self.r0);

        let initial_norm = norm2(&self.r);
        if initial_norm < atol {
            return SolverResult {
                status: SolverStatus::Converged,
                iterations: 0,
                residual_norm: initial_norm,
                initial_residual_norm: initial_norm,
            };
        }

        let mut rho_prev = 1.0;
        let mut alpha = 1.0;
        let mut omega = 1.0;
        self.p.fill(0.0);
        self.v.fill(0.0);

        for iter in 0..max_iter {
            let rho = dot(&self.r0, &self.r);
            if rho.abs() < tiny {
                return self.finish(SolverStatus::Stagnated, iter, initial_norm);
            }

            if iter == 0 {
                copy(&self.r, &mut self.p);
            } else {
                let beta = (rho / rho_prev) * (alpha / omega);
                for i in 0..n {
                    self.p[i] = self.r[i] + beta * (self.p[i] - omega * self.v[i]);
                }
            }

            precond.apply(&self.p, &mut self.p_hat);
            matrix.mul_vec(&self.p_hat, &mut self.v);

            let r0v = dot(&self.r0, &self.v);
            if r0v.abs() < tiny {
                return self.finish(SolverStatus::Stagnated, iter, initial_norm);
            }
            alpha = rho / r0v;

            for i in 0..n {
                self.s[i] = self.r[i] - alpha * self.v[i];
            }

            // 提前收敛检查（半步）
            let s_norm = norm2(&self.s);
            if s_norm < atol || s_norm / initial_norm < rtol {
                axpy(alpha, &self.p_hat, x);
                return SolverResult {
                    status: SolverStatus::Converged,
                    iterations: iter + 1,
                    residual_norm: s_norm,
                    initial_residual_norm: initial_norm,
                };
            }

            precond.apply(&self.s, &mut self.s_hat);
            matrix.mul_vec(&self.s_hat, &mut self.t);

            let tt = dot(&self.t, &self.t);
            if tt.abs() < tiny {
                return self.finish(SolverStatus::Stagnated, iter, initial_norm);
            }
            omega = dot(&self.t, &self.s) / tt;

            axpy(alpha, &self.p_hat, x);
            axpy(omega, &self.s_hat, x);

            for i in 0..n {
                self.r[i] = self.s[i] - omega * self.t[i];
            }

            let res_norm = norm2(&self.r);
            log::trace!("BiCGStab iter {}: residual = {:.6e}", iter + 1, res_norm);

            if res_norm < atol || res_norm / initial_norm < rtol {
                return SolverResult {
                    status: SolverStatus::Converged,
                    iterations: iter + 1,
                    residual_norm: res_norm,
                    initial_residual_norm: initial_norm,
                };
            }
            if !res_norm.is_finite() || res_norm > 1e12 * initial_norm {
                return self.finish(SolverStatus::Diverged, iter + 1, initial_norm);
            }
            if omega.abs() < tiny {
                return self.finish(SolverStatus::Stagnated, iter + 1, initial_norm);
            }
            rho_prev = rho;
        }

        self.finish(SolverStatus::MaxIterationsReached, max_iter, initial_norm)
    }

    fn finish(&self, status: SolverStatus, iterations: usize, initial_norm: f64) -> SolverResult {
        SolverResult {
            status,
            iterations,
            residual_norm: norm2(&self.r),
            initial_residual_norm: initial_norm,
        }
    }
}
