// apps/af_cli/src/commands/run.rs

//! run 子命令：加载配置、构建网格与驱动器、推进到收敛

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tracing::info;

use af_config::SolverConfig;
use af_mesh::NoHalo;
use af_physics::solver::RunStatus;

/// run 参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径 (JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// 收敛历史 CSV 输出路径
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// 结束时写出的重启快照路径
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

/// 执行 run
pub fn execute(args: RunArgs) -> anyhow::Result<()> {
    let config = SolverConfig::from_file(&args.config)
        .with_context(|| format!("加载配置 {} 失败", args.config.display()))?;

    let mesh = Arc::new(config.build_mesh().context("网格生成失败")?);
    info!(
        "网格: {} 点, {} 边, {} 个边界标记",
        mesh.n_points(),
        mesh.n_edges(),
        mesh.markers().len()
    );

    let mut driver = config
        .build_driver(mesh, Box::new(NoHalo))
        .context("驱动器构建失败")?;

    let report = driver.run().context("求解失败")?;
    match report.status {
        RunStatus::Converged => info!("收敛于 {} 次迭代", report.iterations),
        RunStatus::IterationLimitReached => {
            info!("到达迭代上限 {}，接受最后迭代解", report.iterations)
        }
    }
    info!(
        "残差下降 {:.2} 个量级, 线性求解未达容差 {} 次",
        driver.history().orders_reduced(),
        driver.history().linear_cap_hits
    );

    if let Some(path) = &args.history {
        std::fs::write(path, driver.history().to_csv())
            .with_context(|| format!("写出收敛历史 {} 失败", path.display()))?;
        info!("收敛历史已写出: {}", path.display());
    }
    if let Some(path) = &args.snapshot {
        driver
            .save_restart(path)
            .with_context(|| format!("写出重启快照 {} 失败", path.display()))?;
        info!("重启快照已写出: {}", path.display());
    }

    Ok(())
}
