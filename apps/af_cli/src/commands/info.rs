// apps/af_cli/src/commands/info.rs

//! info 子命令：打印配置摘要

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use af_config::SolverConfig;

/// info 参数
#[derive(Args)]
pub struct InfoArgs {
    /// 配置文件路径 (JSON)
    #[arg(short, long)]
    pub config: PathBuf,
}

/// 执行 info
pub fn execute(args: InfoArgs) -> anyhow::Result<()> {
    let config = SolverConfig::from_file(&args.config)
        .with_context(|| format!("加载配置 {} 失败", args.config.display()))?;

    println!("AeroFlux 配置摘要");
    println!("  对流格式:   {:?}", config.numerics.convective_scheme);
    println!(
        "  重构:       {}",
        if config.numerics.muscl {
            format!("MUSCL + {:?}", config.numerics.limiter)
        } else {
            "一阶".to_string()
        }
    );
    println!("  梯度:       {:?}", config.numerics.gradient);
    println!("  黏性:       {}", config.physics.viscous);
    println!("  湍流闭合:   {:?}", config.physics.turbulence);
    println!(
        "  自由流:     rho={} v=({}, {}) p={}",
        config.freestream.density,
        config.freestream.velocity[0],
        config.freestream.velocity[1],
        config.freestream.pressure
    );
    println!(
        "  CFL:        start={} band=[{}, {}]",
        config.time.cfl.start, config.time.cfl.min, config.time.cfl.max
    );
    println!(
        "  线性求解:   rtol={} max_iter={}",
        config.linear_solver.rtol, config.linear_solver.max_iter
    );
    println!("  网格:       {}x{} 点", config.mesh.nx, config.mesh.ny);
    println!("  边界条件:   {} 个标记", config.markers.len());
    for m in &config.markers {
        let wf = if m.wall_function { " [壁面函数]" } else { "" };
        println!("    {} -> {}{}", m.name, m.kind, wf);
    }

    Ok(())
}
