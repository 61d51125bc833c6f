// apps/af_cli/src/commands/validate.rs

//! validate 子命令：只做配置校验，不运行

use std::path::PathBuf;

use clap::Args;

use af_config::SolverConfig;

/// validate 参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径 (JSON)
    #[arg(short, long)]
    pub config: PathBuf,
}

/// 执行 validate
pub fn execute(args: ValidateArgs) -> anyhow::Result<()> {
    match SolverConfig::from_file(&args.config) {
        Ok(_) => {
            println!("配置有效: {}", args.config.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("配置无效: {}", e);
            std::process::exit(1);
        }
    }
}
