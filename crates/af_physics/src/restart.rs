// crates/af_physics/src/restart.rs

//! 重启快照读写
//!
//! 二进制布局（小端）:
//! - 魔数 `AFRS` (4 字节)
//! - 版本 u32
//! - 点数 u64
//! - 每点变量数 u64
//! - 逐点守恒量记录，固定变量序: 密度、动量分量、总能
//!
//! 载入时做结构一致性检查：点数/变量数不匹配是致命错误。

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use af_foundation::{AfError, AfResult};

use crate::fluid::Conserved;
use crate::state::FlowField;
use crate::N_VAR;

/// 文件魔数
const MAGIC: [u8; 4] = *b"AFRS";
/// 格式版本
const VERSION: u32 = 1;

/// 写出重启快照
pub fn save(path: &Path, field: &FlowField) -> AfResult<()> {
    let file = File::create(path)
        .map_err(|e| AfError::io(format!("无法创建重启文件 {}: {}", path.display(), e)))?;
    let mut w = BufWriter::new(file);

    w.write_all(&MAGIC)?;
    w.write_all(&VERSION.to_le_bytes())?;
    w.write_all(&(field.n_points() as u64).to_le_bytes())?;
    w.write_all(&(N_VAR as u64).to_le_bytes())?;

    for i in 0..field.n_points() {
        for v in field.conserved(i).to_array() {
            w.write_all(&v.to_le_bytes())?;
        }
    }
    w.flush()?;
    Ok(())
}

/// 载入重启快照
///
/// # 错误
///
/// - 魔数/版本不符: [`AfError::Io`]
/// - 点数或变量数与当前网格不匹配: [`AfError::RestartMismatch`]（致命）
pub fn load(path: &Path, expected_points: usize) -> AfResult<Vec<Conserved>> {
    let file = File::open(path)
        .map_err(|e| AfError::io(format!("无法打开重启文件 {}: {}", path.display(), e)))?;
    let mut r = BufReader::new(file);

    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(AfError::io(format!(
            "{} 不是 AeroFlux 重启文件",
            path.display()
        )));
    }

    let mut u32_buf = [0u8; 4];
    r.read_exact(&mut u32_buf)?;
    let version = u32::from_le_bytes(u32_buf);
    if version != VERSION {
        return Err(AfError::io(format!(
            "重启文件版本 {} 不受支持（当前 {}）",
            version, VERSION
        )));
    }

    let mut u64_buf = [0u8; 8];
    r.read_exact(&mut u64_buf)?;
    let n_points = u64::from_le_bytes(u64_buf) as usize;
    r.read_exact(&mut u64_buf)?;
    let n_vars = u64::from_le_bytes(u64_buf) as usize;

    if n_points != expected_points || n_vars != N_VAR {
        return Err(AfError::RestartMismatch {
            path: path.to_path_buf(),
            found_points: n_points,
            found_vars: n_vars,
            expected_points,
            expected_vars: N_VAR,
        });
    }

    let mut out = Vec::with_capacity(n_points);
    let mut f64_buf = [0u8; 8];
    for _ in 0..n_points {
        let mut arr = [0.0; N_VAR];
        for a in arr.iter_mut() {
            r.read_exact(&mut f64_buf)?;
            *a = f64::from_le_bytes(f64_buf);
        }
        out.push(Conserved::from_array(arr));
    }
    Ok(out)
}
