// crates/af_physics/tests/properties.rs

//! 求解核心的守恒/固定点性质端到端验证

use std::sync::Arc;

use glam::DVec2;

use af_mesh::topology::{Edge, MeshTopology, Point};
use af_mesh::{generation, NoHalo};
use af_physics::assembly::{EdgeSweep, Residual};
use af_physics::boundary::MarkerCondition;
use af_physics::fluid::{Conserved, IdealGas};
use af_physics::numerics::convective::ConvectiveSchemeKind;
use af_physics::numerics::gradient::{compute_gradients, GradientKind, GradientStorage};
use af_physics::numerics::limiter::LimiterKind;
use af_physics::solver::{ImplicitDriver, RunStatus, SolverSetup};
use af_physics::state::FlowField;
use af_physics::N_VAR;

fn gas() -> IdealGas {
    IdealGas::default()
}

/// 全封闭方腔 + 静止气体: 装配后的残差是零向量（定常均匀场是固定点）
#[test]
fn stagnant_gas_in_closed_box_has_zero_residual() {
    let mesh = Arc::new(generation::cartesian(6, 6, 1.0, 1.0).unwrap());
    let gas = gas();
    let freestream = gas.primitive_from_rho_vel_p(1.0, DVec2::new(10.0, 0.0), 101325.0, 0.0);

    let setup = SolverSetup {
        scheme: ConvectiveSchemeKind::Roe,
        viscous: false,
        muscl: false,
        limiter: LimiterKind::None,
        markers: vec![
            MarkerCondition::euler_wall("left"),
            MarkerCondition::euler_wall("right"),
            MarkerCondition::euler_wall("bottom"),
            MarkerCondition::euler_wall("top"),
        ],
        ..Default::default()
    };
    let mut driver =
        ImplicitDriver::new(mesh.clone(), gas, freestream, setup, Box::new(NoHalo)).unwrap();

    // 覆写为静止状态（静止气体精确满足带壁面的欧拉方程）
    let stagnant = Conserved {
        density: 1.0,
        momentum: DVec2::ZERO,
        energy: 101325.0 / 0.4,
    };
    for i in 0..mesh.n_points() {
        driver.field_mut().set_conserved(i, stagnant);
    }

    let residual = driver.evaluate_residual().unwrap();
    for i in 0..mesh.n_points() {
        for k in 0..N_VAR {
            assert!(
                residual.block(i)[k].abs() < 1e-7,
                "点 {} 分量 {} 残差 = {:e}",
                i,
                k,
                residual.block(i)[k]
            );
        }
    }
}

/// 均匀自由流 + 平行壁/远场: 残差为零（到浮点容差）
#[test]
fn uniform_freestream_is_fixed_point() {
    for scheme in [
        ConvectiveSchemeKind::Roe,
        ConvectiveSchemeKind::Hllc,
        ConvectiveSchemeKind::Ausm,
        ConvectiveSchemeKind::Rusanov,
    ] {
        let mesh = Arc::new(generation::cartesian(5, 5, 1.0, 1.0).unwrap());
        let gas = gas();
        // 水平流动: 与上下壁平行
        let freestream =
            gas.primitive_from_rho_vel_p(1.0, DVec2::new(50.0, 0.0), 101325.0, 0.0);

        let setup = SolverSetup {
            scheme,
            viscous: false,
            muscl: true,
            markers: vec![
                MarkerCondition::far_field("left"),
                MarkerCondition::far_field("right"),
                MarkerCondition::euler_wall("bottom"),
                MarkerCondition::euler_wall("top"),
            ],
            ..Default::default()
        };
        let mut driver =
            ImplicitDriver::new(mesh.clone(), gas, freestream, setup, Box::new(NoHalo))
                .unwrap();

        let residual = driver.evaluate_residual().unwrap();
        let rms = residual.rms_norms();
        for k in 0..N_VAR {
            // 通量量级 1e4 ~ 1e6: 1e-4 约相当于 1e-9 的相对残差
            assert!(
                rms[k] < 1e-4,
                "{:?} 分量 {} 的 RMS 残差 = {:e}",
                scheme,
                k,
                rms[k]
            );
        }
    }
}

/// 均匀自由流上驱动器立即判定收敛
#[test]
fn driver_converges_immediately_on_freestream() {
    let mesh = Arc::new(generation::cartesian(5, 4, 1.0, 0.8).unwrap());
    let gas = gas();
    let freestream = gas.primitive_from_rho_vel_p(1.0, DVec2::new(50.0, 0.0), 101325.0, 0.0);

    let setup = SolverSetup {
        viscous: false,
        muscl: false,
        markers: vec![
            MarkerCondition::far_field("left"),
            MarkerCondition::far_field("right"),
            MarkerCondition::euler_wall("bottom"),
            MarkerCondition::euler_wall("top"),
        ],
        convergence_tol: 1e-4,
        max_iterations: 5,
        ..Default::default()
    };
    let mut driver =
        ImplicitDriver::new(mesh, gas, freestream, setup, Box::new(NoHalo)).unwrap();

    let report = driver.run().unwrap();
    assert_eq!(report.status, RunStatus::Converged);
    assert!(report.iterations <= 2);
}

/// 迭代上限不是错误: 状态为 IterationLimitReached 且迭代解可用
#[test]
fn iteration_limit_is_not_an_error() {
    let mesh = Arc::new(generation::cartesian(4, 4, 1.0, 1.0).unwrap());
    let gas = gas();
    let freestream = gas.primitive_from_rho_vel_p(1.0, DVec2::new(100.0, 0.0), 101325.0, 0.0);

    let setup = SolverSetup {
        viscous: false,
        muscl: false,
        markers: vec![
            MarkerCondition::far_field("left"),
            MarkerCondition::far_field("right"),
            // 与流动不平行的强壁: 残差不会立即为零
            MarkerCondition::heat_flux_wall("bottom", 0.0),
            MarkerCondition::euler_wall("top"),
        ],
        convergence_tol: 1e-30,
        max_iterations: 3,
        ..Default::default()
    };
    let mut driver =
        ImplicitDriver::new(mesh, gas, freestream, setup, Box::new(NoHalo)).unwrap();

    let report = driver.run().unwrap();
    assert_eq!(report.status, RunStatus::IterationLimitReached);
    assert_eq!(report.iterations, 3);
    assert_eq!(driver.history().len(), 3);
    // 最后迭代解保持物理有效
    assert!(driver.field().conserved(0).is_finite());
}

/// 1-D 两点驻点边: 动量通量 = p·n，质量/能量净通量为零
#[test]
fn two_point_stagnation_edge_pure_pressure_flux() {
    let points = vec![
        Point {
            coord: DVec2::new(0.0, 0.0),
            volume: 1.0,
            is_domain: true,
        },
        Point {
            coord: DVec2::new(1.0, 0.0),
            volume: 1.0,
            is_domain: true,
        },
    ];
    let edges = vec![Edge {
        i: 0,
        j: 1,
        normal: DVec2::new(1.0, 0.0),
    }];
    let mesh = MeshTopology::new(points, edges, Vec::new()).unwrap();
    let gas = gas();
    let prim = gas.primitive_from_rho_vel_p(1.0, DVec2::ZERO, 101325.0, 0.0);
    let field = FlowField::uniform(gas, 2, prim);
    let grads = GradientStorage::new(2);

    for scheme in [
        ConvectiveSchemeKind::Roe,
        ConvectiveSchemeKind::Hllc,
        ConvectiveSchemeKind::Ausm,
        ConvectiveSchemeKind::Rusanov,
    ] {
        let mut sweep = EdgeSweep::new(
            &mesh,
            gas,
            scheme,
            false,
            false,
            LimiterKind::None,
            5.0,
        );
        let mut residual = Residual::new(2);
        sweep.assemble(&mesh, &field, &grads, &mut residual, None, false);

        let r0 = residual.block(0);
        let r1 = residual.block(1);
        // 动量分量 = 压力·法向
        assert!(
            (r0[1] - 101325.0).abs() < 1e-6,
            "{:?}: 动量通量 {}",
            scheme,
            r0[1]
        );
        // 零净质量/能量通量
        assert!(r0[0].abs() < 1e-9, "{:?}: 质量通量 {}", scheme, r0[0]);
        assert!(r0[3].abs() < 1e-9, "{:?}: 能量通量 {}", scheme, r0[3]);
        // 反对称
        for k in 0..N_VAR {
            assert!((r0[k] + r1[k]).abs() < 1e-12);
        }
    }
}

/// 驱动器重启快照往返
#[test]
fn restart_round_trip_through_driver() {
    let path = std::env::temp_dir().join("aeroflux_driver_restart.afs");
    let mesh = Arc::new(generation::cartesian(4, 4, 1.0, 1.0).unwrap());
    let gas = gas();
    let freestream = gas.primitive_from_rho_vel_p(1.2, DVec2::new(40.0, 5.0), 98000.0, 0.0);

    let setup = SolverSetup {
        markers: vec![
            MarkerCondition::far_field("left"),
            MarkerCondition::far_field("right"),
            MarkerCondition::euler_wall("bottom"),
            MarkerCondition::euler_wall("top"),
        ],
        ..Default::default()
    };
    let mut driver =
        ImplicitDriver::new(mesh.clone(), gas, freestream, setup.clone(), Box::new(NoHalo))
            .unwrap();
    driver.save_restart(&path).unwrap();

    let mut other =
        ImplicitDriver::new(mesh.clone(), gas, freestream, setup, Box::new(NoHalo)).unwrap();
    // 扰动后从快照恢复
    other.field_mut().set_conserved(
        3,
        Conserved {
            density: 9.0,
            momentum: DVec2::ZERO,
            energy: 1e6,
        },
    );
    other.load_restart(&path).unwrap();

    for i in 0..mesh.n_points() {
        assert_eq!(driver.field().conserved(i), other.field().conserved(i));
    }
    std::fs::remove_file(&path).ok();
}

/// 自由流速度为零是致命配置错误
#[test]
fn zero_freestream_velocity_is_fatal() {
    let mesh = Arc::new(generation::cartesian(3, 3, 1.0, 1.0).unwrap());
    let gas = gas();
    let freestream = gas.primitive_from_rho_vel_p(1.0, DVec2::ZERO, 101325.0, 0.0);
    let result = ImplicitDriver::new(
        mesh,
        gas,
        freestream,
        SolverSetup::default(),
        Box::new(NoHalo),
    );
    assert!(result.is_err());
}
