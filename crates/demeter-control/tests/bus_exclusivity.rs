//! 并发采集与投加时总线序列互不交错

use demeter_control::{DosingConfig, DosingController, TargetStore};
use demeter_device::{AcquisitionTiming, BusCoordinator, BusOp, MockTransport, SnapshotAcquirer};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// 检查记录下来的总线操作是否存在交错
///
/// 读写必须落在某个会话内，会话之间不能重叠，同一个会话编号只出现一次。
/// 会话内部：一条 `I`/`R` 指令写入后，在读回应答之前地址处于“待读”状态。
/// 只有读数触发阶段允许连续写多个 `R`；其他任何写入都要求没有待读地址，
/// 读取必须对应本会话中的一个待读地址。
fn find_interleaving(ops: &[BusOp]) -> Option<usize> {
    let mut current: Option<u64> = None;
    let mut seen: HashSet<u64> = HashSet::new();
    let mut pending: HashMap<u8, String> = HashMap::new();
    let mut reading = false;

    for (index, op) in ops.iter().enumerate() {
        match op {
            BusOp::SessionStarted { session } => {
                if current.is_some() || !seen.insert(*session) {
                    return Some(index);
                }
                current = Some(*session);
                pending.clear();
                reading = false;
            }
            BusOp::SessionEnded { session } => {
                if current != Some(*session) {
                    return Some(index);
                }
                current = None;
            }
            BusOp::Write { address, command } => {
                if current.is_none() {
                    return Some(index);
                }
                let burst = command == "R"
                    && !reading
                    && !pending.contains_key(address)
                    && pending.values().all(|c| c == "R");
                if !pending.is_empty() && !burst {
                    return Some(index);
                }
                if command == "I" || command == "R" {
                    pending.insert(*address, command.clone());
                }
            }
            BusOp::Read { address } => {
                if current.is_none() {
                    return Some(index);
                }
                let Some(command) = pending.remove(address) else {
                    return Some(index);
                };
                if command == "R" {
                    reading = !pending.is_empty();
                }
            }
        }
    }

    None
}

fn rig() -> MockTransport {
    MockTransport::new()
        .with_ezo(99, "pH", "5.0")
        .with_ezo(100, "EC", "800")
        .with_ezo(102, "RTD", "21.0")
        .with_ezo(103, "PMP", "0.00")
        .with_ezo(104, "PMP", "0.00")
        .with_ezo(105, "PMP", "0.00")
        .with_ezo(106, "PMP", "0.00")
}

fn write(address: u8, command: &str) -> BusOp {
    BusOp::Write {
        address,
        command: command.to_string(),
    }
}

fn read(address: u8) -> BusOp {
    BusOp::Read { address }
}

fn started(session: u64) -> BusOp {
    BusOp::SessionStarted { session }
}

fn ended(session: u64) -> BusOp {
    BusOp::SessionEnded { session }
}

#[test]
fn checker_accepts_sequential_sessions() {
    let clean = vec![
        started(1),
        write(99, "I"),
        read(99),
        write(99, "R"),
        write(100, "R"),
        read(99),
        read(100),
        ended(1),
        started(2),
        write(103, "D,2"),
        ended(2),
    ];
    assert_eq!(find_interleaving(&clean), None);
}

#[test]
fn checker_detects_interleaved_sequences() {
    // 投加插入到读数触发与读取之间
    let dose_inside = vec![started(1), write(99, "R"), write(103, "D,2"), read(99), ended(1)];
    assert_eq!(find_interleaving(&dose_inside), Some(2));

    // 另一次扫描插入到读取阶段
    let scan_inside = vec![
        started(1),
        write(99, "R"),
        write(100, "R"),
        read(99),
        write(99, "I"),
        read(100),
        ended(1),
    ];
    assert_eq!(find_interleaving(&scan_inside), Some(4));
}

#[test]
fn checker_detects_merged_bursts_from_two_sessions() {
    // 两次采集的读数触发合并成一段，单看读写是合法的
    let merged = vec![
        started(1),
        write(99, "R"),
        started(2),
        write(100, "R"),
        read(99),
        read(100),
        ended(1),
        ended(2),
    ];
    assert_eq!(find_interleaving(&merged), Some(2));

    // 上一个会话触发的读数在下一个会话里读取
    let carried_over = vec![started(1), write(99, "R"), ended(1), started(2), read(99), ended(2)];
    assert_eq!(find_interleaving(&carried_over), Some(4));
}

#[test]
fn checker_requires_ops_inside_a_session() {
    assert_eq!(find_interleaving(&[write(103, "D,2")]), Some(0));
    assert_eq!(
        find_interleaving(&[started(1), ended(1), started(1), ended(1)]),
        Some(2)
    );
}

#[tokio::test(start_paused = true)]
async fn concurrent_acquisitions_and_doses_do_not_interleave() {
    let dir = tempfile::tempdir().unwrap();
    let handle = rig();
    let bus = BusCoordinator::new(handle.clone());
    let acquirer = SnapshotAcquirer::new(bus.clone(), AcquisitionTiming::default());

    let mut tasks = Vec::new();
    for _ in 0..3 {
        let acquirer = acquirer.clone();
        tasks.push(tokio::spawn(async move {
            acquirer.acquire().await.map(|_| ()).map_err(|e| e.to_string())
        }));
    }
    for _ in 0..2 {
        let controller = DosingController::new(
            acquirer.clone(),
            TargetStore::new(dir.path().join("target_values.json")),
            DosingConfig {
                settle: Duration::from_secs(5),
                ..DosingConfig::default()
            },
        );
        tasks.push(tokio::spawn(async move {
            controller.run_cycle().await.map(|_| ()).map_err(|e| e.to_string())
        }));
    }

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let ops = handle.ops();
    assert_eq!(find_interleaving(&ops), None, "ops: {ops:?}");

    // 每个控制周期：pH 低于下限 1 次 + EC 低于下限 2 次
    let doses = ops
        .iter()
        .filter(|op| matches!(op, BusOp::Write { command, .. } if command.starts_with("D,")))
        .count();
    assert_eq!(doses, 6);

    // 5 次采集 + 2 次投加会话
    assert_eq!(bus.sessions(), 7);
    let sessions = ops
        .iter()
        .filter(|op| matches!(op, BusOp::SessionStarted { .. }))
        .count();
    assert_eq!(sessions, 7);
}
