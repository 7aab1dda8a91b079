// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Integration tests for shutdown ordering across harts
//! OWNERS: @kernel-boot-team
//! STATUS: Functional
//! TEST_COVERAGE: 5 tests
//!
//! TEST_SCENARIOS:
//!   - test_leader_waits_for_slow_worker(): termination only after the last exit
//!   - test_leader_returning_first_still_waits(): leader main shorter than workers
//!   - test_exit_count_is_monotonic_under_contention(): 8 harts exiting at once
//!   - test_context_rejects_contract_violations(): re-entry, stray hart, worker await
//!   - test_gate_opens_once(): second readiness signal is refused

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use hartboot::{Application, BootConfig, BootContext, BootError, HartCount, HartId, SpinHwLock};
use hartboot_host::{layout_for, simulate};

struct SlowWorkers {
    delay: Duration,
    workers_done: AtomicUsize,
    leader_done: AtomicBool,
}

impl Application for SlowWorkers {
    fn main(&self, _hart: HartId) {
        self.leader_done.store(true, Ordering::SeqCst);
    }

    fn worker_main(&self, _hart: HartId) {
        std::thread::sleep(self.delay);
        self.workers_done.fetch_add(1, Ordering::SeqCst);
    }
}

fn ctx(harts: usize) -> BootContext<SpinHwLock> {
    BootContext::new(SpinHwLock::new(), HartCount::new(harts).unwrap())
}

#[test]
fn test_leader_waits_for_slow_worker() {
    let app = SlowWorkers {
        delay: Duration::from_millis(50),
        workers_done: AtomicUsize::new(0),
        leader_done: AtomicBool::new(false),
    };
    let report = simulate(2, BootConfig::new(layout_for(0)), &[], &app);
    assert_eq!(report.terminations, 1);
    assert_eq!(report.pending_exits_at_termination, 0);
    assert_eq!(app.workers_done.load(Ordering::SeqCst), 1);
}

#[test]
fn test_leader_returning_first_still_waits() {
    let app = SlowWorkers {
        delay: Duration::from_millis(10),
        workers_done: AtomicUsize::new(0),
        leader_done: AtomicBool::new(false),
    };
    let report = simulate(5, BootConfig::new(layout_for(0)), &[], &app);
    assert!(app.leader_done.load(Ordering::SeqCst));
    assert_eq!(app.workers_done.load(Ordering::SeqCst), 4);
    assert_eq!(report.exited, 5);
    assert_eq!(report.pending_exits_at_termination, 0);
}

#[test]
fn test_exit_count_is_monotonic_under_contention() {
    let ctx = ctx(8);
    let tokens: Vec<_> = HartCount::new(8).unwrap().iter().map(|h| ctx.enter(h).unwrap()).collect();
    let seen = std::thread::scope(|s| {
        let handles: Vec<_> = tokens
            .into_iter()
            .map(|token| {
                let ctx = &ctx;
                s.spawn(move || ctx.signal_exit(token).unwrap())
            })
            .collect();
        let mut seen: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        seen.sort_unstable();
        seen
    });
    assert_eq!(seen, (1..=8).collect::<Vec<_>>());
    assert_eq!(ctx.exited(), 8);
    assert_eq!(ctx.exited_mask(), 0xff);
    ctx.await_all_exited(HartId::LEADER).unwrap();
}

#[test]
fn test_context_rejects_contract_violations() {
    let ctx = ctx(2);
    let worker = HartId::from_raw(1);
    ctx.enter(worker).unwrap();
    assert_eq!(ctx.enter(worker).unwrap_err(), BootError::HartReentered(worker));
    let stray = HartId::from_raw(5);
    assert_eq!(ctx.enter(stray).unwrap_err(), BootError::HartOutOfRange { hart: stray, harts: 2 });
    assert_eq!(ctx.await_all_exited(worker).unwrap_err(), BootError::NotLeader(worker));
    assert_eq!(ctx.signal_ready(worker).unwrap_err(), BootError::NotLeader(worker));
}

#[test]
fn test_gate_opens_once() {
    let ctx = ctx(1);
    assert!(!ctx.is_ready());
    ctx.signal_ready(HartId::LEADER).unwrap();
    assert!(ctx.is_ready());
    assert_eq!(ctx.signal_ready(HartId::LEADER).unwrap_err(), BootError::GateAlreadyOpen);
}
