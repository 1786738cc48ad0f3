//! End-to-end process lifecycle behavior through `pennos_core::Kernel`
//! directly (bypassing the scheduler's OS threads, which the unit-level
//! `pennos_core` tests don't exercise): creation, priority changes,
//! signals, sleep, and wait/reap semantics including zombie reaping and
//! orphan reparenting.

use pennos_abi::{ProcessStatus, Signal, PRIORITY_HIGH, PRIORITY_LOW, SHELL_PID};
use pennos_tests::test_kernel;

#[test]
fn exited_child_becomes_zombie_until_reaped() {
    let (_guard, mut kernel) = test_kernel();
    let child = kernel.create_process(SHELL_PID, "busy", false, PRIORITY_HIGH);
    kernel.exit(child, 0);

    assert_eq!(kernel.table.get(child).unwrap().status, ProcessStatus::Finished);
    let (reaped, status) = kernel.waitpid(SHELL_PID, Some(child), false).unwrap().unwrap();
    assert_eq!(reaped, child);
    assert!(status.is_zombie());
    assert!(kernel.table.get(child).is_none(), "reaped PCB must be removed");
}

#[test]
fn waitpid_nohang_returns_none_without_blocking_when_child_still_running() {
    let (_guard, mut kernel) = test_kernel();
    let child = kernel.create_process(SHELL_PID, "hang", false, PRIORITY_LOW);
    let result = kernel.waitpid(SHELL_PID, Some(child), true).unwrap();
    assert!(result.is_none());
    assert_eq!(kernel.table.get(child).unwrap().status, ProcessStatus::Running);
}

#[test]
fn waitpid_with_no_children_is_an_error() {
    let (_guard, mut kernel) = test_kernel();
    assert!(kernel.waitpid(SHELL_PID, None, true).is_err());
}

#[test]
fn terminated_child_is_reapable_like_an_exited_one() {
    let (_guard, mut kernel) = test_kernel();
    let child = kernel.create_process(SHELL_PID, "busy", false, PRIORITY_HIGH);
    kernel.send_signal(child, Signal::Term).unwrap();

    let (reaped, status) = kernel.waitpid(SHELL_PID, None, false).unwrap().unwrap();
    assert_eq!(reaped, child);
    assert_eq!(status, ProcessStatus::Terminated);
}

#[test]
fn stop_then_cont_round_trips_status() {
    let (_guard, mut kernel) = test_kernel();
    let child = kernel.create_process(SHELL_PID, "hang", false, PRIORITY_LOW);

    kernel.send_signal(child, Signal::Stop).unwrap();
    assert_eq!(kernel.table.get(child).unwrap().status, ProcessStatus::Stopped);

    kernel.send_signal(child, Signal::Cont).unwrap();
    assert_eq!(kernel.table.get(child).unwrap().status, ProcessStatus::Running);
}

#[test]
fn nice_changes_priority_and_is_observable_on_the_pcb() {
    let (_guard, mut kernel) = test_kernel();
    let child = kernel.create_process(SHELL_PID, "busy", false, PRIORITY_LOW);
    kernel.change_priority(child, PRIORITY_HIGH).unwrap();
    assert_eq!(kernel.table.get(child).unwrap().priority, PRIORITY_HIGH);
}

#[test]
fn background_child_of_the_shell_gets_a_job_id() {
    let (_guard, mut kernel) = test_kernel();
    let child = kernel.create_process(SHELL_PID, "nohang", true, PRIORITY_LOW);
    assert!(kernel.table.get(child).unwrap().job_id.is_some());
}

#[test]
fn sleep_wakes_the_process_after_its_tick_count_elapses() {
    let (_guard, mut kernel) = test_kernel();
    let child = kernel.create_process(SHELL_PID, "sleep 1", false, PRIORITY_HIGH);
    kernel.sleep(child, 2);
    assert_eq!(kernel.table.get(child).unwrap().status, ProcessStatus::Blocked);

    kernel.wake_sleepers();
    assert_eq!(kernel.table.get(child).unwrap().status, ProcessStatus::Blocked);
    kernel.wake_sleepers();
    assert_eq!(kernel.table.get(child).unwrap().status, ProcessStatus::Finished);
}
