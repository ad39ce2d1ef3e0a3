use aries_wal::{
    common::{AriesError, EngineConfig, PageID, Result, TransactionID, LSN},
    log_mod::LogRecordType,
    recovery::RecoveryState,
    transaction::TransactionStatus,
    Engine, Operation,
};

fn page(id: &str) -> PageID {
    PageID::from(id)
}

#[test]
fn test_crash_discards_volatile_state() -> Result<()> {
    let mut engine = Engine::new();

    engine.dispatch_all([
        Operation::write(1, "A", "1"),
        Operation::Checkpoint,
        Operation::write(1, "B", "2"),
    ])?;
    let lost = engine.simulate_crash()?;

    assert_eq!(lost, 1);
    assert_eq!(engine.state(), RecoveryState::Crashed);
    assert!(engine.buffer().is_empty());
    assert!(engine.dirty_page_table().is_empty());
    assert!(engine.transaction_table().is_empty());
    assert_eq!(engine.log().len(), 3);
    assert!(engine.log().records().iter().all(|record| record.persisted));
    assert!(engine.checkpoint_snapshot().is_some());
    Ok(())
}

#[test]
fn test_lifecycle_misuse_is_rejected() -> Result<()> {
    let mut engine = Engine::new();

    assert!(matches!(
        engine.restart(),
        Err(AriesError::InvalidState {
            state: RecoveryState::Running,
            ..
        })
    ));

    engine.simulate_crash()?;
    assert!(matches!(
        engine.dispatch(Operation::write(1, "A", "1")),
        Err(AriesError::InvalidState { .. })
    ));
    assert!(matches!(engine.simulate_crash(), Err(AriesError::InvalidState { .. })));
    assert!(matches!(engine.undo(), Err(AriesError::InvalidState { .. })));
    assert!(matches!(engine.identify_losers(), Err(AriesError::InvalidState { .. })));
    assert_eq!(engine.cursor(), 0);

    engine.restart()?;
    assert_eq!(engine.state(), RecoveryState::Recovered);
    Ok(())
}

#[test]
fn test_recovery_phases_step_by_step() -> Result<()> {
    let mut engine = Engine::new();

    engine.dispatch_all([
        Operation::write(1, "A", "1"),
        Operation::write(2, "B", "2"),
        Operation::commit(2),
        Operation::Checkpoint,
    ])?;
    engine.simulate_crash()?;

    engine.load_checkpoint()?;
    assert_eq!(engine.state(), RecoveryState::Analyzing);
    assert_eq!(engine.transaction_table().len(), 2);
    assert_eq!(engine.dirty_page_table().len(), 2);

    let losers = engine.identify_losers()?;
    assert_eq!(losers, vec![TransactionID(1)]);

    let clrs = engine.undo()?;
    assert_eq!(clrs.len(), 1);
    assert_eq!(engine.state(), RecoveryState::Recovered);
    assert_eq!(
        engine.transaction_table().status(TransactionID(2)),
        Some(TransactionStatus::Committed)
    );
    Ok(())
}

#[test]
fn test_loser_after_checkpoint_is_rolled_back() -> Result<()> {
    let mut engine = Engine::new();

    engine.dispatch_all([
        Operation::write(1, "A", "1"),
        Operation::flush("A"),
        Operation::commit(1),
        Operation::end(1),
        Operation::write(2, "A", "2"),
        Operation::Checkpoint,
    ])?;
    engine.simulate_crash()?;
    let report = engine.restart()?;

    assert_eq!(report.losers, vec![TransactionID(2)]);
    assert_eq!(report.clr_lsns, vec![LSN(7)]);
    assert_eq!(report.pages_restored, vec![page("A")]);

    let clr = engine.log().get(LSN(7)).unwrap();
    assert_eq!(clr.record_type, LogRecordType::Clr);
    assert_eq!(clr.prev_lsn, Some(LSN(5)));
    assert_eq!(clr.txn_id, Some(TransactionID(2)));
    assert_eq!(clr.value.as_deref(), Some("1"));

    let restored = engine.disk().get_page(&page("A")).unwrap();
    assert_eq!(restored.value, "1");
    assert_eq!(restored.page_lsn, Some(LSN(7)));

    assert_eq!(
        engine.transaction_table().status(TransactionID(2)),
        Some(TransactionStatus::Aborted)
    );
    assert_eq!(
        engine.transaction_table().status(TransactionID(1)),
        Some(TransactionStatus::Committed)
    );
    Ok(())
}

#[test]
fn test_crash_before_commit_undoes_whole_transaction() -> Result<()> {
    let mut engine = Engine::new();

    engine.dispatch_all([
        Operation::write(1, "A", "1"),
        Operation::Checkpoint,
        Operation::write(1, "A", "2"),
    ])?;
    // The second update was never forced and is lost.
    assert_eq!(engine.simulate_crash()?, 1);
    let report = engine.restart()?;

    assert_eq!(report.losers, vec![TransactionID(1)]);
    assert_eq!(report.clr_lsns, vec![LSN(3)]);
    assert_eq!(engine.log().get(LSN(3)).unwrap().prev_lsn, Some(LSN(1)));
    assert_eq!(engine.disk().value(&page("A")), Some(""));
    assert_eq!(
        engine.transaction_table().status(TransactionID(1)),
        Some(TransactionStatus::Aborted)
    );
    Ok(())
}

#[test]
fn test_committed_and_flushed_work_survives() -> Result<()> {
    let mut engine = Engine::new();

    engine.dispatch_all([
        Operation::write(1, "A", "x"),
        Operation::flush("A"),
        Operation::commit(1),
        Operation::end(1),
        Operation::Checkpoint,
    ])?;

    assert_eq!(engine.disk().value(&page("A")), Some("x"));
    assert_eq!(
        engine.transaction_table().status(TransactionID(1)),
        Some(TransactionStatus::Committed)
    );

    engine.simulate_crash()?;
    let report = engine.restart()?;

    assert!(report.losers.is_empty());
    assert!(report.clr_lsns.is_empty());
    assert_eq!(engine.log().get_total_log_records_of_type(LogRecordType::Clr), 0);
    assert_eq!(engine.disk().value(&page("A")), Some("x"));
    Ok(())
}

#[test]
fn test_undo_runs_in_global_reverse_order() -> Result<()> {
    let mut engine = Engine::new();

    engine.dispatch_all([
        Operation::write(1, "A", "a1"),
        Operation::write(2, "A", "a2"),
        Operation::write(1, "B", "b1"),
        Operation::Checkpoint,
    ])?;
    engine.simulate_crash()?;
    let report = engine.restart()?;

    assert_eq!(report.losers, vec![TransactionID(1), TransactionID(2)]);
    let undone: Vec<LSN> = report
        .clr_lsns
        .iter()
        .map(|lsn| engine.log().get(*lsn).unwrap().prev_lsn.unwrap())
        .collect();
    assert_eq!(undone, vec![LSN(4), LSN(3), LSN(1)]);

    // The oldest change is reversed last, leaving the initial state.
    assert_eq!(engine.disk().value(&page("A")), Some(""));
    assert_eq!(engine.disk().value(&page("B")), Some(""));
    Ok(())
}

#[test]
fn test_aborted_transaction_is_undone_on_restart() -> Result<()> {
    let mut engine = Engine::new();

    engine.dispatch_all([
        Operation::write(1, "A", "1"),
        Operation::flush("A"),
        Operation::abort(1),
        Operation::Checkpoint,
    ])?;
    assert_eq!(engine.disk().value(&page("A")), Some("1"));

    engine.simulate_crash()?;
    let report = engine.restart()?;

    assert_eq!(report.losers, vec![TransactionID(1)]);
    assert_eq!(engine.disk().value(&page("A")), Some(""));
    Ok(())
}

#[test]
fn test_compensated_updates_are_not_undone_twice() -> Result<()> {
    let mut engine = Engine::new();

    engine.dispatch_all([
        Operation::write(1, "A", "1"),
        Operation::flush("A"),
        Operation::abort(1),
        Operation::Checkpoint,
    ])?;
    engine.simulate_crash()?;
    engine.restart()?;

    // T1 stays Aborted in the next checkpoint, but its CLR is now durable.
    engine.dispatch_all([
        Operation::Checkpoint,
        Operation::write(2, "A", "z"),
        Operation::flush("A"),
        Operation::commit(2),
        Operation::end(2),
        Operation::Checkpoint,
    ])?;
    engine.simulate_crash()?;
    let report = engine.restart()?;

    assert_eq!(report.losers, vec![TransactionID(1)]);
    assert!(report.clr_lsns.is_empty());
    assert_eq!(engine.disk().value(&page("A")), Some("z"));
    Ok(())
}

#[test]
fn test_crash_without_forced_log() -> Result<()> {
    let mut engine = Engine::new();

    engine.dispatch(Operation::write(1, "A", "1"))?;
    assert_eq!(engine.simulate_crash()?, 2);
    assert!(engine.log().is_empty());

    let report = engine.restart()?;
    assert!(report.losers.is_empty());
    assert!(engine.disk().is_empty());
    assert!(engine.transaction_table().is_empty());
    Ok(())
}

#[test]
fn test_log_tail_analysis_finds_late_losers() -> Result<()> {
    let workload = [
        Operation::write(1, "A", "1"),
        Operation::commit(1),
        Operation::end(1),
        Operation::Checkpoint,
        Operation::write(2, "A", "2"),
        Operation::flush("A"),
    ];

    // Checkpoint-only analysis never sees T2.
    let mut engine = Engine::new();
    engine.dispatch_all(workload.clone())?;
    engine.simulate_crash()?;
    let report = engine.restart()?;
    assert!(report.losers.is_empty());
    assert_eq!(engine.disk().value(&page("A")), Some("2"));

    let mut engine = Engine::with_config(EngineConfig {
        analyze_log_tail: true,
        ..EngineConfig::default()
    });
    engine.dispatch_all(workload)?;
    engine.simulate_crash()?;
    let report = engine.restart()?;
    assert_eq!(report.losers, vec![TransactionID(2)]);
    assert_eq!(engine.disk().value(&page("A")), Some("1"));
    assert_eq!(
        engine.transaction_table().status(TransactionID(1)),
        Some(TransactionStatus::Committed)
    );
    Ok(())
}

#[test]
fn test_recovered_engine_keeps_working() -> Result<()> {
    let mut engine = Engine::new();

    engine.dispatch_all([Operation::write(1, "A", "1"), Operation::Checkpoint])?;
    engine.simulate_crash()?;
    engine.restart()?;

    let next = engine.log().next_lsn();
    let lsn = engine.write(TransactionID(3), page("C"), "c".to_string())?;
    assert_eq!(lsn, LSN(next.0 + 1));
    assert_eq!(engine.log().get(next).unwrap().record_type, LogRecordType::Start);

    engine.simulate_crash()?;
    assert_eq!(engine.state(), RecoveryState::Crashed);
    Ok(())
}
