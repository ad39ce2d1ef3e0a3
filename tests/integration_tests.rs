use aries_wal::{
    common::{AriesError, EngineConfig, PageID, Result, TransactionID},
    recovery::RecoveryState,
    storage::DurableImage,
    transaction::TransactionStatus,
    Engine, Operation,
};

fn workload() -> Vec<Operation> {
    vec![
        Operation::write(1, "A", "10"),
        Operation::write(2, "B", "20"),
        Operation::commit(1),
        Operation::end(1),
        Operation::Checkpoint,
        Operation::write(2, "A", "30"),
        Operation::flush("A"),
        Operation::write(3, "C", "40"),
    ]
}

#[test]
fn test_complete_workflow() -> Result<()> {
    let mut engine = Engine::new();
    engine.dispatch_all(workload())?;

    // The C update was never forced.
    assert_eq!(engine.simulate_crash()?, 2);
    let report = engine.restart()?;

    assert_eq!(report.losers, vec![TransactionID(2)]);
    assert_eq!(engine.disk().value(&PageID::from("A")), Some("10"));
    assert_eq!(engine.disk().value(&PageID::from("B")), Some(""));
    assert_eq!(engine.disk().get_page(&PageID::from("C")), None);

    let table = engine.transaction_table();
    assert_eq!(table.status(TransactionID(1)), Some(TransactionStatus::Committed));
    assert_eq!(table.status(TransactionID(2)), Some(TransactionStatus::Aborted));
    assert!(!table.contains(TransactionID(3)));
    Ok(())
}

#[test]
fn test_durable_image_restart_matches_in_place_restart() -> Result<()> {
    let mut engine = Engine::new();
    engine.dispatch_all(workload())?;

    let bytes = engine.durable_image().serialize()?;
    let image = DurableImage::deserialize(&bytes)?;
    assert!(image.log.iter().all(|record| record.persisted));

    let mut reopened = Engine::from_durable_image(image, EngineConfig::default())?;
    assert_eq!(reopened.state(), RecoveryState::Crashed);
    let reopened_report = reopened.restart()?;

    engine.simulate_crash()?;
    let report = engine.restart()?;

    assert_eq!(reopened_report, report);
    assert_eq!(reopened.disk(), engine.disk());
    assert_eq!(reopened.log().records(), engine.log().records());
    assert_eq!(reopened.transaction_table(), engine.transaction_table());
    Ok(())
}

#[test]
fn test_corrupt_image_is_rejected() -> Result<()> {
    let mut engine = Engine::new();
    engine.dispatch_all([Operation::write(1, "A", "1"), Operation::Checkpoint])?;

    let mut image = engine.durable_image();
    image.log.remove(0);

    assert!(matches!(
        Engine::from_durable_image(image, EngineConfig::default()),
        Err(AriesError::CorruptImage { expected: 0, found: 1 })
    ));
    assert!(matches!(
        DurableImage::deserialize(&[0xff]),
        Err(AriesError::Serialization(_))
    ));
    Ok(())
}
