use env_logger::Builder;
use log::{info, LevelFilter};

use aries_wal::{
    log_mod::LogRecordType,
    Engine, Operation, PageID,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    Builder::new()
        .filter_level(LevelFilter::Info)
        .init();

    info!("ARIES write-ahead log walkthrough");

    let mut engine = Engine::new();

    // T1 commits and ends; T2 is still running when the checkpoint is taken.
    engine.dispatch_all([
        Operation::write(1, "A", "10"),
        Operation::write(2, "B", "20"),
        Operation::commit(1),
        Operation::end(1),
        Operation::Checkpoint,
        Operation::write(2, "A", "30"),
        Operation::flush("A"),
    ])?;

    let lost = engine.simulate_crash()?;
    info!("Crash lost {} log records", lost);

    let report = engine.restart()?;
    info!(
        "Losers {:?}, CLRs at {:?}, pages restored {:?}",
        report.losers, report.clr_lsns, report.pages_restored
    );

    for page in engine.disk().pages() {
        info!("disk {} = {:?} (pageLSN {:?})", page.page_id, page.value, page.page_lsn);
    }
    for entry in engine.transaction_table().entries() {
        info!("{} {} lastLSN {:?}", entry.txn_id, entry.status, entry.last_lsn);
    }
    for record_type in LogRecordType::ALL {
        info!(
            "{:>10}: {}",
            record_type.to_string(),
            engine.log().get_total_log_records_of_type(record_type)
        );
    }

    info!("Page A now reads {:?}", engine.disk().value(&PageID::from("A")));
    Ok(())
}
