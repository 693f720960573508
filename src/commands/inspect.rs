use gridmind::{Team, UnitKind, load_snapshot, snapshot_file_path};

pub(super) fn run_inspect(json: bool) -> Result<(), String> {
    let snapshot = match load_snapshot().map_err(|e| e.to_string())? {
        Some(s) => s,
        None => {
            println!(
                "No snapshot found at {}. Run `gridmind run --snapshot-every 1` first.",
                snapshot_file_path().display()
            );
            return Ok(());
        }
    };

    println!(
        "Snapshot: step={} | map {}x{} | red stock={} | blue stock={}",
        snapshot.step, snapshot.width, snapshot.height, snapshot.stockpile_red, snapshot.stockpile_blue
    );

    for team in [Team::Red, Team::Blue] {
        let workers = snapshot
            .units
            .iter()
            .filter(|u| u.team == team && u.kind == UnitKind::Worker)
            .count();
        let factories = snapshot
            .units
            .iter()
            .filter(|u| u.team == team && u.kind == UnitKind::Factory)
            .count();
        println!(" - {}: workers={} factories={}", team, workers, factories);
    }

    if snapshot.pods.is_empty() {
        println!("No pods recorded.");
    } else {
        println!("{} pod(s):", snapshot.pods.len());
        for (index, pod) in snapshot.pods.iter().enumerate() {
            println!(
                " - pod {} | order={} | members={} | build_target={:?} | mine_target={:?}",
                index + 1,
                pod.order,
                pod.members.len(),
                pod.build_target,
                pod.mine_target
            );
        }
    }

    if json {
        let json_str = serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())?;
        println!("{}", json_str);
    }

    Ok(())
}
