use std::fs;

use approx::assert_relative_eq;
use avalanche_core::{
    Avalanche, AvalancheEndpoint, ElectronKey, ElectronState, InitialState, SeedElectron,
    StartHeight,
};
use avalanche_pipeline::{
    AvalancheRow, DriftRow, RecordWriter, read_records,
    run::{self, Config, Execution, Status},
};
use tempfile::tempdir;

/// Amplification start used throughout, in cm.
const AMPLIFICATION_START: f64 = 0.01;

/// Engine whose avalanche size and endpoints depend only on the key and
/// initial state.
fn scripted(key: ElectronKey, initial: &InitialState) -> Avalanche {
    let size = 1 + (key.event * 7 + key.electron * 3) % 5;
    let endpoints = (0..size)
        .map(|i| AvalancheEndpoint {
            start: ElectronState {
                position: initial.state.position,
                time: initial.state.time + 0.01 * i as f64,
                energy: initial.state.energy,
            },
            end: ElectronState {
                position: [
                    initial.state.position[0] + 1e-4 * i as f64,
                    initial.state.position[1],
                    -0.002,
                ],
                time: initial.state.time + 1.0,
                energy: 0.5 * i as f64,
            },
            status: -1,
        })
        .collect();

    Avalanche {
        electrons: size,
        ions: size - 1,
        endpoints,
        truncated: false,
    }
}

fn drift_events() -> Vec<DriftRow> {
    (0..6)
        .map(|event| {
            let seeds: Vec<_> = (0..event % 4)
                .map(|electron| SeedElectron {
                    position: [0.01 * electron as f64, -0.01 * event as f64, 0.75],
                    energy: 2.0 + electron as f64,
                    time: 0.1 * event as f64,
                })
                .collect();
            DriftRow::from_seeds(&seeds)
        })
        .collect()
}

#[test]
fn single_seed_with_two_endpoints() {
    let two = |_key: ElectronKey, initial: &InitialState| Avalanche {
        electrons: 2,
        ions: 1,
        endpoints: vec![
            AvalancheEndpoint {
                start: initial.state,
                end: ElectronState {
                    position: [0.11, -0.21, -0.002],
                    time: 1.3,
                    energy: 0.7,
                },
                status: -1,
            },
            AvalancheEndpoint {
                start: ElectronState {
                    position: [0.105, -0.2, 0.004],
                    time: 0.9,
                    energy: 1.1,
                },
                end: ElectronState {
                    position: [0.12, -0.19, -0.002],
                    time: 1.4,
                    energy: 0.4,
                },
                status: -7,
            },
        ],
        truncated: false,
    };
    let events = [DriftRow::from_seeds(&[SeedElectron {
        position: [0.1, -0.2, 0.75],
        energy: 5.0,
        time: 0.3,
    }])];
    let mut rows = Vec::new();

    run::run_unobserved(&two, &events, &Config::new(AMPLIFICATION_START), &mut rows).unwrap();

    let row = &rows[0];
    assert_eq!(row.nele, 1);
    assert_eq!(row.nelep, 2);
    assert!(row.is_consistent());
    assert_eq!(row.len(), 2);
    assert_eq!(row.status, vec![-1, -7]);

    assert_relative_eq!(row.x0[0], 0.1);
    assert_relative_eq!(row.y0[0], -0.2);
    assert_relative_eq!(row.z0[0], AMPLIFICATION_START);
    assert_relative_eq!(row.e0[0], 5.0);
    assert_relative_eq!(row.t0[0], 0.3);
    assert_relative_eq!(row.x1[1], 0.12);
    assert_relative_eq!(row.t1[1], 1.4);
}

#[test]
fn seed_height_policy_keeps_recorded_z() {
    let events = [DriftRow::from_seeds(&[SeedElectron {
        position: [0.0, 0.0, 0.75],
        energy: 1.0,
        time: 0.0,
    }])];
    let mut rows = Vec::new();
    let config = Config::new(AMPLIFICATION_START).with_start_height(StartHeight::Seed);

    run::run_unobserved(&scripted, &events, &config, &mut rows).unwrap();

    assert!(rows[0].z0.iter().all(|&z| z == 0.75));
}

#[test]
fn every_record_is_consistent_and_rows_match_events() {
    let events = drift_events();
    let mut rows: Vec<AvalancheRow> = Vec::new();

    let solution = run::run_unobserved(
        &scripted,
        &events,
        &Config::new(AMPLIFICATION_START),
        &mut rows,
    )
    .unwrap();

    assert_eq!(solution.status, Status::Complete);
    assert_eq!(rows.len(), events.len());
    assert_eq!(solution.events, events.len());
    assert_eq!(
        solution.endpoints,
        rows.iter().map(AvalancheRow::len).sum::<usize>()
    );
    for (row, event) in rows.iter().zip(&events) {
        assert!(row.is_consistent());
        assert_eq!(row.nele, event.nele);
        if event.nele == 0 {
            assert!(row.is_empty());
        }
    }
}

#[test]
fn parallel_execution_matches_sequential() {
    let events = drift_events();
    let sequential_config = Config::new(AMPLIFICATION_START);
    let parallel_config = sequential_config.clone().with_execution(Execution::Parallel);

    let mut sequential = Vec::new();
    let mut parallel = Vec::new();
    let a = run::run_unobserved(&scripted, &events, &sequential_config, &mut sequential).unwrap();
    let b = run::run_unobserved(&scripted, &events, &parallel_config, &mut parallel).unwrap();

    assert_eq!(a, b);
    assert_eq!(sequential, parallel);
}

#[test]
fn repeated_runs_are_identical() {
    let events = drift_events();
    let config = Config::new(AMPLIFICATION_START);

    let mut first = Vec::new();
    let mut second = Vec::new();
    run::run_unobserved(&scripted, &events, &config, &mut first).unwrap();
    run::run_unobserved(&scripted, &events, &config, &mut second).unwrap();

    assert_eq!(first, second);
}

#[test]
fn zero_events_write_an_empty_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("avalanche.jsonl");

    let mut writer = RecordWriter::<AvalancheRow>::create(&path, "Avalanche Information").unwrap();
    let solution = run::run_unobserved(
        &scripted,
        &[],
        &Config::new(AMPLIFICATION_START),
        &mut writer,
    )
    .unwrap();
    writer.finish().unwrap();

    assert_eq!(solution.status, Status::Complete);
    assert_eq!(solution.events, 0);
    let set = read_records::<AvalancheRow>(&path).unwrap();
    assert_eq!(set.title, "Avalanche Information");
    assert!(set.rows.is_empty());
}

#[test]
fn records_round_trip_through_files() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("drift.jsonl");
    let output = dir.path().join("avalanche.jsonl");

    let mut drift = RecordWriter::<DriftRow>::create(&input, "Drift Information").unwrap();
    for row in drift_events() {
        drift.write(&row).unwrap();
    }
    drift.finish().unwrap();

    let events = read_records::<DriftRow>(&input).unwrap().rows;
    let mut writer =
        RecordWriter::<AvalancheRow>::create(&output, "Avalanche Information").unwrap();
    run::run_unobserved(
        &scripted,
        &events,
        &Config::new(AMPLIFICATION_START),
        &mut writer,
    )
    .unwrap();
    assert_eq!(writer.finish().unwrap(), events.len());

    let mut expected = Vec::new();
    run::run_unobserved(
        &scripted,
        &events,
        &Config::new(AMPLIFICATION_START),
        &mut expected,
    )
    .unwrap();
    assert_eq!(
        read_records::<AvalancheRow>(&output).unwrap().rows,
        expected
    );
}

#[test]
fn failed_run_leaves_no_output() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("avalanche.jsonl");
    let mut broken = drift_events();
    broken[3].x1.clear();

    let mut writer =
        RecordWriter::<AvalancheRow>::create(&output, "Avalanche Information").unwrap();
    let result = run::run_unobserved(
        &scripted,
        &broken,
        &Config::new(AMPLIFICATION_START),
        &mut writer,
    );
    drop(writer);

    assert!(matches!(result, Err(run::Error::Schema { event: 3, .. })));
    assert!(!output.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
