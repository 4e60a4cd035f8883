//! The event loop of an avalanche run.
//!
//! For every input event, each seed electron is turned into an initial state,
//! handed to the engine, and every endpoint of the resulting avalanche is
//! appended to the event's record in seed order. The record is written once
//! all seeds of the event are done:
//!
//! ```text
//! for event in events:
//!     record = AvalancheRow::new(event.nele)
//!     for seed in event.seeds:
//!         record.extend(engine.avalanche(key, start_height(seed)).endpoints)
//!     sink.write_row(record)
//! ```
//!
//! # Example
//!
//! ```
//! use avalanche_core::{Avalanche, ElectronKey, InitialState};
//! use avalanche_pipeline::{AvalancheRow, DriftRow, run};
//!
//! let quenched = |_key: ElectronKey, _initial: &InitialState| Avalanche {
//!     electrons: 1,
//!     ..Avalanche::default()
//! };
//!
//! let events = vec![DriftRow::default(); 3];
//! let mut rows: Vec<AvalancheRow> = Vec::new();
//! let solution = run::run_unobserved(&quenched, &events, &run::Config::new(0.01), &mut rows)?;
//!
//! assert_eq!(solution.events, 3);
//! assert_eq!(rows.len(), 3);
//! # Ok::<(), run::Error>(())
//! ```

mod action;
mod config;
mod error;
mod event;
mod solution;

pub use action::Action;
pub use config::{Config, Execution};
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Status};

use avalanche_core::{AvalancheEngine, ElectronKey, Observer, SeedElectron};
use rayon::prelude::*;

use crate::{AvalancheRow, DriftRow, RecordSink};

/// Simulates every event and writes one record per event to `sink`.
///
/// # Algorithm
///
/// 1. Validate every event against the drift schema before simulating.
/// 2. For each event, in order:
///    - Check the cancel token.
///    - For each seed electron, build its initial state from the start
///      height policy and simulate it (in parallel if configured).
///    - Append the avalanche's endpoints to the event's record, emit
///      [`Event::Electron`], and stop if the observer returns `StopEarly`.
///    - Write the record, emit [`Event::Record`], and stop if the observer
///      returns `StopEarly`.
/// 3. Return the run summary.
///
/// Each record's `nele` is copied from its input event and `nelep` counts the
/// endpoints of all its seeds, so `nelep` always equals the column lengths.
///
/// # Observer
///
/// The observer receives an [`Event`] after each seed electron and after
/// each written record, and may return [`Action::StopEarly`] to end the run.
///
/// # Errors
///
/// Returns [`Error::Schema`] before anything is written if an event does not
/// match its declared electron count, or [`Error::Sink`] if a record cannot
/// be written.
pub fn run<E, S, Obs>(
    engine: &E,
    events: &[DriftRow],
    config: &Config,
    mut sink: S,
    mut observer: Obs,
) -> Result<Solution, Error>
where
    E: AvalancheEngine + Sync,
    S: RecordSink,
    Obs: Observer<Event, Action>,
{
    let seeds = events
        .iter()
        .enumerate()
        .map(|(event, row)| {
            row.seeds()
                .map_err(|source| Error::Schema { event, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let total = events.len();
    let mut solution = Solution::empty();

    for (event, (row, seeds)) in events.iter().zip(&seeds).enumerate() {
        if config.is_cancelled() {
            log::info!("run cancelled before event {event}");
            return Ok(solution.stopped(Status::Cancelled));
        }

        let simulate = |electron: usize, seed: &SeedElectron| {
            if config.is_cancelled() {
                return None;
            }
            let initial = config
                .start_height
                .initial_state(seed, config.amplification_start);
            Some(engine.avalanche(ElectronKey::new(event, electron), &initial))
        };

        let mut parallel = match config.execution {
            Execution::Parallel => Some(
                seeds
                    .par_iter()
                    .enumerate()
                    .map(|(electron, seed)| simulate(electron, seed))
                    .collect::<Vec<_>>()
                    .into_iter(),
            ),
            Execution::Sequential => None,
        };

        let mut record = AvalancheRow::new(row.nele);
        let mut produced = 0;
        let mut truncated = 0;

        for (electron, seed) in seeds.iter().enumerate() {
            let avalanche = match parallel.as_mut() {
                Some(done) => done.next().flatten(),
                None => simulate(electron, seed),
            };
            let Some(avalanche) = avalanche else {
                log::info!("run cancelled during event {event}");
                return Ok(solution.stopped(Status::Cancelled));
            };

            record.extend(&avalanche.endpoints);
            produced += avalanche.electrons;
            truncated += usize::from(avalanche.truncated);

            log::debug!(
                "event {event} electron {electron}: {} electrons, {} endpoints",
                avalanche.electrons,
                avalanche.endpoints.len()
            );

            let progress = Event::Electron {
                key: ElectronKey::new(event, electron),
                seeds: seeds.len(),
                events: total,
                electrons: avalanche.electrons,
                endpoints: avalanche.endpoints.len(),
                truncated: avalanche.truncated,
            };
            if let Some(Action::StopEarly) = observer.observe(&progress) {
                return Ok(solution.stopped(Status::StoppedByObserver));
            }
        }

        if truncated > 0 {
            log::warn!("event {event}: {truncated} avalanches reached the size limit");
        }

        let (nele, nelep, endpoints) = (record.nele, record.nelep, record.len());
        sink.write_row(record).map_err(Error::sink)?;

        solution.events += 1;
        solution.seeds += seeds.len();
        solution.avalanche_electrons += produced;
        solution.endpoints += endpoints;
        solution.truncated_avalanches += truncated;

        let written = Event::Record {
            event,
            events: total,
            nele,
            nelep,
        };
        if let Some(Action::StopEarly) = observer.observe(&written) {
            return Ok(solution.stopped(Status::StoppedByObserver));
        }
    }

    Ok(solution)
}

/// Simulates every event without observation.
///
/// This is a convenience wrapper around [`run`] that discards events.
///
/// # Errors
///
/// Returns an error under the same conditions as [`run`].
pub fn run_unobserved<E, S>(
    engine: &E,
    events: &[DriftRow],
    config: &Config,
    sink: S,
) -> Result<Solution, Error>
where
    E: AvalancheEngine + Sync,
    S: RecordSink,
{
    run(engine, events, config, sink, ())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use avalanche_core::{Avalanche, AvalancheEndpoint, ElectronState, InitialState};

    use crate::CancelToken;

    /// Engine returning `n` endpoints that start at the initial state.
    fn copies(n: usize) -> impl Fn(ElectronKey, &InitialState) -> Avalanche + Sync {
        move |key, initial| Avalanche {
            electrons: n,
            ions: n.saturating_sub(1),
            endpoints: (0..n)
                .map(|i| AvalancheEndpoint {
                    start: initial.state,
                    end: ElectronState {
                        position: [initial.state.position[0], initial.state.position[1], -0.002],
                        time: initial.state.time + i as f64,
                        energy: 1.0,
                    },
                    status: -(key.electron as i32) - 1,
                })
                .collect(),
            truncated: false,
        }
    }

    fn event(nele: usize) -> DriftRow {
        let seeds: Vec<_> = (0..nele)
            .map(|i| SeedElectron {
                position: [0.1 * i as f64, -0.2, 0.75],
                energy: 5.0,
                time: 0.3,
            })
            .collect();
        DriftRow::from_seeds(&seeds)
    }

    #[test]
    fn accumulates_endpoints_across_seeds() {
        let events = [event(3)];
        let mut rows = Vec::new();

        let solution =
            run_unobserved(&copies(2), &events, &Config::new(0.01), &mut rows).unwrap();

        assert_eq!(solution.status, Status::Complete);
        assert_eq!(solution.seeds, 3);
        assert_eq!(solution.endpoints, 6);
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.nele, 3);
        assert_eq!(row.nelep, 6);
        assert!(row.is_consistent());
        assert_eq!(row.status, vec![-1, -1, -2, -2, -3, -3]);
        assert!(row.z0.iter().all(|&z| z == 0.01));
    }

    #[test]
    fn zero_seed_event_writes_an_empty_record() {
        let events = [event(2), event(0)];
        let mut rows = Vec::new();

        run_unobserved(&copies(1), &events, &Config::new(0.01), &mut rows).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], AvalancheRow::new(0));
        assert_eq!(rows[1].nelep, 0);
    }

    #[test]
    fn schema_errors_are_reported_before_simulating() {
        let calls = AtomicUsize::new(0);
        let engine = |key: ElectronKey, initial: &InitialState| {
            calls.fetch_add(1, Ordering::Relaxed);
            copies(1)(key, initial)
        };
        let mut broken = event(2);
        broken.t1.pop();
        let events = [event(1), broken];
        let mut rows = Vec::new();

        let err = run_unobserved(&engine, &events, &Config::new(0.01), &mut rows).unwrap_err();

        assert!(matches!(err, Error::Schema { event: 1, .. }));
        assert_eq!(err.to_string(), "event 1 is not a valid drift record");
        assert!(std::error::Error::source(&err).is_some());
        assert!(rows.is_empty());
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn observer_sees_progress_in_order() {
        let events = [event(2), event(1)];
        let mut seen = Vec::new();

        run(
            &copies(1),
            &events,
            &Config::new(0.01),
            Vec::new(),
            |event: &Event| {
                seen.push((event.event_progress(), event.electron_progress()));
                None
            },
        )
        .unwrap();

        assert_eq!(
            seen,
            vec![
                (0.0, Some(0.5)),
                (0.0, Some(1.0)),
                (0.5, None),
                (0.5, Some(1.0)),
                (1.0, None),
            ]
        );
    }

    #[test]
    fn stop_on_electron_discards_the_unfinished_event() {
        let events = [event(1), event(3)];
        let mut rows = Vec::new();

        let observer = |event: &Event| match event {
            Event::Electron { key, .. } if key.event == 1 && key.electron == 1 => {
                Some(Action::StopEarly)
            }
            _ => None,
        };
        let solution = run(&copies(1), &events, &Config::new(0.01), &mut rows, observer).unwrap();

        assert_eq!(solution.status, Status::StoppedByObserver);
        assert_eq!(solution.events, 1);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn cancelled_token_stops_before_next_seed() {
        let token = CancelToken::new();
        let trigger = token.clone();
        let engine = move |key: ElectronKey, initial: &InitialState| {
            if key.event == 1 {
                trigger.cancel();
            }
            copies(1)(key, initial)
        };
        let events = [event(1), event(2), event(1)];
        let mut rows = Vec::new();
        let config = Config::new(0.01).with_cancel(token);

        let solution = run_unobserved(&engine, &events, &config, &mut rows).unwrap();

        assert_eq!(solution.status, Status::Cancelled);
        assert_eq!(solution.events, 1);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn counts_truncated_avalanches() {
        let capped = |key: ElectronKey, initial: &InitialState| Avalanche {
            truncated: key.electron == 0,
            ..copies(1)(key, initial)
        };
        let events = [event(2), event(1)];

        let solution =
            run_unobserved(&capped, &events, &Config::new(0.01), Vec::new()).unwrap();

        assert_eq!(solution.truncated_avalanches, 2);
        assert_eq!(solution.avalanche_electrons, 3);
    }
}
