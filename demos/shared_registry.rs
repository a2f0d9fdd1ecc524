//! Demonstrates sharing lexicons between worker threads.
//!
//! Workers register themselves in a `SyncLexicon`, report progress into
//! their own shard, and the main thread folds the shards together. An
//! `AnyLexicon` holds settings of mixed types read by every worker.
//!
//! Run with: cargo run --example shared_registry

use log::info;
use sovran_lexicon::{AnyLexicon, MapError, SyncLexicon};
use std::thread;

#[derive(Debug, Clone, PartialEq)]
struct WorkerInfo {
    name: String,
    jobs_done: u32,
}

fn main() -> Result<(), MapError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = AnyLexicon::<&str>::new();
    settings.set("batch_size", 25u32)?;
    settings.set("label", "nightly".to_string())?;
    settings.set("verbose", false)?;

    let registry = SyncLexicon::<usize, WorkerInfo>::new();
    let shards: Vec<SyncLexicon<String, u32>> = (0..4).map(|_| SyncLexicon::new()).collect();

    let handles: Vec<_> = shards
        .iter()
        .enumerate()
        .map(|(id, shard)| {
            let settings = settings.clone();
            let registry = registry.clone();
            let shard = shard.clone();
            thread::spawn(move || -> Result<(), MapError> {
                let batch = settings.get_as::<u32, _>("batch_size")?;
                let label = settings.get_as::<String, _>("label")?;

                registry.add(
                    id,
                    WorkerInfo {
                        name: format!("{}-{}", label, id),
                        jobs_done: 0,
                    },
                )?;

                for job in 0..batch {
                    shard.add(format!("job-{}-{}", id, job), job * (id as u32 + 1))?;
                    registry.with_mut(&id, |worker| worker.jobs_done += 1)?;
                }
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker thread panicked")?;
    }

    // Fold every shard into one result set; each shard is emptied as it goes
    let results = SyncLexicon::<String, u32>::new();
    for shard in &shards {
        results.take_from(shard)?;
    }
    info!("collected {} results", results.len()?);

    let total_jobs = {
        let mut total = 0;
        registry.each_value(|worker| total += worker.jobs_done)?;
        total
    };
    info!("workers reported {} jobs", total_jobs);

    // Keep the heavy results only
    let heavy = results.filter(|_, weight| *weight > 50)?;
    info!("{} results weigh more than 50", heavy.len()?);

    let mut names = registry.values()?.into_iter().map(|w| w.name).collect::<Vec<_>>();
    names.sort();
    for name in names {
        println!("  {}", name);
    }

    if settings.get_as::<bool, _>("verbose")? {
        println!("{:?}", results);
    }

    Ok(())
}
