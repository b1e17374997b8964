use std::fs;
use std::sync::Arc;

use mrwc::corpus::{DiskCorpus, MemoryCorpus};
use mrwc::standalone::engine::{read_totals, run_in_process};
use mrwc::store::{LocalStore, MemoryStore, ShuffleStore};
use mrwc::task::ReduceTask;
use mrwc::worker::{run_reduce, Exit};

mod common;

#[tokio::test]
async fn golden_scenario_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::layout_with(dir.path(), &common::GOLDEN);
    let corpus = Arc::new(DiskCorpus::from_glob(&layout.inputs).unwrap());
    let store = Arc::new(LocalStore::new(layout.clone()));

    let run = run_in_process(corpus, Arc::clone(&store), 3, 2, 3, 10).await.unwrap();
    assert_eq!(run.plan.total_bytes, 39);
    assert!(run.workers.iter().all(|w| w.exit == Exit::Shutdown));

    for map_task in 0..3 {
        for bucket in 0..2 {
            assert!(layout.intermediate_path(map_task, bucket).is_file());
        }
    }
    assert_eq!(common::read_bucket(&layout, 0), common::golden_bucket(0));
    assert_eq!(common::read_bucket(&layout, 1), common::golden_bucket(1));
    assert_eq!(common::read_bucket(&layout, 1).keys().collect::<Vec<_>>(), ["hat", "the"]);
    assert_eq!(read_totals(&*store, 2).unwrap(), common::expected_golden());
}

#[tokio::test]
async fn more_map_tasks_than_words() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::layout_with(dir.path(), &common::GOLDEN);
    let corpus = Arc::new(DiskCorpus::from_glob(&layout.inputs).unwrap());
    let store = Arc::new(LocalStore::new(layout));

    run_in_process(corpus, Arc::clone(&store), 30, 2, 2, 4).await.unwrap();
    assert_eq!(read_totals(&*store, 2).unwrap(), common::expected_golden());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_workers_run_each_task_exactly_once() {
    let texts: Vec<String> = (0..26u8)
        .map(|i| {
            let letter = (b'a' + i) as char;
            format!("{letter}one {letter}two, {letter}three!\n").repeat(i as usize + 1)
        })
        .collect();
    let corpus = Arc::new(MemoryCorpus::new(texts));
    // The memory store rejects a second write of any object, so a task
    // executed twice fails the run.
    let store = Arc::new(MemoryStore::new());

    let run = run_in_process(corpus, Arc::clone(&store), 16, 7, 12, 4).await.unwrap();
    let total: usize = run.workers.iter().map(|w| w.tasks()).sum();
    assert_eq!(total, 16 + 7);
    assert_eq!(store.intermediate_count(), 16 * 7);

    let totals = read_totals(&*store, 7).unwrap();
    assert_eq!(totals.len(), 26 * 3);
    assert_eq!(totals["aone"], 1);
    assert_eq!(totals["zthree"], 26);
}

#[tokio::test]
async fn reduce_can_be_rerun_on_the_same_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::layout_with(dir.path(), &common::GOLDEN);
    let corpus = Arc::new(DiskCorpus::from_glob(&layout.inputs).unwrap());
    let store = Arc::new(LocalStore::new(layout.clone()));
    run_in_process(corpus, Arc::clone(&store), 3, 2, 1, 2).await.unwrap();

    let first = fs::read(layout.output_path(0)).unwrap();
    run_reduce(&*store, &ReduceTask { id: 0, n_map: 3 }).unwrap();
    assert_eq!(fs::read(layout.output_path(0)).unwrap(), first);
    assert_eq!(store.get_output(0).unwrap(), first);
}

#[tokio::test]
async fn rerunning_a_job_in_the_same_work_dir_reproduces_it() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::layout_with(dir.path(), &common::GOLDEN);
    let store = Arc::new(LocalStore::new(layout.clone()));

    let mut outputs = Vec::new();
    for _ in 0..2 {
        let corpus = Arc::new(DiskCorpus::from_glob(&layout.inputs).unwrap());
        run_in_process(corpus, Arc::clone(&store), 2, 2, 2, 3).await.unwrap();
        outputs.push((store.get_output(0).unwrap(), store.get_output(1).unwrap()));
    }
    assert_eq!(outputs[0], outputs[1]);
}
