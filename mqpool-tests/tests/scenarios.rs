// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mqpool::{Executor, FixedThreadPool, MultiQueueThreadPool, QueueError};
use mqpool_tests::gate::Gate;
use mqpool_tests::init_logger;
use mqpool_tests::overlap::OverlapMeter;
use mqpool_tests::recorder::Recorder;

const TIMEOUT: Duration = Duration::from_secs(5);

fn slow(job: impl FnOnce() + Send + 'static) -> impl FnOnce() + Send + 'static {
    move || {
        thread::sleep(Duration::from_millis(1));
        job()
    }
}

#[test]
fn test_four_queues_with_pause_and_flush_all() {
    init_logger();
    let pool = MultiQueueThreadPool::new(Arc::new(FixedThreadPool::new(8).unwrap()));
    let queues: Vec<_> = (0..4).map(|_| pool.create_queue()).collect();
    let recorders: Vec<_> = (0..4).map(|_| Recorder::new()).collect();
    let paused = queues[0];

    for i in 0..50 {
        pool.enqueue(paused, recorders[0].job(i)).unwrap();
    }
    pool.pause(paused).unwrap();
    for i in 50..100 {
        pool.enqueue(paused, recorders[0].job(i)).unwrap();
    }

    for (queue, recorder) in queues.iter().zip(&recorders).skip(1) {
        for i in 0..100 {
            pool.enqueue(*queue, slow(recorder.job(i))).unwrap();
        }
    }

    pool.unpause(paused).unwrap();
    pool.flush_all();

    for recorder in &recorders {
        assert_eq!(recorder.entries(), (0..100).collect::<Vec<_>>());
    }
    for queue in queues {
        assert_eq!(pool.enqueue(queue, || {}), Err(QueueError::Sealed));
        pool.destroy_queue(queue).unwrap();
    }
    assert_eq!(pool.queue_count(), 0);
}

#[test]
fn test_stopped_then_destroyed_queue_never_runs_pending_jobs() {
    init_logger();
    let pool = MultiQueueThreadPool::new(Arc::new(FixedThreadPool::new(2).unwrap()));
    let queue = pool.create_queue();
    let gate = Gate::new();
    let recorder = Recorder::new();

    pool.enqueue(queue, gate.job()).unwrap();
    for i in 0..10 {
        pool.enqueue(queue, recorder.job(i)).unwrap();
    }
    assert!(gate.wait_entered(1, TIMEOUT));

    let opener = {
        let gate = gate.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            gate.open();
        })
    };
    pool.stop(queue).unwrap();
    opener.join().unwrap();
    assert_eq!(pool.queue_len(queue), Ok(10));

    pool.destroy_queue(queue).unwrap();
    thread::sleep(Duration::from_millis(20));

    assert!(recorder.entries().is_empty());
    assert_eq!(recorder.outstanding_jobs(), 0);
    assert_eq!(
        pool.enqueue(queue, recorder.job(99)),
        Err(QueueError::UnknownQueue(queue))
    );
}

#[test]
fn test_executor_shutdown_discards_directly_queued_jobs() {
    init_logger();
    let pool = FixedThreadPool::new(2).unwrap();
    let gate = Gate::new();
    let ran = Arc::new(AtomicUsize::new(0));

    // occupy both workers so the rest stays in the list
    pool.enqueue(Box::new(gate.job()));
    pool.enqueue(Box::new(gate.job()));
    assert!(gate.wait_entered(2, TIMEOUT));

    for _ in 0..20 {
        let ran = ran.clone();
        pool.enqueue(Box::new(move || {
            ran.fetch_add(1, Ordering::SeqCst);
        }));
    }

    let opener = {
        let gate = gate.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            gate.open();
        })
    };
    pool.shutdown();
    opener.join().unwrap();

    assert_eq!(pool.live_workers(), 0);
    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert_eq!(Arc::strong_count(&ran), 1);
}

#[test]
fn test_per_queue_order_under_concurrent_producers() {
    let pool = Arc::new(MultiQueueThreadPool::new(Arc::new(
        FixedThreadPool::new(4).unwrap(),
    )));
    let queues: Vec<_> = (0..3).map(|_| pool.create_queue()).collect();
    let recorders: Vec<_> = (0..3).map(|_| Recorder::new()).collect();
    let meters: Vec<_> = (0..3).map(|_| OverlapMeter::new()).collect();

    // one producer per queue, all producers racing each other
    let producers: Vec<_> = queues
        .iter()
        .zip(&recorders)
        .zip(&meters)
        .map(|((queue, recorder), meter)| {
            let pool = pool.clone();
            let queue = *queue;
            let recorder = recorder.clone();
            let meter = meter.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    let record = recorder.job(i);
                    let measure = meter.job(Duration::from_micros(50));
                    pool.enqueue(queue, move || {
                        measure();
                        record();
                    })
                    .unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }
    pool.flush_all();

    for (recorder, meter) in recorders.iter().zip(&meters) {
        assert_eq!(recorder.entries(), (0..200).collect::<Vec<_>>());
        assert_eq!(meter.peak(), 1);
        assert_eq!(meter.finished(), 200);
    }
}

#[test]
fn test_blocked_queue_does_not_hold_up_others() {
    let pool = MultiQueueThreadPool::new(Arc::new(FixedThreadPool::new(2).unwrap()));
    let blocked = pool.create_queue();
    let free = pool.create_queue();
    let gate = Gate::new();
    let recorder = Recorder::new();

    pool.enqueue(blocked, gate.job()).unwrap();
    pool.enqueue(blocked, recorder.job(0)).unwrap();
    for i in 1..=20 {
        pool.enqueue(free, recorder.job(i)).unwrap();
    }

    pool.flush(free).unwrap();
    // the later queue finished entirely while the earlier one is stuck
    assert_eq!(recorder.entries(), (1..=20).collect::<Vec<_>>());

    gate.open();
    pool.flush(blocked).unwrap();
    assert_eq!(recorder.entries().last(), Some(&0));
}

#[test]
fn test_flush_runs_everything_enqueued_before_it() {
    let pool = Arc::new(MultiQueueThreadPool::new(Arc::new(
        FixedThreadPool::new(4).unwrap(),
    )));
    let queue = pool.create_queue();
    let accepted = Arc::new(AtomicUsize::new(0));
    let ran = Arc::new(AtomicUsize::new(0));

    let producer = {
        let pool = pool.clone();
        let accepted = accepted.clone();
        let ran = ran.clone();
        thread::spawn(move || loop {
            let ran = ran.clone();
            let result = pool.enqueue(queue, move || {
                ran.fetch_add(1, Ordering::SeqCst);
            });
            match result {
                Ok(()) => {
                    accepted.fetch_add(1, Ordering::SeqCst);
                }
                Err(QueueError::Sealed) => break,
                Err(e) => panic!("unexpected enqueue error: {e}"),
            }
        })
    };

    thread::sleep(Duration::from_millis(10));
    pool.flush(queue).unwrap();
    producer.join().unwrap();

    // every accepted job ran before flush returned, and admission stays off
    assert_eq!(ran.load(Ordering::SeqCst), accepted.load(Ordering::SeqCst));
    assert_eq!(pool.enqueue(queue, || {}), Err(QueueError::Sealed));
}

#[test]
fn test_queues_on_a_futures_thread_pool() {
    let executor = futures::executor::ThreadPool::builder()
        .pool_size(3)
        .create()
        .unwrap();
    let executor: Arc<dyn Executor> = Arc::new(executor);
    let pool = MultiQueueThreadPool::new(executor);
    let queues: Vec<_> = (0..3).map(|_| pool.create_queue()).collect();
    let recorders: Vec<_> = (0..3).map(|_| Recorder::new()).collect();

    for i in 0..100 {
        for (queue, recorder) in queues.iter().zip(&recorders) {
            pool.enqueue(*queue, recorder.job(i)).unwrap();
        }
    }
    futures::executor::block_on(async {
        for queue in &queues {
            pool.flush_async(*queue).unwrap().await;
        }
    });

    for recorder in &recorders {
        assert_eq!(recorder.entries(), (0..100).collect::<Vec<_>>());
    }
}
