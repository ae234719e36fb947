use pledge::runtime::{Context, Dispatcher, Job, RemoteDispatcher, RemoteJob, ThreadSpawner};
use pledge::time::{sleep, sleep_in};
use pledge::{ErrorKind, EventLoop, Promise};

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[test]
fn test_turn_runs_only_jobs_queued_before_it() {
    let event_loop = EventLoop::new();
    let context = event_loop.context().clone();
    let log = Rc::new(RefCell::new(Vec::new()));

    let outer = log.clone();
    let inner_context = context.clone();
    context.schedule(move || {
        outer.borrow_mut().push("first");

        let inner = outer.clone();
        inner_context.schedule(move || inner.borrow_mut().push("second"));
    });

    assert_eq!(event_loop.pending_jobs(), 1);
    assert_eq!(event_loop.turn(), 1);
    assert_eq!(*log.borrow(), vec!["first"]);

    assert_eq!(event_loop.pending_jobs(), 1);
    assert_eq!(event_loop.turn(), 1);
    assert_eq!(*log.borrow(), vec!["first", "second"]);

    assert!(event_loop.is_idle());
    assert_eq!(event_loop.turn(), 0);
}

#[test]
fn test_jobs_see_their_context_as_current() {
    let event_loop = EventLoop::new();
    let seen = Rc::new(Cell::new(false));

    let flag = seen.clone();
    let expected = event_loop.context().clone();
    event_loop.context().schedule(move || {
        flag.set(Context::current().is_some_and(|current| current.same(&expected)));
    });

    assert!(Context::current().is_none());
    event_loop.run_until_idle();
    assert!(seen.get());
    assert!(Context::current().is_none());
}

#[test]
fn test_enter_restores_previous_context() {
    let outer = EventLoop::new();
    let inner = EventLoop::new();

    outer.enter(|| {
        inner.enter(|| {
            let current = Context::current().unwrap();
            assert!(current.same(inner.context()));
        });

        let current = Context::current().unwrap();
        assert!(current.same(outer.context()));
    });

    assert!(Context::current().is_none());
}

#[test]
fn test_block_on_reports_stall() {
    let event_loop = EventLoop::new();

    let error = event_loop
        .block_on(|| Promise::<u8>::new(|_, _| Ok(())))
        .unwrap_err();

    assert_eq!(error.kind(), Some(&ErrorKind::Stalled));
}

#[test]
fn test_block_on_leaves_unrelated_work_queued() {
    let event_loop = EventLoop::new();
    let ran = Rc::new(Cell::new(false));

    let flag = ran.clone();
    let result = event_loop.block_on(move || {
        sleep(Duration::from_millis(20)).then(move |_| {
            flag.set(true);
            Ok(())
        });

        Promise::resolve(1)
    });

    assert_eq!(result.unwrap(), 1);
    assert!(!ran.get());
    assert!(!event_loop.is_idle());

    event_loop.run_until_idle();
    assert!(ran.get());
}

#[test]
fn test_sleep_waits_at_least_duration() {
    let event_loop = EventLoop::new();
    let start = Instant::now();

    event_loop.block_on(|| sleep(Duration::from_millis(25))).unwrap();

    assert!(start.elapsed() >= Duration::from_millis(25));
}

#[test]
fn test_timers_fire_in_deadline_order() {
    let event_loop = EventLoop::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    event_loop.enter(|| {
        for (millis, label) in [(20, "c"), (5, "a"), (10, "b")] {
            let log = log.clone();
            sleep(Duration::from_millis(millis)).then(move |_| {
                log.borrow_mut().push(label);
                Ok(())
            });
        }
    });

    event_loop.run_until_idle();
    assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
}

#[test]
fn test_unhandled_rejection_reaches_sink() {
    let reported = Rc::new(RefCell::new(Vec::new()));
    let sink = reported.clone();

    let event_loop = EventLoop::builder()
        .on_unhandled_rejection(move |_, error| sink.borrow_mut().push(error.to_string()))
        .build();

    event_loop.enter(|| {
        drop(Promise::<u8>::reject("ignored"));

        let handled = Promise::<u8>::reject("handled");
        handled.catch(|_| Ok(0));
    });

    event_loop.run_until_idle();
    assert_eq!(*reported.borrow(), vec![String::from("ignored")]);
}

#[test]
fn test_unhandled_rejection_follows_chain() {
    let reported = Rc::new(RefCell::new(Vec::new()));
    let sink = reported.clone();

    let event_loop = EventLoop::builder()
        .on_unhandled_rejection(move |_, error| sink.borrow_mut().push(error.to_string()))
        .build();

    event_loop.enter(|| {
        Promise::<u8>::reject("dropped at the end").then(|v| Ok(v + 1));
    });

    event_loop.run_until_idle();
    assert_eq!(*reported.borrow(), vec![String::from("dropped at the end")]);
}

#[test]
fn test_builder_configures_context() {
    let event_loop = EventLoop::builder()
        .name("ui")
        .worker_name_prefix("ui-worker")
        .worker_stack_size(256 * 1024)
        .park_timeout(Duration::from_millis(1))
        .build();

    assert_eq!(event_loop.context().name(), "ui");
    assert!(event_loop.is_idle());
}

#[test]
#[should_panic(expected = "worker_stack_size must be > 0")]
fn test_builder_rejects_zero_stack_size() {
    let _ = EventLoop::builder().worker_stack_size(0);
}

#[test]
#[should_panic(expected = "park_timeout must be non-zero")]
fn test_builder_rejects_zero_park_timeout() {
    let _ = EventLoop::builder().park_timeout(Duration::ZERO);
}

#[test]
fn test_context_ids_are_unique() {
    let first = EventLoop::new();
    let second = EventLoop::new();

    assert_ne!(first.context().id(), second.context().id());
    assert!(first.context().id().to_string().starts_with("ctx#"));
}

#[derive(Default)]
struct Inbox(Mutex<Vec<RemoteJob>>);

impl RemoteDispatcher for Inbox {
    fn schedule_remote(&self, job: RemoteJob) {
        self.0.lock().unwrap().push(job);
    }
}

#[derive(Default)]
struct Manual {
    jobs: RefCell<VecDeque<Job>>,
    inbox: Arc<Inbox>,
}

impl Dispatcher for Manual {
    fn schedule(&self, job: Job) {
        self.jobs.borrow_mut().push_back(job);
    }

    fn schedule_at(&self, _deadline: Instant, job: Job) {
        self.schedule(job);
    }

    fn remote(&self) -> Arc<dyn RemoteDispatcher> {
        self.inbox.clone()
    }
}

#[test]
fn test_custom_dispatcher_receives_continuations() {
    let manual = Rc::new(Manual::default());
    let context = Context::new(
        "host",
        manual.clone(),
        Rc::new(ThreadSpawner::new("host-worker", None)),
        None,
    );

    let seen = Rc::new(Cell::new(0));
    let sink = seen.clone();

    let promise = Promise::<i32>::new_in(&context, |resolve, _| {
        resolve.resolve(4);
        Ok(())
    });
    promise.then(move |v| {
        sink.set(v);
        Ok(())
    });

    assert_eq!(seen.get(), 0);
    assert_eq!(manual.jobs.borrow().len(), 1);

    let job = manual.jobs.borrow_mut().pop_front().unwrap();
    context.enter(job);

    assert_eq!(seen.get(), 4);
    assert!(manual.jobs.borrow().is_empty());
}

#[test]
fn test_custom_dispatcher_arms_timers() {
    let manual = Rc::new(Manual::default());
    let context = Context::new(
        "host",
        manual.clone(),
        Rc::new(ThreadSpawner::new("host-worker", None)),
        None,
    );

    let timer = sleep_in(&context, Duration::from_secs(60));
    assert!(timer.is_pending());

    let job = manual.jobs.borrow_mut().pop_front().unwrap();
    context.enter(job);

    assert!(timer.is_fulfilled());
}
