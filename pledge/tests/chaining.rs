use pledge::time::sleep;
use pledge::{Error, EventLoop, Promise, Resolver, Result};

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

#[test]
fn test_then_maps_value() {
    let event_loop = EventLoop::new();

    let result = event_loop.block_on(|| Promise::resolve(5).then(|v| Ok(v + 1)));

    assert_eq!(result.unwrap(), 6);
}

#[test]
fn test_rejection_skips_then_until_catch() {
    let event_loop = EventLoop::new();
    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();

    let result = event_loop.block_on(move || {
        Promise::<String>::reject("nope")
            .then(move |v| {
                flag.set(true);
                Ok(v)
            })
            .catch(|e| Ok(e.to_string()))
    });

    assert_eq!(result.unwrap(), "nope");
    assert!(!ran.get());
}

#[test]
fn test_catch_passes_fulfillment_through() {
    let event_loop = EventLoop::new();

    let result = event_loop.block_on(|| Promise::resolve(4).catch(|_| Ok(0)));

    assert_eq!(result.unwrap(), 4);
}

#[test]
fn test_catch_recovers_and_chain_continues() {
    let event_loop = EventLoop::new();

    let result = event_loop.block_on(|| {
        Promise::<i32>::reject("lost")
            .catch(|_| Ok(10))
            .then(|v| Ok(v * 2))
    });

    assert_eq!(result.unwrap(), 20);
}

#[test]
fn test_failing_catch_propagates() {
    let event_loop = EventLoop::new();

    let result = event_loop.block_on(|| {
        Promise::<i32>::reject("inner")
            .catch(|e| Err::<i32, _>(Error::msg(format!("wrapped: {e}"))))
            .then(|v| Ok(v + 1))
    });

    assert_eq!(result.unwrap_err().to_string(), "wrapped: inner");
}

#[test]
fn test_then_error_rejects() {
    let event_loop = EventLoop::new();

    let result = event_loop.block_on(|| {
        Promise::resolve(1).then(|_| -> Result<i32> { Err(Error::msg("refused")) })
    });

    assert_eq!(result.unwrap_err().to_string(), "refused");
}

#[test]
fn test_then_panic_becomes_rejection() {
    let event_loop = EventLoop::new();

    let error = event_loop
        .block_on(|| Promise::resolve(1).then(|_| -> Result<i32> { panic!("kaboom") }))
        .unwrap_err();

    assert!(error.is_panic());
    assert_eq!(error.to_string(), "callback panicked: kaboom");
}

#[test]
fn test_then_adopts_returned_promise() {
    let event_loop = EventLoop::new();

    let result = event_loop.block_on(|| {
        Promise::resolve(2).then(|v| sleep(Duration::from_millis(5)).then(move |_| Ok(v * 10)))
    });

    assert_eq!(result.unwrap(), 20);
}

#[test]
fn test_then_adopts_rejected_promise() {
    let event_loop = EventLoop::new();

    let result =
        event_loop.block_on(|| Promise::resolve(2).then(|_| Promise::<i32>::reject("inner")));

    assert_eq!(result.unwrap_err().to_string(), "inner");
}

#[test]
fn test_finally_keeps_value() {
    let event_loop = EventLoop::new();

    let result = event_loop.block_on(|| Promise::resolve(5).finally(|| Ok(())));

    assert_eq!(result.unwrap(), 5);
}

#[test]
fn test_finally_runs_on_rejection_and_keeps_error() {
    let event_loop = EventLoop::new();
    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();

    let result = event_loop.block_on(move || {
        Promise::<u8>::reject("original").finally(move || {
            flag.set(true);
            Ok(())
        })
    });

    assert_eq!(result.unwrap_err().to_string(), "original");
    assert!(ran.get());
}

#[test]
fn test_finally_error_replaces_value() {
    let event_loop = EventLoop::new();

    let result =
        event_loop.block_on(|| Promise::resolve(5).finally(|| Err(Error::msg("cleanup failed"))));

    assert_eq!(result.unwrap_err().to_string(), "cleanup failed");
}

#[test]
fn test_finally_error_replaces_rejection() {
    let event_loop = EventLoop::new();

    let result = event_loop.block_on(|| {
        Promise::<u8>::reject("original").finally(|| Err("cleanup failed".into()))
    });

    assert_eq!(result.unwrap_err().to_string(), "cleanup failed");
}

#[test]
fn test_finally_panic_becomes_rejection() {
    let event_loop = EventLoop::new();

    let error = event_loop
        .block_on(|| Promise::resolve(5).finally(|| panic!("in cleanup")))
        .unwrap_err();

    assert!(error.is_panic());
}

#[test]
fn test_callbacks_are_not_run_inline() {
    let event_loop = EventLoop::new();
    let ran = Rc::new(Cell::new(false));

    event_loop.enter(|| {
        let flag = ran.clone();
        Promise::resolve(1).then(move |_| {
            flag.set(true);
            Ok(())
        });

        assert!(!ran.get());
    });

    event_loop.run_until_idle();
    assert!(ran.get());
}

#[test]
fn test_callbacks_run_in_registration_order() {
    let event_loop = EventLoop::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    event_loop.enter(|| {
        let promise = Promise::resolve(0);

        for i in 1..=3 {
            let log = log.clone();
            promise.then(move |_| {
                log.borrow_mut().push(i);
                Ok(())
            });
        }
    });

    event_loop.run_until_idle();
    assert_eq!(*log.borrow(), vec![1, 2, 3]);
}

#[test]
fn test_callbacks_registered_while_pending_run_in_order() {
    let event_loop = EventLoop::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let stash = Rc::new(RefCell::new(None));

    let promise = event_loop.enter(|| {
        let stash = stash.clone();
        let promise = Promise::new(move |resolve: Resolver<i32>, _| {
            *stash.borrow_mut() = Some(resolve);
            Ok(())
        });

        for i in 1..=3 {
            let log = log.clone();
            promise.then(move |v| {
                log.borrow_mut().push((i, v));
                Ok(())
            });
        }

        promise
    });

    event_loop.run_until_idle();
    assert!(promise.is_pending());
    assert!(log.borrow().is_empty());

    let resolve = stash.borrow_mut().take().unwrap();
    event_loop.enter(|| resolve.resolve(5));
    event_loop.run_until_idle();

    assert_eq!(*log.borrow(), vec![(1, 5), (2, 5), (3, 5)]);
}

#[test]
fn test_rejection_handlers_registered_while_pending_run_in_order() {
    let event_loop = EventLoop::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let stash = Rc::new(RefCell::new(None));

    event_loop.enter(|| {
        let stash = stash.clone();
        let promise = Promise::<i32>::new(move |_, reject| {
            *stash.borrow_mut() = Some(reject);
            Ok(())
        });

        for i in 1..=3 {
            let log = log.clone();
            promise.catch(move |error| {
                log.borrow_mut().push(format!("{i}:{error}"));
                Ok(0)
            });
        }
    });

    event_loop.run_until_idle();
    assert!(log.borrow().is_empty());

    let reject = stash.borrow_mut().take().unwrap();
    event_loop.enter(|| reject.reject("nope"));
    event_loop.run_until_idle();

    assert_eq!(*log.borrow(), vec!["1:nope", "2:nope", "3:nope"]);
}

#[test]
#[should_panic(expected = "cannot adopt a promise from another execution context")]
fn test_adopting_promise_from_another_context_panics() {
    let home = EventLoop::new();
    let other = EventLoop::new();

    let foreign = other.enter(|| Promise::resolve(1));

    let _ = home.block_on(move || Promise::resolve(0).then(move |_| foreign));
}

#[test]
fn test_registration_after_settlement_waits_for_next_turn() {
    let event_loop = EventLoop::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let promise = event_loop.enter(|| Promise::resolve(7));
    event_loop.run_until_idle();

    event_loop.enter(|| {
        let seen = seen.clone();
        promise.then(move |v| {
            seen.borrow_mut().push(v);
            Ok(())
        });
    });

    assert!(seen.borrow().is_empty());
    assert_eq!(event_loop.turn(), 1);
    assert_eq!(*seen.borrow(), vec![7]);
    assert_eq!(event_loop.turn(), 0);
    assert_eq!(*seen.borrow(), vec![7]);
}

#[test]
fn test_chains_run_one_step_per_turn() {
    let event_loop = EventLoop::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    event_loop.enter(|| {
        let first = log.clone();
        let second = log.clone();

        Promise::resolve(())
            .then(move |_| {
                first.borrow_mut().push("first");
                Ok(())
            })
            .then(move |_| {
                second.borrow_mut().push("second");
                Ok(())
            });
    });

    assert_eq!(event_loop.turn(), 1);
    assert_eq!(*log.borrow(), vec!["first"]);
    assert_eq!(event_loop.turn(), 1);
    assert_eq!(*log.borrow(), vec!["first", "second"]);
}

#[test]
fn test_then_with_settles_through_handles() {
    let event_loop = EventLoop::new();

    let result: Result<i32> = event_loop.block_on(|| {
        Promise::resolve(3).then_with(|v, resolve: Resolver<i32>, _| {
            resolve.resolve(v * 3);
            Ok(())
        })
    });

    assert_eq!(result.unwrap(), 9);
}

#[test]
fn test_then_with_settles_later() {
    let event_loop = EventLoop::new();

    let result: Result<String> = event_loop.block_on(|| {
        Promise::resolve(()).then_with(|_, resolve: Resolver<String>, _| {
            sleep(Duration::from_millis(5)).then(move |_| {
                resolve.resolve(String::from("later"));
                Ok(())
            });
            Ok(())
        })
    });

    assert_eq!(result.unwrap(), "later");
}

#[test]
fn test_then_with_error_rejects() {
    let event_loop = EventLoop::new();

    let result = event_loop.block_on(|| {
        Promise::resolve(3).then_with(|_, _: Resolver<i32>, _| Err(Error::msg("declined")))
    });

    assert_eq!(result.unwrap_err().to_string(), "declined");
}
