use pledge::time::sleep;
use pledge::{Promise, all};

use std::time::Duration;

#[pledge::test]
fn test_macro_drives_chain() {
    Promise::resolve(20).then(|v| {
        assert_eq!(v, 20);
        Ok(())
    })
}

#[pledge::test]
fn test_macro_waits_for_timers() {
    sleep(Duration::from_millis(5)).then(|_| Ok(()))
}

#[pledge::test]
fn test_macro_with_result_return() -> pledge::Result<()> {
    Promise::resolved()
}

#[pledge::test]
#[should_panic(expected = "promise rejected: boom")]
fn test_macro_panics_on_rejection() {
    Promise::<()>::reject("boom")
}

#[pledge::test]
fn test_all_macro_two() {
    all!(Promise::resolve(1), Promise::resolve("two")).then(|pair| {
        assert_eq!(pair, (1, "two"));
        Ok(())
    })
}

#[pledge::test]
fn test_all_macro_six_with_trailing_comma() {
    all!(
        Promise::resolve(1u8),
        Promise::resolve('b'),
        Promise::resolve(3.0f32),
        Promise::resolve(String::from("four")),
        Promise::resolve(vec![5]),
        Promise::resolve(Some(6)),
    )
    .then(|values| {
        assert_eq!(values, (1, 'b', 3.0, String::from("four"), vec![5], Some(6)));
        Ok(())
    })
}

#[pledge::test]
fn test_all_macro_rejects() {
    all!(Promise::resolve(1), Promise::<u8>::reject("nope"), Promise::resolve(3))
        .then(|_| -> pledge::Result<String> { Ok(String::from("unreachable")) })
        .catch(|error| Ok(error.to_string()))
        .then(|message| {
            assert_eq!(message, "nope");
            Ok(())
        })
}
