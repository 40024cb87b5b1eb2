//! Integration tests for the deferred execution path.
//!
//! Deferred operators are built from `tokio::time::sleep` on a paused clock,
//! so resolution order is controlled exactly. These tests verify:
//! - Positional assembly: results follow input order, not completion order
//! - The eager/deferred switch happens at the first deferred result
//! - Bounded pools never exceed their limit
//! - Asynchronous pull-sequence flattening yields in completion order
//! - Folding stays strictly sequential

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream;
use rstest::rstest;
use tokio::time::sleep;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shapeflow::executor::stream::FlatMappingStream;
use shapeflow::value::PullStream;
use shapeflow::{
    Error, Function, Value, all, any, filter, flat_map, fork, map, map_pool, map_series, reduce,
    reduce_from, transform,
};

/// Routes the executors' trace events to the test output when `RUST_LOG`
/// asks for them.
fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shapeflow=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Resolves to the input after `10ms * (count - input)`, so later elements
/// settle first.
fn reversing(count: i64, settled: &Rc<RefCell<Vec<i64>>>) -> Function {
    let settled = Rc::clone(settled);
    Function::deferred(move |value: Value| {
        let settled = Rc::clone(&settled);
        async move {
            let number = value.as_int().unwrap_or(0);
            sleep(Duration::from_millis(10 * u64::try_from(count - number).unwrap_or(0))).await;
            settled.borrow_mut().push(number);
            Ok(value)
        }
    })
}

fn delayed_by_value() -> Function {
    Function::deferred(|value: Value| async move {
        let delay = u64::try_from(value.as_int().unwrap_or(0)).unwrap_or(0);
        sleep(Duration::from_millis(delay)).await;
        Ok(value)
    })
}

// =============================================================================
// Positional Assembly
// =============================================================================

#[tokio::test(start_paused = true)]
async fn map_keeps_input_order_under_reverse_resolution() {
    let settled = Rc::new(RefCell::new(Vec::new()));
    let mapped = map(reversing(4, &settled))
        .call1(Value::array([1, 2, 3]))
        .unwrap();
    assert!(mapped.is_pending());
    assert_eq!(mapped.resolve().await.unwrap(), Value::array([1, 2, 3]));
    assert_eq!(*settled.borrow(), vec![3, 2, 1]);
}

#[tokio::test(start_paused = true)]
async fn map_switches_to_deferred_at_first_pending_element() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let mixed = Function::operator(move |value: Value| {
        counter.set(counter.get() + 1);
        if value.as_int() == Some(2) {
            delayed_by_value().call1(value)
        } else {
            Ok(shapeflow::Eventual::Immediate(value))
        }
    });
    let mapped = map(mixed).call1(Value::array([1, 2, 3])).unwrap();
    // every element is visited before anything is awaited
    assert_eq!(calls.get(), 3);
    assert!(mapped.is_pending());
    assert_eq!(mapped.resolve().await.unwrap(), Value::array([1, 2, 3]));
}

#[tokio::test(start_paused = true)]
async fn filter_keeps_input_order_under_reverse_resolution() {
    let settled = Rc::new(RefCell::new(Vec::new()));
    let reverse = reversing(5, &settled);
    let odd_later = Function::operator(move |value: Value| {
        Ok(reverse
            .call1(value)?
            .map(|value| Value::from(value.as_int().unwrap_or(0) % 2 == 1)))
    });
    let kept = filter(odd_later).call1(Value::array([1, 2, 3, 4])).unwrap();
    assert_eq!(kept.resolve().await.unwrap(), Value::array([1, 3]));
    assert_eq!(*settled.borrow(), vec![4, 3, 2, 1]);
}

#[tokio::test(start_paused = true)]
async fn fork_runs_branches_concurrently() {
    let started = tokio::time::Instant::now();
    let forked = fork([delayed_by_value(), delayed_by_value(), delayed_by_value()])
        .call1(Value::from(50))
        .unwrap();
    assert_eq!(forked.resolve().await.unwrap(), Value::array([50, 50, 50]));
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn rejection_surfaces_when_awaited() {
    let failing = Function::deferred(|_| async {
        sleep(Duration::from_millis(5)).await;
        Err::<Value, _>(Error::msg("late failure"))
    });
    let mapped = map(failing).call1(Value::array([1])).unwrap();
    let error = mapped.resolve().await.unwrap_err();
    assert_eq!(error.to_string(), "late failure");
}

// =============================================================================
// Sequential and Pooled Maps
// =============================================================================

#[tokio::test(start_paused = true)]
async fn map_series_runs_one_element_at_a_time() {
    let started = tokio::time::Instant::now();
    let mapped = map_series(delayed_by_value())
        .call1(Value::array([10, 20, 30]))
        .unwrap();
    assert_eq!(mapped.resolve().await.unwrap(), Value::array([10, 20, 30]));
    assert!(started.elapsed() >= Duration::from_millis(60));
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(4)]
#[tokio::test(start_paused = true)]
async fn map_pool_never_exceeds_limit(#[case] limit: usize) {
    init_tracing();
    let running = Rc::new(Cell::new(0_usize));
    let peak = Rc::new(Cell::new(0_usize));
    let (running_handle, peak_handle) = (Rc::clone(&running), Rc::clone(&peak));
    let tracked = Function::deferred(move |value: Value| {
        let running = Rc::clone(&running_handle);
        let peak = Rc::clone(&peak_handle);
        async move {
            running.set(running.get() + 1);
            peak.set(peak.get().max(running.get()));
            sleep(Duration::from_millis(10)).await;
            running.set(running.get() - 1);
            Ok(value)
        }
    });
    let input = Value::array((1..=8).collect::<Vec<i64>>());
    let mapped = map_pool(limit, tracked).call1(input.clone()).unwrap();
    assert_eq!(mapped.resolve().await.unwrap(), input);
    assert_eq!(peak.get(), limit);
}

#[tokio::test(start_paused = true)]
async fn map_pool_keeps_positions() {
    let settled = Rc::new(RefCell::new(Vec::new()));
    let mapped = map_pool(3, reversing(7, &settled))
        .call1(Value::array([1, 2, 3, 4, 5, 6]))
        .unwrap();
    assert_eq!(
        mapped.resolve().await.unwrap(),
        Value::array([1, 2, 3, 4, 5, 6])
    );
}

// =============================================================================
// Asynchronous Pull Sequences
// =============================================================================

fn source(values: &[i64]) -> PullStream {
    PullStream::from_values(stream::iter(values.iter().copied().map(Value::from).collect::<Vec<_>>()))
}

/// Flat-maps each element to a one-item asynchronous sequence that settles
/// after `10ms * (4 - element)`.
fn slow_singleton() -> Function {
    Function::unary(|value: Value| {
        let number = value.as_int().unwrap_or(0);
        Value::stream(stream::once(async move {
            sleep(Duration::from_millis(10 * u64::try_from(4 - number).unwrap_or(0))).await;
            Value::from(number)
        }))
    })
}

#[tokio::test(start_paused = true)]
async fn stream_flat_map_yields_in_completion_order() {
    let flattened: Vec<Value> = FlatMappingStream::new(source(&[1, 2, 3]), slow_singleton())
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(flattened, vec![Value::from(3), Value::from(2), Value::from(1)]);
}

#[tokio::test(start_paused = true)]
async fn stream_flat_map_yields_immediate_items_first() {
    let mixed = Function::unary(|value: Value| {
        if value.as_int() == Some(1) {
            slow_singleton().call1(value).ok().and_then(|outcome| outcome.into_immediate()).unwrap_or_default()
        } else {
            Value::array([value])
        }
    });
    let flattened: Vec<Value> = FlatMappingStream::new(source(&[1, 2, 3]), mixed)
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(flattened, vec![Value::from(2), Value::from(3), Value::from(1)]);
}

#[tokio::test(start_paused = true)]
async fn stream_flat_map_respects_flattening_limit() {
    init_tracing();
    let started = tokio::time::Instant::now();
    let flattened: Vec<Value> = FlatMappingStream::with_limit(source(&[1, 2, 3]), slow_singleton(), 1)
        .map(Result::unwrap)
        .collect()
        .await;
    // one monad at a time: source order, with the delays added up
    assert_eq!(flattened, vec![Value::from(1), Value::from(2), Value::from(3)]);
    assert!(started.elapsed() >= Duration::from_millis(60));
}

#[tokio::test(start_paused = true)]
async fn flat_map_over_stream_value_muxes() {
    let Value::Stream(flattened) = flat_map(slow_singleton())
        .call1(Value::Stream(source(&[1, 2, 3])))
        .unwrap()
        .into_immediate()
        .unwrap()
    else {
        panic!("expected an asynchronous pull sequence");
    };
    let flattened: Vec<Value> = flattened.map(Result::unwrap).collect().await;
    assert_eq!(flattened, vec![Value::from(3), Value::from(2), Value::from(1)]);
}

#[tokio::test(start_paused = true)]
async fn map_over_stream_keeps_source_order() {
    let settled = Rc::new(RefCell::new(Vec::new()));
    let Value::Stream(mapped) = map(reversing(4, &settled))
        .call1(Value::Stream(source(&[1, 2, 3])))
        .unwrap()
        .into_immediate()
        .unwrap()
    else {
        panic!("expected an asynchronous pull sequence");
    };
    let mapped: Vec<Value> = mapped.map(Result::unwrap).collect().await;
    assert_eq!(mapped, vec![Value::from(1), Value::from(2), Value::from(3)]);
}

#[tokio::test(start_paused = true)]
async fn quantifiers_over_streams() {
    let slow_positive = Function::deferred(|value: Value| async move {
        sleep(Duration::from_millis(1)).await;
        Ok(Value::from(value.as_int().unwrap_or(0) > 0))
    });
    let all_positive = all(slow_positive.clone())
        .call1(Value::Stream(source(&[1, 2, 3])))
        .unwrap();
    assert_eq!(all_positive.resolve().await.unwrap(), Value::Bool(true));
    let any_positive = any(slow_positive)
        .call1(Value::Stream(source(&[-1, -2])))
        .unwrap();
    assert_eq!(any_positive.resolve().await.unwrap(), Value::Bool(false));
}

// =============================================================================
// Folding
// =============================================================================

#[tokio::test(start_paused = true)]
async fn reduce_is_strictly_sequential() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&order);
    let slow_append = Function::binary_deferred(move |accumulator: Value, element: Value| {
        let log = Rc::clone(&log);
        async move {
            let number = element.as_int().unwrap_or(0);
            sleep(Duration::from_millis(10 * u64::try_from(5 - number).unwrap_or(0))).await;
            log.borrow_mut().push(number);
            Ok(Value::from(format!("{accumulator}{number}")))
        }
    });
    let folded = reduce_from(slow_append, "").call1(Value::array([1, 2, 3, 4])).unwrap();
    assert_eq!(folded.resolve().await.unwrap(), Value::from("1234"));
    assert_eq!(*order.borrow(), vec![1, 2, 3, 4]);
}

#[tokio::test(start_paused = true)]
async fn reduce_over_stream() {
    let add = Function::binary(|left: Value, right: Value| {
        Value::from(left.as_int().unwrap_or(0) + right.as_int().unwrap_or(0))
    });
    let folded = reduce(add).call1(Value::Stream(source(&[1, 2, 3, 4]))).unwrap();
    assert!(folded.is_pending());
    assert_eq!(folded.resolve().await.unwrap(), Value::from(10));
}

#[tokio::test(start_paused = true)]
async fn transform_with_deferred_transducer_steps() {
    let delayed_square = Function::deferred(|value: Value| async move {
        sleep(Duration::from_millis(1)).await;
        let number = value.as_int().unwrap_or(0);
        Ok(Value::from(number * number))
    });
    let squares = transform(map(delayed_square), Value::array(Vec::<Value>::new()))
        .call1(Value::array([1, 2, 3]))
        .unwrap();
    assert_eq!(squares.resolve().await.unwrap(), Value::array([1, 4, 9]));
}
