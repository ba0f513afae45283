mod custom_error;
mod register_emissions;

use custom_error::CustomError;
use register_emissions::register_emissions_subscriber;

use std::{
    error::Error,
    sync::{Arc, Mutex},
};

use rxi::subscribe::Subscriber;
use rxi::{Observable, Subscribeable};

#[test]
fn fallible_sequence_errors_on_kth_advancement() {
    let (mut make_subscriber, nexts, completes, errors) = register_emissions_subscriber();

    let items: Vec<Result<i32, CustomError>> =
        vec![Ok(1), Ok(2), Err(CustomError), Ok(4), Ok(5)];
    // Vec<Result<_, _>> is not Clone because CustomError isn't; share it
    // behind an Arc and cut a fresh cursor per subscription instead.
    let items = Arc::new(Mutex::new(Some(items)));
    let mut observable =
        Observable::from_fallible_iter(TakeOnce { slot: items });

    observable.subscribe(make_subscriber.pop().unwrap()());

    assert_eq!(
        *nexts.lock().unwrap(),
        vec![1, 2],
        "elements before the failing advancement should be delivered"
    );
    assert_eq!(
        completes.lock().unwrap().len(),
        0,
        "errored sequence must not complete"
    );
    let errors = errors.lock().unwrap();
    assert_eq!(
        errors.len(),
        1,
        "exactly one error call expected, got {errors:?}"
    );
    assert_eq!(errors[0], "Custom error occurred");
}

// One-shot source: hands out its stored items on the first cursor request.
#[derive(Clone)]
struct TakeOnce {
    slot: Arc<Mutex<Option<Vec<Result<i32, CustomError>>>>>,
}

impl IntoIterator for TakeOnce {
    type Item = Result<i32, CustomError>;
    type IntoIter = std::vec::IntoIter<Result<i32, CustomError>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slot
            .lock()
            .unwrap()
            .take()
            .expect("one-shot source was drained twice")
            .into_iter()
    }
}

#[test]
fn fallible_sequence_errors_on_first_advancement() {
    let (mut make_subscriber, nexts, completes, errors) = register_emissions_subscriber();

    let mut observable = Observable::from_fallible_iter(
        (0..3).map(|i| if i == 0 { Err(CustomError) } else { Ok(i) }),
    );
    observable.subscribe(make_subscriber.pop().unwrap()());

    assert!(
        nexts.lock().unwrap().is_empty(),
        "no values should be delivered when the first advancement fails"
    );
    assert_eq!(completes.lock().unwrap().len(), 0);
    assert_eq!(errors.lock().unwrap().len(), 1);
}

#[test]
fn error_carries_the_original_cause() {
    let caught: Arc<Mutex<Option<Arc<dyn Error + Send + Sync>>>> = Arc::new(Mutex::new(None));
    let caught_c = Arc::clone(&caught);

    let mut observer = Subscriber::on_next(|_: i32| {});
    observer.on_error(move |e| *caught_c.lock().unwrap() = Some(e));

    let mut observable = Observable::from_fallible_iter(
        (0..3).map(|i| if i == 1 { Err(CustomError) } else { Ok(i) }),
    );
    observable.subscribe(observer);

    let caught = caught.lock().unwrap();
    let cause = caught.as_ref().expect("error callback was not invoked");
    assert!(
        cause.downcast_ref::<CustomError>().is_some(),
        "observer should receive the source's own error type, got {cause}"
    );
}

#[test]
fn infallible_results_complete_normally() {
    let (mut make_subscriber, nexts, completes, errors) = register_emissions_subscriber();

    let mut observable =
        Observable::from_fallible_iter((1..=3).map(Ok::<i32, CustomError>));
    observable.subscribe(make_subscriber.pop().unwrap()());

    assert_eq!(*nexts.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(completes.lock().unwrap().len(), 1);
    assert_eq!(errors.lock().unwrap().len(), 0);
}
