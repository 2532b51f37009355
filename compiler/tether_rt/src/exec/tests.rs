use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tether_ir::{CapabilityTable, TypeCapability, TypeRef};
use tether_synth::synthesize_path;

use super::*;
use crate::scheduler::QueueScheduler;

fn seg(name: &str, ty: &str, declaring: &str) -> PropertyPathSegment {
    PropertyPathSegment::new(name, TypeRef::new(ty), TypeRef::new(declaring))
}

fn address_city() -> PropertyPath {
    PropertyPath::new([
        seg("Address", "Address", "Person"),
        seg("City", "string", "Address"),
    ])
    .unwrap()
}

fn caps() -> CapabilityTable {
    CapabilityTable::builder()
        .with("Person", TypeCapability::FULL)
        .with("Address", TypeCapability::FULL)
        .build()
}

fn address(city: &str) -> ObjectRef {
    let address = Object::new("Address", TypeCapability::FULL);
    address.init("City", city);
    address
}

fn collect(stream: &Stream<Value>) -> (Arc<Mutex<Vec<Value>>>, Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let sub = stream.subscribe(move |v| sink.lock().push(v));
    (seen, sub)
}

#[test]
fn read_and_write_through_a_chain() {
    let person = Object::new("Person", TypeCapability::FULL);
    assert_eq!(read_path(&person, &address_city()), Value::Null);
    assert!(!write_path(&person, &address_city(), "Oslo".into()));

    person.init("Address", address("Bergen"));
    assert_eq!(read_path(&person, &address_city()), Value::str("Bergen"));
    assert!(write_path(&person, &address_city(), "Oslo".into()));
    assert_eq!(read_path(&person, &address_city()), Value::str("Oslo"));
}

#[test]
fn chain_tolerates_absent_intermediate() {
    let person = Object::new("Person", TypeCapability::FULL);
    let plan = synthesize_path(&address_city(), NotificationMode::AfterChange, &caps());
    let stream = observe(&plan, &person, &ExtraArgs::default()).unwrap();
    let (seen, _sub) = collect(&stream);

    person.set("Address", address("Oslo"));
    person.set("Address", Value::Null);
    assert_eq!(
        *seen.lock(),
        vec![Value::Null, Value::str("Oslo"), Value::Null]
    );
}

#[test]
fn chain_follows_the_replaced_intermediate_only() {
    let person = Object::new("Person", TypeCapability::FULL);
    let first = address("Oslo");
    person.init("Address", first.clone());
    let plan = synthesize_path(&address_city(), NotificationMode::AfterChange, &caps());
    let (seen, _sub) = collect(&observe(&plan, &person, &ExtraArgs::default()).unwrap());

    let second = address("Bergen");
    person.set("Address", second.clone());
    first.set("City", "Stale");
    second.set("City", "Tromsø");

    assert_eq!(
        *seen.lock(),
        vec![Value::str("Oslo"), Value::str("Bergen"), Value::str("Tromsø")]
    );
    assert_eq!(first.handler_count(), 0);
    assert_eq!(second.handler_count(), 1);
}

#[test]
fn constant_reads_once_per_subscription() {
    let person = Object::inert("Person");
    person.init("Address", address("Oslo"));
    let plan = PipelinePlan::from_source(Stage::ConstantReturn {
        path: address_city(),
    });
    let stream = observe(&plan, &person, &ExtraArgs::default()).unwrap();
    let (seen, _sub) = collect(&stream);

    person.set("Address", address("Bergen"));
    assert_eq!(*seen.lock(), vec![Value::str("Oslo")]);

    let (again, _sub) = collect(&stream);
    assert_eq!(*again.lock(), vec![Value::str("Bergen")]);
}

#[test]
fn missing_arguments_fail_before_subscribing() {
    let person = Object::new("Person", TypeCapability::FULL);
    let watch = PipelinePlan::from_source(Stage::Watch {
        segment: seg("Name", "string", "Person"),
        mode: NotificationMode::AfterChange,
    });

    let selecting = watch.clone().then(Stage::Select(FuncSlot::Selector));
    assert_eq!(
        observe(&selecting, &person, &ExtraArgs::default()).err(),
        Some(RuntimeError::MissingArgument(FuncSlot::Selector))
    );

    let scheduled = watch.clone().then(Stage::ObserveOn);
    assert_eq!(
        observe(&scheduled, &person, &ExtraArgs::default()).err(),
        Some(RuntimeError::MissingScheduler)
    );

    let tagged = watch.then(Stage::TagAndMerge(tether_synth::BindingOrigin::Source));
    assert!(matches!(
        observe(&tagged, &person, &ExtraArgs::default()),
        Err(RuntimeError::InvalidPlan(_))
    ));
    assert_eq!(person.handler_count(), 0);
}

#[test]
fn selector_and_scheduler_apply_in_order() {
    let person = Object::new("Person", TypeCapability::FULL);
    person.init("Name", "ann");
    let scheduler = Arc::new(QueueScheduler::new());
    let args = ExtraArgs::default()
        .with_selector(|v| Value::from(v.as_str().unwrap_or_default().to_uppercase()))
        .with_scheduler(scheduler.clone());
    let plan = PipelinePlan::from_source(Stage::Watch {
        segment: seg("Name", "string", "Person"),
        mode: NotificationMode::AfterChange,
    })
    .then(Stage::Select(FuncSlot::Selector))
    .then(Stage::ObserveOn);

    let (seen, _sub) = collect(&observe(&plan, &person, &args).unwrap());
    person.set("Name", "bea");
    assert!(seen.lock().is_empty());

    scheduler.drain();
    assert_eq!(*seen.lock(), vec![Value::str("ANN"), Value::str("BEA")]);
}

#[test]
fn empty_if_null_then_switch() {
    let feed = Object::new("Feed", TypeCapability::AFTER_ONLY);
    let plan = PipelinePlan::from_source(Stage::Watch {
        segment: seg("Ticks", "IObservable<int>", "Feed"),
        mode: NotificationMode::AfterChange,
    })
    .then(Stage::EmptyIfNull)
    .then(Stage::SwitchLatest);
    let (seen, _sub) = collect(&observe(&plan, &feed, &ExtraArgs::default()).unwrap());

    let ticks = crate::subject::Subject::new();
    feed.set("Ticks", ticks.stream());
    ticks.next(Value::Int(1));
    feed.set("Ticks", Value::Null);
    ticks.next(Value::Int(2));

    assert_eq!(*seen.lock(), vec![Value::Int(1)]);
    assert_eq!(ticks.observer_count(), 0);
}

#[allow(
    clippy::disallowed_types,
    reason = "proptest macros internally use Arc"
)]
mod proptest_chain {
    use proptest::prelude::*;

    use super::*;

    #[derive(Clone, Debug)]
    enum Op {
        Replace(usize),
        SetCity(usize, &'static str),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..3usize).prop_map(Op::Replace),
            (0..3usize, prop::sample::select(vec!["a", "b", "c"]))
                .prop_map(|(i, city)| Op::SetCity(i, city)),
        ]
    }

    proptest! {
        /// The output is always the current leaf, each leaf change is seen
        /// once, and retired intermediates never leak through.
        #[test]
        fn chain_tracks_the_current_leaf(ops in proptest::collection::vec(op(), 0..40)) {
            let addresses: Vec<ObjectRef> = ["a", "b", "c"].into_iter().map(address).collect();
            let person = Object::new("Person", TypeCapability::FULL);
            person.init("Address", addresses[0].clone());
            let mut current = 0;

            let plan = synthesize_path(&address_city(), NotificationMode::AfterChange, &caps());
            let (seen, _sub) = collect(&observe(&plan, &person, &ExtraArgs::default()).unwrap());

            let mut expected = vec![addresses[current].get("City")];
            for op in ops {
                match op {
                    Op::Replace(i) => {
                        person.set("Address", addresses[i].clone());
                        current = i;
                    }
                    Op::SetCity(i, city) => {
                        addresses[i].set("City", city);
                    }
                }
                let leaf = addresses[current].get("City");
                if expected.last() != Some(&leaf) {
                    expected.push(leaf);
                }
            }

            prop_assert_eq!(&*seen.lock(), &expected);
            for (i, address) in addresses.iter().enumerate() {
                prop_assert_eq!(address.handler_count(), usize::from(i == current));
            }
        }
    }
}
