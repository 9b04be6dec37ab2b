//! Order Workflow State Machine
//!
//! An order is checked by two orthogonal regions at once (payment and
//! stock) and proceeds only when both reach their final states. A choice
//! pseudostate then routes by order value, and a terminate pseudostate
//! models hard cancellation.
//!
//! Key concepts:
//! - Orthogonal regions and completion transitions
//! - Choice branching with an else transition
//! - Terminate semantics
//!
//! Run with: cargo run --example order_workflow

use statechart::{InMemoryInstance, Instance, PseudoStateKind, StateMachine};

#[derive(Debug)]
enum Event {
    PaymentCleared,
    StockReserved,
    Amount(u32),
    Cancel,
}

fn main() {
    let mut machine: StateMachine<Event> = StateMachine::new("order");
    let root = machine.root();

    let initial = machine
        .add_pseudo_state("initial", PseudoStateKind::Initial, root)
        .expect("initial pseudostate");
    let checks = machine.add_state("Checks", root).expect("state");
    let payment = machine.add_region("payment", checks).expect("region");
    let stock = machine.add_region("stock", checks).expect("region");

    let pay_initial = machine
        .add_pseudo_state_in("initial", PseudoStateKind::Initial, payment)
        .expect("initial pseudostate");
    let pay_pending = machine.add_state_in("Pending", payment);
    let pay_done = machine.add_final_state_in("Cleared", payment);

    let stock_initial = machine
        .add_pseudo_state_in("initial", PseudoStateKind::Initial, stock)
        .expect("initial pseudostate");
    let stock_pending = machine.add_state_in("Pending", stock);
    let stock_done = machine.add_final_state_in("Reserved", stock);

    let review = machine.add_state("PriceReview", root).expect("state");
    let route = machine
        .add_pseudo_state("route", PseudoStateKind::Choice, root)
        .expect("choice pseudostate");
    let standard = machine.add_state("Standard", root).expect("state");
    let priority = machine.add_state("Priority", root).expect("state");
    let cancelled = machine
        .add_pseudo_state("cancelled", PseudoStateKind::Terminate, root)
        .expect("terminate pseudostate");

    machine.transition(initial).to(checks).build().expect("transition");
    machine.transition(pay_initial).to(pay_pending).build().expect("transition");
    machine.transition(stock_initial).to(stock_pending).build().expect("transition");
    machine
        .transition(pay_pending)
        .to(pay_done)
        .when(|e, _| matches!(e, Event::PaymentCleared))
        .build()
        .expect("transition");
    machine
        .transition(stock_pending)
        .to(stock_done)
        .when(|e, _| matches!(e, Event::StockReserved))
        .build()
        .expect("transition");
    // Completion: fires once both regions have reached their final states.
    machine
        .transition(checks)
        .to(review)
        .effect(|_, _, _| println!("  both checks passed"))
        .build()
        .expect("transition");
    machine
        .transition(review)
        .to(route)
        .when(|e, _| matches!(e, Event::Amount(_)))
        .effect(|e, _, _| {
            if let Some(Event::Amount(n)) = e {
                println!("  routing order worth {n}");
            }
        })
        .build()
        .expect("transition");
    machine
        .transition(route)
        .to(priority)
        .when(|e, _| matches!(e, Event::Amount(n) if *n >= 1_000))
        .build()
        .expect("transition");
    machine.transition(route).to(standard).otherwise().build().expect("transition");
    machine
        .transition(review)
        .to(cancelled)
        .when(|e, _| matches!(e, Event::Cancel))
        .build()
        .expect("transition");

    let mut instance = InMemoryInstance::new();
    machine.initialise(&mut instance).expect("initialise");

    println!("=== Order Workflow ===\n");
    for event in [
        Event::StockReserved,
        Event::PaymentCleared,
        Event::Amount(1_500),
    ] {
        let consumed = machine.evaluate(&event, &mut instance).expect("evaluate");
        println!("{event:?} consumed: {consumed}");
    }

    let region = machine.regions_of(root)[0];
    let current = instance.current(region).expect("active state");
    println!("\nOrder ended in: {}", machine.vertex_qualified_name(current));

    // A second order gets cancelled outright; the instance stays frozen.
    let mut second = InMemoryInstance::new();
    machine.initialise(&mut second).expect("initialise");
    machine.evaluate(&Event::StockReserved, &mut second).expect("evaluate");
    machine.evaluate(&Event::PaymentCleared, &mut second).expect("evaluate");
    machine.evaluate(&Event::Cancel, &mut second).expect("evaluate");
    println!("\nSecond order terminated: {}", second.is_terminated());
    let ignored = machine
        .evaluate(&Event::Amount(10), &mut second)
        .expect("evaluate");
    println!("Events after termination are ignored: consumed = {ignored}");
}
