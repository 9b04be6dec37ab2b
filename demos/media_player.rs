//! Media Player State Machine
//!
//! A hierarchical model: an `Operational` composite holds the playback
//! states, and a deep-history pseudostate brings the player back to
//! exactly where it was after the drawer has been opened and closed.
//!
//! Key concepts:
//! - Composite states with nested regions
//! - Deep history restoration
//! - Entry/exit actions as host callbacks
//!
//! Run with: cargo run --example media_player

use statechart::{InMemoryInstance, Instance, PseudoStateKind, StateMachine};

fn main() {
    let mut machine: StateMachine<&str> = StateMachine::new("player");
    let root = machine.root();

    let initial = machine
        .add_pseudo_state("initial", PseudoStateKind::Initial, root)
        .expect("initial pseudostate");
    let operational = machine.add_state("Operational", root).expect("state");
    let open = machine.add_state("DrawerOpen", root).expect("state");

    let history = machine
        .add_pseudo_state("history", PseudoStateKind::DeepHistory, operational)
        .expect("history pseudostate");
    let stopped = machine.add_state("Stopped", operational).expect("state");
    let playing = machine.add_state("Playing", operational).expect("state");
    let paused = machine.add_state("Paused", operational).expect("state");

    for (state, name) in [(stopped, "stopped"), (playing, "playing"), (paused, "paused")] {
        machine
            .on_entry(state, move |_, _, _| println!("  >> now {name}"))
            .expect("entry action");
    }

    machine.transition(initial).to(operational).build().expect("transition");
    machine.transition(history).to(stopped).build().expect("transition");
    let pairs = [
        (stopped, playing, "play"),
        (playing, paused, "pause"),
        (paused, playing, "play"),
        (playing, stopped, "stop"),
        (paused, stopped, "stop"),
    ];
    for (from, to, trigger) in pairs {
        machine
            .transition(from)
            .to(to)
            .when(move |m: &&str, _| *m == trigger)
            .build()
            .expect("transition");
    }
    machine
        .transition(operational)
        .to(open)
        .when(|m, _| *m == "open")
        .build()
        .expect("transition");
    machine
        .transition(open)
        .to(history)
        .when(|m, _| *m == "close")
        .build()
        .expect("transition");

    let mut instance = InMemoryInstance::new();
    machine.initialise(&mut instance).expect("initialise");

    println!("=== Media Player ===\n");
    for message in ["play", "pause", "open", "close"] {
        let consumed = machine.evaluate(&message, &mut instance).expect("evaluate");
        println!("'{message}' consumed: {consumed}");
    }

    let playback = machine.regions_of(operational)[0];
    let current = instance.current(playback).expect("active state");
    println!("\nPlayback state: {}", machine.vertex_qualified_name(current));
    println!("(deep history restored the paused playback after the drawer closed)");
}
