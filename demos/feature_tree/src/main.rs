//! Feature Tree Example
//!
//! Demonstrates a root store with a nested "list" feature store.
//! The child keeps a computed count of its names; every write lands in the
//! root under the "list" key. Run with `RUST_LOG=trace` to see the plumbing.

use canopy_store::operators::{dispatch_to, set_state_on, with_latest_state_of};
use canopy_store::{
    scheduler, Action, ActionChannel, InitialState, Setter, State, Store, Subject, Value,
    SET_STATE,
};

fn names(state: &State) -> Vec<String> {
    state
        .get("names")
        .and_then(Value::as_list)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn main() -> canopy_store::Result<()> {
    env_logger::init();

    println!("=== Canopy Feature Tree Example ===\n");

    let actions = ActionChannel::new();
    let root = Store::root(&actions, || {
        InitialState::new().field("items", Value::list(Vec::<Value>::new()))
    });
    let list = Store::child(&root, "list", || {
        InitialState::new()
            .field("names", Value::list(Vec::<Value>::new()))
            .computed("total", |s| Value::Int(names(s).len() as i64))
    })?;

    println!("Initial root state: {:?}\n", root.state());

    // Log every committed snapshot
    let _commits = root.of_action(SET_STATE).subscribe(|action| {
        if let Some(state) = action.set_state_payload() {
            log::info!("SET_STATE with {} field(s)", state.len());
        }
    });

    // Print the child's settled state once per tick
    let _view = list.subscribe(|state| {
        let total = state.get("total").and_then(Value::as_int).unwrap_or(0);
        println!("  list view: names={:?} total={}", names(&state), total);
    });

    // Turn "add name" events into writes on the child
    let added: Subject<String> = Subject::new();
    let _writer = added
        .as_stream()
        .pipe(with_latest_state_of(&list))
        .pipe(set_state_on(&list, |(name, state): &(String, State)| {
            let mut next = names(state);
            next.push(name.clone());
            Setter::field("names", Value::list(next))
        }))
        .pipe(dispatch_to(&list, |(name, _): &(String, State)| {
            Action::new("NAME_ADDED", name.as_str())
        }))
        .subscribe(|_| {});

    let _added_log = actions
        .of_kind("NAME_ADDED")
        .subscribe(|action| println!("  action NAME_ADDED {}", action.payload));

    println!("Adding names in one tick...");
    for name in ["ada", "grace", "linus"] {
        added.next(name.to_string());
    }
    scheduler::run_until_idle();

    println!("\nAdding one more...");
    added.next("barbara".to_string());
    scheduler::run_until_idle();

    println!("\nFinal root state:");
    println!("  list.names = {:?}", root.state().get_path(&["list", "names"]));
    println!("  list.total = {:?}", root.state().get_path(&["list", "total"]));

    list.destroy();
    root.destroy();

    println!("\n=== Example Complete ===");
    Ok(())
}
