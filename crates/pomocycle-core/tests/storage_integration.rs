//! JSON store behavior across save/load cycles.

use pomocycle_core::{JsonStore, PersistenceGateway, PhaseDuration, ScheduleDraft, TimerPreset};
use tempfile::TempDir;

fn preset(name: &str, work: PhaseDuration, brk: PhaseDuration) -> TimerPreset {
    TimerPreset::new(name, work, brk).unwrap()
}

#[test]
fn preset_fields_survive_reload() {
    let dir = TempDir::new().unwrap();
    let mut store = JsonStore::open(dir.path()).unwrap();
    let focus = preset("Focus", PhaseDuration::new(25, 0), PhaseDuration::new(5, 0));
    store.save_preset(&focus).unwrap();

    // Fresh handle, same directory.
    let store = JsonStore::open(dir.path()).unwrap();
    let loaded = store.find_preset("focus").unwrap();
    assert_eq!(loaded.name, "Focus");
    assert_eq!(loaded.work_timer.minutes, 25);
    assert_eq!(loaded.work_timer.seconds, 0);
    assert_eq!(loaded.break_timer.minutes, 5);
    assert_eq!(loaded.break_timer.seconds, 0);
}

#[test]
fn schedule_order_is_preserved() {
    let dir = TempDir::new().unwrap();
    let mut store = JsonStore::open(dir.path()).unwrap();
    let a = preset("A", PhaseDuration::new(1, 0), PhaseDuration::new(1, 0));
    let b = preset("B", PhaseDuration::new(2, 0), PhaseDuration::new(2, 0));

    let mut draft = ScheduleDraft::new("Order");
    draft.add_instance(&b);
    draft.add_instance(&a);
    draft.add_instance(&b);
    draft.remove_instance(2).unwrap();
    let mut reversed = draft.finish().unwrap();
    reversed.instances.reverse();
    let id = store.save_schedule(&reversed).unwrap();

    let loaded = store.find_schedule(&id).unwrap();
    let names: Vec<_> = loaded.instances.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(loaded, reversed);
}

#[test]
fn deleting_preset_leaves_schedule_copy() {
    let dir = TempDir::new().unwrap();
    let mut store = JsonStore::open(dir.path()).unwrap();
    let focus = preset("Focus", PhaseDuration::new(25, 0), PhaseDuration::new(5, 0));
    store.save_preset(&focus).unwrap();

    let mut draft = ScheduleDraft::new("Morning");
    draft.add_instance(&store.find_preset("focus").unwrap());
    let schedule = draft.finish().unwrap();
    let id = store.save_schedule(&schedule).unwrap();
    let before = std::fs::read_to_string(dir.path().join(format!("schedules/{id}.json"))).unwrap();

    assert!(store.delete_preset("focus").unwrap());

    let after = std::fs::read_to_string(dir.path().join(format!("schedules/{id}.json"))).unwrap();
    assert_eq!(before, after);
    assert_eq!(store.find_schedule(&id).unwrap().instances[0].name, "Focus");
}

#[test]
fn schedules_list_in_creation_order() {
    let dir = TempDir::new().unwrap();
    let mut store = JsonStore::open(dir.path()).unwrap();
    let p = preset("P", PhaseDuration::new(1, 0), PhaseDuration::new(1, 0));

    for name in ["First", "Second", "Third"] {
        let mut draft = ScheduleDraft::new(name);
        draft.add_instance(&p);
        store.save_schedule(&draft.finish().unwrap()).unwrap();
    }
    let names: Vec<_> = store
        .load_schedules()
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["First", "Second", "Third"]);

    let id = store.load_schedules().unwrap()[1].id.clone();
    assert!(store.delete_schedule(&id).unwrap());
    assert_eq!(store.load_schedules().unwrap().len(), 2);
}
