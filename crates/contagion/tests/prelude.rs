//! Integration test: the prelude is enough to run a field end to end.

use contagion::prelude::*;

#[test]
fn prelude_drives_a_field_to_completion() {
    let config = FieldConfig {
        subject_count: 30,
        initial_sick: 3,
        infection_radius: 0.0,
        time_scale: 1,
        min_infection_time: 5,
        max_infection_time: 10,
        seed: Some(1),
        ..FieldConfig::default()
    };
    let mut field = SimulationField::new(config).unwrap();
    let mut last: Option<TickReport> = None;
    while field.eradication_tick().is_none() {
        last = field.advance().report().cloned();
    }
    let report = last.unwrap();
    assert!(report.eradicated);
    assert_eq!(report.counts.removed, 3);
    assert_eq!(report.counts.susceptible, 27);
    assert_eq!(field.state(), EngineState::Running);
}

#[test]
fn facade_modules_reexport_sub_crates() {
    let bounds = contagion::types::Bounds::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
    assert!(bounds.is_valid());
    let cfg = contagion::engine::FieldConfig::default();
    assert!(cfg.validate().is_ok());
}
