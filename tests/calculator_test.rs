mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::helpers::{assert_error_contains, assert_validation_error};
use common::{calculator_in, calculator_with, dec, history_vec, run, temp_config};
use common::{FailingObserver, RecordingObserver};
use memento_calc::operations::Arithmetic;
use tempfile::TempDir;

#[test]
fn test_add_undo_redo_scenario() {
    let dir = TempDir::new().unwrap();
    let mut calc = calculator_in(dir.path());

    assert_eq!(run(&mut calc, "add", "2", "3").unwrap(), dec("5"));
    assert_eq!(calc.history().len(), 1);

    assert!(calc.undo());
    assert_eq!(calc.history().len(), 0);

    assert!(calc.redo());
    let history = history_vec(&calc);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].operation(), "add");
    assert_eq!(history[0].operand1(), dec("2"));
    assert_eq!(history[0].operand2(), dec("3"));
    assert_eq!(history[0].result(), dec("5"));
}

#[test]
fn test_root_scenario_is_exact() {
    let dir = TempDir::new().unwrap();
    let mut calc = calculator_in(dir.path());
    let result = run(&mut calc, "root", "16", "2").unwrap();
    assert_eq!(result.to_string(), "4");
}

#[test]
fn test_perform_requires_operation() {
    let dir = TempDir::new().unwrap();
    let mut calc = calculator_in(dir.path());
    let err = calc.perform("1", "2").unwrap_err();
    assert!(err.is_operation());
    assert_error_contains(&err, "no operation set", "idle calculator");
}

#[test]
fn test_set_operation_with_strategy() {
    let dir = TempDir::new().unwrap();
    let mut calc = calculator_in(dir.path());
    calc.set_operation(Box::new(Arithmetic::Power));
    assert!(calc.is_ready());
    assert_eq!(calc.perform("2", "8").unwrap(), dec("256"));
}

#[test]
fn test_division_by_zero_records_nothing() {
    let dir = TempDir::new().unwrap();
    let mut calc = calculator_in(dir.path());
    run(&mut calc, "add", "1", "1").unwrap();

    for op in ["divide", "int_divide", "modulus", "percent"] {
        let err = run(&mut calc, op, "10", "0").unwrap_err();
        assert!(err.is_validation(), "{op}");
        assert_error_contains(&err, "by zero", op);
    }

    assert_eq!(calc.history().len(), 1);
    assert!(calc.undo());
    assert!(!calc.undo());
}

#[test]
fn test_operand_rejections() {
    let dir = TempDir::new().unwrap();
    let mut calc = calculator_in(dir.path());

    assert_validation_error(
        &run(&mut calc, "root", "-16", "2").unwrap_err(),
        "Cannot calculate root of negative number",
    );
    assert_validation_error(
        &run(&mut calc, "root", "16", "0").unwrap_err(),
        "Zero root is undefined",
    );
    assert_validation_error(
        &run(&mut calc, "power", "2", "-3").unwrap_err(),
        "Negative exponents not supported",
    );
    assert_validation_error(
        &run(&mut calc, "add", "two", "3").unwrap_err(),
        "Invalid number format: two",
    );
    assert!(calc.history().is_empty());
    assert!(!calc.can_undo());
}

#[test]
fn test_inputs_above_maximum_are_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = temp_config(dir.path());
    config.max_input_value = dec("1000");
    let mut calc = calculator_with(config);

    let err = run(&mut calc, "multiply", "1001", "1").unwrap_err();
    assert!(err.is_validation());
    assert_error_contains(&err, "exceeds maximum", "oversized operand");
    assert!(run(&mut calc, "multiply", "1000", "1000").is_ok());
}

#[test]
fn test_new_calculation_clears_redo() {
    let dir = TempDir::new().unwrap();
    let mut calc = calculator_in(dir.path());
    run(&mut calc, "add", "1", "1").unwrap();
    run(&mut calc, "add", "2", "2").unwrap();

    assert!(calc.undo());
    assert!(calc.can_redo());

    run(&mut calc, "subtract", "5", "1").unwrap();
    assert!(!calc.can_redo());
    assert!(!calc.redo());

    let results: Vec<_> = history_vec(&calc).iter().map(|c| c.result()).collect();
    assert_eq!(results, vec![dec("2"), dec("4")]);
}

#[test]
fn test_redo_on_empty_stack_returns_false() {
    let dir = TempDir::new().unwrap();
    let mut calc = calculator_in(dir.path());
    assert!(!calc.redo());
    assert!(!calc.undo());
}

#[test]
fn test_multiple_undo_redo_steps() {
    let dir = TempDir::new().unwrap();
    let mut calc = calculator_in(dir.path());
    for i in 1..=3 {
        run(&mut calc, "multiply", &i.to_string(), "10").unwrap();
    }

    assert!(calc.undo());
    assert!(calc.undo());
    assert_eq!(calc.history().len(), 1);

    assert!(calc.redo());
    assert_eq!(calc.history().len(), 2);
    assert!(calc.redo());
    assert_eq!(calc.history().len(), 3);
    assert!(!calc.redo());
}

#[test]
fn test_history_is_bounded_oldest_first() {
    let dir = TempDir::new().unwrap();
    let mut config = temp_config(dir.path());
    config.max_history_size = 3;
    let mut calc = calculator_with(config);

    for i in 1..=5 {
        run(&mut calc, "add", &i.to_string(), "0").unwrap();
    }

    let operands: Vec<_> = history_vec(&calc).iter().map(|c| c.operand1()).collect();
    assert_eq!(operands, vec![dec("3"), dec("4"), dec("5")]);
}

#[test]
fn test_undo_restores_evicted_entry() {
    let dir = TempDir::new().unwrap();
    let mut config = temp_config(dir.path());
    config.max_history_size = 2;
    let mut calc = calculator_with(config);

    run(&mut calc, "add", "1", "0").unwrap();
    run(&mut calc, "add", "2", "0").unwrap();
    let before = history_vec(&calc);
    run(&mut calc, "add", "3", "0").unwrap();

    assert!(calc.undo());
    assert_eq!(history_vec(&calc), before);
}

#[test]
fn test_undo_depth_is_capped_at_history_size() {
    let dir = TempDir::new().unwrap();
    let mut config = temp_config(dir.path());
    config.max_history_size = 2;
    let mut calc = calculator_with(config);

    for i in 1..=5 {
        run(&mut calc, "add", &i.to_string(), "0").unwrap();
    }

    assert!(calc.undo());
    assert!(calc.undo());
    assert!(!calc.undo());
    // Oldest retained snapshot: the history before the fourth calculation.
    let operands: Vec<_> = history_vec(&calc).iter().map(|c| c.operand1()).collect();
    assert_eq!(operands, vec![dec("2"), dec("3")]);

    assert!(calc.redo());
    assert!(calc.redo());
    assert!(!calc.redo());
    assert_eq!(calc.history().last().unwrap().operand1(), dec("5"));
}

#[test]
fn test_clear_is_irreversible() {
    let dir = TempDir::new().unwrap();
    let mut calc = calculator_in(dir.path());
    run(&mut calc, "add", "1", "1").unwrap();
    run(&mut calc, "add", "1", "2").unwrap();
    calc.undo();

    calc.clear();
    assert!(calc.history().is_empty());
    assert!(!calc.undo());
    assert!(!calc.redo());
}

#[test]
fn test_observers_notified_in_order() {
    let dir = TempDir::new().unwrap();
    let mut calc = calculator_in(dir.path());
    let seen = Rc::new(RefCell::new(Vec::new()));

    calc.add_observer(Box::new(RecordingObserver {
        name: "first",
        seen: Rc::clone(&seen),
    }));
    calc.add_observer(Box::new(RecordingObserver {
        name: "second",
        seen: Rc::clone(&seen),
    }));

    run(&mut calc, "add", "2", "3").unwrap();
    assert_eq!(*seen.borrow(), vec!["first:5:1", "second:5:1"]);
}

#[test]
fn test_failed_calculation_does_not_notify() {
    let dir = TempDir::new().unwrap();
    let mut calc = calculator_in(dir.path());
    let seen = Rc::new(RefCell::new(Vec::new()));
    calc.add_observer(Box::new(RecordingObserver {
        name: "obs",
        seen: Rc::clone(&seen),
    }));

    assert!(run(&mut calc, "divide", "1", "0").is_err());
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_removed_observer_is_not_notified() {
    let dir = TempDir::new().unwrap();
    let mut calc = calculator_in(dir.path());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let id = calc.add_observer(Box::new(RecordingObserver {
        name: "obs",
        seen: Rc::clone(&seen),
    }));

    assert!(calc.remove_observer(id));
    run(&mut calc, "add", "1", "1").unwrap();
    assert!(seen.borrow().is_empty());
    assert_eq!(calc.observer_count(), 0);
}

#[test]
fn test_observer_error_reaches_caller() {
    let dir = TempDir::new().unwrap();
    let mut calc = calculator_in(dir.path());
    let seen = Rc::new(RefCell::new(Vec::new()));
    calc.add_observer(Box::new(FailingObserver));
    calc.add_observer(Box::new(RecordingObserver {
        name: "after",
        seen: Rc::clone(&seen),
    }));

    let err = run(&mut calc, "add", "1", "1").unwrap_err();
    assert_eq!(err.message(), "observer exploded");
    // The calculation was recorded before notification started.
    assert_eq!(calc.history().len(), 1);
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_show_history_uses_display_precision() {
    let dir = TempDir::new().unwrap();
    let mut config = temp_config(dir.path());
    config.precision = 3;
    let mut calc = calculator_with(config);

    run(&mut calc, "divide", "1", "3").unwrap();
    run(&mut calc, "add", "2.50", "1").unwrap();
    assert_eq!(
        calc.show_history(),
        vec!["divide(1, 3) = 0.333", "add(2.5, 1) = 3.5"]
    );
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = temp_config(dir.path());
    config.max_history_size = 0;
    let err = memento_calc::Calculator::open(config).unwrap_err();
    assert!(err.is_configuration());
}
