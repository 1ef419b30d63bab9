// Assertion entry points, observed through a recording sink.

mod common;

use std::collections::HashMap;

use common::{plain_config, recording_checker, scratch_store};
use verity::check::{Checker, RecordingSink};
use verity::config::{Config, Settings};
use verity::diff::ContextLines;
use verity::equality::NumericEquivalence;
use verity::value::{Record, Value};

#[test]
fn equal_records_pass_and_unequal_records_explain_themselves() {
    let mut check = recording_checker();
    let john = Record::new("Person").field("name", "John").field("age", 34i32);
    let older = Record::new("Person").field("name", "John").field("age", 35i32);

    assert!(check.equal(&john, &john.clone()));
    assert!(!check.equal(&john, &older));

    let message = check.sink().last().expect("failure recorded");
    let expected = "\
Two objects that should be equal, are not equal.

Expected:
  Person
    name: John
    age: 34

Actual:
  Person
    name: John
    age: 35

Difference:
  Person
    name: John
-   age: 34
+   age: 35";
    assert_eq!(message, expected);
}

#[test]
fn identity_and_value_equality_differ_on_width() {
    let mut check = recording_checker();
    assert!(!check.equal(&1i32, &1i64));
    assert!(check.equal_values(&1i32, &1i64));
    assert!(check.equal_values(&vec![1u8, 2], &[1i64, 2]));
    assert!(check.not_equal_values(&1i32, &2i32));
    assert_eq!(check.sink().messages().len(), 1);
}

#[test]
fn numeric_equivalence_follows_the_config() {
    let config = Config {
        numeric: NumericEquivalence::SameKind,
        ..plain_config()
    };
    let mut check = Checker::with_sink(RecordingSink::default(), config);
    assert!(check.equal_values(&1i32, &1u64));
    assert!(!check.equal_values(&1i32, &1.0f64));
}

#[test]
fn collection_checks() {
    let mut check = recording_checker();
    assert!(check.same_elements(&vec!["a", "b", "b"], &vec!["b", "a", "b"]));
    assert!(!check.same_elements(&vec!["a", "b", "b"], &vec!["a", "a", "b"]));
    assert!(check.not_same_elements(&vec![1, 2], &vec![1, 2, 2]));
    assert!(check.subset(&vec![1, 2, 3], &vec![1, 2]));
    assert!(!check.subset(&vec![1, 2, 3], &vec![1, 7]));
    assert!(check.no_subset(&vec![1, 2, 3], &vec![1, 7]));
    assert!(check.unique(&vec![1, 2, 3]));
    assert!(check.not_unique(&vec![1, 2, 2]));

    let messages = check.sink().messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[1].contains("List:\n  [0] 1\n  [1] 2\n  [2] 3"));
    assert!(messages[1].contains("Subset:\n  [0] 1\n  [1] 7"));
}

#[test]
fn maps_compare_regardless_of_insertion_order() {
    let mut check = recording_checker();
    let a: HashMap<&str, i32> = [("x", 1), ("y", 2)].into_iter().collect();
    let b: HashMap<&str, i32> = [("y", 2), ("x", 1)].into_iter().collect();
    assert!(check.equal(&a, &b));
}

#[test]
fn nil_checks() {
    let mut check = recording_checker();
    assert!(check.nil(&Value::Nil));
    assert!(check.nil(&Option::<String>::None));
    assert!(!check.nil(&Some("present")));
    assert!(!check.not_nil(&Value::Nil));
    assert!(check
        .sink()
        .messages()
        .first()
        .is_some_and(|m| m.contains("Expected: nil\n\nActual: \"present\"")));
}

#[test]
fn long_text_diffs_are_collapsed() {
    let expected: String = (1..=50).map(|i| format!("line {}\n", i)).collect();
    let actual = expected.replace("line 25\n", "line twenty-five\n");
    let mut check = recording_checker();
    assert!(!check.equal(expected.as_str(), actual.as_str()));
    let message = check.sink().last().expect("failure");
    assert!(message.contains("~ 22 unchanged lines ~"));
    assert!(message.contains("- line 25\n+ line twenty-five"));
}

#[test]
fn unlimited_context_shows_every_line() {
    let config = Config {
        context_lines: ContextLines::Unlimited,
        ..plain_config()
    };
    let mut check = Checker::with_sink(RecordingSink::default(), config);
    let expected: String = (1..=20).map(|i| format!("{}\n", i)).collect();
    let actual = expected.replace("10\n", "ten\n");
    assert!(!check.equal(expected.as_str(), actual.as_str()));
    assert!(!check.sink().last().expect("failure").contains("unchanged line"));
}

#[test]
fn checkers_snapshot_the_shared_settings() {
    let settings = Settings::new(plain_config());
    settings.set_diff_context_lines(0);
    let config = settings.snapshot();
    settings.set_diff_context_lines(-1);
    let check = Checker::with_sink(RecordingSink::default(), config);
    assert_eq!(check.config().context_lines, ContextLines::Lines(0));
}

#[test]
fn snapshot_checks_round_trip() {
    let (_dir, store) = scratch_store();
    let mut check = recording_checker().with_store(store);
    let value = Record::new("Config").field("retries", 3i32);
    assert!(check.snapshot("config", &value));
    assert!(check.snapshot("config", &value));
    assert!(!check.snapshot("config", &Record::new("Config").field("retries", 4i32)));
    assert!(!check.snapshot("", &value));
    let messages = check.sink().messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[1].starts_with("The snapshot could not be checked."));
}
