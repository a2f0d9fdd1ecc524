use sovran_lexicon::{AnyLexicon, AnyValue, Booler, Byter, Inter, MapError, Stringer};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

#[test]
fn test_basic_operations() {
    let store: AnyLexicon<String> = AnyLexicon::new();

    // Store a value
    store.set("key".to_string(), 42i32).unwrap();

    // Check if key exists
    assert!(store.has("key").unwrap());

    // Get the value
    let value = store
        .with_as("key", |val: &i32| {
            assert_eq!(*val, 42);
            *val
        })
        .unwrap();
    assert_eq!(value, 42);

    // Update the value
    store
        .with_mut_as("key", |val: &mut i32| {
            *val = 100;
        })
        .unwrap();
    assert_eq!(store.get_as::<i32, _>("key").unwrap(), 100);

    // Replace with entirely new value of different type
    store
        .set("key".to_string(), "new value".to_string())
        .unwrap();

    let string_value = store
        .with_as("key", |val: &String| val.clone())
        .unwrap();
    assert_eq!(string_value, "new value");

    // Remove the value
    assert!(store.remove("key").unwrap());
    assert!(store.not("key").unwrap());
}

#[test]
fn test_type_safety() {
    let store: AnyLexicon<String> = AnyLexicon::new();

    store.set("key".to_string(), "hello".to_string()).unwrap();

    // Try to get it as the wrong type
    let result = store.with_as("key", |val: &i32| *val);
    assert!(matches!(result, Err(MapError::TypeMismatch)));

    // Get it as the correct type
    let value = store.get_as::<String, _>("key").unwrap();
    assert_eq!(value, "hello");
}

#[test]
fn test_multiple_types() {
    let store: AnyLexicon<String> = AnyLexicon::new();

    store.set("int".to_string(), 42i32).unwrap();
    store
        .set("string".to_string(), "hello".to_string())
        .unwrap();
    store.set("float".to_string(), 3.14f64).unwrap();

    assert_eq!(store.with_as("int", |val: &i32| *val).unwrap(), 42);
    assert_eq!(store.get_as::<String, _>("string").unwrap(), "hello");
    assert_eq!(store.with_as("float", |val: &f64| *val).unwrap(), 3.14);

    let keys = store.keys().unwrap();
    assert_eq!(keys.len(), 3);
    assert!(keys.contains(&"int".to_string()));
    assert!(keys.contains(&"string".to_string()));
    assert!(keys.contains(&"float".to_string()));
}

#[test]
fn test_thread_safety() {
    let store = Arc::new(AnyLexicon::<String>::new());

    store.set("counter".to_string(), 0i32).unwrap();

    // Create multiple threads to increment the counter
    let mut handles = vec![];
    for _ in 0..10 {
        let store_clone = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for _ in 0..100 {
                store_clone
                    .with_mut_as("counter", |counter: &mut i32| {
                        *counter += 1;
                    })
                    .unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let final_value = store.get_as::<i32, _>("counter").unwrap();
    assert_eq!(final_value, 1000); // 10 threads * 100 increments
}

#[test]
fn test_error_handling() {
    let store: AnyLexicon<String> = AnyLexicon::new();

    // Try to get a non-existent key
    let result = store.with_as("nonexistent", |val: &i32| *val);
    assert!(matches!(result, Err(MapError::KeyNotFound(_))));

    // Store a value and try to get it with the wrong type
    store.set("key".to_string(), 42i32).unwrap();
    let result = store.with_as("key", |val: &String| val.clone());
    assert!(matches!(result, Err(MapError::TypeMismatch)));

    // Try to modify a non-existent key
    let result = store.with_mut_as("nonexistent", |val: &mut i32| {
        *val = 100;
    });
    assert!(matches!(result, Err(MapError::KeyNotFound(_))));

    // Removing a non-existent key reports false, deleting it is fine
    assert!(!store.remove("nonexistent").unwrap());
    assert!(store.delete_ok("nonexistent").unwrap());
}

#[test]
fn test_empty_store_operations() {
    let store: AnyLexicon<String> = AnyLexicon::new();

    assert!(store.is_empty().unwrap());
    assert_eq!(store.len().unwrap(), 0);
    assert!(store.keys().unwrap().is_empty());

    // Every bulk operation on an empty lexicon is a no-op
    store.delete_many(["a", "b"]).unwrap();
    assert!(store.pop_many(["a"]).unwrap().is_empty());
    assert!(store.filter(|_, _| true).unwrap().is_empty().unwrap());
}

#[test]
fn test_custom_key_types() {
    // Test with integer keys
    let store: AnyLexicon<i32> = AnyLexicon::new();

    store.set(1, "one".to_string()).unwrap();
    store.set(2, "two".to_string()).unwrap();

    let value = store.get_as::<String, _>(&1).unwrap();
    assert_eq!(value, "one");

    // Test with tuple keys
    let store: AnyLexicon<(i32, i32)> = AnyLexicon::new();

    store.set((1, 2), "point".to_string()).unwrap();

    let value = store.with_as(&(1, 2), |val: &String| val.clone()).unwrap();
    assert_eq!(value, "point");
}

#[test]
fn test_error_display() {
    let key_not_found = MapError::KeyNotFound("\"missing\"".to_string());
    let type_mismatch = MapError::TypeMismatch;

    assert_eq!(
        format!("{}", key_not_found),
        "Key not found in lexicon: \"missing\""
    );
    assert_eq!(
        format!("{}", type_mismatch),
        "Type mismatch for the requested key"
    );

    assert!(format!("{:?}", type_mismatch).contains("TypeMismatch"));
}

#[test]
fn test_structured_values() {
    let store: AnyLexicon<String> = AnyLexicon::new();

    let mut config = HashMap::new();
    config.insert("key".to_string(), "value".to_string());
    store.set("config".to_string(), config).unwrap();

    let value = store
        .with_as("config", |c: &HashMap<String, String>| c.get("key").cloned())
        .unwrap();
    assert_eq!(value, Some("value".to_string()));

    // Equal maps compare equal through the erased value
    let mut expected = HashMap::new();
    expected.insert("key".to_string(), "value".to_string());
    assert_eq!(
        store.contains(&AnyValue::new(expected)).unwrap(),
        Some("config".to_string())
    );
}

#[test]
fn test_with_mut_type_mismatch() {
    let store: AnyLexicon<String> = AnyLexicon::new();

    store.set("key".to_string(), "value".to_string()).unwrap();

    let result = store.with_mut_as("key", |_: &mut i32| {
        panic!("Should not reach here");
    });

    assert!(matches!(result, Err(MapError::TypeMismatch)));
}

#[test]
fn test_default_implementation() {
    let store: AnyLexicon<String> = Default::default();

    assert!(store.is_empty().unwrap());

    store.set("test".to_string(), 42).unwrap();
    assert_eq!(store.get_as::<i32, _>("test").unwrap(), 42);
}

#[test]
fn test_typed_adapters() -> Result<(), MapError> {
    let flags = Booler::<&str>::new();
    flags.add_many([[("debug", true), ("verbose", false)]])?;
    assert_eq!(flags.keys_func(|_| true)?.len(), 2);
    assert_eq!(flags.contains(&true)?, Some("debug"));

    let bytes = Byter::<usize>::new();
    for (index, byte) in "lex".bytes().enumerate() {
        bytes.add(index, byte)?;
    }
    assert_eq!(bytes.get_many(&[0, 2])?, vec![b'l', b'x']);

    let counts = Inter::<String>::new();
    counts.add("a".to_string(), 1)?;
    counts.add("b".to_string(), 2)?;
    let bigger = counts.map(|_, value| value * 10)?;
    assert_eq!(bigger.fetch("b")?, 20);
    assert_eq!(counts.fetch("b")?, 2);

    let names = Stringer::<u8>::new();
    names.add(1, "one".to_string())?;
    assert_eq!(names.pop(&1)?, "one");
    assert_eq!(names.pop(&1)?, "");
    Ok(())
}

#[test]
fn test_typed_transfer_between_instances() -> Result<(), MapError> {
    let _ = env_logger::builder().is_test(true).try_init();

    let inbox: Inter<&str> = [("x", 1), ("y", 2)].into_iter().collect();
    let archive = Inter::<&str>::new();
    archive.add("z", 3)?;

    inbox.empty_into(&archive)?;
    assert!(inbox.is_empty()?);
    assert_eq!(archive.len()?, 3);

    inbox.take_from(&archive)?;
    assert!(archive.is_empty()?);
    assert_eq!(inbox.values()?.iter().sum::<i64>(), 6);
    Ok(())
}

#[test]
fn test_typed_view_of_mixed_storage() -> Result<(), MapError> {
    let _ = env_logger::builder().is_test(true).try_init();

    let store = AnyLexicon::<&str>::new();
    store.set("a", 1i64)?;
    store.set("b", "two".to_string())?;
    store.set("c", 3i64)?;

    let numbers: Inter<&str> = store.typed();
    assert_eq!(numbers.len()?, 3);

    // The string reads as the default
    let mut total = 0;
    numbers.each_value(|value| total += value)?;
    assert_eq!(total, 4);

    // Writing through the view replaces it with a real integer
    numbers.replace_many(|_, value| Some(value + 1))?;
    assert_eq!(store.get_as::<i64, _>("b")?, 1);
    assert_eq!(store.get_as::<i64, _>("c")?, 4);
    Ok(())
}

#[test]
fn test_typed_concurrent_writers() -> Result<(), MapError> {
    let counts = Inter::<u64>::new();

    let handles: Vec<_> = (0..4u64)
        .map(|worker| {
            let counts = counts.clone();
            thread::spawn(move || -> Result<(), MapError> {
                for key in worker * 100..(worker + 1) * 100 {
                    counts.add(key, key as i64)?;
                }
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap()?;
    }

    assert_eq!(counts.len()?, 400);
    assert_eq!(counts.values()?.iter().sum::<i64>(), (0..400).sum::<i64>());
    Ok(())
}
