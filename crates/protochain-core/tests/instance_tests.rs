//! Tests for instance fields and method dispatch

use protochain_core::{msg, ChainError, Message, Method, Registry, Value};

#[test]
fn test_fields_do_not_shadow_methods() {
    let mut registry = Registry::new();
    let employee = registry.create_template("Employee", registry.root()).unwrap();
    registry
        .define_method(employee, "salary", Method::constant("salary**"))
        .unwrap();

    let mut instance = registry.create_instance(employee).unwrap();
    instance.set_field("salary", 1000);

    assert_eq!(
        instance.call_method(&registry, "salary", &[]).unwrap(),
        Value::from("salary**")
    );
    assert_eq!(instance.get_field("salary"), Some(&Value::from(1000)));
}

#[test]
fn test_missing_method() {
    let registry = Registry::new();
    let mut instance = registry.create_instance(registry.root()).unwrap();

    let err = instance.call_method(&registry, "fly", &[]).unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("does not understand: fly"));
}

#[test]
fn test_behavior_errors_are_wrapped() {
    let mut registry = Registry::new();
    let t = registry.create_template("Strict", registry.root()).unwrap();
    registry
        .define_method(
            t,
            "divide",
            Method::new(|_, args| {
                let [a, b] = args else {
                    anyhow::bail!("expected two arguments");
                };
                let divisor = b.as_i64().unwrap_or(0);
                if divisor == 0 {
                    anyhow::bail!("division by zero");
                }
                Ok(Value::from(a.as_i64().unwrap_or(0) / divisor))
            }),
        )
        .unwrap();

    let mut instance = registry.create_instance(t).unwrap();
    let ok = instance
        .call_method(&registry, "divide", &[Value::from(9), Value::from(3)])
        .unwrap();
    assert_eq!(ok, Value::from(3));

    let err = instance
        .call_method(&registry, "divide", &[Value::from(1), Value::from(0)])
        .unwrap_err();
    assert!(matches!(err, ChainError::MethodFailed { ref selector, .. } if selector == "divide"));
    assert!(!err.is_not_found());
}

#[test]
fn test_inherited_method_reads_own_fields() {
    let mut registry = Registry::new();
    let person = registry.create_template("Person", registry.root()).unwrap();
    registry
        .define_method(
            person,
            "describe",
            Method::new(|this, _| {
                let name = this.get_field("name").and_then(Value::as_str).unwrap_or("?");
                let age = this.get_field("age").and_then(Value::as_i64).unwrap_or(0);
                Ok(Value::from(format!("Name: {name}, Age: {age}")))
            }),
        )
        .unwrap();
    let student = registry.create_template("Student", person).unwrap();

    let mut alice = registry.create_instance(student).unwrap();
    alice.set_field("name", "alice");
    alice.set_field("age", 25);
    let mut bob = registry.create_instance(student).unwrap();
    bob.set_field("name", "bob");

    assert_eq!(
        alice.call_method(&registry, "describe", &[]).unwrap(),
        Value::from("Name: alice, Age: 25")
    );
    assert_eq!(
        bob.call_method(&registry, "describe", &[]).unwrap(),
        Value::from("Name: bob, Age: 0")
    );
}

#[test]
fn test_message_dispatch() {
    let mut registry = Registry::new();
    let manager = registry.create_template("Manager", registry.root()).unwrap();
    registry
        .define_method(manager, "monthlyBonus", Method::constant("monthlyBonus**"))
        .unwrap();
    let mut instance = registry.create_instance(manager).unwrap();

    assert_eq!(
        instance.send(&registry, &msg!(template)).unwrap(),
        Value::from("Manager")
    );
    assert_eq!(
        instance.send(&registry, &msg!(send monthlyBonus)).unwrap(),
        Value::from("monthlyBonus**")
    );
    assert_eq!(
        instance
            .send(&registry, &Message::RespondsTo("monthlyBonus".to_string()))
            .unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        instance
            .send(&registry, &Message::RespondsTo("salary".to_string()))
            .unwrap(),
        Value::Boolean(false)
    );

    // Unset field reads as nil
    assert_eq!(instance.send(&registry, &msg!(missing)).unwrap(), Value::Nil);
}

#[test]
fn test_bulk_field_update() {
    let registry = Registry::new();
    let mut instance = registry.create_instance(registry.root()).unwrap();

    instance
        .send(
            &registry,
            &Message::UpdateFields(vec![
                ("name".to_string(), Value::from("user")),
                ("age".to_string(), Value::from(25)),
            ]),
        )
        .unwrap();

    match instance.send(&registry, &msg!(allFields)).unwrap() {
        Value::Map(map) => {
            assert_eq!(map.len(), 2);
            assert_eq!(map.get("age"), Some(&Value::from(25)));
        }
        other => panic!("Expected map, got {other}"),
    }
}

#[test]
fn test_state_serializes() {
    let registry = Registry::new();
    let mut instance = registry.create_instance(registry.root()).unwrap();
    instance.set_field("counter", 0);

    let json = serde_json::to_string(&instance.state()).unwrap();
    let state: protochain_core::InstanceState = serde_json::from_str(&json).unwrap();
    assert_eq!(state, instance.state());
}
