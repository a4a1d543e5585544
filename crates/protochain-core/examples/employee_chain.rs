//! Build an Employee <- Supervisor <- Manager chain and walk it

use protochain_core::{instance_to_primitive, msg, Hint, Method, Registry, Value};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Protochain Basic Example ===\n");

    let mut registry = Registry::new();
    let employee = registry.create_template("Employee", registry.root())?;
    registry.define_method(employee, "salary", Method::constant("salary**"))?;

    let supervisor = registry.create_template("Supervisor", employee)?;
    registry.define_method(supervisor, "profitShare", Method::constant("profitShare**"))?;

    let manager = registry.create_template("Manager", supervisor)?;
    registry.define_method(manager, "monthlyBonus", Method::constant("monthlyBonus**"))?;
    registry.define_method(
        manager,
        "toString",
        Method::new(|this, _| {
            let name = this.get_field("name").and_then(Value::as_str).unwrap_or("?");
            Ok(Value::from(format!("Manager {name}")))
        }),
    )?;

    let mut boss = registry.create_instance(manager)?;
    boss.send(&registry, &msg!(name: "Ada"))?;

    println!("\nCalling inherited methods:");
    for name in ["salary", "profitShare", "monthlyBonus"] {
        let owner = registry.lookup(manager, name)?.owner;
        let result = boss.call_method(&registry, name, &[])?;
        println!("  {name} -> {result} (defined on {})", registry.name(owner)?);
    }

    println!("\nChain from the instance up:");
    for id in registry.ancestors(boss.template()) {
        println!("  {} ({id})", registry.name(id)?);
    }

    match boss.call_method(&registry, "nonexistent", &[]) {
        Ok(value) => println!("\nUnexpected: {value}"),
        Err(err) => println!("\nLookup failed as expected: {err}"),
    }

    let text = instance_to_primitive(&mut boss, &registry, Hint::String)?;
    println!("\nString form: {text}");

    Ok(())
}
