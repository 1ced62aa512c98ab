//! Plan-build behavior: cycles, construction selection, summaries.

use std::sync::Arc;
use std::time::Duration;

use tarkib::prelude::*;
use tarkib::selector::ConstructionPath;

trait Ia: Send + Sync {}
trait Ib: Send + Sync {}

struct A;
struct B;
impl Ia for A {}
impl Ib for B {}

#[test]
fn two_cycle_fails_plan_build() {
    let result = ComponentRegistry::new()
        .component(
            ComponentDescriptor::constructed::<A>()
                .implements::<dyn Ia>(|a| a)
                .constructor(Constructor::new("new").param(Parameter::of::<dyn Ib>("b")), |_| {
                    Ok(Arc::new(A))
                }),
        )
        .component(
            ComponentDescriptor::constructed::<B>()
                .implements::<dyn Ib>(|b| b)
                .constructor(Constructor::new("new").param(Parameter::of::<dyn Ia>("a")), |_| {
                    Ok(Arc::new(B))
                }),
        )
        .plan();

    match result {
        Err(TarkibError::CyclicDependency(err)) => {
            let pair = [err.dependent, err.dependency];
            assert!(pair.contains(&DependencyKey::of::<dyn Ia>()));
            assert!(pair.contains(&DependencyKey::of::<dyn Ib>()));
            assert!(err.to_string().contains("Ia"));
        }
        other => panic!("Expected CyclicDependency, got: {other:?}"),
    }
}

#[test]
fn cycle_through_collection_is_detected() {
    struct Hub;
    impl Ia for Hub {}

    let result = ComponentRegistry::new()
        .component(
            ComponentDescriptor::constructed::<Hub>()
                .implements::<dyn Ia>(|h| h)
                .constructor(Constructor::new("new").param(Parameter::many::<dyn Ib>("spokes")), |_| {
                    Ok(Arc::new(Hub))
                }),
        )
        .component(
            ComponentDescriptor::constructed::<B>()
                .implements::<dyn Ib>(|b| b)
                .constructor(Constructor::new("new").param(Parameter::of::<dyn Ia>("hub")), |_| {
                    Ok(Arc::new(B))
                }),
        )
        .plan();

    assert!(matches!(result, Err(TarkibError::CyclicDependency(_))));
}

#[test]
fn factory_owner_must_be_provided() {
    struct Vault;
    struct Token;

    let result = ComponentRegistry::new()
        .component(ComponentDescriptor::factory_property::<Token, Vault>("token", |_| Arc::new(Token)))
        .plan();

    match result {
        Err(TarkibError::UnsatisfiableConstruction(err)) => {
            assert_eq!(err.component, DependencyKey::of::<Token>());
            assert_eq!(err.owner, Some(DependencyKey::of::<Vault>()));
        }
        other => panic!("Expected UnsatisfiableConstruction, got: {other:?}"),
    }
}

#[test]
fn component_without_constructor_is_unsatisfiable() {
    let result = ComponentRegistry::new().component(ComponentDescriptor::constructed::<A>()).plan();
    assert!(matches!(result, Err(TarkibError::UnsatisfiableConstruction(_))));
}

struct Pool {
    size: usize,
}

struct Connection {
    pool_size: usize,
    timeout: Duration,
}

#[test]
fn factory_method_receives_owner_and_arguments() {
    let container = ComponentRegistry::new()
        .component(
            ComponentDescriptor::constructed::<Pool>()
                .singleton()
                .default_constructor(|_| Ok(Arc::new(Pool { size: 8 }))),
        )
        .component(ComponentDescriptor::factory_method::<Connection, Pool>(
            Constructor::new("open").param(Parameter::of::<Duration>("timeout")),
            |pool, args| {
                Ok(Arc::new(Connection {
                    pool_size: pool.size,
                    timeout: *args.get::<Duration>("timeout")?,
                }))
            },
        ))
        .plan()
        .unwrap()
        .container()
        .seed(Arc::new(Duration::from_secs(5)))
        .build()
        .unwrap();

    let connection = container.resolve::<Connection>().unwrap();
    assert_eq!(connection.pool_size, 8);
    assert_eq!(connection.timeout, Duration::from_secs(5));
}

#[test]
fn first_feasible_constructor_wins() {
    struct Missing;
    struct Widget {
        via: &'static str,
    }

    let plan = ComponentRegistry::new()
        .component(
            ComponentDescriptor::constructed::<Widget>()
                .constructor(
                    Constructor::new("with_missing").param(Parameter::of::<Missing>("missing")),
                    |_| Ok(Arc::new(Widget { via: "with_missing" })),
                )
                .constructor(Constructor::new("plain"), |_| Ok(Arc::new(Widget { via: "plain" })))
                .constructor(
                    Constructor::new("defaulted").param(Parameter::of::<Missing>("missing").with_default()),
                    |_| Ok(Arc::new(Widget { via: "defaulted" })),
                ),
        )
        .plan()
        .unwrap();

    assert!(matches!(
        plan.components()[0].construction().path,
        ConstructionPath::Constructor { index: 1, name: "plain" }
    ));
    assert!(plan.promoted_parameters().is_empty());
    assert_eq!(plan.container().build().unwrap().resolve::<Widget>().unwrap().via, "plain");
}

#[test]
fn fewest_missing_parameters_are_promoted() {
    struct Host(&'static str);
    struct Port(u16);
    struct Endpoint {
        address: String,
    }

    let plan = ComponentRegistry::new()
        .component(
            ComponentDescriptor::constructed::<Endpoint>()
                .constructor(
                    Constructor::new("full")
                        .param(Parameter::of::<Host>("host"))
                        .param(Parameter::of::<Port>("port")),
                    |args| {
                        let host = args.get::<Host>("host")?;
                        let port = args.get::<Port>("port")?;
                        Ok(Arc::new(Endpoint {
                            address: format!("{}:{}", host.0, port.0),
                        }))
                    },
                )
                .constructor(
                    Constructor::new("local").param(Parameter::of::<Port>("port")),
                    |args| {
                        let port = args.get::<Port>("port")?;
                        Ok(Arc::new(Endpoint {
                            address: format!("localhost:{}", port.0),
                        }))
                    },
                ),
        )
        .plan()
        .unwrap();

    let promoted = plan.promoted_parameters();
    assert_eq!(promoted.len(), 1);
    assert_eq!(promoted[0].name, "port");
    assert_eq!(promoted[0].key, DependencyKey::of::<Port>());

    let container = plan.container().seed(Arc::new(Port(8080))).build().unwrap();
    assert_eq!(container.resolve::<Endpoint>().unwrap().address, "localhost:8080");
}

#[test]
fn defaulted_parameter_is_absent_when_unavailable() {
    struct Cache;
    struct Repo {
        cached: bool,
    }

    let plan = ComponentRegistry::new()
        .component(ComponentDescriptor::constructed::<Repo>().constructor(
            Constructor::new("new").param(Parameter::of::<Cache>("cache").with_default()),
            |args| {
                Ok(Arc::new(Repo {
                    cached: args.get_opt::<Cache>("cache")?.is_some(),
                }))
            },
        ))
        .plan()
        .unwrap();

    assert!(plan.promoted_parameters().is_empty());
    assert!(!plan.container().build().unwrap().resolve::<Repo>().unwrap().cached);
}

#[test]
fn summary_serializes_to_json() {
    trait Store: Send + Sync {}
    struct Memory;
    struct Disk;
    impl Store for Memory {}
    impl Store for Disk {}

    let plan = ComponentRegistry::new()
        .component(
            ComponentDescriptor::constructed::<Memory>()
                .implements::<dyn Store>(|s| s)
                .singleton()
                .default_constructor(|_| Ok(Arc::new(Memory))),
        )
        .component(
            ComponentDescriptor::constructed::<Disk>()
                .implements::<dyn Store>(|s| s)
                .when("Persistent", true)
                .default_constructor(|_| Ok(Arc::new(Disk))),
        )
        .plan()
        .unwrap();

    let json = serde_json::to_value(plan.summary()).unwrap();

    assert_eq!(json["flags"], serde_json::json!(["Persistent"]));
    assert_eq!(json["components"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["components"][0]["lifetime"], "Singleton");
    assert_eq!(json["components"][1]["condition"]["flag"], "Persistent");

    let binding = &json["bindings"][0];
    assert_eq!(binding["strategy"], "conditional");
    assert_eq!(binding["resolves_to"], "Persistent ? Disk : Memory");
}
