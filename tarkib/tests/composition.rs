//! Containers composed on top of each other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier, mpsc};
use std::thread;
use std::time::Duration;

use tarkib::prelude::*;

trait Logger: Send + Sync {
    fn prefix(&self) -> &'static str;
}

#[derive(Default)]
struct ConsoleLogger {
    closed: AtomicBool,
}

impl Logger for ConsoleLogger {
    fn prefix(&self) -> &'static str {
        "console"
    }
}

impl Dispose for ConsoleLogger {
    fn dispose(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

struct FileLogger;

impl Logger for FileLogger {
    fn prefix(&self) -> &'static str {
        "file"
    }
}

struct Marker;

trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;
}

macro_rules! plugin {
    ($($ty:ident),* $(,)?) => {
        $(
            struct $ty;
            impl Plugin for $ty {
                fn name(&self) -> &'static str {
                    stringify!($ty)
                }
            }
        )*
    };
}

plugin!(Metrics, Audit, Tracing);

fn base_registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    registry
        .register(
            ComponentDescriptor::constructed::<ConsoleLogger>()
                .implements::<dyn Logger>(|l| l)
                .as_self()
                .singleton()
                .disposable()
                .default_constructor(|_| Ok(Arc::new(ConsoleLogger::default()))),
        )
        .register(
            ComponentDescriptor::constructed::<Marker>()
                .when("Debug", true)
                .default_constructor(|_| Ok(Arc::new(Marker))),
        )
        .register(
            ComponentDescriptor::constructed::<Metrics>()
                .implements::<dyn Plugin>(|p| p)
                .default_constructor(|_| Ok(Arc::new(Metrics))),
        )
        .register(
            ComponentDescriptor::constructed::<Audit>()
                .implements::<dyn Plugin>(|p| p)
                .default_constructor(|_| Ok(Arc::new(Audit))),
        )
        .request_collection::<dyn Plugin>();
    registry
}

fn base_container() -> Container {
    base_registry()
        .plan()
        .unwrap()
        .container()
        .flags([("Debug", true), ("Verbose", false)])
        .build()
        .unwrap()
}

struct Service {
    logger: Arc<dyn Logger>,
}

fn service_registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    registry
        .register(ComponentDescriptor::constructed::<Service>().constructor(
            Constructor::new("new").param(Parameter::of::<dyn Logger>("logger")),
            |args| {
                Ok(Arc::new(Service {
                    logger: args.get("logger")?,
                }))
            },
        ))
        .register(
            ComponentDescriptor::constructed::<Tracing>()
                .implements::<dyn Plugin>(|p| p)
                .default_constructor(|_| Ok(Arc::new(Tracing))),
        )
        .request_collection::<dyn Plugin>();
    registry
}

#[test]
fn composed_container_falls_through_to_base() {
    let base = base_container();
    let composed = service_registry().plan().unwrap().container().compose_on(&base).build().unwrap();

    let from_base = base.resolve::<dyn Logger>().unwrap();
    let through = composed.resolve::<dyn Logger>().unwrap();
    assert!(Arc::ptr_eq(&from_base, &through));
    assert!(composed.is_registered::<ConsoleLogger>());
}

#[test]
fn promoted_parameters_are_resolved_from_base() {
    let base = base_container();
    let plan = service_registry().plan().unwrap();
    assert!(plan.is_promoted(&DependencyKey::of::<dyn Logger>()));

    let composed = plan.container().compose_on(&base).build().unwrap();
    let service = composed.resolve::<Service>().unwrap();

    assert_eq!(service.logger.prefix(), "console");
    assert!(Arc::ptr_eq(&service.logger, &base.resolve::<dyn Logger>().unwrap()));
}

#[test]
fn local_seed_wins_over_base() {
    let base = base_container();
    let composed = service_registry()
        .plan()
        .unwrap()
        .container()
        .seed::<dyn Logger>(Arc::new(FileLogger))
        .compose_on(&base)
        .build()
        .unwrap();

    assert_eq!(composed.resolve::<Service>().unwrap().logger.prefix(), "file");
    assert_eq!(composed.resolve::<dyn Logger>().unwrap().prefix(), "file");
}

#[test]
fn flags_agree_unless_overridden() {
    let base = base_container();
    let composed = service_registry()
        .plan()
        .unwrap()
        .container()
        .flag("Verbose", true)
        .compose_on(&base)
        .build()
        .unwrap();

    assert_eq!(base.get_boolean("Debug"), composed.get_boolean("Debug"));
    assert_eq!(base.get_boolean("Verbose"), Some(false));
    assert_eq!(composed.get_boolean("Verbose"), Some(true));
    assert!(composed.resolve::<Marker>().is_ok());
}

#[test]
fn composition_links_base_and_inheritor() {
    let base = base_container();
    let composed = service_registry().plan().unwrap().container().compose_on(&base).build().unwrap();

    assert_eq!(composed.base().map(|c| c.id()), Some(base.id()));
    assert_eq!(composed.base_relation(), Some(BaseRelation::Composed));
    assert_eq!(base.inheritor().map(|c| c.id()), Some(composed.id()));

    drop(composed);
    assert!(base.inheritor().is_none());
}

#[test]
fn aggregates_merge_across_the_chain() {
    let base = base_container();
    let composed = service_registry().plan().unwrap().container().compose_on(&base).build().unwrap();

    let names = |container: &Container| -> Vec<&'static str> {
        container
            .resolve_all::<dyn Plugin>()
            .unwrap()
            .iter()
            .map(|p| p.name())
            .collect()
    };

    assert_eq!(names(&composed), vec!["Metrics", "Audit", "Tracing"]);
    assert_eq!(names(&base), vec!["Metrics", "Audit", "Tracing"]);

    let scope = composed.begin_lifetime_scope().unwrap();
    assert_eq!(names(&scope), vec!["Metrics", "Audit", "Tracing"]);
}

#[test]
fn dispose_cascades_to_composed_base() {
    let base = base_container();
    let logger = base.resolve::<ConsoleLogger>().unwrap();
    let composed = service_registry().plan().unwrap().container().compose_on(&base).build().unwrap();

    composed.dispose();

    assert!(composed.is_disposed());
    assert!(base.is_disposed());
    assert!(logger.closed.load(Ordering::SeqCst));
}

#[test]
fn composing_on_a_disposed_base_fails() {
    let base = base_container();
    base.dispose();

    let result = service_registry().plan().unwrap().container().compose_on(&base).build();
    assert!(matches!(result, Err(TarkibError::Disposed)));
}

#[test]
fn missing_promoted_parameter_without_base_fails_to_build() {
    let result = service_registry().plan().unwrap().container().build();

    match result {
        Err(TarkibError::NotRegistered(err)) => {
            assert_eq!(err.requested, DependencyKey::of::<dyn Logger>());
            assert_eq!(err.required_by, Some(DependencyKey::of::<Service>()));
        }
        other => panic!("Expected NotRegistered, got: {other:?}"),
    }
}

#[test]
fn concurrent_singletons_across_composed_containers_do_not_block_each_other() {
    struct UpstreamGate;
    struct DownstreamGate;
    struct Upstream {
        plugins: usize,
    }
    struct Downstream {
        plugins: usize,
    }

    // each singleton waits at its gate until the other one is mid-construction
    let barrier = Arc::new(Barrier::new(2));
    let upstream_barrier = barrier.clone();
    let base = base_registry()
        .component(ComponentDescriptor::constructed::<UpstreamGate>().default_constructor(move |_| {
            upstream_barrier.wait();
            Ok(Arc::new(UpstreamGate))
        }))
        .component(
            ComponentDescriptor::constructed::<Upstream>().singleton().constructor(
                Constructor::new("new")
                    .param(Parameter::of::<UpstreamGate>("gate"))
                    .param(Parameter::many::<dyn Plugin>("plugins")),
                |args| {
                    Ok(Arc::new(Upstream {
                        plugins: args.get_all::<dyn Plugin>("plugins")?.len(),
                    }))
                },
            ),
        )
        .plan()
        .unwrap()
        .container()
        .build()
        .unwrap();
    let composed = service_registry()
        .component(ComponentDescriptor::constructed::<DownstreamGate>().default_constructor(move |_| {
            barrier.wait();
            Ok(Arc::new(DownstreamGate))
        }))
        .component(
            ComponentDescriptor::constructed::<Downstream>().singleton().constructor(
                Constructor::new("new")
                    .param(Parameter::of::<DownstreamGate>("gate"))
                    .param(Parameter::many::<dyn Plugin>("plugins")),
                |args| {
                    Ok(Arc::new(Downstream {
                        plugins: args.get_all::<dyn Plugin>("plugins")?.len(),
                    }))
                },
            ),
        )
        .plan()
        .unwrap()
        .container()
        .compose_on(&base)
        .build()
        .unwrap();

    let (tx, rx) = mpsc::channel();
    {
        let tx = tx.clone();
        let composed = composed.clone();
        thread::spawn(move || tx.send(("downstream", composed.resolve::<Downstream>().map(|d| d.plugins))));
    }
    {
        let base = base.clone();
        thread::spawn(move || tx.send(("upstream", base.resolve::<Upstream>().map(|u| u.plugins))));
    }

    for _ in 0..2 {
        let (name, plugins) = rx
            .recv_timeout(Duration::from_secs(10))
            .expect("resolution threads deadlocked");
        assert_eq!(plugins.ok(), Some(3), "{name} saw the wrong plugin count");
    }
}
