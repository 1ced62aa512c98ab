//! Basic example of Tarkib DI wiring.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tarkib::prelude::*;

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

struct QuietLogger;

impl Logger for QuietLogger {
    fn log(&self, _msg: &str) {}
}

struct Config {
    database_url: String,
}

struct Database {
    url: String,
    logger: Arc<dyn Logger>,
    closed: AtomicBool,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

impl Dispose for Database {
    fn dispose(&self) {
        self.logger.log("Closing database connection");
        self.closed.store(true, Ordering::SeqCst);
    }
}

trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;
}

struct Metrics;
impl Plugin for Metrics {
    fn name(&self) -> &'static str {
        "metrics"
    }
}

struct Audit;
impl Plugin for Audit {
    fn name(&self) -> &'static str {
        "audit"
    }
}

struct UserService {
    db: Arc<Database>,
    logger: Arc<dyn Logger>,
    plugins: Vec<Arc<dyn Plugin>>,
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        self.logger.log(&format!("Getting user {id}"));
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt().with_env_filter("tarkib=debug").init();

    let mut registry = ComponentRegistry::new();
    registry
        // Logger: console when Verbose is on, quiet otherwise
        .register(
            ComponentDescriptor::constructed::<QuietLogger>()
                .implements::<dyn Logger>(|l| l)
                .singleton()
                .default_constructor(|_| Ok(Arc::new(QuietLogger))),
        )
        .register(
            ComponentDescriptor::constructed::<ConsoleLogger>()
                .implements::<dyn Logger>(|l| l)
                .singleton()
                .when("Verbose", true)
                .default_constructor(|_| Ok(Arc::new(ConsoleLogger))),
        )
        // Database: singleton, needs Config (seeded) and Logger
        .register(
            ComponentDescriptor::constructed::<Database>()
                .singleton()
                .disposable()
                .constructor(
                    Constructor::new("new")
                        .param(Parameter::of::<Config>("config"))
                        .param(Parameter::of::<dyn Logger>("logger")),
                    |args| {
                        let config = args.get::<Config>("config")?;
                        Ok(Arc::new(Database {
                            url: config.database_url.clone(),
                            logger: args.get("logger")?,
                            closed: AtomicBool::new(false),
                        }))
                    },
                ),
        )
        // Plugins: gathered as a collection
        .register(
            ComponentDescriptor::constructed::<Metrics>()
                .implements::<dyn Plugin>(|p| p)
                .default_constructor(|_| Ok(Arc::new(Metrics))),
        )
        .register(
            ComponentDescriptor::constructed::<Audit>()
                .implements::<dyn Plugin>(|p| p)
                .when("Audit", true)
                .default_constructor(|_| Ok(Arc::new(Audit))),
        )
        // UserService: scoped, one per request
        .register(
            ComponentDescriptor::constructed::<UserService>().scoped().constructor(
                Constructor::new("new")
                    .param(Parameter::of::<Database>("db"))
                    .param(Parameter::of::<dyn Logger>("logger"))
                    .param(Parameter::many::<dyn Plugin>("plugins")),
                |args| {
                    Ok(Arc::new(UserService {
                        db: args.get("db")?,
                        logger: args.get("logger")?,
                        plugins: args.get_all("plugins")?,
                    }))
                },
            ),
        );

    let plan = registry.plan()?;
    for binding in plan.summary().bindings {
        println!("{} => {}", binding.interface, binding.resolves_to);
    }

    let container = plan
        .container()
        .flag("Verbose", true)
        .flag("Audit", true)
        .seed(Arc::new(Config {
            database_url: "postgres://localhost/myapp".to_string(),
        }))
        .build()?;

    // Each request gets its own scope
    for request in 1..=2 {
        let scope = container.begin_lifetime_scope()?;
        let service = scope.resolve::<UserService>()?;
        let plugins: Vec<_> = service.plugins.iter().map(|p| p.name()).collect();
        println!("request {request}: {} (plugins: {plugins:?})", service.get_user(request));
        scope.dispose();
    }

    let db = container.resolve::<Database>()?;
    container.dispose();
    assert!(db.closed.load(Ordering::SeqCst));

    println!("✅ All dependencies resolved successfully!");
    Ok(())
}
