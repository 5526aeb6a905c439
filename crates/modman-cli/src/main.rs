use std::thread;
use std::time::Duration;

use modman_core::logging::init_tracing;
use modman_core::{
    FactoryResolver, Lifecycle, Module, ModuleError, ModuleIdentity, RegisterError,
};
use tokio::time::{Instant, sleep};
use tracing::info;

const DEMO_MODULES: &[&str] = &["demo.echo", "demo.ticker", "demo.crash", "demo.bad_init"];

#[derive(Default)]
struct EchoModule {
    greeting: Option<String>,
}

impl Module for EchoModule {
    fn initialize(&mut self) -> Result<(), ModuleError> {
        self.greeting = Some("hello from demo.echo".to_string());
        Ok(())
    }

    fn run(&mut self) -> Result<(), ModuleError> {
        let greeting = self
            .greeting
            .as_deref()
            .ok_or_else(|| ModuleError::new("run before initialize"))?;
        info!("{greeting}");
        Ok(())
    }
}

struct TickerModule {
    ticks: u32,
    interval: Duration,
}

impl Module for TickerModule {
    fn initialize(&mut self) -> Result<(), ModuleError> {
        if self.ticks == 0 {
            return Err(ModuleError::new("ticker needs at least one tick"));
        }
        Ok(())
    }

    fn run(&mut self) -> Result<(), ModuleError> {
        for tick in 1..=self.ticks {
            thread::sleep(self.interval);
            info!(tick, "ticker");
        }
        Ok(())
    }
}

#[derive(Default)]
struct CrashModule;

impl Module for CrashModule {
    fn initialize(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }

    fn run(&mut self) -> Result<(), ModuleError> {
        panic!("demo.crash always crashes")
    }
}

#[derive(Default)]
struct BadInitModule;

impl Module for BadInitModule {
    fn initialize(&mut self) -> Result<(), ModuleError> {
        Err(ModuleError::with_source(
            "cannot open device",
            std::io::Error::new(std::io::ErrorKind::NotFound, "/dev/demo"),
        ))
    }

    fn run(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }
}

fn demo_resolver() -> Result<FactoryResolver, RegisterError> {
    let mut resolver = FactoryResolver::new();
    resolver.register::<EchoModule>("demo.echo")?;
    resolver.register_with("demo.ticker", ModuleIdentity::new("demo::Ticker"), || {
        Ok(Box::new(TickerModule {
            ticks: 3,
            interval: Duration::from_millis(50),
        }) as Box<dyn Module>)
    })?;
    resolver.register::<CrashModule>("demo.crash")?;
    resolver.register::<BadInitModule>("demo.bad_init")?;
    Ok(resolver)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // (A) build the lifecycle; the demo ids must all be known
    let mut lifecycle = Lifecycle::builder(demo_resolver()?)
        .thread_name_prefix("modman-demo")
        .expect_modules(DEMO_MODULES)
        .build()?;

    // (B) execute every requested id twice to show duplicate suppression
    let mut ids: Vec<String> = std::env::args().skip(1).collect();
    if ids.is_empty() {
        ids = DEMO_MODULES.iter().map(|id| id.to_string()).collect();
    }
    for id in &ids {
        let first = lifecycle.execute(id);
        let second = lifecycle.execute(id);
        println!("{id}: first={first} second={second}");
    }

    // (C) wait for the workers to settle, bounded
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        let status = lifecycle.status();
        if status.modules.iter().all(|m| m.state.is_terminal()) {
            break;
        }
        sleep(Duration::from_millis(20)).await;
    }

    // (D) report
    println!("{}", serde_json::to_string_pretty(&lifecycle.status())?);
    Ok(())
}
