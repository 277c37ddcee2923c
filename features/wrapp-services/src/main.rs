use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use wrapp_autowire::{Autowire, Autowired, Members};
use wrapp_services::ServiceProvider;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut provider = ServiceProvider::new();
    provider
        .add(Arc::new(Repository::default()))
        .add(Arc::new(AuditLog::default()))
        .add_as(Arc::new(StdoutSink), |sink| sink as Arc<dyn Sink>)
        .add_as(Arc::new(CountingSink), |sink| sink as Arc<dyn Sink>);
    println!("{:?}", provider);

    let handler = Handler::default();
    if let Err(e) = wrapp_autowire::resolve(&provider, &handler) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    handler.handle("user created");
}

/// Repository and AuditLog depend on each other
#[derive(Default)]
struct Repository {
    audit: Autowired<Arc<AuditLog>>,
}
impl Autowire for Repository {
    fn autowire(members: &mut Members<Self>) {
        members.autowire("audit", |r| &r.audit);
    }
}

#[derive(Default)]
struct AuditLog {
    repository: Autowired<Arc<Repository>>,
    sinks: Autowired<Vec<Arc<dyn Sink>>>,
}
impl Autowire for AuditLog {
    fn autowire(members: &mut Members<Self>) {
        members
            .autowire("repository", |a| &a.repository)
            .autowire("sinks", |a| &a.sinks);
    }
}
impl AuditLog {
    fn record(&self, event: &str) {
        for sink in self.sinks.get() {
            sink.write(event);
        }
    }
}

trait Sink: Send + Sync {
    fn write(&self, event: &str);
}

struct StdoutSink;
impl Autowire for StdoutSink {}
impl Sink for StdoutSink {
    fn write(&self, event: &str) {
        println!("[audit] {event}");
    }
}

struct CountingSink;
impl Autowire for CountingSink {}
impl Sink for CountingSink {
    fn write(&self, event: &str) {
        println!("[audit] {} bytes", event.len());
    }
}

#[derive(Default)]
struct Handler {
    repository: Autowired<Arc<Repository>>,
}
impl Autowire for Handler {
    fn autowire(members: &mut Members<Self>) {
        members.autowire("repository", |h| &h.repository);
    }
}
impl Handler {
    fn handle(&self, event: &str) {
        let repository = self.repository.get();
        repository.audit.get().record(event);
        let wired_back = Arc::ptr_eq(&repository.audit.get().repository.get(), &repository);
        println!("audit log points back at the same repository: {wired_back}");
    }
}
