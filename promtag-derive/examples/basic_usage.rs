use prometheus::Encoder as _;
use promtag::{Counter, Histogram, MetricRecord, Registrar};
use tracing_subscriber::EnvFilter;

#[derive(Default, MetricRecord)]
struct Stat {
    #[metric("name=seconds_from_start,labels=[thread],help='seconds since application start'")]
    seconds_from_start: Counter,

    // Without an annotation the field name is used and no labels are defined.
    unused_default_counter: Counter,

    #[metric(
        "labels=[thread],buckets=[0.0001, 0.001, 0.01, 0.1, 0.2, 0.3, 0.5, 1.0, 2.0, 10, 20, 50, 100]"
    )]
    random_duration: Histogram,
}

fn main() {
    // Run with `RUST_LOG=promtag=debug` to see every registered collector.
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let registry = prometheus::Registry::new();
    let mut stat = Stat::default();

    if let Err(e) = Registrar::new(&registry).with_label("app", "basic_usage").register(&mut stat) {
        eprintln!("metrics register failed: {e}");
        std::process::exit(1);
    }

    for i in 0..5u32 {
        stat.seconds_from_start.inc(&["main"]);
        stat.random_duration.observe(&["main"], f64::from(i) * 0.15);
    }

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = vec![];
    encoder.encode(&registry.gather(), &mut buffer).expect("Failed to encode metrics");

    println!("{}", String::from_utf8_lossy(&buffer));
}
