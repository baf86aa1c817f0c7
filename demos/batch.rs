use std::time::Duration;

use clap::Parser;

use adl_optimizer::expr::CoreExpression;
use adl_optimizer::optimizer::{Optimizer, OptimizerConfig};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of audience definitions.
    #[arg(value_name = "INT", default_value = "10")]
    n: usize,

    /// Time budget of the whole batch, in milliseconds.
    #[clap(long, value_name = "INT", default_value = "5000")]
    timeout: u64,

    /// Term count above which the normalizer cleans up.
    #[clap(long, value_name = "INT", default_value = "500")]
    cleanup_threshold: usize,

    /// Enable debug logging.
    #[clap(long)]
    debug: bool,
}

/// `(segment = i AND (channel = web OR channel = app)) AND (age < 3x OR age IS UNKNOWN)`, multiplied out.
fn audience(i: usize) -> CoreExpression {
    let segment = CoreExpression::equals("segment", &i.to_string());
    let web = CoreExpression::equals("channel", "web");
    let app = CoreExpression::equals("channel", "app");
    let young = CoreExpression::less_than("age", &format!("3{}", i % 10));
    let unknown_age = CoreExpression::is_unknown("age");
    CoreExpression::or([
        CoreExpression::and([segment.clone(), web.clone(), young.clone()]),
        CoreExpression::and([segment.clone(), app.clone(), young]),
        CoreExpression::and([segment.clone(), web, unknown_age.clone()]),
        CoreExpression::and([segment.clone(), app, unknown_age.clone()]),
        // same as the third term
        CoreExpression::and([segment, unknown_age.clone(), CoreExpression::equals("channel", "web"), unknown_age]),
    ])
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        if args.debug {
            simplelog::LevelFilter::Debug
        } else {
            simplelog::LevelFilter::Info
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();
    println!("args = {:?}", args);

    let exprs: Vec<CoreExpression> = (0..args.n).map(audience).collect();

    let config = OptimizerConfig::default()
        .with_timeout(Duration::from_millis(args.timeout))
        .with_cleanup_threshold(args.cleanup_threshold);
    let optimizer = Optimizer::new(config);

    match optimizer.process_batch(&exprs) {
        Ok(res) => {
            for (e, r) in exprs.iter().zip(&res) {
                println!("{}", e);
                println!("  => {}", r);
            }
        }
        Err(e) if e.is_time_out() => println!("Batch timed out: {}", e),
        Err(e) => return Err(e.into()),
    }

    let time_total = time_total.elapsed();
    println!("Done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
