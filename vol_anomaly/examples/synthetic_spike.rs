//! Demonstration of the anomaly check on synthetic GARCH prices
//!
//! 1. Generate a calm GARCH(1,1) return history
//! 2. Append a burst of large returns
//! 3. Run the pipeline before and after the burst
//! 4. Print the projected price range when the burst is flagged

use chrono::{TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use vol_anomaly::garch::GarchProcess;
use vol_anomaly::{compute, GarchParams, PipelineConfig, PriceSeries, Projection};

fn to_prices(anchor: f64, returns: &[f64]) -> Vec<f64> {
    let mut prices = Vec::with_capacity(returns.len() + 1);
    prices.push(anchor);
    for r in returns {
        let last = prices[prices.len() - 1];
        prices.push(last * (1.0 + r / 100.0));
    }
    prices
}

fn run(label: &str, prices: &[f64], config: &PipelineConfig) {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let series = PriceSeries::from_daily_prices(start, prices).unwrap();

    match compute(&series, config.clone()) {
        Ok(report) => {
            let a = report.assessment;
            println!(
                "{:<12} {:>8.4} {:>10.4} {:>10}",
                label, a.current_volatility, a.threshold, a.is_anomalous
            );
            if let Projection::Simulated { summary, .. } = &report.projection {
                if let Some(outlook) = summary.terminal() {
                    println!(
                        "             {} steps ahead: {:.2} expected, {:.2} - {:.2}",
                        summary.len(),
                        outlook.expected,
                        outlook.low,
                        outlook.high
                    );
                }
            }
        }
        Err(e) => println!("{:<12} failed: {}", label, e),
    }
}

fn main() {
    println!("========================================");
    println!("Volatility Anomaly Demo");
    println!("========================================\n");

    let params = GarchParams {
        mu: 0.05,
        omega: 0.02,
        alpha: 0.05,
        beta: 0.9,
    };
    let mut rng = StdRng::seed_from_u64(42);
    let mut returns = GarchProcess::new(params).sample(250, &mut rng);
    let calm = to_prices(30000.0, &returns);

    // Burst of +/-7% days
    for i in 0..8 {
        returns.push(if i % 2 == 0 { 7.0 } else { -6.5 });
    }
    let burst = to_prices(30000.0, &returns);

    let config = PipelineConfig::default().with_seed(42);

    println!("{:<12} {:>8} {:>10} {:>10}", "History", "Vol %", "Thresh %", "Anomalous");
    println!("{:<12} {:>8} {:>10} {:>10}", "-------", "-----", "--------", "---------");
    run("calm", &calm, &config);
    run("burst", &burst, &config);
}
