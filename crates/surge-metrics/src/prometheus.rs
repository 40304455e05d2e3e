//! Prometheus text exposition format.
//!
//! Renders the active tier and the most recent capacity sample as gauges
//! labelled with the tier id.

use std::fmt::Write as _;

use surge_core::TierConfig;
use surge_state::CapacitySample;

/// Optimization names exported as `surge_optimization_active` series, so a
/// switched-off optimization shows up as 0 instead of disappearing.
const KNOWN_OPTIMIZATIONS: [&str; 8] = [
    "animations_disabled",
    "caching",
    "compression_high",
    "compression_maximum",
    "degradation",
    "queue",
    "reduced_updates",
    "throttling",
];

fn gauge(out: &mut String, name: &str, help: &str, tier: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} gauge");
    let _ = writeln!(out, "{name}{{tier=\"{tier}\"}} {value}");
}

/// Render tier limits and the latest sample into Prometheus text format.
///
/// With no sample yet, load gauges read zero.
pub fn render_prometheus(tier: &TierConfig, latest: Option<&CapacitySample>) -> String {
    let mut out = String::new();
    let id = tier.id.as_str();

    let max_help = "Hard concurrency ceiling of the active tier.";
    gauge(&mut out, "surge_tier_max_concurrent", max_help, id, tier.max_concurrent);
    let safe_help = "Safe concurrency ceiling of the active tier.";
    gauge(&mut out, "surge_tier_safe_concurrent", safe_help, id, tier.safe_concurrent);
    let slots_help = "Slots reserved for priority clients.";
    gauge(&mut out, "surge_tier_priority_slots", slots_help, id, tier.priority_slots);
    gauge(
        &mut out,
        "surge_tier_monthly_cost_usd",
        "Monthly cost of the active tier.",
        id,
        format!("{:.2}", tier.monthly_cost),
    );

    let (connections, queue_length, percent) = latest
        .map(|s| (s.connections, s.queue_length, s.capacity_percent))
        .unwrap_or((0, 0, 0.0));
    let conn_help = "Live connections at the last tick.";
    gauge(&mut out, "surge_connections", conn_help, id, connections);
    let queue_help = "Clients waiting beyond the hard ceiling.";
    gauge(&mut out, "surge_queue_length", queue_help, id, queue_length);
    let pct_help = "Load as a percentage of safe capacity.";
    gauge(&mut out, "surge_capacity_percent", pct_help, id, format!("{percent:.2}"));

    out.push_str(
        "# HELP surge_optimization_active Whether an optimization is switched on (1) or off (0).\n",
    );
    out.push_str("# TYPE surge_optimization_active gauge\n");
    for name in KNOWN_OPTIMIZATIONS {
        let on = latest.is_some_and(|s| s.active_optimizations.contains(name));
        let _ = writeln!(
            out,
            "surge_optimization_active{{tier=\"{id}\",optimization=\"{name}\"}} {}",
            u8::from(on)
        );
    }

    out
}
