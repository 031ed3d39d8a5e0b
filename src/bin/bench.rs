// Quartermaster Bench Runner — seeded scenario validation
// Seedable PRNG world generation, per-run conservation audit, JSON report
//
// Usage:
//   cargo run --release --bin bench                   # Run all scenarios
//   cargo run --release --bin bench -- --ticks 500    # Longer runs
//   cargo run --release --bin bench -- drought        # Filter by name
//   cargo run --release --bin bench -- --seed 42      # Custom seed
//   cargo run --release --bin bench -- --json out.json

use quartermaster::colony::{Store, STORAGE_CAP};
use quartermaster::{
    Colony, ColonyId, NoMarket, Resource, Terminal, TerminalNetwork, RESOURCE_EXCHANGE_ORDER,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::time::Instant;

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    ticks: Option<u64>,
    seed: u64,
    json: Option<String>,
    filter: Option<String>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        ticks: None,
        seed: 0,
        json: None,
        filter: None,
    };
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--ticks" => {
                i += 1;
                if i < args.len() {
                    cli.ticks = args[i].parse().ok();
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    cli.seed = args[i].parse().unwrap_or(0);
                }
            }
            "--json" => {
                i += 1;
                if i < args.len() {
                    cli.json = Some(args[i].clone());
                }
            }
            arg if !arg.starts_with('-') => {
                cli.filter = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }
    cli
}

// ─── Scenario Configuration ─────────────────────────────────────────────────

struct Scenario {
    name: &'static str,
    label: &'static str,
    colonies: usize,
    ticks: u64,
    /// Pre-run world adjustment (liquidity control, gluts, droughts).
    setup: Option<fn(&mut [Colony])>,
    /// Per-tick overrides, issued between init() and run().
    overrides: Option<fn(&mut TerminalNetwork, &[Colony], u64)>,
}

fn drain_energy(colonies: &mut [Colony]) {
    // first colony starts bone-dry on stored energy
    if let Some(storage) = colonies[0].storage.as_mut() {
        let held = storage.amount(Resource::Energy);
        storage.remove(Resource::Energy, held);
    }
}

fn mineral_glut(colonies: &mut [Colony]) {
    // last colony hoards utrium far past the surplus line
    let last = colonies.len() - 1;
    if let Some(storage) = colonies[last].storage.as_mut() {
        storage.add(Resource::Utrium, 120_000);
    }
}

fn congest_terminals(colonies: &mut [Colony]) {
    for colony in colonies.iter_mut().skip(1) {
        if let Some(terminal) = colony.terminal.as_mut() {
            terminal.cooldown = 30;
        }
    }
}

fn boost_request(net: &mut TerminalNetwork, colonies: &[Colony], tick: u64) {
    if tick == 1 {
        net.request_resource(colonies, ColonyId(0), Resource::Xuh2o, 6_000, 0);
    }
}

fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "BALANCED_MESH",
            label: "Balanced Mesh",
            colonies: 9,
            ticks: 200,
            setup: None,
            overrides: None,
        },
        Scenario {
            name: "ENERGY_DROUGHT",
            label: "Energy Drought",
            colonies: 9,
            ticks: 300,
            setup: Some(drain_energy),
            overrides: None,
        },
        Scenario {
            name: "MINERAL_GLUT",
            label: "Mineral Glut",
            colonies: 9,
            ticks: 300,
            setup: Some(mineral_glut),
            overrides: None,
        },
        Scenario {
            name: "TERMINAL_CONGESTION",
            label: "Terminal Congestion",
            colonies: 9,
            ticks: 200,
            setup: Some(congest_terminals),
            overrides: None,
        },
        Scenario {
            name: "BOOST_REQUEST",
            label: "Boost Request Override",
            colonies: 9,
            ticks: 100,
            setup: None,
            overrides: Some(boost_request),
        },
        Scenario {
            name: "SCALE_49",
            label: "Scale: 49 Colonies",
            colonies: 49,
            ticks: 100,
            setup: None,
            overrides: None,
        },
    ]
}

// ─── World Generation ───────────────────────────────────────────────────────

fn generate_world(count: usize, rng: &mut ChaCha8Rng) -> Vec<Colony> {
    let grid = (count as f64).sqrt().ceil() as usize;
    let mut colonies = Vec::with_capacity(count);
    for i in 0..count {
        let room = format!("W{}N{}", (i % grid) * 3, (i / grid) * 3);
        let mut colony = Colony::new(format!("colony-{i}"), 8, room.parse().unwrap());

        let mut terminal = Terminal::new();
        terminal
            .store
            .add(Resource::Energy, rng.gen_range(20_000..60_000));
        for r in [Resource::Utrium, Resource::Keanium, Resource::Zynthium] {
            terminal.store.add(r, rng.gen_range(0..12_000));
        }
        if rng.gen_bool(0.3) {
            terminal.store.add(Resource::Xuh2o, rng.gen_range(0..9_000));
        }
        colony.terminal = Some(terminal);

        let mut storage = Store::new(STORAGE_CAP);
        storage
            .contents
            .set(Resource::Energy, rng.gen_range(50_000..400_000));
        colony.storage = Some(storage);

        colony.recompute_assets();
        colonies.push(colony);
    }
    colonies
}

fn total_units(colonies: &[Colony], resource: Resource) -> u64 {
    colonies
        .iter()
        .map(|c| {
            let term = c.terminal.as_ref().map_or(0, |t| t.store.amount(resource));
            let stor = c.storage.as_ref().map_or(0, |s| s.amount(resource));
            let fact = c.factory.as_ref().map_or(0, |f| f.amount(resource));
            term as u64 + stor as u64 + fact as u64
        })
        .sum()
}

// ─── Scenario Execution ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct ScenarioReport {
    name: String,
    label: String,
    colonies: usize,
    ticks: u64,
    transfers: u32,
    units_sent: u64,
    overload_events: u32,
    energy_spread_before: u64,
    energy_spread_after: u64,
    conservation_ok: bool,
    elapsed_ms: u128,
}

fn energy_spread(colonies: &[Colony]) -> u64 {
    let per: Vec<u64> = colonies
        .iter()
        .map(|c| c.assets[Resource::Energy] as u64)
        .collect();
    let max = per.iter().copied().max().unwrap_or(0);
    let min = per.iter().copied().min().unwrap_or(0);
    max - min
}

fn run_scenario(scenario: &Scenario, ticks: u64, seed: u64) -> ScenarioReport {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut colonies = generate_world(scenario.colonies, &mut rng);
    if let Some(setup) = scenario.setup {
        setup(&mut colonies);
    }
    for colony in colonies.iter_mut() {
        colony.recompute_assets();
    }

    let initial_totals: Vec<u64> = RESOURCE_EXCHANGE_ORDER
        .iter()
        .map(|&r| total_units(&colonies, r))
        .collect();
    let spread_before = energy_spread(&colonies);

    let mut net = TerminalNetwork::new(seed);
    let mut market = NoMarket;
    let mut transfers = 0u32;
    let mut units_sent = 0u64;
    let mut overload_events = 0u32;

    let start = Instant::now();
    for tick in 1..=ticks {
        for colony in colonies.iter_mut() {
            if let Some(terminal) = colony.terminal.as_mut() {
                terminal.begin_tick();
            }
            colony.recompute_assets();
        }
        net.refresh();
        for (i, colony) in colonies.iter().enumerate() {
            let _ = net.add_colony(ColonyId(i), colony);
        }
        net.init(&colonies);
        if let Some(overrides) = scenario.overrides {
            overrides(&mut net, &colonies, tick);
        }
        let summary = net.run(&mut colonies, &mut market);
        transfers += summary.transfers;
        units_sent += summary.units_sent;
        overload_events += summary.overloaded_terminals;
    }
    let elapsed_ms = start.elapsed().as_millis();

    // Conservation audit: every non-energy resource is conserved exactly;
    // energy shrinks by exactly the ledger's cumulative transaction costs.
    let mut conservation_ok = true;
    for (i, &r) in RESOURCE_EXCHANGE_ORDER.iter().enumerate() {
        let now = total_units(&colonies, r);
        if r.is_energy() {
            let burned: u64 = net
                .stats()
                .costs
                .values()
                .flat_map(|m| m.values())
                .sum();
            if initial_totals[i] != now + burned {
                conservation_ok = false;
            }
        } else if initial_totals[i] != now {
            conservation_ok = false;
        }
    }

    ScenarioReport {
        name: scenario.name.to_string(),
        label: scenario.label.to_string(),
        colonies: scenario.colonies,
        ticks,
        transfers,
        units_sent,
        overload_events,
        energy_spread_before: spread_before,
        energy_spread_after: energy_spread(&colonies),
        conservation_ok,
        elapsed_ms,
    }
}

// ─── Main ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct BenchReport {
    version: &'static str,
    prng: &'static str,
    seed: u64,
    scenarios: Vec<ScenarioReport>,
}

fn main() {
    let cli = parse_args();
    let all = scenarios();
    let to_run: Vec<&Scenario> = match &cli.filter {
        Some(f) => {
            let f = f.to_lowercase();
            all.iter()
                .filter(|s| {
                    s.name.to_lowercase().contains(&f) || s.label.to_lowercase().contains(&f)
                })
                .collect()
        }
        None => all.iter().collect(),
    };
    if to_run.is_empty() {
        eprintln!("No scenarios match filter: {:?}", cli.filter);
        std::process::exit(1);
    }

    println!("\n  Quartermaster Bench Runner");
    println!("  PRNG: ChaCha8Rng | Base seed: {}\n", cli.seed);
    println!(
        "  {:<26} {:>9} {:>12} {:>9} {:>10} {:>8}",
        "Scenario", "Transfers", "Units", "Spread%", "Conserved", "Time"
    );
    println!("  {}", "-".repeat(80));

    let mut reports = Vec::new();
    let mut failed = 0;
    for scenario in to_run {
        let ticks = cli.ticks.unwrap_or(scenario.ticks);
        let report = run_scenario(scenario, ticks, cli.seed);
        let spread_pct = if report.energy_spread_before > 0 {
            report.energy_spread_after as f64 / report.energy_spread_before as f64 * 100.0
        } else {
            0.0
        };
        let status = if report.conservation_ok { "PASS" } else { "FAIL" };
        if !report.conservation_ok {
            failed += 1;
        }
        println!(
            "  {:<26} {:>9} {:>12} {:>8.1}% {:>10} {:>6}ms  {}",
            report.label,
            report.transfers,
            report.units_sent,
            spread_pct,
            report.conservation_ok,
            report.elapsed_ms,
            status,
        );
        reports.push(report);
    }
    println!("  {}", "-".repeat(80));

    let report = BenchReport {
        version: env!("CARGO_PKG_VERSION"),
        prng: "ChaCha8Rng",
        seed: cli.seed,
        scenarios: reports,
    };
    if let Some(path) = &cli.json {
        let json = serde_json::to_string_pretty(&report).expect("Failed to serialize report");
        std::fs::write(path, json).expect("Failed to write report");
        println!("  Results saved to: {path}\n");
    }

    if failed > 0 {
        std::process::exit(1);
    }
}
