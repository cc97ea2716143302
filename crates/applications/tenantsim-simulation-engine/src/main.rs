//! Tenantsim CLI
//!
//! Runs each requested ordering policy on the same generated workload and
//! prints per-policy and per-tenant results.

use anyhow::Context;
use clap::Parser;
use std::fs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tenantsim_simulation_engine::{
    MetricsAggregator, RunReport, ScenarioConfig, VmSelection, run_policies, types::CSV_HEADER,
};

#[derive(Parser, Debug)]
#[command(name = "tenantsim")]
#[command(
    about = "Compare job ordering policies on a multi-tenant FaaS cluster",
    long_about = None
)]
struct Args {
    /// Scenario JSON file (flags below override its values)
    #[arg(short, long)]
    config: Option<String>,

    /// Policies to compare (comma-separated: RoundRobin,SJF,TenantAware)
    #[arg(short, long, default_value = "RoundRobin,SJF,TenantAware")]
    policies: String,

    /// Number of tenants
    #[arg(long)]
    tenants: Option<u32>,

    /// Number of jobs to generate
    #[arg(short, long)]
    jobs: Option<u32>,

    /// Shortest job length (instructions)
    #[arg(long)]
    length_min: Option<u64>,

    /// Longest job length (instructions)
    #[arg(long)]
    length_max: Option<u64>,

    /// Workload seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of hosts
    #[arg(long)]
    hosts: Option<u32>,

    /// PEs per host
    #[arg(long)]
    pes_per_host: Option<u32>,

    /// MIPS per host PE
    #[arg(long)]
    host_mips: Option<f64>,

    /// Number of VMs
    #[arg(long)]
    vms: Option<u32>,

    /// MIPS per VM PE
    #[arg(long)]
    vm_mips: Option<f64>,

    /// VM binding rule
    #[arg(long, value_enum)]
    vm_selection: Option<VmSelection>,

    /// Run policies on separate threads
    #[arg(long)]
    parallel: bool,

    /// Print every completion record as CSV
    #[arg(long)]
    csv: bool,

    /// Output JSON file path (optional)
    #[arg(short, long)]
    output: Option<String>,
}

impl Args {
    fn scenario(&self) -> anyhow::Result<ScenarioConfig> {
        let mut config = match &self.config {
            Some(path) => ScenarioConfig::from_json_file(path)?,
            None => ScenarioConfig::default(),
        };

        let workload = &mut config.workload;
        if let Some(v) = self.tenants {
            workload.tenant_count = v;
        }
        if let Some(v) = self.jobs {
            workload.job_count = v;
        }
        if let Some(v) = self.length_min {
            workload.length_min = v;
        }
        if let Some(v) = self.length_max {
            workload.length_max = v;
        }
        if let Some(v) = self.seed {
            workload.seed = v;
        }

        let cluster = &mut config.cluster;
        if let Some(v) = self.hosts {
            cluster.host_count = v;
        }
        if let Some(v) = self.pes_per_host {
            cluster.pes_per_host = v;
        }
        if let Some(v) = self.host_mips {
            cluster.host_mips = v;
        }
        if let Some(v) = self.vms {
            cluster.vm_count = v;
        }
        if let Some(v) = self.vm_mips {
            cluster.vm_mips = v;
        }

        if let Some(selection) = self.vm_selection {
            config.vm_selection = selection;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tenantsim=info,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = args.scenario()?;

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║  Tenantsim - Multi-Tenant FaaS Simulation                ║");
    println!("╚══════════════════════════════════════════════════════════╝\n");

    println!("Simulation Parameters:");
    println!("  Tenants: {}", config.workload.tenant_count);
    println!(
        "  Jobs: {} ({}-{} instructions, seed {})",
        config.workload.job_count,
        config.workload.length_min,
        config.workload.length_max,
        config.workload.seed
    );
    println!(
        "  Hosts: {} × {} PE × {} MIPS",
        config.cluster.host_count,
        config.cluster.pes_per_host,
        config.cluster.host_mips
    );
    println!(
        "  VMs: {} × {} PE × {} MIPS ({:?} binding)\n",
        config.cluster.vm_count,
        config.cluster.vm_pes,
        config.cluster.vm_mips,
        config.vm_selection
    );

    let policy_names: Vec<String> = args
        .policies
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let outcomes = run_policies(&config, &policy_names, args.parallel)?;

    let mut aggregator = MetricsAggregator::new();
    for outcome in &outcomes {
        match &outcome.result {
            Ok(records) => aggregator.add_run(&outcome.policy, records),
            Err(e) => eprintln!("Policy {} failed: {}", outcome.policy, e),
        }
    }

    if args.csv {
        for outcome in &outcomes {
            if let Some(records) = outcome.records() {
                println!("# {}", outcome.policy);
                println!("{}", CSV_HEADER);
                for record in records {
                    println!("{}", record.to_csv_row());
                }
                println!();
            }
        }
    }

    println!(
        "{:<14} {:>8} {:>16} {:>14} {:>12}",
        "Policy", "Jobs", "Total Exec (s)", "Avg Exec (s)", "Makespan"
    );
    println!("{}", "-".repeat(68));
    for summary in aggregator.summaries() {
        println!(
            "{:<14} {:>8} {:>16.2} {:>14.2} {:>12.2}",
            summary.policy,
            summary.jobs,
            summary.total_exec_time,
            summary.avg_exec_time(),
            summary.makespan,
        );
    }

    let comparison = aggregator.compare();
    if let Some(best) = comparison.best_overall() {
        println!("\nBest Overall Policy: {}\n", best);
    }

    println!("Per-Tenant Analysis:");
    for verdict in &comparison.tenants {
        println!("Tenant {}:", verdict.tenant);
        for summary in aggregator.summaries() {
            if let Some(stats) = summary.tenants.get(&verdict.tenant) {
                println!(
                    "  {:<12} exec {:>8.2}  wait {:>6.2}  queue {:>6.2}  total {:>9.2}",
                    summary.policy,
                    stats.avg_exec_time(),
                    stats.avg_wait_time(),
                    stats.avg_queue_delay(),
                    stats.total_exec_time,
                );
            }
        }
        println!("  Best policy: {}", verdict.best_policy);
    }

    if let Some(output_path) = &args.output {
        println!("\nWriting results to {}...", output_path);
        let reports: Vec<RunReport> = outcomes.iter().map(RunReport::from).collect();
        let json = serde_json::to_string_pretty(&serde_json::json!({
            "scenario": config,
            "runs": reports,
            "comparison": comparison,
        }))
        .context("failed to serialize results")?;
        fs::write(output_path, json)
            .with_context(|| format!("failed to write {}", output_path))?;
        println!("  Results saved");
    }

    Ok(())
}
