use anyhow::{anyhow, bail, Context};
use piconet_controller::{Controller, MovePlan, Position};
use piconet_core::logging;
use piconet_sim::{NodeId, Simulation};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

mod config;

use config::{CommandSpec, ServiceConfig};

const NODE_PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct NodeVersionHandshake {
    version: &'static str,
    protocol_version: u32,
}

/// Per-node line of the final report
#[derive(Debug, Serialize)]
struct NodeReport {
    identity: String,
    depth: Option<usize>,
    children: usize,
    moves: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--version-json") {
        let handshake = NodeVersionHandshake {
            version: env!("CARGO_PKG_VERSION"),
            protocol_version: NODE_PROTOCOL_VERSION,
        };
        println!("{}", serde_json::to_string(&handshake)?);
        return Ok(());
    }

    if args.iter().any(|arg| arg == "--json-logs") {
        logging::init_json();
    } else {
        logging::init();
    }

    let config_path = parse_config_path(&args)?;
    let config = ServiceConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    tokio::select! {
        result = run(config) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
            Ok(())
        }
    }
}

async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    let mut sim = Simulation::new(config.simulation.seed);
    let root = sim.add_node(&config.base)?;
    for identity in config.members() {
        sim.add_node(&config.member_config(identity.clone()))?;
    }
    tracing::info!(
        root = %config.base.node.identity,
        nodes = sim.node_ids().len(),
        "Simulated piconet powered up"
    );

    sim.connect_app(root)?;
    let steps = settle(&mut sim, &config).await?;
    if !sim.app_connected() {
        bail!("app could not connect to root {}", config.base.node.identity);
    }
    tracing::info!(steps, "Tree formed");

    let mut controller = Controller::new();
    for (i, id) in sim.node_ids().into_iter().enumerate() {
        let identity = sim.node(id)?.identity().clone();
        // Units start on a row, facing +x
        controller.add_unit(identity, Position::new(100.0 * (i as f64 + 1.0), 100.0), 0.0)?;
    }

    for command in &config.simulation.commands {
        execute(&mut sim, &mut controller, command, &config).await?;
    }

    report(&sim)?;
    Ok(())
}

async fn execute(
    sim: &mut Simulation,
    controller: &mut Controller,
    command: &CommandSpec,
    config: &ServiceConfig,
) -> anyhow::Result<()> {
    let unit = controller
        .unit(&command.target)
        .ok_or_else(|| anyhow!("script names unknown unit {}", command.target))?;
    let turn = piconet_controller::heading::normalize_turn(command.heading_deg - unit.heading_deg);
    let plan = MovePlan::from_turn(turn, command.distance_cm);

    let packet = controller.send(&command.target, plan)?;
    sim.send_command(&packet)?;
    settle(sim, config).await?;

    let acks = sim.take_app_acks();
    if acks.is_empty() {
        tracing::warn!(unit = %command.target, "No ack; unit unreachable");
        controller.cancel(&command.target)?;
    }
    for ack in acks {
        match controller.on_ack(&ack) {
            Ok(unit) => tracing::info!(%unit, "Move confirmed"),
            Err(e) => tracing::warn!(error = %e, "Ack not matched"),
        }
    }
    Ok(())
}

async fn settle(sim: &mut Simulation, config: &ServiceConfig) -> anyhow::Result<usize> {
    let interval = Duration::from_millis(config.simulation.step_interval_ms);
    for step in 1..=config.simulation.max_steps {
        if sim.step() == 0 && !sim.bus().has_traffic() {
            return Ok(step);
        }
        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }
    Err(anyhow!(
        "simulation still busy after {} steps",
        config.simulation.max_steps
    ))
}

fn report(sim: &Simulation) -> anyhow::Result<()> {
    let mut rows = Vec::new();
    for id in sim.node_ids() {
        rows.push(node_report(sim, id)?);
    }
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn node_report(sim: &Simulation, id: NodeId) -> anyhow::Result<NodeReport> {
    let node = sim.node(id)?;
    Ok(NodeReport {
        identity: node.identity().to_string(),
        depth: sim.depth_of(id),
        children: node.links().child_count(),
        moves: node.motion().moves(),
    })
}

fn parse_config_path(args: &[String]) -> anyhow::Result<PathBuf> {
    let mut args_iter = args.iter();
    while let Some(arg) = args_iter.next() {
        if arg == "--config" {
            if let Some(path) = args_iter.next() {
                return Ok(PathBuf::from(path));
            }
            bail!("--config was provided without a path");
        }
    }

    bail!("missing required --config <path> argument")
}
