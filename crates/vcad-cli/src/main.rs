//! vcad CLI - evaluate documents from the command line
//!
//! Loads a .vcad file, evaluates it with the reference mesh kernel and prints
//! parts, instances and clashes.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vcad_engine::{Clash, ClashBody, Engine, EngineConfig, EvaluateOptions, EvaluatedScene};
use vcad_ir::Document;
use vcad_kernel_api::TriangleMesh;
use vcad_kernel_mesh::{MeshKernel, MeshSolid};

#[derive(Parser)]
#[command(name = "vcad")]
#[command(about = "Evaluate parametric vcad documents", long_about = None)]
struct Cli {
    /// Log evaluation details (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display information about a .vcad file
    Info {
        /// Path to the .vcad file
        file: PathBuf,
    },
    /// Evaluate a .vcad file and report the resulting scene
    Eval {
        /// Path to the .vcad file
        file: PathBuf,
        /// Engine configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Skip pairwise clash detection
        #[arg(long)]
        skip_clash: bool,
        /// Override a joint state, e.g. `--joint hinge=45`
        #[arg(long = "joint", value_name = "ID=STATE", value_parser = parse_joint_state)]
        joints: Vec<(String, f64)>,
        /// Print the evaluated scene as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { file } => show_info(&file)?,
        Commands::Eval {
            file,
            config,
            skip_clash,
            joints,
            json,
        } => {
            let mut doc = load_document(&file)?;
            apply_joint_states(&mut doc, &joints)?;

            let config = match config {
                Some(path) => {
                    debug!(path = %path.display(), "loading engine config");
                    EngineConfig::from_path(&path)
                        .with_context(|| format!("loading config {}", path.display()))?
                }
                None => EngineConfig::default(),
            };
            let mut options = EvaluateOptions::from(&config);
            options.skip_clash_detection |= skip_clash;

            info!(
                file = %file.display(),
                nodes = doc.nodes.len(),
                roots = doc.roots.len(),
                skip_clash = options.skip_clash_detection,
                "evaluating document"
            );
            let mut engine = Engine::with_config(MeshKernel::new(), config);
            let scene = engine
                .evaluate_with(&doc, &options)
                .with_context(|| format!("evaluating {}", file.display()))?;
            if !scene.clashes.is_empty() {
                warn!(clashes = scene.clashes.len(), "interfering bodies found");
            }
            info!(
                parts = scene.parts.len(),
                kernel_evaluations = scene.stats.total_kernel_evaluations(),
                "evaluation finished"
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&scene)?);
            } else {
                print_scene(&doc, &scene);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn parse_joint_state(s: &str) -> Result<(String, f64), String> {
    let (id, state) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=STATE, got '{s}'"))?;
    let state = state
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid joint state '{state}': {e}"))?;
    Ok((id.trim().to_string(), state))
}

fn apply_joint_states(doc: &mut Document, states: &[(String, f64)]) -> Result<()> {
    for (id, state) in states {
        let joint = doc
            .joints
            .iter_mut()
            .flatten()
            .find(|j| &j.id == id)
            .with_context(|| format!("no joint named '{id}'"))?;
        debug!(joint = %id, from = joint.state, to = *state, "overriding joint state");
        joint.state = *state;
    }
    Ok(())
}

fn load_document(path: &Path) -> Result<Document> {
    let json =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Document::from_json(&json).with_context(|| format!("parsing {}", path.display()))
}

fn show_info(file: &Path) -> Result<()> {
    let doc = load_document(file)?;

    println!("vcad document: {}", file.display());
    println!("  Version: {}", doc.version);
    println!("  Nodes: {}", doc.nodes.len());
    println!("  Materials: {}", doc.materials.len());
    println!("  Scene entries: {}", doc.roots.len());

    if !doc.roots.is_empty() {
        println!("\nScene:");
        for (i, entry) in doc.roots.iter().enumerate() {
            let name = doc
                .nodes
                .get(&entry.root)
                .and_then(|n| n.name.as_deref())
                .unwrap_or("unnamed");
            let hidden = if entry.visible { "" } else { ", hidden" };
            println!("  {}: {} (material: {}{})", i + 1, name, entry.material, hidden);
        }
    }

    if doc.has_assembly() {
        let defs = doc.part_defs.as_ref().map_or(0, |d| d.len());
        let instances = doc.instances.as_ref().map_or(0, Vec::len);
        let joints = doc.joints.as_ref().map_or(0, Vec::len);
        println!("\nAssembly:");
        println!("  Part definitions: {defs}");
        println!("  Instances: {instances}");
        println!("  Joints: {joints}");
        if let Some(ground) = &doc.ground_instance_id {
            println!("  Ground: {ground}");
        }
    }

    Ok(())
}

fn mesh_stats(mesh: &TriangleMesh) -> String {
    format!("{} tris, {} verts", mesh.num_triangles(), mesh.num_vertices())
}

/// All clash volumes in one mesh, for a single interference summary.
fn interference_mesh(clashes: &[Clash]) -> TriangleMesh {
    let mut total = TriangleMesh::default();
    for clash in clashes {
        total.merge(&clash.mesh);
    }
    total
}

fn describe_body(body: &ClashBody, doc: &Document, scene: &EvaluatedScene<MeshSolid>) -> String {
    match body {
        ClashBody::Part(i) => {
            let name = scene
                .parts
                .get(*i)
                .and_then(|p| doc.nodes.get(&p.root))
                .and_then(|n| n.name.as_deref())
                .unwrap_or("unnamed");
            format!("part {} ({name})", i + 1)
        }
        ClashBody::Instance(id) => format!("instance {id}"),
    }
}

fn print_scene(doc: &Document, scene: &EvaluatedScene<MeshSolid>) {
    println!("Parts: {}", scene.parts.len());
    for (i, part) in scene.parts.iter().enumerate() {
        println!(
            "  {}: node {} [{}] {}",
            i + 1,
            part.root,
            part.material,
            mesh_stats(&part.mesh)
        );
    }

    if let Some(instances) = &scene.instances {
        println!("\nInstances: {}", instances.len());
        for inst in instances {
            let t = &inst.transform.translation;
            let r = &inst.transform.rotation;
            println!(
                "  {} ({}) [{}] at ({:.3}, {:.3}, {:.3}) rot ({:.2}, {:.2}, {:.2})",
                inst.name.as_deref().unwrap_or(&inst.instance_id),
                inst.part_def_id,
                inst.material,
                t.x,
                t.y,
                t.z,
                r.x,
                r.y,
                r.z
            );
        }
    }

    println!("\nClashes: {}", scene.clashes.len());
    for clash in &scene.clashes {
        println!(
            "  {} <-> {}: {}",
            describe_body(&clash.a, doc, scene),
            describe_body(&clash.b, doc, scene),
            mesh_stats(&clash.mesh)
        );
    }
    if !scene.clashes.is_empty() {
        println!("  Total interference: {}", mesh_stats(&interference_mesh(&scene.clashes)));
    }

    let stats = &scene.stats;
    println!(
        "\nKernel evaluations: {} (memo hits: {}, cache hits: {})",
        stats.total_kernel_evaluations(),
        stats.memo_hits,
        stats.cache_hits
    );
}
