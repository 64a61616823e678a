//! canopy CLI - build, query and verify Merkle membership proofs
//!
//! `build` turns a CSV-like values file into a root plus a persisted
//! `standard-v1` document; `proof` and `proof-index` answer membership
//! queries against that document; `verify` reruns the externally
//! reproducible check. All failures are a single stderr line and a
//! non-zero exit.

use anyhow::Context;
use canopy::{parse_signature, Hash, LeafValue, MerkleTree, TreeDump};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "A deterministic Merkle tree engine for membership proofs")]
#[command(version)]
struct Cli {
    /// Path to the persisted tree document
    #[arg(short, long, default_value = "tree.json")]
    tree: PathBuf,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a tree from a values file and write the persisted document
    Build {
        /// CSV-like values file: one row per leaf, columns in signature order
        values: PathBuf,
        /// Type signature, e.g. "address" or "address,uint256"
        #[arg(long, value_delimiter = ',', required = true)]
        types: Vec<String>,
        /// Skip the first row of the values file
        #[arg(long)]
        header: bool,
    },

    /// Look up a value and print its proof
    Proof {
        /// The value tuple, one argument per field
        #[arg(num_args = 1.., required = true)]
        value: Vec<String>,
    },

    /// Print the proof for a leaf by its original input index
    ProofIndex {
        /// 0-based index into the original input order
        index: usize,
    },

    /// Verify a proof against a root
    Verify {
        /// Type signature, e.g. "address" or "address,uint256"
        #[arg(long, value_delimiter = ',', required = true)]
        types: Vec<String>,
        /// Expected root hash
        #[arg(long)]
        root: String,
        /// Comma-separated sibling hashes, bottom to top (omit for a
        /// single-leaf tree)
        #[arg(long, value_delimiter = ',')]
        proof: Vec<String>,
        /// The claimed value tuple, one argument per field
        #[arg(num_args = 1.., required = true)]
        value: Vec<String>,
    },

    /// Print the root, leaf count and rendered tree of a document
    Inspect,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            values,
            types,
            header,
        } => {
            let signature = parse_signature(&types)?;
            let rows = read_values(&values, header)?;
            let tree = MerkleTree::of(rows, signature)?;
            write_dump(&cli.tree, &tree.dump())?;
            output(
                &cli.format,
                &serde_json::json!({
                    "root": tree.root().to_hex(),
                    "leaves": tree.len(),
                    "tree": cli.tree.display().to_string()
                }),
            );
        }

        Commands::Proof { value } => {
            let tree = load_tree(&cli.tree)?;
            let value = to_tuple(&value);
            let index = tree.index_of(&value)?;
            let proof = tree.proof(index)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "value": value,
                    "index": index,
                    "root": tree.root().to_hex(),
                    "proof": proof.iter().map(|h| h.to_hex()).collect::<Vec<_>>()
                }),
            );
        }

        Commands::ProofIndex { index } => {
            let tree = load_tree(&cli.tree)?;
            let proof = tree.proof(index)?;
            let value = tree
                .entries()
                .find(|(i, _)| *i == index)
                .map(|(_, v)| v.clone())
                .unwrap_or_default();
            output(
                &cli.format,
                &serde_json::json!({
                    "value": value,
                    "index": index,
                    "root": tree.root().to_hex(),
                    "proof": proof.iter().map(|h| h.to_hex()).collect::<Vec<_>>()
                }),
            );
        }

        Commands::Verify {
            types,
            root,
            proof,
            value,
        } => {
            let signature = parse_signature(&types)?;
            let root = Hash::from_hex(&root)?;
            let proof = proof
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| Hash::from_hex(s))
                .collect::<canopy::Result<Vec<_>>>()?;
            let valid = canopy::verify_proof(root, &signature, &to_tuple(&value), &proof)?;
            output(&cli.format, &serde_json::json!({ "valid": valid }));
            if !valid {
                std::process::exit(1);
            }
        }

        Commands::Inspect => {
            let tree = load_tree(&cli.tree)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "root": tree.root().to_hex(),
                    "leaves": tree.len(),
                    "types": tree.signature().iter().map(|t| t.to_string()).collect::<Vec<_>>(),
                    "render": tree.render()
                }),
            );
        }
    }

    Ok(())
}

/// Read a CSV-like values file: one row per leaf, fields split on
/// commas and trimmed, column order = signature order
fn read_values(path: &Path, header: bool) -> anyhow::Result<Vec<LeafValue>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read values file {}", path.display()))?;
    let rows: Vec<LeafValue> = text
        .lines()
        .skip(if header { 1 } else { 0 })
        .filter(|line| !line.trim().is_empty())
        .map(to_row)
        .collect();
    Ok(rows)
}

fn to_row(line: &str) -> LeafValue {
    line.split(',')
        .map(|field| serde_json::Value::String(field.trim().to_string()))
        .collect()
}

fn to_tuple(fields: &[String]) -> LeafValue {
    fields
        .iter()
        .map(|f| serde_json::Value::String(f.clone()))
        .collect()
}

fn load_tree(path: &Path) -> anyhow::Result<MerkleTree> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read tree document {}", path.display()))?;
    let dump: TreeDump = serde_json::from_str(&text)
        .with_context(|| format!("malformed tree document {}", path.display()))?;
    Ok(MerkleTree::load(dump)?)
}

/// Write the dump through a temp file so a failed run never leaves a
/// partial document behind
fn write_dump(path: &Path, dump: &TreeDump) -> anyhow::Result<()> {
    let text = serde_json::to_string(dump)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, text)
        .with_context(|| format!("cannot write tree document {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("cannot move tree document into place at {}", path.display()))?;
    Ok(())
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(value).unwrap());
        }
        OutputFormat::Text => {
            println!("{}", serde_json::to_string_pretty(value).unwrap());
        }
    }
}
