//! Offline transformation of a tree document file, for operators debugging
//! the pipeline without a database or object store.

use crate::model::{IdStyle, Location, GISAID_ID_KEY, PUBLIC_ID_PREFIX};
use crate::process::set_country_colorings;
use crate::store::MemoryDatabase;
use arbor_tree::{rename_nodes, TreeDocument};
use clap::Parser;
use color_eyre::eyre::{Report, Result, WrapErr};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

// ----------------------------------------------------------------------------
// Transform Args

/// CLI arguments for the offline tree transformation.
#[derive(Debug, Deserialize, Parser, Serialize)]
#[clap(about = "Transform a tree JSON document offline.")]
pub struct Args {
    /// Input tree JSON document.
    #[clap(short = 'i', long, required = true)]
    pub tree: PathBuf,

    /// JSON object mapping public identifiers to private identifiers.
    #[clap(short = 'm', long)]
    pub identifiers: Option<PathBuf>,

    /// JSON list of country-level locations used for geographic ranking.
    #[clap(short = 'l', long)]
    pub locations: Option<PathBuf>,

    /// Home country, placed first in the color scale.
    ///
    /// Country coloring is skipped when omitted.
    #[clap(short = 'c', long)]
    pub home_country: Option<String>,

    /// Identifier style of the output document.
    #[clap(long, value_enum, default_value_t = IdStyle::default())]
    pub id_style: IdStyle,

    /// Output path. Writes to stdout when omitted.
    #[clap(short = 'o', long)]
    pub output: Option<PathBuf>,
}

// ----------------------------------------------------------------------------
// Transform

/// Runs the rename + coloring pipeline on a local tree document file.
pub async fn tree_file(args: &Args) -> Result<(), Report> {
    info!("Reading tree document: {:?}", args.tree);
    let bytes =
        std::fs::read(&args.tree).wrap_err(format!("Failed to read tree: {:?}", args.tree))?;
    let mut doc = TreeDocument::from_slice(&bytes)
        .wrap_err(format!("Failed to parse tree: {:?}", args.tree))?;

    if args.id_style == IdStyle::Public {
        info!("Public id style requested, passing document through untouched.");
        return write_document(&doc, args.output.as_deref());
    }

    let identifier_map = match &args.identifiers {
        Some(path) => {
            info!("Reading identifier map: {path:?}");
            let bytes = std::fs::read(path)
                .wrap_err(format!("Failed to read identifier map: {path:?}"))?;
            let raw: BTreeMap<String, String> = serde_json::from_slice(&bytes)
                .wrap_err(format!("Failed to parse identifier map: {path:?}"))?;
            raw.into_iter()
                .map(|(public_id, private_id)| {
                    (public_id.replace(PUBLIC_ID_PREFIX, ""), private_id)
                })
                .collect()
        }
        None => BTreeMap::new(),
    };
    rename_nodes(&mut doc.tree, &identifier_map, Some(GISAID_ID_KEY));

    if let Some(home_country) = &args.home_country {
        let locations: Vec<Location> = match &args.locations {
            Some(path) => {
                info!("Reading locations: {path:?}");
                let bytes =
                    std::fs::read(path).wrap_err(format!("Failed to read locations: {path:?}"))?;
                serde_json::from_slice(&bytes)
                    .wrap_err(format!("Failed to parse locations: {path:?}"))?
            }
            None => Vec::new(),
        };
        let db = MemoryDatabase { locations, ..Default::default() };
        set_country_colorings(&db, &mut doc, home_country).await?;
    }

    write_document(&doc, args.output.as_deref())
}

fn write_document(doc: &TreeDocument, output: Option<&std::path::Path>) -> Result<(), Report> {
    let json = serde_json::to_string_pretty(doc)?;
    match output {
        Some(path) => {
            info!("Writing transformed tree: {path:?}");
            std::fs::write(path, json)
                .wrap_err(format!("Failed to write transformed tree: {path:?}"))?;
        }
        None => writeln!(std::io::stdout(), "{json}")?,
    }
    Ok(())
}
