use anyhow::{bail, Error};
use clap::Parser;
use ftail::Ftail;
use log::info;

use mitophylo::alphabets::sequence_type;
use mitophylo::distances::compute_distance_matrix;
use mitophylo::io::{
    read_alignment, read_distances_from_file, write_distances_to_file, write_newick_to_file,
    write_phyloxml_to_file,
};
use mitophylo::render::{write_rendering_to_file, AsciiRenderer, SvgRenderer, TreeRenderer};

mod cli;
use crate::cli::{Cli, ConfigBuilder, InputFormat};

type Result<T> = std::result::Result<T, Error>;

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            bail!("Unable to parse command line arguments: \n {}", error)
        }
    };
    let cfg_build: ConfigBuilder = cli.into();
    let cfg = cfg_build.setup()?;
    if let Err(error) = Ftail::new().console(cfg.log_level).init() {
        bail!("Unable to set up logging: {:?}", error);
    }

    info!("mitophylo run started.");
    info!("{}", cfg);

    cfg.prepare_outputs()?;

    let distances = match cfg.input_format {
        InputFormat::Alignment(format) => {
            let msa = read_alignment(&cfg.input, Some(format))?;
            info!(
                "Computing distances between {} sequences",
                sequence_type(msa.records())
            );
            compute_distance_matrix(&msa, cfg.distance.model().as_ref())?
        }
        InputFormat::Phylip => read_distances_from_file(&cfg.input)?,
    };

    info!("Building {} tree.", cfg.method);
    let mut tree = cfg.method.builder().build_tree(&distances)?;
    tree.set_rooted(cfg.rooted);
    if cfg.ladderize {
        tree.ladderize(false);
    }

    info!("Putting resulting tree in {}", cfg.out_tree.display());
    write_phyloxml_to_file(&[tree.clone()], &cfg.out_tree)?;
    if let Some(newick) = &cfg.newick {
        write_newick_to_file(&[tree.clone()], newick)?;
    }
    if let Some(path) = &cfg.out_distances {
        write_distances_to_file(&distances, path)?;
    }
    write_rendering_to_file(&SvgRenderer::default(), &tree, &cfg.figure)?;

    println!("{}", AsciiRenderer::new(cfg.ascii_width).render(&tree));
    info!("mitophylo run finished.");
    Ok(())
}
