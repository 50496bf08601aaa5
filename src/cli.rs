use std::fmt::{self, Display};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::Parser;
use log::{warn, LevelFilter};

use mitophylo::distances::DistanceMethod;
use mitophylo::io::AlignmentFormat;
use mitophylo::tree::TreeMethod;

use crate::Result;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub(super) struct Cli {
    /// Multiple sequence alignment (clustal or fasta) or distance matrix (phylip)
    #[arg(short, long, value_name = "INPUT_FILE")]
    pub(super) input: PathBuf,

    /// Input format: clustal, fasta or phylip, guessed from the file extension if not given
    #[arg(short, long, value_name = "FORMAT")]
    pub(super) format: Option<String>,

    /// Pairwise distance model: identity or JC69
    #[arg(short, long, value_name = "DISTANCE", default_value = "identity")]
    pub(super) distance: String,

    /// Tree construction method: UPGMA or NJ
    #[arg(short, long, value_name = "METHOD", default_value = "UPGMA")]
    pub(super) method: String,

    /// Output tree in PhyloXML format, defaults to <INPUT>_tree.xml
    #[arg(short, long, value_name = "OUTPUT_TREE_FILE")]
    pub(super) out_tree: Option<PathBuf>,

    /// Additional output tree in newick format
    #[arg(short, long, value_name = "NEWICK_FILE")]
    pub(super) newick: Option<PathBuf>,

    /// Output tree drawing in SVG format, defaults to <INPUT>_cladogram.svg
    #[arg(short = 'g', long, value_name = "FIGURE_FILE")]
    pub(super) figure: Option<PathBuf>,

    /// Output distance matrix in phylip format
    #[arg(long, value_name = "DISTANCES_FILE")]
    pub(super) out_distances: Option<PathBuf>,

    /// Mark the resulting tree as unrooted
    #[arg(long)]
    pub(super) unrooted: bool,

    /// Order the children of every node by clade size before writing
    #[arg(short, long)]
    pub(super) ladderize: bool,

    /// Width of the text drawing printed to the terminal
    #[arg(short = 'w', long, value_name = "COLUMNS", default_value_t = 80)]
    pub(super) ascii_width: usize,

    /// Overwrite existing output files
    #[arg(long)]
    pub(super) force: bool,

    /// Logging level: off, error, warn, info, debug or trace
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub(super) log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum InputFormat {
    Alignment(AlignmentFormat),
    Phylip,
}

impl InputFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "phy" | "phylip" | "dist" => Some(InputFormat::Phylip),
            _ => AlignmentFormat::from_path(path).map(InputFormat::Alignment),
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "phylip" | "phy" => Ok(InputFormat::Phylip),
            _ => Ok(InputFormat::Alignment(s.parse()?)),
        }
    }
}

impl Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Alignment(format) => write!(f, "{}", format),
            InputFormat::Phylip => write!(f, "phylip"),
        }
    }
}

pub(super) struct ConfigBuilder {
    cli: Cli,
}

impl From<Cli> for ConfigBuilder {
    fn from(cli: Cli) -> Self {
        ConfigBuilder { cli }
    }
}

impl ConfigBuilder {
    pub(super) fn setup(self) -> Result<Config> {
        let cli = self.cli;
        let input_format = match &cli.format {
            Some(format) => InputFormat::parse(format)?,
            None => match InputFormat::from_path(&cli.input) {
                Some(format) => format,
                None => bail!(
                    "Cannot determine the format of {}, please specify it with --format",
                    cli.input.display()
                ),
            },
        };
        let log_level = match cli.log_level.parse::<LevelFilter>() {
            Ok(level) => level,
            Err(_) => bail!("Unknown logging level: {}", cli.log_level),
        };
        if cli.ascii_width == 0 {
            bail!("The drawing width must be positive");
        }
        let out_tree = cli
            .out_tree
            .unwrap_or_else(|| sibling_output(&cli.input, "_tree.xml"));
        let figure = cli
            .figure
            .unwrap_or_else(|| sibling_output(&cli.input, "_cladogram.svg"));
        let outputs: Vec<&PathBuf> = [Some(&out_tree), Some(&figure)]
            .into_iter()
            .chain([cli.newick.as_ref(), cli.out_distances.as_ref()])
            .flatten()
            .collect();
        for (i, path) in outputs.iter().enumerate() {
            if outputs[..i].contains(path) || *path == &cli.input {
                bail!("Output file {} is used more than once", path.display());
            }
        }

        Ok(Config {
            input_format,
            distance: cli.distance.parse()?,
            method: cli.method.parse()?,
            out_tree,
            newick: cli.newick,
            figure,
            out_distances: cli.out_distances,
            rooted: !cli.unrooted,
            ladderize: cli.ladderize,
            ascii_width: cli.ascii_width,
            force: cli.force,
            log_level,
            input: cli.input,
        })
    }
}

/// `<dir>/<stem><suffix>` next to the input file.
fn sibling_output(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "output".into(), |stem| stem.to_string_lossy());
    input.with_file_name(format!("{}{}", stem, suffix))
}

pub(super) struct Config {
    pub(super) input: PathBuf,
    pub(super) input_format: InputFormat,
    pub(super) distance: DistanceMethod,
    pub(super) method: TreeMethod,
    pub(super) out_tree: PathBuf,
    pub(super) newick: Option<PathBuf>,
    pub(super) figure: PathBuf,
    pub(super) out_distances: Option<PathBuf>,
    pub(super) rooted: bool,
    pub(super) ladderize: bool,
    pub(super) ascii_width: usize,
    pub(super) force: bool,
    pub(super) log_level: LevelFilter,
}

impl Config {
    /// All files the run will write.
    pub(super) fn outputs(&self) -> Vec<&Path> {
        [Some(&self.out_tree), Some(&self.figure)]
            .into_iter()
            .chain([self.newick.as_ref(), self.out_distances.as_ref()])
            .flatten()
            .map(PathBuf::as_path)
            .collect()
    }

    /// Makes sure no output file exists before anything is written. Existing outputs are removed
    /// when overwriting was requested, otherwise the run stops here.
    pub(super) fn prepare_outputs(&self) -> Result<()> {
        for path in self.outputs() {
            if !path.exists() {
                continue;
            }
            if !self.force {
                bail!(
                    "Output file {} already exists, use --force to overwrite it",
                    path.display()
                );
            }
            warn!("Overwriting existing file {}", path.display());
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(
            f,
            "  input: {} ({})",
            self.input.display(),
            self.input_format
        )?;
        if matches!(self.input_format, InputFormat::Alignment(_)) {
            writeln!(f, "  distance model: {}", self.distance)?;
        }
        writeln!(f, "  tree method: {}", self.method)?;
        writeln!(f, "  rooted: {}, ladderize: {}", self.rooted, self.ladderize)?;
        writeln!(f, "  tree output: {}", self.out_tree.display())?;
        if let Some(newick) = &self.newick {
            writeln!(f, "  newick output: {}", newick.display())?;
        }
        if let Some(distances) = &self.out_distances {
            writeln!(f, "  distance matrix output: {}", distances.display())?;
        }
        write!(f, "  figure output: {}", self.figure.display())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use clap::Parser;
    use tempfile::tempdir;

    use super::{Cli, ConfigBuilder, InputFormat};
    use mitophylo::distances::DistanceMethod;
    use mitophylo::io::AlignmentFormat;
    use mitophylo::tree::TreeMethod;

    fn setup(args: &[&str]) -> crate::Result<super::Config> {
        let cli = Cli::try_parse_from(["mitophylo"].iter().chain(args))?;
        ConfigBuilder::from(cli).setup()
    }

    #[test]
    fn defaults() {
        let cfg = setup(&["-i", "data/sharks.aln"]).unwrap();
        assert_eq!(
            cfg.input_format,
            InputFormat::Alignment(AlignmentFormat::Clustal)
        );
        assert_eq!(cfg.distance, DistanceMethod::Identity);
        assert_eq!(cfg.method, TreeMethod::Upgma);
        assert_eq!(cfg.out_tree, PathBuf::from("data/sharks_tree.xml"));
        assert_eq!(cfg.figure, PathBuf::from("data/sharks_cladogram.svg"));
        assert!(cfg.rooted);
        assert!(!cfg.force);
        assert_eq!(cfg.ascii_width, 80);
        assert_eq!(cfg.log_level, log::LevelFilter::Info);
        assert_eq!(cfg.outputs().len(), 2);
    }

    #[test]
    fn all_options() {
        let cfg = setup(&[
            "-i",
            "input.txt",
            "-f",
            "FASTA",
            "-d",
            "jc69",
            "-m",
            "nj",
            "-o",
            "out.xml",
            "-n",
            "out.newick",
            "-g",
            "out.svg",
            "--out-distances",
            "out.phy",
            "--unrooted",
            "-l",
            "-w",
            "60",
            "--force",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cfg.input_format, InputFormat::Alignment(AlignmentFormat::Fasta));
        assert_eq!(cfg.distance, DistanceMethod::JC69);
        assert_eq!(cfg.method, TreeMethod::NJ);
        assert!(!cfg.rooted);
        assert!(cfg.ladderize);
        assert!(cfg.force);
        assert_eq!(cfg.ascii_width, 60);
        assert_eq!(cfg.log_level, log::LevelFilter::Debug);
        assert_eq!(cfg.outputs().len(), 4);
        assert!(cfg.to_string().contains("newick output: out.newick"));
    }

    #[test]
    fn phylip_input() {
        let cfg = setup(&["-i", "matrix.phy"]).unwrap();
        assert_eq!(cfg.input_format, InputFormat::Phylip);
        assert!(!cfg.to_string().contains("distance model"));
        let cfg = setup(&["-i", "matrix.txt", "--format", "phylip"]).unwrap();
        assert_eq!(cfg.input_format, InputFormat::Phylip);
    }

    #[test]
    fn existing_outputs_checked_before_writing() {
        let temp_dir = tempdir().unwrap();
        let input = temp_dir.path().join("sharks.aln");
        let input = input.to_str().unwrap();
        let figure = temp_dir.path().join("sharks_cladogram.svg");
        fs::write(&figure, "old drawing").unwrap();

        let cfg = setup(&["-i", input]).unwrap();
        let err = cfg.prepare_outputs().unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(figure.exists());
        assert!(!temp_dir.path().join("sharks_tree.xml").exists());

        let cfg = setup(&["-i", input, "--force"]).unwrap();
        cfg.prepare_outputs().unwrap();
        assert!(!figure.exists());
    }

    #[test]
    fn invalid_options() {
        assert!(setup(&["-i", "input.txt"]).is_err());
        assert!(setup(&["-i", "input.aln", "-m", "wpgma"]).is_err());
        assert!(setup(&["-i", "input.aln", "-d", "k80"]).is_err());
        assert!(setup(&["-i", "input.aln", "--log-level", "loud"]).is_err());
        assert!(setup(&["-i", "input.aln", "-w", "0"]).is_err());
        assert!(setup(&["-i", "input.aln", "-o", "same.xml", "-g", "same.xml"]).is_err());
        assert!(setup(&["-i", "input.aln", "-n", "input.aln"]).is_err());
        assert!(setup(&[]).is_err());
    }
}
