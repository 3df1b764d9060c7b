use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use arrow::util::pretty::pretty_format_batches;
use clap::{Args, Parser, Subcommand};
use log::info;

use exprset::{combine, io, Compression, ExpressionSet, Selection, WriteOptions};

/// Inspect and convert gene expression sets.
#[derive(Parser, Debug)]
#[command(name = "exprset", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a summary of an expression set.
    Info {
        input: PathBuf,
        /// Number of expression rows to show.
        #[arg(long, default_value_t = 5)]
        head: usize,
    },
    /// Convert between formats (chosen by file extension).
    Convert {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        write: WriteArgs,
    },
    /// Keep only some samples and/or features.
    Subset {
        input: PathBuf,
        output: PathBuf,
        /// Comma-separated sample names (or 1-based positions with --by-position).
        #[arg(long, value_delimiter = ',')]
        samples: Option<Vec<String>>,
        /// Comma-separated feature names (or 1-based positions with --by-position).
        #[arg(long, value_delimiter = ',')]
        features: Option<Vec<String>>,
        /// Interpret --samples / --features as positions.
        #[arg(long)]
        by_position: bool,
        #[command(flatten)]
        write: WriteArgs,
    },
    /// Concatenate sets that share their features, sample-wise.
    Combine {
        output: PathBuf,
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        #[command(flatten)]
        write: WriteArgs,
    },
}

#[derive(Args, Debug)]
struct WriteArgs {
    /// Indent JSON output.
    #[arg(long)]
    pretty: bool,
    /// Parquet compression: none, snappy or zstd.
    #[arg(long, default_value = "snappy")]
    compression: Compression,
}

impl From<&WriteArgs> for WriteOptions {
    fn from(args: &WriteArgs) -> Self {
        WriteOptions {
            pretty_json: args.pretty,
            compression: args.compression,
        }
    }
}

fn load(path: &PathBuf) -> Result<ExpressionSet> {
    io::load(path).with_context(|| format!("loading {}", path.display()))
}

fn save(set: &ExpressionSet, path: &PathBuf, write: &WriteArgs) -> Result<()> {
    io::save_with(set, path, &write.into()).with_context(|| format!("writing {}", path.display()))?;
    info!(
        "wrote {} ({} features x {} samples)",
        path.display(),
        set.num_features(),
        set.num_samples()
    );
    Ok(())
}

fn selection(values: Option<Vec<String>>, by_position: bool) -> Result<Option<Selection>> {
    let Some(values) = values else {
        return Ok(None);
    };
    if !by_position {
        return Ok(Some(Selection::Names(values)));
    }
    let positions = values
        .iter()
        .map(|v| {
            v.trim()
                .parse::<usize>()
                .with_context(|| format!("'{v}' is not a position"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(Selection::Positions(positions)))
}

fn print_info(set: &ExpressionSet, head: usize) -> Result<()> {
    println!("{set}");
    if let Some(exp) = set.experiment_data() {
        println!("{exp}");
    }
    if head > 0 && set.num_features() > 0 {
        let table = set
            .expression_values_table()
            .context("building expression table")?;
        let shown = table.slice(0, head.min(table.num_rows()));
        println!("{}", pretty_format_batches(&[shown]).context("formatting table")?);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Info { input, head } => print_info(&load(&input)?, head)?,
        Command::Convert { input, output, write } => save(&load(&input)?, &output, &write)?,
        Command::Subset {
            input,
            output,
            samples,
            features,
            by_position,
            write,
        } => {
            if samples.is_none() && features.is_none() {
                bail!("nothing to select: pass --samples and/or --features");
            }
            let set = load(&input)?;
            let subset = set
                .subset(selection(samples, by_position)?, selection(features, by_position)?)
                .context("subsetting")?;
            save(&subset, &output, &write)?;
        }
        Command::Combine { output, inputs, write } => {
            let sets = inputs.iter().map(load).collect::<Result<Vec<_>>>()?;
            let combined = combine(&sets).context("combining")?;
            save(&combined, &output, &write)?;
        }
    }
    Ok(())
}
