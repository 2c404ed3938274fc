use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, error::ErrorKind};

use crate::config::GroupingConfig;
use crate::constants::{cli::PROGRAM_NAME, defaults};
use crate::pipeline::{InputPaths, run};
use crate::writer::OutputPaths;

#[derive(Debug, Parser)]
#[command(
    name = PROGRAM_NAME,
    disable_help_subcommand = true,
    about = "Choose groups of examples to merge and carve out a held-out subset",
    long_about = "Group chunks into fixed-size groups (preferentially keeping chunks of one utterance, and if possible one speaker, together), then choose a held-out subset of groups plus a statistically matched training subset of the same size. Training groups that share any pre-augmentation utterance with a held-out group are dropped.",
    after_help = "Input keys must look like <utterance_id>-<first_frame>-<left_context>-<num_frames>-<right_context>-v1 and should be sorted so that each utterance's chunks are adjacent."
)]
struct ChooseEgsCli {
    #[arg(
        long = "chunks-per-spk",
        default_value_t = defaults::CHUNKS_PER_SPK,
        value_parser = parse_positive_usize,
        help = "Chunks per group; chunks are only preferentially from the same speaker"
    )]
    chunks_per_spk: usize,
    #[arg(
        long = "num-repeats",
        default_value_t = defaults::NUM_REPEATS,
        value_parser = parse_positive_usize,
        help = "Number of differently-offset groupings of the data; must divide --chunks-per-spk (1 or 2 are typical)"
    )]
    num_repeats: usize,
    #[arg(
        long = "heldout-data-selection-proportion",
        default_value_t = defaults::HELDOUT_DATA_SELECTION_PROPORTION,
        value_parser = parse_proportion,
        help = "Fraction of least-contaminating groups the held-out subset is drawn from; 1.0 draws from all groups"
    )]
    heldout_data_selection_proportion: f64,
    #[arg(
        long = "num-heldout-groups",
        default_value_t = defaults::NUM_HELDOUT_GROUPS,
        value_parser = parse_positive_usize,
        help = "Groups in the held-out subset (and in the matched training subset)"
    )]
    num_heldout_groups: usize,
    #[arg(
        long = "utt2uniq",
        value_name = "PATH",
        help = "Optional utterance-id to pre-augmentation-id table; identity map when omitted"
    )]
    utt2uniq: Option<PathBuf>,
    #[arg(
        long = "scp-in",
        value_name = "PATH",
        help = "Input table of '<key> <location>' lines"
    )]
    scp_in: PathBuf,
    #[arg(
        long = "training-data-out",
        value_name = "PATH",
        help = "Output groups for training, one group of locations per line"
    )]
    training_data_out: PathBuf,
    #[arg(
        long = "heldout-subset-out",
        value_name = "PATH",
        help = "Output groups of the held-out subset"
    )]
    heldout_subset_out: PathBuf,
    #[arg(
        long = "training-subset-out",
        value_name = "PATH",
        help = "Output groups of the training subset matched to the held-out subset"
    )]
    training_subset_out: PathBuf,
    #[arg(
        long,
        default_value_t = defaults::SEED,
        help = "Deterministic seed used for held-out and matched subset selection"
    )]
    seed: u64,
    #[arg(
        long = "strict-order",
        help = "Fail when an utterance's chunks are not adjacent in --scp-in instead of warning"
    )]
    strict_order: bool,
    #[arg(
        long = "summary-out",
        value_name = "PATH",
        help = "Optional JSON file receiving selection statistics"
    )]
    summary_out: Option<PathBuf>,
}

impl ChooseEgsCli {
    fn config(&self) -> GroupingConfig {
        GroupingConfig {
            chunks_per_spk: self.chunks_per_spk,
            num_repeats: self.num_repeats,
            heldout_data_selection_proportion: self.heldout_data_selection_proportion,
            num_heldout_groups: self.num_heldout_groups,
            seed: self.seed,
            strict_order: self.strict_order,
        }
    }
}

/// Parse `args_iter` (without the program name) and run the full pipeline.
pub fn run_choose_egs_to_merge<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) =
        parse_cli::<ChooseEgsCli, _>(std::iter::once(PROGRAM_NAME.to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    let config = cli.config();
    let inputs = InputPaths {
        scp_in: cli.scp_in,
        utt2uniq: cli.utt2uniq,
    };
    let outputs = OutputPaths {
        training_data_out: cli.training_data_out,
        heldout_subset_out: cli.heldout_subset_out,
        training_subset_out: cli.training_subset_out,
        summary_out: cli.summary_out,
    };

    let summary = run(&config, &inputs, &outputs)?;
    println!(
        "{PROGRAM_NAME}: groups={} training={} heldout={} matched={} excluded={} pool={}",
        summary.total_groups,
        summary.training,
        summary.heldout,
        summary.matched,
        summary.excluded_only,
        summary.candidate_pool
    );
    Ok(())
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{}' as a positive integer", raw))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_proportion(raw: &str) -> Result<f64, String> {
    let parsed = raw
        .parse::<f64>()
        .map_err(|_| format!("Could not parse '{}' as a number", raw))?;
    if parsed.is_nan() || parsed <= 0.0 || parsed > 1.0 {
        return Err(format!("proportion must be in (0, 1], got {parsed}"));
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> Vec<&'static str> {
        vec![
            PROGRAM_NAME,
            "--scp-in",
            "egs.scp",
            "--training-data-out",
            "train.groups",
            "--heldout-subset-out",
            "heldout.groups",
            "--training-subset-out",
            "subset.groups",
        ]
    }

    #[test]
    fn defaults_match_grouping_config() {
        let cli = ChooseEgsCli::try_parse_from(required()).unwrap();
        assert_eq!(cli.config(), GroupingConfig::default());
        assert!(cli.utt2uniq.is_none());
        assert!(cli.summary_out.is_none());
    }

    #[test]
    fn options_override_defaults() {
        let mut args = required();
        args.extend([
            "--chunks-per-spk",
            "8",
            "--num-repeats",
            "2",
            "--heldout-data-selection-proportion",
            "1.0",
            "--num-heldout-groups",
            "10",
            "--seed",
            "7",
            "--utt2uniq",
            "utt2uniq",
            "--strict-order",
        ]);
        let cli = ChooseEgsCli::try_parse_from(args).unwrap();
        let config = cli.config();
        assert_eq!(config.chunks_per_spk, 8);
        assert_eq!(config.num_repeats, 2);
        assert_eq!(config.num_heldout_groups, 10);
        assert_eq!(config.seed, 7);
        assert!(config.strict_order);
        assert!((config.heldout_data_selection_proportion - 1.0).abs() < 1e-12);
        assert_eq!(cli.utt2uniq, Some(PathBuf::from("utt2uniq")));
    }

    #[test]
    fn missing_required_paths_is_an_error() {
        assert!(ChooseEgsCli::try_parse_from([PROGRAM_NAME, "--scp-in", "egs.scp"]).is_err());
    }

    #[test]
    fn value_parsers_reject_out_of_range() {
        assert!(parse_positive_usize("0").is_err());
        assert!(parse_positive_usize("-1").is_err());
        assert_eq!(parse_positive_usize("3"), Ok(3));
        assert!(parse_proportion("0").is_err());
        assert!(parse_proportion("1.5").is_err());
        assert!(parse_proportion("abc").is_err());
        assert_eq!(parse_proportion("0.25"), Ok(0.25));
    }

    #[test]
    fn help_is_not_an_error() {
        let parsed =
            parse_cli::<ChooseEgsCli, _>([PROGRAM_NAME.to_string(), "--help".to_string()]).unwrap();
        assert!(parsed.is_none());
    }
}
