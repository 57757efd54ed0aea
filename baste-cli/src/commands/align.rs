use super::command::Command;
use anyhow::{ensure, Context, Result};
use baste::{
    align::{AlignOptions, AlignOptionsBuilder, LocalAligner, MatchParams, Scoring},
    util::dna::encode,
};
use clap::Parser;
use fgoxide::io::Io;
use flate2::bufread::MultiGzDecoder;
use flume::unbounded;
use log::{info, warn};
use proglog::{CountFormatterKind, ProgLogBuilder};
use seq_io::fasta::{OwnedRecord, Reader as FastaReader};
use std::{
    fs::File,
    io::{self, BufReader, Read, Write},
    path::{Path, PathBuf},
    sync::Arc,
    thread::JoinHandle,
};

/// 128 KB input buffer, same as pigz.
const GZ_BUFSIZE: usize = 64 * (1 << 10) * 2;

/// Columns written after the probe name.
const HEADER: &str = "probe\tscore\tprobe_start\ttarg_start\tprobe_end\ttarg_end\t\
                      aligned\texact\tprobe_ins\ttarg_ins\tidentity\t\
                      anchor5_probe\tanchor5_targ\tanchor3_probe\tanchor3_targ";

/// Aligns each probe sequence against a single target sequence.
///
/// Every probe record in the input FASTA is aligned to the first record of
/// the target FASTA with a Smith-Waterman local alignment under an affine gap
/// model.  The extension penalty may be delayed until a gap reaches
/// `--delay-gap-extend` bases, and doubled once it reaches
/// `--prog-penalise-gap-extend` bases.
///
/// With `--banded`, the search is restricted to a corridor around the
/// proportional diagonal, bounding memory for long sequence pairs at the cost
/// of possibly missing alignments far from the diagonal.  The corridor is
/// shaped by `--max-start-nonoverlap` and `--max-path-len-diff`.
///
/// Probes are fanned out across worker threads, each owning an independent
/// aligner.  The output is a TSV of per-probe alignment statistics, in input
/// order.  Anchor columns report the outermost ungapped runs of at least
/// `--min-anchor-len` aligned bases, or `.` when no run qualifies.
#[derive(Parser, Debug, Clone)]
#[clap(version = baste::util::version::built_info::VERSION.as_str(), term_width = 0)]
pub struct Align {
    /// The path to the input FASTA with probe sequences.
    #[clap(long, short = 'f', display_order = 1)]
    probes: PathBuf,

    /// The path to the target FASTA sequence.
    #[clap(long, short = 'r', display_order = 2)]
    target: PathBuf,

    /// Write the TSV report here instead of standard output.
    #[clap(long, short = 'o', display_order = 3)]
    output: Option<PathBuf>,

    /// The number of threads to use; 0 means one per CPU.
    #[clap(long, short = 't', default_value = "0", display_order = 4)]
    threads: usize,

    /// Score for a sequence match (must be positive)
    #[clap(long, short = 'A', default_value = "1", display_order = 5)]
    match_score: i32,

    /// Score for a sequence mismatch (must not be positive)
    #[clap(
        long,
        short = 'B',
        default_value = "-4",
        allow_hyphen_values = true,
        display_order = 6
    )]
    mismatch_score: i32,

    /// Score for a gap open (must not be positive)
    #[clap(
        long,
        short = 'O',
        default_value = "-6",
        allow_hyphen_values = true,
        display_order = 7
    )]
    gap_open: i32,

    /// Score for a gap extend (must not be positive)
    #[clap(
        long,
        short = 'E',
        default_value = "-2",
        allow_hyphen_values = true,
        display_order = 8
    )]
    gap_extend: i32,

    /// Gap length below which the extension penalty is waived.
    #[clap(long, default_value = "1", display_order = 9)]
    delay_gap_extend: u8,

    /// Gap length at which the extension penalty doubles; 0 disables.
    #[clap(long, default_value = "0", display_order = 10)]
    prog_penalise_gap_extend: u8,

    /// Restrict the alignment to a corridor around the diagonal.
    #[clap(long, short = 'b', default_value = "false", display_order = 11)]
    banded: bool,

    /// Minimum half-width of the banded corridor, in target positions.
    #[clap(long, default_value = "50", display_order = 12)]
    max_start_nonoverlap: u32,

    /// Tolerated probe/target path length divergence for the banded corridor.
    #[clap(long, default_value = "1.0", display_order = 13)]
    max_path_len_diff: f64,

    /// Minimum ungapped run length reported as an anchor.
    #[clap(long, default_value = "8", display_order = 14)]
    min_anchor_len: u32,

    /// Write the full score matrix of the first probe as CSV (unbanded).
    #[clap(long, display_order = 15)]
    dump_scores: Option<PathBuf>,
}

impl Align {
    /// Executes the align command
    pub fn execute(&self) -> Result<()> {
        info!("Reading target FASTA from {}", self.target.display());
        let mut targets = read_fasta(&self.target)?;
        ensure!(
            !targets.is_empty(),
            "no sequences in {}",
            self.target.display()
        );
        if targets.len() > 1 {
            warn!(
                "{} contains {} sequences; aligning against the first only",
                self.target.display(),
                targets.len()
            );
        }
        let target = targets.remove(0);
        let target_name = header_to_name(&target.head);
        let target_codes: Arc<Vec<u8>> = Arc::new(encode(&target.seq));
        info!(
            "Aligning against {} ({} bases)",
            target_name,
            target_codes.len()
        );

        let scoring = Scoring::from_scores(
            self.match_score,
            self.mismatch_score,
            self.gap_open,
            self.gap_extend,
            self.delay_gap_extend,
            self.prog_penalise_gap_extend,
        )?;
        LocalAligner::new(scoring)
            .set_targ(&target_codes)
            .with_context(|| format!("invalid target sequence {target_name}"))?;
        let opts = AlignOptionsBuilder::default()
            .banded(self.banded)
            .max_start_nonoverlap(self.max_start_nonoverlap)
            .max_path_len_diff(self.max_path_len_diff)
            .build()?;

        info!("Reading probe FASTA from {}", self.probes.display());
        let probes = read_fasta(&self.probes)?;
        ensure!(
            !probes.is_empty(),
            "no sequences in {}",
            self.probes.display()
        );

        if let Some(dump_path) = &self.dump_scores {
            self.write_dump(dump_path, scoring, &target_codes, &probes[0])?;
        }

        let progress = ProgLogBuilder::new()
            .name("baste-progress")
            .noun("probes")
            .verb("Aligned")
            .unit(100)
            .count_formatter(CountFormatterKind::Comma)
            .build();

        let threads = if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        };
        let (record_tx, record_rx) = unbounded::<(usize, OwnedRecord)>();
        let (result_tx, result_rx) = unbounded::<(usize, String)>();

        // One aligner per worker; instances are not shareable across threads.
        let handles: Vec<JoinHandle<Result<()>>> = (0..threads)
            .map(|_| {
                let record_rx = record_rx.clone();
                let result_tx = result_tx.clone();
                let target_codes = Arc::clone(&target_codes);
                let min_anchor_len = self.min_anchor_len;
                std::thread::spawn(move || {
                    let mut aligner = LocalAligner::new(scoring);
                    aligner.set_targ(&target_codes)?;
                    while let Ok((index, record)) = record_rx.recv() {
                        let name = header_to_name(&record.head);
                        let line =
                            match align_record(&mut aligner, &record, &opts, min_anchor_len) {
                                Ok(line) => line,
                                Err(err) => {
                                    warn!("skipping {name}: {err:#}");
                                    empty_row(&name)
                                }
                            };
                        result_tx.send((index, line)).expect("send failed");
                    }
                    Ok(())
                })
            })
            .collect();
        drop(record_rx);
        drop(result_tx);

        let num_probes = probes.len();
        for pair in probes.into_iter().enumerate() {
            record_tx.send(pair).expect("send failed");
        }
        drop(record_tx);

        let mut lines = vec![String::new(); num_probes];
        for (index, line) in result_rx.iter() {
            progress.record();
            lines[index] = line;
        }
        handles
            .into_iter()
            .try_for_each(|handle| match handle.join() {
                Ok(result) => result,
                Err(e) => std::panic::resume_unwind(e),
            })?;

        let mut writer: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(Io::default().new_writer(path)?),
            None => Box::new(io::BufWriter::new(io::stdout())),
        };
        writeln!(writer, "{HEADER}")?;
        for line in lines {
            writeln!(writer, "{line}")?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Aligns the first probe unbanded on a fresh aligner and dumps the full
    /// score matrix.
    fn write_dump(
        &self,
        dump_path: &Path,
        scoring: Scoring<MatchParams>,
        target_codes: &[u8],
        probe: &OwnedRecord,
    ) -> Result<()> {
        let mut aligner = LocalAligner::new(scoring);
        aligner.set_targ(target_codes)?;
        aligner.set_probe(&encode(&probe.seq))?;
        aligner.align(&AlignOptions::default())?;
        aligner.dump_scores(dump_path, 'v', '<', '\\')?;
        info!(
            "Wrote the score matrix of {} to {}",
            header_to_name(&probe.head),
            dump_path.display()
        );
        Ok(())
    }
}

impl Command for Align {
    fn execute(&self) -> Result<()> {
        Align::execute(self)
    }
}

fn align_record(
    aligner: &mut LocalAligner<MatchParams>,
    record: &OwnedRecord,
    opts: &AlignOptions,
    min_anchor_len: u32,
) -> Result<String> {
    let name = header_to_name(&record.head);
    aligner.set_probe(&encode(&record.seq))?;
    aligner.align(opts)?;
    let peak = match aligner.peak() {
        Some(peak) => peak,
        None => return Ok(empty_row(&name)),
    };
    let stats = aligner.stats()?;
    let identity = 100.0 * f64::from(*stats.exact_matches()) / f64::from(*stats.aligned_bases());
    let anchors = match aligner.anchors(min_anchor_len) {
        Some(anchors) => format!(
            "{}\t{}\t{}\t{}",
            anchors.probe_start5(),
            anchors.targ_start5(),
            anchors.probe_end3(),
            anchors.targ_end3()
        ),
        None => ".\t.\t.\t.".to_string(),
    };
    Ok(format!(
        "{name}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{identity:.2}\t{anchors}",
        peak.score,
        stats.probe_start(),
        stats.targ_start(),
        peak.probe_idx,
        peak.targ_idx,
        stats.aligned_bases(),
        stats.exact_matches(),
        stats.probe_inserts(),
        stats.targ_inserts(),
    ))
}

/// The row written for probes with no positive-scoring alignment.
fn empty_row(name: &str) -> String {
    format!("{name}\t0{}", "\t.".repeat(13))
}

fn header_to_name(head: &[u8]) -> String {
    String::from_utf8_lossy(head)
        .split_whitespace()
        .next()
        .unwrap_or("unnamed")
        .to_string()
}

/// The set of file extensions to treat as GZIPPED
const GZIP_EXTENSIONS: [&str; 2] = ["gz", "bgz"];

/// Returns true if the path ends with a recognized GZIP file extension
fn is_gzip_path<P: AsRef<Path>>(p: &P) -> bool {
    if let Some(ext) = p.as_ref().extension() {
        match ext.to_str() {
            Some(x) => GZIP_EXTENSIONS.contains(&x),
            None => false,
        }
    } else {
        false
    }
}

fn read_fasta(path: &Path) -> Result<Vec<OwnedRecord>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let buf = BufReader::with_capacity(GZ_BUFSIZE, file);
    let reader: Box<dyn Read> = if is_gzip_path(&path) {
        Box::new(MultiGzDecoder::new(buf))
    } else {
        Box::new(buf)
    };
    let mut fasta = FastaReader::new(reader);
    let mut records = Vec::new();
    while let Some(record) = fasta.next() {
        let record =
            record.with_context(|| format!("failed to read {}", path.display()))?;
        records.push(record.to_owned_record());
    }
    Ok(records)
}
