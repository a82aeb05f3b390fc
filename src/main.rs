use chrono::Local;
use clap::{Parser, ValueEnum};
use fol::{
    bc_ask::FolBcAsk,
    error::Result,
    fc_ask::FolFcAsk,
    inference::{InferenceProcedure, ResourceLimitConfig},
    kb::KnowledgeBase,
    model_elimination::FolModelElimination,
    otter::FolOtterLikeTheoremProver,
    tfm_resolution::FolTfmResolution,
    tptp_parser,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Procedure {
    /// Forward chaining, atomic conjectures over definite clauses only
    Fc,
    /// Backward chaining, atomic conjectures over definite clauses only
    Bc,
    /// Saturation by binary resolution
    Tfm,
    /// OTTER like given clause loop
    Otter,
    /// Model elimination
    Me,
}

/// Prove the conjectures of a TPTP problem
#[derive(Parser)]
struct Cli {
    /// Path to a tptp problem file
    file: PathBuf,
    #[arg(short, long, value_enum, default_value_t = Procedure::Otter)]
    procedure: Procedure,
    /// Time limit per conjecture in seconds, 0 disables it
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,
    /// Enable paramodulation in the OTTER loop
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    paramodulation: bool,
    /// Print the proof of every answer
    #[arg(long)]
    proofs: bool,
}

impl Cli {
    fn inference_procedure(&self) -> Arc<dyn InferenceProcedure + Send + Sync> {
        let duration = (self.timeout > 0).then(|| Duration::from_secs(self.timeout));
        let config = ResourceLimitConfig::default().with_duration(duration);
        match self.procedure {
            Procedure::Fc => Arc::new(FolFcAsk::new()),
            Procedure::Bc => Arc::new(FolBcAsk::new()),
            Procedure::Tfm => Arc::new(FolTfmResolution::new().with_resource_config(config)),
            Procedure::Otter => Arc::new(
                FolOtterLikeTheoremProver::new()
                    .with_resource_config(config)
                    .with_paramodulation(self.paramodulation),
            ),
            Procedure::Me => Arc::new(FolModelElimination::new().with_resource_config(config)),
        }
    }
}

fn run(args: &Cli) -> Result<()> {
    let problem = tptp_parser::parse_file(&args.file)?;
    let mut kb = KnowledgeBase::with_inference_procedure(args.inference_procedure());
    kb.tell_all(problem.axioms)?;
    kb.tell_all(problem.negated_conjectures)?;
    log::info!(
        "Knowledge base holds {} clauses, asking {} conjecture(s)",
        kb.number_of_clauses(),
        problem.conjectures.len()
    );

    for conjecture in problem.conjectures.iter() {
        let result = kb.ask(conjecture)?;
        let status = if result.is_true() {
            if result.is_partial_result_due_to_timeout() {
                "Theorem (partial, timed out)"
            } else {
                "Theorem"
            }
        } else if result.is_unknown_due_to_timeout() {
            "Timeout"
        } else {
            "CounterSatisfiable"
        };
        println!("{}: {}", conjecture, status);
        for proof in result.proofs() {
            if !proof.answer_bindings().is_empty() {
                println!("  answer {}", proof.answer_bindings());
            }
            if args.proofs {
                println!("{}", proof.to_table());
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Cli::parse();
    env_logger::builder()
        .format(|buf, record| {
            let level_style = buf.default_level_style(record.level()).bold();
            writeln!(
                buf,
                "{}|{level_style}{:7}{level_style:#}|{:10}| {}",
                Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
    log::info!("Parse file: {:?}", args.file);
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
