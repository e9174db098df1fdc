use clap::Args;
use coalesce_tuner::{ParameterSpace, TunerResult};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct SpaceArgs {
    /// Space file to validate. Prints the built-in space when omitted.
    pub file: Option<PathBuf>,
}

pub fn run(args: SpaceArgs) -> TunerResult<()> {
    let space = match &args.file {
        Some(path) => {
            let space = ParameterSpace::load_from_file(path)?;
            info!("✅ {} is a valid tuning space", path.display());
            space
        }
        None => ParameterSpace::default_space(),
    };

    println!("{}", space);
    println!("\t({} candidates)", space.len());
    Ok(())
}
