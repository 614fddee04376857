use crate::cli::GenArgs;
use crate::config::{self, RunConfig};
use crate::document;
use crate::ignore::IgnoreSet;
use crate::logger::Logger;
use std::path::PathBuf;

pub fn run(args: GenArgs) -> Result<(), Box<dyn std::error::Error>> {
    let root = PathBuf::from(args.path.unwrap_or_else(|| ".".to_string()));
    let logger = Logger::new(args.debug);

    let file_config = config::load_config(&root);
    let run = RunConfig::resolve(
        &root,
        &file_config,
        args.output,
        args.depth,
        !args.paths_only,
        None,
        args.debug,
        None,
    );

    document::prepare_artifact_dir(&root, &logger)?;
    let ignore = IgnoreSet::load(&root);

    document::assemble(&root, &run, &ignore, &logger)?;
    logger.info(&format!("wrote {}", run.output.display()));

    Ok(())
}
