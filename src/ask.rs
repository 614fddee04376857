use crate::cli::AskArgs;
use crate::config::{self, RunConfig};
use crate::document;
use crate::ignore::{self, IgnoreSet};
use crate::logger::Logger;
use crate::transport::{QueryTransport, DEFAULT_API_URL, DEFAULT_MODEL};
use std::path::PathBuf;

pub fn run(args: AskArgs) -> Result<(), Box<dyn std::error::Error>> {
    let root = PathBuf::from(args.path.unwrap_or_else(|| ".".to_string()));
    let logger = Logger::new(args.debug);

    let file_config = config::load_config(&root);
    let run = RunConfig::resolve(
        &root,
        &file_config,
        args.output,
        args.depth,
        true,
        Some(args.query.clone()),
        args.debug,
        args.timeout,
    );

    document::prepare_artifact_dir(&root, &logger)?;
    let ignore = IgnoreSet::load(&root);
    document::assemble(&root, &run, &ignore, &logger)?;
    logger.info(&format!("wrote {}", run.output.display()));

    let api_url = std::env::var("REPODOC_API_URL")
        .ok()
        .or_else(|| file_config.api_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let model = file_config
        .model
        .clone()
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let transport = QueryTransport::new(api_url, model, run.timeout_ms, ignore::artifact_dir(&root));

    // Failures surface as a printable message, never as a crash.
    let answer = transport.send_query(&args.query, &run.output, None, &logger);
    println!("{}", answer);

    Ok(())
}
