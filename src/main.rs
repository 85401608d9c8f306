use groundprog::{propositional::PropositionalEngine, Controller, Part};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn stdin_to_string() -> std::io::Result<String> {
    use std::io::Read as _;
    let mut buffer = String::new();
    std::io::stdin().lock().read_to_string(&mut buffer)?;
    Ok(buffer)
}

fn run() -> groundprog::Result<String> {
    let source = stdin_to_string()
        .map_err(|e| groundprog::Error::Engine(format!("reading stdin: {e}")))?;
    let mut controller = Controller::new(PropositionalEngine::new());
    controller.add_program(&source)?;
    info!(statements = controller.parsed_program().len(), "parsed program");
    controller.ground(&[Part::base()])?;
    info!(
        objects = controller.ground_program().len(),
        epoch = controller.epoch(),
        "grounded program"
    );
    controller.render()
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(rendered) => {
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "failed");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
